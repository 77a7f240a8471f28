use crate::core::state::DomainStore;
use crate::core::VarRef;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Variable selection policy.
pub trait VarOrder {
    /// The variable to branch on, or `None` if every candidate is
    /// instantiated.
    fn select(&mut self, store: &DomainStore, candidates: &[VarRef]) -> Option<VarRef>;
}

/// First uninstantiated variable in declaration order.
#[derive(Clone, Debug, Default)]
pub struct Lexical;

impl VarOrder for Lexical {
    fn select(&mut self, store: &DomainStore, candidates: &[VarRef]) -> Option<VarRef> {
        candidates.iter().copied().find(|&v| !store.is_instantiated(v))
    }
}

/// Smallest-domain-first, ties by declaration order.
#[derive(Clone, Debug, Default)]
pub struct FirstFail;

impl VarOrder for FirstFail {
    fn select(&mut self, store: &DomainStore, candidates: &[VarRef]) -> Option<VarRef> {
        candidates
            .iter()
            .copied()
            .filter(|&v| !store.is_instantiated(v))
            .min_by_key(|&v| store.size(v))
    }
}

/// Uniformly random uninstantiated variable; reproducible from the seed.
#[derive(Clone, Debug)]
pub struct RandomVar {
    rng: SmallRng,
}

impl RandomVar {
    pub fn new(seed: u64) -> RandomVar {
        RandomVar {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl VarOrder for RandomVar {
    fn select(&mut self, store: &DomainStore, candidates: &[VarRef]) -> Option<VarRef> {
        let open: Vec<VarRef> = candidates
            .iter()
            .copied()
            .filter(|&v| !store.is_instantiated(v))
            .collect();
        if open.is_empty() {
            None
        } else {
            Some(open[self.rng.random_range(0..open.len())])
        }
    }
}

/// Closed set of built-in variable orders.
#[derive(Clone, Debug)]
pub enum VarOrderKind {
    Lexical,
    FirstFail,
    Random(RandomVar),
}

impl VarOrder for VarOrderKind {
    fn select(&mut self, store: &DomainStore, candidates: &[VarRef]) -> Option<VarRef> {
        match self {
            VarOrderKind::Lexical => Lexical.select(store, candidates),
            VarOrderKind::FirstFail => FirstFail.select(store, candidates),
            VarOrderKind::Random(r) => r.select(store, candidates),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Cause;

    #[test]
    fn lexical_skips_instantiated() {
        let mut store = DomainStore::new();
        let x = store.new_interval_var(0, 3);
        let y = store.new_interval_var(0, 3);
        let vars = [x, y];
        store.instantiate(x, 2, Cause::Decision, None).unwrap();
        assert_eq!(Lexical.select(&store, &vars), Some(y));
    }

    #[test]
    fn first_fail_prefers_small_domains() {
        let mut store = DomainStore::new();
        let x = store.new_interval_var(0, 9);
        let y = store.new_enum_var([1, 2]);
        let z = store.new_interval_var(0, 4);
        assert_eq!(FirstFail.select(&store, &[x, y, z]), Some(y));
    }

    #[test]
    fn random_is_reproducible() {
        let mut store = DomainStore::new();
        let vars: Vec<_> = (0..8).map(|_| store.new_interval_var(0, 5)).collect();
        let picks1: Vec<_> = {
            let mut r = RandomVar::new(42);
            (0..20).map(|_| r.select(&store, &vars)).collect()
        };
        let picks2: Vec<_> = {
            let mut r = RandomVar::new(42);
            (0..20).map(|_| r.select(&store, &vars)).collect()
        };
        assert_eq!(picks1, picks2);
    }
}
