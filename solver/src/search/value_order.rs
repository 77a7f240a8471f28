use crate::core::state::DomainStore;
use crate::core::VarRef;
use crate::search::DecisionKind;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// Value selection policy: picks the left branch for a non-instantiated
/// variable.
pub trait ValueOrder {
    fn select(&mut self, store: &DomainStore, var: VarRef) -> DecisionKind;
}

/// Assign the minimum value.
#[derive(Clone, Debug, Default)]
pub struct Min;

impl ValueOrder for Min {
    fn select(&mut self, store: &DomainStore, var: VarRef) -> DecisionKind {
        DecisionKind::Assign(store.lb(var))
    }
}

/// Assign the maximum value.
#[derive(Clone, Debug, Default)]
pub struct Max;

impl ValueOrder for Max {
    fn select(&mut self, store: &DomainStore, var: VarRef) -> DecisionKind {
        DecisionKind::Assign(store.ub(var))
    }
}

/// Split the domain at its midpoint, keeping the lower half first.
#[derive(Clone, Debug, Default)]
pub struct LowerHalf;

impl ValueOrder for LowerHalf {
    fn select(&mut self, store: &DomainStore, var: VarRef) -> DecisionKind {
        let (lb, ub) = store.bounds(var);
        // the midpoint always leaves both branches non-empty
        DecisionKind::SplitLeq(lb + (ub - lb) / 2)
    }
}

/// Random value, reproducible from the seed. Assigns a present value on
/// enumerated domains; splits at a random point on intervals, where an
/// interior refutation `x != v` would not be representable.
#[derive(Clone, Debug)]
pub struct RandomVal {
    rng: SmallRng,
}

impl RandomVal {
    pub fn new(seed: u64) -> RandomVal {
        RandomVal {
            rng: SmallRng::seed_from_u64(seed),
        }
    }
}

impl ValueOrder for RandomVal {
    fn select(&mut self, store: &DomainStore, var: VarRef) -> DecisionKind {
        let (lb, ub) = store.bounds(var);
        debug_assert!(lb < ub);
        if store.has_enumerated_domain(var) {
            let nth = self.rng.random_range(0..store.size(var));
            let mut v = lb;
            for _ in 0..nth {
                v = store.next_value(var, v).expect("size-consistent domain");
            }
            DecisionKind::Assign(v)
        } else {
            DecisionKind::SplitLeq(self.rng.random_range(lb..ub))
        }
    }
}

/// Closed set of built-in value orders.
#[derive(Clone, Debug)]
pub enum ValueOrderKind {
    Min,
    Max,
    LowerHalf,
    Random(RandomVal),
}

impl ValueOrder for ValueOrderKind {
    fn select(&mut self, store: &DomainStore, var: VarRef) -> DecisionKind {
        match self {
            ValueOrderKind::Min => Min.select(store, var),
            ValueOrderKind::Max => Max.select(store, var),
            ValueOrderKind::LowerHalf => LowerHalf.select(store, var),
            ValueOrderKind::Random(r) => r.select(store, var),
        }
    }
}
