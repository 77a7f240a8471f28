use crate::core::state::{Cause, Contradiction, DomainStore, EventMask, Reason};
use crate::core::{Lit, VarRef};
use crate::engine::{Entailment, Priority, Propagate, PropagationOutcome, PropagatorId, Watches};
use itertools::Itertools;

/// Pairwise all-different with forward checking: whenever a variable gets
/// instantiated, its value is removed from every other domain.
///
/// Deliberately the cheap decomposition; stronger (matching based) filtering
/// belongs to the external propagator library.
#[derive(Clone, Debug)]
pub struct AllDifferent {
    pub vars: Vec<VarRef>,
}

impl AllDifferent {
    pub fn new(vars: impl IntoIterator<Item = VarRef>) -> AllDifferent {
        let vars: Vec<VarRef> = vars.into_iter().collect();
        debug_assert!(vars.iter().all_unique());
        AllDifferent { vars }
    }

    fn exclude_value_of(
        &self,
        instantiated: usize,
        store: &mut DomainStore,
        cause: Cause,
    ) -> Result<(), Contradiction> {
        let var = self.vars[instantiated];
        let Some(value) = store.value(var) else {
            return Ok(());
        };
        let explaining = store.explanations_enabled();
        for (i, &other) in self.vars.iter().enumerate() {
            if i != instantiated {
                let reason = explaining.then(|| Reason::from([Lit::eq(var, value)]));
                let _ = store.remove_value(other, value, cause, reason)?;
            }
        }
        Ok(())
    }
}

impl Propagate for AllDifferent {
    fn variables(&self) -> Vec<VarRef> {
        self.vars.clone()
    }

    fn setup(&self, id: PropagatorId, watches: &mut Watches) {
        for (i, &v) in self.vars.iter().enumerate() {
            watches.attach(v, id, i as u32, EventMask::INSTANTIATE);
        }
    }

    fn priority(&self) -> Priority {
        Priority::Linear
    }

    fn propagate(&mut self, store: &mut DomainStore, cause: Cause) -> Result<PropagationOutcome, Contradiction> {
        for i in 0..self.vars.len() {
            self.exclude_value_of(i, store, cause)?;
        }
        Ok(PropagationOutcome::Active)
    }

    fn propagate_on(
        &mut self,
        store: &mut DomainStore,
        position: u32,
        _mask: EventMask,
        cause: Cause,
    ) -> Result<PropagationOutcome, Contradiction> {
        self.exclude_value_of(position as usize, store, cause)?;
        Ok(PropagationOutcome::Active)
    }

    fn is_entailed(&self, store: &DomainStore) -> Entailment {
        let mut all_fixed = true;
        for (i, &a) in self.vars.iter().enumerate() {
            for &b in &self.vars[i + 1..] {
                let (alb, aub) = store.bounds(a);
                let (blb, bub) = store.bounds(b);
                match (store.value(a), store.value(b)) {
                    (Some(va), Some(vb)) if va == vb => return Entailment::False,
                    (Some(_), Some(_)) => {}
                    _ if aub < blb || bub < alb => {}
                    _ => all_fixed = false,
                }
            }
        }
        if all_fixed {
            Entailment::True
        } else {
            Entailment::Undefined
        }
    }

    fn describe(&self) -> String {
        format!("alldifferent({:?})", self.vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::signals::StopFlag;

    #[test]
    fn forward_checking_chain() {
        let mut store = DomainStore::new();
        let mut engine = Engine::new();
        let stop = StopFlag::new();
        let x = store.new_enum_var([1, 2]);
        let y = store.new_enum_var([1, 2]);
        let z = store.new_enum_var([1, 2, 3]);
        engine.add_propagator(AllDifferent::new([x, y, z]), &mut store);
        engine.propagate(&mut store, &stop).unwrap();

        store.instantiate(x, 1, Cause::Decision, None).unwrap();
        engine.propagate(&mut store, &stop).unwrap();
        // x=1 forces y=2, which in turn strips both from z
        assert_eq!(store.value(y), Some(2));
        assert_eq!(store.value(z), Some(3));
    }

    #[test]
    fn pigeonhole_two_vars() {
        let mut store = DomainStore::new();
        let mut engine = Engine::new();
        let stop = StopFlag::new();
        let x = store.new_enum_var([5]);
        let y = store.new_enum_var([5]);
        engine.add_propagator(AllDifferent::new([x, y]), &mut store);
        assert!(engine.propagate(&mut store, &stop).is_err());
    }
}
