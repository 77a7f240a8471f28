use crate::core::state::{Cause, Contradiction, DomainStore, EventMask, Reason};
use crate::core::{IntCst, Lit, VarRef};
use crate::engine::{Entailment, Priority, Propagate, PropagationOutcome, PropagatorId, Watches};

/// `var != value`.
#[derive(Copy, Clone, Debug)]
pub struct NeqVal {
    pub var: VarRef,
    pub value: IntCst,
}

impl NeqVal {
    pub fn new(var: VarRef, value: IntCst) -> NeqVal {
        NeqVal { var, value }
    }
}

impl Propagate for NeqVal {
    fn variables(&self) -> Vec<VarRef> {
        vec![self.var]
    }

    fn setup(&self, id: PropagatorId, watches: &mut Watches) {
        watches.attach(self.var, id, 0, EventMask::ALL);
    }

    fn priority(&self) -> Priority {
        Priority::Unary
    }

    fn propagate(&mut self, store: &mut DomainStore, cause: Cause) -> Result<PropagationOutcome, Contradiction> {
        // unconditional: the exclusion holds in every world
        let _ = store.remove_value(self.var, self.value, cause, Some(Reason::empty()))?;
        if store.contains(self.var, self.value) {
            // interval domain with the value strictly inside: wait for the bounds
            Ok(PropagationOutcome::Active)
        } else {
            Ok(PropagationOutcome::Passive)
        }
    }

    fn is_entailed(&self, store: &DomainStore) -> Entailment {
        match store.lit_value(Lit::neq(self.var, self.value)) {
            Some(true) => Entailment::True,
            Some(false) => Entailment::False,
            None => Entailment::Undefined,
        }
    }

    fn describe(&self) -> String {
        format!("{:?} != {}", self.var, self.value)
    }
}

/// `a != b + offset`.
#[derive(Copy, Clone, Debug)]
pub struct NeqVar {
    pub a: VarRef,
    pub b: VarRef,
    pub offset: IntCst,
}

impl NeqVar {
    pub fn new(a: VarRef, b: VarRef) -> NeqVar {
        NeqVar { a, b, offset: 0 }
    }

    pub fn with_offset(a: VarRef, b: VarRef, offset: IntCst) -> NeqVar {
        NeqVar { a, b, offset }
    }
}

impl Propagate for NeqVar {
    fn variables(&self) -> Vec<VarRef> {
        vec![self.a, self.b]
    }

    fn setup(&self, id: PropagatorId, watches: &mut Watches) {
        // only an instantiation allows filtering the other side
        watches.attach(self.a, id, 0, EventMask::INSTANTIATE);
        watches.attach(self.b, id, 1, EventMask::INSTANTIATE);
    }

    fn priority(&self) -> Priority {
        Priority::Binary
    }

    fn propagate(&mut self, store: &mut DomainStore, cause: Cause) -> Result<PropagationOutcome, Contradiction> {
        if let Some(va) = store.value(self.a) {
            let reason = store
                .explanations_enabled()
                .then(|| Reason::from([Lit::eq(self.a, va)]));
            let _ = store.remove_value(self.b, va - self.offset, cause, reason)?;
            return Ok(PropagationOutcome::Passive);
        }
        if let Some(vb) = store.value(self.b) {
            let reason = store
                .explanations_enabled()
                .then(|| Reason::from([Lit::eq(self.b, vb)]));
            let _ = store.remove_value(self.a, vb + self.offset, cause, reason)?;
            return Ok(PropagationOutcome::Passive);
        }
        Ok(PropagationOutcome::Active)
    }

    fn is_entailed(&self, store: &DomainStore) -> Entailment {
        let (alb, aub) = store.bounds(self.a);
        let (blb, bub) = store.bounds(self.b);
        if aub < blb + self.offset || alb > bub + self.offset {
            return Entailment::True;
        }
        match (store.value(self.a), store.value(self.b)) {
            (Some(va), Some(vb)) if va == vb + self.offset => Entailment::False,
            (Some(_), Some(_)) => Entailment::True,
            _ => Entailment::Undefined,
        }
    }

    fn describe(&self) -> String {
        if self.offset == 0 {
            format!("{:?} != {:?}", self.a, self.b)
        } else {
            format!("{:?} != {:?} + {}", self.a, self.b, self.offset)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::Engine;
    use crate::signals::StopFlag;

    #[test]
    fn neq_val_prunes_enumerated() {
        let mut store = DomainStore::new();
        let mut engine = Engine::new();
        let stop = StopFlag::new();
        let x = store.new_enum_var([1, 2, 3]);
        engine.add_propagator(NeqVal::new(x, 2), &mut store);
        engine.propagate(&mut store, &stop).unwrap();
        assert!(!store.contains(x, 2));
        assert_eq!(store.size(x), 2);
    }

    #[test]
    fn neq_var_waits_for_instantiation() {
        let mut store = DomainStore::new();
        let mut engine = Engine::new();
        let stop = StopFlag::new();
        let x = store.new_enum_var([1, 2, 3]);
        let y = store.new_enum_var([1, 2, 3]);
        engine.add_propagator(NeqVar::new(x, y), &mut store);
        engine.propagate(&mut store, &stop).unwrap();
        assert_eq!(store.size(y), 3);

        store.instantiate(x, 2, Cause::Decision, None).unwrap();
        engine.propagate(&mut store, &stop).unwrap();
        assert!(!store.contains(y, 2));
    }

    #[test]
    fn neq_var_conflict_on_equal_singletons() {
        let mut store = DomainStore::new();
        let mut engine = Engine::new();
        let stop = StopFlag::new();
        let x = store.new_const(4);
        let y = store.new_const(4);
        engine.add_propagator(NeqVar::new(x, y), &mut store);
        assert!(engine.propagate(&mut store, &stop).is_err());
    }
}
