use crate::core::state::{Cause, Contradiction, DomainStore, EventMask};
use crate::core::VarRef;
use crate::engine::{Entailment, Priority, Propagate, PropagationOutcome, PropagatorId, Watches};

/// Binds a 0/1 variable to the truth of an inner constraint, through the
/// inner propagator's entailment test.
///
/// Filtering is checker-grade: the bool is fixed when the inner constraint
/// becomes entailed one way or the other, and the inner propagator filters
/// only once the bool is known true. No reasons are produced, so with
/// explanations enabled a conflict under a reification falls back to
/// chronological backtracking.
pub struct Reified {
    pub bool_var: VarRef,
    inner: Box<dyn Propagate>,
}

impl Reified {
    pub fn new(bool_var: VarRef, inner: impl Propagate + 'static) -> Reified {
        Reified {
            bool_var,
            inner: Box::new(inner),
        }
    }
}

impl Propagate for Reified {
    fn variables(&self) -> Vec<VarRef> {
        let mut vars = self.inner.variables();
        vars.push(self.bool_var);
        vars
    }

    fn setup(&self, id: PropagatorId, watches: &mut Watches) {
        // entailment of the inner constraint can flip on any event, not just
        // on the events the inner propagator filters on
        for (i, &v) in self.inner.variables().iter().enumerate() {
            watches.attach(v, id, i as u32, EventMask::ALL);
        }
        let arity = self.inner.variables().len() as u32;
        watches.attach(self.bool_var, id, arity, EventMask::INSTANTIATE);
    }

    fn priority(&self) -> Priority {
        self.inner.priority()
    }

    fn propagate(&mut self, store: &mut DomainStore, cause: Cause) -> Result<PropagationOutcome, Contradiction> {
        match self.inner.is_entailed(store) {
            Entailment::True => {
                let _ = store.instantiate(self.bool_var, 1, cause, None)?;
                return Ok(PropagationOutcome::Passive);
            }
            Entailment::False => {
                let _ = store.instantiate(self.bool_var, 0, cause, None)?;
                return Ok(PropagationOutcome::Passive);
            }
            Entailment::Undefined => {}
        }
        match store.value(self.bool_var) {
            Some(1) => self.inner.propagate(store, cause),
            // when the bool is false we can only wait for the entailment
            // check above to detect a violation
            Some(_) | None => Ok(PropagationOutcome::Active),
        }
    }

    fn is_entailed(&self, store: &DomainStore) -> Entailment {
        match (store.value(self.bool_var), self.inner.is_entailed(store)) {
            (Some(1), Entailment::True) | (Some(0), Entailment::False) => Entailment::True,
            (Some(1), Entailment::False) | (Some(0), Entailment::True) => Entailment::False,
            _ => Entailment::Undefined,
        }
    }

    fn describe(&self) -> String {
        format!("{:?} <=> {}", self.bool_var, self.inner.describe())
    }
}
