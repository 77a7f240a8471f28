use crate::core::state::{Cause, Contradiction, DomainStore, EventMask, Reason};
use crate::core::{Lit, Rel, VarRef};
use crate::engine::{Entailment, Priority, Propagate, PropagationOutcome, PropagatorId, Watches};
use crate::explain::Clause;
use itertools::Itertools;

/// A clause over domain literals, propagated by unit propagation.
///
/// This is how learned clauses re-enter the engine: as regular propagators
/// over boolean views of the literals. Filtering is bounds-grade: a unit
/// literal that an interval domain cannot represent (an interior `!=`) stays
/// pending until the bounds reach it.
pub struct ClauseProp {
    lits: Vec<Lit>,
}

impl ClauseProp {
    pub fn new(clause: Clause) -> ClauseProp {
        ClauseProp {
            lits: clause.literals().to_vec(),
        }
    }

    pub fn literals(&self) -> &[Lit] {
        &self.lits
    }

    /// Events that can falsify `lit` on its variable.
    fn falsifying_mask(lit: Lit) -> EventMask {
        match lit.relation() {
            Rel::Leq => EventMask::INCLOW,
            Rel::Geq => EventMask::DECUPP,
            Rel::Eq | Rel::Neq => EventMask::ALL,
        }
    }
}

impl Propagate for ClauseProp {
    fn variables(&self) -> Vec<VarRef> {
        self.lits.iter().map(|l| l.variable()).dedup().collect()
    }

    fn setup(&self, id: PropagatorId, watches: &mut Watches) {
        for (i, &lit) in self.lits.iter().enumerate() {
            watches.attach(lit.variable(), id, i as u32, Self::falsifying_mask(lit));
        }
    }

    fn priority(&self) -> Priority {
        // clauses always run first, before any other inference
        Priority::Unary
    }

    fn propagate(&mut self, store: &mut DomainStore, cause: Cause) -> Result<PropagationOutcome, Contradiction> {
        let mut unit: Option<Lit> = None;
        for &lit in &self.lits {
            match store.lit_value(lit) {
                Some(true) => return Ok(PropagationOutcome::Passive),
                Some(false) => {}
                None => {
                    if unit.is_some() {
                        // at least two undetermined literals: nothing to do
                        return Ok(PropagationOutcome::Active);
                    }
                    unit = Some(lit);
                }
            }
        }
        let falsified = |skip: Option<Lit>| {
            Reason::from(
                self.lits
                    .iter()
                    .filter(|&&l| Some(l) != skip)
                    .map(|&l| !l),
            )
        };
        match unit {
            None => {
                // every literal is falsified
                Err(Contradiction::Failure(falsified(None)))
            }
            Some(lit) => {
                let reason = store.explanations_enabled().then(|| falsified(Some(lit)));
                let _ = store.apply(lit, cause, reason)?;
                Ok(PropagationOutcome::Active)
            }
        }
    }

    fn is_entailed(&self, store: &DomainStore) -> Entailment {
        let mut all_false = true;
        for &lit in &self.lits {
            match store.lit_value(lit) {
                Some(true) => return Entailment::True,
                Some(false) => {}
                None => all_false = false,
            }
        }
        if all_false {
            Entailment::False
        } else {
            Entailment::Undefined
        }
    }

    fn describe(&self) -> String {
        format!("clause({:?})", self.lits)
    }
}
