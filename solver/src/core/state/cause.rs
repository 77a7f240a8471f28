use crate::core::Lit;
use crate::engine::PropagatorId;
use smallvec::SmallVec;

/// Origin of a domain event.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Cause {
    /// The event is a search decision (or its refutation).
    Decision,
    /// The event results from posting a constraint or creating a variable.
    /// Should only occur in the root world.
    Root,
    /// The event is the dynamic objective cut installed after a solution.
    Cut,
    /// The event was inferred by the identified propagator.
    Inference(PropagatorId),
}

/// A set of literals asserted to entail a domain change.
///
/// The empty reason means "unconditional": it may only be attached to
/// derivations that are valid in every world.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reason {
    lits: SmallVec<[Lit; 4]>,
}

impl Reason {
    pub fn empty() -> Reason {
        Reason::default()
    }

    pub fn from(lits: impl IntoIterator<Item = Lit>) -> Reason {
        Reason {
            lits: lits.into_iter().collect(),
        }
    }

    pub fn push(&mut self, lit: Lit) {
        self.lits.push(lit);
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn literals(&self) -> &[Lit] {
        &self.lits
    }
}

impl From<Lit> for Reason {
    fn from(lit: Lit) -> Self {
        Reason::from([lit])
    }
}
