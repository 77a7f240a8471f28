use crate::core::state::{Cause, DomainStore, Reason, Wipeout};
use crate::core::{IntCst, VarRef};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OptimizeDir {
    Minimize,
    Maximize,
}

/// Tracks the best objective value found and installs the dynamic cut that
/// forces future solutions to improve on it.
///
/// The cut only ever strengthens over a run, so attaching it with an
/// unconditional (empty) reason keeps clause learning sound for the
/// remainder of the search.
#[derive(Copy, Clone, Debug)]
pub struct Objective {
    pub var: VarRef,
    pub direction: OptimizeDir,
    best: Option<IntCst>,
}

impl Objective {
    pub fn new(var: VarRef, direction: OptimizeDir) -> Objective {
        Objective {
            var,
            direction,
            best: None,
        }
    }

    pub fn best(&self) -> Option<IntCst> {
        self.best
    }

    /// Records the objective value of the solution in the current domains.
    pub fn on_solution(&mut self, store: &DomainStore) -> IntCst {
        let value = store.value(self.var).expect("objective not instantiated at solution");
        let improved = match (self.best, self.direction) {
            (None, _) => true,
            (Some(b), OptimizeDir::Minimize) => value < b,
            (Some(b), OptimizeDir::Maximize) => value > b,
        };
        if improved {
            self.best = Some(value);
        }
        value
    }

    /// Applies the cut `obj < best` (resp. `>`) in the current world.
    /// Re-invoked after every backtrack: the update is trailed like any other.
    pub fn apply_cut(&self, store: &mut DomainStore) -> Result<bool, Wipeout> {
        let Some(best) = self.best else {
            return Ok(false);
        };
        let reason = store.explanations_enabled().then(Reason::empty);
        match self.direction {
            OptimizeDir::Minimize => store.update_ub(self.var, best - 1, Cause::Cut, reason),
            OptimizeDir::Maximize => store.update_lb(self.var, best + 1, Cause::Cut, reason),
        }
    }
}
