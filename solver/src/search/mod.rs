//! The decision layer of the search loop: branching strategies, restart
//! policies, limits, the objective manager and solution recording.
//!
//! The depth-first state machine itself lives in [`crate::solver`].

mod decision;
mod limits;
mod objective;
mod restart;
mod solution;
mod value_order;
mod var_order;

pub use decision::{DecisionFrame, DecisionKind};
pub use limits::Limits;
pub use objective::{Objective, OptimizeDir};
pub use restart::{Geometric, Never, Restart, RestartKind};
pub use solution::{Solution, SolutionPool};
pub use value_order::{LowerHalf, Max, Min, RandomVal, ValueOrder, ValueOrderKind};
pub use var_order::{FirstFail, Lexical, RandomVar, VarOrder, VarOrderKind};

use crate::core::state::DomainStore;
use crate::core::VarRef;

/// What the brancher asks the search loop to do next.
#[derive(Copy, Clone, Debug)]
pub enum Decision {
    /// Open a left branch on this variable.
    Branch(VarRef, DecisionKind),
    /// Abandon the current tree and start over from the root.
    Restart,
}

/// A modular brancher: variable selection x value selection x restart policy.
pub struct Brancher {
    pub var_order: VarOrderKind,
    pub value_order: ValueOrderKind,
    pub restart: RestartKind,
}

impl Default for Brancher {
    fn default() -> Self {
        Brancher {
            var_order: VarOrderKind::Lexical,
            value_order: ValueOrderKind::Min,
            restart: RestartKind::Never(Never),
        }
    }
}

impl Brancher {
    pub fn new(var_order: VarOrderKind, value_order: ValueOrderKind, restart: RestartKind) -> Brancher {
        Brancher {
            var_order,
            value_order,
            restart,
        }
    }

    /// Selects the next decision, or `None` when every decision variable is
    /// instantiated. `allow_restart` is false while enumerating (a restart
    /// would revisit recorded solutions).
    pub fn next_decision(
        &mut self,
        store: &DomainStore,
        decision_vars: &[VarRef],
        allow_restart: bool,
    ) -> Option<Decision> {
        // a solution leaf is never preempted by a due restart
        let var = self.var_order.select(store, decision_vars)?;
        if allow_restart && self.restart.should_restart() {
            return Some(Decision::Restart);
        }
        let kind = self.value_order.select(store, var);
        Some(Decision::Branch(var, kind))
    }

    pub fn on_conflict(&mut self) {
        self.restart.conflict();
    }
}
