//! The propagation engine: propagator contract, event scheduling and the
//! fixed-point loop.

mod propagator;
mod queue;
mod watches;

#[allow(clippy::module_inception)]
mod engine;

pub use engine::{Engine, EngineStats};
pub use propagator::{DynPropagator, Entailment, Priority, Propagate, PropagationOutcome, PropagatorId};
pub use watches::{Watch, Watches};
