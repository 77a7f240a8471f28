//! The explanation layer: literal interning, conflict analysis and learned
//! clauses.
//!
//! Optional: nothing here runs unless explanations are enabled on the store.
//! Propagators then tag every domain change with a [`Reason`]; on
//! contradiction the engine hands the failure to a [`ConflictAnalyzer`]
//! (the clause-learning sub-solver, a black box behind the trait) which
//! returns a clause that the solver posts as a regular propagator.
//!
//! [`Reason`]: crate::core::state::Reason

mod analysis;
mod lit_table;

pub use analysis::{Clause, ConflictAnalyzer, FirstUip};
pub use lit_table::{LitId, LitTable};
