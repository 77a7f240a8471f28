//! Re-exports of the most commonly used types and traits to ease import.

pub use crate::backtrack::Backtrack;
pub use crate::core::state::{Cause, DomainStore};
pub use crate::core::{IntCst, Lit, VarRef};
pub use crate::model::Model;
pub use crate::search::{Brancher, Limits, RestartKind, Solution, ValueOrderKind, VarOrderKind};
pub use crate::solver::{Completeness, Solver};
