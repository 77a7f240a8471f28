//! Small id-indexed collections used throughout the solver.

pub mod ref_store;
pub mod set;

pub use ref_store::{Ref, RefMap, RefVec};
pub use set::IterableRefSet;
