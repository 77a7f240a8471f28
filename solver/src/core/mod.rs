//! Fundamental types of the solver: variables, literals, domains and the
//! backtrackable domain store.
//!
//! ## Example
//!
//! ```
//! use taurus::core::*;
//! use taurus::core::state::{Cause, DomainStore};
//! use taurus::backtrack::Backtrack;
//!
//! let mut store = DomainStore::new();
//! let x: VarRef = store.new_interval_var(0, 10);
//! assert_eq!(store.lb(x), 0);
//! assert_eq!(store.ub(x), 10);
//!
//! store.push_world();
//! assert_eq!(store.update_lb(x, 6, Cause::Decision, None), Ok(true));
//! assert_eq!(store.lb(x), 6);
//!
//! store.pop_world();
//! assert_eq!(store.lb(x), 0);
//! ```

pub use cst::*;
pub use lit::*;
pub use variable::*;

mod cst;
pub mod domain;
mod lit;
pub mod state;
mod variable;
