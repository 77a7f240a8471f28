//! The minimal propagator library shipped with the core: enough to exercise
//! the propagator contract, the engine and the search loop. The full library
//! (alldifferent with matching, cumulative, table, ...) is out of scope.

mod all_different;
mod clause;
mod linear;
mod neq;
mod reify;

pub use all_different::AllDifferent;
pub use clause::ClauseProp;
pub use linear::{LinearLeq, SumElem};
pub use neq::{NeqVal, NeqVar};
pub use reify::Reified;
