//! Trailing memory: reversible cells, worlds and world-marked logs.

mod backtrack_trait;
mod env;
mod reversible;
mod trail;
mod world;

pub use backtrack_trait::Backtrack;
pub use env::{Env, RevBitSet, RevBool, RevInt, RevRef};
pub use reversible::{Rev, RevStore};
pub use trail::{EventIdx, Log, LogReader, WorldClass};
pub use world::World;
