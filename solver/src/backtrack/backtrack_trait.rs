use crate::backtrack::World;

/// Implemented by every component whose state follows the search tree.
///
/// All components of a solver are pushed and popped in lockstep; a component
/// may keep no per-world state and only track its current world.
pub trait Backtrack {
    /// Opens a new world and returns it.
    fn push_world(&mut self) -> World;

    /// Number of worlds pushed and not yet popped.
    fn num_worlds(&self) -> u32;

    fn current_world(&self) -> World {
        World::new(self.num_worlds())
    }

    /// Restores the state as it was when the current world was pushed.
    ///
    /// # Panics
    ///
    /// Popping the root world is a programming error and panics.
    fn pop_world(&mut self);

    fn pop_worlds_to(&mut self, w: World) {
        while self.current_world() > w {
            self.pop_world();
        }
    }

    fn reset(&mut self) {
        self.pop_worlds_to(World::ROOT);
    }
}
