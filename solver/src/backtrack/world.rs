use std::num::NonZeroU32;

/// Names a depth in the search tree. The root is world 0; pushing a world
/// increments the index.
///
/// The internal representation disallows 0 so that `Option<World>` fits in
/// 32 bits.
#[derive(Copy, Clone, Ord, PartialOrd, PartialEq, Eq, Hash)]
pub struct World(NonZeroU32);

impl World {
    /// The root world, in which no decision has been taken.
    pub const ROOT: World = World::new(0);

    pub const fn new(depth: u32) -> Self {
        unsafe { World(NonZeroU32::new_unchecked(depth + 1)) }
    }

    /// Integer depth of the world; 0 is the root.
    pub const fn depth(self) -> u32 {
        self.0.get() - 1
    }
}

impl Default for World {
    fn default() -> Self {
        World::ROOT
    }
}

impl std::ops::Add<i32> for World {
    type Output = World;

    #[inline]
    fn add(self, rhs: i32) -> Self::Output {
        World::new((self.depth() as i32 + rhs) as u32)
    }
}

impl std::ops::Sub<i32> for World {
    type Output = World;

    #[inline]
    fn sub(self, rhs: i32) -> Self::Output {
        self + (-rhs)
    }
}

impl std::ops::AddAssign<i32> for World {
    fn add_assign(&mut self, rhs: i32) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign<i32> for World {
    fn sub_assign(&mut self, rhs: i32) {
        *self = *self - rhs;
    }
}

impl From<u32> for World {
    fn from(depth: u32) -> Self {
        World::new(depth)
    }
}

impl From<World> for u32 {
    fn from(w: World) -> Self {
        w.depth()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w({})", self.depth())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        assert_eq!(World::ROOT + 1, World::new(1));
        assert_eq!(World::new(5) - 2, World::new(3));
        assert!(World::new(2) > World::ROOT);
    }

    #[test]
    fn option_is_free() {
        assert_eq!(std::mem::size_of::<Option<World>>(), 4);
    }
}
