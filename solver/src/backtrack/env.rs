use crate::backtrack::{Backtrack, Rev, RevStore, World};
use crate::core::IntCst;
use std::any::Any;
use std::sync::Arc;

pub type RevInt = Rev<IntCst>;
pub type RevBool = Rev<bool>;
/// A reversible, shared object reference. The payload is downcast by the
/// owner; replacing it trails the previous reference, not the object.
pub type RevRef = Rev<Arc<dyn Any + Send + Sync>>;

/// The environment: owner of all reversible memory of one solver.
///
/// Hands out reversible integers, booleans and bit-sets, and drives world
/// transitions for all of them at once. Arbitrary cloneable payloads can be
/// made reversible by instantiating a standalone [`RevStore<V>`] and pushing
/// and popping it in lockstep.
pub struct Env {
    ints: RevStore<IntCst>,
    bools: RevStore<bool>,
    words: RevStore<u64>,
    refs: RevStore<Arc<dyn Any + Send + Sync>>,
    /// Callbacks to run when the world they were registered in is popped.
    on_pop: Vec<(u32, Box<dyn FnOnce() + Send>)>,
    world: u32,
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl Env {
    pub fn new() -> Self {
        Env {
            ints: RevStore::new(),
            bools: RevStore::new(),
            words: RevStore::new(),
            refs: RevStore::new(),
            on_pop: Vec::new(),
            world: 0,
        }
    }

    // ======== cell creation ========

    pub fn make_int(&mut self, value: IntCst) -> RevInt {
        self.ints.new_cell(value)
    }

    pub fn make_bool(&mut self, value: bool) -> RevBool {
        self.bools.new_cell(value)
    }

    /// Creates an initially empty reversible bit-set over `capacity` bits.
    pub fn make_bitset(&mut self, capacity: u32) -> RevBitSet {
        let num_words = (capacity as usize).div_ceil(64);
        let words = (0..num_words).map(|_| self.words.new_cell(0)).collect();
        RevBitSet { words, capacity }
    }

    // ======== accessors ========

    #[inline]
    pub fn get_int(&self, cell: RevInt) -> IntCst {
        *self.ints.get(cell)
    }

    #[inline]
    pub fn set_int(&mut self, cell: RevInt, value: IntCst) {
        self.ints.set(cell, value);
    }

    #[inline]
    pub fn get_bool(&self, cell: RevBool) -> bool {
        *self.bools.get(cell)
    }

    #[inline]
    pub fn set_bool(&mut self, cell: RevBool, value: bool) {
        self.bools.set(cell, value);
    }

    pub fn make_ref(&mut self, value: Arc<dyn Any + Send + Sync>) -> RevRef {
        self.refs.new_cell(value)
    }

    pub fn get_ref(&self, cell: RevRef) -> &Arc<dyn Any + Send + Sync> {
        self.refs.get(cell)
    }

    pub fn set_ref(&mut self, cell: RevRef, value: Arc<dyn Any + Send + Sync>) {
        self.refs.set(cell, value);
    }

    /// Registers a callback invoked when the *current* world is popped.
    /// Registering in the root world is legal but the callback will never run.
    pub fn save(&mut self, op: impl FnOnce() + Send + 'static) {
        if self.world > 0 {
            self.on_pop.push((self.world, Box::new(op)));
        }
    }

    /// Merges the current world into its parent. Pop callbacks of the merged
    /// world are re-registered on the parent.
    pub fn commit_world(&mut self) {
        assert!(self.world > 0, "commit below the root world");
        self.ints.commit_world();
        self.bools.commit_world();
        self.words.commit_world();
        self.refs.commit_world();
        let parent = self.world - 1;
        for (w, _) in self.on_pop.iter_mut() {
            if *w == self.world {
                *w = parent;
            }
        }
        // callbacks moved to the root will never fire
        if parent == 0 {
            self.on_pop.retain(|(w, _)| *w > 0);
        }
        self.world = parent;
    }

    pub(crate) fn words(&self) -> &RevStore<u64> {
        &self.words
    }

    pub(crate) fn words_mut(&mut self) -> &mut RevStore<u64> {
        &mut self.words
    }
}

impl Backtrack for Env {
    fn push_world(&mut self) -> World {
        self.ints.push_world();
        self.bools.push_world();
        self.words.push_world();
        self.refs.push_world();
        self.world += 1;
        self.current_world()
    }

    fn num_worlds(&self) -> u32 {
        self.world
    }

    fn pop_world(&mut self) {
        assert!(self.world > 0, "pop below the root world");
        self.ints.pop_world();
        self.bools.pop_world();
        self.words.pop_world();
        self.refs.pop_world();
        let world = self.world;
        let first = self.on_pop.iter().position(|(w, _)| *w >= world).unwrap_or(self.on_pop.len());
        let ops: Vec<_> = self.on_pop.drain(first..).collect();
        for (_, op) in ops.into_iter().rev() {
            op();
        }
        self.world -= 1;
    }
}

/// A reversible set of small unsigned integers backed by 64-bit words in the
/// environment. Only words that actually change are trailed.
#[derive(Clone)]
pub struct RevBitSet {
    words: Vec<Rev<u64>>,
    capacity: u32,
}

impl RevBitSet {
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    #[inline]
    pub fn contains(&self, env: &Env, i: u32) -> bool {
        debug_assert!(i < self.capacity);
        let word = *env.words().get(self.words[(i / 64) as usize]);
        word & (1u64 << (i % 64)) != 0
    }

    pub fn insert(&self, env: &mut Env, i: u32) {
        debug_assert!(i < self.capacity);
        let cell = self.words[(i / 64) as usize];
        let word = *env.words().get(cell);
        env.words_mut().set(cell, word | (1u64 << (i % 64)));
    }

    pub fn remove(&self, env: &mut Env, i: u32) {
        debug_assert!(i < self.capacity);
        let cell = self.words[(i / 64) as usize];
        let word = *env.words().get(cell);
        env.words_mut().set(cell, word & !(1u64 << (i % 64)));
    }

    /// Removes every element except `i` (which must be present).
    pub fn retain_single(&self, env: &mut Env, i: u32) {
        debug_assert!(self.contains(env, i));
        for (w, &cell) in self.words.iter().enumerate() {
            let target = if w == (i / 64) as usize { 1u64 << (i % 64) } else { 0 };
            if *env.words().get(cell) != target {
                env.words_mut().set(cell, target);
            }
        }
    }

    /// Removes all elements strictly below `i`. Returns the number removed.
    pub fn remove_below(&self, env: &mut Env, i: u32) -> u32 {
        let mut removed = 0;
        for (w, &cell) in self.words.iter().enumerate() {
            let lowest_bit = w as u32 * 64;
            if lowest_bit >= i {
                break;
            }
            let word = *env.words().get(cell);
            let keep_from = i.saturating_sub(lowest_bit);
            let mask = if keep_from >= 64 { 0 } else { !0u64 << keep_from };
            let kept = word & mask;
            if kept != word {
                removed += (word & !mask).count_ones();
                env.words_mut().set(cell, kept);
            }
        }
        removed
    }

    /// Removes all elements strictly above `i`. Returns the number removed.
    pub fn remove_above(&self, env: &mut Env, i: u32) -> u32 {
        let mut removed = 0;
        for (w, &cell) in self.words.iter().enumerate() {
            let lowest_bit = w as u32 * 64;
            let word = *env.words().get(cell);
            if lowest_bit > i {
                if word != 0 {
                    removed += word.count_ones();
                    env.words_mut().set(cell, 0);
                }
                continue;
            }
            let keep_to = i - lowest_bit; // inclusive
            if keep_to >= 63 {
                continue;
            }
            let mask = (1u64 << (keep_to + 1)) - 1;
            let kept = word & mask;
            if kept != word {
                removed += (word & !mask).count_ones();
                env.words_mut().set(cell, kept);
            }
        }
        removed
    }

    /// Least element `>= i`, if any.
    pub fn next_set(&self, env: &Env, i: u32) -> Option<u32> {
        if i >= self.capacity {
            return None;
        }
        let mut w = (i / 64) as usize;
        let mut word = *env.words().get(self.words[w]) & (!0u64 << (i % 64));
        loop {
            if word != 0 {
                return Some(w as u32 * 64 + word.trailing_zeros());
            }
            w += 1;
            if w >= self.words.len() {
                return None;
            }
            word = *env.words().get(self.words[w]);
        }
    }

    /// Greatest element `<= i`, if any.
    pub fn prev_set(&self, env: &Env, i: u32) -> Option<u32> {
        let i = i.min(self.capacity - 1);
        let mut w = (i / 64) as usize;
        let shift = 63 - (i % 64);
        let mut word = *env.words().get(self.words[w]) << shift >> shift;
        loop {
            if word != 0 {
                return Some(w as u32 * 64 + 63 - word.leading_zeros());
            }
            if w == 0 {
                return None;
            }
            w -= 1;
            word = *env.words().get(self.words[w]);
        }
    }

    pub fn count(&self, env: &Env) -> u32 {
        self.words.iter().map(|&c| env.words().get(c).count_ones()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bitset_ops_and_backtrack() {
        let mut env = Env::new();
        let bs = env.make_bitset(130);
        for i in [0, 63, 64, 100, 129] {
            bs.insert(&mut env, i);
        }
        assert_eq!(bs.count(&env), 5);
        assert_eq!(bs.next_set(&env, 0), Some(0));
        assert_eq!(bs.next_set(&env, 1), Some(63));
        assert_eq!(bs.next_set(&env, 65), Some(100));
        assert_eq!(bs.prev_set(&env, 129), Some(129));
        assert_eq!(bs.prev_set(&env, 99), Some(64));

        env.push_world();
        bs.remove(&mut env, 63);
        assert_eq!(bs.remove_below(&mut env, 64), 1); // removes 0
        assert_eq!(bs.remove_above(&mut env, 100), 1); // removes 129
        assert_eq!(bs.count(&env), 2);
        env.pop_world();
        assert_eq!(bs.count(&env), 5);
        assert!(bs.contains(&env, 63));
    }

    #[test]
    fn retain_single() {
        let mut env = Env::new();
        let bs = env.make_bitset(70);
        for i in 0..70 {
            bs.insert(&mut env, i);
        }
        env.push_world();
        bs.retain_single(&mut env, 66);
        assert_eq!(bs.count(&env), 1);
        assert_eq!(bs.next_set(&env, 0), Some(66));
        env.pop_world();
        assert_eq!(bs.count(&env), 70);
    }

    #[test]
    fn pop_callbacks_run_in_reverse_order() {
        use std::sync::atomic::{AtomicU32, Ordering};
        use std::sync::Arc;

        let order = Arc::new(AtomicU32::new(0));
        let mut env = Env::new();
        env.push_world();
        let (o1, o2) = (order.clone(), order.clone());
        env.save(move || {
            // runs second
            o1.compare_exchange(1, 2, Ordering::SeqCst, Ordering::SeqCst).unwrap();
        });
        env.save(move || {
            // runs first
            o2.compare_exchange(0, 1, Ordering::SeqCst, Ordering::SeqCst).unwrap();
        });
        env.pop_world();
        assert_eq!(order.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn int_and_bool_cells() {
        let mut env = Env::new();
        let i = env.make_int(3);
        let b = env.make_bool(true);
        env.push_world();
        env.set_int(i, 8);
        env.set_bool(b, false);
        env.pop_world();
        assert_eq!(env.get_int(i), 3);
        assert!(env.get_bool(b));
    }

    #[test]
    fn object_references_are_reversible() {
        let mut env = Env::new();
        let r = env.make_ref(Arc::new("first".to_string()));
        env.push_world();
        env.set_ref(r, Arc::new("second".to_string()));
        let current = env.get_ref(r).clone().downcast::<String>().unwrap();
        assert_eq!(*current, "second");
        env.pop_world();
        let restored = env.get_ref(r).clone().downcast::<String>().unwrap();
        assert_eq!(*restored, "first");
    }
}
