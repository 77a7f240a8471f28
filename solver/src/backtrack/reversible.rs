use crate::backtrack::{Backtrack, World};
use std::marker::PhantomData;

/// Handle to a reversible cell in a [`RevStore<V>`].
pub struct Rev<V> {
    index: u32,
    phantom: PhantomData<V>,
}

// manual impls: V need not be Copy/Clone for the handle to be
impl<V> Clone for Rev<V> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<V> Copy for Rev<V> {}
impl<V> PartialEq for Rev<V> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}
impl<V> Eq for Rev<V> {}

impl<V> std::fmt::Debug for Rev<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rev{}", self.index)
    }
}

struct Cell<V> {
    value: V,
    /// World in which the cell was last first-written. Invariant: `stamp <= current world`.
    stamp: u32,
}

struct TrailEntry<V> {
    cell: u32,
    previous: V,
    stamp: u32,
}

/// A store of reversible cells of a single value type, with copy-on-write
/// trailing.
///
/// Writing a cell whose stamp equals the current world overwrites in place;
/// otherwise the previous `(value, stamp)` pair is pushed on the trail first.
/// Consequently a cell contributes at most one trail entry per world, and
/// writes in the root world are never trailed.
///
/// Within each world segment of the trail, the recorded previous stamps are
/// non-decreasing: they name strictly older worlds than the segment's own.
pub struct RevStore<V> {
    cells: Vec<Cell<V>>,
    trail: Vec<TrailEntry<V>>,
    /// Trail length at each `push_world`; the current world is `marks.len()`.
    marks: Vec<usize>,
}

impl<V> Default for RevStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> RevStore<V> {
    pub fn new() -> Self {
        RevStore {
            cells: Vec::new(),
            trail: Vec::new(),
            marks: Vec::new(),
        }
    }

    pub fn new_cell(&mut self, value: V) -> Rev<V> {
        let index = self.cells.len() as u32;
        self.cells.push(Cell {
            value,
            stamp: self.marks.len() as u32,
        });
        Rev {
            index,
            phantom: PhantomData,
        }
    }

    #[inline]
    pub fn get(&self, cell: Rev<V>) -> &V {
        &self.cells[cell.index as usize].value
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }
}

impl<V: Clone> RevStore<V> {
    #[inline]
    pub fn set(&mut self, cell: Rev<V>, value: V) {
        let world = self.marks.len() as u32;
        let c = &mut self.cells[cell.index as usize];
        if c.stamp != world {
            self.trail.push(TrailEntry {
                cell: cell.index,
                previous: std::mem::replace(&mut c.value, value),
                stamp: c.stamp,
            });
            c.stamp = world;
        } else {
            c.value = value;
        }
    }

    /// Merges the current world into its parent.
    ///
    /// Trail entries of the merged world whose previous stamp already is the
    /// parent world are discarded (the parent segment holds the correct
    /// previous value); the others join the parent segment. All cells written
    /// in the merged world are restamped to the parent.
    pub fn commit_world(&mut self) {
        let seg_start = self.marks.pop().expect("commit below the root world");
        let parent = self.marks.len() as u32;
        let merged: Vec<TrailEntry<V>> = self.trail.drain(seg_start..).collect();
        for entry in merged {
            self.cells[entry.cell as usize].stamp = parent;
            if entry.stamp != parent {
                self.trail.push(entry);
            }
        }
    }
}

impl<V: Clone> Backtrack for RevStore<V> {
    fn push_world(&mut self) -> World {
        self.marks.push(self.trail.len());
        self.current_world()
    }

    fn num_worlds(&self) -> u32 {
        self.marks.len() as u32
    }

    fn pop_world(&mut self) {
        let mark = self.marks.pop().expect("pop below the root world");
        while self.trail.len() > mark {
            let entry = self.trail.pop().unwrap();
            let cell = &mut self.cells[entry.cell as usize];
            cell.value = entry.previous;
            cell.stamp = entry.stamp;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn push_set_pop_restores() {
        // the trail-stress scenario: 0 -> 5 -> 9, popped back twice
        let mut store = RevStore::new();
        let c = store.new_cell(0);
        store.push_world();
        store.set(c, 5);
        store.push_world();
        store.set(c, 9);
        assert_eq!(*store.get(c), 9);
        store.pop_world();
        assert_eq!(*store.get(c), 5);
        store.pop_world();
        assert_eq!(*store.get(c), 0);
    }

    #[test]
    fn root_writes_are_untrailed() {
        let mut store = RevStore::new();
        let c = store.new_cell(1);
        store.set(c, 2);
        store.set(c, 3);
        assert!(store.trail.is_empty());
        assert_eq!(*store.get(c), 3);
    }

    #[test]
    fn single_trail_entry_per_world() {
        let mut store = RevStore::new();
        let c = store.new_cell(0);
        store.push_world();
        store.set(c, 1);
        store.set(c, 2);
        store.set(c, 3);
        assert_eq!(store.trail.len(), 1);
        store.pop_world();
        assert_eq!(*store.get(c), 0);
    }

    #[test]
    fn commit_merges_into_parent() {
        let mut store = RevStore::new();
        let a = store.new_cell(0);
        let b = store.new_cell(10);
        store.push_world();
        store.set(a, 1); // first write in world 1
        store.push_world();
        store.set(a, 2); // previous stamp is the parent: entry discarded on commit
        store.set(b, 11); // previous stamp is root: entry kept
        store.commit_world();
        assert_eq!(*store.get(a), 2);
        assert_eq!(*store.get(b), 11);
        store.pop_world();
        assert_eq!(*store.get(a), 0);
        assert_eq!(*store.get(b), 10);
    }

    #[test]
    fn random_mutations_restore_exactly() {
        // compares against a naively snapshotted reference on random push/set/pop
        let mut rng = SmallRng::seed_from_u64(0xc0ffee);
        let mut store = RevStore::new();
        let cells: Vec<_> = (0..20).map(|i| store.new_cell(i)).collect();
        let snapshot = |s: &RevStore<i32>| cells.iter().map(|&c| *s.get(c)).collect::<Vec<_>>();
        let mut saved: Vec<Vec<i32>> = Vec::new();

        for _ in 0..2000 {
            match rng.random_range(0..10) {
                0..=5 => {
                    let c = cells[rng.random_range(0..cells.len())];
                    store.set(c, rng.random_range(-1000..1000));
                }
                6..=7 => {
                    saved.push(snapshot(&store));
                    store.push_world();
                }
                _ => {
                    if let Some(expected) = saved.pop() {
                        store.pop_world();
                        assert_eq!(snapshot(&store), expected);
                    }
                }
            }
        }
        while let Some(expected) = saved.pop() {
            store.pop_world();
            assert_eq!(snapshot(&store), expected);
        }
    }

    #[test]
    #[should_panic]
    fn pop_below_root_panics() {
        let mut store: RevStore<i32> = RevStore::new();
        store.pop_world();
    }
}
