use crate::backtrack::{Backtrack, World};
use crate::create_ref_type;
use std::marker::PhantomData;

create_ref_type!(EventIdx);

/// Classifies the world an entry belongs to relative to the log's current world.
pub enum WorldClass {
    Root,
    Current,
    Intermediate,
}

#[derive(Copy, Clone)]
struct LastBacktrack {
    next_read: EventIdx,
    id: u64,
}

/// An append-only log with world marks, truncated on backtrack.
///
/// Multiple independent [`LogReader`] cursors may consume the log; a cursor
/// re-synchronizes lazily after a backtrack so that truncated entries are
/// never observed.
#[derive(Clone)]
pub struct Log<V> {
    entries: Vec<V>,
    /// Index of the first entry of each world.
    marks: Vec<EventIdx>,
    last_backtrack: Option<LastBacktrack>,
}

impl<V> Default for Log<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> Log<V> {
    pub fn new() -> Self {
        Log {
            entries: Vec::new(),
            marks: Vec::new(),
            last_backtrack: None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_slot(&self) -> EventIdx {
        EventIdx::from(self.entries.len())
    }

    pub fn push(&mut self, value: V) -> EventIdx {
        let id = self.next_slot();
        self.entries.push(value);
        id
    }

    pub fn get(&self, id: EventIdx) -> &V {
        &self.entries[usize::from(id)]
    }

    /// All live entries, in chronological order.
    pub fn entries(&self) -> &[V] {
        &self.entries
    }

    /// Entries of the current world, oldest first.
    pub fn current_world_entries(&self) -> &[V] {
        let start = self.marks.last().map(|&m| usize::from(m)).unwrap_or(0);
        &self.entries[start..]
    }

    pub fn reader(&self) -> LogReader<V> {
        LogReader {
            next_read: EventIdx::from_u32(0),
            last_backtrack: None,
            phantom: PhantomData,
        }
    }

    /// World in which the entry at `id` was recorded.
    pub fn world_of(&self, id: EventIdx) -> World {
        let idx = self.marks.partition_point(|&m| m <= id);
        World::new(idx as u32)
    }

    /// Merges the current world into its parent: entries recorded in the top
    /// world now belong to the parent.
    pub fn commit_world(&mut self) {
        let _ = self.marks.pop().expect("commit below the root world");
    }

    pub fn world_class(&self, id: EventIdx) -> WorldClass {
        match self.marks.last() {
            Some(&first_of_current) if id >= first_of_current => WorldClass::Current,
            Some(_) if id < self.marks[0] => WorldClass::Root,
            Some(_) => WorldClass::Intermediate,
            None => WorldClass::Root,
        }
    }
}

impl<V> Backtrack for Log<V> {
    fn push_world(&mut self) -> World {
        self.marks.push(self.next_slot());
        self.current_world()
    }

    fn num_worlds(&self) -> u32 {
        self.marks.len() as u32
    }

    fn pop_world(&mut self) {
        let mark = self.marks.pop().expect("pop below the root world");
        self.entries.truncate(usize::from(mark));
        let id = self.last_backtrack.as_ref().map_or(0, |b| b.id + 1);
        self.last_backtrack = Some(LastBacktrack { next_read: mark, id });
    }
}

/// A cursor over a [`Log`], owning its read position.
#[derive(Clone)]
pub struct LogReader<V> {
    next_read: EventIdx,
    last_backtrack: Option<u64>,
    phantom: PhantomData<V>,
}

impl<V> Default for LogReader<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> LogReader<V> {
    /// A cursor positioned at the beginning of (any) log. The cursor should
    /// only ever read from a single log.
    pub fn new() -> Self {
        LogReader {
            next_read: EventIdx::from_u32(0),
            last_backtrack: None,
            phantom: PhantomData,
        }
    }

    fn sync_backtrack(&mut self, log: &Log<V>) {
        if let Some(bt) = &log.last_backtrack {
            if self.last_backtrack != Some(bt.id) {
                // if we had read truncated entries, rewind to the truncation point
                if self.next_read > bt.next_read {
                    self.next_read = bt.next_read;
                }
                self.last_backtrack = Some(bt.id);
            }
        }
        debug_assert!(self.next_read <= log.next_slot());
    }

    pub fn num_pending(&mut self, log: &Log<V>) -> usize {
        self.sync_backtrack(log);
        log.len() - usize::from(self.next_read)
    }

    pub fn pop<'l>(&mut self, log: &'l Log<V>) -> Option<(EventIdx, &'l V)> {
        self.sync_backtrack(log);
        let next = self.next_read;
        if next < log.next_slot() {
            self.next_read = next + 1;
            Some((next, log.get(next)))
        } else {
            None
        }
    }

    pub fn move_to_end(&mut self, log: &Log<V>) {
        self.sync_backtrack(log);
        self.next_read = log.next_slot();
    }
}

impl std::ops::Add<u32> for EventIdx {
    type Output = EventIdx;

    fn add(self, rhs: u32) -> EventIdx {
        EventIdx::from_u32(self.to_u32() + rhs)
    }
}

impl std::fmt::Debug for EventIdx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ev{}", self.to_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_are_independent() {
        let mut log = Log::new();
        log.push(0);
        log.push(1);
        let mut r1 = log.reader();
        let mut r2 = log.reader();
        assert_eq!(r1.pop(&log).map(|(_, v)| *v), Some(0));
        assert_eq!(r1.pop(&log).map(|(_, v)| *v), Some(1));
        assert_eq!(r1.pop(&log), None);
        log.push(2);
        assert_eq!(r1.pop(&log).map(|(_, v)| *v), Some(2));
        assert_eq!(r2.pop(&log).map(|(_, v)| *v), Some(0));
    }

    #[test]
    fn backtrack_hides_truncated_entries() {
        let mut log = Log::new();
        log.push(1);
        log.push_world();
        log.push(2);
        log.push(3);

        let mut read_all = log.reader();
        while read_all.pop(&log).is_some() {}
        let mut read_one = log.reader();
        assert_eq!(read_one.pop(&log).map(|(_, v)| *v), Some(1));

        log.pop_world();
        // the fully caught-up reader must not see a ghost of 2 and 3
        assert_eq!(read_all.pop(&log), None);
        // the lagging reader is unaffected
        assert_eq!(read_one.pop(&log), None);

        log.push(4);
        assert_eq!(read_all.pop(&log).map(|(_, v)| *v), Some(4));
        assert_eq!(read_one.pop(&log).map(|(_, v)| *v), Some(4));
    }

    #[test]
    fn worlds_of_entries() {
        let mut log = Log::new();
        let a = log.push("a");
        log.push_world();
        let b = log.push("b");
        log.push_world();
        log.push_world();
        let c = log.push("c");

        assert_eq!(log.world_of(a), World::ROOT);
        assert_eq!(log.world_of(b), World::new(1));
        assert_eq!(log.world_of(c), World::new(3));
        assert!(matches!(log.world_class(a), WorldClass::Root));
        assert!(matches!(log.world_class(b), WorldClass::Intermediate));
        assert!(matches!(log.world_class(c), WorldClass::Current));
    }
}
