use crate::collections::ref_store::RefVec;
use crate::core::state::EventMask;
use crate::engine::{Priority, PropagatorId};
use smallvec::SmallVec;
use std::collections::VecDeque;

/// Per-propagator scheduling state.
#[derive(Clone)]
struct Slot {
    scheduled: bool,
    /// Event kinds accumulated since the last execution.
    mask: EventMask,
    /// Watched positions on which at least one event fired.
    positions: SmallVec<[u32; 4]>,
}

impl Default for Slot {
    fn default() -> Self {
        Slot {
            scheduled: false,
            mask: EventMask::EMPTY,
            positions: SmallVec::new(),
        }
    }
}

/// What a propagator is woken with: the accumulated mask and the positions
/// that fired.
pub(crate) struct Activation {
    pub mask: EventMask,
    pub positions: SmallVec<[u32; 4]>,
}

/// The scheduler's bag: one FIFO bucket per priority class.
///
/// Ties within a bucket are broken by insertion order, which is the
/// authoritative determinism tiebreaker of the engine.
pub(crate) struct ScheduleQueue {
    buckets: [VecDeque<PropagatorId>; Priority::COUNT],
    slots: RefVec<PropagatorId, Slot>,
}

impl ScheduleQueue {
    pub fn new() -> Self {
        ScheduleQueue {
            buckets: Default::default(),
            slots: RefVec::new(),
        }
    }

    /// Creates the scheduling slot of a newly added propagator. Must be
    /// called in propagator-id order.
    pub fn register(&mut self, prop: PropagatorId) {
        self.slots.set_next(prop, Slot::default());
    }

    /// Accumulates an event on `prop` and inserts it in its priority bucket
    /// if it is not already scheduled.
    pub fn schedule(&mut self, prop: PropagatorId, priority: Priority, position: u32, mask: EventMask) {
        let slot = &mut self.slots[prop];
        slot.mask |= mask;
        if !slot.positions.contains(&position) {
            slot.positions.push(position);
        }
        if !slot.scheduled {
            slot.scheduled = true;
            self.buckets[priority.index()].push_back(prop);
        }
    }

    /// Removes and returns the first propagator of the highest-priority
    /// non-empty bucket.
    pub fn pop(&mut self) -> Option<PropagatorId> {
        for bucket in self.buckets.iter_mut() {
            if let Some(prop) = bucket.pop_front() {
                return Some(prop);
            }
        }
        None
    }

    /// Snapshots and clears the accumulated activation of `prop`.
    pub fn take_activation(&mut self, prop: PropagatorId) -> Activation {
        let slot = &mut self.slots[prop];
        slot.scheduled = false;
        Activation {
            mask: std::mem::replace(&mut slot.mask, EventMask::EMPTY),
            positions: std::mem::take(&mut slot.positions),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(|b| b.is_empty())
    }

    /// Discards the whole schedule (on backtrack).
    pub fn clear(&mut self) {
        for bucket in self.buckets.iter_mut() {
            for prop in bucket.drain(..) {
                let slot = &mut self.slots[prop];
                slot.scheduled = false;
                slot.mask = EventMask::EMPTY;
                slot.positions.clear();
            }
        }
    }
}
