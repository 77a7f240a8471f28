use crate::backtrack::{Backtrack, LogReader, RevBool, World};
use crate::collections::ref_store::RefVec;
use crate::core::state::{Cause, Contradiction, DomainStore, Event};
use crate::core::VarRef;
use crate::engine::queue::ScheduleQueue;
use crate::engine::{DynPropagator, Entailment, Priority, PropagationOutcome, PropagatorId, Watches};
use crate::signals::StopFlag;

#[derive(Clone, Default)]
pub struct EngineStats {
    /// Number of filtering calls.
    pub propagations: u64,
    /// Number of events drained from the store's log.
    pub events_seen: u64,
    /// Number of contradictions raised by filtering calls.
    pub contradictions: u64,
}

struct PropEntry {
    prop: DynPropagator,
    priority: Priority,
    /// Reversible activity flag: cleared on passivation, restored by the
    /// environment on backtrack above the passivation point.
    active: RevBool,
    /// False once the propagator is unposted. Never becomes true again.
    posted: bool,
}

/// The propagation engine: a priority-ordered bag of awoken propagators,
/// run to fixed point.
///
/// The engine observes domain changes through a cursor over the store's
/// event log. A rolled-back mutation is truncated from the log before the
/// cursor can reach it, so undone events never wake anyone.
pub struct Engine {
    entries: RefVec<PropagatorId, PropEntry>,
    watches: Watches,
    reader: LogReader<Event>,
    queue: ScheduleQueue,
    /// Propagators posted but never yet propagated.
    pending_init: Vec<PropagatorId>,
    world: World,
    pub stats: EngineStats,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Engine {
        Engine {
            entries: RefVec::new(),
            watches: Watches::new(),
            reader: LogReader::new(),
            queue: ScheduleQueue::new(),
            pending_init: Vec::new(),
            world: World::ROOT,
            stats: EngineStats::default(),
        }
    }

    pub fn num_propagators(&self) -> usize {
        self.entries.len()
    }

    /// Posts a propagator. Legal at any world and even while the engine is
    /// mid-propagation (the new propagator is served before quiescence): the
    /// initial filtering call is a full one.
    pub fn add_propagator(&mut self, prop: impl Into<DynPropagator>, store: &mut DomainStore) -> PropagatorId {
        let prop = prop.into();
        let id = self.entries.next_key();
        prop.inner.setup(id, &mut self.watches);
        let entry = PropEntry {
            priority: prop.inner.priority(),
            active: store.env_mut().make_bool(true),
            posted: true,
            prop,
        };
        self.entries.set_next(id, entry);
        self.queue.register(id);
        self.pending_init.push(id);
        id
    }

    /// Unposts a propagator: detaches its watches and deactivates it for
    /// good. The id is never reused.
    pub fn unpost(&mut self, id: PropagatorId) {
        let entry = &mut self.entries[id];
        assert!(entry.posted, "unposting an unknown or already unposted propagator");
        entry.posted = false;
        let vars = entry.prop.inner.variables();
        for var in vars {
            self.watches.detach(var, id);
        }
        self.pending_init.retain(|&p| p != id);
    }

    pub fn is_posted(&self, id: PropagatorId) -> bool {
        self.entries[id].posted
    }

    pub fn watches(&self) -> &Watches {
        &self.watches
    }

    /// Entailment status of a posted propagator in the current domains.
    pub fn entailment(&self, id: PropagatorId, store: &DomainStore) -> Entailment {
        self.entries[id].prop.inner.is_entailed(store)
    }

    /// Runs the scheduled propagators to quiescence or contradiction.
    ///
    /// The stop flag is polled before each dispatch; when raised, the engine
    /// returns after the in-flight propagator completes, possibly before
    /// quiescence.
    pub fn propagate(&mut self, store: &mut DomainStore, stop: &StopFlag) -> Result<(), Contradiction> {
        loop {
            self.drain_events(store);

            if stop.is_raised() {
                return Ok(());
            }

            // newly posted propagators get their initial full run first
            let (id, activation) = if let Some(&id) = self.pending_init.first() {
                self.pending_init.remove(0);
                (id, None)
            } else if let Some(id) = self.queue.pop() {
                (id, Some(self.queue.take_activation(id)))
            } else {
                return Ok(());
            };

            let entry = &mut self.entries[id];
            if !entry.posted || !store.env().get_bool(entry.active) {
                continue;
            }
            let cause = Cause::Inference(id);
            self.stats.propagations += 1;
            tracing::trace!("dispatch {:?}: {}", id, entry.prop.inner.describe());
            let result = match activation {
                Some(act) if act.positions.len() == 1 => {
                    entry.prop.inner.propagate_on(store, act.positions[0], act.mask, cause)
                }
                _ => entry.prop.inner.propagate(store, cause),
            };
            match result {
                Ok(PropagationOutcome::Active) => {}
                Ok(PropagationOutcome::Passive) => {
                    store.env_mut().set_bool(entry.active, false);
                }
                Err(contradiction) => {
                    self.stats.contradictions += 1;
                    // consume the events of the failed step: they must not
                    // wake anyone, the world is about to be popped
                    self.reader.move_to_end(store.events());
                    return Err(contradiction);
                }
            }
        }
    }

    /// Runs one full filtering call on every posted, active propagator,
    /// regardless of the schedule. Quiescence means this produces no event.
    pub fn propagate_all(&mut self, store: &mut DomainStore) -> Result<(), Contradiction> {
        for id in self.entries.keys().collect::<Vec<PropagatorId>>() {
            let entry = &mut self.entries[id];
            if !entry.posted || !store.env().get_bool(entry.active) {
                continue;
            }
            self.stats.propagations += 1;
            match entry.prop.inner.propagate(store, Cause::Inference(id))? {
                PropagationOutcome::Active => {}
                PropagationOutcome::Passive => store.env_mut().set_bool(entry.active, false),
            }
        }
        Ok(())
    }

    fn drain_events(&mut self, store: &DomainStore) {
        let Engine {
            entries,
            watches,
            reader,
            queue,
            stats,
            ..
        } = self;
        while let Some((_, ev)) = reader.pop(store.events()) {
            stats.events_seen += 1;
            let (var, mask): (VarRef, _) = (ev.var, ev.mask);
            for w in watches.on(var) {
                if !w.mask.intersects(mask) {
                    continue;
                }
                let entry = &entries[w.prop];
                if entry.posted && store.env().get_bool(entry.active) {
                    queue.schedule(w.prop, entry.priority, w.position, mask);
                }
            }
        }
    }
}

impl Backtrack for Engine {
    fn push_world(&mut self) -> World {
        self.world += 1;
        self.world
    }

    fn num_worlds(&self) -> u32 {
        self.world.depth()
    }

    fn pop_world(&mut self) {
        assert!(self.world > World::ROOT);
        self.world -= 1;
        // the schedule of the abandoned world is discarded; domain rollbacks
        // do not generate events, so nothing is rescheduled spuriously
        self.queue.clear();
    }
}
