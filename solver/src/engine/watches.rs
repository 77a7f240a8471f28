use crate::collections::ref_store::RefMap;
use crate::core::state::EventMask;
use crate::core::VarRef;
use crate::engine::PropagatorId;
use smallvec::SmallVec;

/// One attachment of a propagator to a variable.
#[derive(Copy, Clone, Debug)]
pub struct Watch {
    pub prop: PropagatorId,
    /// Index of the variable in the propagator's watched list.
    pub position: u32,
    /// Event kinds that wake the propagator.
    pub mask: EventMask,
}

/// The variable → propagator side of the constraint graph.
///
/// Held by the engine rather than by the variables: neither side owns the
/// other, both are indexed by ids whose lifetime is the model's.
#[derive(Default)]
pub struct Watches {
    by_var: RefMap<VarRef, SmallVec<[Watch; 4]>>,
}

impl Watches {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches `prop` to `var`: events on `var` intersecting `mask` will
    /// wake it, reported at `position`.
    pub fn attach(&mut self, var: VarRef, prop: PropagatorId, position: u32, mask: EventMask) {
        self.by_var
            .get_mut_or_insert(var, SmallVec::new)
            .push(Watch { prop, position, mask });
    }

    /// Removes every attachment of `prop` on `var`.
    pub fn detach(&mut self, var: VarRef, prop: PropagatorId) {
        if let Some(ws) = self.by_var.get_mut(var) {
            ws.retain(|w| w.prop != prop);
        }
    }

    pub fn on(&self, var: VarRef) -> &[Watch] {
        self.by_var.get(var).map(|ws| ws.as_slice()).unwrap_or(&[])
    }

    /// Streams the propagators attached to `var`.
    pub fn propagators_on(&self, var: VarRef) -> impl Iterator<Item = PropagatorId> + '_ {
        self.on(var).iter().map(|w| w.prop)
    }
}
