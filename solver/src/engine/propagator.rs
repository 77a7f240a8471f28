use crate::core::state::{Cause, Contradiction, DomainStore, EventMask};
use crate::create_ref_type;
use crate::engine::Watches;

create_ref_type!(PropagatorId);

impl std::fmt::Debug for PropagatorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "prop{}", self.to_u32())
    }
}

/// Priority of a propagator, by (rough) cost of one filtering call.
///
/// The order is total: the engine always serves a scheduled propagator of a
/// cheaper class before any more expensive one, FIFO within a class.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Debug)]
pub enum Priority {
    Unary,
    Binary,
    Ternary,
    Linear,
    Quadratic,
    Cubic,
    VerySlow,
}

impl Priority {
    pub const COUNT: usize = 7;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// Three-valued entailment status of a constraint.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Entailment {
    True,
    False,
    Undefined,
}

/// Verdict of a filtering call.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum PropagationOutcome {
    /// The propagator may still filter in the future.
    Active,
    /// The propagator proved itself entailed and asks to sleep until the
    /// search backtracks above this point.
    Passive,
}

/// The propagator contract.
///
/// A propagator declares its watches once at posting time and is then woken
/// by the engine whenever a watched event kind fires on a watched variable.
/// Any filtering call may invoke domain mutators; failures propagate out as
/// [`Contradiction`] values through `?`.
///
/// Propagators must not cache unreversed state across calls except in
/// reversible cells of the environment.
pub trait Propagate: Send {
    /// The ordered list of variables the propagator relates. Its length is
    /// the propagator's arity.
    fn variables(&self) -> Vec<crate::core::VarRef>;

    /// Declares the condition masks of the propagator, watch by watch.
    /// `id` is the identity to place on every watch.
    fn setup(&self, id: PropagatorId, watches: &mut Watches);

    fn priority(&self) -> Priority;

    /// Filters from scratch. Each change must be tagged with `cause` so that
    /// subsequent events can be traced back to this propagator.
    fn propagate(&mut self, store: &mut DomainStore, cause: Cause)
        -> Result<PropagationOutcome, Contradiction>;

    /// Incremental filtering after events accumulated on a single watched
    /// position. Defaults to a full filtering call.
    fn propagate_on(
        &mut self,
        store: &mut DomainStore,
        position: u32,
        mask: EventMask,
        cause: Cause,
    ) -> Result<PropagationOutcome, Contradiction> {
        let _ = (position, mask);
        self.propagate(store, cause)
    }

    /// Entailment status in the current domains. Used by reification
    /// wrappers and by solution checking.
    fn is_entailed(&self, store: &DomainStore) -> Entailment;

    /// Short human-readable description for tracing.
    fn describe(&self) -> String {
        "propagator".to_string()
    }
}

/// Boxed propagator, the engine's unit of dynamic dispatch.
pub struct DynPropagator {
    pub(crate) inner: Box<dyn Propagate>,
}

impl DynPropagator {
    pub fn new(inner: Box<dyn Propagate>) -> DynPropagator {
        DynPropagator { inner }
    }
}

impl<T: Propagate + 'static> From<T> for DynPropagator {
    fn from(p: T) -> Self {
        DynPropagator { inner: Box::new(p) }
    }
}
