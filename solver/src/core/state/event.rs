use crate::core::state::{Cause, Reason};
use crate::core::{IntCst, Lit, Rel, VarRef};

/// A bit union over the four event kinds.
///
/// `INSTANTIATE` implies the other kinds: an instantiation event carries all
/// four bits so that any subscriber is woken.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct EventMask(u8);

impl EventMask {
    pub const EMPTY: EventMask = EventMask(0);
    /// A value was removed from the domain.
    pub const REMOVE: EventMask = EventMask(1);
    /// The lower bound increased.
    pub const INCLOW: EventMask = EventMask(2);
    /// The upper bound decreased.
    pub const DECUPP: EventMask = EventMask(4);
    /// The domain shrank to a single value.
    pub const INSTANTIATE: EventMask = EventMask(8);
    /// All event kinds; also the mask carried by an instantiation event.
    pub const ALL: EventMask = EventMask(15);
    /// Both bound kinds.
    pub const BOUNDS: EventMask = EventMask(2 | 4);

    #[inline]
    pub fn intersects(self, other: EventMask) -> bool {
        self.0 & other.0 != 0
    }

    #[inline]
    pub fn contains(self, other: EventMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl std::ops::BitOr for EventMask {
    type Output = EventMask;

    fn bitor(self, rhs: EventMask) -> EventMask {
        EventMask(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for EventMask {
    fn bitor_assign(&mut self, rhs: EventMask) {
        self.0 |= rhs.0;
    }
}

impl std::fmt::Debug for EventMask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names = Vec::new();
        if self.contains(EventMask::INSTANTIATE) {
            names.push("inst");
        }
        if self.contains(EventMask::INCLOW) {
            names.push("lb");
        }
        if self.contains(EventMask::DECUPP) {
            names.push("ub");
        }
        if self.contains(EventMask::REMOVE) {
            names.push("rem");
        }
        write!(f, "{{{}}}", names.join("+"))
    }
}

/// A domain change, as recorded on the event log.
///
/// The previous and new bounds allow reconstructing which literals the event
/// made true; the removed value is set for removal-class events. Undoing is
/// not the event's job: reversible cells restore themselves on world pop.
#[derive(Clone)]
pub struct Event {
    pub var: VarRef,
    pub mask: EventMask,
    pub cause: Cause,
    pub removed: Option<IntCst>,
    pub prev_lb: IntCst,
    pub new_lb: IntCst,
    pub prev_ub: IntCst,
    pub new_ub: IntCst,
    /// Present when the explanation layer is active and the mutator supplied one.
    pub reason: Option<Reason>,
}

impl Event {
    /// True if this event is what made `lit` become entailed.
    pub fn makes_true(&self, lit: Lit) -> bool {
        if lit.variable() != self.var {
            return false;
        }
        let v = lit.value();
        match lit.relation() {
            Rel::Eq => self.new_lb == v && self.new_ub == v && self.prev_lb != self.prev_ub,
            Rel::Neq => {
                self.removed == Some(v)
                    || (self.prev_lb <= v && v < self.new_lb)
                    || (self.new_ub < v && v <= self.prev_ub)
            }
            Rel::Leq => self.new_ub <= v && v < self.prev_ub,
            Rel::Geq => self.prev_lb < v && v <= self.new_lb,
        }
    }

    /// The strongest literal entailed by this event.
    pub fn entailed_lit(&self) -> Lit {
        if self.mask.contains(EventMask::INSTANTIATE) {
            Lit::eq(self.var, self.new_lb)
        } else if self.mask.contains(EventMask::INCLOW) {
            Lit::geq(self.var, self.new_lb)
        } else if self.mask.contains(EventMask::DECUPP) {
            Lit::leq(self.var, self.new_ub)
        } else {
            debug_assert!(self.removed.is_some());
            Lit::neq(self.var, self.removed.unwrap())
        }
    }
}

impl std::fmt::Debug for Event {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} {:?} [{}, {}] -> [{}, {}] by {:?}",
            self.entailed_lit(),
            self.mask,
            self.prev_lb,
            self.prev_ub,
            self.new_lb,
            self.new_ub,
            self.cause
        )
    }
}

/// Raised by a mutator whose effect would empty a domain. The domain itself
/// is left untouched: callers never observe an empty domain.
#[derive(Debug, PartialEq, Eq)]
pub struct Wipeout {
    /// The variable whose domain would have been emptied.
    pub var: VarRef,
    /// The rejected update, as a literal.
    pub lit: Lit,
    pub cause: Cause,
    pub reason: Option<Reason>,
}

/// Failure signal of a propagation step. Caught at the engine boundary and
/// surfaced to the search loop as a value, never by unwinding.
#[derive(Debug)]
pub enum Contradiction {
    /// A domain mutator rejected an update.
    Wipeout(Wipeout),
    /// The propagator itself detected infeasibility; the reason literals are
    /// entailed in the current state and jointly impossible.
    Failure(Reason),
}

impl From<Wipeout> for Contradiction {
    fn from(w: Wipeout) -> Self {
        Contradiction::Wipeout(w)
    }
}

impl From<Reason> for Contradiction {
    fn from(r: Reason) -> Self {
        Contradiction::Failure(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ev(prev_lb: IntCst, new_lb: IntCst, prev_ub: IntCst, new_ub: IntCst, removed: Option<IntCst>) -> Event {
        let mut mask = EventMask::EMPTY;
        if new_lb > prev_lb {
            mask |= EventMask::INCLOW;
        }
        if new_ub < prev_ub {
            mask |= EventMask::DECUPP;
        }
        if removed.is_some() {
            mask |= EventMask::REMOVE;
        }
        if new_lb == new_ub {
            mask = EventMask::ALL;
        }
        Event {
            var: VarRef::from_u32(0),
            mask,
            cause: Cause::Decision,
            removed,
            prev_lb,
            new_lb,
            prev_ub,
            new_ub,
            reason: None,
        }
    }

    #[test]
    fn makes_true_bounds() {
        let x = VarRef::from_u32(0);
        let e = ev(0, 4, 10, 10, None); // lb: 0 -> 4
        assert!(e.makes_true(Lit::geq(x, 4)));
        assert!(e.makes_true(Lit::geq(x, 1)));
        assert!(!e.makes_true(Lit::geq(x, 0)));
        assert!(!e.makes_true(Lit::geq(x, 5)));
        assert!(e.makes_true(Lit::neq(x, 2)));
        assert!(!e.makes_true(Lit::neq(x, 4)));
        assert!(!e.makes_true(Lit::leq(x, 10)));
    }

    #[test]
    fn makes_true_instantiation() {
        let x = VarRef::from_u32(0);
        let e = ev(1, 3, 5, 3, None);
        assert!(e.makes_true(Lit::eq(x, 3)));
        assert!(e.makes_true(Lit::neq(x, 1)));
        assert!(e.makes_true(Lit::neq(x, 5)));
        assert!(e.makes_true(Lit::leq(x, 4)));
        assert!(e.makes_true(Lit::geq(x, 2)));
        assert_eq!(e.entailed_lit(), Lit::eq(x, 3));
    }

    #[test]
    fn makes_true_removal() {
        let x = VarRef::from_u32(0);
        let e = ev(1, 1, 5, 5, Some(3));
        assert!(e.makes_true(Lit::neq(x, 3)));
        assert!(!e.makes_true(Lit::neq(x, 2)));
        assert_eq!(e.entailed_lit(), Lit::neq(x, 3));
    }
}
