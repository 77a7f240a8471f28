//! The three domain representations of an integer variable.
//!
//! All reversible pieces live in the environment; the representation structs
//! only hold cell handles and immutable metadata. Maintenance of the
//! representation invariants (bounds present, size consistent, never empty)
//! is the domain store's job; the primitives here are raw.

use crate::backtrack::{Env, RevBitSet, RevInt};
use crate::core::IntCst;

/// Kind tag of a variable's domain representation.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum DomainKind {
    Interval,
    Enumerated,
    Constant,
}

/// A domain physically represented as `[lb, ub]`. Interior removals are not
/// representable and are no-ops.
#[derive(Clone)]
pub struct IntervalDom {
    pub lb: RevInt,
    pub ub: RevInt,
}

/// A domain represented as a bit-set over `[offset, offset + capacity)`,
/// with cached bounds and size.
///
/// Invariants (maintained by the store): `lb` and `ub` are present bits and
/// `size >= 1` whenever the variable is not failed.
#[derive(Clone)]
pub struct EnumeratedDom {
    pub bits: RevBitSet,
    pub lb: RevInt,
    pub ub: RevInt,
    pub size: RevInt,
    pub offset: IntCst,
}

impl EnumeratedDom {
    #[inline]
    pub fn contains(&self, env: &Env, value: IntCst) -> bool {
        let Some(bit) = self.bit_of(value) else {
            return false;
        };
        self.bits.contains(env, bit)
    }

    #[inline]
    pub fn bit_of(&self, value: IntCst) -> Option<u32> {
        if value < self.offset || value >= self.offset + self.bits.capacity() as IntCst {
            None
        } else {
            Some((value - self.offset) as u32)
        }
    }

    #[inline]
    pub fn value_of(&self, bit: u32) -> IntCst {
        self.offset + bit as IntCst
    }

    /// Least present value `>= value`, if any.
    pub fn next_present(&self, env: &Env, value: IntCst) -> Option<IntCst> {
        let bit = if value <= self.offset {
            0
        } else {
            self.bit_of(value)?
        };
        self.bits.next_set(env, bit).map(|b| self.value_of(b))
    }

    /// Greatest present value `<= value`, if any.
    pub fn prev_present(&self, env: &Env, value: IntCst) -> Option<IntCst> {
        let last = self.offset + self.bits.capacity() as IntCst - 1;
        let bit = if value >= last { self.bits.capacity() - 1 } else { self.bit_of(value)? };
        self.bits.prev_set(env, bit).map(|b| self.value_of(b))
    }
}

/// The representation of one variable's domain.
#[derive(Clone)]
pub enum Dom {
    Interval(IntervalDom),
    Enumerated(EnumeratedDom),
    Constant(IntCst),
}

impl Dom {
    pub fn kind(&self) -> DomainKind {
        match self {
            Dom::Interval(_) => DomainKind::Interval,
            Dom::Enumerated(_) => DomainKind::Enumerated,
            Dom::Constant(_) => DomainKind::Constant,
        }
    }

    pub fn lb(&self, env: &Env) -> IntCst {
        match self {
            Dom::Interval(d) => env.get_int(d.lb),
            Dom::Enumerated(d) => env.get_int(d.lb),
            Dom::Constant(v) => *v,
        }
    }

    pub fn ub(&self, env: &Env) -> IntCst {
        match self {
            Dom::Interval(d) => env.get_int(d.ub),
            Dom::Enumerated(d) => env.get_int(d.ub),
            Dom::Constant(v) => *v,
        }
    }

    pub fn size(&self, env: &Env) -> u64 {
        match self {
            Dom::Interval(d) => (env.get_int(d.ub) - env.get_int(d.lb) + 1) as u64,
            Dom::Enumerated(d) => env.get_int(d.size) as u64,
            Dom::Constant(_) => 1,
        }
    }

    pub fn contains(&self, env: &Env, value: IntCst) -> bool {
        match self {
            Dom::Interval(d) => env.get_int(d.lb) <= value && value <= env.get_int(d.ub),
            Dom::Enumerated(d) => d.contains(env, value),
            Dom::Constant(v) => *v == value,
        }
    }

    pub fn is_instantiated(&self, env: &Env) -> bool {
        match self {
            Dom::Constant(_) => true,
            _ => self.lb(env) == self.ub(env),
        }
    }

    /// Least domain value strictly greater than `value`, if any.
    pub fn next_value(&self, env: &Env, value: IntCst) -> Option<IntCst> {
        match self {
            Dom::Interval(d) => {
                let (lb, ub) = (env.get_int(d.lb), env.get_int(d.ub));
                if value < lb {
                    Some(lb)
                } else if value < ub {
                    Some(value + 1)
                } else {
                    None
                }
            }
            Dom::Enumerated(d) => {
                if value >= env.get_int(d.ub) {
                    None
                } else {
                    d.next_present(env, value + 1)
                }
            }
            Dom::Constant(v) => (*v > value).then_some(*v),
        }
    }

    /// Greatest domain value strictly smaller than `value`, if any.
    pub fn previous_value(&self, env: &Env, value: IntCst) -> Option<IntCst> {
        match self {
            Dom::Interval(d) => {
                let (lb, ub) = (env.get_int(d.lb), env.get_int(d.ub));
                if value > ub {
                    Some(ub)
                } else if value > lb {
                    Some(value - 1)
                } else {
                    None
                }
            }
            Dom::Enumerated(d) => {
                if value <= env.get_int(d.lb) {
                    None
                } else {
                    d.prev_present(env, value - 1)
                }
            }
            Dom::Constant(v) => (*v < value).then_some(*v),
        }
    }
}
