use crate::core::{IntCst, VarRef};

/// The relation of an atomic predicate over one variable.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Rel {
    Eq,
    Neq,
    Leq,
    Geq,
}

/// A literal: an atomic predicate `x = v`, `x ≠ v`, `x ≤ v` or `x ≥ v`.
///
/// Literals are plain values; stable dense integer identifiers for the
/// external explanation interface are handed out by the interning table in
/// the `explain` module.
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct Lit {
    var: VarRef,
    rel: Rel,
    value: IntCst,
}

impl Lit {
    pub const fn new(var: VarRef, rel: Rel, value: IntCst) -> Lit {
        Lit { var, rel, value }
    }

    pub fn eq(var: VarRef, value: IntCst) -> Lit {
        Lit::new(var, Rel::Eq, value)
    }
    pub fn neq(var: VarRef, value: IntCst) -> Lit {
        Lit::new(var, Rel::Neq, value)
    }
    pub fn leq(var: VarRef, value: IntCst) -> Lit {
        Lit::new(var, Rel::Leq, value)
    }
    pub fn geq(var: VarRef, value: IntCst) -> Lit {
        Lit::new(var, Rel::Geq, value)
    }

    pub fn variable(self) -> VarRef {
        self.var
    }

    pub fn relation(self) -> Rel {
        self.rel
    }

    pub fn value(self) -> IntCst {
        self.value
    }

    /// True if this literal being true forces `other` to be true, regardless
    /// of the domain.
    pub fn entails(self, other: Lit) -> bool {
        if self.var != other.var {
            return false;
        }
        match (self.rel, other.rel) {
            (a, b) if a == b && self.value == other.value => true,
            (Rel::Leq, Rel::Leq) => self.value <= other.value,
            (Rel::Geq, Rel::Geq) => self.value >= other.value,
            (Rel::Eq, Rel::Leq) => self.value <= other.value,
            (Rel::Eq, Rel::Geq) => self.value >= other.value,
            (Rel::Eq, Rel::Neq) => self.value != other.value,
            (Rel::Leq, Rel::Neq) => other.value > self.value,
            (Rel::Geq, Rel::Neq) => other.value < self.value,
            _ => false,
        }
    }
}

impl std::ops::Not for Lit {
    type Output = Lit;

    fn not(self) -> Lit {
        match self.rel {
            Rel::Eq => Lit::neq(self.var, self.value),
            Rel::Neq => Lit::eq(self.var, self.value),
            Rel::Leq => Lit::geq(self.var, self.value + 1),
            Rel::Geq => Lit::leq(self.var, self.value - 1),
        }
    }
}

impl std::fmt::Debug for Lit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let op = match self.rel {
            Rel::Eq => "=",
            Rel::Neq => "!=",
            Rel::Leq => "<=",
            Rel::Geq => ">=",
        };
        write!(f, "[{:?} {op} {}]", self.var, self.value)
    }
}
