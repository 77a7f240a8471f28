use crate::core::{IntCst, Lit, VarRef};

/// The two branching schemes of the search loop.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DecisionKind {
    /// Left branch `x = v`, refuted by `x != v`.
    Assign(IntCst),
    /// Left branch `x <= v`, refuted by `x > v`.
    SplitLeq(IntCst),
}

/// One entry of the decision stack.
#[derive(Copy, Clone, Debug)]
pub struct DecisionFrame {
    pub var: VarRef,
    pub kind: DecisionKind,
    /// 0 while the left branch is open, 1 on the refutation branch.
    pub branch: u32,
}

impl DecisionFrame {
    pub fn new(var: VarRef, kind: DecisionKind) -> DecisionFrame {
        DecisionFrame { var, kind, branch: 0 }
    }

    /// The literal applied by the current branch.
    pub fn lit(&self) -> Lit {
        match (self.kind, self.branch) {
            (DecisionKind::Assign(v), 0) => Lit::eq(self.var, v),
            (DecisionKind::Assign(v), _) => Lit::neq(self.var, v),
            (DecisionKind::SplitLeq(v), 0) => Lit::leq(self.var, v),
            (DecisionKind::SplitLeq(v), _) => Lit::geq(self.var, v + 1),
        }
    }

    /// True if the refutation branch has also been taken.
    pub fn exhausted(&self) -> bool {
        self.branch >= 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_literals() {
        let x = VarRef::from_u32(0);
        let mut f = DecisionFrame::new(x, DecisionKind::Assign(3));
        assert_eq!(f.lit(), Lit::eq(x, 3));
        f.branch = 1;
        assert_eq!(f.lit(), Lit::neq(x, 3));
        assert!(f.exhausted());

        let mut f = DecisionFrame::new(x, DecisionKind::SplitLeq(5));
        assert_eq!(f.lit(), Lit::leq(x, 5));
        f.branch = 1;
        assert_eq!(f.lit(), Lit::geq(x, 6));
    }
}
