use crate::core::state::{Cause, Contradiction, DomainStore, EventMask, Reason};
use crate::core::{cst_int_to_long, cst_long_to_int, IntCst, Lit, LongCst, VarRef};
use crate::engine::{Entailment, Priority, Propagate, PropagationOutcome, PropagatorId, Watches};
use itertools::Itertools;
use num_integer::{div_ceil, div_floor};

/// One term `factor * var` of a linear sum. The factor is non-zero.
#[derive(Copy, Clone, Eq, PartialEq)]
pub struct SumElem {
    pub factor: IntCst,
    pub var: VarRef,
}

impl SumElem {
    pub fn new(factor: IntCst, var: VarRef) -> SumElem {
        debug_assert_ne!(factor, 0);
        SumElem { factor, var }
    }

    /// Smallest value `factor * var` can take.
    fn contrib_lb(&self, store: &DomainStore) -> LongCst {
        let f = cst_int_to_long(self.factor);
        if self.factor > 0 {
            cst_int_to_long(store.lb(self.var)).saturating_mul(f)
        } else {
            cst_int_to_long(store.ub(self.var)).saturating_mul(f)
        }
    }

    /// Largest value `factor * var` can take.
    fn contrib_ub(&self, store: &DomainStore) -> LongCst {
        let f = cst_int_to_long(self.factor);
        if self.factor > 0 {
            cst_int_to_long(store.ub(self.var)).saturating_mul(f)
        } else {
            cst_int_to_long(store.lb(self.var)).saturating_mul(f)
        }
    }

    /// The literal currently entailing this term's lower contribution.
    fn supporting_lit(&self, store: &DomainStore) -> Lit {
        if self.factor > 0 {
            Lit::geq(self.var, store.lb(self.var))
        } else {
            Lit::leq(self.var, store.ub(self.var))
        }
    }

    /// Enforces `factor * var <= ub`.
    fn set_contrib_ub(
        &self,
        ub: LongCst,
        store: &mut DomainStore,
        cause: Cause,
        reason: Option<Reason>,
    ) -> Result<bool, crate::core::state::Wipeout> {
        let f = cst_int_to_long(self.factor);
        if self.factor > 0 {
            store.update_ub(self.var, cst_long_to_int(div_floor(ub, f)), cause, reason)
        } else {
            store.update_lb(self.var, cst_long_to_int(div_ceil(ub, f)), cause, reason)
        }
    }
}

impl std::fmt::Debug for SumElem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.factor != 1 {
            write!(f, "{}*", self.factor)?;
        }
        write!(f, "{:?}", self.var)
    }
}

/// Bounds-consistent propagator for `sum(factor_i * var_i) <= ub`.
#[derive(Clone, Debug)]
pub struct LinearLeq {
    pub elements: Vec<SumElem>,
    pub ub: IntCst,
}

impl LinearLeq {
    pub fn new(elements: Vec<SumElem>, ub: IntCst) -> LinearLeq {
        debug_assert!(elements.iter().map(|e| e.var).all_unique());
        LinearLeq { elements, ub }
    }

    /// Literals entailing the current lower bound of the sum.
    fn supports(&self, store: &DomainStore) -> Reason {
        Reason::from(self.elements.iter().map(|e| e.supporting_lit(store)))
    }

    /// Like [`LinearLeq::supports`] but excluding the term at `skip`.
    fn supports_excluding(&self, store: &DomainStore, skip: usize) -> Reason {
        Reason::from(
            self.elements
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != skip)
                .map(|(_, e)| e.supporting_lit(store)),
        )
    }
}

impl Propagate for LinearLeq {
    fn variables(&self) -> Vec<VarRef> {
        self.elements.iter().map(|e| e.var).collect()
    }

    fn setup(&self, id: PropagatorId, watches: &mut Watches) {
        for (i, e) in self.elements.iter().enumerate() {
            // only a raise of the term's lower contribution can trigger filtering
            let mask = if e.factor > 0 { EventMask::INCLOW } else { EventMask::DECUPP };
            watches.attach(e.var, id, i as u32, mask);
        }
    }

    fn priority(&self) -> Priority {
        match self.elements.len() {
            0 | 1 => Priority::Unary,
            2 => Priority::Binary,
            3 => Priority::Ternary,
            _ => Priority::Linear,
        }
    }

    fn propagate(&mut self, store: &mut DomainStore, cause: Cause) -> Result<PropagationOutcome, Contradiction> {
        let sum_lb: LongCst = self.elements.iter().map(|e| e.contrib_lb(store)).sum();
        let slack = cst_int_to_long(self.ub) - sum_lb;
        if slack < 0 {
            return Err(Contradiction::Failure(self.supports(store)));
        }
        let mut sum_ub: LongCst = 0;
        for (i, e) in self.elements.iter().enumerate() {
            let lb = e.contrib_lb(store);
            let ub = e.contrib_ub(store);
            debug_assert!(lb <= ub);
            if ub - lb > slack {
                let reason = store
                    .explanations_enabled()
                    .then(|| self.supports_excluding(store, i));
                let _ = e.set_contrib_ub(lb + slack, store, cause, reason)?;
                sum_ub += lb + slack;
            } else {
                sum_ub += ub;
            }
        }
        if sum_ub <= cst_int_to_long(self.ub) {
            Ok(PropagationOutcome::Passive)
        } else {
            Ok(PropagationOutcome::Active)
        }
    }

    fn is_entailed(&self, store: &DomainStore) -> Entailment {
        let sum_lb: LongCst = self.elements.iter().map(|e| e.contrib_lb(store)).sum();
        let sum_ub: LongCst = self.elements.iter().map(|e| e.contrib_ub(store)).sum();
        if sum_ub <= cst_int_to_long(self.ub) {
            Entailment::True
        } else if sum_lb > cst_int_to_long(self.ub) {
            Entailment::False
        } else {
            Entailment::Undefined
        }
    }

    fn describe(&self) -> String {
        format!("{:?} <= {}", self.elements, self.ub)
    }
}
