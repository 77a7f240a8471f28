//! The model facade: variables, named constraints, the objective, and the
//! external literal interface.

use crate::collections::ref_store::{RefMap, RefVec};
use crate::core::state::DomainStore;
use crate::core::{IntCst, VarRef};
use crate::create_ref_type;
use crate::engine::{Propagate, PropagatorId};
use crate::explain::{LitId, LitTable};
use crate::search::{Objective, OptimizeDir};
use crate::cons::{AllDifferent, LinearLeq, NeqVal, NeqVar, Reified, SumElem};
use std::sync::atomic::{AtomicU32, Ordering};

create_ref_type!(ConstraintId);

impl std::fmt::Debug for ConstraintId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "c{}", self.to_u32())
    }
}

/// The only process-wide state: a counter naming anonymous models.
static ANONYMOUS_MODELS: AtomicU32 = AtomicU32::new(0);

fn anonymous_name() -> String {
    format!("model-{}", ANONYMOUS_MODELS.fetch_add(1, Ordering::Relaxed))
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ConstraintStatus {
    /// Declared on the model, not yet handed to the engine.
    Pending,
    Posted,
    Unposted,
}

/// A named group of propagators sharing a lifecycle.
pub struct ConstraintInfo {
    pub name: String,
    /// Filled when the solver posts the constraint.
    pub propagators: Vec<PropagatorId>,
    pub status: ConstraintStatus,
}

/// A model: variables with labels, constraints, and an optional objective.
///
/// The model is declarative; posting to the engine and searching are the
/// solver's business. Mixing ids between two models is a programming error.
pub struct Model {
    pub name: String,
    pub store: DomainStore,
    labels: RefMap<VarRef, String>,
    constraints: RefVec<ConstraintId, ConstraintInfo>,
    /// Constraints declared but not yet handed to the engine.
    pub(crate) pending: Vec<(ConstraintId, Vec<Box<dyn Propagate>>)>,
    pub(crate) objective: Option<Objective>,
    lits: LitTable,
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}

impl Model {
    pub fn new() -> Model {
        Model::named(anonymous_name())
    }

    pub fn named(name: impl Into<String>) -> Model {
        Model {
            name: name.into(),
            store: DomainStore::new(),
            labels: Default::default(),
            constraints: RefVec::new(),
            pending: Vec::new(),
            objective: None,
            lits: LitTable::new(),
        }
    }

    /// Activates the explanation layer; solvers built on this model will
    /// learn clauses from conflicts.
    pub fn enable_explanations(&mut self) {
        self.store.enable_explanations();
    }

    // ======== variables ========

    pub fn new_int_var(&mut self, lb: IntCst, ub: IntCst, label: impl Into<String>) -> VarRef {
        let var = self.store.new_interval_var(lb, ub);
        self.labels.insert(var, label.into());
        var
    }

    /// A variable over an explicit value set, with hole-keeping support.
    pub fn new_enum_var(
        &mut self,
        values: impl IntoIterator<Item = IntCst>,
        label: impl Into<String>,
    ) -> VarRef {
        let var = self.store.new_enum_var(values);
        self.labels.insert(var, label.into());
        var
    }

    pub fn new_const(&mut self, value: IntCst) -> VarRef {
        self.store.new_const(value)
    }

    /// A 0/1 variable, for reification.
    pub fn new_bool_var(&mut self, label: impl Into<String>) -> VarRef {
        self.new_enum_var([0, 1], label)
    }

    pub fn label(&self, var: VarRef) -> Option<&str> {
        self.labels.get(var).map(|s| s.as_str())
    }

    /// All variables, in declaration order. These are also the default
    /// decision variables of a search.
    pub fn variables(&self) -> Vec<VarRef> {
        self.store.variables().collect()
    }

    // ======== constraints ========

    /// Declares a constraint made of a single propagator.
    pub fn post(&mut self, name: impl Into<String>, prop: impl Propagate + 'static) -> ConstraintId {
        self.post_group(name, vec![Box::new(prop)])
    }

    /// Declares a constraint made of several propagators sharing a lifecycle.
    pub fn post_group(&mut self, name: impl Into<String>, props: Vec<Box<dyn Propagate>>) -> ConstraintId {
        let id = self.constraints.push(ConstraintInfo {
            name: name.into(),
            propagators: Vec::new(),
            status: ConstraintStatus::Pending,
        });
        self.pending.push((id, props));
        id
    }

    pub fn constraint(&self, id: ConstraintId) -> &ConstraintInfo {
        &self.constraints[id]
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &ConstraintInfo)> {
        self.constraints.entries()
    }

    pub(crate) fn constraint_mut(&mut self, id: ConstraintId) -> &mut ConstraintInfo {
        &mut self.constraints[id]
    }

    // -------- common constraint builders --------

    /// `sum(factor_i * var_i) <= ub`
    pub fn linear_leq(&mut self, terms: &[(IntCst, VarRef)], ub: IntCst) -> ConstraintId {
        let elems = terms.iter().map(|&(f, v)| SumElem::new(f, v)).collect();
        self.post("linear_leq", LinearLeq::new(elems, ub))
    }

    /// `sum(factor_i * var_i) >= lb`
    pub fn linear_geq(&mut self, terms: &[(IntCst, VarRef)], lb: IntCst) -> ConstraintId {
        let elems = terms.iter().map(|&(f, v)| SumElem::new(-f, v)).collect();
        self.post("linear_geq", LinearLeq::new(elems, -lb))
    }

    /// `sum(factor_i * var_i) = value`, decomposed into the two inequalities.
    pub fn linear_eq(&mut self, terms: &[(IntCst, VarRef)], value: IntCst) -> ConstraintId {
        let up = LinearLeq::new(terms.iter().map(|&(f, v)| SumElem::new(f, v)).collect(), value);
        let down = LinearLeq::new(terms.iter().map(|&(f, v)| SumElem::new(-f, v)).collect(), -value);
        self.post_group("linear_eq", vec![Box::new(up), Box::new(down)])
    }

    /// `a != b`
    pub fn neq(&mut self, a: VarRef, b: VarRef) -> ConstraintId {
        self.post("neq", NeqVar::new(a, b))
    }

    /// `var != value`
    pub fn neq_val(&mut self, var: VarRef, value: IntCst) -> ConstraintId {
        self.post("neq_val", NeqVal::new(var, value))
    }

    pub fn all_different(&mut self, vars: impl IntoIterator<Item = VarRef>) -> ConstraintId {
        self.post("all_different", AllDifferent::new(vars))
    }

    /// `bool_var = 1 <=> prop holds`
    pub fn reify(&mut self, bool_var: VarRef, prop: impl Propagate + 'static) -> ConstraintId {
        self.post("reified", Reified::new(bool_var, prop))
    }

    // ======== objective ========

    pub fn minimize(&mut self, var: VarRef) {
        self.objective = Some(Objective::new(var, OptimizeDir::Minimize));
    }

    pub fn maximize(&mut self, var: VarRef) {
        self.objective = Some(Objective::new(var, OptimizeDir::Maximize));
    }

    pub fn objective(&self) -> Option<&Objective> {
        self.objective.as_ref()
    }

    // ======== explanation interface ========

    pub fn literal_eq(&mut self, var: VarRef, value: IntCst) -> LitId {
        self.lits.literal_eq(var, value)
    }

    pub fn literal_ne(&mut self, var: VarRef, value: IntCst) -> LitId {
        self.lits.literal_ne(var, value)
    }

    pub fn literal_le(&mut self, var: VarRef, value: IntCst) -> LitId {
        self.lits.literal_le(var, value)
    }

    pub fn literal_ge(&mut self, var: VarRef, value: IntCst) -> LitId {
        self.lits.literal_ge(var, value)
    }

    pub fn lit_table(&self) -> &LitTable {
        &self.lits
    }

    /// Formats a variable by its label when it has one.
    pub fn fmt_var(&self, var: VarRef) -> String {
        match self.label(var) {
            Some(l) => l.to_string(),
            None => format!("{var:?}"),
        }
    }
}
