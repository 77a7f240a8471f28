use crate::core::state::DomainStore;
use crate::core::{IntCst, VarRef};
use std::sync::Arc;

/// A snapshot of every variable's value at a quiescent leaf.
///
/// Auxiliary variables that the store left uninstantiated are snapshot at
/// their lower bound.
#[derive(Clone, Debug)]
pub struct Solution {
    values: Vec<IntCst>,
    objective: Option<IntCst>,
}

impl Solution {
    pub fn from_store(store: &DomainStore, objective: Option<IntCst>) -> Solution {
        Solution {
            values: store.variables().map(|v| store.lb(v)).collect(),
            objective,
        }
    }

    pub fn value(&self, var: VarRef) -> IntCst {
        self.values[usize::from(var)]
    }

    pub fn objective(&self) -> Option<IntCst> {
        self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.values.len()
    }
}

/// Indexed table of the solutions recorded during a search run.
#[derive(Clone, Default)]
pub struct SolutionPool {
    solutions: Vec<Arc<Solution>>,
}

impl SolutionPool {
    pub fn new() -> SolutionPool {
        SolutionPool::default()
    }

    pub fn record(&mut self, solution: Arc<Solution>) {
        self.solutions.push(solution);
    }

    pub fn len(&self) -> usize {
        self.solutions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.solutions.is_empty()
    }

    pub fn get(&self, index: usize) -> &Arc<Solution> {
        &self.solutions[index]
    }

    pub fn last(&self) -> Option<&Arc<Solution>> {
        self.solutions.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Solution>> {
        self.solutions.iter()
    }

    pub fn clear(&mut self) {
        self.solutions.clear();
    }
}
