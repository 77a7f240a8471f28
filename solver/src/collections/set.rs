use crate::collections::ref_store::{Ref, RefMap};

/// A set of typed ids with O(1) membership tests and iteration/clearing that is
/// linear in the number of *present* elements.
#[derive(Clone)]
pub struct IterableRefSet<K> {
    members: RefMap<K, ()>,
    elements: Vec<K>,
}

impl<K> Default for IterableRefSet<K> {
    fn default() -> Self {
        IterableRefSet {
            members: Default::default(),
            elements: Default::default(),
        }
    }
}

impl<K: Ref> IterableRefSet<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn contains(&self, k: K) -> bool {
        self.members.contains(k)
    }

    pub fn insert(&mut self, k: K) {
        if !self.members.contains(k) {
            self.members.insert(k, ());
            self.elements.push(k);
        }
    }

    pub fn clear(&mut self) {
        for k in self.elements.drain(..) {
            self.members.remove(k);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.elements.iter().copied()
    }
}
