use crate::core::{IntCst, Lit, VarRef};
use crate::create_ref_type;
use hashbrown::HashMap;

create_ref_type!(LitId);

impl std::fmt::Debug for LitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "lit{}", self.to_u32())
    }
}

/// Interning table handing out stable dense integer identifiers for literals.
///
/// Identifiers are stable for the lifetime of the model: interning the same
/// predicate twice returns the same id.
#[derive(Default)]
pub struct LitTable {
    lits: Vec<Lit>,
    ids: HashMap<Lit, LitId>,
}

impl LitTable {
    pub fn new() -> LitTable {
        LitTable::default()
    }

    pub fn intern(&mut self, lit: Lit) -> LitId {
        if let Some(&id) = self.ids.get(&lit) {
            return id;
        }
        let id = LitId::from(self.lits.len());
        self.lits.push(lit);
        self.ids.insert(lit, id);
        id
    }

    pub fn literal_eq(&mut self, var: VarRef, value: IntCst) -> LitId {
        self.intern(Lit::eq(var, value))
    }

    pub fn literal_ne(&mut self, var: VarRef, value: IntCst) -> LitId {
        self.intern(Lit::neq(var, value))
    }

    pub fn literal_le(&mut self, var: VarRef, value: IntCst) -> LitId {
        self.intern(Lit::leq(var, value))
    }

    pub fn literal_ge(&mut self, var: VarRef, value: IntCst) -> LitId {
        self.intern(Lit::geq(var, value))
    }

    pub fn lit(&self, id: LitId) -> Lit {
        self.lits[usize::from(id)]
    }

    pub fn len(&self) -> usize {
        self.lits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lits.is_empty()
    }
}
