use crate::core::{IntCst, Lit};
use crate::create_ref_type;

create_ref_type!(VarRef);

impl std::fmt::Debug for VarRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "var{}", self.to_u32())
    }
}

impl VarRef {
    pub fn leq(self, value: IntCst) -> Lit {
        Lit::leq(self, value)
    }
    pub fn lt(self, value: IntCst) -> Lit {
        Lit::leq(self, value - 1)
    }
    pub fn geq(self, value: IntCst) -> Lit {
        Lit::geq(self, value)
    }
    pub fn gt(self, value: IntCst) -> Lit {
        Lit::geq(self, value + 1)
    }
    pub fn eq(self, value: IntCst) -> Lit {
        Lit::eq(self, value)
    }
    pub fn neq(self, value: IntCst) -> Lit {
        Lit::neq(self, value)
    }
}
