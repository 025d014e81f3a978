use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashSet;

use super::{Ty, TyKind};

/// Hash-consing interner for semantic types.
///
/// Structurally equal types share a single allocation, so equality after
/// interning is cheap and the resolver's canonicalization invariant holds
/// by construction. The interner is cheaply cloneable; clones share the
/// same table.
#[derive(Debug, Clone, Default)]
pub struct TyInterner {
    table: Rc<RefCell<FxHashSet<Ty>>>,
}

impl TyInterner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the canonical `Ty` for `kind`, allocating it on first use.
    pub fn intern(&self, kind: TyKind) -> Ty {
        let ty = Ty::new(kind);
        let mut table = self.table.borrow_mut();
        if let Some(existing) = table.get(&ty) {
            return existing.clone();
        }
        table.insert(ty.clone());
        ty
    }

    /// The canonical error type.
    pub fn error(&self) -> Ty {
        self.intern(TyKind::Error)
    }

    /// The empty tuple type `()`.
    pub fn unit(&self) -> Ty {
        self.intern(TyKind::Tuple(Vec::new()))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.table.borrow().len()
    }
}
