#![doc = include_str!("../README.md")]

pub mod bridging;
pub mod context;
pub mod error;
pub mod resolver;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use bridging::ForeignBridge;
pub use context::{
    ArchetypeResolver, DeclId, DeclKind, GenericParamId, GenericResolver, ModuleId, ScopeId,
    ScopeKind, SignatureResolver, TypeDatabase, TypeVarId, UnqualifiedResult,
};
pub use error::{Diagnostics, TypeError};
pub use resolver::substitute::{apply_substitution, subst_member_ty_with_base, SubstitutionMap};
pub use resolver::{Binding, TypeResolver, MAX_TYPE_DEPTH};
pub use types::{FnExtInfo, TupleElem, Ty, TyInterner, TyKind};
