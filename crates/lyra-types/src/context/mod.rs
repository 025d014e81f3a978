//! The host-compiler seam: identifiers, declaration metadata, and the
//! lookup/validation services the resolver consumes.

pub mod db;
pub mod strategy;

pub use db::{
    DeclId, DeclKind, GenericParamId, ModuleId, ScopeId, ScopeKind, TypeDatabase, TypeVarId,
    UnqualifiedResult,
};
pub use strategy::{ArchetypeResolver, GenericResolver, SignatureResolver};
