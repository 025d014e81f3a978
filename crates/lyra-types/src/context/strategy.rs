use lyra_syntax::Ident;

use super::db::{GenericParamId, ScopeId, TypeDatabase};
use crate::types::{Ty, TyInterner, TyKind};

/// How generic parameters and `Self` materialize during resolution.
///
/// The identifier resolver and context projection are generic over this
/// seam: resolving a type inside a declaration body wants archetypes,
/// while resolving a declaration's signature wants interface-form
/// parameter types that a later phase substitutes.
pub trait GenericResolver {
    /// The type of a reference to the generic parameter `param`.
    fn resolve_generic_param(
        &self,
        db: &dyn TypeDatabase,
        interner: &TyInterner,
        param: GenericParamId,
    ) -> Ty;

    /// The `Self` type of the nominal enclosing `scope`.
    fn resolve_type_of_context(
        &self,
        db: &dyn TypeDatabase,
        interner: &TyInterner,
        scope: ScopeId,
    ) -> Ty;

    /// A member type reference whose base is still dependent.
    fn resolve_dependent_member(
        &self,
        db: &dyn TypeDatabase,
        interner: &TyInterner,
        base: Ty,
        scope: ScopeId,
        name: &Ident,
    ) -> Ty;
}

/// Resolves generic parameters to their in-scope archetypes. The default
/// strategy for resolving types inside declaration bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ArchetypeResolver;

impl GenericResolver for ArchetypeResolver {
    fn resolve_generic_param(
        &self,
        db: &dyn TypeDatabase,
        _interner: &TyInterner,
        param: GenericParamId,
    ) -> Ty {
        db.archetype_ty(param)
    }

    fn resolve_type_of_context(
        &self,
        db: &dyn TypeDatabase,
        interner: &TyInterner,
        scope: ScopeId,
    ) -> Ty {
        db.archetype_self_ty(scope).unwrap_or_else(|| interner.error())
    }

    fn resolve_dependent_member(
        &self,
        _db: &dyn TypeDatabase,
        interner: &TyInterner,
        base: Ty,
        _scope: ScopeId,
        name: &Ident,
    ) -> Ty {
        interner.intern(TyKind::DependentMember { base, name: name.name.clone() })
    }
}

/// Resolves generic parameters to their interface form, for positions in a
/// declaration signature where substitution happens later.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignatureResolver;

impl GenericResolver for SignatureResolver {
    fn resolve_generic_param(
        &self,
        db: &dyn TypeDatabase,
        _interner: &TyInterner,
        param: GenericParamId,
    ) -> Ty {
        db.param_ty(param)
    }

    fn resolve_type_of_context(
        &self,
        db: &dyn TypeDatabase,
        interner: &TyInterner,
        scope: ScopeId,
    ) -> Ty {
        db.interface_self_ty(scope).unwrap_or_else(|| interner.error())
    }

    fn resolve_dependent_member(
        &self,
        _db: &dyn TypeDatabase,
        interner: &TyInterner,
        base: Ty,
        _scope: ScopeId,
        name: &Ident,
    ) -> Ty {
        interner.intern(TyKind::DependentMember { base, name: name.name.clone() })
    }
}
