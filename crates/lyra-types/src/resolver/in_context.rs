//! Projection of a found type declaration onto the scope that found it.

use super::substitute::subst_member_ty_with_base;
use super::TypeResolver;
use crate::context::db::{DeclId, DeclKind, ScopeId, ScopeKind};
use crate::context::strategy::GenericResolver;
use crate::types::{Ty, TyKind};

/// Turns a declaration found by name lookup into the type it denotes from
/// `from_scope`.
///
/// The same declaration denotes different types from different places: a
/// generic parameter becomes an archetype or interface parameter, an
/// unspecialized generic nominal named inside its own body means `Self`,
/// and a member type of a generic or protocol context is projected through
/// whatever the context binds its parameters to. `is_specialized` is true
/// when explicit generic arguments follow, which suppresses the implicit
/// self interpretation.
pub fn resolve_type_in_context(
    r: &TypeResolver<'_>,
    decl: DeclId,
    from_scope: ScopeId,
    is_specialized: bool,
    strategy: &dyn GenericResolver,
) -> Ty {
    let db = r.db;

    if let Some(param) = db.generic_param_decl(decl) {
        return strategy.resolve_generic_param(db, &r.interner, param);
    }

    let kind = db.decl_kind(decl);

    // A generic nominal named without arguments inside its own body or an
    // extension of it means the context's self type, with the parameters
    // implicitly bound.
    if kind.is_nominal() && !db.generic_params(decl).is_empty() && !is_specialized {
        let mut scope = Some(from_scope);
        while let Some(current) = scope {
            match db.scope_kind(current) {
                ScopeKind::Module | ScopeKind::File | ScopeKind::TopLevel => break,
                scope_kind
                    if scope_kind.is_type_context() && db.scope_nominal(current) == Some(decl) =>
                {
                    return strategy.resolve_type_of_context(db, &r.interner, current);
                }
                _ => scope = db.parent_scope(current),
            }
        }
    }

    let owner_scope = db.decl_scope(decl);
    if !db.scope_kind(owner_scope).is_type_context() {
        // Top-level and local type declarations denote their declared type
        // everywhere; there is no outer generic context to project through.
        return db.declared_ty(decl).unwrap_or_else(|| r.error_ty());
    }

    let owner = db.scope_nominal(owner_scope);

    // Find the innermost type context the reference sits in.
    let mut nearest = from_scope;
    while !db.scope_kind(nearest).is_type_context() {
        match db.parent_scope(nearest) {
            Some(parent) => nearest = parent,
            None => unreachable!("member type found outside of any type context"),
        }
    }

    // An associated type resolves through the Self of the protocol the
    // reference sits in, which may inherit it from the declaring protocol:
    // dependently in a signature, through the Self archetype otherwise.
    if kind == DeclKind::AssociatedType {
        if let Some(from_nominal) = db.scope_nominal(nearest) {
            if db.decl_kind(from_nominal) == DeclKind::Protocol {
                let self_param = db.protocol_self_param(from_nominal);
                let base = strategy.resolve_generic_param(db, &r.interner, self_param);
                if base.is_dependent() {
                    return r
                        .interner
                        .intern(TyKind::DependentMember { base, name: db.decl_name(decl) });
                }
                if owner_scope != nearest {
                    let base = db.archetype_ty(self_param);
                    return subst_member_ty_with_base(db, &r.interner, decl, &base);
                }
            }
        }
    }

    // Walk enclosing type contexts outward, following each context's
    // superclass chain, until we find the nominal that owns the member.
    let mut scope = Some(nearest);
    while let Some(current) = scope {
        if db.scope_kind(current).is_type_context() {
            let mut base = Some(strategy.resolve_type_of_context(db, &r.interner, current));
            while let Some(ty) = base {
                if ty.nominal_decl() == owner {
                    return subst_member_ty_with_base(db, &r.interner, decl, &ty);
                }
                base = db.superclass_of(&ty);
            }
        }
        scope = db.parent_scope(current);
    }
    unreachable!("member type declaration not reachable from the scope that found it")
}
