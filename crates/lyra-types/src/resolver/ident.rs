//! Resolution of dotted identifier paths to types.
//!
//! Each path segment resolves at most once per session: the outcome is
//! recorded in the resolver's binding cache keyed by the segment's id, so
//! re-resolving a shared sub-path is a lookup, produces no new
//! diagnostics, and yields the identical type.

use lyra_syntax::PathSegment;
use miette::SourceSpan;

use super::{generics, in_context, Binding, TypeResolver};
use crate::context::db::{DeclId, ScopeId, UnqualifiedResult};
use crate::context::strategy::GenericResolver;
use crate::error::TypeError;
use crate::types::{Ty, TyKind};

/// Resolves a full identifier path to a type.
///
/// A path that names a module rather than a type is an error here; the
/// module interpretation is only meaningful for a non-final segment.
pub fn resolve_identifier_type(
    r: &TypeResolver<'_>,
    segments: &[PathSegment],
    span: SourceSpan,
    scope: ScopeId,
    allow_unbound: bool,
    diagnose_errors: bool,
    strategy: &dyn GenericResolver,
) -> Ty {
    let Some((last, parents)) = segments.split_last() else {
        return r.error_ty();
    };
    let sole = parents.is_empty();
    match resolve_component(r, parents, last, sole, scope, allow_unbound, diagnose_errors, strategy)
    {
        Binding::Ty(ty) => ty,
        Binding::Module(module) => {
            if diagnose_errors {
                r.diags.report(TypeError::ModuleUsedAsType {
                    name: r.db.module_name(module),
                    span,
                });
            }
            // Settle the final segment on the error type so re-resolution is
            // a cache hit instead of a second diagnostic.
            let ty = r.error_ty();
            r.bind(last.id, Binding::Ty(ty.clone()));
            ty
        }
        Binding::Decl(_) => unreachable!("declaration binding must be finished before returning"),
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_component(
    r: &TypeResolver<'_>,
    parents: &[PathSegment],
    comp: &PathSegment,
    sole: bool,
    scope: ScopeId,
    allow_unbound: bool,
    diagnose_errors: bool,
    strategy: &dyn GenericResolver,
) -> Binding {
    if let Some(binding) = r.binding(comp.id) {
        return match binding {
            Binding::Decl(decl) => {
                finish_bound(r, comp, decl, scope, allow_unbound, diagnose_errors, strategy)
            }
            cached => cached,
        };
    }
    match parents.split_last() {
        None => {
            resolve_first_component(r, comp, sole, scope, allow_unbound, diagnose_errors, strategy)
        }
        Some((parent_comp, rest)) => {
            let parent = resolve_component(
                r,
                rest,
                parent_comp,
                false,
                scope,
                allow_unbound,
                diagnose_errors,
                strategy,
            );
            resolve_member_component(
                r,
                parent,
                comp,
                scope,
                allow_unbound,
                diagnose_errors,
                strategy,
            )
        }
    }
}

/// Resolves a segment that an earlier pass already bound to a declaration,
/// upgrading the cached binding to the resolved type.
fn finish_bound(
    r: &TypeResolver<'_>,
    comp: &PathSegment,
    decl: DeclId,
    scope: ScopeId,
    allow_unbound: bool,
    diagnose_errors: bool,
    strategy: &dyn GenericResolver,
) -> Binding {
    if !r.db.decl_kind(decl).is_type() {
        if diagnose_errors {
            r.diags.report(TypeError::NonTypeUsedAsType {
                name: comp.ident.name.clone(),
                span: comp.span(),
                decl_span: r.db.decl_span(decl),
            });
        }
        let binding = Binding::Ty(r.error_ty());
        r.bind(comp.id, binding.clone());
        return binding;
    }
    let ty = resolve_type_decl(r, comp, decl, None, scope, allow_unbound, diagnose_errors, strategy);
    let binding = Binding::Ty(ty);
    r.bind(comp.id, binding.clone());
    binding
}

/// Resolves the leading segment of a path by unqualified lookup.
fn resolve_first_component(
    r: &TypeResolver<'_>,
    comp: &PathSegment,
    sole: bool,
    scope: ScopeId,
    allow_unbound: bool,
    diagnose_errors: bool,
    strategy: &dyn GenericResolver,
) -> Binding {
    let db = r.db;
    let name = comp.ident.name.as_str();
    let results = db.unqualified_lookup(scope, name);

    let mut ty_candidate: Option<Ty> = None;
    let mut module_candidate = None;
    let mut ambiguous = false;

    for result in &results {
        match *result {
            UnqualifiedResult::Module(module) => {
                // A second module under the same name is a conflict even
                // before any type shows up.
                if module_candidate.is_some() {
                    ambiguous = true;
                } else {
                    module_candidate = Some(module);
                }
            }
            UnqualifiedResult::Decl(decl) => {
                // Non-type declarations do not shadow type declarations in
                // type position.
                if !db.decl_kind(decl).is_type() {
                    continue;
                }
                let ty = resolve_type_decl(
                    r,
                    comp,
                    decl,
                    Some(scope),
                    scope,
                    allow_unbound,
                    diagnose_errors,
                    strategy,
                );
                if ty.is_error() {
                    let binding = Binding::Ty(ty);
                    r.bind(comp.id, binding.clone());
                    return binding;
                }
                match &ty_candidate {
                    // Distinct aliases of the same type are not ambiguous.
                    Some(previous) if *previous == ty => {}
                    Some(_) => ambiguous = true,
                    None => ty_candidate = Some(ty),
                }
            }
        }
    }

    // A module and a type under one name is a conflict, same as two
    // unequal types.
    if ty_candidate.is_some() && module_candidate.is_some() {
        ambiguous = true;
    }
    if ambiguous {
        if diagnose_errors {
            r.diags.report(TypeError::AmbiguousTypeBase {
                name: name.to_string(),
                span: comp.span(),
                candidates: results.iter().map(|result| describe_candidate(r, result)).collect(),
            });
        }
        let binding = Binding::Ty(r.error_ty());
        r.bind(comp.id, binding.clone());
        return binding;
    }
    if let Some(ty) = ty_candidate {
        let binding = Binding::Ty(ty);
        r.bind(comp.id, binding.clone());
        return binding;
    }
    if let Some(module) = module_candidate {
        let binding = Binding::Module(module);
        r.bind(comp.id, binding.clone());
        return binding;
    }

    if diagnose_errors {
        let error = if sole {
            TypeError::UndeclaredType { name: name.to_string(), span: comp.span() }
        } else {
            TypeError::UnknownNameInType { name: name.to_string(), span: comp.span() }
        };
        r.diags.report(error);
    }
    let binding = Binding::Ty(r.error_ty());
    r.bind(comp.id, binding.clone());
    binding
}

/// Resolves a non-leading segment against its parent's binding.
fn resolve_member_component(
    r: &TypeResolver<'_>,
    parent: Binding,
    comp: &PathSegment,
    scope: ScopeId,
    allow_unbound: bool,
    diagnose_errors: bool,
    strategy: &dyn GenericResolver,
) -> Binding {
    let db = r.db;
    let name = comp.ident.name.as_str();

    let (candidates, base_desc) = match parent {
        Binding::Ty(parent_ty) => {
            if parent_ty.is_error() {
                return Binding::Ty(r.error_ty());
            }
            if parent_ty.is_dependent() {
                // Member lookup cannot see through a dependent base; defer
                // to the strategy. Generic arguments have nothing to bind
                // to here.
                if !comp.generic_args.is_empty() && diagnose_errors {
                    r.diags.report(TypeError::NotGenericType {
                        ty: format!("{parent_ty}.{name}"),
                        span: comp.span(),
                    });
                }
                let ty = strategy.resolve_dependent_member(
                    db,
                    &r.interner,
                    parent_ty,
                    scope,
                    &comp.ident,
                );
                let binding = Binding::Ty(ty);
                r.bind(comp.id, binding.clone());
                return binding;
            }
            let candidates = db.member_type_lookup(&parent_ty, name);
            if candidates.is_empty() {
                if diagnose_errors {
                    r.diags.report(TypeError::UnknownMemberType {
                        name: name.to_string(),
                        base: parent_ty.to_string(),
                        span: comp.span(),
                    });
                }
                let binding = Binding::Ty(r.error_ty());
                r.bind(comp.id, binding.clone());
                return binding;
            }
            (candidates, parent_ty.to_string())
        }
        Binding::Module(module) => {
            let candidates = db.module_type_lookup(module, name);
            if candidates.is_empty() {
                if diagnose_errors {
                    r.diags.report(TypeError::NoModuleMemberType {
                        name: name.to_string(),
                        module: db.module_name(module),
                        span: comp.span(),
                    });
                }
                let binding = Binding::Ty(r.error_ty());
                r.bind(comp.id, binding.clone());
                return binding;
            }
            (candidates, db.module_name(module))
        }
        Binding::Decl(_) => unreachable!("parent binding must be finished before member lookup"),
    };

    let mut unique: Option<(DeclId, Ty)> = None;
    let mut ambiguous = false;
    for (decl, ty) in &candidates {
        match &unique {
            Some((_, previous)) if previous == ty => {}
            Some(_) => ambiguous = true,
            None => unique = Some((*decl, ty.clone())),
        }
    }
    if ambiguous {
        if diagnose_errors {
            r.diags.report(TypeError::AmbiguousMemberType {
                name: name.to_string(),
                base: base_desc,
                span: comp.span(),
                candidates: candidates
                    .iter()
                    .map(|(decl, _)| describe_decl(r, *decl))
                    .collect(),
            });
        }
        let binding = Binding::Ty(r.error_ty());
        r.bind(comp.id, binding.clone());
        return binding;
    }

    let (decl, ty) = unique.unwrap();
    db.ensure_validated(decl);
    let ty = finish_decl_ty(r, comp, decl, ty, scope, allow_unbound, diagnose_errors, strategy);
    let binding = Binding::Ty(ty);
    r.bind(comp.id, binding.clone());
    binding
}

/// Resolves a segment's bound declaration to the type it denotes, applying
/// any explicit generic arguments.
#[allow(clippy::too_many_arguments)]
fn resolve_type_decl(
    r: &TypeResolver<'_>,
    comp: &PathSegment,
    decl: DeclId,
    from_scope: Option<ScopeId>,
    scope: ScopeId,
    allow_unbound: bool,
    diagnose_errors: bool,
    strategy: &dyn GenericResolver,
) -> Ty {
    r.db.ensure_validated(decl);
    let ty = match from_scope {
        Some(from) => in_context::resolve_type_in_context(
            r,
            decl,
            from,
            !comp.generic_args.is_empty(),
            strategy,
        ),
        None => r.db.declared_ty(decl).unwrap_or_else(|| r.error_ty()),
    };
    finish_decl_ty(r, comp, decl, ty, scope, allow_unbound, diagnose_errors, strategy)
}

#[allow(clippy::too_many_arguments)]
fn finish_decl_ty(
    r: &TypeResolver<'_>,
    comp: &PathSegment,
    decl: DeclId,
    ty: Ty,
    scope: ScopeId,
    allow_unbound: bool,
    diagnose_errors: bool,
    strategy: &dyn GenericResolver,
) -> Ty {
    if ty.is_error() {
        return ty;
    }
    if !comp.generic_args.is_empty() {
        return generics::apply_generic_arguments(
            r,
            ty,
            &comp.generic_args,
            comp.span(),
            scope,
            strategy,
        );
    }
    if matches!(ty.kind(), TyKind::UnboundGeneric { .. }) && !allow_unbound {
        if diagnose_errors {
            r.diags.report(TypeError::UnboundGenericType {
                ty: ty.to_string(),
                span: comp.span(),
                decl_span: r.db.decl_span(decl),
            });
        }
        return r.error_ty();
    }
    ty
}

fn describe_candidate(r: &TypeResolver<'_>, result: &UnqualifiedResult) -> String {
    match *result {
        UnqualifiedResult::Module(module) => format!("module `{}`", r.db.module_name(module)),
        UnqualifiedResult::Decl(decl) => describe_decl(r, decl),
    }
}

fn describe_decl(r: &TypeResolver<'_>, decl: DeclId) -> String {
    format!("{} `{}`", r.db.decl_kind(decl).describe(), r.db.decl_name(decl))
}
