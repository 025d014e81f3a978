//! Binding of explicit generic arguments to an unbound generic type.

use lyra_syntax::TypeExpr;
use miette::SourceSpan;

use super::substitute::SubstitutionMap;
use super::TypeResolver;
use crate::context::db::ScopeId;
use crate::context::strategy::GenericResolver;
use crate::error::TypeError;
use crate::types::{Ty, TyKind};

/// Applies explicit generic arguments to `ty`.
///
/// Only an unbound generic reference accepts arguments; anything else is
/// diagnosed and comes back unchanged so resolution can continue with the
/// argument-free meaning. A successful application checks the declared
/// conformance requirements unless the result is still dependent, in which
/// case checking belongs to a later substitution.
pub fn apply_generic_arguments(
    r: &TypeResolver<'_>,
    ty: Ty,
    args: &[TypeExpr],
    span: SourceSpan,
    scope: ScopeId,
    strategy: &dyn GenericResolver,
) -> Ty {
    if ty.is_error() {
        return ty;
    }
    let TyKind::UnboundGeneric { decl, name, parent } = ty.kind() else {
        r.diags.report(TypeError::NotGenericType { ty: ty.to_string(), span });
        return ty;
    };

    let params = r.db.generic_params(*decl);
    if params.len() != args.len() {
        r.diags.report(TypeError::GenericArgCountMismatch {
            name: name.clone(),
            expected: params.len(),
            found: args.len(),
            span,
            decl_span: r.db.decl_span(*decl),
        });
        return r.error_ty();
    }

    let mut resolved = Vec::with_capacity(args.len());
    for arg in args {
        let arg_ty = r.resolve_with(arg, scope, false, strategy);
        if arg_ty.is_error() {
            return r.error_ty();
        }
        resolved.push(arg_ty);
    }

    let bound = r.interner.intern(TyKind::BoundGeneric {
        decl: *decl,
        name: name.clone(),
        parent: parent.clone(),
        args: resolved.clone(),
    });

    // Requirements on a still-dependent binding are checked when the
    // remaining parameters are substituted.
    if !bound.is_dependent() && !bound.has_type_var() {
        let subst: SubstitutionMap = params.into_iter().zip(resolved).collect();
        if !r.db.check_substitutions(&subst, scope, span, r.diags) {
            return r.error_ty();
        }
    }
    bound
}
