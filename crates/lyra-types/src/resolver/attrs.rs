//! Application of type attributes to an already-resolved base type.

use lyra_syntax::{TypeAttr, TypeAttrKind};

use super::TypeResolver;
use crate::context::db::ScopeId;
use crate::error::TypeError;
use crate::types::{FnExtInfo, Ty, TyKind};

/// Applies `attrs` to `ty`, diagnosing every attribute that cannot be
/// consumed. An error base type absorbs the attributes silently.
pub fn apply_attributes(
    r: &TypeResolver<'_>,
    ty: Ty,
    attrs: &[TypeAttr],
    scope: ScopeId,
) -> Ty {
    if ty.is_error() {
        return ty;
    }
    let mut consumed = vec![false; attrs.len()];
    let mut ty = ty;

    // @protocol_self rewrites the base before anything else looks at it.
    for (i, attr) in attrs.iter().enumerate() {
        if attr.kind != TypeAttrKind::ProtocolSelf {
            continue;
        }
        consumed[i] = true;
        match ty.single_protocol(r.db) {
            Some(protocol) => {
                ty = r.db.archetype_ty(r.db.protocol_self_param(protocol));
            }
            None => {
                // Diagnose and drop the attribute; the base stays usable for
                // the rest of the pass.
                r.diags.report(TypeError::ProtocolSelfNonProtocol {
                    ty: ty.to_string(),
                    span: attr.span,
                });
            }
        }
    }

    ty = apply_function_attrs(r, ty, attrs, &mut consumed);

    for (i, attr) in attrs.iter().enumerate() {
        if consumed[i] {
            continue;
        }
        if let Some(ownership) = attr.ownership() {
            if r.db.in_lowered_mode(scope) && ty.has_reference_semantics(r.db) {
                consumed[i] = true;
                ty = r.interner.intern(TyKind::RefStorage { base: ty, ownership });
            }
        }
    }

    for (i, attr) in attrs.iter().enumerate() {
        if !consumed[i] {
            r.diags.report(TypeError::AttributeDoesNotApply {
                attr: attr.name().to_string(),
                span: attr.span,
            });
        }
    }
    ty
}

fn apply_function_attrs(
    r: &TypeResolver<'_>,
    ty: Ty,
    attrs: &[TypeAttr],
    consumed: &mut [bool],
) -> Ty {
    let mut ext = FnExtInfo::default();
    let mut any = false;
    let mut auto_closure_span = None;
    for (i, attr) in attrs.iter().enumerate() {
        if consumed[i] || !attr.is_function_shape() {
            continue;
        }
        any = true;
        match attr.kind {
            TypeAttrKind::Convention(convention) => ext.convention = convention,
            TypeAttrKind::NoReturn => ext.no_return = true,
            TypeAttrKind::Thin => ext.thin = true,
            TypeAttrKind::Autoclosure => {
                ext.auto_closure = true;
                auto_closure_span = Some(attr.span);
            }
            _ => unreachable!(),
        }
    }
    if !any {
        return ty;
    }

    let TyKind::Function { input, output, .. } = ty.kind() else {
        for (i, attr) in attrs.iter().enumerate() {
            if !consumed[i] && attr.is_function_shape() {
                consumed[i] = true;
                r.diags.report(TypeError::AttributeRequiresFunctionType {
                    attr: attr.name().to_string(),
                    span: attr.span,
                });
            }
        }
        return ty;
    };
    for (i, attr) in attrs.iter().enumerate() {
        if attr.is_function_shape() {
            consumed[i] = true;
        }
    }

    if let Some(span) = auto_closure_span {
        if *input != r.interner.unit() {
            r.diags.report(TypeError::AutoclosureNonUnitInput {
                input: input.to_string(),
                span,
            });
            return ty;
        }
    }
    r.interner.intern(TyKind::Function {
        input: input.clone(),
        output: output.clone(),
        ext,
    })
}
