use rustc_hash::FxHashMap;

use crate::context::db::{DeclId, DeclKind, GenericParamId, TypeDatabase};
use crate::types::{TupleElem, Ty, TyInterner, TyKind};

/// Bindings from generic parameters to replacement types.
pub type SubstitutionMap = FxHashMap<GenericParamId, Ty>;

/// Recursion fuel for substitution. Exhausting it means a cyclic alias or
/// pathologically nested type; we degrade to the error type.
pub const SUBST_RECURSION_LIMIT: u32 = 128;

/// Structurally replaces generic parameters in `ty` according to `subst`.
///
/// Parameters and archetypes are replaced by id; everything else is rebuilt
/// with substituted components. Nodes the map does not mention come back
/// unchanged.
pub fn apply_substitution(
    interner: &TyInterner,
    ty: &Ty,
    subst: &SubstitutionMap,
    limit: u32,
) -> Ty {
    if limit == 0 {
        log::debug!("substitution recursion limit hit on {ty}");
        return interner.error();
    }
    if subst.is_empty() {
        return ty.clone();
    }
    let go = |inner: &Ty| apply_substitution(interner, inner, subst, limit - 1);
    match ty.kind() {
        TyKind::Error | TyKind::Var(_) | TyKind::Nominal { .. } | TyKind::UnboundGeneric { .. } => {
            ty.clone()
        }
        TyKind::Param { id, .. } | TyKind::Archetype { id, .. } => {
            subst.get(id).cloned().unwrap_or_else(|| ty.clone())
        }
        TyKind::BoundGeneric { decl, name, parent, args } => interner.intern(TyKind::BoundGeneric {
            decl: *decl,
            name: name.clone(),
            parent: parent.as_ref().map(&go),
            args: args.iter().map(&go).collect(),
        }),
        TyKind::DependentMember { base, name } => interner.intern(TyKind::DependentMember {
            base: go(base),
            name: name.clone(),
        }),
        TyKind::Tuple(elems) => interner.intern(TyKind::Tuple(
            elems
                .iter()
                .map(|e| TupleElem { label: e.label.clone(), ty: go(&e.ty), variadic: e.variadic })
                .collect(),
        )),
        TyKind::Function { input, output, ext } => interner.intern(TyKind::Function {
            input: go(input),
            output: go(output),
            ext: *ext,
        }),
        TyKind::Optional(inner) => interner.intern(TyKind::Optional(go(inner))),
        TyKind::Slice(inner) => interner.intern(TyKind::Slice(go(inner))),
        TyKind::Existential(members) => {
            interner.intern(TyKind::Existential(members.iter().map(&go).collect()))
        }
        TyKind::Meta(inner) => interner.intern(TyKind::Meta(go(inner))),
        TyKind::RefStorage { base, ownership } => interner.intern(TyKind::RefStorage {
            base: go(base),
            ownership: *ownership,
        }),
    }
}

/// Projects a member type declaration onto a concrete base.
///
/// The member's declared type is written in terms of its owner's generic
/// parameters (or a protocol's `Self`); this rewrites those in terms of
/// what `base` binds them to. With nothing to bind, the declared type comes
/// back unchanged.
pub fn subst_member_ty_with_base(
    db: &dyn TypeDatabase,
    interner: &TyInterner,
    member: DeclId,
    base: &Ty,
) -> Ty {
    db.ensure_validated(member);
    let Some(declared) = db.declared_ty(member) else {
        return interner.error();
    };
    let Some(owner) = db.scope_nominal(db.decl_scope(member)) else {
        return declared;
    };

    let mut subst = SubstitutionMap::default();
    if db.decl_kind(owner) == DeclKind::Protocol {
        subst.insert(db.protocol_self_param(owner), base.clone());
    }
    if let TyKind::BoundGeneric { decl, args, .. } = base.kind() {
        if *decl == owner {
            for (param, arg) in db.generic_params(owner).into_iter().zip(args) {
                subst.insert(param, arg.clone());
            }
        }
    }
    if subst.is_empty() {
        return declared;
    }
    apply_substitution(interner, &declared, &subst, SUBST_RECURSION_LIMIT)
}
