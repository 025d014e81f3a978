//! An in-memory `TypeDatabase` for tests, with instrumentation counters.

use std::cell::{Cell, RefCell};

use lyra_syntax::{Ident, PathSegment, TypeExpr, TypeExprKind};
use miette::SourceSpan;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::context::db::{
    DeclId, DeclKind, GenericParamId, ModuleId, ScopeId, ScopeKind, TypeDatabase, UnqualifiedResult,
};
use crate::error::{Diagnostics, TypeError};
use crate::resolver::substitute::{
    apply_substitution, subst_member_ty_with_base, SubstitutionMap, SUBST_RECURSION_LIMIT,
};
use crate::types::{Ty, TyInterner, TyKind};

pub(crate) fn dummy_span() -> SourceSpan {
    SourceSpan::from((0, 0))
}

pub(crate) fn ident(name: &str) -> Ident {
    Ident::new(name, dummy_span())
}

pub(crate) fn seg(name: &str) -> PathSegment {
    PathSegment::new(ident(name), Vec::new())
}

pub(crate) fn seg_args(name: &str, args: Vec<TypeExpr>) -> PathSegment {
    PathSegment::new(ident(name), args)
}

pub(crate) fn ty_path(name: &str) -> TypeExpr {
    ty_segments(vec![seg(name)])
}

pub(crate) fn ty_path_args(name: &str, args: Vec<TypeExpr>) -> TypeExpr {
    ty_segments(vec![seg_args(name, args)])
}

pub(crate) fn ty_segments(segments: Vec<PathSegment>) -> TypeExpr {
    TypeExpr::new(TypeExprKind::Path(segments), dummy_span())
}

struct ScopeData {
    parent: Option<ScopeId>,
    kind: ScopeKind,
    nominal: Option<DeclId>,
    names: FxHashMap<String, Vec<UnqualifiedResult>>,
}

struct DeclData {
    name: String,
    kind: DeclKind,
    scope: ScopeId,
    span: SourceSpan,
    declared: Option<Ty>,
    generics: Vec<GenericParamId>,
    superclass: Option<Ty>,
    self_param: Option<GenericParamId>,
    param: Option<GenericParamId>,
    members: FxHashMap<String, Vec<DeclId>>,
}

struct ParamData {
    name: String,
}

struct ModuleData {
    name: String,
    types: FxHashMap<String, Vec<DeclId>>,
}

/// Hand-built program model implementing [`TypeDatabase`].
///
/// Counters record how often lookup and conformance checking were hit, so
/// tests can assert that segment caching actually short-circuits.
#[derive(Default)]
pub(crate) struct TestDb {
    pub interner: TyInterner,
    scopes: Vec<ScopeData>,
    decls: Vec<DeclData>,
    params: Vec<ParamData>,
    modules: Vec<ModuleData>,
    conformances: FxHashSet<(DeclId, DeclId)>,
    constraints: FxHashMap<GenericParamId, Vec<DeclId>>,
    slice: Option<DeclId>,
    optional: Option<DeclId>,
    dynamic_lookup: Option<DeclId>,
    pointer_wrapper: Option<DeclId>,
    standard: Option<ModuleId>,
    lowered: bool,
    pub lookups: Cell<usize>,
    pub conformance_checks: Cell<usize>,
    validated: RefCell<FxHashSet<DeclId>>,
}

impl TestDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_scope(&mut self, parent: Option<ScopeId>, kind: ScopeKind) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(ScopeData { parent, kind, nominal: None, names: FxHashMap::default() });
        id
    }

    pub fn add_type_scope(&mut self, parent: ScopeId, kind: ScopeKind, nominal: DeclId) -> ScopeId {
        let id = self.add_scope(Some(parent), kind);
        self.scopes[id.0 as usize].nominal = Some(nominal);
        id
    }

    pub fn add_decl(&mut self, scope: ScopeId, name: &str, kind: DeclKind) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        // Distinct spans per decl so secondary labels are distinguishable.
        let span = SourceSpan::from((100 + id.0 as usize, 1));
        self.decls.push(DeclData {
            name: name.to_string(),
            kind,
            scope,
            span,
            declared: None,
            generics: Vec::new(),
            superclass: None,
            self_param: None,
            param: None,
            members: FxHashMap::default(),
        });
        id
    }

    pub fn set_declared(&mut self, decl: DeclId, ty: Ty) {
        self.decls[decl.0 as usize].declared = Some(ty);
    }

    pub fn set_superclass(&mut self, decl: DeclId, superclass: Ty) {
        self.decls[decl.0 as usize].superclass = Some(superclass);
    }

    pub fn add_name(&mut self, scope: ScopeId, name: &str, result: UnqualifiedResult) {
        self.scopes[scope.0 as usize].names.entry(name.to_string()).or_default().push(result);
    }

    pub fn add_generic_param(&mut self, owner: DeclId, name: &str) -> GenericParamId {
        let id = GenericParamId(self.params.len() as u32);
        self.params.push(ParamData { name: name.to_string() });
        self.decls[owner.0 as usize].generics.push(id);
        id
    }

    /// Makes a generic parameter visible under `name` in `scope`.
    pub fn bind_param_name(&mut self, scope: ScopeId, name: &str, param: GenericParamId) -> DeclId {
        let decl = self.add_decl(scope, name, DeclKind::GenericParam);
        self.decls[decl.0 as usize].param = Some(param);
        self.add_name(scope, name, UnqualifiedResult::Decl(decl));
        decl
    }

    pub fn add_member(&mut self, owner: DeclId, member: DeclId) {
        let name = self.decls[member.0 as usize].name.clone();
        self.decls[owner.0 as usize].members.entry(name).or_default().push(member);
    }

    pub fn add_module(&mut self, name: &str) -> ModuleId {
        let id = ModuleId(self.modules.len() as u32);
        self.modules.push(ModuleData { name: name.to_string(), types: FxHashMap::default() });
        id
    }

    pub fn add_module_type(&mut self, module: ModuleId, decl: DeclId) {
        let name = self.decls[decl.0 as usize].name.clone();
        self.modules[module.0 as usize].types.entry(name).or_default().push(decl);
    }

    pub fn add_conformance(&mut self, decl: DeclId, protocol: DeclId) {
        self.conformances.insert((decl, protocol));
    }

    pub fn add_constraint(&mut self, param: GenericParamId, protocol: DeclId) {
        self.constraints.entry(param).or_default().push(protocol);
    }

    pub fn set_slice_decl(&mut self, decl: DeclId) {
        self.slice = Some(decl);
    }

    pub fn set_optional_decl(&mut self, decl: DeclId) {
        self.optional = Some(decl);
    }

    pub fn set_dynamic_lookup(&mut self, decl: DeclId) {
        self.dynamic_lookup = Some(decl);
    }

    pub fn set_pointer_wrapper(&mut self, decl: DeclId) {
        self.pointer_wrapper = Some(decl);
    }

    pub fn set_standard_module(&mut self, module: ModuleId) {
        self.standard = Some(module);
    }

    pub fn set_lowered(&mut self, lowered: bool) {
        self.lowered = lowered;
    }

    pub fn define_struct(&mut self, scope: ScopeId, name: &str) -> (DeclId, Ty) {
        let decl = self.add_decl(scope, name, DeclKind::Struct);
        let ty = self.interner.intern(TyKind::Nominal {
            decl,
            name: name.to_string(),
            parent: None,
        });
        self.set_declared(decl, ty.clone());
        self.add_name(scope, name, UnqualifiedResult::Decl(decl));
        (decl, ty)
    }

    pub fn define_class(&mut self, scope: ScopeId, name: &str) -> (DeclId, Ty) {
        let decl = self.add_decl(scope, name, DeclKind::Class);
        let ty = self.interner.intern(TyKind::Nominal {
            decl,
            name: name.to_string(),
            parent: None,
        });
        self.set_declared(decl, ty.clone());
        self.add_name(scope, name, UnqualifiedResult::Decl(decl));
        (decl, ty)
    }

    pub fn define_protocol(&mut self, scope: ScopeId, name: &str) -> (DeclId, Ty) {
        let decl = self.add_decl(scope, name, DeclKind::Protocol);
        let ty = self.interner.intern(TyKind::Nominal {
            decl,
            name: name.to_string(),
            parent: None,
        });
        self.set_declared(decl, ty.clone());
        let self_param = GenericParamId(self.params.len() as u32);
        self.params.push(ParamData { name: "Self".to_string() });
        self.decls[decl.0 as usize].self_param = Some(self_param);
        self.add_name(scope, name, UnqualifiedResult::Decl(decl));
        (decl, ty)
    }

    pub fn define_generic_struct(
        &mut self,
        scope: ScopeId,
        name: &str,
        params: &[&str],
    ) -> (DeclId, Vec<GenericParamId>) {
        let decl = self.add_decl(scope, name, DeclKind::Struct);
        let ids: Vec<_> = params.iter().map(|p| self.add_generic_param(decl, p)).collect();
        let ty = self.interner.intern(TyKind::UnboundGeneric {
            decl,
            name: name.to_string(),
            parent: None,
        });
        self.set_declared(decl, ty);
        self.add_name(scope, name, UnqualifiedResult::Decl(decl));
        (decl, ids)
    }

    pub fn define_generic_class(
        &mut self,
        scope: ScopeId,
        name: &str,
        params: &[&str],
    ) -> (DeclId, Vec<GenericParamId>) {
        let decl = self.add_decl(scope, name, DeclKind::Class);
        let ids: Vec<_> = params.iter().map(|p| self.add_generic_param(decl, p)).collect();
        let ty = self.interner.intern(TyKind::UnboundGeneric {
            decl,
            name: name.to_string(),
            parent: None,
        });
        self.set_declared(decl, ty);
        self.add_name(scope, name, UnqualifiedResult::Decl(decl));
        (decl, ids)
    }

    pub fn define_alias(&mut self, scope: ScopeId, name: &str, ty: Ty) -> DeclId {
        let decl = self.add_decl(scope, name, DeclKind::TypeAlias);
        self.set_declared(decl, ty);
        self.add_name(scope, name, UnqualifiedResult::Decl(decl));
        decl
    }

    pub fn was_validated(&self, decl: DeclId) -> bool {
        self.validated.borrow().contains(&decl)
    }

    fn conforms(&self, ty: &Ty, protocol: DeclId) -> bool {
        let mut current = Some(ty.clone());
        while let Some(ty) = current {
            if let Some(decl) = ty.nominal_decl() {
                if self.conformances.contains(&(decl, protocol)) {
                    return true;
                }
            }
            current = self.superclass_of(&ty);
        }
        false
    }
}

impl TypeDatabase for TestDb {
    fn parent_scope(&self, scope: ScopeId) -> Option<ScopeId> {
        self.scopes[scope.0 as usize].parent
    }

    fn scope_kind(&self, scope: ScopeId) -> ScopeKind {
        self.scopes[scope.0 as usize].kind
    }

    fn scope_nominal(&self, scope: ScopeId) -> Option<DeclId> {
        self.scopes[scope.0 as usize].nominal
    }

    fn in_lowered_mode(&self, _scope: ScopeId) -> bool {
        self.lowered
    }

    fn decl_name(&self, decl: DeclId) -> String {
        self.decls[decl.0 as usize].name.clone()
    }

    fn decl_kind(&self, decl: DeclId) -> DeclKind {
        self.decls[decl.0 as usize].kind
    }

    fn decl_span(&self, decl: DeclId) -> SourceSpan {
        self.decls[decl.0 as usize].span
    }

    fn decl_scope(&self, decl: DeclId) -> ScopeId {
        self.decls[decl.0 as usize].scope
    }

    fn ensure_validated(&self, decl: DeclId) {
        self.validated.borrow_mut().insert(decl);
    }

    fn declared_ty(&self, decl: DeclId) -> Option<Ty> {
        self.decls[decl.0 as usize].declared.clone()
    }

    fn generic_params(&self, decl: DeclId) -> Vec<GenericParamId> {
        self.decls[decl.0 as usize].generics.clone()
    }

    fn generic_param_name(&self, param: GenericParamId) -> String {
        self.params[param.0 as usize].name.clone()
    }

    fn generic_param_decl(&self, decl: DeclId) -> Option<GenericParamId> {
        self.decls[decl.0 as usize].param
    }

    fn param_ty(&self, param: GenericParamId) -> Ty {
        self.interner.intern(TyKind::Param {
            id: param,
            name: self.generic_param_name(param),
        })
    }

    fn archetype_ty(&self, param: GenericParamId) -> Ty {
        self.interner.intern(TyKind::Archetype {
            id: param,
            name: self.generic_param_name(param),
        })
    }

    fn protocol_self_param(&self, protocol: DeclId) -> GenericParamId {
        self.decls[protocol.0 as usize].self_param.unwrap()
    }

    fn superclass_of(&self, ty: &Ty) -> Option<Ty> {
        let decl = ty.nominal_decl()?;
        let stored = self.decls[decl.0 as usize].superclass.clone()?;
        if let TyKind::BoundGeneric { args, .. } = ty.kind() {
            let subst: SubstitutionMap =
                self.generic_params(decl).into_iter().zip(args.iter().cloned()).collect();
            return Some(apply_substitution(&self.interner, &stored, &subst, SUBST_RECURSION_LIMIT));
        }
        Some(stored)
    }

    fn interface_self_ty(&self, scope: ScopeId) -> Option<Ty> {
        let decl = self.scope_nominal(scope)?;
        Some(self.self_ty_with(decl, |param| self.param_ty(param)))
    }

    fn archetype_self_ty(&self, scope: ScopeId) -> Option<Ty> {
        let decl = self.scope_nominal(scope)?;
        Some(self.self_ty_with(decl, |param| self.archetype_ty(param)))
    }

    fn unqualified_lookup(&self, scope: ScopeId, name: &str) -> Vec<UnqualifiedResult> {
        self.lookups.set(self.lookups.get() + 1);
        let mut results = Vec::new();
        let mut current = Some(scope);
        while let Some(scope) = current {
            let data = &self.scopes[scope.0 as usize];
            if let Some(found) = data.names.get(name) {
                results.extend(found.iter().copied());
            }
            current = data.parent;
        }
        results
    }

    fn member_type_lookup(&self, base: &Ty, name: &str) -> Vec<(DeclId, Ty)> {
        let mut current = Some(base.clone());
        while let Some(link) = current {
            if let Some(owner) = link.nominal_decl() {
                if let Some(members) = self.decls[owner.0 as usize].members.get(name) {
                    return members
                        .iter()
                        .map(|&member| {
                            self.ensure_validated(member);
                            (member, subst_member_ty_with_base(self, &self.interner, member, &link))
                        })
                        .collect();
                }
            }
            current = self.superclass_of(&link);
        }
        Vec::new()
    }

    fn module_type_lookup(&self, module: ModuleId, name: &str) -> Vec<(DeclId, Ty)> {
        let Some(decls) = self.modules[module.0 as usize].types.get(name) else {
            return Vec::new();
        };
        decls
            .iter()
            .map(|&decl| {
                self.ensure_validated(decl);
                let ty = self.declared_ty(decl).unwrap_or_else(|| self.interner.error());
                (decl, ty)
            })
            .collect()
    }

    fn module_name(&self, module: ModuleId) -> String {
        self.modules[module.0 as usize].name.clone()
    }

    fn check_substitutions(
        &self,
        subst: &SubstitutionMap,
        _scope: ScopeId,
        span: SourceSpan,
        diags: &Diagnostics,
    ) -> bool {
        self.conformance_checks.set(self.conformance_checks.get() + 1);
        let mut entries: Vec<_> = subst.iter().collect();
        entries.sort_by_key(|(param, _)| **param);
        let mut ok = true;
        for (param, arg) in entries {
            let Some(protocols) = self.constraints.get(param) else { continue };
            for &protocol in protocols {
                if !self.conforms(arg, protocol) {
                    diags.report(TypeError::ConstraintNotSatisfied {
                        arg: arg.to_string(),
                        param: self.generic_param_name(*param),
                        requirement: self.decl_name(protocol),
                        span,
                    });
                    ok = false;
                }
            }
        }
        ok
    }

    fn slice_decl(&self) -> Option<DeclId> {
        self.slice
    }

    fn optional_decl(&self) -> Option<DeclId> {
        self.optional
    }

    fn dynamic_lookup_protocol(&self) -> Option<DeclId> {
        self.dynamic_lookup
    }

    fn pointer_wrapper_decl(&self) -> Option<DeclId> {
        self.pointer_wrapper
    }

    fn standard_module(&self) -> Option<ModuleId> {
        self.standard
    }
}

impl TestDb {
    fn self_ty_with(&self, decl: DeclId, param_ty: impl Fn(GenericParamId) -> Ty) -> Ty {
        let data = &self.decls[decl.0 as usize];
        if data.kind == DeclKind::Protocol || data.generics.is_empty() {
            return self.interner.intern(TyKind::Nominal {
                decl,
                name: data.name.clone(),
                parent: None,
            });
        }
        let args = data.generics.iter().map(|&p| param_ty(p)).collect();
        self.interner.intern(TyKind::BoundGeneric {
            decl,
            name: data.name.clone(),
            parent: None,
            args,
        })
    }
}
