//! The recursive type-expression evaluator and its supporting passes.

pub mod attrs;
pub mod generics;
pub mod ident;
pub mod in_context;
pub mod substitute;


use std::cell::{Cell, RefCell};
use std::collections::hash_map::Entry;

use lyra_syntax::{SegmentId, TupleTypeElem, TypeExpr, TypeExprKind};
use miette::SourceSpan;
use rustc_hash::FxHashMap;

use crate::bridging::ForeignBridge;
use crate::context::db::{DeclId, ModuleId, ScopeId, TypeDatabase};
use crate::context::strategy::{ArchetypeResolver, GenericResolver};
use crate::error::{Diagnostics, TypeError};
use crate::types::{FnExtInfo, TupleElem, Ty, TyInterner, TyKind};

/// Maximum structural nesting of a single type expression, counting through
/// path-segment recursion. Tripping it reports one diagnostic for the whole
/// resolution and degrades to the error type.
pub const MAX_TYPE_DEPTH: u32 = 256;

/// What a resolved path segment is bound to.
///
/// Intermediate segments may be modules or (briefly) bare declarations; a
/// declaration binding is upgraded to its resolved type the first time the
/// segment is consumed as a type.
#[derive(Debug, Clone)]
pub enum Binding {
    Ty(Ty),
    Module(ModuleId),
    Decl(DeclId),
}

/// One resolution session over a host compiler.
///
/// Owns the write-once per-segment binding cache and the lazily populated
/// foreign bridging sets; diagnostics go to the shared sink. Sessions are
/// cheap, but reusing one across many expressions keeps re-resolution of
/// shared sub-paths free.
pub struct TypeResolver<'db> {
    pub(crate) db: &'db dyn TypeDatabase,
    pub(crate) interner: TyInterner,
    pub(crate) diags: &'db Diagnostics,
    bindings: RefCell<FxHashMap<SegmentId, Binding>>,
    pub(crate) bridge: RefCell<Option<ForeignBridge>>,
    depth: Cell<u32>,
    overflow_reported: Cell<bool>,
}

impl<'db> TypeResolver<'db> {
    pub fn new(db: &'db dyn TypeDatabase, interner: TyInterner, diags: &'db Diagnostics) -> Self {
        TypeResolver {
            db,
            interner,
            diags,
            bindings: RefCell::new(FxHashMap::default()),
            bridge: RefCell::new(None),
            depth: Cell::new(0),
            overflow_reported: Cell::new(false),
        }
    }

    pub fn interner(&self) -> &TyInterner {
        &self.interner
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        self.diags
    }

    /// Resolves a type expression relative to `scope`.
    ///
    /// With `allow_unbound`, a generic type referenced without arguments
    /// stays unbound instead of being diagnosed; type alias underlying
    /// types and generic base lookups want this. `strategy` defaults to
    /// archetype resolution.
    pub fn resolve_type(
        &self,
        expr: &TypeExpr,
        scope: ScopeId,
        allow_unbound: bool,
        strategy: Option<&dyn GenericResolver>,
    ) -> Ty {
        self.resolve_with(expr, scope, allow_unbound, strategy.unwrap_or(&ArchetypeResolver))
    }

    pub(crate) fn resolve_with(
        &self,
        expr: &TypeExpr,
        scope: ScopeId,
        allow_unbound: bool,
        strategy: &dyn GenericResolver,
    ) -> Ty {
        let depth = self.depth.get();
        if depth >= MAX_TYPE_DEPTH {
            if !self.overflow_reported.replace(true) {
                self.diags.report(TypeError::TypeNestingTooDeep { span: expr.span });
            }
            return self.error_ty();
        }
        self.depth.set(depth + 1);
        let ty = self.resolve_inner(expr, scope, allow_unbound, strategy);
        self.depth.set(depth);
        ty
    }

    fn resolve_inner(
        &self,
        expr: &TypeExpr,
        scope: ScopeId,
        allow_unbound: bool,
        strategy: &dyn GenericResolver,
    ) -> Ty {
        match &expr.kind {
            // The parser already diagnosed; absorb silently.
            TypeExprKind::Error => self.error_ty(),

            TypeExprKind::Attributed { base, attrs } => {
                let base_ty = self.resolve_with(base, scope, allow_unbound, strategy);
                attrs::apply_attributes(self, base_ty, attrs, scope)
            }

            TypeExprKind::Path(segments) => ident::resolve_identifier_type(
                self,
                segments,
                expr.span,
                scope,
                allow_unbound,
                true,
                strategy,
            ),

            TypeExprKind::Function { input, output } => {
                let input_ty = self.resolve_with(input, scope, allow_unbound, strategy);
                if input_ty.is_error() {
                    return self.error_ty();
                }
                let output_ty = self.resolve_with(output, scope, allow_unbound, strategy);
                if output_ty.is_error() {
                    return self.error_ty();
                }
                self.interner.intern(TyKind::Function {
                    input: input_ty,
                    output: output_ty,
                    ext: FnExtInfo::default(),
                })
            }

            TypeExprKind::Array { elem, size } => {
                if let Some(size) = size {
                    self.diags.report(TypeError::FixedSizeArrayUnsupported { span: size.span });
                    return self.error_ty();
                }
                let elem_ty = self.resolve_with(elem, scope, allow_unbound, strategy);
                if elem_ty.is_error() {
                    return self.error_ty();
                }
                self.slice_ty(elem_ty, expr.span)
            }

            TypeExprKind::Optional(inner) => {
                let inner_ty = self.resolve_with(inner, scope, allow_unbound, strategy);
                if inner_ty.is_error() {
                    return self.error_ty();
                }
                self.optional_ty(inner_ty, expr.span)
            }

            TypeExprKind::Tuple(elems) => {
                self.resolve_tuple(elems, expr.span, scope, allow_unbound, strategy)
            }

            TypeExprKind::Composition(members) => {
                self.resolve_composition(members, scope, strategy)
            }

            TypeExprKind::Meta(inner) => {
                let inner_ty = self.resolve_with(inner, scope, allow_unbound, strategy);
                if inner_ty.is_error() {
                    return self.error_ty();
                }
                self.interner.intern(TyKind::Meta(inner_ty))
            }
        }
    }

    fn resolve_tuple(
        &self,
        elems: &[TupleTypeElem],
        span: SourceSpan,
        scope: ScopeId,
        allow_unbound: bool,
        strategy: &dyn GenericResolver,
    ) -> Ty {
        let mut out = Vec::with_capacity(elems.len());
        for (i, elem) in elems.iter().enumerate() {
            let mut ty = self.resolve_with(&elem.ty, scope, allow_unbound, strategy);
            if ty.is_error() {
                return self.error_ty();
            }
            // A trailing `...` element collects into an array of itself.
            let variadic = elem.variadic && i + 1 == elems.len();
            if variadic {
                ty = self.slice_ty(ty, span);
                if ty.is_error() {
                    return self.error_ty();
                }
            }
            out.push(TupleElem {
                label: elem.label.as_ref().map(|l| l.name.clone()),
                ty,
                variadic,
            });
        }
        self.interner.intern(TyKind::Tuple(out))
    }

    fn resolve_composition(
        &self,
        members: &[TypeExpr],
        scope: ScopeId,
        strategy: &dyn GenericResolver,
    ) -> Ty {
        let mut out = Vec::with_capacity(members.len());
        for member in members {
            let ty = self.resolve_with(member, scope, false, strategy);
            if ty.is_error() {
                return self.error_ty();
            }
            if !ty.is_existential(self.db) {
                self.diags.report(TypeError::CompositionMemberNotProtocol {
                    ty: ty.to_string(),
                    span: member.span,
                });
                continue;
            }
            if let Some(dynamic) = self.db.dynamic_lookup_protocol() {
                if ty.single_protocol(self.db) == Some(dynamic) {
                    self.diags.report(TypeError::CompositionDynamicLookup { span: member.span });
                    continue;
                }
            }
            out.push(ty);
        }
        self.interner.intern(TyKind::Existential(out))
    }

    pub(crate) fn error_ty(&self) -> Ty {
        self.interner.error()
    }

    /// Array sugar, gated on the standard environment's array declaration.
    pub(crate) fn slice_ty(&self, elem: Ty, span: SourceSpan) -> Ty {
        if self.db.slice_decl().is_none() {
            self.diags.report(TypeError::SugarTypeNotFound { sugar: "array", span });
            return self.error_ty();
        }
        self.interner.intern(TyKind::Slice(elem))
    }

    /// Optional sugar, gated on the standard environment's optional
    /// declaration.
    pub(crate) fn optional_ty(&self, inner: Ty, span: SourceSpan) -> Ty {
        if self.db.optional_decl().is_none() {
            self.diags.report(TypeError::SugarTypeNotFound { sugar: "optional", span });
            return self.error_ty();
        }
        self.interner.intern(TyKind::Optional(inner))
    }

    pub(crate) fn binding(&self, id: SegmentId) -> Option<Binding> {
        self.bindings.borrow().get(&id).cloned()
    }

    /// Records a segment binding. Bindings are write-once, except that a
    /// bare declaration or module binding is upgraded to a type the first
    /// time the segment is consumed as one.
    pub(crate) fn bind(&self, id: SegmentId, binding: Binding) {
        match self.bindings.borrow_mut().entry(id) {
            Entry::Vacant(entry) => {
                entry.insert(binding);
            }
            Entry::Occupied(mut entry) => {
                debug_assert!(
                    !matches!(entry.get(), Binding::Ty(_)) && matches!(binding, Binding::Ty(_)),
                    "segment binding may only be upgraded to a type"
                );
                entry.insert(binding);
            }
        }
    }
}
