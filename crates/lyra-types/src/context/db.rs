use miette::SourceSpan;

use crate::error::Diagnostics;
use crate::resolver::substitute::SubstitutionMap;
use crate::types::Ty;

/// Identifies a declaration in the host compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

/// Identifies a lexical scope in the host compiler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub u32);

/// Identifies a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleId(pub u32);

/// Identifies a generic parameter declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GenericParamId(pub u32);

/// Identifies an inference type variable owned by a later checking phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeVarId(pub u32);

impl TypeVarId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// The kind of a named declaration, as far as type resolution cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclKind {
    Struct,
    Class,
    Enum,
    Protocol,
    TypeAlias,
    AssociatedType,
    GenericParam,
    /// Any non-type declaration: a function, variable, or case.
    Value,
}

impl DeclKind {
    pub fn is_type(self) -> bool {
        !matches!(self, DeclKind::Value)
    }

    /// Human-readable kind name for diagnostics.
    pub fn describe(self) -> &'static str {
        match self {
            DeclKind::Struct => "struct",
            DeclKind::Class => "class",
            DeclKind::Enum => "enum",
            DeclKind::Protocol => "protocol",
            DeclKind::TypeAlias => "type alias",
            DeclKind::AssociatedType => "associated type",
            DeclKind::GenericParam => "generic parameter",
            DeclKind::Value => "value",
        }
    }

    pub fn is_nominal(self) -> bool {
        matches!(
            self,
            DeclKind::Struct | DeclKind::Class | DeclKind::Enum | DeclKind::Protocol
        )
    }
}

/// The kind of a lexical scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeKind {
    Module,
    File,
    TopLevel,
    /// The body of a struct, class, enum, or protocol.
    NominalType,
    /// An extension body; `scope_nominal` names the extended type.
    Extension,
    Function,
    Closure,
}

impl ScopeKind {
    /// Scopes whose members are projected relative to an enclosing type.
    pub fn is_type_context(self) -> bool {
        matches!(self, ScopeKind::NominalType | ScopeKind::Extension)
    }
}

/// One candidate produced by unqualified name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnqualifiedResult {
    Module(ModuleId),
    Decl(DeclId),
}

/// Services the resolver consumes from the host compiler.
///
/// The resolver never walks declarations or scopes itself; everything it
/// knows about the program comes through this trait. Methods returning
/// `Option` answer `None` for malformed or still-unavailable input, which
/// the resolver degrades to the error type rather than panicking.
pub trait TypeDatabase {
    fn parent_scope(&self, scope: ScopeId) -> Option<ScopeId>;
    fn scope_kind(&self, scope: ScopeId) -> ScopeKind;
    /// The nominal declaration a `NominalType` or `Extension` scope belongs to.
    fn scope_nominal(&self, scope: ScopeId) -> Option<DeclId>;
    /// True when resolving inside lowered (post-SIL-style) code, where
    /// ownership attributes produce reference-storage types.
    fn in_lowered_mode(&self, scope: ScopeId) -> bool;

    fn decl_name(&self, decl: DeclId) -> String;
    fn decl_kind(&self, decl: DeclId) -> DeclKind;
    fn decl_span(&self, decl: DeclId) -> SourceSpan;
    fn decl_scope(&self, decl: DeclId) -> ScopeId;
    /// Forces the declaration's own type to be computed. Resolution of a
    /// found declaration must not observe a half-validated decl.
    fn ensure_validated(&self, decl: DeclId);
    /// The declared type of a type declaration: the nominal or unbound
    /// generic type for nominals, the underlying type for aliases.
    fn declared_ty(&self, decl: DeclId) -> Option<Ty>;

    fn generic_params(&self, decl: DeclId) -> Vec<GenericParamId>;
    fn generic_param_name(&self, param: GenericParamId) -> String;
    /// If `decl` is itself a generic parameter declaration, its id.
    fn generic_param_decl(&self, decl: DeclId) -> Option<GenericParamId>;
    /// The parameter's interface type.
    fn param_ty(&self, param: GenericParamId) -> Ty;
    /// The parameter's in-scope archetype.
    fn archetype_ty(&self, param: GenericParamId) -> Ty;
    /// The implicit `Self` parameter of a protocol.
    fn protocol_self_param(&self, protocol: DeclId) -> GenericParamId;
    fn superclass_of(&self, ty: &Ty) -> Option<Ty>;

    /// The interface-form type of the nominal enclosing `scope`.
    fn interface_self_ty(&self, scope: ScopeId) -> Option<Ty>;
    /// The archetype-form type of the nominal enclosing `scope`.
    fn archetype_self_ty(&self, scope: ScopeId) -> Option<Ty>;

    /// All declarations and modules visible under `name` from `scope`,
    /// innermost first.
    fn unqualified_lookup(&self, scope: ScopeId, name: &str) -> Vec<UnqualifiedResult>;
    /// Member type declarations of a concrete base type, with each member's
    /// type already projected onto that base.
    fn member_type_lookup(&self, base: &Ty, name: &str) -> Vec<(DeclId, Ty)>;
    /// Top-level type declarations of a module.
    fn module_type_lookup(&self, module: ModuleId, name: &str) -> Vec<(DeclId, Ty)>;
    fn module_name(&self, module: ModuleId) -> String;

    /// Checks the conformance requirements of a substitution, reporting any
    /// violations to `diags`. Returns false if a requirement failed.
    fn check_substitutions(
        &self,
        subst: &SubstitutionMap,
        scope: ScopeId,
        span: SourceSpan,
        diags: &Diagnostics,
    ) -> bool;

    /// The standard environment's array declaration, if loaded.
    fn slice_decl(&self) -> Option<DeclId>;
    /// The standard environment's optional declaration, if loaded.
    fn optional_decl(&self) -> Option<DeclId>;
    /// The universal dynamic member lookup protocol, if loaded.
    fn dynamic_lookup_protocol(&self) -> Option<DeclId>;
    /// The generic wrapper for foreign pointers, if loaded.
    fn pointer_wrapper_decl(&self) -> Option<DeclId>;
    /// The standard interop module, source of the bridged type names.
    fn standard_module(&self) -> Option<ModuleId>;
}
