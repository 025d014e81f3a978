use std::fmt;

use lyra_syntax::{CallingConvention, Ownership};
use triomphe::Arc;

use crate::context::db::{DeclId, DeclKind, GenericParamId, TypeDatabase, TypeVarId};

/// A fully resolved semantic type.
///
/// `Ty` is a shared handle to an immutable [`TyKind`] node. Equality and
/// hashing are structural, so two types built through different resolution
/// paths compare equal; the interner additionally canonicalizes nodes so
/// equal types usually share one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ty(Arc<TyKind>);

impl Ty {
    /// Builds a fresh, non-canonical node. Prefer going through the
    /// [`TyInterner`](crate::types::TyInterner) so equal types share storage.
    pub fn new(kind: TyKind) -> Self {
        Ty(Arc::new(kind))
    }

    pub fn kind(&self) -> &TyKind {
        &self.0
    }

    pub fn is_error(&self) -> bool {
        matches!(*self.0, TyKind::Error)
    }

    /// The nominal declaration behind this type, if any.
    pub fn nominal_decl(&self) -> Option<DeclId> {
        match &*self.0 {
            TyKind::Nominal { decl, .. }
            | TyKind::UnboundGeneric { decl, .. }
            | TyKind::BoundGeneric { decl, .. } => Some(*decl),
            _ => None,
        }
    }

    /// True if the type's identity still depends on an unresolved generic
    /// parameter or dependent member.
    pub fn is_dependent(&self) -> bool {
        self.any(&mut |kind| matches!(kind, TyKind::Param { .. } | TyKind::DependentMember { .. }))
    }

    /// True if the type contains an inference type variable.
    pub fn has_type_var(&self) -> bool {
        self.any(&mut |kind| matches!(kind, TyKind::Var(_)))
    }

    /// True if a value of this type is a constraint-shaped "any conforming
    /// value": a protocol type or a protocol composition.
    pub fn is_existential(&self, db: &dyn TypeDatabase) -> bool {
        match &*self.0 {
            TyKind::Existential(_) => true,
            TyKind::Nominal { decl, .. } => db.decl_kind(*decl) == DeclKind::Protocol,
            _ => false,
        }
    }

    /// If this is an existential naming exactly one protocol, that protocol.
    pub fn single_protocol(&self, db: &dyn TypeDatabase) -> Option<DeclId> {
        match &*self.0 {
            TyKind::Nominal { decl, .. } if db.decl_kind(*decl) == DeclKind::Protocol => {
                Some(*decl)
            }
            TyKind::Existential(members) => match members.as_slice() {
                [single] => single.single_protocol(db),
                _ => None,
            },
            _ => None,
        }
    }

    /// True for types with reference semantics (class instances).
    pub fn has_reference_semantics(&self, db: &dyn TypeDatabase) -> bool {
        self.nominal_decl()
            .is_some_and(|decl| db.decl_kind(decl) == DeclKind::Class)
    }

    /// Recursively tests `pred` against this type and every structural
    /// component.
    fn any(&self, pred: &mut dyn FnMut(&TyKind) -> bool) -> bool {
        if pred(&self.0) {
            return true;
        }
        match &*self.0 {
            TyKind::Error
            | TyKind::Param { .. }
            | TyKind::Archetype { .. }
            | TyKind::Var(_) => false,
            TyKind::Nominal { parent, .. } | TyKind::UnboundGeneric { parent, .. } => {
                parent.as_ref().is_some_and(|p| p.any(pred))
            }
            TyKind::BoundGeneric { parent, args, .. } => {
                parent.as_ref().is_some_and(|p| p.any(pred)) || args.iter().any(|a| a.any(pred))
            }
            TyKind::DependentMember { base, .. } => base.any(pred),
            TyKind::Tuple(elems) => elems.iter().any(|e| e.ty.any(pred)),
            TyKind::Function { input, output, .. } => input.any(pred) || output.any(pred),
            TyKind::Optional(inner) | TyKind::Slice(inner) | TyKind::Meta(inner) => {
                inner.any(pred)
            }
            TyKind::Existential(members) => members.iter().any(|m| m.any(pred)),
            TyKind::RefStorage { base, .. } => base.any(pred),
        }
    }
}

/// The variants of the semantic type model.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TyKind {
    /// Sentinel for a failed resolution. Absorbs and silently propagates
    /// failure; never itself causes a further diagnostic.
    Error,

    /// A non-generic nominal type (struct, class, enum, protocol).
    Nominal {
        decl: DeclId,
        name: String,
        parent: Option<Ty>,
    },

    /// A generic nominal declaration referenced without argument bindings.
    UnboundGeneric {
        decl: DeclId,
        name: String,
        parent: Option<Ty>,
    },

    /// A generic nominal declaration with explicit argument bindings.
    BoundGeneric {
        decl: DeclId,
        name: String,
        parent: Option<Ty>,
        args: Vec<Ty>,
    },

    /// A generic parameter in interface form; dependent until substituted.
    Param { id: GenericParamId, name: String },

    /// The in-scope archetypal representative of a generic parameter.
    Archetype { id: GenericParamId, name: String },

    /// A member reference whose base is still dependent, e.g. `T.Element`
    /// inside a generic declaration body.
    DependentMember { base: Ty, name: String },

    /// An inference type variable owned by a later checking phase.
    Var(TypeVarId),

    /// A tuple type with optionally labeled elements.
    Tuple(Vec<TupleElem>),

    /// A function type.
    Function {
        input: Ty,
        output: Ty,
        ext: FnExtInfo,
    },

    /// Optional sugar `T?`.
    Optional(Ty),

    /// Array sugar `T[]`.
    Slice(Ty),

    /// A protocol composition. Empty members is the universal top type.
    Existential(Vec<Ty>),

    /// A metatype `T.Type`.
    Meta(Ty),

    /// Lowered-mode reference storage, e.g. `@weak T`.
    RefStorage { base: Ty, ownership: Ownership },
}

/// An element of a semantic tuple type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleElem {
    pub label: Option<String>,
    pub ty: Ty,
    pub variadic: bool,
}

impl TupleElem {
    pub fn new(ty: Ty) -> Self {
        TupleElem { label: None, ty, variadic: false }
    }

    pub fn labeled(label: impl Into<String>, ty: Ty) -> Self {
        TupleElem { label: Some(label.into()), ty, variadic: false }
    }
}

/// Extended shape information of a function type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FnExtInfo {
    pub convention: CallingConvention,
    pub no_return: bool,
    pub thin: bool,
    pub auto_closure: bool,
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.kind().fmt(f)
    }
}

impl fmt::Display for TyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TyKind::Error => write!(f, "<error>"),
            TyKind::Nominal { name, parent, .. }
            | TyKind::UnboundGeneric { name, parent, .. } => {
                if let Some(parent) = parent {
                    write!(f, "{parent}.")?;
                }
                write!(f, "{name}")
            }
            TyKind::BoundGeneric { name, parent, args, .. } => {
                if let Some(parent) = parent {
                    write!(f, "{parent}.")?;
                }
                write!(f, "{name}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            TyKind::Param { name, .. } | TyKind::Archetype { name, .. } => write!(f, "{name}"),
            TyKind::DependentMember { base, name } => write!(f, "{base}.{name}"),
            TyKind::Var(id) => write!(f, "t{}", id.as_u32()),
            TyKind::Tuple(elems) => {
                write!(f, "(")?;
                for (i, elem) in elems.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    if let Some(label) = &elem.label {
                        write!(f, "{label}: ")?;
                    }
                    write!(f, "{}", elem.ty)?;
                    if elem.variadic {
                        write!(f, "...")?;
                    }
                }
                write!(f, ")")
            }
            TyKind::Function { input, output, ext } => {
                if ext.convention != CallingConvention::Default {
                    write!(f, "@convention({}) ", ext.convention)?;
                }
                if ext.thin {
                    write!(f, "@thin ")?;
                }
                if ext.no_return {
                    write!(f, "@noreturn ")?;
                }
                if ext.auto_closure {
                    write!(f, "@autoclosure ")?;
                }
                write!(f, "{input} -> {output}")
            }
            TyKind::Optional(inner) => write!(f, "{inner}?"),
            TyKind::Slice(inner) => write!(f, "{inner}[]"),
            TyKind::Existential(members) => {
                if members.is_empty() {
                    return write!(f, "Any");
                }
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{member}")?;
                }
                Ok(())
            }
            TyKind::Meta(inner) => write!(f, "{inner}.Type"),
            TyKind::RefStorage { base, ownership } => write!(f, "@{ownership} {base}"),
        }
    }
}
