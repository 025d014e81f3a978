use std::sync::atomic::{AtomicU32, Ordering};

use miette::SourceSpan;

use super::common::Ident;

/// A syntactic type expression as produced by the parser.
///
/// The tree is immutable after parsing. Resolution state is kept out of the
/// nodes themselves; path segments carry a [`SegmentId`] that the resolver
/// uses to key its own write-once cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeExprKind {
    /// Placeholder emitted by the parser after a syntax error.
    Error,
    /// A type with one or more leading attributes, e.g. `@noreturn () -> T`.
    Attributed {
        base: Box<TypeExpr>,
        attrs: Vec<TypeAttr>,
    },
    /// A dotted identifier path, e.g. `collections.Map<K, V>`.
    Path(Vec<PathSegment>),
    /// A function type `input -> output`.
    Function {
        input: Box<TypeExpr>,
        output: Box<TypeExpr>,
    },
    /// Array sugar `T[]`, or `T[n]` when a size argument is present.
    Array {
        elem: Box<TypeExpr>,
        size: Option<ConstArg>,
    },
    /// Optional sugar `T?`.
    Optional(Box<TypeExpr>),
    /// A tuple type with optionally labeled elements.
    Tuple(Vec<TupleTypeElem>),
    /// A protocol composition `any P & Q`. An empty member list is the
    /// universal top type.
    Composition(Vec<TypeExpr>),
    /// A metatype `T.Type`.
    Meta(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn new(kind: TypeExprKind, span: SourceSpan) -> Self {
        TypeExpr { kind, span }
    }

    pub fn is_function(&self) -> bool {
        matches!(self.kind, TypeExprKind::Function { .. })
    }

    pub fn is_path(&self) -> bool {
        matches!(self.kind, TypeExprKind::Path(_))
    }
}

/// One component of a dotted identifier path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    /// Process-unique identity for this segment; keys the resolver's
    /// write-once binding cache.
    pub id: SegmentId,
    pub ident: Ident,
    /// Explicit generic arguments, e.g. the `<Int>` in `Box<Int>`.
    pub generic_args: Vec<TypeExpr>,
}

impl PathSegment {
    pub fn new(ident: Ident, generic_args: Vec<TypeExpr>) -> Self {
        PathSegment { id: SegmentId::fresh(), ident, generic_args }
    }

    pub fn span(&self) -> SourceSpan {
        self.ident.span
    }
}

/// Unique identity of a path segment, allocated once at parse time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u32);

static NEXT_SEGMENT_ID: AtomicU32 = AtomicU32::new(0);

impl SegmentId {
    pub fn fresh() -> Self {
        SegmentId(NEXT_SEGMENT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// An element of a syntactic tuple type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TupleTypeElem {
    pub label: Option<Ident>,
    pub ty: TypeExpr,
    /// Trailing `...`; the parser only sets this on the last element.
    pub variadic: bool,
}

impl TupleTypeElem {
    pub fn new(ty: TypeExpr) -> Self {
        TupleTypeElem { label: None, ty, variadic: false }
    }

    pub fn labeled(label: Ident, ty: TypeExpr) -> Self {
        TupleTypeElem { label: Some(label), ty, variadic: false }
    }
}

/// An unevaluated constant argument, e.g. the `4` in `Int[4]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConstArg {
    pub text: String,
    pub span: SourceSpan,
}

/// A single type attribute with its source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeAttr {
    pub kind: TypeAttrKind,
    pub span: SourceSpan,
}

impl TypeAttr {
    pub fn new(kind: TypeAttrKind, span: SourceSpan) -> Self {
        TypeAttr { kind, span }
    }

    /// Attribute name as written in source, without the leading `@`.
    pub fn name(&self) -> &'static str {
        match self.kind {
            TypeAttrKind::Convention(CallingConvention::Default) => "convention(default)",
            TypeAttrKind::Convention(CallingConvention::Method) => "convention(method)",
            TypeAttrKind::Convention(CallingConvention::C) => "convention(c)",
            TypeAttrKind::Convention(CallingConvention::Block) => "convention(block)",
            TypeAttrKind::NoReturn => "noreturn",
            TypeAttrKind::Thin => "thin",
            TypeAttrKind::Autoclosure => "autoclosure",
            TypeAttrKind::Weak => "weak",
            TypeAttrKind::Unowned => "unowned",
            TypeAttrKind::ProtocolSelf => "protocol_self",
        }
    }

    pub fn is_function_shape(&self) -> bool {
        matches!(
            self.kind,
            TypeAttrKind::Convention(_)
                | TypeAttrKind::NoReturn
                | TypeAttrKind::Thin
                | TypeAttrKind::Autoclosure
        )
    }

    pub fn ownership(&self) -> Option<Ownership> {
        match self.kind {
            TypeAttrKind::Weak => Some(Ownership::Weak),
            TypeAttrKind::Unowned => Some(Ownership::Unowned),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeAttrKind {
    /// Calling convention of a function type.
    Convention(CallingConvention),
    NoReturn,
    Thin,
    Autoclosure,
    /// Weak reference storage; only meaningful in lowered mode.
    Weak,
    /// Unowned reference storage; only meaningful in lowered mode.
    Unowned,
    /// Extracts the Self representative of a single-protocol existential.
    ProtocolSelf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CallingConvention {
    #[default]
    Default,
    Method,
    C,
    Block,
}

impl std::fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallingConvention::Default => write!(f, "default"),
            CallingConvention::Method => write!(f, "method"),
            CallingConvention::C => write!(f, "c"),
            CallingConvention::Block => write!(f, "block"),
        }
    }
}

/// Reference ownership qualifier carried by lowered-mode storage types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Ownership {
    Weak,
    Unowned,
}

impl std::fmt::Display for Ownership {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Ownership::Weak => write!(f, "weak"),
            Ownership::Unowned => write!(f, "unowned"),
        }
    }
}
