use std::cell::RefCell;

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

/// Errors produced while resolving type expressions.
///
/// All of these are recoverable: the resolver reports them and substitutes
/// the error type, which silently short-circuits further structural
/// recursion without re-diagnosing.
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// A single-component identifier path named nothing visible in scope.
    #[error("use of undeclared type `{name}`")]
    #[diagnostic(code(lyra_types::undeclared_type))]
    UndeclaredType {
        name: String,
        #[label("not found in this scope")]
        span: SourceSpan,
    },

    /// The first component of a multi-component path named nothing.
    #[error("unknown name `{name}` in type")]
    #[diagnostic(code(lyra_types::unknown_name_in_type))]
    UnknownNameInType {
        name: String,
        #[label("not found in this scope")]
        span: SourceSpan,
    },

    /// Unqualified lookup produced multiple distinct, unequal candidates.
    #[error("`{name}` is ambiguous as a type base")]
    #[diagnostic(code(lyra_types::ambiguous_type_base))]
    AmbiguousTypeBase {
        name: String,
        #[label("ambiguous reference")]
        span: SourceSpan,
        /// Descriptions of every candidate found.
        candidates: Vec<String>,
    },

    /// A whole identifier path resolved to a module, not a type.
    #[error("cannot use module `{name}` as a type")]
    #[diagnostic(code(lyra_types::module_used_as_type))]
    ModuleUsedAsType {
        name: String,
        #[label("this is a module")]
        span: SourceSpan,
    },

    /// A path component was bound to a declaration that is not a type.
    #[error("cannot use non-type value `{name}` as a type")]
    #[diagnostic(code(lyra_types::non_type_used_as_type))]
    NonTypeUsedAsType {
        name: String,
        #[label("used as a type here")]
        span: SourceSpan,
        #[label("declared here")]
        decl_span: SourceSpan,
    },

    /// Member type lookup on a concrete base type found nothing.
    #[error("`{name}` is not a member type of `{base}`")]
    #[diagnostic(code(lyra_types::unknown_member_type))]
    UnknownMemberType {
        name: String,
        base: String,
        #[label("no such member type")]
        span: SourceSpan,
    },

    /// Member type lookup in a module found nothing.
    #[error("module `{module}` has no member type `{name}`")]
    #[diagnostic(code(lyra_types::no_module_member_type))]
    NoModuleMemberType {
        name: String,
        module: String,
        #[label("no such member type")]
        span: SourceSpan,
    },

    /// Member type lookup found more than one candidate.
    #[error("member type `{name}` of `{base}` is ambiguous")]
    #[diagnostic(code(lyra_types::ambiguous_member_type))]
    AmbiguousMemberType {
        name: String,
        base: String,
        #[label("ambiguous reference")]
        span: SourceSpan,
        candidates: Vec<String>,
    },

    /// Explicit generic arguments applied to a non-generic type.
    #[error("`{ty}` is not a generic type")]
    #[diagnostic(code(lyra_types::not_generic_type))]
    NotGenericType {
        ty: String,
        #[label("generic arguments applied here")]
        span: SourceSpan,
    },

    /// Wrong number of explicit generic arguments.
    #[error("generic type `{name}` takes {expected} argument(s), found {found}")]
    #[diagnostic(code(lyra_types::generic_arg_count_mismatch))]
    GenericArgCountMismatch {
        name: String,
        expected: usize,
        found: usize,
        #[label("wrong number of generic arguments")]
        span: SourceSpan,
        #[label("generic type declared here")]
        decl_span: SourceSpan,
    },

    /// A generic type was referenced without arguments where a bound type is
    /// required.
    #[error("generic type `{ty}` requires explicit generic arguments")]
    #[diagnostic(code(lyra_types::unbound_generic_type))]
    UnboundGenericType {
        ty: String,
        #[label("missing generic arguments")]
        span: SourceSpan,
        #[label("generic type declared here")]
        decl_span: SourceSpan,
    },

    /// A bound generic argument failed a declared constraint.
    #[error("type `{arg}` does not satisfy constraint `{requirement}` of parameter `{param}`")]
    #[diagnostic(code(lyra_types::constraint_not_satisfied))]
    ConstraintNotSatisfied {
        arg: String,
        param: String,
        requirement: String,
        #[label("constraint not satisfied")]
        span: SourceSpan,
    },

    /// A function-shape attribute was applied to a non-function type.
    #[error("attribute `{attr}` requires a function type")]
    #[diagnostic(code(lyra_types::attribute_requires_function_type))]
    AttributeRequiresFunctionType {
        attr: String,
        #[label("applied to a non-function type")]
        span: SourceSpan,
    },

    /// `@autoclosure` on a function whose input is not the empty tuple.
    #[error("`@autoclosure` requires a function with no input, found `{input}`")]
    #[diagnostic(code(lyra_types::autoclosure_nonunit_input))]
    AutoclosureNonUnitInput {
        input: String,
        #[label("function input must be `()`")]
        span: SourceSpan,
    },

    /// An attribute that was not consumed by any recognized application.
    #[error("attribute `{attr}` does not apply to types")]
    #[diagnostic(code(lyra_types::attribute_does_not_apply))]
    AttributeDoesNotApply {
        attr: String,
        #[label("attribute does not apply here")]
        span: SourceSpan,
    },

    /// `@protocol_self` on a base that is not a single-protocol existential.
    #[error("`@protocol_self` requires a protocol type, found `{ty}`")]
    #[diagnostic(code(lyra_types::protocol_self_non_protocol))]
    ProtocolSelfNonProtocol {
        ty: String,
        #[label("not a protocol type")]
        span: SourceSpan,
    },

    /// A protocol composition member that is not an existential type.
    #[error("`{ty}` is not a protocol type and cannot appear in a composition")]
    #[diagnostic(code(lyra_types::composition_member_not_protocol))]
    CompositionMemberNotProtocol {
        ty: String,
        #[label("not a protocol")]
        span: SourceSpan,
    },

    /// The universal dynamic-lookup protocol inside a composition.
    #[error("the dynamic lookup protocol cannot appear in a protocol composition")]
    #[diagnostic(code(lyra_types::composition_dynamic_lookup))]
    CompositionDynamicLookup {
        #[label("not allowed in a composition")]
        span: SourceSpan,
    },

    /// Fixed-size array syntax is not supported.
    #[error("fixed-size array types are not supported")]
    #[diagnostic(code(lyra_types::fixed_size_array_unsupported))]
    FixedSizeArrayUnsupported {
        #[label("size argument not supported")]
        span: SourceSpan,
    },

    /// A sugared type was used but its standard-environment declaration is
    /// missing.
    #[error("cannot form {sugar} type: standard environment declaration not found")]
    #[diagnostic(code(lyra_types::sugar_type_not_found))]
    SugarTypeNotFound {
        /// "array" or "optional".
        sugar: &'static str,
        #[label("sugared type used here")]
        span: SourceSpan,
    },

    /// The evaluator's recursion-depth guard tripped, most likely a cyclic
    /// type alias or unbounded nested instantiation.
    #[error("type expression nesting is too deep")]
    #[diagnostic(code(lyra_types::type_nesting_too_deep))]
    TypeNestingTooDeep {
        #[label("while resolving this type")]
        span: SourceSpan,
    },
}

impl TypeError {
    /// Primary source location of the diagnostic.
    pub fn span(&self) -> SourceSpan {
        match self {
            TypeError::UndeclaredType { span, .. }
            | TypeError::UnknownNameInType { span, .. }
            | TypeError::AmbiguousTypeBase { span, .. }
            | TypeError::ModuleUsedAsType { span, .. }
            | TypeError::NonTypeUsedAsType { span, .. }
            | TypeError::UnknownMemberType { span, .. }
            | TypeError::NoModuleMemberType { span, .. }
            | TypeError::AmbiguousMemberType { span, .. }
            | TypeError::NotGenericType { span, .. }
            | TypeError::GenericArgCountMismatch { span, .. }
            | TypeError::UnboundGenericType { span, .. }
            | TypeError::ConstraintNotSatisfied { span, .. }
            | TypeError::AttributeRequiresFunctionType { span, .. }
            | TypeError::AutoclosureNonUnitInput { span, .. }
            | TypeError::AttributeDoesNotApply { span, .. }
            | TypeError::ProtocolSelfNonProtocol { span, .. }
            | TypeError::CompositionMemberNotProtocol { span, .. }
            | TypeError::CompositionDynamicLookup { span }
            | TypeError::FixedSizeArrayUnsupported { span }
            | TypeError::SugarTypeNotFound { span, .. }
            | TypeError::TypeNestingTooDeep { span } => *span,
        }
    }
}

/// Collecting sink for resolution diagnostics.
///
/// Diagnostics never abort resolution; callers inspect or drain the sink
/// after the fact. Interior mutability lets the resolver share the sink
/// across recursive calls without threading `&mut` everywhere.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: RefCell<Vec<TypeError>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, error: TypeError) {
        log::trace!("diagnostic: {error}");
        self.errors.borrow_mut().push(error);
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }

    /// Drains all collected diagnostics.
    pub fn take(&self) -> Vec<TypeError> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }

    /// Clones the collected diagnostics without draining them.
    pub fn snapshot(&self) -> Vec<TypeError> {
        self.errors.borrow().clone()
    }
}
