//! The semantic type model: resolved, structurally interned type values.

pub mod core;
pub mod intern;

pub use self::core::{FnExtInfo, TupleElem, Ty, TyKind};
pub use intern::TyInterner;
