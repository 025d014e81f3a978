#![doc = include_str!("../README.md")]

pub mod ast;

pub use ast::common::Ident;
pub use ast::types::{
    CallingConvention, ConstArg, Ownership, PathSegment, SegmentId, TupleTypeElem, TypeAttr,
    TypeAttrKind, TypeExpr, TypeExprKind,
};
