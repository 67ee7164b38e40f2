//! Value expressions
//!
//! The text of attribute values and element bodies: literal text mixed with
//! `$(Property)`, `@(Item)` and `%(Metadata)` references, property and item
//! functions, transforms, and `;`/`,` lists.

mod ast;
mod options;
mod parser;

pub use ast::{
    ExprKind, ExprNode, ExpressionError, ExpressionErrorKind, FunctionKind, Ident, ListKind,
};
pub use options::ExpressionOptions;
pub use parser::parse_expression;
