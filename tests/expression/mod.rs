//! Expression parser tests
//!
//! Tests for:
//! - List splitting and item spans
//! - Reference shapes
//! - Error nodes and recovery

pub mod tests_expression_parser;
