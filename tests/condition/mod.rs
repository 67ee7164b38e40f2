//! Condition language tests
//!
//! Tests for:
//! - Grammar and grouping
//! - Parse errors
//! - Evaluation

pub mod tests_condition_parser;
