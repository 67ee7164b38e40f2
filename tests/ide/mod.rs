//! IDE feature tests
//!
//! Tests for:
//! - Completion trigger classification
//! - Find references

pub mod tests_trigger;
