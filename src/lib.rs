//! # msbuild-language
//!
//! Core library for the micro-languages embedded in MSBuild project files:
//! boolean conditions and value expressions.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide         → trigger-state classifier, find-references collector
//!   ↓
//! document    → resolved XML document, value kinds, core schema
//!   ↓
//! condition   → Logos tokenizer, recursive-descent parser, evaluator
//! expression  → expression parser and tree
//!   ↓
//! base        → Primitives (TextRange, name characters)
//! ```

// ============================================================================
// MODULES (dependency order: base → expression/condition → document → ide)
// ============================================================================

/// Foundation types: TextRange, TextSize, name characters
pub mod base;

/// Value expressions: `$(Prop)`, `@(Item)`, `%(Meta)`, functions, lists
pub mod expression;

/// Conditions: tokenizer, parser, AST, evaluation
pub mod condition;

/// Resolved project documents and their classification
pub mod document;

/// IDE features: completion triggers, find-references
pub mod ide;

// Re-export foundation types
pub use base::{TextRange, TextSize};
