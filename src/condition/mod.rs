//! Conditions
//!
//! The boolean language of `Condition="..."` attributes: a Logos tokenizer,
//! a recursive-descent parser, and an evaluator over an [`EvaluationContext`].

mod ast;
mod error;
mod eval;
mod lexer;
mod parser;

pub use ast::{ConditionExpr, ConditionReference, Literal, LiteralKind, RelationalOp};
pub use error::{ConditionError, EvaluationError, ParseError, TokenizeError};
pub use eval::{EvaluationContext, SimpleContext, parse_bool};
pub use lexer::{Lexer, Token, TokenKind, tokenize};
pub use parser::parse_condition;

use text_size::TextSize;

/// Parse and evaluate a condition in one call.
///
/// Empty text is `true`. Any failure is reported as a single
/// [`ConditionError`] carrying the condition text.
pub fn parse_and_evaluate(
    condition: &str,
    ctx: &dyn EvaluationContext,
) -> Result<bool, ConditionError> {
    if condition.trim().is_empty() {
        return Ok(true);
    }

    let result = parse_condition(condition, TextSize::new(0))
        .map_err(|e| ConditionError::invalid(condition, e))
        .and_then(|expr| {
            expr.try_evaluate_to_bool(ctx).map_err(|e| match e {
                EvaluationError::NotBoolean { .. } => ConditionError::NotBoolean {
                    condition: condition.to_string(),
                },
                e => ConditionError::invalid(condition, e),
            })
        });

    if let Err(error) = &result {
        tracing::debug!(%error, "condition failed");
    }
    result
}
