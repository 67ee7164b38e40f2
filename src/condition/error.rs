//! Error types for condition tokenizing, parsing and evaluation.

use text_size::TextSize;
use thiserror::Error;

/// Errors raised while tokenizing condition text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenizeError {
    /// A `'` that is never closed.
    #[error("unterminated string starting at offset {offset:?}")]
    UnterminatedString { offset: TextSize },

    /// A `$(` whose parenthesis is never closed.
    #[error("unterminated reference starting at offset {offset:?}")]
    UnterminatedReference { offset: TextSize },
}

/// Errors raised while parsing a condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("unexpected token '{token}' at offset {offset:?}")]
    UnexpectedToken { token: String, offset: TextSize },

    #[error("expected {expected} but found '{found}' at offset {offset:?}")]
    ExpectedToken {
        expected: &'static str,
        found: String,
        offset: TextSize,
    },

    #[error("expected {expected} but the condition ended at offset {offset:?}")]
    UnexpectedEof {
        expected: &'static str,
        offset: TextSize,
    },

    #[error(transparent)]
    Tokenize(#[from] TokenizeError),
}

impl ParseError {
    /// Create an unexpected token error.
    pub fn unexpected(token: impl Into<String>, offset: TextSize) -> Self {
        Self::UnexpectedToken {
            token: token.into(),
            offset,
        }
    }

    /// Create a missing-token error.
    pub fn expected(expected: &'static str, found: impl Into<String>, offset: TextSize) -> Self {
        Self::ExpectedToken {
            expected,
            found: found.into(),
            offset,
        }
    }

    /// Create an end-of-input error.
    pub fn eof(expected: &'static str, offset: TextSize) -> Self {
        Self::UnexpectedEof { expected, offset }
    }

    /// Where the error was detected.
    pub fn offset(&self) -> TextSize {
        match self {
            Self::UnexpectedToken { offset, .. }
            | Self::ExpectedToken { offset, .. }
            | Self::UnexpectedEof { offset, .. } => *offset,
            Self::Tokenize(
                TokenizeError::UnterminatedString { offset }
                | TokenizeError::UnterminatedReference { offset },
            ) => *offset,
        }
    }
}

/// Errors raised while evaluating a parsed condition.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("'{value}' is not a boolean value")]
    NotBoolean { value: String },

    #[error("cannot compare '{left}' {op} '{right}': both sides must be numbers")]
    NotNumeric {
        left: String,
        right: String,
        op: &'static str,
    },

    #[error("cannot resolve '{reference}'")]
    UnresolvedReference { reference: String },

    #[error("unknown condition function '{name}'")]
    UnknownFunction { name: String },

    #[error("invalid arguments to '{name}': {reason}")]
    InvalidArguments { name: String, reason: String },
}

impl EvaluationError {
    pub fn not_boolean(value: impl Into<String>) -> Self {
        Self::NotBoolean {
            value: value.into(),
        }
    }

    pub fn unresolved(reference: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            reference: reference.into(),
        }
    }

    pub fn unknown_function(name: impl Into<String>) -> Self {
        Self::UnknownFunction { name: name.into() }
    }

    pub fn invalid_arguments(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidArguments {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// The single failure reported by [`parse_and_evaluate`](super::parse_and_evaluate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConditionError {
    #[error("invalid condition \"{condition}\": {message}")]
    InvalidCondition { condition: String, message: String },

    #[error("cannot evaluate \"{condition}\" to bool")]
    NotBoolean { condition: String },
}

impl ConditionError {
    pub fn invalid(condition: impl Into<String>, message: impl ToString) -> Self {
        Self::InvalidCondition {
            condition: condition.into(),
            message: message.to_string(),
        }
    }

    /// The condition text that failed.
    pub fn condition(&self) -> &str {
        match self {
            Self::InvalidCondition { condition, .. } | Self::NotBoolean { condition } => condition,
        }
    }
}
