//! Condition tree types.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

/// Comparison operators. A relational level holds at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationalOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl RelationalOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::Less => "<",
            Self::LessOrEqual => "<=",
            Self::Greater => ">",
            Self::GreaterOrEqual => ">=",
        }
    }

    /// Check whether this is `==` or `!=`.
    pub fn is_equality(&self) -> bool {
        matches!(self, Self::Equal | Self::NotEqual)
    }
}

/// How a literal operand was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LiteralKind {
    /// `'text'`; the value may contain references and is expanded on evaluation.
    Quoted,
    /// An unquoted word such as `true`.
    Bare,
    Number,
}

/// A literal operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Literal {
    /// The text without its quotes. Nothing is unescaped.
    pub value: String,
    pub kind: LiteralKind,
    /// Source range, including quotes.
    pub range: TextRange,
}

impl Literal {
    /// Offset of the first character of [`Self::value`].
    pub fn value_offset(&self) -> TextSize {
        match self.kind {
            LiteralKind::Quoted => self.range.start() + TextSize::from(1),
            LiteralKind::Bare | LiteralKind::Number => self.range.start(),
        }
    }
}

/// An unquoted `$(...)`, `@(...)` or `%(...)` operand.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionReference {
    /// `$(body)`; the body is kept verbatim and may hold property functions.
    Property { body: String },
    /// `@(Name->'transform', 'separator')`
    Item {
        name: SmolStr,
        transform: Option<String>,
        separator: Option<String>,
    },
    /// `%(Item.Name)` or `%(Name)`
    Metadata { item: Option<SmolStr>, name: SmolStr },
}

impl ConditionReference {
    /// Canonical source form of the reference.
    pub fn render(&self) -> String {
        match self {
            Self::Property { body } => format!("$({body})"),
            Self::Item {
                name,
                transform,
                separator,
            } => {
                let mut text = format!("@({name}");
                if let Some(transform) = transform {
                    text.push_str(&format!("->'{transform}'"));
                    if let Some(separator) = separator {
                        text.push_str(&format!(", '{separator}'"));
                    }
                }
                text.push(')');
                text
            }
            Self::Metadata {
                item: Some(item),
                name,
            } => format!("%({item}.{name})"),
            Self::Metadata { item: None, name } => format!("%({name})"),
        }
    }
}

/// A parsed condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionExpr {
    Or(Box<ConditionExpr>, Box<ConditionExpr>),
    And(Box<ConditionExpr>, Box<ConditionExpr>),
    Not(Box<ConditionExpr>),
    Relational {
        left: Box<ConditionExpr>,
        right: Box<ConditionExpr>,
        op: RelationalOp,
    },
    Factor(Literal),
    Reference {
        reference: ConditionReference,
        range: TextRange,
    },
    /// A built-in predicate such as `Exists('path')`.
    Function {
        name: SmolStr,
        args: Vec<ConditionExpr>,
        range: TextRange,
    },
}

impl ConditionExpr {
    /// Source range covered by the node, ignoring grouping parentheses.
    pub fn range(&self) -> TextRange {
        match self {
            Self::Or(left, right)
            | Self::And(left, right)
            | Self::Relational { left, right, .. } => left.range().cover(right.range()),
            Self::Not(operand) => operand.range(),
            Self::Factor(literal) => literal.range,
            Self::Reference { range, .. } | Self::Function { range, .. } => *range,
        }
    }

    /// Direct children, left to right.
    pub fn children(&self) -> Vec<&ConditionExpr> {
        match self {
            Self::Or(left, right)
            | Self::And(left, right)
            | Self::Relational { left, right, .. } => vec![left.as_ref(), right.as_ref()],
            Self::Not(operand) => vec![operand.as_ref()],
            Self::Function { args, .. } => args.iter().collect(),
            Self::Factor(_) | Self::Reference { .. } => Vec::new(),
        }
    }
}
