//! Condition evaluation against caller-supplied properties and items.

use rustc_hash::{FxHashMap, FxHashSet};
use text_size::TextSize;

use super::ast::{ConditionExpr, LiteralKind, RelationalOp};
use super::error::EvaluationError;
use crate::base::text_utils::names_equal;
use crate::expression::{ExprKind, ExprNode, ExpressionOptions, parse_expression};

/// Lookups used while evaluating a condition.
///
/// Only [`property`](Self::property) is required; the built-in condition
/// functions are provided on top of [`path_exists`](Self::path_exists).
pub trait EvaluationContext {
    /// The value of a property, or `None` if it cannot be resolved.
    fn property(&self, name: &str) -> Option<String>;

    /// The evaluated values of an item list.
    fn item_values(&self, _name: &str) -> Option<Vec<String>> {
        None
    }

    /// The value of a metadata for the current item.
    fn metadata(&self, _item: Option<&str>, _name: &str) -> Option<String> {
        None
    }

    fn path_exists(&self, _path: &str) -> bool {
        false
    }

    /// Invoke a condition function with evaluated arguments.
    fn call_function(&self, name: &str, args: &[String]) -> Result<bool, EvaluationError> {
        if names_equal(name, "Exists") {
            let [path] = args else {
                return Err(EvaluationError::invalid_arguments(name, "expected one argument"));
            };
            let path = path.trim();
            Ok(!path.is_empty() && self.path_exists(path))
        } else if names_equal(name, "HasTrailingSlash") {
            let [value] = args else {
                return Err(EvaluationError::invalid_arguments(name, "expected one argument"));
            };
            Ok(value.ends_with('/') || value.ends_with('\\'))
        } else {
            Err(EvaluationError::unknown_function(name))
        }
    }
}

/// An in-memory [`EvaluationContext`]; names are case-insensitive.
#[derive(Debug, Clone, Default)]
pub struct SimpleContext {
    properties: FxHashMap<String, String>,
    items: FxHashMap<String, Vec<String>>,
    metadata: FxHashMap<String, String>,
    paths: FxHashSet<String>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl SimpleContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: &str, value: impl Into<String>) -> Self {
        self.properties.insert(key(name), value.into());
        self
    }

    pub fn with_items<I, S>(mut self, name: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.items
            .insert(key(name), values.into_iter().map(Into::into).collect());
        self
    }

    /// Add metadata; `item` qualifies it, `None` makes it the unqualified value.
    pub fn with_metadata(mut self, item: Option<&str>, name: &str, value: impl Into<String>) -> Self {
        let key = match item {
            Some(item) => format!("{}.{}", key(item), key(name)),
            None => key(name),
        };
        self.metadata.insert(key, value.into());
        self
    }

    pub fn with_existing_path(mut self, path: impl Into<String>) -> Self {
        self.paths.insert(path.into());
        self
    }
}

impl EvaluationContext for SimpleContext {
    fn property(&self, name: &str) -> Option<String> {
        self.properties.get(&key(name)).cloned()
    }

    fn item_values(&self, name: &str) -> Option<Vec<String>> {
        self.items.get(&key(name)).cloned()
    }

    fn metadata(&self, item: Option<&str>, name: &str) -> Option<String> {
        let qualified = item.and_then(|item| {
            self.metadata
                .get(&format!("{}.{}", key(item), key(name)))
                .cloned()
        });
        qualified.or_else(|| self.metadata.get(&key(name)).cloned())
    }

    fn path_exists(&self, path: &str) -> bool {
        self.paths.contains(path)
    }
}

/// Coerce a value to bool: `true`/`on`/`yes`, `false`/`off`/`no`, and their
/// `!`-prefixed negations, ignoring case.
pub fn parse_bool(value: &str) -> Option<bool> {
    const WORDS: [(&str, bool); 6] = [
        ("true", true),
        ("on", true),
        ("yes", true),
        ("false", false),
        ("off", false),
        ("no", false),
    ];
    let value = value.trim();
    let (value, negated) = match value.strip_prefix('!') {
        Some(rest) => (rest, true),
        None => (value, false),
    };
    WORDS
        .iter()
        .find(|(word, _)| value.eq_ignore_ascii_case(word))
        .map(|(_, b)| *b != negated)
}

/// Parse a decimal or `0x` hexadecimal number.
fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let (digits, negative) = match value.strip_prefix('-') {
        Some(rest) => (rest, true),
        None => (value, false),
    };
    let number = if let Some(hex) = digits
        .strip_prefix("0x")
        .or_else(|| digits.strip_prefix("0X"))
    {
        i64::from_str_radix(hex, 16).ok()? as f64
    } else if digits.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        digits.parse::<f64>().ok()?
    } else {
        return None;
    };
    Some(if negative { -number } else { number })
}

fn bool_str(value: bool) -> String {
    let text = if value { "true" } else { "false" };
    text.to_string()
}

fn compare(left: &str, right: &str, op: RelationalOp) -> Result<bool, EvaluationError> {
    if let (Some(l), Some(r)) = (parse_number(left), parse_number(right)) {
        return Ok(match op {
            RelationalOp::Equal => l == r,
            RelationalOp::NotEqual => l != r,
            RelationalOp::Less => l < r,
            RelationalOp::LessOrEqual => l <= r,
            RelationalOp::Greater => l > r,
            RelationalOp::GreaterOrEqual => l >= r,
        });
    }
    match op {
        RelationalOp::Equal => Ok(left.eq_ignore_ascii_case(right)),
        RelationalOp::NotEqual => Ok(!left.eq_ignore_ascii_case(right)),
        _ => Err(EvaluationError::NotNumeric {
            left: left.to_string(),
            right: right.to_string(),
            op: op.as_str(),
        }),
    }
}

/// Substitute property, item and metadata references in `text`.
///
/// Anything richer (property functions, transforms) is left to the build
/// engine and reported as unresolved.
fn expand(text: &str, ctx: &dyn EvaluationContext) -> Result<String, EvaluationError> {
    let root = parse_expression(text, ExpressionOptions::ITEMS_AND_METADATA, TextSize::new(0));
    let mut out = String::new();
    for item in root.list_items() {
        expand_node(item, text, ctx, &mut out)?;
    }
    Ok(out)
}

fn expand_node(
    node: &ExprNode,
    text: &str,
    ctx: &dyn EvaluationContext,
    out: &mut String,
) -> Result<(), EvaluationError> {
    let unresolved = || {
        let source = text
            .get(std::ops::Range::<usize>::from(node.range))
            .unwrap_or(text);
        EvaluationError::unresolved(source)
    };

    match &node.kind {
        ExprKind::Text { value, .. } => out.push_str(value),
        ExprKind::Concat(parts) => {
            for part in parts {
                expand_node(part, text, ctx, out)?;
            }
        }
        ExprKind::Property(body) => {
            let ExprKind::PropertyName(name) = &body.kind else {
                return Err(unresolved());
            };
            out.push_str(&ctx.property(name).ok_or_else(unresolved)?);
        }
        ExprKind::Item(body) => {
            let ExprKind::ItemName(name) = &body.kind else {
                return Err(unresolved());
            };
            out.push_str(&ctx.item_values(name).ok_or_else(unresolved)?.join(";"));
        }
        ExprKind::Metadata { item, metadata } => {
            let item = item.as_ref().map(|i| i.name.as_str());
            out.push_str(&ctx.metadata(item, &metadata.name).ok_or_else(unresolved)?);
        }
        _ => return Err(unresolved()),
    }
    Ok(())
}

impl ConditionExpr {
    /// Evaluate to a boolean, short-circuiting `and` and `or`.
    pub fn try_evaluate_to_bool(&self, ctx: &dyn EvaluationContext) -> Result<bool, EvaluationError> {
        match self {
            Self::Or(left, right) => {
                if left.try_evaluate_to_bool(ctx)? {
                    return Ok(true);
                }
                right.try_evaluate_to_bool(ctx)
            }
            Self::And(left, right) => {
                if !left.try_evaluate_to_bool(ctx)? {
                    return Ok(false);
                }
                right.try_evaluate_to_bool(ctx)
            }
            Self::Not(operand) => Ok(!operand.try_evaluate_to_bool(ctx)?),
            Self::Relational { left, right, op } => {
                let left = left.evaluate_value(ctx)?;
                let right = right.evaluate_value(ctx)?;
                compare(&left, &right, *op)
            }
            Self::Function { name, args, .. } => {
                let args = args
                    .iter()
                    .map(|arg| arg.evaluate_value(ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.call_function(name, &args)
            }
            Self::Factor(_) | Self::Reference { .. } => {
                let value = self.evaluate_value(ctx)?;
                parse_bool(&value).ok_or_else(|| EvaluationError::not_boolean(value))
            }
        }
    }

    /// Evaluate to a string: expanded literal text, or `true`/`false` for
    /// boolean nodes.
    pub fn evaluate_value(&self, ctx: &dyn EvaluationContext) -> Result<String, EvaluationError> {
        match self {
            Self::Factor(literal) => match literal.kind {
                LiteralKind::Quoted => expand(&literal.value, ctx),
                LiteralKind::Bare | LiteralKind::Number => Ok(literal.value.clone()),
            },
            Self::Reference { reference, .. } => expand(&reference.render(), ctx),
            _ => self.try_evaluate_to_bool(ctx).map(bool_str),
        }
    }

    /// Report every plain property reference to `sink`, without evaluating.
    pub fn collect_condition_properties(&self, sink: &mut dyn FnMut(&str)) {
        match self {
            Self::Factor(literal) if literal.kind == LiteralKind::Quoted => {
                let root = parse_expression(
                    &literal.value,
                    ExpressionOptions::ITEMS_AND_METADATA,
                    literal.value_offset(),
                );
                root.property_names().into_iter().for_each(&mut *sink);
            }
            Self::Reference { reference, range } => {
                let root = parse_expression(
                    &reference.render(),
                    ExpressionOptions::ITEMS_AND_METADATA,
                    range.start(),
                );
                root.property_names().into_iter().for_each(&mut *sink);
            }
            _ => {
                for child in self.children() {
                    child.collect_condition_properties(sink);
                }
            }
        }
    }
}
