//! Expression tree types.
//!
//! Every node owns its absolute [`TextRange`]; trees are immutable values
//! built fresh by each call to [`parse_expression`](super::parse_expression).

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

/// The structural separator of a top-level list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ListKind {
    /// A single item, no separator seen.
    #[default]
    None,
    /// `a;b;c`
    Semicolon,
    /// `a,b,c`
    Comma,
}

impl ListKind {
    /// The separator character, if any.
    pub fn separator(&self) -> Option<char> {
        match self {
            Self::None => None,
            Self::Semicolon => Some(';'),
            Self::Comma => Some(','),
        }
    }

    /// Map a separator character to its list kind.
    pub fn from_separator(c: char) -> Option<Self> {
        match c {
            ';' => Some(Self::Semicolon),
            ',' => Some(Self::Comma),
            _ => None,
        }
    }
}

/// Whether a function is chained onto a property (`.`) or an item (`->`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctionKind {
    Property,
    Item,
}

/// A name with its absolute source range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    pub name: SmolStr,
    pub range: TextRange,
}

impl Ident {
    pub fn new(name: impl Into<SmolStr>, range: TextRange) -> Self {
        Self {
            name: name.into(),
            range,
        }
    }

    pub fn offset(&self) -> TextSize {
        self.range.start()
    }

    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// A parsed expression node.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprNode {
    pub range: TextRange,
    pub kind: ExprKind,
}

/// Node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Literal text. `pure` is set when the text is a whole list item.
    Text { value: String, pure: bool },
    /// The root of every top-level parse, even for a single item.
    List {
        items: Vec<ExprNode>,
        separator: ListKind,
    },
    /// Literal text mixed with references inside one list item.
    Concat(Vec<ExprNode>),
    /// `$( body )`; the body is a `PropertyName`, `FunctionInvocation` or `Indexer`.
    Property(Box<ExprNode>),
    PropertyName(SmolStr),
    /// `@( body )`; the body is an `ItemName`, `FunctionInvocation` or `ItemTransform`.
    Item(Box<ExprNode>),
    ItemName(SmolStr),
    /// `%(Name)` or `%(Item.Name)`.
    Metadata {
        item: Option<Ident>,
        metadata: Ident,
    },
    /// `target.Name(args)`, `[Class]::Name(args)` or `target->Name(args)`.
    FunctionInvocation {
        kind: FunctionKind,
        target: Box<ExprNode>,
        name: Ident,
        args: Option<Box<ExprNode>>,
    },
    /// `target->'transform', 'separator'`; either part may be absent but not both.
    ItemTransform {
        target: Box<ExprNode>,
        transform: Option<Box<ExprNode>>,
        separator: Option<Box<ExprNode>>,
    },
    /// `target[index]`
    Indexer {
        target: Box<ExprNode>,
        index: Box<ExprNode>,
    },
    /// A class name: the `Foo` in `$([Foo]::Bar())` or the type of an enum argument.
    ClassRef(SmolStr),
    /// `( arg, arg )`
    ArgumentList(Vec<ExprNode>),
    /// A quoted argument or transform; the range includes the quotes.
    Quoted { quote: char, inner: Box<ExprNode> },
    Bool(bool),
    Int(i64),
    Float(f64),
    /// An unquoted `Type.Member` argument, e.g. `StringComparison.Ordinal`.
    EnumValue {
        class: Box<ExprNode>,
        member: Ident,
    },
    /// A malformed reference, scoped to the list item that contains it.
    Error(Box<ExpressionError>),
}

/// A parse failure inside an expression.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpressionError {
    pub kind: ExpressionErrorKind,
    /// Where the failure was detected.
    pub offset: TextSize,
    /// Set when the failure was caused by running out of input.
    pub at_end: bool,
    /// The innermost node that was completed before the failure.
    pub partial: Option<ExprNode>,
}

/// Categorized expression parse failures.
///
/// Codes follow the `EXP0xx` convention so diagnostics can be filtered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ExpressionErrorKind {
    #[error("expected a property name")]
    ExpectedPropertyName,
    #[error("expected an item name")]
    ExpectedItemName,
    #[error("expected a metadata name")]
    ExpectedMetadataName,
    #[error("expected a function name")]
    ExpectedFunctionName,
    #[error("expected a class name")]
    ExpectedClassName,
    #[error("expected '::' after class name")]
    ExpectedColonColon,
    #[error("expected ')'")]
    ExpectedRightParen,
    #[error("expected ']'")]
    ExpectedRightBracket,
    #[error("unterminated quoted string")]
    UnterminatedQuote,
    #[error("unterminated argument list")]
    UnterminatedArguments,
    #[error("unexpected character")]
    UnexpectedCharacter,
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("item references are not allowed here")]
    ItemsDisallowed,
    #[error("metadata references are not allowed here")]
    MetadataDisallowed,
}

impl ExpressionErrorKind {
    /// Stable diagnostic code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExpectedPropertyName => "EXP001",
            Self::ExpectedItemName => "EXP002",
            Self::ExpectedMetadataName => "EXP003",
            Self::ExpectedFunctionName => "EXP004",
            Self::ExpectedClassName => "EXP005",
            Self::ExpectedColonColon => "EXP006",
            Self::ExpectedRightParen => "EXP007",
            Self::ExpectedRightBracket => "EXP008",
            Self::UnterminatedQuote => "EXP009",
            Self::UnterminatedArguments => "EXP010",
            Self::UnexpectedCharacter => "EXP011",
            Self::UnexpectedEnd => "EXP012",
            Self::ItemsDisallowed => "EXP013",
            Self::MetadataDisallowed => "EXP014",
        }
    }
}

impl ExprNode {
    pub fn new(range: TextRange, kind: ExprKind) -> Self {
        Self { range, kind }
    }

    pub fn offset(&self) -> TextSize {
        self.range.start()
    }

    pub fn len(&self) -> TextSize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn end(&self) -> TextSize {
        self.range.end()
    }

    /// Direct children in source order.
    pub fn children(&self) -> Vec<&ExprNode> {
        match &self.kind {
            ExprKind::List { items, .. } => items.iter().collect(),
            ExprKind::Concat(parts) | ExprKind::ArgumentList(parts) => parts.iter().collect(),
            ExprKind::Property(body) | ExprKind::Item(body) => vec![body.as_ref()],
            ExprKind::FunctionInvocation { target, args, .. } => {
                let mut children = vec![target.as_ref()];
                children.extend(args.as_deref());
                children
            }
            ExprKind::ItemTransform {
                target,
                transform,
                separator,
            } => {
                let mut children = vec![target.as_ref()];
                children.extend(transform.as_deref());
                children.extend(separator.as_deref());
                children
            }
            ExprKind::Indexer { target, index } => vec![target.as_ref(), index.as_ref()],
            ExprKind::Quoted { inner, .. } => vec![inner.as_ref()],
            ExprKind::EnumValue { class, .. } => vec![class.as_ref()],
            ExprKind::Error(error) => error.partial.iter().collect(),
            ExprKind::Text { .. }
            | ExprKind::PropertyName(_)
            | ExprKind::ItemName(_)
            | ExprKind::Metadata { .. }
            | ExprKind::ClassRef(_)
            | ExprKind::Bool(_)
            | ExprKind::Int(_)
            | ExprKind::Float(_) => Vec::new(),
        }
    }

    /// This node followed by all of its descendants, pre-order.
    pub fn descendants(&self) -> Vec<&ExprNode> {
        let mut out = Vec::new();
        self.walk(&mut |node, _| out.push(node));
        out
    }

    /// Visit this node and every descendant, pre-order, with each node's parent.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a ExprNode, Option<&'a ExprNode>)) {
        fn go<'a>(
            node: &'a ExprNode,
            parent: Option<&'a ExprNode>,
            f: &mut impl FnMut(&'a ExprNode, Option<&'a ExprNode>),
        ) {
            f(node, parent);
            for child in node.children() {
                go(child, Some(node), f);
            }
        }
        go(self, None, f);
    }

    /// The deepest node whose range contains `offset`, end inclusive.
    pub fn find_at(&self, offset: TextSize) -> Option<&ExprNode> {
        if !self.range.contains_inclusive(offset) {
            return None;
        }
        // Later siblings win ties so a caret between `a` and `;b` lands on `b`.
        self.children()
            .into_iter()
            .rev()
            .find_map(|child| child.find_at(offset))
            .or(Some(self))
    }

    /// Names of simple property references in source order.
    ///
    /// Only a bare `$(Name)` counts; a property with a function or indexer
    /// chain such as `$(Name.Trim())` is skipped, though references nested in
    /// its arguments are still reported.
    pub fn property_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.walk(&mut |node, parent| {
            if let (ExprKind::PropertyName(name), Some(parent)) = (&node.kind, parent) {
                if matches!(parent.kind, ExprKind::Property(_)) {
                    names.push(name.as_str());
                }
            }
        });
        names
    }

    /// The items of a top-level list, or the node itself for anything else.
    pub fn list_items(&self) -> &[ExprNode] {
        match &self.kind {
            ExprKind::List { items, .. } => items,
            _ => std::slice::from_ref(self),
        }
    }

    /// The separator kind of a top-level list.
    pub fn list_kind(&self) -> ListKind {
        match &self.kind {
            ExprKind::List { separator, .. } => *separator,
            _ => ListKind::None,
        }
    }

    /// Check whether any node in the tree is a parse error.
    pub fn has_errors(&self) -> bool {
        self.descendants()
            .iter()
            .any(|node| matches!(node.kind, ExprKind::Error(_)))
    }

    /// The literal value of a `Text` node.
    pub fn as_text(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Text { value, .. } => Some(value),
            _ => None,
        }
    }

    /// For a `FunctionInvocation`, `Indexer`, `ItemTransform`, `Property` or
    /// `Item`, walk down the target chain to the root name node.
    pub fn chain_root(&self) -> &ExprNode {
        match &self.kind {
            ExprKind::Property(inner) | ExprKind::Item(inner) => inner.chain_root(),
            ExprKind::FunctionInvocation { target, .. }
            | ExprKind::ItemTransform { target, .. }
            | ExprKind::Indexer { target, .. } => target.chain_root(),
            _ => self,
        }
    }

    /// The item name an `@(...)` reference is rooted at.
    pub fn item_name(&self) -> Option<&str> {
        match &self.chain_root().kind {
            ExprKind::ItemName(name) => Some(name),
            _ => None,
        }
    }
}
