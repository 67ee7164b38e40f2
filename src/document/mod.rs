//! Resolved project documents
//!
//! The XML tree of a project file with raw source offsets, plus the
//! classification a [`Schema`] attaches to each element and attribute: its
//! syntax role and the kind of value it holds. The reference collector walks
//! this tree; everything else in the crate works on plain text.

mod schema;
#[cfg(feature = "xml")]
mod xml;

pub use schema::{CoreSchema, Schema};

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use crate::base::text_utils::names_equal;
use crate::expression::ExpressionOptions;

/// Errors that can occur while loading a document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DocumentError {
    /// XML parsing error.
    #[error("XML error: {0}")]
    Xml(String),

    /// An element that is never closed, or a close tag with no open element.
    #[error("unbalanced element '{name}' at offset {offset:?}")]
    Unbalanced { name: String, offset: TextSize },
}

impl DocumentError {
    /// Create an XML error.
    pub fn xml(message: impl Into<String>) -> Self {
        Self::Xml(message.into())
    }
}

/// The syntax role of an element or attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyntaxKind {
    Project,
    PropertyGroup,
    Property,
    ItemGroup,
    Item,
    ItemDefinitionGroup,
    ItemDefinition,
    Metadata,
    Target,
    Task,
    UsingTask,
    Import,
    Choose,
    When,
    Otherwise,
    OnError,
    Output,
    Parameter,
    Other,
}

/// The scalar type of a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScalarKind {
    #[default]
    Unknown,
    String,
    Bool,
    Int,
    File,
    TargetName,
    PropertyName,
    ItemName,
    MetadataName,
    TaskName,
    Condition,
}

/// The kind of value an element or attribute holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ValueKind {
    pub scalar: ScalarKind,
    /// `;`-separated list.
    pub list: bool,
    /// `,`-separated list.
    pub comma_list: bool,
    /// The value is literal text: no references are expanded.
    pub literal: bool,
}

impl ValueKind {
    pub const fn new(scalar: ScalarKind) -> Self {
        Self {
            scalar,
            list: false,
            comma_list: false,
            literal: false,
        }
    }

    pub const fn list(mut self) -> Self {
        self.list = true;
        self
    }

    pub const fn comma_list(mut self) -> Self {
        self.comma_list = true;
        self
    }

    pub const fn literal(mut self) -> Self {
        self.literal = true;
        self
    }

    /// Check whether the value may contain references.
    pub fn allows_expressions(&self) -> bool {
        !self.literal
    }

    /// How values of this kind are parsed.
    pub fn expression_options(&self) -> ExpressionOptions {
        ExpressionOptions::for_value_kind(*self)
    }
}

impl ExpressionOptions {
    /// Parse switches for a value of the given kind.
    ///
    /// Conditions are parsed as a whole, without list splitting.
    pub fn for_value_kind(kind: ValueKind) -> Self {
        if kind.scalar == ScalarKind::Condition {
            return Self::ITEMS_AND_METADATA;
        }
        let mut options = if kind.literal {
            Self::PLAIN_TEXT
        } else {
            Self::ITEMS_AND_METADATA
        };
        if kind.list {
            options = options.with_lists();
        }
        if kind.comma_list {
            options = options.with_comma_lists();
        }
        options
    }
}

/// Schema classification of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedElement {
    pub syntax_kind: SyntaxKind,
    /// Kind of the element's text content, if it has one.
    pub value_kind: Option<ValueKind>,
}

/// Schema classification of an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResolvedAttribute {
    /// `Metadata` for item metadata written as an attribute, otherwise `Other`.
    pub syntax_kind: SyntaxKind,
    pub value_kind: ValueKind,
}

/// Raw text content of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementValue {
    pub text: String,
    pub range: TextRange,
}

/// An attribute with the raw (unescaped) text of its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: SmolStr,
    /// From the start of the name to the closing quote, inclusive.
    pub range: TextRange,
    pub name_range: TextRange,
    pub value: String,
    pub value_range: TextRange,
    pub resolved: Option<ResolvedAttribute>,
}

/// An element and its subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    pub name: SmolStr,
    /// From `<` to the end of the closing tag.
    pub range: TextRange,
    pub name_range: TextRange,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    /// Text content of an element without child elements.
    pub value: Option<ElementValue>,
    pub resolved: Option<ResolvedElement>,
}

impl Element {
    /// Create an element whose name starts right after `<` at `offset`.
    pub fn new(name: impl Into<SmolStr>, offset: TextSize) -> Self {
        let name = name.into();
        let name_range = TextRange::at(offset + TextSize::from(1), TextSize::of(name.as_str()));
        Self {
            name,
            range: TextRange::new(offset, name_range.end()),
            name_range,
            attributes: Vec::new(),
            children: Vec::new(),
            value: None,
            resolved: None,
        }
    }

    /// Find an attribute by name, ignoring case.
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| names_equal(&a.name, name))
    }

    pub fn syntax_kind(&self) -> Option<SyntaxKind> {
        self.resolved.map(|r| r.syntax_kind)
    }
}

/// A loaded project document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    text: String,
    root: Element,
}

impl Document {
    pub fn new(text: impl Into<String>, root: Element) -> Self {
        Self {
            text: text.into(),
            root,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    /// Classify every element and attribute with `schema`.
    ///
    /// Elements the schema does not know are left unresolved along with
    /// their whole subtree.
    pub fn resolve(&mut self, schema: &dyn Schema) {
        fn go(element: &mut Element, parent: Option<SyntaxKind>, schema: &dyn Schema) {
            element.resolved = schema.resolve_element(parent, &element.name);
            let Some(resolved) = element.resolved else {
                return;
            };
            for attribute in &mut element.attributes {
                attribute.resolved =
                    schema.resolve_attribute(resolved.syntax_kind, &element.name, &attribute.name);
            }
            for child in &mut element.children {
                go(child, Some(resolved.syntax_kind), schema);
            }
        }
        go(&mut self.root, None, schema);
    }

    /// Parse and classify with the core MSBuild vocabulary.
    #[cfg(feature = "xml")]
    pub fn parse_resolved(text: &str) -> Result<Self, DocumentError> {
        let mut document = Self::parse(text)?;
        document.resolve(&CoreSchema);
        Ok(document)
    }
}
