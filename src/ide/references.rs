//! Find-all-references over a resolved document.
//!
//! A [`ReferenceCollector`] is a [`ReferenceTarget`] plus a walk: every
//! element and attribute is visited once in document order, declaration
//! sites are checked against the element/attribute classification, and
//! every value that may hold an expression is reparsed and searched.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};
use thiserror::Error;

use crate::base::text_size;
use crate::base::text_utils::names_equal;
use crate::document::{
    Attribute, Document, Element, ResolvedAttribute, ScalarKind, SyntaxKind, ValueKind,
};
use crate::expression::{ExprKind, ExprNode, ExpressionOptions, FunctionKind, parse_expression};

/// How a reference uses its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceUsage {
    Declaration,
    Read,
    Write,
}

/// A single occurrence of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Reference {
    pub range: TextRange,
    pub usage: ReferenceUsage,
}

impl Reference {
    fn new(range: TextRange, usage: ReferenceUsage) -> Self {
        Self { range, usage }
    }
}

/// The kinds of symbol a completion or navigation request can land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Property,
    Item,
    Metadata,
    Task,
    TaskParameter,
    Target,
    PropertyFunction,
    StaticPropertyFunction,
    ItemFunction,
    Class,
    Enum,
    Keyword,
    Sdk,
}

/// Errors from building a collector.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectorError {
    #[error("{kind:?} reference name cannot be empty")]
    EmptyName { kind: SymbolKind },

    #[error("cannot collect references to {kind:?}")]
    Unsupported { kind: SymbolKind },
}

/// The symbol whose references are collected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ReferenceTarget {
    Property(SmolStr),
    Item(SmolStr),
    /// Metadata of one item type.
    Metadata { item: SmolStr, metadata: SmolStr },
    Task(SmolStr),
    /// Uses of a target name in target lists, plus its declarations.
    Target(SmolStr),
    /// Only the `Name` attributes of `<Target>` elements.
    TargetDefinition(SmolStr),
    /// A function called on a property whose value has the given kind.
    PropertyFunction { value_kind: ScalarKind, name: SmolStr },
    StaticPropertyFunction { class: SmolStr, name: SmolStr },
    ItemFunction(SmolStr),
    /// A class used as a static function target.
    Class(SmolStr),
    /// A class used as the type of an enum argument.
    Enum(SmolStr),
}

impl ReferenceTarget {
    /// Build a target from a symbol kind and name.
    ///
    /// `qualifier` is the item name for metadata and the class name for
    /// static property functions; other kinds ignore it.
    pub fn new(
        kind: SymbolKind,
        name: &str,
        qualifier: Option<&str>,
    ) -> Result<Self, CollectorError> {
        let qualifier = || {
            qualifier
                .filter(|q| !q.is_empty())
                .map(SmolStr::new)
                .ok_or(CollectorError::EmptyName { kind })
        };
        let name = SmolStr::new(name);
        let target = match kind {
            SymbolKind::Property => Self::Property(name),
            SymbolKind::Item => Self::Item(name),
            SymbolKind::Metadata => Self::Metadata {
                item: qualifier()?,
                metadata: name,
            },
            SymbolKind::Task => Self::Task(name),
            SymbolKind::Target => Self::Target(name),
            SymbolKind::PropertyFunction => Self::PropertyFunction {
                value_kind: ScalarKind::Unknown,
                name,
            },
            SymbolKind::StaticPropertyFunction => Self::StaticPropertyFunction {
                class: qualifier()?,
                name,
            },
            SymbolKind::ItemFunction => Self::ItemFunction(name),
            SymbolKind::Class => Self::Class(name),
            SymbolKind::Enum => Self::Enum(name),
            SymbolKind::TaskParameter | SymbolKind::Keyword | SymbolKind::Sdk => {
                return Err(CollectorError::Unsupported { kind });
            }
        };
        target.validate()?;
        Ok(target)
    }

    pub fn kind(&self) -> SymbolKind {
        match self {
            Self::Property(_) => SymbolKind::Property,
            Self::Item(_) => SymbolKind::Item,
            Self::Metadata { .. } => SymbolKind::Metadata,
            Self::Task(_) => SymbolKind::Task,
            Self::Target(_) | Self::TargetDefinition(_) => SymbolKind::Target,
            Self::PropertyFunction { .. } => SymbolKind::PropertyFunction,
            Self::StaticPropertyFunction { .. } => SymbolKind::StaticPropertyFunction,
            Self::ItemFunction(_) => SymbolKind::ItemFunction,
            Self::Class(_) => SymbolKind::Class,
            Self::Enum(_) => SymbolKind::Enum,
        }
    }

    /// The name being searched for.
    pub fn name(&self) -> &str {
        match self {
            Self::Property(name)
            | Self::Item(name)
            | Self::Task(name)
            | Self::Target(name)
            | Self::TargetDefinition(name)
            | Self::ItemFunction(name)
            | Self::Class(name)
            | Self::Enum(name)
            | Self::Metadata { metadata: name, .. }
            | Self::PropertyFunction { name, .. }
            | Self::StaticPropertyFunction { name, .. } => name,
        }
    }

    fn validate(&self) -> Result<(), CollectorError> {
        let qualifier = match self {
            Self::Metadata { item, .. } => Some(item),
            Self::StaticPropertyFunction { class, .. } => Some(class),
            _ => None,
        };
        if self.name().is_empty() || qualifier.is_some_and(|q| q.is_empty()) {
            return Err(CollectorError::EmptyName { kind: self.kind() });
        }
        Ok(())
    }
}

/// Resolves the value kind a property function call returns.
pub trait FunctionTypeProvider {
    /// The kind of value `invocation` is called on.
    fn resolve_type(&self, invocation: &ExprNode) -> ScalarKind;
}

/// A provider that knows nothing; every call resolves to `Unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnknownFunctionTypes;

impl FunctionTypeProvider for UnknownFunctionTypes {
    fn resolve_type(&self, _invocation: &ExprNode) -> ScalarKind {
        ScalarKind::Unknown
    }
}

/// Functions and their property-style equivalents are the same symbol:
/// `get_Now()` and `Now`.
fn strip_get_prefix(name: &str) -> &str {
    match name.strip_prefix("get_") {
        Some(rest) if !rest.is_empty() => rest,
        _ => name,
    }
}

/// Unresolved function types compare as strings.
fn normalize_kind(kind: ScalarKind) -> ScalarKind {
    match kind {
        ScalarKind::Unknown => ScalarKind::String,
        kind => kind,
    }
}

/// Collects the references to one symbol.
pub struct ReferenceCollector<'p> {
    target: ReferenceTarget,
    function_types: &'p dyn FunctionTypeProvider,
}

impl ReferenceCollector<'static> {
    pub fn new(target: ReferenceTarget) -> Result<Self, CollectorError> {
        Self::with_function_types(target, &UnknownFunctionTypes)
    }
}

impl<'p> ReferenceCollector<'p> {
    pub fn with_function_types(
        target: ReferenceTarget,
        function_types: &'p dyn FunctionTypeProvider,
    ) -> Result<Self, CollectorError> {
        target.validate()?;
        Ok(Self {
            target,
            function_types,
        })
    }

    pub fn target(&self) -> &ReferenceTarget {
        &self.target
    }

    /// All references in `document`, in document order.
    pub fn collect(&self, document: &Document) -> Vec<Reference> {
        let mut out = Vec::new();
        self.visit_element(document.root(), None, None, &mut out);
        tracing::trace!(
            target = self.target.name(),
            count = out.len(),
            "collected references"
        );
        out
    }

    fn is_match(&self, name: &str) -> bool {
        names_equal(name, self.target.name())
    }

    // ========================================================================
    // Document walk
    // ========================================================================

    fn visit_element<'d>(
        &self,
        element: &'d Element,
        parent: Option<&'d Element>,
        enclosing_item: Option<&'d str>,
        out: &mut Vec<Reference>,
    ) {
        let Some(resolved) = element.resolved else {
            return;
        };
        let item = match resolved.syntax_kind {
            SyntaxKind::Item | SyntaxKind::ItemDefinition => Some(element.name.as_str()),
            _ => enclosing_item,
        };

        self.check_element(element, parent, resolved.syntax_kind, out);
        for attribute in &element.attributes {
            let Some(resolved) = attribute.resolved else {
                continue;
            };
            self.check_attribute(element, attribute, resolved, out);
            self.check_value(
                element,
                &attribute.value,
                attribute.value_range.start(),
                resolved.value_kind,
                item,
                out,
            );
        }
        if let (Some(value), Some(kind)) = (&element.value, resolved.value_kind) {
            self.check_value(element, &value.text, value.range.start(), kind, item, out);
        }
        for child in &element.children {
            self.visit_element(child, Some(element), item, out);
        }
    }

    /// Declarations and writes carried by the element itself.
    fn check_element(
        &self,
        element: &Element,
        parent: Option<&Element>,
        kind: SyntaxKind,
        out: &mut Vec<Reference>,
    ) {
        let name_matches = self.is_match(&element.name);
        match (&self.target, kind) {
            (ReferenceTarget::Property(_), SyntaxKind::Property)
            | (ReferenceTarget::Item(_), SyntaxKind::Item | SyntaxKind::ItemDefinition)
                if name_matches =>
            {
                out.push(Reference::new(element.name_range, ReferenceUsage::Write));
            }
            (ReferenceTarget::Metadata { item, .. }, SyntaxKind::Metadata)
                if name_matches && parent.is_some_and(|p| names_equal(&p.name, item)) =>
            {
                out.push(Reference::new(element.name_range, ReferenceUsage::Write));
            }
            (ReferenceTarget::Task(_), SyntaxKind::Task) if name_matches => {
                out.push(Reference::new(element.name_range, ReferenceUsage::Read));
            }
            (ReferenceTarget::Task(_), SyntaxKind::UsingTask) => {
                let Some(attribute) = element.attribute("TaskName") else {
                    return;
                };
                // Only the unqualified suffix of `Namespace.TaskName` is the task.
                let start = attribute.value.rfind('.').map_or(0, |i| i + 1);
                let name = &attribute.value[start..];
                if !name.is_empty() && self.is_match(name) {
                    let offset = attribute.value_range.start() + text_size(start);
                    out.push(Reference::new(
                        TextRange::at(offset, TextSize::of(name)),
                        ReferenceUsage::Declaration,
                    ));
                }
            }
            (ReferenceTarget::TargetDefinition(_), SyntaxKind::Target) => {
                if let Some(attribute) = element.attribute("Name") {
                    if self.is_match(&attribute.value) {
                        out.push(Reference::new(attribute.range, ReferenceUsage::Declaration));
                    }
                }
            }
            _ => {}
        }
    }

    /// Writes carried by the attribute itself, not its value's expression.
    fn check_attribute(
        &self,
        element: &Element,
        attribute: &Attribute,
        resolved: ResolvedAttribute,
        out: &mut Vec<Reference>,
    ) {
        let names = |scalar| resolved.value_kind == ValueKind::new(scalar).literal();
        let is_write = match &self.target {
            ReferenceTarget::Property(_) => {
                names(ScalarKind::PropertyName) && self.is_match(&attribute.value)
            }
            ReferenceTarget::Item(_) => {
                names(ScalarKind::ItemName) && self.is_match(&attribute.value)
            }
            ReferenceTarget::Metadata { item, .. } => {
                resolved.syntax_kind == SyntaxKind::Metadata
                    && self.is_match(&attribute.name)
                    && names_equal(&element.name, item)
            }
            _ => false,
        };
        if is_write {
            out.push(Reference::new(attribute.name_range, ReferenceUsage::Write));
        }
    }

    // ========================================================================
    // Values
    // ========================================================================

    fn check_value(
        &self,
        element: &Element,
        text: &str,
        offset: TextSize,
        kind: ValueKind,
        item: Option<&str>,
        out: &mut Vec<Reference>,
    ) {
        if text.trim().is_empty() {
            return;
        }
        let node = parse_expression(text, kind.expression_options(), offset);
        if node.has_errors() {
            tracing::debug!(
                element = %element.name,
                ?offset,
                "skipping malformed parts of value"
            );
        }

        match &self.target {
            ReferenceTarget::Target(name) => {
                if kind.scalar != ScalarKind::TargetName {
                    return;
                }
                let usage = if kind.allows_expressions() {
                    ReferenceUsage::Read
                } else {
                    ReferenceUsage::Declaration
                };
                for entry in node.list_items() {
                    if let ExprKind::Text { value, .. } = &entry.kind {
                        if names_equal(value.trim(), name) {
                            out.push(Reference::new(entry.range, usage));
                        }
                    }
                }
            }
            // `<Foo Include="@(Bar)" RemoveMetadata="Baz" />` names metadata of `Bar`.
            ReferenceTarget::Metadata { item, metadata } if kind.scalar == ScalarKind::MetadataName => {
                if !includes_item(element, item) {
                    return;
                }
                for entry in node.list_items() {
                    if let ExprKind::Text { value, pure: true } = &entry.kind {
                        if names_equal(value.trim(), metadata) {
                            out.push(Reference::new(entry.range, ReferenceUsage::Read));
                        }
                    }
                }
            }
            _ => visit_nodes(&node, None, None, &mut |node, parent, transformed| {
                if let Some(range) = self.match_node(node, parent, transformed.or(item)) {
                    out.push(Reference::new(range, ReferenceUsage::Read));
                }
            }),
        }
    }

    /// The range of the part of `node` that reads the target, if any.
    fn match_node(
        &self,
        node: &ExprNode,
        parent: Option<&ExprNode>,
        enclosing_item: Option<&str>,
    ) -> Option<TextRange> {
        match (&self.target, &node.kind) {
            (ReferenceTarget::Property(_), ExprKind::PropertyName(name))
            | (ReferenceTarget::Item(_), ExprKind::ItemName(name))
                if self.is_match(name) =>
            {
                Some(node.range)
            }
            (
                ReferenceTarget::Item(_),
                ExprKind::Metadata {
                    item: Some(item), ..
                },
            ) if self.is_match(&item.name) => Some(item.range),
            (ReferenceTarget::Metadata { item, .. }, ExprKind::Metadata {
                item: qualifier,
                metadata,
            }) => {
                let owner = qualifier.as_ref().map(|q| q.name.as_str()).or(enclosing_item)?;
                (names_equal(owner, item) && self.is_match(&metadata.name)).then_some(metadata.range)
            }
            (
                ReferenceTarget::PropertyFunction { value_kind, name },
                ExprKind::FunctionInvocation {
                    kind: FunctionKind::Property,
                    name: function,
                    ..
                },
            ) => {
                let matches = names_equal(strip_get_prefix(&function.name), strip_get_prefix(name))
                    && normalize_kind(self.function_types.resolve_type(node))
                        == normalize_kind(*value_kind);
                matches.then_some(function.range)
            }
            (
                ReferenceTarget::StaticPropertyFunction { class, name },
                ExprKind::FunctionInvocation {
                    kind: FunctionKind::Property,
                    target,
                    name: function,
                    ..
                },
            ) => {
                let on_class = matches!(&target.kind, ExprKind::ClassRef(c) if names_equal(c, class));
                (on_class
                    && names_equal(strip_get_prefix(&function.name), strip_get_prefix(name)))
                .then_some(function.range)
            }
            (
                ReferenceTarget::ItemFunction(_),
                ExprKind::FunctionInvocation {
                    kind: FunctionKind::Item,
                    name: function,
                    ..
                },
            ) if self.is_match(&function.name) => Some(function.range),
            (ReferenceTarget::Class(_), ExprKind::ClassRef(name))
                if self.is_match(name)
                    && parent.is_some_and(|p| {
                        matches!(p.kind, ExprKind::FunctionInvocation { .. })
                    }) =>
            {
                Some(node.range)
            }
            (ReferenceTarget::Enum(_), ExprKind::ClassRef(name))
                if self.is_match(name)
                    && parent.is_some_and(|p| matches!(p.kind, ExprKind::EnumValue { .. })) =>
            {
                Some(node.range)
            }
            _ => None,
        }
    }
}

/// Pre-order walk skipping error subtrees. The callback also receives the
/// item name of the nearest enclosing `@(...)`, which owns unqualified
/// metadata inside its transforms.
fn visit_nodes<'a>(
    node: &'a ExprNode,
    parent: Option<&'a ExprNode>,
    item: Option<&'a str>,
    f: &mut impl FnMut(&'a ExprNode, Option<&'a ExprNode>, Option<&'a str>),
) {
    if matches!(node.kind, ExprKind::Error(_)) {
        return;
    }
    f(node, parent, item);
    let item = match node.kind {
        ExprKind::Item(_) => node.item_name().or(item),
        _ => item,
    };
    for child in node.children() {
        visit_nodes(child, Some(node), item, f);
    }
}

/// Check whether the element's `Include` references item type `item`.
fn includes_item(element: &Element, item: &str) -> bool {
    let Some(include) = element.attribute("Include") else {
        return false;
    };
    if include.value.trim().is_empty() {
        return false;
    }
    let expr = parse_expression(
        &include.value,
        ExpressionOptions::ITEMS_METADATA_AND_LISTS,
        include.value_range.start(),
    );
    expr.descendants()
        .iter()
        .any(|n| matches!(&n.kind, ExprKind::ItemName(name) if names_equal(name, item)))
}

/// Collect the references to `target` in `document`.
pub fn find_references(
    document: &Document,
    target: ReferenceTarget,
) -> Result<Vec<Reference>, CollectorError> {
    Ok(ReferenceCollector::new(target)?.collect(document))
}
