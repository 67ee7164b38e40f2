//! Value expression parser tests.

use rstest::rstest;

use msbuild::TextSize;
use msbuild::expression::{
    ExprKind, ExprNode, ExpressionErrorKind, ExpressionOptions, FunctionKind, ListKind,
    parse_expression,
};

// =============================================================================
// Helper Functions
// =============================================================================

fn parse(text: &str) -> ExprNode {
    parse_expression(text, ExpressionOptions::ITEMS_METADATA_AND_LISTS, TextSize::new(0))
}

fn only_item(text: &str) -> ExprNode {
    let root = parse(text);
    assert_eq!(root.list_items().len(), 1, "{text:?}");
    root.list_items()[0].clone()
}

fn error_kind(node: &ExprNode) -> Option<ExpressionErrorKind> {
    match &node.kind {
        ExprKind::Error(error) => Some(error.kind),
        _ => None,
    }
}

// =============================================================================
// LISTS
// =============================================================================

#[rstest]
#[case("a;b;c", 3)]
#[case(";;", 3)]
#[case("$(A);@(B->'%(C)');x", 3)]
#[case("a;$(B.C('x;y'));d", 3)]
#[case("@(I, ';');z", 2)]
#[case("one", 1)]
fn test_item_spans_cover_source(#[case] text: &str, #[case] count: usize) {
    let root = parse(text);
    let items = root.list_items();
    assert_eq!(items.len(), count, "{text:?}");

    let pieces: Vec<&str> = items.iter().map(|item| &text[item.range]).collect();
    assert_eq!(pieces.join(";"), text);
    assert_eq!(&text[root.range], text);
}

#[test]
fn test_item_spans_follow_base() {
    let text = "a;$(B)";
    let root = parse_expression(text, ExpressionOptions::ITEMS_METADATA_AND_LISTS, TextSize::new(40));
    let starts: Vec<u32> = root
        .list_items()
        .iter()
        .map(|item| u32::from(item.range.start()))
        .collect();
    assert_eq!(starts, vec![40, 42]);
}

#[rstest]
#[case(ExpressionOptions::ITEMS_METADATA_AND_LISTS, "a;b", ListKind::Semicolon, 2)]
#[case(ExpressionOptions::ITEMS_METADATA_AND_LISTS, "a,b", ListKind::None, 1)]
#[case(ExpressionOptions::COMMA_LISTS, "a, b", ListKind::Comma, 2)]
#[case(ExpressionOptions::COMMA_LISTS, "a;b", ListKind::None, 1)]
#[case(ExpressionOptions::LISTS.with_comma_lists(), "a;b,c", ListKind::Semicolon, 2)]
#[case(ExpressionOptions::NONE, "a;b", ListKind::None, 1)]
fn test_list_kinds(
    #[case] options: ExpressionOptions,
    #[case] text: &str,
    #[case] kind: ListKind,
    #[case] count: usize,
) {
    let root = parse_expression(text, options, TextSize::new(0));
    assert_eq!(root.list_kind(), kind, "{text:?}");
    assert_eq!(root.list_items().len(), count, "{text:?}");
}

#[test]
fn test_comma_items_keep_whitespace() {
    let root = parse_expression("a, b", ExpressionOptions::COMMA_LISTS, TextSize::new(0));
    let items: Vec<_> = root.list_items().iter().filter_map(ExprNode::as_text).collect();
    assert_eq!(items, vec!["a", " b"]);
}

// =============================================================================
// TEXT AND REFERENCES
// =============================================================================

#[rstest]
#[case("plain", true)]
#[case("", true)]
#[case("a$(B)", false)]
fn test_text_purity(#[case] text: &str, #[case] pure_first: bool) {
    let item = only_item(text);
    let first = match &item.kind {
        ExprKind::Concat(parts) => parts[0].clone(),
        _ => item.clone(),
    };
    let ExprKind::Text { pure, .. } = first.kind else {
        panic!("expected text in {text:?}, got {:?}", first.kind);
    };
    assert_eq!(pure, pure_first);
}

#[test]
fn test_concat_parts_in_order() {
    let item = only_item("bin\\$(Configuration)\\@(Out)");
    let ExprKind::Concat(parts) = &item.kind else {
        panic!("expected concat, got {:?}", item.kind);
    };
    let shapes: Vec<&str> = parts
        .iter()
        .map(|part| match part.kind {
            ExprKind::Text { .. } => "text",
            ExprKind::Property(_) => "property",
            ExprKind::Item(_) => "item",
            _ => "other",
        })
        .collect();
    assert_eq!(shapes, vec!["text", "property", "text", "item"]);
}

#[test]
fn test_property_names_skips_function_chains() {
    let item = only_item("$(A.Replace($(B), '$(C)'))");
    assert_eq!(item.property_names(), vec!["B", "C"]);
    let item = only_item("$(A[0])$(D)");
    assert_eq!(item.property_names(), vec!["D"]);
}

#[test]
fn test_unqualified_metadata() {
    let item = only_item("%(Filename)");
    let ExprKind::Metadata { item: qualifier, metadata } = &item.kind else {
        panic!("expected metadata, got {:?}", item.kind);
    };
    assert!(qualifier.is_none());
    assert_eq!(metadata.name, "Filename");
}

#[test]
fn test_item_function_with_arguments() {
    let item = only_item("@(Compile->WithMetadataValue('Link', 'x'))");
    assert_eq!(item.item_name(), Some("Compile"));
    let ExprKind::Item(body) = &item.kind else {
        panic!("expected item");
    };
    let ExprKind::FunctionInvocation { kind, name, args, .. } = &body.kind else {
        panic!("expected invocation, got {:?}", body.kind);
    };
    assert_eq!(*kind, FunctionKind::Item);
    assert_eq!(name.name, "WithMetadataValue");
    assert_eq!(args.as_ref().map(|a| a.children().len()), Some(2));
}

#[rstest]
#[case("$(A.Substring(1))", ExprKind::Int(1))]
#[case("$(A.Substring(-2))", ExprKind::Int(-2))]
#[case("$(A.Equals(1.5))", ExprKind::Float(1.5))]
#[case("$(A.Equals(true))", ExprKind::Bool(true))]
#[case("$(A.Equals(False))", ExprKind::Bool(false))]
#[case("$(A.Equals(word))", ExprKind::Text { value: "word".into(), pure: true })]
fn test_bare_arguments(#[case] text: &str, #[case] expected: ExprKind) {
    let item = only_item(text);
    let ExprKind::Property(body) = &item.kind else {
        panic!("expected property, got {:?}", item.kind);
    };
    let ExprKind::FunctionInvocation { args: Some(args), .. } = &body.kind else {
        panic!("expected invocation with arguments, got {:?}", body.kind);
    };
    let ExprKind::ArgumentList(args) = &args.kind else {
        panic!("expected argument list");
    };
    assert_eq!(args[0].kind, expected);
}

#[test]
fn test_enum_argument_splits_member() {
    let text = "$(A.Equals(System.StringComparison.Ordinal))";
    let item = only_item(text);
    let value = item
        .descendants()
        .into_iter()
        .find(|n| matches!(n.kind, ExprKind::EnumValue { .. }))
        .cloned();
    let Some(ExprNode {
        kind: ExprKind::EnumValue { class, member },
        ..
    }) = value
    else {
        panic!("expected enum value in {text:?}");
    };
    assert_eq!(class.kind, ExprKind::ClassRef("System.StringComparison".into()));
    assert_eq!(&text[member.range], "Ordinal");
}

#[test]
fn test_quoted_argument_is_nested_expression() {
    let item = only_item("$(A.Trim('$(B);x'))");
    let quoted = item
        .descendants()
        .into_iter()
        .find(|n| matches!(n.kind, ExprKind::Quoted { .. }))
        .cloned();
    let Some(ExprNode {
        kind: ExprKind::Quoted { quote, inner },
        ..
    }) = quoted
    else {
        panic!("expected quoted argument");
    };
    assert_eq!(quote, '\'');
    // No list splitting inside quotes.
    assert!(matches!(inner.kind, ExprKind::Concat(ref parts) if parts.len() == 2));
}

// =============================================================================
// ERRORS
// =============================================================================

#[rstest]
#[case("$(", ExpressionErrorKind::ExpectedPropertyName)]
#[case("$(Foo", ExpressionErrorKind::ExpectedRightParen)]
#[case("$(Foo bar)", ExpressionErrorKind::UnexpectedCharacter)]
#[case("@(", ExpressionErrorKind::ExpectedItemName)]
#[case("@(Foo->", ExpressionErrorKind::ExpectedFunctionName)]
#[case("%(", ExpressionErrorKind::ExpectedMetadataName)]
#[case("%(a.", ExpressionErrorKind::ExpectedMetadataName)]
#[case("$([", ExpressionErrorKind::ExpectedClassName)]
#[case("$([Foo", ExpressionErrorKind::ExpectedRightBracket)]
#[case("$([Foo]::", ExpressionErrorKind::ExpectedFunctionName)]
#[case("$(Foo[0)", ExpressionErrorKind::ExpectedRightBracket)]
#[case("$(Foo.Bar(", ExpressionErrorKind::UnexpectedEnd)]
#[case("$(Foo.Bar('a'", ExpressionErrorKind::UnterminatedArguments)]
#[case("$(Foo.Bar('a)", ExpressionErrorKind::UnterminatedQuote)]
fn test_error_kinds(#[case] text: &str, #[case] expected: ExpressionErrorKind) {
    let item = only_item(text);
    assert_eq!(error_kind(&item), Some(expected), "{text:?}");
    assert!(item.has_errors());
}

#[rstest]
#[case(ExpressionOptions::LISTS, "@(Foo);x", ExpressionErrorKind::ItemsDisallowed)]
#[case(ExpressionOptions::ITEMS.with_lists(), "%(Foo);x", ExpressionErrorKind::MetadataDisallowed)]
fn test_disallowed_references(
    #[case] options: ExpressionOptions,
    #[case] text: &str,
    #[case] expected: ExpressionErrorKind,
) {
    let root = parse_expression(text, options, TextSize::new(0));
    let items = root.list_items();
    assert_eq!(items.len(), 2);
    assert_eq!(error_kind(&items[0]), Some(expected));
    assert_eq!(items[1].as_text(), Some("x"));
}

#[test]
fn test_recovery_skips_to_next_separator() {
    let root = parse("a$(b c d;e");
    let items = root.list_items();
    assert_eq!(items.len(), 2);
    let ExprKind::Concat(parts) = &items[0].kind else {
        panic!("expected concat, got {:?}", items[0].kind);
    };
    assert_eq!(parts.len(), 2);
    assert!(error_kind(&parts[1]).is_some());
    assert_eq!(items[1].as_text(), Some("e"));
}

#[test]
fn test_plain_text_keeps_sigils() {
    let root = parse_expression("@(x) %(y) $(z)", ExpressionOptions::PLAIN_TEXT, TextSize::new(0));
    assert_eq!(root.list_items()[0].as_text(), Some("@(x) %(y) $(z)"));
    assert!(!root.has_errors());
}
