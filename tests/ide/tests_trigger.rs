//! Completion trigger classification tests.

use rstest::rstest;
use smol_str::SmolStr;

use crate::helpers::trigger_helpers::{TriggerCase, assert_cases, run, same};
use msbuild::expression::ListKind;
use msbuild::ide::{TriggerOptions, TriggerState, classify};

use TriggerState::{
    BareFunctionArgumentValue, ItemFunctionName, ItemName, ItemOrValue, MetadataName,
    MetadataOrItemName, MetadataOrValue, PropertyFunctionClassName, PropertyFunctionName,
    PropertyName, PropertyOrValue, Value,
};

// =============================================================================
// CASE TABLES
// =============================================================================

const BARE: &[TriggerCase] = &[
    ("", None, Value, 0),
    ("abc", None, Value, 3),
    (" ", None, Value, 0),
    ("  xyz", None, Value, 3),
    ("", Some('a'), Value, 1),
    ("", Some('/'), TriggerState::None, 0),
    ("a", Some('x'), TriggerState::None, 0),
    ("$", Some('x'), TriggerState::None, 0),
];

const PROPERTY: &[TriggerCase] = &[
    ("", Some('$'), PropertyOrValue, 1),
    ("$", None, PropertyOrValue, 1),
    ("$", Some('('), PropertyName, 0),
    ("$(", Some('a'), PropertyName, 1),
    ("$(", None, PropertyName, 0),
    ("$(abc", None, PropertyName, 3),
    ("$(abcefgh", None, PropertyName, 7),
    ("$(a-", None, TriggerState::None, 0),
    ("$(a", Some('b'), TriggerState::None, 0),
    ("$(abc", Some('$'), TriggerState::None, 0),
];

const ITEM: &[TriggerCase] = &[
    ("", Some('@'), ItemOrValue, 1),
    ("@", None, ItemOrValue, 1),
    ("@", Some('('), ItemName, 0),
    ("@(", Some('a'), ItemName, 1),
    ("@(", None, ItemName, 0),
    ("@(abc", None, ItemName, 3),
    ("@(abcefgh", None, ItemName, 7),
    ("@(a-", None, TriggerState::None, 0),
    ("@(a", Some('b'), TriggerState::None, 0),
    ("@(abc", Some('$'), TriggerState::None, 0),
];

const METADATA: &[TriggerCase] = &[
    ("", Some('%'), MetadataOrValue, 1),
    ("%", None, MetadataOrValue, 1),
    ("%", Some('('), MetadataOrItemName, 0),
    ("%(", Some('a'), MetadataOrItemName, 1),
    ("%(  ", Some('a'), MetadataOrItemName, 1),
    ("%(", None, MetadataOrItemName, 0),
    ("%(   ", None, MetadataOrItemName, 0),
    ("%(abc", None, MetadataOrItemName, 3),
    ("%(abcefgh", None, MetadataOrItemName, 7),
    ("%(  abc", None, MetadataOrItemName, 3),
    ("%(a-", None, TriggerState::None, 0),
    ("%(a", Some('b'), TriggerState::None, 0),
    ("%(abc", Some('$'), TriggerState::None, 0),
];

const QUALIFIED_METADATA: &[TriggerCase] = &[
    ("%(foo.", None, MetadataName, 0),
    ("%(  foo.", None, MetadataName, 0),
    ("%(foo .", None, MetadataName, 0),
    ("%(foo.ab", None, MetadataName, 2),
    ("%(foo.abcde", None, MetadataName, 5),
    ("%(foo  .abcd", None, MetadataName, 4),
    ("%(foo  .  abc", None, MetadataName, 3),
    ("%(foo", Some('.'), MetadataName, 0),
    ("%(foo ", Some('.'), MetadataName, 0),
    ("%(foo.", Some('a'), MetadataName, 1),
    ("%(foo  .  ", Some('a'), MetadataName, 1),
    ("%(a.b-", None, TriggerState::None, 0),
    ("%(a  .b-", None, TriggerState::None, 0),
    ("%(ab .cd", Some('e'), TriggerState::None, 0),
    ("%(a.b", Some('c'), TriggerState::None, 0),
    ("%(a.bc", Some('$'), TriggerState::None, 0),
];

const PROPERTY_FUNCTION: &[TriggerCase] = &[
    ("$(foo.", None, PropertyFunctionName, 0),
    ("$(foo .", None, PropertyFunctionName, 0),
    ("$(foo.ab", None, PropertyFunctionName, 2),
    ("$(foo.abcde", None, PropertyFunctionName, 5),
    ("$(foo  .abcd", None, PropertyFunctionName, 4),
    ("$(foo", Some('.'), PropertyFunctionName, 0),
    ("$(foo ", Some('.'), PropertyFunctionName, 0),
    ("$(foo.", Some('a'), PropertyFunctionName, 1),
    ("$(foo  .", Some('a'), PropertyFunctionName, 1),
    ("$(a.b-", None, TriggerState::None, 0),
    ("$(a  .b-", None, TriggerState::None, 0),
    ("$(ab .cd", Some('e'), TriggerState::None, 0),
    ("$(a.b", Some('c'), TriggerState::None, 0),
    ("$(a.bc", Some('$'), TriggerState::None, 0),
    ("$(a[0].", None, PropertyFunctionName, 0),
    ("$(a[0].bcd", None, PropertyFunctionName, 3),
    ("$(a[0]", Some('.'), PropertyFunctionName, 0),
    ("$(a[0].", Some('b'), PropertyFunctionName, 1),
];

const ITEM_FUNCTION: &[TriggerCase] = &[
    ("@(foo->", None, ItemFunctionName, 0),
    ("@(foo ->", None, ItemFunctionName, 0),
    ("@(foo->ab", None, ItemFunctionName, 2),
    ("@(foo->abcde", None, ItemFunctionName, 5),
    ("@(foo  ->abcd", None, ItemFunctionName, 4),
    ("@(foo-", Some('>'), ItemFunctionName, 0),
    ("@(foo -", Some('>'), ItemFunctionName, 0),
    ("@(foo->", Some('a'), ItemFunctionName, 1),
    ("@(foo  ->", Some('a'), ItemFunctionName, 1),
    ("@(a->b/", None, TriggerState::None, 0),
    ("@(ab ->cd", Some('e'), TriggerState::None, 0),
    ("@(a->b", Some('c'), TriggerState::None, 0),
    ("@(a->bc", Some('$'), TriggerState::None, 0),
];

const STATIC_FUNCTION: &[TriggerCase] = &[
    ("$([Foo]::", None, PropertyFunctionName, 0),
    ("$([Foo]  ::", None, TriggerState::None, 0),
    ("$([Foo]::ab", None, PropertyFunctionName, 2),
    ("$([Foo]::abcde", None, PropertyFunctionName, 5),
    ("$([Foo]:", Some(':'), PropertyFunctionName, 0),
    ("$([Foo] :", Some(':'), TriggerState::None, 0),
    ("$([Foo]::", Some('a'), PropertyFunctionName, 1),
    ("$([Foo]  ::", Some('a'), TriggerState::None, 0),
    ("$([Foo]::b-", None, TriggerState::None, 0),
    ("$([Foo]  ::b-", None, TriggerState::None, 0),
    ("$([Foo] ::cd", Some('e'), TriggerState::None, 0),
    ("$([Foo]::b", Some('c'), TriggerState::None, 0),
    ("$([Foo]   :: cd", Some('$'), TriggerState::None, 0),
];

const CLASS_NAME: &[TriggerCase] = &[
    ("$(", Some('['), PropertyFunctionClassName, 0),
    ("$([", Some('a'), PropertyFunctionClassName, 1),
    ("$([", None, PropertyFunctionClassName, 0),
    ("$([abc", None, PropertyFunctionClassName, 3),
    ("$([abcefgh", None, PropertyFunctionClassName, 7),
    ("$([a-", None, TriggerState::None, 0),
    ("$([a", Some('b'), TriggerState::None, 0),
    ("$([abc", Some('$'), TriggerState::None, 0),
];

const LISTS: &[TriggerCase] = &[
    ("foo", Some(';'), Value, 0),
    ("foo;", None, Value, 0),
    ("foo", Some(','), Value, 0),
    ("foo,", None, Value, 0),
];

// =============================================================================
// EXPRESSION CONTEXTS
// =============================================================================

#[rstest]
#[case::bare(BARE)]
#[case::property(PROPERTY)]
#[case::item(ITEM)]
#[case::metadata(METADATA)]
#[case::qualified_metadata(QUALIFIED_METADATA)]
#[case::property_function(PROPERTY_FUNCTION)]
#[case::item_function(ITEM_FUNCTION)]
#[case::static_function(STATIC_FUNCTION)]
#[case::class_name(CLASS_NAME)]
#[case::lists(LISTS)]
fn test_trigger_cases(#[case] cases: &[TriggerCase]) {
    assert_cases("", cases, same);
}

#[rstest]
#[case::semicolon("foo;")]
#[case::comma("foo,")]
fn test_trigger_after_list_separator(#[case] prefix: &str) {
    assert_cases(prefix, BARE, same);
    assert_cases(prefix, PROPERTY, same);
}

#[rstest]
#[case::bare(BARE)]
#[case::property(PROPERTY)]
#[case::metadata(METADATA)]
#[case::qualified_metadata(QUALIFIED_METADATA)]
fn test_trigger_in_quoted_function_argument(#[case] cases: &[TriggerCase]) {
    assert_cases("$(foo.bar('", cases, same);
}

#[test]
fn test_trigger_in_bare_function_argument() {
    let bare = |state| match state {
        Value => BareFunctionArgumentValue,
        state => state,
    };
    assert_cases("$(foo.bar(", BARE, bare);
    assert_cases("$(foo.bar(", PROPERTY, bare);
}

#[rstest]
#[case::bare(BARE)]
#[case::property(PROPERTY)]
fn test_trigger_in_second_function_argument(#[case] cases: &[TriggerCase]) {
    assert_cases("$(foo.bar(1, '", cases, same);
}

#[rstest]
#[case::property(PROPERTY)]
#[case::metadata(METADATA)]
fn test_trigger_in_item_transform(#[case] cases: &[TriggerCase]) {
    assert_cases("@(a->'", cases, same);
}

// =============================================================================
// RESULT DETAILS
// =============================================================================

#[test]
fn test_trigger_reports_list_kind() {
    assert_eq!(
        classify("a,b", TriggerOptions::explicit()).list_kind,
        ListKind::Comma
    );
    assert_eq!(
        classify("a;$(b", TriggerOptions::explicit()).list_kind,
        ListKind::Semicolon
    );
    assert_eq!(
        classify("abc", TriggerOptions::explicit()).list_kind,
        ListKind::None
    );
}

#[test]
fn test_trigger_node_is_absent_for_none() {
    let result = classify("$(a-", TriggerOptions::explicit());
    assert_eq!(result.state, TriggerState::None);
    assert!(result.node.is_none());
}

#[test]
fn test_trigger_node_at_caret() {
    let result = classify("x;abc", TriggerOptions::explicit());
    let node = result.node.unwrap();
    assert_eq!(node.as_text(), Some("abc"));
}

// =============================================================================
// CONDITIONS
// =============================================================================

#[rstest]
#[case("", Value, 0, &[])]
#[case("$(", PropertyName, 0, &[])]
#[case("$(Foo) == '", Value, 0, &["Foo"])]
#[case("$(Foo) == '$(", PropertyName, 0, &["Foo"])]
#[case("$(Foo) == '$(a", PropertyName, 1, &["Foo"])]
#[case("$(Foo) == 'a", Value, 1, &["Foo"])]
#[case("'$(Foo)' == 'a", Value, 1, &["Foo"])]
#[case("'$(Foo)|$(Bar)' == 'a", Value, 1, &["Foo", "Bar"])]
#[case("$(Foo) == 'a'", TriggerState::None, 0, &[])]
#[case("$(Foo) == 'a' And $(Bar) >= '", Value, 0, &["Bar"])]
fn test_condition_trigger(
    #[case] text: &str,
    #[case] state: TriggerState,
    #[case] length: usize,
    #[case] comparands: &[&str],
) {
    let result = classify(text, TriggerOptions::explicit().in_condition());
    assert_eq!((result.state, result.length), (state, length), "{text:?}");
    let expected: Vec<SmolStr> = comparands.iter().map(|c| SmolStr::new(c)).collect();
    assert_eq!(result.comparands, expected, "{text:?}");
}

#[test]
fn test_condition_trigger_typed() {
    let result = run("$(Foo) == '", &("", Some('$'), PropertyOrValue, 1), true);
    assert_eq!((result.state, result.length), (PropertyOrValue, 1));
    assert_eq!(result.comparands, vec![SmolStr::new("Foo")]);
}

#[test]
fn test_condition_operand_after_operator() {
    let result = classify("'a' == 'b' and $(Con", TriggerOptions::explicit().in_condition());
    assert_eq!((result.state, result.length), (PropertyName, 3));
    assert!(result.comparands.is_empty());
}
