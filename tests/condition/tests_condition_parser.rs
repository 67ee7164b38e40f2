//! Condition grammar tests.

use rstest::rstest;

use msbuild::TextSize;
use msbuild::condition::{
    ConditionExpr, LiteralKind, ParseError, TokenizeError, parse_condition,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// Render a tree as a compact s-expression.
fn render(expr: &ConditionExpr) -> String {
    match expr {
        ConditionExpr::Or(l, r) => format!("or({},{})", render(l), render(r)),
        ConditionExpr::And(l, r) => format!("and({},{})", render(l), render(r)),
        ConditionExpr::Not(operand) => format!("not({})", render(operand)),
        ConditionExpr::Relational { left, right, op } => {
            format!("({} {} {})", render(left), op.as_str(), render(right))
        }
        ConditionExpr::Factor(literal) => match literal.kind {
            LiteralKind::Quoted => format!("'{}'", literal.value),
            LiteralKind::Bare | LiteralKind::Number => literal.value.clone(),
        },
        ConditionExpr::Reference { reference, .. } => reference.render(),
        ConditionExpr::Function { name, args, .. } => {
            let args: Vec<_> = args.iter().map(render).collect();
            format!("{name}({})", args.join(","))
        }
    }
}

fn parse(text: &str) -> String {
    let expr = parse_condition(text, TextSize::new(0))
        .unwrap_or_else(|e| panic!("failed to parse {text:?}: {e}"));
    render(&expr)
}

// =============================================================================
// GRAMMAR
// =============================================================================

#[rstest]
#[case("a or b and c", "and(or(a,b),c)")]
#[case("a and b or c", "and(a,or(b,c))")]
#[case("a AND b Or c", "and(a,or(b,c))")]
#[case("a or b or c", "or(or(a,b),c)")]
#[case("(a and b) or c", "or(and(a,b),c)")]
#[case("!a", "not(a)")]
#[case("not (a or b)", "not(or(a,b))")]
#[case("'$(A)' == 'x'", "('$(A)' == 'x')")]
#[case("$(A) != ''", "($(A) != '')")]
#[case("$(V) >= 4.5", "($(V) >= 4.5)")]
#[case("-1 < 0", "(-1 < 0)")]
#[case("Exists('a.txt')", "Exists('a.txt')")]
#[case("HasTrailingSlash('$(Dir)') and true", "and(HasTrailingSlash('$(Dir)'),true)")]
#[case("@(Compile) == ''", "(@(Compile) == '')")]
#[case("@(I->'%(F)', ';') != ''", "(@(I->'%(F)', ';') != '')")]
#[case("%(I.M) == 1", "(%(I.M) == 1)")]
#[case("%(M) == 1", "(%(M) == 1)")]
fn test_condition_grammar(#[case] text: &str, #[case] expected: &str) {
    assert_eq!(parse(text), expected);
}

#[test]
fn test_property_body_scan_counts_quoted_parens() {
    // The `$(` scan counts every parenthesis, quoted or not.
    assert!(matches!(
        parse_condition("$(A.Replace(')', 'x')) == ''", TextSize::new(0)),
        Err(ParseError::UnexpectedToken { ref token, .. }) if token == ")"
    ));
    assert!(matches!(
        parse_condition("$(A.Replace('(', 'x')) == ''", TextSize::new(0)),
        Err(ParseError::Tokenize(TokenizeError::UnterminatedReference { .. }))
    ));
    assert_eq!(
        parse("$(A.Replace('a', 'b')) == ''"),
        "($(A.Replace('a', 'b')) == '')"
    );
}

#[test]
fn test_offsets_include_base() {
    let expr = parse_condition("'a' == b", TextSize::new(100)).unwrap();
    let range = expr.range();
    assert_eq!(range.start(), TextSize::new(100));
    assert_eq!(range.end(), TextSize::new(108));
}

// =============================================================================
// ERRORS
// =============================================================================

#[rstest]
#[case("'a' ==")]
#[case("(a")]
#[case("a b")]
#[case("a and")]
#[case("== a")]
#[case("Exists('a'")]
fn test_condition_parse_errors(#[case] text: &str) {
    assert!(parse_condition(text, TextSize::new(0)).is_err(), "{text:?}");
}

#[test]
fn test_unterminated_string() {
    assert!(matches!(
        parse_condition("'abc", TextSize::new(0)),
        Err(ParseError::Tokenize(TokenizeError::UnterminatedString { .. }))
    ));
}

#[test]
fn test_unterminated_reference() {
    assert!(matches!(
        parse_condition("$(abc == 1", TextSize::new(0)),
        Err(ParseError::Tokenize(TokenizeError::UnterminatedReference { .. }))
    ));
}

#[test]
fn test_error_offset() {
    let err = parse_condition("a b", TextSize::new(10)).unwrap_err();
    assert_eq!(err.offset(), TextSize::new(12));
}
