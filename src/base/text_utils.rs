//! Character classification for names and literal runs.

/// Check if a character may start a property, item, metadata or function name.
///
/// Uses Unicode Standard Annex #31 start rules, plus `_`.
#[inline]
pub fn is_name_start(c: char) -> bool {
    c == '_' || unicode_ident::is_xid_start(c)
}

/// Check if a character may continue a name.
///
/// `-` is not a name character: `@(a->b)` relies on it to start a transform.
#[inline]
pub fn is_name_char(c: char) -> bool {
    unicode_ident::is_xid_continue(c)
}

/// Check if a character may appear in a static function class name
/// (`System.IO.Path`).
#[inline]
pub fn is_class_name_char(c: char) -> bool {
    c == '.' || is_name_char(c)
}

/// Byte length of the leading run of name characters in `text`.
pub fn name_run_len(text: &str) -> usize {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if is_name_start(c) => {}
        _ => return 0,
    }
    chars
        .find(|(_, c)| !is_name_char(*c))
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

/// Byte length of the leading whitespace run in `text`.
pub fn whitespace_run_len(text: &str) -> usize {
    text.len() - text.trim_start().len()
}

/// Compare two names the way MSBuild does: ordinal, ignoring ASCII case.
#[inline]
pub fn names_equal(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}
