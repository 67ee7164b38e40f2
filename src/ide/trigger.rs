//! Completion trigger classification.
//!
//! Decides what kind of completion applies at the end of a partially typed
//! expression or condition. The scan is rerun from the start of the text on
//! every call and never fails: text that cannot lead anywhere useful
//! classifies as [`TriggerState::None`].

use smol_str::SmolStr;
use text_size::TextSize;

use crate::base::text_size;
use crate::base::text_utils::{is_class_name_char, is_name_char, is_name_start};
use crate::condition::{TokenKind, tokenize};
use crate::expression::{ExprNode, ExpressionOptions, ListKind, parse_expression};

/// The completion context at the caret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriggerState {
    #[default]
    None,
    /// A literal value or the start of one.
    Value,
    /// `$` typed where a value may start.
    PropertyOrValue,
    /// `@` typed where a value may start.
    ItemOrValue,
    /// `%` typed where a value may start.
    MetadataOrValue,
    /// Inside `$(`.
    PropertyName,
    /// Inside `@(`.
    ItemName,
    /// Inside `%(`: either a metadata name or the item of a qualified one.
    MetadataOrItemName,
    /// After `%(Item.`.
    MetadataName,
    /// After `$(Name.` or `$([Class]::`.
    PropertyFunctionName,
    /// After `@(Name->`.
    ItemFunctionName,
    /// Inside `$([`.
    PropertyFunctionClassName,
    /// An unquoted argument of a function call.
    BareFunctionArgumentValue,
}

impl TriggerState {
    fn is_name(self) -> bool {
        matches!(
            self,
            Self::PropertyName
                | Self::ItemName
                | Self::MetadataOrItemName
                | Self::MetadataName
                | Self::PropertyFunctionName
                | Self::ItemFunctionName
                | Self::PropertyFunctionClassName
        )
    }
}

/// How the classifier was invoked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriggerOptions {
    /// The character just typed, already present at the end of the text.
    /// `None` for an explicit completion request.
    pub typed_char: Option<char>,
    /// The text is a condition rather than a plain expression.
    pub condition: bool,
    /// Absolute offset of the start of the text.
    pub base: TextSize,
}

impl TriggerOptions {
    /// An explicit completion request.
    pub fn explicit() -> Self {
        Self::default()
    }

    /// Completion triggered by typing `c`.
    pub fn typed(c: char) -> Self {
        Self {
            typed_char: Some(c),
            ..Self::default()
        }
    }

    /// Treat the text as a condition rather than a value expression.
    pub fn in_condition(mut self) -> Self {
        self.condition = true;
        self
    }

    /// Set the absolute offset of the start of the text.
    pub fn at(mut self, base: TextSize) -> Self {
        self.base = base;
        self
    }
}

/// The classifier's verdict.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TriggerResult {
    pub state: TriggerState,
    /// Characters already typed of the name or value being completed.
    pub length: usize,
    /// The deepest expression node at the caret, when the state is not `None`.
    pub node: Option<ExprNode>,
    /// Separator of the list the caret is in.
    pub list_kind: ListKind,
    /// Condition mode only: properties compared against the string being typed.
    pub comparands: Vec<SmolStr>,
}

impl TriggerResult {
    fn none() -> Self {
        Self::default()
    }
}

/// Classify the completion context at the end of `text`.
pub fn classify(text: &str, options: TriggerOptions) -> TriggerResult {
    let result = if options.condition {
        classify_condition(text, options)
    } else {
        classify_segment(text, 0, options)
    };
    tracing::trace!(
        state = ?result.state,
        length = result.length,
        comparands = result.comparands.len(),
        "classified trigger"
    );
    result
}

/// Classify the expression `text[start..]`.
fn classify_segment(text: &str, start: usize, options: TriggerOptions) -> TriggerResult {
    let segment = &text[start..];
    let (state, length) = scan(segment);
    let state = match options.typed_char {
        Some(c) if !fires(state, length, c) => TriggerState::None,
        _ => state,
    };
    if state == TriggerState::None {
        return TriggerResult::none();
    }

    let base = options.base + text_size(start);
    let root = parse_expression(
        segment,
        ExpressionOptions::ITEMS_METADATA_AND_LISTS.with_comma_lists(),
        base,
    );
    let end = base + TextSize::of(segment);
    TriggerResult {
        state,
        length,
        node: root.find_at(end).cloned(),
        list_kind: root.list_kind(),
        comparands: Vec::new(),
    }
}

// ============================================================================
// Auto-trigger filter
// ============================================================================

/// Check whether typing `c` should open completion in `state`.
///
/// A typed character fires only when it is what opened the context: trigger
/// punctuation for an empty name, the sigil of an `*OrValue` state, or the
/// first character of a name or value.
fn fires(state: TriggerState, length: usize, c: char) -> bool {
    match state {
        TriggerState::None => false,
        TriggerState::Value | TriggerState::BareFunctionArgumentValue => {
            (length == 0 && matches!(c, ';' | ',' | '\'' | '"' | '`' | '(' | '>'))
                || (length == 1 && is_name_char(c))
        }
        TriggerState::PropertyOrValue => length == 1 && c == '$',
        TriggerState::ItemOrValue => length == 1 && c == '@',
        TriggerState::MetadataOrValue => length == 1 && c == '%',
        state if state.is_name() => {
            (length == 0 && matches!(c, '(' | '.' | '>' | ':' | '['))
                || (length == 1 && is_name_char(c))
        }
        _ => false,
    }
}

// ============================================================================
// Expression scanner
// ============================================================================

/// Why scanning stopped inside a construct.
enum Stop {
    /// The text ended here; this is the context.
    Trigger(TriggerState, usize),
    /// The text cannot be completed from here.
    Invalid,
}

type Step = Result<(), Stop>;

fn trigger(state: TriggerState, length: usize) -> Step {
    Err(Stop::Trigger(state, length))
}

/// Where a run of literal value text sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ValueContext {
    /// Top level, split by `;` and `,`.
    List,
    /// Inside a quoted argument or transform, closed by the quote.
    Quoted(char),
    /// An unquoted function argument, ended by `,` or `)`.
    BareArgument,
}

fn scan(text: &str) -> (TriggerState, usize) {
    let mut scanner = Scanner {
        chars: text.chars().collect(),
        pos: 0,
    };
    match scanner.value(ValueContext::List) {
        Err(Stop::Trigger(state, length)) => (state, length),
        Err(Stop::Invalid) | Ok(()) => (TriggerState::None, 0),
    }
}

struct Scanner {
    chars: Vec<char>,
    pos: usize,
}

impl Scanner {
    // ========================================================================
    // Character inspection
    // ========================================================================

    fn current(&self) -> Option<char> {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> Option<char> {
        self.chars.get(self.pos + n).copied()
    }

    fn bump(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, c: char) -> bool {
        if self.current() == Some(c) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consume a run of name characters, returning its length.
    fn name_run(&mut self, class: bool) -> usize {
        let start = self.pos;
        while self
            .current()
            .is_some_and(|c| if class { is_class_name_char(c) } else { is_name_char(c) })
        {
            self.bump();
        }
        self.pos - start
    }

    /// Consume a name in a `state` context; the text ending inside it is a trigger.
    fn name(&mut self, state: TriggerState) -> Step {
        match self.current() {
            None => trigger(state, 0),
            Some(c) if is_name_start(c) => {
                let length = self.name_run(false);
                if self.current().is_none() {
                    return trigger(state, length);
                }
                Ok(())
            }
            Some(_) => Err(Stop::Invalid),
        }
    }

    // ========================================================================
    // Values
    // ========================================================================

    fn value(&mut self, context: ValueContext) -> Step {
        let mut run = 0;
        // A reference closed in the current run; nothing to complete after it.
        let mut after_reference = false;
        loop {
            let Some(c) = self.current() else {
                if after_reference {
                    return Err(Stop::Invalid);
                }
                let state = match context {
                    ValueContext::BareArgument => TriggerState::BareFunctionArgumentValue,
                    _ => TriggerState::Value,
                };
                return trigger(state, run);
            };
            match (c, context) {
                ('$' | '@' | '%', _) => {
                    self.bump();
                    match self.current() {
                        None => return trigger(sigil_state(c), 1),
                        Some('(') => {
                            self.bump();
                            self.reference(c)?;
                            run = 0;
                            after_reference = true;
                        }
                        Some(_) => run += 1,
                    }
                }
                (c, ValueContext::Quoted(quote)) if c == quote => {
                    self.bump();
                    return Ok(());
                }
                (',' | ')', ValueContext::BareArgument) => return Ok(()),
                (';' | ',', ValueContext::List) => {
                    self.bump();
                    run = 0;
                    after_reference = false;
                }
                (c, _) if c.is_whitespace() => {
                    self.bump();
                    run = 0;
                    after_reference = false;
                }
                _ => {
                    self.bump();
                    run += 1;
                }
            }
        }
    }

    fn reference(&mut self, sigil: char) -> Step {
        match sigil {
            '$' => self.property(),
            '@' => self.item(),
            _ => self.metadata(),
        }
    }

    // ========================================================================
    // References
    // ========================================================================

    /// After `$(`.
    fn property(&mut self) -> Step {
        if self.eat('[') {
            self.static_function()?;
        } else {
            self.name(TriggerState::PropertyName)?;
        }
        self.property_chain()
    }

    /// `.Member`, `.Method(args)` and `[index]` links, up to the closing `)`.
    fn property_chain(&mut self) -> Step {
        loop {
            self.skip_whitespace();
            match self.current() {
                Some(')') => {
                    self.bump();
                    return Ok(());
                }
                Some('.') => {
                    self.bump();
                    self.skip_whitespace();
                    self.name(TriggerState::PropertyFunctionName)?;
                    if self.eat('(') {
                        self.arguments()?;
                    }
                }
                Some('[') => {
                    self.bump();
                    self.indexer()?;
                }
                _ => return Err(Stop::Invalid),
            }
        }
    }

    /// After `$([`: `Class]::Name(args)`. `::` must follow `]` directly.
    fn static_function(&mut self) -> Step {
        let length = self.name_run(true);
        match self.current() {
            None => return trigger(TriggerState::PropertyFunctionClassName, length),
            Some(']') => self.bump(),
            Some(_) => return Err(Stop::Invalid),
        }
        if !(self.eat(':') && self.eat(':')) {
            return Err(Stop::Invalid);
        }
        self.name(TriggerState::PropertyFunctionName)?;
        if self.eat('(') {
            self.arguments()?;
        }
        Ok(())
    }

    /// After `[`, up to and including `]`.
    fn indexer(&mut self) -> Step {
        while let Some(c) = self.current() {
            self.bump();
            if c == ']' {
                return Ok(());
            }
        }
        Err(Stop::Invalid)
    }

    /// After `(`, up to and including `)`.
    fn arguments(&mut self) -> Step {
        let mut needs_separator = false;
        loop {
            self.skip_whitespace();
            match self.current() {
                None if needs_separator => return Err(Stop::Invalid),
                None => return trigger(TriggerState::BareFunctionArgumentValue, 0),
                Some(')') => {
                    self.bump();
                    return Ok(());
                }
                Some(',') => {
                    self.bump();
                    needs_separator = false;
                }
                Some(_) if needs_separator => return Err(Stop::Invalid),
                Some(q @ ('\'' | '"' | '`')) => {
                    self.bump();
                    self.value(ValueContext::Quoted(q))?;
                    needs_separator = true;
                }
                Some(_) => self.value(ValueContext::BareArgument)?,
            }
        }
    }

    /// After `@(`.
    fn item(&mut self) -> Step {
        self.name(TriggerState::ItemName)?;
        loop {
            self.skip_whitespace();
            match self.current() {
                Some(')') => {
                    self.bump();
                    return Ok(());
                }
                Some('-') => {
                    self.bump();
                    if !self.eat('>') {
                        return Err(Stop::Invalid);
                    }
                    self.skip_whitespace();
                    match self.current() {
                        Some(q @ ('\'' | '"' | '`')) => {
                            self.bump();
                            self.value(ValueContext::Quoted(q))?;
                        }
                        _ => {
                            self.name(TriggerState::ItemFunctionName)?;
                            if self.eat('(') {
                                self.arguments()?;
                            }
                        }
                    }
                }
                Some(',') => {
                    self.bump();
                    self.skip_whitespace();
                    match self.current() {
                        Some(q @ ('\'' | '"' | '`')) => {
                            self.bump();
                            self.value(ValueContext::Quoted(q))?;
                        }
                        _ => return Err(Stop::Invalid),
                    }
                }
                _ => return Err(Stop::Invalid),
            }
        }
    }

    /// After `%(`. Whitespace is allowed around the name and the `.`.
    fn metadata(&mut self) -> Step {
        self.skip_whitespace();
        self.name(TriggerState::MetadataOrItemName)?;
        self.skip_whitespace();
        if self.eat('.') {
            self.skip_whitespace();
            self.name(TriggerState::MetadataName)?;
            self.skip_whitespace();
        }
        if self.eat(')') {
            Ok(())
        } else {
            Err(Stop::Invalid)
        }
    }
}

fn sigil_state(sigil: char) -> TriggerState {
    match sigil {
        '$' => TriggerState::PropertyOrValue,
        '@' => TriggerState::ItemOrValue,
        _ => TriggerState::MetadataOrValue,
    }
}

// ============================================================================
// Conditions
// ============================================================================

fn classify_condition(text: &str, options: TriggerOptions) -> TriggerResult {
    let mut open_quote = None;
    for (i, c) in text.char_indices() {
        if c == '\'' {
            open_quote = match open_quote {
                Some(_) => None,
                None => Some(i),
            };
        }
    }

    if let Some(quote) = open_quote {
        let mut result = classify_segment(text, quote + 1, options);
        if result.state != TriggerState::None {
            result.comparands = comparands(&text[..quote], options.base);
        }
        return result;
    }
    if text.ends_with('\'') {
        return TriggerResult::none();
    }
    classify_segment(text, condition_segment_start(text), options)
}

/// Byte offset where the operand at the end of an unquoted condition starts.
fn condition_segment_start(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'$' | b'@' | b'%' if bytes.get(i + 1) == Some(&b'(') => {
                start = i;
                i = skip_parenthesized(bytes, i + 1);
            }
            b'\'' => {
                i = bytes[i + 1..]
                    .iter()
                    .position(|&b| b == b'\'')
                    .map_or(bytes.len(), |p| i + p + 2);
                start = i;
            }
            b' ' | b'\t' | b'\r' | b'\n' | b'=' | b'!' | b'<' | b'>' | b'(' | b')' | b',' => {
                i += 1;
                start = i;
            }
            _ => i += 1,
        }
    }
    start
}

/// Index just past the `)` matching the `(` at `open`, or the end of input.
fn skip_parenthesized(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return i + 1;
                }
            }
            _ => {}
        }
    }
    bytes.len()
}

/// Property names in the left operand of a comparison that `prefix` ends with.
fn comparands(prefix: &str, base: TextSize) -> Vec<SmolStr> {
    let Ok(tokens) = tokenize(prefix, base) else {
        return Vec::new();
    };
    let tokens: Vec<_> = tokens
        .into_iter()
        .filter(|t| t.kind != TokenKind::Eof)
        .collect();
    let Some((op, operand)) = tokens.split_last() else {
        return Vec::new();
    };
    if !op.kind.is_relational() {
        return Vec::new();
    }

    let mut depth = 0usize;
    let mut start = operand.len();
    for (i, token) in operand.iter().enumerate().rev() {
        match token.kind {
            TokenKind::RightParen => depth += 1,
            TokenKind::LeftParen if depth == 0 => break,
            TokenKind::LeftParen => depth -= 1,
            TokenKind::And | TokenKind::Or | TokenKind::Not if depth == 0 => break,
            _ => {}
        }
        start = i;
    }
    let operand = &operand[start..];

    let mut names = Vec::new();
    for (i, token) in operand.iter().enumerate() {
        let source = match token.kind {
            TokenKind::String if token.quoted => token.value().to_string(),
            TokenKind::Property => match operand.get(i + 2) {
                Some(body) if body.kind == TokenKind::String => format!("$({})", body.text),
                _ => continue,
            },
            _ => continue,
        };
        let expr = parse_expression(&source, ExpressionOptions::NONE, TextSize::new(0));
        names.extend(expr.property_names().into_iter().map(SmolStr::new));
    }
    names
}
