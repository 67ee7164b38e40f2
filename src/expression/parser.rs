//! Recursive descent parser for value expressions.
//!
//! Works directly on the source characters: the expression grammar is
//! whitespace- and quote-sensitive enough that a separate token pass buys
//! nothing. Offsets are byte offsets, shifted by the caller's base offset.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::ast::{
    ExprKind, ExprNode, ExpressionError, ExpressionErrorKind, FunctionKind, Ident, ListKind,
};
use super::options::ExpressionOptions;
use crate::base::text_size;
use crate::base::text_utils::{is_class_name_char, is_name_start, name_run_len, whitespace_run_len};

/// Parse expression text into a tree rooted at a [`ExprKind::List`].
///
/// Parsing never fails as a whole: a malformed reference becomes an
/// [`ExprKind::Error`] node scoped to its list item and parsing resumes at the
/// next list separator.
pub fn parse_expression(text: &str, options: ExpressionOptions, base: TextSize) -> ExprNode {
    Parser::new(text, options, base).parse_list()
}

/// A failure inside a reference, before it is turned into an error node.
struct Failure {
    kind: ExpressionErrorKind,
    offset: usize,
    partial: Option<ExprNode>,
}

type ParseResult = Result<ExprNode, Failure>;

/// The parser state
struct Parser<'a> {
    text: &'a str,
    pos: usize,
    base: TextSize,
    options: ExpressionOptions,
}

fn is_quote(c: char) -> bool {
    matches!(c, '\'' | '"' | '`')
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, options: ExpressionOptions, base: TextSize) -> Self {
        Self {
            text,
            pos: 0,
            base,
            options,
        }
    }

    // =========================================================================
    // Character inspection
    // =========================================================================

    fn rest(&self) -> &'a str {
        let text = self.text;
        &text[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn at_eof(&self) -> bool {
        self.pos >= self.text.len()
    }

    // =========================================================================
    // Character consumption
    // =========================================================================

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn eat_str(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.pos += s.len();
            true
        } else {
            false
        }
    }

    fn skip_ws(&mut self) {
        self.pos += whitespace_run_len(self.rest());
    }

    fn read_name(&mut self) -> Option<Ident> {
        let len = name_run_len(self.rest());
        if len == 0 {
            return None;
        }
        let start = self.pos;
        self.pos += len;
        let text = self.text;
        Some(Ident::new(&text[start..self.pos], self.range(start, self.pos)))
    }

    // =========================================================================
    // Node building helpers
    // =========================================================================

    fn abs(&self, pos: usize) -> TextSize {
        self.base + text_size(pos)
    }

    fn range(&self, start: usize, end: usize) -> TextRange {
        TextRange::new(self.abs(start), self.abs(end))
    }

    fn node(&self, start: usize, kind: ExprKind) -> ExprNode {
        ExprNode::new(self.range(start, self.pos), kind)
    }

    /// Node spanning from an already-built node's start to the current position.
    fn extend(&self, from: TextSize, kind: ExprKind) -> ExprNode {
        ExprNode::new(TextRange::new(from, self.abs(self.pos)), kind)
    }

    fn fail(&self, kind: ExpressionErrorKind, partial: Option<ExprNode>) -> Failure {
        Failure {
            kind,
            offset: self.pos,
            partial,
        }
    }

    fn fail_here(&self, partial: Option<ExprNode>) -> Failure {
        let kind = if self.at_eof() {
            ExpressionErrorKind::UnexpectedEnd
        } else {
            ExpressionErrorKind::UnexpectedCharacter
        };
        self.fail(kind, partial)
    }

    fn error_node(&self, start: usize, failure: Failure) -> ExprNode {
        tracing::trace!(
            code = failure.kind.as_str(),
            offset = failure.offset,
            "expression parse failure"
        );
        let end = failure.offset.max(start);
        ExprNode::new(
            self.range(start, end),
            ExprKind::Error(Box::new(ExpressionError {
                kind: failure.kind,
                offset: self.abs(failure.offset),
                at_end: failure.offset >= self.text.len(),
                partial: failure.partial,
            })),
        )
    }

    // =========================================================================
    // Lists
    // =========================================================================

    fn is_separator(&self, c: char, current: ListKind) -> bool {
        match c {
            ';' => self.options.lists && current != ListKind::Comma,
            ',' => self.options.comma_lists && current != ListKind::Semicolon,
            _ => false,
        }
    }

    /// List = Item (Separator Item)*
    fn parse_list(&mut self) -> ExprNode {
        let start = self.pos;
        let mut items = Vec::new();
        let mut separator = ListKind::None;
        loop {
            items.push(self.parse_list_item(separator));
            match self.peek() {
                Some(c) if self.is_separator(c, separator) => {
                    separator = ListKind::from_separator(c).unwrap_or(separator);
                    self.bump();
                }
                _ => break,
            }
        }
        self.node(start, ExprKind::List { items, separator })
    }

    /// Item = (Text | Reference)*
    fn parse_list_item(&mut self, separator: ListKind) -> ExprNode {
        let start = self.pos;
        let mut parts = Vec::new();
        let mut text_start = None;

        while let Some(c) = self.peek() {
            if self.is_separator(c, separator) {
                break;
            }
            if let Some(sigil) = self.reference_sigil() {
                self.flush_text(&mut parts, &mut text_start);
                let reference_start = self.pos;
                match self.parse_reference(sigil) {
                    Ok(node) => parts.push(node),
                    Err(failure) => {
                        parts.push(self.error_node(reference_start, failure));
                        self.recover(separator);
                    }
                }
                continue;
            }
            text_start.get_or_insert(self.pos);
            self.bump();
        }
        self.flush_text(&mut parts, &mut text_start);

        if parts.len() > 1 {
            return self.node(start, ExprKind::Concat(parts));
        }
        match parts.pop() {
            Some(mut node) => {
                if let ExprKind::Text { pure, .. } = &mut node.kind {
                    *pure = true;
                }
                node
            }
            None => self.node(
                start,
                ExprKind::Text {
                    value: String::new(),
                    pure: true,
                },
            ),
        }
    }

    fn flush_text(&self, parts: &mut Vec<ExprNode>, text_start: &mut Option<usize>) {
        if let Some(start) = text_start.take() {
            let text = self.text;
            parts.push(self.node(
                start,
                ExprKind::Text {
                    value: text[start..self.pos].to_string(),
                    pure: false,
                },
            ));
        }
    }

    /// Skip the rest of a malformed list item.
    fn recover(&mut self, separator: ListKind) {
        while let Some(c) = self.peek() {
            if self.is_separator(c, separator) {
                break;
            }
            self.bump();
        }
    }

    // =========================================================================
    // References
    // =========================================================================

    fn reference_sigil(&self) -> Option<char> {
        if self.options.plain_text {
            return None;
        }
        let mut chars = self.rest().chars();
        match (chars.next(), chars.next()) {
            (Some(c @ ('$' | '@' | '%')), Some('(')) => Some(c),
            _ => None,
        }
    }

    fn parse_reference(&mut self, sigil: char) -> ParseResult {
        match sigil {
            '$' => self.parse_property(),
            '@' if self.options.items => self.parse_item(),
            '%' if self.options.metadata => self.parse_metadata(),
            '@' => {
                self.pos += 2;
                Err(self.fail(ExpressionErrorKind::ItemsDisallowed, None))
            }
            _ => {
                self.pos += 2;
                Err(self.fail(ExpressionErrorKind::MetadataDisallowed, None))
            }
        }
    }

    /// Property = '$(' (Name | StaticFunction) Chain ')'
    fn parse_property(&mut self) -> ParseResult {
        let start = self.pos;
        self.pos += 2;

        let body = if self.peek() == Some('[') {
            self.parse_static_function()?
        } else {
            let Some(name) = self.read_name() else {
                return Err(self.fail(ExpressionErrorKind::ExpectedPropertyName, None));
            };
            ExprNode::new(name.range, ExprKind::PropertyName(name.name))
        };

        let body = self.parse_property_chain(body)?;
        self.skip_ws();
        if !self.eat(')') {
            let kind = if self.at_eof() {
                ExpressionErrorKind::ExpectedRightParen
            } else {
                ExpressionErrorKind::UnexpectedCharacter
            };
            return Err(self.fail(kind, Some(body)));
        }
        Ok(self.node(start, ExprKind::Property(Box::new(body))))
    }

    /// StaticFunction = '[' ClassName ']' '::' Name Arguments?
    fn parse_static_function(&mut self) -> ParseResult {
        let start = self.pos;
        self.bump();

        let class_start = self.pos;
        if !self.peek().is_some_and(is_name_start) {
            return Err(self.fail(ExpressionErrorKind::ExpectedClassName, None));
        }
        let rest = self.rest();
        self.pos += rest
            .find(|c: char| !is_class_name_char(c))
            .unwrap_or(rest.len());
        let text = self.text;
        let class = self.node(
            class_start,
            ExprKind::ClassRef(SmolStr::new(&text[class_start..self.pos])),
        );

        if !self.eat(']') {
            return Err(self.fail(ExpressionErrorKind::ExpectedRightBracket, Some(class)));
        }
        if !self.eat_str("::") {
            return Err(self.fail(ExpressionErrorKind::ExpectedColonColon, Some(class)));
        }
        let Some(name) = self.read_name() else {
            return Err(self.fail(ExpressionErrorKind::ExpectedFunctionName, Some(class)));
        };
        let args = self.parse_optional_arguments()?;
        Ok(self.node(
            start,
            ExprKind::FunctionInvocation {
                kind: FunctionKind::Property,
                target: Box::new(class),
                name,
                args,
            },
        ))
    }

    /// Chain = ('.' Name Arguments? | '[' Argument ']')*
    fn parse_property_chain(&mut self, mut node: ExprNode) -> ParseResult {
        loop {
            let save = self.pos;
            self.skip_ws();
            match self.peek() {
                Some('.') => {
                    self.bump();
                    self.skip_ws();
                    let Some(name) = self.read_name() else {
                        return Err(self.fail(ExpressionErrorKind::ExpectedFunctionName, Some(node)));
                    };
                    let args = self.parse_optional_arguments()?;
                    let from = node.offset();
                    node = self.extend(
                        from,
                        ExprKind::FunctionInvocation {
                            kind: FunctionKind::Property,
                            target: Box::new(node),
                            name,
                            args,
                        },
                    );
                }
                Some('[') => {
                    self.bump();
                    self.skip_ws();
                    let index = self.parse_argument()?;
                    self.skip_ws();
                    if !self.eat(']') {
                        return Err(self.fail(ExpressionErrorKind::ExpectedRightBracket, Some(index)));
                    }
                    let from = node.offset();
                    node = self.extend(
                        from,
                        ExprKind::Indexer {
                            target: Box::new(node),
                            index: Box::new(index),
                        },
                    );
                }
                _ => {
                    self.pos = save;
                    return Ok(node);
                }
            }
        }
    }

    /// Item = '@(' Name ('->' (Quoted | Name Arguments?))* (',' Quoted)? ')'
    fn parse_item(&mut self) -> ParseResult {
        let start = self.pos;
        self.pos += 2;

        let Some(name) = self.read_name() else {
            return Err(self.fail(ExpressionErrorKind::ExpectedItemName, None));
        };
        let mut node = ExprNode::new(name.range, ExprKind::ItemName(name.name));

        loop {
            self.skip_ws();
            if self.eat_str("->") {
                self.skip_ws();
                let from = node.offset();
                node = match self.peek() {
                    Some(q) if is_quote(q) => {
                        let transform = self.parse_quoted(q)?;
                        self.extend(
                            from,
                            ExprKind::ItemTransform {
                                target: Box::new(node),
                                transform: Some(Box::new(transform)),
                                separator: None,
                            },
                        )
                    }
                    Some(c) if is_name_start(c) => {
                        let Some(name) = self.read_name() else {
                            return Err(self.fail_here(Some(node)));
                        };
                        let args = self.parse_optional_arguments()?;
                        self.extend(
                            from,
                            ExprKind::FunctionInvocation {
                                kind: FunctionKind::Item,
                                target: Box::new(node),
                                name,
                                args,
                            },
                        )
                    }
                    None => {
                        return Err(self.fail(ExpressionErrorKind::ExpectedFunctionName, Some(node)));
                    }
                    Some(_) => {
                        return Err(self.fail(ExpressionErrorKind::UnexpectedCharacter, Some(node)));
                    }
                };
                continue;
            }

            if self.eat(',') {
                self.skip_ws();
                let Some(q) = self.peek().filter(|c| is_quote(*c)) else {
                    return Err(self.fail_here(Some(node)));
                };
                let separator = Box::new(self.parse_quoted(q)?);
                let node_range = node.range;
                let from = node.offset();
                node = match node.kind {
                    ExprKind::ItemTransform {
                        target,
                        transform,
                        separator: None,
                    } => self.extend(
                        from,
                        ExprKind::ItemTransform {
                            target,
                            transform,
                            separator: Some(separator),
                        },
                    ),
                    kind => self.extend(
                        from,
                        ExprKind::ItemTransform {
                            target: Box::new(ExprNode::new(node_range, kind)),
                            transform: None,
                            separator: Some(separator),
                        },
                    ),
                };
                continue;
            }

            if self.eat(')') {
                return Ok(self.node(start, ExprKind::Item(Box::new(node))));
            }
            let kind = if self.at_eof() {
                ExpressionErrorKind::ExpectedRightParen
            } else {
                ExpressionErrorKind::UnexpectedCharacter
            };
            return Err(self.fail(kind, Some(node)));
        }
    }

    /// Metadata = '%(' (Name '.')? Name ')'
    ///
    /// Whitespace is accepted around both names and the dot.
    fn parse_metadata(&mut self) -> ParseResult {
        let start = self.pos;
        self.pos += 2;
        self.skip_ws();

        let Some(first) = self.read_name() else {
            return Err(self.fail(ExpressionErrorKind::ExpectedMetadataName, None));
        };
        self.skip_ws();
        let (item, metadata) = if self.eat('.') {
            self.skip_ws();
            let Some(second) = self.read_name() else {
                return Err(self.fail(ExpressionErrorKind::ExpectedMetadataName, None));
            };
            self.skip_ws();
            (Some(first), second)
        } else {
            (None, first)
        };

        if !self.eat(')') {
            let kind = if self.at_eof() {
                ExpressionErrorKind::ExpectedRightParen
            } else {
                ExpressionErrorKind::UnexpectedCharacter
            };
            return Err(self.fail(kind, None));
        }
        Ok(self.node(start, ExprKind::Metadata { item, metadata }))
    }

    // =========================================================================
    // Function arguments
    // =========================================================================

    fn parse_optional_arguments(&mut self) -> Result<Option<Box<ExprNode>>, Failure> {
        if self.peek() == Some('(') {
            Ok(Some(Box::new(self.parse_arguments()?)))
        } else {
            Ok(None)
        }
    }

    /// Arguments = '(' (Argument (',' Argument)*)? ')'
    fn parse_arguments(&mut self) -> ParseResult {
        let start = self.pos;
        self.bump();
        let mut args = Vec::new();

        self.skip_ws();
        if self.eat(')') {
            return Ok(self.node(start, ExprKind::ArgumentList(args)));
        }
        loop {
            self.skip_ws();
            args.push(self.parse_argument()?);
            self.skip_ws();
            if self.eat(',') {
                continue;
            }
            if self.eat(')') {
                return Ok(self.node(start, ExprKind::ArgumentList(args)));
            }
            let kind = if self.at_eof() {
                ExpressionErrorKind::UnterminatedArguments
            } else {
                ExpressionErrorKind::UnexpectedCharacter
            };
            let partial = self.node(start, ExprKind::ArgumentList(args));
            return Err(self.fail(kind, Some(partial)));
        }
    }

    fn parse_argument(&mut self) -> ParseResult {
        let opens_reference = self.peek_nth(1) == Some('(');
        match self.peek() {
            Some(q) if is_quote(q) => self.parse_quoted(q),
            Some('$') if opens_reference => self.parse_property(),
            Some('@') if opens_reference && self.options.items => self.parse_item(),
            Some('%') if opens_reference && self.options.metadata => self.parse_metadata(),
            Some(c) if c == '-' || c.is_ascii_digit() => self.parse_number(),
            Some(c) if is_name_start(c) => Ok(self.parse_bare_word()),
            Some(_) => Err(self.fail(ExpressionErrorKind::UnexpectedCharacter, None)),
            None => Err(self.fail(ExpressionErrorKind::UnexpectedEnd, None)),
        }
    }

    /// A quoted argument; its content is a nested expression without lists.
    fn parse_quoted(&mut self, quote: char) -> ParseResult {
        let start = self.pos;
        self.bump();
        let inner_start = self.pos;
        let close = self.rest().find(quote);
        let inner_end = close.map_or(self.text.len(), |len| inner_start + len);

        let text = self.text;
        let mut inner_parser = Parser::new(
            &text[inner_start..inner_end],
            self.options.without_lists(),
            self.abs(inner_start),
        );
        let inner = inner_parser.parse_list_item(ListKind::None);

        self.pos = inner_end;
        if close.is_none() {
            return Err(self.fail(ExpressionErrorKind::UnterminatedQuote, Some(inner)));
        }
        self.bump();
        Ok(self.node(
            start,
            ExprKind::Quoted {
                quote,
                inner: Box::new(inner),
            },
        ))
    }

    fn parse_number(&mut self) -> ParseResult {
        let start = self.pos;
        self.eat('-');
        let rest = self.rest();
        let digits = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if digits == 0 {
            return Err(self.fail(ExpressionErrorKind::UnexpectedCharacter, None));
        }
        self.pos += digits;

        let text = self.text;
        let literal = &text[start..self.pos];
        let kind = if let Ok(value) = literal.parse::<i64>() {
            ExprKind::Int(value)
        } else if let Ok(value) = literal.parse::<f64>() {
            ExprKind::Float(value)
        } else {
            return Err(self.fail(ExpressionErrorKind::UnexpectedCharacter, None));
        };
        Ok(self.node(start, kind))
    }

    /// An unquoted word: `true`/`false`, an enum value `Type.Member`, or text.
    fn parse_bare_word(&mut self) -> ExprNode {
        let start = self.pos;
        let rest = self.rest();
        self.pos += rest
            .find(|c: char| !is_class_name_char(c))
            .unwrap_or(rest.len());

        let text = self.text;
        let word = &text[start..self.pos];
        if word.eq_ignore_ascii_case("true") || word.eq_ignore_ascii_case("false") {
            return self.node(start, ExprKind::Bool(word.eq_ignore_ascii_case("true")));
        }
        match word.rfind('.') {
            Some(dot) if dot > 0 && dot + 1 < word.len() => {
                let class = ExprNode::new(
                    self.range(start, start + dot),
                    ExprKind::ClassRef(SmolStr::new(&word[..dot])),
                );
                let member = Ident::new(&word[dot + 1..], self.range(start + dot + 1, self.pos));
                self.node(
                    start,
                    ExprKind::EnumValue {
                        class: Box::new(class),
                        member,
                    },
                )
            }
            _ => self.node(
                start,
                ExprKind::Text {
                    value: word.to_string(),
                    pure: true,
                },
            ),
        }
    }
}
