//! Logos-based tokenizer for condition text.

use std::collections::VecDeque;

use logos::Logos;
use text_size::{TextRange, TextSize};

use super::error::TokenizeError;
use crate::base::text_size;

/// Condition token kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// A quoted string, a bare word, or the body of a `$(...)` reference.
    String,
    Number,
    /// `$`
    Property,
    /// `@`
    Item,
    /// `%`
    Metadata,
    Dot,
    /// `->`
    Transform,
    Comma,
    LeftParen,
    RightParen,
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    And,
    Or,
    Not,
    /// A character the grammar has no use for; rejected by the parser.
    Unknown,
    Eof,
}

impl TokenKind {
    /// Check whether this is one of the six comparison operators.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            Self::Equal
                | Self::NotEqual
                | Self::Less
                | Self::LessOrEqual
                | Self::Greater
                | Self::GreaterOrEqual
        )
    }

    pub fn is_reference_sigil(self) -> bool {
        matches!(self, Self::Property | Self::Item | Self::Metadata)
    }
}

/// A token with its kind, source text and absolute position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw source text, including quotes for quoted strings.
    pub text: &'a str,
    pub offset: TextSize,
    /// Set for `'...'` strings.
    pub quoted: bool,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, text: &'a str, offset: TextSize) -> Self {
        Self {
            kind,
            text,
            offset,
            quoted: false,
        }
    }

    pub fn range(&self) -> TextRange {
        TextRange::at(self.offset, text_size(self.text.len()))
    }

    pub fn end(&self) -> TextSize {
        self.range().end()
    }

    /// The token's value: quoted strings lose their quotes, nothing is unescaped.
    pub fn value(&self) -> &'a str {
        if self.quoted && self.text.len() >= 2 {
            &self.text[1..self.text.len() - 1]
        } else {
            self.text
        }
    }

    /// Offset of [`Self::value`] in the source.
    pub fn value_offset(&self) -> TextSize {
        if self.quoted {
            self.offset + TextSize::from(1)
        } else {
            self.offset
        }
    }
}

/// Lexer wrapping the logos-generated tokenizer.
///
/// A `$(` is scanned to its closing parenthesis and expands into three tokens
/// (`$`, `(`, the body as a `String`); the `)` follows as its own token.
pub struct Lexer<'a> {
    inner: logos::Lexer<'a, LogosToken>,
    base: TextSize,
    pending: VecDeque<Token<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str, base: TextSize) -> Self {
        Self {
            inner: LogosToken::lexer(input),
            base,
            pending: VecDeque::new(),
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, TokenizeError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(token) = self.pending.pop_front() {
            return Some(Ok(token));
        }

        let logos_token = self.inner.next()?;
        let text = self.inner.slice();
        let offset = self.base + text_size(self.inner.span().start);

        let token = match logos_token {
            Ok(LogosToken::PropertyStart) => {
                let one = TextSize::from(1);
                self.pending
                    .push_back(Token::new(TokenKind::LeftParen, &text[1..2], offset + one));
                self.pending
                    .push_back(Token::new(TokenKind::String, &text[2..], offset + one + one));
                Token::new(TokenKind::Property, &text[..1], offset)
            }
            Ok(LogosToken::String) => Token {
                quoted: true,
                ..Token::new(TokenKind::String, text, offset)
            },
            Ok(t) => Token::new(t.into(), text, offset),
            Err(()) if text.starts_with("$(") => {
                return Some(Err(TokenizeError::UnterminatedReference { offset }));
            }
            Err(()) if text.starts_with('\'') => {
                return Some(Err(TokenizeError::UnterminatedString { offset }));
            }
            Err(()) => Token::new(TokenKind::Unknown, text, offset),
        };
        Some(Ok(token))
    }
}

/// Tokenize condition text, appending an `Eof` token.
pub fn tokenize(input: &str, base: TextSize) -> Result<Vec<Token<'_>>, TokenizeError> {
    let mut tokens = Lexer::new(input, base).collect::<Result<Vec<_>, _>>()?;
    tokens.push(Token::new(
        TokenKind::Eof,
        "",
        base + text_size(input.len()),
    ));
    Ok(tokens)
}

/// Scan a `$(` body up to its matching `)`, counting parentheses only.
///
/// Quotes are not tracked, so `$(x.Replace(')', ''))` closes early; the
/// legacy evaluator behaves the same way.
fn scan_property_body(lex: &mut logos::Lexer<LogosToken>) -> bool {
    let mut depth = 1usize;
    for (i, c) in lex.remainder().char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    lex.bump(i);
                    return true;
                }
            }
            _ => {}
        }
    }
    false
}

/// Logos token enum - maps to TokenKind
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum LogosToken {
    // =========================================================================
    // KEYWORDS
    // =========================================================================
    #[token("and", ignore(case))]
    And,

    #[token("or", ignore(case))]
    Or,

    #[token("not", ignore(case))]
    #[token("!")]
    Not,

    // =========================================================================
    // LITERALS
    // =========================================================================
    #[regex(r"'[^']*'")]
    String,

    #[regex(r"-?[0-9][0-9.]*")]
    Number,

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*")]
    Ident,

    // =========================================================================
    // REFERENCES
    // =========================================================================
    #[token("$(", scan_property_body)]
    PropertyStart,

    #[token("$")]
    Property,

    #[token("@")]
    Item,

    #[token("%")]
    Metadata,

    // =========================================================================
    // OPERATORS
    // =========================================================================
    #[token("==")]
    Equal,

    #[token("!=")]
    NotEqual,

    #[token("<=")]
    LessOrEqual,

    #[token(">=")]
    GreaterOrEqual,

    #[token("<")]
    Less,

    #[token(">")]
    Greater,

    #[token("->")]
    Transform,

    // =========================================================================
    // PUNCTUATION
    // =========================================================================
    #[token("(")]
    LeftParen,

    #[token(")")]
    RightParen,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,
}

impl From<LogosToken> for TokenKind {
    fn from(token: LogosToken) -> Self {
        match token {
            LogosToken::And => TokenKind::And,
            LogosToken::Or => TokenKind::Or,
            LogosToken::Not => TokenKind::Not,
            LogosToken::String | LogosToken::Ident => TokenKind::String,
            LogosToken::Number => TokenKind::Number,
            // Only reached through the `$(` expansion in `Lexer::next`.
            LogosToken::PropertyStart | LogosToken::Property => TokenKind::Property,
            LogosToken::Item => TokenKind::Item,
            LogosToken::Metadata => TokenKind::Metadata,
            LogosToken::Equal => TokenKind::Equal,
            LogosToken::NotEqual => TokenKind::NotEqual,
            LogosToken::LessOrEqual => TokenKind::LessOrEqual,
            LogosToken::GreaterOrEqual => TokenKind::GreaterOrEqual,
            LogosToken::Less => TokenKind::Less,
            LogosToken::Greater => TokenKind::Greater,
            LogosToken::Transform => TokenKind::Transform,
            LogosToken::LeftParen => TokenKind::LeftParen,
            LogosToken::RightParen => TokenKind::RightParen,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::Dot => TokenKind::Dot,
        }
    }
}
