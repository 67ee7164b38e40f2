//! Recursive descent parser for conditions
//!
//! Grammar:
//!
//! ```text
//! Expression := And
//! And        := Or ("and" Or)*
//! Or         := Relational ("or" Relational)*
//! Relational := Factor (RelOp Factor)?
//! Factor     := "(" Expression ")" | Name "(" Args ")" | String | Number
//!             | Reference | "not" Factor
//! ```
//!
//! `or` binds tighter than `and`: `a or b and c` is `(a or b) and c`. This
//! matches the evaluator whose behavior project files rely on.

use smol_str::SmolStr;
use text_size::{TextRange, TextSize};

use super::ast::{ConditionExpr, ConditionReference, Literal, LiteralKind, RelationalOp};
use super::error::ParseError;
use super::lexer::{Token, TokenKind, tokenize};

/// Parse condition text into a tree.
///
/// `base` is added to every reported offset.
pub fn parse_condition(text: &str, base: TextSize) -> Result<ConditionExpr, ParseError> {
    let tokens = tokenize(text, base)?;
    let mut parser = Parser::new(&tokens);
    let expr = parser.parse_expression()?;

    let token = parser.current();
    if token.kind != TokenKind::Eof {
        return Err(ParseError::unexpected(token.text, token.offset));
    }
    Ok(expr)
}

/// The parser state: an immutable token buffer and a cursor.
struct Parser<'t, 'a> {
    tokens: &'t [Token<'a>],
    pos: usize,
    eof: Token<'a>,
}

impl<'t, 'a> Parser<'t, 'a> {
    fn new(tokens: &'t [Token<'a>]) -> Self {
        let end = tokens.last().map_or(TextSize::new(0), |t| t.end());
        Self {
            tokens,
            pos: 0,
            eof: Token {
                kind: TokenKind::Eof,
                text: "",
                offset: end,
                quoted: false,
            },
        }
    }

    // =========================================================================
    // Token inspection
    // =========================================================================

    fn current(&self) -> Token<'a> {
        self.nth(0)
    }

    fn nth(&self, n: usize) -> Token<'a> {
        self.tokens.get(self.pos + n).copied().unwrap_or(self.eof)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current().kind == kind
    }

    // =========================================================================
    // Token consumption
    // =========================================================================

    fn bump(&mut self) -> Token<'a> {
        let token = self.current();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &'static str) -> Result<Token<'a>, ParseError> {
        if self.at(kind) {
            return Ok(self.bump());
        }
        Err(self.error_expected(what))
    }

    /// Expect a string token; `quoted` selects `'x'` over a bare word.
    fn expect_string(&mut self, quoted: bool, what: &'static str) -> Result<Token<'a>, ParseError> {
        let token = self.current();
        if token.kind == TokenKind::String && token.quoted == quoted {
            return Ok(self.bump());
        }
        Err(self.error_expected(what))
    }

    fn error_expected(&self, what: &'static str) -> ParseError {
        let token = self.current();
        if token.kind == TokenKind::Eof {
            ParseError::eof(what, token.offset)
        } else {
            ParseError::expected(what, token.text, token.offset)
        }
    }

    // =========================================================================
    // Grammar
    // =========================================================================

    fn parse_expression(&mut self) -> Result<ConditionExpr, ParseError> {
        self.parse_and()
    }

    fn parse_and(&mut self) -> Result<ConditionExpr, ParseError> {
        let mut expr = self.parse_or()?;
        while self.eat(TokenKind::And) {
            let right = self.parse_or()?;
            expr = ConditionExpr::And(Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_or(&mut self) -> Result<ConditionExpr, ParseError> {
        let mut expr = self.parse_relational()?;
        while self.eat(TokenKind::Or) {
            let right = self.parse_relational()?;
            expr = ConditionExpr::Or(Box::new(expr), Box::new(right));
        }
        Ok(expr)
    }

    fn parse_relational(&mut self) -> Result<ConditionExpr, ParseError> {
        let left = self.parse_factor()?;
        let op = match self.current().kind {
            TokenKind::Equal => RelationalOp::Equal,
            TokenKind::NotEqual => RelationalOp::NotEqual,
            TokenKind::Less => RelationalOp::Less,
            TokenKind::LessOrEqual => RelationalOp::LessOrEqual,
            TokenKind::Greater => RelationalOp::Greater,
            TokenKind::GreaterOrEqual => RelationalOp::GreaterOrEqual,
            _ => return Ok(left),
        };
        self.bump();
        let right = self.parse_factor()?;
        Ok(ConditionExpr::Relational {
            left: Box::new(left),
            right: Box::new(right),
            op,
        })
    }

    fn parse_factor(&mut self) -> Result<ConditionExpr, ParseError> {
        let token = self.current();
        match token.kind {
            TokenKind::LeftParen => {
                self.bump();
                let expr = self.parse_expression()?;
                self.expect(TokenKind::RightParen, "')'")?;
                Ok(expr)
            }
            TokenKind::String if !token.quoted && self.nth(1).kind == TokenKind::LeftParen => {
                self.parse_function()
            }
            TokenKind::String | TokenKind::Number => {
                self.bump();
                let kind = match (token.kind, token.quoted) {
                    (TokenKind::Number, _) => LiteralKind::Number,
                    (_, true) => LiteralKind::Quoted,
                    (_, false) => LiteralKind::Bare,
                };
                Ok(ConditionExpr::Factor(Literal {
                    value: token.value().to_string(),
                    kind,
                    range: token.range(),
                }))
            }
            TokenKind::Property | TokenKind::Item | TokenKind::Metadata => self.parse_reference(),
            TokenKind::Not => {
                self.bump();
                let operand = self.parse_factor()?;
                Ok(ConditionExpr::Not(Box::new(operand)))
            }
            TokenKind::Eof => Err(ParseError::eof("an operand", token.offset)),
            _ => Err(ParseError::unexpected(token.text, token.offset)),
        }
    }

    /// Name "(" (Factor ("," Factor)*)? ")"
    fn parse_function(&mut self) -> Result<ConditionExpr, ParseError> {
        let name = self.bump();
        self.bump();

        let mut args = Vec::new();
        loop {
            if self.eat(TokenKind::Comma) {
                continue;
            }
            if self.at(TokenKind::RightParen) {
                break;
            }
            args.push(self.parse_factor()?);
        }
        let close = self.bump();

        Ok(ConditionExpr::Function {
            name: SmolStr::new(name.text),
            args,
            range: name.range().cover(close.range()),
        })
    }

    /// `$(body)`, `@(Name->'t', 's')` or `%(Item.Name)`.
    fn parse_reference(&mut self) -> Result<ConditionExpr, ParseError> {
        let sigil = self.bump();
        self.expect(TokenKind::LeftParen, "'('")?;

        let reference = match sigil.kind {
            TokenKind::Property => {
                let body = self.expect(TokenKind::String, "a property name")?;
                ConditionReference::Property {
                    body: body.text.to_string(),
                }
            }
            TokenKind::Item => {
                let name = self.expect_string(false, "an item name")?;
                let mut transform = None;
                let mut separator = None;
                if self.eat(TokenKind::Transform) {
                    transform = Some(self.expect_string(true, "a quoted transform")?.value().to_string());
                    if self.eat(TokenKind::Comma) {
                        separator = Some(self.expect_string(true, "a quoted separator")?.value().to_string());
                    }
                }
                ConditionReference::Item {
                    name: SmolStr::new(name.text),
                    transform,
                    separator,
                }
            }
            _ => {
                let first = self.expect_string(false, "a metadata name")?;
                if self.eat(TokenKind::Dot) {
                    let name = self.expect_string(false, "a metadata name")?;
                    ConditionReference::Metadata {
                        item: Some(SmolStr::new(first.text)),
                        name: SmolStr::new(name.text),
                    }
                } else {
                    ConditionReference::Metadata {
                        item: None,
                        name: SmolStr::new(first.text),
                    }
                }
            }
        };

        let close = self.expect(TokenKind::RightParen, "')'")?;
        Ok(ConditionExpr::Reference {
            reference,
            range: TextRange::new(sigil.offset, close.end()),
        })
    }
}
