//! Recursive-descent parser for Extended JSON text.
//!
//! Grammar, informally:
//!
//! ```text
//! value    := ["-" | "+"] primary
//! primary  := object | array | string | number | regex
//!           | ["new"] IDENT ["(" args ")"]
//! object   := "{" [key ":" value ("," key ":" value)* [","]] "}"
//! array    := "[" [value ("," value)* [","]] "]"
//! ```

use super::ast::*;
use super::lexer::{ExtJsonLexer, Token, TokenKind};
use crate::error::{ParseError, Result};

/// Deepest nesting of objects, arrays and call arguments accepted.
pub const MAX_NESTING_DEPTH: usize = 128;

/// Extended JSON parser
pub struct ExtJsonParser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl ExtJsonParser {
    pub fn new(input: &str) -> Self {
        let tokens = ExtJsonLexer::tokenize(input);
        Self {
            tokens,
            pos: 0,
            depth: 0,
        }
    }

    /// Parse exactly one value; anything after it is an error.
    pub fn parse(input: &str) -> Result<Expr> {
        let mut parser = Self::new(input);
        let expr = parser.parse_value()?;
        if !parser.check(&TokenKind::Eof) {
            return Err(ParseError::TrailingInput(parser.current_pos()).into());
        }
        Ok(expr)
    }

    /// Parse one value, refusing to nest past [`MAX_NESTING_DEPTH`].
    fn parse_value(&mut self) -> Result<Expr> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::TooDeep {
                limit: MAX_NESTING_DEPTH,
                position: self.current_pos(),
            }
            .into());
        }
        self.depth += 1;
        let value = self.parse_unary();
        self.depth -= 1;
        value
    }

    /// Parse unary expression: -x, +x
    fn parse_unary(&mut self) -> Result<Expr> {
        let start = self.current_pos();

        let operator = if self.match_token(&TokenKind::Minus) {
            Some(UnaryOperator::Minus)
        } else if self.match_token(&TokenKind::Plus) {
            Some(UnaryOperator::Plus)
        } else {
            None
        };

        match operator {
            Some(operator) => {
                let argument = self.parse_primary()?;
                let end = self.previous_pos();
                Ok(Expr::Unary(Box::new(UnaryExpr::new(
                    operator,
                    argument,
                    start..end,
                ))))
            }
            None => self.parse_primary(),
        }
    }

    /// Parse primary expression (literals, identifiers, calls, objects, arrays)
    fn parse_primary(&mut self) -> Result<Expr> {
        let start = self.current_pos();
        let kind = self.current_kind().clone();

        match kind {
            TokenKind::String(s) => {
                self.advance();
                Ok(Expr::String(s))
            }
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expr::Number(n))
            }
            TokenKind::Regex { pattern, flags } => {
                self.advance();
                Ok(Expr::Regex { pattern, flags })
            }
            TokenKind::LBrace => self.parse_object(start),
            TokenKind::LBracket => self.parse_array(start),
            TokenKind::Ident(name) => {
                self.advance();
                match name.as_str() {
                    "true" => Ok(Expr::Boolean(true)),
                    "false" => Ok(Expr::Boolean(false)),
                    "null" => Ok(Expr::Null),
                    "new" => self.parse_new_expression(start),
                    _ if self.check(&TokenKind::LParen) => self.parse_call(name, false, start),
                    _ => Ok(Expr::Ident(name, start..self.previous_pos())),
                }
            }
            other => Err(self.unexpected("a value", &other)),
        }
    }

    /// Parse new expression: new Ctor(args)
    fn parse_new_expression(&mut self, start: usize) -> Result<Expr> {
        let name = self.expect_identifier("a constructor name after 'new'")?;
        if self.check(&TokenKind::LParen) {
            self.parse_call(name, true, start)
        } else {
            let end = self.previous_pos();
            Ok(Expr::Call(Box::new(CallExpr::new(
                name,
                Vec::new(),
                true,
                start..end,
            ))))
        }
    }

    fn parse_call(&mut self, callee: String, is_new: bool, start: usize) -> Result<Expr> {
        self.expect_token(&TokenKind::LParen, "'('")?;
        let arguments = self.parse_arguments()?;
        self.expect_token(&TokenKind::RParen, "')' after arguments")?;
        let end = self.previous_pos();
        Ok(Expr::Call(Box::new(CallExpr::new(
            callee,
            arguments,
            is_new,
            start..end,
        ))))
    }

    /// Parse object literal: { key: value, ... }
    fn parse_object(&mut self, start: usize) -> Result<Expr> {
        self.expect_token(&TokenKind::LBrace, "'{'")?;

        let mut properties = Vec::new();

        if self.match_token(&TokenKind::RBrace) {
            let end = self.previous_pos();
            return Ok(Expr::Object(ObjectExpr::new(properties, start..end)));
        }

        loop {
            let prop_start = self.current_pos();
            let key = self.parse_property_key()?;
            self.expect_token(&TokenKind::Colon, "':' after property key")?;
            let value = self.parse_value()?;
            let prop_end = self.previous_pos();
            properties.push(Property::new(key, value, prop_start..prop_end));

            if self.match_token(&TokenKind::Comma) {
                // Allow trailing comma
                if self.check(&TokenKind::RBrace) {
                    break;
                }
            } else if self.check(&TokenKind::RBrace) {
                break;
            } else {
                let found = self.current_kind().clone();
                return Err(self.unexpected("',' or '}' after property", &found));
            }
        }

        self.expect_token(&TokenKind::RBrace, "'}'")?;
        let end = self.previous_pos();

        Ok(Expr::Object(ObjectExpr::new(properties, start..end)))
    }

    /// Parse property key (identifier, string, or number)
    fn parse_property_key(&mut self) -> Result<PropertyKey> {
        let key = match self.current_kind() {
            TokenKind::Ident(name) => PropertyKey::Ident(name.clone()),
            TokenKind::String(s) => PropertyKey::String(s.clone()),
            TokenKind::Number(n) => PropertyKey::Number(n.clone()),
            other => {
                let other = other.clone();
                return Err(self.unexpected("a property key", &other));
            }
        };
        self.advance();
        Ok(key)
    }

    /// Parse array literal: [elem1, elem2, ...]
    fn parse_array(&mut self, start: usize) -> Result<Expr> {
        self.expect_token(&TokenKind::LBracket, "'['")?;

        let mut elements = Vec::new();

        if self.match_token(&TokenKind::RBracket) {
            let end = self.previous_pos();
            return Ok(Expr::Array(ArrayExpr::new(elements, start..end)));
        }

        loop {
            elements.push(self.parse_value()?);

            if self.match_token(&TokenKind::Comma) {
                // Allow trailing comma
                if self.check(&TokenKind::RBracket) {
                    break;
                }
            } else if self.check(&TokenKind::RBracket) {
                break;
            } else {
                let found = self.current_kind().clone();
                return Err(self.unexpected("',' or ']' after array element", &found));
            }
        }

        self.expect_token(&TokenKind::RBracket, "']'")?;
        let end = self.previous_pos();

        Ok(Expr::Array(ArrayExpr::new(elements, start..end)))
    }

    /// Parse function arguments: arg1, arg2, ...
    fn parse_arguments(&mut self) -> Result<Vec<Expr>> {
        let mut arguments = Vec::new();

        if self.check(&TokenKind::RParen) {
            return Ok(arguments);
        }

        loop {
            arguments.push(self.parse_value()?);

            if !self.match_token(&TokenKind::Comma) || self.check(&TokenKind::RParen) {
                break;
            }
        }

        Ok(arguments)
    }

    // Token manipulation methods

    fn current_kind(&self) -> &TokenKind {
        self.tokens
            .get(self.pos)
            .map(|t| &t.kind)
            .unwrap_or(&TokenKind::Eof)
    }

    /// Check if current token matches the given kind
    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.current_kind()) == std::mem::discriminant(kind)
    }

    /// Match and consume token if it matches the given kind
    fn match_token(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn advance(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect_token(&mut self, kind: &TokenKind, expected: &str) -> Result<()> {
        if self.match_token(kind) {
            Ok(())
        } else {
            let found = self.current_kind().clone();
            Err(self.unexpected(expected, &found))
        }
    }

    fn expect_identifier(&mut self, expected: &str) -> Result<String> {
        match self.current_kind().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            other => Err(self.unexpected(expected, &other)),
        }
    }

    fn unexpected(&self, expected: &str, found: &TokenKind) -> crate::error::ToolsError {
        ParseError::UnexpectedToken {
            expected: expected.to_string(),
            found: found.describe(),
            position: self.current_pos(),
        }
        .into()
    }

    fn current_pos(&self) -> usize {
        if let Some(token) = self.tokens.get(self.pos) {
            token.span.start
        } else if let Some(last) = self.tokens.last() {
            last.span.end
        } else {
            0
        }
    }

    fn previous_pos(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|t| t.span.end)
            .unwrap_or(0)
    }
}
