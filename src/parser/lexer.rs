//! Lexer for Extended JSON text.
//!
//! Handles plain JSON plus the legacy shell additions: single-quoted
//! strings, bare identifiers (`ObjectId`, `undefined`, unquoted keys) and
//! `/pattern/flags` regular expression literals.
//!
//! The lexer never fails. Anything it does not understand becomes an
//! `Unknown` token and the parser reports it with its position.

use std::ops::Range;

/// Token types for Extended JSON
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// Identifier: constructor name, keyword or unquoted key
    Ident(String),
    /// String literal, escapes already resolved
    String(String),
    /// Number literal as written, without sign
    Number(String),
    /// Regular expression literal: /pattern/flags
    Regex { pattern: String, flags: String },
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Minus,
    Plus,
    /// End of input
    Eof,
    /// Unknown character, or a string or regex missing its closing delimiter
    Unknown(char),
}

impl TokenKind {
    /// Short description used in error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(s) => s.clone(),
            TokenKind::String(s) => format!("\"{s}\""),
            TokenKind::Number(n) => n.clone(),
            TokenKind::Regex { pattern, flags } => format!("/{pattern}/{flags}"),
            TokenKind::LParen => "(".into(),
            TokenKind::RParen => ")".into(),
            TokenKind::LBrace => "{".into(),
            TokenKind::RBrace => "}".into(),
            TokenKind::LBracket => "[".into(),
            TokenKind::RBracket => "]".into(),
            TokenKind::Comma => ",".into(),
            TokenKind::Colon => ":".into(),
            TokenKind::Minus => "-".into(),
            TokenKind::Plus => "+".into(),
            TokenKind::Eof => "end of input".into(),
            TokenKind::Unknown(c) => c.to_string(),
        }
    }
}

/// Token with position information
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

impl Token {
    pub fn new(kind: TokenKind, span: Range<usize>) -> Self {
        Self { kind, span }
    }
}

/// Character-by-character tokenizer
pub struct ExtJsonLexer {
    input: Vec<char>,
    pos: usize,
}

impl ExtJsonLexer {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Tokenize the entire input. The last token is always `Eof`.
    pub fn tokenize(input: &str) -> Vec<Token> {
        let mut lexer = Self::new(input);
        let mut tokens = Vec::new();

        loop {
            let token = lexer.next_token();
            let is_eof = matches!(token.kind, TokenKind::Eof);
            tokens.push(token);
            if is_eof {
                break;
            }
        }

        tokens
    }

    fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.pos;

        if self.is_at_end() {
            return Token::new(TokenKind::Eof, start..start);
        }

        let ch = self.current_char();
        let single = match ch {
            '(' => Some(TokenKind::LParen),
            ')' => Some(TokenKind::RParen),
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            ',' => Some(TokenKind::Comma),
            ':' => Some(TokenKind::Colon),
            '-' => Some(TokenKind::Minus),
            '+' => Some(TokenKind::Plus),
            _ => None,
        };
        if let Some(kind) = single {
            self.advance();
            return Token::new(kind, start..self.pos);
        }

        match ch {
            '\'' | '"' => self.scan_string(ch, start),
            '/' => self.scan_regex(start),
            '0'..='9' => self.scan_number(start),
            '.' if self.peek_char().is_ascii_digit() => self.scan_number(start),
            c if c.is_alphabetic() || c == '_' || c == '$' => self.scan_identifier(start),
            _ => {
                self.advance();
                Token::new(TokenKind::Unknown(ch), start..self.pos)
            }
        }
    }

    /// Scan a string literal
    fn scan_string(&mut self, quote: char, start: usize) -> Token {
        self.advance(); // Skip opening quote

        let mut value = String::new();

        while !self.is_at_end() && self.current_char() != quote {
            let ch = self.current_char();
            if ch == '\\' {
                self.advance();
                match self.current_char() {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    'r' => value.push('\r'),
                    'b' => value.push('\u{8}'),
                    'f' => value.push('\u{c}'),
                    'u' => {
                        if let Some(c) = self.scan_unicode_escape() {
                            value.push(c);
                        } else {
                            return Token::new(TokenKind::Unknown('\\'), start..self.pos);
                        }
                        continue;
                    }
                    '\0' if self.is_at_end() => break,
                    other => value.push(other),
                }
            } else {
                value.push(ch);
            }
            self.advance();
        }

        if self.is_at_end() {
            // Unterminated
            return Token::new(TokenKind::Unknown(quote), start..self.pos);
        }
        self.advance(); // Skip closing quote

        Token::new(TokenKind::String(value), start..self.pos)
    }

    /// Decode `uXXXX` (the backslash already consumed), joining surrogate pairs.
    /// Leaves the position after the last hex digit.
    fn scan_unicode_escape(&mut self) -> Option<char> {
        self.advance(); // Skip 'u'
        let high = self.scan_hex4()?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high);
        }

        if self.current_char() != '\\' || self.peek_char() != 'u' {
            return None;
        }
        self.advance();
        self.advance();
        let low = self.scan_hex4()?;
        if !(0xDC00..0xE000).contains(&low) {
            return None;
        }
        char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
    }

    fn scan_hex4(&mut self) -> Option<u32> {
        let mut n = 0;
        for _ in 0..4 {
            let digit = self.current_char().to_digit(16)?;
            n = n * 16 + digit;
            self.advance();
        }
        Some(n)
    }

    /// Scan `/pattern/flags`. Slashes inside a character class or after a
    /// backslash do not end the pattern; escapes are kept verbatim.
    fn scan_regex(&mut self, start: usize) -> Token {
        self.advance(); // Skip opening slash

        let mut pattern = String::new();
        let mut in_class = false;
        loop {
            if self.is_at_end() || self.current_char() == '\n' {
                return Token::new(TokenKind::Unknown('/'), start..self.pos);
            }
            let ch = self.current_char();
            match ch {
                '/' if !in_class => break,
                '\\' => {
                    pattern.push(ch);
                    self.advance();
                    if self.is_at_end() {
                        continue;
                    }
                    pattern.push(self.current_char());
                }
                '[' => {
                    in_class = true;
                    pattern.push(ch);
                }
                ']' => {
                    in_class = false;
                    pattern.push(ch);
                }
                _ => pattern.push(ch),
            }
            self.advance();
        }
        self.advance(); // Skip closing slash

        let mut flags = String::new();
        while self.current_char().is_ascii_alphabetic() {
            flags.push(self.current_char());
            self.advance();
        }

        Token::new(TokenKind::Regex { pattern, flags }, start..self.pos)
    }

    /// Scan a number: digits, optional fraction, optional exponent
    fn scan_number(&mut self, start: usize) -> Token {
        let mut value = String::new();

        self.take_digits(&mut value);

        if self.current_char() == '.' {
            value.push('.');
            self.advance();
            self.take_digits(&mut value);
        }

        if matches!(self.current_char(), 'e' | 'E') {
            let sign = self.peek_char();
            let has_exponent = sign.is_ascii_digit()
                || (matches!(sign, '+' | '-')
                    && self
                        .input
                        .get(self.pos + 2)
                        .is_some_and(|c| c.is_ascii_digit()));
            if has_exponent {
                value.push('e');
                self.advance();
                if matches!(self.current_char(), '+' | '-') {
                    value.push(self.current_char());
                    self.advance();
                }
                self.take_digits(&mut value);
            }
        }

        Token::new(TokenKind::Number(value), start..self.pos)
    }

    fn take_digits(&mut self, value: &mut String) {
        while self.current_char().is_ascii_digit() {
            value.push(self.current_char());
            self.advance();
        }
    }

    /// Scan an identifier or keyword
    fn scan_identifier(&mut self, start: usize) -> Token {
        let mut value = String::new();

        while !self.is_at_end() {
            let ch = self.current_char();
            if ch.is_alphanumeric() || ch == '_' || ch == '$' {
                value.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        Token::new(TokenKind::Ident(value), start..self.pos)
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() && self.current_char().is_whitespace() {
            self.advance();
        }
    }

    fn current_char(&self) -> char {
        self.input.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_char(&self) -> char {
        self.input.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.pos += 1;
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}
