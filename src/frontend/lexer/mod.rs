//! Lexer module
//!
//! Hand-written scanner over `Peekable<Chars>`. Scanning never fails: anything
//! the scanner cannot make sense of becomes a [`TokenKind::Unknown`] token and
//! the parser reports it. The stream always ends with
//! [`TokenKind::EndOfInput`].

pub mod tokens;

use std::collections::HashMap;

use once_cell::sync::Lazy;

pub use tokens::{Token, TokenKind};

pub use tokenizer::tokenize;

static KEYWORDS: Lazy<HashMap<&'static str, TokenKind>> = Lazy::new(|| {
    use TokenKind::*;
    [
        ("function", Function),
        ("endfunction", EndFunction),
        ("while", While),
        ("endwhile", EndWhile),
        ("for", For),
        ("in", In),
        ("endfor", EndFor),
        ("if", If),
        ("elseif", ElseIf),
        ("else", Else),
        ("endif", EndIf),
        ("var", Var),
        ("return", Return),
        ("break", Break),
        ("continue", Continue),
        ("use", Use),
        ("as", As),
        ("persistent", Persistent),
        ("contract", Contract),
        ("endcontract", EndContract),
        ("struct", Struct),
        ("endstruct", EndStruct),
        ("true", True),
        ("false", False),
        ("null", Null),
    ]
    .into_iter()
    .collect()
});

/// Look up a reserved word
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    KEYWORDS.get(s).copied()
}

/// Tokenize source code
mod tokenizer {
    use super::*;
    use crate::util::span::{Position, Span};
    use std::iter::Peekable;
    use std::str::Chars;

    pub fn tokenize(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();

        while let Some(token) = lexer.next_token() {
            tokens.push(token);
        }

        tokens.push(Token::new(
            TokenKind::EndOfInput,
            "",
            Span::new(lexer.position(), lexer.position()),
        ));
        tokens
    }

    struct Lexer<'a> {
        chars: Peekable<Chars<'a>>,
        offset: usize,
        line: usize,
        column: usize,
        start_offset: usize,
        start_line: usize,
        start_column: usize,
        text: String,
    }

    impl<'a> Lexer<'a> {
        fn new(source: &'a str) -> Self {
            Self {
                chars: source.chars().peekable(),
                offset: 0,
                line: 1,
                column: 1,
                start_offset: 0,
                start_line: 1,
                start_column: 1,
                text: String::new(),
            }
        }

        fn position(&self) -> Position {
            Position::with_offset(self.line, self.column, self.offset)
        }

        fn start_position(&self) -> Position {
            Position::with_offset(self.start_line, self.start_column, self.start_offset)
        }

        fn span(&self) -> Span {
            Span::new(self.start_position(), self.position())
        }

        /// Consume one character, appending it to the current token text
        fn advance(&mut self) -> Option<char> {
            let c = self.chars.next()?;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
            self.offset += c.len_utf8();
            self.text.push(c);
            Some(c)
        }

        fn peek(&mut self) -> Option<&char> {
            self.chars.peek()
        }

        fn peek_next(&self) -> Option<char> {
            self.chars.clone().nth(1)
        }

        fn advance_if(
            &mut self,
            expected: char,
        ) -> bool {
            if self.peek() == Some(&expected) {
                self.advance();
                true
            } else {
                false
            }
        }

        fn begin_token(&mut self) {
            self.start_offset = self.offset;
            self.start_line = self.line;
            self.start_column = self.column;
            self.text.clear();
        }

        /// Skip whitespace and comments; an unterminated block comment is
        /// returned as an unknown token
        fn skip_whitespace_and_comments(&mut self) -> Option<Token> {
            loop {
                match self.peek().copied() {
                    Some(' ' | '\t' | '\r' | '\n') => {
                        self.advance();
                    }
                    Some('/') if self.peek_next() == Some('/') => {
                        while let Some(&c) = self.peek() {
                            if c == '\n' {
                                break;
                            }
                            self.advance();
                        }
                    }
                    Some('/') if self.peek_next() == Some('*') => {
                        self.begin_token();
                        self.advance();
                        self.advance();
                        let mut closed = false;
                        while let Some(c) = self.advance() {
                            if c == '*' && self.peek() == Some(&'/') {
                                self.advance();
                                closed = true;
                                break;
                            }
                        }
                        if !closed {
                            return Some(self.make_token(TokenKind::Unknown));
                        }
                    }
                    _ => return None,
                }
            }
        }

        fn next_token(&mut self) -> Option<Token> {
            if let Some(unterminated) = self.skip_whitespace_and_comments() {
                return Some(unterminated);
            }

            self.begin_token();
            let c = self.advance()?;

            let kind = match c {
                c if is_identifier_start(c) => return Some(self.scan_identifier()),
                c if c.is_ascii_digit() => return Some(self.scan_number()),
                '"' | '\'' => return Some(self.scan_string(c)),
                '@' => {
                    if self.peek().is_some_and(|&c| is_identifier_start(c)) {
                        self.scan_word();
                        TokenKind::AnnotationIdentifier
                    } else {
                        TokenKind::Unknown
                    }
                }
                '+' => {
                    if self.advance_if('+') {
                        TokenKind::Inc
                    } else if self.advance_if('=') {
                        TokenKind::InplaceAdd
                    } else {
                        TokenKind::Plus
                    }
                }
                '-' => {
                    if self.advance_if('-') {
                        TokenKind::Dec
                    } else if self.advance_if('=') {
                        TokenKind::InplaceSubtract
                    } else {
                        TokenKind::Minus
                    }
                }
                '*' => self.with_assign(TokenKind::Multiply, TokenKind::InplaceMultiply),
                '/' => self.with_assign(TokenKind::Divide, TokenKind::InplaceDivide),
                '%' => self.with_assign(TokenKind::Modulo, TokenKind::InplaceModulo),
                '=' => self.with_assign(TokenKind::Assign, TokenKind::Equal),
                '!' => self.with_assign(TokenKind::Not, TokenKind::NotEqual),
                '<' => self.with_assign(TokenKind::LessThan, TokenKind::LessThanOrEqual),
                '>' => self.with_assign(TokenKind::GreaterThan, TokenKind::GreaterThanOrEqual),
                '&' => {
                    if self.advance_if('&') {
                        TokenKind::And
                    } else {
                        TokenKind::Unknown
                    }
                }
                '|' => {
                    if self.advance_if('|') {
                        TokenKind::Or
                    } else {
                        TokenKind::Unknown
                    }
                }
                '(' => TokenKind::LeftParenthesis,
                ')' => TokenKind::RightParenthesis,
                '[' => TokenKind::LeftSquareBracket,
                ']' => TokenKind::RightSquareBracket,
                '{' => TokenKind::LeftBrace,
                '}' => TokenKind::RightBrace,
                ',' => TokenKind::Comma,
                ';' => TokenKind::SemiColon,
                ':' => TokenKind::Colon,
                '.' => TokenKind::Dot,
                _ => TokenKind::Unknown,
            };
            Some(self.make_token(kind))
        }

        /// `op` or `op=`
        fn with_assign(
            &mut self,
            plain: TokenKind,
            assigning: TokenKind,
        ) -> TokenKind {
            if self.advance_if('=') {
                assigning
            } else {
                plain
            }
        }

        fn scan_word(&mut self) {
            while let Some(&c) = self.peek() {
                if is_identifier_char(c) {
                    self.advance();
                } else {
                    break;
                }
            }
        }

        fn scan_identifier(&mut self) -> Token {
            self.scan_word();
            let kind = keyword_from_str(&self.text).unwrap_or(TokenKind::Identifier);
            self.make_token(kind)
        }

        fn scan_digits(&mut self) -> bool {
            let mut any = false;
            while let Some(&c) = self.peek() {
                if c.is_ascii_digit() {
                    self.advance();
                    any = true;
                } else {
                    break;
                }
            }
            any
        }

        fn scan_number(&mut self) -> Token {
            self.scan_digits();

            let mut is_real = false;
            if self.peek() == Some(&'.') && self.peek_next().is_some_and(|c| c.is_ascii_digit()) {
                self.advance();
                self.scan_digits();
                is_real = true;
            }

            if matches!(self.peek(), Some('e' | 'E')) {
                let next = self.peek_next();
                let signed = matches!(next, Some('+' | '-'));
                if signed || next.is_some_and(|c| c.is_ascii_digit()) {
                    self.advance();
                    if signed {
                        self.advance();
                    }
                    if !self.scan_digits() {
                        return self.make_token(TokenKind::Unknown);
                    }
                    is_real = true;
                }
            }

            let suffix_start = self.text.len();
            self.scan_word();
            let suffix = &self.text[suffix_start..];

            let kind = match suffix {
                "" if is_real => TokenKind::Float64,
                "" => TokenKind::Integer32,
                "f" => TokenKind::Float32,
                "fp32" => TokenKind::Fixed32,
                "fp64" => TokenKind::Fixed64,
                "fp128" => TokenKind::Fixed128,
                _ if is_real => TokenKind::Unknown,
                "i8" => TokenKind::Integer8,
                "u8" => TokenKind::UnsignedInteger8,
                "i16" => TokenKind::Integer16,
                "u16" => TokenKind::UnsignedInteger16,
                "i32" => TokenKind::Integer32,
                "u32" => TokenKind::UnsignedInteger32,
                "i64" => TokenKind::Integer64,
                "u64" => TokenKind::UnsignedInteger64,
                _ => TokenKind::Unknown,
            };
            self.make_token(kind)
        }

        /// Quoted string; the token text keeps both quotes
        fn scan_string(
            &mut self,
            quote: char,
        ) -> Token {
            while let Some(&c) = self.peek() {
                match c {
                    '\n' => break,
                    '\\' => {
                        self.advance();
                        match self.peek() {
                            Some('\\' | '"' | '\'' | 'n' | 't' | 'r') => {
                                self.advance();
                            }
                            _ => {
                                self.skip_to_end_of_line();
                                return self.make_token(TokenKind::Unknown);
                            }
                        }
                    }
                    c if c == quote => {
                        self.advance();
                        return self.make_token(TokenKind::String);
                    }
                    _ => {
                        self.advance();
                    }
                }
            }
            self.make_token(TokenKind::Unknown)
        }

        fn skip_to_end_of_line(&mut self) {
            while let Some(&c) = self.peek() {
                if c == '\n' {
                    break;
                }
                self.advance();
            }
        }

        fn make_token(
            &self,
            kind: TokenKind,
        ) -> Token {
            Token::new(kind, self.text.clone(), self.span())
        }
    }

    fn is_identifier_start(c: char) -> bool {
        c.is_ascii_alphabetic() || c == '_'
    }

    fn is_identifier_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '_'
    }
}

/// Strip the quotes from a string literal and resolve its escapes
pub fn unquote(text: &str) -> String {
    let inner = text
        .get(1..text.len().saturating_sub(1))
        .unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

/// Numeric part of a literal, without its type suffix
pub fn numeric_body(text: &str) -> &str {
    let bytes = text.as_bytes();
    let mut end = 0;
    while end < bytes.len() {
        let b = bytes[end];
        let exponent = matches!(b, b'e' | b'E')
            && bytes
                .get(end + 1)
                .is_some_and(|n| n.is_ascii_digit() || matches!(n, b'+' | b'-'));
        if b.is_ascii_digit() || b == b'.' {
            end += 1;
        } else if exponent {
            end += 2;
        } else {
            break;
        }
    }
    &text[..end]
}

#[cfg(test)]
mod tests;
