//! Token types

use std::fmt;

use crate::util::span::Span;

/// Token kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Special
    Unknown,
    EndOfInput,

    // Literals
    Integer8,
    UnsignedInteger8,
    Integer16,
    UnsignedInteger16,
    Integer32,
    UnsignedInteger32,
    Integer64,
    UnsignedInteger64,
    Float32,
    Float64,
    Fixed32,
    Fixed64,
    Fixed128,
    String,
    True,
    False,
    Null,

    // Identifiers
    Identifier,
    AnnotationIdentifier,

    // Keywords
    Function,
    EndFunction,
    While,
    EndWhile,
    For,
    In,
    EndFor,
    If,
    ElseIf,
    Else,
    EndIf,
    Var,
    Return,
    Break,
    Continue,
    Use,
    As,
    Persistent,
    Contract,
    EndContract,
    Struct,
    EndStruct,

    // Operators
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Assign,
    InplaceAdd,
    InplaceSubtract,
    InplaceMultiply,
    InplaceDivide,
    InplaceModulo,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Not,
    Inc,
    Dec,

    // Delimiters
    LeftParenthesis,
    RightParenthesis,
    LeftSquareBracket,
    RightSquareBracket,
    LeftBrace,
    RightBrace,
    Comma,
    SemiColon,
    Colon,
    Dot,
}

impl TokenKind {
    /// Keywords that open a statement; error recovery resumes at these
    pub fn starts_statement(&self) -> bool {
        matches!(
            self,
            TokenKind::Persistent
                | TokenKind::Contract
                | TokenKind::Struct
                | TokenKind::AnnotationIdentifier
                | TokenKind::Function
                | TokenKind::While
                | TokenKind::For
                | TokenKind::If
                | TokenKind::Use
                | TokenKind::Var
                | TokenKind::Return
                | TokenKind::Break
                | TokenKind::Continue
        )
    }

    /// Keywords that close a block
    pub fn is_block_terminator(&self) -> bool {
        matches!(
            self,
            TokenKind::EndFunction
                | TokenKind::EndWhile
                | TokenKind::EndFor
                | TokenKind::ElseIf
                | TokenKind::Else
                | TokenKind::EndIf
                | TokenKind::EndContract
                | TokenKind::EndStruct
        )
    }
}

/// Token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Source text exactly as written (string literals keep their quotes)
    pub text: String,
    pub span: Span,
}

impl Token {
    pub fn new(
        kind: TokenKind,
        text: impl Into<String>,
        span: Span,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            span,
        }
    }

    /// Line stored on tree nodes and instructions
    #[inline]
    pub fn line(&self) -> u16 {
        self.span.line()
    }
}

impl From<TokenKind> for Token {
    fn from(kind: TokenKind) -> Self {
        Token {
            kind,
            text: String::new(),
            span: Span::dummy(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{:?}('{}')", self.kind, self.text)
    }
}
