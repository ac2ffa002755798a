//! Parser state and token stream management

use std::collections::HashSet;

use super::ast::NodeKind;
use crate::frontend::lexer::{Token, TokenKind};
use crate::util::diagnostic::Diagnostic;

/// Where the enclosing block resumes after a statement fails to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Skip to the next `;` or statement keyword first
    NextStatement,
    /// The failed statement already consumed everything it owns
    Here,
}

pub type Parsed<T> = Result<T, Resume>;

/// One open block on the block stack
#[derive(Debug, Clone, Copy)]
pub struct BlockFrame {
    pub kind: NodeKind,
    /// Cleared for blocks nested inside an already malformed construct
    pub report_errors: bool,
    /// Set once a stray terminator has been reported in this block
    pub mismatch_reported: bool,
}

/// Parser state for one source file
#[derive(Debug)]
pub struct ParserState<'a> {
    /// Token stream, always ending in `EndOfInput`
    tokens: &'a [Token],
    /// Index of the current token; `None` before the first `next`
    index: Option<usize>,
    filename: &'a str,
    template_names: &'a HashSet<String>,
    blocks: Vec<BlockFrame>,
    /// Depth of muted regions
    silence: usize,
    eof_reported: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> ParserState<'a> {
    pub fn new(
        tokens: &'a [Token],
        filename: &'a str,
        template_names: &'a HashSet<String>,
    ) -> Self {
        debug_assert!(tokens
            .last()
            .is_some_and(|t| t.kind == TokenKind::EndOfInput));
        Self {
            tokens,
            index: None,
            filename,
            template_names,
            blocks: Vec::new(),
            silence: 0,
            eof_reported: false,
            diagnostics: Vec::new(),
        }
    }

    /// Current token
    #[inline]
    pub fn token(&self) -> &'a Token {
        let tokens: &'a [Token] = self.tokens;
        &tokens[self.index.unwrap_or(0).min(tokens.len() - 1)]
    }

    /// Advance and return the new current token; sticks at `EndOfInput`
    #[inline]
    pub fn next(&mut self) -> &'a Token {
        let next = self.index.map_or(0, |i| i + 1);
        if next < self.tokens.len() {
            self.index = Some(next);
        }
        self.token()
    }

    /// Step back one token
    #[inline]
    pub fn undo(&mut self) {
        self.index = match self.index {
            Some(0) | None => None,
            Some(i) => Some(i - 1),
        };
    }

    #[inline]
    pub fn at(
        &self,
        kind: TokenKind,
    ) -> bool {
        self.token().kind == kind
    }

    pub fn is_template_name(
        &self,
        name: &str,
    ) -> bool {
        self.template_names.contains(name)
    }

    pub fn push_block(
        &mut self,
        kind: NodeKind,
    ) {
        let report_errors = self.reporting();
        self.blocks.push(BlockFrame {
            kind,
            report_errors,
            mismatch_reported: false,
        });
    }

    pub fn pop_block(&mut self) {
        self.blocks.pop();
    }

    /// Kind of the innermost open block
    pub fn block_kind(&self) -> NodeKind {
        self.blocks.last().map_or(NodeKind::Unknown, |b| b.kind)
    }

    /// Whether errors found now would be recorded
    pub fn reporting(&self) -> bool {
        self.silence == 0 && self.blocks.last().map_or(true, |b| b.report_errors)
    }

    /// Run `f` with error reporting switched off unless `enabled`
    pub fn with_reporting<T>(
        &mut self,
        enabled: bool,
        f: impl FnOnce(&mut Self) -> T,
    ) -> T {
        if enabled {
            return f(self);
        }
        self.silence += 1;
        let result = f(self);
        self.silence -= 1;
        result
    }

    /// Report a stray terminator, at most once per block
    pub fn add_mismatch_error(
        &mut self,
        message: &str,
    ) {
        let already = self.blocks.last().is_some_and(|b| b.mismatch_reported);
        if already {
            return;
        }
        self.add_error(message);
        if let Some(frame) = self.blocks.last_mut() {
            frame.mismatch_reported = true;
        }
    }

    /// Report end of input inside an unterminated block, once per file
    pub fn add_eof_error(&mut self) {
        if self.eof_reported || !self.reporting() {
            return;
        }
        self.add_error("expected statement or block terminator");
        self.eof_reported = true;
    }

    /// Record an error against the current token
    pub fn add_error(
        &mut self,
        message: &str,
    ) {
        let token = self.token();
        self.add_error_at(token, message);
    }

    /// Record an error against a specific token
    pub fn add_error_at(
        &mut self,
        token: &Token,
        message: &str,
    ) {
        if !self.reporting() {
            return;
        }
        let mut body = if token.kind == TokenKind::EndOfInput {
            "reached end-of-input".to_string()
        } else {
            format!("error at '{}'", token.text)
        };
        if !message.is_empty() {
            body.push_str(", ");
            body.push_str(message);
        }
        self.diagnostics
            .push(Diagnostic::error(self.filename, token.line(), body));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Skip to the end of the current statement
    ///
    /// Stops on a consumed `;` or just before a statement keyword, so the
    /// enclosing block's next `next()` lands on a fresh statement.
    pub fn go_to_next_statement(&mut self) {
        loop {
            let kind = self.token().kind;
            if kind == TokenKind::EndOfInput || kind == TokenKind::SemiColon {
                return;
            }
            if kind.starts_statement() {
                self.undo();
                return;
            }
            self.next();
        }
    }

    /// Skip the rest of a malformed block header
    ///
    /// Like [`go_to_next_statement`](Self::go_to_next_statement) but also stops
    /// before block terminators, so the body that follows can still be matched
    /// with its own terminator.
    pub fn skip_header(&mut self) {
        loop {
            let kind = self.token().kind;
            if kind == TokenKind::EndOfInput || kind == TokenKind::SemiColon {
                return;
            }
            if kind.starts_statement() || kind.is_block_terminator() {
                self.undo();
                return;
            }
            self.next();
        }
    }
}
