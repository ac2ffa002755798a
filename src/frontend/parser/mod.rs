//! Parser module
//!
//! Turns token streams into a syntax tree. Statements and blocks are parsed
//! by recursive descent ([`stmt`]); expressions by a shunting-yard operator
//! precedence parser ([`expr`]). Errors never abort the parse: each is
//! recorded and the parser resynchronises at the next statement boundary, so
//! one call reports every independent problem it finds.

pub mod ast;
mod expr;
mod state;
mod stmt;

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::frontend::config::ParserConfig;
use crate::frontend::lexer::{tokenize, Token, TokenKind};
use crate::util::diagnostic::Diagnostic;
use crate::util::span::SourceFile;
pub use ast::{BasicNode, BlockNode, ExpressionKind, ExpressionNode, Node, NodeKind};
pub use state::{ParserState, Parsed, Resume};

/// Source parser
///
/// Holds only configuration; each [`parse`](Parser::parse) call is
/// independent.
#[derive(Debug, Clone)]
pub struct Parser {
    template_names: HashSet<String>,
    max_source_size: usize,
}

impl Default for Parser {
    fn default() -> Self {
        Self::with_config(&ParserConfig::default())
    }
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: &ParserConfig) -> Self {
        Self {
            template_names: config.template_names.iter().cloned().collect(),
            max_source_size: config.max_source_size,
        }
    }

    /// Register an identifier that opens a `<...>` template argument list
    pub fn add_template_name(
        &mut self,
        name: impl Into<String>,
    ) {
        self.template_names.insert(name.into());
    }

    pub fn is_template_name(
        &self,
        name: &str,
    ) -> bool {
        self.template_names.contains(name)
    }

    /// Parse every file under one `Root` block
    ///
    /// Returns the tree only when no file produced a diagnostic.
    pub fn parse(
        &self,
        files: &[SourceFile],
    ) -> Result<BlockNode, Vec<Diagnostic>> {
        let mut root = BlockNode::new(NodeKind::Root, "", 0);
        let mut diagnostics = Vec::new();

        for file in files {
            if file.content.len() > self.max_source_size {
                warn!(
                    "{}: {} bytes exceeds limit of {}",
                    file.name,
                    file.content.len(),
                    self.max_source_size
                );
                diagnostics.push(Diagnostic::error(
                    &file.name,
                    1,
                    format!(
                        "source file exceeds maximum size of {} bytes",
                        self.max_source_size
                    ),
                ));
                continue;
            }
            let tokens = tokenize(&file.content);
            debug!("{}: {} tokens", file.name, tokens.len());
            match self.parse_tokens(&tokens, &file.name) {
                Ok(block) => root.block_children.push(block.into()),
                Err(errors) => diagnostics.extend(errors),
            }
        }

        if diagnostics.is_empty() {
            debug!("parsed {} file(s)", root.block_children.len());
            Ok(root)
        } else {
            debug!("parse failed with {} error(s)", diagnostics.len());
            Err(diagnostics)
        }
    }

    /// Parse one file's tokens into a `File` block named `filename`
    pub fn parse_tokens(
        &self,
        tokens: &[Token],
        filename: &str,
    ) -> Result<BlockNode, Vec<Diagnostic>> {
        let mut state = ParserState::new(tokens, filename, &self.template_names);
        let mut file = BlockNode::new(NodeKind::File, filename, 0);
        state.parse_block(&mut file);
        if state.has_errors() {
            Err(state.into_diagnostics())
        } else {
            Ok(file)
        }
    }

    /// Parse a standalone expression, which must span the whole input
    pub fn parse_expression(
        &self,
        source: &str,
    ) -> Result<ExpressionNode, Vec<Diagnostic>> {
        let tokens = tokenize(source);
        let mut state = ParserState::new(&tokens, "<expression>", &self.template_names);
        let expression = state.parse_expression(false);
        if expression.is_ok() && state.next().kind != TokenKind::EndOfInput {
            state.add_error("unexpected token after expression");
        }
        match expression {
            Ok(node) if !state.has_errors() => Ok(node),
            _ => Err(state.into_diagnostics()),
        }
    }
}

#[cfg(test)]
mod tests;
