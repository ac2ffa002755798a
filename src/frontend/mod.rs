//! Frontend compilation pipeline
//!
//! This module contains the lexer, the parser and the analyser seam.
//! [`Compiler`] drives source files through parse, analysis, IR build and
//! bytecode generation.

use thiserror::Error;
use tracing::{debug, info};

use crate::middle::{Generator, IrGraph};
use crate::util::diagnostic::{Diagnostic, Diagnostics};
use crate::util::span::SourceFile;
use crate::vm::{Bindings, Executable};

pub mod analyser;
pub mod config;
pub mod lexer;
pub mod parser;

use analyser::Analyser;
use config::CompilerConfig;
use parser::{BlockNode, Parser};

/// Compiler context
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
    parser: Parser,
}

impl Compiler {
    /// Create a compiler for `config`
    pub fn new(config: CompilerConfig) -> Self {
        let parser = Parser::with_config(&config.parser);
        Self { config, parser }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Register an extra template name with the parser
    pub fn add_template_name(
        &mut self,
        name: impl Into<String>,
    ) {
        self.parser.add_template_name(name);
    }

    /// Parse `files` into one syntax tree
    pub fn parse(
        &self,
        files: &[SourceFile],
    ) -> Result<BlockNode, Diagnostics> {
        info!("Parsing {} file(s)", files.len());
        self.parser.parse(files).map_err(Diagnostics::from)
    }

    /// Compile `files` to an executable
    ///
    /// The executable is named after the first file. The first failing phase
    /// ends the run and its diagnostics are returned.
    pub fn compile(
        &self,
        files: &[SourceFile],
        analyser: &mut impl Analyser,
        bindings: &impl Bindings,
    ) -> Result<Executable, Diagnostics> {
        let mut root = self.parse(files)?;

        debug!("Starting analysis...");
        analyser.analyse(&mut root).map_err(Diagnostics::from)?;

        let ir = IrGraph::build(&root);
        drop(root);

        let name = files.first().map_or("", |file| file.name.as_str());
        debug!("Generating '{}'...", name);
        let executable = Generator::new(bindings, self.config.generator)
            .generate(&ir, name)
            .map_err(|errors| {
                errors
                    .iter()
                    .map(|error| Diagnostic::error(name, error.line(), error.to_string()))
                    .collect::<Vec<_>>()
            })?;

        info!("Compiled '{}'", name);
        Ok(executable)
    }
}

/// Compilation errors raised outside the diagnostic pipeline
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{0}")]
    Diagnostics(#[from] Diagnostics),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
