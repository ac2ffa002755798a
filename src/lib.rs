//! Etch smart-contract language compiler
//!
//! Source text is parsed into a syntax tree, annotated by a host-supplied
//! analyser, lowered into an IR graph and finally emitted as bytecode for the
//! Etch virtual machine.
//!
//! # Example
//!
//! ```no_run
//! use etch::frontend::{config::CompilerConfig, Compiler};
//! use etch::util::span::SourceFile;
//!
//! let compiler = Compiler::new(CompilerConfig::default());
//! let files = [SourceFile::new("token.etch", "function main()\nendfunction\n")];
//! match compiler.parse(&files) {
//!     Ok(tree) => println!("{}", tree),
//!     Err(diagnostics) => eprint!("{}", diagnostics),
//! }
//! ```

#![warn(rust_2018_idioms)]

pub mod frontend;
pub mod middle;
pub mod util;
pub mod vm;

// Re-exports
pub use anyhow::{Context, Result};
pub use thiserror::Error;

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::frontend::CompileError;
use crate::util::span::SourceFile;

/// Language version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Language name
pub const NAME: &str = "Etch";

/// Read each path into a [`SourceFile`] named by its display path
pub fn read_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<SourceFile>, CompileError> {
    paths
        .iter()
        .map(|path| {
            let path = path.as_ref();
            debug!("Reading {}", path.display());
            let content = fs::read_to_string(path).map_err(|source| CompileError::Io {
                path: path.display().to_string(),
                source,
            })?;
            Ok(SourceFile::new(path.display().to_string(), content))
        })
        .collect()
}
