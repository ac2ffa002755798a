//! Compiler configuration: logging level, parser limits and generator table
//! limits. Loadable from TOML; every field has a default so partial files are
//! accepted.
//!
//! ```toml
//! log_level = "debug"
//!
//! [parser]
//! max_source_size = 131072
//! template_names = ["Array", "Map", "State", "ShardedState", "Matrix"]
//!
//! [generator]
//! max_instructions = 4096
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::logger::LogLevel;

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Parser limits and template registry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Largest accepted source file, in bytes
    pub max_source_size: usize,
    /// Identifiers that open a `<...>` template argument list
    pub template_names: Vec<String>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_source_size: 64 * 1024,
            template_names: ["Array", "Map", "State", "ShardedState"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Upper bounds on the generator's fixed-size tables
///
/// Instruction operands are 16-bit, so none of these may exceed `u16::MAX`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub max_instructions: usize,
    pub max_variables: usize,
    pub max_strings: usize,
    pub max_constants: usize,
    pub max_large_constants: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        let limit = u16::MAX as usize;
        Self {
            max_instructions: limit,
            max_variables: limit,
            max_strings: limit,
            max_constants: limit,
            max_large_constants: limit,
        }
    }
}

impl GeneratorConfig {
    /// Clamp every limit to the 16-bit operand range
    pub fn clamped(self) -> Self {
        let limit = u16::MAX as usize;
        Self {
            max_instructions: self.max_instructions.min(limit),
            max_variables: self.max_variables.min(limit),
            max_strings: self.max_strings.min(limit),
            max_constants: self.max_constants.min(limit),
            max_large_constants: self.max_large_constants.min(limit),
        }
    }
}

/// Top-level compiler configuration
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    pub log_level: LogLevel,
    pub parser: ParserConfig,
    pub generator: GeneratorConfig,
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read and parse a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn with_log_level(
        mut self,
        level: LogLevel,
    ) -> Self {
        self.log_level = level;
        self
    }

    pub fn with_max_source_size(
        mut self,
        bytes: usize,
    ) -> Self {
        self.parser.max_source_size = bytes;
        self
    }

    pub fn with_generator(
        mut self,
        generator: GeneratorConfig,
    ) -> Self {
        self.generator = generator;
        self
    }
}
