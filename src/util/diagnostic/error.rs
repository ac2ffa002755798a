//! Diagnostic data structures

use std::fmt;

/// Diagnostic severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
}

impl Severity {
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// One reported problem, attributed to a file and line
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Diagnostic {
    pub severity: Severity,
    pub filename: String,
    pub line: u16,
    pub message: String,
}

impl Diagnostic {
    pub fn error(
        filename: impl Into<String>,
        line: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Error,
            filename: filename.into(),
            line,
            message: message.into(),
        }
    }

    pub fn warning(
        filename: impl Into<String>,
        line: u16,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(filename, line, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity.is_error()
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(
            f,
            "{}: line {}: {}: {}",
            self.filename, self.line, self.severity, self.message
        )
    }
}

impl std::error::Error for Diagnostic {}
