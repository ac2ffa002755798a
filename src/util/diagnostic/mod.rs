//! Compiler diagnostics
//!
//! Every stage reports problems as [`Diagnostic`] values rendered as
//! `<filename>: line <n>: error: <message>`. They accumulate in a
//! [`Diagnostics`] list in the order they were found; nothing is
//! short-circuited at the first error.

pub mod collect;
pub mod error;

pub use collect::Diagnostics;
pub use error::{Diagnostic, Severity};
