//! Intermediate representation and code generation
//!
//! This module handles the transformation from the annotated syntax tree to
//! bytecode.

pub mod codegen;
pub mod ir;

pub use codegen::{GenerateError, Generator};
pub use ir::IrGraph;
