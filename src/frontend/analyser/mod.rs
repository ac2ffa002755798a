//! Semantic analysis seam
//!
//! Name resolution and type checking are supplied by the embedding host. An
//! [`Analyser`] walks the parsed tree and fills in each expression node's
//! annotations (kind, type, variable, function, owner) using the entities in
//! [`symbols`]. The IR builder and generator consume those annotations and
//! never re-derive them.

pub mod symbols;

pub use symbols::{
    unique_name, Function, FunctionKind, FunctionRef, Type, TypeRef, Variable, VariableKind,
    VariableRef,
};

use crate::frontend::parser::ast::BlockNode;
use crate::util::diagnostic::Diagnostic;

/// Annotates a parsed tree in place
pub trait Analyser {
    fn analyse(
        &mut self,
        root: &mut BlockNode,
    ) -> Result<(), Vec<Diagnostic>>;
}
