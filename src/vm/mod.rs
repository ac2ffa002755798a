//! Bytecode and value model shared by the generator and the interpreter
//!
//! The interpreter itself lives outside this crate; everything here is the
//! contract it consumes: opcodes, instruction encoding, the executable
//! artifact, runtime type ids and tagged values.

pub mod bindings;
pub mod executable;
pub mod opcode;
pub mod types;
pub mod value;

pub use bindings::{Bindings, BuiltinBindings};
pub use executable::{
    Annotation, AnnotationElement, AnnotationLiteral, Constant, Contract, ContractFunction,
    Executable, Function, Instruction, LargeConstant, StructInfo, VariableInfo,
};
pub use opcode::Opcode;
pub use types::{TypeId, TypeIds, TypeInfo, TypeKind, PRIMITIVE_MAX_ID};
pub use value::{Object, StringObject, Value};

#[cfg(test)]
mod tests;
