//! Executable artifact produced by the generator
//!
//! An [`Executable`] is populated once by the generator and never mutated
//! afterwards. Program counters are positions in a function's instruction
//! array; all operands are 16-bit.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use indexmap::IndexSet;
use serde::Serialize;

use super::opcode::{opcode_name, Opcode};
use super::types::{TypeId, TypeIds, TypeInfo};

/// One bytecode instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Instruction {
    pub opcode: u16,
    pub line: u16,
    pub index: u16,
    pub type_id: TypeId,
    pub data: u16,
}

impl Instruction {
    /// Create an instruction with every operand zeroed
    pub fn new(opcode: impl Into<u16>) -> Self {
        Self {
            opcode: opcode.into(),
            line: 0,
            index: 0,
            type_id: TypeIds::UNKNOWN,
            data: 0,
        }
    }

    #[inline]
    pub fn with_index(
        mut self,
        index: u16,
    ) -> Self {
        self.index = index;
        self
    }

    #[inline]
    pub fn with_type(
        mut self,
        type_id: TypeId,
    ) -> Self {
        self.type_id = type_id;
        self
    }

    #[inline]
    pub fn with_data(
        mut self,
        data: u16,
    ) -> Self {
        self.data = data;
        self
    }

    /// Decoded reserved opcode, `None` for module-bound opcodes
    pub fn reserved(&self) -> Option<Opcode> {
        Opcode::try_from(self.opcode).ok()
    }

    /// Whether this is the reserved opcode `opcode`
    #[inline]
    pub fn is(
        &self,
        opcode: Opcode,
    ) -> bool {
        self.opcode == opcode.code()
    }
}

/// Parameter or local variable slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableInfo {
    pub name: String,
    pub type_id: TypeId,
    pub scope_number: u16,
}

/// Literal appearing inside an annotation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnnotationLiteral {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    String(String),
    Identifier(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AnnotationElement {
    Value(AnnotationLiteral),
    NameValuePair {
        name: AnnotationLiteral,
        value: AnnotationLiteral,
    },
}

/// `@name(elements...)` attached to a function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub name: String,
    pub elements: Vec<AnnotationElement>,
}

/// Compiled function body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub num_parameters: u16,
    pub variables: Vec<VariableInfo>,
    pub return_type_id: TypeId,
    pub instructions: Vec<Instruction>,
    /// Lowest program counter emitted for each source line
    pub pc_to_line: BTreeMap<u16, u16>,
}

impl Function {
    pub fn new(
        name: impl Into<String>,
        annotations: Vec<Annotation>,
        return_type_id: TypeId,
    ) -> Self {
        Self {
            name: name.into(),
            annotations,
            num_parameters: 0,
            variables: Vec::new(),
            return_type_id,
            instructions: Vec::new(),
            pc_to_line: BTreeMap::new(),
        }
    }

    /// Add a variable slot, returning its position
    pub fn add_variable(
        &mut self,
        name: impl Into<String>,
        type_id: TypeId,
        scope_number: u16,
    ) -> usize {
        self.variables.push(VariableInfo {
            name: name.into(),
            type_id,
            scope_number,
        });
        self.variables.len() - 1
    }

    /// Add a parameter slot; parameters always live in scope 0
    pub fn add_parameter(
        &mut self,
        name: impl Into<String>,
        type_id: TypeId,
    ) -> usize {
        self.num_parameters += 1;
        self.add_variable(name, type_id, 0)
    }

    /// Append an instruction, returning its program counter
    pub fn add_instruction(
        &mut self,
        instruction: Instruction,
    ) -> usize {
        self.instructions.push(instruction);
        self.instructions.len() - 1
    }

    /// Source line for a program counter
    pub fn line_for_pc(
        &self,
        pc: u16,
    ) -> Option<u16> {
        self.pc_to_line
            .range(..=pc)
            .next_back()
            .map(|(_, line)| *line)
    }
}

/// Signature of a contract function
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractFunction {
    pub name: String,
    pub annotations: Vec<Annotation>,
    pub parameter_type_ids: Vec<TypeId>,
    pub return_type_id: TypeId,
}

/// User-defined contract: a named group of function signatures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contract {
    pub name: String,
    pub type_id: TypeId,
    pub functions: Vec<ContractFunction>,
}

/// User-defined struct layout
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructInfo {
    pub name: String,
    pub type_id: TypeId,
    pub member_variables: Vec<VariableInfo>,
    /// Indices into [`Executable::functions`]
    pub member_functions: Vec<u16>,
}

/// Small constant pool entry, deduplicated by (type, bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Constant {
    pub type_id: TypeId,
    pub bits: u64,
}

/// 128-bit fixed-point constant (raw representation, 64 fractional bits)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LargeConstant {
    pub raw: i128,
}

/// Compiled unit consumed by the interpreter
#[derive(Debug, Clone, Default, Serialize)]
pub struct Executable {
    pub name: String,
    pub functions: Vec<Function>,
    pub strings: IndexSet<String>,
    pub constants: Vec<Constant>,
    pub large_constants: Vec<LargeConstant>,
    pub types: Vec<TypeInfo>,
    pub contracts: Vec<Contract>,
    pub structs: Vec<StructInfo>,
}

impl Executable {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn find_function(
        &self,
        name: &str,
    ) -> Option<&Function> {
        self.functions.iter().find(|f| f.name == name)
    }

    pub fn find_type(
        &self,
        id: TypeId,
    ) -> Option<&TypeInfo> {
        self.types.iter().find(|t| t.id == id)
    }

    /// Pretty-printed JSON form of the whole artifact
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Human readable listing of every function
    pub fn disassemble(&self) -> String {
        let mut out = String::new();
        for function in &self.functions {
            let _ = writeln!(
                out,
                "function {} (params: {}, return type: {})",
                function.name, function.num_parameters, function.return_type_id
            );
            for (slot, variable) in function.variables.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  var {} {} : {} @scope {}",
                    slot, variable.name, variable.type_id, variable.scope_number
                );
            }
            for (pc, instruction) in function.instructions.iter().enumerate() {
                let _ = writeln!(
                    out,
                    "  {:04} {:<36} index={} type={} data={}",
                    pc,
                    opcode_name(instruction.opcode),
                    instruction.index,
                    instruction.type_id,
                    instruction.data
                );
            }
        }
        out
    }
}
