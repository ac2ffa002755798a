//! Bytecode generator
//!
//! Walks an [`IrGraph`] and fills an [`Executable`]. Generation happens in
//! passes:
//! 1. resolve every interned type to a type id and every opcode-invoked
//!    function to its opcode (errors here are collected, not fatal one by one)
//! 2. lay out the contract table and the function shells, so every
//!    user-defined function has an index before any body refers to it
//! 3. lay out the struct table
//! 4. emit the function bodies
//!
//! IR entities are immutable, so the ids chosen in passes 1 to 3 live in side
//! tables keyed by entity address rather than on the entities.
//!
//! Anything that overflows a configured table aborts the whole call; the
//! caller never sees a partly built executable.

mod expr;
mod flow;
mod stmt;

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use smallvec::SmallVec;
use thiserror::Error;
use tracing::{debug, info};

use crate::frontend::analyser::FunctionKind;
use crate::frontend::config::GeneratorConfig;
use crate::frontend::parser::ast::NodeKind;
use crate::middle::ir::{
    IrBlockNode, IrExpressionNode, IrFunction, IrGraph, IrNode, IrType, IrTypeRef, IrVariable,
    IrVariableRef,
};
use crate::vm::{
    Bindings, Constant, Executable, Instruction, LargeConstant, Opcode, TypeId, TypeIds, TypeInfo,
};

/// Fatal or resolution error raised while generating
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("unable to find type '{0}'")]
    UnknownType(String),

    #[error("unable to find function '{0}'")]
    UnknownFunction(String),

    #[error("function '{function}' exceeds the maximum of {limit} instructions")]
    TooManyInstructions { function: String, limit: usize },

    #[error("function '{function}' exceeds the maximum of {limit} variables")]
    TooManyVariables { function: String, limit: usize },

    #[error("executable exceeds the maximum of {limit} functions")]
    TooManyFunctions { limit: usize },

    #[error("string table exceeds the maximum of {limit} entries")]
    TooManyStrings { limit: usize },

    #[error("constant table exceeds the maximum of {limit} entries")]
    TooManyConstants { limit: usize },

    #[error("large constant table exceeds the maximum of {limit} entries")]
    TooManyLargeConstants { limit: usize },

    #[error("statement outside a function body")]
    OutsideFunction { line: u16 },

    #[error("malformed tree, {reason}")]
    MalformedTree { line: u16, reason: String },
}

impl GenerateError {
    /// Source line the error is attributed to, 0 for whole-executable errors
    pub fn line(&self) -> u16 {
        match self {
            GenerateError::OutsideFunction { line } | GenerateError::MalformedTree { line, .. } => {
                *line
            }
            _ => 0,
        }
    }
}

pub type GenResult<T> = Result<T, GenerateError>;

fn malformed(
    line: u16,
    reason: impl Into<String>,
) -> GenerateError {
    GenerateError::MalformedTree {
        line,
        reason: reason.into(),
    }
}

/// Lexical scope of the function being generated
#[derive(Debug, Default)]
struct Scope {
    /// Slots of object-typed locals declared in this scope
    objects: SmallVec<[u16; 4]>,
}

/// Innermost-loop bookkeeping for `break` and `continue`
#[derive(Debug)]
struct Loop {
    scope_number: u16,
    break_pcs: SmallVec<[u16; 4]>,
    continue_pcs: SmallVec<[u16; 4]>,
}

impl Loop {
    fn new(scope_number: u16) -> Self {
        Self {
            scope_number,
            break_pcs: SmallVec::new(),
            continue_pcs: SmallVec::new(),
        }
    }
}

/// Generates executables against one set of module bindings
pub struct Generator<'a> {
    bindings: &'a dyn Bindings,
    config: GeneratorConfig,

    executable: Executable,
    type_ids: HashMap<*const IrType, TypeId>,
    function_ids: HashMap<*const IrFunction, u16>,
    /// Function-local slot of each parameter and local
    variable_ids: HashMap<*const IrVariable, u16>,
    /// Struct slot of each member variable
    member_ids: HashMap<*const IrVariable, u16>,
    constants: HashMap<Constant, u16>,
    large_constants: HashMap<LargeConstant, u16>,

    /// Index into `executable.functions` of the body being emitted
    current: Option<usize>,
    scopes: Vec<Scope>,
    loops: Vec<Loop>,
    line_to_pc: BTreeMap<u16, u16>,
}

impl<'a> Generator<'a> {
    pub fn new(
        bindings: &'a dyn Bindings,
        config: GeneratorConfig,
    ) -> Self {
        Self {
            bindings,
            config: config.clamped(),
            executable: Executable::default(),
            type_ids: HashMap::new(),
            function_ids: HashMap::new(),
            variable_ids: HashMap::new(),
            member_ids: HashMap::new(),
            constants: HashMap::new(),
            large_constants: HashMap::new(),
            current: None,
            scopes: Vec::new(),
            loops: Vec::new(),
            line_to_pc: BTreeMap::new(),
        }
    }

    fn reset(
        &mut self,
        name: &str,
    ) {
        self.executable = Executable::new(name);
        self.type_ids.clear();
        self.function_ids.clear();
        self.variable_ids.clear();
        self.member_ids.clear();
        self.constants.clear();
        self.large_constants.clear();
        self.current = None;
        self.scopes.clear();
        self.loops.clear();
        self.line_to_pc.clear();
    }

    /// Generate the executable `name` for `ir`
    ///
    /// Every unresolved type and function is reported together. Any later
    /// error is fatal and reported alone.
    pub fn generate(
        &mut self,
        ir: &IrGraph,
        name: &str,
    ) -> Result<Executable, Vec<GenerateError>> {
        self.reset(name);

        let mut errors = self.resolve_types(ir);
        errors.extend(self.resolve_functions(ir));
        if !errors.is_empty() {
            debug!("{}: {} unresolved entities", name, errors.len());
            self.reset("");
            return Err(errors);
        }

        match self.generate_bodies(ir) {
            Ok(()) => {
                let executable = std::mem::take(&mut self.executable);
                info!(
                    "generated '{}': {} functions, {} strings, {} constants, {} large constants",
                    executable.name,
                    executable.functions.len(),
                    executable.strings.len(),
                    executable.constants.len(),
                    executable.large_constants.len()
                );
                self.reset("");
                Ok(executable)
            }
            Err(error) => {
                debug!("{}: generation failed: {}", name, error);
                self.reset("");
                Err(vec![error])
            }
        }
    }

    fn generate_bodies(
        &mut self,
        ir: &IrGraph,
    ) -> GenResult<()> {
        self.create_contracts(&ir.root)?;
        self.create_functions(&ir.root)?;
        self.create_structs(&ir.root)?;
        self.handle_block(&ir.root)
    }

    fn resolve_types(
        &mut self,
        ir: &IrGraph,
    ) -> Vec<GenerateError> {
        let mut errors = Vec::new();
        // Dependencies precede dependents, so template ids are already known
        for ty in &ir.types {
            if ty.is_user_defined() {
                let id = self.bindings.num_types() + self.executable.types.len() as TypeId;
                let mut info = TypeInfo::new(ty.kind, ty.name.as_str(), id);
                info.template_type_id = ty
                    .template_type()
                    .and_then(|t| self.type_ids.get(&Rc::as_ptr(&t)).copied())
                    .unwrap_or(TypeIds::UNKNOWN);
                info.parameter_type_ids = ty
                    .parameter_types()
                    .iter()
                    .map(|t| {
                        self.type_ids
                            .get(&Rc::as_ptr(t))
                            .copied()
                            .unwrap_or(TypeIds::UNKNOWN)
                    })
                    .collect();
                self.type_ids.insert(Rc::as_ptr(ty), id);
                self.executable.types.push(info);
                continue;
            }
            match self.bindings.type_id(&ty.name) {
                Some(id) => {
                    self.type_ids.insert(Rc::as_ptr(ty), id);
                }
                None => errors.push(GenerateError::UnknownType(ty.name.clone())),
            }
        }
        errors
    }

    fn resolve_functions(
        &mut self,
        ir: &IrGraph,
    ) -> Vec<GenerateError> {
        let mut errors = Vec::new();
        for function in &ir.functions {
            // User-defined functions are numbered as their shells are laid out
            if function.kind.is_user_defined() {
                continue;
            }
            match self.bindings.opcode(&function.unique_name) {
                Some(opcode) => {
                    self.function_ids.insert(Rc::as_ptr(function), opcode);
                }
                None => errors.push(GenerateError::UnknownFunction(
                    function.unique_name.clone(),
                )),
            }
        }
        errors
    }

    // Entity lookups

    fn type_id(
        &self,
        ty: &IrTypeRef,
    ) -> GenResult<TypeId> {
        self.type_ids
            .get(&Rc::as_ptr(ty))
            .copied()
            .ok_or_else(|| GenerateError::UnknownType(ty.name.clone()))
    }

    fn node_type<'n>(
        &self,
        node: &'n IrExpressionNode,
    ) -> GenResult<&'n IrTypeRef> {
        node.ty.as_ref().ok_or_else(|| {
            malformed(
                node.line,
                format!("expression '{}' has no type", node.text),
            )
        })
    }

    fn node_type_id(
        &self,
        node: &IrExpressionNode,
    ) -> GenResult<TypeId> {
        self.type_id(self.node_type(node)?)
    }

    fn function_id(
        &self,
        function: &IrFunction,
    ) -> GenResult<u16> {
        self.function_ids
            .get(&(function as *const IrFunction))
            .copied()
            .ok_or_else(|| GenerateError::UnknownFunction(function.unique_name.clone()))
    }

    /// Type id of the static type of `variable`
    fn variable_type_id(
        &self,
        variable: &IrVariable,
        line: u16,
    ) -> GenResult<TypeId> {
        let ty = variable
            .ty()
            .ok_or_else(|| malformed(line, format!("variable '{}' has no type", variable.name)))?;
        self.type_id(&ty)
    }

    /// Slot and slot type of a declared parameter or local
    fn variable_slot(
        &self,
        variable: &IrVariable,
        line: u16,
    ) -> GenResult<(u16, TypeId)> {
        let slot = self
            .variable_ids
            .get(&(variable as *const IrVariable))
            .copied()
            .ok_or_else(|| {
                malformed(
                    line,
                    format!("variable '{}' used before its declaration", variable.name),
                )
            })?;
        let type_id = self
            .current
            .and_then(|i| self.executable.functions.get(i))
            .and_then(|f| f.variables.get(slot as usize))
            .map(|v| v.type_id)
            .ok_or(GenerateError::OutsideFunction { line })?;
        Ok((slot, type_id))
    }

    fn member_slot(
        &self,
        variable: &IrVariable,
        line: u16,
    ) -> GenResult<u16> {
        self.member_ids
            .get(&(variable as *const IrVariable))
            .copied()
            .ok_or_else(|| malformed(line, format!("'{}' is not a struct member", variable.name)))
    }

    // Instruction stream

    /// Program counter of the next instruction
    fn pc(&self) -> u16 {
        self.current
            .and_then(|i| self.executable.functions.get(i))
            .map_or(0, |f| f.instructions.len() as u16)
    }

    /// Append `instruction` attributed to `line`, returning its pc
    fn emit(
        &mut self,
        instruction: Instruction,
        line: u16,
    ) -> GenResult<u16> {
        let limit = self.config.max_instructions;
        let function = self
            .current
            .and_then(|i| self.executable.functions.get_mut(i))
            .ok_or(GenerateError::OutsideFunction { line })?;
        if function.instructions.len() >= limit {
            return Err(GenerateError::TooManyInstructions {
                function: function.name.clone(),
                limit,
            });
        }
        let pc = function.add_instruction(Instruction {
            line,
            ..instruction
        }) as u16;
        self.line_to_pc
            .entry(line)
            .and_modify(|lowest| *lowest = (*lowest).min(pc))
            .or_insert(pc);
        Ok(pc)
    }

    fn instruction_mut(
        &mut self,
        pc: u16,
    ) -> Option<&mut Instruction> {
        self.current
            .and_then(|i| self.executable.functions.get_mut(i))
            .and_then(|f| f.instructions.get_mut(pc as usize))
    }

    /// Point the placeholder at `pc` to `destination`
    fn patch(
        &mut self,
        pc: u16,
        destination: u16,
    ) {
        if let Some(instruction) = self.instruction_mut(pc) {
            instruction.index = destination;
        }
    }

    // Scopes and slots

    fn scope_number(&self) -> u16 {
        self.scopes.len().saturating_sub(1) as u16
    }

    fn scope_enter(&mut self) {
        self.scopes.push(Scope::default());
    }

    /// Pop the innermost scope, releasing its objects unless `block` is a
    /// function body (its return does that)
    fn scope_leave(
        &mut self,
        block: &IrBlockNode,
    ) -> GenResult<()> {
        let scope_number = self.scope_number();
        let Some(scope) = self.scopes.pop() else {
            return Ok(());
        };
        if !scope.objects.is_empty() && block.kind != NodeKind::FunctionDefinition {
            self.emit(
                Instruction::new(Opcode::Destruct).with_data(scope_number),
                block.terminator_line,
            )?;
        }
        Ok(())
    }

    /// Give `variable` a slot of type `type_id` in the current scope
    fn add_variable(
        &mut self,
        variable: &IrVariableRef,
        type_id: TypeId,
        object: bool,
        line: u16,
    ) -> GenResult<u16> {
        let limit = self.config.max_variables;
        let scope_number = self.scope_number();
        let function = self
            .current
            .and_then(|i| self.executable.functions.get_mut(i))
            .ok_or(GenerateError::OutsideFunction { line })?;
        if function.variables.len() >= limit {
            return Err(GenerateError::TooManyVariables {
                function: function.name.clone(),
                limit,
            });
        }
        let slot = function.add_variable(variable.name.as_str(), type_id, scope_number) as u16;
        self.variable_ids.insert(Rc::as_ptr(variable), slot);
        if object {
            if let Some(scope) = self.scopes.last_mut() {
                scope.objects.push(slot);
            }
        }
        Ok(slot)
    }

    // Pools

    fn add_constant(
        &mut self,
        constant: Constant,
    ) -> GenResult<u16> {
        if let Some(index) = self.constants.get(&constant) {
            return Ok(*index);
        }
        let limit = self.config.max_constants;
        if self.executable.constants.len() >= limit {
            return Err(GenerateError::TooManyConstants { limit });
        }
        let index = self.executable.constants.len() as u16;
        self.executable.constants.push(constant);
        self.constants.insert(constant, index);
        Ok(index)
    }

    fn add_large_constant(
        &mut self,
        constant: LargeConstant,
    ) -> GenResult<u16> {
        if let Some(index) = self.large_constants.get(&constant) {
            return Ok(*index);
        }
        let limit = self.config.max_large_constants;
        if self.executable.large_constants.len() >= limit {
            return Err(GenerateError::TooManyLargeConstants { limit });
        }
        let index = self.executable.large_constants.len() as u16;
        self.executable.large_constants.push(constant);
        self.large_constants.insert(constant, index);
        Ok(index)
    }

    fn add_string(
        &mut self,
        text: &str,
    ) -> GenResult<u16> {
        if let Some(index) = self.executable.strings.get_index_of(text) {
            return Ok(index as u16);
        }
        let limit = self.config.max_strings;
        if self.executable.strings.len() >= limit {
            return Err(GenerateError::TooManyStrings { limit });
        }
        let (index, _) = self.executable.strings.insert_full(text.to_string());
        Ok(index as u16)
    }
}

/// Expression child `index` of `node`, which the tree shape requires
fn expression_child(
    node: &IrNode,
    index: usize,
) -> GenResult<&IrExpressionNode> {
    node.child(index)
        .and_then(IrNode::as_expression)
        .ok_or_else(|| {
            malformed(
                node.line(),
                format!("{:?} is missing expression child {}", node.kind(), index),
            )
        })
}

/// Operand `index` of an operator node
fn operand(
    node: &IrExpressionNode,
    index: usize,
) -> GenResult<&IrExpressionNode> {
    node.operand(index).ok_or_else(|| {
        malformed(
            node.line,
            format!("{:?} is missing operand {}", node.kind, index),
        )
    })
}

fn function_of(node: &IrExpressionNode) -> GenResult<&Rc<IrFunction>> {
    node.function
        .as_ref()
        .ok_or_else(|| malformed(node.line, format!("'{}' has no function", node.text)))
}

fn variable_of(node: &IrExpressionNode) -> GenResult<&IrVariableRef> {
    node.variable
        .as_ref()
        .ok_or_else(|| malformed(node.line, format!("'{}' has no variable", node.text)))
}

/// Whether a user-defined call is dispatched on an instance
fn is_instance_call(kind: FunctionKind) -> bool {
    matches!(
        kind,
        FunctionKind::UserDefinedContractFunction | FunctionKind::UserDefinedMemberFunction
    )
}

#[cfg(test)]
mod tests;
