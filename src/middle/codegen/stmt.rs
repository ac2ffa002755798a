//! Executable tables and statement generation

use std::rc::Rc;

use tracing::debug;

use super::{expression_child, malformed, variable_of, GenResult, GenerateError, Generator};
use crate::frontend::analyser::VariableKind;
use crate::frontend::lexer::numeric_body;
use crate::frontend::parser::ast::{ExpressionKind, NodeKind};
use crate::middle::ir::{IrBlockNode, IrExpressionNode, IrNode, IrVariableRef};
use crate::vm::{
    Annotation, AnnotationElement, AnnotationLiteral, Contract, ContractFunction, Function,
    Instruction, Opcode, StructInfo, TypeId, TypeIds, VariableInfo,
};

/// Assignable expression shapes
pub(super) enum Target<'n> {
    Variable(&'n IrVariableRef),
    Indexed {
        node: &'n IrExpressionNode,
        container: &'n IrExpressionNode,
        indices: Vec<&'n IrExpressionNode>,
    },
    Member {
        object: &'n IrExpressionNode,
        variable: &'n IrVariableRef,
    },
}

impl<'n> Target<'n> {
    pub(super) fn of(node: &'n IrExpressionNode) -> GenResult<Self> {
        if let Some(variable) = &node.variable {
            if node.kind == NodeKind::Dot && variable.kind == VariableKind::Member {
                let object = super::operand(node, 0)?;
                return Ok(Target::Member { object, variable });
            }
        }
        if node.expression_kind == ExpressionKind::Variable {
            return Ok(Target::Variable(variable_of(node)?));
        }
        if node.kind == NodeKind::Index {
            let container = super::operand(node, 0)?;
            let indices = node.operands().skip(1).collect();
            return Ok(Target::Indexed {
                node,
                container,
                indices,
            });
        }
        Err(malformed(
            node.line,
            format!("'{}' is not assignable", node.text),
        ))
    }
}

fn annotation_literal(node: &IrNode) -> GenResult<AnnotationLiteral> {
    let text = node.text();
    let bad = || malformed(node.line(), format!("invalid annotation literal '{}'", text));
    let literal = match node.kind() {
        NodeKind::True => AnnotationLiteral::Boolean(true),
        NodeKind::False => AnnotationLiteral::Boolean(false),
        NodeKind::Integer64 => {
            AnnotationLiteral::Integer(numeric_body(text).parse().map_err(|_| bad())?)
        }
        NodeKind::Float64 => AnnotationLiteral::Real(numeric_body(text).parse().map_err(|_| bad())?),
        NodeKind::String => AnnotationLiteral::String(strip_quotes(text).to_string()),
        NodeKind::Identifier => AnnotationLiteral::Identifier(text.to_string()),
        _ => return Err(bad()),
    };
    Ok(literal)
}

/// Annotations attached to a function, from its optional `Annotations` child
fn annotations(node: Option<&IrNode>) -> GenResult<Vec<Annotation>> {
    let Some(node) = node else {
        return Ok(Vec::new());
    };
    let mut out = Vec::new();
    for annotation in node.children().iter().flatten() {
        let mut elements = Vec::new();
        for element in annotation.children().iter().flatten() {
            if element.kind() == NodeKind::AnnotationNameValuePair {
                let name = element
                    .child(0)
                    .ok_or_else(|| malformed(element.line(), "annotation pair without a name"))?;
                let value = element
                    .child(1)
                    .ok_or_else(|| malformed(element.line(), "annotation pair without a value"))?;
                elements.push(AnnotationElement::NameValuePair {
                    name: annotation_literal(name)?,
                    value: annotation_literal(value)?,
                });
            } else {
                elements.push(AnnotationElement::Value(annotation_literal(element)?));
            }
        }
        out.push(Annotation {
            name: annotation.text().to_string(),
            elements,
        });
    }
    Ok(out)
}

/// Text between the quotes of a string literal
pub(super) fn strip_quotes(text: &str) -> &str {
    if text.len() >= 2 {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Function definitions of `root`'s files: free functions first, then struct
/// member functions, each in source order
fn function_definitions(root: &IrBlockNode) -> Vec<&IrBlockNode> {
    let mut free = Vec::new();
    let mut members = Vec::new();
    for file in root.block_children.iter().filter_map(IrNode::as_block) {
        for child in file.block_children.iter().filter_map(IrNode::as_block) {
            match child.kind {
                NodeKind::FunctionDefinition => free.push(child),
                NodeKind::StructDefinition => members.extend(
                    child
                        .block_children
                        .iter()
                        .filter_map(IrNode::as_block)
                        .filter(|b| b.kind == NodeKind::FunctionDefinition),
                ),
                _ => {}
            }
        }
    }
    free.extend(members);
    free
}

/// File-level blocks of `kind`
fn definitions(
    root: &IrBlockNode,
    kind: NodeKind,
) -> impl Iterator<Item = &IrBlockNode> {
    root.block_children
        .iter()
        .filter_map(IrNode::as_block)
        .flat_map(|file| file.block_children.iter().filter_map(IrNode::as_block))
        .filter(move |b| b.kind == kind)
}

impl<'a> Generator<'a> {
    // Tables

    pub(super) fn create_contracts(
        &mut self,
        root: &IrBlockNode,
    ) -> GenResult<()> {
        for definition in definitions(root, NodeKind::ContractDefinition) {
            let name = header_child(definition, 0)?;
            let type_id = self.node_type_id(name)?;
            let mut contract = Contract {
                name: name.text.clone(),
                type_id,
                functions: Vec::new(),
            };
            for prototype in &definition.block_children {
                let function_node = expression_child(prototype, 1)?;
                let function = super::function_of(function_node)?;
                let parameter_type_ids = function
                    .parameter_types()
                    .iter()
                    .map(|t| self.type_id(t))
                    .collect::<GenResult<Vec<TypeId>>>()?;
                let return_type_id = match function.return_type() {
                    Some(ty) => self.type_id(&ty)?,
                    None => TypeIds::VOID,
                };
                self.function_ids
                    .insert(Rc::as_ptr(function), contract.functions.len() as u16);
                contract.functions.push(ContractFunction {
                    name: function.name.clone(),
                    annotations: annotations(prototype.child(0))?,
                    parameter_type_ids,
                    return_type_id,
                });
            }
            debug!(
                "contract '{}': type {}, {} functions",
                contract.name,
                contract.type_id,
                contract.functions.len()
            );
            self.executable.contracts.push(contract);
        }
        Ok(())
    }

    pub(super) fn create_functions(
        &mut self,
        root: &IrBlockNode,
    ) -> GenResult<()> {
        for definition in function_definitions(root) {
            let name = header_child(definition, 1)?;
            let function = super::function_of(name)?;
            let return_type_id = match function.return_type() {
                Some(ty) => self.type_id(&ty)?,
                None => TypeIds::VOID,
            };
            let mut shell = Function::new(
                function.name.as_str(),
                annotations(definition.child(0))?,
                return_type_id,
            );
            for parameter in function.parameter_variables() {
                let type_id = self.variable_type_id(&parameter, name.line)?;
                if shell.variables.len() >= self.config.max_variables {
                    return Err(GenerateError::TooManyVariables {
                        function: shell.name,
                        limit: self.config.max_variables,
                    });
                }
                let slot = shell.add_parameter(parameter.name.as_str(), type_id);
                self.variable_ids.insert(Rc::as_ptr(&parameter), slot as u16);
            }
            let index = self.executable.functions.len();
            if index >= u16::MAX as usize {
                return Err(GenerateError::TooManyFunctions {
                    limit: u16::MAX as usize,
                });
            }
            self.function_ids.insert(Rc::as_ptr(function), index as u16);
            self.executable.functions.push(shell);
        }
        Ok(())
    }

    pub(super) fn create_structs(
        &mut self,
        root: &IrBlockNode,
    ) -> GenResult<()> {
        for definition in definitions(root, NodeKind::StructDefinition) {
            let name = header_child(definition, 0)?;
            let mut info = StructInfo {
                name: name.text.clone(),
                type_id: self.node_type_id(name)?,
                member_variables: Vec::new(),
                member_functions: Vec::new(),
            };
            for member in &definition.block_children {
                match member.kind() {
                    NodeKind::MemberVarDeclaration => {
                        let variable = variable_of(expression_child(member, 0)?)?;
                        let type_id = self.variable_type_id(variable, member.line())?;
                        self.member_ids
                            .insert(Rc::as_ptr(variable), info.member_variables.len() as u16);
                        info.member_variables.push(VariableInfo {
                            name: variable.name.clone(),
                            type_id,
                            scope_number: 0,
                        });
                    }
                    NodeKind::FunctionDefinition => {
                        let function = super::function_of(expression_child(member, 1)?)?;
                        info.member_functions.push(self.function_id(function)?);
                    }
                    _ => {}
                }
            }
            debug!(
                "struct '{}': type {}, {} members",
                info.name,
                info.type_id,
                info.member_variables.len()
            );
            self.executable.structs.push(info);
        }
        Ok(())
    }

    // Statements

    pub(super) fn handle_block(
        &mut self,
        block: &IrBlockNode,
    ) -> GenResult<()> {
        for child in &block.block_children {
            self.handle_statement(child)?;
        }
        Ok(())
    }

    fn handle_statement(
        &mut self,
        node: &IrNode,
    ) -> GenResult<()> {
        match (node.kind(), node) {
            (NodeKind::File, IrNode::Block(block)) => self.handle_block(block),
            (NodeKind::PersistentStatement | NodeKind::ContractDefinition, _) => Ok(()),
            (NodeKind::StructDefinition, IrNode::Block(block)) => {
                for member in block.block_children.iter().filter_map(IrNode::as_block) {
                    if member.kind == NodeKind::FunctionDefinition {
                        self.handle_function_definition(member)?;
                    }
                }
                Ok(())
            }
            (NodeKind::FunctionDefinition, IrNode::Block(block)) => {
                self.handle_function_definition(block)
            }
            _ if self.current.is_none() => Err(GenerateError::OutsideFunction { line: node.line() }),
            (NodeKind::WhileStatement, IrNode::Block(block)) => self.handle_while_statement(block),
            (NodeKind::ForStatement, IrNode::Block(block)) => self.handle_for_statement(block),
            (NodeKind::IfStatement, _) => self.handle_if_statement(node),
            (NodeKind::UseStatement, _) => self.handle_use_statement(node),
            (NodeKind::UseAnyStatement, _) => {
                for child in node.children().iter().flatten() {
                    let child = child
                        .as_expression()
                        .ok_or_else(|| malformed(child.line(), "use-any entry is not a name"))?;
                    self.handle_use_variable(&child.text, child.line, child)?;
                }
                Ok(())
            }
            (NodeKind::ContractStatement, _) => self.handle_contract_statement(node),
            (
                NodeKind::VarDeclarationStatement
                | NodeKind::VarDeclarationTypedAssignmentStatement
                | NodeKind::VarDeclarationTypelessAssignmentStatement,
                _,
            ) => self.handle_var_statement(node),
            (NodeKind::ReturnStatement, _) => self.handle_return_statement(node),
            (NodeKind::BreakStatement, _) => self.handle_jump_statement(node, Opcode::Break),
            (NodeKind::ContinueStatement, _) => self.handle_jump_statement(node, Opcode::Continue),
            (NodeKind::Assign, IrNode::Expression(e)) => self.handle_assignment(e),
            (
                NodeKind::InplaceAdd
                | NodeKind::InplaceSubtract
                | NodeKind::InplaceMultiply
                | NodeKind::InplaceDivide
                | NodeKind::InplaceModulo,
                IrNode::Expression(e),
            ) => self.handle_inplace_assignment(e),
            (_, IrNode::Expression(expression)) => {
                self.handle_expression(expression)?;
                let ty = self.node_type(expression)?;
                if !ty.is_void() {
                    let type_id = self.type_id(ty)?;
                    self.emit(
                        Instruction::new(Opcode::Discard).with_type(type_id),
                        expression.line,
                    )?;
                }
                Ok(())
            }
            (kind, _) => Err(malformed(
                node.line(),
                format!("unexpected {:?} statement", kind),
            )),
        }
    }

    fn handle_function_definition(
        &mut self,
        block: &IrBlockNode,
    ) -> GenResult<()> {
        let name = header_child(block, 1)?;
        let function = super::function_of(name)?;
        let index = self.function_id(function)? as usize;
        self.current = Some(index);
        self.line_to_pc.clear();

        self.scope_enter();
        self.handle_block(block)?;
        self.scope_leave(block)?;

        if function.returns_void() {
            self.emit(Instruction::new(Opcode::Return), block.terminator_line)?;
        }

        let lines = std::mem::take(&mut self.line_to_pc);
        if let Some(exe_function) = self.executable.functions.get_mut(index) {
            for (line, pc) in lines {
                exe_function.pc_to_line.insert(pc, line);
            }
            debug!(
                "function '{}': {} instructions, {} variables",
                exe_function.name,
                exe_function.instructions.len(),
                exe_function.variables.len()
            );
        }
        self.current = None;
        Ok(())
    }

    fn handle_use_statement(
        &mut self,
        node: &IrNode,
    ) -> GenResult<()> {
        let state = expression_child(node, 0)?;
        let target = node
            .child(2)
            .and_then(IrNode::as_expression)
            .unwrap_or(state);
        self.handle_use_variable(&state.text, state.line, target)
    }

    /// Bind `node`'s variable to a freshly constructed state named `name`
    ///
    /// `node` carries the declared variable, its type and the resolved
    /// constructor; for `use x as y` that is the alias node.
    fn handle_use_variable(
        &mut self,
        name: &str,
        line: u16,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let variable = variable_of(node)?;
        let constructor = super::function_of(node)?;
        let ty = variable
            .ty()
            .ok_or_else(|| malformed(node.line, format!("'{}' has no type", variable.name)))?;
        let type_id = self.type_id(&ty)?;
        let scope_number = self.scope_number();
        let slot = self.add_variable(variable, type_id, !ty.is_primitive(), node.line)?;

        self.push_string(name, line)?;
        let opcode = self.function_id(constructor)?;
        self.emit(
            Instruction::new(opcode).with_type(type_id).with_data(type_id),
            node.line,
        )?;
        self.emit(
            Instruction::new(Opcode::VariableDeclareAssign)
                .with_type(type_id)
                .with_index(slot)
                .with_data(scope_number),
            node.line,
        )?;
        Ok(())
    }

    fn handle_contract_statement(
        &mut self,
        node: &IrNode,
    ) -> GenResult<()> {
        let variable = variable_of(expression_child(node, 0)?)?;
        let initialiser = expression_child(node, 2)?;
        let contract_type_id = self.variable_type_id(variable, node.line())?;
        let initialiser_type = self.node_type(initialiser)?;
        let initialiser_type_id = self.type_id(initialiser_type)?;

        // The slot holds whatever identifies the instance, typed as the initialiser
        let scope_number = self.scope_number();
        let slot = self.add_variable(
            variable,
            initialiser_type_id,
            !initialiser_type.is_primitive(),
            node.line(),
        )?;

        self.handle_expression(initialiser)?;
        self.emit(
            Instruction::new(Opcode::ContractVariableDeclareAssign)
                .with_type(contract_type_id)
                .with_index(slot)
                .with_data(scope_number),
            node.line(),
        )?;
        Ok(())
    }

    fn handle_var_statement(
        &mut self,
        node: &IrNode,
    ) -> GenResult<()> {
        let variable = variable_of(expression_child(node, 0)?)?;
        let ty = variable
            .ty()
            .ok_or_else(|| malformed(node.line(), format!("'{}' has no type", variable.name)))?;
        let type_id = self.type_id(&ty)?;
        let scope_number = self.scope_number();
        let slot = self.add_variable(variable, type_id, !ty.is_primitive(), node.line())?;

        let opcode = match node.kind() {
            NodeKind::VarDeclarationStatement => Opcode::VariableDeclare,
            NodeKind::VarDeclarationTypedAssignmentStatement => {
                self.handle_expression(expression_child(node, 2)?)?;
                Opcode::VariableDeclareAssign
            }
            _ => {
                self.handle_expression(expression_child(node, 1)?)?;
                Opcode::VariableDeclareAssign
            }
        };
        self.emit(
            Instruction::new(opcode)
                .with_type(type_id)
                .with_index(slot)
                .with_data(scope_number),
            node.line(),
        )?;
        Ok(())
    }

    fn handle_return_statement(
        &mut self,
        node: &IrNode,
    ) -> GenResult<()> {
        let Some(value) = node.child(0).and_then(IrNode::as_expression) else {
            self.emit(Instruction::new(Opcode::Return), node.line())?;
            return Ok(());
        };
        self.handle_expression(value)?;
        let type_id = self.node_type_id(value)?;
        self.emit(
            Instruction::new(Opcode::ReturnValue).with_type(type_id),
            node.line(),
        )?;
        Ok(())
    }

    /// `break` or `continue`: placeholder jump patched when the loop closes
    fn handle_jump_statement(
        &mut self,
        node: &IrNode,
        opcode: Opcode,
    ) -> GenResult<()> {
        let scope_number = self
            .loops
            .last()
            .map(|l| l.scope_number)
            .ok_or_else(|| malformed(node.line(), format!("'{}' outside a loop", node.text())))?;
        let pc = self.emit(
            Instruction::new(opcode).with_data(scope_number),
            node.line(),
        )?;
        if let Some(innermost) = self.loops.last_mut() {
            if opcode == Opcode::Break {
                innermost.break_pcs.push(pc);
            } else {
                innermost.continue_pcs.push(pc);
            }
        }
        Ok(())
    }

    fn handle_assignment(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let lhs = super::operand(node, 0)?;
        let rhs = super::operand(node, 1)?;
        match Target::of(lhs)? {
            Target::Variable(variable) => {
                let (slot, type_id) = self.variable_slot(variable, lhs.line)?;
                self.handle_expression(rhs)?;
                self.emit(
                    Instruction::new(Opcode::PopToVariable)
                        .with_type(type_id)
                        .with_index(slot),
                    lhs.line,
                )?;
            }
            Target::Indexed {
                node: element,
                container,
                indices,
            } => {
                self.handle_indexed_operands(container, &indices)?;
                self.handle_expression(rhs)?;
                let setter = self.function_id(super::function_of(node)?)?;
                self.emit(
                    Instruction::new(setter)
                        .with_type(self.node_type_id(element)?)
                        .with_data(self.node_type_id(container)?),
                    lhs.line,
                )?;
            }
            Target::Member { object, variable } => {
                self.handle_expression(object)?;
                self.handle_expression(rhs)?;
                self.emit_pop_to_member(lhs, object, variable)?;
            }
        }
        Ok(())
    }

    fn handle_inplace_assignment(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let lhs = super::operand(node, 0)?;
        let rhs = super::operand(node, 1)?;
        let rhs_type_id = self.node_type_id(rhs)?;
        match Target::of(lhs)? {
            Target::Variable(variable) => {
                let (slot, type_id) = self.variable_slot(variable, lhs.line)?;
                let primitive = variable.ty().map_or(true, |t| t.is_primitive());
                let opcode = variable_inplace_opcode(node.kind, primitive, type_id, rhs_type_id)
                    .ok_or_else(|| malformed(node.line, "unknown in-place operator"))?;
                self.handle_expression(rhs)?;
                self.emit(
                    Instruction::new(opcode)
                        .with_type(type_id)
                        .with_index(slot)
                        .with_data(rhs_type_id),
                    lhs.line,
                )?;
            }
            Target::Indexed {
                node: element,
                container,
                indices,
            } => {
                let type_id = self.node_type_id(element)?;
                let container_type_id = self.node_type_id(container)?;
                let primitive = self.node_type(element)?.is_primitive();
                self.handle_indexed_operands(container, &indices)?;
                self.emit(
                    Instruction::new(Opcode::Duplicate).with_data(1 + indices.len() as u16),
                    lhs.line,
                )?;
                let getter = self.function_id(super::function_of(element)?)?;
                self.emit(
                    Instruction::new(getter)
                        .with_type(type_id)
                        .with_data(container_type_id),
                    lhs.line,
                )?;
                self.handle_expression(rhs)?;
                let opcode = stack_inplace_opcode(node.kind, primitive, type_id, rhs_type_id)
                    .ok_or_else(|| malformed(node.line, "unknown in-place operator"))?;
                self.emit(
                    Instruction::new(opcode)
                        .with_type(type_id)
                        .with_data(rhs_type_id),
                    lhs.line,
                )?;
                let setter = self.function_id(super::function_of(node)?)?;
                self.emit(
                    Instruction::new(setter)
                        .with_type(type_id)
                        .with_data(container_type_id),
                    lhs.line,
                )?;
            }
            Target::Member { object, variable } => {
                let type_id = self.variable_type_id(variable, lhs.line)?;
                let primitive = variable.ty().map_or(true, |t| t.is_primitive());
                self.handle_expression(object)?;
                self.emit(Instruction::new(Opcode::Duplicate).with_data(1), lhs.line)?;
                self.emit_push_member(lhs, object, variable)?;
                self.handle_expression(rhs)?;
                let opcode = stack_inplace_opcode(node.kind, primitive, type_id, rhs_type_id)
                    .ok_or_else(|| malformed(node.line, "unknown in-place operator"))?;
                self.emit(
                    Instruction::new(opcode)
                        .with_type(type_id)
                        .with_data(rhs_type_id),
                    lhs.line,
                )?;
                self.emit_pop_to_member(lhs, object, variable)?;
            }
        }
        Ok(())
    }

    /// Push a container and its indices
    pub(super) fn handle_indexed_operands(
        &mut self,
        container: &IrExpressionNode,
        indices: &[&IrExpressionNode],
    ) -> GenResult<()> {
        self.handle_expression(container)?;
        for index in indices {
            self.handle_expression(index)?;
        }
        Ok(())
    }

    /// Struct type owning the member read or written through `access`
    pub(super) fn owner_type_id(
        &self,
        access: &IrExpressionNode,
        object: &IrExpressionNode,
    ) -> GenResult<TypeId> {
        match &access.owner {
            Some(owner) => self.type_id(owner),
            None => self.node_type_id(object),
        }
    }

    pub(super) fn emit_push_member(
        &mut self,
        access: &IrExpressionNode,
        object: &IrExpressionNode,
        variable: &IrVariableRef,
    ) -> GenResult<u16> {
        let slot = self.member_slot(variable, access.line)?;
        let type_id = self.variable_type_id(variable, access.line)?;
        let owner = self.owner_type_id(access, object)?;
        self.emit(
            Instruction::new(Opcode::PushMemberVariable)
                .with_index(slot)
                .with_type(type_id)
                .with_data(owner),
            access.line,
        )
    }

    pub(super) fn emit_pop_to_member(
        &mut self,
        access: &IrExpressionNode,
        object: &IrExpressionNode,
        variable: &IrVariableRef,
    ) -> GenResult<u16> {
        let slot = self.member_slot(variable, access.line)?;
        let type_id = self.variable_type_id(variable, access.line)?;
        let owner = self.owner_type_id(access, object)?;
        self.emit(
            Instruction::new(Opcode::PopToMemberVariable)
                .with_index(slot)
                .with_type(type_id)
                .with_data(owner),
            access.line,
        )
    }
}

/// Expression child `index` of a block header
fn header_child(
    block: &IrBlockNode,
    index: usize,
) -> GenResult<&IrExpressionNode> {
    block
        .child(index)
        .and_then(IrNode::as_expression)
        .ok_or_else(|| {
            malformed(
                block.line,
                format!("{:?} is missing expression child {}", block.kind, index),
            )
        })
}

/// In-place opcode applied to a local slot
fn variable_inplace_opcode(
    kind: NodeKind,
    primitive: bool,
    lhs_type_id: TypeId,
    rhs_type_id: TypeId,
) -> Option<Opcode> {
    let [primitive_op, object_op, right_op] = match kind {
        NodeKind::InplaceAdd => [
            Opcode::VariablePrimitiveInplaceAdd,
            Opcode::VariableObjectInplaceAdd,
            Opcode::VariableObjectInplaceRightAdd,
        ],
        NodeKind::InplaceSubtract => [
            Opcode::VariablePrimitiveInplaceSubtract,
            Opcode::VariableObjectInplaceSubtract,
            Opcode::VariableObjectInplaceRightSubtract,
        ],
        NodeKind::InplaceMultiply => [
            Opcode::VariablePrimitiveInplaceMultiply,
            Opcode::VariableObjectInplaceMultiply,
            Opcode::VariableObjectInplaceRightMultiply,
        ],
        NodeKind::InplaceDivide => [
            Opcode::VariablePrimitiveInplaceDivide,
            Opcode::VariableObjectInplaceDivide,
            Opcode::VariableObjectInplaceRightDivide,
        ],
        NodeKind::InplaceModulo => return Some(Opcode::VariablePrimitiveInplaceModulo),
        _ => return None,
    };
    Some(select_inplace(primitive, lhs_type_id, rhs_type_id, primitive_op, object_op, right_op))
}

/// In-place opcode applied to a value already fetched onto the stack
fn stack_inplace_opcode(
    kind: NodeKind,
    primitive: bool,
    lhs_type_id: TypeId,
    rhs_type_id: TypeId,
) -> Option<Opcode> {
    let [primitive_op, object_op, right_op] = match kind {
        NodeKind::InplaceAdd => [Opcode::PrimitiveAdd, Opcode::ObjectAdd, Opcode::ObjectRightAdd],
        NodeKind::InplaceSubtract => [
            Opcode::PrimitiveSubtract,
            Opcode::ObjectSubtract,
            Opcode::ObjectRightSubtract,
        ],
        NodeKind::InplaceMultiply => [
            Opcode::PrimitiveMultiply,
            Opcode::ObjectMultiply,
            Opcode::ObjectRightMultiply,
        ],
        NodeKind::InplaceDivide => [
            Opcode::PrimitiveDivide,
            Opcode::ObjectDivide,
            Opcode::ObjectRightDivide,
        ],
        NodeKind::InplaceModulo => return Some(Opcode::PrimitiveModulo),
        _ => return None,
    };
    Some(select_inplace(primitive, lhs_type_id, rhs_type_id, primitive_op, object_op, right_op))
}

fn select_inplace(
    primitive: bool,
    lhs_type_id: TypeId,
    rhs_type_id: TypeId,
    primitive_op: Opcode,
    object_op: Opcode,
    right_op: Opcode,
) -> Opcode {
    if primitive {
        primitive_op
    } else if lhs_type_id == rhs_type_id {
        object_op
    } else {
        right_op
    }
}
