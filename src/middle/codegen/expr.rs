//! Expression generation

use super::stmt::{strip_quotes, Target};
use super::{is_instance_call, malformed, operand, GenResult, Generator};
use crate::frontend::analyser::{FunctionKind, VariableKind};
use crate::frontend::lexer::numeric_body;
use crate::frontend::parser::ast::NodeKind;
use crate::middle::ir::IrExpressionNode;
use crate::vm::{Constant, Instruction, LargeConstant, Opcode, TypeId, TypeIds};

/// Opcode family of an arithmetic operator
struct Arithmetic {
    primitive: Opcode,
    object: Opcode,
    object_left: Opcode,
    object_right: Opcode,
}

fn arithmetic(kind: NodeKind) -> Option<Arithmetic> {
    let [primitive, object, object_left, object_right] = match kind {
        NodeKind::Add => [
            Opcode::PrimitiveAdd,
            Opcode::ObjectAdd,
            Opcode::ObjectLeftAdd,
            Opcode::ObjectRightAdd,
        ],
        NodeKind::Subtract => [
            Opcode::PrimitiveSubtract,
            Opcode::ObjectSubtract,
            Opcode::ObjectLeftSubtract,
            Opcode::ObjectRightSubtract,
        ],
        NodeKind::Multiply => [
            Opcode::PrimitiveMultiply,
            Opcode::ObjectMultiply,
            Opcode::ObjectLeftMultiply,
            Opcode::ObjectRightMultiply,
        ],
        NodeKind::Divide => [
            Opcode::PrimitiveDivide,
            Opcode::ObjectDivide,
            Opcode::ObjectLeftDivide,
            Opcode::ObjectRightDivide,
        ],
        _ => return None,
    };
    Some(Arithmetic {
        primitive,
        object,
        object_left,
        object_right,
    })
}

/// `(primitive, object)` opcodes of a comparison operator
fn comparison(kind: NodeKind) -> Option<(Opcode, Opcode)> {
    let pair = match kind {
        NodeKind::Equal => (Opcode::PrimitiveEqual, Opcode::ObjectEqual),
        NodeKind::NotEqual => (Opcode::PrimitiveNotEqual, Opcode::ObjectNotEqual),
        NodeKind::LessThan => (Opcode::PrimitiveLessThan, Opcode::ObjectLessThan),
        NodeKind::LessThanOrEqual => (
            Opcode::PrimitiveLessThanOrEqual,
            Opcode::ObjectLessThanOrEqual,
        ),
        NodeKind::GreaterThan => (Opcode::PrimitiveGreaterThan, Opcode::ObjectGreaterThan),
        NodeKind::GreaterThanOrEqual => (
            Opcode::PrimitiveGreaterThanOrEqual,
            Opcode::ObjectGreaterThanOrEqual,
        ),
        _ => return None,
    };
    Some(pair)
}

/// Bit pattern of a numeric literal, or `None` if the text does not parse
///
/// Integers wrap to the width of their type and are stored sign-extended.
/// Fixed-point values go through `f64` and are truncated to the raw
/// representation.
fn literal_bits(
    kind: NodeKind,
    text: &str,
) -> Option<(TypeId, u64)> {
    let body = numeric_body(text);
    let integer = || body.parse::<i128>().ok();
    let real = || body.parse::<f64>().ok();
    let constant = match kind {
        NodeKind::Integer8 => (TypeIds::INT8, integer()? as i8 as i64 as u64),
        NodeKind::UnsignedInteger8 => (TypeIds::UINT8, integer()? as u8 as u64),
        NodeKind::Integer16 => (TypeIds::INT16, integer()? as i16 as i64 as u64),
        NodeKind::UnsignedInteger16 => (TypeIds::UINT16, integer()? as u16 as u64),
        NodeKind::Integer32 => (TypeIds::INT32, integer()? as i32 as i64 as u64),
        NodeKind::UnsignedInteger32 => (TypeIds::UINT32, integer()? as u32 as u64),
        NodeKind::Integer64 => (TypeIds::INT64, integer()? as i64 as u64),
        NodeKind::UnsignedInteger64 => (TypeIds::UINT64, integer()? as u64),
        NodeKind::Float32 => (TypeIds::FLOAT32, u64::from((real()? as f32).to_bits())),
        NodeKind::Float64 => (TypeIds::FLOAT64, real()?.to_bits()),
        NodeKind::Fixed32 => (
            TypeIds::FIXED32,
            (real()? * 65_536.0) as i32 as i64 as u64,
        ),
        NodeKind::Fixed64 => (
            TypeIds::FIXED64,
            (real()? * 4_294_967_296.0) as i64 as u64,
        ),
        _ => return None,
    };
    Some(constant)
}

fn fixed128_raw(text: &str) -> Option<i128> {
    let value = numeric_body(text).parse::<f64>().ok()?;
    Some((value * 18_446_744_073_709_551_616.0) as i128)
}

impl<'a> Generator<'a> {
    /// Emit code leaving the value of `node` on the stack
    pub(super) fn handle_expression(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        match node.kind {
            NodeKind::Identifier => self.handle_identifier(node),
            NodeKind::Fixed128 => {
                let raw = fixed128_raw(&node.text).ok_or_else(|| {
                    malformed(node.line, format!("invalid literal '{}'", node.text))
                })?;
                let index = self.add_large_constant(LargeConstant { raw })?;
                self.emit(
                    Instruction::new(Opcode::PushLargeConstant).with_index(index),
                    node.line,
                )?;
                Ok(())
            }
            kind if kind.is_numeric_literal() => {
                let (type_id, bits) = literal_bits(kind, &node.text).ok_or_else(|| {
                    malformed(node.line, format!("invalid literal '{}'", node.text))
                })?;
                let index = self.add_constant(Constant { type_id, bits })?;
                self.emit(
                    Instruction::new(Opcode::PushConstant).with_index(index),
                    node.line,
                )?;
                Ok(())
            }
            NodeKind::String => {
                self.push_string(strip_quotes(&node.text), node.line)?;
                Ok(())
            }
            NodeKind::True => self.emit_simple(Opcode::PushTrue, node.line),
            NodeKind::False => self.emit_simple(Opcode::PushFalse, node.line),
            NodeKind::Null => {
                let type_id = self.node_type_id(node)?;
                self.emit(
                    Instruction::new(Opcode::PushNull).with_type(type_id),
                    node.line,
                )?;
                Ok(())
            }
            NodeKind::InitialiserList => self.handle_initialiser_list(node),
            NodeKind::PrefixInc
            | NodeKind::PrefixDec
            | NodeKind::PostfixInc
            | NodeKind::PostfixDec => self.handle_prefix_postfix(node),
            NodeKind::Add
            | NodeKind::Subtract
            | NodeKind::Multiply
            | NodeKind::Divide
            | NodeKind::Modulo
            | NodeKind::Equal
            | NodeKind::NotEqual
            | NodeKind::LessThan
            | NodeKind::LessThanOrEqual
            | NodeKind::GreaterThan
            | NodeKind::GreaterThanOrEqual => self.handle_binary(node),
            NodeKind::And | NodeKind::Or => {
                self.handle_short_circuit(NodeKind::Unknown, node)?;
                Ok(())
            }
            NodeKind::Negate | NodeKind::Not => self.handle_unary(node),
            NodeKind::UnaryPlus | NodeKind::Parenthesis => {
                self.handle_expression(operand(node, 0)?)
            }
            NodeKind::Index => self.handle_index(node),
            NodeKind::Dot => self.handle_dot(node),
            NodeKind::Invoke => self.handle_invoke(node),
            kind => Err(malformed(
                node.line,
                format!("unexpected {:?} in expression", kind),
            )),
        }
    }

    fn emit_simple(
        &mut self,
        opcode: Opcode,
        line: u16,
    ) -> GenResult<()> {
        self.emit(Instruction::new(opcode), line)?;
        Ok(())
    }

    pub(super) fn push_string(
        &mut self,
        text: &str,
        line: u16,
    ) -> GenResult<u16> {
        let index = self.add_string(text)?;
        self.emit(Instruction::new(Opcode::PushString).with_index(index), line)
    }

    fn handle_identifier(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let variable = super::variable_of(node)?;
        if variable.kind == VariableKind::Member {
            return Err(malformed(
                node.line,
                format!("member '{}' read without an object", variable.name),
            ));
        }
        let (slot, type_id) = self.variable_slot(variable, node.line)?;
        self.emit(
            Instruction::new(Opcode::PushVariable)
                .with_type(type_id)
                .with_index(slot),
            node.line,
        )?;
        Ok(())
    }

    fn handle_initialiser_list(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let ty = self.node_type(node)?;
        let is_array = ty.is_instantiation()
            && ty.template_type().is_some_and(|t| t.name == "Array")
            && !ty.parameter_types().is_empty();
        if !is_array {
            return Err(malformed(
                node.line,
                format!("initialiser list of non-array type '{}'", ty.name),
            ));
        }
        let type_id = self.type_id(ty)?;
        let mut count: u16 = 0;
        for element in node.operands() {
            self.handle_expression(element)?;
            count += 1;
        }
        self.emit(
            Instruction::new(Opcode::InitialiseArray)
                .with_type(type_id)
                .with_data(count),
            node.line,
        )?;
        Ok(())
    }

    fn handle_binary(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let lhs = operand(node, 0)?;
        let rhs = operand(node, 1)?;
        self.handle_expression(lhs)?;
        self.handle_expression(rhs)?;

        let lhs_primitive = self.node_type(lhs)?.is_primitive();
        let node_type_id = self.node_type_id(node)?;
        let lhs_type_id = self.node_type_id(lhs)?;
        let rhs_type_id = self.node_type_id(rhs)?;

        let (opcode, type_id, data) = if let Some(ops) = arithmetic(node.kind) {
            if lhs_type_id != node_type_id {
                (ops.object_left, lhs_type_id, rhs_type_id)
            } else if rhs_type_id != node_type_id {
                (ops.object_right, rhs_type_id, lhs_type_id)
            } else if lhs_primitive {
                (ops.primitive, lhs_type_id, lhs_type_id)
            } else {
                (ops.object, lhs_type_id, lhs_type_id)
            }
        } else if let Some((primitive, object)) = comparison(node.kind) {
            let opcode = if lhs_primitive { primitive } else { object };
            (opcode, lhs_type_id, lhs_type_id)
        } else {
            (Opcode::PrimitiveModulo, lhs_type_id, lhs_type_id)
        };

        self.emit(
            Instruction::new(opcode).with_type(type_id).with_data(data),
            node.line,
        )?;
        Ok(())
    }

    fn handle_unary(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let value = operand(node, 0)?;
        let opcode = match node.kind {
            NodeKind::Not => Opcode::Not,
            _ if self.node_type(value)?.is_primitive() => Opcode::PrimitiveNegate,
            _ => Opcode::ObjectNegate,
        };
        let type_id = self.node_type_id(node)?;
        self.handle_expression(value)?;
        self.emit(Instruction::new(opcode).with_type(type_id), node.line)?;
        Ok(())
    }

    fn handle_prefix_postfix(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let target = operand(node, 0)?;
        let prefix = matches!(node.kind, NodeKind::PrefixInc | NodeKind::PrefixDec);
        let increment = matches!(node.kind, NodeKind::PrefixInc | NodeKind::PostfixInc);
        let step = if increment { Opcode::Inc } else { Opcode::Dec };

        match Target::of(target)? {
            Target::Variable(variable) => {
                let opcode = match node.kind {
                    NodeKind::PrefixInc => Opcode::VariablePrefixInc,
                    NodeKind::PrefixDec => Opcode::VariablePrefixDec,
                    NodeKind::PostfixInc => Opcode::VariablePostfixInc,
                    _ => Opcode::VariablePostfixDec,
                };
                let (slot, type_id) = self.variable_slot(variable, target.line)?;
                self.emit(
                    Instruction::new(opcode)
                        .with_type(type_id)
                        .with_index(slot),
                    target.line,
                )?;
            }
            Target::Indexed {
                node: element,
                container,
                indices,
            } => {
                let type_id = self.node_type_id(element)?;
                let container_type_id = self.node_type_id(container)?;
                let depth = 1 + indices.len() as u16;
                self.handle_indexed_operands(container, &indices)?;
                self.emit(
                    Instruction::new(Opcode::Duplicate).with_data(depth),
                    target.line,
                )?;
                let getter = self.function_id(super::function_of(element)?)?;
                self.emit(
                    Instruction::new(getter)
                        .with_type(type_id)
                        .with_data(container_type_id),
                    target.line,
                )?;
                self.emit_step(prefix, step, type_id, depth, target.line)?;
                let setter = self.function_id(super::function_of(node)?)?;
                self.emit(
                    Instruction::new(setter)
                        .with_type(type_id)
                        .with_data(container_type_id),
                    target.line,
                )?;
            }
            Target::Member { object, variable } => {
                let type_id = self.variable_type_id(variable, target.line)?;
                self.handle_expression(object)?;
                self.emit(Instruction::new(Opcode::Duplicate).with_data(1), target.line)?;
                self.emit_push_member(target, object, variable)?;
                self.emit_step(prefix, step, type_id, 1, target.line)?;
                self.emit_pop_to_member(target, object, variable)?;
            }
        }
        Ok(())
    }

    /// Apply `step` to the fetched value and leave a copy of the old (postfix)
    /// or new (prefix) value below the `depth` operands of the store
    fn emit_step(
        &mut self,
        prefix: bool,
        step: Opcode,
        type_id: TypeId,
        depth: u16,
        line: u16,
    ) -> GenResult<()> {
        let step = Instruction::new(step).with_type(type_id);
        let insert = Instruction::new(Opcode::DuplicateInsert).with_data(depth);
        if prefix {
            self.emit(step, line)?;
            self.emit(insert, line)?;
        } else {
            self.emit(insert, line)?;
            self.emit(step, line)?;
        }
        Ok(())
    }

    fn handle_index(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let container = operand(node, 0)?;
        let indices: Vec<&IrExpressionNode> = node.operands().skip(1).collect();
        self.handle_indexed_operands(container, &indices)?;
        let getter = self.function_id(super::function_of(node)?)?;
        let type_id = self.node_type_id(node)?;
        let container_type_id = self.node_type_id(container)?;
        self.emit(
            Instruction::new(getter)
                .with_type(type_id)
                .with_data(container_type_id),
            node.line,
        )?;
        Ok(())
    }

    fn handle_dot(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let object = operand(node, 0)?;
        if let Some(variable) = &node.variable {
            if variable.kind == VariableKind::Member {
                self.handle_expression(object)?;
                self.emit_push_member(node, object, variable)?;
                return Ok(());
            }
        }
        // Member function or static access: push the invoker if there is one
        if object.is_value() {
            self.handle_expression(object)?;
        }
        Ok(())
    }

    /// Type id the callee is dispatched on
    fn invoker_type_id(
        &self,
        callee: &IrExpressionNode,
    ) -> GenResult<TypeId> {
        if let Some(owner) = &callee.owner {
            return self.type_id(owner);
        }
        if callee.kind == NodeKind::Dot {
            if let Some(ty) = callee.operand(0).and_then(|o| o.ty.as_ref()) {
                return self.type_id(ty);
            }
        }
        match &callee.ty {
            Some(ty) => self.type_id(ty),
            None => Ok(TypeIds::UNKNOWN),
        }
    }

    fn handle_invoke(
        &mut self,
        node: &IrExpressionNode,
    ) -> GenResult<()> {
        let callee = operand(node, 0)?;
        let function = super::function_of(node)?;
        let return_type_id = self.node_type_id(node)?;

        if callee.function_invoked_on_instance {
            self.handle_expression(callee)?;
        }
        for argument in node.operands().skip(1) {
            self.handle_expression(argument)?;
        }

        let id = self.function_id(function)?;
        let instruction = match function.kind {
            FunctionKind::UserDefinedFreeFunction => {
                Instruction::new(Opcode::InvokeUserDefinedFreeFunction).with_index(id)
            }
            FunctionKind::UserDefinedConstructor => {
                Instruction::new(Opcode::InvokeUserDefinedConstructor)
                    .with_index(id)
                    .with_data(return_type_id)
            }
            kind if is_instance_call(kind) => {
                let opcode = if kind == FunctionKind::UserDefinedContractFunction {
                    Opcode::InvokeContractFunction
                } else {
                    Opcode::InvokeUserDefinedMemberFunction
                };
                Instruction::new(opcode)
                    .with_index(id)
                    .with_data(self.invoker_type_id(callee)?)
            }
            _ => {
                // Module-bound function: the function id is the opcode
                let data = self.invoker_type_id(callee)?;
                Instruction::new(id).with_data(data)
            }
        };
        self.emit(instruction.with_type(return_type_id), node.line)?;
        Ok(())
    }
}
