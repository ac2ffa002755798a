//! Loops, conditionals and short-circuit chains

use smallvec::SmallVec;

use super::{malformed, operand, GenResult, Generator, Loop};
use crate::frontend::parser::ast::NodeKind;
use crate::middle::ir::{IrBlockNode, IrExpressionNode, IrNode};
use crate::vm::{Instruction, Opcode};

/// Placeholder jumps of an `and`/`or` run that are still waiting for a
/// destination
#[derive(Debug)]
pub(super) struct Chain {
    pub kind: NodeKind,
    pub pcs: SmallVec<[u16; 4]>,
}

impl Chain {
    pub fn none() -> Self {
        Self {
            kind: NodeKind::Unknown,
            pcs: SmallVec::new(),
        }
    }

    fn is(
        &self,
        kind: NodeKind,
    ) -> bool {
        self.kind == kind
    }
}

fn is_short_circuit(kind: NodeKind) -> bool {
    matches!(kind, NodeKind::And | NodeKind::Or)
}

/// Blocks whose condition jumps straight to a branch instead of leaving a value
fn is_condition_parent(kind: NodeKind) -> bool {
    matches!(
        kind,
        NodeKind::WhileStatement | NodeKind::If | NodeKind::ElseIf
    )
}

impl<'a> Generator<'a> {
    /// Emit `node` below `parent`, returning any unresolved chain
    fn handle_condition(
        &mut self,
        parent: NodeKind,
        node: &IrExpressionNode,
    ) -> GenResult<Chain> {
        if is_short_circuit(node.kind) {
            return self.handle_short_circuit(parent, node);
        }
        self.handle_expression(node)?;
        Ok(Chain::none())
    }

    /// Emit `lhs <jump> rhs` for an `and`/`or` node
    ///
    /// A run of the same operator shares one chain, so each operand is
    /// followed by a single jump. The chain is handed back unresolved when
    /// the parent is a condition or continues the run; otherwise it is
    /// resolved here to the instruction after the run.
    pub(super) fn handle_short_circuit(
        &mut self,
        parent: NodeKind,
        node: &IrExpressionNode,
    ) -> GenResult<Chain> {
        let lhs = operand(node, 0)?;
        let rhs = operand(node, 1)?;

        let lhs_chain = self.handle_condition(node.kind, lhs)?;
        let jump_pc = self.emit(Instruction::new(Opcode::Unknown), node.line)?;
        let rhs_chain = self.handle_condition(node.kind, rhs)?;

        let mut chain = Chain {
            kind: node.kind,
            pcs: SmallVec::new(),
        };
        chain.pcs.push(jump_pc);
        chain.pcs.extend(lhs_chain.pcs);
        chain.pcs.extend(rhs_chain.pcs);

        if is_condition_parent(parent) || parent == node.kind {
            return Ok(chain);
        }
        let destination = self.pc();
        self.finalise_chain(&chain, false, destination);
        Ok(Chain::none())
    }

    /// Give every placeholder of `chain` its opcode and `destination`
    fn finalise_chain(
        &mut self,
        chain: &Chain,
        condition: bool,
        destination: u16,
    ) {
        let opcode = match (chain.is(NodeKind::And), condition) {
            (true, true) => Opcode::JumpIfFalse,
            (false, true) => Opcode::JumpIfTrue,
            (true, false) => Opcode::JumpIfFalseOrPop,
            (false, false) => Opcode::JumpIfTrueOrPop,
        };
        for pc in &chain.pcs {
            if let Some(instruction) = self.instruction_mut(*pc) {
                instruction.opcode = opcode.code();
                instruction.index = destination;
            }
        }
    }

    /// Emit a condition followed by its `JumpIfFalse` placeholder
    fn handle_branch_condition(
        &mut self,
        block: &IrBlockNode,
    ) -> GenResult<(Chain, u16)> {
        let condition = block
            .child(0)
            .and_then(IrNode::as_expression)
            .ok_or_else(|| malformed(block.line, format!("{:?} without a condition", block.kind)))?;
        let chain = self.handle_condition(block.kind, condition)?;
        let jf_pc = self.emit(Instruction::new(Opcode::JumpIfFalse), condition.line)?;
        let body_pc = self.pc();
        if chain.is(NodeKind::Or) {
            self.finalise_chain(&chain, true, body_pc);
        }
        Ok((chain, jf_pc))
    }

    /// Close the innermost loop, pointing its `continue`s and `break`s
    fn close_loop(
        &mut self,
        continue_pc: u16,
        break_pc: u16,
    ) {
        let Some(closed) = self.loops.pop() else {
            return;
        };
        for pc in closed.continue_pcs {
            self.patch(pc, continue_pc);
        }
        for pc in closed.break_pcs {
            self.patch(pc, break_pc);
        }
    }

    pub(super) fn handle_while_statement(
        &mut self,
        block: &IrBlockNode,
    ) -> GenResult<()> {
        let condition_pc = self.pc();
        let (chain, jf_pc) = self.handle_branch_condition(block)?;

        self.scope_enter();
        let scope_number = self.scope_number();
        self.loops.push(Loop::new(scope_number));
        self.handle_block(block)?;
        self.scope_leave(block)?;

        self.emit(
            Instruction::new(Opcode::Jump).with_index(condition_pc),
            block.terminator_line,
        )?;

        let end_pc = self.pc();
        self.patch(jf_pc, end_pc);
        if chain.is(NodeKind::And) {
            self.finalise_chain(&chain, true, end_pc);
        }
        self.close_loop(condition_pc, end_pc);
        Ok(())
    }

    pub(super) fn handle_for_statement(
        &mut self,
        block: &IrBlockNode,
    ) -> GenResult<()> {
        let node = block
            .child(0)
            .and_then(IrNode::as_expression)
            .ok_or_else(|| malformed(block.line, "for without a loop variable"))?;
        let variable = super::variable_of(node)?;
        let type_id = self.variable_type_id(variable, block.line)?;
        let arity = block.children.len().saturating_sub(1) as u16;
        if !(2..=3).contains(&arity) {
            return Err(malformed(
                block.line,
                format!("for range takes 2 or 3 bounds, found {}", arity),
            ));
        }

        for i in 1..=arity as usize {
            let bound = block
                .child(i)
                .and_then(IrNode::as_expression)
                .ok_or_else(|| malformed(block.line, format!("for range bound {} missing", i)))?;
            self.handle_expression(bound)?;
        }

        self.scope_enter();
        let slot = self.add_variable(variable, type_id, false, block.line)?;

        self.emit(
            Instruction::new(Opcode::ForRangeInit)
                .with_type(type_id)
                .with_index(slot)
                .with_data(arity),
            block.line,
        )?;
        let iterate_pc = self.emit(
            Instruction::new(Opcode::ForRangeIterate).with_data(arity),
            block.line,
        )?;

        let scope_number = self.scope_number();
        self.loops.push(Loop::new(scope_number));
        self.handle_block(block)?;
        self.scope_leave(block)?;

        self.emit(
            Instruction::new(Opcode::Jump).with_index(iterate_pc),
            block.terminator_line,
        )?;
        let terminate_pc = self.emit(
            Instruction::new(Opcode::ForRangeTerminate)
                .with_type(type_id)
                .with_index(slot),
            block.terminator_line,
        )?;

        self.close_loop(iterate_pc, terminate_pc);
        self.patch(iterate_pc, terminate_pc);
        Ok(())
    }

    /// `if` / `elseif` / `else` chain; `node`'s children are the branch blocks
    pub(super) fn handle_if_statement(
        &mut self,
        node: &IrNode,
    ) -> GenResult<()> {
        let mut pending: Option<(Chain, u16)> = None;
        let mut end_jumps: SmallVec<[u16; 4]> = SmallVec::new();
        let branches: Vec<&IrBlockNode> = node
            .children()
            .iter()
            .flatten()
            .filter_map(IrNode::as_block)
            .collect();
        let last = branches.len().saturating_sub(1);

        for (i, branch) in branches.iter().enumerate() {
            // The previous condition jumps to whatever comes next
            if let Some((chain, jf_pc)) = pending.take() {
                let next_pc = self.pc();
                self.patch(jf_pc, next_pc);
                if chain.is(NodeKind::And) {
                    self.finalise_chain(&chain, true, next_pc);
                }
            }

            if branch.kind != NodeKind::Else {
                pending = Some(self.handle_branch_condition(branch)?);
            }

            self.scope_enter();
            self.handle_block(branch)?;
            self.scope_leave(branch)?;

            if branch.kind != NodeKind::Else && i < last {
                let jump_pc = self.emit(Instruction::new(Opcode::Jump), branch.terminator_line)?;
                end_jumps.push(jump_pc);
            }
        }

        let end_pc = self.pc();
        if let Some((chain, jf_pc)) = pending {
            self.patch(jf_pc, end_pc);
            if chain.is(NodeKind::And) {
                self.finalise_chain(&chain, true, end_pc);
            }
        }
        for pc in end_jumps {
            self.patch(pc, end_pc);
        }
        Ok(())
    }
}
