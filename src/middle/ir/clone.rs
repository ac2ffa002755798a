//! Deep copy of an IR graph
//!
//! Uses the same register-before-recurse table as construction, so sharing
//! among the originals is reproduced among the clones and self-referential
//! types terminate.

use std::rc::Rc;

use super::table::{copy, Copyable, EntityTable};
use super::{
    IrBasicNode, IrBlockNode, IrExpressionNode, IrFunction, IrGraph, IrNode, IrType, IrVariable,
};

#[derive(Default)]
struct Cloner {
    types: EntityTable<IrType, IrType>,
    variables: EntityTable<IrVariable, IrVariable>,
    functions: EntityTable<IrFunction, IrFunction>,
}

impl Copyable<Cloner> for IrType {
    type Target = IrType;

    fn table(cx: &mut Cloner) -> &mut EntityTable<Self, IrType> {
        &mut cx.types
    }

    fn shell(&self) -> Rc<IrType> {
        IrType::new(self.kind, self.name.as_str())
    }

    fn link(
        &self,
        target: &IrType,
        cx: &mut Cloner,
    ) {
        target.set_template_type(self.template_type().map(|t| copy(cx, &t)));
        target.set_parameter_types(
            self.parameter_types()
                .iter()
                .map(|t| copy(cx, t))
                .collect(),
        );
    }
}

impl Copyable<Cloner> for IrVariable {
    type Target = IrVariable;

    fn table(cx: &mut Cloner) -> &mut EntityTable<Self, IrVariable> {
        &mut cx.variables
    }

    fn shell(&self) -> Rc<IrVariable> {
        IrVariable::new(self.kind, self.name.as_str(), self.referenced)
    }

    fn link(
        &self,
        target: &IrVariable,
        cx: &mut Cloner,
    ) {
        target.set_ty(self.ty().map(|t| copy(cx, &t)));
    }
}

impl Copyable<Cloner> for IrFunction {
    type Target = IrFunction;

    fn table(cx: &mut Cloner) -> &mut EntityTable<Self, IrFunction> {
        &mut cx.functions
    }

    fn shell(&self) -> Rc<IrFunction> {
        IrFunction::new(self.kind, self.name.as_str(), self.unique_name.as_str())
    }

    fn link(
        &self,
        target: &IrFunction,
        cx: &mut Cloner,
    ) {
        let parameter_types = self
            .parameter_types()
            .iter()
            .map(|t| copy(cx, t))
            .collect();
        let parameter_variables = self
            .parameter_variables()
            .iter()
            .map(|v| copy(cx, v))
            .collect();
        let return_type = self.return_type().map(|t| copy(cx, &t));
        target.set_signature(parameter_types, parameter_variables, return_type);
    }
}

impl Cloner {
    fn children(
        &mut self,
        children: &[Option<IrNode>],
    ) -> Vec<Option<IrNode>> {
        children
            .iter()
            .map(|c| c.as_ref().map(|n| self.node(n)))
            .collect()
    }

    fn node(
        &mut self,
        node: &IrNode,
    ) -> IrNode {
        match node {
            IrNode::Basic(n) => IrNode::Basic(IrBasicNode {
                kind: n.kind,
                text: n.text.clone(),
                line: n.line,
                children: self.children(&n.children),
            }),
            IrNode::Block(n) => IrNode::Block(self.block(n)),
            IrNode::Expression(n) => IrNode::Expression(self.expression(n)),
        }
    }

    fn block(
        &mut self,
        node: &IrBlockNode,
    ) -> IrBlockNode {
        IrBlockNode {
            kind: node.kind,
            text: node.text.clone(),
            line: node.line,
            children: self.children(&node.children),
            block_children: node.block_children.iter().map(|c| self.node(c)).collect(),
            terminator_text: node.terminator_text.clone(),
            terminator_line: node.terminator_line,
        }
    }

    fn expression(
        &mut self,
        node: &IrExpressionNode,
    ) -> IrExpressionNode {
        IrExpressionNode {
            kind: node.kind,
            text: node.text.clone(),
            line: node.line,
            children: self.children(&node.children),
            expression_kind: node.expression_kind,
            ty: node.ty.as_ref().map(|t| copy(self, t)),
            variable: node.variable.as_ref().map(|v| copy(self, v)),
            function: node.function.as_ref().map(|f| copy(self, f)),
            owner: node.owner.as_ref().map(|t| copy(self, t)),
            function_invoked_on_instance: node.function_invoked_on_instance,
        }
    }
}

impl Clone for IrGraph {
    /// Independent copy sharing no entity with `self`
    ///
    /// The entity lists keep their order, so a clone generates the same
    /// executable as its original.
    fn clone(&self) -> Self {
        let mut cloner = Cloner::default();
        for ty in &self.types {
            copy(&mut cloner, ty);
        }
        for variable in &self.variables {
            copy(&mut cloner, variable);
        }
        for function in &self.functions {
            copy(&mut cloner, function);
        }
        let root = cloner.block(&self.root);
        IrGraph {
            root,
            types: self.types.iter().map(|t| copy(&mut cloner, t)).collect(),
            variables: self.variables.iter().map(|v| copy(&mut cloner, v)).collect(),
            functions: self.functions.iter().map(|f| copy(&mut cloner, f)).collect(),
        }
    }
}
