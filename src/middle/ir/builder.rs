//! Annotated syntax tree to IR graph

use std::rc::Rc;

use tracing::debug;

use super::table::{copy, Copyable, EntityTable};
use super::{
    IrBasicNode, IrBlockNode, IrExpressionNode, IrFunction, IrGraph, IrNode, IrType, IrVariable,
};
use crate::frontend::analyser::{Function, Type, Variable};
use crate::frontend::parser::ast::{BasicNode, BlockNode, ExpressionNode, Node};

#[derive(Default)]
struct Builder {
    types: EntityTable<Type, IrType>,
    variables: EntityTable<Variable, IrVariable>,
    functions: EntityTable<Function, IrFunction>,
}

impl Copyable<Builder> for Type {
    type Target = IrType;

    fn table(cx: &mut Builder) -> &mut EntityTable<Self, IrType> {
        &mut cx.types
    }

    fn shell(&self) -> Rc<IrType> {
        IrType::new(self.kind, self.name.as_str())
    }

    fn link(
        &self,
        target: &IrType,
        cx: &mut Builder,
    ) {
        target.set_template_type(self.template_type.as_ref().map(|t| copy(cx, t)));
        target.set_parameter_types(self.parameter_types.iter().map(|t| copy(cx, t)).collect());
    }
}

impl Copyable<Builder> for Variable {
    type Target = IrVariable;

    fn table(cx: &mut Builder) -> &mut EntityTable<Self, IrVariable> {
        &mut cx.variables
    }

    fn shell(&self) -> Rc<IrVariable> {
        IrVariable::new(self.kind, self.name.as_str(), self.referenced.get())
    }

    fn link(
        &self,
        target: &IrVariable,
        cx: &mut Builder,
    ) {
        target.set_ty(Some(copy(cx, &self.ty)));
    }
}

impl Copyable<Builder> for Function {
    type Target = IrFunction;

    fn table(cx: &mut Builder) -> &mut EntityTable<Self, IrFunction> {
        &mut cx.functions
    }

    fn shell(&self) -> Rc<IrFunction> {
        IrFunction::new(self.kind, self.name.as_str(), self.unique_name.as_str())
    }

    fn link(
        &self,
        target: &IrFunction,
        cx: &mut Builder,
    ) {
        let parameter_types = self.parameter_types.iter().map(|t| copy(cx, t)).collect();
        let parameter_variables = self
            .parameter_variables
            .iter()
            .map(|v| copy(cx, v))
            .collect();
        let return_type = copy(cx, &self.return_type);
        target.set_signature(parameter_types, parameter_variables, Some(return_type));
    }
}

impl Builder {
    fn children(
        &mut self,
        children: &[Option<Node>],
    ) -> Vec<Option<IrNode>> {
        children
            .iter()
            .map(|c| c.as_ref().map(|n| self.node(n)))
            .collect()
    }

    fn node(
        &mut self,
        node: &Node,
    ) -> IrNode {
        match node {
            Node::Basic(n) => IrNode::Basic(self.basic(n)),
            Node::Block(n) => IrNode::Block(self.block(n)),
            Node::Expression(n) => IrNode::Expression(self.expression(n)),
        }
    }

    fn basic(
        &mut self,
        node: &BasicNode,
    ) -> IrBasicNode {
        IrBasicNode {
            kind: node.kind,
            text: node.text.clone(),
            line: node.line,
            children: self.children(&node.children),
        }
    }

    fn block(
        &mut self,
        node: &BlockNode,
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
        node: &ExpressionNode,
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

impl IrGraph {
    /// Build the graph for an annotated tree
    pub fn build(root: &BlockNode) -> IrGraph {
        let mut builder = Builder::default();
        let root = builder.block(root);
        debug!(
            "built IR: {} types, {} variables, {} functions",
            builder.types.len(),
            builder.variables.len(),
            builder.functions.len()
        );
        IrGraph {
            root,
            types: builder.types.into_order(),
            variables: builder.variables.into_order(),
            functions: builder.functions.into_order(),
        }
    }
}
