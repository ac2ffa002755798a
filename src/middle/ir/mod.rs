//! Intermediate representation
//!
//! The IR mirrors the annotated syntax tree, but every resolved type,
//! variable and function is interned once per graph and referenced by
//! identity. Two tree nodes that shared an entity share its IR counterpart,
//! and the same holds inside any clone of the graph.
//!
//! Entity links live behind `RefCell` so a counterpart can be registered
//! before its dependencies exist; that is what lets a type refer to itself.
//! Dropping an [`IrGraph`] clears those links so cycles do not leak.

mod builder;
mod clone;
mod table;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::frontend::analyser::{FunctionKind, VariableKind};
use crate::frontend::parser::ast::{ExpressionKind, NodeKind};
use crate::vm::TypeKind;

pub type IrTypeRef = Rc<IrType>;
pub type IrVariableRef = Rc<IrVariable>;
pub type IrFunctionRef = Rc<IrFunction>;

/// Interned type
pub struct IrType {
    pub kind: TypeKind,
    pub name: String,
    template_type: RefCell<Option<IrTypeRef>>,
    parameter_types: RefCell<Vec<IrTypeRef>>,
}

impl IrType {
    pub fn new(
        kind: TypeKind,
        name: impl Into<String>,
    ) -> IrTypeRef {
        Rc::new(Self {
            kind,
            name: name.into(),
            template_type: RefCell::new(None),
            parameter_types: RefCell::new(Vec::new()),
        })
    }

    pub fn template_type(&self) -> Option<IrTypeRef> {
        self.template_type.borrow().clone()
    }

    pub fn parameter_types(&self) -> Vec<IrTypeRef> {
        self.parameter_types.borrow().clone()
    }

    pub(crate) fn set_template_type(
        &self,
        template_type: Option<IrTypeRef>,
    ) {
        *self.template_type.borrow_mut() = template_type;
    }

    pub(crate) fn set_parameter_types(
        &self,
        parameter_types: Vec<IrTypeRef>,
    ) {
        *self.parameter_types.borrow_mut() = parameter_types;
    }

    pub fn is_primitive(&self) -> bool {
        self.kind == TypeKind::Primitive
    }

    pub fn is_void(&self) -> bool {
        self.name == "Void"
    }

    pub fn is_null(&self) -> bool {
        self.name == "Null"
    }

    pub fn is_instantiation(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::Instantiation | TypeKind::UserDefinedInstantiation
        )
    }

    /// Whether ids for this type are allocated by the generator
    pub fn is_user_defined(&self) -> bool {
        matches!(
            self.kind,
            TypeKind::UserDefinedInstantiation
                | TypeKind::UserDefinedContract
                | TypeKind::UserDefinedStruct
        )
    }

    fn reset(&self) {
        self.template_type.borrow_mut().take();
        self.parameter_types.borrow_mut().clear();
    }
}

impl fmt::Debug for IrType {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        // Links may be cyclic, print names only
        f.debug_struct("IrType")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .finish()
    }
}

/// Interned variable
pub struct IrVariable {
    pub kind: VariableKind,
    pub name: String,
    pub referenced: bool,
    ty: RefCell<Option<IrTypeRef>>,
}

impl IrVariable {
    pub fn new(
        kind: VariableKind,
        name: impl Into<String>,
        referenced: bool,
    ) -> IrVariableRef {
        Rc::new(Self {
            kind,
            name: name.into(),
            referenced,
            ty: RefCell::new(None),
        })
    }

    pub fn ty(&self) -> Option<IrTypeRef> {
        self.ty.borrow().clone()
    }

    pub(crate) fn set_ty(
        &self,
        ty: Option<IrTypeRef>,
    ) {
        *self.ty.borrow_mut() = ty;
    }

    fn reset(&self) {
        self.ty.borrow_mut().take();
    }
}

impl fmt::Debug for IrVariable {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("IrVariable")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("ty", &self.ty().map(|t| t.name.clone()))
            .finish()
    }
}

/// Interned function
pub struct IrFunction {
    pub kind: FunctionKind,
    pub name: String,
    pub unique_name: String,
    parameter_types: RefCell<Vec<IrTypeRef>>,
    parameter_variables: RefCell<Vec<IrVariableRef>>,
    return_type: RefCell<Option<IrTypeRef>>,
}

impl IrFunction {
    pub fn new(
        kind: FunctionKind,
        name: impl Into<String>,
        unique_name: impl Into<String>,
    ) -> IrFunctionRef {
        Rc::new(Self {
            kind,
            name: name.into(),
            unique_name: unique_name.into(),
            parameter_types: RefCell::new(Vec::new()),
            parameter_variables: RefCell::new(Vec::new()),
            return_type: RefCell::new(None),
        })
    }

    pub fn parameter_types(&self) -> Vec<IrTypeRef> {
        self.parameter_types.borrow().clone()
    }

    pub fn parameter_variables(&self) -> Vec<IrVariableRef> {
        self.parameter_variables.borrow().clone()
    }

    pub fn return_type(&self) -> Option<IrTypeRef> {
        self.return_type.borrow().clone()
    }

    pub(crate) fn set_signature(
        &self,
        parameter_types: Vec<IrTypeRef>,
        parameter_variables: Vec<IrVariableRef>,
        return_type: Option<IrTypeRef>,
    ) {
        *self.parameter_types.borrow_mut() = parameter_types;
        *self.parameter_variables.borrow_mut() = parameter_variables;
        *self.return_type.borrow_mut() = return_type;
    }

    /// Void or missing return type
    pub fn returns_void(&self) -> bool {
        self.return_type().map_or(true, |t| t.is_void())
    }

    fn reset(&self) {
        self.parameter_types.borrow_mut().clear();
        self.parameter_variables.borrow_mut().clear();
        self.return_type.borrow_mut().take();
    }
}

impl fmt::Debug for IrFunction {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.debug_struct("IrFunction")
            .field("kind", &self.kind)
            .field("unique_name", &self.unique_name)
            .finish()
    }
}

#[derive(Debug)]
pub struct IrBasicNode {
    pub kind: NodeKind,
    pub text: String,
    pub line: u16,
    pub children: Vec<Option<IrNode>>,
}

#[derive(Debug)]
pub struct IrBlockNode {
    pub kind: NodeKind,
    pub text: String,
    pub line: u16,
    pub children: Vec<Option<IrNode>>,
    pub block_children: Vec<IrNode>,
    pub terminator_text: String,
    pub terminator_line: u16,
}

#[derive(Debug)]
pub struct IrExpressionNode {
    pub kind: NodeKind,
    pub text: String,
    pub line: u16,
    pub children: Vec<Option<IrNode>>,
    pub expression_kind: ExpressionKind,
    pub ty: Option<IrTypeRef>,
    pub variable: Option<IrVariableRef>,
    pub function: Option<IrFunctionRef>,
    pub owner: Option<IrTypeRef>,
    pub function_invoked_on_instance: bool,
}

#[derive(Debug)]
pub enum IrNode {
    Basic(IrBasicNode),
    Block(IrBlockNode),
    Expression(IrExpressionNode),
}

impl IrBlockNode {
    pub fn child(
        &self,
        index: usize,
    ) -> Option<&IrNode> {
        self.children.get(index).and_then(Option::as_ref)
    }
}

impl IrExpressionNode {
    pub fn operand(
        &self,
        index: usize,
    ) -> Option<&IrExpressionNode> {
        self.children
            .get(index)
            .and_then(Option::as_ref)
            .and_then(IrNode::as_expression)
    }

    pub fn operands(&self) -> impl Iterator<Item = &IrExpressionNode> {
        self.children
            .iter()
            .filter_map(|c| c.as_ref().and_then(IrNode::as_expression))
    }

    /// Whether evaluating the node leaves a value on the stack
    pub fn is_value(&self) -> bool {
        matches!(
            self.expression_kind,
            ExpressionKind::Variable | ExpressionKind::LV | ExpressionKind::RV
        )
    }
}

impl IrNode {
    pub fn kind(&self) -> NodeKind {
        match self {
            IrNode::Basic(n) => n.kind,
            IrNode::Block(n) => n.kind,
            IrNode::Expression(n) => n.kind,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            IrNode::Basic(n) => &n.text,
            IrNode::Block(n) => &n.text,
            IrNode::Expression(n) => &n.text,
        }
    }

    pub fn line(&self) -> u16 {
        match self {
            IrNode::Basic(n) => n.line,
            IrNode::Block(n) => n.line,
            IrNode::Expression(n) => n.line,
        }
    }

    pub fn children(&self) -> &[Option<IrNode>] {
        match self {
            IrNode::Basic(n) => &n.children,
            IrNode::Block(n) => &n.children,
            IrNode::Expression(n) => &n.children,
        }
    }

    pub fn child(
        &self,
        index: usize,
    ) -> Option<&IrNode> {
        self.children().get(index).and_then(Option::as_ref)
    }

    pub fn as_block(&self) -> Option<&IrBlockNode> {
        match self {
            IrNode::Block(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&IrExpressionNode> {
        match self {
            IrNode::Expression(n) => Some(n),
            _ => None,
        }
    }
}

/// Deduplicated graph handed to the generator
///
/// `types` lists every interned type with dependencies ahead of the types
/// built from them; `variables` and `functions` likewise hold every
/// interned entity once.
#[derive(Debug)]
pub struct IrGraph {
    pub root: IrBlockNode,
    pub types: Vec<IrTypeRef>,
    pub variables: Vec<IrVariableRef>,
    pub functions: Vec<IrFunctionRef>,
}

impl IrGraph {
    pub fn find_type(
        &self,
        name: &str,
    ) -> Option<&IrTypeRef> {
        self.types.iter().find(|t| t.name == name)
    }

    pub fn find_function(
        &self,
        unique_name: &str,
    ) -> Option<&IrFunctionRef> {
        self.functions.iter().find(|f| f.unique_name == unique_name)
    }
}

impl Drop for IrGraph {
    fn drop(&mut self) {
        for function in &self.functions {
            function.reset();
        }
        for variable in &self.variables {
            variable.reset();
        }
        for ty in &self.types {
            ty.reset();
        }
    }
}
