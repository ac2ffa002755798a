//! Syntax tree types
//!
//! Three node shapes share one header (kind, text, line, children). Child
//! slots are `Option` because several statements have legitimately absent
//! parts: the annotations of an unannotated function, the `sharded`
//! modifier of a persistent statement, a missing return type, the key list and
//! alias of a `use` statement.

use std::fmt;

use crate::frontend::analyser::symbols::{FunctionRef, TypeRef, VariableRef};

/// Node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Unknown,
    Root,
    File,
    PersistentStatement,
    ContractDefinition,
    ContractFunctionPrototype,
    StructDefinition,
    MemberVarDeclaration,
    FunctionDefinition,
    Annotations,
    Annotation,
    AnnotationNameValuePair,
    WhileStatement,
    ForStatement,
    IfStatement,
    If,
    ElseIf,
    Else,
    ContractStatement,
    UseStatement,
    UseStatementKeyList,
    UseAnyStatement,
    VarDeclarationStatement,
    VarDeclarationTypedAssignmentStatement,
    VarDeclarationTypelessAssignmentStatement,
    ReturnStatement,
    BreakStatement,
    ContinueStatement,
    Assign,
    InplaceAdd,
    InplaceSubtract,
    InplaceMultiply,
    InplaceDivide,
    InplaceModulo,
    Identifier,
    Template,
    Integer8,
    UnsignedInteger8,
    Integer16,
    UnsignedInteger16,
    Integer32,
    UnsignedInteger32,
    Integer64,
    UnsignedInteger64,
    Float32,
    Float64,
    Fixed32,
    Fixed64,
    Fixed128,
    String,
    True,
    False,
    Null,
    InitialiserList,
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    And,
    Or,
    Not,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Negate,
    UnaryPlus,
    PrefixInc,
    PrefixDec,
    PostfixInc,
    PostfixDec,
    Index,
    Dot,
    Invoke,
    Parenthesis,
}

impl NodeKind {
    pub fn is_block_kind(&self) -> bool {
        matches!(
            self,
            NodeKind::Root
                | NodeKind::File
                | NodeKind::ContractDefinition
                | NodeKind::StructDefinition
                | NodeKind::FunctionDefinition
                | NodeKind::WhileStatement
                | NodeKind::ForStatement
                | NodeKind::If
                | NodeKind::ElseIf
                | NodeKind::Else
        )
    }

    pub fn is_assignment(&self) -> bool {
        matches!(
            self,
            NodeKind::Assign
                | NodeKind::InplaceAdd
                | NodeKind::InplaceSubtract
                | NodeKind::InplaceMultiply
                | NodeKind::InplaceDivide
                | NodeKind::InplaceModulo
        )
    }

    pub fn is_numeric_literal(&self) -> bool {
        matches!(
            self,
            NodeKind::Integer8
                | NodeKind::UnsignedInteger8
                | NodeKind::Integer16
                | NodeKind::UnsignedInteger16
                | NodeKind::Integer32
                | NodeKind::UnsignedInteger32
                | NodeKind::Integer64
                | NodeKind::UnsignedInteger64
                | NodeKind::Float32
                | NodeKind::Float64
                | NodeKind::Fixed32
                | NodeKind::Fixed64
                | NodeKind::Fixed128
        )
    }
}

/// What an expression denotes, as decided by the analyser
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExpressionKind {
    #[default]
    Unknown,
    /// A named variable (assignable)
    Variable,
    /// Assignable non-variable, e.g. an indexed element or a member
    LV,
    /// Value-only
    RV,
    /// A type name, as in `Array<Int32>(4)`
    Type,
    /// An unresolved overload set awaiting invocation
    FunctionGroup,
}

/// Leaf or simple compound statement
#[derive(Debug, Clone)]
pub struct BasicNode {
    pub kind: NodeKind,
    pub text: String,
    pub line: u16,
    pub children: Vec<Option<Node>>,
}

/// Statement that owns an ordered body
#[derive(Debug, Clone)]
pub struct BlockNode {
    pub kind: NodeKind,
    pub text: String,
    pub line: u16,
    pub children: Vec<Option<Node>>,
    pub block_children: Vec<Node>,
    pub terminator_text: String,
    pub terminator_line: u16,
}

/// Expression with analyser annotations
#[derive(Debug, Clone)]
pub struct ExpressionNode {
    pub kind: NodeKind,
    pub text: String,
    pub line: u16,
    pub children: Vec<Option<Node>>,
    pub expression_kind: ExpressionKind,
    pub ty: Option<TypeRef>,
    pub variable: Option<VariableRef>,
    pub function: Option<FunctionRef>,
    /// Type that owns the member being accessed
    pub owner: Option<TypeRef>,
    pub function_invoked_on_instance: bool,
}

#[derive(Debug, Clone)]
pub enum Node {
    Basic(BasicNode),
    Block(BlockNode),
    Expression(ExpressionNode),
}

impl BasicNode {
    pub fn new(
        kind: NodeKind,
        text: impl Into<String>,
        line: u16,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            children: Vec::new(),
        }
    }
}

impl BlockNode {
    pub fn new(
        kind: NodeKind,
        text: impl Into<String>,
        line: u16,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            children: Vec::new(),
            block_children: Vec::new(),
            terminator_text: String::new(),
            terminator_line: 0,
        }
    }

    /// Present child at `index`
    pub fn child(
        &self,
        index: usize,
    ) -> Option<&Node> {
        self.children.get(index).and_then(Option::as_ref)
    }
}

impl ExpressionNode {
    pub fn new(
        kind: NodeKind,
        text: impl Into<String>,
        line: u16,
    ) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            children: Vec::new(),
            expression_kind: ExpressionKind::Unknown,
            ty: None,
            variable: None,
            function: None,
            owner: None,
            function_invoked_on_instance: false,
        }
    }

    pub fn with_children(
        mut self,
        children: Vec<ExpressionNode>,
    ) -> Self {
        self.children = children
            .into_iter()
            .map(|c| Some(Node::Expression(c)))
            .collect();
        self
    }

    /// Operand `index` of an operator or invocation
    pub fn operand(
        &self,
        index: usize,
    ) -> Option<&ExpressionNode> {
        self.children
            .get(index)
            .and_then(Option::as_ref)
            .and_then(Node::as_expression)
    }

    pub fn operand_mut(
        &mut self,
        index: usize,
    ) -> Option<&mut ExpressionNode> {
        self.children
            .get_mut(index)
            .and_then(Option::as_mut)
            .and_then(Node::as_expression_mut)
    }

    pub fn operands(&self) -> impl Iterator<Item = &ExpressionNode> {
        self.children
            .iter()
            .filter_map(|c| c.as_ref().and_then(Node::as_expression))
    }
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Basic(n) => n.kind,
            Node::Block(n) => n.kind,
            Node::Expression(n) => n.kind,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Node::Basic(n) => &n.text,
            Node::Block(n) => &n.text,
            Node::Expression(n) => &n.text,
        }
    }

    pub fn line(&self) -> u16 {
        match self {
            Node::Basic(n) => n.line,
            Node::Block(n) => n.line,
            Node::Expression(n) => n.line,
        }
    }

    pub fn children(&self) -> &[Option<Node>] {
        match self {
            Node::Basic(n) => &n.children,
            Node::Block(n) => &n.children,
            Node::Expression(n) => &n.children,
        }
    }

    pub fn children_mut(&mut self) -> &mut Vec<Option<Node>> {
        match self {
            Node::Basic(n) => &mut n.children,
            Node::Block(n) => &mut n.children,
            Node::Expression(n) => &mut n.children,
        }
    }

    /// Present child at `index`
    pub fn child(
        &self,
        index: usize,
    ) -> Option<&Node> {
        self.children().get(index).and_then(Option::as_ref)
    }

    pub fn as_block(&self) -> Option<&BlockNode> {
        match self {
            Node::Block(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_block_mut(&mut self) -> Option<&mut BlockNode> {
        match self {
            Node::Block(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_expression(&self) -> Option<&ExpressionNode> {
        match self {
            Node::Expression(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_expression_mut(&mut self) -> Option<&mut ExpressionNode> {
        match self {
            Node::Expression(n) => Some(n),
            _ => None,
        }
    }

    pub fn is_block(&self) -> bool {
        matches!(self, Node::Block(_))
    }

    pub fn is_expression(&self) -> bool {
        matches!(self, Node::Expression(_))
    }
}

impl From<BasicNode> for Node {
    fn from(node: BasicNode) -> Self {
        Node::Basic(node)
    }
}

impl From<BlockNode> for Node {
    fn from(node: BlockNode) -> Self {
        Node::Block(node)
    }
}

impl From<ExpressionNode> for Node {
    fn from(node: ExpressionNode) -> Self {
        Node::Expression(node)
    }
}

fn write_node(
    f: &mut fmt::Formatter<'_>,
    node: &Node,
    depth: usize,
) -> fmt::Result {
    let indent = "  ".repeat(depth);
    writeln!(
        f,
        "{}{:?} '{}' (line {})",
        indent,
        node.kind(),
        node.text(),
        node.line()
    )?;
    for child in node.children() {
        match child {
            Some(child) => write_node(f, child, depth + 1)?,
            None => writeln!(f, "{}  -", indent)?,
        }
    }
    if let Node::Block(block) = node {
        write_block_body(f, block, depth)?;
    }
    Ok(())
}

fn write_block_body(
    f: &mut fmt::Formatter<'_>,
    block: &BlockNode,
    depth: usize,
) -> fmt::Result {
    for child in &block.block_children {
        write_node(f, child, depth + 1)?;
    }
    if !block.terminator_text.is_empty() {
        writeln!(
            f,
            "{}{} (line {})",
            "  ".repeat(depth),
            block.terminator_text,
            block.terminator_line
        )?;
    }
    Ok(())
}

/// Indented dump used by `etchc tree`
impl fmt::Display for Node {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write_node(f, self, 0)
    }
}

impl fmt::Display for BlockNode {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        writeln!(f, "{:?} '{}' (line {})", self.kind, self.text, self.line)?;
        for child in self.children.iter().flatten() {
            write_node(f, child, 1)?;
        }
        write_block_body(f, self, 0)
    }
}
