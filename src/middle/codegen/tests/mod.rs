//! Generator tests
//!
//! Trees are built the way an analyser would leave them: expression nodes
//! carry their resolved type, variable and function.


use std::rc::Rc;

use super::{GenerateError, Generator};
use crate::frontend::analyser::{
    Function, FunctionKind, FunctionRef, Type, TypeRef, Variable, VariableKind, VariableRef,
};
use crate::frontend::config::GeneratorConfig;
use crate::frontend::parser::ast::{
    BasicNode, BlockNode, ExpressionKind, ExpressionNode, Node, NodeKind,
};
use crate::middle::ir::IrGraph;
use crate::vm::{
    BuiltinBindings, Executable, Function as ExeFunction, Instruction, Opcode, TypeIds, TypeKind,
};

struct Types {
    void: TypeRef,
    boolean: TypeRef,
    int32: TypeRef,
    string: TypeRef,
}

fn types() -> Types {
    Types {
        void: Type::new(TypeKind::Primitive, "Void"),
        boolean: Type::new(TypeKind::Primitive, "Bool"),
        int32: Type::new(TypeKind::Primitive, "Int32"),
        string: Type::new(TypeKind::Class, "String"),
    }
}

fn local(
    name: &str,
    ty: &TypeRef,
) -> VariableRef {
    Variable::new(VariableKind::Local, name, ty)
}

fn parameter(
    name: &str,
    ty: &TypeRef,
) -> VariableRef {
    Variable::new(VariableKind::Parameter, name, ty)
}

fn ident(
    variable: &VariableRef,
    line: u16,
) -> ExpressionNode {
    let mut node = ExpressionNode::new(NodeKind::Identifier, variable.name.as_str(), line);
    node.expression_kind = ExpressionKind::Variable;
    node.ty = Some(Rc::clone(&variable.ty));
    node.variable = Some(Rc::clone(variable));
    node
}

fn rvalue(
    kind: NodeKind,
    text: &str,
    ty: &TypeRef,
    line: u16,
) -> ExpressionNode {
    let mut node = ExpressionNode::new(kind, text, line);
    node.expression_kind = ExpressionKind::RV;
    node.ty = Some(Rc::clone(ty));
    node
}

fn int(
    value: i32,
    types: &Types,
    line: u16,
) -> ExpressionNode {
    rvalue(NodeKind::Integer32, &value.to_string(), &types.int32, line)
}

fn boolean(
    value: bool,
    types: &Types,
    line: u16,
) -> ExpressionNode {
    let (kind, text) = if value {
        (NodeKind::True, "true")
    } else {
        (NodeKind::False, "false")
    };
    rvalue(kind, text, &types.boolean, line)
}

fn string(
    text: &str,
    types: &Types,
    line: u16,
) -> ExpressionNode {
    rvalue(NodeKind::String, &format!("\"{}\"", text), &types.string, line)
}

fn binary(
    kind: NodeKind,
    lhs: ExpressionNode,
    rhs: ExpressionNode,
    ty: &TypeRef,
) -> ExpressionNode {
    let line = lhs.line;
    rvalue(kind, "", ty, line).with_children(vec![lhs, rhs])
}

fn call(
    function: &FunctionRef,
    arguments: Vec<ExpressionNode>,
    line: u16,
) -> ExpressionNode {
    let mut callee = ExpressionNode::new(NodeKind::Identifier, function.name.as_str(), line);
    callee.expression_kind = ExpressionKind::FunctionGroup;
    let mut children = vec![callee];
    children.extend(arguments);
    let mut node = rvalue(NodeKind::Invoke, "(", &function.return_type, line).with_children(children);
    node.function = Some(Rc::clone(function));
    node
}

/// `var name = init`
fn var(
    variable: &VariableRef,
    init: ExpressionNode,
) -> Node {
    let line = init.line;
    let mut node = BasicNode::new(NodeKind::VarDeclarationTypelessAssignmentStatement, "var", line);
    node.children = vec![Some(ident(variable, line).into()), Some(init.into())];
    node.into()
}

/// `var name : T`
fn declare(
    variable: &VariableRef,
    line: u16,
) -> Node {
    let mut node = BasicNode::new(NodeKind::VarDeclarationStatement, "var", line);
    node.children = vec![Some(ident(variable, line).into()), None];
    node.into()
}

fn assign(
    kind: NodeKind,
    lhs: ExpressionNode,
    rhs: ExpressionNode,
) -> ExpressionNode {
    let line = lhs.line;
    let mut node = ExpressionNode::new(kind, "=", line).with_children(vec![lhs, rhs]);
    node.expression_kind = ExpressionKind::RV;
    node
}

fn keyword(
    kind: NodeKind,
    text: &str,
    line: u16,
) -> Node {
    BasicNode::new(kind, text, line).into()
}

fn ret(
    value: Option<ExpressionNode>,
    line: u16,
) -> Node {
    let mut node = BasicNode::new(NodeKind::ReturnStatement, "return", line);
    node.children = value.into_iter().map(|v| Some(v.into())).collect();
    node.into()
}

fn block(
    kind: NodeKind,
    text: &str,
    children: Vec<Option<Node>>,
    body: Vec<Node>,
    lines: (u16, u16),
) -> BlockNode {
    let mut node = BlockNode::new(kind, text, lines.0);
    node.children = children;
    node.block_children = body;
    node.terminator_line = lines.1;
    node
}

fn while_loop(
    condition: ExpressionNode,
    body: Vec<Node>,
    lines: (u16, u16),
) -> Node {
    block(
        NodeKind::WhileStatement,
        "while",
        vec![Some(condition.into())],
        body,
        lines,
    )
    .into()
}

/// `if`/`elseif`/`else` chain; a branch without a condition is the `else`
fn if_chain(branches: Vec<(Option<ExpressionNode>, Vec<Node>, (u16, u16))>) -> Node {
    let line = branches.first().map_or(0, |b| b.2 .0);
    let mut node = BasicNode::new(NodeKind::IfStatement, "if", line);
    for (i, (condition, body, lines)) in branches.into_iter().enumerate() {
        let kind = match (&condition, i) {
            (None, _) => NodeKind::Else,
            (Some(_), 0) => NodeKind::If,
            _ => NodeKind::ElseIf,
        };
        let children = condition.into_iter().map(|c| Some(c.into())).collect();
        node.children
            .push(Some(block(kind, "if", children, body, lines).into()));
    }
    node.into()
}

fn function_definition(
    function: &FunctionRef,
    body: Vec<Node>,
    lines: (u16, u16),
) -> Node {
    let mut name = ExpressionNode::new(NodeKind::Identifier, function.name.as_str(), lines.0);
    name.function = Some(Rc::clone(function));
    let mut children = vec![None, Some(name.into())];
    for variable in &function.parameter_variables {
        children.push(Some(ident(variable, lines.0).into()));
        children.push(None);
    }
    block(
        NodeKind::FunctionDefinition,
        "function",
        children,
        body,
        lines,
    )
    .into()
}

/// `function main() ... endfunction` spanning `lines`
fn main_function(
    types: &Types,
    body: Vec<Node>,
    lines: (u16, u16),
) -> Node {
    let main = Function::new(FunctionKind::UserDefinedFreeFunction, "main", Vec::new(), &types.void);
    function_definition(&main, body, lines)
}

fn root(statements: Vec<Node>) -> BlockNode {
    let mut file = BlockNode::new(NodeKind::File, "test.etch", 0);
    file.block_children = statements;
    let mut root = BlockNode::new(NodeKind::Root, "", 0);
    root.block_children.push(file.into());
    root
}

fn generate_with(
    tree: &BlockNode,
    bindings: &BuiltinBindings,
    config: GeneratorConfig,
) -> Result<Executable, Vec<GenerateError>> {
    let ir = IrGraph::build(tree);
    Generator::new(bindings, config).generate(&ir, "test")
}

fn generate(tree: &BlockNode) -> Executable {
    generate_with(tree, &BuiltinBindings::new(), GeneratorConfig::default())
        .unwrap_or_else(|errors| panic!("unexpected errors: {:?}", errors))
}

fn generate_errors(tree: &BlockNode) -> Vec<GenerateError> {
    match generate_with(tree, &BuiltinBindings::new(), GeneratorConfig::default()) {
        Ok(executable) => panic!("expected errors, got:\n{}", executable.disassemble()),
        Err(errors) => errors,
    }
}

/// Reserved opcode of every instruction; module-bound opcodes show as `NumReserved`
fn opcodes(function: &ExeFunction) -> Vec<Opcode> {
    function
        .instructions
        .iter()
        .map(|i| i.reserved().unwrap_or(Opcode::NumReserved))
        .collect()
}

fn instruction(
    executable: &Executable,
    pc: usize,
) -> Instruction {
    executable.functions[0].instructions[pc]
}
