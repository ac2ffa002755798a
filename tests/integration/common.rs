//! Shared fixtures: a minimal analyser and compile helpers
//!
//! The analyser understands just enough of the language for end-to-end
//! tests: free functions over `Int32`, `Bool` and `String`, locals, loops,
//! branches, calls and the module function `print(String)`.

#![allow(dead_code)]

use std::collections::HashMap;
use std::rc::Rc;

use etch::frontend::analyser::{
    Analyser, Function, FunctionKind, FunctionRef, Type, TypeRef, Variable, VariableKind,
    VariableRef,
};
use etch::frontend::config::CompilerConfig;
use etch::frontend::parser::{BlockNode, ExpressionKind, ExpressionNode, Node, NodeKind};
use etch::frontend::Compiler;
use etch::util::diagnostic::{Diagnostic, Diagnostics};
use etch::util::span::SourceFile;
use etch::vm::{BuiltinBindings, Executable, TypeKind};

pub const FILENAME: &str = "program.etch";

pub struct TestAnalyser {
    types: HashMap<String, TypeRef>,
    builtins: HashMap<String, FunctionRef>,
    functions: HashMap<String, FunctionRef>,
    scopes: Vec<HashMap<String, VariableRef>>,
    filename: String,
    diagnostics: Vec<Diagnostic>,
}

impl Default for TestAnalyser {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAnalyser {
    pub fn new() -> Self {
        let types: HashMap<String, TypeRef> = [
            (TypeKind::Primitive, "Void"),
            (TypeKind::Primitive, "Bool"),
            (TypeKind::Primitive, "Int32"),
            (TypeKind::Class, "String"),
        ]
        .into_iter()
        .map(|(kind, name)| (name.to_string(), Type::new(kind, name)))
        .collect();
        let print = Function::prototype(
            FunctionKind::FreeFunction,
            "print",
            vec![Rc::clone(&types["String"])],
            &types["Void"],
        );
        Self {
            builtins: HashMap::from([("print".to_string(), print)]),
            types,
            functions: HashMap::new(),
            scopes: Vec::new(),
            filename: String::new(),
            diagnostics: Vec::new(),
        }
    }

    fn ty(
        &self,
        name: &str,
    ) -> TypeRef {
        Rc::clone(&self.types[name])
    }

    fn error(
        &mut self,
        line: u16,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic::error(self.filename.as_str(), line, message);
        self.diagnostics.push(diagnostic);
    }

    fn resolve_type(
        &mut self,
        node: Option<&Node>,
    ) -> TypeRef {
        match node {
            None => self.ty("Void"),
            Some(node) => match self.types.get(node.text()) {
                Some(ty) => Rc::clone(ty),
                None => {
                    self.error(node.line(), format!("unknown type '{}'", node.text()));
                    self.ty("Void")
                }
            },
        }
    }

    fn declare(
        &mut self,
        variable: &VariableRef,
    ) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(variable.name.clone(), Rc::clone(variable));
        }
    }

    fn lookup(
        &self,
        name: &str,
    ) -> Option<VariableRef> {
        self.scopes.iter().rev().find_map(|s| s.get(name)).cloned()
    }

    /// Header of `function name(p : T, ...) [: R]`
    fn declare_function(
        &mut self,
        block: &mut BlockNode,
    ) {
        let last = block.children.len().saturating_sub(1);
        let return_type = self.resolve_type(block.children[last].as_ref());
        let mut parameters = Vec::new();
        for i in (2..last).step_by(2) {
            let ty = self.resolve_type(block.children[i + 1].as_ref());
            let Some(name) = block.children[i].as_mut().and_then(Node::as_expression_mut) else {
                continue;
            };
            let variable = Variable::new(VariableKind::Parameter, name.text.as_str(), &ty);
            bind_variable(name, &variable);
            parameters.push(variable);
        }
        let Some(name) = block.children[1].as_mut().and_then(Node::as_expression_mut) else {
            return;
        };
        let function = Function::new(
            FunctionKind::UserDefinedFreeFunction,
            name.text.as_str(),
            parameters,
            &return_type,
        );
        name.function = Some(Rc::clone(&function));
        self.functions.insert(name.text.clone(), function);
    }

    fn function_body(
        &mut self,
        block: &mut BlockNode,
    ) {
        let Some(function) = block
            .child(1)
            .and_then(Node::as_expression)
            .and_then(|name| name.function.clone())
        else {
            return;
        };
        self.scopes.push(HashMap::new());
        for parameter in &function.parameter_variables {
            self.declare(parameter);
        }
        self.statements(&mut block.block_children);
        self.scopes.pop();
    }

    fn statements(
        &mut self,
        statements: &mut [Node],
    ) {
        for statement in statements {
            self.statement(statement);
        }
    }

    fn scoped(
        &mut self,
        block: &mut BlockNode,
    ) {
        self.scopes.push(HashMap::new());
        self.statements(&mut block.block_children);
        self.scopes.pop();
    }

    fn statement(
        &mut self,
        node: &mut Node,
    ) {
        match node.kind() {
            NodeKind::VarDeclarationStatement
            | NodeKind::VarDeclarationTypedAssignmentStatement
            | NodeKind::VarDeclarationTypelessAssignmentStatement => self.var_statement(node),
            NodeKind::WhileStatement => {
                if let Some(block) = node.as_block_mut() {
                    self.condition(&mut block.children);
                    self.scoped(block);
                }
            }
            NodeKind::IfStatement => {
                for branch in node.children_mut().iter_mut().flatten() {
                    if let Some(block) = branch.as_block_mut() {
                        self.condition(&mut block.children);
                        self.scoped(block);
                    }
                }
            }
            NodeKind::ForStatement => {
                if let Some(block) = node.as_block_mut() {
                    self.for_statement(block);
                }
            }
            NodeKind::ReturnStatement => {
                for value in node.children_mut().iter_mut().flatten() {
                    if let Some(value) = value.as_expression_mut() {
                        self.expression(value);
                    }
                }
            }
            NodeKind::BreakStatement | NodeKind::ContinueStatement => {}
            _ => match node.as_expression_mut() {
                Some(expression) => {
                    self.expression(expression);
                }
                None => self.error(node.line(), "unsupported statement"),
            },
        }
    }

    /// `for (k in a : b [: step])`; `k` is an `Int32` scoped to the loop
    fn for_statement(
        &mut self,
        block: &mut BlockNode,
    ) {
        for bound in block.children.iter_mut().skip(1).flatten() {
            if let Some(bound) = bound.as_expression_mut() {
                self.expression(bound);
            }
        }
        self.scopes.push(HashMap::new());
        let int32 = self.ty("Int32");
        if let Some(name) = block.children[0].as_mut().and_then(Node::as_expression_mut) {
            let variable = Variable::new(VariableKind::Local, name.text.as_str(), &int32);
            bind_variable(name, &variable);
            self.declare(&variable);
        }
        self.statements(&mut block.block_children);
        self.scopes.pop();
    }

    fn condition(
        &mut self,
        children: &mut [Option<Node>],
    ) {
        if let Some(condition) = children
            .first_mut()
            .and_then(Option::as_mut)
            .and_then(Node::as_expression_mut)
        {
            self.expression(condition);
        }
    }

    fn var_statement(
        &mut self,
        node: &mut Node,
    ) {
        let kind = node.kind();
        let children = node.children_mut();
        let ty = match kind {
            NodeKind::VarDeclarationTypelessAssignmentStatement => {
                match children[1].as_mut().and_then(Node::as_expression_mut) {
                    Some(init) => self.expression(init),
                    None => None,
                }
            }
            NodeKind::VarDeclarationTypedAssignmentStatement => {
                if let Some(init) = children[2].as_mut().and_then(Node::as_expression_mut) {
                    self.expression(init);
                }
                Some(self.resolve_type(children[1].as_ref()))
            }
            _ => Some(self.resolve_type(children[1].as_ref())),
        };
        let Some(ty) = ty else {
            return;
        };
        let Some(name) = children[0].as_mut().and_then(Node::as_expression_mut) else {
            return;
        };
        let variable = Variable::new(VariableKind::Local, name.text.as_str(), &ty);
        bind_variable(name, &variable);
        self.declare(&variable);
    }

    /// Annotate `node` and return its type
    fn expression(
        &mut self,
        node: &mut ExpressionNode,
    ) -> Option<TypeRef> {
        let ty = match node.kind {
            NodeKind::Identifier => {
                let Some(variable) = self.lookup(&node.text) else {
                    self.error(node.line, format!("undeclared identifier '{}'", node.text));
                    return None;
                };
                variable.referenced.set(true);
                bind_variable(node, &variable);
                return Some(Rc::clone(&variable.ty));
            }
            NodeKind::Integer32 => self.ty("Int32"),
            NodeKind::String => self.ty("String"),
            NodeKind::True | NodeKind::False => self.ty("Bool"),
            NodeKind::Invoke => return self.invoke(node),
            NodeKind::Assign
            | NodeKind::InplaceAdd
            | NodeKind::InplaceSubtract
            | NodeKind::InplaceMultiply
            | NodeKind::InplaceDivide
            | NodeKind::InplaceModulo => {
                self.operands(node);
                node.expression_kind = ExpressionKind::RV;
                return None;
            }
            NodeKind::Equal
            | NodeKind::NotEqual
            | NodeKind::LessThan
            | NodeKind::LessThanOrEqual
            | NodeKind::GreaterThan
            | NodeKind::GreaterThanOrEqual
            | NodeKind::And
            | NodeKind::Or
            | NodeKind::Not => {
                self.operands(node);
                self.ty("Bool")
            }
            NodeKind::Add
            | NodeKind::Subtract
            | NodeKind::Multiply
            | NodeKind::Divide
            | NodeKind::Modulo
            | NodeKind::Negate
            | NodeKind::PrefixInc
            | NodeKind::PrefixDec
            | NodeKind::PostfixInc
            | NodeKind::PostfixDec => self.operands(node).into_iter().next()??,
            kind => {
                self.error(node.line, format!("unsupported expression {:?}", kind));
                return None;
            }
        };
        node.expression_kind = ExpressionKind::RV;
        node.ty = Some(Rc::clone(&ty));
        Some(ty)
    }

    fn operands(
        &mut self,
        node: &mut ExpressionNode,
    ) -> Vec<Option<TypeRef>> {
        let mut types = Vec::new();
        for child in node.children.iter_mut().flatten() {
            if let Some(operand) = child.as_expression_mut() {
                types.push(self.expression(operand));
            }
        }
        types
    }

    fn invoke(
        &mut self,
        node: &mut ExpressionNode,
    ) -> Option<TypeRef> {
        for argument in node.children.iter_mut().skip(1).flatten() {
            if let Some(argument) = argument.as_expression_mut() {
                self.expression(argument);
            }
        }
        let callee = node.operand_mut(0)?;
        callee.expression_kind = ExpressionKind::FunctionGroup;
        let name = callee.text.clone();
        let function = self
            .functions
            .get(&name)
            .or_else(|| self.builtins.get(&name))
            .cloned();
        let Some(function) = function else {
            self.error(node.line, format!("unknown function '{}'", name));
            return None;
        };
        if node.children.len() - 1 != function.parameter_types.len() {
            self.error(node.line, format!("wrong number of arguments to '{}'", name));
            return None;
        }
        node.expression_kind = ExpressionKind::RV;
        node.ty = Some(Rc::clone(&function.return_type));
        node.function = Some(Rc::clone(&function));
        Some(Rc::clone(&function.return_type))
    }
}

fn bind_variable(
    node: &mut ExpressionNode,
    variable: &VariableRef,
) {
    node.expression_kind = ExpressionKind::Variable;
    node.ty = Some(Rc::clone(&variable.ty));
    node.variable = Some(Rc::clone(variable));
}

impl Analyser for TestAnalyser {
    fn analyse(
        &mut self,
        root: &mut BlockNode,
    ) -> Result<(), Vec<Diagnostic>> {
        self.diagnostics.clear();
        self.functions.clear();
        for file in root.block_children.iter_mut().filter_map(Node::as_block_mut) {
            self.filename = file.text.clone();
            for definition in file.block_children.iter_mut().filter_map(Node::as_block_mut) {
                if definition.kind == NodeKind::FunctionDefinition {
                    self.declare_function(definition);
                }
            }
        }
        for file in root.block_children.iter_mut().filter_map(Node::as_block_mut) {
            self.filename = file.text.clone();
            for definition in file.block_children.iter_mut().filter_map(Node::as_block_mut) {
                if definition.kind == NodeKind::FunctionDefinition {
                    self.function_body(definition);
                }
            }
        }
        if self.diagnostics.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.diagnostics))
        }
    }
}

/// Bindings with `print(String)` registered, and its opcode
pub fn bindings() -> (BuiltinBindings, u16) {
    let mut bindings = BuiltinBindings::new();
    let print = bindings.register_function("print(String)");
    (bindings, print)
}

pub fn sources(files: &[(&str, &str)]) -> Vec<SourceFile> {
    files
        .iter()
        .map(|(name, content)| SourceFile::new(*name, *content))
        .collect()
}

/// Parse, analyse and generate one file
pub fn compile(source: &str) -> Result<Executable, Diagnostics> {
    let (bindings, _) = bindings();
    Compiler::new(CompilerConfig::default()).compile(
        &sources(&[(FILENAME, source)]),
        &mut TestAnalyser::new(),
        &bindings,
    )
}

pub fn compile_ok(source: &str) -> Executable {
    compile(source).unwrap_or_else(|errors| panic!("unexpected errors:\n{}", errors))
}

pub fn compile_errors(source: &str) -> Vec<String> {
    match compile(source) {
        Ok(executable) => panic!("expected errors, got:\n{}", executable.disassemble()),
        Err(errors) => errors.to_strings(),
    }
}

/// `<file>: line <n>: error: <message>`
pub fn error_at(
    line: u16,
    message: &str,
) -> String {
    format!("{}: line {}: error: {}", FILENAME, line, message)
}
