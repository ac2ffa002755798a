//! Statement and block parsing
//!
//! Recursive descent keyed by the kind of the enclosing block. Each block
//! recognises its own terminator; a terminator belonging to some other block
//! is reported once and skipped. A statement that fails to parse tells the
//! block loop how to resynchronise through [`Resume`].

use super::ast::*;
use super::state::{Parsed, ParserState, Resume};
use crate::frontend::lexer::{Token, TokenKind};

/// What the block loop does after looking at one statement
enum Step {
    Child(Parsed<Node>),
    Mismatch(&'static str),
    Quit(bool),
}

fn closes(
    matches: bool,
    message: &'static str,
) -> Step {
    if matches {
        Step::Quit(true)
    } else {
        Step::Mismatch(message)
    }
}

fn identifier(token: &Token) -> ExpressionNode {
    ExpressionNode::new(NodeKind::Identifier, token.text.clone(), token.line())
}

impl<'a> ParserState<'a> {
    /// Parse statements into `block` up to and including its terminator
    ///
    /// Returns `false` if input ends inside any block other than a file.
    pub fn parse_block(
        &mut self,
        block: &mut BlockNode,
    ) -> bool {
        let kind = block.kind;
        self.push_block(kind);
        loop {
            let token = self.next();
            let step = match token.kind {
                TokenKind::Persistent => Step::Child(self.parse_persistent_statement()),
                TokenKind::Contract => {
                    if kind == NodeKind::File {
                        Step::Child(self.parse_contract_definition())
                    } else {
                        Step::Child(self.parse_contract_statement())
                    }
                }
                TokenKind::EndContract => Step::Mismatch("no matching 'contract'"),
                TokenKind::Struct => Step::Child(self.parse_struct_definition()),
                TokenKind::EndStruct => Step::Mismatch("no matching 'struct'"),
                TokenKind::AnnotationIdentifier | TokenKind::Function => {
                    Step::Child(self.parse_function_definition())
                }
                TokenKind::EndFunction => closes(
                    kind == NodeKind::FunctionDefinition,
                    "no matching 'function'",
                ),
                TokenKind::While => Step::Child(self.parse_while_statement()),
                TokenKind::EndWhile => {
                    closes(kind == NodeKind::WhileStatement, "no matching 'while'")
                }
                TokenKind::For => Step::Child(self.parse_for_statement()),
                TokenKind::EndFor => closes(kind == NodeKind::ForStatement, "no matching 'for'"),
                TokenKind::If => Step::Child(self.parse_if_statement()),
                TokenKind::ElseIf | TokenKind::Else => closes(
                    matches!(kind, NodeKind::If | NodeKind::ElseIf),
                    "no matching 'if' or 'elseif'",
                ),
                TokenKind::EndIf => closes(
                    matches!(kind, NodeKind::If | NodeKind::ElseIf | NodeKind::Else),
                    "no matching 'if', 'elseif' or 'else'",
                ),
                TokenKind::Use => Step::Child(self.parse_use_statement()),
                TokenKind::Var => Step::Child(self.parse_var_statement()),
                TokenKind::Return => Step::Child(self.parse_return_statement()),
                TokenKind::Break => Step::Child(self.parse_break_statement()),
                TokenKind::Continue => Step::Child(self.parse_continue_statement()),
                TokenKind::EndOfInput => {
                    if kind == NodeKind::File {
                        Step::Quit(true)
                    } else {
                        self.add_eof_error();
                        Step::Quit(false)
                    }
                }
                _ => {
                    self.undo();
                    Step::Child(self.parse_expression_statement())
                }
            };
            match step {
                Step::Child(Ok(node)) => block.block_children.push(node),
                Step::Child(Err(Resume::NextStatement)) => self.go_to_next_statement(),
                Step::Child(Err(Resume::Here)) => {}
                Step::Mismatch(message) => self.add_mismatch_error(message),
                Step::Quit(terminated) => {
                    block.terminator_text = token.text.clone();
                    block.terminator_line = token.line();
                    self.pop_block();
                    return terminated;
                }
            }
        }
    }

    /// Expect the next token to be `kind`
    fn expect(
        &mut self,
        kind: TokenKind,
        message: &str,
    ) -> Parsed<&'a Token> {
        let token = self.next();
        if token.kind == kind {
            Ok(token)
        } else {
            self.add_error(message);
            Err(Resume::NextStatement)
        }
    }

    /// Parse a block statement, or report that it is not allowed here and
    /// consume it silently
    fn scoped_block(
        &mut self,
        allowed: bool,
        message: &str,
        parse: impl FnOnce(&mut Self) -> Parsed<Node>,
    ) -> Parsed<Node> {
        if !allowed {
            self.add_error(message);
        }
        let result = self.with_reporting(allowed, parse);
        if allowed {
            result
        } else {
            Err(Resume::Here)
        }
    }

    /// Parse a block body after its header
    ///
    /// A malformed header still has its body consumed, with reporting off, so
    /// the body's terminator is not later reported as unmatched.
    fn finish_block(
        &mut self,
        mut block: BlockNode,
        header_ok: bool,
    ) -> Parsed<Node> {
        if !header_ok {
            self.skip_header();
        }
        let terminated = self.with_reporting(header_ok, |p| p.parse_block(&mut block));
        if header_ok && terminated {
            Ok(block.into())
        } else {
            Err(Resume::Here)
        }
    }

    fn parse_persistent_statement(&mut self) -> Parsed<Node> {
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::PersistentStatement, &token.text, token.line());
        if self.block_kind() != NodeKind::File {
            self.add_error("persistent statement only permitted at topmost scope");
            self.next();
            return Err(Resume::NextStatement);
        }
        let mut name = self.expect(TokenKind::Identifier, "expected identifier or 'sharded'")?;
        let mut modifier = None;
        if name.text == "sharded" {
            modifier = Some(Node::from(identifier(name)));
            name = self.expect(TokenKind::Identifier, "expected identifier")?;
        }
        self.expect(TokenKind::Colon, "expected ':'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::SemiColon, "expected ';'")?;
        node.children = vec![Some(identifier(name).into()), modifier, Some(ty.into())];
        Ok(node.into())
    }

    fn parse_contract_definition(&mut self) -> Parsed<Node> {
        let token = self.token();
        let mut node = BlockNode::new(NodeKind::ContractDefinition, &token.text, token.line());
        let name = self.next();
        if name.kind != TokenKind::Identifier {
            self.add_error("expected identifier");
            while !matches!(
                self.token().kind,
                TokenKind::EndOfInput | TokenKind::EndContract
            ) {
                self.next();
            }
            return Err(Resume::Here);
        }
        node.children.push(Some(identifier(name).into()));
        self.push_block(NodeKind::ContractDefinition);
        loop {
            let token = self.next();
            match token.kind {
                TokenKind::EndContract => break,
                TokenKind::AnnotationIdentifier | TokenKind::Function => {
                    match self.parse_contract_function_prototype() {
                        Ok(prototype) => node.block_children.push(prototype),
                        Err(_) => self.skip_contract_function_prototype(),
                    }
                }
                kind => {
                    self.add_error("expected annotation, 'function' or 'endcontract'");
                    if kind == TokenKind::EndOfInput {
                        break;
                    }
                    self.skip_contract_function_prototype();
                }
            }
        }
        let end = self.token();
        node.terminator_text = end.text.clone();
        node.terminator_line = end.line();
        self.pop_block();
        Ok(node.into())
    }

    fn parse_contract_function_prototype(&mut self) -> Parsed<Node> {
        let mut annotations = None;
        if self.at(TokenKind::AnnotationIdentifier) {
            annotations = Some(Node::from(self.parse_annotations()?));
            if !self.at(TokenKind::Function) {
                self.add_error("expected 'function'");
                return Err(Resume::NextStatement);
            }
        }
        let token = self.token();
        let mut node = BasicNode::new(
            NodeKind::ContractFunctionPrototype,
            &token.text,
            token.line(),
        );
        node.children.push(annotations);
        if !self.parse_function_prototype(&mut node.children) {
            return Err(Resume::NextStatement);
        }
        self.expect(TokenKind::SemiColon, "expected ';'")?;
        Ok(node.into())
    }

    fn skip_contract_function_prototype(&mut self) {
        loop {
            match self.token().kind {
                TokenKind::EndOfInput | TokenKind::SemiColon => return,
                TokenKind::Function | TokenKind::EndContract => {
                    self.undo();
                    return;
                }
                _ => {
                    self.next();
                }
            }
        }
    }

    fn parse_struct_definition(&mut self) -> Parsed<Node> {
        let allowed = self.block_kind() == NodeKind::File;
        self.scoped_block(
            allowed,
            "struct definition only permitted at topmost scope",
            |p| p.parse_struct_body(),
        )
    }

    fn parse_struct_body(&mut self) -> Parsed<Node> {
        let token = self.token();
        let mut node = BlockNode::new(NodeKind::StructDefinition, &token.text, token.line());
        let name = self.next();
        if name.kind != TokenKind::Identifier {
            self.add_error("expected identifier");
            while !matches!(
                self.token().kind,
                TokenKind::EndOfInput | TokenKind::EndStruct
            ) {
                self.next();
            }
            return Err(Resume::Here);
        }
        node.children.push(Some(identifier(name).into()));
        self.push_block(NodeKind::StructDefinition);
        loop {
            let token = self.next();
            match token.kind {
                TokenKind::EndStruct => break,
                TokenKind::Var => match self.parse_member_var_declaration() {
                    Ok(member) => node.block_children.push(member),
                    Err(_) => self.skip_struct_member(),
                },
                TokenKind::AnnotationIdentifier | TokenKind::Function => {
                    match self.parse_function_definition() {
                        Ok(function) => node.block_children.push(function),
                        Err(Resume::NextStatement) => self.go_to_next_statement(),
                        Err(Resume::Here) => {}
                    }
                }
                kind => {
                    self.add_error("expected 'var', 'function' or 'endstruct'");
                    if kind == TokenKind::EndOfInput {
                        break;
                    }
                    self.skip_struct_member();
                }
            }
        }
        let end = self.token();
        node.terminator_text = end.text.clone();
        node.terminator_line = end.line();
        self.pop_block();
        Ok(node.into())
    }

    fn parse_member_var_declaration(&mut self) -> Parsed<Node> {
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::MemberVarDeclaration, &token.text, token.line());
        let name = self.expect(TokenKind::Identifier, "expected identifier")?;
        self.expect(TokenKind::Colon, "expected ':'")?;
        let ty = self.parse_type()?;
        self.expect(TokenKind::SemiColon, "expected ';'")?;
        node.children = vec![Some(identifier(name).into()), Some(ty.into())];
        Ok(node.into())
    }

    fn skip_struct_member(&mut self) {
        loop {
            match self.token().kind {
                TokenKind::EndOfInput | TokenKind::SemiColon => return,
                TokenKind::Var
                | TokenKind::Function
                | TokenKind::AnnotationIdentifier
                | TokenKind::EndStruct => {
                    self.undo();
                    return;
                }
                _ => {
                    self.next();
                }
            }
        }
    }

    fn parse_function_definition(&mut self) -> Parsed<Node> {
        let block_kind = self.block_kind();
        let mut annotations = None;
        if self.at(TokenKind::AnnotationIdentifier) {
            if block_kind != NodeKind::File {
                self.add_error("unexpected annotation");
                self.skip_annotations();
                return Err(Resume::Here);
            }
            match self.parse_annotations() {
                Ok(node) => annotations = Some(Node::from(node)),
                Err(_) => {
                    self.skip_annotations();
                    return Err(Resume::Here);
                }
            }
            if !self.at(TokenKind::Function) {
                self.add_error("expected 'function'");
                return Err(Resume::NextStatement);
            }
        }
        let allowed = matches!(block_kind, NodeKind::File | NodeKind::StructDefinition);
        self.scoped_block(
            allowed,
            "local function definitions are not permitted",
            |p| {
                let token = p.token();
                let mut node =
                    BlockNode::new(NodeKind::FunctionDefinition, &token.text, token.line());
                node.children.push(annotations);
                let header_ok = p.parse_function_prototype(&mut node.children);
                p.finish_block(node, header_ok)
            },
        )
    }

    /// `name(param: Type, ...) [: ReturnType]`, appended to `children` as
    /// name, parameter/type pairs, then the optional return type
    fn parse_function_prototype(
        &mut self,
        children: &mut Vec<Option<Node>>,
    ) -> bool {
        let Ok(name) = self.expect(TokenKind::Identifier, "expected identifier") else {
            return false;
        };
        children.push(Some(identifier(name).into()));
        if self
            .expect(TokenKind::LeftParenthesis, "expected '('")
            .is_err()
        {
            return false;
        }
        if self.next().kind != TokenKind::RightParenthesis {
            let mut count = 0;
            loop {
                let parameter = self.token();
                if parameter.kind != TokenKind::Identifier {
                    if count == 0 {
                        self.add_error("expected identifier or ')'");
                    } else {
                        self.add_error("expected identifier");
                    }
                    return false;
                }
                children.push(Some(identifier(parameter).into()));
                if self.expect(TokenKind::Colon, "expected ':'").is_err() {
                    return false;
                }
                let Ok(ty) = self.parse_type() else {
                    return false;
                };
                children.push(Some(ty.into()));
                match self.next().kind {
                    TokenKind::RightParenthesis => break,
                    TokenKind::Comma => {
                        self.next();
                        count += 1;
                    }
                    _ => {
                        self.add_error("expected ',' or ')'");
                        return false;
                    }
                }
            }
        }
        let mut return_type = None;
        if self.next().kind == TokenKind::Colon {
            let Ok(ty) = self.parse_type() else {
                return false;
            };
            return_type = Some(ty.into());
        } else {
            self.undo();
        }
        children.push(return_type);
        true
    }

    fn parse_annotations(&mut self) -> Parsed<BasicNode> {
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::Annotations, &token.text, token.line());
        loop {
            let annotation = self.parse_annotation()?;
            node.children.push(Some(annotation.into()));
            if !self.at(TokenKind::AnnotationIdentifier) {
                return Ok(node);
            }
        }
    }

    /// `@name` or `@name(literal, name = literal, ...)`; leaves the token after
    /// the annotation current
    fn parse_annotation(&mut self) -> Parsed<BasicNode> {
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::Annotation, &token.text, token.line());
        if self.next().kind != TokenKind::LeftParenthesis {
            return Ok(node);
        }
        loop {
            let literal = self.parse_annotation_literal()?;
            if matches!(literal.kind, NodeKind::String | NodeKind::Identifier) {
                let assign = self.next();
                if assign.kind != TokenKind::Assign {
                    node.children.push(Some(literal.into()));
                } else {
                    let mut pair = BasicNode::new(
                        NodeKind::AnnotationNameValuePair,
                        &assign.text,
                        assign.line(),
                    );
                    pair.children.push(Some(literal.into()));
                    let value = self.parse_annotation_literal()?;
                    pair.children.push(Some(value.into()));
                    node.children.push(Some(pair.into()));
                    self.next();
                }
            } else {
                node.children.push(Some(literal.into()));
                self.next();
            }
            match self.token().kind {
                TokenKind::RightParenthesis => {
                    self.next();
                    return Ok(node);
                }
                TokenKind::Comma => {}
                _ => {
                    self.add_error("expected ',' or ')'");
                    return Err(Resume::NextStatement);
                }
            }
        }
    }

    fn parse_annotation_literal(&mut self) -> Parsed<ExpressionNode> {
        let mut token = self.next();
        let mut negative = false;
        let mut signed = false;
        if matches!(token.kind, TokenKind::Plus | TokenKind::Minus) {
            signed = true;
            negative = token.kind == TokenKind::Minus;
            token = self.next();
        }
        let (kind, number) = match token.kind {
            TokenKind::Integer32 => (NodeKind::Integer64, true),
            TokenKind::Float64 => (NodeKind::Float64, true),
            TokenKind::True => (NodeKind::True, false),
            TokenKind::False => (NodeKind::False, false),
            TokenKind::String => (NodeKind::String, false),
            TokenKind::Identifier => (NodeKind::Identifier, false),
            _ => {
                self.add_error("expected annotation literal");
                return Err(Resume::NextStatement);
            }
        };
        if signed && !number {
            self.add_error("expected number");
            return Err(Resume::NextStatement);
        }
        let text = if negative {
            format!("-{}", token.text)
        } else {
            token.text.clone()
        };
        Ok(ExpressionNode::new(kind, text, token.line()))
    }

    /// Skip annotations up to the function they belong to
    ///
    /// Stops on a consumed `;`, or just before the next statement keyword or
    /// block terminator.
    fn skip_annotations(&mut self) {
        loop {
            let kind = self.token().kind;
            match kind {
                TokenKind::EndOfInput | TokenKind::SemiColon => return,
                TokenKind::AnnotationIdentifier => {}
                _ if kind.starts_statement() || kind.is_block_terminator() => {
                    self.undo();
                    return;
                }
                _ => {}
            }
            self.next();
        }
    }

    fn parse_while_statement(&mut self) -> Parsed<Node> {
        let allowed = self.block_kind() != NodeKind::File;
        self.scoped_block(allowed, "while loop not permitted at topmost scope", |p| {
            let token = p.token();
            let mut node = BlockNode::new(NodeKind::WhileStatement, &token.text, token.line());
            let header_ok = match p.parse_conditional_expression() {
                Ok(condition) => {
                    node.children.push(Some(condition.into()));
                    true
                }
                Err(_) => false,
            };
            p.finish_block(node, header_ok)
        })
    }

    fn parse_for_statement(&mut self) -> Parsed<Node> {
        let allowed = self.block_kind() != NodeKind::File;
        self.scoped_block(allowed, "for loop not permitted at topmost scope", |p| {
            let token = p.token();
            let mut node = BlockNode::new(NodeKind::ForStatement, &token.text, token.line());
            let header_ok = p.parse_for_header(&mut node.children).is_ok();
            p.finish_block(node, header_ok)
        })
    }

    /// `(name in from : to [: step])`
    fn parse_for_header(
        &mut self,
        children: &mut Vec<Option<Node>>,
    ) -> Parsed<()> {
        self.expect(TokenKind::LeftParenthesis, "expected '('")?;
        let name = self.expect(TokenKind::Identifier, "expected identifier")?;
        children.push(Some(identifier(name).into()));
        self.expect(TokenKind::In, "expected 'in'")?;
        children.push(Some(self.parse_expression(false)?.into()));
        self.expect(TokenKind::Colon, "expected ':'")?;
        children.push(Some(self.parse_expression(false)?.into()));
        if self.next().kind == TokenKind::Colon {
            children.push(Some(self.parse_expression(false)?.into()));
            self.next();
        }
        if !self.at(TokenKind::RightParenthesis) {
            self.add_error("expected ')'");
            return Err(Resume::NextStatement);
        }
        Ok(())
    }

    fn parse_if_statement(&mut self) -> Parsed<Node> {
        let allowed = self.block_kind() != NodeKind::File;
        self.scoped_block(allowed, "if statement not permitted at topmost scope", |p| {
            p.parse_if_chain()
        })
    }

    /// `if` block followed by any `elseif`/`else` blocks up to `endif`
    fn parse_if_chain(&mut self) -> Parsed<Node> {
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::IfStatement, &token.text, token.line());
        let mut all_ok = true;
        loop {
            let token = self.token();
            let kind = match token.kind {
                TokenKind::If => NodeKind::If,
                TokenKind::ElseIf => NodeKind::ElseIf,
                TokenKind::Else => NodeKind::Else,
                _ => break,
            };
            let mut block = BlockNode::new(kind, &token.text, token.line());
            let mut header_ok = true;
            if kind != NodeKind::Else {
                match self.parse_conditional_expression() {
                    Ok(condition) => block.children.push(Some(condition.into())),
                    Err(_) => {
                        header_ok = false;
                        self.skip_header();
                    }
                }
            }
            let terminated = self.with_reporting(header_ok, |p| p.parse_block(&mut block));
            all_ok &= header_ok;
            if !terminated {
                return Err(Resume::Here);
            }
            node.children.push(Some(block.into()));
        }
        if all_ok {
            Ok(node.into())
        } else {
            Err(Resume::Here)
        }
    }

    fn parse_contract_statement(&mut self) -> Parsed<Node> {
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::ContractStatement, &token.text, token.line());
        let variable = self.expect(TokenKind::Identifier, "expected identifier")?;
        self.expect(TokenKind::Assign, "expected '='")?;
        let contract_type = self.expect(TokenKind::Identifier, "expected identifier")?;
        self.expect(TokenKind::LeftParenthesis, "expected '('")?;
        let initialiser = self.parse_expression(false)?;
        self.expect(TokenKind::RightParenthesis, "expected ')'")?;
        self.expect(TokenKind::SemiColon, "expected ';'")?;
        node.children = vec![
            Some(identifier(variable).into()),
            Some(identifier(contract_type).into()),
            Some(initialiser.into()),
        ];
        Ok(node.into())
    }

    fn parse_use_statement(&mut self) -> Parsed<Node> {
        let block_kind = self.block_kind();
        if block_kind == NodeKind::File {
            self.add_error("use statement not permitted at topmost scope");
            self.next();
            return Err(Resume::NextStatement);
        }
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::UseStatement, &token.text, token.line());
        let name = self.expect(TokenKind::Identifier, "expected identifier or 'any'")?;

        if name.text == "any" {
            if block_kind != NodeKind::FunctionDefinition {
                self.add_error("use-any statement only permitted at function scope");
                self.next();
                return Err(Resume::NextStatement);
            }
            node.kind = NodeKind::UseAnyStatement;
            self.expect(TokenKind::SemiColon, "expected ';'")?;
            return Ok(node.into());
        }

        let mut key_list = None;
        let mut alias = None;
        let opener = self.next();
        if opener.kind == TokenKind::LeftSquareBracket {
            let mut keys =
                BasicNode::new(NodeKind::UseStatementKeyList, &opener.text, opener.line());
            loop {
                keys.children.push(Some(self.parse_expression(false)?.into()));
                match self.next().kind {
                    TokenKind::Comma => {}
                    TokenKind::RightSquareBracket => {
                        self.next();
                        break;
                    }
                    _ => {
                        self.add_error("expected ',' or ']'");
                        return Err(Resume::NextStatement);
                    }
                }
            }
            key_list = Some(Node::from(keys));
        }
        if self.at(TokenKind::As) {
            let alias_name = self.expect(TokenKind::Identifier, "expected identifier")?;
            alias = Some(Node::from(identifier(alias_name)));
            self.next();
        }
        if !self.at(TokenKind::SemiColon) {
            let message = if alias.is_some() {
                "expected ';'"
            } else if key_list.is_some() {
                "expected 'as' or ';'"
            } else {
                "expected '[', 'as' or ';'"
            };
            self.add_error(message);
            return Err(Resume::NextStatement);
        }
        node.children = vec![Some(identifier(name).into()), key_list, alias];
        Ok(node.into())
    }

    /// `var x : T;`, `var x : T = e;` or `var x = e;`
    fn parse_var_statement(&mut self) -> Parsed<Node> {
        if self.block_kind() == NodeKind::File {
            self.add_error("variable declaration not permitted at topmost scope");
            self.next();
            return Err(Resume::NextStatement);
        }
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::VarDeclarationStatement, &token.text, token.line());
        let name = self.expect(TokenKind::Identifier, "expected identifier")?;
        node.children.push(Some(identifier(name).into()));

        let mut typed = false;
        let mut assigned = false;
        if self.next().kind == TokenKind::Colon {
            node.children.push(Some(self.parse_type()?.into()));
            typed = true;
            self.next();
        }
        if self.at(TokenKind::Assign) {
            node.children.push(Some(self.parse_expression(false)?.into()));
            assigned = true;
            self.next();
        }
        if !self.at(TokenKind::SemiColon) || (!typed && !assigned) {
            let message = if assigned {
                "expected ';'"
            } else if typed {
                "expected '=' or ';'"
            } else {
                "expected ':' or '='"
            };
            self.add_error(message);
            return Err(Resume::NextStatement);
        }
        node.kind = match (typed, assigned) {
            (false, _) => NodeKind::VarDeclarationTypelessAssignmentStatement,
            (true, true) => NodeKind::VarDeclarationTypedAssignmentStatement,
            (true, false) => NodeKind::VarDeclarationStatement,
        };
        Ok(node.into())
    }

    fn parse_return_statement(&mut self) -> Parsed<Node> {
        if self.block_kind() == NodeKind::File {
            self.add_error("return statement not permitted at topmost scope");
            self.next();
            return Err(Resume::NextStatement);
        }
        let token = self.token();
        let mut node = BasicNode::new(NodeKind::ReturnStatement, &token.text, token.line());
        match self.next().kind {
            TokenKind::SemiColon => return Ok(node.into()),
            TokenKind::EndOfInput => {
                self.add_error("expected expression or ';'");
                return Err(Resume::NextStatement);
            }
            _ => self.undo(),
        }
        let value = self.parse_expression(false)?;
        self.expect(TokenKind::SemiColon, "expected ';'")?;
        node.children.push(Some(value.into()));
        Ok(node.into())
    }

    fn parse_break_statement(&mut self) -> Parsed<Node> {
        self.parse_jump_statement(
            NodeKind::BreakStatement,
            "break statement not permitted at topmost scope",
        )
    }

    fn parse_continue_statement(&mut self) -> Parsed<Node> {
        self.parse_jump_statement(
            NodeKind::ContinueStatement,
            "continue statement not permitted at topmost scope",
        )
    }

    fn parse_jump_statement(
        &mut self,
        kind: NodeKind,
        scope_message: &str,
    ) -> Parsed<Node> {
        if self.block_kind() == NodeKind::File {
            self.add_error(scope_message);
            self.next();
            return Err(Resume::NextStatement);
        }
        let token = self.token();
        let node = BasicNode::new(kind, &token.text, token.line());
        self.expect(TokenKind::SemiColon, "expected ';'")?;
        Ok(node.into())
    }

    /// Expression, or a single assignment `lhs op rhs;`
    fn parse_expression_statement(&mut self) -> Parsed<Node> {
        if self.block_kind() == NodeKind::File {
            if self.next().kind == TokenKind::Unknown {
                self.add_error("unrecognised token");
            } else {
                self.add_error("expression statement not permitted at topmost scope");
            }
            return Err(Resume::NextStatement);
        }
        let lhs = self.parse_expression(false)?;
        let op = self.next();
        let kind = match op.kind {
            TokenKind::SemiColon => return Ok(lhs.into()),
            TokenKind::Assign => NodeKind::Assign,
            TokenKind::InplaceAdd => NodeKind::InplaceAdd,
            TokenKind::InplaceSubtract => NodeKind::InplaceSubtract,
            TokenKind::InplaceMultiply => NodeKind::InplaceMultiply,
            TokenKind::InplaceDivide => NodeKind::InplaceDivide,
            TokenKind::InplaceModulo => NodeKind::InplaceModulo,
            _ => {
                self.add_error("expected ';' or assignment operator");
                return Err(Resume::NextStatement);
            }
        };
        // Assignments do not chain: `a = b = c` stops at the second `=`
        let rhs = self.parse_expression(false)?;
        self.expect(TokenKind::SemiColon, "expected ';'")?;
        let node = ExpressionNode::new(kind, op.text.clone(), op.line()).with_children(vec![lhs, rhs]);
        Ok(node.into())
    }

    /// `Name` or `Template<T, ...>`; template nodes carry the canonical
    /// spelling `Map<String,Int32>` as their text
    pub fn parse_type(&mut self) -> Parsed<ExpressionNode> {
        let name = self.expect(TokenKind::Identifier, "expected identifier")?;
        let base = identifier(name);
        if !self.is_template_name(&name.text) {
            return Ok(base);
        }
        let opener = self.expect(TokenKind::LessThan, "expected '<'")?;
        let mut spelling = format!("{}<", name.text);
        let mut template = ExpressionNode::new(NodeKind::Template, opener.text.clone(), opener.line());
        template.children.push(Some(base.into()));
        loop {
            let parameter = self.parse_type()?;
            spelling.push_str(&parameter.text);
            template.children.push(Some(parameter.into()));
            match self.next().kind {
                TokenKind::Comma => spelling.push(','),
                TokenKind::GreaterThan => {
                    spelling.push('>');
                    template.text = spelling;
                    return Ok(template);
                }
                _ => {
                    self.add_error("expected ',' or '>'");
                    return Err(Resume::NextStatement);
                }
            }
        }
    }
}
