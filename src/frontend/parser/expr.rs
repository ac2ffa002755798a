//! Operator-precedence (shunting-yard) expression parsing
//!
//! Tokens are consumed one at a time against two states. In `PreOperand` an
//! operand or prefix operator is expected; in `PostOperand` a binary or postfix
//! operator, a closer, or the end of the expression. Openers are ambiguous:
//! after an operand `(` and `[` mean invoke and index, before one they mean
//! grouping, and `{` opens an initialiser list. Each opener pushes a group
//! marker onto the operator stack that records the arity so far, the closer it
//! needs and its own token, so a missing or mismatched closer is reported
//! against the opener.
//!
//! The resulting reverse polish sequence is folded into a tree once the
//! expression ends. The token that ended it is left for the statement parser.

use super::ast::{ExpressionNode, NodeKind};
use super::state::{Parsed, ParserState, Resume};
use crate::frontend::lexer::{Token, TokenKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Association {
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
struct OpInfo {
    precedence: u8,
    association: Association,
    arity: usize,
}

impl OpInfo {
    const fn new(
        precedence: u8,
        association: Association,
        arity: usize,
    ) -> Self {
        Self {
            precedence,
            association,
            arity,
        }
    }
}

const OR: OpInfo = OpInfo::new(1, Association::Left, 2);
const AND: OpInfo = OpInfo::new(2, Association::Left, 2);
const EQUALITY: OpInfo = OpInfo::new(3, Association::Left, 2);
const RELATIONAL: OpInfo = OpInfo::new(4, Association::Left, 2);
const ADDITIVE: OpInfo = OpInfo::new(5, Association::Left, 2);
const MULTIPLICATIVE: OpInfo = OpInfo::new(6, Association::Left, 2);
const PREFIX: OpInfo = OpInfo::new(7, Association::Right, 1);
const POSTFIX: OpInfo = OpInfo::new(8, Association::Left, 1);

/// Open group bookkeeping
#[derive(Debug, Clone)]
struct Group {
    closer: TokenKind,
    closer_text: &'static str,
    opener: Token,
    num_members: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    node: ExpressionNode,
    is_operator: bool,
    op: OpInfo,
    group: Option<Group>,
}

impl Entry {
    fn operand(node: ExpressionNode) -> Self {
        Self {
            node,
            is_operator: false,
            op: OpInfo::new(0, Association::Left, 0),
            group: None,
        }
    }

    fn operator(
        node: ExpressionNode,
        op: OpInfo,
    ) -> Self {
        Self {
            node,
            is_operator: true,
            op,
            group: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    PreOperand,
    PostOperand,
}

/// Working stacks for one expression
#[derive(Debug)]
struct Shunt {
    state: State,
    terminated: bool,
    /// Indices into `operators` of the open group markers
    groups: Vec<usize>,
    operators: Vec<Entry>,
    rpn: Vec<Entry>,
}

impl Shunt {
    fn new() -> Self {
        Self {
            state: State::PreOperand,
            terminated: false,
            groups: Vec::new(),
            operators: Vec::new(),
            rpn: Vec::new(),
        }
    }

    fn increment_group_members(&mut self) {
        if let Some(&g) = self.groups.last() {
            if let Some(group) = self.operators[g].group.as_mut() {
                group.num_members += 1;
            }
        }
    }

    fn add_operand(
        &mut self,
        kind: NodeKind,
        token: &Token,
    ) {
        self.increment_group_members();
        self.rpn.push(Entry::operand(node_from(kind, token)));
    }

    fn add_op(
        &mut self,
        kind: NodeKind,
        token: &Token,
        op: OpInfo,
    ) {
        self.increment_group_members();
        self.operators.push(Entry::operator(node_from(kind, token), op));
    }

    fn add_group(
        &mut self,
        kind: NodeKind,
        token: &Token,
        arity: usize,
        closer: TokenKind,
        closer_text: &'static str,
    ) {
        self.increment_group_members();
        let mut entry = Entry::operator(
            node_from(kind, token),
            OpInfo::new(0, Association::Left, arity),
        );
        entry.group = Some(Group {
            closer,
            closer_text,
            opener: token.clone(),
            num_members: 0,
        });
        self.groups.push(self.operators.len());
        self.operators.push(entry);
    }

    /// Move operators down to (not including) the innermost group marker
    fn pop_to_group(&mut self) {
        while let Some(top) = self.operators.last() {
            if top.group.is_some() {
                break;
            }
            if let Some(top) = self.operators.pop() {
                self.rpn.push(top);
            }
        }
    }

    fn handle_op(
        &mut self,
        kind: NodeKind,
        token: &Token,
        op: OpInfo,
    ) {
        while let Some(top) = self.operators.last() {
            if top.group.is_some() || op.precedence > top.op.precedence {
                break;
            }
            if op.precedence == top.op.precedence && op.association == Association::Right {
                break;
            }
            if let Some(top) = self.operators.pop() {
                self.rpn.push(top);
            }
        }
        self.add_op(kind, token, op);
    }

    /// Fold the reverse polish sequence into a tree
    fn assemble(mut self) -> Option<ExpressionNode> {
        while let Some(top) = self.operators.pop() {
            self.rpn.push(top);
        }
        let mut infix: Vec<ExpressionNode> = Vec::new();
        for entry in self.rpn {
            if matches!(entry.node.kind, NodeKind::Parenthesis | NodeKind::UnaryPlus) {
                continue;
            }
            if !entry.is_operator {
                infix.push(entry.node);
                continue;
            }
            let start = infix.len().checked_sub(entry.op.arity)?;
            let operands = infix.split_off(start);
            infix.push(entry.node.with_children(operands));
        }
        // A well-formed sequence folds to exactly one tree
        if infix.len() > 1 {
            return None;
        }
        infix.pop()
    }
}

fn node_from(
    kind: NodeKind,
    token: &Token,
) -> ExpressionNode {
    ExpressionNode::new(kind, token.text.clone(), token.line())
}

fn literal_kind(kind: TokenKind) -> Option<NodeKind> {
    Some(match kind {
        TokenKind::Integer8 => NodeKind::Integer8,
        TokenKind::UnsignedInteger8 => NodeKind::UnsignedInteger8,
        TokenKind::Integer16 => NodeKind::Integer16,
        TokenKind::UnsignedInteger16 => NodeKind::UnsignedInteger16,
        TokenKind::Integer32 => NodeKind::Integer32,
        TokenKind::UnsignedInteger32 => NodeKind::UnsignedInteger32,
        TokenKind::Integer64 => NodeKind::Integer64,
        TokenKind::UnsignedInteger64 => NodeKind::UnsignedInteger64,
        TokenKind::Float32 => NodeKind::Float32,
        TokenKind::Float64 => NodeKind::Float64,
        TokenKind::Fixed32 => NodeKind::Fixed32,
        TokenKind::Fixed64 => NodeKind::Fixed64,
        TokenKind::Fixed128 => NodeKind::Fixed128,
        TokenKind::String => NodeKind::String,
        TokenKind::True => NodeKind::True,
        TokenKind::False => NodeKind::False,
        TokenKind::Null => NodeKind::Null,
        _ => return None,
    })
}

fn binary_op(kind: TokenKind) -> Option<(NodeKind, OpInfo)> {
    Some(match kind {
        TokenKind::Multiply => (NodeKind::Multiply, MULTIPLICATIVE),
        TokenKind::Divide => (NodeKind::Divide, MULTIPLICATIVE),
        TokenKind::Modulo => (NodeKind::Modulo, MULTIPLICATIVE),
        TokenKind::Equal => (NodeKind::Equal, EQUALITY),
        TokenKind::NotEqual => (NodeKind::NotEqual, EQUALITY),
        TokenKind::LessThan => (NodeKind::LessThan, RELATIONAL),
        TokenKind::LessThanOrEqual => (NodeKind::LessThanOrEqual, RELATIONAL),
        TokenKind::GreaterThan => (NodeKind::GreaterThan, RELATIONAL),
        TokenKind::GreaterThanOrEqual => (NodeKind::GreaterThanOrEqual, RELATIONAL),
        TokenKind::And => (NodeKind::And, AND),
        TokenKind::Or => (NodeKind::Or, OR),
        _ => return None,
    })
}

impl<'a> ParserState<'a> {
    /// Parse an `if`/`while` test: must start with `(` and ends at its `)`
    pub fn parse_conditional_expression(&mut self) -> Parsed<ExpressionNode> {
        self.next();
        if !self.at(TokenKind::LeftParenthesis) {
            self.add_error("expected '('");
            return Err(Resume::NextStatement);
        }
        self.undo();
        self.parse_expression(true)
    }

    /// Parse an expression starting at the next token
    ///
    /// On success the current token is the last token of the expression.
    pub fn parse_expression(
        &mut self,
        is_conditional: bool,
    ) -> Parsed<ExpressionNode> {
        let mut s = Shunt::new();

        while !s.terminated {
            let token = self.next();
            let parses = match token.kind {
                TokenKind::Identifier => self.handle_identifier(&mut s, token),
                TokenKind::Plus => {
                    self.handle_sign(&mut s, token, NodeKind::UnaryPlus, NodeKind::Add);
                    true
                }
                TokenKind::Minus => {
                    self.handle_sign(&mut s, token, NodeKind::Negate, NodeKind::Subtract);
                    true
                }
                TokenKind::Not => {
                    if s.state == State::PreOperand {
                        s.handle_op(NodeKind::Not, token, PREFIX);
                    } else {
                        s.terminated = true;
                    }
                    true
                }
                TokenKind::Inc => {
                    self.handle_prefix_postfix(
                        &mut s,
                        token,
                        NodeKind::PrefixInc,
                        NodeKind::PostfixInc,
                    );
                    true
                }
                TokenKind::Dec => {
                    self.handle_prefix_postfix(
                        &mut s,
                        token,
                        NodeKind::PrefixDec,
                        NodeKind::PostfixDec,
                    );
                    true
                }
                TokenKind::LeftParenthesis => self.handle_opener(
                    &mut s,
                    token,
                    Some(NodeKind::Parenthesis),
                    Some(NodeKind::Invoke),
                    TokenKind::RightParenthesis,
                    ")",
                ),
                TokenKind::LeftSquareBracket => self.handle_opener(
                    &mut s,
                    token,
                    None,
                    Some(NodeKind::Index),
                    TokenKind::RightSquareBracket,
                    "]",
                ),
                TokenKind::LeftBrace => self.handle_opener(
                    &mut s,
                    token,
                    Some(NodeKind::InitialiserList),
                    None,
                    TokenKind::RightBrace,
                    "}",
                ),
                TokenKind::RightParenthesis
                | TokenKind::RightSquareBracket
                | TokenKind::RightBrace => self.handle_closer(&mut s, token, is_conditional),
                TokenKind::Dot => self.handle_dot(&mut s, token),
                TokenKind::Comma => self.handle_comma(&mut s),
                kind => {
                    if let Some(node_kind) = literal_kind(kind) {
                        if s.state == State::PostOperand {
                            s.terminated = true;
                        } else {
                            s.add_operand(node_kind, token);
                            s.state = State::PostOperand;
                        }
                        true
                    } else if let Some((node_kind, op)) = binary_op(kind) {
                        self.handle_binary_op(&mut s, token, node_kind, op)
                    } else if s.state == State::PreOperand {
                        if kind == TokenKind::Unknown {
                            self.add_error("unrecognised token");
                        } else {
                            self.add_error("expected expression");
                        }
                        false
                    } else {
                        s.terminated = true;
                        true
                    }
                }
            };
            if !parses {
                return Err(Resume::NextStatement);
            }
        }

        if let Some(group) = s
            .groups
            .last()
            .and_then(|&g| s.operators[g].group.as_ref())
        {
            let message = format!("expected '{}'", group.closer_text);
            self.add_error_at(&group.opener, &message);
            return Err(Resume::NextStatement);
        }

        // Leave the terminating token for the caller
        self.undo();
        match s.assemble() {
            Some(node) => Ok(node),
            None => {
                self.add_error("expected expression");
                Err(Resume::NextStatement)
            }
        }
    }

    fn handle_identifier(
        &mut self,
        s: &mut Shunt,
        token: &Token,
    ) -> bool {
        if s.state == State::PostOperand {
            s.terminated = true;
            return true;
        }
        if self.parse_expression_identifier(s, token).is_none() {
            return false;
        }
        s.state = State::PostOperand;
        true
    }

    /// Identifier operand, folding `Name<T, ...>` into a `Template` operand
    /// when `Name` is a registered template
    fn parse_expression_identifier(
        &mut self,
        s: &mut Shunt,
        token: &Token,
    ) -> Option<String> {
        s.add_operand(NodeKind::Identifier, token);
        let mut name = token.text.clone();
        if !self.is_template_name(&name) {
            return Some(name);
        }
        let opener = self.next();
        if opener.kind != TokenKind::LessThan {
            self.add_error("expected '<'");
            return None;
        }
        name.push('<');
        s.add_group(NodeKind::Template, opener, 1, TokenKind::GreaterThan, ">");
        loop {
            let subtype = self.next();
            if subtype.kind != TokenKind::Identifier {
                self.add_error("expected identifier");
                return None;
            }
            let subtype_name = self.parse_expression_identifier(s, subtype)?;
            name.push_str(&subtype_name);
            let separator = self.next();
            match separator.kind {
                TokenKind::Comma => {
                    name.push(',');
                    if let Some(group) = s.operators.last_mut() {
                        group.op.arity += 1;
                    }
                }
                TokenKind::GreaterThan => {
                    name.push('>');
                    s.groups.pop();
                    let Some(mut group) = s.operators.pop() else {
                        self.add_error("expected ',' or '>'");
                        return None;
                    };
                    group.node.text = name.clone();
                    group.op.arity += 1;
                    group.group = None;
                    s.rpn.push(group);
                    return Some(name);
                }
                _ => {
                    self.add_error("expected ',' or '>'");
                    return None;
                }
            }
        }
    }

    fn handle_sign(
        &mut self,
        s: &mut Shunt,
        token: &Token,
        unary: NodeKind,
        binary: NodeKind,
    ) {
        if s.state == State::PreOperand {
            s.handle_op(unary, token, PREFIX);
        } else {
            s.handle_op(binary, token, ADDITIVE);
            s.state = State::PreOperand;
        }
    }

    fn handle_binary_op(
        &mut self,
        s: &mut Shunt,
        token: &Token,
        kind: NodeKind,
        op: OpInfo,
    ) -> bool {
        if s.state == State::PreOperand {
            self.add_error("expected expression");
            return false;
        }
        s.handle_op(kind, token, op);
        s.state = State::PreOperand;
        true
    }

    fn handle_prefix_postfix(
        &mut self,
        s: &mut Shunt,
        token: &Token,
        prefix: NodeKind,
        postfix: NodeKind,
    ) {
        if s.state == State::PreOperand {
            s.handle_op(prefix, token, PREFIX);
        } else {
            s.handle_op(postfix, token, POSTFIX);
        }
    }

    /// Member access binds tighter than any operator, so the `Dot` goes
    /// straight to the output after its member name
    fn handle_dot(
        &mut self,
        s: &mut Shunt,
        token: &Token,
    ) -> bool {
        if s.state == State::PreOperand {
            self.add_error("expected expression");
            return false;
        }
        let member = self.next();
        if member.kind != TokenKind::Identifier {
            self.add_error("expected identifier");
            return false;
        }
        s.add_operand(NodeKind::Identifier, member);
        s.increment_group_members();
        s.rpn.push(Entry::operator(
            node_from(NodeKind::Dot, token),
            OpInfo::new(0, Association::Left, 2),
        ));
        s.state = State::PostOperand;
        true
    }

    fn handle_opener(
        &mut self,
        s: &mut Shunt,
        token: &Token,
        prefix: Option<NodeKind>,
        postfix: Option<NodeKind>,
        closer: TokenKind,
        closer_text: &'static str,
    ) -> bool {
        if s.state == State::PreOperand {
            let Some(kind) = prefix else {
                self.add_error("expected expression");
                return false;
            };
            s.add_group(kind, token, 0, closer, closer_text);
            return true;
        }
        let Some(kind) = postfix else {
            s.terminated = true;
            return true;
        };
        // The callee or indexed value counts as the first member
        s.add_group(kind, token, 1, closer, closer_text);
        s.state = State::PreOperand;
        true
    }

    fn handle_closer(
        &mut self,
        s: &mut Shunt,
        token: &Token,
        is_conditional: bool,
    ) -> bool {
        let Some(&g) = s.groups.last() else {
            // Closer without an opener ends the expression
            if s.state == State::PreOperand {
                self.add_error("expected expression");
                return false;
            }
            s.terminated = true;
            return true;
        };
        let Some(group) = s.operators[g].group.clone() else {
            self.add_error("expected expression");
            return false;
        };
        if token.kind != group.closer {
            let message = format!("expected '{}'", group.closer_text);
            self.add_error_at(&group.opener, &message);
            return false;
        }
        s.pop_to_group();
        let Some(mut entry) = s.operators.pop() else {
            self.add_error("expected expression");
            return false;
        };
        let kind = entry.node.kind;
        if group.num_members > 0 {
            if s.state == State::PreOperand {
                self.add_error("expected expression");
                return false;
            }
            entry.op.arity += 1;
        } else if matches!(kind, NodeKind::Parenthesis | NodeKind::Index) {
            self.add_error("expected expression");
            return false;
        }
        if kind == NodeKind::Parenthesis && s.groups.len() == 1 && is_conditional {
            // Final closer of a conditional expression
            self.next();
            s.terminated = true;
        }
        s.groups.pop();
        entry.group = None;
        s.rpn.push(entry);
        s.state = State::PostOperand;
        true
    }

    fn handle_comma(
        &mut self,
        s: &mut Shunt,
    ) -> bool {
        if s.state == State::PreOperand {
            self.add_error("expected expression");
            return false;
        }
        let Some(&g) = s.groups.last() else {
            // Outside any group a comma belongs to the enclosing statement
            s.terminated = true;
            return true;
        };
        if s.operators[g].node.kind == NodeKind::Parenthesis {
            self.add_error("");
            return false;
        }
        s.pop_to_group();
        if let Some(group) = s.operators.last_mut() {
            group.op.arity += 1;
        }
        s.state = State::PreOperand;
        true
    }
}
