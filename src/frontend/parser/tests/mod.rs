//! Parser tests module


use crate::frontend::config::ParserConfig;
use crate::frontend::parser::ast::{BlockNode, ExpressionNode, Node, NodeKind};
use crate::frontend::parser::Parser;
use crate::util::span::SourceFile;

const FILENAME: &str = "test.etch";

/// Parse one file and return its `File` block
fn parse_file(source: &str) -> BlockNode {
    let root = Parser::new()
        .parse(&[SourceFile::new(FILENAME, source)])
        .unwrap_or_else(|errors| panic!("unexpected errors: {:?}", errors));
    assert_eq!(root.kind, NodeKind::Root);
    match root.block_children.into_iter().next() {
        Some(Node::Block(file)) => file,
        other => panic!("expected file block, got {:?}", other),
    }
}

/// Parse one file that must fail and return the rendered diagnostics
fn parse_errors(source: &str) -> Vec<String> {
    match Parser::new().parse(&[SourceFile::new(FILENAME, source)]) {
        Ok(root) => panic!("expected errors, got tree:\n{}", root),
        Err(errors) => errors.iter().map(ToString::to_string).collect(),
    }
}

/// Body statements of the single function in `source`
fn function_body(source: &str) -> Vec<Node> {
    let file = parse_file(source);
    let function = file.block_children.into_iter().next().expect("function");
    match function {
        Node::Block(block) => {
            assert_eq!(block.kind, NodeKind::FunctionDefinition);
            block.block_children
        }
        other => panic!("expected function definition, got {:?}", other),
    }
}

/// Wrap statements in a function so scope rules allow them
fn in_function(statements: &str) -> String {
    format!("function main()\n{}\nendfunction\n", statements)
}

fn expr(source: &str) -> ExpressionNode {
    Parser::new()
        .parse_expression(source)
        .unwrap_or_else(|errors| panic!("unexpected errors: {:?}", errors))
}

/// Prefix rendering: leaves print their text, operators `Kind(a, b)`
fn sexpr(node: &ExpressionNode) -> String {
    if node.children.is_empty() {
        return node.text.clone();
    }
    let operands: Vec<String> = node.operands().map(sexpr).collect();
    format!("{:?}({})", node.kind, operands.join(", "))
}

#[test]
fn test_parser_with_config_template_names() {
    let config = ParserConfig {
        template_names: vec!["Vector".to_string()],
        ..ParserConfig::default()
    };
    let mut parser = Parser::with_config(&config);
    assert!(parser.is_template_name("Vector"));
    assert!(!parser.is_template_name("Array"));
    parser.add_template_name("Array");
    assert!(parser.is_template_name("Array"));
}

#[test]
fn test_empty_source_gives_empty_file() {
    let file = parse_file("");
    assert_eq!(file.kind, NodeKind::File);
    assert_eq!(file.text, FILENAME);
    assert!(file.block_children.is_empty());
}

#[test]
fn test_one_file_block_per_source() {
    let root = Parser::new()
        .parse(&[
            SourceFile::new("a.etch", "function a()\nendfunction"),
            SourceFile::new("b.etch", "function b()\nendfunction"),
        ])
        .unwrap();
    let names: Vec<&str> = root.block_children.iter().map(Node::text).collect();
    assert_eq!(names, vec!["a.etch", "b.etch"]);
}

#[test]
fn test_oversized_file_rejected() {
    let config = ParserConfig {
        max_source_size: 16,
        ..ParserConfig::default()
    };
    let errors = Parser::with_config(&config)
        .parse(&[
            SourceFile::new("big.etch", "function main()\nendfunction"),
            SourceFile::new("bad.etch", "var x = 1;"),
        ])
        .unwrap_err();
    let rendered: Vec<String> = errors.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "big.etch: line 1: error: source file exceeds maximum size of 16 bytes",
            "bad.etch: line 1: error: error at 'var', variable declaration not permitted at topmost scope",
        ]
    );
}

#[test]
fn test_tree_display() {
    let file = parse_file("persistent total : Int64;");
    let dump = file.to_string();
    assert!(dump.starts_with("File 'test.etch' (line 0)"));
    assert!(dump.contains("PersistentStatement 'persistent' (line 1)"));
    assert!(dump.contains("Identifier 'total' (line 1)"));
    assert!(dump.contains("    -"));
}
