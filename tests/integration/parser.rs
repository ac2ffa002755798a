//! Parsing through the compiler front door

use etch::frontend::config::CompilerConfig;
use etch::frontend::parser::{Node, NodeKind};
use etch::frontend::Compiler;

use crate::common::sources;

#[test]
fn test_every_file_becomes_a_file_block() {
    let files = sources(&[
        ("token.etch", "function main()\nendfunction\n"),
        ("helpers.etch", "function double(x : Int32) : Int32\n    return x * 2;\nendfunction\n"),
    ]);
    let root = Compiler::new(CompilerConfig::default())
        .parse(&files)
        .unwrap_or_else(|errors| panic!("{}", errors));

    assert_eq!(root.kind, NodeKind::Root);
    let names: Vec<&str> = root.block_children.iter().map(Node::text).collect();
    assert_eq!(names, vec!["token.etch", "helpers.etch"]);
    assert!(root
        .block_children
        .iter()
        .all(|file| file.kind() == NodeKind::File));
}

#[test]
fn test_errors_from_every_file_are_collected() {
    let files = sources(&[
        ("a.etch", "$\nfunction f()\nendfunction\n"),
        ("b.etch", "function g()\nvar x : Int32 = ;\nendfunction\n"),
        ("c.etch", "function h()\nendfunction\n"),
    ]);
    let errors = Compiler::new(CompilerConfig::default())
        .parse(&files)
        .unwrap_err();
    assert_eq!(
        errors.to_strings(),
        vec![
            "a.etch: line 1: error: error at '$', unrecognised token",
            "b.etch: line 2: error: error at ';', expected expression",
        ]
    );
}

#[test]
fn test_oversized_file_rejected_alone() {
    const LIMIT: usize = 40;
    let big = format!("function main()\n{}\nendfunction\n", "// padding\n".repeat(8));
    let small = "function f()\nreturn 1 +;\nendfunction\n";
    assert!(big.len() > LIMIT);
    assert!(small.len() <= LIMIT);

    let config = CompilerConfig::default().with_max_source_size(LIMIT);
    let files = sources(&[("big.etch", big.as_str()), ("small.etch", small)]);
    let errors = Compiler::new(config).parse(&files).unwrap_err();
    assert_eq!(
        errors.to_strings(),
        vec![
            "big.etch: line 1: error: source file exceeds maximum size of 40 bytes",
            "small.etch: line 2: error: error at ';', expected expression",
        ]
    );
}

#[test]
fn test_registered_template_name() {
    let source = "function main()\nvar v : Vector<Int32>;\nendfunction\n";
    let mut compiler = Compiler::new(CompilerConfig::default());
    assert!(compiler.parse(&sources(&[("v.etch", source)])).is_err());

    compiler.add_template_name("Vector");
    let root = compiler.parse(&sources(&[("v.etch", source)])).unwrap();
    assert!(root.to_string().contains("Template 'Vector<Int32>'"));
}

#[test]
fn test_tree_dump() {
    let source = "function main()\n    while (true)\n        break;\n    endwhile\nendfunction\n";
    let root = Compiler::new(CompilerConfig::default())
        .parse(&sources(&[("loop.etch", source)]))
        .unwrap();
    let dump = root.to_string();
    assert!(dump.contains("FunctionDefinition 'function' (line 1)"));
    assert!(dump.contains("WhileStatement 'while' (line 2)"));
    assert!(dump.contains("BreakStatement 'break' (line 3)"));
    assert!(dump.contains("endwhile (line 4)"));
}
