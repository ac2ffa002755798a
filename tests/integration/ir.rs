//! IR graphs built from analysed source

use std::rc::Rc;

use etch::frontend::analyser::Analyser;
use etch::frontend::config::CompilerConfig;
use etch::frontend::Compiler;
use etch::middle::ir::{IrGraph, IrNode};

use crate::common::{sources, TestAnalyser, FILENAME};

const SOURCE: &str = "\
function twice(n : Int32) : Int32
    return n + n;
endfunction
function main()
    var x = twice(4);
    x = twice(x);
endfunction
";

fn graph() -> IrGraph {
    let mut root = Compiler::new(CompilerConfig::default())
        .parse(&sources(&[(FILENAME, SOURCE)]))
        .unwrap();
    TestAnalyser::new().analyse(&mut root).unwrap();
    IrGraph::build(&root)
}

/// Body statements of function definition `index` in the only file
fn body(
    ir: &IrGraph,
    index: usize,
) -> &[IrNode] {
    let file = ir.root.block_children[0].as_block().unwrap();
    &file.block_children[index].as_block().unwrap().block_children
}

#[test]
fn test_entities_interned_once() {
    let ir = graph();

    let mut variables: Vec<&str> = ir.variables.iter().map(|v| v.name.as_str()).collect();
    variables.sort_unstable();
    assert_eq!(variables, vec!["n", "x"]);

    let mut functions: Vec<&str> = ir.functions.iter().map(|f| f.unique_name.as_str()).collect();
    functions.sort_unstable();
    assert_eq!(functions, vec!["main()", "twice(Int32)"]);

    assert_eq!(ir.types.iter().filter(|t| t.name == "Int32").count(), 1);
    assert!(ir.find_type("Void").is_some());
}

#[test]
fn test_uses_share_the_interned_entity() {
    let ir = graph();
    let twice = ir.find_function("twice(Int32)").unwrap();

    // `n + n` reads the parameter twice
    let sum = body(&ir, 0)[0].child(0).and_then(IrNode::as_expression).unwrap();
    let parameter = Rc::clone(&twice.parameter_variables()[0]);
    for operand in sum.operands() {
        assert!(Rc::ptr_eq(operand.variable.as_ref().unwrap(), &parameter));
    }

    // both calls in `main` resolve to the same function
    let statements = body(&ir, 1);
    let first = statements[0].child(1).and_then(IrNode::as_expression).unwrap();
    let second = statements[1].as_expression().and_then(|a| a.operand(1)).unwrap();
    assert!(Rc::ptr_eq(first.function.as_ref().unwrap(), twice));
    assert!(Rc::ptr_eq(second.function.as_ref().unwrap(), twice));
    assert!(Rc::ptr_eq(&twice.return_type().unwrap(), ir.find_type("Int32").unwrap()));
}

#[test]
fn test_clone_is_independent() {
    let ir = graph();
    let copy = ir.clone();

    let original = ir.find_function("twice(Int32)").unwrap();
    let cloned = copy.find_function("twice(Int32)").unwrap();
    assert!(!Rc::ptr_eq(original, cloned));

    let parameter = Rc::clone(&cloned.parameter_variables()[0]);
    assert!(copy.variables.iter().any(|v| Rc::ptr_eq(v, &parameter)));
    assert!(!ir.variables.iter().any(|v| Rc::ptr_eq(v, &parameter)));

    drop(ir);
    assert_eq!(parameter.ty().map(|t| t.name.clone()), Some("Int32".to_string()));
}
