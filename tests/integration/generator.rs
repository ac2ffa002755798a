//! End-to-end compilation: parse, analyse, lower and generate

use etch::frontend::config::{CompilerConfig, GeneratorConfig};
use etch::frontend::Compiler;
use etch::vm::{Function, Opcode, TypeIds};

use crate::common::*;

const PROGRAM: &str = "\
function add(a : Int32, b : Int32) : Int32
    return a + b;
endfunction
function main()
    var total = 0;
    var i = 0;
    while (i < 3)
        total += add(i, 2);
        i += 1;
    endwhile
    print(\"done\");
endfunction
";

fn reserved(function: &Function) -> Vec<Option<Opcode>> {
    function.instructions.iter().map(|i| i.reserved()).collect()
}

#[test]
fn test_program_compiles() {
    let exe = compile_ok(PROGRAM);

    assert_eq!(exe.name, FILENAME);
    let names: Vec<&str> = exe.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["add", "main"]);
    assert_eq!(exe.strings.iter().collect::<Vec<_>>(), vec!["done"]);
    // 0, 3, 2 and 1
    assert_eq!(exe.constants.len(), 4);
}

#[test]
fn test_function_with_result() {
    let exe = compile_ok(PROGRAM);
    let add = exe.find_function("add").unwrap();

    assert_eq!(add.num_parameters, 2);
    assert_eq!(add.return_type_id, TypeIds::INT32);
    assert_eq!(
        reserved(add),
        vec![
            Some(Opcode::PushVariable),
            Some(Opcode::PushVariable),
            Some(Opcode::PrimitiveAdd),
            Some(Opcode::ReturnValue),
        ]
    );
}

#[test]
fn test_loop_body_and_calls() {
    let (_, print) = bindings();
    let exe = compile_ok(PROGRAM);
    let main = exe.find_function("main").unwrap();

    let expected = vec![
        Some(Opcode::PushConstant),
        Some(Opcode::VariableDeclareAssign),
        Some(Opcode::PushConstant),
        Some(Opcode::VariableDeclareAssign),
        Some(Opcode::PushVariable),
        Some(Opcode::PushConstant),
        Some(Opcode::PrimitiveLessThan),
        Some(Opcode::JumpIfFalse),
        Some(Opcode::PushVariable),
        Some(Opcode::PushConstant),
        Some(Opcode::InvokeUserDefinedFreeFunction),
        Some(Opcode::VariablePrimitiveInplaceAdd),
        Some(Opcode::PushConstant),
        Some(Opcode::VariablePrimitiveInplaceAdd),
        Some(Opcode::Jump),
        Some(Opcode::PushString),
        None,
        Some(Opcode::Return),
    ];
    assert_eq!(reserved(main), expected);

    let at = |pc: usize| main.instructions[pc];
    assert_eq!(at(7).index, 15);
    assert_eq!(at(14).index, 4);
    assert_eq!(at(10).index, 0);
    assert_eq!(at(16).opcode, print);
    // both `= 0` initialisers share a constant
    assert_eq!(at(0).index, at(2).index);
    assert_eq!((at(11).index, at(13).index), (0, 1));
}

#[test]
fn test_line_table() {
    let exe = compile_ok(PROGRAM);
    let main = exe.find_function("main").unwrap();
    assert_eq!(
        main.pc_to_line.iter().map(|(p, l)| (*p, *l)).collect::<Vec<_>>(),
        vec![(0, 5), (2, 6), (4, 7), (8, 8), (12, 9), (14, 10), (15, 11), (17, 12)]
    );
}

#[test]
fn test_analysis_errors_stop_the_pipeline() {
    let errors = compile_errors("function main()\n    x = 1;\n    shout(\"hi\");\nendfunction\n");
    assert_eq!(
        errors,
        vec![
            error_at(2, "undeclared identifier 'x'"),
            error_at(3, "unknown function 'shout'"),
        ]
    );
}

#[test]
fn test_parse_errors_skip_analysis() {
    let errors = compile_errors("function main()\n    var x = ;\nendfunction\n");
    assert_eq!(errors, vec![error_at(2, "error at ';', expected expression")]);
}

#[test]
fn test_unbound_module_function_reported_by_generator() {
    let files = sources(&[(FILENAME, "function main()\n    print(\"hi\");\nendfunction\n")]);
    let bindings = etch::vm::BuiltinBindings::new();
    let errors = Compiler::new(CompilerConfig::default())
        .compile(&files, &mut TestAnalyser::new(), &bindings)
        .unwrap_err();
    assert_eq!(
        errors.to_strings(),
        vec![error_at(0, "unable to find function 'print(String)'")]
    );
}

#[test]
fn test_table_overflow_is_a_diagnostic() {
    let config = CompilerConfig::default().with_generator(GeneratorConfig {
        max_strings: 0,
        ..GeneratorConfig::default()
    });
    let (bindings, _) = bindings();
    let errors = Compiler::new(config)
        .compile(&sources(&[(FILENAME, PROGRAM)]), &mut TestAnalyser::new(), &bindings)
        .unwrap_err();
    assert_eq!(
        errors.to_strings(),
        vec![error_at(0, "string table exceeds the maximum of 0 entries")]
    );
}

#[test]
fn test_for_loop_and_branches() {
    let exe = compile_ok(
        "\
function main()
    var odd = 0;
    for (k in 0 : 10)
        if (k % 2 == 1)
            odd += 1;
        elseif (k > 8)
            break;
        else
            continue;
        endif
    endfor
endfunction
",
    );
    let main = exe.find_function("main").unwrap();
    let ops = reserved(main);
    assert!(ops.contains(&Some(Opcode::ForRangeInit)));
    assert!(ops.contains(&Some(Opcode::ForRangeIterate)));
    assert!(ops.contains(&Some(Opcode::ForRangeTerminate)));
    assert!(ops.contains(&Some(Opcode::PrimitiveModulo)));
    assert_eq!(ops.last(), Some(&Some(Opcode::Return)));
    assert!(main.instructions.iter().all(|i| !i.is(Opcode::Unknown)));

    // break leaves the loop, continue goes back to the iterate step
    let pc_of = |op: Opcode| main.instructions.iter().position(|i| i.is(op)).unwrap();
    let iterate = pc_of(Opcode::ForRangeIterate) as u16;
    let terminate = pc_of(Opcode::ForRangeTerminate) as u16;
    assert_eq!(main.instructions[pc_of(Opcode::Break)].index, terminate);
    assert_eq!(main.instructions[pc_of(Opcode::Continue)].index, iterate);
    assert_eq!(main.instructions[iterate as usize].index, terminate);
}

#[test]
fn test_executable_serialises_to_json() {
    let exe = compile_ok(PROGRAM);
    let json = exe.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["name"], FILENAME);
    assert_eq!(value["functions"][0]["name"], "add");
    assert_eq!(value["strings"][0], "done");
}
