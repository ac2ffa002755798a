//! Executable artifact tests

use crate::vm::executable::{Executable, Function, Instruction};
use crate::vm::opcode::Opcode;
use crate::vm::types::TypeIds;

#[test]
fn test_function_slots() {
    let mut function = Function::new("main", Vec::new(), TypeIds::VOID);
    assert_eq!(function.add_parameter("a", TypeIds::INT32), 0);
    assert_eq!(function.add_variable("s", TypeIds::STRING, 1), 1);
    assert_eq!(function.num_parameters, 1);
    assert_eq!(function.variables[1].scope_number, 1);
}

#[test]
fn test_line_for_pc() {
    let mut function = Function::new("main", Vec::new(), TypeIds::VOID);
    function.pc_to_line.insert(0, 3);
    function.pc_to_line.insert(4, 5);
    assert_eq!(function.line_for_pc(0), Some(3));
    assert_eq!(function.line_for_pc(3), Some(3));
    assert_eq!(function.line_for_pc(9), Some(5));
}

#[test]
fn test_instruction_builder() {
    let instruction = Instruction::new(Opcode::Destruct)
        .with_index(1)
        .with_type(TypeIds::BOOL)
        .with_data(2);
    assert!(instruction.is(Opcode::Destruct));
    assert_eq!(instruction.reserved(), Some(Opcode::Destruct));
    assert_eq!((instruction.index, instruction.type_id, instruction.data), (1, TypeIds::BOOL, 2));
}

#[test]
fn test_disassemble_lists_instructions() {
    let mut executable = Executable::new("unit");
    let mut function = Function::new("main", Vec::new(), TypeIds::VOID);
    function.add_instruction(Instruction::new(Opcode::Return));
    executable.functions.push(function);
    let listing = executable.disassemble();
    assert!(listing.contains("function main"));
    assert!(listing.contains("Return"));
    assert!(executable.find_function("main").is_some());
    assert!(executable.find_function("other").is_none());
}
