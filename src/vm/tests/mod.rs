//! Bytecode and value model tests

pub mod executable;
pub mod value;
