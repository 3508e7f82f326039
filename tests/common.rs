//! Common test utilities shared between integration tests

#![allow(dead_code)]

use wasmlet::encoder::ModuleBuilder;
use wasmlet::parser::instruction::Instruction;
use wasmlet::parser::{FunctionType, ValueType};
use wasmlet::{ExecutionError, Module};

/// Signature with `params` i32 parameters and `results` i32 results
pub fn sig(params: usize, results: usize) -> FunctionType {
    FunctionType::new(vec![ValueType::I32; params], vec![ValueType::I32; results])
}

/// Binary for a module whose only function is also its start function
pub fn single_function(params: usize, results: usize, locals: u32, body: &[Instruction]) -> Vec<u8> {
    let mut builder = ModuleBuilder::new();
    let f = builder.function(sig(params, results), locals, body);
    builder.start(f);
    builder.encode()
}

pub fn decode(bytes: &[u8]) -> Module {
    wasmlet::parse(bytes).unwrap_or_else(|e| panic!("decode failed: {e}"))
}

/// Decode and run the start function
pub fn run(bytes: &[u8], args: &[i32]) -> Result<Vec<i32>, ExecutionError> {
    let mut module = decode(bytes);
    wasmlet::execute(&mut module, args)
}

pub fn konst(value: i32) -> Instruction {
    Instruction::I32Const { value }
}

pub fn get(local_idx: u32) -> Instruction {
    Instruction::LocalGet { local_idx }
}
