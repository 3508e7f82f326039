//! Execution engine
//!
//! A stack-based interpreter over the raw bytecode of a decoded [`Module`].
//! One [`executor::Interpreter`] owns the operand stack and the call stack;
//! linear memory stays with the module it was decoded into.

pub mod control;
pub mod executor;
pub mod frame;
pub mod memory;
pub mod ops;
pub mod stack;
pub mod test_utils;

pub use executor::Interpreter;
pub use memory::{Memory, MemoryError};

use std::fmt;

use crate::parser::instruction::InstructionError;
use crate::parser::module::Module;

/// Arithmetic faults. Division never wraps silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ArithmeticError {
    #[error("integer divide by zero")]
    DivisionByZero,
    #[error("integer overflow")]
    IntegerOverflow,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("unreachable executed")]
    Unreachable,
    #[error("arithmetic error: {0}")]
    Arithmetic(#[from] ArithmeticError),
    #[error("{0}")]
    MemoryOutOfBounds(MemoryError),
    #[error("stack underflow")]
    StackUnderflow,
    #[error("arity mismatch: expected {expected} result(s), found {actual}")]
    ArityMismatch { expected: usize, actual: usize },
    #[error("invalid opcode 0x{0:02x}")]
    InvalidOpcode(u8),
    #[error("unexpected end of bytecode")]
    UnexpectedEndOfBytecode,
    #[error("malformed immediate")]
    MalformedImmediate,
    #[error("unsupported block type 0x{0:02x}")]
    UnsupportedBlockType(u8),
    #[error("unknown function: {0}")]
    UnknownFunction(u32),
    #[error("local variable index out of bounds: {0}")]
    LocalIndexOutOfBounds(u32),
    #[error("argument count mismatch: expected {expected}, got {actual}")]
    ArgumentCountMismatch { expected: usize, actual: usize },
    #[error("invalid branch depth: {0}")]
    InvalidBranchDepth(u32),
    #[error("else without matching if")]
    UnexpectedElse,
    #[error("call stack exhausted")]
    CallStackExhausted,
    #[error("module has no start function")]
    NoStartFunction,
}

impl From<InstructionError> for RuntimeError {
    fn from(e: InstructionError) -> Self {
        match e {
            InstructionError::InvalidOpcode { opcode, .. } => RuntimeError::InvalidOpcode(opcode),
            InstructionError::UnexpectedEnd { .. } => RuntimeError::UnexpectedEndOfBytecode,
            InstructionError::MalformedImmediate { .. } => RuntimeError::MalformedImmediate,
            InstructionError::UnsupportedBlockType { byte, .. } => RuntimeError::UnsupportedBlockType(byte),
        }
    }
}

impl From<MemoryError> for RuntimeError {
    fn from(e: MemoryError) -> Self {
        RuntimeError::MemoryOutOfBounds(e)
    }
}

/// Where execution stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TrapContext {
    pub function: u32,
    /// Offset of the faulting instruction within the function body
    pub offset: usize,
    pub opcode: Option<u8>,
    /// Number of active frames, including the faulting one
    pub depth: usize,
}

impl fmt::Display for TrapContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "function {} at offset {}", self.function, self.offset)?;
        if let Some(opcode) = self.opcode {
            write!(f, ", opcode 0x{opcode:02x}")?;
        }
        write!(f, ", call depth {}", self.depth)
    }
}

/// A [`RuntimeError`] together with the place it was raised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} ({context})")]
pub struct ExecutionError {
    pub kind: RuntimeError,
    pub context: TrapContext,
}

/// Run the module's start function with `args`, returning the values it
/// leaves on the operand stack.
pub fn execute(module: &mut Module, args: &[i32]) -> Result<Vec<i32>, ExecutionError> {
    let start = module.start.ok_or(ExecutionError {
        kind: RuntimeError::NoStartFunction,
        context: TrapContext::default(),
    })?;
    invoke(module, start, args)
}

/// Run function `function_idx` with `args`, returning its results.
pub fn invoke(module: &mut Module, function_idx: u32, args: &[i32]) -> Result<Vec<i32>, ExecutionError> {
    Interpreter::new(module).invoke(function_idx, args)
}
