//! Instruction semantics
//!
//! Handlers grouped by instruction category. Each one pops its operands from
//! the shared operand stack and pushes its result; binary operators pop the
//! right-hand operand first.

pub mod bitwise;
pub mod comparison;
pub mod control;
pub mod memory;
pub mod numeric;
pub mod parametric;
pub mod variable;

pub(crate) use crate::parser::instruction::MemArg;
pub(crate) use crate::runtime::memory::Memory;
pub(crate) use crate::runtime::stack::Stack;
pub(crate) use crate::runtime::RuntimeError;
