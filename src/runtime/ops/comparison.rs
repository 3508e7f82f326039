//! Comparison and test operations
//!
//! Every comparison pushes 1 when it holds and 0 otherwise. The `_s`/`_u`
//! variants interpret both operands as signed or unsigned.

use super::{RuntimeError, Stack};

fn relop<T>(stack: &mut Stack, convert: fn(i32) -> T, op: fn(T, T) -> bool) -> Result<(), RuntimeError> {
    let c2 = convert(stack.pop()?);
    let c1 = convert(stack.pop()?);
    stack.push(op(c1, c2) as i32);
    Ok(())
}

fn signed(v: i32) -> i32 {
    v
}

fn unsigned(v: i32) -> u32 {
    v as u32
}

/// i32.eqz - test for zero
pub fn i32_eqz(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c = stack.pop()?;
    stack.push((c == 0) as i32);
    Ok(())
}

pub fn i32_eq(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, signed, |a, b| a == b)
}

pub fn i32_ne(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, signed, |a, b| a != b)
}

pub fn i32_lt_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, signed, |a, b| a < b)
}

pub fn i32_lt_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, unsigned, |a, b| a < b)
}

pub fn i32_gt_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, signed, |a, b| a > b)
}

pub fn i32_gt_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, unsigned, |a, b| a > b)
}

pub fn i32_le_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, signed, |a, b| a <= b)
}

pub fn i32_le_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, unsigned, |a, b| a <= b)
}

pub fn i32_ge_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, signed, |a, b| a >= b)
}

pub fn i32_ge_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    relop(stack, unsigned, |a, b| a >= b)
}
