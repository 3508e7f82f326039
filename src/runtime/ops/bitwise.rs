//! Bitwise operations
//!
//! Shift and rotate counts are taken modulo 32.

use super::{RuntimeError, Stack};

/// i32.and
pub fn i32_and(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop()?;
    let c1 = stack.pop()?;
    stack.push(c1 & c2);
    Ok(())
}

/// i32.or
pub fn i32_or(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop()?;
    let c1 = stack.pop()?;
    stack.push(c1 | c2);
    Ok(())
}

/// i32.xor
pub fn i32_xor(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop()?;
    let c1 = stack.pop()?;
    stack.push(c1 ^ c2);
    Ok(())
}

/// i32.shl
pub fn i32_shl(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_u32()?;
    let c1 = stack.pop()?;
    stack.push(c1.wrapping_shl(c2));
    Ok(())
}

/// i32.shr_s - arithmetic shift, replicating the sign bit
pub fn i32_shr_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_u32()?;
    let c1 = stack.pop()?;
    stack.push(c1.wrapping_shr(c2));
    Ok(())
}

/// i32.shr_u - logical shift, filling with zeros
pub fn i32_shr_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_u32()?;
    let c1 = stack.pop_u32()?;
    stack.push(c1.wrapping_shr(c2) as i32);
    Ok(())
}

/// i32.rotl
pub fn i32_rotl(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_u32()?;
    let c1 = stack.pop_u32()?;
    stack.push(c1.rotate_left(c2 % 32) as i32);
    Ok(())
}

/// i32.rotr
pub fn i32_rotr(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_u32()?;
    let c1 = stack.pop_u32()?;
    stack.push(c1.rotate_right(c2 % 32) as i32);
    Ok(())
}
