//! Numeric operations
//!
//! Constants, arithmetic and the bit-counting unary operators for i32.
//! Arithmetic wraps modulo 2^32 except division: a zero divisor and
//! `i32::MIN / -1` are faults.

use super::{RuntimeError, Stack};
use crate::runtime::ArithmeticError;

// ============================================================================
// Constants
// ============================================================================

/// i32.const
pub fn i32_const(stack: &mut Stack, value: i32) -> Result<(), RuntimeError> {
    stack.push(value);
    Ok(())
}

// ============================================================================
// Unary operations
// ============================================================================

/// i32.clz - count leading zero bits
pub fn i32_clz(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c = stack.pop_u32()?;
    stack.push(c.leading_zeros() as i32);
    Ok(())
}

/// i32.ctz - count trailing zero bits
pub fn i32_ctz(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c = stack.pop_u32()?;
    stack.push(c.trailing_zeros() as i32);
    Ok(())
}

/// i32.popcnt - count set bits
pub fn i32_popcnt(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c = stack.pop_u32()?;
    stack.push(c.count_ones() as i32);
    Ok(())
}

// ============================================================================
// Binary operations
// ============================================================================

/// i32.add
/// 1. Pop value c2 from stack
/// 2. Pop value c1 from stack
/// 3. Push c1 + c2 modulo 2^32
pub fn i32_add(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop()?;
    let c1 = stack.pop()?;
    stack.push(c1.wrapping_add(c2));
    Ok(())
}

/// i32.sub
/// 1. Pop value c2 from stack
/// 2. Pop value c1 from stack
/// 3. Push c1 - c2 modulo 2^32
pub fn i32_sub(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop()?;
    let c1 = stack.pop()?;
    stack.push(c1.wrapping_sub(c2));
    Ok(())
}

/// i32.mul
pub fn i32_mul(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop()?;
    let c1 = stack.pop()?;
    stack.push(c1.wrapping_mul(c2));
    Ok(())
}

/// i32.div_s
/// 1. Pop value c2 from stack
/// 2. Pop value c1 from stack
/// 3. If c2 is 0, fault
/// 4. If c1 / c2 is not representable (i32::MIN / -1), fault
/// 5. Push c1 / c2, truncated toward zero
pub fn i32_div_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop()?;
    let c1 = stack.pop()?;
    if c2 == 0 {
        return Err(ArithmeticError::DivisionByZero.into());
    }
    let result = c1.checked_div(c2).ok_or(ArithmeticError::IntegerOverflow)?;
    stack.push(result);
    Ok(())
}

/// i32.div_u
pub fn i32_div_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_u32()?;
    let c1 = stack.pop_u32()?;
    if c2 == 0 {
        return Err(ArithmeticError::DivisionByZero.into());
    }
    stack.push((c1 / c2) as i32);
    Ok(())
}

/// i32.rem_s
///
/// The result takes the sign of the dividend. `i32::MIN % -1` is 0.
pub fn i32_rem_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop()?;
    let c1 = stack.pop()?;
    if c2 == 0 {
        return Err(ArithmeticError::DivisionByZero.into());
    }
    stack.push(c1.wrapping_rem(c2));
    Ok(())
}

/// i32.rem_u
pub fn i32_rem_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_u32()?;
    let c1 = stack.pop_u32()?;
    if c2 == 0 {
        return Err(ArithmeticError::DivisionByZero.into());
    }
    stack.push((c1 % c2) as i32);
    Ok(())
}
