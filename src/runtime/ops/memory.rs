//! Memory operations
//!
//! Loads and stores pop the dynamic address (and for stores the value) and
//! delegate to linear memory with the static offset from the memarg. The
//! alignment hint is ignored.

use super::{MemArg, Memory, RuntimeError, Stack};
use crate::runtime::memory::Width;

/// i32.load, i32.load8_s/u, i32.load16_s/u
///
/// 1. Pop the address i
/// 2. Let ea be i + memarg.offset, computed without wrapping
/// 3. If ea + width exceeds the memory size, fault
/// 4. Read width bytes little-endian, extend to 32 bits, push
pub fn load(stack: &mut Stack, memory: &Memory, memarg: &MemArg, width: Width, signed: bool) -> Result<(), RuntimeError> {
    let address = stack.pop_u32()?;
    let value = memory.load(address, memarg.offset, width, signed)?;
    stack.push(value as i32);
    Ok(())
}

/// i32.store, i32.store8, i32.store16
///
/// 1. Pop the value c
/// 2. Pop the address i
/// 3. Bounds-check as for loads, then write the low width bytes of c
pub fn store(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg, width: Width) -> Result<(), RuntimeError> {
    let value = stack.pop_u32()?;
    let address = stack.pop_u32()?;
    memory.store(address, memarg.offset, width, value)?;
    Ok(())
}

/// memory.size
pub fn memory_size(stack: &mut Stack, memory: &Memory) -> Result<(), RuntimeError> {
    stack.push(memory.page_count() as i32);
    Ok(())
}

/// memory.grow
///
/// Pushes the previous page count, or -1 if the memory cannot grow by the
/// requested number of pages.
pub fn memory_grow(stack: &mut Stack, memory: &mut Memory) -> Result<(), RuntimeError> {
    let delta = stack.pop_u32()?;
    let result = match memory.grow(delta) {
        Ok(previous) => previous as i32,
        Err(e) => {
            tracing::debug!(error = %e, "memory.grow refused");
            -1
        }
    };
    stack.push(result);
    Ok(())
}
