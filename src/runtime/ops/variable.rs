//! Variable operations
//!
//! Access to the current frame's locals (parameters first, then declared
//! locals).

use super::{RuntimeError, Stack};
use crate::runtime::frame::Frame;

/// local.get x
///
/// 1. Let F be the current frame.
/// 2. Let val be the value F.locals[x].
/// 3. Push the value val to the stack.
pub fn local_get(stack: &mut Stack, frame: &Frame, local_idx: u32) -> Result<(), RuntimeError> {
    let value = *frame
        .locals
        .get(local_idx as usize)
        .ok_or(RuntimeError::LocalIndexOutOfBounds(local_idx))?;
    stack.push(value);
    Ok(())
}

/// local.set x
///
/// 1. Pop the value val from the stack.
/// 2. Replace F.locals[x] with the value val.
pub fn local_set(stack: &mut Stack, frame: &mut Frame, local_idx: u32) -> Result<(), RuntimeError> {
    let slot = frame
        .locals
        .get_mut(local_idx as usize)
        .ok_or(RuntimeError::LocalIndexOutOfBounds(local_idx))?;
    *slot = stack.pop()?;
    Ok(())
}

/// local.tee x
///
/// Like local.set, but the value stays on the stack.
pub fn local_tee(stack: &mut Stack, frame: &mut Frame, local_idx: u32) -> Result<(), RuntimeError> {
    let value = stack.peek()?;
    let slot = frame
        .locals
        .get_mut(local_idx as usize)
        .ok_or(RuntimeError::LocalIndexOutOfBounds(local_idx))?;
    *slot = value;
    Ok(())
}
