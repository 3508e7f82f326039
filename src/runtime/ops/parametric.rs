//! Parametric operations

use super::{RuntimeError, Stack};

/// drop - discard the top of the stack
pub fn drop(stack: &mut Stack) -> Result<(), RuntimeError> {
    stack.pop()?;
    Ok(())
}
