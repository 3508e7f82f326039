//! Operand stack
//!
//! One stack is shared by every frame. The floor marks the current frame's
//! operand-stack base: pops never reach below it.

use super::RuntimeError;

#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<i32>,
    floor: usize,
}

impl Stack {
    /// Create a new empty stack
    pub fn new() -> Self {
        Stack {
            values: Vec::new(),
            floor: 0,
        }
    }

    pub fn push(&mut self, value: i32) {
        self.values.push(value);
    }

    pub fn push_all(&mut self, values: impl IntoIterator<Item = i32>) {
        self.values.extend(values);
    }

    /// Pop a value, failing if only values below the floor remain
    pub fn pop(&mut self) -> Result<i32, RuntimeError> {
        if self.values.len() <= self.floor {
            return Err(RuntimeError::StackUnderflow);
        }
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Pop a value reinterpreted as unsigned
    pub fn pop_u32(&mut self) -> Result<u32, RuntimeError> {
        self.pop().map(|v| v as u32)
    }

    /// Peek at the top value without removing it
    pub fn peek(&self) -> Result<i32, RuntimeError> {
        if self.values.len() <= self.floor {
            return Err(RuntimeError::StackUnderflow);
        }
        self.values.last().copied().ok_or(RuntimeError::StackUnderflow)
    }

    /// Total depth, including values below the floor
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[cfg(test)]
    pub fn floor(&self) -> usize {
        self.floor
    }

    pub fn set_floor(&mut self, floor: usize) {
        self.floor = floor;
    }

    /// Pop the top `n` values, returned in stack order (deepest first)
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<i32>, RuntimeError> {
        if self.values.len() < self.floor + n {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(self.values.split_off(self.values.len() - n))
    }

    /// Discard everything above `height`. Never cuts below the floor.
    pub fn truncate(&mut self, height: usize) {
        self.values.truncate(height.max(self.floor));
    }

    /// Remove and return every value
    pub fn drain(&mut self) -> Vec<i32> {
        self.floor = 0;
        std::mem::take(&mut self.values)
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.floor = 0;
    }

    #[cfg(test)]
    pub fn values(&self) -> &[i32] {
        &self.values
    }
}
