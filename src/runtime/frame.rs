//! Activation frame
//!
//! One per active call: locals, instruction pointer, operand-stack base and
//! the control-flow bookkeeping for the function's bytecode.

use super::control::{FlowState, Marker, MarkerKind};
use crate::parser::instruction::BlockType;
use crate::parser::module::{Function, ValueType};

#[derive(Debug)]
pub struct Frame {
    /// Function index in the module
    pub function_idx: u32,
    /// Offset of the next instruction in the function body
    pub ip: usize,
    /// Parameters followed by declared locals
    pub locals: Vec<i32>,
    /// Operand stack depth at entry, after the arguments were popped
    pub stack_base: usize,
    pub result_count: usize,
    pub end_stack: Vec<Marker>,
    pub state: FlowState,
}

impl Frame {
    /// `args` fill the leading local slots; the rest are zeroed.
    pub fn new(function_idx: u32, function: &Function, args: Vec<i32>, stack_base: usize) -> Frame {
        let mut locals = args;
        locals.resize(function.frame_size(), 0);

        let block_type = match function.result_count {
            0 => BlockType::Empty,
            _ => BlockType::Value(ValueType::I32),
        };

        Frame {
            function_idx,
            ip: 0,
            locals,
            stack_base,
            result_count: function.result_count as usize,
            end_stack: vec![Marker {
                kind: MarkerKind::Block,
                block_type,
                stack_height: stack_base,
                start: 0,
            }],
            state: FlowState::Normal,
        }
    }
}
