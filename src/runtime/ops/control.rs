//! Control instructions
//!
//! Structured control flow over the raw instruction stream. `block`, `loop`
//! and `if` push a marker on the frame's end-stack; `else` and `end` resolve
//! against the innermost one. Forward exits (a false `if`, the end of a taken
//! `then` arm, a branch out of a block) put the frame into a skipping state
//! instead of scanning ahead, and [`skip`] walks the instructions until the
//! pending marker is closed. A branch to a loop resets the instruction
//! pointer to the loop's first instruction.

use super::{RuntimeError, Stack};
use crate::parser::instruction::{BlockType, Instruction};
use crate::runtime::control::{Flow, FlowState, Marker, MarkerKind};
use crate::runtime::frame::Frame;

/// unreachable - unconditional trap
pub fn unreachable() -> Result<Flow, RuntimeError> {
    Err(RuntimeError::Unreachable)
}

/// block / loop - open a construct. `frame.ip` already points at its first
/// instruction.
pub fn enter(stack: &Stack, frame: &mut Frame, kind: MarkerKind, block_type: BlockType) -> Flow {
    frame.end_stack.push(Marker {
        kind,
        block_type,
        stack_height: stack.len(),
        start: frame.ip,
    });
    Flow::Continue
}

/// if - pop the condition; on zero skip to the matching `else` or `end`
pub fn if_(stack: &mut Stack, frame: &mut Frame, block_type: BlockType) -> Result<Flow, RuntimeError> {
    let condition = stack.pop()?;
    enter(stack, frame, MarkerKind::If, block_type);
    if condition == 0 {
        frame.state = FlowState::SkippingInactiveIf {
            depth: frame.end_stack.len(),
        };
    }
    Ok(Flow::Continue)
}

/// else - reached while executing the `then` arm: skip the `else` arm
pub fn else_(frame: &mut Frame) -> Result<Flow, RuntimeError> {
    match frame.end_stack.last() {
        Some(marker) if marker.kind == MarkerKind::If => {
            frame.state = FlowState::SkippingTakenIfElse {
                depth: frame.end_stack.len(),
            };
            Ok(Flow::Continue)
        }
        _ => Err(RuntimeError::UnexpectedElse),
    }
}

/// end - close the innermost construct. Closing the function body returns.
pub fn end(frame: &mut Frame) -> Flow {
    frame.end_stack.pop();
    if frame.end_stack.is_empty() {
        Flow::Return
    } else {
        Flow::Continue
    }
}

/// br l - unconditional branch to the l-th enclosing label
///
/// A loop label restarts the loop with the operand stack cut back to its
/// entry height. Any other label keeps its result values, discards the rest
/// of the construct's operands and skips to the construct's `end`. The
/// outermost label is the function body, so branching to it returns.
pub fn br(stack: &mut Stack, frame: &mut Frame, label_idx: u32) -> Result<Flow, RuntimeError> {
    let depth = frame.end_stack.len();
    if label_idx as usize >= depth {
        return Err(RuntimeError::InvalidBranchDepth(label_idx));
    }
    let target = depth - 1 - label_idx as usize;
    let marker = frame.end_stack[target];

    if marker.kind == MarkerKind::Loop {
        stack.truncate(marker.stack_height);
        frame.end_stack.truncate(target + 1);
        frame.ip = marker.start;
        return Ok(Flow::Continue);
    }

    let results = stack.pop_n(marker.branch_arity())?;
    stack.truncate(marker.stack_height);
    stack.push_all(results);

    if target == 0 {
        frame.end_stack.clear();
        return Ok(Flow::Return);
    }
    frame.state = FlowState::SkippingToEnd { depth: target + 1 };
    Ok(Flow::Continue)
}

/// br_if l - pop the condition and branch if it is non-zero
pub fn br_if(stack: &mut Stack, frame: &mut Frame, label_idx: u32) -> Result<Flow, RuntimeError> {
    let condition = stack.pop()?;
    if condition != 0 {
        br(stack, frame, label_idx)
    } else {
        Ok(Flow::Continue)
    }
}

/// Handle one decoded instruction while the frame is skipping. Only
/// structure is tracked; nothing is executed.
pub fn skip(stack: &Stack, frame: &mut Frame, instruction: &Instruction) -> Flow {
    match *instruction {
        Instruction::Block { block_type } => enter(stack, frame, MarkerKind::Block, block_type),
        Instruction::Loop { block_type } => enter(stack, frame, MarkerKind::Loop, block_type),
        Instruction::If { block_type } => enter(stack, frame, MarkerKind::If, block_type),
        Instruction::Else => {
            if let FlowState::SkippingInactiveIf { depth } = frame.state {
                if frame.end_stack.len() == depth {
                    frame.state = FlowState::Normal;
                }
            }
            Flow::Continue
        }
        Instruction::End => {
            let closing = frame.end_stack.len();
            if frame.state.depth() == Some(closing) {
                frame.state = FlowState::Normal;
            }
            end(frame)
        }
        _ => Flow::Continue,
    }
}
