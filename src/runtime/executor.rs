//! Instruction executor
//!
//! The interpreter walks each function's raw bytecode with a plain offset as
//! instruction pointer, decoding one instruction per step. Calls push a new
//! [`Frame`]; returns pop it after checking the result count.

use tracing::{debug, info, trace};

use super::{
    control::{Flow, MarkerKind},
    frame::Frame,
    memory::{Memory, Width},
    ops,
    stack::Stack,
    ExecutionError, RuntimeError, TrapContext,
};
use crate::parser::instruction::{decode, Instruction};
use crate::parser::limits::{MAX_CALL_DEPTH, MAX_TOTAL_LOCALS};
use crate::parser::module::{Function, Module};

/// Executes functions of one module. Owns the operand stack and the call
/// stack; borrows the module's functions and its linear memory.
pub struct Interpreter<'m> {
    functions: &'m [Function],
    memory: &'m mut Memory,
    stack: Stack,
    frames: Vec<Frame>,
    /// Local slots held by every frame in `frames`
    live_locals: usize,
    /// Instructions executed by the last invocation
    steps: u64,
}

impl<'m> Interpreter<'m> {
    pub fn new(module: &'m mut Module) -> Self {
        Interpreter {
            functions: &module.functions,
            memory: &mut module.memory,
            stack: Stack::new(),
            frames: Vec::new(),
            live_locals: 0,
            steps: 0,
        }
    }

    pub fn memory(&self) -> &Memory {
        &*self.memory
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Call `function_idx` with `args` and run it to completion, returning
    /// the values it leaves on the operand stack.
    pub fn invoke(&mut self, function_idx: u32, args: &[i32]) -> Result<Vec<i32>, ExecutionError> {
        self.stack.clear();
        self.frames.clear();
        self.live_locals = 0;
        self.steps = 0;

        let entry_error = |kind| ExecutionError {
            kind,
            context: TrapContext {
                function: function_idx,
                ..TrapContext::default()
            },
        };

        let function = self
            .functions
            .get(function_idx as usize)
            .ok_or_else(|| entry_error(RuntimeError::UnknownFunction(function_idx)))?;
        if args.len() != function.parameter_count as usize {
            return Err(entry_error(RuntimeError::ArgumentCountMismatch {
                expected: function.parameter_count as usize,
                actual: args.len(),
            }));
        }

        self.stack.push_all(args.iter().copied());
        self.call(function_idx).map_err(entry_error)?;
        self.run()?;

        let results = self.stack.drain();
        info!(function = function_idx, steps = self.steps, results = ?results, "execution finished");
        Ok(results)
    }

    fn run(&mut self) -> Result<(), ExecutionError> {
        let functions = self.functions;
        while let Some(frame) = self.frames.last_mut() {
            let function = &functions[frame.function_idx as usize];
            let at = frame.ip;
            let function_idx = frame.function_idx;

            let outcome = match step(function, self.memory, &mut self.stack, frame) {
                Ok(Flow::Continue) => Ok(()),
                Ok(Flow::Call(target)) => self.call(target),
                Ok(Flow::Return) => self.ret(),
                Err(e) => Err(e),
            };
            self.steps += 1;

            if let Err(kind) = outcome {
                let context = TrapContext {
                    function: function_idx,
                    offset: at,
                    opcode: function.body.get(at).copied(),
                    depth: self.frames.len(),
                };
                debug!(error = %kind, %context, "trap");
                return Err(ExecutionError { kind, context });
            }
        }
        Ok(())
    }

    /// Pop the callee's arguments into a fresh frame and make it current.
    fn call(&mut self, function_idx: u32) -> Result<(), RuntimeError> {
        let function = self
            .functions
            .get(function_idx as usize)
            .ok_or(RuntimeError::UnknownFunction(function_idx))?;
        let live_locals = self.live_locals + function.frame_size();
        if self.frames.len() >= MAX_CALL_DEPTH || live_locals > MAX_TOTAL_LOCALS {
            return Err(RuntimeError::CallStackExhausted);
        }

        // the last argument is on top
        let args = self.stack.pop_n(function.parameter_count as usize)?;
        let base = self.stack.len();
        self.stack.set_floor(base);
        self.frames.push(Frame::new(function_idx, function, args, base));
        self.live_locals = live_locals;

        debug!(function = function_idx, depth = self.frames.len(), base, "call");
        Ok(())
    }

    /// Leave the current frame. Exactly `result_count` values must remain
    /// above its base; they stay on the stack for the caller.
    fn ret(&mut self) -> Result<(), RuntimeError> {
        let Some(frame) = self.frames.last() else {
            return Ok(());
        };
        let actual = self.stack.len() - frame.stack_base;
        if actual != frame.result_count {
            return Err(RuntimeError::ArityMismatch {
                expected: frame.result_count,
                actual,
            });
        }

        let function_idx = frame.function_idx;
        self.live_locals -= frame.locals.len();
        self.frames.pop();
        let floor = self.frames.last().map(|f| f.stack_base).unwrap_or(0);
        self.stack.set_floor(floor);

        debug!(function = function_idx, depth = self.frames.len(), "return");
        Ok(())
    }
}

/// Decode and execute one instruction of the current frame.
fn step(function: &Function, memory: &mut Memory, stack: &mut Stack, frame: &mut Frame) -> Result<Flow, RuntimeError> {
    use Instruction::*;

    if frame.ip >= function.body.len() {
        return Err(RuntimeError::UnexpectedEndOfBytecode);
    }
    let (instruction, next) = decode(&function.body, frame.ip)?;
    frame.ip = next;

    if frame.state.is_skipping() {
        trace!(%instruction, state = ?frame.state, "skip");
        return Ok(ops::control::skip(stack, frame, &instruction));
    }
    trace!(%instruction, depth = stack.len(), "execute");

    match instruction {
        // Control
        Unreachable => return ops::control::unreachable(),
        Nop => {}
        Block { block_type } => return Ok(ops::control::enter(stack, frame, MarkerKind::Block, block_type)),
        Loop { block_type } => return Ok(ops::control::enter(stack, frame, MarkerKind::Loop, block_type)),
        If { block_type } => return ops::control::if_(stack, frame, block_type),
        Else => return ops::control::else_(frame),
        End => return Ok(ops::control::end(frame)),
        Br { label_idx } => return ops::control::br(stack, frame, label_idx),
        BrIf { label_idx } => return ops::control::br_if(stack, frame, label_idx),
        Return => return Ok(Flow::Return),
        Call { func_idx } => return Ok(Flow::Call(func_idx)),

        // Parametric
        Drop => ops::parametric::drop(stack)?,

        // Variable
        LocalGet { local_idx } => ops::variable::local_get(stack, frame, local_idx)?,
        LocalSet { local_idx } => ops::variable::local_set(stack, frame, local_idx)?,
        LocalTee { local_idx } => ops::variable::local_tee(stack, frame, local_idx)?,

        // Memory
        I32Load { memarg } => ops::memory::load(stack, memory, &memarg, Width::W32, false)?,
        I32Load8S { memarg } => ops::memory::load(stack, memory, &memarg, Width::W8, true)?,
        I32Load8U { memarg } => ops::memory::load(stack, memory, &memarg, Width::W8, false)?,
        I32Load16S { memarg } => ops::memory::load(stack, memory, &memarg, Width::W16, true)?,
        I32Load16U { memarg } => ops::memory::load(stack, memory, &memarg, Width::W16, false)?,
        I32Store { memarg } => ops::memory::store(stack, memory, &memarg, Width::W32)?,
        I32Store8 { memarg } => ops::memory::store(stack, memory, &memarg, Width::W8)?,
        I32Store16 { memarg } => ops::memory::store(stack, memory, &memarg, Width::W16)?,
        MemorySize => ops::memory::memory_size(stack, memory)?,
        MemoryGrow => ops::memory::memory_grow(stack, memory)?,

        // Numeric
        I32Const { value } => ops::numeric::i32_const(stack, value)?,
        I32Eqz => ops::comparison::i32_eqz(stack)?,
        I32Eq => ops::comparison::i32_eq(stack)?,
        I32Ne => ops::comparison::i32_ne(stack)?,
        I32LtS => ops::comparison::i32_lt_s(stack)?,
        I32LtU => ops::comparison::i32_lt_u(stack)?,
        I32GtS => ops::comparison::i32_gt_s(stack)?,
        I32GtU => ops::comparison::i32_gt_u(stack)?,
        I32LeS => ops::comparison::i32_le_s(stack)?,
        I32LeU => ops::comparison::i32_le_u(stack)?,
        I32GeS => ops::comparison::i32_ge_s(stack)?,
        I32GeU => ops::comparison::i32_ge_u(stack)?,
        I32Clz => ops::numeric::i32_clz(stack)?,
        I32Ctz => ops::numeric::i32_ctz(stack)?,
        I32Popcnt => ops::numeric::i32_popcnt(stack)?,
        I32Add => ops::numeric::i32_add(stack)?,
        I32Sub => ops::numeric::i32_sub(stack)?,
        I32Mul => ops::numeric::i32_mul(stack)?,
        I32DivS => ops::numeric::i32_div_s(stack)?,
        I32DivU => ops::numeric::i32_div_u(stack)?,
        I32RemS => ops::numeric::i32_rem_s(stack)?,
        I32RemU => ops::numeric::i32_rem_u(stack)?,
        I32And => ops::bitwise::i32_and(stack)?,
        I32Or => ops::bitwise::i32_or(stack)?,
        I32Xor => ops::bitwise::i32_xor(stack)?,
        I32Shl => ops::bitwise::i32_shl(stack)?,
        I32ShrS => ops::bitwise::i32_shr_s(stack)?,
        I32ShrU => ops::bitwise::i32_shr_u(stack)?,
        I32Rotl => ops::bitwise::i32_rotl(stack)?,
        I32Rotr => ops::bitwise::i32_rotr(stack)?,
    }

    Ok(Flow::Continue)
}
