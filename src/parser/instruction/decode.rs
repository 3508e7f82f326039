//! Instruction decoding from binary format

use super::{BlockType, Instruction, MemArg};
use crate::parser::encoding::*;
use crate::parser::leb128::{self, Leb128Error};
use crate::parser::module::ValueType;

/// Error type for instruction decoding. Offsets are relative to the start of
/// the function body being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InstructionError {
    #[error("invalid opcode 0x{opcode:02x} at offset {offset}")]
    InvalidOpcode { opcode: u8, offset: usize },
    #[error("unexpected end of bytecode at offset {offset}")]
    UnexpectedEnd { offset: usize },
    #[error("malformed immediate at offset {offset}")]
    MalformedImmediate { offset: usize },
    #[error("unsupported block type 0x{byte:02x} at offset {offset}")]
    UnsupportedBlockType { byte: u8, offset: usize },
}

impl From<Leb128Error> for InstructionError {
    fn from(e: Leb128Error) -> Self {
        match e {
            Leb128Error::Malformed { offset } => InstructionError::MalformedImmediate { offset },
            Leb128Error::Truncated { offset } => InstructionError::UnexpectedEnd { offset },
        }
    }
}

struct Cursor<'a> {
    code: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn byte(&mut self) -> Result<u8, InstructionError> {
        let b = *self
            .code
            .get(self.pos)
            .ok_or(InstructionError::UnexpectedEnd { offset: self.pos })?;
        self.pos += 1;
        Ok(b)
    }

    fn vu32(&mut self) -> Result<u32, InstructionError> {
        Ok(leb128::read_unsigned(self.code, &mut self.pos)?)
    }

    fn vs32(&mut self) -> Result<i32, InstructionError> {
        Ok(leb128::read_signed(self.code, &mut self.pos)?)
    }

    fn block_type(&mut self) -> Result<BlockType, InstructionError> {
        let offset = self.pos;
        match self.byte()? {
            BLOCK_TYPE_EMPTY => Ok(BlockType::Empty),
            TYPE_I32 => Ok(BlockType::Value(ValueType::I32)),
            byte => Err(InstructionError::UnsupportedBlockType { byte, offset }),
        }
    }

    fn memarg(&mut self) -> Result<MemArg, InstructionError> {
        let align = self.vu32()?;
        let offset = self.vu32()?;
        Ok(MemArg { align, offset })
    }

    /// `memory.size` and `memory.grow` carry a single reserved zero byte.
    fn reserved_zero(&mut self) -> Result<(), InstructionError> {
        let offset = self.pos;
        match self.byte()? {
            0x00 => Ok(()),
            _ => Err(InstructionError::MalformedImmediate { offset }),
        }
    }
}

/// Decode the instruction starting at `ip` in `code`, returning it together
/// with the offset of the next instruction.
pub fn decode(code: &[u8], ip: usize) -> Result<(Instruction, usize), InstructionError> {
    use Instruction::*;

    let mut c = Cursor { code, pos: ip };
    let opcode = c.byte()?;

    let instruction = match opcode {
        OP_UNREACHABLE => Unreachable,
        OP_NOP => Nop,
        OP_BLOCK => Block { block_type: c.block_type()? },
        OP_LOOP => Loop { block_type: c.block_type()? },
        OP_IF => If { block_type: c.block_type()? },
        OP_ELSE => Else,
        OP_END => End,
        OP_BR => Br { label_idx: c.vu32()? },
        OP_BR_IF => BrIf { label_idx: c.vu32()? },
        OP_RETURN => Return,
        OP_CALL => Call { func_idx: c.vu32()? },

        OP_DROP => Drop,

        OP_LOCAL_GET => LocalGet { local_idx: c.vu32()? },
        OP_LOCAL_SET => LocalSet { local_idx: c.vu32()? },
        OP_LOCAL_TEE => LocalTee { local_idx: c.vu32()? },

        OP_I32_LOAD => I32Load { memarg: c.memarg()? },
        OP_I32_LOAD8_S => I32Load8S { memarg: c.memarg()? },
        OP_I32_LOAD8_U => I32Load8U { memarg: c.memarg()? },
        OP_I32_LOAD16_S => I32Load16S { memarg: c.memarg()? },
        OP_I32_LOAD16_U => I32Load16U { memarg: c.memarg()? },
        OP_I32_STORE => I32Store { memarg: c.memarg()? },
        OP_I32_STORE8 => I32Store8 { memarg: c.memarg()? },
        OP_I32_STORE16 => I32Store16 { memarg: c.memarg()? },
        OP_MEMORY_SIZE => {
            c.reserved_zero()?;
            MemorySize
        }
        OP_MEMORY_GROW => {
            c.reserved_zero()?;
            MemoryGrow
        }

        OP_I32_CONST => I32Const { value: c.vs32()? },
        OP_I32_EQZ => I32Eqz,
        OP_I32_EQ => I32Eq,
        OP_I32_NE => I32Ne,
        OP_I32_LT_S => I32LtS,
        OP_I32_LT_U => I32LtU,
        OP_I32_GT_S => I32GtS,
        OP_I32_GT_U => I32GtU,
        OP_I32_LE_S => I32LeS,
        OP_I32_LE_U => I32LeU,
        OP_I32_GE_S => I32GeS,
        OP_I32_GE_U => I32GeU,
        OP_I32_CLZ => I32Clz,
        OP_I32_CTZ => I32Ctz,
        OP_I32_POPCNT => I32Popcnt,
        OP_I32_ADD => I32Add,
        OP_I32_SUB => I32Sub,
        OP_I32_MUL => I32Mul,
        OP_I32_DIV_S => I32DivS,
        OP_I32_DIV_U => I32DivU,
        OP_I32_REM_S => I32RemS,
        OP_I32_REM_U => I32RemU,
        OP_I32_AND => I32And,
        OP_I32_OR => I32Or,
        OP_I32_XOR => I32Xor,
        OP_I32_SHL => I32Shl,
        OP_I32_SHR_S => I32ShrS,
        OP_I32_SHR_U => I32ShrU,
        OP_I32_ROTL => I32Rotl,
        OP_I32_ROTR => I32Rotr,

        _ => return Err(InstructionError::InvalidOpcode { opcode, offset: ip }),
    };

    Ok((instruction, c.pos))
}

/// Iterates over the instructions of a function body, yielding each
/// instruction with its offset. Stops after the first error.
pub struct InstructionIterator<'a> {
    code: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> InstructionIterator<'a> {
    pub fn new(code: &'a [u8]) -> Self {
        InstructionIterator {
            code,
            pos: 0,
            failed: false,
        }
    }
}

impl Iterator for InstructionIterator<'_> {
    type Item = Result<(usize, Instruction), InstructionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.code.len() {
            return None;
        }
        let offset = self.pos;
        match decode(self.code, offset) {
            Ok((instruction, next)) => {
                self.pos = next;
                Some(Ok((offset, instruction)))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
