//! Instruction encoding to binary format

use super::{BlockType, Instruction, MemArg};
use crate::parser::encoding::*;
use crate::parser::leb128::{encode_signed, encode_unsigned};

fn block_type(buf: &mut Vec<u8>, bt: &BlockType) {
    match bt {
        BlockType::Empty => buf.push(BLOCK_TYPE_EMPTY),
        BlockType::Value(vt) => buf.push(vt.to_byte()),
    }
}

fn memarg(buf: &mut Vec<u8>, m: &MemArg) {
    encode_unsigned(buf, m.align);
    encode_unsigned(buf, m.offset);
}

/// Append the binary encoding of `instruction` to `buf`.
pub fn encode(buf: &mut Vec<u8>, instruction: &Instruction) {
    use Instruction::*;

    match instruction {
        Unreachable => buf.push(OP_UNREACHABLE),
        Nop => buf.push(OP_NOP),
        Block { block_type: bt } => {
            buf.push(OP_BLOCK);
            block_type(buf, bt);
        }
        Loop { block_type: bt } => {
            buf.push(OP_LOOP);
            block_type(buf, bt);
        }
        If { block_type: bt } => {
            buf.push(OP_IF);
            block_type(buf, bt);
        }
        Else => buf.push(OP_ELSE),
        End => buf.push(OP_END),
        Br { label_idx } => {
            buf.push(OP_BR);
            encode_unsigned(buf, *label_idx);
        }
        BrIf { label_idx } => {
            buf.push(OP_BR_IF);
            encode_unsigned(buf, *label_idx);
        }
        Return => buf.push(OP_RETURN),
        Call { func_idx } => {
            buf.push(OP_CALL);
            encode_unsigned(buf, *func_idx);
        }
        Drop => buf.push(OP_DROP),
        LocalGet { local_idx } => {
            buf.push(OP_LOCAL_GET);
            encode_unsigned(buf, *local_idx);
        }
        LocalSet { local_idx } => {
            buf.push(OP_LOCAL_SET);
            encode_unsigned(buf, *local_idx);
        }
        LocalTee { local_idx } => {
            buf.push(OP_LOCAL_TEE);
            encode_unsigned(buf, *local_idx);
        }
        I32Load { memarg: m }
        | I32Load8S { memarg: m }
        | I32Load8U { memarg: m }
        | I32Load16S { memarg: m }
        | I32Load16U { memarg: m }
        | I32Store { memarg: m }
        | I32Store8 { memarg: m }
        | I32Store16 { memarg: m } => {
            buf.push(opcode(instruction));
            memarg(buf, m);
        }
        MemorySize | MemoryGrow => {
            buf.push(opcode(instruction));
            buf.push(0x00);
        }
        I32Const { value } => {
            buf.push(OP_I32_CONST);
            encode_signed(buf, *value);
        }
        _ => buf.push(opcode(instruction)),
    }
}

/// Encode a sequence of instructions.
pub fn encode_all(instructions: &[Instruction]) -> Vec<u8> {
    let mut buf = Vec::new();
    for instruction in instructions {
        encode(&mut buf, instruction);
    }
    buf
}

/// The leading opcode byte of `instruction`.
pub fn opcode(instruction: &Instruction) -> u8 {
    use Instruction::*;

    match instruction {
        Unreachable => OP_UNREACHABLE,
        Nop => OP_NOP,
        Block { .. } => OP_BLOCK,
        Loop { .. } => OP_LOOP,
        If { .. } => OP_IF,
        Else => OP_ELSE,
        End => OP_END,
        Br { .. } => OP_BR,
        BrIf { .. } => OP_BR_IF,
        Return => OP_RETURN,
        Call { .. } => OP_CALL,
        Drop => OP_DROP,
        LocalGet { .. } => OP_LOCAL_GET,
        LocalSet { .. } => OP_LOCAL_SET,
        LocalTee { .. } => OP_LOCAL_TEE,
        I32Load { .. } => OP_I32_LOAD,
        I32Load8S { .. } => OP_I32_LOAD8_S,
        I32Load8U { .. } => OP_I32_LOAD8_U,
        I32Load16S { .. } => OP_I32_LOAD16_S,
        I32Load16U { .. } => OP_I32_LOAD16_U,
        I32Store { .. } => OP_I32_STORE,
        I32Store8 { .. } => OP_I32_STORE8,
        I32Store16 { .. } => OP_I32_STORE16,
        MemorySize => OP_MEMORY_SIZE,
        MemoryGrow => OP_MEMORY_GROW,
        I32Const { .. } => OP_I32_CONST,
        I32Eqz => OP_I32_EQZ,
        I32Eq => OP_I32_EQ,
        I32Ne => OP_I32_NE,
        I32LtS => OP_I32_LT_S,
        I32LtU => OP_I32_LT_U,
        I32GtS => OP_I32_GT_S,
        I32GtU => OP_I32_GT_U,
        I32LeS => OP_I32_LE_S,
        I32LeU => OP_I32_LE_U,
        I32GeS => OP_I32_GE_S,
        I32GeU => OP_I32_GE_U,
        I32Clz => OP_I32_CLZ,
        I32Ctz => OP_I32_CTZ,
        I32Popcnt => OP_I32_POPCNT,
        I32Add => OP_I32_ADD,
        I32Sub => OP_I32_SUB,
        I32Mul => OP_I32_MUL,
        I32DivS => OP_I32_DIV_S,
        I32DivU => OP_I32_DIV_U,
        I32RemS => OP_I32_REM_S,
        I32RemU => OP_I32_REM_U,
        I32And => OP_I32_AND,
        I32Or => OP_I32_OR,
        I32Xor => OP_I32_XOR,
        I32Shl => OP_I32_SHL,
        I32ShrS => OP_I32_SHR_S,
        I32ShrU => OP_I32_SHR_U,
        I32Rotl => OP_I32_ROTL,
        I32Rotr => OP_I32_ROTR,
    }
}
