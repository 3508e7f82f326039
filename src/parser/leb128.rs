//! LEB128 variable-length integer codec.
//!
//! Every integer in the binary format (counts, indices, sizes and immediates)
//! is LEB128 encoded. Only 32-bit quantities are supported, so an encoding is
//! at most five bytes long. A fifth byte that still has its continuation bit
//! set, or that carries bits beyond the 32 usable ones, is malformed.
//!
//! All readers take a buffer and a cursor. On success the cursor is advanced
//! past the encoding; on failure it is left untouched.

/// Upper bound on the length of a 32-bit LEB128 encoding.
pub const MAX_ENCODED_LEN: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Leb128Error {
    #[error("malformed LEB128 encoding at offset {offset}")]
    Malformed { offset: usize },
    #[error("LEB128 encoding truncated at offset {offset}")]
    Truncated { offset: usize },
}

impl Leb128Error {
    pub fn offset(&self) -> usize {
        match self {
            Leb128Error::Malformed { offset } | Leb128Error::Truncated { offset } => *offset,
        }
    }
}

/// Reads an unsigned 32-bit LEB128 value starting at `*cursor`.
pub fn read_unsigned(buffer: &[u8], cursor: &mut usize) -> Result<u32, Leb128Error> {
    let start = *cursor;
    let mut result: u32 = 0;

    for i in 0..MAX_ENCODED_LEN {
        let pos = start + i;
        let byte = *buffer.get(pos).ok_or(Leb128Error::Truncated { offset: pos })?;
        let shift = 7 * i as u32;

        if i == MAX_ENCODED_LEN - 1 {
            // 4 * 7 = 28 bits so far; only the low nibble of the last byte fits
            if byte & 0x80 != 0 || byte & 0x70 != 0 {
                return Err(Leb128Error::Malformed { offset: start });
            }
        }

        result |= ((byte & 0x7f) as u32) << shift;
        if byte & 0x80 == 0 {
            *cursor = pos + 1;
            return Ok(result);
        }
    }

    Err(Leb128Error::Malformed { offset: start })
}

/// Reads a signed 32-bit LEB128 value starting at `*cursor`, sign-extending
/// from the last byte read.
pub fn read_signed(buffer: &[u8], cursor: &mut usize) -> Result<i32, Leb128Error> {
    let start = *cursor;
    let mut result: i32 = 0;

    for i in 0..MAX_ENCODED_LEN {
        let pos = start + i;
        let byte = *buffer.get(pos).ok_or(Leb128Error::Truncated { offset: pos })?;
        let shift = 7 * i as u32;

        if i == MAX_ENCODED_LEN - 1 {
            // bits 4..6 of the last byte must repeat the sign bit (bit 3)
            let high = byte & 0x78;
            if byte & 0x80 != 0 || (high != 0 && high != 0x78) {
                return Err(Leb128Error::Malformed { offset: start });
            }
        }

        result |= ((byte & 0x7f) as i32).wrapping_shl(shift);
        if byte & 0x80 == 0 {
            let consumed = shift + 7;
            if consumed < 32 && byte & 0x40 != 0 {
                result |= -1i32 << consumed;
            }
            *cursor = pos + 1;
            return Ok(result);
        }
    }

    Err(Leb128Error::Malformed { offset: start })
}

/// Number of bytes `value` occupies in its minimal unsigned encoding.
pub fn encoded_size(value: u32) -> usize {
    match value {
        0..=0x7f => 1,
        0x80..=0x3fff => 2,
        0x4000..=0x1f_ffff => 3,
        0x20_0000..=0x0fff_ffff => 4,
        _ => 5,
    }
}

/// Appends the minimal unsigned encoding of `value` to `buf`.
pub fn encode_unsigned(buf: &mut Vec<u8>, value: u32) {
    let mut value = value;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}

/// Appends the minimal signed encoding of `value` to `buf`.
pub fn encode_signed(buf: &mut Vec<u8>, value: i32) {
    let mut value = value;
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            buf.push(byte);
            return;
        }
        buf.push(byte | 0x80);
    }
}
