use super::error::DecodeError;
use super::leb128;

/// Forward-only cursor over a borrowed byte buffer.
///
/// `base` is the absolute offset of `bytes[0]` in the module binary so that
/// errors raised by a section's sub-reader still point into the whole file.
pub struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
    base: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bytes: &'a [u8]) -> Reader<'a> {
        Reader { bytes, pos: 0, base: 0 }
    }

    fn with_base(bytes: &'a [u8], base: usize) -> Reader<'a> {
        Reader { bytes, pos: 0, base }
    }
}

impl<'a> Reader<'a> {
    // Basic operations --------------------------------------------------------

    /// Position relative to the start of this reader.
    pub fn pos(&self) -> usize {
        self.pos
    }

    /// Absolute offset of the next byte in the module binary.
    pub fn offset(&self) -> usize {
        self.base + self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn has_at_least(&self, count: usize) -> bool {
        self.remaining() >= count
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn eof(&self) -> DecodeError {
        DecodeError::UnexpectedEof { offset: self.offset() }
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        let byte = *self.bytes.get(self.pos).ok_or_else(|| self.eof())?;
        self.pos += 1;
        Ok(byte)
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], DecodeError> {
        if !self.has_at_least(len) {
            return Err(DecodeError::UnexpectedEof {
                offset: self.base + self.bytes.len(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn skip(&mut self, len: usize) -> Result<(), DecodeError> {
        self.read_bytes(len).map(|_| ())
    }

    /// Split off the next `len` bytes as an independent reader and advance
    /// past them.
    pub fn sub_reader(&mut self, len: usize) -> Result<Reader<'a>, DecodeError> {
        let start = self.offset();
        let bytes = self.read_bytes(len)?;
        Ok(Reader::with_base(bytes, start))
    }

    // Read and interpret types ------------------------------------------------

    pub fn read_vu32(&mut self) -> Result<u32, DecodeError> {
        let mut cursor = self.pos;
        let value = leb128::read_unsigned(self.bytes, &mut cursor).map_err(|e| self.rebase(e))?;
        self.pos = cursor;
        Ok(value)
    }

    pub fn read_vs32(&mut self) -> Result<i32, DecodeError> {
        let mut cursor = self.pos;
        let value = leb128::read_signed(self.bytes, &mut cursor).map_err(|e| self.rebase(e))?;
        self.pos = cursor;
        Ok(value)
    }

    fn rebase(&self, e: leb128::Leb128Error) -> DecodeError {
        let offset = self.base + e.offset();
        match e {
            leb128::Leb128Error::Malformed { .. } => leb128::Leb128Error::Malformed { offset },
            leb128::Leb128Error::Truncated { .. } => leb128::Leb128Error::Truncated { offset },
        }
        .into()
    }

    /// Read a length-prefixed byte vector.
    pub fn read_byte_vec(&mut self) -> Result<&'a [u8], DecodeError> {
        let len = self.read_vu32()? as usize;
        self.read_bytes(len)
    }
}
