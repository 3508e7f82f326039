//! Linear memory
//!
//! A flat, page-granular byte array. Every access is bounds-checked against
//! the current page count before the underlying data is touched; effective
//! addresses are computed in 64 bits so `address + offset` can never wrap.
//!
//! Layout:
//! - Page size: 64KB (65,536 bytes)
//! - Page ceiling: [`MAX_PAGES`] (8 MiB)
//! - Byte order: little-endian
//! - Out-of-bounds access: fault, never clamped

use byteorder::{ByteOrder, LittleEndian};

pub use crate::parser::limits::MAX_PAGES;

/// Page size in bytes (64KB)
pub const PAGE_SIZE: usize = 65536;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    #[error("out of bounds memory access: address {address} + offset {offset} (width {width}) exceeds {size} bytes")]
    OutOfBounds {
        address: u32,
        offset: u32,
        width: usize,
        size: usize,
    },
    #[error("maximum of {max} pages is outside 1..={ceiling}")]
    InvalidMaximum { max: u32, ceiling: u32 },
    #[error("initial size {initial} pages exceeds maximum {max} pages")]
    InitialExceedsMaximum { initial: u32, max: u32 },
    #[error("cannot grow {current} pages by {delta}: maximum is {max} pages")]
    GrowthExceedsMaximum { current: u32, delta: u32, max: u32 },
}

/// Access width of a load or store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    W8,
    W16,
    W32,
}

impl Width {
    pub fn bytes(self) -> usize {
        match self {
            Width::W8 => 1,
            Width::W16 => 2,
            Width::W32 => 4,
        }
    }
}

/// A linear memory instance
#[derive(Debug, Clone)]
pub struct Memory {
    data: Vec<u8>,
    current_pages: u32,
    max_pages: u32,
}

impl Memory {
    /// Create a memory with `initial_pages` zero-filled pages.
    ///
    /// # Errors
    /// - `max_pages` is 0 or above [`MAX_PAGES`]
    /// - `initial_pages` exceeds `max_pages`
    pub fn new(initial_pages: u32, max_pages: u32) -> Result<Self, MemoryError> {
        if max_pages < 1 || max_pages > MAX_PAGES {
            return Err(MemoryError::InvalidMaximum {
                max: max_pages,
                ceiling: MAX_PAGES,
            });
        }
        if initial_pages > max_pages {
            return Err(MemoryError::InitialExceedsMaximum {
                initial: initial_pages,
                max: max_pages,
            });
        }

        Ok(Memory {
            data: vec![0u8; initial_pages as usize * PAGE_SIZE],
            current_pages: initial_pages,
            max_pages,
        })
    }

    /// A zero-page memory that can never grow. Used for modules without a
    /// memory section.
    pub fn empty() -> Self {
        Memory {
            data: Vec::new(),
            current_pages: 0,
            max_pages: 0,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.current_pages
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Current size in bytes
    #[cfg(test)]
    pub fn size_bytes(&self) -> usize {
        self.data.len()
    }

    /// Grow by `delta_pages` zero-filled pages, returning the previous page
    /// count. On failure nothing changes.
    pub fn grow(&mut self, delta_pages: u32) -> Result<u32, MemoryError> {
        let current = self.current_pages;
        let new_pages = current
            .checked_add(delta_pages)
            .filter(|&pages| pages <= self.max_pages)
            .ok_or_else(|| MemoryError::GrowthExceedsMaximum {
                current,
                delta: delta_pages,
                max: self.max_pages,
            })?;

        self.data.resize(new_pages as usize * PAGE_SIZE, 0);
        self.current_pages = new_pages;
        Ok(current)
    }

    /// Check that `width` bytes at `address + offset` lie within memory and
    /// return the effective address.
    fn check_bounds(&self, address: u32, offset: u32, width: usize) -> Result<usize, MemoryError> {
        let effective = address as u64 + offset as u64;
        let end = effective + width as u64;
        if end > self.data.len() as u64 {
            return Err(MemoryError::OutOfBounds {
                address,
                offset,
                width,
                size: self.data.len(),
            });
        }
        Ok(effective as usize)
    }

    /// Load `width` bytes little-endian, sign- or zero-extending to 32 bits.
    pub fn load(&self, address: u32, offset: u32, width: Width, signed: bool) -> Result<u32, MemoryError> {
        let ea = self.check_bounds(address, offset, width.bytes())?;
        let bytes = &self.data[ea..ea + width.bytes()];
        let value = match (width, signed) {
            (Width::W8, false) => bytes[0] as u32,
            (Width::W8, true) => bytes[0] as i8 as i32 as u32,
            (Width::W16, false) => LittleEndian::read_u16(bytes) as u32,
            (Width::W16, true) => LittleEndian::read_i16(bytes) as i32 as u32,
            (Width::W32, _) => LittleEndian::read_u32(bytes),
        };
        Ok(value)
    }

    /// Store the low `width` bytes of `value` little-endian.
    pub fn store(&mut self, address: u32, offset: u32, width: Width, value: u32) -> Result<(), MemoryError> {
        let ea = self.check_bounds(address, offset, width.bytes())?;
        let bytes = &mut self.data[ea..ea + width.bytes()];
        match width {
            Width::W8 => bytes[0] = value as u8,
            Width::W16 => LittleEndian::write_u16(bytes, value as u16),
            Width::W32 => LittleEndian::write_u32(bytes, value),
        }
        Ok(())
    }

    /// Copy `bytes` into memory starting at `address`. All or nothing.
    pub fn write_bytes(&mut self, address: u32, bytes: &[u8]) -> Result<(), MemoryError> {
        let ea = self.check_bounds(address, 0, bytes.len())?;
        self.data[ea..ea + bytes.len()].copy_from_slice(bytes);
        Ok(())
    }

    /// Borrow `len` bytes starting at `address`.
    pub fn read_bytes(&self, address: u32, len: usize) -> Result<&[u8], MemoryError> {
        let ea = self.check_bounds(address, 0, len)?;
        Ok(&self.data[ea..ea + len])
    }

    /// The whole memory contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}
