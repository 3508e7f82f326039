use super::leb128::Leb128Error;
use crate::runtime::memory::MemoryError;

/// Errors raised while decoding a module binary. Decoding stops at the first
/// one; offsets are byte positions in the input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("bad magic number or version in module header")]
    BadMagicOrVersion,
    #[error("wrong order of sections: {section} section (0x{id:02x}) at offset {offset} follows {previous} section")]
    SectionOrderViolation {
        section: &'static str,
        id: u8,
        previous: &'static str,
        offset: usize,
    },
    #[error("unsupported value type {name} (0x{byte:02x}) at offset {offset}")]
    UnsupportedValueType { name: &'static str, byte: u8, offset: usize },
    #[error("invalid value type 0x{byte:02x} at offset {offset}")]
    InvalidValueType { byte: u8, offset: usize },
    #[error("multiple memories declared ({count}); only one is supported")]
    MultipleMemoriesDeclared { count: u32 },
    #[error("malformed data segment offset expression at offset {offset}: expected i32.const <addr> end")]
    MalformedDataSegmentExpression { offset: usize },
    #[error("malformed LEB128 integer at offset {offset}")]
    MalformedLeb128 { offset: usize },
    #[error("unexpected end of input at offset {offset}")]
    UnexpectedEof { offset: usize },
    #[error("invalid function type tag 0x{tag:02x} at offset {offset}, expected 0x60")]
    InvalidFunctionTypeTag { tag: u8, offset: usize },
    #[error("function type at offset {offset} declares {count} results; at most one is supported")]
    TooManyResults { count: u32, offset: usize },
    #[error("unknown section id {id} at offset {offset}")]
    UnknownSection { id: u8, offset: usize },
    #[error("{section} section at offset {offset} declared {declared} bytes but {consumed} were read")]
    SectionSizeMismatch {
        section: &'static str,
        offset: usize,
        declared: usize,
        consumed: usize,
    },
    #[error("function and code section lengths differ: {functions} functions, {bodies} bodies")]
    FunctionCountMismatch { functions: usize, bodies: usize },
    #[error("type index {index} out of range ({count} types)")]
    TypeIndexOutOfRange { index: u32, count: usize },
    #[error("invalid memory limits flags 0x{flags:02x} at offset {offset}")]
    InvalidMemoryFlags { flags: u8, offset: usize },
    #[error("invalid memory limits: {0}")]
    InvalidMemoryLimits(MemoryError),
    #[error("data segment targets memory {index}; only memory 0 is supported")]
    UnsupportedMemoryIndex { index: u32 },
    #[error("data segment does not fit in memory: {0}")]
    DataSegmentOutOfBounds(MemoryError),
    #[error("start function index {index} out of range ({count} functions)")]
    StartFunctionOutOfRange { index: u32, count: usize },
    #[error("{what} count {count} exceeds implementation limit {limit}")]
    LimitExceeded { what: &'static str, count: u64, limit: u64 },
}

impl From<Leb128Error> for DecodeError {
    fn from(e: Leb128Error) -> Self {
        match e {
            Leb128Error::Malformed { offset } => DecodeError::MalformedLeb128 { offset },
            Leb128Error::Truncated { offset } => DecodeError::UnexpectedEof { offset },
        }
    }
}
