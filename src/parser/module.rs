//! In-memory representation of a decoded module.

use std::fmt;

use super::encoding::{TYPE_F32, TYPE_F64, TYPE_I32, TYPE_I64};
use crate::runtime::memory::Memory;

/// Value types. Only `i32` is executable; the others are recognised so they
/// can be reported by name when rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    I32,
}

/// Outcome of classifying a value-type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueTypeByte {
    Supported(ValueType),
    Unsupported(&'static str),
    Invalid,
}

impl ValueType {
    pub fn classify(byte: u8) -> ValueTypeByte {
        match byte {
            TYPE_I32 => ValueTypeByte::Supported(ValueType::I32),
            TYPE_I64 => ValueTypeByte::Unsupported("i64"),
            TYPE_F32 => ValueTypeByte::Unsupported("f32"),
            TYPE_F64 => ValueTypeByte::Unsupported("f64"),
            _ => ValueTypeByte::Invalid,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ValueType::I32 => TYPE_I32,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::I32 => write!(f, "i32"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionType {
    pub parameters: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl FunctionType {
    pub fn new(parameters: Vec<ValueType>, results: Vec<ValueType>) -> Self {
        FunctionType { parameters, results }
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[ValueType]| types.iter().map(|t| t.to_string()).collect::<Vec<_>>().join(" ");
        write!(f, "[{}] -> [{}]", join(&self.parameters), join(&self.results))
    }
}

/// A defined function: its arity, local slots and raw bytecode.
///
/// `parameter_count + local_count` is the size of the frame's local array.
/// The body runs from the first instruction after the local declarations up
/// to and including the final `end`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub type_index: u32,
    pub parameter_count: u32,
    pub result_count: u32,
    pub local_count: u32,
    pub body: Vec<u8>,
    /// Offset of `body[0]` within the module binary, for diagnostics.
    pub body_offset: usize,
}

impl Function {
    pub fn frame_size(&self) -> usize {
        self.parameter_count as usize + self.local_count as usize
    }
}

#[derive(Debug, Clone)]
pub struct Module {
    pub types: Vec<FunctionType>,
    pub functions: Vec<Function>,
    pub memory: Memory,
    /// Whether a memory section declared the memory, as opposed to the
    /// zero-page default.
    pub memory_declared: bool,
    pub start: Option<u32>,
    /// Names of custom sections, in the order they appeared.
    pub custom_sections: Vec<String>,
}

impl Default for Module {
    fn default() -> Self {
        Module::new()
    }
}

impl Module {
    pub fn new() -> Module {
        Module {
            types: Vec::new(),
            functions: Vec::new(),
            memory: Memory::empty(),
            memory_declared: false,
            start: None,
            custom_sections: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn function(&self, index: u32) -> Option<&Function> {
        self.functions.get(index as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_value_types() {
        assert_eq!(ValueType::classify(0x7f), ValueTypeByte::Supported(ValueType::I32));
        assert_eq!(ValueType::classify(0x7e), ValueTypeByte::Unsupported("i64"));
        assert_eq!(ValueType::classify(0x7d), ValueTypeByte::Unsupported("f32"));
        assert_eq!(ValueType::classify(0x7c), ValueTypeByte::Unsupported("f64"));
        assert_eq!(ValueType::classify(0x40), ValueTypeByte::Invalid);
    }

    #[test]
    fn test_function_type_display() {
        let ty = FunctionType::new(vec![ValueType::I32, ValueType::I32], vec![ValueType::I32]);
        assert_eq!(ty.to_string(), "[i32 i32] -> [i32]");
        assert_eq!(FunctionType::default().to_string(), "[] -> []");
    }

    #[test]
    fn test_frame_size() {
        let f = Function {
            type_index: 0,
            parameter_count: 2,
            result_count: 1,
            local_count: 3,
            body: vec![0x0b],
            body_offset: 0,
        };
        assert_eq!(f.frame_size(), 5);
    }

    #[test]
    fn test_new_module_has_empty_memory() {
        let m = Module::new();
        assert_eq!(m.memory.page_count(), 0);
        assert!(!m.memory_declared);
        assert_eq!(m.start, None);
        assert!(m.function(0).is_none());
    }
}
