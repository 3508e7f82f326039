//! Builds WebAssembly binaries (`.wasm`) for the subset [`crate::parser::parse`]
//! understands.
//!
//! The builder is the inverse of the decoder: types, functions, memory,
//! start function, data segments and custom sections go in, and a binary
//! with sections in wire order comes out.
//!
//! ```text
//! section_id: u8 | byte_length: vu32 | contents: byte*
//! ```
//!
//! Sections are emitted only when present (non-empty). All integers use the
//! minimal LEB128 encoding.
//!
//! # Example
//!
//! ```
//! use wasmlet::encoder::ModuleBuilder;
//! use wasmlet::parser::instruction::Instruction;
//! use wasmlet::parser::{FunctionType, ValueType};
//!
//! let mut builder = ModuleBuilder::new();
//! let answer = builder.function(
//!     FunctionType::new(vec![], vec![ValueType::I32]),
//!     0,
//!     &[Instruction::I32Const { value: 42 }],
//! );
//! builder.start(answer);
//!
//! let mut module = wasmlet::parse(&builder.encode()).unwrap();
//! assert_eq!(wasmlet::execute(&mut module, &[]).unwrap(), vec![42]);
//! ```

use crate::parser::encoding::{
    write_byte_vec, LIMITS_HAS_MAX, LIMITS_NO_MAX, MAGIC, OP_END, OP_I32_CONST, SECTION_CODE, SECTION_CUSTOM,
    SECTION_DATA, SECTION_FUNCTION, SECTION_MEMORY, SECTION_START, SECTION_TYPE, TYPE_FUNC, TYPE_I32, VERSION,
};
use crate::parser::instruction::{encode, Instruction};
use crate::parser::leb128::{encode_signed, encode_unsigned};
use crate::parser::module::FunctionType;

#[derive(Debug, Clone)]
struct FunctionEntry {
    type_index: u32,
    local_count: u32,
    /// Instruction bytes, including the final `end`
    code: Vec<u8>,
}

#[derive(Debug, Clone, Copy)]
struct MemoryEntry {
    initial: u32,
    max: Option<u32>,
}

#[derive(Debug, Clone)]
struct DataSegment {
    offset: i32,
    bytes: Vec<u8>,
}

/// Incrementally assembles a module binary.
#[derive(Debug, Clone, Default)]
pub struct ModuleBuilder {
    types: Vec<FunctionType>,
    functions: Vec<FunctionEntry>,
    memory: Option<MemoryEntry>,
    start: Option<u32>,
    data: Vec<DataSegment>,
    custom: Vec<(String, Vec<u8>)>,
}

impl ModuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a signature, reusing an identical earlier entry.
    pub fn signature(&mut self, ty: FunctionType) -> u32 {
        if let Some(index) = self.types.iter().position(|t| *t == ty) {
            return index as u32;
        }
        self.types.push(ty);
        (self.types.len() - 1) as u32
    }

    /// Add a function with `local_count` i32 locals beyond its parameters.
    /// The closing `end` is appended to `body`. Returns the function index.
    pub fn function(&mut self, ty: FunctionType, local_count: u32, body: &[Instruction]) -> u32 {
        let mut code = Vec::new();
        for instruction in body {
            encode(&mut code, instruction);
        }
        code.push(OP_END);
        let type_index = self.signature(ty);
        self.raw_function(type_index, local_count, code)
    }

    /// Add a function whose code bytes are taken as-is, with no `end`
    /// appended. Useful for bodies the instruction set cannot express.
    pub fn raw_function(&mut self, type_index: u32, local_count: u32, code: Vec<u8>) -> u32 {
        self.functions.push(FunctionEntry {
            type_index,
            local_count,
            code,
        });
        (self.functions.len() - 1) as u32
    }

    pub fn memory(&mut self, initial: u32, max: Option<u32>) -> &mut Self {
        self.memory = Some(MemoryEntry { initial, max });
        self
    }

    pub fn start(&mut self, function_idx: u32) -> &mut Self {
        self.start = Some(function_idx);
        self
    }

    /// Active data segment for memory 0 at a constant offset
    pub fn data(&mut self, offset: i32, bytes: &[u8]) -> &mut Self {
        self.data.push(DataSegment {
            offset,
            bytes: bytes.to_vec(),
        });
        self
    }

    pub fn custom(&mut self, name: &str, payload: &[u8]) -> &mut Self {
        self.custom.push((name.to_string(), payload.to_vec()));
        self
    }

    /// Produce the module binary.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&VERSION);

        self.encode_type_section(&mut buf);
        self.encode_function_section(&mut buf);
        self.encode_memory_section(&mut buf);
        self.encode_start_section(&mut buf);
        self.encode_code_section(&mut buf);
        self.encode_data_section(&mut buf);
        for (name, payload) in &self.custom {
            let mut contents = Vec::new();
            write_byte_vec(&mut contents, name.as_bytes());
            contents.extend_from_slice(payload);
            emit_section(&mut buf, SECTION_CUSTOM, &contents);
        }

        buf
    }

    /// Type section (id 1): function signatures.
    ///
    /// ```text
    /// functype ::= 0x60 vec(valtype) vec(valtype)
    /// ```
    fn encode_type_section(&self, buf: &mut Vec<u8>) {
        if self.types.is_empty() {
            return;
        }

        let mut contents = Vec::new();
        encode_unsigned(&mut contents, self.types.len() as u32);
        for ty in &self.types {
            contents.push(TYPE_FUNC);
            encode_unsigned(&mut contents, ty.parameters.len() as u32);
            contents.extend(ty.parameters.iter().map(|p| p.to_byte()));
            encode_unsigned(&mut contents, ty.results.len() as u32);
            contents.extend(ty.results.iter().map(|r| r.to_byte()));
        }
        emit_section(buf, SECTION_TYPE, &contents);
    }

    /// Function section (id 3): a type index per function.
    fn encode_function_section(&self, buf: &mut Vec<u8>) {
        if self.functions.is_empty() {
            return;
        }

        let mut contents = Vec::new();
        encode_unsigned(&mut contents, self.functions.len() as u32);
        for f in &self.functions {
            encode_unsigned(&mut contents, f.type_index);
        }
        emit_section(buf, SECTION_FUNCTION, &contents);
    }

    /// Memory section (id 5): at most one memory.
    ///
    /// ```text
    /// limits ::= 0x00 min | 0x01 min max
    /// ```
    fn encode_memory_section(&self, buf: &mut Vec<u8>) {
        let Some(memory) = self.memory else {
            return;
        };

        let mut contents = Vec::new();
        encode_unsigned(&mut contents, 1);
        match memory.max {
            Some(max) => {
                contents.push(LIMITS_HAS_MAX);
                encode_unsigned(&mut contents, memory.initial);
                encode_unsigned(&mut contents, max);
            }
            None => {
                contents.push(LIMITS_NO_MAX);
                encode_unsigned(&mut contents, memory.initial);
            }
        }
        emit_section(buf, SECTION_MEMORY, &contents);
    }

    fn encode_start_section(&self, buf: &mut Vec<u8>) {
        if let Some(start) = self.start {
            let mut contents = Vec::new();
            encode_unsigned(&mut contents, start);
            emit_section(buf, SECTION_START, &contents);
        }
    }

    /// Code section (id 10): size-prefixed bodies, all locals in one group.
    fn encode_code_section(&self, buf: &mut Vec<u8>) {
        if self.functions.is_empty() {
            return;
        }

        let mut contents = Vec::new();
        encode_unsigned(&mut contents, self.functions.len() as u32);
        for f in &self.functions {
            let mut body = Vec::new();
            if f.local_count == 0 {
                encode_unsigned(&mut body, 0);
            } else {
                encode_unsigned(&mut body, 1);
                encode_unsigned(&mut body, f.local_count);
                body.push(TYPE_I32);
            }
            body.extend_from_slice(&f.code);
            write_byte_vec(&mut contents, &body);
        }
        emit_section(buf, SECTION_CODE, &contents);
    }

    /// Data section (id 11): active segments with an `i32.const` offset.
    ///
    /// ```text
    /// data ::= 0x00 (i32.const n) end vec(byte)
    /// ```
    fn encode_data_section(&self, buf: &mut Vec<u8>) {
        if self.data.is_empty() {
            return;
        }

        let mut contents = Vec::new();
        encode_unsigned(&mut contents, self.data.len() as u32);
        for segment in &self.data {
            encode_unsigned(&mut contents, 0);
            contents.push(OP_I32_CONST);
            encode_signed(&mut contents, segment.offset);
            contents.push(OP_END);
            write_byte_vec(&mut contents, &segment.bytes);
        }
        emit_section(buf, SECTION_DATA, &contents);
    }
}

/// Writes a section: ID byte, LEB128 size, then the contents.
fn emit_section(buf: &mut Vec<u8>, id: u8, contents: &[u8]) {
    buf.push(id);
    encode_unsigned(buf, contents.len() as u32);
    buf.extend_from_slice(contents);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, ValueType};

    fn i32_to_i32() -> FunctionType {
        FunctionType::new(vec![ValueType::I32], vec![ValueType::I32])
    }

    #[test]
    fn test_empty_module() {
        assert_eq!(ModuleBuilder::new().encode(), b"\0asm\x01\x00\x00\x00");
    }

    #[test]
    fn test_exact_bytes() {
        let mut builder = ModuleBuilder::new();
        builder.function(FunctionType::default(), 0, &[Instruction::Nop]);
        assert_eq!(
            builder.encode(),
            vec![
                0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, // header
                0x01, 0x04, 0x01, 0x60, 0x00, 0x00, // type
                0x03, 0x02, 0x01, 0x00, // function
                0x0a, 0x05, 0x01, 0x03, 0x00, 0x01, 0x0b, // code
            ]
        );
    }

    #[test]
    fn test_signatures_are_shared() {
        let mut builder = ModuleBuilder::new();
        builder.function(i32_to_i32(), 0, &[Instruction::LocalGet { local_idx: 0 }]);
        builder.function(FunctionType::default(), 0, &[]);
        builder.function(i32_to_i32(), 0, &[Instruction::LocalGet { local_idx: 0 }]);

        let module = parse(&builder.encode()).unwrap();
        assert_eq!(module.types.len(), 2);
        let indices: Vec<u32> = module.functions.iter().map(|f| f.type_index).collect();
        assert_eq!(indices, vec![0, 1, 0]);
    }

    #[test]
    fn test_decoder_reads_back_every_section() {
        let mut builder = ModuleBuilder::new();
        let f = builder.function(i32_to_i32(), 3, &[Instruction::LocalGet { local_idx: 0 }]);
        builder
            .memory(1, Some(4))
            .start(f)
            .data(0x10, b"hi")
            .custom("name", &[1, 2, 3]);

        let module = parse(&builder.encode()).unwrap();
        assert_eq!(module.functions.len(), 1);
        assert_eq!(module.functions[0].local_count, 3);
        assert_eq!(module.functions[0].parameter_count, 1);
        assert_eq!(module.functions[0].body, vec![0x20, 0x00, 0x0b]);
        assert!(module.memory_declared);
        assert_eq!(module.memory.page_count(), 1);
        assert_eq!(module.memory.max_pages(), 4);
        assert_eq!(module.start, Some(0));
        assert_eq!(module.memory.read_bytes(0x10, 2).unwrap(), b"hi");
        assert_eq!(module.custom_sections, vec!["name".to_string()]);
    }

    #[test]
    fn test_memory_without_maximum() {
        let mut builder = ModuleBuilder::new();
        builder.memory(2, None);
        let module = parse(&builder.encode()).unwrap();
        assert_eq!(module.memory.page_count(), 2);
        assert_eq!(module.memory.max_pages(), crate::parser::limits::MAX_PAGES);
    }

    #[test]
    fn test_raw_function_is_verbatim() {
        let mut builder = ModuleBuilder::new();
        let ty = builder.signature(FunctionType::default());
        builder.raw_function(ty, 0, vec![0x01, 0x01]);
        let module = parse(&builder.encode()).unwrap();
        assert_eq!(module.functions[0].body, vec![0x01, 0x01]);
    }
}
