//! Binary module decoder.
//!
//! [`parse`] validates the header, then reads sections in order, each bounded
//! by its declared size. Known sections must appear in strictly ascending ID
//! order; custom sections may appear anywhere and are skipped.

pub mod encoding;
pub mod error;
pub mod instruction;
pub mod leb128;
pub mod limits;
pub mod module;
pub mod reader;

pub use error::DecodeError;
pub use module::{Function, FunctionType, Module, ValueType};

use encoding::*;
use module::ValueTypeByte;
use reader::Reader;
use tracing::{debug, warn};

use crate::runtime::memory::Memory;

/// A function body as read from the code section, before it is joined with
/// its signature.
struct Body<'a> {
    local_count: u32,
    code: &'a [u8],
    offset: usize,
}

/// Decode a complete module binary.
pub fn parse(bytes: &[u8]) -> Result<Module, DecodeError> {
    read_header(bytes)?;

    let mut reader = Reader::new(bytes);
    reader.skip(HEADER_LEN)?;

    let mut module = Module::new();
    let mut type_indices: Option<Vec<u32>> = None;
    let mut bodies: Option<Vec<Body>> = None;
    let mut previous: Option<u8> = None;

    while !reader.is_empty() {
        let section_offset = reader.offset();
        let id = reader.read_byte()?;
        let size = reader.read_vu32()? as usize;
        let mut section = reader.sub_reader(size)?;
        let name = section_name(id);

        debug!(section = name, id, offset = section_offset, size, "decoding section");

        if id == SECTION_CUSTOM {
            module.custom_sections.push(read_custom_name(&mut section)?);
            continue;
        }
        if id > SECTION_DATA_COUNT {
            return Err(DecodeError::UnknownSection {
                id,
                offset: section_offset,
            });
        }
        if let Some(prev) = previous {
            if id <= prev {
                return Err(DecodeError::SectionOrderViolation {
                    section: name,
                    id,
                    previous: section_name(prev),
                    offset: section_offset,
                });
            }
        }
        previous = Some(id);

        match id {
            SECTION_TYPE => module.types = read_section_type(&mut section)?,
            SECTION_FUNCTION => type_indices = Some(read_section_function(&mut section, &module.types)?),
            SECTION_MEMORY => {
                if let Some(memory) = read_section_memory(&mut section)? {
                    module.memory = memory;
                    module.memory_declared = true;
                }
            }
            SECTION_START => module.start = Some(section.read_vu32()?),
            SECTION_CODE => bodies = Some(read_section_code(&mut section)?),
            SECTION_DATA => read_section_data(&mut section, &mut module.memory)?,
            _ => {
                warn!(section = name, id, size, "skipping unsupported section");
                section.skip(size)?;
            }
        }

        if !section.is_empty() {
            return Err(DecodeError::SectionSizeMismatch {
                section: name,
                offset: section_offset,
                declared: size,
                consumed: section.pos(),
            });
        }
    }

    module.functions = assemble_functions(&module.types, type_indices, bodies.unwrap_or_default())?;

    if let Some(index) = module.start {
        if index as usize >= module.functions.len() {
            return Err(DecodeError::StartFunctionOutOfRange {
                index,
                count: module.functions.len(),
            });
        }
    }

    debug!(
        types = module.types.len(),
        functions = module.functions.len(),
        pages = module.memory.page_count(),
        start = ?module.start,
        "module decoded"
    );

    Ok(module)
}

fn read_header(bytes: &[u8]) -> Result<(), DecodeError> {
    if bytes.len() < HEADER_LEN || bytes[0..4] != MAGIC || bytes[4..8] != VERSION {
        return Err(DecodeError::BadMagicOrVersion);
    }
    Ok(())
}

fn check_limit(what: &'static str, count: u32, limit: u32) -> Result<(), DecodeError> {
    if count > limit {
        return Err(DecodeError::LimitExceeded {
            what,
            count: count as u64,
            limit: limit as u64,
        });
    }
    Ok(())
}

/* SECTION READERS ************************************************/

fn read_custom_name(section: &mut Reader) -> Result<String, DecodeError> {
    let name = section
        .read_byte_vec()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
        .unwrap_or_default();
    // the payload is opaque; consume whatever follows the name
    section.skip(section.remaining())?;
    debug!(name = name.as_str(), "skipping custom section");
    Ok(name)
}

fn read_value_type(reader: &mut Reader) -> Result<ValueType, DecodeError> {
    let offset = reader.offset();
    let byte = reader.read_byte()?;
    match ValueType::classify(byte) {
        ValueTypeByte::Supported(vt) => Ok(vt),
        ValueTypeByte::Unsupported(name) => Err(DecodeError::UnsupportedValueType { name, byte, offset }),
        ValueTypeByte::Invalid => Err(DecodeError::InvalidValueType { byte, offset }),
    }
}

fn read_section_type(section: &mut Reader) -> Result<Vec<FunctionType>, DecodeError> {
    let count = section.read_vu32()?;
    check_limit("type", count, limits::MAX_TYPES)?;

    let mut types = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let offset = section.offset();
        let tag = section.read_byte()?;
        if tag != TYPE_FUNC {
            return Err(DecodeError::InvalidFunctionTypeTag { tag, offset });
        }

        let param_count = section.read_vu32()?;
        check_limit("parameter", param_count, limits::MAX_FUNCTION_PARAMS)?;
        let parameters = (0..param_count)
            .map(|_| read_value_type(section))
            .collect::<Result<Vec<_>, _>>()?;

        let result_count = section.read_vu32()?;
        if result_count > limits::MAX_FUNCTION_RESULTS {
            return Err(DecodeError::TooManyResults {
                count: result_count,
                offset,
            });
        }
        let results = (0..result_count)
            .map(|_| read_value_type(section))
            .collect::<Result<Vec<_>, _>>()?;

        types.push(FunctionType::new(parameters, results));
    }

    Ok(types)
}

fn read_section_function(section: &mut Reader, types: &[FunctionType]) -> Result<Vec<u32>, DecodeError> {
    let count = section.read_vu32()?;
    check_limit("function", count, limits::MAX_FUNCTIONS)?;

    let mut indices = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let index = section.read_vu32()?;
        if index as usize >= types.len() {
            return Err(DecodeError::TypeIndexOutOfRange {
                index,
                count: types.len(),
            });
        }
        indices.push(index);
    }

    Ok(indices)
}

fn read_section_memory(section: &mut Reader) -> Result<Option<Memory>, DecodeError> {
    let count = section.read_vu32()?;
    if count > 1 {
        return Err(DecodeError::MultipleMemoriesDeclared { count });
    }
    if count == 0 {
        return Ok(None);
    }

    let offset = section.offset();
    let flags = section.read_byte()?;
    let initial = section.read_vu32()?;
    let max = match flags {
        LIMITS_NO_MAX => limits::MAX_PAGES,
        LIMITS_HAS_MAX => section.read_vu32()?,
        _ => return Err(DecodeError::InvalidMemoryFlags { flags, offset }),
    };

    let memory = Memory::new(initial, max).map_err(DecodeError::InvalidMemoryLimits)?;
    debug!(initial, max, "memory declared");
    Ok(Some(memory))
}

fn read_section_code<'a>(section: &mut Reader<'a>) -> Result<Vec<Body<'a>>, DecodeError> {
    let count = section.read_vu32()?;
    check_limit("function body", count, limits::MAX_FUNCTIONS)?;

    let mut bodies = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let size = section.read_vu32()?;
        check_limit("function body byte", size, limits::MAX_FUNCTION_SIZE)?;
        let mut body = section.sub_reader(size as usize)?;

        let groups = body.read_vu32()?;
        let mut local_count: u32 = 0;
        for _ in 0..groups {
            let n = body.read_vu32()?;
            read_value_type(&mut body)?;
            local_count = local_count
                .checked_add(n)
                .filter(|total| *total <= limits::MAX_FUNCTION_LOCALS)
                .ok_or(DecodeError::LimitExceeded {
                    what: "local",
                    count: local_count as u64 + n as u64,
                    limit: limits::MAX_FUNCTION_LOCALS as u64,
                })?;
        }

        let offset = body.offset();
        let code = body.read_bytes(body.remaining())?;
        bodies.push(Body {
            local_count,
            code,
            offset,
        });
    }

    Ok(bodies)
}

fn read_section_data(section: &mut Reader, memory: &mut Memory) -> Result<(), DecodeError> {
    let count = section.read_vu32()?;
    check_limit("data segment", count, limits::MAX_DATA_SEGMENTS)?;

    for _ in 0..count {
        let index = section.read_vu32()?;
        if index != 0 {
            return Err(DecodeError::UnsupportedMemoryIndex { index });
        }

        let expr_offset = section.offset();
        if section.read_byte()? != OP_I32_CONST {
            return Err(DecodeError::MalformedDataSegmentExpression { offset: expr_offset });
        }
        let address = section.read_vs32()?;
        if section.read_byte()? != OP_END {
            return Err(DecodeError::MalformedDataSegmentExpression { offset: expr_offset });
        }

        let bytes = section.read_byte_vec()?;
        memory
            .write_bytes(address as u32, bytes)
            .map_err(DecodeError::DataSegmentOutOfBounds)?;
        debug!(address = address as u32, len = bytes.len(), "data segment written");
    }

    Ok(())
}

/// Join signatures with bodies. Without a function section, each type entry
/// declares one function in order.
fn assemble_functions(
    types: &[FunctionType],
    type_indices: Option<Vec<u32>>,
    bodies: Vec<Body>,
) -> Result<Vec<Function>, DecodeError> {
    let type_indices = match type_indices {
        Some(indices) => indices,
        None if bodies.is_empty() => Vec::new(),
        None => (0..types.len() as u32).collect(),
    };

    if type_indices.len() != bodies.len() {
        return Err(DecodeError::FunctionCountMismatch {
            functions: type_indices.len(),
            bodies: bodies.len(),
        });
    }

    let functions = type_indices
        .into_iter()
        .zip(bodies)
        .map(|(type_index, body)| {
            let ty = &types[type_index as usize];
            Function {
                type_index,
                parameter_count: ty.parameters.len() as u32,
                result_count: ty.results.len() as u32,
                local_count: body.local_count,
                body: body.code.to_vec(),
                body_offset: body.offset,
            }
        })
        .collect();

    Ok(functions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn module(sections: &[u8]) -> Vec<u8> {
        let mut bytes = MAGIC.to_vec();
        bytes.extend_from_slice(&VERSION);
        bytes.extend_from_slice(sections);
        bytes
    }

    #[test]
    fn test_empty_module() {
        let m = parse(&module(&[])).unwrap();
        assert!(m.functions.is_empty());
        assert_eq!(m.memory.page_count(), 0);
    }

    #[test]
    fn test_bad_header() {
        let cases: [&[u8]; 4] = [
            &[],
            &[0x00, 0x61, 0x73],
            &[0x00, 0x61, 0x73, 0x6d, 0x02, 0x00, 0x00, 0x00],
            &[0x00, 0x61, 0x73, 0x6e, 0x01, 0x00, 0x00, 0x00],
        ];
        for bytes in cases {
            assert_eq!(parse(bytes).unwrap_err(), DecodeError::BadMagicOrVersion);
        }
    }

    #[test]
    fn test_single_function() {
        // type: () -> i32; function: [0]; code: i32.const 5, end
        let m = parse(&module(&[
            0x01, 0x05, 0x01, 0x60, 0x00, 0x01, 0x7f, //
            0x03, 0x02, 0x01, 0x00, //
            0x0a, 0x06, 0x01, 0x04, 0x00, 0x41, 0x05, 0x0b,
        ]))
        .unwrap();
        assert_eq!(m.functions.len(), 1);
        let f = &m.functions[0];
        assert_eq!(f.parameter_count, 0);
        assert_eq!(f.result_count, 1);
        assert_eq!(f.local_count, 0);
        assert_eq!(f.body, vec![0x41, 0x05, 0x0b]);
        assert_eq!(f.body_offset, 8 + 7 + 4 + 5);
    }

    #[test]
    fn test_local_groups_are_summed() {
        let m = parse(&module(&[
            0x01, 0x04, 0x01, 0x60, 0x00, 0x00, //
            0x03, 0x02, 0x01, 0x00, //
            0x0a, 0x08, 0x01, 0x06, 0x02, 0x02, 0x7f, 0x03, 0x7f, 0x0b,
        ]))
        .unwrap();
        assert_eq!(m.functions[0].local_count, 5);
        assert_eq!(m.functions[0].body, vec![0x0b]);
    }

    #[test]
    fn test_missing_function_section_falls_back_to_types() {
        let m = parse(&module(&[
            0x01, 0x05, 0x01, 0x60, 0x01, 0x7f, 0x00, //
            0x0a, 0x04, 0x01, 0x02, 0x00, 0x0b,
        ]))
        .unwrap();
        assert_eq!(m.functions.len(), 1);
        assert_eq!(m.functions[0].parameter_count, 1);
    }

    #[test]
    fn test_section_size_mismatch() {
        // type section claims 5 bytes but its single entry only uses 4
        let err = parse(&module(&[0x01, 0x05, 0x01, 0x60, 0x00, 0x00, 0x00])).unwrap_err();
        assert!(matches!(err, DecodeError::SectionSizeMismatch { section: "type", .. }));
    }

    #[test]
    fn test_section_overruns_input() {
        let err = parse(&module(&[0x01, 0x10, 0x00])).unwrap_err();
        assert!(matches!(err, DecodeError::UnexpectedEof { .. }));
    }

    #[test]
    fn test_unsupported_sections_are_skipped() {
        // export section (7) with arbitrary content
        let m = parse(&module(&[0x07, 0x03, 0xaa, 0xbb, 0xcc])).unwrap();
        assert!(m.functions.is_empty());
    }

    #[test]
    fn test_unknown_section() {
        assert_eq!(
            parse(&module(&[0x0d, 0x00])).unwrap_err(),
            DecodeError::UnknownSection { id: 13, offset: 8 }
        );
    }

    #[test]
    fn test_custom_section_anywhere() {
        let m = parse(&module(&[
            0x00, 0x04, 0x02, b'h', b'i', 0x99, //
            0x05, 0x03, 0x01, 0x00, 0x01, //
            0x00, 0x01, 0x00,
        ]))
        .unwrap();
        assert_eq!(m.custom_sections, vec!["hi".to_string(), String::new()]);
        assert_eq!(m.memory.page_count(), 1);
        assert!(m.memory_declared);
    }

    #[test]
    fn test_custom_payload_consumed() {
        // payload bytes that look like a memory section stay inside the custom section
        let m = parse(&module(&[
            0x00, 0x07, 0x01, b'x', 0x05, 0x03, 0x01, 0x00, 0x01, //
            0x01, 0x04, 0x01, 0x60, 0x00, 0x00,
        ]))
        .unwrap();
        assert_eq!(m.custom_sections, vec!["x".to_string()]);
        assert!(!m.memory_declared);
        assert_eq!(m.types.len(), 1);
    }

    #[test]
    fn test_duplicate_section_is_order_violation() {
        let err = parse(&module(&[0x05, 0x01, 0x00, 0x05, 0x01, 0x00])).unwrap_err();
        assert_eq!(
            err,
            DecodeError::SectionOrderViolation {
                section: "memory",
                id: 5,
                previous: "memory",
                offset: 11,
            }
        );
    }

    #[test]
    fn test_start_out_of_range() {
        assert_eq!(
            parse(&module(&[0x08, 0x01, 0x00])).unwrap_err(),
            DecodeError::StartFunctionOutOfRange { index: 0, count: 0 }
        );
    }

    #[test]
    fn test_memory_flags() {
        assert_eq!(
            parse(&module(&[0x05, 0x03, 0x01, 0x02, 0x01])).unwrap_err(),
            DecodeError::InvalidMemoryFlags { flags: 2, offset: 11 }
        );
        let m = parse(&module(&[0x05, 0x03, 0x01, 0x00, 0x02])).unwrap();
        assert_eq!(m.memory.max_pages(), limits::MAX_PAGES);
        assert_eq!(m.memory.page_count(), 2);
    }

    #[test]
    fn test_function_without_body() {
        let err = parse(&module(&[
            0x01, 0x04, 0x01, 0x60, 0x00, 0x00, //
            0x03, 0x02, 0x01, 0x00,
        ]))
        .unwrap_err();
        assert_eq!(err, DecodeError::FunctionCountMismatch { functions: 1, bodies: 0 });
    }
}
