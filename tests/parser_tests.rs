mod common;

use common::{decode, get, konst, sig};
use rstest::rstest;
use wasmlet::encoder::ModuleBuilder;
use wasmlet::parser::instruction::{BlockType, Instruction, InstructionIterator};
use wasmlet::parser::limits::MAX_PAGES;
use wasmlet::runtime::MemoryError;
use wasmlet::DecodeError;

fn with_header(sections: &[u8]) -> Vec<u8> {
    let mut bytes = vec![0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
    bytes.extend_from_slice(sections);
    bytes
}

fn parse_err(sections: &[u8]) -> DecodeError {
    wasmlet::parse(&with_header(sections)).unwrap_err()
}

#[rstest]
#[case::i64_param(0x7e, "i64")]
#[case::f32_param(0x7d, "f32")]
#[case::f64_param(0x7c, "f64")]
fn unsupported_value_types(#[case] byte: u8, #[case] name: &'static str) {
    // type section: one func type with a single parameter of the given type
    let err = parse_err(&[0x01, 0x05, 0x01, 0x60, 0x01, byte, 0x00]);
    assert_eq!(err, DecodeError::UnsupportedValueType { name, byte, offset: 13 });
}

#[test]
fn unknown_value_type() {
    let err = parse_err(&[0x01, 0x05, 0x01, 0x60, 0x01, 0x55, 0x00]);
    assert_eq!(err, DecodeError::InvalidValueType { byte: 0x55, offset: 13 });
}

#[test]
fn local_of_unsupported_type() {
    let err = parse_err(&[
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00, //
        0x03, 0x02, 0x01, 0x00, //
        0x0a, 0x06, 0x01, 0x04, 0x01, 0x01, 0x7e, 0x0b,
    ]);
    assert!(matches!(err, DecodeError::UnsupportedValueType { name: "i64", .. }));
}

#[test]
fn two_results_rejected() {
    let err = parse_err(&[0x01, 0x06, 0x01, 0x60, 0x00, 0x02, 0x7f, 0x7f]);
    assert_eq!(err, DecodeError::TooManyResults { count: 2, offset: 11 });
}

#[test]
fn function_type_tag_checked() {
    let err = parse_err(&[0x01, 0x04, 0x01, 0x61, 0x00, 0x00]);
    assert_eq!(err, DecodeError::InvalidFunctionTypeTag { tag: 0x61, offset: 11 });
}

#[test]
fn type_index_out_of_range() {
    let err = parse_err(&[
        0x01, 0x04, 0x01, 0x60, 0x00, 0x00, //
        0x03, 0x02, 0x01, 0x01,
    ]);
    assert_eq!(err, DecodeError::TypeIndexOutOfRange { index: 1, count: 1 });
}

#[test]
fn multiple_memories() {
    let err = parse_err(&[0x05, 0x05, 0x02, 0x00, 0x01, 0x00, 0x01]);
    assert_eq!(err, DecodeError::MultipleMemoriesDeclared { count: 2 });
}

#[test]
fn memory_limits_checked() {
    assert_eq!(
        parse_err(&[0x05, 0x04, 0x01, 0x01, 0x03, 0x02]),
        DecodeError::InvalidMemoryLimits(MemoryError::InitialExceedsMaximum { initial: 3, max: 2 })
    );
    assert!(matches!(
        parse_err(&[0x05, 0x05, 0x01, 0x01, 0x00, 0x81, 0x01]),
        DecodeError::InvalidMemoryLimits(MemoryError::InvalidMaximum { max: 129, .. })
    ));
}

#[test]
fn section_order_enforced() {
    let mut bytes = ModuleBuilder::new().encode();
    // memory section, then a type section
    bytes.extend_from_slice(&[0x05, 0x03, 0x01, 0x00, 0x01, 0x01, 0x01, 0x00]);
    assert_eq!(
        wasmlet::parse(&bytes).unwrap_err(),
        DecodeError::SectionOrderViolation {
            section: "type",
            id: 1,
            previous: "memory",
            offset: 13,
        }
    );
}

#[test]
fn malformed_leb128() {
    // section size with five continuation bytes
    let err = parse_err(&[0x01, 0x80, 0x80, 0x80, 0x80, 0x80, 0x00]);
    assert_eq!(err, DecodeError::MalformedLeb128 { offset: 9 });
}

#[rstest]
#[case::wrong_opcode(&[0x01, 0x00, 0x42, 0x00, 0x0b, 0x00])]
#[case::missing_end(&[0x01, 0x00, 0x41, 0x00, 0x01, 0x00])]
fn malformed_data_expression(#[case] data: &[u8]) {
    let mut sections = vec![0x05, 0x03, 0x01, 0x00, 0x01, 0x0b, data.len() as u8];
    sections.extend_from_slice(data);
    assert_eq!(
        parse_err(&sections),
        DecodeError::MalformedDataSegmentExpression { offset: 17 }
    );
}

#[test]
fn data_segment_must_fit() {
    let mut builder = ModuleBuilder::new();
    builder.memory(1, Some(1)).data(65534, &[1, 2, 3]);
    let err = wasmlet::parse(&builder.encode()).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::DataSegmentOutOfBounds(MemoryError::OutOfBounds { address: 65534, .. })
    ));
}

#[test]
fn data_segment_without_memory() {
    let mut builder = ModuleBuilder::new();
    builder.data(0, &[1]);
    assert!(matches!(
        wasmlet::parse(&builder.encode()).unwrap_err(),
        DecodeError::DataSegmentOutOfBounds(_)
    ));
}

#[test]
fn data_segment_memory_index() {
    let err = parse_err(&[
        0x05, 0x03, 0x01, 0x00, 0x01, //
        0x0b, 0x06, 0x01, 0x01, 0x41, 0x00, 0x0b, 0x00,
    ]);
    assert_eq!(err, DecodeError::UnsupportedMemoryIndex { index: 1 });
}

#[test]
fn data_segments_initialise_memory() {
    let mut builder = ModuleBuilder::new();
    builder
        .memory(1, None)
        .data(0, b"abc")
        .data(2, b"XY")
        .data(0x100, &[0xde, 0xad]);
    let module = decode(&builder.encode());

    assert_eq!(module.memory.page_count(), 1);
    assert_eq!(module.memory.max_pages(), MAX_PAGES);
    assert_eq!(module.memory.read_bytes(0, 4).unwrap(), b"abXY");
    assert_eq!(module.memory.read_bytes(0xff, 3).unwrap(), &[0x00, 0xde, 0xad]);
}

#[test]
fn truncated_input() {
    let bytes = {
        let mut builder = ModuleBuilder::new();
        builder.function(sig(1, 1), 2, &[get(0), konst(300), Instruction::I32Add]);
        builder.encode()
    };
    // a cut between sections can still be a valid module, just not one
    // with the function in it
    for len in 9..bytes.len() {
        if let Ok(module) = wasmlet::parse(&bytes[..len]) {
            assert!(module.functions.is_empty(), "prefix of {len} bytes decoded a function");
        }
    }
    assert!(wasmlet::parse(&bytes).is_ok());
}

#[test]
fn decoded_body_disassembles() {
    let body = [
        Instruction::Block { block_type: BlockType::Empty },
        konst(-1),
        Instruction::BrIf { label_idx: 0 },
        Instruction::End,
        Instruction::MemorySize,
    ];
    let mut builder = ModuleBuilder::new();
    builder.function(sig(0, 1), 0, &body);
    builder.memory(1, Some(1));
    let module = decode(&builder.encode());

    let decoded: Vec<Instruction> = InstructionIterator::new(&module.functions[0].body)
        .map(|item| item.map(|(_, instruction)| instruction))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(&decoded[..body.len()], &body);
    assert_eq!(decoded.last(), Some(&Instruction::End));
}
