use fossil_core::decode::{parse, DecodeError, Field, Payload, WireType, MAX_DEPTH};

fn varint(mut value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

fn tag(number: u64, wire_type: u64) -> Vec<u8> {
    varint((number << 3) | wire_type)
}

fn varint_field(number: u64, value: u64) -> Vec<u8> {
    let mut out = tag(number, 0);
    out.extend(varint(value));
    out
}

fn bytes_field(number: u64, payload: &[u8]) -> Vec<u8> {
    let mut out = tag(number, 2);
    out.extend(varint(payload.len() as u64));
    out.extend_from_slice(payload);
    out
}

#[test]
fn single_varint_field_decodes_to_one_field() {
    for value in [0u64, 1, 127, 128, 300, u32::MAX as u64, u64::MAX] {
        let tree = parse(&varint_field(7, value)).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.fields[0].number, 7);
        assert_eq!(tree.fields[0].wire_type(), WireType::Varint);
        assert_eq!(tree.fields[0].payload, Payload::Varint(value));
    }
}

#[test]
fn decoding_is_deterministic() {
    let mut bytes = varint_field(1, 42);
    bytes.extend(bytes_field(2, b"hello world"));
    bytes.extend(bytes_field(3, &varint_field(1, 1)));
    assert_eq!(parse(&bytes).unwrap(), parse(&bytes).unwrap());
}

#[test]
fn wire_type_codes_dispatch_exactly() {
    let mut bytes = varint_field(1, 5);
    bytes.extend(tag(2, 1));
    bytes.extend(1.5f64.to_le_bytes());
    bytes.extend(bytes_field(3, &varint_field(1, 1)));
    bytes.extend(tag(4, 5));
    bytes.extend(7u32.to_le_bytes());

    let tree = parse(&bytes).unwrap();
    let types: Vec<_> = tree.fields.iter().map(Field::wire_type).collect();
    assert_eq!(
        types,
        vec![
            WireType::Varint,
            WireType::Fixed64,
            WireType::LengthDelimited,
            WireType::Fixed32
        ]
    );
    assert_eq!(tree.fields[1].payload, Payload::Fixed64(1.5f64.to_le_bytes()));
    assert_eq!(tree.fields[3].payload, Payload::Fixed32(7u32.to_le_bytes()));
}

#[test]
fn other_wire_type_codes_are_rejected() {
    for code in [3u64, 4, 6, 7] {
        let mut bytes = tag(1, code);
        bytes.push(0);
        assert_eq!(
            parse(&bytes),
            Err(DecodeError::UnknownWireType {
                code: code as u8,
                offset: 0
            })
        );
    }
}

#[test]
fn unknown_wire_type_after_valid_field_fails_whole_buffer() {
    let mut bytes = varint_field(1, 1);
    bytes.extend(tag(2, 6));
    assert_eq!(
        parse(&bytes),
        Err(DecodeError::UnknownWireType { code: 6, offset: 2 })
    );
}

#[test]
fn empty_buffer_is_an_empty_tree() {
    let tree = parse(b"").unwrap();
    assert!(tree.is_empty());
}

#[test]
fn unterminated_varint_is_a_decode_error() {
    assert_eq!(
        parse(&[0xff, 0xff]),
        Err(DecodeError::TruncatedTag { offset: 0 })
    );
}

#[test]
fn truncated_value_and_length_are_reported() {
    assert!(matches!(
        parse(&[0x08, 0x80]),
        Err(DecodeError::TruncatedPayload { offset: 1, .. })
    ));
    assert_eq!(
        parse(&[0x12]),
        Err(DecodeError::TruncatedLength { offset: 1 })
    );
    assert_eq!(
        parse(&[0x12, 0x05, b'a']),
        Err(DecodeError::TruncatedPayload {
            offset: 2,
            needed: 5,
            available: 1
        })
    );
    assert!(matches!(
        parse(&[0x09, 1, 2, 3]),
        Err(DecodeError::TruncatedPayload { needed: 8, .. })
    ));
}

#[test]
fn overlong_varint_is_rejected() {
    let mut bytes = vec![0x08];
    bytes.extend([0x80; 11]);
    bytes.push(0x01);
    assert_eq!(parse(&bytes), Err(DecodeError::VarintTooLong { offset: 1 }));
}

#[test]
fn tenth_varint_byte_may_only_hold_bit_63() {
    let mut max = vec![0x08];
    max.extend([0xff; 9]);
    max.push(0x01);
    let tree = parse(&max).unwrap();
    assert_eq!(tree.fields[0].payload, Payload::Varint(u64::MAX));

    let mut wide = vec![0x08];
    wide.extend([0xff; 9]);
    wide.push(0x02);
    assert_eq!(parse(&wide), Err(DecodeError::VarintTooLong { offset: 1 }));
}

#[test]
fn field_number_zero_is_rejected() {
    assert_eq!(
        parse(&[0x00, 0x01]),
        Err(DecodeError::InvalidFieldNumber {
            number: 0,
            offset: 0
        })
    );
}

#[test]
fn nested_message_is_decoded_recursively() {
    let bytes = bytes_field(1, &[0x08, 0x01]);
    let tree = parse(&bytes).unwrap();
    assert_eq!(tree.len(), 1);
    let outer = &tree.fields[0];
    assert_eq!(outer.wire_type(), WireType::LengthDelimited);
    assert_eq!(
        outer.children(),
        &[Field {
            number: 1,
            payload: Payload::Varint(1)
        }]
    );
}

#[test]
fn text_payload_is_classified_as_string() {
    let tree = parse(&bytes_field(2, "zürich/äöü 42".as_bytes())).unwrap();
    assert_eq!(
        tree.fields[0].payload,
        Payload::String("zürich/äöü 42".to_string())
    );
}

#[test]
fn empty_payload_is_an_empty_string() {
    let tree = parse(&bytes_field(4, b"")).unwrap();
    assert_eq!(tree.fields[0].payload, Payload::String(String::new()));
}

#[test]
fn binary_payload_is_unknown() {
    let payload = [0xffu8, 0xfe, 0x00, 0x13];
    let tree = parse(&bytes_field(5, &payload)).unwrap();
    assert_eq!(tree.fields[0].wire_type(), WireType::Unknown);
    assert_eq!(tree.fields[0].payload, Payload::Unknown(payload.to_vec()));
}

#[test]
fn mostly_control_text_is_not_a_string() {
    let payload = b"\x01\x02\x03abc";
    let tree = parse(&bytes_field(1, payload)).unwrap();
    assert_eq!(tree.fields[0].wire_type(), WireType::Unknown);
}

#[test]
fn repeated_field_numbers_keep_wire_order() {
    let mut bytes = varint_field(3, 1);
    bytes.extend(varint_field(1, 2));
    bytes.extend(varint_field(3, 3));
    let tree = parse(&bytes).unwrap();
    let seen: Vec<_> = tree
        .fields
        .iter()
        .map(|f| (f.number, f.payload.clone()))
        .collect();
    assert_eq!(
        seen,
        vec![
            (3, Payload::Varint(1)),
            (1, Payload::Varint(2)),
            (3, Payload::Varint(3))
        ]
    );
}

#[test]
fn deep_nesting_is_capped_without_overflowing_the_stack() {
    let mut bytes = varint_field(1, 1);
    for _ in 0..(MAX_DEPTH + 50) {
        bytes = bytes_field(1, &bytes);
    }
    let tree = parse(&bytes).unwrap();

    let mut depth = 0;
    let mut field = &tree.fields[0];
    while let Some(child) = field.children().first() {
        field = child;
        depth += 1;
    }
    assert!(depth <= MAX_DEPTH);
    assert_ne!(field.wire_type(), WireType::Varint);
}
