use fossil_core::decode::parse;
use fossil_core::numeric::{VarintKind, VarintReading};
use fossil_core::view::RecordView;
use serde_json::json;

#[test]
fn varint_field_lists_every_reading() {
    let tree = parse(&[0x08, 0xc8, 0x01]).unwrap();
    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "fields": [{
                "field": 1,
                "wire_type": "varint",
                "data": [
                    {"kind": "uint", "value": 200},
                    {"kind": "int8", "value": -56},
                    {"kind": "sint", "value": 100}
                ]
            }]
        })
    );
}

#[test]
fn nested_and_unknown_payloads_keep_their_shape() {
    let mut bytes = vec![0x12, 0x02, 0x08, 0x01];
    bytes.extend([0x1a, 0x04, 0xff, 0xfe, 0x00, 0x13]);
    let tree = parse(&bytes).unwrap();
    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "fields": [
                {
                    "field": 2,
                    "wire_type": "length_delimited",
                    "data": [{
                        "field": 1,
                        "wire_type": "varint",
                        "data": [
                            {"kind": "uint", "value": 1},
                            {"kind": "sint", "value": -1}
                        ]
                    }]
                },
                {
                    "field": 3,
                    "wire_type": "unknown",
                    "data": r"\xff\xfe\x00\x13"
                }
            ]
        })
    );
}

#[test]
fn signed_kind_serializes_as_its_label() {
    let reading = VarintReading {
        kind: VarintKind::Int(16),
        value: -1,
    };
    assert_eq!(
        serde_json::to_string(&reading).unwrap(),
        r#"{"kind":"int16","value":-1}"#
    );
}

#[test]
fn undecodable_view_serializes_error_and_hex_rows() {
    let view = RecordView::from_bytes(&[0xff, 0xff]);
    assert_eq!(
        serde_json::to_value(&view).unwrap(),
        json!({
            "error": "truncated tag at offset 0",
            "hex": [format!("00000000  {:<47}  ..", "FF FF")]
        })
    );
}

#[test]
fn empty_and_fieldless_views_serialize() {
    assert_eq!(
        serde_json::to_value(RecordView::Empty).unwrap(),
        json!({"fields": []})
    );
    let fieldless = RecordView::hex(b"AB", None);
    assert_eq!(
        serde_json::to_value(&fieldless).unwrap(),
        json!({"error": null, "hex": [format!("00000000  {:<47}  AB", "41 42")]})
    );
}
