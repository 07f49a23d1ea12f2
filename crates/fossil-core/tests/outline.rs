use fossil_core::outline::Outline;
use fossil_core::view::RecordView;

// field 1: { field 1: varint 1, field 2: "hey" }, field 2: varint 200
const NESTED: &[u8] = &[
    0x0a, 0x07, 0x08, 0x01, 0x12, 0x03, b'h', b'e', b'y', 0x10, 0xc8, 0x01,
];

#[test]
fn nested_fields_are_indented_under_their_parent() {
    let view = RecordView::from_bytes(NESTED);
    let lines = Outline::new().lines(&view);
    let rendered: Vec<_> = lines
        .iter()
        .map(|l| (l.depth, l.path.clone(), l.title.clone()))
        .collect();
    assert_eq!(
        rendered,
        vec![
            (0, vec![0], "Field 1 (Type protobuf)".to_string()),
            (1, vec![0, 0], "Field 1 (Type varint)".to_string()),
            (1, vec![0, 1], "Field 2 (Type string)".to_string()),
            (0, vec![1], "Field 2 (Type varint)".to_string()),
        ]
    );
    assert_eq!(
        lines[3].detail.as_deref(),
        Some("(uint) 200, (int8) -56, (sint) 100")
    );
    assert_eq!(lines[2].detail.as_deref(), Some("\"hey\""));
    assert!(lines[0].expandable);
    assert!(!lines[1].expandable);
}

#[test]
fn collapsing_hides_children_until_toggled_back() {
    let view = RecordView::from_bytes(NESTED);
    let mut outline = Outline::new();

    assert!(outline.toggle(&[0]));
    let lines = outline.lines(&view);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].collapsed);
    assert!(lines[0].text().starts_with("+ Field 1 (Type protobuf)"));

    assert!(!outline.toggle(&[0]));
    assert_eq!(outline.lines(&view).len(), 4);
}

#[test]
fn hex_fallback_lists_reason_then_rows() {
    let view = RecordView::from_bytes(&[0xff, 0xff]);
    let lines = Outline::new().lines(&view);
    assert_eq!(lines.len(), 2);
    assert!(lines[0].title.starts_with("not decodable"));
    assert!(lines[1].title.contains("FF FF"));
    assert!(lines.iter().all(|l| l.path.is_empty()));
}

#[test]
fn unknown_bytes_are_shown_escaped() {
    // field 3: bytes ff fe 00 13
    let view = RecordView::from_bytes(&[0x1a, 0x04, 0xff, 0xfe, 0x00, 0x13]);
    let lines = Outline::new().lines(&view);
    assert_eq!(lines[0].title, "Field 3 (Type unknown)");
    assert_eq!(lines[0].detail.as_deref(), Some("b\"\\xff\\xfe\\x00\\x13\""));
}
