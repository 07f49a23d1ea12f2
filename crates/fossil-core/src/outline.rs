//! Flattening of a [`RecordView`] into indented display lines.
//!
//! `Outline` holds only the collapse state, so any front end can keep one per
//! open record and render the lines however it likes.

use std::collections::BTreeSet;

use crate::decode::{escape_bytes, Field, Payload};
use crate::numeric::{format_readings, varint_readings, Fixed32Reading, Fixed64Reading};
use crate::view::RecordView;

/// Position of a field: indices into each nesting level, outermost first.
pub type NodePath = Vec<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineLine {
    pub depth: usize,
    /// Empty for lines that are not fields (hex rows, placeholders).
    pub path: NodePath,
    pub title: String,
    pub detail: Option<String>,
    pub expandable: bool,
    pub collapsed: bool,
}

impl OutlineLine {
    fn plain(title: String) -> Self {
        Self {
            depth: 0,
            path: Vec::new(),
            title,
            detail: None,
            expandable: false,
            collapsed: false,
        }
    }

    pub fn text(&self) -> String {
        let marker = match (self.expandable, self.collapsed) {
            (true, true) => "+ ",
            (true, false) => "- ",
            (false, _) => "  ",
        };
        let indent = "  ".repeat(self.depth);
        match &self.detail {
            Some(detail) => format!("{indent}{marker}{}: {detail}", self.title),
            None => format!("{indent}{marker}{}", self.title),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Outline {
    collapsed: BTreeSet<NodePath>,
}

impl Outline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, path: &[usize]) -> bool {
        self.collapsed.contains(path)
    }

    /// Flips a node between collapsed and expanded. Returns the new collapsed state.
    pub fn toggle(&mut self, path: &[usize]) -> bool {
        if self.collapsed.remove(path) {
            false
        } else {
            self.collapsed.insert(path.to_vec());
            true
        }
    }

    pub fn expand_all(&mut self) {
        self.collapsed.clear();
    }

    pub fn lines(&self, view: &RecordView) -> Vec<OutlineLine> {
        match view {
            RecordView::Tree(tree) => {
                let mut out = Vec::new();
                let mut path = Vec::new();
                self.push_fields(&tree.fields, &mut path, &mut out);
                out
            }
            RecordView::Empty => vec![OutlineLine::plain("0 fields".to_string())],
            RecordView::HexDump { rows, reason } => {
                let mut out = Vec::with_capacity(rows.len() + 1);
                if let Some(err) = reason {
                    out.push(OutlineLine::plain(format!("not decodable: {err}")));
                }
                out.extend(rows.iter().map(|row| OutlineLine::plain(row.to_string())));
                out
            }
        }
    }

    fn push_fields(&self, fields: &[Field], path: &mut NodePath, out: &mut Vec<OutlineLine>) {
        for (idx, field) in fields.iter().enumerate() {
            path.push(idx);
            let expandable = matches!(field.payload, Payload::Message(_));
            let collapsed = expandable && self.is_collapsed(path);
            out.push(OutlineLine {
                depth: path.len() - 1,
                path: path.clone(),
                title: field_title(field),
                detail: field_detail(field),
                expandable,
                collapsed,
            });
            if expandable && !collapsed {
                self.push_fields(field.children(), path, out);
            }
            path.pop();
        }
    }
}

pub fn field_title(field: &Field) -> String {
    let kind = match field.payload {
        Payload::Message(_) => "protobuf",
        _ => field.wire_type().as_str(),
    };
    format!("Field {} (Type {kind})", field.number)
}

pub fn field_detail(field: &Field) -> Option<String> {
    match &field.payload {
        Payload::Varint(v) => Some(format_readings(&varint_readings(*v))),
        Payload::Fixed64(b) => Some(Fixed64Reading::from_le_bytes(*b).to_string()),
        Payload::Fixed32(b) => Some(Fixed32Reading::from_le_bytes(*b).to_string()),
        Payload::Message(fields) => Some(format!("{} fields", fields.len())),
        Payload::String(text) => Some(format!("{text:?}")),
        Payload::Unknown(raw) => Some(format!("b\"{}\"", escape_bytes(raw))),
    }
}
