use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;

use crate::decode::{self, DecodeError, DecodedTree};
use crate::hexdump::{hex_rows, HexRow};

/// How one record is presented: as a field tree, as nothing, or as raw hex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordView {
    Tree(DecodedTree),
    Empty,
    HexDump {
        rows: Vec<HexRow>,
        /// `None` when the bytes parsed but produced no fields.
        reason: Option<DecodeError>,
    },
}

impl RecordView {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.is_empty() {
            return RecordView::Empty;
        }
        match decode::parse(bytes) {
            Ok(tree) if !tree.is_empty() => RecordView::Tree(tree),
            Ok(_) => Self::hex(bytes, None),
            Err(err) => Self::hex(bytes, Some(err)),
        }
    }

    /// Raw hex regardless of whether the bytes decode.
    pub fn hex(bytes: &[u8], reason: Option<DecodeError>) -> Self {
        RecordView::HexDump {
            rows: hex_rows(bytes),
            reason,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            RecordView::Tree(tree) => format!("{} fields", tree.len()),
            RecordView::Empty => "0 fields".to_string(),
            RecordView::HexDump {
                rows,
                reason: Some(err),
            } => format!("not decodable ({err}), {} hex rows", rows.len()),
            RecordView::HexDump { rows, reason: None } => {
                format!("{} hex rows", rows.len())
            }
        }
    }
}

/// A tree serializes as `{"fields": [...]}`, an empty record as no fields,
/// and a hex dump as `{"error": ..., "hex": [rows]}`.
impl Serialize for RecordView {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            RecordView::Tree(tree) => tree.serialize(serializer),
            RecordView::Empty => DecodedTree::default().serialize(serializer),
            RecordView::HexDump { rows, reason } => {
                let mut s = serializer.serialize_struct("HexDump", 2)?;
                s.serialize_field("error", &reason.as_ref().map(ToString::to_string))?;
                s.serialize_field("hex", rows)?;
                s.end()
            }
        }
    }
}
