use std::fmt;

use serde::{Serialize, Serializer};

pub const BYTES_PER_ROW: usize = 16;

/// One row of a hex dump: hex offset, up to 16 bytes, ASCII column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HexRow {
    pub offset: usize,
    pub hex: String,
    pub ascii: String,
}

impl fmt::Display for HexRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:08X}  {:<width$}  {}",
            self.offset,
            self.hex,
            self.ascii,
            width = BYTES_PER_ROW * 3 - 1
        )
    }
}

/// Serialized as the formatted row.
impl Serialize for HexRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn hex_rows(bytes: &[u8]) -> Vec<HexRow> {
    bytes
        .chunks(BYTES_PER_ROW)
        .enumerate()
        .map(|(i, chunk)| HexRow {
            offset: i * BYTES_PER_ROW,
            hex: chunk
                .iter()
                .map(|b| format!("{b:02X}"))
                .collect::<Vec<_>>()
                .join(" "),
            ascii: chunk.iter().map(|&b| ascii_cell(b)).collect(),
        })
        .collect()
}

/// Printable ASCII (0x20..=0x7E) as itself, everything else as `.`.
pub fn ascii_cell(byte: u8) -> char {
    if (0x20..=0x7e).contains(&byte) {
        char::from(byte)
    } else {
        '.'
    }
}

pub fn hex_dump(bytes: &[u8]) -> String {
    hex_rows(bytes)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
