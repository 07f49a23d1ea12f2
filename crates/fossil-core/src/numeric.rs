//! Reinterpretations of numeric payloads whose signedness and width the wire
//! format does not record.

use std::fmt;

use serde::{Serialize, Serializer};

/// Two's-complement widths a varint is tried against.
pub const SIGNED_WIDTHS: [u32; 4] = [8, 16, 32, 64];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarintKind {
    Uint,
    Int(u32),
    Sint,
}

impl fmt::Display for VarintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarintKind::Uint => f.write_str("uint"),
            VarintKind::Int(bits) => write!(f, "int{bits}"),
            VarintKind::Sint => f.write_str("sint"),
        }
    }
}

/// Serialized as its label (`"uint"`, `"int8"`, `"sint"`).
impl Serialize for VarintKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One candidate reading of a varint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VarintReading {
    pub kind: VarintKind,
    pub value: i128,
}

impl fmt::Display for VarintReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}) {}", self.kind, self.value)
    }
}

/// Two's-complement reading of `value` at `bits` width.
///
/// Values at or above `2^(bits-1)` have `2^bits` subtracted; this is not a
/// truncation, so a value wider than `bits` stays positive.
pub fn twos_complement(value: u64, bits: u32) -> i128 {
    let value = i128::from(value);
    if value >= 1i128 << (bits - 1) {
        value - (1i128 << bits)
    } else {
        value
    }
}

/// Zigzag reading: even values halve, odd values map to `-(v/2)-1`.
pub fn zigzag(value: u64) -> i128 {
    let half = i128::from(value / 2);
    if value % 2 == 0 {
        half
    } else {
        -half - 1
    }
}

/// The unsigned value first, then every signed reading that differs from it.
pub fn varint_readings(value: u64) -> Vec<VarintReading> {
    let unsigned = i128::from(value);
    let mut out = vec![VarintReading {
        kind: VarintKind::Uint,
        value: unsigned,
    }];
    for bits in SIGNED_WIDTHS {
        let signed = twos_complement(value, bits);
        if signed != unsigned {
            out.push(VarintReading {
                kind: VarintKind::Int(bits),
                value: signed,
            });
        }
    }
    let signed = zigzag(value);
    if signed != unsigned {
        out.push(VarintReading {
            kind: VarintKind::Sint,
            value: signed,
        });
    }
    out
}

pub fn format_readings(readings: &[VarintReading]) -> String {
    readings
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The same eight little-endian bytes read as a double and as a signed integer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fixed64Reading {
    pub double: f64,
    pub signed: i64,
}

impl Fixed64Reading {
    pub fn from_le_bytes(bytes: [u8; 8]) -> Self {
        Self {
            double: f64::from_le_bytes(bytes),
            signed: i64::from_le_bytes(bytes),
        }
    }
}

impl fmt::Display for Fixed64Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(double) {}, (int) {}", self.double, self.signed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Fixed32Reading {
    pub float: f32,
    pub signed: i32,
    pub unsigned: u32,
}

impl Fixed32Reading {
    pub fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self {
            float: f32::from_le_bytes(bytes),
            signed: i32::from_le_bytes(bytes),
            unsigned: u32::from_le_bytes(bytes),
        }
    }
}

impl fmt::Display for Fixed32Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(float) {}, (int) {}, (uint) {}",
            self.float, self.signed, self.unsigned
        )
    }
}
