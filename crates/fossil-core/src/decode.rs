//! Schema-less decoder for the tag/length/value wire format.
//!
//! A tag is a varint holding `(field_number << 3) | wire_type`. Varints are
//! little-endian base-128 with `0x80` as the continuation bit, fixed-width
//! payloads are little-endian, and length-delimited payloads are a varint
//! length followed by that many bytes.

use serde::ser::{SerializeStruct, Serializer};
use serde::Serialize;
use thiserror::Error;

use crate::numeric::{varint_readings, Fixed32Reading, Fixed64Reading};

/// Nesting limit for speculative re-parsing of length-delimited payloads.
pub const MAX_DEPTH: usize = 256;

/// Largest field number the format allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// A varint never needs more than ten bytes for 64 bits.
const MAX_VARINT_BYTES: usize = 10;

/// Minimum share of printable chars for a payload to count as text.
const PRINTABLE_RATIO: f64 = 0.9;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("truncated tag at offset {offset}")]
    TruncatedTag { offset: usize },
    #[error("truncated length prefix at offset {offset}")]
    TruncatedLength { offset: usize },
    #[error("unknown wire type {code} at offset {offset}")]
    UnknownWireType { code: u8, offset: usize },
    #[error("truncated payload at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedPayload {
        offset: usize,
        needed: u64,
        available: usize,
    },
    #[error("varint longer than 10 bytes or wider than 64 bits at offset {offset}")]
    VarintTooLong { offset: usize },
    #[error("field number {number} out of range at offset {offset}")]
    InvalidFieldNumber { number: u64, offset: usize },
    #[error("nesting deeper than {max} levels")]
    DepthExceeded { max: usize },
}

/// Wire type of a decoded field.
///
/// `String` and `Unknown` are refinements of a length-delimited payload that
/// did not re-parse as a nested message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
    String,
    Unknown,
}

impl WireType {
    pub fn as_str(self) -> &'static str {
        match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length_delimited",
            WireType::Fixed32 => "fixed32",
            WireType::String => "string",
            WireType::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Varint(u64),
    Fixed64([u8; 8]),
    Fixed32([u8; 4]),
    Message(Vec<Field>),
    String(String),
    Unknown(Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub number: u32,
    pub payload: Payload,
}

impl Field {
    pub fn wire_type(&self) -> WireType {
        match self.payload {
            Payload::Varint(_) => WireType::Varint,
            Payload::Fixed64(_) => WireType::Fixed64,
            Payload::Fixed32(_) => WireType::Fixed32,
            Payload::Message(_) => WireType::LengthDelimited,
            Payload::String(_) => WireType::String,
            Payload::Unknown(_) => WireType::Unknown,
        }
    }

    /// Nested fields of a length-delimited payload that parsed as a message.
    pub fn children(&self) -> &[Field] {
        match &self.payload {
            Payload::Message(fields) => fields,
            _ => &[],
        }
    }
}

/// Top-level fields of one record in wire order. Repeated numbers are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecodedTree {
    pub fields: Vec<Field>,
}

impl DecodedTree {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }
}

/// Parses `bytes` as a sequence of fields.
///
/// Only malformed framing of `bytes` itself is an error; a nested payload
/// that fails to parse is downgraded to a string or unknown field.
pub fn parse(bytes: &[u8]) -> Result<DecodedTree, DecodeError> {
    parse_at_depth(bytes, 0).map(|fields| DecodedTree { fields })
}

fn parse_at_depth(bytes: &[u8], depth: usize) -> Result<Vec<Field>, DecodeError> {
    if depth > MAX_DEPTH {
        return Err(DecodeError::DepthExceeded { max: MAX_DEPTH });
    }
    let mut reader = Reader::new(bytes);
    let mut fields = Vec::new();
    while !reader.is_exhausted() {
        fields.push(reader.read_field(depth)?);
    }
    Ok(fields)
}

struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_exhausted(&self) -> bool {
        self.pos >= self.bytes.len()
    }

    fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn read_field(&mut self, depth: usize) -> Result<Field, DecodeError> {
        let tag_offset = self.pos;
        let tag = self
            .read_varint()?
            .ok_or(DecodeError::TruncatedTag { offset: tag_offset })?;
        let code = (tag & 0x07) as u8;
        let number = u32::try_from(tag >> 3)
            .ok()
            .filter(|n| (1..=MAX_FIELD_NUMBER).contains(n))
            .ok_or(DecodeError::InvalidFieldNumber {
                number: tag >> 3,
                offset: tag_offset,
            })?;

        let payload = match code {
            0 => {
                let offset = self.pos;
                let value = self.read_varint()?.ok_or(DecodeError::TruncatedPayload {
                    offset,
                    needed: 1,
                    available: self.remaining(),
                })?;
                Payload::Varint(value)
            }
            1 => Payload::Fixed64(self.read_array::<8>()?),
            2 => {
                let offset = self.pos;
                let len = self
                    .read_varint()?
                    .ok_or(DecodeError::TruncatedLength { offset })?;
                let data = self.read_slice(len)?;
                classify_length_delimited(data, depth)
            }
            5 => Payload::Fixed32(self.read_array::<4>()?),
            _ => {
                return Err(DecodeError::UnknownWireType {
                    code,
                    offset: tag_offset,
                })
            }
        };
        Ok(Field { number, payload })
    }

    /// `Ok(None)` when the buffer ends before the varint does.
    ///
    /// The tenth byte may only carry bit 63; anything wider is rejected.
    fn read_varint(&mut self) -> Result<Option<u64>, DecodeError> {
        let start = self.pos;
        let mut value = 0u64;
        for (i, &byte) in self.bytes[start..].iter().enumerate() {
            if i >= MAX_VARINT_BYTES || (i == MAX_VARINT_BYTES - 1 && byte > 0x01) {
                return Err(DecodeError::VarintTooLong { offset: start });
            }
            value |= u64::from(byte & 0x7f).wrapping_shl(7 * i as u32);
            if byte & 0x80 == 0 {
                self.pos = start + i + 1;
                return Ok(Some(value));
            }
        }
        Ok(None)
    }

    fn read_slice(&mut self, len: u64) -> Result<&'a [u8], DecodeError> {
        let available = self.remaining();
        let end = usize::try_from(len)
            .ok()
            .filter(|&n| n <= available)
            .map(|n| self.pos + n)
            .ok_or(DecodeError::TruncatedPayload {
                offset: self.pos,
                needed: len,
                available,
            })?;
        let data = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(data)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_slice(N as u64)?);
        Ok(out)
    }
}

fn classify_length_delimited(data: &[u8], depth: usize) -> Payload {
    if let Ok(fields) = parse_at_depth(data, depth + 1) {
        if !fields.is_empty() {
            return Payload::Message(fields);
        }
    }
    match as_text(data) {
        Some(text) => Payload::String(text.to_string()),
        None => Payload::Unknown(data.to_vec()),
    }
}

/// Valid UTF-8 where at least 90% of the chars are printable.
/// Tab, newline and carriage return count as printable.
pub fn as_text(data: &[u8]) -> Option<&str> {
    let text = std::str::from_utf8(data).ok()?;
    let total = text.chars().count();
    if total == 0 {
        return Some(text);
    }
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || matches!(c, '\t' | '\n' | '\r'))
        .count();
    if printable as f64 >= PRINTABLE_RATIO * total as f64 {
        Some(text)
    } else {
        None
    }
}

/// Escaped rendering of opaque bytes, printable ASCII kept as is.
pub fn escape_bytes(data: &[u8]) -> String {
    data.iter()
        .flat_map(|&b| std::ascii::escape_default(b))
        .map(char::from)
        .collect()
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Field", 3)?;
        s.serialize_field("field", &self.number)?;
        s.serialize_field("wire_type", &self.wire_type())?;
        match &self.payload {
            Payload::Varint(v) => s.serialize_field("data", &varint_readings(*v))?,
            Payload::Fixed64(b) => s.serialize_field("data", &Fixed64Reading::from_le_bytes(*b))?,
            Payload::Fixed32(b) => s.serialize_field("data", &Fixed32Reading::from_le_bytes(*b))?,
            Payload::Message(fields) => s.serialize_field("data", fields)?,
            Payload::String(text) => s.serialize_field("data", text)?,
            Payload::Unknown(raw) => s.serialize_field("data", &escape_bytes(raw))?,
        }
        s.end()
    }
}

impl Serialize for DecodedTree {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("DecodedTree", 1)?;
        s.serialize_field("fields", &self.fields)?;
        s.end()
    }
}
