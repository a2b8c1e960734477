//! Body schemas
//!
//! Every opcode's operand bytes are described by an ordered list of
//! [`FieldSpec`]s. The schema drives both directions of the codec: the
//! decoder walks the fields in order to produce [`Operand`] values, and
//! the encoder walks them again to serialize an instruction back to its
//! exact byte form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::codec::{self, CodecError, Cursor};
use crate::error::{AbcError, Result};
use crate::pool::{PoolKind, PoolRef};

/// How one body field is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Variable-length unsigned integer
    U30,
    /// Variable-length signed integer
    S30,
    /// One raw byte
    U8,
    /// Fixed-width 24-bit signed branch offset
    S24,
    /// Variable-length unsigned index into a constant pool
    Pool(PoolKind),
    /// Array of 24-bit signed case offsets; the count is the value of the
    /// immediately preceding `U30` field, plus one
    CaseOffsets,
}

/// One named, typed field of an opcode body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Field name, unique within its schema
    pub name: &'static str,
    /// Encoding of the field
    pub kind: FieldKind,
}

/// A variable-length unsigned integer field
pub const fn u30(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::U30,
    }
}

/// A variable-length signed integer field
pub const fn s30(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::S30,
    }
}

/// A single raw byte field
pub const fn byte(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::U8,
    }
}

/// A 24-bit signed branch offset field
pub const fn s24(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::S24,
    }
}

/// A constant pool reference field
pub const fn pool(name: &'static str, kind: PoolKind) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::Pool(kind),
    }
}

/// A count-driven case offset array field
pub const fn case_offsets(name: &'static str) -> FieldSpec {
    FieldSpec {
        name,
        kind: FieldKind::CaseOffsets,
    }
}

/// The empty body schema
pub const NO_BODY: &[FieldSpec] = &[];

/// One decoded body value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operand {
    /// Unsigned integer
    Uint(u32),
    /// Signed integer
    Int(i32),
    /// Raw byte
    Byte(u8),
    /// Relative branch offset
    Offset(i32),
    /// Unresolved constant pool reference
    Pool(PoolRef),
    /// Relative case offsets of a switch
    Offsets(Vec<i32>),
}

impl Operand {
    /// The value as an unsigned integer, if it is one
    pub fn as_uint(&self) -> Option<u32> {
        match self {
            Self::Uint(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a signed integer, if it is one
    pub fn as_int(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a raw byte, if it is one
    pub fn as_byte(&self) -> Option<u8> {
        match self {
            Self::Byte(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a branch offset, if it is one
    pub fn as_offset(&self) -> Option<i32> {
        match self {
            Self::Offset(v) => Some(*v),
            _ => None,
        }
    }

    /// The value as a pool reference, if it is one
    pub fn as_pool_ref(&self) -> Option<PoolRef> {
        match self {
            Self::Pool(r) => Some(*r),
            _ => None,
        }
    }

    /// The value as a case offset array, if it is one
    pub fn as_offsets(&self) -> Option<&[i32]> {
        match self {
            Self::Offsets(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uint(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Byte(v) => write!(f, "{v}"),
            Self::Offset(v) => write!(f, "{v:+}"),
            Self::Pool(r) => write!(f, "{}#{}", r.kind, r.index),
            Self::Offsets(vs) => {
                f.write_str("[")?;
                for (i, v) in vs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{v:+}")?;
                }
                f.write_str("]")
            }
        }
    }
}

fn map_codec_error(err: CodecError, offset: u32, field: &'static str) -> AbcError {
    match err {
        CodecError::OutOfBytes => AbcError::TruncatedInstruction { offset, field },
        CodecError::Unterminated => AbcError::MalformedVarint { offset },
    }
}

/// Decode a body against its schema, in field order
///
/// `offset` is the byte offset of the owning instruction and is only used
/// to report errors. On failure the cursor position is unspecified; the
/// instruction decoder restores it.
pub fn decode_body(
    fields: &'static [FieldSpec],
    cur: &mut Cursor<'_>,
    offset: u32,
) -> Result<Vec<Operand>> {
    let mut body = Vec::with_capacity(fields.len());
    for spec in fields {
        let operand = match spec.kind {
            FieldKind::U30 => Operand::Uint(
                cur.read_u30()
                    .map_err(|e| map_codec_error(e, offset, spec.name))?,
            ),
            FieldKind::S30 => Operand::Int(
                cur.read_s30()
                    .map_err(|e| map_codec_error(e, offset, spec.name))?,
            ),
            FieldKind::U8 => Operand::Byte(
                cur.read_u8()
                    .map_err(|e| map_codec_error(e, offset, spec.name))?,
            ),
            FieldKind::S24 => Operand::Offset(
                cur.read_s24()
                    .map_err(|e| map_codec_error(e, offset, spec.name))?,
            ),
            FieldKind::Pool(kind) => {
                let index = cur
                    .read_u30()
                    .map_err(|e| map_codec_error(e, offset, spec.name))?;
                Operand::Pool(PoolRef::new(kind, index))
            }
            FieldKind::CaseOffsets => {
                let count = body
                    .last()
                    .and_then(Operand::as_uint)
                    .unwrap_or_else(|| panic!("field `{}` has no preceding count field", spec.name));
                let mut offsets = Vec::with_capacity(count as usize + 1);
                for _ in 0..=count {
                    offsets.push(
                        cur.read_s24()
                            .map_err(|e| map_codec_error(e, offset, spec.name))?,
                    );
                }
                Operand::Offsets(offsets)
            }
        };
        body.push(operand);
    }
    Ok(body)
}

/// Encode a body against its schema, in field order
///
/// A body whose values do not match the schema is a caller defect, not an
/// input error, and panics.
pub fn encode_body(fields: &'static [FieldSpec], body: &[Operand], out: &mut Vec<u8>) {
    assert_eq!(
        fields.len(),
        body.len(),
        "body value count does not match schema"
    );
    for (spec, operand) in fields.iter().zip(body) {
        match (spec.kind, operand) {
            (FieldKind::U30, Operand::Uint(v)) => codec::write_u30(out, *v),
            (FieldKind::S30, Operand::Int(v)) => codec::write_s30(out, *v),
            (FieldKind::U8, Operand::Byte(v)) => out.push(*v),
            (FieldKind::S24, Operand::Offset(v)) => codec::write_s24(out, *v),
            (FieldKind::Pool(kind), Operand::Pool(r)) => {
                assert_eq!(r.kind, kind, "pool kind mismatch for field `{}`", spec.name);
                codec::write_u30(out, r.index);
            }
            (FieldKind::CaseOffsets, Operand::Offsets(vs)) => {
                for v in vs {
                    codec::write_s24(out, *v);
                }
            }
            _ => panic!("body value for field `{}` does not match schema", spec.name),
        }
    }
}

/// Whether body values structurally match a schema
///
/// Checks count and per-field operand kind, including the pool kind of
/// references; used by instruction constructors and deserialization.
pub fn body_matches(fields: &'static [FieldSpec], body: &[Operand]) -> bool {
    fields.len() == body.len()
        && fields
            .iter()
            .zip(body)
            .all(|(spec, operand)| match (spec.kind, operand) {
                (FieldKind::U30, Operand::Uint(_)) => true,
                (FieldKind::S30, Operand::Int(_)) => true,
                (FieldKind::U8, Operand::Byte(_)) => true,
                (FieldKind::S24, Operand::Offset(_)) => true,
                (FieldKind::Pool(kind), Operand::Pool(r)) => r.kind == kind,
                (FieldKind::CaseOffsets, Operand::Offsets(_)) => true,
                _ => false,
            })
}

/// Byte length of an encoded body
pub fn encoded_body_len(fields: &'static [FieldSpec], body: &[Operand]) -> usize {
    fields
        .iter()
        .zip(body)
        .map(|(spec, operand)| match (spec.kind, operand) {
            (FieldKind::U30, Operand::Uint(v)) => codec::u30_len(*v),
            (FieldKind::S30, Operand::Int(v)) => codec::s30_len(*v),
            (FieldKind::U8, Operand::Byte(_)) => 1,
            (FieldKind::S24, Operand::Offset(_)) => 3,
            (FieldKind::Pool(_), Operand::Pool(r)) => codec::u30_len(r.index),
            (FieldKind::CaseOffsets, Operand::Offsets(vs)) => 3 * vs.len(),
            _ => panic!("body value for field `{}` does not match schema", spec.name),
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    const JUMP_BODY: &[FieldSpec] = &[s24("target")];
    const SWITCH_BODY: &[FieldSpec] = &[
        s24("default"),
        u30("case_count"),
        case_offsets("case_offsets"),
    ];
    const PROP_BODY: &[FieldSpec] = &[pool("property", PoolKind::Multiname), u30("arg_count")];

    #[test]
    fn test_decode_pool_ref_is_lazy() {
        // index far beyond any real pool still decodes
        let bytes = [0xFF, 0xFF, 0x03, 0x02];
        let mut cur = Cursor::new(&bytes);
        let body = decode_body(PROP_BODY, &mut cur, 0).unwrap();
        assert_eq!(
            body[0].as_pool_ref(),
            Some(PoolRef::new(PoolKind::Multiname, 0xFFFF))
        );
        assert_eq!(body[1].as_uint(), Some(2));
    }

    #[test]
    fn test_case_offsets_count() {
        // default = +1, case_count = 2 -> three case offsets
        let mut bytes = Vec::new();
        codec::write_s24(&mut bytes, 1);
        codec::write_u30(&mut bytes, 2);
        for v in [-3, 0, 9] {
            codec::write_s24(&mut bytes, v);
        }
        let mut cur = Cursor::new(&bytes);
        let body = decode_body(SWITCH_BODY, &mut cur, 0).unwrap();
        assert_eq!(body[2].as_offsets(), Some(&[-3, 0, 9][..]));
        assert!(cur.at_end());
    }

    #[test]
    fn test_truncated_field_error() {
        let bytes = [0x01, 0x02];
        let mut cur = Cursor::new(&bytes);
        let err = decode_body(JUMP_BODY, &mut cur, 20).unwrap_err();
        assert_eq!(
            err,
            AbcError::TruncatedInstruction {
                offset: 20,
                field: "target",
            }
        );
    }

    #[test]
    fn test_body_roundtrip() {
        let mut bytes = Vec::new();
        codec::write_s24(&mut bytes, -2);
        codec::write_u30(&mut bytes, 0);
        codec::write_s24(&mut bytes, 300);
        let mut cur = Cursor::new(&bytes);
        let body = decode_body(SWITCH_BODY, &mut cur, 0).unwrap();

        let mut out = Vec::new();
        encode_body(SWITCH_BODY, &body, &mut out);
        assert_eq!(out, bytes);
        assert_eq!(encoded_body_len(SWITCH_BODY, &body), bytes.len());
    }

    #[test]
    #[should_panic(expected = "does not match schema")]
    fn test_schema_mismatch_panics() {
        let body = [Operand::Uint(4)];
        let mut out = Vec::new();
        encode_body(JUMP_BODY, &body, &mut out);
    }
}
