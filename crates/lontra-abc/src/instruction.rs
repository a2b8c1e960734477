//! Decoded instructions and instruction streams

use std::fmt;
use std::rc::Rc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::codec::Cursor;
use crate::error::{AbcError, Result};
use crate::opcode::{Opcode, OpcodeDescriptor, ResultType, opcode_table};
use crate::pool::{ConstantPool, Multiname, PoolRef};
use crate::schema::{self, FieldKind, Operand};

/// One decoded instruction
///
/// Holds a shared reference to its registry descriptor, the byte offset
/// it was decoded at, and its body values in schema order. The body
/// always matches the descriptor's schema exactly; constructors enforce
/// this.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    descriptor: &'static OpcodeDescriptor,
    offset: u32,
    body: Vec<Operand>,
}

impl Instruction {
    /// Build an instruction from an opcode and body values
    ///
    /// For assembly/patching workflows. The offset is zero; streams
    /// assign real offsets while decoding. A body that does not match the
    /// opcode's schema is a caller defect and panics.
    pub fn new(opcode: Opcode, body: Vec<Operand>) -> Self {
        let descriptor = opcode.descriptor();
        assert!(
            schema::body_matches(descriptor.body, &body),
            "body values do not match `{}` schema",
            descriptor.name
        );
        Self {
            descriptor,
            offset: 0,
            body,
        }
    }

    /// Decode one instruction at the cursor
    ///
    /// On failure the cursor is restored to the instruction start, so the
    /// caller observes no partial advance.
    pub fn decode(cur: &mut Cursor<'_>) -> Result<Self> {
        let start = cur.position();
        let offset = start as u32;
        let result = Self::decode_inner(cur, offset);
        if result.is_err() {
            cur.set_position(start);
        }
        result
    }

    fn decode_inner(cur: &mut Cursor<'_>, offset: u32) -> Result<Self> {
        let byte = cur.read_u8().map_err(|_| AbcError::TruncatedInstruction {
            offset,
            field: "opcode",
        })?;
        let descriptor = opcode_table()
            .lookup(byte)
            .ok_or(AbcError::UnknownOpcode {
                opcode: byte,
                offset,
            })?;
        let body = schema::decode_body(descriptor.body, cur, offset)?;
        Ok(Self {
            descriptor,
            offset,
            body,
        })
    }

    /// Serialize this instruction to its exact byte encoding
    pub fn encode(&self, out: &mut Vec<u8>) {
        out.push(self.descriptor.byte_value());
        schema::encode_body(self.descriptor.body, &self.body, out);
    }

    /// Encoded length in bytes, opcode byte included
    pub fn byte_len(&self) -> u32 {
        1 + schema::encoded_body_len(self.descriptor.body, &self.body) as u32
    }

    /// The opcode
    #[inline]
    pub fn opcode(&self) -> Opcode {
        self.descriptor.opcode
    }

    /// The registry descriptor
    #[inline]
    pub fn descriptor(&self) -> &'static OpcodeDescriptor {
        self.descriptor
    }

    /// Byte offset of this instruction in its stream
    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// The opcode mnemonic
    #[inline]
    pub fn name(&self) -> &'static str {
        self.descriptor.name
    }

    /// Decoded body values, in schema order
    #[inline]
    pub fn body(&self) -> &[Operand] {
        &self.body
    }

    /// A body value by field name
    pub fn operand(&self, name: &str) -> Option<&Operand> {
        self.descriptor
            .field_index(name)
            .map(|index| &self.body[index])
    }

    /// Evaluation stack slots this occurrence consumes
    pub fn consumes(&self) -> u32 {
        self.descriptor.consume.resolve(self.descriptor.body, &self.body)
    }

    /// Evaluation stack slots this occurrence produces
    pub fn produces(&self) -> u32 {
        self.descriptor.produce.resolve(self.descriptor.body, &self.body)
    }

    /// Declared result type, where the format fixes one
    #[inline]
    pub fn result_type(&self) -> Option<ResultType> {
        self.descriptor.result
    }

    /// Absolute byte offsets of every branch target
    ///
    /// Empty for non-branching instructions. Case-table offsets (and the
    /// switch default) are relative to the instruction start; all other
    /// branch offsets are relative to the end of the instruction.
    pub fn branch_targets(&self) -> Vec<u32> {
        let has_case_table = self
            .descriptor
            .body
            .iter()
            .any(|spec| spec.kind == FieldKind::CaseOffsets);
        let base = if has_case_table {
            i64::from(self.offset)
        } else {
            i64::from(self.offset) + i64::from(self.byte_len())
        };
        let mut targets = Vec::new();
        for (spec, operand) in self.descriptor.body.iter().zip(&self.body) {
            match (spec.kind, operand) {
                (FieldKind::S24, Operand::Offset(rel)) => {
                    targets.push((base + i64::from(*rel)) as u32);
                }
                (FieldKind::CaseOffsets, Operand::Offsets(rels)) => {
                    targets.extend(rels.iter().map(|rel| (base + i64::from(*rel)) as u32));
                }
                _ => {}
            }
        }
        targets
    }

    /// Positional body accessor: unsigned integer field
    ///
    /// Panics when the field is not a `U30`; the schema fixes field
    /// positions, so a wrong index is a caller defect.
    pub fn uint_at(&self, index: usize) -> u32 {
        self.body[index]
            .as_uint()
            .unwrap_or_else(|| self.bad_field(index))
    }

    /// Positional body accessor: signed integer field
    pub fn int_at(&self, index: usize) -> i32 {
        self.body[index]
            .as_int()
            .unwrap_or_else(|| self.bad_field(index))
    }

    /// Positional body accessor: raw byte field
    pub fn byte_at(&self, index: usize) -> u8 {
        self.body[index]
            .as_byte()
            .unwrap_or_else(|| self.bad_field(index))
    }

    /// Positional body accessor: branch offset field
    pub fn offset_at(&self, index: usize) -> i32 {
        self.body[index]
            .as_offset()
            .unwrap_or_else(|| self.bad_field(index))
    }

    /// Positional body accessor: pool reference field
    pub fn pool_ref_at(&self, index: usize) -> PoolRef {
        self.body[index]
            .as_pool_ref()
            .unwrap_or_else(|| self.bad_field(index))
    }

    /// Resolve a multiname reference field
    pub fn multiname_at(&self, index: usize, pool: &ConstantPool) -> Result<Rc<Multiname>> {
        let r = self.pool_ref_at(index);
        Ok(Rc::clone(pool.multiname(r.index)?))
    }

    fn bad_field(&self, index: usize) -> ! {
        panic!(
            "field {index} of `{}` accessed with the wrong operand kind",
            self.descriptor.name
        )
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.descriptor.name)?;
        for operand in &self.body {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

/// Wire form used for serde, keyed by opcode byte instead of descriptor
#[derive(Serialize, Deserialize)]
struct RawInstruction {
    opcode: u8,
    offset: u32,
    body: Vec<Operand>,
}

impl Serialize for Instruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        RawInstruction {
            opcode: self.descriptor.byte_value(),
            offset: self.offset,
            body: self.body.clone(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Instruction {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = RawInstruction::deserialize(deserializer)?;
        let descriptor = opcode_table()
            .lookup(raw.opcode)
            .ok_or_else(|| D::Error::custom(format!("unknown opcode 0x{:02X}", raw.opcode)))?;
        if !schema::body_matches(descriptor.body, &raw.body) {
            return Err(D::Error::custom(format!(
                "body does not match `{}` schema",
                descriptor.name
            )));
        }
        Ok(Self {
            descriptor,
            offset: raw.offset,
            body: raw.body,
        })
    }
}

/// An ordered, decoded instruction sequence
///
/// Offsets are strictly increasing and contiguous with instruction byte
/// lengths: each instruction starts where the previous one ended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstructionStream {
    instructions: Vec<Instruction>,
}

impl InstructionStream {
    /// Decode a whole instruction region
    ///
    /// Fails on the first structurally invalid instruction, reporting its
    /// byte offset; no partial stream is returned.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cur = Cursor::new(bytes);
        let mut instructions = Vec::new();
        while !cur.at_end() {
            instructions.push(Instruction::decode(&mut cur)?);
        }
        Ok(Self { instructions })
    }

    /// Serialize every instruction back to bytes
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        for insn in &self.instructions {
            insn.encode(&mut out);
        }
        out
    }

    /// Number of instructions
    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True when the stream holds no instructions
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Instruction by decode order
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }

    /// Iterate in decode order
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }
}

impl IntoIterator for InstructionStream {
    type Item = Instruction;
    type IntoIter = std::vec::IntoIter<Instruction>;

    fn into_iter(self) -> Self::IntoIter {
        self.instructions.into_iter()
    }
}

impl fmt::Display for InstructionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for insn in &self.instructions {
            writeln!(f, "{:04}  {insn}", insn.offset())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::Arity;
    use crate::pool::PoolKind;

    #[test]
    fn test_decode_add_i() {
        let stream = InstructionStream::decode(&[0xC5]).unwrap();
        assert_eq!(stream.len(), 1);
        let insn = stream.get(0).unwrap();
        assert_eq!(insn.opcode(), Opcode::AddI);
        assert_eq!(insn.consumes(), 2);
        assert_eq!(insn.produces(), 1);
        assert_eq!(insn.result_type(), Some(ResultType::Int));
        assert!(insn.body().is_empty());
    }

    #[test]
    fn test_decode_declocal_i() {
        let stream = InstructionStream::decode(&[0xC3, 0x05]).unwrap();
        let insn = stream.get(0).unwrap();
        assert_eq!(insn.opcode(), Opcode::DecLocalI);
        assert_eq!(insn.operand("reg_index"), Some(&Operand::Uint(5)));
        assert_eq!(insn.consumes(), 0);
        assert_eq!(insn.produces(), 0);
    }

    #[test]
    fn test_decode_getlex_is_lazy() {
        // the multiname index is never bounds-checked while decoding
        let stream = InstructionStream::decode(&[0x60, 0x1F]).unwrap();
        let insn = stream.get(0).unwrap();
        assert_eq!(
            insn.pool_ref_at(0),
            PoolRef::new(PoolKind::Multiname, 0x1F)
        );
    }

    #[test]
    fn test_unknown_opcode() {
        let err = InstructionStream::decode(&[0x02, 0x00]).unwrap_err();
        assert_eq!(
            err,
            AbcError::UnknownOpcode {
                opcode: 0x00,
                offset: 1,
            }
        );
    }

    #[test]
    fn test_truncated_body_restores_cursor() {
        // jump wants a 3-byte offset, only 2 bytes remain
        let bytes = [0x10, 0x01, 0x02];
        let mut cur = Cursor::new(&bytes);
        let err = Instruction::decode(&mut cur).unwrap_err();
        assert_eq!(
            err,
            AbcError::TruncatedInstruction {
                offset: 0,
                field: "target",
            }
        );
        assert_eq!(cur.position(), 0);
    }

    #[test]
    fn test_variadic_call_arity() {
        // callproperty property=1, arg_count=3: receiver + args
        let stream = InstructionStream::decode(&[0x46, 0x01, 0x03]).unwrap();
        let insn = stream.get(0).unwrap();
        assert_eq!(insn.consumes(), 4);
        assert_eq!(insn.produces(), 1);

        // call arg_count=0: function + receiver only
        let stream = InstructionStream::decode(&[0x41, 0x00]).unwrap();
        assert_eq!(stream.get(0).unwrap().consumes(), 2);

        // newobject arg_count=2: two key/value pairs
        let stream = InstructionStream::decode(&[0x55, 0x02]).unwrap();
        let insn = stream.get(0).unwrap();
        assert_eq!(insn.descriptor().consume, Arity::Counted {
            field: "arg_count",
            scale: 2,
            bias: 0,
        });
        assert_eq!(insn.consumes(), 4);
    }

    #[test]
    fn test_stream_offsets_are_contiguous() {
        // pushbyte 7; getlocal 300 (two-byte varint); add
        let mut bytes = vec![0x24, 0x07, 0x62];
        crate::codec::write_u30(&mut bytes, 300);
        bytes.push(0xA0);
        let stream = InstructionStream::decode(&bytes).unwrap();
        let mut expected = 0;
        for insn in stream.iter() {
            assert_eq!(insn.offset(), expected);
            expected += insn.byte_len();
        }
        assert_eq!(expected as usize, bytes.len());
    }

    #[test]
    fn test_stream_roundtrip() {
        let mut bytes = vec![0xD0, 0x30]; // getlocal0, pushscope
        bytes.extend([0x5D, 0x01]); // findpropstrict multiname#1
        bytes.extend([0x46, 0x01, 0x00]); // callproperty multiname#1 argc=0
        bytes.push(0x29); // pop
        bytes.push(0x47); // returnvoid
        let stream = InstructionStream::decode(&bytes).unwrap();
        assert_eq!(stream.encode(), bytes);
    }

    #[test]
    fn test_instruction_roundtrip_from_values() {
        let insn = Instruction::new(
            Opcode::DecLocalI,
            vec![Operand::Uint(300)],
        );
        let mut bytes = Vec::new();
        insn.encode(&mut bytes);
        let mut cur = Cursor::new(&bytes);
        let decoded = Instruction::decode(&mut cur).unwrap();
        assert_eq!(decoded, insn);
    }

    #[test]
    #[should_panic(expected = "body values do not match")]
    fn test_wrong_body_panics() {
        Instruction::new(Opcode::Jump, vec![Operand::Uint(3)]);
    }

    #[test]
    fn test_branch_targets() {
        // offset 0: jump +2; offset 4: jump -4 (back to the first jump's end)
        let mut bytes = Vec::new();
        bytes.push(0x10);
        crate::codec::write_s24(&mut bytes, 2);
        bytes.push(0x10);
        crate::codec::write_s24(&mut bytes, -4);
        let stream = InstructionStream::decode(&bytes).unwrap();
        assert_eq!(stream.get(0).unwrap().branch_targets(), vec![6]);
        assert_eq!(stream.get(1).unwrap().branch_targets(), vec![4]);
        // non-branching instructions have none
        let stream = InstructionStream::decode(&[0xA0]).unwrap();
        assert!(stream.get(0).unwrap().branch_targets().is_empty());
    }

    #[test]
    fn test_lookupswitch_targets_are_start_relative() {
        let mut bytes = vec![0x1B];
        crate::codec::write_s24(&mut bytes, 9);
        crate::codec::write_u30(&mut bytes, 0);
        crate::codec::write_s24(&mut bytes, 0);
        let stream = InstructionStream::decode(&bytes).unwrap();
        assert_eq!(stream.get(0).unwrap().branch_targets(), vec![9, 0]);
    }

    #[test]
    fn test_display() {
        let stream = InstructionStream::decode(&[0xC3, 0x05]).unwrap();
        assert_eq!(stream.get(0).unwrap().to_string(), "declocal_i 5");

        let stream = InstructionStream::decode(&[0x60, 0x02]).unwrap();
        assert_eq!(stream.get(0).unwrap().to_string(), "getlex multiname#2");

        let mut bytes = vec![0x11];
        crate::codec::write_s24(&mut bytes, -8);
        let stream = InstructionStream::decode(&bytes).unwrap();
        assert_eq!(stream.get(0).unwrap().to_string(), "iftrue -8");
    }

    #[test]
    fn test_stream_display_lines() {
        let stream = InstructionStream::decode(&[0xD0, 0xC5]).unwrap();
        let text = stream.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, ["0000  getlocal0", "0001  add_i"]);
    }

    #[test]
    fn test_serde_roundtrip() {
        let bytes = [0x24, 0x07, 0xC5, 0x63, 0x02];
        let stream = InstructionStream::decode(&bytes).unwrap();
        let json = serde_json::to_string(&stream).unwrap();
        let restored: InstructionStream = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, stream);
        assert_eq!(restored.encode(), bytes);
    }

    #[test]
    fn test_serde_rejects_unknown_opcode() {
        let json = r#"{"instructions":[{"opcode":255,"offset":0,"body":[]}]}"#;
        let result: std::result::Result<InstructionStream, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
