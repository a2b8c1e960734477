//! Bytecode errors

use thiserror::Error;

use crate::pool::PoolKind;

/// Errors that can occur while decoding instructions or resolving their
/// constant pool references.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AbcError {
    /// The byte value has no registered opcode descriptor
    #[error("unknown opcode 0x{opcode:02X} at offset {offset}")]
    UnknownOpcode {
        /// The offending byte value
        opcode: u8,
        /// Byte offset of the instruction
        offset: u32,
    },

    /// A variable-length integer did not terminate within the maximum
    /// byte count
    #[error("malformed variable-length integer at offset {offset}")]
    MalformedVarint {
        /// Byte offset of the instruction being decoded
        offset: u32,
    },

    /// The instruction body ran past the end of the available bytes
    #[error("truncated instruction at offset {offset} (field `{field}`)")]
    TruncatedInstruction {
        /// Byte offset of the instruction being decoded
        offset: u32,
        /// Name of the field that could not be decoded
        field: &'static str,
    },

    /// A constant pool index was out of bounds for its pool
    #[error("no {kind} constant at index {index}")]
    PoolResolution {
        /// The pool the reference points into
        kind: PoolKind,
        /// The out-of-bounds index
        index: u32,
    },

    /// The opcode does not build an astlet (or statement) node
    #[error("opcode `{opcode}` does not support astlet conversion")]
    UnsupportedAstletConversion {
        /// Name of the opcode
        opcode: &'static str,
    },
}

/// Result type for bytecode operations
pub type Result<T> = std::result::Result<T, AbcError>;
