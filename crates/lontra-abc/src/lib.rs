//! # Lontra ABC
//!
//! This crate models the ABC instruction format for the Lontra AVM2
//! toolchain: a constant pool plus a linear instruction stream operating
//! on an implicit evaluation stack.
//!
//! ## Design Principles
//!
//! - **Table-driven**: every opcode is one immutable descriptor in a
//!   declarative table, built into a byte-indexed registry once per
//!   process
//! - **Exact round-trip**: decoding and encoding are strict inverses at
//!   the byte level, for reassembly and patching workflows
//! - **Lazy pool resolution**: decoding is purely byte-level; constant
//!   pool references are bounds-checked only when a consumer resolves
//!   them
//! - **Analysis-ready**: each instruction reports its static stack
//!   effect, branch targets, result type, referenced namespaces, and an
//!   expression/statement tree node for downstream decompilation
//!
//! The surrounding container format (class/method/script records), the
//! control-flow reconstruction, and the decompiler passes that consume
//! these facts live in their own crates.

#![warn(clippy::all)]
#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod ast;
pub mod codec;
pub mod error;
pub mod instruction;
pub mod namespaces;
pub mod opcode;
pub mod pool;
pub mod schema;

mod table;

pub use ast::{Astlet, AstletKind, BinaryOp, BranchKind, UnaryOp};
pub use codec::Cursor;
pub use error::{AbcError, Result};
pub use instruction::{Instruction, InstructionStream};
pub use namespaces::NsOptions;
pub use opcode::{Arity, Opcode, OpcodeDescriptor, OpcodeTable, ResultType, opcode_table};
pub use pool::{
    ConstantPool, Multiname, Namespace, NamespaceKind, NamespaceSet, PoolEntry, PoolKind, PoolRef,
};
pub use schema::{FieldKind, FieldSpec, Operand};
