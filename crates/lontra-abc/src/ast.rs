//! Astlet construction
//!
//! Each decoded instruction can be converted into a small expression or
//! statement tree node. The caller owns the stack simulation: it supplies
//! the already-built operand subtrees for however many slots the
//! instruction consumes, in push order, and receives the new node. Which
//! shape gets built is declared per opcode in the instruction table as an
//! [`AstRule`] (value-producing opcodes) or a [`StatementRule`]
//! (effect-only opcodes); an opcode declares at most one of the two.

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::{AbcError, Result};
use crate::instruction::Instruction;
use crate::opcode::ResultType;
use crate::pool::{ConstantPool, Multiname, Namespace, PoolEntry};

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum BinaryOp {
    Add,
    AddI,
    Subtract,
    SubtractI,
    Multiply,
    MultiplyI,
    Divide,
    Modulo,
    Lshift,
    Rshift,
    Urshift,
    BitAnd,
    BitOr,
    BitXor,
    Equals,
    StrictEquals,
    LessThan,
    LessEquals,
    GreaterThan,
    GreaterEquals,
    InstanceOf,
    IsTypeLate,
    AsTypeLate,
    In,
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum UnaryOp {
    Negate,
    NegateI,
    Increment,
    IncrementI,
    Decrement,
    DecrementI,
    Not,
    BitNot,
    TypeOf,
    CheckFilter,
    EscXElem,
    EscXAttr,
}

/// Conditional branch kinds, by comparison performed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum BranchKind {
    IfTrue,
    IfFalse,
    IfEq,
    IfNe,
    IfLt,
    IfLe,
    IfGt,
    IfGe,
    IfStrictEq,
    IfStrictNe,
    IfNlt,
    IfNle,
    IfNgt,
    IfNge,
}

/// Fixed literal kinds pushed without a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Literal {
    Null,
    Undefined,
    True,
    False,
    Nan,
}

/// Expression construction rule of a value-producing opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AstRule {
    /// A fixed literal (pushnull, pushtrue, …)
    Literal(Literal),
    /// Integer literal from a one-byte body field
    IntFromByte,
    /// Integer literal from a signed varint body field
    IntFromShort,
    /// Literal resolved from the pool reference in the body
    Pooled,
    /// Local register read, register index in the body
    GetLocal,
    /// Local register read with the register fused into the opcode
    GetLocalFixed(u8),
    /// The global scope object
    GlobalScope,
    /// Scope stack read, index in the body
    ScopeObject,
    /// Binary operator over two operand subtrees
    Binary(BinaryOp),
    /// Unary operator over one operand subtree
    Unary(UnaryOp),
    /// Type conversion to a fixed result type
    Convert(ResultType),
    /// Coercion to the multiname in the body
    Coerce,
    /// As-type test against the multiname in the body
    AsType,
    /// Is-type test against the multiname in the body
    IsType,
    /// Property read from a base object subtree
    Property,
    /// Property read from the base class
    SuperProperty,
    /// Lexically scoped property reference
    Lex,
    /// Scope search for the holder of a property
    FindProperty {
        /// Fail (instead of pushing the global) when the name is unbound
        strict: bool,
    },
    /// Script-level definition lookup
    FindDef,
    /// XML descendants read from a base object subtree
    Descendants,
    /// Property deletion over a base object subtree
    DeleteProperty,
    /// Slot read by index from a base object subtree
    Slot,
    /// Global slot read by index
    GlobalSlot,
    /// Property cursor test over object and index subtrees
    HasNext,
    /// Register-based property cursor advance
    HasNext2,
    /// Property name cursor read
    NextName,
    /// Property value cursor read
    NextValue,
    /// Closure call: operands are function, receiver, then arguments
    CallClosure,
    /// Property call: operands are receiver then arguments
    CallProperty {
        /// Empty-receiver (lexical) call form
        lex: bool,
    },
    /// Base class method call
    CallSuper,
    /// Dispatch-index method call
    CallMethod,
    /// Method-table call
    CallStatic,
    /// Constructor call: operands are function then arguments
    Construct,
    /// Property constructor call: operands are base then arguments
    ConstructProperty,
    /// Type parameter application: operands are base then parameters
    ApplyType,
    /// Closure over the method named in the body
    NewFunction,
    /// Method activation object
    NewActivation,
    /// Catch scope object
    NewCatch,
    /// Class closure over a base class subtree
    NewClass,
    /// Array literal from the operand subtrees
    NewArray,
    /// Object literal from alternating key/value subtrees
    NewObject,
}

/// Statement construction rule of an effect-only opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementRule {
    /// Local register write, register index in the body
    SetLocal,
    /// Local register write with the register fused into the opcode
    SetLocalFixed(u8),
    /// Property write: operands are object then value
    SetProperty,
    /// Property initialization on a fresh object
    InitProperty,
    /// Base class property write
    SetSuper,
    /// Slot write by index: operands are object then value
    SetSlot,
    /// Global slot write by index
    SetGlobalSlot,
    /// In-place local register increment
    IncrementLocal,
    /// In-place local register decrement
    DecrementLocal,
    /// Unconditional branch
    Jump,
    /// Conditional branch over its condition subtrees
    Branch(BranchKind),
    /// Case table dispatch over an index subtree
    Switch,
    /// Return a value subtree
    Return,
    /// Return without a value
    ReturnVoid,
    /// Throw a value subtree
    Throw,
    /// Base class constructor call: operands are receiver then arguments
    ConstructSuper,
    /// Property call discarding the result
    CallPropertyVoid,
    /// Base class method call discarding the result
    CallSuperVoid,
    /// Set the default XML namespace from the pool
    Dxns,
    /// Set the default XML namespace from a value subtree
    DxnsLate,
}

/// Node kind of an [`Astlet`]
///
/// Operand subtrees live in [`Astlet::children`]; the kind carries the
/// instruction-specific payload (resolved pool entries, register and slot
/// indices, branch targets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AstletKind {
    // ==================== Literals ====================
    /// `null`
    Null,
    /// `undefined`
    Undefined,
    /// `true`
    True,
    /// `false`
    False,
    /// `NaN`
    Nan,
    /// Integer literal
    Integer(i64),
    /// Floating point literal
    Number(f64),
    /// String literal
    Str(Rc<str>),
    /// Namespace literal
    NamespaceLit(Rc<Namespace>),

    // ==================== Registers and scopes ====================
    /// Local register read
    Local(u32),
    /// The global scope object
    GlobalScope,
    /// Scope stack entry read
    ScopeObject(u8),

    // ==================== Operators ====================
    /// Binary operation; children: lhs, rhs
    Binary(BinaryOp),
    /// Unary operation; child: operand
    Unary(UnaryOp),
    /// Conversion; child: operand
    Convert(ResultType),
    /// Coercion to a named type; child: operand
    Coerce(Rc<Multiname>),
    /// As-type test; child: operand
    AsType(Rc<Multiname>),
    /// Is-type test; child: operand
    IsType(Rc<Multiname>),

    // ==================== Property access ====================
    /// Property read; child: base object
    Property(Rc<Multiname>),
    /// Base class property read; child: receiver
    SuperProperty(Rc<Multiname>),
    /// Lexically scoped property reference; no children
    Lex(Rc<Multiname>),
    /// Scope search for a property holder; no children
    FindProperty {
        /// The property searched for
        name: Rc<Multiname>,
        /// Strict (failing) form
        strict: bool,
    },
    /// Script-level definition lookup; no children
    FindDef(Rc<Multiname>),
    /// XML descendants read; child: base object
    Descendants(Rc<Multiname>),
    /// Property deletion; child: base object
    DeleteProperty(Rc<Multiname>),
    /// Slot read; child: base object
    Slot(u32),
    /// Global slot read; no children
    GlobalSlot(u32),

    // ==================== Iteration ====================
    /// Property cursor test; children: object, index
    HasNext,
    /// Register-based cursor advance; no children
    HasNext2 {
        /// Register holding the object
        object_reg: u32,
        /// Register holding the cursor index
        index_reg: u32,
    },
    /// Property name read; children: object, index
    NextName,
    /// Property value read; children: object, index
    NextValue,

    // ==================== Calls and construction ====================
    /// Closure call; children: function, receiver, arguments
    CallClosure,
    /// Property call; children: receiver, arguments
    CallProperty {
        /// The called property
        name: Rc<Multiname>,
        /// Empty-receiver (lexical) form
        lex: bool,
    },
    /// Base class method call; children: receiver, arguments
    CallSuper(Rc<Multiname>),
    /// Dispatch-index method call; children: receiver, arguments
    CallMethod(u32),
    /// Method-table call; children: receiver, arguments
    CallStatic(u32),
    /// Constructor call; children: function, arguments
    Construct,
    /// Property constructor call; children: base, arguments
    ConstructProperty(Rc<Multiname>),
    /// Type parameter application; children: base, parameters
    ApplyType,
    /// Closure over a method; no children
    NewFunction(u32),
    /// Method activation object; no children
    NewActivation,
    /// Catch scope object; no children
    NewCatch(u32),
    /// Class closure; child: base class
    NewClass(u32),
    /// Array literal; children: elements
    NewArray,
    /// Object literal; children: alternating keys and values
    NewObject,

    // ==================== Statements ====================
    /// Local register write; child: value
    AssignLocal(u32),
    /// Property write; children: object, value
    AssignProperty(Rc<Multiname>),
    /// Property initialization; children: object, value
    InitProperty(Rc<Multiname>),
    /// Base class property write; children: receiver, value
    AssignSuper(Rc<Multiname>),
    /// Slot write; children: object, value
    AssignSlot(u32),
    /// Global slot write; child: value
    AssignGlobalSlot(u32),
    /// In-place register increment
    IncrementLocal {
        /// The register
        reg: u32,
        /// Integer-specialized form
        int: bool,
    },
    /// In-place register decrement
    DecrementLocal {
        /// The register
        reg: u32,
        /// Integer-specialized form
        int: bool,
    },
    /// Unconditional branch to an absolute offset
    Jump {
        /// Absolute byte offset of the target instruction
        target: u32,
    },
    /// Conditional branch; children: condition operands
    Branch {
        /// Comparison performed
        kind: BranchKind,
        /// Absolute byte offset of the target instruction
        target: u32,
    },
    /// Case table dispatch; child: index value
    Switch {
        /// Absolute byte offset of the default target
        default: u32,
        /// Absolute byte offsets of the case targets
        cases: Vec<u32>,
    },
    /// Value return; child: value
    Return,
    /// Void return; no children
    ReturnVoid,
    /// Exception throw; child: value
    Throw,
    /// Base class constructor call; children: receiver, arguments
    ConstructSuperCall,
    /// Property call discarding the result; children: receiver, arguments
    CallPropertyVoid(Rc<Multiname>),
    /// Base class method call discarding the result
    CallSuperVoid(Rc<Multiname>),
    /// Default XML namespace from the pool
    DefaultXmlNamespace(Rc<str>),
    /// Default XML namespace from a value subtree
    DefaultXmlNamespaceLate,
}

/// A node in the per-instruction expression/statement tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Astlet {
    /// What this node is
    pub kind: AstletKind,
    /// Owned operand subtrees, in push order
    pub children: Vec<Astlet>,
}

impl Astlet {
    /// Create a node with children
    pub fn new(kind: AstletKind, children: Vec<Astlet>) -> Self {
        Self { kind, children }
    }

    /// Create a childless node
    pub fn leaf(kind: AstletKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }
}

impl Instruction {
    /// Convert this instruction into an expression astlet
    ///
    /// `operands` are the already-built subtrees for the slots this
    /// instruction consumes, in push order; supplying the wrong number is
    /// a caller defect and panics. Returns
    /// [`AbcError::UnsupportedAstletConversion`] when the opcode has no
    /// expression rule.
    pub fn to_astlet(&self, operands: Vec<Astlet>, pool: &ConstantPool) -> Result<Astlet> {
        let descriptor = self.descriptor();
        let Some(rule) = descriptor.expr else {
            return Err(AbcError::UnsupportedAstletConversion {
                opcode: descriptor.name,
            });
        };
        assert_eq!(
            operands.len(),
            self.consumes() as usize,
            "operand subtree count does not match `{}` consume arity",
            descriptor.name
        );

        let node = match rule {
            AstRule::Literal(lit) => Astlet::leaf(match lit {
                Literal::Null => AstletKind::Null,
                Literal::Undefined => AstletKind::Undefined,
                Literal::True => AstletKind::True,
                Literal::False => AstletKind::False,
                Literal::Nan => AstletKind::Nan,
            }),
            AstRule::IntFromByte => {
                let value = self.byte_at(0) as i8;
                Astlet::leaf(AstletKind::Integer(i64::from(value)))
            }
            AstRule::IntFromShort => Astlet::leaf(AstletKind::Integer(i64::from(self.int_at(0)))),
            AstRule::Pooled => {
                let entry = pool.resolve(self.pool_ref_at(0))?;
                Astlet::leaf(match entry {
                    PoolEntry::Int(v) => AstletKind::Integer(i64::from(v)),
                    PoolEntry::Uint(v) => AstletKind::Integer(i64::from(v)),
                    PoolEntry::Double(v) => AstletKind::Number(v),
                    PoolEntry::Str(s) => AstletKind::Str(Rc::clone(s)),
                    PoolEntry::Namespace(ns) => AstletKind::NamespaceLit(Rc::clone(ns)),
                    PoolEntry::NamespaceSet(_) | PoolEntry::Multiname(_) => {
                        unreachable!("push opcodes only reference value pools")
                    }
                })
            }
            AstRule::GetLocal => Astlet::leaf(AstletKind::Local(self.uint_at(0))),
            AstRule::GetLocalFixed(reg) => Astlet::leaf(AstletKind::Local(u32::from(reg))),
            AstRule::GlobalScope => Astlet::leaf(AstletKind::GlobalScope),
            AstRule::ScopeObject => Astlet::leaf(AstletKind::ScopeObject(self.byte_at(0))),
            AstRule::Binary(op) => Astlet::new(AstletKind::Binary(op), operands),
            AstRule::Unary(op) => Astlet::new(AstletKind::Unary(op), operands),
            AstRule::Convert(to) => Astlet::new(AstletKind::Convert(to), operands),
            AstRule::Coerce => Astlet::new(AstletKind::Coerce(self.multiname_at(0, pool)?), operands),
            AstRule::AsType => Astlet::new(AstletKind::AsType(self.multiname_at(0, pool)?), operands),
            AstRule::IsType => Astlet::new(AstletKind::IsType(self.multiname_at(0, pool)?), operands),
            AstRule::Property => {
                Astlet::new(AstletKind::Property(self.multiname_at(0, pool)?), operands)
            }
            AstRule::SuperProperty => Astlet::new(
                AstletKind::SuperProperty(self.multiname_at(0, pool)?),
                operands,
            ),
            AstRule::Lex => Astlet::leaf(AstletKind::Lex(self.multiname_at(0, pool)?)),
            AstRule::FindProperty { strict } => Astlet::leaf(AstletKind::FindProperty {
                name: self.multiname_at(0, pool)?,
                strict,
            }),
            AstRule::FindDef => Astlet::leaf(AstletKind::FindDef(self.multiname_at(0, pool)?)),
            AstRule::Descendants => Astlet::new(
                AstletKind::Descendants(self.multiname_at(0, pool)?),
                operands,
            ),
            AstRule::DeleteProperty => Astlet::new(
                AstletKind::DeleteProperty(self.multiname_at(0, pool)?),
                operands,
            ),
            AstRule::Slot => Astlet::new(AstletKind::Slot(self.uint_at(0)), operands),
            AstRule::GlobalSlot => Astlet::leaf(AstletKind::GlobalSlot(self.uint_at(0))),
            AstRule::HasNext => Astlet::new(AstletKind::HasNext, operands),
            AstRule::HasNext2 => Astlet::leaf(AstletKind::HasNext2 {
                object_reg: self.uint_at(0),
                index_reg: self.uint_at(1),
            }),
            AstRule::NextName => Astlet::new(AstletKind::NextName, operands),
            AstRule::NextValue => Astlet::new(AstletKind::NextValue, operands),
            AstRule::CallClosure => Astlet::new(AstletKind::CallClosure, operands),
            AstRule::CallProperty { lex } => Astlet::new(
                AstletKind::CallProperty {
                    name: self.multiname_at(0, pool)?,
                    lex,
                },
                operands,
            ),
            AstRule::CallSuper => {
                Astlet::new(AstletKind::CallSuper(self.multiname_at(0, pool)?), operands)
            }
            AstRule::CallMethod => Astlet::new(AstletKind::CallMethod(self.uint_at(0)), operands),
            AstRule::CallStatic => Astlet::new(AstletKind::CallStatic(self.uint_at(0)), operands),
            AstRule::Construct => Astlet::new(AstletKind::Construct, operands),
            AstRule::ConstructProperty => Astlet::new(
                AstletKind::ConstructProperty(self.multiname_at(0, pool)?),
                operands,
            ),
            AstRule::ApplyType => Astlet::new(AstletKind::ApplyType, operands),
            AstRule::NewFunction => Astlet::leaf(AstletKind::NewFunction(self.uint_at(0))),
            AstRule::NewActivation => Astlet::leaf(AstletKind::NewActivation),
            AstRule::NewCatch => Astlet::leaf(AstletKind::NewCatch(self.uint_at(0))),
            AstRule::NewClass => Astlet::new(AstletKind::NewClass(self.uint_at(0)), operands),
            AstRule::NewArray => Astlet::new(AstletKind::NewArray, operands),
            AstRule::NewObject => Astlet::new(AstletKind::NewObject, operands),
        };
        Ok(node)
    }

    /// Convert this instruction into a statement astlet
    ///
    /// The statement counterpart of [`Instruction::to_astlet`], for
    /// effect-only opcodes. The same operand contract applies.
    pub fn to_statement(&self, operands: Vec<Astlet>, pool: &ConstantPool) -> Result<Astlet> {
        let descriptor = self.descriptor();
        let Some(rule) = descriptor.stmt else {
            return Err(AbcError::UnsupportedAstletConversion {
                opcode: descriptor.name,
            });
        };
        assert_eq!(
            operands.len(),
            self.consumes() as usize,
            "operand subtree count does not match `{}` consume arity",
            descriptor.name
        );

        let int = descriptor.result == Some(ResultType::Int);
        let node = match rule {
            StatementRule::SetLocal => {
                Astlet::new(AstletKind::AssignLocal(self.uint_at(0)), operands)
            }
            StatementRule::SetLocalFixed(reg) => {
                Astlet::new(AstletKind::AssignLocal(u32::from(reg)), operands)
            }
            StatementRule::SetProperty => Astlet::new(
                AstletKind::AssignProperty(self.multiname_at(0, pool)?),
                operands,
            ),
            StatementRule::InitProperty => Astlet::new(
                AstletKind::InitProperty(self.multiname_at(0, pool)?),
                operands,
            ),
            StatementRule::SetSuper => Astlet::new(
                AstletKind::AssignSuper(self.multiname_at(0, pool)?),
                operands,
            ),
            StatementRule::SetSlot => Astlet::new(AstletKind::AssignSlot(self.uint_at(0)), operands),
            StatementRule::SetGlobalSlot => {
                Astlet::new(AstletKind::AssignGlobalSlot(self.uint_at(0)), operands)
            }
            StatementRule::IncrementLocal => Astlet::leaf(AstletKind::IncrementLocal {
                reg: self.uint_at(0),
                int,
            }),
            StatementRule::DecrementLocal => Astlet::leaf(AstletKind::DecrementLocal {
                reg: self.uint_at(0),
                int,
            }),
            StatementRule::Jump => Astlet::leaf(AstletKind::Jump {
                target: self.branch_targets()[0],
            }),
            StatementRule::Branch(kind) => Astlet::new(
                AstletKind::Branch {
                    kind,
                    target: self.branch_targets()[0],
                },
                operands,
            ),
            StatementRule::Switch => {
                let targets = self.branch_targets();
                Astlet::new(
                    AstletKind::Switch {
                        default: targets[0],
                        cases: targets[1..].to_vec(),
                    },
                    operands,
                )
            }
            StatementRule::Return => Astlet::new(AstletKind::Return, operands),
            StatementRule::ReturnVoid => Astlet::leaf(AstletKind::ReturnVoid),
            StatementRule::Throw => Astlet::new(AstletKind::Throw, operands),
            StatementRule::ConstructSuper => Astlet::new(AstletKind::ConstructSuperCall, operands),
            StatementRule::CallPropertyVoid => Astlet::new(
                AstletKind::CallPropertyVoid(self.multiname_at(0, pool)?),
                operands,
            ),
            StatementRule::CallSuperVoid => Astlet::new(
                AstletKind::CallSuperVoid(self.multiname_at(0, pool)?),
                operands,
            ),
            StatementRule::Dxns => {
                let r = self.pool_ref_at(0);
                Astlet::leaf(AstletKind::DefaultXmlNamespace(Rc::clone(
                    pool.string(r.index)?,
                )))
            }
            StatementRule::DxnsLate => Astlet::new(AstletKind::DefaultXmlNamespaceLate, operands),
        };
        Ok(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::InstructionStream;
    use crate::pool::NamespaceKind;

    fn pool_with_name() -> (ConstantPool, u32) {
        let mut pool = ConstantPool::new();
        let ns = Rc::new(Namespace::new(NamespaceKind::Package, "flash.events"));
        let idx = pool.add_multiname(Multiname::QName {
            ns,
            name: Rc::from("Event"),
            attribute: false,
        });
        (pool, idx)
    }

    fn decode_one(bytes: &[u8]) -> Instruction {
        let stream = InstructionStream::decode(bytes).unwrap();
        stream.into_iter().next().unwrap()
    }

    #[test]
    fn test_getlex_builds_property_reference() {
        let (pool, idx) = pool_with_name();
        let insn = decode_one(&[0x60, idx as u8]);
        let astlet = insn.to_astlet(Vec::new(), &pool).unwrap();
        assert!(astlet.children.is_empty());
        match astlet.kind {
            AstletKind::Lex(name) => assert_eq!(name.name().unwrap().as_ref(), "Event"),
            other => panic!("unexpected kind {other:?}"),
        }
    }

    #[test]
    fn test_add_i_builds_binary_node() {
        let pool = ConstantPool::new();
        let insn = decode_one(&[0xC5]);
        let lhs = Astlet::leaf(AstletKind::Integer(1));
        let rhs = Astlet::leaf(AstletKind::Local(2));
        let astlet = insn.to_astlet(vec![lhs, rhs], &pool).unwrap();
        assert_eq!(astlet.kind, AstletKind::Binary(BinaryOp::AddI));
        assert_eq!(astlet.children.len(), 2);
    }

    #[test]
    fn test_statement_only_opcode_rejects_expression() {
        let pool = ConstantPool::new();
        // setlocal1
        let insn = decode_one(&[0xD5]);
        let err = insn
            .to_astlet(vec![Astlet::leaf(AstletKind::Null)], &pool)
            .unwrap_err();
        assert_eq!(
            err,
            AbcError::UnsupportedAstletConversion {
                opcode: "setlocal1",
            }
        );

        let stmt = insn
            .to_statement(vec![Astlet::leaf(AstletKind::Null)], &pool)
            .unwrap();
        assert_eq!(stmt.kind, AstletKind::AssignLocal(1));
        assert_eq!(stmt.children.len(), 1);
    }

    #[test]
    fn test_plumbing_opcode_supports_neither() {
        let pool = ConstantPool::new();
        // dup
        let insn = decode_one(&[0x2A]);
        let operand = vec![Astlet::leaf(AstletKind::True)];
        assert!(insn.to_astlet(operand.clone(), &pool).is_err());
        assert!(insn.to_statement(operand, &pool).is_err());
    }

    #[test]
    fn test_branch_statement_carries_absolute_target() {
        let pool = ConstantPool::new();
        // offset 0: iftrue +3 (true branch over the next jump)
        let insn = decode_one(&[0x11, 0x03, 0x00, 0x00]);
        let stmt = insn
            .to_statement(vec![Astlet::leaf(AstletKind::True)], &pool)
            .unwrap();
        assert_eq!(
            stmt.kind,
            AstletKind::Branch {
                kind: BranchKind::IfTrue,
                target: 7,
            }
        );
    }

    #[test]
    fn test_pushbyte_sign_extends() {
        let pool = ConstantPool::new();
        let insn = decode_one(&[0x24, 0xFF]);
        let astlet = insn.to_astlet(Vec::new(), &pool).unwrap();
        assert_eq!(astlet.kind, AstletKind::Integer(-1));
    }

    #[test]
    fn test_pooled_literal_resolution_is_lazy() {
        let pool = ConstantPool::new();
        // pushstring with an index the pool does not have
        let insn = decode_one(&[0x2C, 0x09]);
        let err = insn.to_astlet(Vec::new(), &pool).unwrap_err();
        assert!(matches!(err, AbcError::PoolResolution { .. }));
    }

    #[test]
    fn test_lookupswitch_statement_targets() {
        let pool = ConstantPool::new();
        // default +12, two cases: +12, +24 (relative to the instruction start)
        let mut bytes = vec![0x1B];
        crate::codec::write_s24(&mut bytes, 12);
        crate::codec::write_u30(&mut bytes, 1);
        crate::codec::write_s24(&mut bytes, 12);
        crate::codec::write_s24(&mut bytes, 24);
        let insn = decode_one(&bytes);
        let stmt = insn
            .to_statement(vec![Astlet::leaf(AstletKind::Integer(0))], &pool)
            .unwrap();
        assert_eq!(
            stmt.kind,
            AstletKind::Switch {
                default: 12,
                cases: vec![12, 24],
            }
        );
    }
}
