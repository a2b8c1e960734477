//! Opcode descriptors and the build-once lookup table
//!
//! Every instruction of the set is described by one immutable
//! [`OpcodeDescriptor`]: its body schema, its stack arity (fixed, or a
//! rule over decoded body values for the variadic call family), an
//! optional result type, and its astlet construction capability. The
//! descriptors live in the declarative table in [`crate::table`] and are
//! indexed by opcode byte in a table built once per process.

use std::sync::OnceLock;

use crate::ast::{AstRule, StatementRule};
use crate::schema::{FieldSpec, Operand};
use crate::table;

/// Bytecode opcodes
///
/// Stack-machine instruction set. The discriminant is the wire byte
/// value; unassigned byte values have no variant and fail decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    // ==================== Miscellaneous ====================
    /// Debugger breakpoint
    Bkpt = 0x01,
    /// No operation
    Nop = 0x02,
    /// Throw the top of stack as an exception
    Throw = 0x03,
    /// Get a property from the base class: push base.name
    GetSuper = 0x04,
    /// Set a property on the base class: base.name = value
    SetSuper = 0x05,
    /// Set the default XML namespace from the pool
    Dxns = 0x06,
    /// Set the default XML namespace from the stack
    DxnsLate = 0x07,
    /// Kill a local register (liveness hint)
    Kill = 0x08,
    /// Branch target marker
    Label = 0x09,

    // ==================== Control transfer ====================
    /// Branch if not less-than
    IfNlt = 0x0C,
    /// Branch if not less-or-equal
    IfNle = 0x0D,
    /// Branch if not greater-than
    IfNgt = 0x0E,
    /// Branch if not greater-or-equal
    IfNge = 0x0F,
    /// Unconditional branch
    Jump = 0x10,
    /// Branch if true
    IfTrue = 0x11,
    /// Branch if false
    IfFalse = 0x12,
    /// Branch if equal
    IfEq = 0x13,
    /// Branch if not equal
    IfNe = 0x14,
    /// Branch if less-than
    IfLt = 0x15,
    /// Branch if less-or-equal
    IfLe = 0x16,
    /// Branch if greater-than
    IfGt = 0x17,
    /// Branch if greater-or-equal
    IfGe = 0x18,
    /// Branch if strictly equal
    IfStrictEq = 0x19,
    /// Branch if strictly not equal
    IfStrictNe = 0x1A,
    /// Jump through a case offset table
    LookupSwitch = 0x1B,

    // ==================== Scope stack ====================
    /// Push a with-scope onto the scope stack
    PushWith = 0x1C,
    /// Pop the top of the scope stack
    PopScope = 0x1D,

    // ==================== Iteration ====================
    /// Push the name of the next property: push nextname(obj, index)
    NextName = 0x1E,
    /// Push whether another property follows: push hasnext(obj, index)
    HasNext = 0x1F,

    // ==================== Stack pushes ====================
    /// Push null
    PushNull = 0x20,
    /// Push undefined
    PushUndefined = 0x21,
    /// Push the value of the next property: push nextvalue(obj, index)
    NextValue = 0x23,
    /// Push a one-byte signed integer
    PushByte = 0x24,
    /// Push a variable-length signed integer
    PushShort = 0x25,
    /// Push true
    PushTrue = 0x26,
    /// Push false
    PushFalse = 0x27,
    /// Push NaN
    PushNan = 0x28,
    /// Discard the top of stack
    Pop = 0x29,
    /// Duplicate the top of stack
    Dup = 0x2A,
    /// Swap the two topmost values
    Swap = 0x2B,
    /// Push a string pool entry
    PushString = 0x2C,
    /// Push an integer pool entry
    PushInt = 0x2D,
    /// Push an unsigned integer pool entry
    PushUint = 0x2E,
    /// Push a double pool entry
    PushDouble = 0x2F,
    /// Push the top of stack onto the scope stack
    PushScope = 0x30,
    /// Push a namespace pool entry
    PushNamespace = 0x31,
    /// Advance the property cursor held in two registers
    HasNext2 = 0x32,

    // ==================== Raw memory ====================
    /// Load a signed 8-bit value from domain memory
    Li8 = 0x35,
    /// Load a 16-bit value from domain memory
    Li16 = 0x36,
    /// Load a 32-bit value from domain memory
    Li32 = 0x37,
    /// Load a 32-bit float from domain memory
    Lf32 = 0x38,
    /// Load a 64-bit float from domain memory
    Lf64 = 0x39,
    /// Store an 8-bit value into domain memory
    Si8 = 0x3A,
    /// Store a 16-bit value into domain memory
    Si16 = 0x3B,
    /// Store a 32-bit value into domain memory
    Si32 = 0x3C,
    /// Store a 32-bit float into domain memory
    Sf32 = 0x3D,
    /// Store a 64-bit float into domain memory
    Sf64 = 0x3E,

    // ==================== Function invocation ====================
    /// Create a closure over a method
    NewFunction = 0x40,
    /// Call a closure: push func.call(receiver, args…)
    Call = 0x41,
    /// Construct an instance: push new func(args…)
    Construct = 0x42,
    /// Call a method of an object by dispatch index
    CallMethod = 0x43,
    /// Call a method by method-table index
    CallStatic = 0x44,
    /// Call a method of the base class
    CallSuper = 0x45,
    /// Call a property: push obj.name(args…)
    CallProperty = 0x46,
    /// Return void from the current method
    ReturnVoid = 0x47,
    /// Return the top of stack from the current method
    ReturnValue = 0x48,
    /// Invoke the base class constructor
    ConstructSuper = 0x49,
    /// Construct a property: push new obj.name(args…)
    ConstructProp = 0x4A,
    /// Call a property with an empty receiver
    CallPropLex = 0x4C,
    /// Call a base class method, discarding the result
    CallSuperVoid = 0x4E,
    /// Call a property, discarding the result
    CallPropVoid = 0x4F,

    // ==================== Sign extension ====================
    /// Sign-extend a 1-bit value
    Sxi1 = 0x50,
    /// Sign-extend an 8-bit value
    Sxi8 = 0x51,
    /// Sign-extend a 16-bit value
    Sxi16 = 0x52,

    // ==================== Object construction ====================
    /// Apply type parameters: push base.<params…>
    ApplyType = 0x53,
    /// Construct an object literal from key/value pairs
    NewObject = 0x55,
    /// Construct an array literal
    NewArray = 0x56,
    /// Construct the method activation object
    NewActivation = 0x57,
    /// Construct a class closure over the scope on the stack
    NewClass = 0x58,
    /// Push the descendants of an XML object
    GetDescendants = 0x59,
    /// Construct a catch scope object
    NewCatch = 0x5A,

    // ==================== Property access ====================
    /// Find the scope object holding a property, failing if absent
    FindPropStrict = 0x5D,
    /// Find the scope object holding a property
    FindProperty = 0x5E,
    /// Find the script-level definition of a name
    FindDef = 0x5F,
    /// Find and get a lexically scoped property: push name's value
    GetLex = 0x60,
    /// Set a property: obj.name = value
    SetProperty = 0x61,
    /// Push a local register
    GetLocal = 0x62,
    /// Store the top of stack into a local register
    SetLocal = 0x63,
    /// Push the global scope object
    GetGlobalScope = 0x64,
    /// Push a scope stack entry by index
    GetScopeObject = 0x65,
    /// Get a property: push obj.name
    GetProperty = 0x66,
    /// Initialize a property of a freshly constructed object
    InitProperty = 0x68,
    /// Delete a property: push delete obj.name
    DeleteProperty = 0x6A,
    /// Push a slot of an object by index
    GetSlot = 0x6C,
    /// Store into a slot of an object by index
    SetSlot = 0x6D,
    /// Push a slot of the global object
    GetGlobalSlot = 0x6E,
    /// Store into a slot of the global object
    SetGlobalSlot = 0x6F,

    // ==================== Type conversion ====================
    /// Convert to string
    ConvertS = 0x70,
    /// Escape an XML element name
    EscXElem = 0x71,
    /// Escape an XML attribute name
    EscXAttr = 0x72,
    /// Convert to integer
    ConvertI = 0x73,
    /// Convert to unsigned integer
    ConvertU = 0x74,
    /// Convert to double
    ConvertD = 0x75,
    /// Convert to boolean
    ConvertB = 0x76,
    /// Convert to object
    ConvertO = 0x77,
    /// Check the filter operand for XML filtering
    CheckFilter = 0x78,
    /// Coerce to the type named in the pool
    Coerce = 0x80,
    /// Coerce to the any type
    CoerceA = 0x82,
    /// Coerce to string, preserving null
    CoerceS = 0x85,
    /// Push the value as the named type, or null
    AsType = 0x86,
    /// As-type with the type on the stack
    AsTypeLate = 0x87,
    /// Coerce to object, preserving null
    CoerceO = 0x89,

    // ==================== Arithmetic ====================
    /// Numeric negation
    Negate = 0x90,
    /// Numeric increment
    Increment = 0x91,
    /// Increment a local register in place
    IncLocal = 0x92,
    /// Numeric decrement
    Decrement = 0x93,
    /// Decrement a local register in place
    DecLocal = 0x94,
    /// Push the type name of the operand
    TypeOf = 0x95,
    /// Boolean negation
    Not = 0x96,
    /// Bitwise complement
    BitNot = 0x97,
    /// Addition (numeric or string concatenation)
    Add = 0xA0,
    /// Numeric subtraction
    Subtract = 0xA1,
    /// Numeric multiplication
    Multiply = 0xA2,
    /// Numeric division
    Divide = 0xA3,
    /// Numeric remainder
    Modulo = 0xA4,
    /// Bitwise shift left
    Lshift = 0xA5,
    /// Bitwise arithmetic shift right
    Rshift = 0xA6,
    /// Bitwise logical shift right
    Urshift = 0xA7,
    /// Bitwise and
    BitAnd = 0xA8,
    /// Bitwise or
    BitOr = 0xA9,
    /// Bitwise exclusive or
    BitXor = 0xAA,

    // ==================== Comparison ====================
    /// Loose equality
    Equals = 0xAB,
    /// Strict equality
    StrictEquals = 0xAC,
    /// Less-than
    LessThan = 0xAD,
    /// Less-or-equal
    LessEquals = 0xAE,
    /// Greater-than
    GreaterThan = 0xAF,
    /// Greater-or-equal
    GreaterEquals = 0xB0,
    /// Prototype chain membership
    InstanceOf = 0xB1,
    /// Type membership for the type named in the pool
    IsType = 0xB2,
    /// Type membership with the type on the stack
    IsTypeLate = 0xB3,
    /// Property membership
    In = 0xB4,

    // ==================== Integer-specialized arithmetic ====================
    /// Integer increment
    IncrementI = 0xC0,
    /// Integer decrement
    DecrementI = 0xC1,
    /// Integer increment of a local register
    IncLocalI = 0xC2,
    /// Integer decrement of a local register
    DecLocalI = 0xC3,
    /// Integer negation
    NegateI = 0xC4,
    /// Integer addition
    AddI = 0xC5,
    /// Integer subtraction
    SubtractI = 0xC6,
    /// Integer multiplication
    MultiplyI = 0xC7,

    // ==================== Fused local access ====================
    /// Push local register 0
    GetLocal0 = 0xD0,
    /// Push local register 1
    GetLocal1 = 0xD1,
    /// Push local register 2
    GetLocal2 = 0xD2,
    /// Push local register 3
    GetLocal3 = 0xD3,
    /// Store into local register 0
    SetLocal0 = 0xD4,
    /// Store into local register 1
    SetLocal1 = 0xD5,
    /// Store into local register 2
    SetLocal2 = 0xD6,
    /// Store into local register 3
    SetLocal3 = 0xD7,

    // ==================== Debugging ====================
    /// Register debugging information
    Debug = 0xEF,
    /// Record the current source line number
    DebugLine = 0xF0,
    /// Record the current source file name
    DebugFile = 0xF1,
    /// Breakpoint with a source line number
    BkptLine = 0xF2,
    /// Profiling timestamp
    Timestamp = 0xF3,
}

impl Opcode {
    /// Look up the opcode for a raw byte value
    pub fn from_byte(byte: u8) -> Option<Self> {
        opcode_table().lookup(byte).map(|d| d.opcode)
    }

    /// The wire byte value
    #[inline]
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// The descriptor for this opcode
    pub fn descriptor(self) -> &'static OpcodeDescriptor {
        match opcode_table().lookup(self as u8) {
            Some(descriptor) => descriptor,
            None => panic!("opcode {self:?} missing from the instruction table"),
        }
    }

    /// The mnemonic of this opcode
    #[inline]
    pub fn name(self) -> &'static str {
        self.descriptor().name
    }
}

/// Declared result type of a value-producing opcode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ResultType {
    /// The any type (`*`)
    Any,
    /// Boolean
    Boolean,
    /// Signed integer
    Int,
    /// Unsigned integer
    Uint,
    /// Double
    Number,
    /// String
    String,
    /// Namespace
    Namespace,
    /// Object
    Object,
}

/// Stack arity of an opcode: a constant, or a rule over decoded body values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    /// The same count for every occurrence
    Fixed(u32),
    /// `scale * body[field] + bias`, for the variadic call family
    Counted {
        /// Name of the `U30` body field holding the count
        field: &'static str,
        /// Slots per counted element
        scale: u32,
        /// Slots independent of the count
        bias: u32,
    },
}

impl Arity {
    /// Resolve the arity against a decoded body
    ///
    /// The schema and body are the descriptor's own; a `Counted` rule
    /// naming a missing or non-integer field is an instruction-table
    /// defect and panics.
    pub fn resolve(&self, schema: &'static [FieldSpec], body: &[Operand]) -> u32 {
        match *self {
            Self::Fixed(n) => n,
            Self::Counted { field, scale, bias } => {
                let count = schema
                    .iter()
                    .position(|spec| spec.name == field)
                    .and_then(|i| body.get(i))
                    .and_then(Operand::as_uint)
                    .unwrap_or_else(|| panic!("arity rule names missing field `{field}`"));
                scale * count + bias
            }
        }
    }
}

/// Fixed stack arity
pub(crate) const fn fixed(n: u32) -> Arity {
    Arity::Fixed(n)
}

/// Arity of `body[field] + bias`
pub(crate) const fn argc(field: &'static str, bias: u32) -> Arity {
    Arity::Counted {
        field,
        scale: 1,
        bias,
    }
}

/// Arity of `2 * body[field]`, for key/value pair consumers
pub(crate) const fn argc_pairs(field: &'static str) -> Arity {
    Arity::Counted {
        field,
        scale: 2,
        bias: 0,
    }
}

/// Immutable description of one opcode
///
/// Built once in the declarative instruction table and shared by
/// reference from every decoded [`crate::Instruction`].
#[derive(Debug, PartialEq)]
pub struct OpcodeDescriptor {
    /// The opcode this describes
    pub opcode: Opcode,
    /// Mnemonic, as the disassembler prints it
    pub name: &'static str,
    /// Ordered operand fields
    pub body: &'static [FieldSpec],
    /// Evaluation stack slots consumed
    pub consume: Arity,
    /// Evaluation stack slots produced
    pub produce: Arity,
    /// Declared result type, where the format fixes one
    pub result: Option<ResultType>,
    /// Expression construction rule, for value-producing opcodes
    pub expr: Option<AstRule>,
    /// Statement construction rule, for effect-only opcodes
    pub stmt: Option<StatementRule>,
}

impl OpcodeDescriptor {
    /// Wire byte value of the opcode
    #[inline]
    pub fn byte_value(&self) -> u8 {
        self.opcode as u8
    }

    /// True when the opcode can build an expression astlet
    #[inline]
    pub fn builds_astlet(&self) -> bool {
        self.expr.is_some()
    }

    /// True when the opcode can build a statement astlet
    #[inline]
    pub fn builds_statement(&self) -> bool {
        self.stmt.is_some()
    }

    /// Index of a body field by name
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.body.iter().position(|spec| spec.name == name)
    }

    pub(crate) const fn result(mut self, result: ResultType) -> Self {
        self.result = Some(result);
        self
    }

    pub(crate) const fn expr(mut self, rule: AstRule) -> Self {
        self.expr = Some(rule);
        self
    }

    pub(crate) const fn stmt(mut self, rule: StatementRule) -> Self {
        self.stmt = Some(rule);
        self
    }
}

/// Construct a table entry with fixed arities
pub(crate) const fn op(
    opcode: Opcode,
    name: &'static str,
    body: &'static [FieldSpec],
    consume: Arity,
    produce: Arity,
) -> OpcodeDescriptor {
    OpcodeDescriptor {
        opcode,
        name,
        body,
        consume,
        produce,
        result: None,
        expr: None,
        stmt: None,
    }
}

/// The byte-indexed opcode lookup table
///
/// Built once per process from the declarative instruction table and
/// immutable (and freely shared) afterwards.
pub struct OpcodeTable {
    slots: [Option<&'static OpcodeDescriptor>; 256],
}

impl OpcodeTable {
    fn build() -> Self {
        let mut slots: [Option<&'static OpcodeDescriptor>; 256] = [None; 256];
        for descriptor in table::DEFS {
            Self::register(&mut slots, descriptor);
        }
        Self { slots }
    }

    /// Insert one descriptor, failing fast on configuration defects
    fn register(
        slots: &mut [Option<&'static OpcodeDescriptor>; 256],
        descriptor: &'static OpcodeDescriptor,
    ) {
        let byte = descriptor.byte_value();
        if slots[byte as usize].is_some() {
            panic!(
                "duplicate instruction table entry for opcode byte 0x{byte:02X} (`{}`)",
                descriptor.name
            );
        }
        if descriptor.expr.is_some() && descriptor.stmt.is_some() {
            panic!(
                "opcode `{}` declares both expression and statement rules",
                descriptor.name
            );
        }
        for arity in [descriptor.consume, descriptor.produce] {
            if let Arity::Counted { field, .. } = arity {
                let counted = descriptor
                    .field_index(field)
                    .map(|i| descriptor.body[i].kind == crate::schema::FieldKind::U30);
                if counted != Some(true) {
                    panic!(
                        "opcode `{}` arity rule names `{field}`, which is not a U30 body field",
                        descriptor.name
                    );
                }
            }
        }
        slots[byte as usize] = Some(descriptor);
    }

    /// Look up the descriptor for a raw opcode byte
    #[inline]
    pub fn lookup(&self, byte: u8) -> Option<&'static OpcodeDescriptor> {
        self.slots[byte as usize]
    }

    /// Iterate over every registered descriptor, in byte order
    pub fn iter(&self) -> impl Iterator<Item = &'static OpcodeDescriptor> + '_ {
        self.slots.iter().filter_map(|slot| *slot)
    }
}

static TABLE: OnceLock<OpcodeTable> = OnceLock::new();

/// The process-wide opcode lookup table
pub fn opcode_table() -> &'static OpcodeTable {
    TABLE.get_or_init(OpcodeTable::build)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_roundtrip() {
        for descriptor in opcode_table().iter() {
            let byte = descriptor.byte_value();
            let found = opcode_table().lookup(byte).unwrap();
            assert_eq!(found.opcode, descriptor.opcode);
            assert_eq!(Opcode::from_byte(byte), Some(descriptor.opcode));
        }
    }

    #[test]
    fn test_unassigned_bytes_have_no_descriptor() {
        for byte in [0x00, 0x0A, 0x22, 0x4D, 0xFF] {
            assert!(opcode_table().lookup(byte).is_none());
            assert_eq!(Opcode::from_byte(byte), None);
        }
    }

    #[test]
    fn test_expr_and_stmt_are_exclusive() {
        for descriptor in opcode_table().iter() {
            assert!(
                !(descriptor.expr.is_some() && descriptor.stmt.is_some()),
                "opcode `{}` declares both rules",
                descriptor.name
            );
        }
    }

    #[test]
    fn test_counted_arities_name_real_fields() {
        for descriptor in opcode_table().iter() {
            for arity in [descriptor.consume, descriptor.produce] {
                if let Arity::Counted { field, .. } = arity {
                    assert!(
                        descriptor.field_index(field).is_some(),
                        "opcode `{}` names missing field `{field}`",
                        descriptor.name
                    );
                }
            }
        }
    }

    #[test]
    fn test_opcode_name() {
        assert_eq!(Opcode::AddI.name(), "add_i");
        assert_eq!(Opcode::GetLex.name(), "getlex");
        assert_eq!(Opcode::LookupSwitch.name(), "lookupswitch");
    }

    #[test]
    fn test_scenario_descriptors() {
        let add_i = Opcode::AddI.descriptor();
        assert_eq!(add_i.byte_value(), 0xC5);
        assert_eq!(add_i.consume, Arity::Fixed(2));
        assert_eq!(add_i.produce, Arity::Fixed(1));
        assert_eq!(add_i.result, Some(ResultType::Int));
        assert!(add_i.body.is_empty());

        let dec_local_i = Opcode::DecLocalI.descriptor();
        assert_eq!(dec_local_i.byte_value(), 0xC3);
        assert_eq!(dec_local_i.body.len(), 1);
        assert_eq!(dec_local_i.body[0].name, "reg_index");
        assert_eq!(dec_local_i.consume, Arity::Fixed(0));
        assert_eq!(dec_local_i.produce, Arity::Fixed(0));

        let get_lex = Opcode::GetLex.descriptor();
        assert_eq!(get_lex.byte_value(), 0x60);
        assert!(get_lex.builds_astlet());
        assert!(!get_lex.builds_statement());
    }
}
