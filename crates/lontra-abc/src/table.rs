//! The declarative instruction-set table
//!
//! One entry per opcode: body schema, stack arities, declared result
//! type, and the astlet construction rule. [`crate::opcode::opcode_table`]
//! indexes these by byte value at first use and fails fast on
//! configuration defects (duplicate bytes, arity rules naming missing
//! fields, an opcode declaring both an expression and a statement rule).

use crate::ast::{AstRule, BinaryOp, BranchKind, Literal, StatementRule, UnaryOp};
use crate::opcode::{Opcode, OpcodeDescriptor, ResultType, argc, argc_pairs, fixed, op};
use crate::pool::PoolKind;
use crate::schema::{FieldSpec, NO_BODY, byte, case_offsets, pool, s24, s30, u30};

// Shared body schemas
const TARGET: &[FieldSpec] = &[s24("target")];
const SWITCH: &[FieldSpec] = &[
    s24("default"),
    u30("case_count"),
    case_offsets("case_offsets"),
];
const REG: &[FieldSpec] = &[u30("reg_index")];
const PROPERTY: &[FieldSpec] = &[pool("property", PoolKind::Multiname)];
const PROPERTY_ARGS: &[FieldSpec] = &[pool("property", PoolKind::Multiname), u30("arg_count")];
const TYPE_NAME: &[FieldSpec] = &[pool("type_name", PoolKind::Multiname)];
const ARGS: &[FieldSpec] = &[u30("arg_count")];
const METHOD: &[FieldSpec] = &[u30("method_index")];
const METHOD_ARGS: &[FieldSpec] = &[u30("method_index"), u30("arg_count")];
const SLOT: &[FieldSpec] = &[u30("slot_index")];
const CLASS: &[FieldSpec] = &[u30("class_index")];
const EXCEPTION: &[FieldSpec] = &[u30("exception_index")];
const SCOPE: &[FieldSpec] = &[byte("scope_index")];
const BYTE_VALUE: &[FieldSpec] = &[byte("value")];
const SHORT_VALUE: &[FieldSpec] = &[s30("value")];
const STRING_VALUE: &[FieldSpec] = &[pool("value", PoolKind::String)];
const INT_VALUE: &[FieldSpec] = &[pool("value", PoolKind::Int)];
const UINT_VALUE: &[FieldSpec] = &[pool("value", PoolKind::Uint)];
const DOUBLE_VALUE: &[FieldSpec] = &[pool("value", PoolKind::Double)];
const NS_VALUE: &[FieldSpec] = &[pool("value", PoolKind::Namespace)];
const DXNS_NAME: &[FieldSpec] = &[pool("name", PoolKind::String)];
const CURSOR_REGS: &[FieldSpec] = &[u30("object_reg"), u30("index_reg")];
const DEBUG_INFO: &[FieldSpec] = &[
    byte("debug_type"),
    pool("reg_name", PoolKind::String),
    byte("reg_index"),
    u30("extra"),
];
const LINE: &[FieldSpec] = &[u30("line_number")];
const FILE: &[FieldSpec] = &[pool("file_name", PoolKind::String)];

pub(crate) static DEFS: &[OpcodeDescriptor] = &[
    // ==================== Miscellaneous ====================
    op(Opcode::Bkpt, "bkpt", NO_BODY, fixed(0), fixed(0)),
    op(Opcode::Nop, "nop", NO_BODY, fixed(0), fixed(0)),
    op(Opcode::Throw, "throw", NO_BODY, fixed(1), fixed(0)).stmt(StatementRule::Throw),
    op(Opcode::Kill, "kill", REG, fixed(0), fixed(0)),
    op(Opcode::Label, "label", NO_BODY, fixed(0), fixed(0)),
    op(Opcode::Dxns, "dxns", DXNS_NAME, fixed(0), fixed(0)).stmt(StatementRule::Dxns),
    op(Opcode::DxnsLate, "dxnslate", NO_BODY, fixed(1), fixed(0)).stmt(StatementRule::DxnsLate),

    // ==================== Control transfer ====================
    op(Opcode::IfNlt, "ifnlt", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfNlt)),
    op(Opcode::IfNle, "ifnle", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfNle)),
    op(Opcode::IfNgt, "ifngt", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfNgt)),
    op(Opcode::IfNge, "ifnge", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfNge)),
    op(Opcode::Jump, "jump", TARGET, fixed(0), fixed(0)).stmt(StatementRule::Jump),
    op(Opcode::IfTrue, "iftrue", TARGET, fixed(1), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfTrue)),
    op(Opcode::IfFalse, "iffalse", TARGET, fixed(1), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfFalse)),
    op(Opcode::IfEq, "ifeq", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfEq)),
    op(Opcode::IfNe, "ifne", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfNe)),
    op(Opcode::IfLt, "iflt", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfLt)),
    op(Opcode::IfLe, "ifle", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfLe)),
    op(Opcode::IfGt, "ifgt", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfGt)),
    op(Opcode::IfGe, "ifge", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfGe)),
    op(Opcode::IfStrictEq, "ifstricteq", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfStrictEq)),
    op(Opcode::IfStrictNe, "ifstrictne", TARGET, fixed(2), fixed(0))
        .stmt(StatementRule::Branch(BranchKind::IfStrictNe)),
    op(Opcode::LookupSwitch, "lookupswitch", SWITCH, fixed(1), fixed(0))
        .stmt(StatementRule::Switch),

    // ==================== Scope stack ====================
    op(Opcode::PushWith, "pushwith", NO_BODY, fixed(1), fixed(0)),
    op(Opcode::PopScope, "popscope", NO_BODY, fixed(0), fixed(0)),
    op(Opcode::PushScope, "pushscope", NO_BODY, fixed(1), fixed(0)),

    // ==================== Iteration ====================
    op(Opcode::NextName, "nextname", NO_BODY, fixed(2), fixed(1)).expr(AstRule::NextName),
    op(Opcode::HasNext, "hasnext", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::HasNext),
    op(Opcode::NextValue, "nextvalue", NO_BODY, fixed(2), fixed(1)).expr(AstRule::NextValue),
    op(Opcode::HasNext2, "hasnext2", CURSOR_REGS, fixed(0), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::HasNext2),

    // ==================== Stack pushes ====================
    op(Opcode::PushNull, "pushnull", NO_BODY, fixed(0), fixed(1))
        .expr(AstRule::Literal(Literal::Null)),
    op(Opcode::PushUndefined, "pushundefined", NO_BODY, fixed(0), fixed(1))
        .expr(AstRule::Literal(Literal::Undefined)),
    op(Opcode::PushByte, "pushbyte", BYTE_VALUE, fixed(0), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::IntFromByte),
    op(Opcode::PushShort, "pushshort", SHORT_VALUE, fixed(0), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::IntFromShort),
    op(Opcode::PushTrue, "pushtrue", NO_BODY, fixed(0), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Literal(Literal::True)),
    op(Opcode::PushFalse, "pushfalse", NO_BODY, fixed(0), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Literal(Literal::False)),
    op(Opcode::PushNan, "pushnan", NO_BODY, fixed(0), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Literal(Literal::Nan)),
    op(Opcode::Pop, "pop", NO_BODY, fixed(1), fixed(0)),
    op(Opcode::Dup, "dup", NO_BODY, fixed(1), fixed(2)),
    op(Opcode::Swap, "swap", NO_BODY, fixed(2), fixed(2)),
    op(Opcode::PushString, "pushstring", STRING_VALUE, fixed(0), fixed(1))
        .result(ResultType::String)
        .expr(AstRule::Pooled),
    op(Opcode::PushInt, "pushint", INT_VALUE, fixed(0), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Pooled),
    op(Opcode::PushUint, "pushuint", UINT_VALUE, fixed(0), fixed(1))
        .result(ResultType::Uint)
        .expr(AstRule::Pooled),
    op(Opcode::PushDouble, "pushdouble", DOUBLE_VALUE, fixed(0), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Pooled),
    op(Opcode::PushNamespace, "pushnamespace", NS_VALUE, fixed(0), fixed(1))
        .result(ResultType::Namespace)
        .expr(AstRule::Pooled),

    // ==================== Raw memory ====================
    op(Opcode::Li8, "li8", NO_BODY, fixed(1), fixed(1)).result(ResultType::Int),
    op(Opcode::Li16, "li16", NO_BODY, fixed(1), fixed(1)).result(ResultType::Int),
    op(Opcode::Li32, "li32", NO_BODY, fixed(1), fixed(1)).result(ResultType::Int),
    op(Opcode::Lf32, "lf32", NO_BODY, fixed(1), fixed(1)).result(ResultType::Number),
    op(Opcode::Lf64, "lf64", NO_BODY, fixed(1), fixed(1)).result(ResultType::Number),
    op(Opcode::Si8, "si8", NO_BODY, fixed(2), fixed(0)),
    op(Opcode::Si16, "si16", NO_BODY, fixed(2), fixed(0)),
    op(Opcode::Si32, "si32", NO_BODY, fixed(2), fixed(0)),
    op(Opcode::Sf32, "sf32", NO_BODY, fixed(2), fixed(0)),
    op(Opcode::Sf64, "sf64", NO_BODY, fixed(2), fixed(0)),
    op(Opcode::Sxi1, "sxi1", NO_BODY, fixed(1), fixed(1)).result(ResultType::Int),
    op(Opcode::Sxi8, "sxi8", NO_BODY, fixed(1), fixed(1)).result(ResultType::Int),
    op(Opcode::Sxi16, "sxi16", NO_BODY, fixed(1), fixed(1)).result(ResultType::Int),

    // ==================== Function invocation ====================
    op(Opcode::NewFunction, "newfunction", METHOD, fixed(0), fixed(1))
        .expr(AstRule::NewFunction),
    op(Opcode::Call, "call", ARGS, argc("arg_count", 2), fixed(1)).expr(AstRule::CallClosure),
    op(Opcode::Construct, "construct", ARGS, argc("arg_count", 1), fixed(1))
        .expr(AstRule::Construct),
    op(Opcode::CallMethod, "callmethod", METHOD_ARGS, argc("arg_count", 1), fixed(1))
        .expr(AstRule::CallMethod),
    op(Opcode::CallStatic, "callstatic", METHOD_ARGS, argc("arg_count", 1), fixed(1))
        .expr(AstRule::CallStatic),
    op(Opcode::CallSuper, "callsuper", PROPERTY_ARGS, argc("arg_count", 1), fixed(1))
        .expr(AstRule::CallSuper),
    op(Opcode::CallProperty, "callproperty", PROPERTY_ARGS, argc("arg_count", 1), fixed(1))
        .expr(AstRule::CallProperty { lex: false }),
    op(Opcode::ReturnVoid, "returnvoid", NO_BODY, fixed(0), fixed(0))
        .stmt(StatementRule::ReturnVoid),
    op(Opcode::ReturnValue, "returnvalue", NO_BODY, fixed(1), fixed(0))
        .stmt(StatementRule::Return),
    op(Opcode::ConstructSuper, "constructsuper", ARGS, argc("arg_count", 1), fixed(0))
        .stmt(StatementRule::ConstructSuper),
    op(Opcode::ConstructProp, "constructprop", PROPERTY_ARGS, argc("arg_count", 1), fixed(1))
        .expr(AstRule::ConstructProperty),
    op(Opcode::CallPropLex, "callproplex", PROPERTY_ARGS, argc("arg_count", 1), fixed(1))
        .expr(AstRule::CallProperty { lex: true }),
    op(Opcode::CallSuperVoid, "callsupervoid", PROPERTY_ARGS, argc("arg_count", 1), fixed(0))
        .stmt(StatementRule::CallSuperVoid),
    op(Opcode::CallPropVoid, "callpropvoid", PROPERTY_ARGS, argc("arg_count", 1), fixed(0))
        .stmt(StatementRule::CallPropertyVoid),

    // ==================== Object construction ====================
    op(Opcode::ApplyType, "applytype", ARGS, argc("arg_count", 1), fixed(1))
        .expr(AstRule::ApplyType),
    op(Opcode::NewObject, "newobject", ARGS, argc_pairs("arg_count"), fixed(1))
        .expr(AstRule::NewObject),
    op(Opcode::NewArray, "newarray", ARGS, argc("arg_count", 0), fixed(1))
        .expr(AstRule::NewArray),
    op(Opcode::NewActivation, "newactivation", NO_BODY, fixed(0), fixed(1))
        .expr(AstRule::NewActivation),
    op(Opcode::NewClass, "newclass", CLASS, fixed(1), fixed(1)).expr(AstRule::NewClass),
    op(Opcode::GetDescendants, "getdescendants", PROPERTY, fixed(1), fixed(1))
        .expr(AstRule::Descendants),
    op(Opcode::NewCatch, "newcatch", EXCEPTION, fixed(0), fixed(1)).expr(AstRule::NewCatch),

    // ==================== Property access ====================
    op(Opcode::GetSuper, "getsuper", PROPERTY, fixed(1), fixed(1)).expr(AstRule::SuperProperty),
    op(Opcode::SetSuper, "setsuper", PROPERTY, fixed(2), fixed(0)).stmt(StatementRule::SetSuper),
    op(Opcode::FindPropStrict, "findpropstrict", PROPERTY, fixed(0), fixed(1))
        .expr(AstRule::FindProperty { strict: true }),
    op(Opcode::FindProperty, "findproperty", PROPERTY, fixed(0), fixed(1))
        .expr(AstRule::FindProperty { strict: false }),
    op(Opcode::FindDef, "finddef", PROPERTY, fixed(0), fixed(1)).expr(AstRule::FindDef),
    op(Opcode::GetLex, "getlex", PROPERTY, fixed(0), fixed(1)).expr(AstRule::Lex),
    op(Opcode::SetProperty, "setproperty", PROPERTY, fixed(2), fixed(0))
        .stmt(StatementRule::SetProperty),
    op(Opcode::GetLocal, "getlocal", REG, fixed(0), fixed(1)).expr(AstRule::GetLocal),
    op(Opcode::SetLocal, "setlocal", REG, fixed(1), fixed(0)).stmt(StatementRule::SetLocal),
    op(Opcode::GetGlobalScope, "getglobalscope", NO_BODY, fixed(0), fixed(1))
        .expr(AstRule::GlobalScope),
    op(Opcode::GetScopeObject, "getscopeobject", SCOPE, fixed(0), fixed(1))
        .expr(AstRule::ScopeObject),
    op(Opcode::GetProperty, "getproperty", PROPERTY, fixed(1), fixed(1)).expr(AstRule::Property),
    op(Opcode::InitProperty, "initproperty", PROPERTY, fixed(2), fixed(0))
        .stmt(StatementRule::InitProperty),
    op(Opcode::DeleteProperty, "deleteproperty", PROPERTY, fixed(1), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::DeleteProperty),
    op(Opcode::GetSlot, "getslot", SLOT, fixed(1), fixed(1)).expr(AstRule::Slot),
    op(Opcode::SetSlot, "setslot", SLOT, fixed(2), fixed(0)).stmt(StatementRule::SetSlot),
    op(Opcode::GetGlobalSlot, "getglobalslot", SLOT, fixed(0), fixed(1))
        .expr(AstRule::GlobalSlot),
    op(Opcode::SetGlobalSlot, "setglobalslot", SLOT, fixed(1), fixed(0))
        .stmt(StatementRule::SetGlobalSlot),

    // ==================== Type conversion ====================
    op(Opcode::ConvertS, "convert_s", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::String)
        .expr(AstRule::Convert(ResultType::String)),
    op(Opcode::EscXElem, "esc_xelem", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::String)
        .expr(AstRule::Unary(UnaryOp::EscXElem)),
    op(Opcode::EscXAttr, "esc_xattr", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::String)
        .expr(AstRule::Unary(UnaryOp::EscXAttr)),
    op(Opcode::ConvertI, "convert_i", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Convert(ResultType::Int)),
    op(Opcode::ConvertU, "convert_u", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Uint)
        .expr(AstRule::Convert(ResultType::Uint)),
    op(Opcode::ConvertD, "convert_d", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Convert(ResultType::Number)),
    op(Opcode::ConvertB, "convert_b", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Convert(ResultType::Boolean)),
    op(Opcode::ConvertO, "convert_o", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Object)
        .expr(AstRule::Convert(ResultType::Object)),
    op(Opcode::CheckFilter, "checkfilter", NO_BODY, fixed(1), fixed(1))
        .expr(AstRule::Unary(UnaryOp::CheckFilter)),
    op(Opcode::Coerce, "coerce", TYPE_NAME, fixed(1), fixed(1)).expr(AstRule::Coerce),
    op(Opcode::CoerceA, "coerce_a", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Any)
        .expr(AstRule::Convert(ResultType::Any)),
    op(Opcode::CoerceS, "coerce_s", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::String)
        .expr(AstRule::Convert(ResultType::String)),
    op(Opcode::AsType, "astype", TYPE_NAME, fixed(1), fixed(1)).expr(AstRule::AsType),
    op(Opcode::AsTypeLate, "astypelate", NO_BODY, fixed(2), fixed(1))
        .expr(AstRule::Binary(BinaryOp::AsTypeLate)),
    op(Opcode::CoerceO, "coerce_o", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Object)
        .expr(AstRule::Convert(ResultType::Object)),

    // ==================== Arithmetic ====================
    op(Opcode::Negate, "negate", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Unary(UnaryOp::Negate)),
    op(Opcode::Increment, "increment", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Unary(UnaryOp::Increment)),
    op(Opcode::IncLocal, "inclocal", REG, fixed(0), fixed(0))
        .result(ResultType::Number)
        .stmt(StatementRule::IncrementLocal),
    op(Opcode::Decrement, "decrement", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Unary(UnaryOp::Decrement)),
    op(Opcode::DecLocal, "declocal", REG, fixed(0), fixed(0))
        .result(ResultType::Number)
        .stmt(StatementRule::DecrementLocal),
    op(Opcode::TypeOf, "typeof", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::String)
        .expr(AstRule::Unary(UnaryOp::TypeOf)),
    op(Opcode::Not, "not", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Unary(UnaryOp::Not)),
    op(Opcode::BitNot, "bitnot", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Unary(UnaryOp::BitNot)),
    op(Opcode::Add, "add", NO_BODY, fixed(2), fixed(1)).expr(AstRule::Binary(BinaryOp::Add)),
    op(Opcode::Subtract, "subtract", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Binary(BinaryOp::Subtract)),
    op(Opcode::Multiply, "multiply", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Binary(BinaryOp::Multiply)),
    op(Opcode::Divide, "divide", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Binary(BinaryOp::Divide)),
    op(Opcode::Modulo, "modulo", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Number)
        .expr(AstRule::Binary(BinaryOp::Modulo)),
    op(Opcode::Lshift, "lshift", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Binary(BinaryOp::Lshift)),
    op(Opcode::Rshift, "rshift", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Binary(BinaryOp::Rshift)),
    op(Opcode::Urshift, "urshift", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Uint)
        .expr(AstRule::Binary(BinaryOp::Urshift)),
    op(Opcode::BitAnd, "bitand", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Binary(BinaryOp::BitAnd)),
    op(Opcode::BitOr, "bitor", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Binary(BinaryOp::BitOr)),
    op(Opcode::BitXor, "bitxor", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Binary(BinaryOp::BitXor)),

    // ==================== Comparison ====================
    op(Opcode::Equals, "equals", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::Equals)),
    op(Opcode::StrictEquals, "strictequals", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::StrictEquals)),
    op(Opcode::LessThan, "lessthan", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::LessThan)),
    op(Opcode::LessEquals, "lessequals", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::LessEquals)),
    op(Opcode::GreaterThan, "greaterthan", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::GreaterThan)),
    op(Opcode::GreaterEquals, "greaterequals", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::GreaterEquals)),
    op(Opcode::InstanceOf, "instanceof", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::InstanceOf)),
    op(Opcode::IsType, "istype", TYPE_NAME, fixed(1), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::IsType),
    op(Opcode::IsTypeLate, "istypelate", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::IsTypeLate)),
    op(Opcode::In, "in", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Boolean)
        .expr(AstRule::Binary(BinaryOp::In)),

    // ==================== Integer-specialized arithmetic ====================
    op(Opcode::IncrementI, "increment_i", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Unary(UnaryOp::IncrementI)),
    op(Opcode::DecrementI, "decrement_i", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Unary(UnaryOp::DecrementI)),
    op(Opcode::IncLocalI, "inclocal_i", REG, fixed(0), fixed(0))
        .result(ResultType::Int)
        .stmt(StatementRule::IncrementLocal),
    op(Opcode::DecLocalI, "declocal_i", REG, fixed(0), fixed(0))
        .result(ResultType::Int)
        .stmt(StatementRule::DecrementLocal),
    op(Opcode::NegateI, "negate_i", NO_BODY, fixed(1), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Unary(UnaryOp::NegateI)),
    op(Opcode::AddI, "add_i", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Binary(BinaryOp::AddI)),
    op(Opcode::SubtractI, "subtract_i", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Binary(BinaryOp::SubtractI)),
    op(Opcode::MultiplyI, "multiply_i", NO_BODY, fixed(2), fixed(1))
        .result(ResultType::Int)
        .expr(AstRule::Binary(BinaryOp::MultiplyI)),

    // ==================== Fused local access ====================
    op(Opcode::GetLocal0, "getlocal0", NO_BODY, fixed(0), fixed(1))
        .expr(AstRule::GetLocalFixed(0)),
    op(Opcode::GetLocal1, "getlocal1", NO_BODY, fixed(0), fixed(1))
        .expr(AstRule::GetLocalFixed(1)),
    op(Opcode::GetLocal2, "getlocal2", NO_BODY, fixed(0), fixed(1))
        .expr(AstRule::GetLocalFixed(2)),
    op(Opcode::GetLocal3, "getlocal3", NO_BODY, fixed(0), fixed(1))
        .expr(AstRule::GetLocalFixed(3)),
    op(Opcode::SetLocal0, "setlocal0", NO_BODY, fixed(1), fixed(0))
        .stmt(StatementRule::SetLocalFixed(0)),
    op(Opcode::SetLocal1, "setlocal1", NO_BODY, fixed(1), fixed(0))
        .stmt(StatementRule::SetLocalFixed(1)),
    op(Opcode::SetLocal2, "setlocal2", NO_BODY, fixed(1), fixed(0))
        .stmt(StatementRule::SetLocalFixed(2)),
    op(Opcode::SetLocal3, "setlocal3", NO_BODY, fixed(1), fixed(0))
        .stmt(StatementRule::SetLocalFixed(3)),

    // ==================== Debugging ====================
    op(Opcode::Debug, "debug", DEBUG_INFO, fixed(0), fixed(0)),
    op(Opcode::DebugLine, "debugline", LINE, fixed(0), fixed(0)),
    op(Opcode::DebugFile, "debugfile", FILE, fixed(0), fixed(0)),
    op(Opcode::BkptLine, "bkptline", LINE, fixed(0), fixed(0)),
    op(Opcode::Timestamp, "timestamp", NO_BODY, fixed(0), fixed(0)),
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::opcode_table;

    #[test]
    fn test_every_entry_is_registered() {
        // building the table validates byte uniqueness and rule sanity
        assert_eq!(opcode_table().iter().count(), DEFS.len());
    }

    #[test]
    fn test_fused_locals_cover_the_register_range() {
        for (opcode, reg) in [
            (Opcode::GetLocal0, 0u8),
            (Opcode::GetLocal1, 1),
            (Opcode::GetLocal2, 2),
            (Opcode::GetLocal3, 3),
        ] {
            assert_eq!(opcode.descriptor().expr, Some(AstRule::GetLocalFixed(reg)));
        }
    }

    #[test]
    fn test_branch_opcodes_take_one_target() {
        for descriptor in opcode_table().iter() {
            if let Some(StatementRule::Branch(_)) = descriptor.stmt {
                assert_eq!(descriptor.body.len(), 1);
                assert_eq!(descriptor.body[0].name, "target");
            }
        }
    }

    #[test]
    fn test_call_family_names_arg_count() {
        for opcode in [
            Opcode::Call,
            Opcode::Construct,
            Opcode::CallProperty,
            Opcode::CallPropVoid,
            Opcode::NewObject,
            Opcode::NewArray,
            Opcode::ApplyType,
        ] {
            let descriptor = opcode.descriptor();
            assert!(
                descriptor.field_index("arg_count").is_some(),
                "`{}` is missing its count field",
                descriptor.name
            );
        }
    }

    #[test]
    fn test_value_producers_under_test_declare_types() {
        for (opcode, result) in [
            (Opcode::PushByte, ResultType::Int),
            (Opcode::PushUint, ResultType::Uint),
            (Opcode::ConvertS, ResultType::String),
            (Opcode::Urshift, ResultType::Uint),
            (Opcode::TypeOf, ResultType::String),
            (Opcode::DeleteProperty, ResultType::Boolean),
        ] {
            assert_eq!(opcode.descriptor().result, Some(result));
        }
    }
}
