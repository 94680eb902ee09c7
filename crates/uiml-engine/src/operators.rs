//! Unary and binary operators over runtime values.

use crate::error::{range_error, type_error, Flow};
use crate::intrinsics::{has_property, to_property_key};
use crate::value::Value;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use uiml_script::coerce::{compare_strings, power, to_int32, to_uint32};
use uiml_script::{BinaryOp, UnaryOp};

pub(crate) fn unary(op: UnaryOp, operand: &Value) -> Flow<Value> {
    let value = match (op, operand) {
        (UnaryOp::Plus, Value::BigInt(_)) => return Err(type_error("cannot convert a BigInt value to a number")),
        (UnaryOp::Plus, v) => Value::Number(v.to_number()),
        (UnaryOp::Minus, Value::BigInt(b)) => Value::BigInt(-b),
        (UnaryOp::Minus, v) => Value::Number(-v.to_number()),
        (UnaryOp::Not, v) => Value::Bool(!v.truthy()),
        (UnaryOp::BitwiseNot, Value::BigInt(b)) => Value::BigInt(!b),
        (UnaryOp::BitwiseNot, v) => Value::Number(f64::from(!to_int32(v.to_number()))),
        (UnaryOp::Typeof, v) => Value::from(v.type_of()),
        (UnaryOp::Delete, _) => Value::Bool(true),
    };
    Ok(value)
}

/// Evaluates a binary operator whose operands are both already evaluated.
pub(crate) fn binary(op: BinaryOp, left: &Value, right: &Value) -> Flow<Value> {
    match op {
        BinaryOp::Add => {
            let (left, right) = (to_primitive(left), to_primitive(right));
            if matches!(left, Value::String(_)) || matches!(right, Value::String(_)) {
                return Ok(Value::from(format!("{left}{right}")));
            }
            arithmetic(op, &left, &right)
        }
        BinaryOp::Subtract
        | BinaryOp::Multiply
        | BinaryOp::Divide
        | BinaryOp::Remainder
        | BinaryOp::Exponent
        | BinaryOp::ShiftLeft
        | BinaryOp::SignedShiftRight
        | BinaryOp::ShiftRight
        | BinaryOp::BitwiseAnd
        | BinaryOp::BitwiseXor
        | BinaryOp::BitwiseOr => arithmetic(op, &to_primitive(left), &to_primitive(right)),
        BinaryOp::LessThan | BinaryOp::LessThanOrEqual | BinaryOp::GreaterThan | BinaryOp::GreaterThanOrEqual => {
            Ok(Value::Bool(compare(op, left, right)))
        }
        BinaryOp::Equal => Ok(Value::Bool(left.loose_equals(right))),
        BinaryOp::NotEqual => Ok(Value::Bool(!left.loose_equals(right))),
        BinaryOp::StrictEqual => Ok(Value::Bool(left.strict_equals(right))),
        BinaryOp::StrictNotEqual => Ok(Value::Bool(!left.strict_equals(right))),
        BinaryOp::In => has_property(right, &to_property_key(left)).map(Value::Bool),
        BinaryOp::LogicalAnd => Ok(if left.truthy() { right.clone() } else { left.clone() }),
        BinaryOp::LogicalOr => Ok(if left.truthy() { left.clone() } else { right.clone() }),
        BinaryOp::NullCoalesce => Ok(if left.is_nullish() { right.clone() } else { left.clone() }),
    }
}

fn to_primitive(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) | Value::Function(_) | Value::Native(_) | Value::ReadOnly(_) => {
            Value::from(value.to_string())
        }
        other => other.clone(),
    }
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> Flow<Value> {
    match (left, right) {
        (Value::BigInt(a), Value::BigInt(b)) => bigint_arithmetic(op, a, b).map(Value::BigInt),
        (Value::BigInt(_), _) | (_, Value::BigInt(_)) => {
            Err(type_error("cannot mix BigInt and other types, use explicit conversions"))
        }
        _ => Ok(Value::Number(number_arithmetic(op, left.to_number(), right.to_number()))),
    }
}

fn number_arithmetic(op: BinaryOp, a: f64, b: f64) -> f64 {
    let shift = to_uint32(b) & 31;
    match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide => a / b,
        BinaryOp::Remainder => a % b,
        BinaryOp::Exponent => power(a, b),
        BinaryOp::ShiftLeft => f64::from(to_int32(a).wrapping_shl(shift)),
        BinaryOp::SignedShiftRight => f64::from(to_int32(a) >> shift),
        BinaryOp::ShiftRight => f64::from(to_uint32(a) >> shift),
        BinaryOp::BitwiseAnd => f64::from(to_int32(a) & to_int32(b)),
        BinaryOp::BitwiseXor => f64::from(to_int32(a) ^ to_int32(b)),
        BinaryOp::BitwiseOr => f64::from(to_int32(a) | to_int32(b)),
        _ => f64::NAN,
    }
}

fn bigint_arithmetic(op: BinaryOp, a: &BigInt, b: &BigInt) -> Flow<BigInt> {
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Subtract => a - b,
        BinaryOp::Multiply => a * b,
        BinaryOp::Divide | BinaryOp::Remainder if b.is_zero() => return Err(range_error("division by zero")),
        BinaryOp::Divide => a / b,
        BinaryOp::Remainder => a % b,
        BinaryOp::Exponent => {
            if b.is_negative() {
                return Err(range_error("exponent must be non-negative"));
            }
            let exponent = b.to_u32().ok_or_else(|| range_error("maximum BigInt size exceeded"))?;
            a.pow(exponent)
        }
        BinaryOp::ShiftLeft | BinaryOp::SignedShiftRight => {
            let amount = b.abs().to_usize().ok_or_else(|| range_error("maximum BigInt size exceeded"))?;
            let left = (op == BinaryOp::ShiftLeft) != b.is_negative();
            if left {
                a << amount
            } else {
                a >> amount
            }
        }
        BinaryOp::ShiftRight => return Err(type_error("BigInts have no unsigned right shift, use >> instead")),
        BinaryOp::BitwiseAnd => a & b,
        BinaryOp::BitwiseXor => a ^ b,
        BinaryOp::BitwiseOr => a | b,
        _ => return Err(type_error(format!("unsupported BigInt operator '{}'", op.as_str()))),
    };
    Ok(result)
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    let (left, right) = (to_primitive(left), to_primitive(right));
    let ordering = match (&left, &right) {
        (Value::String(a), Value::String(b)) => Some(compare_strings(a, b)),
        (Value::BigInt(a), Value::BigInt(b)) => Some(a.cmp(b)),
        (Value::BigInt(a), other) => a.to_f64().and_then(|a| a.partial_cmp(&other.to_number())),
        (other, Value::BigInt(b)) => b.to_f64().and_then(|b| other.to_number().partial_cmp(&b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    };
    match op {
        BinaryOp::LessThan => ordering == Some(Ordering::Less),
        BinaryOp::LessThanOrEqual => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
        BinaryOp::GreaterThan => ordering == Some(Ordering::Greater),
        _ => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
    }
}
