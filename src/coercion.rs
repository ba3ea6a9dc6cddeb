//! Every permissive fallback of the language lives here: truthiness rules,
//! operators on mismatched types, division by zero and bad indexing. None of
//! these ever fail; each degrades to a fixed value.

use crate::ast::{BinaryOp, UnaryOp};
use crate::value::Value;

/// Condition test for `if`. Arrays and Nil are never truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0,
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Nil => false,
    }
}

/// Operand coercion for `&&` and `||`. Strings count as false here.
pub fn as_logical(value: &Value) -> bool {
    match value {
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0,
        _ => false,
    }
}

/// `while` only re-enters on a literal `true`.
pub fn loop_continues(value: &Value) -> bool {
    matches!(value, Value::Boolean(true))
}

pub fn unary(op: UnaryOp, value: Value) -> Value {
    match op {
        UnaryOp::Not => match value {
            Value::Boolean(b) => Value::Boolean(!b),
            _ => Value::Boolean(false),
        },
        UnaryOp::Negate => match value {
            Value::Number(n) => Value::Number(-n),
            other => other,
        },
    }
}

pub fn binary(op: BinaryOp, left: Value, right: Value) -> Value {
    match op {
        BinaryOp::Or => Value::Boolean(as_logical(&left) || as_logical(&right)),
        BinaryOp::And => Value::Boolean(as_logical(&left) && as_logical(&right)),
        BinaryOp::Equal
        | BinaryOp::NotEqual
        | BinaryOp::Less
        | BinaryOp::Greater
        | BinaryOp::LessEqual
        | BinaryOp::GreaterEqual => Value::Boolean(compare(op, &left, &right)),
        BinaryOp::Add => match (left, right) {
            (Value::Number(l), Value::Number(r)) => Value::Number(l + r),
            (Value::String(mut l), Value::String(r)) => {
                l.push_str(&r);
                Value::String(l)
            }
            (left, _) => left,
        },
        BinaryOp::Subtract => arithmetic(left, right, |l, r| Some(l - r)),
        BinaryOp::Multiply => arithmetic(left, right, |l, r| Some(l * r)),
        BinaryOp::Divide => {
            arithmetic(left, right, |l, r| if r == 0.0 { None } else { Some(l / r) })
        }
        BinaryOp::Remainder => {
            arithmetic(left, right, |l, r| if r == 0.0 { None } else { Some(l % r) })
        }
    }
}

// Anything but Number (op) Number, or a refused operation, keeps the left operand.
fn arithmetic(left: Value, right: Value, op: impl Fn(f64, f64) -> Option<f64>) -> Value {
    if let (Value::Number(l), Value::Number(r)) = (&left, &right) {
        if let Some(result) = op(*l, *r) {
            return Value::Number(result);
        }
    }
    left
}

/// Comparisons only hold between operands of the same variant. Numbers
/// order; Bools and Strings only test (in)equality; everything else is false.
pub fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(l), Value::Number(r)) => match op {
            BinaryOp::Equal => l == r,
            BinaryOp::NotEqual => l != r,
            BinaryOp::Less => l < r,
            BinaryOp::Greater => l > r,
            BinaryOp::LessEqual => l <= r,
            BinaryOp::GreaterEqual => l >= r,
            _ => false,
        },
        (Value::Boolean(l), Value::Boolean(r)) => equality(op, l == r),
        (Value::String(l), Value::String(r)) => equality(op, l == r),
        _ => false,
    }
}

fn equality(op: BinaryOp, same: bool) -> bool {
    match op {
        BinaryOp::Equal => same,
        BinaryOp::NotEqual => !same,
        _ => false,
    }
}

/// `base[index]`: only an in-range Number index into an Array selects an
/// element; the base comes back unchanged otherwise.
pub fn index(base: Value, index: &Value) -> Value {
    match (base, index) {
        (Value::Array(mut items), Value::Number(n)) => {
            let i = n.trunc();
            if i >= 0.0 && (i as usize) < items.len() {
                items.swap_remove(i as usize)
            } else {
                Value::Array(items)
            }
        }
        (base, _) => base,
    }
}
