// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Binary and unary operators.

use std::cmp::Ordering;

use babylon_runtime::Value;

use crate::ast::{BinOp, UnaryOp};

use super::{Interpreter, RuntimeError};

impl Interpreter {
    pub(super) fn eval_binop(&self, op: BinOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
        match op {
            BinOp::Eq => Ok(Value::Bool(lhs == rhs)),
            BinOp::Ne => Ok(Value::Bool(lhs != rhs)),
            BinOp::Lt | BinOp::Gt | BinOp::Le | BinOp::Ge => {
                let ord = compare(&lhs, &rhs).ok_or_else(|| mismatch(op, &lhs, &rhs))?;
                Ok(Value::Bool(match op {
                    BinOp::Lt => ord == Ordering::Less,
                    BinOp::Gt => ord == Ordering::Greater,
                    BinOp::Le => ord != Ordering::Greater,
                    _ => ord != Ordering::Less,
                }))
            }
            BinOp::Add => match (lhs, rhs) {
                (Value::Str(a), b) => Ok(Value::Str(a + &b.to_string())),
                (a, Value::Str(b)) => Ok(Value::Str(a.to_string() + &b)),
                (Value::List(mut a), Value::List(b)) => {
                    a.extend(b);
                    Ok(Value::List(a))
                }
                (lhs, rhs) => arith(op, lhs, rhs),
            },
            BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod => arith(op, lhs, rhs),
            // Short-circuited by the evaluator before reaching here.
            BinOp::And => Ok(Value::Bool(lhs.is_truthy() && rhs.is_truthy())),
            BinOp::Or => Ok(Value::Bool(lhs.is_truthy() || rhs.is_truthy())),
        }
    }

    pub(super) fn eval_unary(&self, op: UnaryOp, value: Value) -> Result<Value, RuntimeError> {
        match (op, value) {
            (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
            (UnaryOp::Neg, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| RuntimeError::TypeError("integer overflow".into())),
            (UnaryOp::Neg, Value::Float(x)) => Ok(Value::Float(-x)),
            (UnaryOp::Neg, other) => Err(RuntimeError::TypeError(format!(
                "cannot negate {}",
                other.type_name()
            ))),
        }
    }
}

fn mismatch(op: BinOp, lhs: &Value, rhs: &Value) -> RuntimeError {
    RuntimeError::TypeError(format!(
        "unsupported operands for `{}`: {} and {}",
        op.symbol(),
        lhs.type_name(),
        rhs.type_name()
    ))
}

fn compare(lhs: &Value, rhs: &Value) -> Option<Ordering> {
    match (lhs, rhs) {
        (Value::Int(a), Value::Int(b)) => Some(a.cmp(b)),
        (Value::Str(a), Value::Str(b)) => Some(a.cmp(b)),
        _ => {
            let (a, b) = (as_float(lhs)?, as_float(rhs)?);
            a.partial_cmp(&b)
        }
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(*n as f64),
        Value::Float(x) => Some(*x),
        _ => None,
    }
}

fn arith(op: BinOp, lhs: Value, rhs: Value) -> Result<Value, RuntimeError> {
    if let (Value::Int(a), Value::Int(b)) = (&lhs, &rhs) {
        let (a, b) = (*a, *b);
        if matches!(op, BinOp::Div | BinOp::Mod) && b == 0 {
            return Err(RuntimeError::DivisionByZero);
        }
        let result = match op {
            BinOp::Add => a.checked_add(b),
            BinOp::Sub => a.checked_sub(b),
            BinOp::Mul => a.checked_mul(b),
            BinOp::Div => a.checked_div(b),
            _ => a.checked_rem(b),
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| RuntimeError::TypeError("integer overflow".into()));
    }

    let (Some(a), Some(b)) = (as_float(&lhs), as_float(&rhs)) else {
        return Err(mismatch(op, &lhs, &rhs));
    };
    Ok(Value::Float(match op {
        BinOp::Add => a + b,
        BinOp::Sub => a - b,
        BinOp::Mul => a * b,
        BinOp::Div => a / b,
        _ => a % b,
    }))
}

#[cfg(test)]
mod tests {
    use super::super::tests::run_source;
    use super::*;

    fn eval(src: &str) -> Result<Option<Value>, RuntimeError> {
        run_source(src).0.map_err(|diag| diag.error)
    }

    #[test]
    fn integer_arithmetic() {
        assert_eq!(eval("7 / 2").unwrap(), Some(Value::Int(3)));
        assert_eq!(eval("7 % 3").unwrap(), Some(Value::Int(1)));
        assert_eq!(eval("1 / 0").unwrap_err(), RuntimeError::DivisionByZero);
    }

    #[test]
    fn mixed_numbers_widen_to_float() {
        assert_eq!(eval("1 + 0.5").unwrap(), Some(Value::Float(1.5)));
        assert_eq!(eval("2 == 2.0").unwrap(), Some(Value::Bool(true)));
        assert_eq!(eval("1 < 1.5").unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn string_concatenation() {
        assert_eq!(eval("\"n=\" + 3").unwrap(), Some(Value::Str("n=3".into())));
        assert_eq!(eval("\"a\" < \"b\"").unwrap(), Some(Value::Bool(true)));
    }

    #[test]
    fn operand_mismatch() {
        assert_eq!(
            eval("null - 1").unwrap_err(),
            RuntimeError::TypeError("unsupported operands for `-`: null and int".into())
        );
        assert_eq!(
            eval("-\"x\"").unwrap_err(),
            RuntimeError::TypeError("cannot negate string".into())
        );
    }
}
