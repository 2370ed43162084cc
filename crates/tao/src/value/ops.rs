//! Operator application on values
//!
//! Binary and unary operators are defined on matching primitive pairs
//! only; everything else is a `Type` error naming both operand types.
//! Arithmetic wraps instead of panicking, and `**` is integer-only pow.

use crate::error::{Error, Result};
use crate::token::TokenKind;

use super::Value;

/// Apply a non-logical binary operator to two evaluated operands.
///
/// `&&` and `||` short-circuit and are handled by the evaluator before
/// operands reach this function.
pub fn apply_binary(op: TokenKind, left: &Value, right: &Value) -> Result<Value> {
    // Equality is defined for every matching tag pair (identity for
    // reference kinds); everything below handles the remaining operators.
    match op {
        TokenKind::Equal => {
            if same_tag(left, right) {
                return Ok(Value::Boolean(left.equals(right)));
            }
        }
        TokenKind::NotEqual => {
            if same_tag(left, right) {
                return Ok(Value::Boolean(!left.equals(right)));
            }
        }
        _ => {}
    }

    if let (Value::Number(l), Value::Number(r)) = (left, right) {
        return numeric_binary(op, *l, *r);
    }

    if let (Value::String(l), Value::String(r)) = (left, right) {
        if op == TokenKind::Addition {
            let mut s = String::with_capacity(l.len() + r.len());
            s.push_str(l);
            s.push_str(r);
            return Ok(Value::string(s));
        }
    }

    Err(binary_type_error(op, left, right))
}

fn same_tag(left: &Value, right: &Value) -> bool {
    std::mem::discriminant(left) == std::mem::discriminant(right)
}

fn numeric_binary(op: TokenKind, l: i64, r: i64) -> Result<Value> {
    let num = |n: i64| Ok(Value::Number(n));
    let boolean = |b: bool| Ok(Value::Boolean(b));
    match op {
        TokenKind::Addition => num(l.wrapping_add(r)),
        TokenKind::Subtraction => num(l.wrapping_sub(r)),
        TokenKind::Multiply => num(l.wrapping_mul(r)),
        TokenKind::Division => {
            if r == 0 {
                Err(Error::DivideByZero("divide by zero".to_string()))
            } else {
                num(l.wrapping_div(r))
            }
        }
        TokenKind::Percent => {
            if r == 0 {
                Err(Error::DivideByZero("modulo by zero".to_string()))
            } else {
                num(l.wrapping_rem(r))
            }
        }
        TokenKind::StarStar => num(pow(l, r)),
        TokenKind::LeftShift => num(l.wrapping_shl(r as u32)),
        TokenKind::RightShift => num(l.wrapping_shr(r as u32)),
        TokenKind::BitAnd => num(l & r),
        TokenKind::BitOr => num(l | r),
        TokenKind::BitXor => num(l ^ r),
        TokenKind::BitAndNot => num(l & !r),
        TokenKind::GreaterThan => boolean(l > r),
        TokenKind::GreaterThanOrEqual => boolean(l >= r),
        TokenKind::LessThan => boolean(l < r),
        TokenKind::LessThanOrEqual => boolean(l <= r),
        _ => Err(binary_type_error(op, &Value::Number(l), &Value::Number(r))),
    }
}

/// Integer pow: a negative exponent truncates to 0, overflow wraps.
fn pow(base: i64, exp: i64) -> i64 {
    if exp < 0 {
        return 0;
    }
    base.wrapping_pow(exp.min(u32::MAX as i64) as u32)
}

fn binary_type_error(op: TokenKind, left: &Value, right: &Value) -> Error {
    Error::Type(format!(
        "unsupported operand types for `{}': {} and {}",
        op.name().unwrap_or("?"),
        left.type_name(),
        right.type_name()
    ))
}

/// Apply a unary operator to an evaluated operand.
pub fn apply_unary(op: TokenKind, operand: &Value) -> Result<Value> {
    match op {
        TokenKind::Not => Ok(Value::Boolean(!operand.truth())),
        TokenKind::Subtraction => Ok(Value::Number(operand.as_number()?.wrapping_neg())),
        TokenKind::Addition => {
            operand.as_number()?;
            Ok(operand.clone())
        }
        TokenKind::BitXor => Ok(Value::Number(!operand.as_number()?)),
        _ => Err(Error::Internal(format!(
            "unknown unary operator `{}'",
            op.name().unwrap_or("?")
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(v: i64) -> Value {
        Value::Number(v)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(apply_binary(TokenKind::Addition, &n(2), &n(3)).unwrap(), n(5));
        assert_eq!(apply_binary(TokenKind::Subtraction, &n(2), &n(3)).unwrap(), n(-1));
        assert_eq!(apply_binary(TokenKind::Multiply, &n(4), &n(3)).unwrap(), n(12));
        assert_eq!(apply_binary(TokenKind::Division, &n(7), &n(2)).unwrap(), n(3));
        assert_eq!(apply_binary(TokenKind::Percent, &n(7), &n(2)).unwrap(), n(1));
        assert_eq!(apply_binary(TokenKind::StarStar, &n(2), &n(10)).unwrap(), n(1024));
    }

    #[test]
    fn test_divide_by_zero() {
        assert!(matches!(
            apply_binary(TokenKind::Division, &n(1), &n(0)),
            Err(Error::DivideByZero(_))
        ));
        assert!(matches!(
            apply_binary(TokenKind::Percent, &n(1), &n(0)),
            Err(Error::DivideByZero(_))
        ));
    }

    #[test]
    fn test_overflow_never_panics() {
        assert_eq!(
            apply_binary(TokenKind::Division, &n(i64::MIN), &n(-1)).unwrap(),
            n(i64::MIN)
        );
        apply_binary(TokenKind::Multiply, &n(i64::MAX), &n(2)).unwrap();
        apply_binary(TokenKind::StarStar, &n(10), &n(1_000_000)).unwrap();
        assert_eq!(apply_binary(TokenKind::StarStar, &n(2), &n(-1)).unwrap(), n(0));
    }

    #[test]
    fn test_bitwise() {
        assert_eq!(apply_binary(TokenKind::BitAnd, &n(0b1100), &n(0b1010)).unwrap(), n(0b1000));
        assert_eq!(apply_binary(TokenKind::BitOr, &n(0b1100), &n(0b1010)).unwrap(), n(0b1110));
        assert_eq!(apply_binary(TokenKind::BitXor, &n(0b1100), &n(0b1010)).unwrap(), n(0b0110));
        assert_eq!(apply_binary(TokenKind::BitAndNot, &n(0b1100), &n(0b1010)).unwrap(), n(0b0100));
        assert_eq!(apply_binary(TokenKind::LeftShift, &n(1), &n(4)).unwrap(), n(16));
        assert_eq!(apply_binary(TokenKind::RightShift, &n(16), &n(4)).unwrap(), n(1));
    }

    #[test]
    fn test_comparison() {
        assert_eq!(apply_binary(TokenKind::LessThan, &n(1), &n(2)).unwrap(), Value::Boolean(true));
        assert_eq!(apply_binary(TokenKind::GreaterThanOrEqual, &n(2), &n(2)).unwrap(), Value::Boolean(true));
    }

    #[test]
    fn test_string_concat_and_equality() {
        let a = Value::string("foo");
        let b = Value::string("bar");
        assert_eq!(
            apply_binary(TokenKind::Addition, &a, &b).unwrap(),
            Value::string("foobar")
        );
        assert_eq!(
            apply_binary(TokenKind::Equal, &a, &Value::string("foo")).unwrap(),
            Value::Boolean(true)
        );
        assert!(apply_binary(TokenKind::Subtraction, &a, &b).is_err());
    }

    #[test]
    fn test_nil_equality_only() {
        assert_eq!(
            apply_binary(TokenKind::Equal, &Value::Nil, &Value::Nil).unwrap(),
            Value::Boolean(true)
        );
        assert_eq!(
            apply_binary(TokenKind::NotEqual, &Value::Nil, &Value::Nil).unwrap(),
            Value::Boolean(false)
        );
        assert!(apply_binary(TokenKind::Addition, &Value::Nil, &Value::Nil).is_err());
    }

    #[test]
    fn test_mixed_types_rejected() {
        assert!(apply_binary(TokenKind::Equal, &n(1), &Value::string("1")).is_err());
        assert!(apply_binary(TokenKind::Addition, &n(1), &Value::string("1")).is_err());
    }

    #[test]
    fn test_unary() {
        assert_eq!(apply_unary(TokenKind::Subtraction, &n(3)).unwrap(), n(-3));
        assert_eq!(apply_unary(TokenKind::Addition, &n(3)).unwrap(), n(3));
        assert_eq!(apply_unary(TokenKind::Not, &Value::Nil).unwrap(), Value::Boolean(true));
        assert_eq!(apply_unary(TokenKind::Not, &n(1)).unwrap(), Value::Boolean(false));
        assert_eq!(apply_unary(TokenKind::BitXor, &n(0)).unwrap(), n(-1));
        assert!(apply_unary(TokenKind::Subtraction, &Value::string("x")).is_err());
    }
}
