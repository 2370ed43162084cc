//! String method view
//!
//! Strings are primitive values, but member access promotes them to a
//! method view: `s.len()`, `s.lower()`, `s.upper()`. Character indexing
//! (`s[i]`) is handled by the evaluator's index path.

use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::value::{BuiltinFn, Value, Values};

/// Look up a string method by name.
pub(crate) fn method(name: &str) -> Option<(&'static str, BuiltinFn)> {
    Some(match name {
        "len" => ("len", string_len),
        "lower" => ("lower", string_lower),
        "upper" => ("upper", string_upper),
        _ => return None,
    })
}

fn receiver(this: Option<&Value>) -> Result<&str> {
    match this {
        Some(Value::String(s)) => Ok(s.as_str()),
        _ => Err(Error::Internal("string method without string receiver".to_string())),
    }
}

// Length counts characters, not bytes.
fn string_len(_ctx: &EvalContext, this: Option<&Value>, _args: &mut Values) -> Result<Value> {
    Ok(Value::Number(receiver(this)?.chars().count() as i64))
}

fn string_lower(_ctx: &EvalContext, this: Option<&Value>, _args: &mut Values) -> Result<Value> {
    Ok(Value::string(receiver(this)?.to_lowercase()))
}

fn string_upper(_ctx: &EvalContext, this: Option<&Value>, _args: &mut Values) -> Result<Value> {
    Ok(Value::string(receiver(this)?.to_uppercase()))
}

/// Character access for `s[i]`: a one-character string, or `Range` when
/// out of bounds.
pub(crate) fn char_at(s: &str, pos: i64) -> Result<Value> {
    if pos >= 0 {
        if let Some(ch) = s.chars().nth(pos as usize) {
            return Ok(Value::string(ch.to_string()));
        }
    }
    Err(Error::Range("character index out of range".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_at() {
        assert_eq!(char_at("abc", 0).unwrap(), Value::string("a"));
        assert_eq!(char_at("abc", 2).unwrap(), Value::string("c"));
        assert!(char_at("abc", 3).is_err());
        assert!(char_at("abc", -1).is_err());
    }
}
