//! Display and Debug implementations for Value

use std::fmt;

use super::Value;

impl Value {
    /// The bare form used by `print`: strings render without quotes,
    /// everything else renders as its display form.
    pub fn print_form(&self) -> String {
        match self {
            Value::String(s) => s.as_str().to_string(),
            other => other.to_string(),
        }
    }

    fn receiver_kind(this: &Value) -> &'static str {
        match this {
            Value::Object(obj) => obj.kind_name(),
            Value::String(_) => "String",
            other => other.type_name(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            // Composite display quotes strings; `print` strips the quotes
            // via `print_form`.
            Value::String(s) => write!(f, "\"{}\"", s),
            Value::Variable(name) => write!(f, "{}", name),
            Value::Object(obj) => write!(f, "{}", obj.render()),
            Value::Function(closure) => {
                let name = closure.func.name.as_deref().unwrap_or("<anonymous>");
                write!(f, "function({})", name)
            }
            Value::Builtin(builtin) => match &builtin.this {
                Some(this) => write!(f, "builtin({}.{})", Value::receiver_kind(this), builtin.name),
                None => write!(f, "builtin({})", builtin.name),
            },
            Value::Class(class) => write!(f, "class({})", class.name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self)
    }
}
