//! Expression evaluation

use crate::ast::Expr;
use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::object::{string, Object};
use crate::scope::ScopeRef;
use crate::token::TokenKind;
use crate::value::{apply_binary, apply_unary, Value, Values};

use super::{call_value, Evaluate};

impl Evaluate for Expr {
    fn evaluate(&self, scope: &ScopeRef, ctx: &EvalContext) -> Result<Value> {
        match self {
            Expr::Value(value) => value.evaluate(scope),

            Expr::Unary { op, operand } => {
                let value = operand.evaluate(scope, ctx)?;
                apply_unary(*op, &value)
            }

            Expr::IncDec { op, prefix, target } => eval_incdec(*op, *prefix, target, scope, ctx),

            Expr::Binary { left, op, right } => match op {
                // Logical operators short-circuit through truth. `&&`
                // yields a boolean; `||` yields the first truthy operand,
                // else the second operand unchanged.
                TokenKind::AndAnd => {
                    if !left.evaluate(scope, ctx)?.truth() {
                        Ok(Value::Boolean(false))
                    } else {
                        Ok(Value::Boolean(right.evaluate(scope, ctx)?.truth()))
                    }
                }
                TokenKind::OrOr => {
                    let lv = left.evaluate(scope, ctx)?;
                    if lv.truth() {
                        Ok(lv)
                    } else {
                        right.evaluate(scope, ctx)
                    }
                }
                _ => {
                    let lv = left.evaluate(scope, ctx)?;
                    let rv = right.evaluate(scope, ctx)?;
                    apply_binary(*op, &lv, &rv)
                }
            },

            Expr::Ternary {
                cond,
                then,
                otherwise,
            } => {
                if cond.evaluate(scope, ctx)?.truth() {
                    then.evaluate(scope, ctx)
                } else {
                    otherwise.evaluate(scope, ctx)
                }
            }

            Expr::Assign { target, value } => {
                let value = value.evaluate(scope, ctx)?;
                if matches!(&**target, Expr::Value(Value::Variable(_))) {
                    reject_bound_method(&value)?;
                }
                assign_to(target, value.clone(), scope, ctx)?;
                Ok(value)
            }

            Expr::Function(func) => {
                let value = Value::function(func.clone(), scope.clone());
                if let Some(name) = &func.name {
                    scope.add_symbol(name, value.clone())?;
                }
                Ok(value)
            }

            Expr::Index { target, key } => {
                let value = target.evaluate(scope, ctx)?;
                let key = key.evaluate(scope, ctx)?;
                eval_index(&value, &key)
            }

            Expr::Call { callee, args } => {
                let callable = callee.evaluate(scope, ctx)?;
                let actuals = eval_args(args, scope, ctx)?;
                call_value(ctx, &callable, actuals)
            }

            Expr::New { callee, args } => {
                let class = callee.evaluate(scope, ctx)?;
                match &class {
                    Value::Class(class) => {
                        let mut actuals = Values::new(eval_args(args, scope, ctx)?);
                        (class.ctor)(ctx, None, &mut actuals)
                    }
                    other => Err(Error::Type(format!(
                        "`new' needs a class, got {}",
                        other.type_name()
                    ))),
                }
            }

            Expr::ObjectLiteral(props) => {
                let obj = Object::new_plain();
                for (key, expr) in props {
                    let value = expr.evaluate(scope, ctx)?;
                    obj.set_prop(key, value);
                }
                Ok(Value::Object(obj))
            }

            Expr::ArrayLiteral(elems) => {
                let mut values = Vec::with_capacity(elems.len());
                for elem in elems {
                    values.push(elem.evaluate(scope, ctx)?);
                }
                Ok(Value::Object(Object::new_array(values)))
            }
        }
    }
}

fn eval_args(args: &[Expr], scope: &ScopeRef, ctx: &EvalContext) -> Result<Vec<Value>> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
        out.push(arg.evaluate(scope, ctx)?);
    }
    Ok(out)
}

/// A bound builtin method cannot escape into a binding.
pub(crate) fn reject_bound_method(value: &Value) -> Result<()> {
    if let Value::Builtin(builtin) = value {
        if builtin.this.is_some() {
            return Err(Error::Type("method is not allowed to be rvalue".to_string()));
        }
    }
    Ok(())
}

/// Member/element access dispatch over the value kind.
fn eval_index(value: &Value, key: &Value) -> Result<Value> {
    match value {
        // Strings promote to a method view, and index by character.
        Value::String(s) => match key {
            Value::Number(pos) => string::char_at(s, *pos),
            Value::String(name) => match string::method(name) {
                Some((method_name, func)) => {
                    Ok(Value::bound_builtin(value.clone(), method_name, func))
                }
                None => Ok(Value::Nil),
            },
            other => Err(Error::key_type(other)),
        },
        Value::Object(obj) => match key {
            Value::String(name) => Ok(Object::get_key(obj, name)),
            Value::Number(pos) => {
                if obj.is_array() {
                    obj.get_elem(*pos)
                } else {
                    Err(Error::key_type(key))
                }
            }
            other => Err(Error::key_type(other)),
        },
        other => Err(Error::not_indexable(other)),
    }
}

/// Assign `value` through an lvalue expression.
pub(crate) fn assign_to(
    target: &Expr,
    value: Value,
    scope: &ScopeRef,
    ctx: &EvalContext,
) -> Result<()> {
    match target {
        Expr::Value(Value::Variable(name)) => scope.set_symbol(name, value),
        Expr::Index {
            target: obj_expr,
            key,
        } => {
            let container = obj_expr.evaluate(scope, ctx)?;
            let key = key.evaluate(scope, ctx)?;
            match &container {
                Value::Object(obj) => match &key {
                    Value::String(name) => Object::set_key(obj, name, value),
                    Value::Number(pos) => {
                        if obj.is_array() {
                            obj.set_elem(*pos, value)
                        } else {
                            Err(Error::key_type(&key))
                        }
                    }
                    other => Err(Error::key_type(other)),
                },
                Value::String(_) => Err(Error::not_assignable(&container)),
                other => Err(Error::not_indexable(other)),
            }
        }
        other_expr => {
            // The parser rejects these; runtime-constructed ASTs land here.
            let value = other_expr.evaluate(scope, ctx)?;
            Err(Error::not_assignable(&value))
        }
    }
}

/// `++`/`--` mutate the target; prefix yields the new value, postfix the
/// old one.
fn eval_incdec(
    op: TokenKind,
    prefix: bool,
    target: &Expr,
    scope: &ScopeRef,
    ctx: &EvalContext,
) -> Result<Value> {
    let old = target.evaluate(scope, ctx)?;
    let n = old.as_number().map_err(|_| {
        Error::Type(format!(
            "`{}' needs a number, got {}",
            op.name().unwrap_or("?"),
            old.type_name()
        ))
    })?;
    let new = match op {
        TokenKind::Increment => Value::Number(n.wrapping_add(1)),
        TokenKind::Decrement => Value::Number(n.wrapping_sub(1)),
        _ => return Err(Error::Internal("bad increment operator".to_string())),
    };
    assign_to(target, new.clone(), scope, ctx)?;
    Ok(if prefix { new } else { old })
}
