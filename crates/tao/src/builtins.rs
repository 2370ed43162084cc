//! Global object and built-in functions
//!
//! The global object carries `print`, `println`, `setTimeout`,
//! `newPromise`, and `newChannel` as receiver-bound builtins. It is bound
//! under the name `global` in the top scope and doubles as the
//! last-resort name lookup. `Promise` and `Channel` are also registered
//! as classes so `new Promise(...)` works.

use std::sync::Arc;

use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::object::Object;
use crate::runtime::{promise, Timer};
use crate::scope::ScopeRef;
use crate::value::{Value, Values};

/// Install the global object and class registry into the root scope.
pub fn install_global(scope: &ScopeRef) -> Result<Arc<Object>> {
    let global = Object::new_global();
    let this = Value::Object(global.clone());

    global.set_prop("print", Value::bound_builtin(this.clone(), "print", global_print));
    global.set_prop("println", Value::bound_builtin(this.clone(), "println", global_println));
    global.set_prop(
        "setTimeout",
        Value::bound_builtin(this.clone(), "setTimeout", global_set_timeout),
    );
    global.set_prop(
        "newPromise",
        Value::bound_builtin(this.clone(), "newPromise", global_new_promise),
    );
    global.set_prop(
        "newChannel",
        Value::bound_builtin(this.clone(), "newChannel", global_new_channel),
    );

    scope.add_symbol("global", this)?;
    scope.add_symbol("Promise", Value::class("Promise", class_promise))?;
    scope.add_symbol("Channel", Value::class("Channel", class_channel))?;
    scope.set_global(global.clone());

    Ok(global)
}

/// `print(...)`: bare forms, concatenated without separators, one atomic
/// write per call.
fn global_print(ctx: &EvalContext, _this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let mut out = String::new();
    for arg in args.iter() {
        out.push_str(&arg.print_form());
    }
    ctx.write_out(&out);
    Ok(Value::Nil)
}

/// `println(...)`: `print` followed by a newline.
fn global_println(ctx: &EvalContext, _this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let mut out = String::new();
    for arg in args.iter() {
        out.push_str(&arg.print_form());
    }
    out.push('\n');
    ctx.write_out(&out);
    Ok(Value::Nil)
}

/// `setTimeout(cb, ms)`: a timer object with a `stop()` method.
fn global_set_timeout(ctx: &EvalContext, _this: Option<&Value>, args: &mut Values) -> Result<Value> {
    if args.is_empty() {
        return Err(Error::Type("setTimeout: callback expected".to_string()));
    }
    if args.len() < 2 {
        return Err(Error::Type("setTimeout: timeout expected".to_string()));
    }
    let callback = args.shift();
    if !callback.is_callable() {
        return Err(Error::Type(
            "setTimeout: callback must be a function".to_string(),
        ));
    }
    let timeout = args.shift();
    if !timeout.is_number() {
        return Err(Error::Type("setTimeout: timeout must be a number".to_string()));
    }
    let timer = Timer::spawn(ctx, callback, timeout.as_number()?);
    Ok(Value::Object(Object::new_timer(timer)))
}

/// `newPromise(executor)`: executor runs synchronously with bound
/// `(resolve, reject)`.
fn global_new_promise(ctx: &EvalContext, _this: Option<&Value>, args: &mut Values) -> Result<Value> {
    promise::construct(ctx, args.shift())
}

/// `newChannel(bufSize)`: a buffered channel.
fn global_new_channel(_ctx: &EvalContext, _this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let size = args.shift();
    let capacity = match size {
        Value::Number(n) if n > 0 => n as usize,
        _ => {
            return Err(Error::Type(
                "Channel: buffer size must be a number greater than zero".to_string(),
            ))
        }
    };
    Ok(Value::Object(Object::new_channel(capacity)))
}

fn class_promise(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    global_new_promise(ctx, this, args)
}

fn class_channel(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    global_new_channel(ctx, this, args)
}
