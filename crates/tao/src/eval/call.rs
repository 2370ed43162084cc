//! Call machinery
//!
//! Resolution of a callee to a function or builtin, formal binding,
//! the closure-scope splice, and the `call_value` entry point that array
//! methods, promises, and timers use to invoke guest callables.

use tracing::trace;

use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::scope::Scope;
use crate::value::{Builtin, Closure, Value, Values};

use super::execute_block;

/// Call an already-evaluated callable with evaluated arguments.
pub fn call_value(ctx: &EvalContext, callable: &Value, args: Vec<Value>) -> Result<Value> {
    match callable {
        Value::Function(closure) => call_function(ctx, closure, args),
        Value::Builtin(builtin) => call_builtin(ctx, builtin, args),
        other => Err(Error::not_callable(other)),
    }
}

/// Invoke a closure: fresh call scope, formals bound from actuals
/// (missing actuals bind Nil, excess actuals are discarded), defining
/// scope spliced as the parent, body executed, `retval` taken if set.
pub fn call_function(ctx: &EvalContext, closure: &Closure, args: Vec<Value>) -> Result<Value> {
    let _depth = ctx.enter_call()?;
    trace!(
        name = closure.func.name.as_deref().unwrap_or("<anonymous>"),
        "call"
    );

    let call_scope = Scope::new("--call--", None);
    let mut actuals = args.into_iter();
    for param in &closure.func.params {
        let value = actuals.next().unwrap_or(Value::Nil);
        call_scope.add_symbol(param, value)?;
    }
    call_scope.set_parent(closure.scope.clone());

    execute_block(&closure.func.body, &call_scope, ctx)?;

    if call_scope.has_return() {
        Ok(call_scope.return_value())
    } else {
        Ok(Value::Nil)
    }
}

fn call_builtin(ctx: &EvalContext, builtin: &Builtin, args: Vec<Value>) -> Result<Value> {
    let _depth = ctx.enter_call()?;
    trace!(name = builtin.name, "builtin call");
    let mut values = Values::new(args);
    (builtin.func)(ctx, builtin.this.as_deref(), &mut values)
}

/// Enqueue a guest call onto the event loop; a call error is reported to
/// the stderr sink and terminates only that task.
pub fn schedule_call(ctx: &EvalContext, callable: Value, args: Vec<Value>) {
    let task_ctx = ctx.fork();
    ctx.schedule(move || {
        if let Err(err) = call_value(&task_ctx, &callable, args) {
            task_ctx.report_error(&err);
        }
    });
}
