//! Promises
//!
//! A promise settles at most once and runs its callbacks on the event
//! loop, never synchronously inside `resolve`/`reject`. `then` returns a
//! downstream promise; when a callback itself returns a promise, the
//! downstream chain follows that promise's settlement instead of the
//! callback's return value (promise forwarding, via the `to_promise`
//! link).

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::eval::call_value;
use crate::object::Object;
use crate::value::{BuiltinFn, Value, Values};

#[derive(Default)]
struct PromiseState {
    resolved_fn: Value,
    rejected_fn: Value,
    resolved_value: Option<Value>,
    rejected_value: Option<Value>,
    /// The downstream promise produced by `then`
    then_promise: Option<Arc<Object>>,
    /// When set, this promise's settlement is forwarded to that promise
    to_promise: Option<Arc<Object>>,
}

/// Promise state machine. Lives inside a promise-kind [`Object`].
pub struct Promise {
    state: Mutex<PromiseState>,
}

impl Promise {
    pub(crate) fn new() -> Self {
        Promise {
            state: Mutex::new(PromiseState::default()),
        }
    }

    /// Has this promise settled (resolved or rejected)?
    pub fn is_settled(&self) -> bool {
        let state = self.state.lock();
        state.resolved_value.is_some() || state.rejected_value.is_some()
    }
}

/// Look up a promise method by name.
pub(crate) fn method(name: &str) -> Option<(&'static str, BuiltinFn)> {
    match name {
        "then" => Some(("then", promise_then)),
        _ => None,
    }
}

fn receiver(this: Option<&Value>) -> Result<Arc<Object>> {
    match this {
        Some(Value::Object(obj)) if obj.as_promise().is_some() => Ok(obj.clone()),
        _ => Err(Error::Internal("promise method without promise receiver".to_string())),
    }
}

/// Construct a promise and invoke `executor` synchronously with bound
/// `(resolve, reject)` callbacks.
pub(crate) fn construct(ctx: &EvalContext, executor: Value) -> Result<Value> {
    let obj = Object::new_promise();
    let resolve = Value::bound_builtin(Value::Object(obj.clone()), "resolve", promise_resolve_fn);
    let reject = Value::bound_builtin(Value::Object(obj.clone()), "reject", promise_reject_fn);
    call_value(ctx, &executor, vec![resolve, reject])?;
    Ok(Value::Object(obj))
}

fn promise_then(_ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let obj = receiver(this)?;
    Ok(then(&obj, args.shift(), args.shift()))
}

fn promise_resolve_fn(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let obj = receiver(this)?;
    resolve(ctx, &obj, args.shift());
    Ok(Value::Nil)
}

fn promise_reject_fn(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let obj = receiver(this)?;
    reject(ctx, &obj, args.shift());
    Ok(Value::Nil)
}

/// Install callbacks and return the downstream promise.
pub(crate) fn then(obj: &Arc<Object>, on_resolve: Value, on_reject: Value) -> Value {
    let next = Object::new_promise();
    if let Some(promise) = obj.as_promise() {
        let mut state = promise.state.lock();
        state.resolved_fn = on_resolve;
        state.rejected_fn = on_reject;
        state.then_promise = Some(next.clone());
    }
    Value::Object(next)
}

/// Resolve the promise and schedule its chain work on the loop.
pub(crate) fn resolve(ctx: &EvalContext, obj: &Arc<Object>, value: Value) {
    if let Some(promise) = obj.as_promise() {
        promise.state.lock().resolved_value = Some(value);
    }
    trace!("promise resolved");
    let (task_ctx, target) = (ctx.fork(), obj.clone());
    ctx.schedule(move || {
        if let Err(err) = invoke_resolver(&task_ctx, &target) {
            task_ctx.report_error(&err);
        }
    });
}

/// Reject the promise and schedule its chain work on the loop.
pub(crate) fn reject(ctx: &EvalContext, obj: &Arc<Object>, value: Value) {
    if let Some(promise) = obj.as_promise() {
        promise.state.lock().rejected_value = Some(value);
    }
    trace!("promise rejected");
    let (task_ctx, target) = (ctx.fork(), obj.clone());
    ctx.schedule(move || {
        if let Err(err) = invoke_rejecter(&task_ctx, &target) {
            task_ctx.report_error(&err);
        }
    });
}

fn invoke_resolver(ctx: &EvalContext, obj: &Arc<Object>) -> Result<()> {
    let promise = obj
        .as_promise()
        .ok_or_else(|| Error::Internal("resolver on non-promise".to_string()))?;
    // The callback is consumed on invocation: settlement can be driven
    // through this promise more than once (a forwarding link re-drives an
    // already-settled promise), but the chain must fire at most once.
    let (forward, resolved_fn, value, then_p) = {
        let mut state = promise.state.lock();
        (
            state.to_promise.clone(),
            std::mem::take(&mut state.resolved_fn),
            state.resolved_value.clone(),
            state.then_promise.clone(),
        )
    };

    // This promise is the tail of a forwarding link: pass the settlement
    // through and drive the target's chain instead.
    if let Some(target) = forward {
        if let Some(tp) = target.as_promise() {
            tp.state.lock().resolved_value = value;
        }
        return invoke_resolver(ctx, &target);
    }

    // No callback installed (or already consumed): the result is
    // absorbed silently.
    if resolved_fn.is_nil() {
        return Ok(());
    }

    let result = call_value(ctx, &resolved_fn, vec![value.unwrap_or(Value::Nil)])?;

    if let Value::Object(inner) = &result {
        if let Some(ip) = inner.as_promise() {
            // The callback returned a promise: link our downstream chain
            // to its settlement, and re-drive it if it already settled.
            let settled = {
                let mut state = ip.state.lock();
                state.to_promise = then_p;
                (state.resolved_value.is_some(), state.rejected_value.is_some())
            };
            let (task_ctx, target) = (ctx.fork(), inner.clone());
            match settled {
                (true, _) => ctx.schedule(move || {
                    if let Err(err) = invoke_resolver(&task_ctx, &target) {
                        task_ctx.report_error(&err);
                    }
                }),
                (_, true) => ctx.schedule(move || {
                    if let Err(err) = invoke_rejecter(&task_ctx, &target) {
                        task_ctx.report_error(&err);
                    }
                }),
                _ => {}
            }
            return Ok(());
        }
    }

    if let Some(tp) = then_p {
        resolve(ctx, &tp, result);
    }
    Ok(())
}

fn invoke_rejecter(ctx: &EvalContext, obj: &Arc<Object>) -> Result<()> {
    let promise = obj
        .as_promise()
        .ok_or_else(|| Error::Internal("rejecter on non-promise".to_string()))?;
    let (forward, rejected_fn, value, then_p) = {
        let mut state = promise.state.lock();
        (
            state.to_promise.clone(),
            std::mem::take(&mut state.rejected_fn),
            state.rejected_value.clone(),
            state.then_promise.clone(),
        )
    };

    if let Some(target) = forward {
        if let Some(tp) = target.as_promise() {
            tp.state.lock().rejected_value = value;
        }
        return invoke_rejecter(ctx, &target);
    }

    if rejected_fn.is_nil() {
        return Ok(());
    }

    let result = call_value(ctx, &rejected_fn, vec![value.unwrap_or(Value::Nil)])?;

    if let Value::Object(inner) = &result {
        if let Some(ip) = inner.as_promise() {
            let settled = {
                let mut state = ip.state.lock();
                state.to_promise = then_p;
                (state.resolved_value.is_some(), state.rejected_value.is_some())
            };
            let (task_ctx, target) = (ctx.fork(), inner.clone());
            match settled {
                (true, _) => ctx.schedule(move || {
                    if let Err(err) = invoke_resolver(&task_ctx, &target) {
                        task_ctx.report_error(&err);
                    }
                }),
                (_, true) => ctx.schedule(move || {
                    if let Err(err) = invoke_rejecter(&task_ctx, &target) {
                        task_ctx.report_error(&err);
                    }
                }),
                _ => {}
            }
            return Ok(());
        }
    }

    if let Some(tp) = then_p {
        reject(ctx, &tp, result);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_then_returns_downstream_promise() {
        let obj = Object::new_promise();
        let downstream = then(&obj, Value::Nil, Value::Nil);
        let inner = downstream.as_object().unwrap();
        assert!(inner.as_promise().is_some());
        assert!(!Arc::ptr_eq(inner, &obj));
    }

    #[test]
    fn test_settled_flag() {
        let obj = Object::new_promise();
        let promise = obj.as_promise().unwrap();
        assert!(!promise.is_settled());
        promise.state.lock().resolved_value = Some(Value::Number(1));
        assert!(promise.is_settled());
    }
}
