//! Array method implementations
//!
//! The JavaScript-flavored method set. Functional methods snapshot the
//! elements up front so guest callbacks can mutate the receiver without
//! deadlocking on the object lock, and bind `this` to the receiver array.
//! Callbacks receive `(element, index, array)`; `reduce` threads the
//! accumulator in front.

use std::sync::Arc;

use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::eval::call_value;
use crate::value::{BuiltinFn, Value, Values};

use super::Object;

/// Look up a reserved array method by name.
pub(crate) fn method(name: &str) -> Option<(&'static str, BuiltinFn)> {
    Some(match name {
        "each" => ("each", array_each),
        "map" => ("map", array_map),
        "filter" => ("filter", array_filter),
        "where" => ("where", array_where),
        "select" => ("select", array_select),
        "find" => ("find", array_find),
        "reduce" => ("reduce", array_reduce),
        "groupBy" => ("groupBy", array_group_by),
        "join" => ("join", array_join),
        "push" => ("push", array_push),
        "pop" => ("pop", array_pop),
        "splice" => ("splice", array_splice),
        "unshift" => ("unshift", array_unshift),
        _ => return None,
    })
}

fn receiver(this: Option<&Value>) -> Result<Arc<Object>> {
    match this {
        Some(Value::Object(obj)) if obj.is_array() => Ok(obj.clone()),
        _ => Err(Error::Internal("array method without array receiver".to_string())),
    }
}

/// Invoke `cb(elem, index, array)` for each element, stopping when the
/// callback driver returns false.
fn each_elem(
    ctx: &EvalContext,
    arr: &Arc<Object>,
    cb: &Value,
    mut f: impl FnMut(Value, Value) -> Result<bool>,
) -> Result<()> {
    let arr_val = Value::Object(arr.clone());
    for (i, elem) in arr.elems_snapshot().into_iter().enumerate() {
        let out = call_value(
            ctx,
            cb,
            vec![elem.clone(), Value::Number(i as i64), arr_val.clone()],
        )?;
        if !f(elem, out)? {
            break;
        }
    }
    Ok(())
}

fn array_each(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let cb = args.at(0);
    each_elem(ctx, &arr, &cb, |_, _| Ok(true))?;
    Ok(Value::Nil)
}

fn array_map(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let cb = args.at(0);
    let mut out = Vec::with_capacity(arr.len());
    each_elem(ctx, &arr, &cb, |_, mapped| {
        out.push(mapped);
        Ok(true)
    })?;
    Ok(Value::Object(Object::new_array(out)))
}

fn array_filter(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let cb = args.at(0);
    let mut out = Vec::new();
    each_elem(ctx, &arr, &cb, |elem, keep| {
        if keep.truth() {
            out.push(elem);
        }
        Ok(true)
    })?;
    Ok(Value::Object(Object::new_array(out)))
}

// `where` filters rows by predicate; currently an alias for `filter`.
fn array_where(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    array_filter(ctx, this, args)
}

// `select` projects each row; same driver as `map`.
fn array_select(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    array_map(ctx, this, args)
}

fn array_find(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let cb = args.at(0);
    let mut found = Value::Nil;
    each_elem(ctx, &arr, &cb, |elem, hit| {
        if hit.truth() {
            found = elem;
            Ok(false)
        } else {
            Ok(true)
        }
    })?;
    Ok(found)
}

fn array_reduce(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    if args.len() < 2 {
        return Err(Error::Type("usage: reduce(lambda, init)".to_string()));
    }
    let arr = receiver(this)?;
    let cb = args.at(0);
    let mut memo = args.at(1);
    let arr_val = Value::Object(arr.clone());
    for (i, elem) in arr.elems_snapshot().into_iter().enumerate() {
        memo = call_value(
            ctx,
            &cb,
            vec![memo, elem, Value::Number(i as i64), arr_val.clone()],
        )?;
    }
    Ok(memo)
}

fn array_group_by(ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let cb = args.at(0);
    // Groups keep first-seen key order; each group array carries the key
    // under its `group` property.
    let mut groups: Vec<(Value, Arc<Object>)> = Vec::new();
    each_elem(ctx, &arr, &cb, |elem, key| {
        match groups.iter().find(|(k, _)| k.equals(&key)) {
            Some((_, group)) => group.push_elem(elem),
            None => {
                let group = Object::new_array(vec![elem]);
                group.set_prop("group", key.clone());
                groups.push((key, group));
            }
        }
        Ok(true)
    })?;
    let out = groups.into_iter().map(|(_, g)| Value::Object(g)).collect();
    Ok(Value::Object(Object::new_array(out)))
}

fn array_join(_ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let sep = if args.is_empty() {
        String::new()
    } else {
        args.at(0).print_form()
    };
    let parts: Vec<String> = arr
        .elems_snapshot()
        .iter()
        .map(|v| v.print_form())
        .collect();
    Ok(Value::string(parts.join(&sep)))
}

fn array_push(_ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    for value in args.drain() {
        arr.push_elem(value);
    }
    Ok(Value::Number(arr.len() as i64))
}

fn array_pop(_ctx: &EvalContext, this: Option<&Value>, _args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let popped = arr.write().elems.pop().unwrap_or(Value::Nil);
    Ok(popped)
}

fn array_unshift(_ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let mut data = arr.write();
    for (i, value) in args.drain().into_iter().enumerate() {
        data.elems.insert(i, value);
    }
    Ok(Value::Number(data.elems.len() as i64))
}

/// `splice(start [, deleteCount, ...items])`: remove `deleteCount`
/// elements at `start` (negative `start` offsets from the end, both
/// clamped), insert `items` there, and return the removed elements.
fn array_splice(_ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let arr = receiver(this)?;
    let mut data = arr.write();
    let len = data.elems.len() as i64;

    if args.is_empty() || !args.at(0).is_number() {
        return Err(Error::Type("splice: start must be number".to_string()));
    }
    let mut start = args.shift().as_number()?;
    if start > len {
        start = len;
    } else if start < 0 {
        start = if -start > len { 0 } else { start + len };
    }

    let delete_count = if args.is_empty() {
        len - start
    } else {
        if !args.at(0).is_number() {
            return Err(Error::Type("splice: deleteCount must be number".to_string()));
        }
        args.shift().as_number()?.clamp(0, len - start)
    };

    let start = start as usize;
    let removed: Vec<Value> = data
        .elems
        .splice(start..start + delete_count as usize, args.drain())
        .collect();
    Ok(Value::Object(Object::new_array(removed)))
}
