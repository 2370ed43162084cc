//! Buffered channels
//!
//! A channel is a bounded FIFO of values. `write` blocks while the buffer
//! is full, `read` blocks while it is empty, and `close` forbids further
//! writes and wakes every blocked reader. Reading a closed empty channel
//! yields Nil and never blocks.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::value::{BuiltinFn, Value, Values};

struct ChannelState {
    queue: VecDeque<Value>,
    closed: bool,
}

/// A buffered FIFO of values with a fixed capacity.
pub struct Channel {
    capacity: usize,
    state: Mutex<ChannelState>,
    readable: Condvar,
    writable: Condvar,
}

impl Channel {
    /// Create a channel with the given capacity (at least 1).
    pub(crate) fn new(capacity: usize) -> Self {
        Channel {
            capacity: capacity.max(1),
            state: Mutex::new(ChannelState {
                queue: VecDeque::new(),
                closed: false,
            }),
            readable: Condvar::new(),
            writable: Condvar::new(),
        }
    }

    /// Dequeue a value, blocking until one is available. A closed empty
    /// channel yields Nil.
    pub fn read(&self) -> Value {
        let mut state = self.state.lock();
        loop {
            if let Some(value) = state.queue.pop_front() {
                self.writable.notify_one();
                return value;
            }
            if state.closed {
                return Value::Nil;
            }
            self.readable.wait(&mut state);
        }
    }

    /// Enqueue a value, blocking while the buffer is full. Writing to a
    /// closed channel is a `Type` error.
    pub fn write(&self, value: Value) -> Result<()> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return Err(Error::Type("write to closed channel".to_string()));
            }
            if state.queue.len() < self.capacity {
                state.queue.push_back(value);
                self.readable.notify_one();
                return Ok(());
            }
            self.writable.wait(&mut state);
        }
    }

    /// Forbid further writes and wake all blocked readers and writers.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        self.readable.notify_all();
        self.writable.notify_all();
    }
}

/// Look up a channel method by name.
pub(crate) fn method(name: &str) -> Option<(&'static str, BuiltinFn)> {
    Some(match name {
        "read" => ("read", channel_read),
        "write" => ("write", channel_write),
        "close" => ("close", channel_close),
        _ => return None,
    })
}

fn receiver(this: Option<&Value>) -> Result<&Channel> {
    match this {
        Some(Value::Object(obj)) => obj
            .as_channel()
            .ok_or_else(|| Error::Internal("channel method without channel receiver".to_string())),
        _ => Err(Error::Internal("channel method without channel receiver".to_string())),
    }
}

fn channel_read(_ctx: &EvalContext, this: Option<&Value>, _args: &mut Values) -> Result<Value> {
    Ok(receiver(this)?.read())
}

fn channel_write(_ctx: &EvalContext, this: Option<&Value>, args: &mut Values) -> Result<Value> {
    let channel = receiver(this)?;
    for value in args.drain() {
        channel.write(value)?;
    }
    Ok(Value::Nil)
}

fn channel_close(_ctx: &EvalContext, this: Option<&Value>, _args: &mut Values) -> Result<Value> {
    receiver(this)?.close();
    Ok(Value::Nil)
}
