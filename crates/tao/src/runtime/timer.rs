//! One-shot timers
//!
//! A timer parks a background thread until its deadline, then enqueues
//! the callback invocation onto the event loop. `stop` reports whether
//! cancellation won the race against firing, and wakes the waiting
//! thread immediately so a cancelled timer never delays loop shutdown.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};
use tracing::debug;

use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::eval::schedule_call;
use crate::value::{BuiltinFn, Value, Values};

#[derive(Clone, Copy, PartialEq)]
enum TimerState {
    Pending,
    Fired,
    Stopped,
}

struct TimerShared {
    state: Mutex<TimerState>,
    wake: Condvar,
}

/// A scheduled one-shot callback with a cancellation handle.
pub struct Timer {
    shared: Arc<TimerShared>,
}

impl Timer {
    /// Start a timer that invokes `callback` on the loop after `ms`
    /// milliseconds.
    pub(crate) fn spawn(ctx: &EvalContext, callback: Value, ms: i64) -> Timer {
        let shared = Arc::new(TimerShared {
            state: Mutex::new(TimerState::Pending),
            wake: Condvar::new(),
        });
        let thread_shared = shared.clone();
        // The guard keeps the loop draining until the wait resolves one
        // way or the other.
        let guard = ctx.task_guard();
        let task_ctx = ctx.fork();
        std::thread::spawn(move || {
            let _guard = guard;
            let deadline = Instant::now() + Duration::from_millis(ms.max(0) as u64);

            let mut state = thread_shared.state.lock();
            while *state == TimerState::Pending {
                let now = Instant::now();
                if now >= deadline {
                    break;
                }
                let _ = thread_shared.wake.wait_for(&mut state, deadline - now);
            }
            let fire = *state == TimerState::Pending;
            if fire {
                *state = TimerState::Fired;
            }
            drop(state);

            if fire {
                debug!("timer fired");
                schedule_call(&task_ctx, callback, Vec::new());
            }
        });
        Timer { shared }
    }

    /// Attempt to cancel; true when cancellation preceded firing.
    pub fn stop(&self) -> bool {
        let mut state = self.shared.state.lock();
        if *state == TimerState::Pending {
            *state = TimerState::Stopped;
            self.shared.wake.notify_all();
            true
        } else {
            false
        }
    }
}

/// Look up a timer method by name.
pub(crate) fn method(name: &str) -> Option<(&'static str, BuiltinFn)> {
    match name {
        "stop" => Some(("stop", timer_stop)),
        _ => None,
    }
}

fn timer_stop(_ctx: &EvalContext, this: Option<&Value>, _args: &mut Values) -> Result<Value> {
    match this {
        Some(Value::Object(obj)) => match obj.as_timer() {
            Some(timer) => Ok(Value::Boolean(timer.stop())),
            None => Err(Error::Internal("timer method without timer receiver".to_string())),
        },
        _ => Err(Error::Internal("timer method without timer receiver".to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_timer(state: TimerState) -> Timer {
        Timer {
            shared: Arc::new(TimerShared {
                state: Mutex::new(state),
                wake: Condvar::new(),
            }),
        }
    }

    #[test]
    fn test_stop_before_fire_wins_once() {
        let timer = bare_timer(TimerState::Pending);
        assert!(timer.stop());
        assert!(!timer.stop());
    }

    #[test]
    fn test_stop_after_fire_loses() {
        let timer = bare_timer(TimerState::Fired);
        assert!(!timer.stop());
    }
}
