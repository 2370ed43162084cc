//! Evaluation context
//!
//! `EvalContext` is threaded through every walker call. It carries the
//! shared runtime pieces (event-loop handle, output sinks, interrupt
//! flag) plus a per-task call-depth counter for stack-overflow
//! protection. Background tasks get their own context via [`EvalContext::fork`],
//! so concurrent walks never share a depth counter.

use std::cell::Cell;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Error, Result};
use crate::runtime::{LoopHandle, TaskGuard};

/// Default maximum guest call depth.
const MAX_CALL_DEPTH: usize = 500;

struct Shared {
    loop_handle: LoopHandle,
    stdout: Mutex<Box<dyn Write + Send>>,
    stderr: Mutex<Box<dyn Write + Send>>,
    interrupt: AtomicBool,
    max_call_depth: usize,
}

/// Configuration and state threaded through evaluation.
pub struct EvalContext {
    shared: Arc<Shared>,
    depth: Cell<usize>,
}

impl EvalContext {
    /// Create a context wired to the given loop handle, with the process
    /// stdout/stderr as sinks.
    pub fn new(loop_handle: LoopHandle) -> Self {
        EvalContext {
            shared: Arc::new(Shared {
                loop_handle,
                stdout: Mutex::new(Box::new(std::io::stdout())),
                stderr: Mutex::new(Box::new(std::io::stderr())),
                interrupt: AtomicBool::new(false),
                max_call_depth: MAX_CALL_DEPTH,
            }),
            depth: Cell::new(0),
        }
    }

    /// A context for a fresh task: same runtime, zeroed call depth.
    pub fn fork(&self) -> EvalContext {
        EvalContext {
            shared: self.shared.clone(),
            depth: Cell::new(0),
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Call depth
    // ═══════════════════════════════════════════════════════════════════

    /// Enter a guest call. The returned guard restores the depth on drop;
    /// past the limit this is an `Internal` error.
    pub fn enter_call(&self) -> Result<CallGuard<'_>> {
        let depth = self.depth.get();
        if depth >= self.shared.max_call_depth {
            return Err(Error::Internal(format!(
                "stack overflow: call depth {} exceeds maximum {}",
                depth, self.shared.max_call_depth
            )));
        }
        self.depth.set(depth + 1);
        Ok(CallGuard { ctx: self })
    }

    // ═══════════════════════════════════════════════════════════════════
    // Interruption
    // ═══════════════════════════════════════════════════════════════════

    /// Has evaluation been interrupted?
    pub fn is_interrupted(&self) -> bool {
        self.shared.interrupt.load(Ordering::Relaxed)
    }

    /// Request interruption; checked at loop back-edges.
    pub fn interrupt(&self) {
        self.shared.interrupt.store(true, Ordering::Relaxed);
    }

    // ═══════════════════════════════════════════════════════════════════
    // Output sinks
    // ═══════════════════════════════════════════════════════════════════

    /// Redirect the `print`/`println` sink.
    pub fn set_stdout(&self, writer: Box<dyn Write + Send>) {
        *self.shared.stdout.lock() = writer;
    }

    /// Redirect the error sink.
    pub fn set_stderr(&self, writer: Box<dyn Write + Send>) {
        *self.shared.stderr.lock() = writer;
    }

    /// Write to the stdout sink. The sink lock makes each write atomic.
    pub fn write_out(&self, s: &str) {
        let mut out = self.shared.stdout.lock();
        let _ = out.write_all(s.as_bytes());
        let _ = out.flush();
    }

    /// Write a line to the stderr sink.
    pub fn write_err(&self, s: &str) {
        let mut err = self.shared.stderr.lock();
        let _ = writeln!(err, "{}", s);
        let _ = err.flush();
    }

    /// Report a task error without stopping the loop.
    pub fn report_error(&self, err: &Error) {
        self.write_err(&err.to_string());
    }

    // ═══════════════════════════════════════════════════════════════════
    // Scheduling
    // ═══════════════════════════════════════════════════════════════════

    /// Enqueue a task onto the event loop.
    pub fn schedule(&self, task: impl FnOnce() + Send + 'static) {
        self.shared.loop_handle.schedule(task);
    }

    /// Register background work that the loop must wait out.
    pub fn task_guard(&self) -> TaskGuard {
        self.shared.loop_handle.guard()
    }
}

/// Depth guard returned by [`EvalContext::enter_call`].
pub struct CallGuard<'a> {
    ctx: &'a EvalContext,
}

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        let depth = self.ctx.depth.get();
        self.ctx.depth.set(depth.saturating_sub(1));
    }
}
