//! Event loop and async primitives
//!
//! One task queue drives every asynchronous effect: timers, promise
//! settlement, and `tao`-spawned calls. Background threads exist only for
//! blocking waits; they never touch the value graph directly and funnel
//! all effects back through [`LoopHandle::schedule`]. The loop runs tasks
//! to completion single-threadedly and drains until quiescent: it exits
//! only when the queue is empty and no background producer is alive.

pub(crate) mod channel;
pub(crate) mod promise;
pub(crate) mod timer;

pub use channel::Channel;
pub use promise::Promise;
pub use timer::Timer;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;

use tracing::trace;

/// A unit of work scheduled onto the loop.
pub type Task = Box<dyn FnOnce() + Send>;

/// Cloneable producer handle: enqueue tasks, register background work.
#[derive(Clone)]
pub struct LoopHandle {
    tx: Sender<Task>,
    jobs: Arc<AtomicUsize>,
}

impl LoopHandle {
    /// Enqueue a task. Two scheduled tasks run in FIFO order.
    pub fn schedule(&self, task: impl FnOnce() + Send + 'static) {
        trace!("task scheduled");
        // The receiver lives as long as the loop; a send failure means the
        // loop is gone and the task is moot.
        let _ = self.tx.send(Box::new(task));
    }

    /// Register a background producer (timer thread, tao task). The loop
    /// keeps draining while any guard is alive. Producers must schedule
    /// their final effects before dropping the guard.
    pub fn guard(&self) -> TaskGuard {
        self.jobs.fetch_add(1, Ordering::SeqCst);
        TaskGuard {
            handle: self.clone(),
        }
    }

    fn outstanding(&self) -> usize {
        self.jobs.load(Ordering::SeqCst)
    }
}

/// Keep-alive token for background work. Dropping it wakes the loop so a
/// blocked drain can re-check for quiescence.
pub struct TaskGuard {
    handle: LoopHandle,
}

impl Drop for TaskGuard {
    fn drop(&mut self) {
        self.handle.jobs.fetch_sub(1, Ordering::SeqCst);
        let _ = self.handle.tx.send(Box::new(|| {}));
    }
}

/// The single-consumer event loop.
pub struct EventLoop {
    rx: Receiver<Task>,
    handle: LoopHandle,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    /// Create a loop and its producer handle.
    pub fn new() -> Self {
        let (tx, rx) = std::sync::mpsc::channel();
        EventLoop {
            rx,
            handle: LoopHandle {
                tx,
                jobs: Arc::new(AtomicUsize::new(0)),
            },
        }
    }

    /// A producer handle for this loop.
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Run tasks until the queue is empty and no background producer
    /// remains.
    pub fn drain(&self) {
        loop {
            match self.rx.try_recv() {
                Ok(task) => task(),
                Err(TryRecvError::Empty) => {
                    if self.handle.outstanding() == 0 {
                        break;
                    }
                    // A producer is alive; block until it schedules work
                    // or drops its guard (which sends a wake task).
                    match self.rx.recv() {
                        Ok(task) => task(),
                        Err(_) => break,
                    }
                }
                Err(TryRecvError::Disconnected) => break,
            }
        }
    }
}
