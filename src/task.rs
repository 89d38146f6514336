use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Condvar, Mutex};

use log::error;

use crate::{PoolError, Result};

/// A queued unit of work, type-erased for storage in the shared queue.
///
/// `run` executes the job on a worker thread and completes its handle;
/// `abandon` completes the handle with [`PoolError::PoolShutdown`] when
/// the pool stops before the job was ever dequeued.
pub(crate) trait Task: Send {
    fn run(self: Box<Self>);
    fn abandon(self: Box<Self>);
}

pub(crate) type QueuedTask = Box<dyn Task>;

/// Single-assignment cell shared between a worker and the caller.
struct Cell<T> {
    outcome: Mutex<Option<Result<T>>>,
    ready: Condvar,
}

impl<T> Cell<T> {
    /// Writes the outcome; the first write wins and later writes are
    /// ignored, keeping the pending-to-ready transition one-shot.
    fn complete(&self, outcome: Result<T>) {
        let mut slot = self.outcome.lock().expect("result cell lock poisoned");
        if slot.is_none() {
            *slot = Some(outcome);
            self.ready.notify_all();
        }
    }
}

/// Handle to a submitted job's eventual outcome.
///
/// Returned by [`WorkerPool::submit`](crate::WorkerPool::submit). The
/// handle becomes ready exactly once: with the job's return value, with
/// [`PoolError::JobPanicked`] if the job panicked, or with
/// [`PoolError::PoolShutdown`] if the pool shut down before the job ran.
/// Cloning the handle shares the same cell.
pub struct ResultHandle<T> {
    cell: Arc<Cell<T>>,
}

impl<T> Clone for ResultHandle<T> {
    fn clone(&self) -> Self {
        ResultHandle {
            cell: Arc::clone(&self.cell),
        }
    }
}

impl<T> ResultHandle<T> {
    /// Blocks until the outcome is available.
    pub fn wait(&self) {
        let mut slot = self.cell.outcome.lock().expect("result cell lock poisoned");
        while slot.is_none() {
            slot = self.cell.ready.wait(slot).expect("result cell lock poisoned");
        }
    }

    /// Returns `true` if the outcome is available, without blocking.
    pub fn is_ready(&self) -> bool {
        self.cell
            .outcome
            .lock()
            .expect("result cell lock poisoned")
            .is_some()
    }
}

impl<T: Clone> ResultHandle<T> {
    /// Blocks until the job completes and returns its outcome.
    ///
    /// May be called any number of times; every call returns the same
    /// outcome, and reading an already-ready handle never blocks.
    pub fn get(&self) -> Result<T> {
        let mut slot = self.cell.outcome.lock().expect("result cell lock poisoned");
        loop {
            match slot.as_ref() {
                Some(outcome) => return outcome.clone(),
                None => slot = self.cell.ready.wait(slot).expect("result cell lock poisoned"),
            }
        }
    }
}

/// A submitted closure bound to the cell its outcome is written into.
pub(crate) struct Submission<T, F> {
    func: F,
    cell: Arc<Cell<T>>,
}

impl<T, F> Submission<T, F>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    pub fn new(func: F) -> (Self, ResultHandle<T>) {
        let cell = Arc::new(Cell {
            outcome: Mutex::new(None),
            ready: Condvar::new(),
        });
        let handle = ResultHandle {
            cell: Arc::clone(&cell),
        };
        (Submission { func, cell }, handle)
    }
}

impl<T, F> Task for Submission<T, F>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    fn run(self: Box<Self>) {
        let Submission { func, cell } = *self;
        // Catch panics here so they reach the handle, not the worker loop.
        let outcome = match catch_unwind(AssertUnwindSafe(func)) {
            Ok(value) => Ok(value),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!("job panicked: {message}");
                Err(PoolError::JobPanicked(message))
            }
        };
        cell.complete(outcome);
    }

    fn abandon(self: Box<Self>) {
        self.cell.complete(Err(PoolError::PoolShutdown));
    }
}

/// Best-effort extraction of a panic payload's message.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
