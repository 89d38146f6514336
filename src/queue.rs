use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::task::QueuedTask;
use crate::{PoolError, Result};

/// Queue contents and the stop flag, guarded together so the submit-time
/// stop check and the enqueue form one critical section.
struct State {
    tasks: VecDeque<QueuedTask>,
    stopped: bool,
}

/// Thread-safe FIFO of pending tasks with blocking hand-off to workers.
///
/// Each task is dequeued by exactly one worker; push/pop pairs are
/// linearized by the shared lock.
pub(crate) struct TaskQueue {
    state: Mutex<State>,
    wakeup: Condvar,
}

impl TaskQueue {
    pub fn new() -> Self {
        TaskQueue {
            state: Mutex::new(State {
                tasks: VecDeque::new(),
                stopped: false,
            }),
            wakeup: Condvar::new(),
        }
    }

    /// Appends a task to the tail and wakes one idle worker. Never
    /// blocks beyond the lock itself.
    ///
    /// Fails with `PoolStopped` once stop has been signaled; the task is
    /// dropped without being enqueued.
    pub fn push(&self, task: QueuedTask) -> Result<()> {
        let mut state = self.lock();
        if state.stopped {
            return Err(PoolError::PoolStopped);
        }
        state.tasks.push_back(task);
        self.wakeup.notify_one();
        Ok(())
    }

    /// Removes and returns the head task, blocking while the queue is
    /// empty. Returns `None` once stop has been signaled, telling the
    /// calling worker to exit its loop.
    pub fn pop_blocking(&self) -> Option<QueuedTask> {
        let mut state = self.lock();
        loop {
            // signal_stop drains the queue under the same lock
            // acquisition that sets the flag, so a stopped queue is
            // always empty here and no task is dequeued after stop.
            if state.stopped {
                return None;
            }
            if let Some(task) = state.tasks.pop_front() {
                return Some(task);
            }
            state = self.wakeup.wait(state).expect("task queue lock poisoned");
        }
    }

    /// Sets the stop flag, wakes every waiting worker, and returns the
    /// tasks that were still queued so the caller can abandon them.
    /// Subsequent calls do nothing and return no tasks.
    pub fn signal_stop(&self) -> Vec<QueuedTask> {
        let mut state = self.lock();
        if state.stopped {
            return Vec::new();
        }
        state.stopped = true;
        let abandoned: Vec<QueuedTask> = state.tasks.drain(..).collect();
        drop(state);
        self.wakeup.notify_all();
        abandoned
    }

    /// Number of tasks queued and not yet handed to a worker.
    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // Poisoning cannot originate from job code (jobs run outside the
        // lock and panics are caught before they unwind this far).
        self.state.lock().expect("task queue lock poisoned")
    }
}
