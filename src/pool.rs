use std::sync::Arc;
use std::thread::{self, JoinHandle};

use log::{debug, error};

use crate::queue::TaskQueue;
use crate::task::{ResultHandle, Submission};
use crate::{PoolError, Result};

/// A fixed-size pool of worker threads sharing one FIFO task queue.
///
/// The worker set is created at construction and never grows or shrinks.
/// Jobs submitted while every worker is busy wait in the queue and are
/// dequeued in submission order; completion order is unspecified when
/// more than one worker runs.
pub struct WorkerPool {
    queue: Arc<TaskQueue>,
    workers: Vec<JoinHandle<()>>,
    threads: usize,
}

impl WorkerPool {
    /// Creates a pool with `threads` worker threads, all started before
    /// this returns.
    ///
    /// # Errors
    ///
    /// Returns `InvalidThreadCount` if `threads` is zero, and
    /// `WorkerSpawn` if the OS refuses to start a thread; in the latter
    /// case the workers already started are stopped and joined before
    /// the error is returned.
    pub fn new(threads: usize) -> Result<Self> {
        if threads == 0 {
            return Err(PoolError::InvalidThreadCount(threads));
        }

        let queue = Arc::new(TaskQueue::new());
        let mut workers = Vec::with_capacity(threads);

        for id in 0..threads {
            let worker_queue = Arc::clone(&queue);
            let spawned = thread::Builder::new()
                .name(format!("pool-worker-{id}"))
                .spawn(move || worker_loop(id, worker_queue));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    queue.signal_stop();
                    for worker in workers {
                        let _ = worker.join();
                    }
                    return Err(PoolError::WorkerSpawn(e.to_string()));
                }
            }
        }

        Ok(WorkerPool {
            queue,
            workers,
            threads,
        })
    }

    /// Number of worker threads the pool was created with.
    pub fn workers(&self) -> usize {
        self.threads
    }

    /// Number of submitted jobs still queued, not yet taken by a worker.
    pub fn pending_jobs(&self) -> usize {
        self.queue.len()
    }

    /// Submits a job for execution and returns a handle to its outcome.
    ///
    /// Returns as soon as the job is enqueued, never waiting for it to
    /// run. The closure executes on one of the pool's worker threads; a
    /// panic inside it is captured into the handle and does not affect
    /// other jobs or the worker.
    ///
    /// # Errors
    ///
    /// Returns `PoolStopped` if shutdown has begun; the job is not
    /// enqueued.
    pub fn submit<F, T>(&self, func: F) -> Result<ResultHandle<T>>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (task, handle) = Submission::new(func);
        self.queue.push(Box::new(task))?;
        Ok(handle)
    }

    /// Stops the pool: no further submissions are accepted, jobs still
    /// queued are abandoned (their handles resolve with `PoolShutdown`),
    /// and every worker is joined once its current job finishes.
    ///
    /// Idempotent; also runs on drop.
    pub fn shutdown(&mut self) {
        for task in self.queue.signal_stop() {
            task.abandon();
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                // Job panics are caught inside the task, so reaching this
                // arm means a bug in the worker loop itself.
                error!("worker thread panicked outside a job");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Per-worker loop: pull tasks until the stop sentinel arrives.
fn worker_loop(id: usize, queue: Arc<TaskQueue>) {
    debug!("worker {id} started");
    while let Some(task) = queue.pop_blocking() {
        debug!("worker {id} running a job");
        task.run();
    }
    debug!("worker {id} exiting");
}

/// Default worker count: hardware concurrency minus one, never less
/// than one.
pub fn default_thread_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}
