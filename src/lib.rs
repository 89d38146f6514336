#![deny(missing_docs)]

//! A fixed-size worker thread pool.
//!
//! A [`WorkerPool`] owns a fixed set of worker threads pulling jobs from
//! one shared FIFO queue. [`WorkerPool::submit`] enqueues a closure and
//! returns a [`ResultHandle`] immediately; the caller blocks on the
//! handle, never on the pool. Shutting the pool down (explicitly or by
//! dropping it) stops the workers after their current job; jobs still
//! queued at that point never run and their handles resolve with
//! [`PoolError::PoolShutdown`].

mod error;
mod pool;
mod queue;
mod task;

pub use error::{PoolError, Result};
pub use pool::{default_thread_count, WorkerPool};
pub use task::ResultHandle;
