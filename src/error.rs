use thiserror::Error;

/// Error type for pool operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// Submission was attempted after shutdown began.
    #[error("submit on a stopped pool")]
    PoolStopped,

    /// The job was still queued when the pool shut down; it never ran.
    #[error("job abandoned by pool shutdown")]
    PoolShutdown,

    /// The job panicked while executing.
    #[error("job panicked: {0}")]
    JobPanicked(String),

    /// The pool was constructed with zero worker threads.
    #[error("thread count must be at least 1, got {0}")]
    InvalidThreadCount(usize),

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(String),
}

/// Result type alias for pool operations.
pub type Result<T> = std::result::Result<T, PoolError>;
