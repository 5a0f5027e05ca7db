// src/errors.rs

// error handling for the pace limiter types

// dependencies
use thiserror::Error;

/// Error type for limiter configuration, waiting and task submission.
///
/// Denial (`try_acquire` returning `false`) and a bounded wait running out of
/// time are not errors and never show up here.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RateLimiterError {
    /// Delay truncates to zero milliseconds.
    #[error("delay must be at least one millisecond")]
    InvalidDelay,

    /// Window strategies need a quota greater than 1.
    #[error("max quota must be greater than 1, got {0}")]
    InvalidQuota(u32),

    /// Window size truncates to zero milliseconds.
    #[error("window size must be at least one millisecond")]
    InvalidWindowSize,

    /// A composite needs at least two children.
    #[error("composite limiter needs at least 2 children, got {0}")]
    InvalidComposite(usize),

    /// A quota above 1 was configured without a window to apply it to.
    #[error("max quota greater than 1 requires a window size")]
    MissingWindowSize,

    /// A worker pool needs at least one thread.
    #[error("worker count must be positive")]
    InvalidWorkerCount,

    /// The waiting context was cancelled before a grant happened.
    #[error("wait for a grant was cancelled")]
    Cancelled,

    /// The executor no longer accepts tasks.
    #[error("executor has been shut down, task rejected")]
    Rejected,

    /// A worker thread could not be started.
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] std::io::Error),
}
