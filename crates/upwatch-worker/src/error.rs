//! Error types for the worker.

use thiserror::Error;

use upwatch_state::StateError;

/// Result type alias for control-plane operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// Errors from one control-plane call. All of them are contained at the
/// per-check (or per-cycle) boundary; nothing aborts the runner loop.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("check not found")]
    UnknownCheck,

    #[error("api error: status {0}")]
    Api(u16),

    #[error("storage error: {0}")]
    Storage(#[from] StateError),
}
