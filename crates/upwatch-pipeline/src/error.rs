//! Error types for the result pipeline.

use thiserror::Error;

use upwatch_state::StateError;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that abort one check's pipeline for one cycle.
///
/// Nothing here escalates past the per-check boundary: the caller logs and
/// moves on to the next check.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The submitted report references an unknown check id.
    #[error("unknown health check: {0}")]
    UnknownCheck(String),

    /// A persistence call failed. If the alarm-state update itself failed,
    /// the state is not assumed transitioned and no notification fires.
    #[error("storage error: {0}")]
    Storage(#[from] StateError),
}
