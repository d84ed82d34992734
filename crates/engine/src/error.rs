//! Shared error types for the engine crate.

use thiserror::Error;

use progress_api::ApiError;

/// Errors emitted by the completion submitter and reconciliation engine.
///
/// The taxonomy matters to the UI layer: transport errors leave the record
/// rolled back and the triggering action repeatable; logical rejections are
/// blocking states the learner cannot retry automatically; exhausted
/// attempts are terminal for that unit but not for the session.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("another completion request is already in flight")]
    Busy,

    #[error("unit is already completed")]
    AlreadyCompleted,

    #[error("unit is locked")]
    Locked,

    #[error("server rejected the completion")]
    Rejected,

    #[error("no evaluation attempts remaining")]
    AttemptsExhausted,

    #[error("completion triggers only apply to lessons")]
    NotCompletable,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl EngineError {
    /// True when re-invoking the triggering action may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Api(_) | EngineError::Busy)
    }
}
