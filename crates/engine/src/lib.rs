#![forbid(unsafe_code)]

//! Orchestration layer of the course progression engine: optimistic
//! reconciliation against the progress backend and the re-entrancy-guarded
//! completion submitter.

pub mod error;
pub mod reconcile;
pub mod submit;

pub use error::EngineError;
pub use reconcile::{
    HydrationToken, MutationHandle, ProgressMutation, ReconciliationEngine, ServerConfirmation,
};
pub use submit::{
    CompletionOutcome, CompletionSubmitter, EvaluationSubmissionOutcome, LessonState,
    QuizSubmissionOutcome,
};
