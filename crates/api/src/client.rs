use async_trait::async_trait;
use thiserror::Error;

use course_core::model::{EnrollmentId, EvaluationId, LessonId, ModuleId};

use crate::types::{
    AnswerSheet, AttemptRow, CompleteLessonResponse, EvaluationOutcome, ProgressSnapshot,
    QuizOutcome,
};

/// Errors surfaced by progress API adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ApiError {
    #[error("request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error("transport error: {0}")]
    Transport(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Boundary contract for the progress backend.
///
/// The engine only ever talks to the backend through this trait; production
/// uses [`crate::HttpProgressApi`], tests use [`crate::InMemoryProgressApi`].
#[async_trait]
pub trait ProgressApi: Send + Sync {
    /// Fetch the authoritative progress snapshot for an enrollment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport or server failures.
    async fn fetch_progress(
        &self,
        enrollment: EnrollmentId,
    ) -> Result<ProgressSnapshot, ApiError>;

    /// Report a lesson as completed.
    ///
    /// A transport success may still carry `success: false`; the caller owns
    /// that distinction.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport or server failures.
    async fn complete_lesson(
        &self,
        enrollment: EnrollmentId,
        lesson: LessonId,
    ) -> Result<CompleteLessonResponse, ApiError>;

    /// Submit answers for a module quiz.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport or server failures.
    async fn submit_module_quiz(
        &self,
        enrollment: EnrollmentId,
        module: ModuleId,
        answers: &AnswerSheet,
    ) -> Result<QuizOutcome, ApiError>;

    /// Submit answers for the final evaluation.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport or server failures.
    async fn submit_evaluation(
        &self,
        evaluation: EvaluationId,
        answers: &AnswerSheet,
    ) -> Result<EvaluationOutcome, ApiError>;

    /// List all evaluation attempts for an enrollment, taken or abandoned.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` for transport or server failures.
    async fn list_evaluation_attempts(
        &self,
        enrollment: EnrollmentId,
    ) -> Result<Vec<AttemptRow>, ApiError>;
}
