use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use course_core::model::{EnrollmentId, EvaluationId, LessonId, ModuleId};

use crate::client::{ApiError, ProgressApi};
use crate::types::{
    AnswerSheet, AttemptRow, CompleteLessonResponse, EnrollmentProgress, EvaluationOutcome,
    ProgressSnapshot, ProgressSummary, QuizOutcome,
};

/// Scripted behavior for the next lesson completion call.
#[derive(Debug, Clone)]
pub enum ScriptedCompletion {
    /// Succeed, optionally unlocking the given next lesson.
    Succeed(Option<LessonId>),
    /// 200 response carrying `success: false` (logical rejection).
    Reject,
    /// Simulated transport failure.
    FailTransport,
}

#[derive(Debug, Default)]
struct State {
    snapshot: Option<ProgressSnapshot>,
    attempts: Vec<AttemptRow>,
    completions: VecDeque<ScriptedCompletion>,
    quiz_outcomes: VecDeque<QuizOutcome>,
    evaluation_outcomes: VecDeque<EvaluationOutcome>,
    completion_calls: u32,
    quiz_calls: u32,
    evaluation_calls: u32,
    fetch_calls: u32,
}

/// Scripted in-memory implementation of [`ProgressApi`] for tests and
/// prototyping.
///
/// Responses are queued per endpoint; an empty queue falls back to a plain
/// success. Call counters let tests assert on network traffic.
#[derive(Clone, Default)]
pub struct InMemoryProgressApi {
    inner: Arc<Mutex<State>>,
}

impl InMemoryProgressApi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, State>, ApiError> {
        self.inner
            .lock()
            .map_err(|e| ApiError::Transport(e.to_string()))
    }

    fn lock_panicking(&self) -> std::sync::MutexGuard<'_, State> {
        self.inner.lock().expect("in-memory api mutex poisoned")
    }

    pub fn set_snapshot(&self, snapshot: ProgressSnapshot) {
        self.lock_panicking().snapshot = Some(snapshot);
    }

    pub fn set_attempts(&self, attempts: Vec<AttemptRow>) {
        self.lock_panicking().attempts = attempts;
    }

    pub fn script_completion(&self, behavior: ScriptedCompletion) {
        self.lock_panicking().completions.push_back(behavior);
    }

    pub fn script_quiz_outcome(&self, outcome: QuizOutcome) {
        self.lock_panicking().quiz_outcomes.push_back(outcome);
    }

    pub fn script_evaluation_outcome(&self, outcome: EvaluationOutcome) {
        self.lock_panicking().evaluation_outcomes.push_back(outcome);
    }

    #[must_use]
    pub fn completion_calls(&self) -> u32 {
        self.lock_panicking().completion_calls
    }

    #[must_use]
    pub fn quiz_calls(&self) -> u32 {
        self.lock_panicking().quiz_calls
    }

    #[must_use]
    pub fn evaluation_calls(&self) -> u32 {
        self.lock_panicking().evaluation_calls
    }

    #[must_use]
    pub fn fetch_calls(&self) -> u32 {
        self.lock_panicking().fetch_calls
    }

    fn empty_snapshot() -> ProgressSnapshot {
        ProgressSnapshot {
            summary: ProgressSummary {
                progress_percentage: None,
                next_lesson_id: None,
            },
            lesson_rows: Vec::new(),
            module_rows: Vec::new(),
            enrollment: EnrollmentProgress {
                progress_percentage: None,
            },
        }
    }
}

#[async_trait]
impl ProgressApi for InMemoryProgressApi {
    async fn fetch_progress(
        &self,
        _enrollment: EnrollmentId,
    ) -> Result<ProgressSnapshot, ApiError> {
        let mut state = self.lock()?;
        state.fetch_calls += 1;
        Ok(state.snapshot.clone().unwrap_or_else(Self::empty_snapshot))
    }

    async fn complete_lesson(
        &self,
        _enrollment: EnrollmentId,
        _lesson: LessonId,
    ) -> Result<CompleteLessonResponse, ApiError> {
        let mut state = self.lock()?;
        state.completion_calls += 1;
        match state
            .completions
            .pop_front()
            .unwrap_or(ScriptedCompletion::Succeed(None))
        {
            ScriptedCompletion::Succeed(unlocked) => Ok(CompleteLessonResponse {
                success: true,
                unlocked_lesson_id: unlocked,
            }),
            ScriptedCompletion::Reject => Ok(CompleteLessonResponse {
                success: false,
                unlocked_lesson_id: None,
            }),
            ScriptedCompletion::FailTransport => {
                Err(ApiError::Transport("scripted transport failure".into()))
            }
        }
    }

    async fn submit_module_quiz(
        &self,
        _enrollment: EnrollmentId,
        _module: ModuleId,
        _answers: &AnswerSheet,
    ) -> Result<QuizOutcome, ApiError> {
        let mut state = self.lock()?;
        state.quiz_calls += 1;
        Ok(state.quiz_outcomes.pop_front().unwrap_or(QuizOutcome {
            passed: true,
            percentage: 100.0,
            score: 1.0,
            total_points: 1.0,
        }))
    }

    async fn submit_evaluation(
        &self,
        _evaluation: EvaluationId,
        _answers: &AnswerSheet,
    ) -> Result<EvaluationOutcome, ApiError> {
        let mut state = self.lock()?;
        state.evaluation_calls += 1;
        Ok(state
            .evaluation_outcomes
            .pop_front()
            .unwrap_or(EvaluationOutcome {
                passed: true,
                percentage: 100.0,
                certificate_eligible: true,
                question_results: Vec::new(),
            }))
    }

    async fn list_evaluation_attempts(
        &self,
        _enrollment: EnrollmentId,
    ) -> Result<Vec<AttemptRow>, ApiError> {
        Ok(self.lock()?.attempts.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_rejection_then_default_success() {
        let api = InMemoryProgressApi::new();
        api.script_completion(ScriptedCompletion::Reject);

        let first = api
            .complete_lesson(EnrollmentId::new(1), LessonId::new(1))
            .await
            .unwrap();
        assert!(!first.success);

        let second = api
            .complete_lesson(EnrollmentId::new(1), LessonId::new(1))
            .await
            .unwrap();
        assert!(second.success);
        assert_eq!(api.completion_calls(), 2);
    }

    #[tokio::test]
    async fn transport_failure_is_an_error() {
        let api = InMemoryProgressApi::new();
        api.script_completion(ScriptedCompletion::FailTransport);

        let err = api
            .complete_lesson(EnrollmentId::new(1), LessonId::new(1))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
