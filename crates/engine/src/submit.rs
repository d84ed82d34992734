//! The single re-entrancy-guarded entry point for completion submissions.
//!
//! Every completion trigger, whatever raised it (end of media, read-to-end,
//! manual action), funnels through [`CompletionSubmitter::request_completion`]
//! so racing triggers produce at most one network call.

use std::sync::{Arc, Mutex};

use tracing::debug;

use course_core::gating::{self, CourseUnit};
use course_core::model::{
    AttemptId, CourseDefinition, EnrollmentId, EvaluationAttempt, LessonId, ModuleId,
    ProgressRecord,
};
use course_core::playback::CompletionTrigger;
use course_core::time::Clock;
use progress_api::types::{AnswerSheet, AttemptRow};
use progress_api::ProgressApi;

use crate::error::EngineError;
use crate::reconcile::{ProgressMutation, ReconciliationEngine, ServerConfirmation};

//
// ─── IN-FLIGHT GUARD ───────────────────────────────────────────────────────────
//

type InFlightSlot = Arc<Mutex<Option<CourseUnit>>>;

/// Scoped ownership of the global in-flight slot. Releasing happens in
/// `Drop`, so the flag clears on every exit path, early returns and error
/// propagation included.
struct InFlightGuard {
    slot: InFlightSlot,
}

impl InFlightGuard {
    fn acquire(slot: &InFlightSlot, unit: CourseUnit) -> Result<Self, EngineError> {
        let mut current = slot.lock().map_err(|_| EngineError::Busy)?;
        if current.is_some() {
            return Err(EngineError::Busy);
        }
        *current = Some(unit);
        drop(current);
        Ok(Self {
            slot: Arc::clone(slot),
        })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if let Ok(mut current) = self.slot.lock() {
            *current = None;
        }
    }
}

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Per-session lifecycle of a lesson:
/// `Locked -> Unlocked -> Completing -> Completed`, with
/// `Completing -> Unlocked` on rollback. `Completed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LessonState {
    Locked,
    Unlocked,
    Completing,
    Completed,
}

/// Result of a confirmed lesson completion.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub lesson: LessonId,
    pub unlocked_next: Option<LessonId>,
    pub displayed_percentage: f64,
}

/// Result of a module quiz submission, pass or fail.
#[derive(Debug, Clone, PartialEq)]
pub struct QuizSubmissionOutcome {
    pub module: ModuleId,
    pub passed: bool,
    pub percentage: f64,
    pub displayed_percentage: f64,
}

/// Result of a final evaluation submission.
///
/// `certificate_eligible` is the downstream signal for certificate
/// generation; the engine only exposes the boolean.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSubmissionOutcome {
    pub passed: bool,
    pub percentage: f64,
    pub certificate_eligible: bool,
    pub attempts_remaining: u32,
    pub displayed_percentage: f64,
}

//
// ─── SUBMITTER ─────────────────────────────────────────────────────────────────
//

/// Owns the reconciliation engine for one course view and talks to the
/// progress backend.
pub struct CompletionSubmitter {
    api: Arc<dyn ProgressApi>,
    course: CourseDefinition,
    enrollment: EnrollmentId,
    engine: ReconciliationEngine,
    in_flight: InFlightSlot,
    clock: Clock,
}

impl CompletionSubmitter {
    #[must_use]
    pub fn new(api: Arc<dyn ProgressApi>, course: CourseDefinition, enrollment: EnrollmentId) -> Self {
        Self {
            api,
            course,
            enrollment,
            engine: ReconciliationEngine::new(),
            in_flight: Arc::default(),
            clock: Clock::default(),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn course(&self) -> &CourseDefinition {
        &self.course
    }

    #[must_use]
    pub fn progress(&self) -> &ProgressRecord {
        self.engine.record()
    }

    #[must_use]
    pub fn displayed_percentage(&self) -> f64 {
        self.engine.record().displayed_percentage()
    }

    /// Gating decision for any unit, in terms of the current record.
    #[must_use]
    pub fn is_unlocked(&self, unit: CourseUnit) -> bool {
        gating::is_unlocked(unit, self.engine.record(), &self.course)
    }

    /// Session lifecycle state for a lesson.
    #[must_use]
    pub fn lesson_state(&self, lesson: LessonId) -> LessonState {
        if self.engine.record().is_lesson_completed(lesson) {
            return LessonState::Completed;
        }
        if let Ok(current) = self.in_flight.lock() {
            if *current == Some(CourseUnit::Lesson(lesson)) {
                return LessonState::Completing;
            }
        }
        if gating::is_lesson_unlocked(lesson, self.engine.record(), &self.course) {
            LessonState::Unlocked
        } else {
            LessonState::Locked
        }
    }

    /// Load the authoritative snapshot (and attempt history when the course
    /// has a final evaluation) into the record.
    ///
    /// Returns `false` when the response arrived stale and was discarded.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Api` for transport or server failures.
    pub async fn hydrate(&mut self) -> Result<bool, EngineError> {
        let token = self.engine.begin_hydration();
        let snapshot = self.api.fetch_progress(self.enrollment).await?;

        let attempts = if self.course.evaluation().is_some() {
            self.api
                .list_evaluation_attempts(self.enrollment)
                .await?
                .into_iter()
                .map(AttemptRow::into_attempt)
                .collect()
        } else {
            Vec::new()
        };

        Ok(self
            .engine
            .apply_hydration(token, &snapshot, attempts, &self.course))
    }

    /// Submit a lesson completion raised by a playback or visibility trigger.
    ///
    /// Rejects without a network call when the lesson is already completed,
    /// another request is in flight, or gating denies access. On a transport
    /// failure or a `success: false` response the optimistic mutation is
    /// rolled back and the action stays repeatable (for transport failures).
    ///
    /// # Errors
    ///
    /// Returns `EngineError` per the taxonomy in [`crate::error`].
    pub async fn request_completion(
        &mut self,
        trigger: CompletionTrigger,
    ) -> Result<CompletionOutcome, EngineError> {
        let CourseUnit::Lesson(lesson) = trigger.unit else {
            return Err(EngineError::NotCompletable);
        };
        debug!(?lesson, reason = ?trigger.reason, "completion requested");

        if self.engine.record().is_lesson_completed(lesson) {
            return Err(EngineError::AlreadyCompleted);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight, trigger.unit)?;

        if !gating::is_lesson_unlocked(lesson, self.engine.record(), &self.course) {
            return Err(EngineError::Locked);
        }

        let handle = self.engine.apply_optimistic(
            ProgressMutation::CompleteLesson {
                lesson,
                unlock_next: None,
            },
            &self.course,
        );

        match self.api.complete_lesson(self.enrollment, lesson).await {
            Ok(response) if response.success => {
                self.engine.confirm(
                    handle,
                    &ServerConfirmation {
                        unlocked_lesson_id: response.unlocked_lesson_id,
                        server_percentage: None,
                    },
                    &self.course,
                );
                Ok(CompletionOutcome {
                    lesson,
                    unlocked_next: response.unlocked_lesson_id,
                    displayed_percentage: self.displayed_percentage(),
                })
            }
            Ok(_) => {
                // Logical rejection inside a transport success.
                self.engine.rollback(handle);
                Err(EngineError::Rejected)
            }
            Err(err) => {
                self.engine.rollback(handle);
                Err(EngineError::Api(err))
            }
        }
    }

    /// Submit answers for a module quiz.
    ///
    /// A failing outcome is not an error: the learner sees the score and the
    /// module simply stays incomplete. Only a passing outcome mutates the
    /// record.
    ///
    /// # Errors
    ///
    /// Returns `EngineError` when the quiz is already passed, locked, another
    /// request is in flight, or the call fails.
    pub async fn submit_quiz(
        &mut self,
        module: ModuleId,
        answers: &AnswerSheet,
    ) -> Result<QuizSubmissionOutcome, EngineError> {
        if self.engine.record().is_quiz_passed(module) {
            return Err(EngineError::AlreadyCompleted);
        }
        let _guard = InFlightGuard::acquire(&self.in_flight, CourseUnit::Quiz(module))?;

        if !gating::is_quiz_accessible(module, self.engine.record(), &self.course) {
            return Err(EngineError::Locked);
        }

        let outcome = self
            .api
            .submit_module_quiz(self.enrollment, module, answers)
            .await?;

        if outcome.passed {
            let handle = self
                .engine
                .apply_optimistic(ProgressMutation::PassQuiz { module }, &self.course);
            self.engine
                .confirm(handle, &ServerConfirmation::default(), &self.course);
        }

        Ok(QuizSubmissionOutcome {
            module,
            passed: outcome.passed,
            percentage: outcome.percentage,
            displayed_percentage: self.displayed_percentage(),
        })
    }

    /// Submit answers for the final evaluation.
    ///
    /// Once the attempt budget is spent the unit is permanently locked for
    /// submission; no network call is made. Each taken attempt, pass or
    /// fail, is recorded and lifts the 90% display cap.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::AttemptsExhausted` when no attempts remain
    /// (fatal for this unit), `EngineError::Locked` while prerequisite
    /// modules are incomplete, and `EngineError::Api` for call failures.
    pub async fn submit_evaluation(
        &mut self,
        answers: &AnswerSheet,
    ) -> Result<EvaluationSubmissionOutcome, EngineError> {
        let Some(evaluation) = self.course.evaluation() else {
            return Err(EngineError::Locked);
        };
        let evaluation_id = evaluation.id();
        let max_attempts = evaluation.max_attempts();

        if self.engine.record().attempts_taken() >= max_attempts {
            return Err(EngineError::AttemptsExhausted);
        }
        let _guard =
            InFlightGuard::acquire(&self.in_flight, CourseUnit::Evaluation(evaluation_id))?;

        if !gating::is_evaluation_accessible(evaluation_id, self.engine.record(), &self.course) {
            return Err(EngineError::Locked);
        }

        let outcome = self.api.submit_evaluation(evaluation_id, answers).await?;

        // Locally synthesized attempt id; the authoritative listing replaces
        // it on the next hydration.
        let attempt = EvaluationAttempt {
            id: AttemptId::new(u64::from(self.engine.record().attempts_taken()) + 1),
            completed_at: Some(self.clock.now()),
            percentage: outcome.percentage,
            passed: outcome.passed,
        };
        let handle = self
            .engine
            .apply_optimistic(ProgressMutation::RecordAttempt { attempt }, &self.course);
        self.engine
            .confirm(handle, &ServerConfirmation::default(), &self.course);

        let attempts_remaining = max_attempts.saturating_sub(self.engine.record().attempts_taken());

        Ok(EvaluationSubmissionOutcome {
            passed: outcome.passed,
            percentage: outcome.percentage,
            certificate_eligible: outcome.passed && outcome.certificate_eligible,
            attempts_remaining,
            displayed_percentage: self.displayed_percentage(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
