use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{AttemptId, LessonId, ModuleId};

//
// ─── EVALUATION ATTEMPT ────────────────────────────────────────────────────────
//

/// One attempt at the final evaluation.
///
/// A non-null `completed_at` means the evaluation was taken, independent of
/// pass/fail. The 90% display cap lifts on the first taken attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationAttempt {
    pub id: AttemptId,
    pub completed_at: Option<DateTime<Utc>>,
    pub percentage: f64,
    pub passed: bool,
}

impl EvaluationAttempt {
    #[must_use]
    pub fn is_taken(&self) -> bool {
        self.completed_at.is_some()
    }
}

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// In-memory completion facts for one enrollment.
///
/// Created empty when a course view opens, hydrated once from the
/// authoritative server snapshot, mutated only by the reconciliation engine,
/// and discarded when the view closes. The backend stays the source of truth.
///
/// Invariant: `unlocked_lesson_ids` is always a superset of
/// `completed_lesson_ids`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProgressRecord {
    completed_lesson_ids: HashSet<LessonId>,
    unlocked_lesson_ids: HashSet<LessonId>,
    passed_quiz_module_ids: HashSet<ModuleId>,
    evaluation_attempts: Vec<EvaluationAttempt>,
    displayed_percentage: f64,
    module_percentages: HashMap<ModuleId, f64>,
}

impl ProgressRecord {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn completed_lesson_ids(&self) -> &HashSet<LessonId> {
        &self.completed_lesson_ids
    }

    #[must_use]
    pub fn unlocked_lesson_ids(&self) -> &HashSet<LessonId> {
        &self.unlocked_lesson_ids
    }

    #[must_use]
    pub fn passed_quiz_module_ids(&self) -> &HashSet<ModuleId> {
        &self.passed_quiz_module_ids
    }

    #[must_use]
    pub fn evaluation_attempts(&self) -> &[EvaluationAttempt] {
        &self.evaluation_attempts
    }

    #[must_use]
    pub fn displayed_percentage(&self) -> f64 {
        self.displayed_percentage
    }

    #[must_use]
    pub fn module_percentage(&self, module: ModuleId) -> Option<f64> {
        self.module_percentages.get(&module).copied()
    }

    #[must_use]
    pub fn is_lesson_completed(&self, lesson: LessonId) -> bool {
        self.completed_lesson_ids.contains(&lesson)
    }

    #[must_use]
    pub fn is_lesson_unlocked(&self, lesson: LessonId) -> bool {
        self.unlocked_lesson_ids.contains(&lesson) || self.completed_lesson_ids.contains(&lesson)
    }

    #[must_use]
    pub fn is_quiz_passed(&self, module: ModuleId) -> bool {
        self.passed_quiz_module_ids.contains(&module)
    }

    /// True once any attempt has a completion timestamp, pass or fail.
    #[must_use]
    pub fn has_taken_evaluation(&self) -> bool {
        self.evaluation_attempts.iter().any(EvaluationAttempt::is_taken)
    }

    /// True once any attempt passed.
    #[must_use]
    pub fn has_passed_evaluation(&self) -> bool {
        self.evaluation_attempts.iter().any(|a| a.passed)
    }

    /// Number of attempts that were actually taken (have a completion time).
    #[must_use]
    pub fn attempts_taken(&self) -> u32 {
        let taken = self
            .evaluation_attempts
            .iter()
            .filter(|a| a.is_taken())
            .count();
        u32::try_from(taken).unwrap_or(u32::MAX)
    }

    /// Mark a lesson complete. A completed lesson is also unlocked.
    pub fn complete_lesson(&mut self, lesson: LessonId) {
        self.completed_lesson_ids.insert(lesson);
        self.unlocked_lesson_ids.insert(lesson);
    }

    pub fn unlock_lesson(&mut self, lesson: LessonId) {
        self.unlocked_lesson_ids.insert(lesson);
    }

    pub fn pass_module_quiz(&mut self, module: ModuleId) {
        self.passed_quiz_module_ids.insert(module);
    }

    pub fn record_attempt(&mut self, attempt: EvaluationAttempt) {
        self.evaluation_attempts.push(attempt);
    }

    pub fn set_module_percentage(&mut self, module: ModuleId, percentage: f64) {
        self.module_percentages
            .insert(module, percentage.clamp(0.0, 100.0));
    }

    /// Raise the displayed percentage to `percentage` if higher.
    ///
    /// Local optimistic estimates may only move the display up; an
    /// authoritative snapshot replaces it via `replace_displayed_percentage`.
    pub fn raise_displayed_percentage(&mut self, percentage: f64) {
        let clamped = percentage.clamp(0.0, 100.0);
        if clamped > self.displayed_percentage {
            self.displayed_percentage = clamped;
        }
    }

    /// Replace the displayed percentage with an authoritative server value.
    pub fn replace_displayed_percentage(&mut self, percentage: f64) {
        self.displayed_percentage = percentage.clamp(0.0, 100.0);
    }

    /// Replace attempt history with an authoritative listing.
    pub fn replace_attempts(&mut self, attempts: Vec<EvaluationAttempt>) {
        self.evaluation_attempts = attempts;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
