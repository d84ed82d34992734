//! Optimistic mutation with snapshot rollback, and hydration from the
//! authoritative server snapshot.
//!
//! The reconciliation engine is the only writer of the progress record.
//! Every local change goes through `apply_optimistic` as an explicit command
//! so rollback is a pure snapshot restore, never an ad hoc inverse
//! operation.

use tracing::{debug, warn};

use course_core::aggregate;
use course_core::model::{CourseDefinition, EvaluationAttempt, LessonId, ModuleId, ProgressRecord};
use progress_api::types::{LessonRowStatus, ProgressSnapshot};

//
// ─── MUTATIONS ─────────────────────────────────────────────────────────────────
//

/// A local state change applied before server confirmation.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressMutation {
    /// Mark a lesson completed and optimistically unlock its successor.
    CompleteLesson {
        lesson: LessonId,
        unlock_next: Option<LessonId>,
    },
    /// Record a passing quiz attempt for a module.
    PassQuiz { module: ModuleId },
    /// Record a final evaluation attempt, pass or fail.
    RecordAttempt { attempt: EvaluationAttempt },
}

/// Handle returned by `apply_optimistic`, consumed by `confirm` or
/// `rollback`. Holds the exact pre-mutation record.
#[derive(Debug)]
pub struct MutationHandle {
    snapshot: ProgressRecord,
    mutation: ProgressMutation,
}

/// Authoritative fields merged into the record on confirmation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerConfirmation {
    pub unlocked_lesson_id: Option<LessonId>,
    pub server_percentage: Option<f64>,
}

/// Token tying a hydration response to the request that started it. A
/// superseded token means the response is stale and must be discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HydrationToken(u64);

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Sole owner and writer of the in-session [`ProgressRecord`].
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    record: ProgressRecord,
    server_hint: Option<f64>,
    generation: u64,
}

impl ReconciliationEngine {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn record(&self) -> &ProgressRecord {
        &self.record
    }

    /// Last percentage the server confirmed, if any.
    #[must_use]
    pub fn server_hint(&self) -> Option<f64> {
        self.server_hint
    }

    /// Snapshot the record, apply `mutation`, and recompute the displayed
    /// percentage using the previous server hint.
    ///
    /// The displayed percentage only moves up here; authoritative snapshots
    /// are the one thing allowed to lower it, via `apply_hydration`.
    pub fn apply_optimistic(
        &mut self,
        mutation: ProgressMutation,
        course: &CourseDefinition,
    ) -> MutationHandle {
        let snapshot = self.record.clone();
        debug!(?mutation, "applying optimistic mutation");

        match &mutation {
            ProgressMutation::CompleteLesson {
                lesson,
                unlock_next,
            } => {
                self.record.complete_lesson(*lesson);
                // Only the same-module successor may be unlocked optimistically.
                // Crossing a module boundary is the server's call (via
                // `unlocked_lesson_id`) or falls out of structural gating once
                // the module, quiz included, is complete.
                let next = (*unlock_next).or_else(|| {
                    course
                        .module_of_lesson(*lesson)
                        .and_then(|m| m.lesson_after(*lesson))
                        .map(|l| l.id())
                });
                if let Some(next) = next {
                    self.record.unlock_lesson(next);
                }
                if let Some(module) = course.module_of_lesson(*lesson) {
                    let pct = aggregate::compute_module_percentage(module, &self.record);
                    self.record.set_module_percentage(module.id(), pct);
                }
            }
            ProgressMutation::PassQuiz { module } => {
                self.record.pass_module_quiz(*module);
                if let Some(module) = course.module(*module) {
                    let pct = aggregate::compute_module_percentage(module, &self.record);
                    self.record.set_module_percentage(module.id(), pct);
                }
            }
            ProgressMutation::RecordAttempt { attempt } => {
                self.record.record_attempt(attempt.clone());
            }
        }

        let estimate = aggregate::compute_percentage(&self.record, course, self.server_hint);
        self.record.raise_displayed_percentage(estimate);

        MutationHandle { snapshot, mutation }
    }

    /// Merge authoritative fields from a successful server response. The
    /// pre-mutation snapshot in `handle` is discarded.
    pub fn confirm(
        &mut self,
        handle: MutationHandle,
        confirmation: &ServerConfirmation,
        course: &CourseDefinition,
    ) {
        debug!(mutation = ?handle.mutation, "confirming mutation");
        drop(handle);

        if let Some(next) = confirmation.unlocked_lesson_id {
            self.record.unlock_lesson(next);
        }
        if let Some(percentage) = confirmation.server_percentage {
            self.server_hint = Some(percentage);
        }

        let estimate = aggregate::compute_percentage(&self.record, course, self.server_hint);
        self.record.raise_displayed_percentage(estimate);
    }

    /// Restore the exact pre-mutation record, displayed percentage and
    /// per-module caches included.
    pub fn rollback(&mut self, handle: MutationHandle) {
        warn!(mutation = ?handle.mutation, "rolling back optimistic mutation");
        self.record = handle.snapshot;
    }

    //
    // ─── HYDRATION ─────────────────────────────────────────────────────────
    //

    /// Start a hydration round, invalidating any response still in flight
    /// from an earlier round (e.g. a superseded course switch).
    pub fn begin_hydration(&mut self) -> HydrationToken {
        self.generation += 1;
        HydrationToken(self.generation)
    }

    /// Replace the record wholesale from an authoritative snapshot.
    ///
    /// Returns `false` and leaves the record untouched when `token` is
    /// stale. This is the one path allowed to lower the displayed
    /// percentage.
    pub fn apply_hydration(
        &mut self,
        token: HydrationToken,
        snapshot: &ProgressSnapshot,
        attempts: Vec<EvaluationAttempt>,
        course: &CourseDefinition,
    ) -> bool {
        if token.0 != self.generation {
            warn!(
                token = token.0,
                current = self.generation,
                "discarding stale hydration response"
            );
            return false;
        }

        let mut record = ProgressRecord::empty();
        for row in &snapshot.lesson_rows {
            match row.status {
                LessonRowStatus::Completed => record.complete_lesson(row.lesson_id),
                LessonRowStatus::InProgress => record.unlock_lesson(row.lesson_id),
                LessonRowStatus::NotStarted => {}
            }
        }
        if let Some(next) = snapshot.summary.next_lesson_id {
            record.unlock_lesson(next);
        }
        record.replace_attempts(attempts);

        for module in course.modules() {
            let pct = aggregate::compute_module_percentage(module, &record);
            record.set_module_percentage(module.id(), pct);
        }

        self.server_hint = snapshot.server_hint();
        let displayed = aggregate::compute_percentage(&record, course, self.server_hint);
        record.replace_displayed_percentage(displayed);

        self.record = record;
        true
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
