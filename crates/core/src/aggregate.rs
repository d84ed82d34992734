//! Computes the single completion percentage shown to the learner.

use crate::model::{CourseDefinition, CourseModule, ProgressRecord};

/// The percentage a final evaluation that was never taken caps the display at.
pub const EVALUATION_PENDING_CAP: f64 = 90.0;

/// Compute the displayed percentage from local facts and the server hint.
///
/// Priority order:
/// 1. A server hint of exactly 100 is authoritative and returned as-is, even
///    if no evaluation attempt is visible locally.
/// 2. Otherwise the local estimate is duration-weighted over completed
///    lessons, falling back to a plain lesson count when the course has no
///    recorded durations.
/// 3. With a final evaluation that was never taken, the local estimate is
///    capped at [`EVALUATION_PENDING_CAP`].
/// 4. The result never falls below what the server already confirmed.
#[must_use]
pub fn compute_percentage(
    progress: &ProgressRecord,
    course: &CourseDefinition,
    server_hint: Option<f64>,
) -> f64 {
    let hint = server_hint.map(|h| h.clamp(0.0, 100.0));

    if let Some(hint) = hint {
        if hint >= 100.0 {
            return 100.0;
        }
    }

    let mut local = local_estimate(progress, course);

    if course.evaluation().is_some() && !progress.has_taken_evaluation() {
        local = local.min(EVALUATION_PENDING_CAP);
    }

    local.max(hint.unwrap_or(0.0))
}

/// Duration-weighted completion over one module, for per-module progress bars.
#[must_use]
pub fn compute_module_percentage(module: &CourseModule, progress: &ProgressRecord) -> f64 {
    let total: u64 = module
        .lessons()
        .iter()
        .map(|l| u64::from(l.duration_minutes()))
        .sum();

    if total > 0 {
        let done: u64 = module
            .lessons()
            .iter()
            .filter(|l| progress.is_lesson_completed(l.id()))
            .map(|l| u64::from(l.duration_minutes()))
            .sum();
        ratio_percent(done, total)
    } else {
        let done = module
            .lessons()
            .iter()
            .filter(|l| progress.is_lesson_completed(l.id()))
            .count() as u64;
        ratio_percent(done, module.lessons().len() as u64)
    }
}

fn local_estimate(progress: &ProgressRecord, course: &CourseDefinition) -> f64 {
    let total_duration = course.total_duration_minutes();

    if total_duration > 0 {
        let completed_duration: u64 = course
            .lessons()
            .filter(|l| progress.is_lesson_completed(l.id()))
            .map(|l| u64::from(l.duration_minutes()))
            .sum();
        ratio_percent(completed_duration, total_duration)
    } else {
        let completed = course
            .lessons()
            .filter(|l| progress.is_lesson_completed(l.id()))
            .count() as u64;
        ratio_percent(completed, course.lesson_count() as u64)
    }
}

fn ratio_percent(done: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (done as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        CourseModule, EvaluationAttempt, FinalEvaluation, Lesson, ProgressRecord,
    };
    use crate::model::{AttemptId, EvaluationId, LessonId, ModuleId};
    use crate::time::fixed_now;

    fn course_with_durations(
        durations: &[u32],
        evaluation: Option<FinalEvaluation>,
    ) -> CourseDefinition {
        let lessons = durations
            .iter()
            .enumerate()
            .map(|(i, minutes)| {
                Lesson::new(LessonId::new(i as u64 + 1), ModuleId::new(1), i as u32, *minutes)
            })
            .collect();
        let module = CourseModule::new(ModuleId::new(1), lessons, None).unwrap();
        CourseDefinition::new(vec![module], evaluation).unwrap()
    }

    fn taken_attempt(passed: bool) -> EvaluationAttempt {
        EvaluationAttempt {
            id: AttemptId::new(1),
            completed_at: Some(fixed_now()),
            percentage: if passed { 80.0 } else { 40.0 },
            passed,
        }
    }

    #[test]
    fn duration_weighted_percentage() {
        let course = course_with_durations(&[10, 20, 30], None);
        let mut progress = ProgressRecord::empty();
        progress.complete_lesson(LessonId::new(1));
        progress.complete_lesson(LessonId::new(2));

        let pct = compute_percentage(&progress, &course, None);
        assert!((pct - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn count_fallback_when_course_has_no_durations() {
        let course = course_with_durations(&[0, 0, 0, 0], None);
        let mut progress = ProgressRecord::empty();
        progress.complete_lesson(LessonId::new(1));

        let pct = compute_percentage(&progress, &course, None);
        assert!((pct - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn untaken_evaluation_caps_at_ninety() {
        let eval = FinalEvaluation::new(EvaluationId::new(9), 3, 70.0).unwrap();
        let course = course_with_durations(&[10, 20, 30], Some(eval));
        let mut progress = ProgressRecord::empty();
        for id in 1..=3 {
            progress.complete_lesson(LessonId::new(id));
        }

        let pct = compute_percentage(&progress, &course, None);
        assert!((pct - EVALUATION_PENDING_CAP).abs() < f64::EPSILON);
    }

    #[test]
    fn taken_evaluation_lifts_the_cap_even_when_failed() {
        let eval = FinalEvaluation::new(EvaluationId::new(9), 3, 70.0).unwrap();
        let course = course_with_durations(&[10, 20, 30], Some(eval));
        let mut progress = ProgressRecord::empty();
        for id in 1..=3 {
            progress.complete_lesson(LessonId::new(id));
        }
        progress.record_attempt(taken_attempt(false));

        let pct = compute_percentage(&progress, &course, None);
        assert!((pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn server_hint_of_one_hundred_is_authoritative() {
        let eval = FinalEvaluation::new(EvaluationId::new(9), 3, 70.0).unwrap();
        let course = course_with_durations(&[10, 20, 30], Some(eval));
        let progress = ProgressRecord::empty();

        // No local completion, no attempts; the server still wins.
        let pct = compute_percentage(&progress, &course, Some(100.0));
        assert!((pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn server_hint_is_a_floor_below_one_hundred() {
        let course = course_with_durations(&[10, 20, 30], None);
        let progress = ProgressRecord::empty();

        let pct = compute_percentage(&progress, &course, Some(33.0));
        assert!((pct - 33.0).abs() < f64::EPSILON);
    }

    #[test]
    fn overshooting_server_hint_is_clamped() {
        let course = course_with_durations(&[10], None);
        let progress = ProgressRecord::empty();

        let pct = compute_percentage(&progress, &course, Some(250.0));
        assert!((pct - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_course_yields_zero() {
        let course = course_with_durations(&[0], None);
        let progress = ProgressRecord::empty();
        let pct = compute_percentage(&progress, &course, None);
        assert!(pct.abs() < f64::EPSILON);
    }

    #[test]
    fn module_percentage_is_duration_weighted() {
        let course = course_with_durations(&[30, 10], None);
        let mut progress = ProgressRecord::empty();
        progress.complete_lesson(LessonId::new(1));

        let module = course.module(ModuleId::new(1)).unwrap();
        let pct = compute_module_percentage(module, &progress);
        assert!((pct - 75.0).abs() < f64::EPSILON);
    }
}
