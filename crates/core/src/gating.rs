//! Access-control decisions for course units.
//!
//! Gating is a total function: every unit resolves to unlocked or locked,
//! and unknown ids resolve to locked. Nothing here returns an error.

use crate::model::{CourseDefinition, CourseModule, EvaluationId, LessonId, ModuleId, ProgressRecord};

/// A unit a learner can try to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CourseUnit {
    Lesson(LessonId),
    Quiz(ModuleId),
    Evaluation(EvaluationId),
}

/// Is `unit` accessible right now, given the progress record?
///
/// Unknown unit ids fail closed.
#[must_use]
pub fn is_unlocked(unit: CourseUnit, progress: &ProgressRecord, course: &CourseDefinition) -> bool {
    match unit {
        CourseUnit::Lesson(id) => is_lesson_unlocked(id, progress, course),
        CourseUnit::Quiz(id) => is_quiz_accessible(id, progress, course),
        CourseUnit::Evaluation(id) => is_evaluation_accessible(id, progress, course),
    }
}

/// All lessons completed, and the quiz (if any) passed.
#[must_use]
pub fn is_module_complete(module: &CourseModule, progress: &ProgressRecord) -> bool {
    let lessons_done = module
        .lessons()
        .iter()
        .all(|l| progress.is_lesson_completed(l.id()));
    let quiz_done = module.quiz().is_none_or(|_| progress.is_quiz_passed(module.id()));
    lessons_done && quiz_done
}

/// Lesson gating:
/// - the very first lesson of the course is always unlocked;
/// - the first lesson of a later module requires every earlier module to be
///   module-complete;
/// - any other lesson requires its immediate predecessor to be completed.
///
/// A lesson the server already unlocked or the learner already completed is
/// unlocked regardless of the structural rules.
#[must_use]
pub fn is_lesson_unlocked(
    lesson: LessonId,
    progress: &ProgressRecord,
    course: &CourseDefinition,
) -> bool {
    if progress.is_lesson_unlocked(lesson) {
        return true;
    }

    let Some(module) = course.module_of_lesson(lesson) else {
        return false;
    };

    if module.first_lesson().id() == lesson {
        // First lesson of module k: all modules before k must be complete.
        return course
            .modules()
            .iter()
            .take_while(|m| m.id() != module.id())
            .all(|m| is_module_complete(m, progress));
    }

    match module.lesson_before(lesson) {
        Some(prev) => progress.is_lesson_completed(prev.id()),
        None => false,
    }
}

/// A quiz opens once all lessons of its module are completed. It does not
/// require itself to already be passed.
#[must_use]
pub fn is_quiz_accessible(
    module_id: ModuleId,
    progress: &ProgressRecord,
    course: &CourseDefinition,
) -> bool {
    let Some(module) = course.module(module_id) else {
        return false;
    };
    if module.quiz().is_none() {
        return false;
    }
    module
        .lessons()
        .iter()
        .all(|l| progress.is_lesson_completed(l.id()))
}

/// The final evaluation opens once every module is module-complete, and
/// closes for further submissions once the attempt budget is spent.
///
/// Accessibility is decoupled from the displayed percentage, which may sit
/// at 90 while the evaluation is still pending.
#[must_use]
pub fn is_evaluation_accessible(
    evaluation: EvaluationId,
    progress: &ProgressRecord,
    course: &CourseDefinition,
) -> bool {
    let Some(eval) = course.evaluation() else {
        return false;
    };
    if eval.id() != evaluation {
        return false;
    }
    if progress.attempts_taken() >= eval.max_attempts() {
        return false;
    }
    course
        .modules()
        .iter()
        .all(|m| is_module_complete(m, progress))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        AttemptId, CourseModule, EvaluationAttempt, FinalEvaluation, Lesson, ModuleQuiz, QuizId,
    };
    use crate::time::fixed_now;

    /// Module A: lessons 1, 2 with a required quiz. Module B: lesson 3.
    fn two_module_course(evaluation: Option<FinalEvaluation>) -> CourseDefinition {
        let a = CourseModule::new(
            ModuleId::new(10),
            vec![
                Lesson::new(LessonId::new(1), ModuleId::new(10), 0, 10),
                Lesson::new(LessonId::new(2), ModuleId::new(10), 1, 20),
            ],
            Some(ModuleQuiz::new(QuizId::new(100), ModuleId::new(10))),
        )
        .unwrap();
        let b = CourseModule::new(
            ModuleId::new(20),
            vec![Lesson::new(LessonId::new(3), ModuleId::new(20), 0, 30)],
            None,
        )
        .unwrap();
        CourseDefinition::new(vec![a, b], evaluation).unwrap()
    }

    #[test]
    fn first_lesson_is_always_unlocked() {
        let course = two_module_course(None);
        let progress = ProgressRecord::empty();
        assert!(is_lesson_unlocked(LessonId::new(1), &progress, &course));
    }

    #[test]
    fn second_lesson_requires_first_completed() {
        let course = two_module_course(None);
        let mut progress = ProgressRecord::empty();
        assert!(!is_lesson_unlocked(LessonId::new(2), &progress, &course));

        progress.complete_lesson(LessonId::new(1));
        assert!(is_lesson_unlocked(LessonId::new(2), &progress, &course));
    }

    #[test]
    fn next_module_waits_for_lessons_and_quiz() {
        let course = two_module_course(None);
        let mut progress = ProgressRecord::empty();

        // None of the three prerequisites satisfied.
        assert!(!is_lesson_unlocked(LessonId::new(3), &progress, &course));

        progress.complete_lesson(LessonId::new(1));
        assert!(!is_lesson_unlocked(LessonId::new(3), &progress, &course));

        progress.complete_lesson(LessonId::new(2));
        // Lessons done, quiz still pending.
        assert!(!is_lesson_unlocked(LessonId::new(3), &progress, &course));

        progress.pass_module_quiz(ModuleId::new(10));
        assert!(is_lesson_unlocked(LessonId::new(3), &progress, &course));
    }

    #[test]
    fn quiz_opens_after_module_lessons_without_requiring_a_pass() {
        let course = two_module_course(None);
        let mut progress = ProgressRecord::empty();
        assert!(!is_quiz_accessible(ModuleId::new(10), &progress, &course));

        progress.complete_lesson(LessonId::new(1));
        progress.complete_lesson(LessonId::new(2));
        assert!(is_quiz_accessible(ModuleId::new(10), &progress, &course));
    }

    #[test]
    fn quiz_on_quizless_module_is_locked() {
        let course = two_module_course(None);
        let mut progress = ProgressRecord::empty();
        progress.complete_lesson(LessonId::new(3));
        assert!(!is_quiz_accessible(ModuleId::new(20), &progress, &course));
    }

    #[test]
    fn evaluation_requires_every_module_complete() {
        let eval = FinalEvaluation::new(EvaluationId::new(500), 3, 70.0).unwrap();
        let course = two_module_course(Some(eval));
        let mut progress = ProgressRecord::empty();

        let unit = CourseUnit::Evaluation(EvaluationId::new(500));
        assert!(!is_unlocked(unit, &progress, &course));

        progress.complete_lesson(LessonId::new(1));
        progress.complete_lesson(LessonId::new(2));
        progress.pass_module_quiz(ModuleId::new(10));
        progress.complete_lesson(LessonId::new(3));
        assert!(is_unlocked(unit, &progress, &course));
    }

    #[test]
    fn evaluation_locks_once_attempts_are_exhausted() {
        let eval = FinalEvaluation::new(EvaluationId::new(500), 1, 70.0).unwrap();
        let course = two_module_course(Some(eval));
        let mut progress = ProgressRecord::empty();
        progress.complete_lesson(LessonId::new(1));
        progress.complete_lesson(LessonId::new(2));
        progress.pass_module_quiz(ModuleId::new(10));
        progress.complete_lesson(LessonId::new(3));

        assert!(is_evaluation_accessible(
            EvaluationId::new(500),
            &progress,
            &course
        ));

        progress.record_attempt(EvaluationAttempt {
            id: AttemptId::new(1),
            completed_at: Some(fixed_now()),
            percentage: 40.0,
            passed: false,
        });
        assert!(!is_evaluation_accessible(
            EvaluationId::new(500),
            &progress,
            &course
        ));
    }

    #[test]
    fn unknown_units_fail_closed() {
        let course = two_module_course(None);
        let progress = ProgressRecord::empty();

        assert!(!is_unlocked(
            CourseUnit::Lesson(LessonId::new(999)),
            &progress,
            &course
        ));
        assert!(!is_unlocked(
            CourseUnit::Quiz(ModuleId::new(999)),
            &progress,
            &course
        ));
        assert!(!is_unlocked(
            CourseUnit::Evaluation(EvaluationId::new(999)),
            &progress,
            &course
        ));
    }
}
