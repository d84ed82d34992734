use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::{EvaluationId, LessonId, ModuleId, QuizId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CourseError {
    #[error("course must contain at least one module")]
    NoModules,

    #[error("module {0} must contain at least one lesson")]
    EmptyModule(ModuleId),

    #[error("lesson {lesson} declares module {declared} but belongs to module {actual}")]
    LessonModuleMismatch {
        lesson: LessonId,
        declared: ModuleId,
        actual: ModuleId,
    },

    #[error("quiz {quiz} declares module {declared} but is attached to module {actual}")]
    QuizModuleMismatch {
        quiz: QuizId,
        declared: ModuleId,
        actual: ModuleId,
    },

    #[error("duplicate lesson id {0}")]
    DuplicateLessonId(LessonId),

    #[error("duplicate module id {0}")]
    DuplicateModuleId(ModuleId),

    #[error("evaluation must allow at least one attempt")]
    NoAttemptsAllowed,
}

//
// ─── LESSON ────────────────────────────────────────────────────────────────────
//

/// A single unit of course content.
///
/// `duration_minutes` may be zero; zero-duration lessons carry no weight in
/// duration-based aggregation but still count toward gating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lesson {
    id: LessonId,
    module_id: ModuleId,
    order_index: u32,
    duration_minutes: u32,
}

impl Lesson {
    #[must_use]
    pub fn new(id: LessonId, module_id: ModuleId, order_index: u32, duration_minutes: u32) -> Self {
        Self {
            id,
            module_id,
            order_index,
            duration_minutes,
        }
    }

    #[must_use]
    pub fn id(&self) -> LessonId {
        self.id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }

    #[must_use]
    pub fn order_index(&self) -> u32 {
        self.order_index
    }

    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }
}

//
// ─── MODULE QUIZ ───────────────────────────────────────────────────────────────
//

/// Quiz attached to a module. Passing it is always required for the module
/// to count as complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleQuiz {
    id: QuizId,
    module_id: ModuleId,
}

impl ModuleQuiz {
    #[must_use]
    pub fn new(id: QuizId, module_id: ModuleId) -> Self {
        Self { id, module_id }
    }

    #[must_use]
    pub fn id(&self) -> QuizId {
        self.id
    }

    #[must_use]
    pub fn module_id(&self) -> ModuleId {
        self.module_id
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// An ordered group of lessons with an optional quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseModule {
    id: ModuleId,
    lessons: Vec<Lesson>,
    quiz: Option<ModuleQuiz>,
}

impl CourseModule {
    /// Create a module, sorting lessons by `order_index`.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` if the module is empty or a lesson/quiz declares
    /// a different module id.
    pub fn new(
        id: ModuleId,
        mut lessons: Vec<Lesson>,
        quiz: Option<ModuleQuiz>,
    ) -> Result<Self, CourseError> {
        if lessons.is_empty() {
            return Err(CourseError::EmptyModule(id));
        }
        for lesson in &lessons {
            if lesson.module_id() != id {
                return Err(CourseError::LessonModuleMismatch {
                    lesson: lesson.id(),
                    declared: lesson.module_id(),
                    actual: id,
                });
            }
        }
        if let Some(quiz) = &quiz {
            if quiz.module_id() != id {
                return Err(CourseError::QuizModuleMismatch {
                    quiz: quiz.id(),
                    declared: quiz.module_id(),
                    actual: id,
                });
            }
        }
        lessons.sort_by_key(Lesson::order_index);

        Ok(Self { id, lessons, quiz })
    }

    #[must_use]
    pub fn id(&self) -> ModuleId {
        self.id
    }

    /// Lessons in presentation order.
    #[must_use]
    pub fn lessons(&self) -> &[Lesson] {
        &self.lessons
    }

    #[must_use]
    pub fn quiz(&self) -> Option<&ModuleQuiz> {
        self.quiz.as_ref()
    }

    #[must_use]
    pub fn first_lesson(&self) -> &Lesson {
        &self.lessons[0]
    }

    /// The lesson immediately preceding `lesson` within this module, if any.
    #[must_use]
    pub fn lesson_before(&self, lesson: LessonId) -> Option<&Lesson> {
        let idx = self.lessons.iter().position(|l| l.id() == lesson)?;
        idx.checked_sub(1).map(|prev| &self.lessons[prev])
    }

    /// The lesson immediately following `lesson` within this module, if any.
    #[must_use]
    pub fn lesson_after(&self, lesson: LessonId) -> Option<&Lesson> {
        let idx = self.lessons.iter().position(|l| l.id() == lesson)?;
        self.lessons.get(idx + 1)
    }
}

//
// ─── FINAL EVALUATION ──────────────────────────────────────────────────────────
//

/// Course-level final evaluation. At most one per course.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalEvaluation {
    id: EvaluationId,
    max_attempts: u32,
    passing_score: f64,
}

impl FinalEvaluation {
    /// # Errors
    ///
    /// Returns `CourseError::NoAttemptsAllowed` if `max_attempts` is zero.
    pub fn new(id: EvaluationId, max_attempts: u32, passing_score: f64) -> Result<Self, CourseError> {
        if max_attempts == 0 {
            return Err(CourseError::NoAttemptsAllowed);
        }
        Ok(Self {
            id,
            max_attempts,
            passing_score,
        })
    }

    #[must_use]
    pub fn id(&self) -> EvaluationId {
        self.id
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub fn passing_score(&self) -> f64 {
        self.passing_score
    }
}

//
// ─── COURSE DEFINITION ─────────────────────────────────────────────────────────
//

/// Immutable description of a course: ordered modules, each with ordered
/// lessons and an optional quiz, plus an optional final evaluation.
///
/// Owned by the external catalog; the progression engine only reads it.
#[derive(Debug, Clone, PartialEq)]
pub struct CourseDefinition {
    modules: Vec<CourseModule>,
    evaluation: Option<FinalEvaluation>,
}

impl CourseDefinition {
    /// Create a validated course definition.
    ///
    /// # Errors
    ///
    /// Returns `CourseError` when the course has no modules, or module/lesson
    /// ids collide across the course.
    pub fn new(
        modules: Vec<CourseModule>,
        evaluation: Option<FinalEvaluation>,
    ) -> Result<Self, CourseError> {
        if modules.is_empty() {
            return Err(CourseError::NoModules);
        }

        let mut module_ids = HashSet::new();
        let mut lesson_ids = HashSet::new();
        for module in &modules {
            if !module_ids.insert(module.id()) {
                return Err(CourseError::DuplicateModuleId(module.id()));
            }
            for lesson in module.lessons() {
                if !lesson_ids.insert(lesson.id()) {
                    return Err(CourseError::DuplicateLessonId(lesson.id()));
                }
            }
        }

        Ok(Self {
            modules,
            evaluation,
        })
    }

    /// Modules in presentation order.
    #[must_use]
    pub fn modules(&self) -> &[CourseModule] {
        &self.modules
    }

    #[must_use]
    pub fn evaluation(&self) -> Option<&FinalEvaluation> {
        self.evaluation.as_ref()
    }

    #[must_use]
    pub fn module(&self, id: ModuleId) -> Option<&CourseModule> {
        self.modules.iter().find(|m| m.id() == id)
    }

    /// All lessons across all modules, in course order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.modules.iter().flat_map(|m| m.lessons().iter())
    }

    #[must_use]
    pub fn lesson_count(&self) -> usize {
        self.modules.iter().map(|m| m.lessons().len()).sum()
    }

    #[must_use]
    pub fn total_duration_minutes(&self) -> u64 {
        self.lessons()
            .map(|l| u64::from(l.duration_minutes()))
            .sum()
    }

    #[must_use]
    pub fn find_lesson(&self, id: LessonId) -> Option<&Lesson> {
        self.lessons().find(|l| l.id() == id)
    }

    /// The module containing `lesson`, if the lesson belongs to this course.
    #[must_use]
    pub fn module_of_lesson(&self, lesson: LessonId) -> Option<&CourseModule> {
        self.modules
            .iter()
            .find(|m| m.lessons().iter().any(|l| l.id() == lesson))
    }

    #[must_use]
    pub fn first_lesson(&self) -> &Lesson {
        self.modules[0].first_lesson()
    }

    /// The lesson that follows `lesson` in course order, crossing module
    /// boundaries. Returns `None` for the last lesson of the course.
    #[must_use]
    pub fn next_lesson_after(&self, lesson: LessonId) -> Option<&Lesson> {
        let mut all = self.lessons();
        all.find(|l| l.id() == lesson)?;
        all.next()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson(id: u64, module: u64, order: u32, minutes: u32) -> Lesson {
        Lesson::new(
            LessonId::new(id),
            ModuleId::new(module),
            order,
            minutes,
        )
    }

    #[test]
    fn module_sorts_lessons_by_order_index() {
        let module = CourseModule::new(
            ModuleId::new(1),
            vec![lesson(2, 1, 1, 10), lesson(1, 1, 0, 10)],
            None,
        )
        .unwrap();

        let ids: Vec<_> = module.lessons().iter().map(Lesson::id).collect();
        assert_eq!(ids, vec![LessonId::new(1), LessonId::new(2)]);
    }

    #[test]
    fn empty_module_is_rejected() {
        let err = CourseModule::new(ModuleId::new(1), Vec::new(), None).unwrap_err();
        assert!(matches!(err, CourseError::EmptyModule(_)));
    }

    #[test]
    fn lesson_module_mismatch_is_rejected() {
        let err = CourseModule::new(ModuleId::new(1), vec![lesson(1, 2, 0, 10)], None).unwrap_err();
        assert!(matches!(err, CourseError::LessonModuleMismatch { .. }));
    }

    #[test]
    fn duplicate_lesson_ids_are_rejected() {
        let a = CourseModule::new(ModuleId::new(1), vec![lesson(1, 1, 0, 10)], None).unwrap();
        let b = CourseModule::new(ModuleId::new(2), vec![lesson(1, 2, 0, 10)], None).unwrap();
        let err = CourseDefinition::new(vec![a, b], None).unwrap_err();
        assert!(matches!(err, CourseError::DuplicateLessonId(_)));
    }

    #[test]
    fn next_lesson_crosses_module_boundary() {
        let a = CourseModule::new(
            ModuleId::new(1),
            vec![lesson(1, 1, 0, 10), lesson(2, 1, 1, 10)],
            None,
        )
        .unwrap();
        let b = CourseModule::new(ModuleId::new(2), vec![lesson(3, 2, 0, 10)], None).unwrap();
        let course = CourseDefinition::new(vec![a, b], None).unwrap();

        let next = course.next_lesson_after(LessonId::new(2)).unwrap();
        assert_eq!(next.id(), LessonId::new(3));
        assert!(course.next_lesson_after(LessonId::new(3)).is_none());
    }

    #[test]
    fn total_duration_sums_all_lessons() {
        let a = CourseModule::new(
            ModuleId::new(1),
            vec![lesson(1, 1, 0, 10), lesson(2, 1, 1, 20)],
            None,
        )
        .unwrap();
        let b = CourseModule::new(ModuleId::new(2), vec![lesson(3, 2, 0, 30)], None).unwrap();
        let course = CourseDefinition::new(vec![a, b], None).unwrap();

        assert_eq!(course.total_duration_minutes(), 60);
        assert_eq!(course.lesson_count(), 3);
    }

    #[test]
    fn evaluation_requires_positive_attempts() {
        let err = FinalEvaluation::new(EvaluationId::new(1), 0, 70.0).unwrap_err();
        assert!(matches!(err, CourseError::NoAttemptsAllowed));
    }
}
