mod course;
mod ids;
mod progress;

pub use course::{
    CourseDefinition, CourseError, CourseModule, FinalEvaluation, Lesson, ModuleQuiz,
};
pub use ids::{AttemptId, EnrollmentId, EvaluationId, LessonId, ModuleId, ParseIdError, QuizId};
pub use progress::{EvaluationAttempt, ProgressRecord};
