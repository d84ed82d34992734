#![forbid(unsafe_code)]

//! Boundary contracts for the progress backend: wire types, the
//! [`ProgressApi`] trait, an HTTP client, and a scripted in-memory fake.

pub mod client;
pub mod http;
pub mod memory;
pub mod types;

pub use client::{ApiError, ProgressApi};
pub use http::{HttpProgressApi, ProgressApiConfig};
pub use memory::{InMemoryProgressApi, ScriptedCompletion};
pub use types::{
    Answer, AnswerSheet, AttemptRow, CompleteLessonResponse, EnrollmentProgress,
    EvaluationOutcome, LessonRow, LessonRowStatus, ModuleRow, ProgressSnapshot, ProgressSummary,
    QuestionResult, QuizOutcome,
};
