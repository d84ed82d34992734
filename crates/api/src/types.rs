//! Wire types for the progress backend.
//!
//! Field names follow the backend's camelCase JSON. These structs are the
//! only shapes the engine ever reads off the wire.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use course_core::model::{AttemptId, EvaluationAttempt, LessonId, ModuleId};

//
// ─── HYDRATION ─────────────────────────────────────────────────────────────────
//

/// Authoritative progress snapshot for one enrollment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub summary: ProgressSummary,
    #[serde(default)]
    pub lesson_rows: Vec<LessonRow>,
    #[serde(default)]
    pub module_rows: Vec<ModuleRow>,
    pub enrollment: EnrollmentProgress,
}

impl ProgressSnapshot {
    /// The server-reported percentage the aggregator should trust.
    ///
    /// The enrollment row wins; the summary value is the fallback.
    #[must_use]
    pub fn server_hint(&self) -> Option<f64> {
        self.enrollment
            .progress_percentage
            .or(self.summary.progress_percentage)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    #[serde(default)]
    pub progress_percentage: Option<f64>,
    #[serde(default)]
    pub next_lesson_id: Option<LessonId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentProgress {
    #[serde(default)]
    pub progress_percentage: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonRow {
    pub lesson_id: LessonId,
    pub status: LessonRowStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LessonRowStatus {
    NotStarted,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRow {
    pub module_id: ModuleId,
    pub total_lessons: u32,
    pub completed_lessons: u32,
}

//
// ─── COMPLETION ────────────────────────────────────────────────────────────────
//

/// Response to a lesson completion call.
///
/// `success: false` inside a 200 response is a logical failure and must be
/// treated exactly like a transport failure by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteLessonResponse {
    pub success: bool,
    #[serde(default)]
    pub unlocked_lesson_id: Option<LessonId>,
}

//
// ─── QUIZ / EVALUATION ─────────────────────────────────────────────────────────
//

/// Answers for a quiz or evaluation submission: selected option ids per
/// question.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSheet {
    pub answers: Vec<Answer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: u64,
    pub selected_option_ids: Vec<u64>,
}

impl AnswerSheet {
    #[must_use]
    pub fn single_choice(picks: &[(u64, u64)]) -> Self {
        Self {
            answers: picks
                .iter()
                .map(|(question_id, option_id)| Answer {
                    question_id: *question_id,
                    selected_option_ids: vec![*option_id],
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizOutcome {
    pub passed: bool,
    pub percentage: f64,
    pub score: f64,
    pub total_points: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationOutcome {
    pub passed: bool,
    pub percentage: f64,
    pub certificate_eligible: bool,
    #[serde(default)]
    pub question_results: Vec<QuestionResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionResult {
    pub question_id: u64,
    pub correct: bool,
}

//
// ─── ATTEMPTS ──────────────────────────────────────────────────────────────────
//

/// One row of the evaluation attempt listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptRow {
    pub id: AttemptId,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub percentage: f64,
    pub passed: bool,
}

impl AttemptRow {
    #[must_use]
    pub fn into_attempt(self) -> EvaluationAttempt {
        EvaluationAttempt {
            id: self.id,
            completed_at: self.completed_at,
            percentage: self.percentage,
            passed: self.passed,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_hint_prefers_enrollment_row() {
        let snapshot = ProgressSnapshot {
            summary: ProgressSummary {
                progress_percentage: Some(40.0),
                next_lesson_id: None,
            },
            lesson_rows: Vec::new(),
            module_rows: Vec::new(),
            enrollment: EnrollmentProgress {
                progress_percentage: Some(55.0),
            },
        };
        assert_eq!(snapshot.server_hint(), Some(55.0));
    }

    #[test]
    fn server_hint_falls_back_to_summary() {
        let snapshot = ProgressSnapshot {
            summary: ProgressSummary {
                progress_percentage: Some(40.0),
                next_lesson_id: None,
            },
            lesson_rows: Vec::new(),
            module_rows: Vec::new(),
            enrollment: EnrollmentProgress {
                progress_percentage: None,
            },
        };
        assert_eq!(snapshot.server_hint(), Some(40.0));
    }

    #[test]
    fn snapshot_decodes_camel_case() {
        let json = r#"{
            "summary": { "progressPercentage": 25.0, "nextLessonId": 7 },
            "lessonRows": [
                { "lessonId": 1, "status": "completed" },
                { "lessonId": 7, "status": "in_progress" }
            ],
            "moduleRows": [
                { "moduleId": 3, "totalLessons": 4, "completedLessons": 1 }
            ],
            "enrollment": { "progressPercentage": 25.0 }
        }"#;

        let snapshot: ProgressSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.summary.next_lesson_id, Some(LessonId::new(7)));
        assert_eq!(snapshot.lesson_rows[0].status, LessonRowStatus::Completed);
        assert_eq!(snapshot.module_rows[0].module_id, ModuleId::new(3));
    }

    #[test]
    fn completion_response_defaults_unlocked_id() {
        let response: CompleteLessonResponse =
            serde_json::from_str(r#"{ "success": true }"#).unwrap();
        assert!(response.success);
        assert!(response.unlocked_lesson_id.is_none());
    }
}
