use std::env;

use async_trait::async_trait;
use reqwest::Client;

use course_core::model::{EnrollmentId, EvaluationId, LessonId, ModuleId};

use crate::client::{ApiError, ProgressApi};
use crate::types::{
    AnswerSheet, AttemptRow, CompleteLessonResponse, EvaluationOutcome, ProgressSnapshot,
    QuizOutcome,
};

#[derive(Clone, Debug)]
pub struct ProgressApiConfig {
    pub base_url: String,
    pub bearer_token: Option<String>,
}

impl ProgressApiConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            bearer_token: None,
        }
    }

    #[must_use]
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Reads `COURSE_API_BASE_URL` and optional `COURSE_API_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("COURSE_API_BASE_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        Some(Self {
            base_url,
            bearer_token: env::var("COURSE_API_TOKEN").ok(),
        })
    }
}

/// `reqwest`-backed implementation of [`ProgressApi`].
#[derive(Clone)]
pub struct HttpProgressApi {
    client: Client,
    config: ProgressApiConfig,
}

impl HttpProgressApi {
    #[must_use]
    pub fn new(config: ProgressApiConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.config.base_url.trim_end_matches('/'))
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.bearer_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }

    async fn post_json<B: serde::Serialize + ?Sized, T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ApiError::HttpStatus(response.status()));
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ProgressApi for HttpProgressApi {
    async fn fetch_progress(
        &self,
        enrollment: EnrollmentId,
    ) -> Result<ProgressSnapshot, ApiError> {
        self.get_json(&format!("enrollments/{enrollment}/progress"))
            .await
    }

    async fn complete_lesson(
        &self,
        enrollment: EnrollmentId,
        lesson: LessonId,
    ) -> Result<CompleteLessonResponse, ApiError> {
        self.post_json(
            &format!("enrollments/{enrollment}/lessons/{lesson}/complete"),
            &serde_json::json!({}),
        )
        .await
    }

    async fn submit_module_quiz(
        &self,
        enrollment: EnrollmentId,
        module: ModuleId,
        answers: &AnswerSheet,
    ) -> Result<QuizOutcome, ApiError> {
        self.post_json(
            &format!("enrollments/{enrollment}/modules/{module}/quiz"),
            answers,
        )
        .await
    }

    async fn submit_evaluation(
        &self,
        evaluation: EvaluationId,
        answers: &AnswerSheet,
    ) -> Result<EvaluationOutcome, ApiError> {
        self.post_json(&format!("evaluations/{evaluation}/submit"), answers)
            .await
    }

    async fn list_evaluation_attempts(
        &self,
        enrollment: EnrollmentId,
    ) -> Result<Vec<AttemptRow>, ApiError> {
        self.get_json(&format!("enrollments/{enrollment}/evaluation-attempts"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_without_double_slash() {
        let api = HttpProgressApi::new(ProgressApiConfig::new("https://lms.example/api/"));
        assert_eq!(
            api.url("enrollments/1/progress"),
            "https://lms.example/api/enrollments/1/progress"
        );
    }
}
