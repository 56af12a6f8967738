//! Natural-language summaries of student records.
//!
//! The generator is an external collaborator: it may be slow, unavailable, or misbehave. Callers
//! go through [`summarize_or_fallback`], which never fails and instead embeds the failure reason
//! in the returned text. The Ollama-backed client issues HTTP requests directly to the runtime.

use crate::config::{Config, SummarizationProvider};
use crate::roster::Student;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Errors surfaced while attempting to summarize a student.
#[derive(Debug, Error)]
pub enum SummarizationClientError {
    /// Provider was explicitly disabled or unreachable.
    #[error("Summarization provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by summary backends.
#[async_trait]
pub trait SummarizationClient: Send + Sync {
    /// Produce a short third-person description of `student`.
    async fn summarize(&self, student: &Student) -> Result<String, SummarizationClientError>;
}

/// Outcome of [`summarize_or_fallback`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SummaryText {
    /// Text produced by the backend.
    Generated(String),
    /// Fallback message carrying the failure reason.
    Fallback(String),
}

impl SummaryText {
    /// Whether the backend failed and the fallback was used.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Consume the outcome, returning the text sent to clients.
    pub fn into_text(self) -> String {
        match self {
            Self::Generated(text) | Self::Fallback(text) => text,
        }
    }
}

/// Summarize `student`, converting any backend failure into a fallback message.
pub async fn summarize_or_fallback(
    client: &dyn SummarizationClient,
    student: &Student,
) -> SummaryText {
    match client.summarize(student).await {
        Ok(text) => SummaryText::Generated(text),
        Err(error) => {
            tracing::warn!(
                student_id = student.id,
                error = %error,
                "Summary generation failed; returning fallback text"
            );
            SummaryText::Fallback(format!("Error generating summary: {error}"))
        }
    }
}

/// Assemble the prompt sent to the text-generation model.
pub fn build_student_prompt(student: &Student) -> String {
    format!(
        "Generate a short summary for this student:\n\
         Name: {}\n\
         Age: {}\n\
         Email: {}\n\n\
         The summary should be concise, grounded and written in third person.\n\
         The summary should only use Name, Age and Email. Do not add facts that are not listed.\n\
         Keep the summary fluent.",
        student.name, student.age, student.email
    )
}

/// Build a summarization client based on configuration.
pub fn build_summarization_client(
    config: &Config,
) -> Result<Arc<dyn SummarizationClient>, SummarizationClientError> {
    match config.summarization_provider {
        SummarizationProvider::None => Ok(Arc::new(DisabledSummarizationClient)),
        SummarizationProvider::Ollama => {
            let base_url = config
                .ollama_url
                .clone()
                .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string());
            let timeout = config.summarization_timeout_secs.map(Duration::from_secs);
            Ok(Arc::new(OllamaSummarizationClient::new(
                base_url,
                config.summarization_model.clone(),
                timeout,
            )?))
        }
    }
}

/// Client used when summaries are switched off.
pub struct DisabledSummarizationClient;

#[async_trait]
impl SummarizationClient for DisabledSummarizationClient {
    async fn summarize(&self, _student: &Student) -> Result<String, SummarizationClientError> {
        Err(SummarizationClientError::ProviderUnavailable(
            "summarization is disabled".into(),
        ))
    }
}

/// Summary backend talking to an Ollama runtime over `/api/generate`.
pub struct OllamaSummarizationClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaSummarizationClient {
    /// Construct a client for `base_url`, optionally bounding each request by `timeout`.
    pub fn new(
        base_url: String,
        model: String,
        timeout: Option<Duration>,
    ) -> Result<Self, SummarizationClientError> {
        let mut builder = Client::builder().user_agent("rusty-roster/summary");
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(|error| {
            SummarizationClientError::ProviderUnavailable(format!(
                "failed to construct HTTP client: {error}"
            ))
        })?;
        Ok(Self {
            http,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
    done: bool,
}

#[async_trait]
impl SummarizationClient for OllamaSummarizationClient {
    async fn summarize(&self, student: &Student) -> Result<String, SummarizationClientError> {
        let payload = json!({
            "model": self.model,
            "prompt": build_student_prompt(student),
            "stream": false,
            "options": {
                "temperature": 0.1,
            }
        });

        tracing::debug!(student_id = student.id, model = %self.model, "Requesting summary");
        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummarizationClientError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummarizationClientError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummarizationClientError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: OllamaResponse = response.json().await.map_err(|error| {
            SummarizationClientError::InvalidResponse(format!(
                "failed to decode Ollama response: {error}"
            ))
        })?;

        if !body.done {
            return Err(SummarizationClientError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}
