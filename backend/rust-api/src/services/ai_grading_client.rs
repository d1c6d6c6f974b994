use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;

use crate::config::AiGradingConfig;
use crate::metrics::{AI_GRADING_DURATION_SECONDS, AI_GRADING_REQUESTS_TOTAL};
use crate::models::grading::{AiGradingRequest, AiGradingResponse};
use crate::utils::retry::{retry_async_with_config, RetryConfig};

#[derive(Debug, Error)]
pub enum AiGradingError {
    #[error("AI grading request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI grading service returned status: {0}")]
    Status(reqwest::StatusCode),

    #[error("Invalid AI grading response: {0}")]
    MalformedResponse(String),

    #[error("AI grading is disabled")]
    Disabled,
}

impl AiGradingError {
    fn label(&self) -> &'static str {
        match self {
            AiGradingError::Transport(e) if e.is_timeout() => "timeout",
            AiGradingError::Transport(_) => "transport",
            AiGradingError::Status(_) => "status",
            AiGradingError::MalformedResponse(_) => "malformed",
            AiGradingError::Disabled => "disabled",
        }
    }
}

/// External grader consulted when the local matcher cannot settle an answer.
#[async_trait]
pub trait AiGrader: Send + Sync {
    async fn grade(&self, request: &AiGradingRequest)
        -> Result<AiGradingResponse, AiGradingError>;
}

/// Grades through the AI grading HTTP service (`POST {url}/v1/grading`).
pub struct HttpAiGrader {
    http_client: Client,
    api_url: String,
    retry: RetryConfig,
}

impl HttpAiGrader {
    pub fn new(config: &AiGradingConfig) -> Result<Self, AiGradingError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http_client: builder.build()?,
            api_url: config.url.trim_end_matches('/').to_string(),
            retry: RetryConfig::with_attempts(config.max_attempts),
        })
    }

    async fn send(&self, request: &AiGradingRequest) -> Result<AiGradingResponse, AiGradingError> {
        let url = format!("{}/v1/grading", self.api_url);

        let response = self.http_client.post(&url).json(request).send().await?;

        if !response.status().is_success() {
            return Err(AiGradingError::Status(response.status()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AiGradingError::MalformedResponse(e.to_string()))?;

        parse_grading_body(&body)
    }
}

#[async_trait]
impl AiGrader for HttpAiGrader {
    async fn grade(
        &self,
        request: &AiGradingRequest,
    ) -> Result<AiGradingResponse, AiGradingError> {
        let start = std::time::Instant::now();
        let result = retry_async_with_config(self.retry.clone(), || self.send(request)).await;

        AI_GRADING_DURATION_SECONDS.observe(start.elapsed().as_secs_f64());
        let status = match &result {
            Ok(_) => "success",
            Err(e) => e.label(),
        };
        AI_GRADING_REQUESTS_TOTAL.with_label_values(&[status]).inc();

        result
    }
}

/// Stand-in used when AI grading is switched off; every answer falls back locally.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledAiGrader;

#[async_trait]
impl AiGrader for DisabledAiGrader {
    async fn grade(
        &self,
        _request: &AiGradingRequest,
    ) -> Result<AiGradingResponse, AiGradingError> {
        AI_GRADING_REQUESTS_TOTAL
            .with_label_values(&["disabled"])
            .inc();
        Err(AiGradingError::Disabled)
    }
}

fn parse_grading_body(body: &serde_json::Value) -> Result<AiGradingResponse, AiGradingError> {
    let is_correct = body["is_correct"]
        .as_bool()
        .ok_or_else(|| AiGradingError::MalformedResponse("missing boolean is_correct".into()))?;

    let score = body["score"]
        .as_f64()
        .filter(|score| score.is_finite())
        .ok_or_else(|| AiGradingError::MalformedResponse("missing numeric score".into()))?;

    let feedback = body["feedback"]
        .as_str()
        .ok_or_else(|| AiGradingError::MalformedResponse("missing feedback text".into()))?
        .to_string();

    Ok(AiGradingResponse {
        is_correct,
        score,
        feedback,
    })
}
