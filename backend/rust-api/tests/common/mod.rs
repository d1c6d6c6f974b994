#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use studyai_grading::{
    config::{AiGradingConfig, Config},
    create_router,
    models::grading::{AiGradingRequest, AiGradingResponse},
    services::{
        ai_grading_client::{AiGradingError, AiGrader},
        AppState,
    },
};
use tower::ServiceExt;

/// Grader that answers every request with the same canned verdict.
pub struct StubGrader {
    response: Option<AiGradingResponse>,
    calls: AtomicUsize,
}

impl StubGrader {
    pub fn answering(is_correct: bool, score: f64, feedback: &str) -> Self {
        Self {
            response: Some(AiGradingResponse {
                is_correct,
                score,
                feedback: feedback.to_string(),
            }),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiGrader for StubGrader {
    async fn grade(
        &self,
        _request: &AiGradingRequest,
    ) -> Result<AiGradingResponse, AiGradingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response
            .clone()
            .ok_or_else(|| AiGradingError::MalformedResponse("stub failure".into()))
    }
}

pub fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1:0".to_string(),
        ai_grading: AiGradingConfig::default(),
    }
}

pub fn create_test_app(grader: Arc<StubGrader>) -> Router {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();

    let app_state = Arc::new(AppState::with_grader(test_config(), grader));
    create_router(app_state)
}

pub async fn post_json(
    app: Router,
    uri: &str,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_string(&body).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}
