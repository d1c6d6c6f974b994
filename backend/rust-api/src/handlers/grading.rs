use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;

use crate::{
    extractors::ValidatedJson,
    models::grading::{
        BatchGradeRequest, BatchGradeResponse, GradeAnswerRequest, GradeAnswerResponse,
        MatchAnswerRequest, NormalizeRequest, NormalizeResponse,
    },
    services::{answer_matcher::match_answers, answer_normalizer::normalize, AppState},
};

/// POST /api/v1/grade
pub async fn grade_answer(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<GradeAnswerRequest>,
) -> impl IntoResponse {
    tracing::info!(
        "Grading answer for question={}, type={}",
        req.question.id,
        req.question.question_type
    );

    let outcome = state
        .grading_policy
        .grade_with_details(&req.question, &req.answer)
        .await;

    (
        StatusCode::OK,
        Json(GradeAnswerResponse::new(&req.question, &outcome)),
    )
}

/// POST /api/v1/grade/batch
pub async fn grade_batch(
    State(state): State<Arc<AppState>>,
    ValidatedJson(req): ValidatedJson<BatchGradeRequest>,
) -> impl IntoResponse {
    tracing::info!("Grading batch of {} answers", req.submissions.len());

    let submissions: Vec<_> = req
        .submissions
        .into_iter()
        .map(|submission| (submission.question, submission.answer))
        .collect();

    let outcomes = state.grading_policy.grade_batch(&submissions).await;

    let results = submissions
        .iter()
        .zip(outcomes.iter())
        .map(|((question, _), outcome)| GradeAnswerResponse::new(question, outcome))
        .collect();

    (StatusCode::OK, Json(BatchGradeResponse { results }))
}

/// POST /api/v1/match - local matcher only, never calls the AI grader
pub async fn match_answer(
    ValidatedJson(req): ValidatedJson<MatchAnswerRequest>,
) -> impl IntoResponse {
    let result = match_answers(
        &req.user_answer,
        &req.correct_answer,
        req.question_type,
        req.options.as_deref(),
    );
    (StatusCode::OK, Json(result))
}

/// POST /api/v1/normalize
pub async fn normalize_answer(
    ValidatedJson(req): ValidatedJson<NormalizeRequest>,
) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(NormalizeResponse {
            normalized: normalize(&req.answer),
        }),
    )
}
