//! Two-tier grading: exact matches are settled locally, everything else goes
//! to the AI grader, and a failed AI call degrades to the local match score.

use futures::future::join_all;
use std::sync::Arc;

use super::ai_grading_client::AiGrader;
use super::answer_matcher::match_question;
use crate::metrics::{record_grade, record_match};
use crate::models::grading::{
    AiGradingRequest, AiGradingResponse, GradeResult, GradeSource, GradingOutcome, MatchResult,
    AI_UNAVAILABLE_FEEDBACK, EXACT_MATCH_FEEDBACK,
};
use crate::models::question::Question;

#[derive(Clone)]
pub struct GradingPolicy {
    ai_grader: Arc<dyn AiGrader>,
}

impl GradingPolicy {
    pub fn new(ai_grader: Arc<dyn AiGrader>) -> Self {
        Self { ai_grader }
    }

    /// Grade one answer. Never fails: AI errors are absorbed into a local estimate.
    pub async fn grade(&self, question: &Question, candidate_answer: &str) -> GradeResult {
        self.grade_with_details(question, candidate_answer)
            .await
            .grade
    }

    pub async fn grade_with_details(
        &self,
        question: &Question,
        candidate_answer: &str,
    ) -> GradingOutcome {
        let local_match = match_question(candidate_answer, question);
        record_match(local_match.method);

        let outcome = if local_match.is_exact_match {
            GradingOutcome {
                grade: GradeResult::correct(EXACT_MATCH_FEEDBACK, true),
                local_match,
                source: GradeSource::Instant,
            }
        } else {
            self.escalate(question, candidate_answer, local_match).await
        };

        record_grade(outcome.source, outcome.grade.is_correct());
        tracing::info!(
            "Answer graded: question={}, type={}, source={}, method={}, correct={}, credit={:.3}",
            question.id,
            question.question_type,
            outcome.source.as_str(),
            local_match.method,
            outcome.grade.is_correct(),
            outcome.grade.partial_credit()
        );

        outcome
    }

    /// Grade independent submissions concurrently; results keep input order.
    pub async fn grade_batch(&self, submissions: &[(Question, String)]) -> Vec<GradingOutcome> {
        join_all(
            submissions
                .iter()
                .map(|(question, answer)| self.grade_with_details(question, answer)),
        )
        .await
    }

    async fn escalate(
        &self,
        question: &Question,
        candidate_answer: &str,
        local_match: MatchResult,
    ) -> GradingOutcome {
        let request = AiGradingRequest::for_question(question, candidate_answer);

        match self.ai_grader.grade(&request).await {
            Ok(response) => GradingOutcome {
                grade: merge_ai_response(response),
                local_match,
                source: GradeSource::Ai,
            },
            Err(e) => {
                tracing::warn!(
                    "AI grading failed for question={}, using local estimate: {}",
                    question.id,
                    e
                );
                GradingOutcome {
                    grade: GradeResult::partial(local_match.score, AI_UNAVAILABLE_FEEDBACK, false),
                    local_match,
                    source: GradeSource::LocalFallback,
                }
            }
        }
    }
}

fn merge_ai_response(response: AiGradingResponse) -> GradeResult {
    if response.is_correct {
        if response.score < 1.0 {
            tracing::debug!(
                "AI grader marked answer correct with score {}, awarding full credit",
                response.score
            );
        }
        GradeResult::correct(response.feedback, false)
    } else {
        GradeResult::partial(response.score, response.feedback, false)
    }
}
