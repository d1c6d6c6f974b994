use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use super::question::{Question, QuestionType};

pub const EXACT_MATCH_FEEDBACK: &str = "Correct! Your answer matches exactly.";
pub const AI_UNAVAILABLE_FEEDBACK: &str = "AI grading unavailable, using local estimate.";

/// Which heuristic produced a match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchMethod {
    Exact,
    Numerical,
    NumericalPartial,
    SubstringUserInCorrect,
    SubstringCorrectInUser,
    Keyword,
    Fuzzy,
    Strict,
    None,
}

impl MatchMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchMethod::Exact => "exact",
            MatchMethod::Numerical => "numerical",
            MatchMethod::NumericalPartial => "numerical-partial",
            MatchMethod::SubstringUserInCorrect => "substring-user-in-correct",
            MatchMethod::SubstringCorrectInUser => "substring-correct-in-user",
            MatchMethod::Keyword => "keyword",
            MatchMethod::Fuzzy => "fuzzy",
            MatchMethod::Strict => "strict",
            MatchMethod::None => "none",
        }
    }
}

impl fmt::Display for MatchMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub score: f64,
    pub is_exact_match: bool,
    pub method: MatchMethod,
}

impl MatchResult {
    pub fn exact() -> Self {
        Self {
            score: 1.0,
            is_exact_match: true,
            method: MatchMethod::Exact,
        }
    }

    pub fn scored(score: f64, method: MatchMethod) -> Self {
        Self {
            score: score.clamp(0.0, 1.0),
            is_exact_match: false,
            method,
        }
    }

    pub fn no_match(method: MatchMethod) -> Self {
        Self::scored(0.0, method)
    }
}

/// Final verdict for one submitted answer.
///
/// Fields are private so that `is_correct` always implies full credit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeResult {
    is_correct: bool,
    partial_credit: f64,
    feedback: String,
    instant: bool,
}

impl GradeResult {
    pub fn correct(feedback: impl Into<String>, instant: bool) -> Self {
        Self {
            is_correct: true,
            partial_credit: 1.0,
            feedback: feedback.into(),
            instant,
        }
    }

    pub fn partial(partial_credit: f64, feedback: impl Into<String>, instant: bool) -> Self {
        let credit = if partial_credit.is_finite() {
            partial_credit.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            is_correct: false,
            partial_credit: credit,
            feedback: feedback.into(),
            instant,
        }
    }

    pub fn is_correct(&self) -> bool {
        self.is_correct
    }

    pub fn partial_credit(&self) -> f64 {
        self.partial_credit
    }

    pub fn feedback(&self) -> &str {
        &self.feedback
    }

    pub fn instant(&self) -> bool {
        self.instant
    }
}

/// Payload sent to the external AI grader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGradingRequest {
    pub question_text: String,
    pub candidate_answer: String,
    pub subject: String,
    pub question_type: QuestionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    pub deep_reasoning: bool,
    /// Never populated by this service.
    pub image_context: Option<String>,
}

impl AiGradingRequest {
    pub fn for_question(question: &Question, candidate_answer: &str) -> Self {
        Self {
            question_text: question.text.clone(),
            candidate_answer: candidate_answer.to_string(),
            subject: question.subject_or_default().to_string(),
            question_type: question.question_type,
            options: question.options.clone(),
            deep_reasoning: true,
            image_context: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiGradingResponse {
    pub is_correct: bool,
    pub score: f64,
    pub feedback: String,
}

// HTTP boundary types

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct GradeAnswerRequest {
    #[validate(nested)]
    pub question: Question,
    #[validate(length(max = 10000))]
    pub answer: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BatchGradeRequest {
    #[validate(length(min = 1, max = 100), nested)]
    pub submissions: Vec<GradeAnswerRequest>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GradeAnswerResponse {
    pub question_id: String,
    pub is_correct: bool,
    pub partial_credit: f64,
    pub feedback: String,
    pub instant: bool,
    pub match_method: MatchMethod,
    pub match_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_awarded: Option<f64>,
    pub graded_at: DateTime<Utc>,
}

impl GradeAnswerResponse {
    pub fn new(question: &Question, outcome: &GradingOutcome) -> Self {
        let grade = &outcome.grade;
        Self {
            question_id: question.id.clone(),
            is_correct: grade.is_correct(),
            partial_credit: grade.partial_credit(),
            feedback: grade.feedback().to_string(),
            instant: grade.instant(),
            match_method: outcome.local_match.method,
            match_score: outcome.local_match.score,
            points_awarded: question.points.map(|points| points * grade.partial_credit()),
            graded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BatchGradeResponse {
    pub results: Vec<GradeAnswerResponse>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct MatchAnswerRequest {
    #[validate(length(max = 10000))]
    pub user_answer: String,
    #[validate(length(max = 10000))]
    pub correct_answer: String,
    pub question_type: QuestionType,
    #[serde(default)]
    #[validate(length(max = 26))]
    pub options: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NormalizeRequest {
    #[validate(length(max = 10000))]
    pub answer: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub normalized: String,
}

/// Grade plus the local match that led to it.
#[derive(Debug, Clone, PartialEq)]
pub struct GradingOutcome {
    pub grade: GradeResult,
    pub local_match: MatchResult,
    pub source: GradeSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradeSource {
    Instant,
    Ai,
    LocalFallback,
}

impl GradeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GradeSource::Instant => "instant",
            GradeSource::Ai => "ai",
            GradeSource::LocalFallback => "fallback",
        }
    }
}
