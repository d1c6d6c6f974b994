use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::error::GradingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Calculation,
    LongAnswer,
    FillBlank,
    Matching,
    Any,
}

impl QuestionType {
    pub const ALL: [QuestionType; 8] = [
        QuestionType::MultipleChoice,
        QuestionType::TrueFalse,
        QuestionType::ShortAnswer,
        QuestionType::Calculation,
        QuestionType::LongAnswer,
        QuestionType::FillBlank,
        QuestionType::Matching,
        QuestionType::Any,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multipleChoice",
            QuestionType::TrueFalse => "trueFalse",
            QuestionType::ShortAnswer => "shortAnswer",
            QuestionType::Calculation => "calculation",
            QuestionType::LongAnswer => "longAnswer",
            QuestionType::FillBlank => "fillBlank",
            QuestionType::Matching => "matching",
            QuestionType::Any => "any",
        }
    }

    /// Discrete-choice types get no partial credit from the local matcher.
    pub fn is_strict(&self) -> bool {
        matches!(self, QuestionType::MultipleChoice | QuestionType::TrueFalse)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionType {
    type Err = GradingError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        // Accept both camelCase tags and their snake_case spelling
        let compact: String = trimmed
            .chars()
            .filter(|c| *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();

        QuestionType::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str().to_ascii_lowercase() == compact)
            .ok_or_else(|| GradingError::InvalidQuestionType(trimmed.to_string()))
    }
}

impl<'de> Deserialize<'de> for QuestionType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// A question as handed to the grader. Owned by the caller, never mutated here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct Question {
    #[validate(length(min = 1, max = 128))]
    pub id: String,
    #[validate(length(max = 20000))]
    pub text: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[validate(length(max = 10000))]
    pub correct_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 26))]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0))]
    pub points: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 256))]
    pub subject: Option<String>,
}

impl Question {
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        question_type: QuestionType,
        correct_answer: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            question_type,
            correct_answer: correct_answer.into(),
            options: None,
            points: None,
            subject: None,
        }
    }

    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    pub fn with_points(mut self, points: f64) -> Self {
        self.points = Some(points);
        self
    }

    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn subject_or_default(&self) -> &str {
        self.subject.as_deref().unwrap_or("")
    }
}
