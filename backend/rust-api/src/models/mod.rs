pub mod grading;
pub mod question;

pub use grading::{GradeResult, MatchMethod, MatchResult};
pub use question::{Question, QuestionType};
