//! Local answer matching.
//!
//! Strategies run in a fixed order and the first one that applies decides
//! the score:
//! - exact string equality after normalization
//! - strict types (multiple choice, true/false) get nothing for near misses
//! - numeric comparison with a small absolute tolerance
//! - substring containment either way
//! - keyword coverage of the reference answer
//! - Levenshtein similarity for typos, skipped for answers longer than
//!   `FUZZY_MAX_CHARS` since edit distance is quadratic

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

use super::answer_normalizer::normalize;
use crate::models::grading::{MatchMethod, MatchResult};
use crate::models::question::{Question, QuestionType};

pub const NUMERIC_TOLERANCE: f64 = 0.0001;
const NUMERICAL_SCORE: f64 = 0.95;
const NUMERICAL_PARTIAL_THRESHOLD: f64 = 0.5;
const SUBSTRING_USER_IN_CORRECT_SCORE: f64 = 0.9;
const SUBSTRING_CORRECT_IN_USER_SCORE: f64 = 0.85;
const SUBSTRING_MIN_LEN: usize = 3;
const KEYWORD_THRESHOLD: f64 = 0.7;
const KEYWORD_WEIGHT: f64 = 0.7;
const FUZZY_THRESHOLD: f64 = 0.7;
const FUZZY_BASE: f64 = 0.5;
const FUZZY_CAP: f64 = 0.8;
/// Longest answer, in chars, that is still compared by edit distance.
pub const FUZZY_MAX_CHARS: usize = 1000;

static STOPWORDS: &[&str] = &[
    "the", "and", "or", "in", "on", "at", "to", "for", "of", "with", "is", "are", "was", "were",
    "be", "been", "being",
];

lazy_static! {
    static ref NUMBER: Regex = Regex::new(r"-?\d+\.?\d*").unwrap();
}

/// Match a candidate against a question's reference answer.
pub fn match_question(user_answer: &str, question: &Question) -> MatchResult {
    match_answers(
        user_answer,
        &question.correct_answer,
        question.question_type,
        question.options.as_deref(),
    )
}

/// Match a candidate against a reference answer for the given question type.
///
/// `options` is accepted for multiple-choice callers but does not influence
/// the score: an option letter is not resolved to its text.
pub fn match_answers(
    user_answer: &str,
    correct_answer: &str,
    question_type: QuestionType,
    options: Option<&[String]>,
) -> MatchResult {
    let user = normalize(user_answer);
    let correct = normalize(correct_answer);

    let result = match_normalized(&user, &correct, question_type);
    tracing::debug!(
        "Matched answer: type={}, options={}, method={}, score={:.4}",
        question_type,
        options.map_or(0, <[String]>::len),
        result.method,
        result.score
    );
    result
}

fn match_normalized(user: &str, correct: &str, question_type: QuestionType) -> MatchResult {
    if user == correct {
        return MatchResult::exact();
    }

    if question_type.is_strict() {
        return MatchResult::no_match(MatchMethod::Strict);
    }

    if let Some(result) = numerical_match(user, correct) {
        return result;
    }

    if let Some(result) = substring_match(user, correct) {
        return result;
    }

    let coverage = keyword_coverage(user, correct);
    if coverage >= KEYWORD_THRESHOLD {
        return MatchResult::scored(coverage * KEYWORD_WEIGHT, MatchMethod::Keyword);
    }

    if user.chars().count() > FUZZY_MAX_CHARS || correct.chars().count() > FUZZY_MAX_CHARS {
        return MatchResult::no_match(MatchMethod::None);
    }

    let ratio = similarity(user, correct);
    if ratio >= FUZZY_THRESHOLD {
        let score = (FUZZY_BASE + (ratio - FUZZY_THRESHOLD)).min(FUZZY_CAP);
        return MatchResult::scored(score, MatchMethod::Fuzzy);
    }

    MatchResult::no_match(MatchMethod::None)
}

fn numerical_match(user: &str, correct: &str) -> Option<MatchResult> {
    let user_numbers = extract_numbers(user);
    let correct_numbers = extract_numbers(correct);

    if user_numbers.is_empty() || correct_numbers.is_empty() {
        return None;
    }

    let matched = correct_numbers
        .iter()
        .filter(|expected| {
            user_numbers
                .iter()
                .any(|given| (*given - **expected).abs() < NUMERIC_TOLERANCE)
        })
        .count();

    if matched == correct_numbers.len() {
        return Some(MatchResult::scored(NUMERICAL_SCORE, MatchMethod::Numerical));
    }

    let fraction = matched as f64 / correct_numbers.len() as f64;
    if fraction >= NUMERICAL_PARTIAL_THRESHOLD {
        return Some(MatchResult::scored(
            0.5 * fraction,
            MatchMethod::NumericalPartial,
        ));
    }

    None
}

fn substring_match(user: &str, correct: &str) -> Option<MatchResult> {
    if user.chars().count() >= SUBSTRING_MIN_LEN && correct.contains(user) {
        return Some(MatchResult::scored(
            SUBSTRING_USER_IN_CORRECT_SCORE,
            MatchMethod::SubstringUserInCorrect,
        ));
    }

    if correct.chars().count() >= SUBSTRING_MIN_LEN && user.contains(correct) {
        return Some(MatchResult::scored(
            SUBSTRING_CORRECT_IN_USER_SCORE,
            MatchMethod::SubstringCorrectInUser,
        ));
    }

    None
}

/// All signed integers and decimals in `text`, in order of appearance.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    NUMBER
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

/// Content words of `text`: punctuation stripped, short words and stopwords dropped.
pub fn keywords(text: &str) -> HashSet<String> {
    text.split_whitespace()
        .map(|token| {
            token
                .chars()
                .filter(|c| !c.is_ascii_punctuation())
                .collect::<String>()
        })
        .filter(|token| token.chars().count() > 2 && !STOPWORDS.contains(&token.as_str()))
        .collect()
}

/// Share of the reference answer's keywords that also appear in the candidate.
fn keyword_coverage(user: &str, correct: &str) -> f64 {
    let correct_keywords = keywords(correct);
    if correct_keywords.is_empty() {
        return 0.0;
    }

    let user_keywords = keywords(user);
    let shared = correct_keywords.intersection(&user_keywords).count();
    shared as f64 / correct_keywords.len() as f64
}

/// Normalized Levenshtein similarity in [0, 1]; two empty strings are identical.
pub fn similarity(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 1.0;
    }

    let distance = levenshtein_distance(a, b);
    (max_len - distance) as f64 / max_len as f64
}

/// Character-level edit distance.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();

    if a_chars.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a_chars.len();
    }

    let mut previous: Vec<usize> = (0..=b_chars.len()).collect();
    let mut current = vec![0usize; b_chars.len() + 1];

    for (i, a_char) in a_chars.iter().enumerate() {
        current[0] = i + 1;
        for (j, b_char) in b_chars.iter().enumerate() {
            let cost = usize::from(a_char != b_char);
            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b_chars.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    const NON_STRICT: [QuestionType; 6] = [
        QuestionType::ShortAnswer,
        QuestionType::Calculation,
        QuestionType::LongAnswer,
        QuestionType::FillBlank,
        QuestionType::Matching,
        QuestionType::Any,
    ];

    #[test]
    fn equal_after_normalization_is_exact() {
        let pairs = [
            ("2x+3", "2x + 3"),
            ("The answer is 42", "42"),
            ("B) Paris", "paris"),
            ("T", "true"),
            ("5 km", "5km"),
        ];

        for (user, correct) in pairs {
            for kind in QuestionType::ALL {
                let result = match_answers(user, correct, kind, None);
                assert!(result.is_exact_match, "{:?} vs {:?}", user, correct);
                assert_eq!(result.score, 1.0);
                assert_eq!(result.method, MatchMethod::Exact);
            }
        }
    }

    #[test]
    fn option_letter_alone_does_not_match_option_text() {
        let options = vec!["a) London".to_string(), "b) Paris".to_string()];
        let result = match_answers(
            "B",
            "b) Paris",
            QuestionType::MultipleChoice,
            Some(options.as_slice()),
        );
        assert!(!result.is_exact_match);
        assert_eq!(result.method, MatchMethod::Strict);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn strict_types_get_no_partial_credit() {
        let near_misses = [
            ("3.00001", "3"),
            ("photosynthesis", "phtosynthesis"),
            ("paris france", "paris"),
            ("false", "true"),
        ];

        for kind in [QuestionType::MultipleChoice, QuestionType::TrueFalse] {
            for (user, correct) in near_misses {
                let result = match_answers(user, correct, kind, None);
                assert_eq!(result.score, 0.0);
                assert_eq!(result.method, MatchMethod::Strict);
                assert!(!result.is_exact_match);
            }
        }
    }

    #[test]
    fn numbers_within_tolerance_match() {
        let result = match_answers(
            "The answer is 3.0000999",
            "3",
            QuestionType::ShortAnswer,
            None,
        );
        assert_eq!(result.method, MatchMethod::Numerical);
        assert!(result.score >= 0.95);
        assert!(!result.is_exact_match);
    }

    #[test]
    fn numbers_outside_tolerance_fall_through() {
        let result = match_answers("3.001", "3", QuestionType::Calculation, None);
        assert_ne!(result.method, MatchMethod::Numerical);
        assert_ne!(result.method, MatchMethod::NumericalPartial);
    }

    #[test]
    fn half_the_numbers_earn_partial_credit() {
        let result = match_answers("x=2, y=7", "x=2, y=5", QuestionType::Calculation, None);
        assert_eq!(result.method, MatchMethod::NumericalPartial);
        assert!((result.score - 0.25).abs() < 1e-9);
    }

    #[test]
    fn all_numbers_in_any_order_match() {
        let result = match_answers(
            "y = 5 and x = 2",
            "x=2, y=5",
            QuestionType::Calculation,
            None,
        );
        assert_eq!(result.method, MatchMethod::Numerical);
        assert_eq!(result.score, 0.95);
    }

    #[test]
    fn candidate_inside_reference_scores_substring() {
        let result = match_answers(
            "powerhouse of the cell",
            "the powerhouse of the cell",
            QuestionType::ShortAnswer,
            None,
        );
        assert_eq!(result.method, MatchMethod::SubstringUserInCorrect);
        assert_eq!(result.score, 0.9);
    }

    #[test]
    fn reference_inside_candidate_scores_substring() {
        let result = match_answers(
            "I think it is Paris, France",
            "Paris",
            QuestionType::ShortAnswer,
            None,
        );
        assert_eq!(result.method, MatchMethod::SubstringCorrectInUser);
        assert_eq!(result.score, 0.85);
    }

    #[test]
    fn short_fragments_are_not_substring_matches() {
        let result = match_answers("ce", "the cell", QuestionType::ShortAnswer, None);
        assert_ne!(result.method, MatchMethod::SubstringUserInCorrect);
    }

    #[test]
    fn keyword_coverage_of_reference_scores_keyword() {
        let result = match_answers(
            "energy production happens in mitochondria cells",
            "mitochondria produce cell energy",
            QuestionType::ShortAnswer,
            None,
        );
        // reference keywords: mitochondria, produce, cell, energy -> 2 of 4 covered
        assert_eq!(result.method, MatchMethod::None);

        let result = match_answers(
            "the mitochondria produce energy for a cell, mostly",
            "mitochondria produce cell energy",
            QuestionType::ShortAnswer,
            None,
        );
        assert_eq!(result.method, MatchMethod::Keyword);
        assert!(result.score > 0.0 && result.score <= 0.7);
        assert!((result.score - 0.7).abs() < 1e-9);
    }

    #[test]
    fn mitochondria_example_scores_half_coverage_not_keyword() {
        // Coverage is against the reference: 3 of its 6 keywords, 0.5, under the threshold
        let result = match_answers(
            "mitochondria produces energy",
            "the mitochondria is the powerhouse that produces energy for the cell",
            QuestionType::ShortAnswer,
            None,
        );
        assert_ne!(result.method, MatchMethod::Keyword);
        assert!(result.score <= 0.7);
    }

    #[test]
    fn typos_score_fuzzy() {
        let result = match_answers(
            "phtosynthesis",
            "photosynthesis",
            QuestionType::ShortAnswer,
            None,
        );
        assert!(similarity("phtosynthesis", "photosynthesis") > 0.85);
        assert_eq!(result.method, MatchMethod::Fuzzy);
        assert!(result.score >= 0.5 && result.score <= 0.8);
    }

    #[test]
    fn fuzzy_score_stays_under_cap() {
        let result = match_answers(
            "electromagnetic forse",
            "electromagnetic force",
            QuestionType::ShortAnswer,
            None,
        );
        assert_eq!(result.method, MatchMethod::Fuzzy);
        assert!(result.score <= 0.8);
    }

    #[test]
    fn unrelated_answers_score_nothing() {
        for kind in NON_STRICT {
            let result = match_answers("banana", "photosynthesis", kind, None);
            assert_eq!(result.method, MatchMethod::None);
            assert_eq!(result.score, 0.0);
        }
    }

    #[test]
    fn blank_answer_scores_nothing() {
        let result = match_answers("   ", "photosynthesis", QuestionType::ShortAnswer, None);
        assert_eq!(result.method, MatchMethod::None);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn dotted_abbreviations_are_not_interchangeable() {
        let result = match_answers("U.K.", "U.S.A.", QuestionType::ShortAnswer, None);
        assert!(!result.is_exact_match);
        assert_ne!(result.method, MatchMethod::Exact);

        assert!(match_answers("u.s.a.", "U.S.A.", QuestionType::ShortAnswer, None).is_exact_match);
    }

    #[test]
    fn blank_answer_against_abbreviation_scores_nothing() {
        for blank in ["", "   "] {
            let result = match_answers(blank, "U.S.A.", QuestionType::ShortAnswer, None);
            assert!(!result.is_exact_match);
            assert_eq!(result.method, MatchMethod::None);
            assert_eq!(result.score, 0.0);
        }
    }

    #[test]
    fn long_answers_skip_edit_distance() {
        let reference = format!("{}b", "a".repeat(FUZZY_MAX_CHARS));
        let candidate = format!("{}c", "a".repeat(FUZZY_MAX_CHARS));
        let result = match_answers(&candidate, &reference, QuestionType::LongAnswer, None);
        assert_eq!(result.method, MatchMethod::None);
        assert_eq!(result.score, 0.0);

        let reference = format!("{}b", "a".repeat(FUZZY_MAX_CHARS - 1));
        let candidate = format!("{}c", "a".repeat(FUZZY_MAX_CHARS - 1));
        let result = match_answers(&candidate, &reference, QuestionType::LongAnswer, None);
        assert_eq!(result.method, MatchMethod::Fuzzy);
    }

    #[test]
    fn match_question_reads_type_and_reference() {
        let question = Question::new("q1", "Solve", QuestionType::Calculation, "2x + 3");
        assert!(match_question("2x+3", &question).is_exact_match);
    }

    #[test]
    fn levenshtein_base_cases() {
        assert_eq!(levenshtein_distance("", ""), 0);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("abcd", ""), 4);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
        assert_eq!(levenshtein_distance("flaw", "lawn"), 2);
        assert_eq!(levenshtein_distance("½", "1/2"), 3);
    }

    #[test]
    fn extracts_signed_decimals() {
        assert_eq!(extract_numbers("x=-2.5, y=3"), vec![-2.5, 3.0]);
        assert_eq!(extract_numbers("7. apples"), vec![7.0]);
        assert!(extract_numbers("no digits").is_empty());
    }

    #[test]
    fn keywords_drop_stopwords_and_short_tokens() {
        let words = keywords("the cell, and its nucleus is ok!");
        let expected: HashSet<String> = ["cell", "its", "nucleus"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(words, expected);
    }
}
