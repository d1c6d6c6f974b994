//! Canonical form for free-text answers.
//!
//! `normalize` folds case, strips option-letter prefixes and filler phrases,
//! and tidies arithmetic, fractions and units so that two answers that mean
//! the same thing compare equal as plain strings.

use lazy_static::lazy_static;
use regex::Regex;

const FILLER_PHRASES: &[&str] = &["the answer is", "answer:", "result:", "solution:", "equals"];

const SPACED_OPERATORS: &[(&str, &str)] = &[
    (" + ", "+"),
    (" - ", "-"),
    (" * ", "*"),
    (" / ", "/"),
    (" = ", "="),
];

const VULGAR_FRACTIONS: &[(char, &str)] = &[
    ('½', "1/2"),
    ('⅓', "1/3"),
    ('⅔', "2/3"),
    ('¼', "1/4"),
    ('¾', "3/4"),
    ('⅕', "1/5"),
    ('⅖', "2/5"),
    ('⅗', "3/5"),
    ('⅘', "4/5"),
    ('⅙', "1/6"),
    ('⅚', "5/6"),
    ('⅛', "1/8"),
    ('⅜', "3/8"),
    ('⅝', "5/8"),
    ('⅞', "7/8"),
];

lazy_static! {
    // A, a. (b) B) c] -- the delimiter is required, a bare leading letter is content
    static ref OPTION_PREFIX: Regex = Regex::new(r"^\(?[A-Za-z][.)\]]\s*").unwrap();
    // Longer units first: alternation is leftmost-first
    static ref UNIT_SPACING: Regex = Regex::new(
        r"(?i)(\d)\s+(km/h|m/s|mph|min|km|cm|mm|kg|mg|ml|°c|°f|m|g|l|s|h)\b"
    )
    .unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Normalize an answer for comparison.
///
/// At most one option prefix is removed, and only when what follows it is a
/// real answer: "B) Paris" becomes "paris" but "U.S.A." keeps its letters.
/// The result is a fixed point: `normalize(&normalize(x)) == normalize(x)`.
pub fn normalize(answer: &str) -> String {
    let canonical = canonicalize(answer);

    let Some(rest) = strip_option_prefix(&canonical) else {
        return canonical;
    };

    let rest = canonicalize(rest);
    if rest.is_empty() || OPTION_PREFIX.is_match(&rest) {
        // "a." alone, or a dotted abbreviation like "u.k."
        return canonical;
    }
    rest
}

/// Every step except prefix removal, repeated until nothing changes.
fn canonicalize(answer: &str) -> String {
    let mut current = normalize_pass(answer);
    loop {
        let next = normalize_pass(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn normalize_pass(answer: &str) -> String {
    let lowered = answer.trim().to_lowercase();
    let expanded = expand_true_false(&lowered);
    let without_filler = remove_filler_phrases(&expanded);
    let operators = collapse_operators(&without_filler);
    let fractions = replace_vulgar_fractions(&operators);
    let units = UNIT_SPACING.replace_all(&fractions, "${1}${2}");
    let collapsed = collapse_whitespace(&units);

    // Filler removal can leave a bare shorthand behind ("answer: t")
    expand_true_false(&collapsed)
}

fn strip_option_prefix(answer: &str) -> Option<&str> {
    OPTION_PREFIX
        .find(answer)
        .map(|prefix| &answer[prefix.end()..])
}

fn expand_true_false(answer: &str) -> String {
    match answer {
        "t" => "true".to_string(),
        "f" => "false".to_string(),
        other => other.to_string(),
    }
}

fn remove_filler_phrases(answer: &str) -> String {
    FILLER_PHRASES
        .iter()
        .fold(answer.to_string(), |acc, phrase| acc.replace(phrase, ""))
}

fn collapse_operators(answer: &str) -> String {
    SPACED_OPERATORS
        .iter()
        .fold(answer.to_string(), |acc, (spaced, tight)| {
            acc.replace(spaced, tight)
        })
}

fn replace_vulgar_fractions(answer: &str) -> String {
    let mut result = String::with_capacity(answer.len());
    let mut previous: Option<char> = None;

    for ch in answer.chars() {
        match VULGAR_FRACTIONS.iter().find(|(glyph, _)| *glyph == ch) {
            Some((_, ascii)) => {
                // 1½ reads as a mixed number, keep the whole part separate
                if previous.is_some_and(|p| p.is_ascii_digit()) {
                    result.push(' ');
                }
                result.push_str(ascii);
            }
            None => result.push(ch),
        }
        previous = Some(ch);
    }

    result
}

fn collapse_whitespace(answer: &str) -> String {
    WHITESPACE.replace_all(answer, " ").trim().to_string()
}
