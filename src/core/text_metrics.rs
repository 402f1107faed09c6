//! Surface statistics over the OCR text of one region.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));
static TABULAR_GAP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\t|\s{3,}").expect("valid tabular gap regex"));

const TAIL_WINDOW: usize = 10;
const TAIL_DIGIT_RATIO: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub avg_line_length: f64,
    pub max_line_length: usize,
    pub num_lines: usize,
    pub num_count: usize,
    pub special_char_count: usize,
    pub table_line_count: usize,
    pub column_count: usize,
    pub lines_with_number_endings: usize,
    pub unique_word_ratio: f64,
    pub text_length: usize,
    pub word_count: usize,
}

/// Computes [`TextMetrics`] for `text`. Returns `None` when no line has
/// non-whitespace content, which callers treat as a non-text region.
///
/// Line-level statistics use trimmed non-empty lines; character counts
/// (`num_count`, `special_char_count`, `text_length`) cover the raw text,
/// line breaks included.
pub fn analyze(text: &str) -> Option<TextMetrics> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.is_empty() {
        return None;
    }

    let lowered = text.to_lowercase();
    let words: Vec<&str> = WORD_REGEX.find_iter(&lowered).map(|m| m.as_str()).collect();
    let distinct: HashSet<&str> = words.iter().copied().collect();

    let line_lengths: Vec<usize> = lines.iter().map(|line| line.chars().count()).collect();
    let total_line_length: usize = line_lengths.iter().sum();

    let table_line_count = lines
        .iter()
        .filter(|line| TABULAR_GAP_REGEX.is_match(line))
        .count();
    let column_count = lines
        .iter()
        .map(|line| line.split_whitespace().count())
        .max()
        .unwrap_or(0);
    let lines_with_number_endings = lines.iter().filter(|line| ends_numerically(line)).count();

    Some(TextMetrics {
        avg_line_length: total_line_length as f64 / lines.len() as f64,
        max_line_length: line_lengths.iter().copied().max().unwrap_or(0),
        num_lines: lines.len(),
        num_count: count_digits(text),
        special_char_count: text
            .chars()
            .filter(|c| !c.is_alphanumeric() && *c != ' ')
            .count(),
        table_line_count,
        column_count,
        lines_with_number_endings,
        unique_word_ratio: if words.is_empty() {
            0.0
        } else {
            distinct.len() as f64 / words.len() as f64
        },
        text_length: text.chars().count(),
        word_count: words.len(),
    })
}

/// Decimal digits only; fractions and numeral letters such as `½` or `Ⅻ`
/// are not counted.
pub fn count_digits(text: &str) -> usize {
    text.chars().filter(is_decimal_digit).count()
}

fn is_decimal_digit(c: &char) -> bool {
    c.is_numeric() && c.to_digit(10).is_some()
}

fn ends_numerically(line: &str) -> bool {
    let chars: Vec<char> = line.chars().collect();
    let tail = &chars[chars.len().saturating_sub(TAIL_WINDOW)..];
    let digits = tail.iter().copied().filter(is_decimal_digit).count();
    digits as f64 >= tail.len() as f64 * TAIL_DIGIT_RATIO
}
