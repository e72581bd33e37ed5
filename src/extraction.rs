//! Number extraction from captured text.
//!
//! Two inputs are supported: page markup where each value sits in its own
//! `<span>`, and recognised words with bounding boxes (the output of an OCR
//! pass, which this crate does not run). Both yield values in
//! [`MIN_VALUE`, `MAX_VALUE`] rounded to two decimals, in reading order.

use crate::{
    errors::{ForecastError, ForecastResult},
    math_utils::round2,
};
use once_cell::sync::Lazy;
use regex::Regex;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Smallest value kept.
pub const MIN_VALUE: f64 = 0.01;
/// Largest value kept.
pub const MAX_VALUE: f64 = 10000.0;
/// Vertical distance (pixels) within which words share a row.
pub const DEFAULT_ROW_TOLERANCE: f64 = 10.0;

static SPAN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<span[^>]*>([^<]+)</span>").expect("span pattern is a valid regex")
});
static DECIMAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+\.\d{1,2}").expect("decimal pattern is a valid regex"));
static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+(?:\.\d*)?|\.\d+)(?:[eE][+-]?\d+)?")
        .expect("leading number pattern is a valid regex")
});

/// Parse the numeric prefix of `text` after trimming, ignoring any trailing
/// characters. `None` when the text does not start with a number.
pub fn parse_leading_number(text: &str) -> Option<f64> {
    LEADING_NUMBER
        .find(text.trim())
        .and_then(|m| m.as_str().parse().ok())
}

/// Parse a recognised word.
///
/// Text containing a decimal with one or two fraction digits is read as is.
/// Otherwise all digits are joined into an integer; recognition often drops
/// the decimal point, so integers of 100 or more are divided by 100
/// (`842` reads as `8.42`).
pub fn parse_number(text: &str) -> Option<f64> {
    if DECIMAL.is_match(text) {
        return parse_leading_number(text);
    }

    let digits: String = text.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    let value: f64 = digits.parse().ok()?;
    Some(if value >= 100.0 { value / 100.0 } else { value })
}

fn keep(value: f64) -> Option<f64> {
    (value.is_finite() && (MIN_VALUE..=MAX_VALUE).contains(&value)).then(|| round2(value))
}

/// Values of every `<span>` element in `markup`, in document order.
pub fn extract_from_markup(markup: &str) -> Vec<f64> {
    let numbers: Vec<f64> = SPAN
        .captures_iter(markup)
        .filter_map(|caps| caps.get(1))
        .filter_map(|text| parse_leading_number(text.as_str()))
        .filter_map(keep)
        .collect();
    log::debug!("Extracted {} values from markup", numbers.len());
    numbers
}

/// A recognised word and the top-left corner of its bounding box.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WordBox {
    /// Recognised text
    pub text: String,
    /// Left edge in pixels
    pub x: f64,
    /// Top edge in pixels
    pub y: f64,
}

impl WordBox {
    /// Word at `(x, y)`.
    pub fn new(text: impl Into<String>, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// Sort `words` into reading order.
///
/// Words are sorted by `y`; a word starts a new row when it lies
/// `row_tolerance` or more below the first word of the current row. Each row
/// is then sorted by `x`.
pub fn order_words(mut words: Vec<WordBox>, row_tolerance: f64) -> Vec<WordBox> {
    words.sort_by(|a, b| a.y.total_cmp(&b.y));

    let mut rows: Vec<Vec<WordBox>> = Vec::new();
    for word in words {
        match rows.last_mut() {
            Some(row) if word.y - row[0].y < row_tolerance => row.push(word),
            _ => rows.push(vec![word]),
        }
    }

    rows.into_iter()
        .flat_map(|mut row| {
            row.sort_by(|a, b| a.x.total_cmp(&b.x));
            row
        })
        .collect()
}

/// Values of recognised words in reading order.
///
/// Fails with `ExtractionError` when a coordinate is not finite.
pub fn extract_from_words(words: Vec<WordBox>, row_tolerance: f64) -> ForecastResult<Vec<f64>> {
    if let Some(bad) = words.iter().find(|w| !w.x.is_finite() || !w.y.is_finite()) {
        return Err(ForecastError::ExtractionError {
            reason: format!("word '{}' has a non-finite position", bad.text),
        });
    }

    let numbers: Vec<f64> = order_words(words, row_tolerance)
        .iter()
        .filter_map(|w| parse_number(&w.text))
        .filter_map(keep)
        .collect();
    log::debug!("Extracted {} values from recognised words", numbers.len());
    Ok(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_decimal() {
        assert_eq!(parse_number("1.25"), Some(1.25));
        assert_eq!(parse_number("12.5x"), Some(12.5));
        assert_eq!(parse_number(" 3.07 "), Some(3.07));
    }

    #[test]
    fn test_parse_number_missing_decimal_point() {
        assert_eq!(parse_number("112"), Some(1.12));
        assert_eq!(parse_number("842x"), Some(8.42));
        assert_eq!(parse_number("162525"), Some(1625.25));
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number("x"), None);
    }

    #[test]
    fn test_parse_number_three_fraction_digits() {
        // "1.234" still contains a two-digit decimal and is read as is
        assert_eq!(parse_number("1.234"), Some(1.234));
    }

    #[test]
    fn test_extract_from_markup() {
        let markup = r#"<div><span class="a">1.23</span><span>x</span>
            <span>20000</span><span style="c">0.004</span><span> 7.456 </span><b>9.9</b></div>"#;
        assert_eq!(extract_from_markup(markup), vec![1.23, 7.46]);
        assert!(extract_from_markup("<p>no spans</p>").is_empty());
    }

    #[test]
    fn test_order_words_rows_then_columns() {
        let words = vec![
            WordBox::new("c", 5.0, 40.0),
            WordBox::new("b", 50.0, 3.0),
            WordBox::new("a", 10.0, 0.0),
            WordBox::new("d", 60.0, 38.0),
        ];
        let ordered: Vec<String> = order_words(words, DEFAULT_ROW_TOLERANCE)
            .into_iter()
            .map(|w| w.text)
            .collect();
        assert_eq!(ordered, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_order_words_row_break_at_tolerance() {
        let words = vec![WordBox::new("late", 0.0, 10.0), WordBox::new("early", 99.0, 0.0)];
        let ordered = order_words(words, DEFAULT_ROW_TOLERANCE);
        assert_eq!(ordered[0].text, "early");
        assert_eq!(ordered[1].text, "late");
    }

    #[test]
    fn test_extract_from_words() {
        let words = vec![
            WordBox::new("842", 40.0, 1.0),
            WordBox::new("1.5", 0.0, 0.0),
            WordBox::new("abc", 80.0, 0.0),
            WordBox::new("3.10", 0.0, 30.0),
        ];
        let values = extract_from_words(words, DEFAULT_ROW_TOLERANCE).unwrap();
        assert_eq!(values, vec![1.5, 8.42, 3.1]);
    }

    #[test]
    fn test_extract_rejects_bad_coordinates() {
        let words = vec![WordBox::new("1.5", f64::NAN, 0.0)];
        assert!(matches!(
            extract_from_words(words, DEFAULT_ROW_TOLERANCE),
            Err(ForecastError::ExtractionError { .. })
        ));
    }
}
