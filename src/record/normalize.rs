use crate::record::Rating;
use chrono::NaiveDate;
use regex::Regex;
use std::sync::LazyLock;

static DATE_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(\d{4})[.\-/](\d{1,2})[.\-/](\d{1,2})").ok());

static NUMBER_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+)?").ok());

/// Normalizes review content
///
/// # Normalization Steps
///
/// 1. Replace non-breaking spaces with regular spaces
/// 2. Convert CRLF and lone CR line endings to LF
/// 3. Trim leading and trailing whitespace
///
/// Inner newlines are preserved.
///
/// # Examples
///
/// ```
/// use review_harvest::record::normalize_content;
///
/// assert_eq!(normalize_content("\u{a0}hello\r\nworld  "), "hello\nworld");
/// ```
pub fn normalize_content(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .trim()
        .to_string()
}

/// Finds the first calendar date inside a piece of text
///
/// Accepts `YYYY-MM-DD`, `YYYY.MM.DD` and `YYYY/MM/DD`. Matches that are not
/// real calendar dates (e.g. `2024-13-40`) are skipped.
pub fn parse_review_date(text: &str) -> Option<NaiveDate> {
    let pattern = DATE_PATTERN.as_ref()?;
    pattern.captures_iter(text).find_map(|caps| {
        let year = caps[1].parse::<i32>().ok()?;
        let month = caps[2].parse::<u32>().ok()?;
        let day = caps[3].parse::<u32>().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Parses raw rating text
///
/// The first decimal number in the text becomes a score; other non-empty
/// text is kept as a label.
pub fn parse_rating(text: &str) -> Rating {
    let text = normalize_content(text);
    if text.is_empty() {
        return Rating::Missing;
    }

    match NUMBER_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.find(&text))
        .and_then(|m| m.as_str().parse::<f64>().ok())
    {
        Some(score) => Rating::Score(score),
        None => Rating::Label(text),
    }
}
