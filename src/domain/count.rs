//! Listing count values read from a results page
//!
//! A count is read as raw text by a [`CountExtractor`] and turned into a
//! number by [`parse_count`]. Both steps report typed failures instead of
//! coercing bad input to a number.

use thiserror::Error;

/// Why the count element could not be read from a page
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionMiss {
    #[error("Heading not found")]
    HeadingNotFound,

    #[error("First child not found")]
    FirstChildNotFound,
}

/// Outcome of one extraction attempt: the normalized count text or a miss
pub type ExtractionResult = Result<String, ExtractionMiss>;

/// Reads the count text out of a rendered page.
///
/// Implementations make a single best-effort read; retrying is the poller's job.
pub trait CountExtractor: Send + Sync {
    fn extract(&self, page_html: &str) -> ExtractionResult;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MalformedCount {
    #[error("count text is empty")]
    Empty,

    #[error("count '{0}' is negative")]
    Negative(String),

    #[error("count '{0}' is not a number")]
    NotANumber(String),

    #[error("count '{0}' does not fit in 64 bits")]
    Overflow(String),
}

/// Grouping characters stripped from count text before parsing
const GROUPING_CHARS: &[char] = &[',', '\'', '_', ' ', '\u{00A0}', '\u{202F}'];

/// Strip thousand-separators and surrounding whitespace from raw count text
pub fn normalize_count_text(raw: &str) -> String {
    raw.trim().chars().filter(|c| !GROUPING_CHARS.contains(c)).collect()
}

/// Parse a listing count.
///
/// Accepts only a non-empty run of ASCII digits once grouping characters are
/// removed, so `"1,234"` is `1234` while `""`, `"-3"`, `"12 results"` and
/// `"abc"` are rejected.
pub fn parse_count(raw: &str) -> Result<u64, MalformedCount> {
    let normalized = normalize_count_text(raw);

    if normalized.is_empty() {
        return Err(MalformedCount::Empty);
    }

    if let Some(rest) = normalized.strip_prefix('-') {
        if !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()) {
            return Err(MalformedCount::Negative(raw.trim().to_string()));
        }
    }

    if !normalized.chars().all(|c| c.is_ascii_digit()) {
        return Err(MalformedCount::NotANumber(raw.trim().to_string()));
    }

    normalized
        .parse::<u64>()
        .map_err(|_| MalformedCount::Overflow(raw.trim().to_string()))
}
