//! String extraction and number parsing helpers used by the scraping adapters.
//!
//! Every helper returns `None` rather than failing: a value that cannot be
//! located or parsed is simply unresolved.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref TAG_REGEX: Regex = Regex::new(r"<[^>]*>").expect("valid tag regex");
    static ref ASSET_TYPE_REGEX: Regex =
        Regex::new(r"\b(REIT|STOCK|ETF)\b").expect("valid asset type regex");
}

const TRUTHY: &[&str] = &[
    "1", "s", "sim", "t", "true", "v", "verdade", "verdadeiro", "y", "yes",
];

const UNIT_WORDS: &[(&str, &str)] = &[
    ("milhões", "m"),
    ("millions", "m"),
    ("bilhões", "b"),
    ("billions", "b"),
    ("trilhões", "t"),
    ("trillions", "t"),
];

/// Decimal and thousands separators used by a source.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NumberFormat {
    /// `1.234,56`
    Brazilian,
    /// `1,234.56`
    Us,
}

/// Text between the first `start` and the following `end`, with newlines and
/// tabs removed and surrounding whitespace trimmed.
///
/// When `end` never occurs the rest of the text is returned.
pub fn substring_between(text: &str, start: &str, end: &str) -> Option<String> {
    let (_, after) = text.split_once(start)?;
    let extracted = after.split_once(end).map_or(after, |(inside, _)| inside);

    let cleaned: String = extracted
        .chars()
        .filter(|c| *c != '\n' && *c != '\t' && *c != '\r')
        .collect();
    let cleaned = cleaned.trim();

    (!cleaned.is_empty()).then(|| cleaned.to_string())
}

/// Like [`substring_between`], additionally stripping HTML tags, removing
/// each of `remove` and decoding the common HTML entities.
pub fn cleaned_between(text: &str, start: &str, end: &str, remove: &[&str]) -> Option<String> {
    let raw = substring_between(text, start, end)?;
    let mut cleaned = TAG_REGEX.replace_all(&raw, "").into_owned();
    for pattern in remove {
        cleaned = cleaned.replace(pattern, "");
    }
    let cleaned = decode_entities(cleaned.trim());

    (!cleaned.is_empty()).then_some(cleaned)
}

pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Parses a displayed number: currency prefixes (`R$`, `US$`, `$`) and `%` are
/// dropped, separators follow `format`. Percentages keep their displayed
/// magnitude (`"6,5%"` is `6.5`).
pub fn text_to_number(text: &str, format: NumberFormat) -> Option<f64> {
    let mut normalized = text.trim().to_lowercase();
    for currency in ["r$", "us$", "$"] {
        normalized = normalized.replace(currency, "");
    }
    normalized = normalized.replace('%', "");
    normalized.retain(|c| !c.is_whitespace());

    let normalized = match format {
        NumberFormat::Brazilian => normalized.replace('.', "").replace(',', "."),
        NumberFormat::Us => normalized.replace(',', ""),
    };

    if normalized.is_empty() {
        return None;
    }
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a number that may carry a magnitude suffix: `k`, `m`, `b`, `t`, or
/// the words `milhões`/`millions`, `bilhões`/`billions`,
/// `trilhões`/`trillions`.
pub fn multiply_by_unit(text: &str, format: NumberFormat) -> Option<f64> {
    let mut normalized = text.trim().to_lowercase();
    for (word, letter) in UNIT_WORDS {
        normalized = normalized.replace(word, letter);
    }
    let normalized = normalized.trim();

    let multiplier = match normalized.chars().last()? {
        'k' => 1e3,
        'm' => 1e6,
        'b' => 1e9,
        't' => 1e12,
        _ => return text_to_number(normalized, format),
    };

    let number_part = &normalized[..normalized.len() - 1];
    text_to_number(number_part, format).map(|v| v * multiplier)
}

/// Upper-cases a name and removes stray asset-type words (`REIT`, `STOCK`,
/// `ETF`).
pub fn remove_type_from_name(text: &str) -> String {
    let upper = text.to_uppercase();
    let stripped = ASSET_TYPE_REGEX.replace_all(&upper, "");
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Query-string booleans, in Portuguese and English.
pub fn parse_truthy(raw: &str) -> bool {
    let lowered = raw.trim().to_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Last price divided by the average of the trailing `window` prices.
pub fn mayer_multiple(prices: &[f64], window: usize) -> Option<f64> {
    let last = *prices.last()?;
    let start = prices.len().saturating_sub(window);
    let avg = mean(&prices[start..])?;
    (avg != 0.0).then(|| last / avg)
}
