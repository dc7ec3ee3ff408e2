//! Extraction: pull title, publication date and content region out of a page.
//!
//! Three fixed-shape queries against the parsed document:
//!
//! | Piece     | Query                                              |
//! |-----------|----------------------------------------------------|
//! | title     | text of the first `<h1>`                            |
//! | published | `content` of `<meta property="article:published_time">` |
//! | fragment  | outer HTML of the first match of the content selector |
//!
//! The parsed tree never leaves this module; callers receive owned strings.

use crate::config::{ConversionConfig, DatePolicy};
use crate::error::ConvertError;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

static H1: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static META_PROPERTY: Lazy<Selector> = Lazy::new(|| Selector::parse("meta[property]").unwrap());

/// Publication date of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PublishedDate {
    Known(NaiveDate),
    Unknown,
}

impl PublishedDate {
    /// `dd.mm.yyyy`, or `None` when unknown.
    pub fn formatted(&self) -> Option<String> {
        match self {
            PublishedDate::Known(d) => Some(format_date(*d)),
            PublishedDate::Unknown => None,
        }
    }

    /// `dd.mm.yyyy`, or `unknown` when the date is not known.
    pub fn display_or(&self, unknown: &str) -> String {
        self.formatted().unwrap_or_else(|| unknown.to_string())
    }
}

/// The three pieces taken from a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
    /// Trimmed text of the first `<h1>`; `None` when absent or blank.
    pub title: Option<String>,
    pub published: PublishedDate,
    /// Outer HTML of the content region; `None` when no element matched.
    pub fragment: Option<String>,
}

impl ExtractedContent {
    /// Title to show in the document, falling back to `no_title`.
    pub fn display_title(&self, no_title: &str) -> String {
        self.title.clone().unwrap_or_else(|| no_title.to_string())
    }
}

/// Parse `html` and extract title, date and content region.
///
/// Bytes are decoded as UTF-8; invalid sequences are replaced, never fatal.
///
/// # Errors
/// - [`ConvertError::InvalidConfig`] if the content selector does not parse
/// - [`ConvertError::DateParse`] for a malformed date under [`DatePolicy::Strict`]
pub fn extract(html: &[u8], config: &ConversionConfig) -> Result<ExtractedContent, ConvertError> {
    let content_selector = Selector::parse(&config.content_selector).map_err(|e| {
        ConvertError::InvalidConfig(format!(
            "content selector '{}' is not valid CSS: {}",
            config.content_selector, e
        ))
    })?;

    let source = String::from_utf8_lossy(html);
    let document = Html::parse_document(&source);

    let title = document
        .select(&H1)
        .next()
        .map(|h1| h1.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty());

    let published = match find_meta_content(&document, &config.date_property) {
        None => PublishedDate::Unknown,
        Some(raw) => match parse_iso8601_date(&raw) {
            Ok(date) => PublishedDate::Known(date),
            Err(e) => match config.date_policy {
                DatePolicy::Strict => {
                    return Err(ConvertError::DateParse {
                        value: raw,
                        reason: e.to_string(),
                    })
                }
                DatePolicy::Lenient => {
                    warn!("Ignoring malformed publication date '{}': {}", raw, e);
                    PublishedDate::Unknown
                }
            },
        },
    };

    let fragment = document.select(&content_selector).next().map(|el| el.html());

    debug!(
        "Extracted title={:?} published={:?} fragment={} bytes",
        title,
        published,
        fragment.as_ref().map_or(0, String::len)
    );

    Ok(ExtractedContent {
        title,
        published,
        fragment,
    })
}

/// `content` of the first `<meta>` whose `property` equals `property`.
fn find_meta_content(document: &Html, property: &str) -> Option<String> {
    document
        .select(&META_PROPERTY)
        .find(|m| m.value().attr("property") == Some(property))
        .and_then(|m| m.value().attr("content"))
        .map(str::to_string)
}

/// Parse an ISO-8601 timestamp or date and return its calendar date.
///
/// The date is taken in the timestamp's own offset; `2023-05-09T23:30:00-05:00`
/// is the 9th, not the 10th. Accepted shapes:
///
/// - RFC 3339 with offset or `Z`: `2023-05-09T00:00:00+03:00`
/// - numeric offset without colon: `2023-05-09T00:00:00+0300`
/// - naive timestamp, `T` or space separated, seconds and fraction optional
/// - bare date: `2023-05-09`
pub fn parse_iso8601_date(raw: &str) -> Result<NaiveDate, chrono::ParseError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt.date_naive());
    }
    for fmt in [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt.date());
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
}

/// Format a date as `dd.mm.yyyy`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}
