//! Error types for the parsija library.
//!
//! [`ConvertError`] covers every **fatal** failure: the page could not be
//! fetched, the renderer could not run, the configuration is invalid. It is
//! returned as `Err(ConvertError)` from the top-level `convert*` functions.
//!
//! A page that simply lacks the expected content region is *not* an error.
//! That case is reported as [`crate::output::ConversionOutcome::ContentNotFound`]
//! so callers can show a message without treating it as a crash.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the parsija library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The URL does not parse or does not use http/https.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// Network failure or non-success HTTP status.
    #[error("Failed to fetch '{url}': {reason}")]
    FetchFailed { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Fetching '{url}' timed out after {secs}s")]
    FetchTimeout { url: String, secs: u64 },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// Publication date metadata is present but not ISO-8601.
    ///
    /// Only raised under [`crate::config::DatePolicy::Strict`].
    #[error("Invalid publication date '{value}': {reason}")]
    DateParse { value: String, reason: String },

    // ── Render errors ─────────────────────────────────────────────────────
    /// No usable wkhtmltopdf executable.
    #[error("{0}")]
    RendererNotFound(#[from] wkhtmltopdf_locate::LocateError),

    /// The renderer ran but did not produce a PDF.
    #[error("PDF rendering failed: {detail}")]
    RenderFailed { detail: String },

    /// The temporary HTML file could not be created or written.
    #[error("Failed to write temporary HTML file: {source}")]
    TempFile {
        #[source]
        source: std::io::Error,
    },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// The output directory could not be created.
    #[error("Failed to prepare output '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Orchestration errors ──────────────────────────────────────────────
    /// A conversion is already running on this converter.
    #[error("A conversion is already in progress")]
    Busy,

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failed_display() {
        let e = ConvertError::FetchFailed {
            url: "https://example.com/".into(),
            reason: "HTTP 404 Not Found".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("https://example.com/"), "got: {msg}");
        assert!(msg.contains("404"), "got: {msg}");
    }

    #[test]
    fn fetch_timeout_display() {
        let e = ConvertError::FetchTimeout {
            url: "https://example.com/".into(),
            secs: 30,
        };
        assert!(e.to_string().contains("30s"));
    }

    #[test]
    fn date_parse_display() {
        let e = ConvertError::DateParse {
            value: "yesterday".into(),
            reason: "input contains invalid characters".into(),
        };
        assert!(e.to_string().contains("yesterday"));
    }

    #[test]
    fn renderer_not_found_from_locate_error() {
        let e: ConvertError = wkhtmltopdf_locate::LocateError::NotFound { searched: vec![] }.into();
        assert!(e.to_string().contains("wkhtmltopdf"));
    }
}
