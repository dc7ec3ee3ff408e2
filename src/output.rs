//! Result types returned by the conversion entry points.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a conversion run ended with, short of a fatal error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ConversionOutcome {
    /// A PDF was written.
    Rendered(ConversionOutput),
    /// The page had no element matching the content selector; nothing was written.
    ContentNotFound { selector: String },
}

impl ConversionOutcome {
    /// The written PDF, if any.
    pub fn output(&self) -> Option<&ConversionOutput> {
        match self {
            ConversionOutcome::Rendered(out) => Some(out),
            ConversionOutcome::ContentNotFound { .. } => None,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, ConversionOutcome::Rendered(_))
    }
}

/// A successfully rendered page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionOutput {
    /// Path of the written PDF.
    pub pdf_path: PathBuf,
    /// URL the page was fetched from.
    pub source_url: String,
    /// Title as embedded in the document (sentinel when the page had none).
    pub title: String,
    /// Footer date string (`dd.mm.yyyy` or the unknown-date sentinel).
    pub published_date: String,
    pub stats: ConversionStats,
}

/// Timing and size figures for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversionStats {
    /// Bytes received from the server.
    pub fetched_bytes: usize,
    /// Bytes of the assembled HTML document.
    pub document_bytes: usize,
    /// `<img>` sources rewritten to absolute URLs.
    pub rewritten_images: usize,
    pub fetch_duration_ms: u64,
    pub render_duration_ms: u64,
    pub total_duration_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_serialises_with_tag() {
        let outcome = ConversionOutcome::ContentNotFound {
            selector: "div.x".into(),
        };
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"outcome\":\"content_not_found\""), "got: {json}");
        assert!(outcome.output().is_none());
        assert!(!outcome.is_rendered());
    }

    #[test]
    fn rendered_outcome_exposes_output() {
        let outcome = ConversionOutcome::Rendered(ConversionOutput {
            pdf_path: PathBuf::from("a.pdf"),
            source_url: "https://example.com/".into(),
            title: "A".into(),
            published_date: "01.02.2024".into(),
            stats: ConversionStats::default(),
        });
        assert!(outcome.is_rendered());
        assert_eq!(outcome.output().unwrap().title, "A");
    }
}
