//! # parsija
//!
//! Turn a published web article into a standalone, print-ready PDF.
//!
//! ## What it does
//!
//! Given the URL of an article page, parsija downloads the page, takes the
//! headline, the publication date and the main content region, makes image
//! sources absolute so they still resolve outside the site, wraps the result
//! in a styled document with an attribution footer and hands it to
//! `wkhtmltopdf`. The PDF is named after the headline.
//!
//! ## Pipeline Overview
//!
//! ```text
//! URL
//!  │
//!  ├─ 1. Fetch    single HTTP GET (reqwest)
//!  ├─ 2. Extract  <h1>, article:published_time, div.column.is-8-desktop (scraper)
//!  ├─ 3. Rewrite  relative <img src> → absolute, document + footer (lol_html)
//!  └─ 4. Render   temp HTML → wkhtmltopdf → "<title>.pdf" (spawn_blocking)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use parsija::{convert, ConversionConfig, ConversionOutcome};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConversionConfig::builder().output_dir("pdfs").build()?;
//!     match convert("https://www.verke.org/artikkelit/esimerkki/", &config).await? {
//!         ConversionOutcome::Rendered(out) => println!("{}", out.pdf_path.display()),
//!         ConversionOutcome::ContentNotFound { selector } => {
//!             eprintln!("no element matches {selector}")
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! For interactive front-ends, [`Converter`] runs the same pipeline in the
//! background and reports progress over a channel (or a `Stream`, see
//! [`convert_stream`]).
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `parsija` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! parsija = { version = "0.2", default-features = false }
//! ```
//!
//! ## Renderer
//!
//! `wkhtmltopdf` must be installed. It is looked up via the
//! `WKHTMLTOPDF_PATH` environment variable, then `PATH`, then the usual
//! install locations. Any other engine can be plugged in by implementing
//! [`PdfRenderer`].

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod convert;
pub mod error;
pub mod messages;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod stream;
pub mod worker;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    CollisionPolicy, ConversionConfig, ConversionConfigBuilder, DatePolicy, RendererOptions,
};
pub use convert::{convert, convert_html, convert_sync, inspect, prepare_document};
pub use error::ConvertError;
pub use messages::Messages;
pub use output::{ConversionOutcome, ConversionOutput, ConversionStats};
pub use pipeline::extract::{ExtractedContent, PublishedDate};
pub use pipeline::render::{PdfRenderer, WkHtmlToPdf};
pub use pipeline::rewrite::RenderableDocument;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
pub use stream::{convert_stream, EventStream};
pub use worker::{ConversionEvent, ConversionHandle, Converter, FinishedMessage};
