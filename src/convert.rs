//! Conversion entry points.
//!
//! [`convert`] runs the whole pipeline for a URL. [`convert_html`] starts
//! from bytes the caller already has. [`inspect`] and [`prepare_document`]
//! stop before rendering, which is handy for diagnostics and tests that
//! have no wkhtmltopdf installed.

use crate::config::ConversionConfig;
use crate::error::ConvertError;
use crate::output::{ConversionOutcome, ConversionOutput, ConversionStats};
use crate::pipeline::extract::{self, ExtractedContent};
use crate::pipeline::render::{self, PdfRenderer};
use crate::pipeline::rewrite::{self, RenderableDocument};
use crate::pipeline::{fetch, filename};
use crate::progress::Stage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Fetch a page and render its content region to PDF.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// - `Ok(ConversionOutcome::Rendered(_))`: the PDF was written
/// - `Ok(ConversionOutcome::ContentNotFound { .. })`: nothing to render
///
/// # Errors
/// Returns `Err(ConvertError)` only for fatal errors:
/// - invalid URL, network failure, non-success HTTP status
/// - wkhtmltopdf missing or failing
/// - malformed date under [`crate::DatePolicy::Strict`]
pub async fn convert(
    url: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutcome, ConvertError> {
    let url = url.as_ref().trim();
    info!("Starting conversion: {}", url);

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_start(url);
    }

    let result = run(url, config).await;

    if let Some(ref cb) = config.progress_callback {
        cb.on_conversion_complete(matches!(result, Ok(ConversionOutcome::Rendered(_))));
    }
    result
}

async fn run(url: &str, config: &ConversionConfig) -> Result<ConversionOutcome, ConvertError> {
    let total_start = Instant::now();

    // ── Step 1: Validate input and resolve renderer ──────────────────────
    // Fail before touching the network when the engine is missing.
    fetch::validate_url(url)?;
    let renderer = render::resolve_renderer(config)?;

    // ── Step 2: Fetch ────────────────────────────────────────────────────
    stage_start(config, Stage::Fetch);
    let fetch_start = Instant::now();
    let bytes = fetch::fetch_page(url, config).await?;
    let fetch_duration_ms = fetch_start.elapsed().as_millis() as u64;
    stage_complete(config, Stage::Fetch);

    // ── Steps 3–5: Extract, rewrite, render ──────────────────────────────
    let stats = ConversionStats {
        fetched_bytes: bytes.len(),
        fetch_duration_ms,
        ..ConversionStats::default()
    };
    render_fetched(&bytes, url, config, renderer, stats, total_start).await
}

/// Run extract → rewrite → render on HTML the caller already holds.
///
/// `source_url` is only used as the prefix for relative image sources and
/// for reporting; nothing is fetched.
pub async fn convert_html(
    html: &[u8],
    source_url: &str,
    config: &ConversionConfig,
) -> Result<ConversionOutcome, ConvertError> {
    let renderer = render::resolve_renderer(config)?;
    let stats = ConversionStats {
        fetched_bytes: html.len(),
        ..ConversionStats::default()
    };
    render_fetched(html, source_url, config, renderer, stats, Instant::now()).await
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_sync(
    url: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ConversionOutcome, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(url, config))
}

/// Fetch a page and report what would be extracted, without rendering.
///
/// Does not require wkhtmltopdf.
pub async fn inspect(
    url: impl AsRef<str>,
    config: &ConversionConfig,
) -> Result<ExtractedContent, ConvertError> {
    let bytes = fetch::fetch_page(url.as_ref().trim(), config).await?;
    extract::extract(&bytes, config)
}

/// Extract and rewrite `html` into the document that would be rendered.
///
/// Returns `Ok(None)` when the content region is missing.
pub fn prepare_document(
    html: &[u8],
    source_url: &str,
    config: &ConversionConfig,
) -> Result<Option<RenderableDocument>, ConvertError> {
    let content = extract::extract(html, config)?;
    rewrite::rewrite(&content, source_url, config)
}

// ── Internal helpers ─────────────────────────────────────────────────────

async fn render_fetched(
    html: &[u8],
    source_url: &str,
    config: &ConversionConfig,
    renderer: Arc<dyn PdfRenderer>,
    mut stats: ConversionStats,
    total_start: Instant,
) -> Result<ConversionOutcome, ConvertError> {
    stage_start(config, Stage::Extract);
    let content = extract::extract(html, config)?;
    stage_complete(config, Stage::Extract);

    stage_start(config, Stage::Rewrite);
    let Some(doc) = rewrite::rewrite(&content, source_url, config)? else {
        warn!(
            "No element matching '{}' on {}; nothing to render",
            config.content_selector, source_url
        );
        return Ok(ConversionOutcome::ContentNotFound {
            selector: config.content_selector.clone(),
        });
    };
    stage_complete(config, Stage::Rewrite);

    stage_start(config, Stage::Render);
    let file_name = filename::output_file_name(content.title.as_deref());
    let output_path =
        filename::resolve_output_path(&config.output_dir, &file_name, config.collision_policy);

    let render_start = Instant::now();
    let pdf_path =
        render::render_document(&doc, &output_path, renderer, config.temp_dir.as_deref()).await?;
    stats.render_duration_ms = render_start.elapsed().as_millis() as u64;
    stage_complete(config, Stage::Render);

    stats.document_bytes = doc.html.len();
    stats.rewritten_images = doc.rewritten_images;
    stats.total_duration_ms = total_start.elapsed().as_millis() as u64;

    info!(
        "PDF written: {} ({}ms total)",
        pdf_path.display(),
        stats.total_duration_ms
    );

    Ok(ConversionOutcome::Rendered(ConversionOutput {
        pdf_path,
        source_url: source_url.to_string(),
        title: doc.title,
        published_date: doc.published_date,
        stats,
    }))
}

fn stage_start(config: &ConversionConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_start(stage);
    }
}

fn stage_complete(config: &ConversionConfig, stage: Stage) {
    if let Some(ref cb) = config.progress_callback {
        cb.on_stage_complete(stage);
    }
}
