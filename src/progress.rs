//! Progress-callback trait for real pipeline stage events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to learn when
//! each stage (fetch → extract → rewrite → render) starts and finishes.
//!
//! These events reflect actual work. The 0–100 ramp emitted by
//! [`crate::worker`] does not; it is a fixed-duration animation.
//!
//! # Example
//!
//! ```rust
//! use parsija::{ConversionConfig, ConversionProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     finished: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage) {
//!         self.finished.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { finished: AtomicUsize::new(0) });
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// One step of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    Fetch,
    Extract,
    Rewrite,
    Render,
}

impl Stage {
    /// All stages in execution order.
    pub const ALL: [Stage; 4] = [Stage::Fetch, Stage::Extract, Stage::Rewrite, Stage::Render];
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Extract => "extract",
            Stage::Rewrite => "rewrite",
            Stage::Render => "render",
        };
        f.write_str(name)
    }
}

/// Called by the conversion pipeline as it moves through its stages.
///
/// Implementations must be `Send + Sync`: the pipeline runs on a tokio task
/// and the render stage on a blocking thread. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the fetch starts.
    fn on_conversion_start(&self, url: &str) {
        let _ = url;
    }

    /// Called when a stage begins.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage finishes without error.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once at the end. `produced_pdf` is false on not-found and on error.
    fn on_conversion_complete(&self, produced_pdf: bool) {
        let _ = produced_pdf;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;
