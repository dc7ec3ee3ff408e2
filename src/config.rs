//! Configuration types for page-to-PDF conversion.
//!
//! All conversion behaviour is controlled through [`ConversionConfig`], built
//! via its [`ConversionConfigBuilder`]. The defaults reproduce the classic
//! behaviour: the `div.column.is-8-desktop` content region, the
//! `article:published_time` date tag, Finnish messages, output in the current
//! directory and silent overwrite of an existing PDF.

use crate::error::ConvertError;
use crate::messages::Messages;
use crate::pipeline::render::PdfRenderer;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// CSS selector for the article body.
pub const DEFAULT_CONTENT_SELECTOR: &str = "div.column.is-8-desktop";

/// `property` attribute of the publication-date `<meta>` tag.
pub const DEFAULT_DATE_PROPERTY: &str = "article:published_time";

/// Site credited in the attribution footer.
pub const DEFAULT_ORIGIN_NAME: &str = "verke.org";

/// Configuration for a single page conversion.
///
/// Built via [`ConversionConfig::builder()`] or using
/// [`ConversionConfig::default()`].
///
/// # Example
/// ```rust
/// use parsija::{CollisionPolicy, ConversionConfig};
///
/// let config = ConversionConfig::builder()
///     .output_dir("pdfs")
///     .collision_policy(CollisionPolicy::Timestamp)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ConversionConfig {
    /// CSS selector of the content region. Default: `div.column.is-8-desktop`.
    ///
    /// The first matching element in document order is taken verbatim.
    pub content_selector: String,

    /// `property` value of the publication-date `<meta>` tag.
    /// Default: `article:published_time`.
    pub date_property: String,

    /// What to do with a malformed publication date. Default: [`DatePolicy::Lenient`].
    pub date_policy: DatePolicy,

    /// What to do when the output file already exists. Default: [`CollisionPolicy::Overwrite`].
    pub collision_policy: CollisionPolicy,

    /// Directory the PDF is written to. Default: `.` (current directory).
    pub output_dir: PathBuf,

    /// Directory for the temporary HTML file. Default: system temp dir.
    pub temp_dir: Option<PathBuf>,

    /// Pre-constructed renderer. Takes precedence over `renderer_path`.
    pub renderer: Option<Arc<dyn PdfRenderer>>,

    /// Explicit wkhtmltopdf executable. If None, it is located automatically.
    pub renderer_path: Option<PathBuf>,

    /// Flags passed to the renderer.
    pub renderer_options: RendererOptions,

    /// HTTP timeout in seconds. Default: None (wait indefinitely).
    pub fetch_timeout_secs: Option<u64>,

    /// `User-Agent` header for the page request.
    pub user_agent: String,

    /// Site name credited in the footer. Default: `verke.org`.
    pub origin_name: String,

    /// String table for sentinels, footer and status messages. Default: Finnish.
    pub messages: Messages,

    /// Receives real stage events as the pipeline runs.
    pub progress_callback: Option<ProgressCallback>,

    /// Length of the cosmetic 0–100 progress ramp. Default: 5 s.
    ///
    /// The ramp is an animation, not a measurement; see
    /// [`crate::worker::ConversionEvent::Progress`].
    pub progress_ramp: Duration,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            content_selector: DEFAULT_CONTENT_SELECTOR.to_string(),
            date_property: DEFAULT_DATE_PROPERTY.to_string(),
            date_policy: DatePolicy::default(),
            collision_policy: CollisionPolicy::default(),
            output_dir: PathBuf::from("."),
            temp_dir: None,
            renderer: None,
            renderer_path: None,
            renderer_options: RendererOptions::default(),
            fetch_timeout_secs: None,
            user_agent: concat!("parsija/", env!("CARGO_PKG_VERSION")).to_string(),
            origin_name: DEFAULT_ORIGIN_NAME.to_string(),
            messages: Messages::default(),
            progress_callback: None,
            progress_ramp: Duration::from_secs(5),
        }
    }
}

impl fmt::Debug for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionConfig")
            .field("content_selector", &self.content_selector)
            .field("date_property", &self.date_property)
            .field("date_policy", &self.date_policy)
            .field("collision_policy", &self.collision_policy)
            .field("output_dir", &self.output_dir)
            .field("temp_dir", &self.temp_dir)
            .field("renderer", &self.renderer.as_ref().map(|_| "<dyn PdfRenderer>"))
            .field("renderer_path", &self.renderer_path)
            .field("renderer_options", &self.renderer_options)
            .field("fetch_timeout_secs", &self.fetch_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("origin_name", &self.origin_name)
            .field("progress_ramp", &self.progress_ramp)
            .finish()
    }
}

impl ConversionConfig {
    /// Create a new builder for `ConversionConfig`.
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug)]
pub struct ConversionConfigBuilder {
    config: ConversionConfig,
}

impl ConversionConfigBuilder {
    pub fn content_selector(mut self, selector: impl Into<String>) -> Self {
        self.config.content_selector = selector.into();
        self
    }

    pub fn date_property(mut self, property: impl Into<String>) -> Self {
        self.config.date_property = property.into();
        self
    }

    pub fn date_policy(mut self, policy: DatePolicy) -> Self {
        self.config.date_policy = policy;
        self
    }

    pub fn collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.config.collision_policy = policy;
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.temp_dir = Some(dir.into());
        self
    }

    pub fn renderer(mut self, renderer: Arc<dyn PdfRenderer>) -> Self {
        self.config.renderer = Some(renderer);
        self
    }

    pub fn renderer_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.renderer_path = Some(path.into());
        self
    }

    pub fn renderer_options(mut self, options: RendererOptions) -> Self {
        self.config.renderer_options = options;
        self
    }

    pub fn fetch_timeout_secs(mut self, secs: u64) -> Self {
        self.config.fetch_timeout_secs = Some(secs);
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn origin_name(mut self, name: impl Into<String>) -> Self {
        self.config.origin_name = name.into();
        self
    }

    pub fn messages(mut self, messages: Messages) -> Self {
        self.config.messages = messages;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    pub fn progress_ramp(mut self, duration: Duration) -> Self {
        self.config.progress_ramp = duration;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ConversionConfig, ConvertError> {
        let c = &self.config;
        if let Err(e) = scraper::Selector::parse(&c.content_selector) {
            return Err(ConvertError::InvalidConfig(format!(
                "content selector '{}' is not valid CSS: {}",
                c.content_selector, e
            )));
        }
        if c.date_property.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "date property must not be empty".into(),
            ));
        }
        if c.user_agent.trim().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "user agent must not be empty".into(),
            ));
        }
        if c.fetch_timeout_secs == Some(0) {
            return Err(ConvertError::InvalidConfig(
                "fetch timeout must be ≥ 1 second".into(),
            ));
        }
        Ok(self.config)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Handling of a publication date that is present but not ISO-8601.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DatePolicy {
    /// Log a warning and print the "unknown date" sentinel. (default)
    #[default]
    Lenient,
    /// Abort the conversion with [`ConvertError::DateParse`].
    Strict,
}

/// Handling of an output file that already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CollisionPolicy {
    /// Replace the existing file. (default)
    #[default]
    Overwrite,
    /// Keep the existing file; append `-YYYYmmdd-HHMMSS` to the new one.
    Timestamp,
}

/// Renderer flags. Each maps to a wkhtmltopdf `--enable-*` switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererOptions {
    /// `--enable-local-file-access`
    pub local_file_access: bool,
    /// `--enable-external-links`
    pub external_links: bool,
    /// `--enable-internal-links`
    pub internal_links: bool,
}

impl Default for RendererOptions {
    fn default() -> Self {
        Self {
            local_file_access: true,
            external_links: true,
            internal_links: true,
        }
    }
}

impl RendererOptions {
    /// Command-line switches for the enabled options, in a stable order.
    pub fn to_args(self) -> Vec<&'static str> {
        let mut args = Vec::with_capacity(3);
        if self.local_file_access {
            args.push("--enable-local-file-access");
        }
        if self.external_links {
            args.push("--enable-external-links");
        }
        if self.internal_links {
            args.push("--enable-internal-links");
        }
        args
    }
}
