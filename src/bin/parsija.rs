//! CLI binary for parsija.
//!
//! A thin shim over the library crate that maps CLI flags
//! to `ConversionConfig`, drives a background `Converter` and prints the
//! terminal message.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use parsija::{
    inspect, CollisionPolicy, ConversionConfig, ConversionEvent, Converter, DatePolicy,
    FinishedMessage, Messages,
};
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Exit status when the page has no content region.
const EXIT_CONTENT_NOT_FOUND: i32 = 2;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Convert an article into the current directory
  parsija https://www.verke.org/artikkelit/esimerkki/

  # Write into a folder, keep earlier PDFs with the same title
  parsija -o pdfs --on-collision timestamp https://www.verke.org/artikkelit/esimerkki/

  # English messages and footer
  parsija --lang en https://www.verke.org/artikkelit/esimerkki/

  # Show what would be extracted (no wkhtmltopdf needed)
  parsija --inspect-only https://www.verke.org/artikkelit/esimerkki/

  # Check that wkhtmltopdf can be found
  parsija --check-renderer

EXIT STATUS:
  0  PDF written
  1  error (network, renderer, invalid input)
  2  page has no element matching the content selector

ENVIRONMENT VARIABLES:
  WKHTMLTOPDF_PATH   Path to the wkhtmltopdf executable, skips discovery
  RUST_LOG           Log filter, overrides -v / -q (e.g. parsija=debug)
  Every flag also reads PARSIJA_<FLAG>, e.g. PARSIJA_OUTPUT_DIR=pdfs.
"#;

/// Fetch an article page and render its content to PDF via wkhtmltopdf.
#[derive(Parser, Debug)]
#[command(
    name = "parsija",
    version,
    about = "Fetch an article page and render its content to PDF via wkhtmltopdf",
    long_about = "Fetch an article page, take its headline, publication date and main content \
region, make image sources absolute, add an attribution footer and render the result to \
'<headline>.pdf' with wkhtmltopdf.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Article URL (http or https).
    #[arg(required_unless_present = "check_renderer")]
    url: Option<String>,

    /// Directory the PDF is written to.
    #[arg(short, long = "output-dir", env = "PARSIJA_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// CSS selector of the content region.
    #[arg(long, env = "PARSIJA_SELECTOR", default_value = parsija::config::DEFAULT_CONTENT_SELECTOR)]
    selector: String,

    /// `property` of the publication-date meta tag.
    #[arg(long, env = "PARSIJA_DATE_PROPERTY", default_value = parsija::config::DEFAULT_DATE_PROPERTY)]
    date_property: String,

    /// Fail on a malformed publication date instead of printing "unknown date".
    #[arg(long, env = "PARSIJA_STRICT_DATES")]
    strict_dates: bool,

    /// What to do when the PDF already exists.
    #[arg(long, env = "PARSIJA_ON_COLLISION", value_enum, default_value = "overwrite")]
    on_collision: CollisionArg,

    /// Path to the wkhtmltopdf executable.
    #[arg(long, env = "PARSIJA_WKHTMLTOPDF")]
    wkhtmltopdf: Option<PathBuf>,

    /// Language of messages and footer.
    #[arg(long, env = "PARSIJA_LANG", value_enum, default_value = "fi")]
    lang: LangArg,

    /// HTTP timeout in seconds (default: none).
    #[arg(long, env = "PARSIJA_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Duration of the progress bar animation in seconds.
    #[arg(long, env = "PARSIJA_PROGRESS_SECS", default_value_t = 5.0)]
    progress_secs: f64,

    /// Fetch and print title, date and content size only; no PDF.
    #[arg(long)]
    inspect_only: bool,

    /// Locate wkhtmltopdf, print its path and version, and exit.
    #[arg(long)]
    check_renderer: bool,

    /// Print the result as JSON on stdout.
    #[arg(long, env = "PARSIJA_JSON")]
    json: bool,

    /// Disable progress bar.
    #[arg(long, env = "PARSIJA_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PARSIJA_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PARSIJA_QUIET")]
    quiet: bool,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum CollisionArg {
    Overwrite,
    Timestamp,
}

impl From<CollisionArg> for CollisionPolicy {
    fn from(v: CollisionArg) -> Self {
        match v {
            CollisionArg::Overwrite => CollisionPolicy::Overwrite,
            CollisionArg::Timestamp => CollisionPolicy::Timestamp,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LangArg {
    Fi,
    En,
}

impl From<LangArg> for Messages {
    fn from(v: LangArg) -> Self {
        match v {
            LangArg::Fi => Messages::finnish(),
            LangArg::En => Messages::english(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the feedback; INFO logs would tear it.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Renderer check ───────────────────────────────────────────────────
    if cli.check_renderer {
        return check_renderer(&cli);
    }

    let config = build_config(&cli).context("Invalid configuration")?;
    let url = cli.url.clone().unwrap_or_default();

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let content = inspect(&url, &config)
            .await
            .context("Failed to inspect page")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&content).context("Failed to serialize content")?
            );
        } else {
            println!("URL:          {}", url);
            println!(
                "Title:        {}",
                content.display_title(&config.messages.no_title)
            );
            println!(
                "Published:    {}",
                content.published.display_or(&config.messages.unknown_date)
            );
            match content.fragment {
                Some(ref f) => println!("Content:      {} bytes ({})", f.len(), config.content_selector),
                None => println!("Content:      {}", config.messages.content_not_found),
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let messages = config.messages.clone();
    let converter = Converter::new(config);
    let mut handle = converter.start(url).context("Failed to start conversion")?;

    let bar = show_progress.then(|| progress_bar(&messages));
    let mut finished = None;

    while let Some(event) = handle.next_event().await {
        match event {
            ConversionEvent::Progress { percent } => {
                if let Some(ref bar) = bar {
                    bar.set_position(u64::from(percent));
                }
            }
            ConversionEvent::Stage { stage, done } => {
                if let Some(ref bar) = bar {
                    if done {
                        bar.println(format!("  {} {}", green("✓"), stage));
                    } else {
                        bar.set_message(format!("{stage}…"));
                    }
                }
            }
            ConversionEvent::Finished { message } => finished = Some(message),
        }
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let message = finished.context("Conversion ended without a result")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&message).context("Failed to serialise result")?
        );
    }

    let line = message.render(&messages);
    match message {
        FinishedMessage::Success { ref output } => {
            if !cli.quiet && !cli.json {
                eprintln!("{} {}", green("✔"), bold(&line));
                eprintln!(
                    "   {}",
                    dim(&format!(
                        "{} image(s) rewritten, {}ms total",
                        output.stats.rewritten_images, output.stats.total_duration_ms
                    ))
                );
            }
            Ok(())
        }
        FinishedMessage::ContentNotFound => {
            if !cli.json {
                eprintln!("{} {}", yellow("⚠"), line);
            }
            std::process::exit(EXIT_CONTENT_NOT_FOUND);
        }
        FinishedMessage::Failed { .. } | FinishedMessage::InvalidUrl => {
            eprintln!("{} {}", red("✘"), line);
            anyhow::bail!("Conversion failed")
        }
    }
}

/// Spinner-plus-bar for the 0–100 ramp.
fn progress_bar(messages: &Messages) -> ProgressBar {
    let bar = ProgressBar::new(100);
    let style = ProgressStyle::with_template(
        "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
    )
    .unwrap_or_else(|_| ProgressStyle::default_bar())
    .progress_chars("█▉▊▋▌▍▎▏  ")
    .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

    bar.set_style(style);
    bar.set_prefix(messages.converting.clone());
    bar.enable_steady_tick(Duration::from_millis(80));
    bar
}

/// `--progress-secs` as a `Duration`; rejects negative, NaN and overflowing values.
fn ramp_duration(secs: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(secs)
        .with_context(|| format!("--progress-secs {secs} is not a usable duration"))
}

/// Map CLI args to `ConversionConfig`.
fn build_config(cli: &Cli) -> Result<ConversionConfig> {
    let mut builder = ConversionConfig::builder()
        .output_dir(&cli.output_dir)
        .content_selector(&cli.selector)
        .date_property(&cli.date_property)
        .date_policy(if cli.strict_dates {
            DatePolicy::Strict
        } else {
            DatePolicy::Lenient
        })
        .collision_policy(cli.on_collision.into())
        .messages(cli.lang.into())
        .progress_ramp(ramp_duration(cli.progress_secs)?);

    if let Some(ref path) = cli.wkhtmltopdf {
        builder = builder.renderer_path(path);
    }
    if let Some(secs) = cli.timeout {
        builder = builder.fetch_timeout_secs(secs);
    }

    Ok(builder.build()?)
}

fn check_renderer(cli: &Cli) -> Result<()> {
    let path = wkhtmltopdf_locate::locate(cli.wkhtmltopdf.as_deref())
        .context("wkhtmltopdf not available")?;
    let version = wkhtmltopdf_locate::query_version(&path)
        .with_context(|| format!("Failed to run {}", path.display()))?;

    if cli.json {
        println!(
            "{}",
            serde_json::json!({ "path": path, "version": version })
        );
    } else {
        println!("Path:     {}", path.display());
        println!("Version:  {}", version);
    }
    Ok(())
}
