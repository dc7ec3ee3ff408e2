//! Background conversion with an event channel.
//!
//! A [`Converter`] runs [`crate::convert::convert`] on a tokio task and
//! reports back over a channel, so an interactive caller stays responsive
//! while the page is fetched and rendered.
//!
//! Events for one run:
//!
//! ```text
//! Progress(0) .. Stage{fetch,start} .. Progress(n) .. Stage{render,done} .. Finished(_)
//! ```
//!
//! `Progress` is a fixed-duration linear ramp from 0 to 100, independent of
//! what the pipeline is doing. It is an animation, not a measurement: it
//! always runs to 100, so a fast run waits for the ramp to end and a slow
//! one may sit at 100 for a while. `Stage` events come from the pipeline
//! itself. Exactly one `Finished` is sent, always last and always after
//! `Progress { percent: 100 }`, after which the channel closes.

use crate::config::ConversionConfig;
use crate::convert::convert;
use crate::error::ConvertError;
use crate::messages::{fill, Messages};
use crate::output::{ConversionOutcome, ConversionOutput};
use crate::progress::{ConversionProgressCallback, ProgressCallback, Stage};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

/// Number of steps in the progress ramp; values run `0..=RAMP_STEPS`.
pub const RAMP_STEPS: u8 = 100;

/// One event of a background conversion.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ConversionEvent {
    /// Cosmetic ramp value in `0..=100`.
    Progress { percent: u8 },
    /// A pipeline stage started (`done = false`) or finished (`done = true`).
    Stage { stage: Stage, done: bool },
    /// Terminal event.
    Finished { message: FinishedMessage },
}

/// How a background run ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FinishedMessage {
    Success { output: ConversionOutput },
    ContentNotFound,
    Failed { error: String },
    /// The submitted URL was empty.
    InvalidUrl,
}

impl FinishedMessage {
    /// Localised line for the user.
    pub fn render(&self, messages: &Messages) -> String {
        match self {
            FinishedMessage::Success { output } => fill(
                &messages.success,
                &[("path", &output.pdf_path.display().to_string())],
            ),
            FinishedMessage::ContentNotFound => messages.content_not_found.clone(),
            FinishedMessage::Failed { error } => fill(&messages.failure, &[("error", error)]),
            FinishedMessage::InvalidUrl => messages.enter_valid_url.clone(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FinishedMessage::Success { .. })
    }

    fn from_result(result: Result<ConversionOutcome, ConvertError>) -> Self {
        match result {
            Ok(ConversionOutcome::Rendered(output)) => FinishedMessage::Success { output },
            Ok(ConversionOutcome::ContentNotFound { .. }) => FinishedMessage::ContentNotFound,
            Err(e) => FinishedMessage::Failed {
                error: e.to_string(),
            },
        }
    }
}

/// Runs conversions in the background, one at a time.
///
/// `start` must be called from within a tokio runtime.
#[derive(Debug, Clone)]
pub struct Converter {
    config: ConversionConfig,
    busy: Arc<AtomicBool>,
}

impl Converter {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            config,
            busy: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &ConversionConfig {
        &self.config
    }

    /// `true` while a started run has not yet sent `Finished`.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Start converting `url` in the background.
    ///
    /// A blank URL does not start anything: the returned handle yields a
    /// single `Finished(InvalidUrl)`.
    ///
    /// # Errors
    /// [`ConvertError::Busy`] if a previous run on this converter (or a
    /// clone of it) is still active.
    pub fn start(&self, url: impl Into<String>) -> Result<ConversionHandle, ConvertError> {
        let url = url.into().trim().to_string();
        let (tx, rx) = mpsc::unbounded_channel();

        if url.is_empty() {
            debug!("Blank URL submitted; not starting");
            let _ = tx.send(ConversionEvent::Finished {
                message: FinishedMessage::InvalidUrl,
            });
            return Ok(ConversionHandle { events: rx });
        }

        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Rejected {}: a conversion is already running", url);
            return Err(ConvertError::Busy);
        }
        let guard = BusyGuard(Arc::clone(&self.busy));

        let mut config = self.config.clone();
        config.progress_callback = Some(Arc::new(ChannelCallback {
            tx: tx.clone(),
            inner: config.progress_callback.take(),
        }));

        tokio::spawn(async move {
            info!("Background conversion started: {}", url);
            let ramp = tokio::spawn(run_ramp(tx.clone(), config.progress_ramp));

            let result = convert(&url, &config).await;

            // Finished goes out only once the ramp has reached 100.
            if let Err(e) = ramp.await {
                warn!("Progress ramp task ended abnormally: {}", e);
            }

            let message = FinishedMessage::from_result(result);
            drop(guard);
            let _ = tx.send(ConversionEvent::Finished { message });
        });

        Ok(ConversionHandle { events: rx })
    }
}

/// Receiving end of one background run.
#[derive(Debug)]
pub struct ConversionHandle {
    pub(crate) events: UnboundedReceiver<ConversionEvent>,
}

impl ConversionHandle {
    /// Next event, or `None` once `Finished` has been received.
    pub async fn next_event(&mut self) -> Option<ConversionEvent> {
        self.events.recv().await
    }

    /// Drain all events and return the terminal message.
    pub async fn wait(mut self) -> FinishedMessage {
        while let Some(event) = self.events.recv().await {
            if let ConversionEvent::Finished { message } = event {
                return message;
            }
        }
        // The task always sends Finished before dropping its sender.
        FinishedMessage::Failed {
            error: ConvertError::Internal("conversion task ended without a result".into())
                .to_string(),
        }
    }
}

/// Emit `0..=RAMP_STEPS` evenly spread over `duration`.
///
/// Stops early when the receiver is gone.
pub(crate) async fn run_ramp(tx: UnboundedSender<ConversionEvent>, duration: Duration) {
    let step = duration / u32::from(RAMP_STEPS);
    for percent in 0..=RAMP_STEPS {
        if percent > 0 && !step.is_zero() {
            tokio::time::sleep(step).await;
        }
        if tx.send(ConversionEvent::Progress { percent }).is_err() {
            return;
        }
    }
}

struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Forwards stage callbacks into the event channel, then to the caller's
/// own callback if one was configured.
struct ChannelCallback {
    tx: UnboundedSender<ConversionEvent>,
    inner: Option<ProgressCallback>,
}

impl ConversionProgressCallback for ChannelCallback {
    fn on_conversion_start(&self, url: &str) {
        if let Some(ref cb) = self.inner {
            cb.on_conversion_start(url);
        }
    }

    fn on_stage_start(&self, stage: Stage) {
        let _ = self.tx.send(ConversionEvent::Stage { stage, done: false });
        if let Some(ref cb) = self.inner {
            cb.on_stage_start(stage);
        }
    }

    fn on_stage_complete(&self, stage: Stage) {
        let _ = self.tx.send(ConversionEvent::Stage { stage, done: true });
        if let Some(ref cb) = self.inner {
            cb.on_stage_complete(stage);
        }
    }

    fn on_conversion_complete(&self, produced_pdf: bool) {
        if let Some(ref cb) = self.inner {
            cb.on_conversion_complete(produced_pdf);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ConversionStats;
    use crate::pipeline::render::PdfRenderer;
    use std::path::{Path, PathBuf};

    struct StubRenderer;

    impl PdfRenderer for StubRenderer {
        fn render(&self, _html: &Path, output_path: &Path) -> Result<(), ConvertError> {
            std::fs::write(output_path, b"%PDF-1.4\n").unwrap();
            Ok(())
        }
    }

    fn converter(ramp: Duration) -> Converter {
        Converter::new(
            ConversionConfig::builder()
                .renderer(Arc::new(StubRenderer))
                .fetch_timeout_secs(1)
                .progress_ramp(ramp)
                .build()
                .unwrap(),
        )
    }

    async fn collect(mut handle: ConversionHandle) -> Vec<ConversionEvent> {
        let mut events = Vec::new();
        while let Some(e) = handle.next_event().await {
            events.push(e);
        }
        events
    }

    fn finished_count(events: &[ConversionEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, ConversionEvent::Finished { .. }))
            .count()
    }

    #[tokio::test]
    async fn ramp_emits_every_value_in_order() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_ramp(tx, Duration::ZERO).await;

        let mut values = Vec::new();
        while let Some(ConversionEvent::Progress { percent }) = rx.recv().await {
            values.push(percent);
        }
        assert_eq!(values, (0..=100).collect::<Vec<u8>>());
    }

    #[tokio::test]
    async fn ramp_stops_when_receiver_dropped() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        run_ramp(tx, Duration::from_secs(3600)).await;
    }

    #[tokio::test]
    async fn blank_url_finishes_with_invalid_url() {
        let c = converter(Duration::ZERO);
        let events = collect(c.start("   ").unwrap()).await;

        assert_eq!(events.len(), 1);
        match &events[0] {
            ConversionEvent::Finished { message } => {
                assert!(matches!(message, FinishedMessage::InvalidUrl));
                assert_eq!(message.render(&Messages::finnish()), "Syötä kelvollinen URL.");
            }
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn failure_sends_exactly_one_finished_last() {
        let c = converter(Duration::from_millis(20));
        let events = collect(c.start("ftp://example.com/").unwrap()).await;

        assert_eq!(finished_count(&events), 1);
        match events.last() {
            Some(ConversionEvent::Finished {
                message: FinishedMessage::Failed { error },
            }) => assert!(error.contains("Invalid URL"), "got: {error}"),
            other => panic!("unexpected last event: {other:?}"),
        }
        assert!(!c.is_busy());
    }

    #[tokio::test]
    async fn quick_failure_still_ramps_to_100_before_finished() {
        let c = converter(Duration::from_millis(100));
        let events = collect(c.start("ftp://example.com/").unwrap()).await;

        let progress: Vec<u8> = events
            .iter()
            .filter_map(|e| match e {
                ConversionEvent::Progress { percent } => Some(*percent),
                _ => None,
            })
            .collect();
        assert_eq!(progress, (0..=100).collect::<Vec<u8>>());

        let n = events.len();
        assert!(matches!(events[n - 1], ConversionEvent::Finished { .. }));
        assert!(matches!(
            events[n - 2],
            ConversionEvent::Progress { percent: 100 }
        ));
    }

    #[tokio::test]
    async fn second_start_while_running_is_busy() {
        // Accepts connections but never answers, so the first run sits in fetch.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((sock, _)) = listener.accept().await {
                held.push(sock);
            }
        });

        let c = converter(Duration::from_millis(50));
        let first = c.start(format!("http://{addr}/")).unwrap();
        assert!(c.is_busy());
        assert!(matches!(
            c.clone().start(format!("http://{addr}/")),
            Err(ConvertError::Busy)
        ));

        let message = first.wait().await;
        assert!(matches!(message, FinishedMessage::Failed { .. }));
        assert!(!c.is_busy());

        // Free again after the first run finished.
        let again = c.start("ftp://example.com/").unwrap();
        assert!(matches!(again.wait().await, FinishedMessage::Failed { .. }));
    }

    #[test]
    fn finished_messages_render_localised() {
        let output = ConversionOutput {
            pdf_path: PathBuf::from("Test Article.pdf"),
            source_url: "https://e/".into(),
            title: "Test Article".into(),
            published_date: "15.01.2024".into(),
            stats: ConversionStats::default(),
        };
        let fi = Messages::finnish();
        let en = Messages::english();

        assert_eq!(
            FinishedMessage::Success { output }.render(&fi),
            "PDF luotu onnistuneesti: Test Article.pdf"
        );
        assert_eq!(
            FinishedMessage::ContentNotFound.render(&fi),
            "Haluttua div-elementtiä ei löytynyt sivulta."
        );
        assert_eq!(
            FinishedMessage::Failed { error: "boom".into() }.render(&en),
            "Error: boom"
        );
    }
}
