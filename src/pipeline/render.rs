//! PDF rendering: hand the assembled HTML to an external engine.
//!
//! ## Why a temporary file?
//!
//! wkhtmltopdf reads its input from a path. Each run writes the document to
//! its own `NamedTempFile` (unique name, `.html` suffix so the engine treats
//! it as HTML). The handle is moved into the blocking render task and
//! dropped there, so the file is removed on success, on error and on panic.
//! Two overlapping runs never share a temp file.
//!
//! ## Why spawn_blocking?
//!
//! Rendering waits on a child process for seconds. Running it on the
//! blocking pool keeps tokio worker threads free for the progress ramp and
//! for other conversions.

use crate::config::{ConversionConfig, RendererOptions};
use crate::error::ConvertError;
use crate::pipeline::rewrite::RenderableDocument;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An HTML-to-PDF engine.
///
/// Implementations are called from a blocking thread and may block.
pub trait PdfRenderer: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str {
        "custom"
    }

    /// Render the HTML file at `html_path` into a PDF at `output_path`.
    fn render(&self, html_path: &Path, output_path: &Path) -> Result<(), ConvertError>;
}

/// The wkhtmltopdf command-line renderer.
#[derive(Debug, Clone)]
pub struct WkHtmlToPdf {
    binary: PathBuf,
    options: RendererOptions,
}

impl WkHtmlToPdf {
    pub fn new(binary: impl Into<PathBuf>, options: RendererOptions) -> Self {
        Self {
            binary: binary.into(),
            options,
        }
    }

    /// Find the executable (explicit path first, then automatic discovery).
    pub fn locate(explicit: Option<&Path>, options: RendererOptions) -> Result<Self, ConvertError> {
        let binary = match explicit {
            Some(p) => wkhtmltopdf_locate::locate(Some(p))?,
            None => wkhtmltopdf_locate::locate_wkhtmltopdf()?,
        };
        debug!("Using wkhtmltopdf at {}", binary.display());
        Ok(Self::new(binary, options))
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Full argument list: `--quiet`, enabled `--enable-*` switches, input, output.
    pub fn args(&self, html_path: &Path, output_path: &Path) -> Vec<OsString> {
        let mut args = vec![OsString::from("--quiet")];
        args.extend(self.options.to_args().into_iter().map(OsString::from));
        args.push(html_path.as_os_str().to_owned());
        args.push(output_path.as_os_str().to_owned());
        args
    }
}

impl PdfRenderer for WkHtmlToPdf {
    fn name(&self) -> &str {
        "wkhtmltopdf"
    }

    fn render(&self, html_path: &Path, output_path: &Path) -> Result<(), ConvertError> {
        // A leftover file from an earlier run must not count as output of this one.
        match std::fs::remove_file(output_path) {
            Ok(()) => debug!("Removed previous {}", output_path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(ConvertError::OutputWriteFailed {
                    path: output_path.to_path_buf(),
                    source: e,
                })
            }
        }

        let output = Command::new(&self.binary)
            .args(self.args(html_path, output_path))
            .output()
            .map_err(|e| ConvertError::RenderFailed {
                detail: format!("could not run '{}': {}", self.binary.display(), e),
            })?;

        let produced = output_path.metadata().map(|m| m.len() > 0).unwrap_or(false);
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if output.status.success() && produced {
            return Ok(());
        }

        // wkhtmltopdf exits 1 when a sub-resource (e.g. one image) fails to
        // load but still writes the PDF.
        if produced {
            warn!(
                "wkhtmltopdf exited with {} but produced {}: {}",
                output.status,
                output_path.display(),
                stderr
            );
            return Ok(());
        }

        Err(ConvertError::RenderFailed {
            detail: if stderr.is_empty() {
                format!("wkhtmltopdf exited with {} and wrote no output", output.status)
            } else {
                format!("wkhtmltopdf exited with {}: {}", output.status, stderr)
            },
        })
    }
}

/// The renderer to use for `config`: the injected one, else wkhtmltopdf.
pub fn resolve_renderer(config: &ConversionConfig) -> Result<Arc<dyn PdfRenderer>, ConvertError> {
    if let Some(ref renderer) = config.renderer {
        return Ok(Arc::clone(renderer));
    }
    let wk = WkHtmlToPdf::locate(config.renderer_path.as_deref(), config.renderer_options)?;
    Ok(Arc::new(wk))
}

/// Write `doc` to a temp file, render it to `output_path`, remove the temp file.
///
/// Creates the output directory if needed. Returns `output_path` on success.
pub async fn render_document(
    doc: &RenderableDocument,
    output_path: &Path,
    renderer: Arc<dyn PdfRenderer>,
    temp_dir: Option<&Path>,
) -> Result<PathBuf, ConvertError> {
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| ConvertError::OutputWriteFailed {
                path: output_path.to_path_buf(),
                source: e,
            })?;
    }

    let tmp = write_temp_html(&doc.html, temp_dir)?;
    debug!("Wrote {} bytes to {}", doc.html.len(), tmp.path().display());

    let out = output_path.to_path_buf();
    let engine = renderer.name().to_string();
    info!("Rendering '{}' with {} → {}", doc.title, engine, out.display());

    tokio::task::spawn_blocking(move || {
        let result = renderer.render(tmp.path(), &out);
        drop(tmp);
        result.map(|()| out)
    })
    .await
    .map_err(|e| ConvertError::Internal(format!("Render task panicked: {}", e)))?
}

fn write_temp_html(
    html: &str,
    temp_dir: Option<&Path>,
) -> Result<tempfile::NamedTempFile, ConvertError> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("parsija-").suffix(".html");
    let mut tmp = match temp_dir {
        Some(dir) => builder.tempfile_in(dir),
        None => builder.tempfile(),
    }
    .map_err(|source| ConvertError::TempFile { source })?;

    tmp.write_all(html.as_bytes())
        .and_then(|()| tmp.flush())
        .map_err(|source| ConvertError::TempFile { source })?;
    Ok(tmp)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Copies the HTML it receives and writes a stub PDF.
    #[derive(Default)]
    struct StubRenderer {
        seen: Mutex<Vec<(PathBuf, String)>>,
    }

    impl PdfRenderer for StubRenderer {
        fn render(&self, html_path: &Path, output_path: &Path) -> Result<(), ConvertError> {
            let html = std::fs::read_to_string(html_path).unwrap();
            self.seen.lock().unwrap().push((html_path.to_path_buf(), html));
            std::fs::write(output_path, b"%PDF-1.4\n%stub\n").unwrap();
            Ok(())
        }
    }

    struct FailingRenderer;

    impl PdfRenderer for FailingRenderer {
        fn render(&self, _html_path: &Path, _output_path: &Path) -> Result<(), ConvertError> {
            Err(ConvertError::RenderFailed {
                detail: "boom".into(),
            })
        }
    }

    fn doc() -> RenderableDocument {
        RenderableDocument {
            title: "T".into(),
            published_date: "01.01.2024".into(),
            html: "<!DOCTYPE html><html><body><h1>T</h1></body></html>".into(),
            rewritten_images: 0,
        }
    }

    fn dir_is_empty(dir: &Path) -> bool {
        std::fs::read_dir(dir).unwrap().next().is_none()
    }

    #[test]
    fn wkhtmltopdf_args_order() {
        let wk = WkHtmlToPdf::new("/usr/bin/wkhtmltopdf", RendererOptions::default());
        let args = wk.args(Path::new("/tmp/in.html"), Path::new("out.pdf"));
        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            [
                "--quiet",
                "--enable-local-file-access",
                "--enable-external-links",
                "--enable-internal-links",
                "/tmp/in.html",
                "out.pdf"
            ]
        );
    }

    #[test]
    fn missing_binary_is_render_failed() {
        let dir = tempfile::tempdir().unwrap();
        let wk = WkHtmlToPdf::new(dir.path().join("nope"), RendererOptions::default());
        let err = wk
            .render(&dir.path().join("in.html"), &dir.path().join("out.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::RenderFailed { .. }));
    }

    #[test]
    fn locate_with_missing_explicit_path() {
        let err = WkHtmlToPdf::locate(
            Some(Path::new("/definitely/not/wkhtmltopdf")),
            RendererOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ConvertError::RendererNotFound(_)));
    }

    #[test]
    fn injected_renderer_takes_precedence() {
        let config = ConversionConfig::builder()
            .renderer(Arc::new(StubRenderer::default()))
            .renderer_path("/definitely/not/wkhtmltopdf")
            .build()
            .unwrap();
        let r = resolve_renderer(&config).unwrap();
        assert_eq!(r.name(), "custom");
    }

    #[tokio::test]
    async fn renders_and_removes_temp_file() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let stub = Arc::new(StubRenderer::default());
        let out = out_dir.path().join("nested").join("T.pdf");

        let path = render_document(&doc(), &out, stub.clone(), Some(tmp_dir.path()))
            .await
            .unwrap();

        assert_eq!(path, out);
        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));

        let seen = stub.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        let (html_path, html) = &seen[0];
        assert!(html.contains("<h1>T</h1>"));
        assert_eq!(html_path.extension().unwrap(), "html");
        assert!(!html_path.exists(), "temp file must be removed");
        assert!(dir_is_empty(tmp_dir.path()));
    }

    #[tokio::test]
    async fn temp_file_removed_on_failure() {
        let tmp_dir = tempfile::tempdir().unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        let err = render_document(
            &doc(),
            &out_dir.path().join("T.pdf"),
            Arc::new(FailingRenderer),
            Some(tmp_dir.path()),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("boom"));
        assert!(dir_is_empty(tmp_dir.path()));
        assert!(!out_dir.path().join("T.pdf").exists());
    }

    #[cfg(unix)]
    #[test]
    fn wkhtmltopdf_runs_the_executable() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-wkhtmltopdf");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor last; do :; done\nprintf '%%PDF-1.4\\n' > \"$last\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let html = dir.path().join("in.html");
        std::fs::write(&html, "<p>x</p>").unwrap();
        let out = dir.path().join("out.pdf");

        WkHtmlToPdf::new(&script, RendererOptions::default())
            .render(&html, &out)
            .unwrap();
        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF"));
    }

    #[cfg(unix)]
    #[test]
    fn wkhtmltopdf_failure_carries_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("broken-wkhtmltopdf");
        std::fs::write(&script, "#!/bin/sh\necho 'Error: Failed loading page' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = WkHtmlToPdf::new(&script, RendererOptions::default())
            .render(&dir.path().join("in.html"), &dir.path().join("out.pdf"))
            .unwrap_err();
        assert!(err.to_string().contains("Failed loading page"), "got: {err}");
    }

    #[cfg(unix)]
    #[test]
    fn failed_run_is_not_masked_by_previous_pdf() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("broken-wkhtmltopdf");
        std::fs::write(&script, "#!/bin/sh\necho 'Error: Failed loading page' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = dir.path().join("T.pdf");
        std::fs::write(&out, b"%PDF-1.4 old run\n").unwrap();

        let result = WkHtmlToPdf::new(&script, RendererOptions::default())
            .render(&dir.path().join("in.html"), &out);
        assert!(
            matches!(result, Err(ConvertError::RenderFailed { .. })),
            "got: {result:?}"
        );
        assert!(!out.exists());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_exit_with_fresh_output_is_accepted() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("partial-wkhtmltopdf");
        std::fs::write(
            &script,
            "#!/bin/sh\nfor last; do :; done\nprintf '%%PDF-1.4 new\\n' > \"$last\"\nexit 1\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let out = dir.path().join("T.pdf");
        std::fs::write(&out, b"%PDF-1.4 old run\n").unwrap();

        WkHtmlToPdf::new(&script, RendererOptions::default())
            .render(&dir.path().join("in.html"), &out)
            .unwrap();
        assert!(std::fs::read(&out).unwrap().starts_with(b"%PDF-1.4 new"));
    }
}
