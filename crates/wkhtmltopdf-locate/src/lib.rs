//! # wkhtmltopdf-locate
//!
//! Find the [wkhtmltopdf](https://wkhtmltopdf.org/) executable on the local
//! machine so callers never have to hard-code an install path.
//!
//! ## Resolution order
//!
//! 1. An explicit path handed to [`locate`] (e.g. a `--wkhtmltopdf` flag).
//! 2. The `WKHTMLTOPDF_PATH` environment variable.
//! 3. Every directory listed in `PATH`.
//! 4. The platform's usual install locations (see table below).
//!
//! The first existing file wins. [`locate_wkhtmltopdf`] memoises the result
//! for the lifetime of the process.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use wkhtmltopdf_locate::{locate_wkhtmltopdf, query_version};
//!
//! let path = locate_wkhtmltopdf().expect("wkhtmltopdf not installed");
//! let version = query_version(&path).expect("version query failed");
//! println!("{} ({})", path.display(), version);
//! ```
//!
//! ## Platform defaults
//!
//! | OS      | Locations                                                   |
//! |---------|-------------------------------------------------------------|
//! | Linux   | `/usr/local/bin`, `/usr/bin`                                |
//! | macOS   | `/usr/local/bin`, `/opt/homebrew/bin`                       |
//! | Windows | `C:\Program Files\wkhtmltopdf\bin`, `C:\Program Files (x86)\wkhtmltopdf\bin` |

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;

use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that points at a specific wkhtmltopdf binary.
pub const ENV_PATH_VAR: &str = "WKHTMLTOPDF_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by wkhtmltopdf-locate operations.
#[derive(Error, Debug)]
pub enum LocateError {
    /// No candidate location held an executable.
    #[error(
        "wkhtmltopdf executable not found (searched {} locations).\n\
Install it from https://wkhtmltopdf.org/downloads.html or set WKHTMLTOPDF_PATH.",
        .searched.len()
    )]
    NotFound { searched: Vec<PathBuf> },

    /// The executable exists but `--version` could not be run or read.
    #[error("Failed to query '{path}': {reason}")]
    VersionQuery { path: PathBuf, reason: String },
}

// ── Internal: platform metadata ──────────────────────────────────────────────

/// File name of the executable on the current platform.
pub fn executable_name() -> &'static str {
    if cfg!(windows) {
        "wkhtmltopdf.exe"
    } else {
        "wkhtmltopdf"
    }
}

fn platform_dirs() -> Vec<PathBuf> {
    match std::env::consts::OS {
        "windows" => vec![
            PathBuf::from(r"C:\Program Files\wkhtmltopdf\bin"),
            PathBuf::from(r"C:\Program Files (x86)\wkhtmltopdf\bin"),
        ],
        "macos" => vec![
            PathBuf::from("/usr/local/bin"),
            PathBuf::from("/opt/homebrew/bin"),
        ],
        _ => vec![PathBuf::from("/usr/local/bin"), PathBuf::from("/usr/bin")],
    }
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

// ── Public API ───────────────────────────────────────────────────────────────

/// Resolve the wkhtmltopdf executable, preferring `explicit` when given.
///
/// An explicit path that does not exist is reported as [`LocateError::NotFound`]
/// rather than silently falling through to a different binary.
pub fn locate(explicit: Option<&Path>) -> Result<PathBuf, LocateError> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path.to_path_buf());
        }
        return Err(LocateError::NotFound {
            searched: vec![path.to_path_buf()],
        });
    }

    locate_with(
        std::env::var_os(ENV_PATH_VAR),
        std::env::var_os("PATH"),
        &platform_dirs(),
    )
}

/// Resolve the executable once per process (no explicit override).
///
/// # Thread safety
///
/// Safe to call concurrently; racing callers resolve independently and the
/// first result is kept.
pub fn locate_wkhtmltopdf() -> Result<PathBuf, LocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = locate(None)?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Returns `true` if a wkhtmltopdf executable can be found.
pub fn is_wkhtmltopdf_available() -> bool {
    locate_wkhtmltopdf().is_ok()
}

/// Run `<path> --version` and return its trimmed first line,
/// e.g. `wkhtmltopdf 0.12.6 (with patched qt)`.
pub fn query_version(path: &Path) -> Result<String, LocateError> {
    let output = Command::new(path)
        .arg("--version")
        .output()
        .map_err(|e| LocateError::VersionQuery {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if !output.status.success() {
        return Err(LocateError::VersionQuery {
            path: path.to_path_buf(),
            reason: format!("exited with {}", output.status),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    stdout
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(str::to_string)
        .ok_or_else(|| LocateError::VersionQuery {
            path: path.to_path_buf(),
            reason: "empty --version output".to_string(),
        })
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn locate_with(
    env_override: Option<OsString>,
    path_var: Option<OsString>,
    fallback_dirs: &[PathBuf],
) -> Result<PathBuf, LocateError> {
    let mut searched = Vec::new();

    // 1. Environment variable override.
    if let Some(raw) = env_override.filter(|v| !v.is_empty()) {
        let p = PathBuf::from(raw);
        if p.is_file() {
            return Ok(p);
        }
        searched.push(p);
    }

    // 2. PATH entries, then 3. platform defaults.
    let path_dirs: Vec<PathBuf> = path_var
        .as_deref()
        .map(|v| std::env::split_paths(v).collect())
        .unwrap_or_default();

    for dir in path_dirs.iter().chain(fallback_dirs) {
        let candidate = dir.join(executable_name());
        if candidate.is_file() {
            return Ok(candidate);
        }
        searched.push(candidate);
    }

    Err(LocateError::NotFound { searched })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
