//! Output naming: title → file name → path on disk.

use crate::config::CollisionPolicy;
use chrono::Local;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::{Path, PathBuf};

/// File name used when the page has no usable title.
pub const FALLBACK_FILE_NAME: &str = "output.pdf";

// Forbidden on Windows filesystems, plus `&` which shells and some sync
// clients mangle.
static RE_FORBIDDEN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"[\\/*?:"<>|&]"#).unwrap());

/// Strip characters that are not allowed in file names.
///
/// Characters are removed, never replaced: `Q&A: "Best" <Tips>?` becomes
/// `QA Best Tips`.
pub fn sanitize_filename(title: &str) -> String {
    RE_FORBIDDEN.replace_all(title, "").into_owned()
}

/// `<sanitized title>.pdf`, or [`FALLBACK_FILE_NAME`] when there is no
/// title or nothing survives sanitisation.
pub fn output_file_name(title: Option<&str>) -> String {
    match title.map(sanitize_filename) {
        Some(stem) if !stem.trim().is_empty() => format!("{stem}.pdf"),
        _ => FALLBACK_FILE_NAME.to_string(),
    }
}

/// Final output path for `file_name` inside `dir`.
///
/// Under [`CollisionPolicy::Overwrite`] the path is returned as-is even if a
/// file exists. Under [`CollisionPolicy::Timestamp`] an existing file gets a
/// `-YYYYmmdd-HHMMSS` suffix, then a counter if that is taken too.
pub fn resolve_output_path(dir: &Path, file_name: &str, policy: CollisionPolicy) -> PathBuf {
    let path = dir.join(file_name);
    if policy == CollisionPolicy::Overwrite || !path.exists() {
        return path;
    }

    let stem = file_name.strip_suffix(".pdf").unwrap_or(file_name);
    let stamp = Local::now().format("%Y%m%d-%H%M%S");
    let stamped = dir.join(format!("{stem}-{stamp}.pdf"));
    if !stamped.exists() {
        return stamped;
    }

    (2u32..)
        .map(|n| dir.join(format!("{stem}-{stamp}-{n}.pdf")))
        .find(|p| !p.exists())
        .unwrap_or(stamped)
}
