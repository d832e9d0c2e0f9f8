//! Directory walking.
//!
//! Collects every `.html` file under a root directory together with its
//! directory relative to that root. Entries are sorted by file name within each
//! directory so a run visits files in the same order every time.
//!
//! Non-HTML files are never opened. Symbolic links to directories are not
//! descended into. A symlinked `.html` file is listed under the link's own
//! path; the writer resolves it so the target is rewritten and the link stays.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

/// File name suffix that marks a file as a rewrite candidate. Case-sensitive.
pub const HTML_SUFFIX: &str = ".html";

#[derive(Error, Debug)]
pub enum WalkError {
    #[error("Failed to walk directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// An HTML file found under the traversal root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlFile {
    /// Path as reached from the root (root joined with the relative path).
    pub path: PathBuf,
    /// Directory of the file relative to the root, `.` for the root itself.
    pub relative_dir: String,
}

/// Walk `root` and return every `.html` file beneath it.
pub fn html_files(root: &Path) -> Result<Vec<HtmlFile>, WalkError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !is_html(entry.path()) || !points_at_file(&entry) {
            continue;
        }
        files.push(HtmlFile {
            relative_dir: relative_dir(root, entry.path()),
            path: entry.into_path(),
        });
    }

    Ok(files)
}

/// A regular file, or a symlink whose target is one.
fn points_at_file(entry: &walkdir::DirEntry) -> bool {
    if entry.file_type().is_file() {
        return true;
    }
    entry.path_is_symlink()
        && fs::metadata(entry.path())
            .map(|meta| meta.is_file())
            .unwrap_or(false)
}

/// Whether a path names an HTML file (`.html` suffix, case-sensitive).
pub fn is_html(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().ends_with(HTML_SUFFIX))
        .unwrap_or(false)
}

/// Directory of `path` relative to `root`, rendered with the platform separator.
///
/// Returns `.` when the file sits directly in the root.
fn relative_dir(root: &Path, path: &Path) -> String {
    let rel = path
        .parent()
        .and_then(|dir| dir.strip_prefix(root).ok())
        .unwrap_or_else(|| Path::new(""));
    if rel.as_os_str().is_empty() {
        ".".to_string()
    } else {
        rel.to_string_lossy().into_owned()
    }
}
