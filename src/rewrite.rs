//! Applying a rule set to a directory tree.
//!
//! Each `.html` file is read fully, run through the rules of one pass family,
//! and written back only when the result differs byte-for-byte from what was
//! read. Unchanged files are never opened for writing, so their modification
//! time survives the run.
//!
//! ## Writes
//!
//! Changed content goes to a temporary file in the same directory which is
//! then renamed over the original. A failure mid-write leaves the original
//! untouched; there is no backup and no partial-progress record, so a failed
//! run is simply repeated after fixing the cause.
//!
//! A symlinked page is written through: the link is resolved, the target is
//! replaced, and the link keeps pointing at it. Reports still name the link.
//! Pages without write permission fail with [`RewriteError::Write`] instead
//! of being replaced behind the permission bits.
//!
//! ## Parallelism
//!
//! Files are independent, so they are rewritten on a [rayon] pool sized by
//! `processing.max_processes`. The first read or write error aborts the run.
//! Progress is reported through an optional channel as each file is written,
//! which keeps already-printed lines accurate when a later file fails.

use crate::config::{self, RewriteConfig};
use crate::rules::{PassFamily, RuleSet};
use crate::walk::{self, HtmlFile, WalkError};
use rayon::prelude::*;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use tempfile::NamedTempFile;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewriteError {
    #[error(transparent)]
    Walk(#[from] WalkError),
    #[error("Failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("File is not valid UTF-8: {}", .path.display())]
    Decode { path: PathBuf },
    #[error("Failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// How a traversal treats changed files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Report changes without writing anything.
    pub dry_run: bool,
    /// Worker threads for the per-file pool.
    pub threads: usize,
}

impl RewriteOptions {
    pub fn from_config(config: &RewriteConfig, dry_run: bool) -> Self {
        Self {
            dry_run,
            threads: config::effective_threads(&config.processing),
        }
    }
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self::from_config(&RewriteConfig::default(), false)
    }
}

/// Progress reported while a traversal runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteEvent {
    /// A file changed and was written back.
    Rewritten { family: PassFamily, path: PathBuf },
    /// A dry run found a file that would change.
    WouldRewrite { family: PassFamily, path: PathBuf },
    /// A traversal finished.
    Completed(RewriteSummary),
}

/// Result of one traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteSummary {
    pub family: PassFamily,
    pub dry_run: bool,
    /// Number of `.html` files examined.
    pub scanned: usize,
    /// Files whose content changed (or would change, for a dry run), in walk order.
    pub changed: Vec<PathBuf>,
}

impl fmt::Display for RewriteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let verb = if self.dry_run { "would change" } else { "changed" };
        write!(
            f,
            "{} of {} files {}",
            self.changed.len(),
            self.scanned,
            verb
        )
    }
}

/// What happened to a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOutcome {
    Unchanged,
    Rewritten,
    WouldRewrite,
}

/// Transform a document, returning the new text only if it differs.
pub fn rewrite_document(rules: &RuleSet, content: &str, relative_dir: &str) -> Option<String> {
    let rewritten = rules.apply(content, relative_dir);
    if rewritten == content {
        None
    } else {
        Some(rewritten.into_owned())
    }
}

/// Rewrite one file in place according to `rules`.
pub fn rewrite_file(
    rules: &RuleSet,
    file: &HtmlFile,
    dry_run: bool,
) -> Result<FileOutcome, RewriteError> {
    let bytes = fs::read(&file.path).map_err(|source| RewriteError::Read {
        path: file.path.clone(),
        source,
    })?;
    let content = String::from_utf8(bytes).map_err(|_| RewriteError::Decode {
        path: file.path.clone(),
    })?;

    let Some(rewritten) = rewrite_document(rules, &content, &file.relative_dir) else {
        return Ok(FileOutcome::Unchanged);
    };
    if dry_run {
        return Ok(FileOutcome::WouldRewrite);
    }

    write_atomic(&file.path, &rewritten).map_err(|source| RewriteError::Write {
        path: file.path.clone(),
        source,
    })?;
    Ok(FileOutcome::Rewritten)
}

/// Replace `path` with `content` via a sibling temp file and a rename.
///
/// A symlinked path is resolved first, so the rename lands on the target and
/// the link itself is left in place. The original file's permissions are
/// carried over to the replacement. A read-only file is refused rather than
/// replaced.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let target = fs::canonicalize(path)?;
    let permissions = fs::metadata(&target)?.permissions();
    if permissions.readonly() {
        return Err(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "file is read-only",
        ));
    }
    let dir = target.parent().unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.as_file().set_permissions(permissions)?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// Apply one rule set to every `.html` file under `root`.
///
/// Sends a [`RewriteEvent`] per changed file as it happens and a final
/// [`RewriteEvent::Completed`] once the whole tree is done.
pub fn rewrite_tree(
    root: &Path,
    rules: &RuleSet,
    options: &RewriteOptions,
    events: Option<&Sender<RewriteEvent>>,
) -> Result<RewriteSummary, RewriteError> {
    let files = walk::html_files(root)?;
    let family = rules.family();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.threads.max(1))
        .build()?;

    let outcomes: Vec<FileOutcome> = pool.install(|| {
        files
            .par_iter()
            .map(|file| -> Result<FileOutcome, RewriteError> {
                let outcome = rewrite_file(rules, file, options.dry_run)?;
                if let Some(tx) = events {
                    let path = file.path.clone();
                    let event = match outcome {
                        FileOutcome::Unchanged => None,
                        FileOutcome::Rewritten => Some(RewriteEvent::Rewritten { family, path }),
                        FileOutcome::WouldRewrite => {
                            Some(RewriteEvent::WouldRewrite { family, path })
                        }
                    };
                    if let Some(event) = event {
                        // A dropped receiver only means nobody is listening.
                        let _ = tx.send(event);
                    }
                }
                Ok(outcome)
            })
            .collect::<Result<Vec<_>, RewriteError>>()
    })?;

    let changed = files
        .iter()
        .zip(&outcomes)
        .filter(|(_, outcome)| **outcome != FileOutcome::Unchanged)
        .map(|(file, _)| file.path.clone())
        .collect();

    let summary = RewriteSummary {
        family,
        dry_run: options.dry_run,
        scanned: files.len(),
        changed,
    };
    if let Some(tx) = events {
        let _ = tx.send(RewriteEvent::Completed(summary.clone()));
    }
    Ok(summary)
}

/// Run several pass families over `root`, one complete traversal each, in the
/// order given.
pub fn rewrite_families(
    root: &Path,
    families: &[PassFamily],
    config: &RewriteConfig,
    options: &RewriteOptions,
    events: Option<&Sender<RewriteEvent>>,
) -> Result<Vec<RewriteSummary>, RewriteError> {
    families
        .iter()
        .map(|family| {
            let rules = RuleSet::new(*family, config);
            rewrite_tree(root, &rules, options, events)
        })
        .collect()
}
