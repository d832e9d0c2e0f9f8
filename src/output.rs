//! CLI output formatting.
//!
//! The only observable output of a run besides the rewritten files: one line per
//! file that changed, and one summary line per completed traversal.
//!
//! ```text
//! Fixing links in: ./docs/index.html
//! Fixing links in: ./about/index.html
//! Link fixing complete! (2 of 14 files changed)
//! ```
//!
//! A dry run (`sitefix check`) reports the same files without writing them:
//!
//! ```text
//! Would fix trailing slashes in: ./index.html
//! Trailing slash fixing complete! (1 of 14 files would change)
//! ```
//!
//! Format functions are pure and return lines; `print_*` wrappers write stdout.

use crate::rewrite::RewriteEvent;

/// Format a single rewrite event as display lines.
pub fn format_rewrite_event(event: &RewriteEvent) -> Vec<String> {
    match event {
        RewriteEvent::Rewritten { family, path } => {
            vec![format!("Fixing {} in: {}", family.subject(), path.display())]
        }
        RewriteEvent::WouldRewrite { family, path } => {
            vec![format!("Would fix {} in: {}", family.subject(), path.display())]
        }
        RewriteEvent::Completed(summary) => {
            vec![format!(
                "{} ({})",
                summary.family.completion_message(),
                summary
            )]
        }
    }
}

/// Print a rewrite event to stdout.
pub fn print_rewrite_event(event: &RewriteEvent) {
    for line in format_rewrite_event(event) {
        println!("{}", line);
    }
}
