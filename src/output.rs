//! CLI output formatting for build progress.
//!
//! Progress lines are user-facing output, not logs: they go to stdout while
//! diagnostics go through `log`.
//!
//! # Output Format
//!
//! ## Plain
//!
//! One line per finished file, then the summary:
//!
//! ```text
//! File out/blog/hello.html: completed
//! File out/blog/index.html: failed
//! Generated 1 / 2 files (1 failed)
//! ```
//!
//! ## Default
//!
//! The full board up front, then one line per transition:
//!
//! ```text
//! ○ out/blog/hello.html
//! ○ out/blog/index.html
//! ◔ out/blog/hello.html
//! ● out/blog/hello.html
//! ◔ out/blog/index.html
//! ✗ out/blog/index.html
//! Generated 1 / 2 files (1 failed)
//!     failed: out/blog/index.html
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `String` or `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::progress::{BuildSummary, FileProgress, FileStatus};

fn status_icon(status: FileStatus) -> &'static str {
    match status {
        FileStatus::Pending => "○",
        FileStatus::Started => "◔",
        FileStatus::Completed => "●",
        FileStatus::Failed => "✗",
    }
}

// ============================================================================
// Events
// ============================================================================

/// Plain-mode line: `File <path>: <status>`.
pub fn format_event(event: &FileProgress) -> String {
    format!("File {}: {}", event.filename.display(), event.status)
}

/// Board line: status icon and path.
pub fn format_board_line(file: &FileProgress) -> String {
    format!("{} {}", status_icon(file.status), file.filename.display())
}

pub fn format_board(files: &[FileProgress]) -> Vec<String> {
    files.iter().map(format_board_line).collect()
}

pub fn print_event(event: &FileProgress) {
    println!("{}", format_event(event));
}

pub fn print_board_line(file: &FileProgress) {
    println!("{}", format_board_line(file));
}

pub fn print_board(files: &[FileProgress]) {
    for line in format_board(files) {
        println!("{}", line);
    }
}

// ============================================================================
// Summary
// ============================================================================

pub fn format_summary(summary: &BuildSummary) -> Vec<String> {
    let mut lines = vec![format!(
        "Generated {} / {} files ({} failed)",
        summary.completed,
        summary.total,
        summary.failed.len()
    )];
    for path in &summary.failed {
        lines.push(format!("    failed: {}", path.display()));
    }
    lines
}

pub fn print_summary(summary: &BuildSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}
