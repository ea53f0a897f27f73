//! Per-file progress vocabulary.
//!
//! Every task is identified by its output path and moves through
//!
//! ```text
//! Pending ──▶ Started ──▶ Completed
//!                    └──▶ Failed
//! ```
//!
//! Tasks are created `Pending` at compile time; the executor emits exactly one
//! `Started` and then exactly one terminal event per task.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Pending,
    Started,
    Completed,
    Failed,
}

impl FileStatus {
    /// Whether `next` is a legal successor of `self`.
    pub fn can_advance_to(self, next: FileStatus) -> bool {
        matches!(
            (self, next),
            (FileStatus::Pending, FileStatus::Started)
                | (FileStatus::Started, FileStatus::Completed)
                | (FileStatus::Started, FileStatus::Failed)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, FileStatus::Completed | FileStatus::Failed)
    }
}

impl fmt::Display for FileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FileStatus::Pending => "pending",
            FileStatus::Started => "started",
            FileStatus::Completed => "completed",
            FileStatus::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// One progress event, or one row of the progress board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProgress {
    pub filename: PathBuf,
    pub status: FileStatus,
}

impl FileProgress {
    pub fn new(filename: impl Into<PathBuf>, status: FileStatus) -> Self {
        Self {
            filename: filename.into(),
            status,
        }
    }
}

/// Outcome of a finished build.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildSummary {
    pub total: usize,
    pub completed: usize,
    /// Output paths of failed tasks, in compile order.
    pub failed: Vec<PathBuf>,
}

impl BuildSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Live view of every file in a build, advanced by progress events.
///
/// Rows keep compile order; lookups by file go through an index.
#[derive(Debug, Clone)]
pub struct ProgressBoard {
    files: Vec<FileProgress>,
    index: HashMap<PathBuf, usize>,
}

impl ProgressBoard {
    pub fn new(initial: Vec<FileProgress>) -> Self {
        let mut index = HashMap::with_capacity(initial.len());
        for (i, file) in initial.iter().enumerate() {
            index.entry(file.filename.clone()).or_insert(i);
        }
        Self {
            files: initial,
            index,
        }
    }

    /// Apply one event. Returns `false` for unknown files and illegal
    /// transitions, which leave the board unchanged.
    pub fn apply(&mut self, event: &FileProgress) -> bool {
        let Some(row) = self
            .index
            .get(&event.filename)
            .and_then(|&i| self.files.get_mut(i))
        else {
            log::warn!("Progress for unknown file {}", event.filename.display());
            return false;
        };
        if !row.status.can_advance_to(event.status) {
            log::warn!(
                "Ignoring {} -> {} for {}",
                row.status,
                event.status,
                event.filename.display()
            );
            return false;
        }
        row.status = event.status;
        true
    }

    pub fn files(&self) -> &[FileProgress] {
        &self.files
    }

    #[cfg(test)]
    fn status_of(&self, filename: &std::path::Path) -> Option<FileStatus> {
        self.index.get(filename).map(|&i| self.files[i].status)
    }

    pub fn count(&self, status: FileStatus) -> usize {
        self.files.iter().filter(|f| f.status == status).count()
    }

    pub fn is_finished(&self) -> bool {
        self.files.iter().all(|f| f.status.is_terminal())
    }

    pub fn summary(&self) -> BuildSummary {
        BuildSummary {
            total: self.files.len(),
            completed: self.count(FileStatus::Completed),
            failed: self
                .files
                .iter()
                .filter(|f| f.status == FileStatus::Failed)
                .map(|f| f.filename.clone())
                .collect(),
        }
    }
}
