use super::TaskError;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Copy a static asset into the output tree.
///
/// A directory source is mirrored recursively; a file is copied byte for byte.
/// The first I/O error fails the task and already-copied files stay in place.
/// A destination nested inside the source is left out of the walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTask {
    pub source: PathBuf,
    pub destination: PathBuf,
}

impl CopyTask {
    pub fn execute(&self) -> Result<(), TaskError> {
        if self.source.is_dir() {
            self.copy_tree()
        } else {
            copy_file(&self.source, &self.destination)
        }
    }

    fn copy_tree(&self) -> Result<(), TaskError> {
        let nested = self.destination != self.source && self.destination.starts_with(&self.source);
        let walker = WalkDir::new(&self.source)
            .follow_links(true)
            .into_iter()
            .filter_entry(|e| !(nested && e.path().starts_with(&self.destination)));
        for entry in walker {
            let entry = entry.map_err(|source| TaskError::Walk {
                path: self.source.clone(),
                source,
            })?;
            let Ok(relative) = entry.path().strip_prefix(&self.source) else {
                continue;
            };
            let target = self.destination.join(relative);
            if entry.file_type().is_dir() {
                fs::create_dir_all(&target).map_err(|source| TaskError::Copy {
                    from: entry.path().to_path_buf(),
                    to: target.clone(),
                    source,
                })?;
            } else {
                copy_file(entry.path(), &target)?;
            }
        }
        Ok(())
    }
}

fn copy_file(from: &Path, to: &Path) -> Result<(), TaskError> {
    let copy_err = |source| TaskError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(copy_err)?;
    }
    fs::copy(from, to).map_err(copy_err)?;
    Ok(())
}
