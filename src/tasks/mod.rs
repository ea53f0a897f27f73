//! Build tasks.
//!
//! A [`Task`] is one independently executable unit of work with exactly one
//! output path. The compiler produces a flat list of them and the executor runs
//! them in any order, in parallel, so every task owns the data it needs and
//! shares nothing mutable with its siblings.
//!
//! | Variant | Output |
//! |---------|--------|
//! | [`CopyTask`] | a static file or directory tree, copied verbatim |
//! | [`PageTask`] | `out/<section>/<page>.html` from markdown |
//! | [`SectionTask`] | a section index or tag index listing pages |
//! | [`HomeTask`] | `out/index.html` |
//!
//! Render tasks always render first and write second. Writing creates missing
//! parent directories; sibling tasks racing to create the same directory is
//! harmless.

mod copy;
mod home;
mod page;
mod section;

pub use copy::CopyTask;
pub use home::HomeTask;
pub use page::PageTask;
pub use section::{PageEntry, SectionTask};

use crate::context::BuildContext;
use crate::markdown::MarkdownError;
use crate::metadata::Metadata;
use crate::naming::is_unset;
use crate::template::TemplateError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TaskError {
    #[error(transparent)]
    Markdown(#[from] MarkdownError),
    #[error(transparent)]
    Template(#[from] TemplateError),
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Copy(CopyTask),
    Page(PageTask),
    Section(SectionTask),
    Home(HomeTask),
}

impl Task {
    /// Identity of the task in progress events: its output path.
    pub fn name(&self) -> &Path {
        self.output_path()
    }

    pub fn output_path(&self) -> &Path {
        match self {
            Task::Copy(t) => &t.destination,
            Task::Page(t) => &t.output_path,
            Task::Section(t) => &t.output_path,
            Task::Home(t) => &t.output_path,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Task::Copy(_) => "copy",
            Task::Page(_) => "page",
            Task::Section(_) => "section",
            Task::Home(_) => "home",
        }
    }

    pub fn execute(&self, ctx: &BuildContext) -> Result<(), TaskError> {
        match self {
            Task::Copy(t) => t.execute(),
            Task::Page(t) => write_output(&t.output_path, &t.render(ctx)?),
            Task::Section(t) => write_output(&t.output_path, &t.render(ctx)?),
            Task::Home(t) => write_output(&t.output_path, &t.render(ctx)?),
        }
    }
}

/// Data record handed to the layout template.
#[derive(Serialize)]
struct LayoutData<'a> {
    title: &'a str,
    site_title: &'a str,
    html: &'a str,
    section: &'a str,
    sections: &'a [String],
    metadata: &'a Metadata,
    tags: &'a [String],
    route: &'a str,
}

/// Wrap a rendered fragment in the layout; without a layout the fragment is
/// the whole document.
fn apply_layout(
    ctx: &BuildContext,
    layout: &Path,
    data: &LayoutData<'_>,
) -> Result<String, TaskError> {
    if is_unset(layout) {
        return Ok(data.html.to_string());
    }
    Ok(ctx.templates.apply(layout, data)?)
}

fn write_output(path: &Path, contents: &str) -> Result<(), TaskError> {
    let write_err = |source| TaskError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(path, contents).map_err(write_err)
}
