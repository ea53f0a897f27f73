//! End-to-end build: manifests → tasks → running [`Build`].
//!
//! ```text
//! validate config ─▶ load + merge manifests ─▶ compile ─▶ create out dir
//!                  ─▶ build context ─▶ execute ─▶ Build (progress stream)
//! ```
//!
//! Everything up to `execute` is fatal: a bad manifest, a bad setting or a
//! compile conflict returns an error before any file is written. From then on
//! failures are per file and arrive as progress events.
//!
//! Every invocation rebuilds the whole site. Files are overwritten in place,
//! so rebuilding unchanged input produces byte-identical output.

use crate::config::{self, BuildConfig, ConfigError};
use crate::context::{BuildContext, ContextError};
use crate::executor::{self, Build, ExecuteError};
use crate::manifest::{self, ManifestError};
use crate::scheduler::{self, CompileError};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Execute(#[from] ExecuteError),
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Start a production build.
pub fn generate(
    manifest_paths: &[PathBuf],
    out_dir: &Path,
    config: &BuildConfig,
) -> Result<Build, GenerateError> {
    config.validate()?;
    let ctx = BuildContext::from_config(config)?;
    generate_with_context(
        manifest_paths,
        out_dir,
        ctx,
        config::effective_threads(config),
    )
}

/// Start a build with caller-supplied collaborators.
pub fn generate_with_context(
    manifest_paths: &[PathBuf],
    out_dir: &Path,
    ctx: BuildContext,
    workers: usize,
) -> Result<Build, GenerateError> {
    let manifest = manifest::load_all(manifest_paths)?;
    let base_dir = manifest::base_dir(manifest_paths);
    let tasks = scheduler::compile(&manifest, &base_dir, out_dir)?;

    fs::create_dir_all(out_dir).map_err(|source| GenerateError::OutputDir {
        path: out_dir.to_path_buf(),
        source,
    })?;

    Ok(executor::execute(tasks, Arc::new(ctx), workers)?)
}
