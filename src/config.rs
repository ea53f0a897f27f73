//! Build settings.
//!
//! What to build comes from the manifest; how to build it comes from here.
//! Settings are supplied on the command line:
//!
//! ```text
//! --workers 8                       # worker pool size (default: CPU cores)
//! --fence nagare=http://localhost:8080/render
//!                                   # render ```nagare blocks via HTTP
//! ```

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Default)]
pub struct BuildConfig {
    /// Maximum number of tasks running at once.
    /// When absent, defaults to the number of CPU cores.
    pub max_workers: Option<usize>,
    /// Fenced-code language → URL of the service that renders it.
    pub fence_renderers: BTreeMap<String, String>,
}

impl BuildConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == Some(0) {
            return Err(ConfigError::Validation(
                "workers must be at least 1".into(),
            ));
        }
        for (language, url) in &self.fence_renderers {
            if language.is_empty() {
                return Err(ConfigError::Validation(
                    "fence language must not be empty".into(),
                ));
            }
            let parsed = reqwest::Url::parse(url).map_err(|e| {
                ConfigError::Validation(format!("fence '{language}' has invalid URL {url}: {e}"))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::Validation(format!(
                    "fence '{language}' URL must be http or https: {url}"
                )));
            }
        }
        Ok(())
    }
}

/// Resolve the effective worker count.
///
/// - `None` → all available cores
/// - `Some(n)` → `n`; tasks block on network and disk as much as on CPU, so
///   values above the core count are honoured
pub fn effective_threads(config: &BuildConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_workers.unwrap_or(cores).max(1)
}

/// Parse a `LANG=URL` command-line value.
pub fn parse_fence_spec(spec: &str) -> Result<(String, String), String> {
    match spec.split_once('=') {
        Some((language, url)) if !language.trim().is_empty() && !url.trim().is_empty() => {
            Ok((language.trim().to_string(), url.trim().to_string()))
        }
        _ => Err(format!("expected LANG=URL, got '{spec}'")),
    }
}
