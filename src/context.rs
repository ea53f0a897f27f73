//! Per-build collaborators.
//!
//! A [`BuildContext`] is created once per build and shared read-only by every
//! task: the template cache, the markdown converter with its fence renderers,
//! and the external-data fetcher. Nothing here outlives the build.

use crate::config::BuildConfig;
use crate::external::{DataFetcher, FetchError, HttpFetcher};
use crate::markdown::{FenceError, HttpFenceRenderer, MarkdownRenderer};
use crate::template::Templates;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ContextError {
    #[error("failed to set up HTTP client: {0}")]
    Fetch(#[from] FetchError),
    #[error("failed to set up fence renderer: {0}")]
    Fence(#[from] FenceError),
}

pub struct BuildContext {
    pub templates: Templates,
    pub markdown: MarkdownRenderer,
    pub fetcher: Box<dyn DataFetcher>,
}

impl BuildContext {
    /// Assemble a context from explicit collaborators.
    pub fn new(markdown: MarkdownRenderer, fetcher: Box<dyn DataFetcher>) -> Self {
        Self {
            templates: Templates::new(),
            markdown,
            fetcher,
        }
    }

    /// Production context: HTTP fetcher plus one HTTP fence renderer per
    /// configured language.
    pub fn from_config(config: &BuildConfig) -> Result<Self, ContextError> {
        let mut markdown = MarkdownRenderer::new();
        for (language, url) in &config.fence_renderers {
            markdown.register_fence(language.clone(), HttpFenceRenderer::new(url.clone())?);
        }
        Ok(Self::new(markdown, Box::new(HttpFetcher::new()?)))
    }
}
