//! External data bound into page templates.
//!
//! A page can name keys bound to external sources configured in the
//! manifest. Before the page template runs, each source URL is fetched with a
//! plain GET and the key is bound to the raw response body.
//!
//! Fetching never fails the page. An unknown source, a transport error or a
//! non-2xx status binds the key to `None` (`null` in the template) and the
//! page renders without it.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(u16),
}

/// Fetches the body behind a URL.
pub trait DataFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Blocking HTTP fetcher.
///
/// Timeouts and redirects are left at the HTTP client's defaults.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Ok(Self {
            client: reqwest::blocking::Client::builder().build()?,
        })
    }
}

impl DataFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.text()?)
    }
}

/// One external-data key of a page, resolved against the manifest's sources.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalBinding {
    /// Template-visible key.
    pub key: String,
    /// Source name as written on the page.
    pub source: String,
    /// `None` when the source is not configured.
    pub url: Option<String>,
}

/// Fetch every binding, degrading failures to `None`.
pub fn bind_all(
    fetcher: &dyn DataFetcher,
    bindings: &[ExternalBinding],
) -> BTreeMap<String, Option<String>> {
    bindings
        .iter()
        .map(|binding| (binding.key.clone(), bind(fetcher, binding)))
        .collect()
}

fn bind(fetcher: &dyn DataFetcher, binding: &ExternalBinding) -> Option<String> {
    let Some(url) = binding.url.as_deref() else {
        log::warn!(
            "External data '{}' refers to unknown source '{}'",
            binding.key,
            binding.source
        );
        return None;
    };
    log::debug!("Fetching external data '{}' from {}", binding.key, url);
    match fetcher.fetch(url) {
        Ok(body) => Some(body),
        Err(err) => {
            log::warn!("External data '{}' from {} unavailable: {}", binding.key, url, err);
            None
        }
    }
}
