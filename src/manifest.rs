//! Site manifest: the declarative description of a build.
//!
//! A manifest is a YAML file naming the templates, the sections and their
//! pages, the static assets to copy, external data sources and site-wide
//! metadata:
//!
//! ```yaml
//! title: My Site
//! default-layout-template: templates/layout.html
//! default-page-template: templates/page.html
//! default-section-template: templates/section.html
//! home-template: templates/home.html
//! metadata:
//!   author: Ada
//! external-data:
//!   weather:
//!     url: https://example.com/weather
//! static-assets:
//!   - path: assets
//!     destination: assets
//! sections:
//!   blog:
//!     metadata:
//!       kind: article
//!     pages:
//!       - title: Hello
//!         markdown-path: posts/hello.md
//!         tags: [intro]
//!         flags: [pinned]
//!         external-data:
//!           forecast:
//!             source: weather
//! ```
//!
//! ## Multiple Manifests
//!
//! A build may name several manifest files. They are folded left to right into
//! one effective manifest by [`Manifest::merge`]:
//!
//! | Field | Rule |
//! |-------|------|
//! | title, template paths | later non-empty value replaces earlier |
//! | sections | first manifest to define a name wins, never merged field-wise |
//! | static assets | concatenated, exact duplicates dropped |
//! | metadata, external data | per-key override, later wins |
//!
//! Unknown keys are rejected to catch typos early. An unreadable or malformed
//! manifest aborts the build before any task is compiled.

use crate::metadata::{self, Metadata};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse manifest {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml_ng::Error,
    },
    #[error("no manifest given")]
    Empty,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Manifest {
    pub title: String,
    pub default_layout_template: String,
    pub default_page_template: String,
    pub default_section_template: String,
    pub home_template: String,
    /// Sections by name. Ordered so compilation visits them deterministically.
    pub sections: BTreeMap<String, Section>,
    pub static_assets: Vec<StaticAsset>,
    /// External data sources by name.
    pub external_data: BTreeMap<String, ExternalSource>,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Section {
    /// Section-index template; overrides `default-section-template`.
    pub template: String,
    /// Page template for this section; overrides `default-page-template`.
    pub page_template: String,
    pub metadata: Metadata,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct Page {
    /// Empty means "use the markdown's first `# heading`".
    pub title: String,
    pub description: String,
    pub markdown_path: String,
    pub published_at: String,
    pub last_edited_at: String,
    pub tags: Vec<String>,
    /// Boolean facets used by the `where` template filter.
    pub flags: Vec<String>,
    pub metadata: Metadata,
    /// Local key → external source reference.
    pub external_data: BTreeMap<String, ExternalRef>,
}

/// A file or directory copied verbatim into the output tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StaticAsset {
    pub path: String,
    pub destination: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExternalSource {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExternalRef {
    pub source: String,
}

impl Manifest {
    /// Parse a manifest from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self, serde_yaml_ng::Error> {
        serde_yaml_ng::from_str(content)
    }

    /// Fold `overlay` into `self` using the override rules in the module docs.
    pub fn merge(mut self, overlay: Manifest) -> Manifest {
        override_scalar(&mut self.title, overlay.title);
        override_scalar(
            &mut self.default_layout_template,
            overlay.default_layout_template,
        );
        override_scalar(&mut self.default_page_template, overlay.default_page_template);
        override_scalar(
            &mut self.default_section_template,
            overlay.default_section_template,
        );
        override_scalar(&mut self.home_template, overlay.home_template);

        for (name, section) in overlay.sections {
            self.sections.entry(name).or_insert(section);
        }

        for asset in overlay.static_assets {
            if !self.static_assets.contains(&asset) {
                self.static_assets.push(asset);
            }
        }

        self.external_data.extend(overlay.external_data);
        self.metadata = metadata::merge(&self.metadata, &overlay.metadata);
        self
    }

    /// Names of all sections, in compilation order.
    pub fn section_names(&self) -> Vec<String> {
        self.sections.keys().cloned().collect()
    }

    /// URL configured for an external source, if any.
    pub fn external_url(&self, source: &str) -> Option<&str> {
        self.external_data
            .get(source)
            .map(|s| s.url.as_str())
            .filter(|url| !url.is_empty())
    }
}

fn override_scalar(base: &mut String, overlay: String) {
    if !overlay.is_empty() {
        *base = overlay;
    }
}

/// Read and parse one manifest file.
pub fn load(path: &Path) -> Result<Manifest, ManifestError> {
    log::info!("Reading manifest file: {}", path.display());
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Manifest::from_yaml(&content).map_err(|source| ManifestError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load every manifest in order and merge them into the effective manifest.
///
/// Fails on the first unreadable or malformed file.
pub fn load_all(paths: &[PathBuf]) -> Result<Manifest, ManifestError> {
    if paths.is_empty() {
        return Err(ManifestError::Empty);
    }
    paths.iter().try_fold(Manifest::default(), |merged, path| {
        Ok(merged.merge(load(path)?))
    })
}

/// Directory that manifest-relative paths are resolved against: the parent
/// of the first manifest.
pub fn base_dir(paths: &[PathBuf]) -> PathBuf {
    paths
        .first()
        .and_then(|p| p.parent())
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
