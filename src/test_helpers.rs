//! Shared test utilities for the gengo test suite.
//!
//! Provides fixture writers, a small on-disk site builder and a
//! [`BuildContext`] wired to test doubles, so tests exercise real templates and
//! markdown without touching the network.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let site = blog_site();
//! let tasks = compile(&site.manifest, site.root(), &site.out_dir()).unwrap();
//! let ctx = test_context();
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::context::BuildContext;
use crate::external::tests::MockFetcher;
use crate::manifest::Manifest;
use crate::markdown::MarkdownRenderer;

// =========================================================================
// Fixture setup
// =========================================================================

/// Write `contents` to `dir/rel`, creating parent directories.
pub fn write_file(dir: &Path, rel: &str, contents: &str) -> PathBuf {
    let path = dir.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, contents).unwrap();
    path
}

/// Read a generated file as a string, panicking with the path on failure.
pub fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("reading {}: {e}", path.display()))
}

/// A site laid out in a temp directory: manifest, templates, markdown.
pub struct TestSite {
    pub dir: TempDir,
    pub manifest: Manifest,
}

impl TestSite {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn out_dir(&self) -> PathBuf {
        self.dir.path().join("out")
    }
}

pub const LAYOUT: &str =
    "<html><title>{{ title }} | {{ site_title }}</title><body>{{ html | safe }}</body></html>";
pub const PAGE: &str = "<article><h1>{{ title }}</h1>{{ html | safe }}</article>";
pub const SECTION: &str = "<ul data-section=\"{{ section }}\">{% for p in pages %}<li>{{ p.title }}</li>{% endfor %}</ul>";
pub const HOME: &str = "<nav>{% for s in sections %}<a href=\"/{{ s }}/\">{{ s }}</a>{% endfor %}</nav>";

/// The blog scenario: one section with two pages tagged `intro` and
/// `intro, deep-dive`, every template configured.
pub fn blog_site() -> TestSite {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write_file(root, "templates/layout.html", LAYOUT);
    write_file(root, "templates/page.html", PAGE);
    write_file(root, "templates/section.html", SECTION);
    write_file(root, "templates/home.html", HOME);
    write_file(root, "posts/first.md", "# First Post\n\nHello.\n");
    write_file(root, "posts/second.md", "# Second Post\n\nMore.\n");
    write_file(root, "static/site.css", "body {}");

    let manifest = Manifest::from_yaml(
        r#"
title: Test Site
default-layout-template: templates/layout.html
default-page-template: templates/page.html
default-section-template: templates/section.html
home-template: templates/home.html
metadata:
  author: site
static-assets:
  - path: static
    destination: static
sections:
  blog:
    metadata:
      author: section
    pages:
      - title: First
        markdown-path: posts/first.md
        tags: [intro]
      - markdown-path: posts/second.md
        tags: [intro, deep-dive]
        metadata:
          author: page
"#,
    )
    .unwrap();

    TestSite { dir, manifest }
}

/// Context with no fence renderers and a fetcher that serves nothing.
pub fn test_context() -> BuildContext {
    context_with_fetcher(MockFetcher::new())
}

pub fn context_with_fetcher(fetcher: MockFetcher) -> BuildContext {
    BuildContext::new(MarkdownRenderer::new(), Box::new(fetcher))
}
