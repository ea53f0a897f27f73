//! Task compiler: effective manifest → flat list of independent tasks.
//!
//! Compilation is pure. It resolves paths and copies data but never touches the
//! filesystem, so the full task list (and every output path) is known before
//! anything runs.
//!
//! ```text
//! static-assets[i]          →  CopyTask     base/path → out/destination
//! home-template             →  HomeTask     out/index.html
//! sections.<s> (template)   →  SectionTask  out/<s>/index.html
//! sections.<s>.pages[j]     →  PageTask     out/<s>/<file>.html
//! slug(t) in section s      →  SectionTask  out/<s>/tags/<slug(t)>.html
//! ```
//!
//! Sections and tags are visited in lexicographic order and pages in manifest
//! order, so the same manifest always compiles to the same list. Tag indexes
//! share the section-index template and are only emitted when one is
//! configured.

use crate::external::ExternalBinding;
use crate::manifest::{Manifest, Page, Section};
use crate::metadata::{self, Metadata};
use crate::naming::{convert_extension, is_unset, resolve_path, slugify};
use crate::tasks::{CopyTask, HomeTask, PageEntry, PageTask, SectionTask, Task};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CompileError {
    #[error("{first} and {second} both write {path}")]
    DuplicateOutput {
        path: PathBuf,
        first: String,
        second: String,
    },
}

/// Compile `manifest` into tasks. Relative sources resolve against `base_dir`,
/// outputs against `out_dir`.
pub fn compile(
    manifest: &Manifest,
    base_dir: &Path,
    out_dir: &Path,
) -> Result<Vec<Task>, CompileError> {
    let compiler = Compiler {
        manifest,
        base_dir,
        out_dir,
        sections: manifest.section_names(),
        layout: resolve_path(base_dir, &manifest.default_layout_template),
    };

    let mut tasks = compiler.static_assets();
    tasks.extend(compiler.home());
    for (name, section) in &manifest.sections {
        tasks.extend(compiler.section(name, section));
    }

    check_unique_outputs(&tasks)?;
    log::info!("Compiled {} tasks", tasks.len());
    Ok(tasks)
}

struct Compiler<'a> {
    manifest: &'a Manifest,
    base_dir: &'a Path,
    out_dir: &'a Path,
    sections: Vec<String>,
    layout: PathBuf,
}

impl Compiler<'_> {
    fn static_assets(&self) -> Vec<Task> {
        self.manifest
            .static_assets
            .iter()
            .filter_map(|asset| {
                let source = resolve_path(self.base_dir, &asset.path);
                let destination = resolve_path(self.out_dir, &asset.destination);
                if is_unset(&source) || is_unset(&destination) {
                    log::warn!(
                        "Skipping static asset with empty path or destination: {:?} -> {:?}",
                        asset.path,
                        asset.destination
                    );
                    return None;
                }
                Some(Task::Copy(CopyTask {
                    source,
                    destination,
                }))
            })
            .collect()
    }

    fn home(&self) -> Option<Task> {
        let home_template = resolve_path(self.base_dir, &self.manifest.home_template);
        if is_unset(&home_template) {
            return None;
        }
        Some(Task::Home(HomeTask {
            output_path: self.out_dir.join("index.html"),
            home_template,
            layout_template: self.layout.clone(),
            site_title: self.manifest.title.clone(),
            metadata: self.manifest.metadata.clone(),
            sections: self.sections.clone(),
        }))
    }

    /// Index, pages and tag indexes of one section.
    fn section(&self, name: &str, section: &Section) -> Vec<Task> {
        let section_dir = self.out_dir.join(name);
        let section_metadata = metadata::merge(&self.manifest.metadata, &section.metadata);
        let section_template = resolve_path(
            self.base_dir,
            non_empty_or(&section.template, &self.manifest.default_section_template),
        );
        let page_template = resolve_path(
            self.base_dir,
            non_empty_or(&section.page_template, &self.manifest.default_page_template),
        );
        let has_index = !is_unset(&section_template);

        let listing = |output_path: PathBuf, title: &str, tag: Option<&str>, pages: Vec<PageEntry>| {
            Task::Section(SectionTask {
                output_path,
                section_template: section_template.clone(),
                layout_template: self.layout.clone(),
                title: title.to_string(),
                site_title: self.manifest.title.clone(),
                metadata: section_metadata.clone(),
                section: name.to_string(),
                tag: tag.map(String::from),
                sections: self.sections.clone(),
                pages,
            })
        };

        let mut tasks = Vec::new();
        let mut entries = Vec::with_capacity(section.pages.len());
        for page in &section.pages {
            let file_name = convert_extension(&page.markdown_path, ".html");
            let route = format!("/{name}/{file_name}");
            let markdown_path = resolve_path(self.base_dir, &page.markdown_path);
            let effective = metadata::merge_layers(&[
                &self.manifest.metadata,
                &section.metadata,
                &page.metadata,
            ]);

            entries.push(page_entry(page, &route, &markdown_path, &effective));
            tasks.push(Task::Page(PageTask {
                markdown_path,
                output_path: section_dir.join(&file_name),
                route,
                page_template: page_template.clone(),
                layout_template: self.layout.clone(),
                title: page.title.clone(),
                description: page.description.clone(),
                site_title: self.manifest.title.clone(),
                metadata: effective,
                tags: page.tags.clone(),
                section: name.to_string(),
                sections: self.sections.clone(),
                external_data: self.external_bindings(page),
            }));
        }

        if !has_index {
            return tasks;
        }

        for (slug, (tag, pages)) in group_by_tag(&entries) {
            let output_path = section_dir.join("tags").join(format!("{slug}.html"));
            tasks.push(listing(output_path, &tag, Some(tag.as_str()), pages));
        }
        tasks.push(listing(section_dir.join("index.html"), name, None, entries));
        tasks
    }

    fn external_bindings(&self, page: &Page) -> Vec<ExternalBinding> {
        page.external_data
            .iter()
            .map(|(key, reference)| ExternalBinding {
                key: key.clone(),
                source: reference.source.clone(),
                url: self.manifest.external_url(&reference.source).map(String::from),
            })
            .collect()
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn page_entry(page: &Page, route: &str, markdown_path: &Path, metadata: &Metadata) -> PageEntry {
    PageEntry {
        title: page.title.clone(),
        description: page.description.clone(),
        url: route.to_string(),
        markdown_path: markdown_path.to_path_buf(),
        published_at: page.published_at.clone(),
        last_edited_at: page.last_edited_at.clone(),
        tags: page.tags.clone(),
        flags: page.flags.clone(),
        metadata: metadata.clone(),
    }
}

/// Pages per tag slug, with the first spelling seen as the display title.
///
/// Tags that slugify alike (`Rust`, `rust`) share one index; a page listing
/// the same slug twice appears once.
fn group_by_tag(entries: &[PageEntry]) -> BTreeMap<String, (String, Vec<PageEntry>)> {
    let mut groups: BTreeMap<String, (String, Vec<PageEntry>)> = BTreeMap::new();
    for entry in entries {
        let mut seen: Vec<String> = Vec::new();
        for tag in &entry.tags {
            let slug = slugify(tag);
            if seen.contains(&slug) {
                continue;
            }
            groups
                .entry(slug.clone())
                .or_insert_with(|| (tag.clone(), Vec::new()))
                .1
                .push(entry.clone());
            seen.push(slug);
        }
    }
    groups
}

fn check_unique_outputs(tasks: &[Task]) -> Result<(), CompileError> {
    let mut owners: HashMap<&Path, &Task> = HashMap::with_capacity(tasks.len());
    for task in tasks {
        if let Some(first) = owners.insert(task.output_path(), task) {
            return Err(CompileError::DuplicateOutput {
                path: task.output_path().to_path_buf(),
                first: first.kind().to_string(),
                second: task.kind().to_string(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::blog_site;

    fn outputs(tasks: &[Task], out: &Path) -> Vec<String> {
        tasks
            .iter()
            .map(|t| {
                t.output_path()
                    .strip_prefix(out)
                    .unwrap()
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    fn manifest(yaml: &str) -> Manifest {
        Manifest::from_yaml(yaml).unwrap()
    }

    fn sections_only(tasks: &[Task]) -> Vec<&SectionTask> {
        tasks
            .iter()
            .filter_map(|t| match t {
                Task::Section(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    // =========================================================================
    // Task set
    // =========================================================================

    #[test]
    fn blog_scenario_yields_five_render_tasks() {
        let yaml = r#"
default-section-template: section.html
sections:
  blog:
    pages:
      - markdown-path: posts/first.md
        tags: [intro]
      - markdown-path: posts/second.md
        tags: [intro, deep-dive]
"#;
        let out = Path::new("/site/out");
        let tasks = compile(&manifest(yaml), Path::new("/site"), out).unwrap();

        let mut paths = outputs(&tasks, out);
        paths.sort();
        assert_eq!(
            paths,
            vec![
                "blog/first.html",
                "blog/index.html",
                "blog/second.html",
                "blog/tags/deep-dive.html",
                "blog/tags/intro.html",
            ]
        );

        let by_tag: BTreeMap<_, _> = sections_only(&tasks)
            .into_iter()
            .filter_map(|s| s.tag.clone().map(|t| (t, s.pages.len())))
            .collect();
        assert_eq!(by_tag["intro"], 2);
        assert_eq!(by_tag["deep-dive"], 1);
    }

    #[test]
    fn home_task_iff_home_template() {
        let out = Path::new("/o");
        let without = compile(&Manifest::default(), Path::new("/b"), out).unwrap();
        assert!(without.iter().all(|t| t.output_path() != out.join("index.html")));

        let with = compile(&manifest("home-template: home.html\n"), Path::new("/b"), out).unwrap();
        let homes: Vec<_> = with
            .iter()
            .filter(|t| t.output_path() == out.join("index.html"))
            .collect();
        assert_eq!(homes.len(), 1);
        assert!(matches!(homes[0], Task::Home(_)));
    }

    #[test]
    fn home_lists_all_sections() {
        let yaml = "home-template: home.html\nsections:\n  notes: {}\n  blog: {}\n";
        let tasks = compile(&manifest(yaml), Path::new("/b"), Path::new("/o")).unwrap();
        let Some(Task::Home(home)) = tasks.iter().find(|t| matches!(t, Task::Home(_))) else {
            panic!("no home task");
        };
        assert_eq!(home.sections, vec!["blog", "notes"]);
    }

    #[test]
    fn empty_section_without_template_produces_nothing() {
        let tasks = compile(&manifest("sections:\n  blog: {}\n"), Path::new("/b"), Path::new("/o")).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn no_section_template_means_no_index_and_no_tags() {
        let yaml = r#"
sections:
  blog:
    pages:
      - markdown-path: a.md
        tags: [x]
"#;
        let out = Path::new("/o");
        let tasks = compile(&manifest(yaml), Path::new("/b"), out).unwrap();
        assert_eq!(outputs(&tasks, out), vec!["blog/a.html"]);
    }

    #[test]
    fn section_template_override() {
        let yaml = r#"
default-section-template: default.html
default-page-template: page.html
sections:
  blog:
    template: blog-index.html
    page-template: post.html
    pages:
      - markdown-path: a.md
  notes:
    pages:
      - markdown-path: b.md
"#;
        let base = Path::new("/b");
        let tasks = compile(&manifest(yaml), base, Path::new("/o")).unwrap();
        for task in &tasks {
            match task {
                Task::Section(s) if s.section == "blog" => {
                    assert_eq!(s.section_template, base.join("blog-index.html"))
                }
                Task::Section(s) => assert_eq!(s.section_template, base.join("default.html")),
                Task::Page(p) if p.section == "blog" => {
                    assert_eq!(p.page_template, base.join("post.html"))
                }
                Task::Page(p) => assert_eq!(p.page_template, base.join("page.html")),
                _ => {}
            }
        }
    }

    // =========================================================================
    // Paths
    // =========================================================================

    #[test]
    fn page_output_drops_source_directory() {
        let yaml = "sections:\n  notes:\n    pages:\n      - markdown-path: deep/dir/graphql-schema.mdx\n";
        let out = Path::new("/o");
        let tasks = compile(&manifest(yaml), Path::new("/b"), out).unwrap();
        let Task::Page(page) = &tasks[0] else { panic!() };
        assert_eq!(page.output_path, out.join("notes/graphql-schema.html"));
        assert_eq!(page.route, "/notes/graphql-schema.html");
        assert_eq!(page.markdown_path, Path::new("/b/deep/dir/graphql-schema.mdx"));
    }

    #[test]
    fn tag_paths_are_slugified() {
        let yaml = r#"
default-section-template: s.html
sections:
  blog:
    pages:
      - markdown-path: a.md
        tags: ["Deep Dive", "v1.0"]
"#;
        let out = Path::new("/o");
        let tasks = compile(&manifest(yaml), Path::new("/b"), out).unwrap();
        let paths = outputs(&tasks, out);
        assert!(paths.contains(&"blog/tags/deep-dive.html".to_string()));
        assert!(paths.contains(&"blog/tags/v10.html".to_string()));
    }

    #[test]
    fn repeated_tag_lists_page_once() {
        let yaml = r#"
default-section-template: s.html
sections:
  blog:
    pages:
      - markdown-path: a.md
        tags: [x, x]
"#;
        let tasks = compile(&manifest(yaml), Path::new("/b"), Path::new("/o")).unwrap();
        let tag = sections_only(&tasks)
            .into_iter()
            .find(|s| s.tag.as_deref() == Some("x"))
            .unwrap();
        assert_eq!(tag.pages.len(), 1);
    }

    #[test]
    fn tags_differing_in_case_share_one_index() {
        let yaml = r#"
default-section-template: s.html
sections:
  blog:
    pages:
      - markdown-path: a.md
        tags: [Rust]
      - markdown-path: b.md
        tags: [rust, RUST]
"#;
        let out = Path::new("/o");
        let tasks = compile(&manifest(yaml), Path::new("/b"), out).unwrap();

        let tags: Vec<&SectionTask> = sections_only(&tasks)
            .into_iter()
            .filter(|s| s.tag.is_some())
            .collect();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].output_path, out.join("blog/tags/rust.html"));
        assert_eq!(tags[0].tag.as_deref(), Some("Rust"));
        assert_eq!(tags[0].title, "Rust");
        let urls: Vec<&str> = tags[0].pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/blog/a.html", "/blog/b.html"]);
    }

    #[test]
    fn static_assets_resolve_against_base_and_out() {
        let yaml = r#"
static-assets:
  - path: assets
    destination: static
  - path: ""
    destination: skipped
  - path: favicon.ico
    destination: ""
"#;
        let tasks = compile(&manifest(yaml), Path::new("/b"), Path::new("/o")).unwrap();
        assert_eq!(
            tasks,
            vec![Task::Copy(CopyTask {
                source: PathBuf::from("/b/assets"),
                destination: PathBuf::from("/o/static"),
            })]
        );
    }

    #[test]
    fn duplicate_output_is_an_error() {
        let yaml = r#"
sections:
  blog:
    pages:
      - markdown-path: one/post.md
      - markdown-path: two/post.md
"#;
        let err = compile(&manifest(yaml), Path::new("/b"), Path::new("/o")).unwrap_err();
        let CompileError::DuplicateOutput { path, first, second } = err;
        assert_eq!(path, Path::new("/o/blog/post.html"));
        assert_eq!((first.as_str(), second.as_str()), ("page", "page"));
    }

    #[test]
    fn asset_colliding_with_page_is_an_error() {
        let yaml = r#"
static-assets:
  - path: index.html
    destination: index.html
home-template: home.html
"#;
        assert!(compile(&manifest(yaml), Path::new("/b"), Path::new("/o")).is_err());
    }

    // =========================================================================
    // Data carried by tasks
    // =========================================================================

    #[test]
    fn metadata_precedence_page_over_section_over_site() {
        let site = blog_site();
        let tasks = compile(&site.manifest, site.root(), &site.out_dir()).unwrap();

        let authors: BTreeMap<String, String> = tasks
            .iter()
            .filter_map(|t| match t {
                Task::Page(p) => Some((p.route.clone(), p.metadata["author"].clone())),
                _ => None,
            })
            .collect();
        assert_eq!(authors["/blog/first.html"], "section");
        assert_eq!(authors["/blog/second.html"], "page");

        for section in sections_only(&tasks) {
            assert_eq!(section.metadata["author"], "section");
        }
        let Some(Task::Home(home)) = tasks.iter().find(|t| matches!(t, Task::Home(_))) else {
            panic!("no home task");
        };
        assert_eq!(home.metadata["author"], "site");
    }

    #[test]
    fn listings_carry_effective_page_metadata() {
        let site = blog_site();
        let tasks = compile(&site.manifest, site.root(), &site.out_dir()).unwrap();
        let index = sections_only(&tasks)
            .into_iter()
            .find(|s| s.tag.is_none())
            .unwrap();
        let urls: Vec<_> = index.pages.iter().map(|p| p.url.as_str()).collect();
        assert_eq!(urls, vec!["/blog/first.html", "/blog/second.html"]);
        assert_eq!(index.pages[1].metadata["author"], "page");
    }

    #[test]
    fn external_bindings_resolve_source_urls() {
        let yaml = r#"
external-data:
  weather:
    url: http://weather.example/today
sections:
  blog:
    pages:
      - markdown-path: a.md
        external-data:
          forecast:
            source: weather
          quote:
            source: missing
"#;
        let tasks = compile(&manifest(yaml), Path::new("/b"), Path::new("/o")).unwrap();
        let Task::Page(page) = &tasks[0] else { panic!() };
        assert_eq!(
            page.external_data,
            vec![
                ExternalBinding {
                    key: "forecast".into(),
                    source: "weather".into(),
                    url: Some("http://weather.example/today".into()),
                },
                ExternalBinding {
                    key: "quote".into(),
                    source: "missing".into(),
                    url: None,
                },
            ]
        );
    }

    #[test]
    fn compile_is_deterministic() {
        let site = blog_site();
        let a = compile(&site.manifest, site.root(), &site.out_dir()).unwrap();
        let b = compile(&site.manifest, site.root(), &site.out_dir()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn compile_does_not_touch_filesystem() {
        let site = blog_site();
        compile(&site.manifest, site.root(), &site.out_dir()).unwrap();
        assert!(!site.out_dir().exists());
    }
}
