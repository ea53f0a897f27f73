use super::{LayoutData, TaskError, apply_layout};
use crate::context::BuildContext;
use crate::external::{self, ExternalBinding};
use crate::metadata::Metadata;
use crate::naming::is_unset;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Render one markdown page through the page template and the layout.
#[derive(Debug, Clone, PartialEq)]
pub struct PageTask {
    pub markdown_path: PathBuf,
    pub output_path: PathBuf,
    /// Site-absolute URL of the page, e.g. `/blog/hello.html`.
    pub route: String,
    pub page_template: PathBuf,
    pub layout_template: PathBuf,
    /// Manifest title; empty defers to the markdown's first heading.
    pub title: String,
    pub description: String,
    pub site_title: String,
    /// Effective metadata (site, then section, then page).
    pub metadata: Metadata,
    pub tags: Vec<String>,
    pub section: String,
    pub sections: Vec<String>,
    pub external_data: Vec<ExternalBinding>,
}

#[derive(Serialize)]
struct PageData<'a> {
    title: &'a str,
    description: &'a str,
    route: &'a str,
    tags: &'a [String],
    metadata: &'a Metadata,
    html: &'a str,
    external_data: &'a BTreeMap<String, Option<String>>,
    section: &'a str,
    site_title: &'a str,
}

impl PageTask {
    pub fn render(&self, ctx: &BuildContext) -> Result<String, TaskError> {
        let rendered = ctx.markdown.render_file(&self.markdown_path)?;
        let title = if self.title.is_empty() {
            rendered.title.as_str()
        } else {
            self.title.as_str()
        };

        let body = if is_unset(&self.page_template) {
            rendered.html.clone()
        } else {
            let external_data = external::bind_all(ctx.fetcher.as_ref(), &self.external_data);
            ctx.templates.apply(
                &self.page_template,
                &PageData {
                    title,
                    description: &self.description,
                    route: &self.route,
                    tags: &self.tags,
                    metadata: &self.metadata,
                    html: &rendered.html,
                    external_data: &external_data,
                    section: &self.section,
                    site_title: &self.site_title,
                },
            )?
        };

        apply_layout(
            ctx,
            &self.layout_template,
            &LayoutData {
                title,
                site_title: &self.site_title,
                html: &body,
                section: &self.section,
                sections: &self.sections,
                metadata: &self.metadata,
                tags: &self.tags,
                route: &self.route,
            },
        )
    }
}
