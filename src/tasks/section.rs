use super::{LayoutData, TaskError, apply_layout};
use crate::context::BuildContext;
use crate::markdown::read_title;
use crate::metadata::Metadata;
use crate::naming::is_unset;
use serde::Serialize;
use std::path::PathBuf;

/// A page as listed by a section or tag index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub title: String,
    pub description: String,
    pub url: String,
    pub markdown_path: PathBuf,
    pub published_at: String,
    pub last_edited_at: String,
    pub tags: Vec<String>,
    pub flags: Vec<String>,
    pub metadata: Metadata,
}

/// Render a listing of pages: a section index, or the index of one tag
/// within a section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTask {
    pub output_path: PathBuf,
    pub section_template: PathBuf,
    pub layout_template: PathBuf,
    /// Section name for an index, the first spelling of the tag for a tag index.
    pub title: String,
    pub site_title: String,
    pub metadata: Metadata,
    pub section: String,
    /// Set for tag indexes.
    pub tag: Option<String>,
    pub sections: Vec<String>,
    pub pages: Vec<PageEntry>,
}

#[derive(Serialize)]
struct SectionData<'a> {
    title: &'a str,
    section: &'a str,
    tag: Option<&'a str>,
    metadata: &'a Metadata,
    pages: &'a [PageEntry],
    sections: &'a [String],
    site_title: &'a str,
}

impl SectionTask {
    pub fn render(&self, ctx: &BuildContext) -> Result<String, TaskError> {
        let pages = self.listed_pages();
        let body = if is_unset(&self.section_template) {
            String::new()
        } else {
            ctx.templates.apply(
                &self.section_template,
                &SectionData {
                    title: &self.title,
                    section: &self.section,
                    tag: self.tag.as_deref(),
                    metadata: &self.metadata,
                    pages: &pages,
                    sections: &self.sections,
                    site_title: &self.site_title,
                },
            )?
        };

        apply_layout(
            ctx,
            &self.layout_template,
            &LayoutData {
                title: &self.title,
                site_title: &self.site_title,
                html: &body,
                section: &self.section,
                sections: &self.sections,
                metadata: &self.metadata,
                tags: self.tag.as_slice(),
                route: "",
            },
        )
    }

    /// Pages with untitled entries filled from their markdown heading.
    fn listed_pages(&self) -> Vec<PageEntry> {
        self.pages
            .iter()
            .cloned()
            .map(|mut page| {
                if page.title.is_empty() {
                    match read_title(&page.markdown_path) {
                        Ok(title) => page.title = title,
                        Err(err) => log::warn!("No title for {}: {}", page.url, err),
                    }
                }
                page
            })
            .collect()
    }
}
