use super::{LayoutData, TaskError, apply_layout};
use crate::context::BuildContext;
use crate::metadata::Metadata;
use serde::Serialize;
use std::path::PathBuf;

/// Render the site home page. It carries no page data, only navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct HomeTask {
    pub output_path: PathBuf,
    pub home_template: PathBuf,
    pub layout_template: PathBuf,
    pub site_title: String,
    pub metadata: Metadata,
    pub sections: Vec<String>,
}

#[derive(Serialize)]
struct HomeData<'a> {
    title: &'a str,
    sections: &'a [String],
    metadata: &'a Metadata,
    site_title: &'a str,
}

impl HomeTask {
    pub fn render(&self, ctx: &BuildContext) -> Result<String, TaskError> {
        let body = ctx.templates.apply(
            &self.home_template,
            &HomeData {
                title: &self.site_title,
                sections: &self.sections,
                metadata: &self.metadata,
                site_title: &self.site_title,
            },
        )?;

        apply_layout(
            ctx,
            &self.layout_template,
            &LayoutData {
                title: &self.site_title,
                site_title: &self.site_title,
                html: &body,
                section: "",
                sections: &self.sections,
                metadata: &self.metadata,
                tags: &[],
                route: "/",
            },
        )
    }
}
