//! Template application.
//!
//! Site templates are user files rendered with [Tera](https://keats.github.io/tera/).
//! Each template is parsed the first time a task applies it and then served
//! from a cache owned by the build, so a template shared by a thousand pages is
//! parsed once, and two builds in one process never see each other's files.
//!
//! Templates are registered under their resolved path. Autoescaping follows
//! Tera's defaults (`.html`, `.htm`, `.xml`); rendered fragments such as the
//! page body arrive as strings and are inserted with `{{ html | safe }}`.
//!
//! ## Filters
//!
//! - `where(flags="pinned,!archived")` keeps the pages of a list whose `flags`
//!   satisfy the expression (see [`crate::flags`]).

use crate::flags::FlagFilter;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use tera::{Context, Tera, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("failed to load template {path}: {source}")]
    Load { path: PathBuf, source: tera::Error },
    #[error("failed to render template {path}: {source}")]
    Render { path: PathBuf, source: tera::Error },
}

/// Per-build template cache.
pub struct Templates {
    tera: RwLock<Tera>,
}

impl Default for Templates {
    fn default() -> Self {
        Self::new()
    }
}

impl Templates {
    pub fn new() -> Self {
        let mut tera = Tera::default();
        tera.register_filter("where", where_filter);
        Self {
            tera: RwLock::new(tera),
        }
    }

    /// Render the template at `path` with `data` as its context.
    ///
    /// `data` must serialize to a map; its fields become template variables.
    pub fn apply<T: Serialize>(&self, path: &Path, data: &T) -> Result<String, TemplateError> {
        let name = path.to_string_lossy().into_owned();
        self.ensure_loaded(path, &name)?;

        let render_err = |source: tera::Error| TemplateError::Render {
            path: path.to_path_buf(),
            source,
        };
        let context = Context::from_serialize(data).map_err(render_err)?;
        let tera = self.tera.read().unwrap_or_else(PoisonError::into_inner);
        tera.render(&name, &context).map_err(render_err)
    }

    /// Number of templates parsed so far.
    pub fn loaded(&self) -> usize {
        let tera = self.tera.read().unwrap_or_else(PoisonError::into_inner);
        tera.get_template_names().count()
    }

    fn ensure_loaded(&self, path: &Path, name: &str) -> Result<(), TemplateError> {
        if self.is_loaded(name) {
            return Ok(());
        }
        let mut tera = self.tera.write().unwrap_or_else(PoisonError::into_inner);
        // Another worker may have loaded it while we waited for the lock.
        if tera.get_template_names().any(|n| n == name) {
            return Ok(());
        }
        log::debug!("Loading template {}", path.display());
        tera.add_template_file(path, Some(name))
            .map_err(|source| TemplateError::Load {
                path: path.to_path_buf(),
                source,
            })
    }

    fn is_loaded(&self, name: &str) -> bool {
        let tera = self.tera.read().unwrap_or_else(PoisonError::into_inner);
        tera.get_template_names().any(|n| n == name)
    }
}

fn where_filter(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let expr = match args.get("flags") {
        Some(Value::String(expr)) => expr.as_str(),
        Some(_) => return Err(tera::Error::msg("`where` expects a string `flags` argument")),
        None => "",
    };
    let pages = value
        .as_array()
        .ok_or_else(|| tera::Error::msg("`where` can only filter a list of pages"))?;

    let filter = FlagFilter::parse(expr);
    if filter.is_identity() {
        return Ok(value.clone());
    }
    Ok(Value::Array(
        pages
            .iter()
            .filter(|page| filter.matches_value(page))
            .cloned()
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::write_file;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn apply_renders_data_record() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "t.html", "<h1>{{ title }}</h1>{{ html | safe }}");
        let templates = Templates::new();

        let out = templates
            .apply(&path, &json!({"title": "A & B", "html": "<p>body</p>"}))
            .unwrap();
        assert_eq!(out, "<h1>A &amp; B</h1><p>body</p>");
    }

    #[test]
    fn template_parsed_once_per_build() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "t.html", "{{ n }}");
        let templates = Templates::new();

        assert_eq!(templates.apply(&path, &json!({"n": 1})).unwrap(), "1");
        // Changing the file does not affect an already-loaded template.
        std::fs::write(&path, "changed").unwrap();
        assert_eq!(templates.apply(&path, &json!({"n": 2})).unwrap(), "2");
        assert_eq!(templates.loaded(), 1);
    }

    #[test]
    fn separate_builds_do_not_share_cache() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "t.html", "old");
        assert_eq!(Templates::new().apply(&path, &json!({})).unwrap(), "old");

        std::fs::write(&path, "new").unwrap();
        assert_eq!(Templates::new().apply(&path, &json!({})).unwrap(), "new");
    }

    #[test]
    fn missing_template_is_load_error() {
        let tmp = TempDir::new().unwrap();
        let result = Templates::new().apply(&tmp.path().join("nope.html"), &json!({}));
        assert!(matches!(result, Err(TemplateError::Load { .. })));
    }

    #[test]
    fn malformed_template_is_load_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "bad.html", "{% for x in %}");
        let result = Templates::new().apply(&path, &json!({}));
        assert!(matches!(result, Err(TemplateError::Load { .. })));
    }

    #[test]
    fn undefined_variable_is_render_error() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(tmp.path(), "t.html", "{{ missing.field }}");
        let result = Templates::new().apply(&path, &json!({}));
        assert!(matches!(result, Err(TemplateError::Render { .. })));
    }

    #[test]
    fn where_filter_selects_by_flags() {
        let tmp = TempDir::new().unwrap();
        let path = write_file(
            tmp.path(),
            "list.html",
            "{% for p in pages | where(flags=\"pinned,!archived\") %}{{ p.title }};{% endfor %}",
        );
        let data = json!({"pages": [
            {"title": "one", "flags": ["pinned"]},
            {"title": "two", "flags": ["pinned", "archived"]},
            {"title": "three", "flags": []},
            {"title": "four", "flags": ["pinned", "featured"]},
        ]});

        let out = Templates::new().apply(&path, &data).unwrap();
        assert_eq!(out, "one;four;");
    }

    #[test]
    fn where_filter_without_flags_is_identity() {
        let value = json!([{"title": "a"}, {"title": "b", "flags": ["x"]}]);
        let out = where_filter(&value, &HashMap::new()).unwrap();
        assert_eq!(out, value);
    }

    #[test]
    fn where_filter_blank_expression_keeps_every_page() {
        let mut args = HashMap::new();
        args.insert("flags".to_string(), json!(" , "));
        let value = json!([{"title": "a", "flags": ["draft"]}, {"title": "b"}]);
        assert_eq!(where_filter(&value, &args).unwrap(), value);
        assert!(where_filter(&json!("not a list"), &args).is_err());
    }

    #[test]
    fn where_filter_rejects_non_list() {
        let mut args = HashMap::new();
        args.insert("flags".to_string(), json!("pinned"));
        assert!(where_filter(&json!("not a list"), &args).is_err());
    }
}
