//! Markdown to HTML conversion.
//!
//! Input is a file path, output is the rendered HTML body plus the document
//! title (the text of the first top-level `# heading`). Pages with no title
//! in the manifest take this one.
//!
//! Conversion uses pulldown-cmark with tables, strikethrough, task lists,
//! footnotes and `{#id}` heading attributes enabled. On top of the stock
//! renderer the event stream is rewritten to:
//!
//! - turn soft line breaks into `<br />` (hard wraps)
//! - give every heading an `id` derived from its text (`-1`, `-2`, ... on
//!   collisions) unless one was written explicitly
//! - hand fenced code blocks in a registered language to a [`FenceRenderer`]
//!   and splice its markup in place of the block
//! - syntax-highlight other fenced blocks whose language is known to
//!   [`highlight`](crate::highlight)
//!
//! A fence renderer failure never fails the page: the block is replaced by an
//! inline error notice followed by the original source. Blocks without a
//! language, or in one nobody knows, stay plain `<pre><code>`.

use crate::highlight;
use maud::{Markup, html};
use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, html::push_html,
};
use reqwest::header::CONTENT_TYPE;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkdownError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Error, Debug)]
pub enum FenceError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned status {status}: {details}")]
    Status { status: u16, details: String },
    #[error("{0}")]
    Render(String),
}

/// Result of converting one markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMarkdown {
    /// Text of the first top-level `# heading`, empty if there is none.
    pub title: String,
    pub html: String,
}

/// Renders the body of a fenced code block in a custom language.
///
/// Implementations receive the raw block source and return markup that
/// replaces the whole block.
pub trait FenceRenderer: Send + Sync {
    fn render(&self, source: &str) -> Result<String, FenceError>;
}

/// Fence renderer backed by an HTTP service.
///
/// The block source is POSTed as `text/plain`; a 2xx response body is the
/// replacement markup.
pub struct HttpFenceRenderer {
    url: String,
    client: reqwest::blocking::Client,
}

const FENCE_TIMEOUT: Duration = Duration::from_secs(5);

impl HttpFenceRenderer {
    pub fn new(url: impl Into<String>) -> Result<Self, FenceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(FENCE_TIMEOUT)
            .build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl FenceRenderer for HttpFenceRenderer {
    fn render(&self, source: &str) -> Result<String, FenceError> {
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "text/plain")
            .body(source.to_owned())
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            let details = if body.is_empty() {
                "no error details provided".to_string()
            } else {
                body
            };
            return Err(FenceError::Status {
                status: status.as_u16(),
                details,
            });
        }
        Ok(body)
    }
}

/// Markdown converter with its registered fence renderers.
#[derive(Default)]
pub struct MarkdownRenderer {
    fences: HashMap<String, Box<dyn FenceRenderer>>,
}

impl MarkdownRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route fenced blocks tagged `language` to `renderer`.
    pub fn register_fence(
        &mut self,
        language: impl Into<String>,
        renderer: impl FenceRenderer + 'static,
    ) {
        self.fences.insert(language.into(), Box::new(renderer));
    }

    pub fn render_file(&self, path: &Path) -> Result<RenderedMarkdown, MarkdownError> {
        let content = fs::read_to_string(path).map_err(|source| MarkdownError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(self.render_str(&content))
    }

    pub fn render_str(&self, content: &str) -> RenderedMarkdown {
        let mut title: Option<String> = None;
        let mut events: Vec<Event> = Vec::new();
        let mut ids = HeadingIds::default();
        let mut heading: Option<PendingHeading> = None;
        let mut fence: Option<PendingFence> = None;
        let mut depth = 0usize;

        for event in Parser::new_ext(content, options()) {
            match &event {
                Event::Start(_) => depth += 1,
                Event::End(_) => depth = depth.saturating_sub(1),
                _ => {}
            }

            if fence.is_some() {
                match event {
                    Event::Text(text) => {
                        if let Some(pending) = fence.as_mut() {
                            pending.source.push_str(&text);
                        }
                    }
                    Event::End(TagEnd::CodeBlock) => {
                        if let Some(pending) = fence.take() {
                            events.push(Event::Html(self.render_fence(&pending).into()));
                        }
                    }
                    _ => {}
                }
                continue;
            }

            if heading.is_some() {
                match event {
                    Event::End(TagEnd::Heading(_)) => {
                        if let Some(pending) = heading.take() {
                            if pending.top_level
                                && pending.level == HeadingLevel::H1
                                && title.is_none()
                            {
                                title = Some(pending.text.trim().to_string());
                            }
                            pending.emit(&mut ids, &mut events);
                        }
                    }
                    Event::SoftBreak => {
                        if let Some(pending) = heading.as_mut() {
                            pending.text.push(' ');
                            pending.inner.push(Event::SoftBreak);
                        }
                    }
                    other => {
                        if let Some(pending) = heading.as_mut() {
                            if let Event::Text(text) | Event::Code(text) = &other {
                                pending.text.push_str(text);
                            }
                            pending.inner.push(other);
                        }
                    }
                }
                continue;
            }

            match event {
                Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                    if self.handles_fence(fence_language(&info)) =>
                {
                    fence = Some(PendingFence {
                        language: fence_language(&info).to_string(),
                        source: String::new(),
                    });
                }
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) => {
                    heading = Some(PendingHeading {
                        level,
                        id,
                        classes,
                        attrs,
                        top_level: depth == 1,
                        text: String::new(),
                        inner: Vec::new(),
                    });
                }
                Event::SoftBreak => events.push(Event::HardBreak),
                other => events.push(other),
            }
        }

        let mut html = String::with_capacity(content.len() * 2);
        push_html(&mut html, events.into_iter());
        RenderedMarkdown {
            title: title.unwrap_or_default(),
            html,
        }
    }

    fn handles_fence(&self, language: &str) -> bool {
        self.fences.contains_key(language) || highlight::syntax_for(language).is_some()
    }

    fn render_fence(&self, pending: &PendingFence) -> String {
        let Some(renderer) = self.fences.get(&pending.language) else {
            return highlighted_block(&pending.language, &pending.source);
        };
        match renderer.render(&pending.source) {
            Ok(markup) => markup,
            Err(err) => {
                log::warn!("{} block failed to render: {}", pending.language, err);
                fence_error_block(&pending.language, &pending.source, &err.to_string())
                    .into_string()
            }
        }
    }
}

/// Read only the title of a markdown file.
pub fn read_title(path: &Path) -> Result<String, MarkdownError> {
    let content = fs::read_to_string(path).map_err(|source| MarkdownError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(MarkdownRenderer::new().render_str(&content).title)
}

fn options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_HEADING_ATTRIBUTES
}

fn fence_language<'a>(info: &'a CowStr<'_>) -> &'a str {
    info.split_whitespace().next().unwrap_or("")
}

fn highlighted_block(language: &str, source: &str) -> String {
    let Some(syntax) = highlight::syntax_for(language) else {
        return plain_block(language, source).into_string();
    };
    match highlight::highlight(syntax, source) {
        Ok(html) => html,
        Err(err) => {
            log::warn!("Could not highlight {} block: {}", language, err);
            plain_block(language, source).into_string()
        }
    }
}

fn plain_block(language: &str, source: &str) -> Markup {
    html! {
        pre {
            code class=(format!("language-{language}")) { (source) }
        }
    }
}

fn fence_error_block(language: &str, source: &str, message: &str) -> Markup {
    html! {
        div class=(format!("{language}-error")) {
            p {
                strong { "Error processing " (language) " block:" }
                " " (message)
            }
        }
        (plain_block(language, source))
    }
}

struct PendingFence {
    language: String,
    source: String,
}

struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    top_level: bool,
    text: String,
    inner: Vec<Event<'a>>,
}

impl<'a> PendingHeading<'a> {
    fn emit(self, ids: &mut HeadingIds, events: &mut Vec<Event<'a>>) {
        let id = match self.id {
            Some(id) => {
                ids.reserve(&id);
                Some(id)
            }
            None => ids.assign(&self.text).map(CowStr::from),
        };
        events.push(Event::Start(Tag::Heading {
            level: self.level,
            id,
            classes: self.classes,
            attrs: self.attrs,
        }));
        events.extend(self.inner);
        events.push(Event::End(TagEnd::Heading(self.level)));
    }
}

/// Unique heading ids within one document.
#[derive(Default)]
struct HeadingIds {
    used: HashSet<String>,
}

impl HeadingIds {
    fn reserve(&mut self, id: &str) {
        self.used.insert(id.to_string());
    }

    fn assign(&mut self, text: &str) -> Option<String> {
        let base = anchor_slug(text);
        if base.is_empty() {
            return None;
        }
        let mut candidate = base.clone();
        let mut n = 0;
        while self.used.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        self.used.insert(candidate.clone());
        Some(candidate)
    }
}

/// Lowercase alphanumerics with single dashes between words.
fn anchor_slug(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut prev_dash = true;
    for ch in text.chars() {
        if ch.is_alphanumeric() {
            slug.extend(ch.to_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}
