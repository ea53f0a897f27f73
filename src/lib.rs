//! # gengo
//!
//! A manifest-driven static site generator. A YAML manifest names sections,
//! pages, templates and static assets; gengo compiles it into independent
//! build tasks and runs them in parallel, reporting progress per output file.
//!
//! # Architecture: Compile, Then Fan Out
//!
//! ```text
//! 1. Load      site.yaml, extra.yaml  →  Manifest      (parse + merge)
//! 2. Compile   Manifest               →  Vec<Task>     (pure, no I/O)
//! 3. Execute   Vec<Task>              →  out/          (worker pool + progress stream)
//! ```
//!
//! Compilation decides everything up front: every output path is known, and
//! conflicts are rejected, before a single file is written. Execution is an
//! embarrassingly parallel fan-out. Tasks own their data and never depend on
//! each other, so they run in any order and a failure stays with its file.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`manifest`] | YAML manifest model, loading and multi-file merge |
//! | [`metadata`] | Layered metadata merge: site → section → page |
//! | [`naming`] | Output naming: extension conversion, tag slugs, path resolution |
//! | [`flags`] | `pinned,!draft` flag expressions for filtering page lists |
//! | [`scheduler`] | Task compiler: manifest → flat task list |
//! | [`tasks`] | The four task kinds: copy, page, section index, home |
//! | [`markdown`] | Markdown → {title, html} with pluggable fenced-block renderers |
//! | [`highlight`] | Syntax highlighting for fenced code blocks |
//! | [`template`] | Per-build Tera template cache and the `where` filter |
//! | [`external`] | External data fetched into page templates |
//! | [`context`] | Per-build collaborators shared by all tasks |
//! | [`executor`] | Bounded worker pool and progress channel |
//! | [`progress`] | File status state machine, progress board, build summary |
//! | [`generate`] | End-to-end build entry point |
//! | [`config`] | Build settings: worker count, fence renderers |
//! | [`output`] | CLI output formatting for progress and summary |
//!
//! # Design Decisions
//!
//! ## One Context Per Build
//!
//! Parsed templates, fence renderers and the HTTP client live in a
//! [`context::BuildContext`] created for one build and dropped with it. Nothing
//! is process-global, so two builds in one process (or two tests) never see
//! each other's templates.
//!
//! ## Tasks as a Closed Enum
//!
//! [`tasks::Task`] is an enum over the four kinds. Everything outside the
//! `tasks` module uses only two things from a task: its output path and
//! `execute`.
//!
//! ## Bounded Pool, Unbounded Channel
//!
//! Thousands of pages each fetching external data would exhaust file
//! descriptors under a thread-per-task model. Tasks run on a rayon pool sized
//! by `--workers` (default: CPU cores). Progress flows through an unbounded
//! channel so the workers never wait on the consumer.
//!
//! ## Three Failure Levels
//!
//! - **Fatal**: unreadable or malformed manifest, invalid settings, two tasks
//!   writing the same path. The build never starts.
//! - **Per file**: any error inside one task. That file is reported `Failed`;
//!   every other file is still built.
//! - **Degraded**: an external-data fetch failure. The page renders with that
//!   value absent.

pub mod config;
pub mod context;
pub mod executor;
pub mod external;
pub mod flags;
pub mod generate;
pub mod highlight;
pub mod manifest;
pub mod markdown;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod progress;
pub mod scheduler;
pub mod tasks;
pub mod template;

#[cfg(test)]
pub(crate) mod test_helpers;
