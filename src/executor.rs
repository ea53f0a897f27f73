//! Concurrent task executor.
//!
//! Tasks are independent, so execution is a flat fan-out over a bounded
//! [rayon](https://docs.rs/rayon) pool sized by
//! [`effective_threads`](crate::config::effective_threads). The pool runs on a
//! background thread and reports through an unbounded channel:
//!
//! ```text
//!   execute(tasks) ──▶ Build { initial: [Pending; n], rx }
//!        │
//!        └─ thread ─▶ pool.install(par_iter) ─▶ Started, Completed|Failed ─▶ tx
//! ```
//!
//! The channel closes once every task has reported its terminal event and the
//! last sender is dropped. Because it is unbounded, a caller that stops
//! draining never stalls the workers.
//!
//! A failing task, or a panicking one, becomes a `Failed` event for that file
//! only. Nothing a task does can abort its siblings.

use crate::context::BuildContext;
use crate::progress::{BuildSummary, FileProgress, FileStatus, ProgressBoard};
use crate::tasks::Task;
use rayon::prelude::*;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExecuteError {
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
    #[error("failed to spawn executor thread: {0}")]
    Spawn(#[from] std::io::Error),
}

/// A running build.
pub struct Build {
    initial: Vec<FileProgress>,
    rx: Receiver<FileProgress>,
    handle: Option<JoinHandle<()>>,
}

impl Build {
    /// Every task as `Pending`, in compile order. Available before any event
    /// is drained.
    pub fn initial(&self) -> &[FileProgress] {
        &self.initial
    }

    /// Next event if one is ready. `Err(Disconnected)` once the build is done
    /// and drained.
    pub fn try_recv(&self) -> Result<FileProgress, TryRecvError> {
        self.rx.try_recv()
    }

    /// Block until the next event; `None` once every task is terminal.
    pub fn recv(&self) -> Option<FileProgress> {
        self.rx.recv().ok()
    }

    /// Blocking iterator over the remaining events.
    pub fn events(&self) -> impl Iterator<Item = FileProgress> + '_ {
        self.rx.iter()
    }

    /// Drain to closure and summarize.
    pub fn wait(mut self) -> BuildSummary {
        let mut board = ProgressBoard::new(std::mem::take(&mut self.initial));
        for event in self.rx.iter() {
            board.apply(&event);
        }
        self.join();
        if !board.is_finished() {
            log::warn!("Build closed with files still in progress");
        }
        board.summary()
    }

    fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("Executor thread panicked");
            }
        }
    }
}

/// Start executing `tasks` on a pool of `workers` threads.
pub fn execute(
    tasks: Vec<Task>,
    ctx: Arc<BuildContext>,
    workers: usize,
) -> Result<Build, ExecuteError> {
    let initial: Vec<FileProgress> = tasks
        .iter()
        .map(|t| FileProgress::new(t.name(), FileStatus::Pending))
        .collect();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("gengo-worker-{i}"))
        .build()?;

    log::info!("Executing {} tasks on {} workers", tasks.len(), workers);
    let (tx, rx) = mpsc::channel();
    let handle = thread::Builder::new()
        .name("gengo-executor".into())
        .spawn(move || {
            pool.install(|| {
                tasks
                    .par_iter()
                    .for_each_with(tx, |tx, task| run_task(task, &ctx, tx));
            });
            log::debug!("Build used {} parsed templates", ctx.templates.loaded());
        })?;

    Ok(Build {
        initial,
        rx,
        handle: Some(handle),
    })
}

fn run_task(task: &Task, ctx: &BuildContext, tx: &Sender<FileProgress>) {
    let name = task.name();
    // A closed receiver only means nobody is watching; keep building.
    let _ = tx.send(FileProgress::new(name, FileStatus::Started));
    log::debug!("Started {} task {}", task.kind(), name.display());

    let status = match catch_unwind(AssertUnwindSafe(|| task.execute(ctx))) {
        Ok(Ok(())) => {
            log::debug!("Completed {}", name.display());
            FileStatus::Completed
        }
        Ok(Err(err)) => {
            log::error!("Failed {}: {}", name.display(), err);
            FileStatus::Failed
        }
        Err(_) => {
            log::error!("Task for {} panicked", name.display());
            FileStatus::Failed
        }
    };
    let _ = tx.send(FileProgress::new(name, status));
}
