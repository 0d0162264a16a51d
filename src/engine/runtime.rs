// src/engine/runtime.rs

use std::collections::HashSet;
use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::dag::{RunSummary, ScheduledTask};
use crate::errors::Result;
use crate::exec::ExecutorBackend;

use super::core::CoreRuntime;
use super::{CoreCommand, CoreStep, RuntimeEvent, TaskName};

/// Drives the DAG scheduler in response to `RuntimeEvent`s,
/// and delegates actual task execution to an `ExecutorBackend`.
///
/// This is a pure IO shell around `CoreRuntime`, which contains all the
/// runtime semantics.
pub struct Runtime<E: ExecutorBackend> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    executor: E,
}

impl<E: ExecutorBackend> fmt::Debug for Runtime<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<E: ExecutorBackend> Runtime<E> {
    pub fn new(core: CoreRuntime, event_rx: mpsc::Receiver<RuntimeEvent>, executor: E) -> Self {
        Self {
            core,
            event_rx,
            executor,
        }
    }

    /// Main event loop.
    ///
    /// - Starts the run over `selected`.
    /// - Consumes `RuntimeEvent`s from `event_rx` and feeds them into the core.
    /// - Executes the commands the core returns.
    ///
    /// Returns the final state of every selected task.
    pub async fn run(mut self, selected: HashSet<TaskName>) -> Result<RunSummary> {
        info!(tasks = selected.len(), "seqdag runtime started");

        let step = self.core.start(&selected);
        let mut keep_running = self.apply(step).await?;

        while keep_running {
            let event = match self.event_rx.recv().await {
                Some(e) => e,
                None => {
                    info!("runtime event channel closed; exiting");
                    break;
                }
            };

            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            keep_running = self.apply(step).await?;
        }

        let summary = self.core.summary();
        info!(
            succeeded = summary.succeeded.len(),
            skipped = summary.skipped.len(),
            failed = summary.failed.len(),
            blocked = summary.blocked.len(),
            unfinished = summary.unfinished.len(),
            interrupted = self.core.interrupted(),
            "runtime exiting"
        );
        Ok(summary)
    }

    /// Execute the commands of one core step; returns `keep_running`.
    async fn apply(&mut self, step: CoreStep) -> Result<bool> {
        for command in step.commands {
            match command {
                CoreCommand::DispatchTasks(tasks) => self.spawn_ready(tasks).await?,
                CoreCommand::RequestExit => debug!("core issued RequestExit command"),
            }
        }
        Ok(step.keep_running)
    }

    async fn spawn_ready(&mut self, tasks: Vec<ScheduledTask>) -> Result<()> {
        if tasks.is_empty() {
            return Ok(());
        }

        let names: Vec<_> = tasks.iter().map(|t| t.name.as_str()).collect();
        debug!(?names, "spawning ready tasks");

        self.executor.spawn_ready_tasks(tasks).await
    }
}
