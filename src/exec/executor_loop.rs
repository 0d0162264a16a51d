// src/exec/executor_loop.rs

//! Main executor loop that manages running task attempts.

use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::exec::ExecutorContext;
use crate::exec::task_runner::run_task;

/// Spawn the background executor loop.
///
/// The returned sender is what `RealExecutorBackend` forwards scheduled
/// tasks to. Each task runs in its own Tokio task; the scheduler already
/// enforces the job limit. When the sender is dropped, attempts still
/// running are aborted and their processes killed.
pub fn spawn_executor(
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    ctx: ExecutorContext,
) -> mpsc::Sender<ScheduledTask> {
    let (tx, mut rx) = mpsc::channel::<ScheduledTask>(32);

    tokio::spawn(async move {
        info!(force = ctx.force, "executor loop started");

        let mut running: JoinSet<()> = JoinSet::new();

        while let Some(task) = rx.recv().await {
            // Reap finished attempts.
            while running.try_join_next().is_some() {}

            debug!(task = %task.name, attempt = task.attempt, "executor received task");
            let rt_tx = runtime_tx.clone();
            let ctx = ctx.clone();
            running.spawn(async move {
                run_task(task, ctx, rt_tx).await;
            });
        }

        if !running.is_empty() {
            info!(
                running = running.len(),
                "executor channel closed; aborting running tasks"
            );
        }
        running.shutdown().await;
        info!("executor loop finished (channel closed)");
    });

    tx
}
