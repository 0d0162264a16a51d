// src/exec/task_runner.rs

//! Single task attempt runner.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::dag::ScheduledTask;
use crate::engine::{RuntimeEvent, TaskOutcome};
use crate::exec::ExecutorContext;
use crate::exec::actions::run_action;
use crate::fs::is_up_to_date;
use crate::pipeline::task::TaskAction;

/// Run one attempt of a task and emit exactly one `TaskCompleted` event.
///
/// On a first attempt, tasks whose outputs are newer than their inputs are
/// skipped unless `force` is set. Declared outputs are removed before the
/// task runs and again if the attempt fails. Errors setting up the attempt
/// count as a failure.
pub async fn run_task(
    task: ScheduledTask,
    ctx: ExecutorContext,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
) {
    let task_name = task.name.clone();
    let attempt = task.attempt;

    let outcome = match run_task_inner(&task, &ctx).await {
        Ok(outcome) => outcome,
        Err(err) => {
            error!(
                task = %task_name,
                attempt,
                error = %format!("{err:#}"),
                "task execution error"
            );
            TaskOutcome::Failed(-1)
        }
    };

    if runtime_tx
        .send(RuntimeEvent::TaskCompleted {
            task: task_name.clone(),
            outcome,
        })
        .await
        .is_err()
    {
        debug!(task = %task_name, "runtime gone; dropping completion event");
    }
}

async fn run_task_inner(task: &ScheduledTask, ctx: &ExecutorContext) -> Result<TaskOutcome> {
    // Retries always run: whatever a failed attempt left behind is not fresh.
    if task.attempt <= 1
        && !ctx.force
        && is_up_to_date(ctx.fs.as_ref(), &task.inputs, &task.outputs)
    {
        info!(task = %task.name, "outputs up to date; skipping");
        return Ok(TaskOutcome::Skipped);
    }

    for output in &task.outputs {
        ctx.fs
            .remove(output)
            .with_context(|| format!("clearing stale output of task '{}'", task.name))?;
    }

    let result = execute(task, ctx).await;
    if !matches!(result, Ok(TaskOutcome::Success)) {
        discard_outputs(task, ctx);
    }
    result
}

async fn execute(task: &ScheduledTask, ctx: &ExecutorContext) -> Result<TaskOutcome> {
    let outcome = match &task.action {
        TaskAction::Shell(script) => run_shell(task, script).await?,
        action => {
            let action = action.clone();
            let fs = Arc::clone(&ctx.fs);
            let result = tokio::task::spawn_blocking(move || run_action(&action, fs.as_ref()))
                .await
                .with_context(|| format!("joining in-process action of task '{}'", task.name))?;
            match result {
                Ok(()) => TaskOutcome::Success,
                Err(err) => {
                    error!(
                        task = %task.name,
                        error = %format!("{err:#}"),
                        "in-process action failed"
                    );
                    TaskOutcome::Failed(1)
                }
            }
        }
    };

    if outcome == TaskOutcome::Success {
        let missing: Vec<String> = task
            .outputs
            .iter()
            .filter(|output| !ctx.fs.exists(output))
            .map(|output| output.display().to_string())
            .collect();
        if !missing.is_empty() {
            error!(task = %task.name, ?missing, "task succeeded but outputs are missing");
            return Ok(TaskOutcome::Failed(-1));
        }
    }

    Ok(outcome)
}

/// Drop partial outputs of a failed attempt so no later run mistakes them
/// for results.
fn discard_outputs(task: &ScheduledTask, ctx: &ExecutorContext) {
    for output in &task.outputs {
        if let Err(e) = ctx.fs.remove(output) {
            warn!(
                task = %task.name,
                output = %output.display(),
                error = %format!("{e:#}"),
                "failed to remove output of failed attempt"
            );
        }
    }
}

async fn run_shell(task: &ScheduledTask, script: &str) -> Result<TaskOutcome> {
    for output in &task.outputs {
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("creating output dir {:?}", parent))?;
        }
    }

    let res = task.resources;
    info!(
        task = %task.name,
        attempt = task.attempt,
        threads = res.threads,
        mem_mb = res.mem_mb,
        runtime_min = res.runtime_min,
        cmd = %script,
        "starting task process"
    );

    // pipefail: `a | b` fails when `a` does, not only when `b` does.
    let mut cmd = Command::new("bash");
    cmd.args(["-e", "-u", "-o", "pipefail", "-c"])
        .arg(script)
        .env("SEQDAG_THREADS", res.threads.to_string())
        .env("SEQDAG_MEM_MB", res.mem_mb.to_string())
        .env("SEQDAG_RUNTIME_MIN", res.runtime_min.to_string())
        .env("SEQDAG_ATTEMPT", task.attempt.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = cmd
        .spawn()
        .with_context(|| format!("spawning process for task '{}'", task.name))?;

    // Always consume output so pipe buffers don't fill; log at debug.
    if let Some(stdout) = child.stdout.take() {
        forward_lines(task.name.clone(), "stdout", stdout);
    }
    if let Some(stderr) = child.stderr.take() {
        forward_lines(task.name.clone(), "stderr", stderr);
    }

    let limit = Duration::from_secs(res.runtime_min.saturating_mul(60));
    match tokio::time::timeout(limit, child.wait()).await {
        Ok(status_res) => {
            let status = status_res
                .with_context(|| format!("waiting for process of task '{}'", task.name))?;
            let code = status.code().unwrap_or(-1);

            info!(
                task = %task.name,
                attempt = task.attempt,
                exit_code = code,
                success = status.success(),
                "task process exited"
            );

            Ok(if status.success() {
                TaskOutcome::Success
            } else {
                TaskOutcome::Failed(code)
            })
        }
        Err(_) => {
            warn!(
                task = %task.name,
                attempt = task.attempt,
                runtime_min = res.runtime_min,
                "task exceeded its runtime; killing process"
            );
            if let Err(e) = child.kill().await {
                warn!(task = %task.name, error = %e, "failed to kill timed out process");
            }
            Ok(TaskOutcome::Failed(-1))
        }
    }
}

fn forward_lines<R>(task: String, stream: &'static str, reader: R)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            debug!(task = %task, stream, "{}", line);
        }
    });
}
