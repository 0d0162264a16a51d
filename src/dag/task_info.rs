// src/dag/task_info.rs

//! Task metadata and per-run state management.

use std::path::PathBuf;

use crate::config::resources::Resources;
use crate::engine::TaskName;
use crate::pipeline::rules::Rule;
use crate::pipeline::task::{PlannedTask, TaskAction};

/// Per-run state of a task (internal).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Task is selected for this run but is waiting on dependencies
    /// (or on a free job slot, or on its next attempt).
    Pending,
    /// Task has been dispatched to the executor and is currently running.
    Running,
    DoneSuccess,
    /// Outputs were already up to date.
    Skipped,
    /// Task failed in this run (or was blocked by a failed dependency).
    DoneFailed,
}

/// Public, read-only view of a task's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskRunState {
    /// The task was not selected for this run.
    NotInRun,
    Pending,
    Running,
    DoneSuccess,
    Skipped,
    DoneFailed,
}

impl From<Option<RunState>> for TaskRunState {
    fn from(state: Option<RunState>) -> Self {
        match state {
            None => TaskRunState::NotInRun,
            Some(RunState::Pending) => TaskRunState::Pending,
            Some(RunState::Running) => TaskRunState::Running,
            Some(RunState::DoneSuccess) => TaskRunState::DoneSuccess,
            Some(RunState::Skipped) => TaskRunState::Skipped,
            Some(RunState::DoneFailed) => TaskRunState::DoneFailed,
        }
    }
}

/// Static task information from the plan, plus per-run state.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub name: TaskName,
    pub rule: Rule,
    pub action: TaskAction,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    /// First-attempt resources.
    pub resources: Resources,
    /// Tasks producing this task's inputs.
    pub deps: Vec<TaskName>,

    /// Per-run state (None if not participating in the current run).
    pub run_state: Option<RunState>,

    /// Attempts dispatched so far in this run.
    pub attempts: u32,

    /// Exit code of the last failed attempt. `None` for tasks that were
    /// failed because a dependency failed.
    pub exit_code: Option<i32>,
}

impl TaskInfo {
    pub fn from_planned(task: PlannedTask, deps: Vec<TaskName>) -> Self {
        Self {
            name: task.name,
            rule: task.rule,
            action: task.action,
            inputs: task.inputs,
            outputs: task.outputs,
            resources: task.resources,
            deps,
            run_state: None,
            attempts: 0,
            exit_code: None,
        }
    }
}

/// Description of a task that the scheduler wants the executor to run now.
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub name: TaskName,
    pub rule: Rule,
    pub action: TaskAction,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    /// Resources for this attempt, already scaled.
    pub resources: Resources,
    /// 1-based attempt number.
    pub attempt: u32,
}

impl ScheduledTask {
    pub fn from_task_info(info: &TaskInfo) -> Self {
        Self {
            name: info.name.clone(),
            rule: info.rule,
            action: info.action.clone(),
            inputs: info.inputs.clone(),
            outputs: info.outputs.clone(),
            resources: info.resources.for_attempt(info.attempts),
            attempt: info.attempts,
        }
    }
}
