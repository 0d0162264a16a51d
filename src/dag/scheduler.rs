// src/dag/scheduler.rs

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::graph::DagGraph;
use crate::dag::scheduler_step::SchedulerStep;
use crate::dag::state_manager::{ReadOnlyStateManager, StateManager};
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo, TaskRunState};
use crate::engine::{TaskName, TaskOutcome};
use crate::errors::Result;
use crate::pipeline::planner::Plan;
use crate::pipeline::task::PlannedTask;

/// Executor limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerOptions {
    /// Maximum number of tasks running at once (at least 1).
    pub jobs: usize,
    /// Extra attempts after a failure.
    pub retries: u32,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            jobs: 1,
            retries: 0,
        }
    }
}

/// What happened to each selected task once a run is over.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: Vec<TaskName>,
    pub skipped: Vec<TaskName>,
    /// Tasks whose own command failed on every attempt.
    pub failed: Vec<TaskName>,
    /// Tasks never run because a dependency failed.
    pub blocked: Vec<TaskName>,
    /// Tasks still pending or running (run interrupted).
    pub unfinished: Vec<TaskName>,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.blocked.is_empty() && self.unfinished.is_empty()
    }
}

/// Scheduler holds the immutable DAG plus mutable per-run state.
///
/// It is responsible for:
/// - remembering which tasks are selected for the run
/// - deciding when a task is ready (deps done and a job slot free)
/// - retrying failed tasks with fresh attempts
/// - failing dependents once a task has no attempts left
#[derive(Debug)]
pub struct Scheduler {
    graph: DagGraph,
    tasks: HashMap<TaskName, TaskInfo>,
    options: SchedulerOptions,
    active: bool,
}

impl Scheduler {
    pub fn new(graph: DagGraph, tasks: Vec<PlannedTask>, options: SchedulerOptions) -> Self {
        let tasks = tasks
            .into_iter()
            .map(|task| {
                let deps = graph.dependencies_of(&task.name).to_vec();
                (task.name.clone(), TaskInfo::from_planned(task, deps))
            })
            .collect();

        Self {
            graph,
            tasks,
            options: SchedulerOptions {
                jobs: options.jobs.max(1),
                ..options
            },
            active: false,
        }
    }

    /// Build the graph for `plan` and a scheduler over it.
    pub fn from_plan(plan: &Plan, options: SchedulerOptions) -> Result<Self> {
        let graph = DagGraph::from_tasks(&plan.tasks)?;
        Ok(Self::new(graph, plan.tasks.clone(), options))
    }

    pub fn graph(&self) -> &DagGraph {
        &self.graph
    }

    pub fn options(&self) -> SchedulerOptions {
        self.options
    }

    /// Returns `true` if there is currently no active run.
    pub fn is_idle(&self) -> bool {
        !self.active
    }

    /// Read-only view of the given task's run state.
    pub fn run_state_of(&self, task: &str) -> Option<TaskRunState> {
        let info = self.tasks.get(task)?;
        Some(info.run_state.into())
    }

    /// Attempts dispatched for `task` in this run.
    pub fn attempts_of(&self, task: &str) -> Option<u32> {
        self.tasks.get(task).map(|info| info.attempts)
    }

    pub fn running_count(&self) -> usize {
        self.tasks
            .values()
            .filter(|info| info.run_state == Some(RunState::Running))
            .count()
    }

    /// Names of tasks that are participating in the active run.
    pub fn tasks_in_current_run(&self) -> Vec<TaskName> {
        if !self.active {
            return Vec::new();
        }

        self.tasks
            .values()
            .filter(|info| info.run_state.is_some())
            .map(|info| info.name.clone())
            .collect()
    }

    /// Whether the dependencies of `task` are satisfied for the current run.
    ///
    /// Returns `None` if the task is unknown.
    pub fn deps_satisfied(&self, task: &str) -> Option<bool> {
        let info = self.tasks.get(task)?;
        let mgr = ReadOnlyStateManager::new(&self.tasks);
        Some(mgr.deps_satisfied_for_info(info))
    }

    /// Task names in topological order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.graph.tasks()
    }

    /// Start a run over `selected` and return the first tasks to dispatch.
    pub fn start(&mut self, selected: &HashSet<TaskName>) -> Vec<ScheduledTask> {
        self.start_step_internal(selected).newly_scheduled
    }

    /// Handle completion of a task with a concrete outcome.
    pub fn handle_completion(&mut self, task: &str, outcome: TaskOutcome) -> Vec<ScheduledTask> {
        self.completion_step_internal(task, outcome)
            .newly_scheduled
    }

    /// Manual-step variant of `start` that returns a rich [`SchedulerStep`].
    pub fn step_start(&mut self, selected: &HashSet<TaskName>) -> SchedulerStep {
        self.start_step_internal(selected)
    }

    /// Manual-step variant of `handle_completion`.
    pub fn step_completion(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        self.completion_step_internal(task, outcome)
    }

    /// Final state of every task selected for the last run, in topological
    /// order.
    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary::default();
        for name in self.graph.order() {
            let Some(info) = self.tasks.get(name) else {
                continue;
            };
            match info.run_state {
                Some(RunState::DoneSuccess) => summary.succeeded.push(name.clone()),
                Some(RunState::Skipped) => summary.skipped.push(name.clone()),
                Some(RunState::DoneFailed) if info.exit_code.is_some() => {
                    summary.failed.push(name.clone())
                }
                Some(RunState::DoneFailed) => summary.blocked.push(name.clone()),
                Some(RunState::Pending) | Some(RunState::Running) => {
                    summary.unfinished.push(name.clone())
                }
                None => {}
            }
        }
        summary
    }

    /// Clear `active` once every task is terminal.
    ///
    /// Returns `true` if this call transitioned the scheduler to idle.
    fn maybe_finish_run(&mut self) -> bool {
        if !self.active {
            return false;
        }

        let manager = StateManager::new(&self.graph, &mut self.tasks, self.options.jobs);

        if manager.all_tasks_terminal() {
            info!("scheduler: all tasks terminal; marking run as finished");
            self.active = false;
            true
        } else {
            false
        }
    }

    fn start_step_internal(&mut self, selected: &HashSet<TaskName>) -> SchedulerStep {
        if self.active {
            warn!("start called while a run is active; ignoring");
            return SchedulerStep::default();
        }

        for info in self.tasks.values_mut() {
            info.run_state = None;
        }
        self.active = true;
        debug!(
            selected = selected.len(),
            jobs = self.options.jobs,
            retries = self.options.retries,
            "scheduler: starting run"
        );

        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.options.jobs);
        manager.mark_selected_pending(selected);
        let newly_scheduled = manager.collect_new_ready_tasks();
        let run_just_finished = self.maybe_finish_run();

        SchedulerStep {
            newly_scheduled,
            run_just_finished,
            ..SchedulerStep::default()
        }
    }

    fn completion_step_internal(&mut self, task: &str, outcome: TaskOutcome) -> SchedulerStep {
        if !self.active {
            warn!(task = %task, "completion with no active run; ignoring");
            return SchedulerStep::default();
        }

        let mut step = SchedulerStep::default();
        let retries = self.options.retries;

        match self.tasks.get_mut(task) {
            Some(info) if info.run_state != Some(RunState::Running) => {
                warn!(
                    task = %task,
                    state = ?info.run_state,
                    "completion for a task that is not running; ignoring"
                );
                return step;
            }
            Some(info) => match outcome {
                TaskOutcome::Success => {
                    info.run_state = Some(RunState::DoneSuccess);
                    debug!(task = %info.name, attempt = info.attempts, "task completed successfully");
                }
                TaskOutcome::Skipped => {
                    info.run_state = Some(RunState::Skipped);
                    debug!(task = %info.name, "task outputs up to date; skipped");
                }
                TaskOutcome::Failed(code) if info.attempts <= retries => {
                    info.run_state = Some(RunState::Pending);
                    warn!(
                        task = %info.name,
                        attempt = info.attempts,
                        retries,
                        exit_code = code,
                        "task failed; will retry"
                    );
                    step.newly_retried.push(info.name.clone());
                }
                TaskOutcome::Failed(code) => {
                    info.run_state = Some(RunState::DoneFailed);
                    info.exit_code = Some(code);
                    warn!(
                        task = %info.name,
                        attempt = info.attempts,
                        exit_code = code,
                        "task failed; failing dependents in this run"
                    );
                    step.newly_failed.push(info.name.clone());
                    let mut manager =
                        StateManager::new(&self.graph, &mut self.tasks, self.options.jobs);
                    let mut dep_failures = manager.mark_dependents_failed(task);
                    step.newly_failed.append(&mut dep_failures);
                }
            },
            None => {
                warn!(task = %task, "completion for unknown task; ignoring");
                return step;
            }
        }

        // A slot was freed either way.
        let mut manager = StateManager::new(&self.graph, &mut self.tasks, self.options.jobs);
        step.newly_scheduled = manager.collect_new_ready_tasks();
        step.run_just_finished = self.maybe_finish_run();
        step
    }
}
