// src/dag/state_manager.rs

//! Per-run state management for tasks in the scheduler.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use crate::dag::DagGraph;
use crate::dag::task_info::{RunState, ScheduledTask, TaskInfo};
use crate::engine::TaskName;

/// Manages per-run state transitions for tasks.
pub struct StateManager<'a> {
    graph: &'a DagGraph,
    tasks: &'a mut HashMap<TaskName, TaskInfo>,
    jobs: usize,
}

impl<'a> StateManager<'a> {
    pub fn new(
        graph: &'a DagGraph,
        tasks: &'a mut HashMap<TaskName, TaskInfo>,
        jobs: usize,
    ) -> Self {
        Self { graph, tasks, jobs }
    }

    /// Mark every selected task `Pending` and reset its attempt counter.
    pub fn mark_selected_pending(&mut self, selected: &HashSet<TaskName>) {
        for name in selected {
            match self.tasks.get_mut(name) {
                Some(info) => {
                    info.run_state = Some(RunState::Pending);
                    info.attempts = 0;
                    info.exit_code = None;
                    debug!(task = %info.name, "marked Pending for this run");
                }
                None => {
                    warn!(task = %name, "selected task not present in tasks map");
                }
            }
        }
    }

    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        ReadOnlyStateManager::new(self.tasks).deps_satisfied_for_info(info)
    }

    /// Mark every pending dependent (transitively) of a failed task as
    /// `DoneFailed` for this run.
    ///
    /// Returns the newly failed tasks, excluding the root.
    pub fn mark_dependents_failed(&mut self, failed_task: &str) -> Vec<TaskName> {
        let mut stack: Vec<TaskName> = self.graph.dependents_of(failed_task).to_vec();

        let mut newly_failed = Vec::new();

        while let Some(name) = stack.pop() {
            if let Some(info) = self.tasks.get_mut(&name) {
                match info.run_state {
                    Some(RunState::Pending) => {
                        info.run_state = Some(RunState::DoneFailed);
                        debug!(
                            task = %info.name,
                            upstream = %failed_task,
                            "marking dependent as DoneFailed due to upstream failure"
                        );
                        newly_failed.push(info.name.clone());
                        stack.extend(self.graph.dependents_of(&name).iter().cloned());
                    }
                    Some(RunState::Running)
                    | Some(RunState::DoneSuccess)
                    | Some(RunState::Skipped)
                    | Some(RunState::DoneFailed)
                    | None => {
                        // Running dependents can't exist; the rest are
                        // terminal or outside this run.
                    }
                }
            }
        }

        newly_failed
    }

    /// Pick `Pending` tasks whose dependencies are satisfied, in topological
    /// order, until every job slot is taken. Picked tasks become `Running`
    /// with their attempt counter bumped.
    pub fn collect_new_ready_tasks(&mut self) -> Vec<ScheduledTask> {
        let running = self
            .tasks
            .values()
            .filter(|info| info.run_state == Some(RunState::Running))
            .count();
        let free = self.jobs.saturating_sub(running);
        if free == 0 {
            return Vec::new();
        }

        // Decide first, then mutate to avoid borrowing issues.
        let candidates: Vec<TaskName> = self
            .graph
            .order()
            .iter()
            .filter(|name| {
                self.tasks.get(name.as_str()).is_some_and(|info| {
                    info.run_state == Some(RunState::Pending) && self.deps_satisfied_for_info(info)
                })
            })
            .take(free)
            .cloned()
            .collect();

        let mut ready = Vec::new();
        for name in candidates {
            if let Some(info) = self.tasks.get_mut(&name) {
                info.attempts += 1;
                info.run_state = Some(RunState::Running);

                if info.attempts > 1 {
                    info!(
                        task = %info.name,
                        attempt = info.attempts,
                        "scheduling task for another attempt"
                    );
                } else {
                    info!(task = %info.name, rule = %info.rule, "scheduling task");
                }

                ready.push(ScheduledTask::from_task_info(info));
            }
        }

        ready
    }

    /// Check if all tasks are in a terminal state.
    pub fn all_tasks_terminal(&self) -> bool {
        !self.tasks.values().any(|info| {
            matches!(
                info.run_state,
                Some(RunState::Pending) | Some(RunState::Running)
            )
        })
    }
}

/// A read-only view for checking dependency satisfaction.
pub struct ReadOnlyStateManager<'a> {
    tasks: &'a HashMap<TaskName, TaskInfo>,
}

impl<'a> ReadOnlyStateManager<'a> {
    pub fn new(tasks: &'a HashMap<TaskName, TaskInfo>) -> Self {
        Self { tasks }
    }

    /// Whether every dependency of `info` is done for the current run.
    ///
    /// Dependencies outside the run count as satisfied: their outputs are
    /// expected on disk already.
    pub fn deps_satisfied_for_info(&self, info: &TaskInfo) -> bool {
        for dep_name in &info.deps {
            let dep = match self.tasks.get(dep_name) {
                Some(d) => d,
                None => {
                    warn!(
                        task = %info.name,
                        dep = %dep_name,
                        "dependency missing from tasks map"
                    );
                    return false;
                }
            };

            match dep.run_state {
                Some(RunState::DoneSuccess) | Some(RunState::Skipped) | None => {}
                Some(RunState::DoneFailed)
                | Some(RunState::Pending)
                | Some(RunState::Running) => return false,
            }
        }

        true
    }
}
