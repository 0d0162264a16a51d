// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! This module contains a synchronous, deterministic "core runtime" that
//! consumes [`RuntimeEvent`]s and produces:
//! - an updated core state
//! - a list of "commands" describing what the IO shell should do next
//!
//! The async shell (`engine::runtime::Runtime`) reads events from channels,
//! sends `ScheduledTask`s to the executor and handles Ctrl+C.
//!
//! The core is unit tested without any Tokio, channels, filesystem, or
//! processes.

use std::collections::HashSet;

use tracing::warn;

use crate::dag::{RunSummary, Scheduler};
use crate::engine::event_handlers::{
    CoreStep, handle_shutdown, handle_task_completion, start_run,
};
use crate::engine::{RuntimeEvent, TaskName};

/// Pure core runtime state.
///
/// It has **no** channels, no Tokio types, and does not perform any IO.
#[derive(Debug)]
pub struct CoreRuntime {
    scheduler: Scheduler,
    interrupted: bool,
}

impl CoreRuntime {
    pub fn new(scheduler: Scheduler) -> Self {
        Self {
            scheduler,
            interrupted: false,
        }
    }

    /// Expose whether the scheduler is idle (for tests).
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle()
    }

    /// Whether a shutdown request ended the run early.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn summary(&self) -> RunSummary {
        self.scheduler.summary()
    }

    /// Begin the run over `selected`.
    pub fn start(&mut self, selected: &HashSet<TaskName>) -> CoreStep {
        start_run(&mut self.scheduler, selected)
    }

    /// Handle a single runtime event, updating core state and returning the
    /// resulting commands for the IO shell.
    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::TaskCompleted { task, outcome } => {
                handle_task_completion(&mut self.scheduler, task, outcome)
            }
            RuntimeEvent::ShutdownRequested => {
                warn!(
                    running = self.scheduler.running_count(),
                    "shutdown requested; abandoning the run"
                );
                self.interrupted = true;
                handle_shutdown()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::resources::Resources;
    use crate::dag::SchedulerOptions;
    use crate::engine::{CoreCommand, TaskOutcome};
    use crate::pipeline::planner::Plan;
    use crate::pipeline::rules::Rule;
    use crate::pipeline::task::{PlannedTask, TaskAction};

    fn core() -> CoreRuntime {
        let task = |name: &str, inputs: Vec<PathBuf>, output: &str| PlannedTask {
            name: name.to_string(),
            rule: Rule::Design,
            inputs,
            outputs: vec![PathBuf::from(output)],
            action: TaskAction::Shell(format!("echo {name}")),
            resources: Resources::default(),
        };
        let plan = Plan {
            tasks: vec![
                task("a", vec![], "a.out"),
                task("b", vec![PathBuf::from("a.out")], "b.out"),
            ],
        };
        CoreRuntime::new(Scheduler::from_plan(&plan, SchedulerOptions::default()).unwrap())
    }

    fn dispatched(step: &CoreStep) -> Vec<String> {
        step.commands
            .iter()
            .filter_map(|c| match c {
                CoreCommand::DispatchTasks(tasks) => Some(tasks),
                CoreCommand::RequestExit => None,
            })
            .flatten()
            .map(|t| t.name.clone())
            .collect()
    }

    #[test]
    fn chain_runs_to_completion() {
        let mut core = core();
        let selected = HashSet::from(["a".to_string(), "b".to_string()]);

        let step = core.start(&selected);
        assert_eq!(dispatched(&step), ["a"]);
        assert!(step.keep_running);

        let step = core.step(RuntimeEvent::TaskCompleted {
            task: "a".to_string(),
            outcome: TaskOutcome::Success,
        });
        assert_eq!(dispatched(&step), ["b"]);

        let step = core.step(RuntimeEvent::TaskCompleted {
            task: "b".to_string(),
            outcome: TaskOutcome::Success,
        });
        assert!(!step.keep_running);
        assert!(matches!(step.commands.last(), Some(CoreCommand::RequestExit)));
        assert!(core.summary().is_success());
    }

    #[test]
    fn shutdown_leaves_tasks_unfinished() {
        let mut core = core();
        let selected = HashSet::from(["a".to_string(), "b".to_string()]);
        core.start(&selected);

        let step = core.step(RuntimeEvent::ShutdownRequested);
        assert!(!step.keep_running);
        assert!(core.interrupted());
        assert_eq!(core.summary().unfinished, ["a", "b"]);
    }
}
