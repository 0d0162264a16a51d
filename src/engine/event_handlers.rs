// src/engine/event_handlers.rs

//! Event handling logic for the core runtime.

use std::collections::HashSet;

use crate::dag::{ScheduledTask, Scheduler};
use crate::engine::{TaskName, TaskOutcome};

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone)]
pub enum CoreCommand {
    /// Send these tasks to the executor.
    DispatchTasks(Vec<ScheduledTask>),
    /// The run is over; the shell should stop.
    RequestExit,
}

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone)]
pub struct CoreStep {
    /// Commands the IO shell should execute.
    pub commands: Vec<CoreCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn from_ready(scheduler: &Scheduler, newly_ready: Vec<ScheduledTask>) -> Self {
        let mut commands = Vec::new();
        if !newly_ready.is_empty() {
            commands.push(CoreCommand::DispatchTasks(newly_ready));
        }

        // Nothing left to wait for once the scheduler is idle.
        let keep_running = !scheduler.is_idle();
        if !keep_running {
            commands.push(CoreCommand::RequestExit);
        }

        CoreStep {
            commands,
            keep_running,
        }
    }
}

/// Seed a run with the selected tasks.
pub fn start_run(scheduler: &mut Scheduler, selected: &HashSet<TaskName>) -> CoreStep {
    let newly_ready = scheduler.start(selected);
    CoreStep::from_ready(scheduler, newly_ready)
}

/// Handle a task completion event.
pub fn handle_task_completion(
    scheduler: &mut Scheduler,
    task: TaskName,
    outcome: TaskOutcome,
) -> CoreStep {
    let newly_ready = scheduler.handle_completion(&task, outcome);
    CoreStep::from_ready(scheduler, newly_ready)
}

/// Stop dispatching; running processes are killed when their handles drop.
pub fn handle_shutdown() -> CoreStep {
    CoreStep {
        commands: vec![CoreCommand::RequestExit],
        keep_running: false,
    }
}
