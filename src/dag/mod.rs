// src/dag/mod.rs

//! DAG representation and scheduling.
//!
//! - [`graph`] derives dependencies between planned tasks from their input
//!   and output paths.
//! - [`scheduler`] contains the per-run state machine that decides
//!   which tasks are ready to run, retries failures and fails dependents.
//! - [`task_info`] provides task metadata and scheduled task types.
//! - [`scheduler_step`] defines the result type for scheduler steps.
//! - [`state_manager`] manages per-run state transitions.

pub mod graph;
pub mod scheduler;
pub mod scheduler_step;
pub mod state_manager;
pub mod task_info;

pub use graph::DagGraph;
pub use scheduler::{RunSummary, Scheduler, SchedulerOptions};
pub use scheduler_step::SchedulerStep;
pub use task_info::{ScheduledTask, TaskRunState};
