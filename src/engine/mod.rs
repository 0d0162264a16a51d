// src/engine/mod.rs

//! Orchestration engine for seqdag.
//!
//! This module ties together the DAG scheduler and the runtime event loop
//! that reacts to task completions and shutdown signals.
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`].

/// Canonical task name type used throughout the engine.
pub type TaskName = String;

/// Outcome of a task attempt for the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskOutcome {
    Success,
    /// Outputs were up to date; nothing ran.
    Skipped,
    Failed(i32),
}

/// Events flowing into the runtime from the executor and signal handlers.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A task attempt finished with a concrete outcome.
    TaskCompleted {
        task: TaskName,
        outcome: TaskOutcome,
    },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod event_handlers;
pub mod runtime;

pub use core::CoreRuntime;
pub use event_handlers::{CoreCommand, CoreStep};
pub use runtime::Runtime;
