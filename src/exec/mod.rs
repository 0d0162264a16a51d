// src/exec/mod.rs

//! Task execution layer.
//!
//! This module runs scheduled tasks, either as `bash -c` processes with
//! `pipefail` through `tokio::process::Command` or as in-process actions,
//! and reports back to the orchestration runtime via `RuntimeEvent`s.
//!
//! - [`executor_loop`] owns the main executor loop which spawns one Tokio
//!   task per scheduled task.
//! - [`task_runner`] checks freshness and runs a single attempt.
//! - [`actions`] implements the in-process steps (design table, peak
//!   validation, copies, hub files).
//! - [`backend`] provides the `ExecutorBackend` trait and a concrete
//!   `RealExecutorBackend` that the runtime uses in production, and which
//!   tests can replace with a fake implementation.

use std::sync::Arc;

use crate::fs::FileSystem;

pub mod actions;
pub mod backend;
pub mod executor_loop;
pub mod task_runner;

pub use backend::{ExecutorBackend, RealExecutorBackend};
pub use executor_loop::spawn_executor;

/// Shared by every task attempt.
#[derive(Debug, Clone)]
pub struct ExecutorContext {
    pub fs: Arc<dyn FileSystem>,
    /// Run tasks even when their outputs are up to date.
    pub force: bool,
}
