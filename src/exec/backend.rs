// src/exec/backend.rs

//! Pluggable executor backend abstraction.
//!
//! The runtime talks to an `ExecutorBackend` instead of a raw mpsc sender.
//! This makes it easy to swap in a fake executor in tests.
//!
//! - `RealExecutorBackend` wraps the `spawn_executor` loop and forwards
//!   scheduled tasks over an mpsc channel.
//! - Tests can provide their own `ExecutorBackend` that, for example, records
//!   which tasks were scheduled and directly emits `TaskCompleted` events.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::dag::ScheduledTask;
use crate::engine::RuntimeEvent;
use crate::errors::{Error, Result};
use crate::fs::FileSystem;

use super::ExecutorContext;
use super::executor_loop::spawn_executor;

/// Trait abstracting how scheduled tasks are executed.
pub trait ExecutorBackend: Send {
    /// Dispatch the given tasks for execution.
    ///
    /// Every dispatched task must eventually produce exactly one
    /// `TaskCompleted` event, or the run never finishes.
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Real executor backend used in production.
pub struct RealExecutorBackend {
    tx: mpsc::Sender<ScheduledTask>,
}

impl RealExecutorBackend {
    /// Create a new real executor backend, wiring it to the given runtime
    /// event sender.
    ///
    /// This spawns the background executor loop immediately.
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, fs: Arc<dyn FileSystem>, force: bool) -> Self {
        let tx = spawn_executor(runtime_tx, ExecutorContext { fs, force });
        Self { tx }
    }
}

impl ExecutorBackend for RealExecutorBackend {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for task in tasks {
                tx.send(task).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
