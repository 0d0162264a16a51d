use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use seqdag::dag::ScheduledTask;
use seqdag::engine::{RuntimeEvent, TaskOutcome};
use seqdag::errors::Result;
use seqdag::exec::ExecutorBackend;

/// A fake executor that:
/// - records which tasks were "run", with their attempt number
/// - immediately reports a `TaskCompleted` event for each scheduled task
///
/// Tasks listed in `failures` fail on their first `n` attempts
/// (`u32::MAX` for always) and succeed afterwards.
pub struct FakeExecutor {
    runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<(String, u32)>>>,
    failures: HashMap<String, u32>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: tokio::sync::mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<(String, u32)>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            failures: HashMap::new(),
        }
    }

    pub fn failing(mut self, task: &str, attempts: u32) -> Self {
        self.failures.insert(task.to_string(), attempts);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_tasks(
        &mut self,
        tasks: Vec<ScheduledTask>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let tx = self.runtime_tx.clone();
        let executed = Arc::clone(&self.executed);
        let failures = self.failures.clone();

        Box::pin(async move {
            for t in tasks {
                {
                    let mut guard = executed.lock().unwrap();
                    guard.push((t.name.clone(), t.attempt));
                }

                let outcome = match failures.get(&t.name) {
                    Some(&n) if t.attempt <= n => TaskOutcome::Failed(1),
                    _ => TaskOutcome::Success,
                };

                tx.send(RuntimeEvent::TaskCompleted {
                    task: t.name.clone(),
                    outcome,
                })
                .await
                .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }
}
