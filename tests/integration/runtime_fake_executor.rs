// tests/integration/runtime_fake_executor.rs

use std::collections::HashSet;
use std::error::Error;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::time::{Duration, timeout};

use seqdag::dag::{DagGraph, Scheduler, SchedulerOptions};
use seqdag::engine::{CoreRuntime, Runtime, RuntimeEvent};
use seqdag::pipeline::{Plan, build_plan};
use seqdag::types::{Assay, PeakCaller};
use seqdag_test_utils::builders::{ConfigFileBuilder, DesignBuilder};
use seqdag_test_utils::fake_executor::FakeExecutor;
use seqdag_test_utils::init_tracing;

type TestResult = Result<(), Box<dyn Error>>;

fn macs_plan(retries: u32) -> Plan {
    let cfg = ConfigFileBuilder::new("proj", Assay::ChIP)
        .peaks(&[PeakCaller::Macs])
        .retries(retries)
        .build();
    let design = DesignBuilder::new(Assay::ChIP)
        .entry_with_control("rep1", "H3K27ac", "input")
        .build();
    build_plan(&cfg, &design).unwrap()
}

fn position(executed: &[(String, u32)], name: &str) -> usize {
    executed
        .iter()
        .position(|(n, _)| n == name)
        .unwrap_or_else(|| panic!("{name} never ran"))
}

#[tokio::test]
async fn runtime_with_fake_executor_runs_plan_in_dependency_order() -> TestResult {
    init_tracing();

    let plan = macs_plan(0);
    let graph = DagGraph::from_tasks(&plan.tasks)?;
    let selected: HashSet<String> = graph.order().iter().cloned().collect();
    let options = SchedulerOptions { jobs: 2, retries: 0 };
    let scheduler = Scheduler::new(graph, plan.tasks, options);

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());

    let runtime = Runtime::new(CoreRuntime::new(scheduler), rt_rx, executor);

    let summary = match timeout(Duration::from_secs(3), runtime.run(selected)).await {
        Ok(result) => result?,
        Err(_) => panic!("runtime did not finish within 3 seconds"),
    };

    assert!(summary.is_success());
    assert_eq!(summary.succeeded.len(), 4);

    let executed = executed.lock().unwrap().clone();
    let call = position(&executed, "macs2_with_input:rep1_H3K27ac");
    let validate = position(&executed, "validate_peaks");
    let primary = position(&executed, "primary_peaks_macs:rep1_H3K27ac");
    assert!(call < validate);
    assert!(validate < primary);

    Ok(())
}

#[tokio::test]
async fn failed_task_is_retried_then_succeeds() -> TestResult {
    init_tracing();

    let plan = macs_plan(2);
    let scheduler = Scheduler::from_plan(&plan, SchedulerOptions { jobs: 1, retries: 2 })?;
    let selected: HashSet<String> = plan.task_names().map(str::to_string).collect();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone())
        .failing("macs2_with_input:rep1_H3K27ac", 2);

    let runtime = Runtime::new(CoreRuntime::new(scheduler), rt_rx, executor);
    let summary = timeout(Duration::from_secs(3), runtime.run(selected)).await??;

    assert!(summary.is_success());
    let attempts: Vec<u32> = executed
        .lock()
        .unwrap()
        .iter()
        .filter(|(n, _)| n == "macs2_with_input:rep1_H3K27ac")
        .map(|(_, a)| *a)
        .collect();
    assert_eq!(attempts, vec![1, 2, 3]);

    Ok(())
}

#[tokio::test]
async fn exhausted_failure_blocks_downstream_tasks() -> TestResult {
    init_tracing();

    let plan = macs_plan(0);
    let scheduler = Scheduler::from_plan(&plan, SchedulerOptions::default())?;
    let selected: HashSet<String> = plan.task_names().map(str::to_string).collect();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone())
        .failing("macs2_with_input:rep1_H3K27ac", u32::MAX);

    let runtime = Runtime::new(CoreRuntime::new(scheduler), rt_rx, executor);
    let summary = timeout(Duration::from_secs(3), runtime.run(selected)).await??;

    assert_eq!(summary.failed, vec!["macs2_with_input:rep1_H3K27ac".to_string()]);
    let blocked: HashSet<&str> = summary.blocked.iter().map(String::as_str).collect();
    assert_eq!(
        blocked,
        HashSet::from(["validate_peaks", "primary_peaks_macs:rep1_H3K27ac"])
    );
    assert_eq!(summary.succeeded, vec!["design".to_string()]);

    let ran: Vec<String> = executed.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
    assert!(!ran.contains(&"validate_peaks".to_string()));

    Ok(())
}

#[tokio::test]
async fn shutdown_before_start_leaves_tasks_unfinished() -> TestResult {
    init_tracing();

    let plan = macs_plan(0);
    let scheduler = Scheduler::from_plan(&plan, SchedulerOptions::default())?;
    let selected: HashSet<String> = plan.task_names().map(str::to_string).collect();

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);

    // Completion events from the executor queue up behind the shutdown.
    rt_tx.send(RuntimeEvent::ShutdownRequested).await?;

    let executed = Arc::new(Mutex::new(Vec::new()));
    let executor = FakeExecutor::new(rt_tx.clone(), executed.clone());
    let runtime = Runtime::new(CoreRuntime::new(scheduler), rt_rx, executor);
    let summary = timeout(Duration::from_secs(3), runtime.run(selected)).await??;

    assert!(!summary.is_success());
    assert!(!summary.unfinished.is_empty());

    Ok(())
}
