// tests/integration/executor_real.rs

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::mpsc;

use seqdag::dag::{DagGraph, RunSummary, Scheduler, SchedulerOptions};
use seqdag::design::Design;
use seqdag::engine::{CoreRuntime, Runtime, RuntimeEvent};
use seqdag::exec::RealExecutorBackend;
use seqdag::fs::RealFileSystem;
use seqdag::pipeline::{PlannedTask, Rule, TaskAction};
use seqdag::types::{Assay, PeakCaller};
use seqdag_test_utils::builders::DesignBuilder;
use seqdag_test_utils::{init_tracing, with_timeout};

use crate::common::planned_task;

/// Stand-ins for two peak callers, followed by validation and a copy of one
/// result to the shared location.
fn peak_tasks(root: &Path, design: Design) -> Vec<PlannedTask> {
    let empty = root.join("peaks/macs/rep1_CTCF.bed");
    let full = root.join("peaks/macs/rep1_H3K27ac.bed");
    let sentinel = root.join("peaks/.validated");
    let primary = root.join("peaks/rep1_CTCF.bed");

    vec![
        planned_task(
            "design",
            Rule::Design,
            vec![],
            vec![root.join("design.csv")],
            TaskAction::WriteDesign {
                design,
                path: root.join("design.csv"),
            },
        ),
        planned_task(
            "macs2_no_input:rep1_CTCF",
            Rule::PeaksNoInput(PeakCaller::Macs),
            vec![],
            vec![empty.clone()],
            TaskAction::Shell(format!(": > {}", empty.display())),
        ),
        planned_task(
            "macs2_with_input:rep1_H3K27ac",
            Rule::PeaksWithInput(PeakCaller::Macs),
            vec![],
            vec![full.clone()],
            TaskAction::Shell(format!("printf 'chr1\\t10\\t20\\n' > {}", full.display())),
        ),
        planned_task(
            "validate_peaks",
            Rule::ValidatePeaks,
            vec![empty.clone(), full.clone()],
            vec![sentinel.clone()],
            TaskAction::ValidatePeaks {
                files: vec![empty.clone(), full],
                sentinel: sentinel.clone(),
            },
        ),
        planned_task(
            "primary_peaks_macs:rep1_CTCF",
            Rule::PrimaryPeaks(PeakCaller::Macs),
            vec![empty.clone(), sentinel],
            vec![primary.clone()],
            TaskAction::CopyFile {
                from: empty,
                to: primary,
            },
        ),
    ]
}

async fn run_tasks(tasks: Vec<PlannedTask>, force: bool, retries: u32) -> RunSummary {
    let graph = DagGraph::from_tasks(&tasks).unwrap();
    let selected: HashSet<String> = graph.order().iter().cloned().collect();
    let scheduler = Scheduler::new(graph, tasks, SchedulerOptions { jobs: 2, retries });

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(16);
    let executor = RealExecutorBackend::new(rt_tx, Arc::new(RealFileSystem), force);
    let runtime = Runtime::new(CoreRuntime::new(scheduler), rt_rx, executor);

    with_timeout(runtime.run(selected)).await.unwrap()
}

#[tokio::test]
async fn empty_peaks_are_patched_before_the_primary_copy() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let design = DesignBuilder::new(Assay::ChIP)
        .entry_with_control("rep1", "H3K27ac", "input")
        .entry("rep1", "CTCF")
        .build();

    let summary = run_tasks(peak_tasks(dir.path(), design), false, 0).await;
    assert!(summary.is_success(), "{summary:?}");
    assert_eq!(summary.succeeded.len(), 5);

    let read = |rel: &str| std::fs::read_to_string(dir.path().join(rel)).unwrap();
    assert_eq!(read("peaks/macs/rep1_CTCF.bed"), "chr21\t1\t2\n");
    assert_eq!(read("peaks/rep1_CTCF.bed"), "chr21\t1\t2\n");
    assert_eq!(read("peaks/macs/rep1_H3K27ac.bed"), "chr1\t10\t20\n");

    let sentinel = read("peaks/.validated");
    assert!(sentinel.contains("rep1_CTCF.bed"));
    assert!(!sentinel.contains("rep1_H3K27ac.bed"));

    let design_csv = read("design.csv");
    assert!(design_csv.starts_with("sample_name,ip,control,assay"));
    assert!(design_csv.contains("rep1,H3K27ac,input,ChIP"));
}

#[tokio::test]
async fn second_run_skips_up_to_date_tasks_unless_forced() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let design = DesignBuilder::new(Assay::ChIP).entry("rep1", "CTCF").build();

    let first = run_tasks(peak_tasks(dir.path(), design.clone()), false, 0).await;
    assert!(first.is_success());

    let second = run_tasks(peak_tasks(dir.path(), design.clone()), false, 0).await;
    assert!(second.is_success());
    assert!(second.succeeded.is_empty(), "{second:?}");
    assert_eq!(second.skipped.len(), 5);

    let forced = run_tasks(peak_tasks(dir.path(), design), true, 0).await;
    assert_eq!(forced.succeeded.len(), 5);
}

#[tokio::test]
async fn failing_command_blocks_dependents() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a.txt");
    let tasks = vec![
        planned_task(
            "broken",
            Rule::BcftoolsCall,
            vec![],
            vec![out.clone()],
            TaskAction::Shell("exit 7".to_string()),
        ),
        planned_task(
            "after",
            Rule::BcftoolsFilter,
            vec![out.clone()],
            vec![dir.path().join("b.txt")],
            TaskAction::CopyFile {
                from: out,
                to: dir.path().join("b.txt"),
            },
        ),
    ];

    let summary = run_tasks(tasks, false, 0).await;
    assert_eq!(summary.failed, vec!["broken".to_string()]);
    assert_eq!(summary.blocked, vec!["after".to_string()]);
    assert!(!dir.path().join("b.txt").exists());
}

#[tokio::test]
async fn failed_peak_call_is_not_mistaken_for_fresh_output() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    let bam = dir.path().join("a.bam");
    std::fs::write(&bam, "bam").unwrap();
    let bed = dir.path().join("peaks/macs/a.bed");
    let narrow_peak = dir.path().join("peaks/macs/a/a_peaks.narrowPeak");

    // The redirect creates `bed` even though `cut` fails.
    let tasks = || {
        vec![planned_task(
            "macs2_no_input:a",
            Rule::PeaksNoInput(PeakCaller::Macs),
            vec![bam.clone()],
            vec![bed.clone()],
            TaskAction::Shell(format!(
                "cut -f 1-3 {} > {}",
                narrow_peak.display(),
                bed.display()
            )),
        )]
    };

    let first = run_tasks(tasks(), false, 1).await;
    assert_eq!(first.failed, vec!["macs2_no_input:a".to_string()], "{first:?}");
    assert!(first.skipped.is_empty(), "{first:?}");
    assert!(!bed.exists());

    let rerun = run_tasks(tasks(), false, 0).await;
    assert_eq!(rerun.failed, vec!["macs2_no_input:a".to_string()], "{rerun:?}");
    assert!(rerun.skipped.is_empty(), "{rerun:?}");
}
