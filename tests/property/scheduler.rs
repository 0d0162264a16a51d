// tests/property/scheduler.rs

use std::collections::HashSet;
use std::path::PathBuf;

use proptest::prelude::*;

use seqdag::dag::{DagGraph, Scheduler, SchedulerOptions, TaskRunState};
use seqdag::engine::TaskOutcome;
use seqdag::pipeline::{PlannedTask, Rule, TaskAction};

use crate::common::planned_task;

fn file(i: usize) -> PathBuf {
    PathBuf::from(format!("out/task_{i}.txt"))
}

// Acyclic by construction: task N only reads outputs of tasks 0..N-1.
fn dag_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<PlannedTask>> {
    (1..=max_tasks).prop_flat_map(|num_tasks| {
        proptest::collection::vec(
            proptest::collection::vec(any::<usize>(), 0..num_tasks),
            num_tasks,
        )
        .prop_map(|raw_deps| {
            raw_deps
                .into_iter()
                .enumerate()
                .map(|(i, potential)| {
                    let deps: HashSet<usize> = if i == 0 {
                        HashSet::new()
                    } else {
                        potential.into_iter().map(|d| d % i).collect()
                    };
                    planned_task(
                        &format!("task_{i}"),
                        Rule::Report,
                        deps.into_iter().map(file).collect(),
                        vec![file(i)],
                        TaskAction::Shell(format!("touch {}", file(i).display())),
                    )
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn every_run_terminates_with_all_tasks_accounted_for(
        tasks in dag_strategy(10),
        jobs in 1..4usize,
        retries in 0..3u32,
        selection in proptest::collection::vec(0..10usize, 1..5),
        failing in proptest::collection::vec(0..10usize, 0..4),
    ) {
        let graph = DagGraph::from_tasks(&tasks).unwrap();
        let names: Vec<String> = tasks.iter().map(|t| t.name.clone()).collect();

        let targets: Vec<String> = selection
            .iter()
            .filter(|&&i| i < names.len())
            .map(|&i| names[i].clone())
            .collect();
        let selected = graph.select(&targets).unwrap();
        let failing: HashSet<String> = failing
            .iter()
            .filter(|&&i| i < names.len())
            .map(|&i| names[i].clone())
            .collect();

        let mut scheduler = Scheduler::new(graph, tasks, SchedulerOptions { jobs, retries });
        let mut executing: Vec<String> =
            scheduler.start(&selected).into_iter().map(|t| t.name).collect();

        let mut steps = 0;
        let max_steps = 1000;

        while !scheduler.is_idle() && steps < max_steps {
            steps += 1;
            prop_assert!(scheduler.running_count() <= jobs);

            if executing.is_empty() {
                // Stuck: every pending task must be waiting on something.
                for t in scheduler.tasks_in_current_run() {
                    if let Some(TaskRunState::Pending) = scheduler.run_state_of(&t) {
                        let satisfied = scheduler.deps_satisfied(&t).unwrap_or(false);
                        prop_assert!(!satisfied, "{} is pending with deps satisfied", t);
                    }
                }
                prop_assert!(false, "scheduler stalled with nothing running");
            }

            let task = executing.remove(0);
            let outcome = if failing.contains(&task) {
                TaskOutcome::Failed(1)
            } else {
                TaskOutcome::Success
            };
            executing.extend(
                scheduler
                    .handle_completion(&task, outcome)
                    .into_iter()
                    .map(|t| t.name),
            );
        }

        prop_assert!(steps < max_steps, "simulation did not terminate");

        let summary = scheduler.summary();
        prop_assert!(summary.unfinished.is_empty());
        let accounted = summary.succeeded.len()
            + summary.skipped.len()
            + summary.failed.len()
            + summary.blocked.len();
        prop_assert_eq!(accounted, selected.len());

        for name in &summary.failed {
            prop_assert!(failing.contains(name));
            prop_assert_eq!(scheduler.attempts_of(name), Some(retries + 1));
        }
        for name in &summary.succeeded {
            prop_assert!(!failing.contains(name));
        }
    }
}
