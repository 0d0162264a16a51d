// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod design;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod types;

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{DagGraph, Scheduler, SchedulerOptions};
use crate::design::Design;
use crate::engine::{CoreRuntime, Runtime, RuntimeEvent, TaskName};
use crate::errors::SeqdagError;
use crate::exec::RealExecutorBackend;
use crate::fs::RealFileSystem;
use crate::pipeline::planner::{Plan, build_plan};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config and design loading
/// - planning and target selection
/// - scheduler / runtime
/// - executor
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let design_path = match &args.design {
        Some(path) => PathBuf::from(path),
        None => config_root_dir(&config_path).join(&cfg.project.design),
    };
    let design = Design::from_path(&design_path, cfg.assay())?;

    let plan = build_plan(&cfg, &design)?;
    let graph = DagGraph::from_tasks(&plan.tasks)?;
    let selected = graph.select(&args.targets)?;

    if args.dry_run {
        print_dry_run(&cfg, &plan, &graph, &selected);
        return Ok(());
    }

    let jobs = args.jobs.unwrap_or(cfg.config.jobs);
    if jobs == 0 {
        return Err(SeqdagError::ConfigError("--jobs must be at least 1".to_string()).into());
    }
    let options = SchedulerOptions {
        jobs,
        retries: cfg.config.retries,
    };
    let scheduler = Scheduler::new(graph, plan.tasks, options);

    // Runtime event channel.
    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);

    let executor = RealExecutorBackend::new(rt_tx.clone(), Arc::new(RealFileSystem), args.force);

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    info!(
        tasks = selected.len(),
        jobs = options.jobs,
        retries = options.retries,
        force = args.force,
        "starting pipeline run"
    );

    let core = CoreRuntime::new(scheduler);
    let runtime = Runtime::new(core, rt_rx, executor);
    let summary = runtime.run(selected).await?;

    if !summary.unfinished.is_empty() {
        bail!(
            "run interrupted with {} task(s) unfinished",
            summary.unfinished.len()
        );
    }
    if !summary.failed.is_empty() {
        bail!(
            "{} task(s) failed: {}; {} task(s) not run",
            summary.failed.len(),
            summary.failed.join(", "),
            summary.blocked.len()
        );
    }

    info!(
        ran = summary.succeeded.len(),
        up_to_date = summary.skipped.len(),
        "pipeline finished"
    );
    Ok(())
}

/// Directory relative design paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Seqdag.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Seqdag.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Dry-run output: selected tasks in execution order with their files and
/// actions.
fn print_dry_run(cfg: &ConfigFile, plan: &Plan, graph: &DagGraph, selected: &HashSet<TaskName>) {
    println!("seqdag dry-run");
    println!("  project = {}", cfg.project.name);
    println!("  assay = {}", cfg.assay());
    println!("  output_dir = {}", cfg.project.output_dir.display());
    println!("  config.jobs = {}", cfg.config.jobs);
    println!("  config.retries = {}", cfg.config.retries);
    println!();

    println!("tasks ({} of {}):", selected.len(), plan.len());
    for name in graph.tasks().filter(|name| selected.contains(*name)) {
        let Some(task) = plan.get(name) else {
            continue;
        };
        println!("  - {name}");
        println!("      rule: {}", task.rule);
        let deps = graph.dependencies_of(name);
        if !deps.is_empty() {
            println!("      after: {:?}", deps);
        }
        if !task.inputs.is_empty() {
            println!("      inputs: {:?}", task.inputs);
        }
        println!("      outputs: {:?}", task.outputs);
        println!(
            "      resources: threads={} mem_mb={} runtime_min={}",
            task.resources.threads, task.resources.mem_mb, task.resources.runtime_min
        );
        println!("      run: {}", task.action.describe());
    }

    debug!("dry-run complete (no execution)");
}
