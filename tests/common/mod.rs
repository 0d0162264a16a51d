// tests/common/mod.rs
#![allow(dead_code)]

use std::path::PathBuf;

use seqdag::config::Resources;
use seqdag::design::Design;
use seqdag::pipeline::{PlannedTask, Rule, TaskAction};
use seqdag::types::Assay;
use seqdag_test_utils::builders::DesignBuilder;

/// A hand-built task with default resources.
pub fn planned_task(
    name: &str,
    rule: Rule,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    action: TaskAction,
) -> PlannedTask {
    PlannedTask {
        name: name.to_string(),
        rule,
        inputs,
        outputs,
        action,
        resources: Resources::default(),
    }
}

/// One sample with a control-backed mark and one without.
pub fn chip_design() -> Design {
    DesignBuilder::new(Assay::ChIP)
        .entry_with_control("rep1", "H3K27ac", "input")
        .entry("rep1", "CTCF")
        .build()
}
