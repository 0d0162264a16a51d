// src/pipeline/task.rs

//! Planned tasks: one instantiation of a rule with concrete paths.

use std::path::PathBuf;

use crate::config::resources::Resources;
use crate::design::Design;
use crate::engine::TaskName;
use crate::pipeline::hub::{HubParams, HubTrack};
use crate::pipeline::rules::Rule;

/// What a task does when it runs.
#[derive(Debug, Clone)]
pub enum TaskAction {
    /// Run through `bash -euo pipefail -c`.
    Shell(String),
    /// Write the design table as CSV.
    WriteDesign { design: Design, path: PathBuf },
    /// Patch empty peak files, then touch `sentinel`.
    ValidatePeaks { files: Vec<PathBuf>, sentinel: PathBuf },
    CopyFile { from: PathBuf, to: PathBuf },
    /// Copy track files into the hub and write its descriptors.
    WriteHub {
        params: HubParams,
        tracks: Vec<HubTrack>,
    },
}

impl TaskAction {
    /// One-line description for dry-run output and logs.
    pub fn describe(&self) -> String {
        match self {
            TaskAction::Shell(cmd) => cmd.clone(),
            TaskAction::WriteDesign { path, .. } => {
                format!("<write design table to {}>", path.display())
            }
            TaskAction::ValidatePeaks { files, .. } => {
                format!("<validate {} peak file(s)>", files.len())
            }
            TaskAction::CopyFile { from, to } => {
                format!("<copy {} to {}>", from.display(), to.display())
            }
            TaskAction::WriteHub { params, tracks } => format!(
                "<write hub '{}' with {} track(s) to {}>",
                params.name,
                tracks.len(),
                params.directory.display()
            ),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlannedTask {
    /// `<rule>` or `<rule>:<sample>_<id>`.
    pub name: TaskName,
    pub rule: Rule,
    pub inputs: Vec<PathBuf>,
    pub outputs: Vec<PathBuf>,
    pub action: TaskAction,
    /// First-attempt resources.
    pub resources: Resources,
}

impl PlannedTask {
    pub fn priority(&self) -> u8 {
        self.rule.priority()
    }
}
