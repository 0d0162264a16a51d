// src/pipeline/selector.rs

//! Design-driven choice between the with-control and no-control variant of
//! each peak caller.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::design::Design;
use crate::errors::Result;
use crate::pipeline::layout::PathLayout;
use crate::pipeline::rules::Rule;
use crate::types::{PeakCaller, PileupMethod};

/// Control input of a peak-calling task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlInput {
    /// Path to the control in the representation the tool expects.
    WithControl(PathBuf),
    NoControl,
}

impl ControlInput {
    pub fn path(&self) -> Option<&Path> {
        match self {
            ControlInput::WithControl(path) => Some(path),
            ControlInput::NoControl => None,
        }
    }
}

/// The selected peak-calling variant for one design entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskVariant {
    pub caller: PeakCaller,
    pub sample: String,
    pub ip: String,
    pub treatment: PathBuf,
    pub control: ControlInput,
}

impl TaskVariant {
    pub fn rule(&self) -> Rule {
        match self.control {
            ControlInput::WithControl(_) => Rule::PeaksWithInput(self.caller),
            ControlInput::NoControl => Rule::PeaksNoInput(self.caller),
        }
    }

    pub fn stem(&self) -> String {
        format!("{}_{}", self.sample, self.ip)
    }

    /// Every file the tool reads.
    pub fn inputs(&self) -> Vec<PathBuf> {
        let mut inputs = vec![self.treatment.clone()];
        if let Some(control) = self.control.path() {
            inputs.push(control.to_path_buf());
        }
        inputs
    }
}

/// Representation a caller reads for `{sample}_{id}`.
fn tool_input(layout: &PathLayout, caller: PeakCaller, stem: &str) -> PathBuf {
    match caller {
        PeakCaller::Macs => layout.bam(stem),
        PeakCaller::Homer => layout.tag_dir(stem),
        PeakCaller::Lanceotron => layout.bigwig(PileupMethod::Deeptools, stem),
    }
}

/// Choose the variant of `caller` for `(sample, ip)`.
///
/// The design entry decides: a control identifier selects the with-control
/// variant and resolves the control in the tool's input representation
/// (BAM, tag directory or bigWig). Without one the control is
/// [`ControlInput::NoControl`].
pub fn select_variant(
    design: &Design,
    layout: &PathLayout,
    sample: &str,
    ip: &str,
    caller: PeakCaller,
) -> Result<TaskVariant> {
    let entry = design.lookup(sample, ip)?;

    let control = match entry.control_stem() {
        Some(stem) => ControlInput::WithControl(tool_input(layout, caller, &stem)),
        None => ControlInput::NoControl,
    };

    let variant = TaskVariant {
        caller,
        sample: entry.sample_name.clone(),
        ip: entry.ip.clone(),
        treatment: tool_input(layout, caller, &entry.stem()),
        control,
    };

    debug!(
        sample,
        ip,
        caller = %caller,
        rule = %variant.rule(),
        "selected peak calling variant"
    );

    Ok(variant)
}
