// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::config::resources::{ResourceSpec, ResourceTable};
use crate::pipeline::options::ToolOptions;
use crate::types::{Assay, PeakCaller, PileupMethod};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [project]
/// name = "my_project"
/// assay = "ChIP"
/// design = "design.csv"
///
/// [peaks]
/// call = true
/// methods = ["lanceotron", "macs"]
///
/// [options.macs]
/// callpeak = "-f BAMPE"
/// ```
///
/// Only `[project]` is required. This is the unchecked form; it becomes a
/// [`ConfigFile`] through `TryFrom` (see `config::validate`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub project: ProjectSection,

    #[serde(default)]
    pub genome: GenomeSection,

    #[serde(default)]
    pub peaks: PeaksSection,

    #[serde(default)]
    pub bigwigs: BigwigSection,

    #[serde(default)]
    pub variants: VariantsSection,

    #[serde(default)]
    pub hub: HubSection,

    #[serde(default)]
    pub report: ReportSection,

    /// `[options.<tool>] <command> = "..."`.
    #[serde(default)]
    pub options: BTreeMap<String, BTreeMap<String, String>>,

    /// `[resources.default]` and `[resources.<rule>]`.
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceSpec>,

    #[serde(default)]
    pub config: ConfigSection,
}

impl RawConfigFile {
    /// A config with only the `[project]` section set.
    pub fn new(project: ProjectSection) -> Self {
        Self {
            project,
            genome: GenomeSection::default(),
            peaks: PeaksSection::default(),
            bigwigs: BigwigSection::default(),
            variants: VariantsSection::default(),
            hub: HubSection::default(),
            report: ReportSection::default(),
            options: BTreeMap::new(),
            resources: BTreeMap::new(),
            config: ConfigSection::default(),
        }
    }
}

/// Validated configuration passed explicitly to every planning function.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub project: ProjectSection,
    pub genome: GenomeSection,
    pub peaks: PeaksSection,
    pub bigwigs: BigwigSection,
    pub variants: VariantsSection,
    pub hub: HubSection,
    pub report: ReportSection,
    pub options: ToolOptions,
    pub resources: ResourceTable,
    pub config: ConfigSection,
}

impl ConfigFile {
    /// Assemble a config from already validated parts.
    pub(crate) fn new_unchecked(
        raw: RawConfigFile,
        options: ToolOptions,
        resources: ResourceTable,
    ) -> Self {
        Self {
            project: raw.project,
            genome: raw.genome,
            peaks: raw.peaks,
            bigwigs: raw.bigwigs,
            variants: raw.variants,
            hub: raw.hub,
            report: raw.report,
            options,
            resources,
            config: raw.config,
        }
    }

    pub fn assay(&self) -> Assay {
        self.project.assay
    }

    /// Peak callers that will actually run (empty unless peak calling is on).
    pub fn peak_callers(&self) -> Vec<PeakCaller> {
        if !self.peaks.call {
            return Vec::new();
        }
        let mut callers = self.peaks.methods.clone();
        callers.sort();
        callers.dedup();
        callers
    }
}

/// `[project]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectSection {
    pub name: String,

    pub assay: Assay,

    /// Design sheet; may be overridden with `--design`.
    #[serde(default = "default_design")]
    pub design: PathBuf,

    /// Root for every file the pipeline writes.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_design() -> PathBuf {
    PathBuf::from("design.csv")
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("seqnado_output")
}

impl ProjectSection {
    pub fn new(name: impl Into<String>, assay: Assay) -> Self {
        Self {
            name: name.into(),
            assay,
            design: default_design(),
            output_dir: default_output_dir(),
        }
    }
}

/// `[genome]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GenomeSection {
    /// UCSC build name, e.g. `hg38`.
    #[serde(default = "default_genome_name")]
    pub name: String,

    /// Required for bigBed conversion.
    #[serde(default)]
    pub chromosome_sizes: Option<PathBuf>,

    /// Required for variant calling.
    #[serde(default)]
    pub fasta: Option<PathBuf>,
}

fn default_genome_name() -> String {
    "hg38".to_string()
}

impl Default for GenomeSection {
    fn default() -> Self {
        Self {
            name: default_genome_name(),
            chromosome_sizes: None,
            fasta: None,
        }
    }
}

/// `[peaks]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct PeaksSection {
    #[serde(default)]
    pub call: bool,

    #[serde(default = "default_peak_methods")]
    pub methods: Vec<PeakCaller>,
}

fn default_peak_methods() -> Vec<PeakCaller> {
    vec![PeakCaller::Lanceotron]
}

impl Default for PeaksSection {
    fn default() -> Self {
        Self {
            call: false,
            methods: default_peak_methods(),
        }
    }
}

/// `[bigwigs]` section.
///
/// Deeptools tracks are still built when lanceotron needs them, even with
/// `create = false`.
#[derive(Debug, Clone, Deserialize)]
pub struct BigwigSection {
    #[serde(default)]
    pub create: bool,

    #[serde(default = "default_pileup_methods")]
    pub method: Vec<PileupMethod>,
}

fn default_pileup_methods() -> Vec<PileupMethod> {
    vec![PileupMethod::Deeptools]
}

impl Default for BigwigSection {
    fn default() -> Self {
        Self {
            create: false,
            method: default_pileup_methods(),
        }
    }
}

/// `[variants]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VariantsSection {
    #[serde(default)]
    pub call: bool,
}

/// `[hub]` section (UCSC track hub).
#[derive(Debug, Clone, Deserialize)]
pub struct HubSection {
    #[serde(default)]
    pub create: bool,

    /// Defaults to `[project].name`.
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub short_label: Option<String>,

    #[serde(default)]
    pub long_label: Option<String>,

    /// Required when `create = true`.
    #[serde(default)]
    pub email: Option<String>,

    /// Defaults to `<output_dir>/hub`.
    #[serde(default)]
    pub directory: Option<PathBuf>,

    #[serde(default = "default_color_by")]
    pub color_by: Vec<String>,

    /// Ignored for RNA projects.
    #[serde(default)]
    pub overlay_by: Option<Vec<String>>,

    /// Ignored for RNA projects.
    #[serde(default)]
    pub subgroup_by: Option<Vec<String>>,
}

fn default_color_by() -> Vec<String> {
    vec!["samplename".to_string()]
}

impl Default for HubSection {
    fn default() -> Self {
        Self {
            create: false,
            name: None,
            short_label: None,
            long_label: None,
            email: None,
            directory: None,
            color_by: default_color_by(),
            overlay_by: None,
            subgroup_by: None,
        }
    }
}

/// `[report]` section.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportSection {
    /// Quarto document rendered once everything else is built.
    #[serde(default)]
    pub template: Option<PathBuf>,
}

/// `[config]` section: executor behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Maximum number of concurrently running tasks.
    #[serde(default = "default_jobs")]
    pub jobs: usize,

    /// Extra attempts after a task fails.
    #[serde(default)]
    pub retries: u32,
}

fn default_jobs() -> usize {
    1
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
            retries: 0,
        }
    }
}
