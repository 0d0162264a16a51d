#![allow(dead_code)]

use std::path::PathBuf;

use seqdag::config::{ConfigFile, ProjectSection, RawConfigFile, ResourceSpec};
use seqdag::design::{Design, DesignEntry};
use seqdag::types::{Assay, PeakCaller, PileupMethod};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(name: &str, assay: Assay) -> Self {
        let mut config = RawConfigFile::new(ProjectSection::new(name, assay));
        config.project.output_dir = PathBuf::from("out");
        Self { config }
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.project.output_dir = dir.into();
        self
    }

    pub fn peaks(mut self, methods: &[PeakCaller]) -> Self {
        self.config.peaks.call = true;
        self.config.peaks.methods = methods.to_vec();
        self
    }

    pub fn bigwigs(mut self, methods: &[PileupMethod]) -> Self {
        self.config.bigwigs.create = true;
        self.config.bigwigs.method = methods.to_vec();
        self
    }

    pub fn variants(mut self, fasta: &str) -> Self {
        self.config.variants.call = true;
        self.config.genome.fasta = Some(PathBuf::from(fasta));
        self
    }

    pub fn chromosome_sizes(mut self, path: &str) -> Self {
        self.config.genome.chromosome_sizes = Some(PathBuf::from(path));
        self
    }

    pub fn hub(mut self, email: &str) -> Self {
        self.config.hub.create = true;
        self.config.hub.email = Some(email.to_string());
        self
    }

    pub fn hub_grouping(mut self, overlay_by: &[&str], subgroup_by: &[&str]) -> Self {
        self.config.hub.overlay_by = Some(overlay_by.iter().map(|s| s.to_string()).collect());
        self.config.hub.subgroup_by = Some(subgroup_by.iter().map(|s| s.to_string()).collect());
        self
    }

    pub fn report(mut self, template: &str) -> Self {
        self.config.report.template = Some(PathBuf::from(template));
        self
    }

    /// `[options.<tool>] <command> = value`.
    pub fn option(mut self, tool: &str, command: &str, value: &str) -> Self {
        self.config
            .options
            .entry(tool.to_string())
            .or_default()
            .insert(command.to_string(), value.to_string());
        self
    }

    pub fn resources(mut self, rule: &str, spec: ResourceSpec) -> Self {
        self.config.resources.insert(rule.to_string(), spec);
        self
    }

    pub fn jobs(mut self, jobs: usize) -> Self {
        self.config.config.jobs = jobs;
        self
    }

    pub fn retries(mut self, retries: u32) -> Self {
        self.config.config.retries = retries;
        self
    }

    /// The unchecked config, for tests of validation itself.
    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Builder for a `Design` where every entry shares one assay.
pub struct DesignBuilder {
    assay: Assay,
    entries: Vec<DesignEntry>,
}

impl DesignBuilder {
    pub fn new(assay: Assay) -> Self {
        Self {
            assay,
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, sample: &str, ip: &str) -> Self {
        self.entries
            .push(DesignEntry::new(sample, ip, None, self.assay));
        self
    }

    pub fn entry_with_control(mut self, sample: &str, ip: &str, control: &str) -> Self {
        self.entries
            .push(DesignEntry::new(sample, ip, Some(control), self.assay));
        self
    }

    pub fn build(self) -> Design {
        Design::from_entries(self.entries).expect("Failed to build valid design from builder")
    }
}
