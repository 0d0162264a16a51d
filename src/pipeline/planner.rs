// src/pipeline/planner.rs

//! Expand configuration + design into the concrete task list.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::model::ConfigFile;
use crate::dag::graph::resolve_producers;
use crate::design::Design;
use crate::errors::{Result, SeqdagError};
use crate::pipeline::commands;
use crate::pipeline::hub::{HubFiles, HubTrack, TrackKind, hub_params};
use crate::pipeline::layout::PathLayout;
use crate::pipeline::rules::Rule;
use crate::pipeline::selector::select_variant;
use crate::pipeline::task::{PlannedTask, TaskAction};
use crate::types::{Assay, PeakCaller, PileupMethod, Strand};

/// Every task the configuration and design call for, with output collisions
/// already resolved.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub tasks: Vec<PlannedTask>,
}

impl Plan {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PlannedTask> {
        self.tasks.iter().find(|t| t.name == name)
    }

    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }
}

struct Planner<'a> {
    cfg: &'a ConfigFile,
    design: &'a Design,
    layout: PathLayout,
    tasks: Vec<PlannedTask>,
    names: HashSet<String>,
    tracks: Vec<HubTrack>,
}

/// Build the plan for `cfg` and `design`.
///
/// Every configured peak caller runs for every design entry, writing into
/// its own directory. Each also offers a copy of its peaks at the shared
/// per-sample location; only the highest-priority caller keeps that task
/// (lanceotron, then homer, then macs).
pub fn build_plan(cfg: &ConfigFile, design: &Design) -> Result<Plan> {
    design.ensure_assay(cfg.assay())?;

    let mut planner = Planner {
        cfg,
        design,
        layout: PathLayout::new(&cfg.project.output_dir),
        tasks: Vec::new(),
        names: HashSet::new(),
        tracks: Vec::new(),
    };

    planner.design_table()?;
    planner.coverage()?;
    planner.peaks()?;
    planner.variants()?;
    planner.hub()?;
    planner.report()?;

    let planned = planner.tasks.len();
    let tasks = resolve_producers(planner.tasks)?;
    info!(
        project = %cfg.project.name,
        assay = %cfg.assay(),
        entries = design.len(),
        planned,
        kept = tasks.len(),
        "pipeline planned"
    );

    Ok(Plan { tasks })
}

impl Planner<'_> {
    fn push(
        &mut self,
        rule: Rule,
        stem: Option<&str>,
        inputs: Vec<PathBuf>,
        outputs: Vec<PathBuf>,
        action: TaskAction,
    ) -> Result<()> {
        let name = match stem {
            Some(stem) => format!("{rule}:{stem}"),
            None => rule.to_string(),
        };
        if !self.names.insert(name.clone()) {
            return Err(SeqdagError::ConfigError(format!(
                "task '{name}' would be planned twice"
            )));
        }
        debug!(task = %name, "planned task");
        self.tasks.push(PlannedTask {
            name,
            rule,
            inputs,
            outputs,
            action,
            resources: self.cfg.resources.for_rule(rule),
        });
        Ok(())
    }

    /// Treatment and control stems, each once.
    fn all_stems(&self) -> BTreeSet<String> {
        let mut stems = BTreeSet::new();
        for entry in self.design.entries() {
            stems.insert(entry.stem());
            if let Some(control) = entry.control_stem() {
                stems.insert(control);
            }
        }
        stems
    }

    fn design_table(&mut self) -> Result<()> {
        let path = self.layout.design_csv();
        self.push(
            Rule::Design,
            None,
            Vec::new(),
            vec![path.clone()],
            TaskAction::WriteDesign {
                design: self.design.clone(),
                path,
            },
        )
    }

    /// Pileups, tag directories and bigWigs.
    fn coverage(&mut self) -> Result<()> {
        let cfg = self.cfg;
        let callers = cfg.peak_callers();
        let wants = |method| cfg.bigwigs.create && cfg.bigwigs.method.contains(&method);

        let deeptools = wants(PileupMethod::Deeptools) || callers.contains(&PeakCaller::Lanceotron);
        let homer_bigwigs = wants(PileupMethod::Homer);
        let tag_dirs = homer_bigwigs || callers.contains(&PeakCaller::Homer);

        for stem in self.all_stems() {
            let bam = self.layout.bam(&stem);

            if deeptools {
                self.deeptools_bigwigs(&stem, &bam, wants(PileupMethod::Deeptools))?;
            }

            if tag_dirs {
                let tag_dir = self.layout.tag_dir(&stem);
                let cmd = commands::make_tag_directory(&bam, &tag_dir, &cfg.options);
                self.push(
                    Rule::TagDirectory,
                    Some(stem.as_str()),
                    vec![bam.to_path_buf()],
                    vec![tag_dir],
                    TaskAction::Shell(cmd),
                )?;
            }

            if homer_bigwigs {
                let tag_dir = self.layout.tag_dir(&stem);
                let bigwig = self.layout.bigwig(PileupMethod::Homer, &stem);
                let cmd = commands::homer_bigwig(&tag_dir, &bigwig, &cfg.genome.name, &cfg.options);
                self.track(&stem, &bigwig, PileupMethod::Homer.dir_name(), None);
                self.push(
                    Rule::BigwigHomer,
                    Some(stem.as_str()),
                    vec![tag_dir],
                    vec![bigwig],
                    TaskAction::Shell(cmd),
                )?;
            }
        }
        Ok(())
    }

    /// RNA gets one bigWig per strand; everything else one per stem.
    fn deeptools_bigwigs(&mut self, stem: &str, bam: &Path, show: bool) -> Result<()> {
        let threads = self.cfg.resources.for_rule(Rule::BigwigDeeptools).threads;
        let method = PileupMethod::Deeptools;

        if self.cfg.assay().is_stranded() {
            let mut outputs = Vec::new();
            let mut cmds = Vec::new();
            for strand in Strand::BOTH {
                let bigwig = self.layout.stranded_bigwig(method, stem, strand);
                cmds.push(commands::bam_coverage(
                    bam,
                    &bigwig,
                    threads,
                    Some(strand),
                    &self.cfg.options,
                ));
                if show {
                    self.track(stem, &bigwig, method.dir_name(), Some(strand));
                }
                outputs.push(bigwig);
            }
            return self.push(
                Rule::BigwigDeeptools,
                Some(stem),
                vec![bam.to_path_buf()],
                outputs,
                TaskAction::Shell(cmds.join(" && ")),
            );
        }

        let bigwig = self.layout.bigwig(method, stem);
        let cmd = commands::bam_coverage(bam, &bigwig, threads, None, &self.cfg.options);
        if show {
            self.track(stem, &bigwig, method.dir_name(), None);
        }
        self.push(
            Rule::BigwigDeeptools,
            Some(stem),
            vec![bam.to_path_buf()],
            vec![bigwig],
            TaskAction::Shell(cmd),
        )
    }

    fn peaks(&mut self) -> Result<()> {
        let callers = self.cfg.peak_callers();
        if callers.is_empty() {
            return Ok(());
        }

        let pairs: Vec<(String, String)> = self
            .design
            .entries()
            .iter()
            .map(|e| (e.sample_name.clone(), e.ip.clone()))
            .collect();

        let mut called = Vec::new();
        for (sample, ip) in &pairs {
            for &caller in &callers {
                let variant = select_variant(self.design, &self.layout, sample, ip, caller)?;
                let stem = variant.stem();
                let bed = self.layout.peaks(caller, &stem);
                let cmd = commands::call_peaks(&variant, &bed, &self.cfg.options);
                self.push(
                    variant.rule(),
                    Some(stem.as_str()),
                    variant.inputs(),
                    vec![bed.clone()],
                    TaskAction::Shell(cmd),
                )?;
                called.push((caller, stem, bed));
            }
        }

        let sentinel = self.layout.peaks_validated();
        let files: Vec<PathBuf> = called.iter().map(|(_, _, bed)| bed.clone()).collect();
        self.push(
            Rule::ValidatePeaks,
            None,
            files.clone(),
            vec![sentinel.clone()],
            TaskAction::ValidatePeaks {
                files,
                sentinel: sentinel.clone(),
            },
        )?;

        for (caller, stem, bed) in called {
            let primary = self.layout.primary_peaks(&stem);
            self.push(
                Rule::PrimaryPeaks(caller),
                Some(stem.as_str()),
                vec![bed.clone(), sentinel.clone()],
                vec![primary.clone()],
                TaskAction::CopyFile {
                    from: bed.clone(),
                    to: primary,
                },
            )?;

            if self.cfg.hub.create {
                self.bigbed(caller, &stem, &bed, &sentinel)?;
            }
        }
        Ok(())
    }

    fn bigbed(
        &mut self,
        caller: PeakCaller,
        stem: &str,
        bed: &Path,
        sentinel: &Path,
    ) -> Result<()> {
        let chrom_sizes = self.cfg.genome.chromosome_sizes.clone().ok_or_else(|| {
            SeqdagError::ConfigError(
                "[genome].chromosome_sizes is required to put peaks in a hub".to_string(),
            )
        })?;
        let bigbed = self.layout.peaks_bigbed(caller, stem);
        let task_stem = format!("{stem}_{}", caller.dir_name());
        let cmd = commands::bed_to_bigbed(bed, &chrom_sizes, &bigbed);
        self.tracks.push(HubTrack {
            name: format!("{stem}_{}_peaks", caller.dir_name()),
            source: bigbed.clone(),
            kind: TrackKind::BigBed,
            metadata: self.metadata(stem, caller.dir_name(), None),
        });
        self.push(
            Rule::BedToBigBed,
            Some(task_stem.as_str()),
            vec![bed.to_path_buf(), sentinel.to_path_buf(), chrom_sizes],
            vec![bigbed],
            TaskAction::Shell(cmd),
        )
    }

    fn variants(&mut self) -> Result<()> {
        if !self.cfg.variants.call {
            return Ok(());
        }
        let fasta = self.cfg.genome.fasta.clone().ok_or_else(|| {
            SeqdagError::ConfigError("[genome].fasta is required for variant calling".to_string())
        })?;
        let threads = self.cfg.resources.for_rule(Rule::BcftoolsCall).threads;

        let stems: Vec<String> = self.design.entries().iter().map(|e| e.stem()).collect();
        for stem in stems {
            let bam = self.layout.bam(&stem);
            let raw = self.layout.raw_vcf(&stem);
            let filtered = self.layout.filtered_vcf(&stem);

            let call = commands::bcftools_call(&bam, &fasta, &raw, threads, &self.cfg.options);
            self.push(
                Rule::BcftoolsCall,
                Some(stem.as_str()),
                vec![bam, fasta.clone()],
                vec![raw.clone()],
                TaskAction::Shell(call),
            )?;

            let filter = commands::bcftools_filter(&raw, &filtered, &self.cfg.options);
            self.push(
                Rule::BcftoolsFilter,
                Some(stem.as_str()),
                vec![raw],
                vec![filtered],
                TaskAction::Shell(filter),
            )?;
        }
        Ok(())
    }

    fn hub(&mut self) -> Result<()> {
        if !self.cfg.hub.create {
            return Ok(());
        }
        let params = hub_params(self.cfg);
        let track_dir = params.directory.join(&params.genome);

        let inputs: Vec<PathBuf> = self.tracks.iter().map(|t| t.source.clone()).collect();
        let mut outputs: Vec<PathBuf> = HubFiles::paths(&params).into_iter().collect();
        outputs.extend(self.tracks.iter().map(|t| track_dir.join(t.file_name())));

        let tracks = std::mem::take(&mut self.tracks);
        self.push(
            Rule::Hub,
            None,
            inputs,
            outputs,
            TaskAction::WriteHub { params, tracks },
        )
    }

    /// Rendered last; depends on every other output.
    fn report(&mut self) -> Result<()> {
        let Some(template) = self.cfg.report.template.clone() else {
            return Ok(());
        };
        let reports_dir = self.layout.reports_dir();
        let stem = template
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "report".to_string());
        let html = reports_dir.join(format!("{stem}.html"));

        let mut inputs = vec![template.clone()];
        inputs.extend(self.tasks.iter().flat_map(|t| t.outputs.iter().cloned()));

        let cmd = commands::quarto_render(&template, &reports_dir);
        self.push(Rule::Report, None, inputs, vec![html], TaskAction::Shell(cmd))
    }

    fn track(&mut self, stem: &str, source: &Path, method: &str, strand: Option<Strand>) {
        let name = match strand {
            Some(strand) => format!("{stem}_{method}_{}", strand.suffix()),
            None => format!("{stem}_{method}"),
        };
        self.tracks.push(HubTrack {
            name,
            source: source.to_path_buf(),
            kind: TrackKind::BigWig,
            metadata: self.metadata(stem, method, strand),
        });
    }

    /// Grouping metadata for a hub track.
    fn metadata(&self, stem: &str, method: &str, strand: Option<Strand>) -> BTreeMap<String, String> {
        let (sample, ip) = self
            .design
            .entries()
            .iter()
            .find_map(|e| {
                if e.stem() == stem {
                    Some((e.sample_name.clone(), e.ip.clone()))
                } else {
                    e.control_stem()
                        .filter(|c| c == stem)
                        .map(|_| (e.sample_name.clone(), e.control.clone().unwrap_or_default()))
                }
            })
            .unwrap_or_else(|| (stem.to_string(), String::new()));

        let mut metadata = BTreeMap::from([
            ("samplename".to_string(), sample),
            ("ip".to_string(), ip),
            ("method".to_string(), method.to_string()),
            ("assay".to_string(), self.cfg.assay().to_string()),
        ]);
        if let Some(strand) = strand {
            metadata.insert("strand".to_string(), strand.suffix().to_string());
        } else if self.cfg.assay() == Assay::RNA {
            metadata.insert("strand".to_string(), "unstranded".to_string());
        }
        metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{ProjectSection, RawConfigFile};
    use crate::design::DesignEntry;

    fn chip_config(methods: Vec<PeakCaller>) -> ConfigFile {
        let mut raw = RawConfigFile::new(ProjectSection::new("proj", Assay::ChIP));
        raw.project.output_dir = PathBuf::from("out");
        raw.peaks.call = true;
        raw.peaks.methods = methods;
        ConfigFile::try_from(raw).unwrap()
    }

    fn chip_design() -> Design {
        Design::from_entries(vec![
            DesignEntry::new("rep1", "H3K27ac", Some("input"), Assay::ChIP),
            DesignEntry::new("rep1", "CTCF", None, Assay::ChIP),
        ])
        .unwrap()
    }

    #[test]
    fn every_caller_runs_in_its_own_directory() {
        let plan = build_plan(&chip_config(PeakCaller::ALL.to_vec()), &chip_design()).unwrap();
        for name in [
            "macs2_with_input:rep1_H3K27ac",
            "homer_with_input:rep1_H3K27ac",
            "lanceotron_with_input:rep1_H3K27ac",
            "macs2_no_input:rep1_CTCF",
            "homer_no_input:rep1_CTCF",
            "lanceotron_no_input:rep1_CTCF",
        ] {
            assert!(plan.get(name).is_some(), "missing {name}");
        }
    }

    #[test]
    fn primary_peaks_come_from_the_highest_priority_caller() {
        let plan = build_plan(
            &chip_config(vec![PeakCaller::Macs, PeakCaller::Homer]),
            &chip_design(),
        )
        .unwrap();
        assert!(plan.get("primary_peaks_homer:rep1_CTCF").is_some());
        assert!(plan.get("primary_peaks_macs:rep1_CTCF").is_none());

        let plan = build_plan(&chip_config(PeakCaller::ALL.to_vec()), &chip_design()).unwrap();
        assert!(plan.get("primary_peaks_lanceotron:rep1_CTCF").is_some());
        assert!(plan.get("primary_peaks_homer:rep1_CTCF").is_none());
    }

    #[test]
    fn lanceotron_pulls_in_deeptools_bigwigs_for_controls() {
        let plan = build_plan(&chip_config(vec![PeakCaller::Lanceotron]), &chip_design()).unwrap();
        assert!(plan.get("bigwig_deeptools:rep1_input").is_some());
        assert!(plan.get("bigwig_deeptools:rep1_H3K27ac").is_some());
        assert!(plan.get("tag_directory:rep1_input").is_none());
    }

    #[test]
    fn validation_gates_primary_peaks() {
        let plan = build_plan(&chip_config(vec![PeakCaller::Macs]), &chip_design()).unwrap();
        let validate = plan.get("validate_peaks").unwrap();
        assert_eq!(validate.inputs.len(), 2);
        let primary = plan.get("primary_peaks_macs:rep1_CTCF").unwrap();
        assert!(primary.inputs.contains(&PathBuf::from("out/peaks/.validated")));
        assert_eq!(primary.outputs, vec![PathBuf::from("out/peaks/rep1_CTCF.bed")]);
    }

    #[test]
    fn design_table_is_always_written() {
        let mut raw = RawConfigFile::new(ProjectSection::new("proj", Assay::ATAC));
        raw.project.output_dir = PathBuf::from("out");
        let cfg = ConfigFile::try_from(raw).unwrap();
        let design =
            Design::from_entries(vec![DesignEntry::new("s1", "ATAC", None, Assay::ATAC)]).unwrap();
        let plan = build_plan(&cfg, &design).unwrap();
        assert_eq!(plan.task_names().collect::<Vec<_>>(), vec!["design"]);
        assert_eq!(
            plan.get("design").unwrap().outputs,
            vec![PathBuf::from("out/design.csv")]
        );
    }

    #[test]
    fn mismatched_design_assay_is_rejected() {
        let design =
            Design::from_entries(vec![DesignEntry::new("s1", "ATAC", None, Assay::ATAC)]).unwrap();
        let err = build_plan(&chip_config(vec![PeakCaller::Macs]), &design).unwrap_err();
        assert!(matches!(err, SeqdagError::DesignError(_)));
    }

    #[test]
    fn rna_bigwigs_are_stranded() {
        let mut raw = RawConfigFile::new(ProjectSection::new("rna", Assay::RNA));
        raw.project.output_dir = PathBuf::from("out");
        raw.bigwigs.create = true;
        let cfg = ConfigFile::try_from(raw).unwrap();
        let design =
            Design::from_entries(vec![DesignEntry::new("s1", "RNA", None, Assay::RNA)]).unwrap();
        let plan = build_plan(&cfg, &design).unwrap();
        let task = plan.get("bigwig_deeptools:s1_RNA").unwrap();
        assert_eq!(
            task.outputs,
            vec![
                PathBuf::from("out/bigwigs/deeptools/s1_RNA_plus.bigWig"),
                PathBuf::from("out/bigwigs/deeptools/s1_RNA_minus.bigWig"),
            ]
        );
    }
}
