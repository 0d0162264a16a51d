// tests/integration/plan_chip.rs

use std::collections::HashSet;
use std::path::PathBuf;

use seqdag::dag::DagGraph;
use seqdag::pipeline::hub::hub_params;
use seqdag::pipeline::{Rule, TaskAction, build_plan};
use seqdag::types::{Assay, PeakCaller, PileupMethod};
use seqdag_test_utils::builders::{ConfigFileBuilder, DesignBuilder};
use seqdag_test_utils::init_tracing;

use crate::common::chip_design;

#[test]
fn control_in_design_selects_the_with_input_rule() {
    init_tracing();

    let cfg = ConfigFileBuilder::new("proj", Assay::ChIP)
        .peaks(&[PeakCaller::Macs])
        .build();
    let plan = build_plan(&cfg, &chip_design()).unwrap();

    let with = plan.get("macs2_with_input:rep1_H3K27ac").unwrap();
    assert_eq!(with.rule, Rule::PeaksWithInput(PeakCaller::Macs));
    assert_eq!(
        with.inputs,
        vec![
            PathBuf::from("out/aligned/rep1_H3K27ac.bam"),
            PathBuf::from("out/aligned/rep1_input.bam"),
        ]
    );
    let TaskAction::Shell(cmd) = &with.action else {
        panic!("peak calling should be a shell task");
    };
    assert!(cmd.contains("-c out/aligned/rep1_input.bam"));

    let without = plan.get("macs2_no_input:rep1_CTCF").unwrap();
    assert_eq!(without.inputs, vec![PathBuf::from("out/aligned/rep1_CTCF.bam")]);
    let TaskAction::Shell(cmd) = &without.action else {
        panic!("peak calling should be a shell task");
    };
    assert!(!cmd.contains(" -c "));
}

#[test]
fn user_options_reach_the_command_line() {
    let cfg = ConfigFileBuilder::new("proj", Assay::ChIP)
        .peaks(&[PeakCaller::Macs])
        .option("macs", "callpeak", "-f BAMPE --broad")
        .build();
    let plan = build_plan(&cfg, &chip_design()).unwrap();

    let TaskAction::Shell(cmd) = &plan.get("macs2_no_input:rep1_CTCF").unwrap().action else {
        panic!("peak calling should be a shell task");
    };
    assert!(cmd.contains("-f BAMPE --broad"));
    assert!(cmd.contains("rep1_CTCF_peaks.broadPeak"));
}

#[test]
fn homer_reads_tag_directories_for_treatment_and_control() {
    let cfg = ConfigFileBuilder::new("proj", Assay::ChIP)
        .peaks(&[PeakCaller::Homer])
        .build();
    let plan = build_plan(&cfg, &chip_design()).unwrap();

    let task = plan.get("homer_with_input:rep1_H3K27ac").unwrap();
    assert_eq!(
        task.inputs,
        vec![
            PathBuf::from("out/tag_dirs/rep1_H3K27ac"),
            PathBuf::from("out/tag_dirs/rep1_input"),
        ]
    );
    assert!(plan.get("tag_directory:rep1_input").is_some());
    assert!(plan.get("bigwig_deeptools:rep1_input").is_none());
}

#[test]
fn primary_peaks_follow_caller_priority() {
    let cfg = ConfigFileBuilder::new("proj", Assay::ChIP)
        .peaks(&[PeakCaller::Macs, PeakCaller::Lanceotron, PeakCaller::Homer])
        .build();
    let plan = build_plan(&cfg, &chip_design()).unwrap();

    let primary: Vec<&str> = plan
        .tasks
        .iter()
        .filter(|t| matches!(t.rule, Rule::PrimaryPeaks(_)))
        .map(|t| t.name.as_str())
        .collect();
    assert_eq!(primary.len(), 2);
    assert!(primary.iter().all(|n| n.starts_with("primary_peaks_lanceotron:")));

    let graph = DagGraph::from_tasks(&plan.tasks).unwrap();
    assert_eq!(
        graph.producer_of(&PathBuf::from("out/peaks/rep1_CTCF.bed")),
        Some("primary_peaks_lanceotron:rep1_CTCF")
    );
    assert!(
        graph
            .dependencies_of("primary_peaks_lanceotron:rep1_CTCF")
            .contains(&"validate_peaks".to_string())
    );
}

#[test]
fn validation_waits_for_every_caller() {
    let cfg = ConfigFileBuilder::new("proj", Assay::ChIP)
        .peaks(&PeakCaller::ALL)
        .build();
    let plan = build_plan(&cfg, &chip_design()).unwrap();
    let graph = DagGraph::from_tasks(&plan.tasks).unwrap();

    let deps: HashSet<&str> = graph
        .dependencies_of("validate_peaks")
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(deps.len(), 6);
    assert!(deps.contains("homer_no_input:rep1_CTCF"));
    assert!(deps.contains("lanceotron_with_input:rep1_H3K27ac"));
}

#[test]
fn hub_collects_bigwigs_and_peak_bigbeds() {
    let cfg = ConfigFileBuilder::new("proj", Assay::ChIP)
        .peaks(&[PeakCaller::Macs])
        .bigwigs(&[PileupMethod::Deeptools])
        .chromosome_sizes("hg38.chrom.sizes")
        .hub("someone@example.org")
        .build();
    let plan = build_plan(&cfg, &chip_design()).unwrap();

    let hub = plan.get("hub").unwrap();
    assert!(hub.inputs.contains(&PathBuf::from("out/bigwigs/deeptools/rep1_input.bigWig")));
    assert!(hub.inputs.contains(&PathBuf::from("out/peaks/macs/rep1_CTCF.bigBed")));
    assert!(hub.outputs.contains(&PathBuf::from("out/hub/proj.hub.txt")));
    assert!(hub.outputs.contains(&PathBuf::from("out/hub/hg38/trackDb.txt")));
    assert!(plan.get("bed_to_bigbed:rep1_CTCF_macs").is_some());

    let TaskAction::WriteHub { params, tracks } = &hub.action else {
        panic!("hub should be an in-process action");
    };
    assert_eq!(params.overlay_by, vec!["samplename".to_string()]);
    assert_eq!(tracks.len(), 5);
}

#[test]
fn rna_hub_grouping_ignores_configuration() {
    let cfg = ConfigFileBuilder::new("rna", Assay::RNA)
        .bigwigs(&[PileupMethod::Deeptools])
        .hub("someone@example.org")
        .hub_grouping(&["ip"], &["ip"])
        .build();
    let params = hub_params(&cfg);
    assert_eq!(params.overlay_by, vec!["samplename", "method", "strand"]);
    assert_eq!(params.subgroup_by, vec!["method", "strand"]);

    let chip = ConfigFileBuilder::new("chip", Assay::ChIP)
        .hub("someone@example.org")
        .hub_grouping(&["ip"], &["method"])
        .build();
    let params = hub_params(&chip);
    assert_eq!(params.overlay_by, vec!["ip"]);
    assert_eq!(params.subgroup_by, vec!["method"]);
}

#[test]
fn snp_projects_call_and_filter_variants() {
    let cfg = ConfigFileBuilder::new("snp", Assay::SNP)
        .variants("ref/hg38.fa")
        .build();
    let design = DesignBuilder::new(Assay::SNP).entry("s1", "SNP").build();
    let plan = build_plan(&cfg, &design).unwrap();

    let call = plan.get("bcftools_call:s1_SNP").unwrap();
    assert!(call.inputs.contains(&PathBuf::from("ref/hg38.fa")));
    let filter = plan.get("bcftools_filter:s1_SNP").unwrap();
    assert_eq!(filter.inputs, call.outputs);
}

#[test]
fn report_depends_on_everything_else() {
    let cfg = ConfigFileBuilder::new("proj", Assay::ATAC)
        .bigwigs(&[PileupMethod::Deeptools])
        .report("report.qmd")
        .build();
    let design = DesignBuilder::new(Assay::ATAC).entry("s1", "ATAC").build();
    let plan = build_plan(&cfg, &design).unwrap();
    let graph = DagGraph::from_tasks(&plan.tasks).unwrap();

    assert_eq!(graph.order().last().map(String::as_str), Some("report"));
    let deps: HashSet<&str> = graph
        .dependencies_of("report")
        .iter()
        .map(String::as_str)
        .collect();
    assert_eq!(deps, HashSet::from(["design", "bigwig_deeptools:s1_ATAC"]));
}

#[test]
fn targets_select_upstream_tasks_only() {
    let cfg = ConfigFileBuilder::new("proj", Assay::ChIP)
        .peaks(&[PeakCaller::Macs])
        .build();
    let plan = build_plan(&cfg, &chip_design()).unwrap();
    let graph = DagGraph::from_tasks(&plan.tasks).unwrap();

    let selected = graph
        .select(&["out/peaks/rep1_CTCF.bed".to_string()])
        .unwrap();
    assert!(selected.contains("primary_peaks_macs:rep1_CTCF"));
    assert!(selected.contains("validate_peaks"));
    assert!(selected.contains("macs2_with_input:rep1_H3K27ac"));
    assert!(!selected.contains("design"));
    assert!(!selected.contains("primary_peaks_macs:rep1_H3K27ac"));
}
