// src/pipeline/commands.rs

//! Shell command lines for the external tools.
//!
//! Option strings come from [`ToolOptions`], which only ever holds strings
//! that passed `check_options`.

use std::path::Path;

use crate::pipeline::options::{OptionKey, ToolOptions};
use crate::pipeline::selector::{ControlInput, TaskVariant};
use crate::types::{PeakCaller, Strand};

/// Join non-empty parts with single spaces.
fn join(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// A path as one shell word. Plain paths pass through; anything else is
/// single-quoted.
fn p(path: &Path) -> String {
    let s = path.display().to_string();
    if s.is_empty() {
        "''".to_string()
    } else if s
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || "-_./:+".contains(c))
    {
        s
    } else {
        format!("'{}'", s.replace('\'', "'\"'\"'"))
    }
}

pub fn bam_coverage(
    bam: &Path,
    bigwig: &Path,
    threads: u32,
    strand: Option<Strand>,
    options: &ToolOptions,
) -> String {
    let strand_arg = strand
        .map(|s| format!("--filterRNAstrand {}", s.deeptools_filter()))
        .unwrap_or_default();
    join(&[
        "bamCoverage",
        "-b",
        &p(bam),
        "-o",
        &p(bigwig),
        "-p",
        &threads.to_string(),
        &strand_arg,
        options.get(OptionKey::DeeptoolsBamCoverage),
    ])
}

pub fn make_tag_directory(bam: &Path, tag_dir: &Path, options: &ToolOptions) -> String {
    join(&[
        "makeTagDirectory",
        &p(tag_dir),
        options.get(OptionKey::HomerMakeTagDirectory),
        &p(bam),
    ])
}

/// `makeBigWig.pl` writes `<webdir>/<tagdir name>.ucsc.bigWig`; rename it.
pub fn homer_bigwig(tag_dir: &Path, bigwig: &Path, genome: &str, options: &ToolOptions) -> String {
    let webdir = bigwig
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let tag_name = tag_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let produced = webdir.join(format!("{tag_name}.ucsc.bigWig"));
    let make = join(&[
        "makeBigWig.pl",
        &p(tag_dir),
        genome,
        "-url \"\"",
        "-webdir",
        &p(webdir),
        options.get(OptionKey::HomerMakeBigWig),
    ]);
    format!("{make} && mv {} {}", p(&produced), p(bigwig))
}

/// Peak calling for the selected variant; always ends in a 3-column BED at
/// `bed`.
pub fn call_peaks(variant: &TaskVariant, bed: &Path, options: &ToolOptions) -> String {
    let stem = variant.stem();
    let workdir = bed
        .parent()
        .map(|d| d.join(&stem))
        .unwrap_or_else(|| Path::new(&stem).to_path_buf());
    let workdir_arg = p(&workdir);
    let treatment = p(&variant.treatment);

    match variant.caller {
        PeakCaller::Macs => {
            let opts = options.get(OptionKey::MacsCallpeak);
            let control = match &variant.control {
                ControlInput::WithControl(path) => format!("-c {}", p(path)),
                ControlInput::NoControl => String::new(),
            };
            let suffix = if opts.split_whitespace().any(|t| t == "--broad") {
                "broadPeak"
            } else {
                "narrowPeak"
            };
            let call = join(&[
                "macs2 callpeak",
                "-t",
                &treatment,
                &control,
                "-n",
                &stem,
                "--outdir",
                &workdir_arg,
                opts,
            ]);
            let peaks = workdir.join(format!("{stem}_peaks.{suffix}"));
            format!("{call} && cut -f 1-3 {} > {}", p(&peaks), p(bed))
        }
        PeakCaller::Homer => {
            let control = match &variant.control {
                ControlInput::WithControl(path) => format!("-i {}", p(path)),
                ControlInput::NoControl => String::new(),
            };
            let txt = bed.with_extension("txt");
            let find = join(&[
                "findPeaks",
                &treatment,
                options.get(OptionKey::HomerFindPeaks),
                &control,
                "-o",
                &p(&txt),
            ]);
            format!(
                "{find} && pos2bed.pl {} | grep -v '^#' | cut -f 1-3 > {}",
                p(&txt),
                p(bed)
            )
        }
        PeakCaller::Lanceotron => {
            let call = match &variant.control {
                ControlInput::WithControl(path) => join(&[
                    "lanceotron callPeaksInput",
                    &treatment,
                    "-i",
                    &p(path),
                    "-f",
                    &workdir_arg,
                    "--skipheader",
                    options.get(OptionKey::LanceotronCallpeak),
                ]),
                ControlInput::NoControl => join(&[
                    "lanceotron callPeaks",
                    &treatment,
                    "-f",
                    &workdir_arg,
                    "--skipheader",
                    options.get(OptionKey::LanceotronCallpeak),
                ]),
            };
            let peaks = workdir.join(format!("{stem}_L-tron.bed"));
            format!(
                "mkdir -p {workdir_arg} && {call} && cut -f 1-3 {} > {}",
                p(&peaks),
                p(bed)
            )
        }
    }
}

/// bedToBigBed needs sorted input.
pub fn bed_to_bigbed(bed: &Path, chrom_sizes: &Path, bigbed: &Path) -> String {
    let mut sorted = bed.as_os_str().to_owned();
    sorted.push(".sorted");
    let sorted = p(Path::new(&sorted));
    format!(
        "sort -k1,1 -k2,2n {} > {sorted} && bedToBigBed {sorted} {} {} && rm -f {sorted}",
        p(bed),
        p(chrom_sizes),
        p(bigbed)
    )
}

pub fn bcftools_call(
    bam: &Path,
    fasta: &Path,
    vcf: &Path,
    threads: u32,
    options: &ToolOptions,
) -> String {
    let mpileup = join(&[
        "bcftools mpileup",
        "-f",
        &p(fasta),
        options.get(OptionKey::BcftoolsMpileup),
        &p(bam),
    ]);
    let call = join(&[
        "bcftools call -mv -Oz",
        "--threads",
        &threads.to_string(),
        options.get(OptionKey::BcftoolsCall),
        "-o",
        &p(vcf),
    ]);
    format!("{mpileup} | {call}")
}

pub fn bcftools_filter(vcf: &Path, filtered: &Path, options: &ToolOptions) -> String {
    join(&[
        "bcftools filter",
        options.get(OptionKey::BcftoolsFilter),
        "-Oz",
        "-o",
        &p(filtered),
        &p(vcf),
    ])
}

pub fn quarto_render(template: &Path, reports_dir: &Path) -> String {
    join(&[
        "quarto render",
        &p(template),
        "--to html",
        "--output-dir",
        &p(reports_dir),
    ])
}
