// src/pipeline/layout.rs

//! Where every pipeline file lives, relative to the output directory.

use std::path::{Path, PathBuf};

use crate::types::{PeakCaller, PileupMethod, Strand};

#[derive(Debug, Clone)]
pub struct PathLayout {
    root: PathBuf,
}

impl PathLayout {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: output_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Aligned, filtered reads for `{sample}_{id}`; produced upstream.
    pub fn bam(&self, stem: &str) -> PathBuf {
        self.root.join("aligned").join(format!("{stem}.bam"))
    }

    pub fn tag_dir(&self, stem: &str) -> PathBuf {
        self.root.join("tag_dirs").join(stem)
    }

    pub fn bigwig(&self, method: PileupMethod, stem: &str) -> PathBuf {
        self.root
            .join("bigwigs")
            .join(method.dir_name())
            .join(format!("{stem}.bigWig"))
    }

    pub fn stranded_bigwig(&self, method: PileupMethod, stem: &str, strand: Strand) -> PathBuf {
        self.root
            .join("bigwigs")
            .join(method.dir_name())
            .join(format!("{stem}_{}.bigWig", strand.suffix()))
    }

    pub fn peak_dir(&self, caller: PeakCaller) -> PathBuf {
        self.root.join("peaks").join(caller.dir_name())
    }

    pub fn peaks(&self, caller: PeakCaller, stem: &str) -> PathBuf {
        self.peak_dir(caller).join(format!("{stem}.bed"))
    }

    pub fn peaks_bigbed(&self, caller: PeakCaller, stem: &str) -> PathBuf {
        self.peak_dir(caller).join(format!("{stem}.bigBed"))
    }

    /// Method-independent peak set, copied from the highest-priority caller.
    pub fn primary_peaks(&self, stem: &str) -> PathBuf {
        self.root.join("peaks").join(format!("{stem}.bed"))
    }

    /// Sentinel touched once every peak file has been validated.
    pub fn peaks_validated(&self) -> PathBuf {
        self.root.join("peaks").join(".validated")
    }

    pub fn raw_vcf(&self, stem: &str) -> PathBuf {
        self.root.join("variant").join(format!("{stem}.vcf.gz"))
    }

    pub fn filtered_vcf(&self, stem: &str) -> PathBuf {
        self.root
            .join("variant")
            .join(format!("{stem}.filtered.vcf.gz"))
    }

    pub fn design_csv(&self) -> PathBuf {
        self.root.join("design.csv")
    }

    pub fn default_hub_dir(&self) -> PathBuf {
        self.root.join("hub")
    }

    pub fn reports_dir(&self) -> PathBuf {
        self.root.join("reports")
    }
}
