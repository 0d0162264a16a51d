use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

/// Sequencing assay of a project or a design entry.
///
/// Input is matched case-insensitively (`chip`, `ChIP`, `CHIP` are all
/// accepted); output always uses the canonical spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(try_from = "String")]
pub enum Assay {
    ChIP,
    ATAC,
    RNA,
    SNP,
}

impl Assay {
    pub fn as_str(&self) -> &'static str {
        match self {
            Assay::ChIP => "ChIP",
            Assay::ATAC => "ATAC",
            Assay::RNA => "RNA",
            Assay::SNP => "SNP",
        }
    }

    /// Whether peak calling makes sense for this assay.
    pub fn supports_peaks(&self) -> bool {
        matches!(self, Assay::ChIP | Assay::ATAC)
    }

    /// Whether coverage tracks are produced for this assay.
    pub fn supports_bigwigs(&self) -> bool {
        !matches!(self, Assay::SNP)
    }

    /// RNA coverage is split by strand.
    pub fn is_stranded(&self) -> bool {
        matches!(self, Assay::RNA)
    }
}

impl fmt::Display for Assay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Assay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chip" | "chip-seq" => Ok(Assay::ChIP),
            "atac" | "atac-seq" => Ok(Assay::ATAC),
            "rna" | "rna-seq" => Ok(Assay::RNA),
            "snp" => Ok(Assay::SNP),
            other => Err(format!(
                "invalid assay: {other} (expected one of ChIP, ATAC, RNA, SNP)"
            )),
        }
    }
}

impl TryFrom<String> for Assay {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl Serialize for Assay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Peak calling tools the pipeline can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeakCaller {
    #[serde(alias = "macs2")]
    Macs,
    Homer,
    Lanceotron,
}

impl PeakCaller {
    pub const ALL: [PeakCaller; 3] = [PeakCaller::Lanceotron, PeakCaller::Homer, PeakCaller::Macs];

    /// Rule priority when several callers could produce the same output.
    /// Higher wins: lanceotron > homer > macs2.
    pub fn priority(&self) -> u8 {
        match self {
            PeakCaller::Lanceotron => 3,
            PeakCaller::Homer => 2,
            PeakCaller::Macs => 1,
        }
    }

    /// Directory name under `peaks/`.
    pub fn dir_name(&self) -> &'static str {
        match self {
            PeakCaller::Macs => "macs",
            PeakCaller::Homer => "homer",
            PeakCaller::Lanceotron => "lanceotron",
        }
    }
}

impl fmt::Display for PeakCaller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for PeakCaller {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "macs" | "macs2" => Ok(PeakCaller::Macs),
            "homer" => Ok(PeakCaller::Homer),
            "lanceotron" => Ok(PeakCaller::Lanceotron),
            other => Err(format!(
                "invalid peak caller: {other} (expected \"macs\", \"homer\" or \"lanceotron\")"
            )),
        }
    }
}

/// Tool used to build coverage tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PileupMethod {
    Deeptools,
    Homer,
}

impl PileupMethod {
    pub fn dir_name(&self) -> &'static str {
        match self {
            PileupMethod::Deeptools => "deeptools",
            PileupMethod::Homer => "homer",
        }
    }
}

impl fmt::Display for PileupMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Strand of a stranded (RNA) coverage track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strand {
    Plus,
    Minus,
}

impl Strand {
    pub const BOTH: [Strand; 2] = [Strand::Plus, Strand::Minus];

    pub fn suffix(&self) -> &'static str {
        match self {
            Strand::Plus => "plus",
            Strand::Minus => "minus",
        }
    }

    /// Value passed to `bamCoverage --filterRNAstrand`.
    pub fn deeptools_filter(&self) -> &'static str {
        match self {
            Strand::Plus => "forward",
            Strand::Minus => "reverse",
        }
    }
}
