// src/pipeline/rules.rs

//! The fixed set of rules the planner instantiates tasks from.

use std::fmt;
use std::str::FromStr;

use crate::types::PeakCaller;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rule {
    Design,
    BigwigDeeptools,
    TagDirectory,
    BigwigHomer,
    PeaksWithInput(PeakCaller),
    PeaksNoInput(PeakCaller),
    ValidatePeaks,
    BedToBigBed,
    PrimaryPeaks(PeakCaller),
    BcftoolsCall,
    BcftoolsFilter,
    Hub,
    Report,
}

impl Rule {
    pub const ALL: [Rule; 19] = [
        Rule::Design,
        Rule::BigwigDeeptools,
        Rule::TagDirectory,
        Rule::BigwigHomer,
        Rule::PeaksWithInput(PeakCaller::Macs),
        Rule::PeaksNoInput(PeakCaller::Macs),
        Rule::PeaksWithInput(PeakCaller::Homer),
        Rule::PeaksNoInput(PeakCaller::Homer),
        Rule::PeaksWithInput(PeakCaller::Lanceotron),
        Rule::PeaksNoInput(PeakCaller::Lanceotron),
        Rule::ValidatePeaks,
        Rule::BedToBigBed,
        Rule::PrimaryPeaks(PeakCaller::Macs),
        Rule::PrimaryPeaks(PeakCaller::Homer),
        Rule::PrimaryPeaks(PeakCaller::Lanceotron),
        Rule::BcftoolsCall,
        Rule::BcftoolsFilter,
        Rule::Hub,
        Rule::Report,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Design => "design",
            Rule::BigwigDeeptools => "bigwig_deeptools",
            Rule::TagDirectory => "tag_directory",
            Rule::BigwigHomer => "bigwig_homer",
            Rule::PeaksWithInput(PeakCaller::Macs) => "macs2_with_input",
            Rule::PeaksNoInput(PeakCaller::Macs) => "macs2_no_input",
            Rule::PeaksWithInput(PeakCaller::Homer) => "homer_with_input",
            Rule::PeaksNoInput(PeakCaller::Homer) => "homer_no_input",
            Rule::PeaksWithInput(PeakCaller::Lanceotron) => "lanceotron_with_input",
            Rule::PeaksNoInput(PeakCaller::Lanceotron) => "lanceotron_no_input",
            Rule::ValidatePeaks => "validate_peaks",
            Rule::BedToBigBed => "bed_to_bigbed",
            Rule::PrimaryPeaks(PeakCaller::Macs) => "primary_peaks_macs",
            Rule::PrimaryPeaks(PeakCaller::Homer) => "primary_peaks_homer",
            Rule::PrimaryPeaks(PeakCaller::Lanceotron) => "primary_peaks_lanceotron",
            Rule::BcftoolsCall => "bcftools_call",
            Rule::BcftoolsFilter => "bcftools_filter",
            Rule::Hub => "hub",
            Rule::Report => "report",
        }
    }

    /// Resolution priority when two tasks claim the same output path.
    ///
    /// Only rules tied to a peak caller ever compete; everything else is 0.
    pub fn priority(&self) -> u8 {
        match self {
            Rule::PeaksWithInput(caller)
            | Rule::PeaksNoInput(caller)
            | Rule::PrimaryPeaks(caller) => caller.priority(),
            _ => 0,
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Rule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Rule::ALL
            .into_iter()
            .find(|rule| rule.name() == s)
            .ok_or_else(|| format!("unknown rule: {s}"))
    }
}
