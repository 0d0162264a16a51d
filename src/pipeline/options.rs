// src/pipeline/options.rs

//! Free-form tool option strings and the flags the pipeline reserves.
//!
//! Every option string from `[options.<tool>]` is checked against a denylist
//! before it is interpolated into a command. Denied flags are the ones that
//! control inputs and outputs the pipeline manages itself; letting a user
//! override them would silently break the task graph.

use std::collections::BTreeMap;
use std::fmt;

use lazy_static::lazy_static;
use regex::Regex;

use crate::errors::{Result, SeqdagError};

/// Flags no tool may receive from user configuration.
const GLOBAL_DENYLIST: &[&str] = &["-o", "--output", "--outdir"];

lazy_static! {
    /// Matches a flag token, optionally with an inline `=value`.
    static ref FLAG_RE: Regex =
        Regex::new(r"^(--?[A-Za-z][A-Za-z0-9_-]*)(?:=.*)?$").expect("static regex is valid");
}

/// One configurable option string, identified by tool and sub-command.
///
/// In TOML these are written as `[options.<tool>] <command> = "..."`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    MacsCallpeak,
    HomerMakeTagDirectory,
    HomerFindPeaks,
    HomerMakeBigWig,
    LanceotronCallpeak,
    DeeptoolsBamCoverage,
    BcftoolsMpileup,
    BcftoolsCall,
    BcftoolsFilter,
}

impl OptionKey {
    pub const ALL: [OptionKey; 9] = [
        OptionKey::MacsCallpeak,
        OptionKey::HomerMakeTagDirectory,
        OptionKey::HomerFindPeaks,
        OptionKey::HomerMakeBigWig,
        OptionKey::LanceotronCallpeak,
        OptionKey::DeeptoolsBamCoverage,
        OptionKey::BcftoolsMpileup,
        OptionKey::BcftoolsCall,
        OptionKey::BcftoolsFilter,
    ];

    /// Look up a key from its `[options.<tool>]` table and entry name.
    pub fn parse(tool: &str, command: &str) -> Option<OptionKey> {
        let tool = tool.trim().to_lowercase();
        let command = command.trim().to_lowercase();
        OptionKey::ALL
            .into_iter()
            .find(|key| key.tool() == tool && key.command() == command)
    }

    pub fn tool(&self) -> &'static str {
        match self {
            OptionKey::MacsCallpeak => "macs",
            OptionKey::HomerMakeTagDirectory
            | OptionKey::HomerFindPeaks
            | OptionKey::HomerMakeBigWig => "homer",
            OptionKey::LanceotronCallpeak => "lanceotron",
            OptionKey::DeeptoolsBamCoverage => "deeptools",
            OptionKey::BcftoolsMpileup | OptionKey::BcftoolsCall | OptionKey::BcftoolsFilter => {
                "bcftools"
            }
        }
    }

    pub fn command(&self) -> &'static str {
        match self {
            OptionKey::MacsCallpeak => "callpeak",
            OptionKey::HomerMakeTagDirectory => "maketagdirectory",
            OptionKey::HomerFindPeaks => "findpeaks",
            OptionKey::HomerMakeBigWig => "makebigwig",
            OptionKey::LanceotronCallpeak => "callpeak",
            OptionKey::DeeptoolsBamCoverage => "bamcoverage",
            OptionKey::BcftoolsMpileup => "mpileup",
            OptionKey::BcftoolsCall => "call",
            OptionKey::BcftoolsFilter => "filter",
        }
    }

    /// Tool-specific flags on top of [`GLOBAL_DENYLIST`].
    fn denied_flags(&self) -> &'static [&'static str] {
        match self {
            OptionKey::MacsCallpeak => &[
                "-t",
                "--treatment",
                "-c",
                "--control",
                "-n",
                "--name",
            ],
            OptionKey::HomerMakeTagDirectory => &[],
            OptionKey::HomerFindPeaks => &["-i"],
            OptionKey::HomerMakeBigWig => &["-webdir", "-url"],
            OptionKey::LanceotronCallpeak => &["-f", "--folder", "-i", "--input"],
            OptionKey::DeeptoolsBamCoverage => &[
                "-b",
                "--bam",
                "--outFileName",
                "--filterRNAstrand",
                "-p",
                "--numberOfProcessors",
            ],
            OptionKey::BcftoolsMpileup => &["-f", "--fasta-ref"],
            OptionKey::BcftoolsCall => &["-O", "--output-type"],
            OptionKey::BcftoolsFilter => &["-O", "--output-type"],
        }
    }

    /// HOMER's scripts compare flags literally. Everything else parses with
    /// argparse or `getopt_long`, which take `-nNAME` for `-n NAME` and any
    /// unambiguous prefix of a long flag.
    fn abbreviates(&self) -> bool {
        !matches!(
            self,
            OptionKey::HomerMakeTagDirectory
                | OptionKey::HomerFindPeaks
                | OptionKey::HomerMakeBigWig
        )
    }

    /// Single-dash flags with more than one letter that the tool defines
    /// itself, so `-bs` is not read as `-b s`.
    fn own_short_flags(&self) -> &'static [&'static str] {
        match self {
            OptionKey::DeeptoolsBamCoverage => &["-bs", "-bl", "-of"],
            _ => &[],
        }
    }

    fn is_denied(&self, flag: &str) -> bool {
        let mut denied = GLOBAL_DENYLIST.iter().chain(self.denied_flags());
        if !self.abbreviates() {
            return denied.any(|d| *d == flag);
        }
        if self.own_short_flags().contains(&flag) {
            return false;
        }
        denied.any(|d| reaches(d, flag))
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.tool(), self.command())
    }
}

/// Whether a tool that abbreviates would read `flag` as `reserved`: either
/// verbatim, as a short flag with its value attached, or as a prefix of a
/// long flag.
fn reaches(reserved: &str, flag: &str) -> bool {
    if flag == reserved {
        return true;
    }
    match (reserved.starts_with("--"), flag.starts_with("--")) {
        (true, true) => reserved.starts_with(flag),
        (false, false) => flag.starts_with(reserved),
        _ => false,
    }
}

/// Validate an option string destined for `key`.
///
/// Returns the string unchanged when it carries no reserved flag, so the
/// result can be interpolated straight into a shell command. Reserved flags
/// are also caught in the spellings the tool's own parser accepts (`-nNAME`,
/// `--treat`), while flags the tool defines itself stay usable: `-bs 1` is
/// fine for `bamCoverage` even though `-b` is reserved.
pub fn check_options(key: OptionKey, options: &str) -> Result<String> {
    for token in options.split_whitespace() {
        let Some(caps) = FLAG_RE.captures(token) else {
            continue;
        };
        let flag = &caps[1];
        if key.is_denied(flag) {
            return Err(SeqdagError::DisallowedOption {
                key: key.to_string(),
                flag: flag.to_string(),
            });
        }
    }
    Ok(options.to_string())
}

/// Validated option strings, keyed by tool command.
#[derive(Debug, Clone, Default)]
pub struct ToolOptions {
    values: BTreeMap<OptionKey, String>,
}

impl ToolOptions {
    /// Build from the raw `[options.<tool>]` tables, rejecting unknown keys
    /// and reserved flags.
    pub fn from_raw(raw: &BTreeMap<String, BTreeMap<String, String>>) -> Result<Self> {
        let mut values = BTreeMap::new();
        for (tool, commands) in raw {
            for (command, value) in commands {
                let key = OptionKey::parse(tool, command).ok_or_else(|| {
                    SeqdagError::ConfigError(format!(
                        "unknown option key '[options.{tool}] {command}'"
                    ))
                })?;
                let value = check_options(key, value)?;
                values.insert(key, value.trim().to_string());
            }
        }
        Ok(Self { values })
    }

    /// Option string for `key`, empty when not configured.
    pub fn get(&self, key: OptionKey) -> &str {
        self.values.get(&key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: OptionKey, value: impl Into<String>) -> Result<()> {
        let value = check_options(key, &value.into())?;
        self.values.insert(key, value);
        Ok(())
    }
}
