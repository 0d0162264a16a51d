// src/design/mod.rs

//! Sample design table.
//!
//! The design maps `(sample_name, ip)` pairs to an optional control and an
//! assay. It is loaded once from a CSV sheet, never mutated afterwards, and
//! written back out as a provenance artifact next to the pipeline outputs.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::{Result, SeqdagError};
use crate::types::Assay;

lazy_static! {
    /// Identifiers end up in file paths and shell commands.
    static ref IDENTIFIER_RE: Regex =
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9_.-]*$").expect("static regex is valid");
}

/// One row of the design table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DesignEntry {
    pub sample_name: String,
    pub ip: String,
    pub control: Option<String>,
    pub assay: Assay,
}

impl DesignEntry {
    pub fn new(
        sample_name: impl Into<String>,
        ip: impl Into<String>,
        control: Option<&str>,
        assay: Assay,
    ) -> Self {
        Self {
            sample_name: sample_name.into(),
            ip: ip.into(),
            control: control.map(str::to_string),
            assay,
        }
    }

    /// `{sample}_{ip}`, the stem every per-entry output is named after.
    pub fn stem(&self) -> String {
        format!("{}_{}", self.sample_name, self.ip)
    }

    /// `{sample}_{control}` when a control is set.
    pub fn control_stem(&self) -> Option<String> {
        self.control
            .as_ref()
            .map(|control| format!("{}_{}", self.sample_name, control))
    }
}

/// Row as found in the sheet; the assay column is optional.
#[derive(Debug, Deserialize)]
struct DesignRow {
    #[serde(alias = "samplename", alias = "sample")]
    sample_name: String,
    #[serde(alias = "treatment", alias = "antibody")]
    ip: String,
    #[serde(default)]
    control: Option<String>,
    #[serde(default)]
    assay: Option<Assay>,
}

/// Immutable, validated design table.
#[derive(Debug, Clone, Default)]
pub struct Design {
    entries: Vec<DesignEntry>,
    index: HashMap<(String, String), usize>,
}

impl Design {
    /// Build from entries, enforcing identifier syntax and pair uniqueness.
    pub fn from_entries(entries: Vec<DesignEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(SeqdagError::DesignError(
                "design table has no entries".to_string(),
            ));
        }

        let mut index = HashMap::new();
        for (i, entry) in entries.iter().enumerate() {
            validate_identifier("sample_name", &entry.sample_name)?;
            validate_identifier("ip", &entry.ip)?;
            if let Some(control) = &entry.control {
                validate_identifier("control", control)?;
                if control == &entry.ip {
                    return Err(SeqdagError::DesignError(format!(
                        "sample '{}': control '{}' is the same as the ip",
                        entry.sample_name, control
                    )));
                }
            }

            let key = (entry.sample_name.clone(), entry.ip.clone());
            if index.insert(key, i).is_some() {
                return Err(SeqdagError::DesignError(format!(
                    "duplicate design entry for sample '{}' with ip '{}'",
                    entry.sample_name, entry.ip
                )));
            }
        }

        Ok(Self { entries, index })
    }

    /// Parse a CSV sheet. Rows without an assay get `default_assay`.
    pub fn from_reader<R: Read>(reader: R, default_assay: Assay) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut entries = Vec::new();
        for row in rdr.deserialize() {
            let row: DesignRow = row?;
            entries.push(DesignEntry {
                sample_name: row.sample_name,
                ip: row.ip,
                control: row.control.filter(|c| !c.is_empty()),
                assay: row.assay.unwrap_or(default_assay),
            });
        }

        let design = Self::from_entries(entries)?;
        debug!(entries = design.len(), "design table parsed");
        Ok(design)
    }

    pub fn from_path(path: impl AsRef<Path>, default_assay: Assay) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let design = Self::from_reader(file, default_assay)?;
        info!(
            path = %path.display(),
            entries = design.len(),
            "loaded design table"
        );
        Ok(design)
    }

    /// Entry for a `(sample_name, ip)` pair.
    pub fn lookup(&self, sample: &str, ip: &str) -> Result<&DesignEntry> {
        self.index
            .get(&(sample.to_string(), ip.to_string()))
            .map(|&i| &self.entries[i])
            .ok_or_else(|| SeqdagError::MissingDesignEntry {
                sample: sample.to_string(),
                ip: ip.to_string(),
            })
    }

    pub fn entries(&self) -> &[DesignEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry must share `assay`.
    pub fn ensure_assay(&self, assay: Assay) -> Result<()> {
        match self.entries.iter().find(|e| e.assay != assay) {
            Some(entry) => Err(SeqdagError::DesignError(format!(
                "sample '{}' with ip '{}' has assay {} but the project assay is {}",
                entry.sample_name, entry.ip, entry.assay, assay
            ))),
            None => Ok(()),
        }
    }

    /// Serialize as CSV (`sample_name,ip,control,assay`).
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut wtr = csv::Writer::from_writer(writer);
        for entry in &self.entries {
            wtr.serialize(entry)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut buf = Vec::new();
        self.write_csv(&mut buf)?;
        String::from_utf8(buf).map_err(|e| SeqdagError::Other(e.into()))
    }
}

fn validate_identifier(field: &str, value: &str) -> Result<()> {
    if IDENTIFIER_RE.is_match(value) {
        Ok(())
    } else {
        Err(SeqdagError::DesignError(format!(
            "invalid {field} '{value}': use letters, digits, '_', '.' or '-'"
        )))
    }
}
