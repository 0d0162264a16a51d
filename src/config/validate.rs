// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::config::resources::ResourceTable;
use crate::errors::{Result, SeqdagError};
use crate::pipeline::options::ToolOptions;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SeqdagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        let options = ToolOptions::from_raw(&raw.options)?;
        let resources = ResourceTable::from_raw(&raw.resources)?;
        Ok(ConfigFile::new_unchecked(raw, options, resources))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_project(cfg)?;
    validate_assay_features(cfg)?;
    validate_hub(cfg)?;
    validate_global_config(cfg)?;
    Ok(())
}

fn validate_project(cfg: &RawConfigFile) -> Result<()> {
    if cfg.project.name.trim().is_empty() {
        return Err(SeqdagError::ConfigError(
            "[project].name must not be empty".to_string(),
        ));
    }
    if cfg.project.output_dir.as_os_str().is_empty() {
        return Err(SeqdagError::ConfigError(
            "[project].output_dir must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_assay_features(cfg: &RawConfigFile) -> Result<()> {
    let assay = cfg.project.assay;

    if cfg.peaks.call {
        if !assay.supports_peaks() {
            return Err(SeqdagError::ConfigError(format!(
                "[peaks].call is only supported for ChIP and ATAC projects (assay is {assay})"
            )));
        }
        if cfg.peaks.methods.is_empty() {
            return Err(SeqdagError::ConfigError(
                "[peaks].methods must name at least one peak caller".to_string(),
            ));
        }
    }

    if cfg.variants.call {
        if assay != crate::types::Assay::SNP {
            return Err(SeqdagError::ConfigError(format!(
                "[variants].call is only supported for SNP projects (assay is {assay})"
            )));
        }
        if cfg.genome.fasta.is_none() {
            return Err(SeqdagError::ConfigError(
                "[variants].call requires [genome].fasta".to_string(),
            ));
        }
    }

    if cfg.bigwigs.create && !assay.supports_bigwigs() {
        return Err(SeqdagError::ConfigError(format!(
            "[bigwigs].create is not supported for {assay} projects"
        )));
    }

    if cfg.bigwigs.create && cfg.bigwigs.method.is_empty() {
        return Err(SeqdagError::ConfigError(
            "[bigwigs].method must name at least one pileup method".to_string(),
        ));
    }

    Ok(())
}

fn validate_hub(cfg: &RawConfigFile) -> Result<()> {
    if !cfg.hub.create {
        return Ok(());
    }

    match cfg.hub.email.as_deref() {
        Some(email) if email.contains('@') => {}
        Some(email) => {
            return Err(SeqdagError::ConfigError(format!(
                "[hub].email is not an email address: {email}"
            )));
        }
        None => {
            return Err(SeqdagError::ConfigError(
                "[hub].create requires [hub].email".to_string(),
            ));
        }
    }

    if cfg.peaks.call && cfg.genome.chromosome_sizes.is_none() {
        return Err(SeqdagError::ConfigError(
            "hub peak tracks require [genome].chromosome_sizes for bigBed conversion"
                .to_string(),
        ));
    }

    if cfg.hub.color_by.is_empty() {
        return Err(SeqdagError::ConfigError(
            "[hub].color_by must name at least one key".to_string(),
        ));
    }

    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.jobs == 0 {
        return Err(SeqdagError::ConfigError(
            "[config].jobs must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}
