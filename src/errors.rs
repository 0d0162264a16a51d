// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SeqdagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Design error: {0}")]
    DesignError(String),

    #[error("no design entry for sample '{sample}' with ip '{ip}'")]
    MissingDesignEntry { sample: String, ip: String },

    #[error("options for '{key}' contain disallowed flag '{flag}' (managed by the pipeline)")]
    DisallowedOption { key: String, flag: String },

    #[error("Cycle detected in DAG: {0}")]
    DagCycle(String),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SeqdagError>;
