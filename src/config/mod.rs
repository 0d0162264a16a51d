// src/config/mod.rs

//! Configuration loading and validation for seqdag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Resolve per-rule resources (`resources.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate assay/feature combinations and option strings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod resources;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    BigwigSection, ConfigFile, ConfigSection, GenomeSection, HubSection, PeaksSection,
    ProjectSection, RawConfigFile, ReportSection, VariantsSection,
};
pub use resources::{ResourceSpec, ResourceTable, Resources};
