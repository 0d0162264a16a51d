// src/pipeline/mod.rs

//! Turning a configuration and a design into concrete tasks.
//!
//! - [`rules`] lists the rules tasks are instantiated from.
//! - [`selector`] picks the with-control or no-control variant of a peak
//!   caller for each design entry.
//! - [`options`] validates user-supplied tool options.
//! - [`commands`] builds the shell command lines.
//! - [`hub`] and [`peaks`] hold the in-process steps.
//! - [`planner`] ties everything into a [`Plan`].

pub mod commands;
pub mod hub;
pub mod layout;
pub mod options;
pub mod peaks;
pub mod planner;
pub mod rules;
pub mod selector;
pub mod task;

pub use layout::PathLayout;
pub use options::{OptionKey, ToolOptions, check_options};
pub use planner::{Plan, build_plan};
pub use rules::Rule;
pub use selector::{ControlInput, TaskVariant, select_variant};
pub use task::{PlannedTask, TaskAction};
