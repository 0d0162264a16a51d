// src/config/resources.rs

//! Per-rule resource requests and attempt scaling.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::errors::{Result, SeqdagError};
use crate::pipeline::rules::Rule;

/// `[resources.<rule>]` / `[resources.default]` section.
///
/// Every field is optional; unset fields fall back to `[resources.default]`
/// and then to the built-in defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceSpec {
    #[serde(default)]
    pub threads: Option<u32>,
    #[serde(default)]
    pub mem_mb: Option<u64>,
    #[serde(default)]
    pub runtime_min: Option<u64>,
    /// Double memory and runtime on each retry.
    #[serde(default)]
    pub scale_on_retry: Option<bool>,
}

/// Concrete resources for one attempt of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resources {
    pub threads: u32,
    pub mem_mb: u64,
    pub runtime_min: u64,
    pub scale_on_retry: bool,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            threads: 1,
            mem_mb: 2_000,
            runtime_min: 60,
            scale_on_retry: true,
        }
    }
}

impl Resources {
    fn overlay(self, spec: &ResourceSpec) -> Self {
        Self {
            threads: spec.threads.unwrap_or(self.threads),
            mem_mb: spec.mem_mb.unwrap_or(self.mem_mb),
            runtime_min: spec.runtime_min.unwrap_or(self.runtime_min),
            scale_on_retry: spec.scale_on_retry.unwrap_or(self.scale_on_retry),
        }
    }

    /// Resources for a 1-based attempt number.
    ///
    /// With scaling enabled, attempt `n` gets `2^(n-1)` times the base memory
    /// and runtime. Threads never scale.
    pub fn for_attempt(&self, attempt: u32) -> Self {
        if !self.scale_on_retry || attempt <= 1 {
            return *self;
        }
        let factor = 1u64 << (attempt - 1).min(16);
        Self {
            mem_mb: self.mem_mb.saturating_mul(factor),
            runtime_min: self.runtime_min.saturating_mul(factor),
            ..*self
        }
    }
}

/// Resolved resource table: a default plus per-rule overrides.
#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    default: Resources,
    per_rule: BTreeMap<Rule, ResourceSpec>,
}

impl ResourceTable {
    /// Build from the raw `[resources.*]` tables.
    ///
    /// The `default` key is special; every other key must name a rule.
    pub fn from_raw(raw: &BTreeMap<String, ResourceSpec>) -> Result<Self> {
        let default = raw
            .get("default")
            .map(|spec| Resources::default().overlay(spec))
            .unwrap_or_default();

        let mut per_rule = BTreeMap::new();
        for (name, spec) in raw.iter().filter(|(name, _)| name.as_str() != "default") {
            let rule: Rule = name.parse().map_err(|e| {
                SeqdagError::ConfigError(format!("[resources.{name}]: {e}"))
            })?;
            per_rule.insert(rule, spec.clone());
        }

        let table = Self { default, per_rule };
        for rule in Rule::ALL {
            let res = table.for_rule(rule);
            if res.threads == 0 || res.mem_mb == 0 || res.runtime_min == 0 {
                return Err(SeqdagError::ConfigError(format!(
                    "[resources.{rule}]: threads, mem_mb and runtime_min must all be >= 1"
                )));
            }
        }
        Ok(table)
    }

    /// Base (first attempt) resources of `rule`.
    pub fn for_rule(&self, rule: Rule) -> Resources {
        match self.per_rule.get(&rule) {
            Some(spec) => self.default.overlay(spec),
            None => self.default,
        }
    }
}
