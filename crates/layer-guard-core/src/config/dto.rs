//! Deserialization types (DTO layer).
//!
//! These types exist solely for serde deserialization of the raw value tree.
//! They are converted to domain model types via the loader. Every field is
//! optional here; defaults are applied during loading.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Raw representation of a configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigurationDto {
    /// Layer definitions, in declaration order.
    #[serde(default)]
    pub layers: Option<Vec<LayerDto>>,

    /// Paths to analyze.
    #[serde(default)]
    pub paths: Option<Vec<String>>,

    /// Glob patterns of files to leave out.
    #[serde(default)]
    pub exclude_files: Option<Vec<String>>,

    /// Layer -> allowed target layers.
    #[serde(default)]
    pub ruleset: Option<BTreeMap<String, Option<Vec<String>>>>,

    /// Source symbol -> target symbols whose violations are waived.
    #[serde(default)]
    pub skip_violations: Option<BTreeMap<String, Option<Vec<String>>>>,

    /// Suppress uncovered edges to known-but-unclassified symbols.
    #[serde(default)]
    pub ignore_uncovered_internal_classes: Option<bool>,
}

/// Raw representation of one layer.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LayerDto {
    /// Layer name.
    #[serde(default)]
    pub name: String,

    /// Collector tables. Kept untyped so each entry is validated on its own.
    #[serde(default)]
    pub collectors: Option<Vec<Value>>,
}
