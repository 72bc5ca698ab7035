//! Layer definitions and the dependency ruleset.
//!
//! # Architecture
//!
//! ```text
//! raw value tree (serde_json::Value, from TOML or JSON)
//!   ↓ serde (DTO layer)
//! ConfigurationDto
//!   ↓ validate + compile collectors, aggregating every offense
//! Configuration (immutable domain model)
//! ```
//!
//! # Example
//!
//! ```toml
//! paths = ["src"]
//! exclude_files = ["src/Legacy/**"]
//!
//! [[layers]]
//! name = "Controller"
//! collectors = [{ type = "directory", regex = "^src/Controller/" }]
//!
//! [[layers]]
//! name = "Service"
//! collectors = [{ type = "className", regex = "\\\\Service\\\\" }]
//!
//! [ruleset]
//! Controller = ["Service"]
//! ```

mod dto;
mod loader;
mod model;

pub use dto::{ConfigurationDto, LayerDto};
pub use model::{Configuration, Layer, Ruleset, SkipList};

use crate::collector::CollectorError;

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigOffense {
    /// Layer names declared more than once, sorted.
    #[error(
        "configuration can not contain multiple layers with the same name, got {} as duplicate",
        quoted(.0)
    )]
    DuplicateLayers(Vec<String>),

    /// Ruleset layer names that are not declared, sorted.
    #[error(
        "ruleset can not reference unknown layer names, got {} as unknown",
        quoted(.0)
    )]
    UnknownRulesetLayers(Vec<String>),

    /// `layer` collector targets that are not declared, sorted.
    #[error(
        "layer collectors can not reference unknown layer names, got {} as unknown",
        quoted(.0)
    )]
    UnknownCollectorLayers(Vec<String>),

    /// Layers referencing each other in a loop, starting at the smallest name.
    #[error(
        "layer references form a cycle: {} -> {}",
        .0.join(" -> "),
        .0.first().map_or("", String::as_str)
    )]
    LayerCycle(Vec<String>),

    /// A layer without a name.
    #[error("layers[{index}] has an empty name")]
    EmptyLayerName {
        /// Position in the layer list.
        index: usize,
    },

    /// A collector configuration that does not compile.
    #[error("layer \"{layer}\", collector {index}: {source}")]
    Collector {
        /// Owning layer.
        layer: String,
        /// Position in the layer's collector list.
        index: usize,
        /// What is wrong.
        source: CollectorError,
    },

    /// An `exclude_files` entry that is not a valid glob.
    #[error("invalid exclude pattern `{pattern}`: {reason}")]
    InvalidExcludePattern {
        /// Offending pattern.
        pattern: String,
        /// Glob compiler message.
        reason: String,
    },
}

fn quoted(names: &[String]) -> String {
    names
        .iter()
        .map(|name| format!("\"{name}\""))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors while building a [`Configuration`].
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigurationError {
    /// The raw tree does not have the expected shape.
    #[error("malformed configuration: {0}")]
    #[diagnostic(
        code(layer_guard::config::malformed),
        help("`layers` must be a list of tables and `ruleset` a table of lists")
    )]
    Malformed(#[source] serde_json::Error),

    /// One or more validation offenses.
    #[error("invalid configuration:\n{}", format_offenses(.0))]
    #[diagnostic(
        code(layer_guard::config::invalid),
        help("layer names are case-sensitive and must match the `name` of a declared layer")
    )]
    Invalid(Vec<ConfigOffense>),
}

impl ConfigurationError {
    /// Validation offenses, empty for a malformed tree.
    #[must_use]
    pub fn offenses(&self) -> &[ConfigOffense] {
        match self {
            Self::Malformed(_) => &[],
            Self::Invalid(offenses) => offenses,
        }
    }
}

fn format_offenses(offenses: &[ConfigOffense]) -> String {
    offenses
        .iter()
        .map(|o| format!("  - {o}"))
        .collect::<Vec<_>>()
        .join("\n")
}
