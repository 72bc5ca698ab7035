//! Validated configuration model.
//!
//! Everything here is constructed by the loader and immutable afterwards.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use super::dto::ConfigurationDto;
use super::{loader, ConfigurationError};
use crate::ast::symbol_key;
use crate::collector::{CollectorBox, CollectorRegistry};
use crate::types::SkipEntry;

// ────────────────────────────────────────────
// Layers
// ────────────────────────────────────────────

/// A named layer and its compiled collectors.
///
/// A symbol belongs to the layer when any collector is satisfied.
#[derive(Debug)]
pub struct Layer {
    name: String,
    configs: Vec<Value>,
    collectors: Vec<CollectorBox>,
}

impl Layer {
    /// Creates a layer from its raw and compiled collectors.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        configs: Vec<Value>,
        collectors: Vec<CollectorBox>,
    ) -> Self {
        Self {
            name: name.into(),
            configs,
            collectors,
        }
    }

    /// Layer name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Collector tables as configured.
    #[must_use]
    pub fn configs(&self) -> &[Value] {
        &self.configs
    }

    /// Compiled collectors.
    #[must_use]
    pub fn collectors(&self) -> &[CollectorBox] {
        &self.collectors
    }
}

// ────────────────────────────────────────────
// Ruleset
// ────────────────────────────────────────────

/// `skip_violations` entries, matched case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipList {
    entries: BTreeMap<(String, String), SkipEntry>,
}

impl SkipList {
    /// Builds the list from `source -> [target, ...]`.
    #[must_use]
    pub fn new(map: BTreeMap<String, Vec<String>>) -> Self {
        let entries = map
            .into_iter()
            .flat_map(|(source, targets)| {
                targets.into_iter().map(move |target| {
                    (
                        (symbol_key(&source), symbol_key(&target)),
                        SkipEntry {
                            source: source.clone(),
                            target,
                        },
                    )
                })
            })
            .collect();
        Self { entries }
    }

    /// Returns true if violations from `source` to `target` are waived.
    #[must_use]
    pub fn contains(&self, source: &str, target: &str) -> bool {
        self.entries
            .contains_key(&(symbol_key(source), symbol_key(target)))
    }

    /// Looks up the entry for a pair.
    #[must_use]
    pub fn get(&self, source: &str, target: &str) -> Option<&SkipEntry> {
        self.entries.get(&(symbol_key(source), symbol_key(target)))
    }

    /// All entries.
    pub fn entries(&self) -> impl Iterator<Item = &SkipEntry> {
        self.entries.values()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is waived.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Allow-list of layer-to-layer dependencies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ruleset {
    allowed: BTreeMap<String, Vec<String>>,
    ignore_uncovered_internal_classes: bool,
    skip: SkipList,
}

impl Default for Ruleset {
    fn default() -> Self {
        Self::new(BTreeMap::new(), true, SkipList::default())
    }
}

impl Ruleset {
    /// Creates a ruleset.
    #[must_use]
    pub fn new(
        allowed: BTreeMap<String, Vec<String>>,
        ignore_uncovered_internal_classes: bool,
        skip: SkipList,
    ) -> Self {
        Self {
            allowed,
            ignore_uncovered_internal_classes,
            skip,
        }
    }

    /// Layers `layer` may depend on. Empty when the layer has no entry.
    #[must_use]
    pub fn allowed(&self, layer: &str) -> &[String] {
        self.allowed
            .get(layer)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The whole allow-list.
    #[must_use]
    pub fn rules(&self) -> &BTreeMap<String, Vec<String>> {
        &self.allowed
    }

    /// Returns true if `from` may depend on `to`. A layer may always depend
    /// on itself.
    #[must_use]
    pub fn is_allowed(&self, from: &str, to: &str) -> bool {
        from == to || self.allowed(from).iter().any(|layer| layer == to)
    }

    /// Whether uncovered edges to known symbols are suppressed.
    #[must_use]
    pub fn ignore_uncovered_internal_classes(&self) -> bool {
        self.ignore_uncovered_internal_classes
    }

    /// Waived violations.
    #[must_use]
    pub fn skip_violations(&self) -> &SkipList {
        &self.skip
    }
}

// ────────────────────────────────────────────
// Aggregate root
// ────────────────────────────────────────────

/// Validated configuration.
#[derive(Debug, Default)]
pub struct Configuration {
    layers: Vec<Layer>,
    paths: Vec<String>,
    exclude_files: Vec<String>,
    exclude: Vec<glob::Pattern>,
    ruleset: Ruleset,
}

impl Configuration {
    pub(crate) fn new(
        layers: Vec<Layer>,
        paths: Vec<String>,
        exclude_files: Vec<String>,
        exclude: Vec<glob::Pattern>,
        ruleset: Ruleset,
    ) -> Self {
        Self {
            layers,
            paths,
            exclude_files,
            exclude,
            ruleset,
        }
    }

    /// Builds and validates a configuration with the built-in collectors.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Malformed`] if the tree has the wrong
    /// shape, or [`ConfigurationError::Invalid`] with every offense found.
    pub fn from_value(value: &Value) -> Result<Self, ConfigurationError> {
        Self::from_value_with(value, &CollectorRegistry::builtin())
    }

    /// Builds and validates a configuration with a custom collector registry.
    ///
    /// # Errors
    ///
    /// See [`Configuration::from_value`].
    pub fn from_value_with(
        value: &Value,
        registry: &CollectorRegistry,
    ) -> Result<Self, ConfigurationError> {
        let dto = ConfigurationDto::deserialize(value).map_err(ConfigurationError::Malformed)?;
        loader::load(dto, registry)
    }

    /// Layers, in declaration order.
    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Looks up a layer by name.
    #[must_use]
    pub fn layer(&self, name: &str) -> Option<&Layer> {
        self.layers.iter().find(|l| l.name() == name)
    }

    /// Paths to analyze, in declaration order.
    #[must_use]
    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Exclude patterns as configured.
    #[must_use]
    pub fn exclude_files(&self) -> &[String] {
        &self.exclude_files
    }

    /// Returns true if the path matches an exclude pattern.
    #[must_use]
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = path.to_string_lossy().replace('\\', "/");
        self.exclude.iter().any(|pattern| pattern.matches(&path))
    }

    /// The allow-list and its flags.
    #[must_use]
    pub fn ruleset(&self) -> &Ruleset {
        &self.ruleset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_ruleset_entry_allows_only_self() {
        let ruleset = Ruleset::new(
            BTreeMap::from([("Controller".to_owned(), vec!["Service".to_owned()])]),
            true,
            SkipList::default(),
        );
        assert!(ruleset.is_allowed("Controller", "Service"));
        assert!(!ruleset.is_allowed("Controller", "Repository"));
        assert!(ruleset.is_allowed("Repository", "Repository"));
        assert!(ruleset.allowed("Repository").is_empty());
    }

    #[test]
    fn skip_list_ignores_case() {
        let skip = SkipList::new(BTreeMap::from([(
            "App\\Foo".to_owned(),
            vec!["App\\Bar".to_owned(), "App\\Baz".to_owned()],
        )]));
        assert_eq!(skip.len(), 2);
        assert!(skip.contains("\\app\\foo", "APP\\BAR"));
        assert!(!skip.contains("App\\Bar", "App\\Foo"));
    }

    #[test]
    fn default_configuration_ignores_internal_uncovered() {
        let config = Configuration::default();
        assert!(config.ruleset().ignore_uncovered_internal_classes());
        assert!(config.layers().is_empty());
        assert!(!config.is_excluded(Path::new("src/Foo.php")));
    }
}
