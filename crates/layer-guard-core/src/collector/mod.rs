//! Layer-membership predicates.
//!
//! A layer is defined by a list of collector configurations. Each entry is a
//! table with a `type` tag plus kind-specific parameters:
//!
//! ```toml
//! [[layers]]
//! name = "Controller"
//! collectors = [
//!     { type = "directory", regex = "^src/Controller/" },
//!     { type = "and", collectors = [
//!         { type = "className", regex = "Controller$" },
//!         { type = "not", collector = { type = "kind", value = "interface" } },
//!     ] },
//! ]
//! ```
//!
//! Configurations are compiled eagerly through the [`CollectorRegistry`], so
//! a bad parameter surfaces as a [`CollectorError`] before any symbol is
//! evaluated.

mod composite;
mod pattern;
mod structure;

use std::cell::RefCell;
use std::collections::BTreeMap;

use regex::{Regex, RegexBuilder};
use serde_json::{Map, Value};

use crate::ast::{AstMap, Symbol};
use crate::config::Layer;

pub use composite::{AndCollector, LayerCollector, NotCollector, OneOfCollector, OrCollector};
pub use pattern::{ClassNameCollector, DirectoryCollector, MethodCollector};
pub use structure::{DirectEdgeCollector, InheritsCollector, KindCollector};

/// A compiled layer-membership predicate.
pub trait Collector: Send + Sync + std::fmt::Debug {
    /// The `type` tag this collector was built from.
    fn kind(&self) -> &'static str;

    /// Returns true if the symbol satisfies this predicate.
    fn satisfy(&self, symbol: &Symbol, ctx: &CollectContext<'_>) -> bool;

    /// Layers referenced by this collector or its children.
    fn layer_references(&self) -> Vec<&str> {
        Vec::new()
    }
}

/// A boxed collector for dynamic dispatch.
pub type CollectorBox = Box<dyn Collector>;

/// Read-only inputs available to collectors during evaluation.
#[derive(Debug)]
pub struct CollectContext<'a> {
    ast_map: &'a AstMap,
    layers: &'a [Layer],
    active: RefCell<Vec<&'a str>>,
}

impl<'a> CollectContext<'a> {
    /// Creates an evaluation context.
    #[must_use]
    pub fn new(ast_map: &'a AstMap, layers: &'a [Layer]) -> Self {
        Self {
            ast_map,
            layers,
            active: RefCell::new(Vec::new()),
        }
    }

    /// The symbol index.
    #[must_use]
    pub fn ast_map(&self) -> &'a AstMap {
        self.ast_map
    }

    /// Returns true if the symbol satisfies any collector of the named layer.
    ///
    /// Unknown layers are never satisfied.
    ///
    /// # Panics
    ///
    /// Panics if the layer is already being evaluated for this symbol. A
    /// validated configuration has no layer-reference cycles, so this only
    /// fires on an internal invariant violation.
    #[must_use]
    pub fn satisfies_layer(&self, symbol: &Symbol, name: &str) -> bool {
        let Some(layer) = self.layers.iter().find(|l| l.name() == name) else {
            return false;
        };
        {
            let mut active = self.active.borrow_mut();
            assert!(
                !active.contains(&layer.name()),
                "layer `{}` re-entered while evaluating `{}`: layer references must be acyclic",
                layer.name(),
                symbol.name(),
            );
            active.push(layer.name());
        }
        let satisfied = layer.collectors().iter().any(|c| c.satisfy(symbol, self));
        self.active.borrow_mut().pop();
        satisfied
    }
}

/// Errors while compiling a collector configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CollectorError {
    /// The `type` key is absent.
    #[error("collector needs a type")]
    MissingType,

    /// No factory is registered for the tag.
    #[error("unknown collector type `{0}`")]
    UnknownType(String),

    /// The configuration is not a table.
    #[error("collector must be a table, got {0}")]
    NotATable(&'static str),

    /// A required parameter is absent.
    #[error("`{kind}` collector needs the `{key}` parameter")]
    MissingParameter {
        /// Collector tag.
        kind: String,
        /// Parameter name.
        key: &'static str,
    },

    /// A parameter has the wrong shape.
    #[error("`{kind}` collector parameter `{key}` must be {expected}")]
    InvalidParameter {
        /// Collector tag.
        kind: String,
        /// Parameter name.
        key: &'static str,
        /// What was expected.
        expected: &'static str,
    },

    /// A regex parameter does not compile.
    #[error("`{kind}` collector has an invalid regex `{pattern}`: {reason}")]
    InvalidRegex {
        /// Collector tag.
        kind: String,
        /// Offending pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A nested configuration failed.
    #[error("`{kind}` collector, child {index}: {source}")]
    Nested {
        /// Parent collector tag.
        kind: String,
        /// Position of the child.
        index: usize,
        /// Child error.
        source: Box<CollectorError>,
    },
}

/// Parameter accessors for collector factories.
#[derive(Debug, Clone, Copy)]
pub struct CollectorArgs<'a> {
    kind: &'a str,
    map: &'a Map<String, Value>,
}

impl<'a> CollectorArgs<'a> {
    /// Wraps a configuration table.
    #[must_use]
    pub fn new(kind: &'a str, map: &'a Map<String, Value>) -> Self {
        Self { kind, map }
    }

    /// The `type` tag.
    #[must_use]
    pub fn kind(&self) -> &'a str {
        self.kind
    }

    /// Returns a present, non-null parameter.
    ///
    /// # Errors
    ///
    /// Returns [`CollectorError::MissingParameter`] if it is absent or null.
    pub fn required_value(&self, key: &'static str) -> Result<&'a Value, CollectorError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Err(CollectorError::MissingParameter {
                kind: self.kind.to_owned(),
                key,
            }),
            Some(value) => Ok(value),
        }
    }

    /// Returns a string parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is absent or not a string.
    pub fn required_str(&self, key: &'static str) -> Result<&'a str, CollectorError> {
        self.required_value(key)?
            .as_str()
            .ok_or_else(|| self.invalid(key, "a string"))
    }

    /// Compiles a string parameter as a case-insensitive regex.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is absent, not a string, or not a
    /// valid regex.
    pub fn required_regex(&self, key: &'static str) -> Result<Regex, CollectorError> {
        let pattern = self.required_str(key)?;
        RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| CollectorError::InvalidRegex {
                kind: self.kind.to_owned(),
                pattern: pattern.to_owned(),
                reason: e.to_string(),
            })
    }

    /// Returns a table parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is absent or not a table.
    pub fn required_object(
        &self,
        key: &'static str,
    ) -> Result<&'a Map<String, Value>, CollectorError> {
        self.required_value(key)?
            .as_object()
            .ok_or_else(|| self.invalid(key, "a table"))
    }

    /// Returns a list parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the parameter is absent or not a list.
    pub fn required_list(&self, key: &'static str) -> Result<&'a [Value], CollectorError> {
        self.required_value(key)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.invalid(key, "a list"))
    }

    fn invalid(&self, key: &'static str, expected: &'static str) -> CollectorError {
        CollectorError::InvalidParameter {
            kind: self.kind.to_owned(),
            key,
            expected,
        }
    }
}

/// Builds a collector from its arguments. Nested configurations are built
/// through the registry passed in.
pub type CollectorFactory =
    fn(&CollectorArgs<'_>, &CollectorRegistry) -> Result<CollectorBox, Vec<CollectorError>>;

/// Kind-keyed table of collector factories.
#[derive(Debug, Clone)]
pub struct CollectorRegistry {
    factories: BTreeMap<&'static str, (CollectorFactory, &'static str)>,
}

impl Default for CollectorRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl CollectorRegistry {
    /// Creates a registry without any collector kind.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Creates a registry with every built-in collector kind.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(
            "className",
            ClassNameCollector::build,
            "regex search on the fully-qualified class name (`regex`)",
        );
        registry.register(
            "directory",
            DirectoryCollector::build,
            "regex search on the declaring file path (`regex`)",
        );
        registry.register(
            "method",
            MethodCollector::build,
            "regex search on declared method names (`name`)",
        );
        registry.register(
            "and",
            AndCollector::build,
            "all nested collectors match (`collectors`)",
        );
        registry.register(
            "or",
            OrCollector::build,
            "any nested collector matches (`collectors`)",
        );
        registry.register(
            "not",
            NotCollector::build,
            "the nested collector does not match (`collector`)",
        );
        registry.register(
            "one-of",
            OneOfCollector::build,
            "exactly one nested collector matches (`collectors`)",
        );
        registry.register(
            "layer",
            LayerCollector::build,
            "the symbol belongs to another layer (`layer`)",
        );
        registry.register(
            "kind",
            KindCollector::build,
            "class, interface, trait or enum (`value`)",
        );
        registry.register(
            "extends",
            DirectEdgeCollector::build_extends,
            "directly extends the given class (`value`)",
        );
        registry.register(
            "implements",
            DirectEdgeCollector::build_implements,
            "directly implements the given interface (`value`)",
        );
        registry.register(
            "inherits",
            InheritsCollector::build,
            "extends, implements or uses the given symbol, transitively (`value`)",
        );
        registry
    }

    /// Registers a collector kind, replacing any factory with the same tag.
    pub fn register(
        &mut self,
        kind: &'static str,
        factory: CollectorFactory,
        description: &'static str,
    ) {
        self.factories.insert(kind, (factory, description));
    }

    /// Returns true if the tag is registered.
    #[must_use]
    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    /// Registered tags with their descriptions, sorted by tag.
    pub fn kinds(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        self.factories
            .iter()
            .map(|(kind, (_, description))| (*kind, *description))
    }

    /// Compiles one configuration table.
    ///
    /// # Errors
    ///
    /// Returns every problem found in the table and its children.
    pub fn build(&self, map: &Map<String, Value>) -> Result<CollectorBox, Vec<CollectorError>> {
        let kind = match map.get("type") {
            None | Some(Value::Null) => return Err(vec![CollectorError::MissingType]),
            Some(Value::String(kind)) => kind,
            Some(_) => {
                return Err(vec![CollectorError::InvalidParameter {
                    kind: "collector".to_owned(),
                    key: "type",
                    expected: "a string",
                }])
            }
        };
        let Some((factory, _)) = self.factories.get(kind.as_str()) else {
            return Err(vec![CollectorError::UnknownType(kind.clone())]);
        };
        factory(&CollectorArgs::new(kind, map), self)
    }

    /// Compiles one configuration value, which must be a table.
    ///
    /// # Errors
    ///
    /// Returns every problem found in the value and its children.
    pub fn build_value(&self, value: &Value) -> Result<CollectorBox, Vec<CollectorError>> {
        match value {
            Value::Object(map) => self.build(map),
            other => Err(vec![CollectorError::NotATable(json_type(other))]),
        }
    }

    /// Compiles the list parameter `key` into child collectors.
    pub(crate) fn build_children(
        &self,
        args: &CollectorArgs<'_>,
        key: &'static str,
    ) -> Result<Vec<CollectorBox>, Vec<CollectorError>> {
        let list = args.required_list(key).map_err(|e| vec![e])?;
        let mut children = Vec::with_capacity(list.len());
        let mut errors = Vec::new();
        for (index, value) in list.iter().enumerate() {
            match self.build_value(value) {
                Ok(child) => children.push(child),
                Err(child_errors) => errors.extend(child_errors.into_iter().map(|source| {
                    CollectorError::Nested {
                        kind: args.kind().to_owned(),
                        index,
                        source: Box::new(source),
                    }
                })),
            }
        }
        if errors.is_empty() {
            Ok(children)
        } else {
            Err(errors)
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(value: Value) -> Result<CollectorBox, Vec<CollectorError>> {
        CollectorRegistry::builtin().build_value(&value)
    }

    #[test]
    fn missing_type_is_rejected() {
        let errors = build(json!({ "regex": "Foo" })).unwrap_err();
        assert_eq!(errors, [CollectorError::MissingType]);
        assert_eq!(errors[0].to_string(), "collector needs a type");
    }

    #[test]
    fn unknown_type_is_rejected() {
        let errors = build(json!({ "type": "bogus" })).unwrap_err();
        assert_eq!(errors, [CollectorError::UnknownType("bogus".into())]);
    }

    #[test]
    fn missing_parameter_is_rejected() {
        let errors = build(json!({ "type": "className" })).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "`className` collector needs the `regex` parameter"
        );
    }

    #[test]
    fn bad_regex_is_rejected() {
        let errors = build(json!({ "type": "directory", "regex": "src/(" })).unwrap_err();
        assert!(matches!(errors[0], CollectorError::InvalidRegex { .. }));
    }

    #[test]
    fn nested_errors_are_all_reported() {
        let errors = build(json!({
            "type": "or",
            "collectors": [
                { "type": "className" },
                { "type": "className", "regex": "ok" },
                "not a table",
            ],
        }))
        .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert_eq!(
            errors[1].to_string(),
            "`or` collector, child 2: collector must be a table, got a string"
        );
    }

    #[test]
    fn builtin_kinds_are_sorted() {
        let registry = CollectorRegistry::builtin();
        let kinds: Vec<_> = registry.kinds().map(|(kind, _)| kind).collect();
        assert_eq!(kinds.len(), 12);
        assert_eq!(kinds.first(), Some(&"and"));
        assert!(registry.contains("one-of"));
    }
}
