//! Regex collectors over names, paths and methods.

use regex::Regex;

use super::{
    CollectContext, Collector, CollectorArgs, CollectorBox, CollectorError, CollectorRegistry,
};
use crate::ast::Symbol;

/// Matches the fully-qualified class name.
#[derive(Debug, Clone)]
pub struct ClassNameCollector {
    pattern: Regex,
}

impl ClassNameCollector {
    /// Creates a collector from a compiled pattern.
    #[must_use]
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        _: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let pattern = args.required_regex("regex").map_err(|e| vec![e])?;
        Ok(Box::new(Self::new(pattern)))
    }
}

impl Collector for ClassNameCollector {
    fn kind(&self) -> &'static str {
        "className"
    }

    fn satisfy(&self, symbol: &Symbol, _: &CollectContext<'_>) -> bool {
        self.pattern.is_match(symbol.name())
    }
}

/// Matches the declaring file path, with `/` separators.
#[derive(Debug, Clone)]
pub struct DirectoryCollector {
    pattern: Regex,
}

impl DirectoryCollector {
    /// Creates a collector from a compiled pattern.
    #[must_use]
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        _: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let pattern = args.required_regex("regex").map_err(|e| vec![e])?;
        Ok(Box::new(Self::new(pattern)))
    }
}

impl Collector for DirectoryCollector {
    fn kind(&self) -> &'static str {
        "directory"
    }

    fn satisfy(&self, symbol: &Symbol, _: &CollectContext<'_>) -> bool {
        let path = symbol.file().to_string_lossy().replace('\\', "/");
        self.pattern.is_match(&path)
    }
}

/// Matches when any declared method name matches.
#[derive(Debug, Clone)]
pub struct MethodCollector {
    pattern: Regex,
}

impl MethodCollector {
    /// Creates a collector from a compiled pattern.
    #[must_use]
    pub fn new(pattern: Regex) -> Self {
        Self { pattern }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        _: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let pattern = args.required_regex("name").map_err(|e| vec![e])?;
        Ok(Box::new(Self::new(pattern)))
    }
}

impl Collector for MethodCollector {
    fn kind(&self) -> &'static str {
        "method"
    }

    fn satisfy(&self, symbol: &Symbol, _: &CollectContext<'_>) -> bool {
        symbol.methods().iter().any(|m| self.pattern.is_match(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstMap, SymbolKind};
    use serde_json::json;

    fn satisfies(config: serde_json::Value, symbol: &Symbol) -> bool {
        let collector = CollectorRegistry::builtin().build_value(&config).unwrap();
        let map = AstMap::default();
        collector.satisfy(symbol, &CollectContext::new(&map, &[]))
    }

    fn controller() -> Symbol {
        Symbol::new(
            "App\\Controller\\UserController",
            SymbolKind::Class,
            "src\\Controller\\UserController.php",
            5,
        )
        .with_method("showAction")
    }

    #[test]
    fn class_name_is_case_insensitive_search() {
        let symbol = controller();
        assert!(satisfies(json!({ "type": "className", "regex": "controller$" }), &symbol));
        assert!(satisfies(json!({ "type": "className", "regex": ".*Controller\\\\.*" }), &symbol));
        assert!(!satisfies(json!({ "type": "className", "regex": "^Repository" }), &symbol));
    }

    #[test]
    fn directory_uses_forward_slashes() {
        let symbol = controller();
        assert!(satisfies(json!({ "type": "directory", "regex": "^src/Controller/" }), &symbol));
        assert!(!satisfies(json!({ "type": "directory", "regex": "^src/Repository" }), &symbol));
    }

    #[test]
    fn method_matches_any_declared_method() {
        let symbol = controller();
        assert!(satisfies(json!({ "type": "method", "name": "action$" }), &symbol));
        assert!(!satisfies(json!({ "type": "method", "name": "^handle" }), &symbol));
    }
}
