//! Boolean composites and layer references.

use super::{
    CollectContext, Collector, CollectorArgs, CollectorBox, CollectorError, CollectorRegistry,
};
use crate::ast::Symbol;

fn child_layer_references(children: &[CollectorBox]) -> Vec<&str> {
    children.iter().flat_map(|c| c.layer_references()).collect()
}

/// True iff every child is true. An empty list is false.
#[derive(Debug)]
pub struct AndCollector {
    children: Vec<CollectorBox>,
}

impl AndCollector {
    /// Creates the conjunction of `children`.
    #[must_use]
    pub fn new(children: Vec<CollectorBox>) -> Self {
        Self { children }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        registry: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        Ok(Box::new(Self::new(registry.build_children(args, "collectors")?)))
    }
}

impl Collector for AndCollector {
    fn kind(&self) -> &'static str {
        "and"
    }

    fn satisfy(&self, symbol: &Symbol, ctx: &CollectContext<'_>) -> bool {
        !self.children.is_empty() && self.children.iter().all(|c| c.satisfy(symbol, ctx))
    }

    fn layer_references(&self) -> Vec<&str> {
        child_layer_references(&self.children)
    }
}

/// True iff any child is true.
#[derive(Debug)]
pub struct OrCollector {
    children: Vec<CollectorBox>,
}

impl OrCollector {
    /// Creates the disjunction of `children`.
    #[must_use]
    pub fn new(children: Vec<CollectorBox>) -> Self {
        Self { children }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        registry: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        Ok(Box::new(Self::new(registry.build_children(args, "collectors")?)))
    }
}

impl Collector for OrCollector {
    fn kind(&self) -> &'static str {
        "or"
    }

    fn satisfy(&self, symbol: &Symbol, ctx: &CollectContext<'_>) -> bool {
        self.children.iter().any(|c| c.satisfy(symbol, ctx))
    }

    fn layer_references(&self) -> Vec<&str> {
        child_layer_references(&self.children)
    }
}

/// Negates its single child.
#[derive(Debug)]
pub struct NotCollector {
    child: CollectorBox,
}

impl NotCollector {
    /// Creates the negation of `child`.
    #[must_use]
    pub fn new(child: CollectorBox) -> Self {
        Self { child }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        registry: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let table = args.required_object("collector").map_err(|e| vec![e])?;
        let child = registry.build(table).map_err(|errors| {
            errors
                .into_iter()
                .map(|source| CollectorError::Nested {
                    kind: args.kind().to_owned(),
                    index: 0,
                    source: Box::new(source),
                })
                .collect::<Vec<_>>()
        })?;
        Ok(Box::new(Self::new(child)))
    }
}

impl Collector for NotCollector {
    fn kind(&self) -> &'static str {
        "not"
    }

    fn satisfy(&self, symbol: &Symbol, ctx: &CollectContext<'_>) -> bool {
        !self.child.satisfy(symbol, ctx)
    }

    fn layer_references(&self) -> Vec<&str> {
        self.child.layer_references()
    }
}

/// True iff exactly one child is true.
#[derive(Debug)]
pub struct OneOfCollector {
    children: Vec<CollectorBox>,
}

impl OneOfCollector {
    /// Creates the exclusive choice over `children`.
    #[must_use]
    pub fn new(children: Vec<CollectorBox>) -> Self {
        Self { children }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        registry: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        Ok(Box::new(Self::new(registry.build_children(args, "collectors")?)))
    }
}

impl Collector for OneOfCollector {
    fn kind(&self) -> &'static str {
        "one-of"
    }

    fn satisfy(&self, symbol: &Symbol, ctx: &CollectContext<'_>) -> bool {
        let mut matched = self.children.iter().filter(|c| c.satisfy(symbol, ctx));
        matched.next().is_some() && matched.next().is_none()
    }

    fn layer_references(&self) -> Vec<&str> {
        child_layer_references(&self.children)
    }
}

/// True iff the symbol belongs to the named layer.
#[derive(Debug, Clone)]
pub struct LayerCollector {
    layer: String,
}

impl LayerCollector {
    /// Creates a reference to `layer`.
    #[must_use]
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
        }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        _: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let layer = args.required_str("layer").map_err(|e| vec![e])?;
        Ok(Box::new(Self::new(layer)))
    }
}

impl Collector for LayerCollector {
    fn kind(&self) -> &'static str {
        "layer"
    }

    fn satisfy(&self, symbol: &Symbol, ctx: &CollectContext<'_>) -> bool {
        ctx.satisfies_layer(symbol, &self.layer)
    }

    fn layer_references(&self) -> Vec<&str> {
        vec![self.layer.as_str()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstMap, SymbolKind};
    use crate::config::Configuration;
    use serde_json::{json, Value};

    fn symbol() -> Symbol {
        Symbol::new("App\\Service\\Mailer", SymbolKind::Class, "src/Service/Mailer.php", 3)
    }

    fn satisfies(config: Value) -> bool {
        let collector = CollectorRegistry::builtin().build_value(&config).unwrap();
        let map = AstMap::default();
        collector.satisfy(&symbol(), &CollectContext::new(&map, &[]))
    }

    const YES: &str = "Mailer";
    const NO: &str = "Repository";

    fn leaf(regex: &str) -> Value {
        json!({ "type": "className", "regex": regex })
    }

    #[test]
    fn and_requires_all_children() {
        assert!(satisfies(json!({ "type": "and", "collectors": [leaf(YES), leaf(YES)] })));
        assert!(!satisfies(json!({ "type": "and", "collectors": [leaf(YES), leaf(NO)] })));
        assert!(!satisfies(json!({ "type": "and", "collectors": [] })));
    }

    #[test]
    fn or_requires_any_child() {
        assert!(satisfies(json!({ "type": "or", "collectors": [leaf(NO), leaf(YES)] })));
        assert!(!satisfies(json!({ "type": "or", "collectors": [leaf(NO)] })));
        assert!(!satisfies(json!({ "type": "or", "collectors": [] })));
    }

    #[test]
    fn not_negates() {
        assert!(satisfies(json!({ "type": "not", "collector": leaf(NO) })));
        assert!(!satisfies(json!({ "type": "not", "collector": leaf(YES) })));
    }

    #[test]
    fn one_of_requires_exactly_one() {
        assert!(satisfies(json!({ "type": "one-of", "collectors": [leaf(YES), leaf(NO)] })));
        assert!(!satisfies(json!({ "type": "one-of", "collectors": [leaf(YES), leaf(YES)] })));
        assert!(!satisfies(json!({ "type": "one-of", "collectors": [leaf(NO), leaf(NO)] })));
    }

    #[test]
    fn not_requires_a_table() {
        let errors = CollectorRegistry::builtin()
            .build_value(&json!({ "type": "not", "collector": [leaf(YES)] }))
            .unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "`not` collector parameter `collector` must be a table"
        );
    }

    #[test]
    fn layer_delegates_to_named_layer() {
        let config = Configuration::from_value(&json!({
            "layers": [
                { "name": "Service", "collectors": [leaf("\\\\Service\\\\")] },
                { "name": "Mail", "collectors": [
                    { "type": "and", "collectors": [
                        { "type": "layer", "layer": "Service" },
                        leaf(YES),
                    ] },
                ] },
                { "name": "Unknown", "collectors": [{ "type": "layer", "layer": "Mail" }, leaf(NO)] },
            ],
        }))
        .unwrap();
        let map = AstMap::default();
        let ctx = CollectContext::new(&map, config.layers());
        assert!(ctx.satisfies_layer(&symbol(), "Mail"));
        assert!(ctx.satisfies_layer(&symbol(), "Unknown"));
        assert!(!ctx.satisfies_layer(&symbol(), "Missing"));
    }
}
