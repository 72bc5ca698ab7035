//! Layer membership resolution.

use std::collections::{BTreeMap, BTreeSet};

use rayon::prelude::*;
use tracing::debug;

use crate::ast::{symbol_key, AstMap, Symbol};
use crate::collector::CollectContext;
use crate::config::Configuration;

/// Symbol → set of layer names.
///
/// A symbol may belong to several layers. A symbol without an entry is
/// unclassified.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LayerMembership {
    /// Symbol key -> (declared name, layers).
    layers: BTreeMap<String, (String, BTreeSet<String>)>,
}

impl LayerMembership {
    /// Layers of a symbol, empty when unclassified or unknown.
    pub fn layers_of(&self, name: &str) -> impl Iterator<Item = &str> {
        self.layers
            .get(&symbol_key(name))
            .into_iter()
            .flat_map(|(_, layers)| layers.iter().map(String::as_str))
    }

    /// Returns true if the symbol belongs to at least one layer.
    #[must_use]
    pub fn is_classified(&self, name: &str) -> bool {
        self.layers.contains_key(&symbol_key(name))
    }

    /// Classified symbols with their layers, in case-insensitive name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.layers
            .values()
            .map(|(name, layers)| (name.as_str(), layers))
    }

    /// Symbols belonging to `layer`, in case-insensitive name order.
    pub fn symbols_in<'a>(&'a self, layer: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.iter()
            .filter(move |(_, layers)| layers.contains(layer))
            .map(|(name, _)| name)
    }

    /// Number of classified symbols.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if no symbol is classified.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

/// Evaluates every layer against every symbol.
#[derive(Debug, Clone, Copy)]
pub struct LayerResolver<'a> {
    config: &'a Configuration,
}

impl<'a> LayerResolver<'a> {
    /// Creates a resolver over the configured layers.
    #[must_use]
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Layers the symbol satisfies, in declaration order.
    #[must_use]
    pub fn layers_for(&self, symbol: &Symbol, ast_map: &AstMap) -> Vec<&'a str> {
        let ctx = CollectContext::new(ast_map, self.config.layers());
        self.config
            .layers()
            .iter()
            .map(crate::config::Layer::name)
            .filter(|name| ctx.satisfies_layer(symbol, name))
            .collect()
    }

    /// Computes membership for every symbol, in parallel.
    #[must_use]
    pub fn resolve(&self, ast_map: &AstMap) -> LayerMembership {
        let symbols: Vec<&Symbol> = ast_map.symbols().collect();
        let layers = symbols
            .par_iter()
            .filter_map(|symbol| {
                let layers = self.layers_for(symbol, ast_map);
                if layers.is_empty() {
                    return None;
                }
                Some((
                    symbol.key(),
                    (
                        symbol.name().to_owned(),
                        layers
                            .into_iter()
                            .map(str::to_owned)
                            .collect::<BTreeSet<String>>(),
                    ),
                ))
            })
            .collect::<BTreeMap<_, _>>();

        for layer in self.config.layers() {
            debug!(
                layer = layer.name(),
                symbols = layers.values().filter(|(_, l)| l.contains(layer.name())).count(),
                "resolved layer"
            );
        }
        LayerMembership { layers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{AstMapBuilder, FileExtraction, SymbolKind};
    use serde_json::json;

    fn ast_map(symbols: &[(&str, &str)]) -> AstMap {
        let mut builder = AstMapBuilder::new();
        for (name, path) in symbols {
            let mut extraction = FileExtraction::new(*path);
            extraction.push_symbol(Symbol::new(*name, SymbolKind::Class, *path, 1));
            builder.merge(extraction);
        }
        builder.finish()
    }

    #[test]
    fn membership_is_a_set_across_layers() {
        let config = Configuration::from_value(&json!({
            "layers": [
                { "name": "Controller", "collectors": [{ "type": "directory", "regex": "^src/Controller/" }] },
                { "name": "Http", "collectors": [{ "type": "className", "regex": "Controller$" }] },
                { "name": "Repository", "collectors": [{ "type": "directory", "regex": "^src/Repository/" }] },
            ],
        }))
        .unwrap();
        let map = ast_map(&[
            ("App\\Controller\\HomeController", "src/Controller/HomeController.php"),
            ("App\\Repository\\UserRepository", "src/Repository/UserRepository.php"),
            ("App\\Util\\Clock", "src/Util/Clock.php"),
        ]);

        let membership = LayerResolver::new(&config).resolve(&map);

        let layers: Vec<_> = membership
            .layers_of("app\\controller\\homecontroller")
            .collect();
        assert_eq!(layers, ["Controller", "Http"]);
        assert!(!membership.is_classified("App\\Util\\Clock"));
        assert_eq!(membership.len(), 2);
        assert_eq!(
            membership.symbols_in("Repository").collect::<Vec<_>>(),
            ["App\\Repository\\UserRepository"]
        );
    }
}
