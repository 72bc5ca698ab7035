//! Collectors over symbol kind and the inheritance graph.

use std::collections::{BTreeSet, VecDeque};

use super::{
    CollectContext, Collector, CollectorArgs, CollectorBox, CollectorError, CollectorRegistry,
};
use crate::ast::{symbol_key, Symbol, SymbolKind};
use crate::types::ReferenceKind;

/// Matches the declaration kind.
#[derive(Debug, Clone, Copy)]
pub struct KindCollector {
    kind: SymbolKind,
}

impl KindCollector {
    /// Creates a collector for `kind`.
    #[must_use]
    pub fn new(kind: SymbolKind) -> Self {
        Self { kind }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        _: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let value = args.required_str("value").map_err(|e| vec![e])?;
        let kind = SymbolKind::parse(value).ok_or_else(|| {
            vec![CollectorError::InvalidParameter {
                kind: args.kind().to_owned(),
                key: "value",
                expected: "one of class, interface, trait, enum",
            }]
        })?;
        Ok(Box::new(Self::new(kind)))
    }
}

impl Collector for KindCollector {
    fn kind(&self) -> &'static str {
        "kind"
    }

    fn satisfy(&self, symbol: &Symbol, _: &CollectContext<'_>) -> bool {
        symbol.kind() == self.kind
    }
}

/// Matches a direct `extends` or `implements` edge to a given symbol.
#[derive(Debug, Clone)]
pub struct DirectEdgeCollector {
    edge: ReferenceKind,
    target: String,
}

impl DirectEdgeCollector {
    /// Matches symbols that directly extend `target`.
    #[must_use]
    pub fn extends(target: &str) -> Self {
        Self {
            edge: ReferenceKind::Extends,
            target: symbol_key(target),
        }
    }

    /// Matches symbols that directly implement `target`.
    #[must_use]
    pub fn implements(target: &str) -> Self {
        Self {
            edge: ReferenceKind::Implements,
            target: symbol_key(target),
        }
    }

    pub(crate) fn build_extends(
        args: &CollectorArgs<'_>,
        _: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let target = args.required_str("value").map_err(|e| vec![e])?;
        Ok(Box::new(Self::extends(target)))
    }

    pub(crate) fn build_implements(
        args: &CollectorArgs<'_>,
        _: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let target = args.required_str("value").map_err(|e| vec![e])?;
        Ok(Box::new(Self::implements(target)))
    }
}

impl Collector for DirectEdgeCollector {
    fn kind(&self) -> &'static str {
        self.edge.as_str()
    }

    fn satisfy(&self, symbol: &Symbol, ctx: &CollectContext<'_>) -> bool {
        ctx.ast_map()
            .dependencies(symbol.name())
            .iter()
            .any(|r| r.kind == self.edge && symbol_key(&r.target) == self.target)
    }
}

/// Matches when `extends`, `implements` or `uses-trait` edges reach a given
/// symbol, transitively.
#[derive(Debug, Clone)]
pub struct InheritsCollector {
    target: String,
}

impl InheritsCollector {
    /// Creates a collector for descendants of `target`.
    #[must_use]
    pub fn new(target: &str) -> Self {
        Self {
            target: symbol_key(target),
        }
    }

    pub(crate) fn build(
        args: &CollectorArgs<'_>,
        _: &CollectorRegistry,
    ) -> Result<CollectorBox, Vec<CollectorError>> {
        let target = args.required_str("value").map_err(|e| vec![e])?;
        Ok(Box::new(Self::new(target)))
    }
}

impl Collector for InheritsCollector {
    fn kind(&self) -> &'static str {
        "inherits"
    }

    fn satisfy(&self, symbol: &Symbol, ctx: &CollectContext<'_>) -> bool {
        let ast_map = ctx.ast_map();
        let mut seen = BTreeSet::new();
        let mut queue = VecDeque::from([symbol.key()]);

        while let Some(key) = queue.pop_front() {
            if !seen.insert(key.clone()) {
                continue;
            }
            for reference in ast_map.dependencies(&key) {
                if !matches!(
                    reference.kind,
                    ReferenceKind::Extends | ReferenceKind::Implements | ReferenceKind::UsesTrait
                ) {
                    continue;
                }
                let target = symbol_key(&reference.target);
                if target == self.target {
                    return true;
                }
                queue.push_back(target);
            }
        }
        false
    }
}
