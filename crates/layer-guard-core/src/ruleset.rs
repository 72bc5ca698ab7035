//! Edge classification against the layer allow-list.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use rayon::prelude::*;
use tracing::debug;

use crate::ast::{symbol_key, AstMap, Symbol};
use crate::config::Ruleset;
use crate::layer::LayerMembership;
use crate::types::{Classification, ClassifiedEdge, Reference, Report, SkipEntry};

/// Classifies dependency edges.
#[derive(Debug, Clone, Copy)]
pub struct RulesetEngine<'a> {
    ruleset: &'a Ruleset,
}

impl<'a> RulesetEngine<'a> {
    /// Creates an engine for the given ruleset.
    #[must_use]
    pub fn new(ruleset: &'a Ruleset) -> Self {
        Self { ruleset }
    }

    /// Classifies one edge.
    ///
    /// Returns one record per layer pairing. An empty result means the edge
    /// was suppressed by the "ignore uncovered internal classes" flag.
    #[must_use]
    pub fn classify(
        &self,
        reference: &Reference,
        ast_map: &AstMap,
        membership: &LayerMembership,
    ) -> Vec<ClassifiedEdge> {
        let record = |source_layer: Option<&str>, target_layer: Option<&str>, classification| {
            ClassifiedEdge {
                reference: reference.clone(),
                source_layer: source_layer.map(str::to_owned),
                target_layer: target_layer.map(str::to_owned),
                classification,
            }
        };
        let ignore_internal = self.ruleset.ignore_uncovered_internal_classes();

        let sources: Vec<&str> = membership.layers_of(&reference.source).collect();
        if sources.is_empty() {
            if ignore_internal {
                return Vec::new();
            }
            return vec![record(None, None, Classification::UnclassifiedSource)];
        }

        let targets: Vec<&str> = membership.layers_of(&reference.target).collect();
        if targets.is_empty() {
            // External targets stay visible whatever the flag says.
            if ignore_internal && ast_map.contains(&reference.target) {
                return Vec::new();
            }
            return sources
                .iter()
                .map(|source| record(Some(*source), None, Classification::Uncovered))
                .collect();
        }

        let skipped = self
            .ruleset
            .skip_violations()
            .contains(&reference.source, &reference.target);
        let mut records = Vec::with_capacity(sources.len() * targets.len());
        for source in &sources {
            for target in &targets {
                let classification = if self.ruleset.is_allowed(source, target) {
                    Classification::Allowed
                } else if skipped {
                    Classification::Skipped
                } else {
                    Classification::Violation
                };
                records.push(record(Some(*source), Some(*target), classification));
            }
        }
        records
    }

    /// Classifies every edge of the map, in parallel per source symbol.
    ///
    /// Records are sorted by source symbol (case-insensitive), line, target,
    /// kind, layers and classification.
    #[must_use]
    pub fn evaluate(&self, ast_map: &AstMap, membership: &LayerMembership) -> Report {
        let symbols: Vec<&Symbol> = ast_map.symbols().collect();
        let (mut records, suppressed) = symbols
            .par_iter()
            .map(|symbol| {
                let mut records = Vec::new();
                let mut suppressed = 0usize;
                for reference in ast_map.dependencies(symbol.name()) {
                    let classified = self.classify(reference, ast_map, membership);
                    if classified.is_empty() {
                        suppressed += 1;
                    }
                    records.extend(classified);
                }
                (records, suppressed)
            })
            .reduce(
                || (Vec::new(), 0),
                |(mut records, a), (more, b)| {
                    records.extend(more);
                    (records, a + b)
                },
            );
        records.sort_by(compare_records);

        let unmatched_skips = self.unmatched_skips(&records);
        debug!(
            records = records.len(),
            suppressed,
            unmatched_skips = unmatched_skips.len(),
            "evaluated ruleset"
        );
        Report {
            records,
            suppressed,
            unmatched_skips,
        }
    }

    fn unmatched_skips(&self, records: &[ClassifiedEdge]) -> Vec<SkipEntry> {
        let matched: BTreeSet<(String, String)> = records
            .iter()
            .filter(|r| r.classification == Classification::Skipped)
            .map(|r| (symbol_key(&r.reference.source), symbol_key(&r.reference.target)))
            .collect();
        let mut unmatched: Vec<SkipEntry> = self
            .ruleset
            .skip_violations()
            .entries()
            .filter(|e| !matched.contains(&(symbol_key(&e.source), symbol_key(&e.target))))
            .cloned()
            .collect();
        unmatched.sort();
        unmatched
    }
}

fn compare_records(a: &ClassifiedEdge, b: &ClassifiedEdge) -> Ordering {
    let (ra, rb) = (&a.reference, &b.reference);
    symbol_key(&ra.source)
        .cmp(&symbol_key(&rb.source))
        .then(ra.line.cmp(&rb.line))
        .then_with(|| symbol_key(&ra.target).cmp(&symbol_key(&rb.target)))
        .then(ra.kind.cmp(&rb.kind))
        .then_with(|| a.source_layer.cmp(&b.source_layer))
        .then_with(|| a.target_layer.cmp(&b.target_layer))
        .then(a.classification.cmp(&b.classification))
}
