//! DTO → Domain model conversion with validation.
//!
//! Every check runs to completion; offenses are aggregated into a single
//! [`ConfigurationError::Invalid`].

use std::collections::{BTreeMap, BTreeSet};

use super::dto::{ConfigurationDto, LayerDto};
use super::model::{Configuration, Layer, Ruleset, SkipList};
use super::{ConfigOffense, ConfigurationError};
use crate::collector::CollectorRegistry;

/// Converts a [`ConfigurationDto`] to a validated [`Configuration`].
///
/// # Errors
///
/// Returns every offense found.
pub(crate) fn load(
    dto: ConfigurationDto,
    registry: &CollectorRegistry,
) -> Result<Configuration, ConfigurationError> {
    let mut offenses = Vec::new();
    let layer_dtos = dto.layers.unwrap_or_default();

    let declared: BTreeSet<&str> = layer_dtos.iter().map(|l| l.name.as_str()).collect();
    let duplicates = duplicate_names(&layer_dtos);
    if !duplicates.is_empty() {
        offenses.push(ConfigOffense::DuplicateLayers(duplicates));
    }

    let allowed: BTreeMap<String, Vec<String>> = dto
        .ruleset
        .unwrap_or_default()
        .into_iter()
        .map(|(layer, targets)| (layer, targets.unwrap_or_default()))
        .collect();

    let unknown: BTreeSet<String> = allowed
        .iter()
        .flat_map(|(layer, targets)| std::iter::once(layer).chain(targets))
        .filter(|name| !declared.contains(name.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        offenses.push(ConfigOffense::UnknownRulesetLayers(unknown.into_iter().collect()));
    }

    let exclude_files = dto.exclude_files.unwrap_or_default();
    let ignore_uncovered = dto.ignore_uncovered_internal_classes.unwrap_or(true);

    let layers: Vec<Layer> = layer_dtos
        .iter()
        .enumerate()
        .map(|(index, layer)| compile_layer(index, layer, registry, &mut offenses))
        .collect();

    check_layer_references(&layers, &declared, &mut offenses);

    let mut exclude = Vec::with_capacity(exclude_files.len());
    for pattern in &exclude_files {
        match glob::Pattern::new(pattern) {
            Ok(compiled) => exclude.push(compiled),
            Err(e) => offenses.push(ConfigOffense::InvalidExcludePattern {
                pattern: pattern.clone(),
                reason: e.to_string(),
            }),
        }
    }

    let skip = SkipList::new(
        dto.skip_violations
            .unwrap_or_default()
            .into_iter()
            .map(|(source, targets)| (source, targets.unwrap_or_default()))
            .collect(),
    );

    if !offenses.is_empty() {
        return Err(ConfigurationError::Invalid(offenses));
    }

    Ok(Configuration::new(
        layers,
        dto.paths.unwrap_or_default(),
        exclude_files,
        exclude,
        Ruleset::new(allowed, ignore_uncovered, skip),
    ))
}

/// Names declared more than once, each reported once, sorted.
fn duplicate_names(layers: &[LayerDto]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for layer in layers {
        if !seen.insert(layer.name.as_str()) {
            duplicates.insert(layer.name.clone());
        }
    }
    duplicates.into_iter().collect()
}

fn compile_layer(
    index: usize,
    layer: &LayerDto,
    registry: &CollectorRegistry,
    offenses: &mut Vec<ConfigOffense>,
) -> Layer {
    if layer.name.trim().is_empty() {
        offenses.push(ConfigOffense::EmptyLayerName { index });
    }

    let configs = layer.collectors.clone().unwrap_or_default();
    let mut collectors = Vec::with_capacity(configs.len());
    for (position, config) in configs.iter().enumerate() {
        match registry.build_value(config) {
            Ok(collector) => collectors.push(collector),
            Err(errors) => offenses.extend(errors.into_iter().map(|source| {
                ConfigOffense::Collector {
                    layer: layer.name.clone(),
                    index: position,
                    source,
                }
            })),
        }
    }
    Layer::new(layer.name.clone(), configs, collectors)
}

fn check_layer_references(
    layers: &[Layer],
    declared: &BTreeSet<&str>,
    offenses: &mut Vec<ConfigOffense>,
) {
    let mut graph: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    let mut unknown = BTreeSet::new();

    for layer in layers {
        let edges = graph.entry(layer.name()).or_default();
        for collector in layer.collectors() {
            for target in collector.layer_references() {
                if declared.contains(target) {
                    edges.insert(target);
                } else {
                    unknown.insert(target.to_owned());
                }
            }
        }
    }

    if !unknown.is_empty() {
        offenses.push(ConfigOffense::UnknownCollectorLayers(
            unknown.into_iter().collect(),
        ));
    }
    offenses.extend(find_cycles(&graph).into_iter().map(ConfigOffense::LayerCycle));
}

/// Elementary cycles in the layer-reference graph, each starting at its
/// smallest name, sorted.
///
/// A cycle is only walked from its smallest node, through nodes greater than
/// it, so each one is found exactly once.
fn find_cycles(graph: &BTreeMap<&str, BTreeSet<&str>>) -> Vec<Vec<String>> {
    let mut cycles = BTreeSet::new();
    for &start in graph.keys() {
        let mut path = vec![start];
        walk(start, start, graph, &mut path, &mut cycles);
    }
    cycles.into_iter().collect()
}

fn walk<'g>(
    start: &'g str,
    node: &'g str,
    graph: &BTreeMap<&'g str, BTreeSet<&'g str>>,
    path: &mut Vec<&'g str>,
    cycles: &mut BTreeSet<Vec<String>>,
) {
    let Some(targets) = graph.get(node) else {
        return;
    };
    for &target in targets {
        if target == start {
            cycles.insert(path.iter().map(|name| (*name).to_owned()).collect());
        } else if target > start && !path.contains(&target) {
            path.push(target);
            walk(start, target, graph, path, cycles);
            path.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_are_found_once() {
        let graph = BTreeMap::from([
            ("a", BTreeSet::from(["b"])),
            ("b", BTreeSet::from(["c"])),
            ("c", BTreeSet::from(["a"])),
            ("d", BTreeSet::from(["d"])),
            ("e", BTreeSet::from(["a"])),
        ]);
        assert_eq!(
            find_cycles(&graph),
            [vec!["a", "b", "c"], vec!["d"]]
        );
    }

    #[test]
    fn cycles_sharing_nodes_are_all_reported() {
        let graph = BTreeMap::from([
            ("a", BTreeSet::from(["b", "c"])),
            ("b", BTreeSet::from(["a"])),
            ("c", BTreeSet::from(["b"])),
        ]);
        assert_eq!(
            find_cycles(&graph),
            [vec!["a", "b"], vec!["a", "c", "b"]]
        );
    }

    #[test]
    fn acyclic_graph_has_no_cycles() {
        let graph = BTreeMap::from([
            ("a", BTreeSet::from(["b", "c"])),
            ("b", BTreeSet::from(["c"])),
            ("c", BTreeSet::new()),
        ]);
        assert!(find_cycles(&graph).is_empty());
    }
}
