//! Integration test: raw value tree → validated configuration.
//!
//! Covers the aggregated offense messages and the defaults applied while
//! loading.

use layer_guard_core::config::ConfigOffense;
use layer_guard_core::{Configuration, ConfigurationError};
use serde_json::{json, Value};

fn offenses(value: &Value) -> Vec<String> {
    match Configuration::from_value(value) {
        Ok(_) => panic!("configuration should be rejected"),
        Err(error) => error.offenses().iter().map(ToString::to_string).collect(),
    }
}

// ── Aggregated offenses ──

#[test]
fn duplicate_layers_are_reported_once_and_sorted() {
    let value = json!({
        "layers": [
            { "name": "foo" },
            { "name": "foo" },
            { "name": "bar" },
            { "name": "baz" },
            { "name": "baz" },
        ],
    });
    let error = Configuration::from_value(&value).unwrap_err();
    assert_eq!(
        error.offenses(),
        [ConfigOffense::DuplicateLayers(vec!["baz".into(), "foo".into()])]
    );
    insta::assert_snapshot!(
        error.offenses()[0].to_string(),
        @r#"configuration can not contain multiple layers with the same name, got "baz", "foo" as duplicate"#
    );
}

#[test]
fn unknown_ruleset_layers_are_reported_once_and_sorted() {
    let value = json!({
        "layers": [{ "name": "foo" }, { "name": "bar" }],
        "ruleset": {
            "foo": ["bar", "qux"],
            "bar": ["qux"],
            "quux": ["foo"],
        },
    });
    let error = Configuration::from_value(&value).unwrap_err();
    assert_eq!(
        error.offenses(),
        [ConfigOffense::UnknownRulesetLayers(vec![
            "quux".into(),
            "qux".into()
        ])]
    );
    insta::assert_snapshot!(
        error.offenses()[0].to_string(),
        @r#"ruleset can not reference unknown layer names, got "quux", "qux" as unknown"#
    );
}

#[test]
fn every_offense_is_aggregated() {
    let value = json!({
        "layers": [
            { "name": "A", "collectors": [{ "type": "className" }] },
            { "name": "A", "collectors": [{ "type": "nope" }] },
        ],
        "ruleset": { "A": ["B"] },
        "exclude_files": ["src/[oops"],
    });
    let messages = offenses(&value);
    assert_eq!(messages.len(), 5, "{messages:#?}");
    assert_eq!(
        messages[2],
        "layer \"A\", collector 0: `className` collector needs the `regex` parameter"
    );
    assert_eq!(messages[3], "layer \"A\", collector 0: unknown collector type `nope`");
    assert!(messages[4].starts_with("invalid exclude pattern `src/[oops`"));
}

#[test]
fn missing_collector_parameter_fails_before_evaluation() {
    let value = json!({
        "layers": [{
            "name": "Domain",
            "collectors": [{ "type": "and", "collectors": [{ "type": "directory" }] }],
        }],
    });
    insta::assert_snapshot!(
        offenses(&value).join("\n"),
        @"layer \"Domain\", collector 0: `and` collector, child 0: `directory` collector needs the `regex` parameter"
    );
}

#[test]
fn layer_reference_cycles_are_rejected() {
    let value = json!({
        "layers": [
            { "name": "B", "collectors": [{ "type": "layer", "layer": "A" }] },
            { "name": "A", "collectors": [{ "type": "not", "collector": { "type": "layer", "layer": "B" } }] },
            { "name": "C", "collectors": [{ "type": "layer", "layer": "Missing" }] },
        ],
    });
    insta::assert_snapshot!(offenses(&value).join("\n"), @r#"
    layer collectors can not reference unknown layer names, got "Missing" as unknown
    layer references form a cycle: A -> B -> A
    "#);
}

#[test]
fn every_cycle_through_a_shared_layer_is_reported() {
    let value = json!({
        "layers": [
            { "name": "A", "collectors": [
                { "type": "layer", "layer": "B" },
                { "type": "layer", "layer": "C" },
            ] },
            { "name": "B", "collectors": [{ "type": "layer", "layer": "A" }] },
            { "name": "C", "collectors": [{ "type": "layer", "layer": "B" }] },
        ],
    });
    insta::assert_snapshot!(offenses(&value).join("\n"), @r"
    layer references form a cycle: A -> B -> A
    layer references form a cycle: A -> C -> B -> A
    ");
}

#[test]
fn malformed_tree_is_a_single_parse_error() {
    let error = Configuration::from_value(&json!({ "layers": { "name": "A" } })).unwrap_err();
    assert!(matches!(error, ConfigurationError::Malformed(_)));
    assert!(error.offenses().is_empty());
}

// ── Defaults and round-trip ──

#[test]
fn valid_configuration_round_trips() {
    let value = json!({
        "layers": [
            { "name": "Repository", "collectors": [{ "type": "directory", "regex": "^src/Repository/" }] },
            { "name": "Controller", "collectors": [{ "type": "directory", "regex": "^src/Controller/" }] },
            { "name": "Service", "collectors": [{ "type": "className", "regex": "Service$" }] },
        ],
        "paths": ["src", "lib"],
        "exclude_files": ["src/Legacy/**"],
        "ruleset": { "Controller": ["Service"], "Service": ["Repository"], "Repository": null },
        "ignore_uncovered_internal_classes": false,
    });
    let config = Configuration::from_value(&value).unwrap();

    let names: Vec<&str> = config.layers().iter().map(|l| l.name()).collect();
    assert_eq!(names, ["Repository", "Controller", "Service"]);
    assert_eq!(
        config.layer("Service").map(|l| l.configs().to_vec()),
        Some(vec![json!({ "type": "className", "regex": "Service$" })])
    );
    assert_eq!(config.paths(), ["src", "lib"]);
    assert_eq!(config.exclude_files(), ["src/Legacy/**"]);
    assert_eq!(config.ruleset().allowed("Controller"), ["Service"]);
    assert_eq!(config.ruleset().allowed("Service"), ["Repository"]);
    assert!(config.ruleset().allowed("Repository").is_empty());
    assert!(!config.ruleset().ignore_uncovered_internal_classes());
}

#[test]
fn absent_or_null_lists_default_to_empty() {
    let nulled = json!({
        "layers": [{ "name": "A" }],
        "paths": null,
        "exclude_files": null,
        "skip_violations": { "App\\Foo": null },
        "ignore_uncovered_internal_classes": null,
    });
    let absent = json!({ "layers": [{ "name": "A" }] });

    for value in [nulled, absent] {
        let config = Configuration::from_value(&value).unwrap();
        assert!(config.exclude_files().is_empty());
        assert!(config.paths().is_empty());
        assert!(config.ruleset().skip_violations().is_empty());
        assert!(config.ruleset().ignore_uncovered_internal_classes());
    }
}

#[test]
fn toml_and_json_trees_load_the_same() {
    let from_toml: Value = toml::from_str(
        r#"
        paths = ["src"]

        [[layers]]
        name = "Controller"
        collectors = [{ type = "directory", regex = "^src/Controller/" }]

        [[layers]]
        name = "Service"
        collectors = [{ type = "directory", regex = "^src/Service/" }]

        [ruleset]
        Controller = ["Service"]
        "#,
    )
    .unwrap();
    let config = Configuration::from_value(&from_toml).unwrap();
    assert_eq!(config.layers().len(), 2);
    assert!(config.ruleset().is_allowed("Controller", "Service"));
    assert!(!config.ruleset().is_allowed("Service", "Controller"));
}
