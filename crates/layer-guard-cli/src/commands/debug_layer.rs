//! Debug-layer command implementation.

use anyhow::{bail, Context, Result};
use layer_guard_core::{Analyzer, LayerMembership};
use layer_guard_php::PhpParser;
use std::path::Path;

use crate::config_resolver::ConfigSource;

/// Runs the debug-layer command, listing the symbols of `layer` or of every
/// layer.
pub fn run(path: &Path, source: &ConfigSource, layer: Option<&str>) -> Result<()> {
    let configuration = super::load_configuration(source)?;
    if let Some(name) = layer {
        if configuration.layer(name).is_none() {
            bail!("Unknown layer `{name}`");
        }
    }
    let names: Vec<String> = match layer {
        Some(name) => vec![name.to_owned()],
        None => configuration
            .layers()
            .iter()
            .map(|l| l.name().to_owned())
            .collect(),
    };

    let parser = PhpParser::new();
    let files = super::discover_files(path, &configuration, &parser)?;
    let parsed = super::parse_files(path, &files, &parser)?;

    let analysis = Analyzer::builder()
        .configuration(configuration)
        .build()
        .context("Failed to build analyzer")?
        .analyze(parsed)
        .context("Analysis failed")?;

    print!("{}", render(&analysis.membership, &names));
    Ok(())
}

fn render(membership: &LayerMembership, layers: &[String]) -> String {
    use std::fmt::Write;
    let mut output = String::new();
    for layer in layers {
        let symbols: Vec<&str> = membership.symbols_in(layer).collect();
        let _ = writeln!(output, "{layer} ({})", symbols.len());
        for symbol in symbols {
            let _ = writeln!(output, "  {symbol}");
        }
    }
    output
}
