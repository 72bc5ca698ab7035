//! Check command implementation.

use anyhow::{Context, Result};
use layer_guard_core::Analyzer;
use layer_guard_php::PhpParser;
use std::path::Path;

use crate::config_resolver::ConfigSource;
use crate::OutputFormat;

/// Reporting and exit-code switches for `check`.
#[derive(Debug, Clone, Copy, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Abort on the first file that fails to parse.
    pub fail_fast: bool,
    /// Exit non-zero on uncovered dependencies too.
    pub fail_on_uncovered: bool,
    /// List uncovered dependencies.
    pub report_uncovered: bool,
    /// List allowed dependencies.
    pub report_allowed: bool,
}

/// Runs the check command.
///
/// Returns whether the run passed.
pub fn run(path: &Path, source: &ConfigSource, options: CheckOptions) -> Result<bool> {
    let configuration = super::load_configuration(source)?;
    let parser = PhpParser::new();

    let files = super::discover_files(path, &configuration, &parser)?;
    tracing::info!("Analyzing {} files in {}", files.len(), path.display());

    let parsed = super::parse_files(path, &files, &parser)?;

    let analyzer = Analyzer::builder()
        .configuration(configuration)
        .fail_fast(options.fail_fast)
        .build()
        .context("Failed to build analyzer")?;
    let analysis = analyzer.analyze(parsed).context("Analysis failed")?;

    super::output::print(&analysis, options)?;

    let summary = analysis.report.summary();
    Ok(summary.violations == 0 && !(options.fail_on_uncovered && summary.uncovered > 0))
}
