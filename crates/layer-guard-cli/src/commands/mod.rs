//! Subcommand implementations and the source pipeline they share.

pub mod check;
pub mod debug_layer;
pub mod init;
pub mod list_collectors;
pub mod output;

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use layer_guard_core::ast::{ExtractionError, ParsedFile, SourceParser};
use layer_guard_core::Configuration;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::config_resolver::{self, ConfigSource};

/// Loads and validates the resolved configuration.
///
/// Validation offenses are rendered through miette.
pub fn load_configuration(source: &ConfigSource) -> Result<Configuration> {
    let Some(path) = source.path() else {
        bail!("No layer-guard.toml found. Run `layer-guard init` to create one.");
    };
    if source.is_global() {
        info!("Using global config: {}", path.display());
    }

    let raw = config_resolver::read_raw(path)?;
    Configuration::from_value(&raw)
        .map_err(|e| anyhow!("{:?}", miette::Report::new(e)))
        .with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Source files under the configured `paths` (default: the project root),
/// relative to `root`, sorted, with `exclude_files` matches dropped.
pub fn discover_files(
    root: &Path,
    configuration: &Configuration,
    parser: &dyn SourceParser,
) -> Result<Vec<PathBuf>> {
    let roots: Vec<PathBuf> = if configuration.paths().is_empty() {
        vec![root.to_path_buf()]
    } else {
        configuration.paths().iter().map(|p| root.join(p)).collect()
    };

    let mut files = BTreeSet::new();
    for dir in &roots {
        if !dir.exists() {
            warn!("Configured path does not exist: {}", dir.display());
            continue;
        }

        let mut builder = ignore::WalkBuilder::new(dir);
        builder.hidden(false).git_ignore(true);

        for entry in builder.build() {
            let entry = entry?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let supported = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| {
                    parser
                        .extensions()
                        .iter()
                        .any(|supported| supported.eq_ignore_ascii_case(ext))
                });
            if !supported {
                continue;
            }

            let relative = path.strip_prefix(root).unwrap_or(path);
            if configuration.is_excluded(relative) {
                debug!("Excluded {}", relative.display());
                continue;
            }
            files.insert(relative.to_path_buf());
        }
    }

    Ok(files.into_iter().collect())
}

/// Reads and parses files in parallel, preserving input order.
///
/// Invalid UTF-8 is replaced rather than rejected.
pub fn parse_files(
    root: &Path,
    files: &[PathBuf],
    parser: &dyn SourceParser,
) -> Result<Vec<Result<ParsedFile, ExtractionError>>> {
    files
        .par_iter()
        .map(|relative| {
            let bytes = std::fs::read(root.join(relative))
                .with_context(|| format!("Failed to read {}", relative.display()))?;
            let source = String::from_utf8_lossy(&bytes);
            Ok(parser.parse(relative, &source))
        })
        .collect()
}
