//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const DEFAULT_CONFIG: &str = r#"# layer-guard configuration
#
# Layers group PHP classes through collectors; the ruleset lists which
# layers each layer may depend on. A layer may always depend on itself.

# Directories to analyze, relative to the project root passed to
# `layer-guard check` (default: the whole project root)
paths = ["src"]

# Glob patterns to exclude from analysis
exclude_files = ["src/Legacy/**", "**/*Test.php"]

# Report dependencies on project classes that belong to no layer
# ignore_uncovered_internal_classes = false

[[layers]]
name = "Controller"
collectors = [{ type = "directory", regex = "^src/Controller/" }]

[[layers]]
name = "Service"
collectors = [{ type = "directory", regex = "^src/Service/" }]

[[layers]]
name = "Repository"
collectors = [
    { type = "directory", regex = "^src/Repository/" },
    { type = "className", regex = "Repository$" },
]

[ruleset]
Controller = ["Service"]
Service = ["Repository"]
Repository = []

# Known violations to waive, source class -> target classes
# [skip_violations]
# "App\\Controller\\LegacyController" = ["App\\Repository\\UserRepository"]
"#;

/// Runs the init command.
pub fn run(force: bool) -> Result<()> {
    write_template(Path::new("layer-guard.toml"), force)?;

    println!("Created layer-guard.toml");
    println!("\nNext steps:");
    println!("  1. Edit [[layers]] and [ruleset] for your project");
    println!("  2. Run: layer-guard debug-layer");
    println!("  3. Run: layer-guard check");

    Ok(())
}

fn write_template(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(config_path, DEFAULT_CONFIG)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use layer_guard_core::Configuration;
    use tempfile::TempDir;

    #[test]
    fn template_is_a_valid_configuration() {
        let raw: serde_json::Value = toml::from_str(DEFAULT_CONFIG).unwrap();
        let config = Configuration::from_value(&raw).unwrap();
        assert_eq!(config.layers().len(), 3);
        assert!(config.ruleset().is_allowed("Controller", "Service"));
        assert!(!config.ruleset().is_allowed("Repository", "Service"));
    }

    #[test]
    fn existing_file_needs_force() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("layer-guard.toml");
        std::fs::write(&path, "# mine").unwrap();

        let error = write_template(&path, false).unwrap_err();
        assert!(error.to_string().contains("--force"));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# mine");

        write_template(&path, true).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), DEFAULT_CONFIG);
    }
}
