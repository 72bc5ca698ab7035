//! Locating and reading the configuration file.
//!
//! The first existing candidate wins:
//!
//! 1. `--config <FILE>`
//! 2. the project directory: `layer-guard.toml`, `.layer-guard.toml`,
//!    `layer-guard.json`
//! 3. the global directory (`$LAYER_GUARD_CONFIG_DIR`, else `~/.layer-guard/`):
//!    `config.toml`, `config.json`
//!
//! Both formats are read into the same `serde_json::Value` tree, which the
//! core validates.

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML, the default for any extension other than `.json`.
    Toml,
    /// JSON.
    Json,
}

impl ConfigFormat {
    /// Picks the format from the file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Toml,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    fn parse(self, content: &str) -> Result<Value> {
        match self {
            Self::Toml => Ok(toml::from_str(content)?),
            Self::Json => Ok(serde_json::from_str(content)?),
        }
    }
}

/// Where the configuration was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Given with `--config`.
    Explicit(PathBuf),
    /// Found in the project directory.
    Project(PathBuf),
    /// Found in the global config directory.
    Global(PathBuf),
    /// Nothing found.
    Default,
}

impl ConfigSource {
    /// Returns the resolved path, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Project(p) | Self::Global(p) => Some(p),
            Self::Default => None,
        }
    }

    /// Returns `true` if the config came from the global directory.
    #[must_use]
    pub fn is_global(&self) -> bool {
        matches!(self, Self::Global(_))
    }
}

const PROJECT_CONFIG_NAMES: &[&str] =
    &["layer-guard.toml", ".layer-guard.toml", "layer-guard.json"];

const GLOBAL_CONFIG_NAMES: &[&str] = &["config.toml", "config.json"];

/// Resolves the configuration file for `project_dir`.
#[must_use]
pub fn resolve(project_dir: &Path, explicit: Option<&Path>) -> ConfigSource {
    resolve_in(project_dir, explicit, global_config_dir().as_deref())
}

/// Same as [`resolve`] with the global directory passed in, so tests do not
/// touch the environment.
fn resolve_in(
    project_dir: &Path,
    explicit: Option<&Path>,
    global_dir: Option<&Path>,
) -> ConfigSource {
    if let Some(path) = explicit {
        return ConfigSource::Explicit(path.to_path_buf());
    }
    if let Some(path) = first_existing(project_dir, PROJECT_CONFIG_NAMES) {
        tracing::debug!("Found project config: {}", path.display());
        return ConfigSource::Project(path);
    }
    if let Some(path) = global_dir.and_then(|dir| first_existing(dir, GLOBAL_CONFIG_NAMES)) {
        tracing::debug!("Found global config: {}", path.display());
        return ConfigSource::Global(path);
    }
    ConfigSource::Default
}

fn first_existing(dir: &Path, names: &[&str]) -> Option<PathBuf> {
    names
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// `$LAYER_GUARD_CONFIG_DIR`, else `~/.layer-guard`.
#[must_use]
pub fn global_config_dir() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os("LAYER_GUARD_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".layer-guard"))
}

/// Reads a configuration file into the raw value tree, choosing the parser
/// with [`ConfigFormat::from_path`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or does not parse.
pub fn read_raw(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let format = ConfigFormat::from_path(path);
    format
        .parse(&content)
        .with_context(|| format!("Invalid {} in {}", format.name(), path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    const TOML: &str = "paths = [\"src\"]\n\n[ruleset]\nController = [\"Service\"]\n";
    const JSON: &str = r#"{ "paths": ["src"], "ruleset": { "Controller": ["Service"] } }"#;

    #[test]
    fn format_follows_the_extension() {
        let format = |path: &str| ConfigFormat::from_path(Path::new(path));
        assert_eq!(format("a/layer-guard.json"), ConfigFormat::Json);
        assert_eq!(format("CONFIG.JSON"), ConfigFormat::Json);
        assert_eq!(format(".layer-guard.toml"), ConfigFormat::Toml);
        assert_eq!(format("layer-guard"), ConfigFormat::Toml);
    }

    #[test]
    fn explicit_path_is_taken_as_given() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("layer-guard.toml"), TOML).unwrap();

        let result = resolve_in(project.path(), Some(Path::new("/missing/rules.json")), None);
        assert_eq!(result, ConfigSource::Explicit(PathBuf::from("/missing/rules.json")));
    }

    #[test]
    fn toml_project_file_is_preferred_over_json() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("layer-guard.json"), JSON).unwrap();
        assert_eq!(
            resolve_in(project.path(), None, None),
            ConfigSource::Project(project.path().join("layer-guard.json"))
        );

        fs::write(project.path().join(".layer-guard.toml"), TOML).unwrap();
        assert_eq!(
            resolve_in(project.path(), None, None),
            ConfigSource::Project(project.path().join(".layer-guard.toml"))
        );
    }

    #[test]
    fn directory_named_like_a_config_is_ignored() {
        let project = TempDir::new().unwrap();
        fs::create_dir(project.path().join("layer-guard.toml")).unwrap();
        assert_eq!(resolve_in(project.path(), None, None), ConfigSource::Default);
    }

    #[test]
    fn global_json_is_used_without_a_project_file() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        fs::write(global.path().join("config.json"), JSON).unwrap();

        let result = resolve_in(project.path(), None, Some(global.path()));
        assert_eq!(result, ConfigSource::Global(global.path().join("config.json")));
        assert!(result.is_global());

        fs::write(project.path().join("layer-guard.toml"), TOML).unwrap();
        let result = resolve_in(project.path(), None, Some(global.path()));
        assert!(matches!(result, ConfigSource::Project(_)));
    }

    #[test]
    fn nothing_found_has_no_path() {
        let project = TempDir::new().unwrap();
        let global = TempDir::new().unwrap();
        let result = resolve_in(project.path(), None, Some(global.path()));
        assert_eq!(result, ConfigSource::Default);
        assert!(result.path().is_none());
    }

    #[test]
    fn toml_and_json_files_read_to_the_same_tree() {
        let tmp = TempDir::new().unwrap();
        let toml_path = tmp.path().join("layer-guard.toml");
        let json_path = tmp.path().join("layer-guard.json");
        fs::write(&toml_path, TOML).unwrap();
        fs::write(&json_path, JSON).unwrap();

        let expected = json!({ "paths": ["src"], "ruleset": { "Controller": ["Service"] } });
        assert_eq!(read_raw(&toml_path).unwrap(), expected);
        assert_eq!(read_raw(&json_path).unwrap(), expected);
    }

    #[test]
    fn parse_errors_name_the_format_and_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.json");
        fs::write(&path, TOML).unwrap();

        let error = format!("{:#}", read_raw(&path).unwrap_err());
        assert!(error.contains("Invalid JSON"), "{error}");
        assert!(error.contains("broken.json"), "{error}");
    }
}
