//! Configuration loading.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::MenuConfig;

/// Forces the hierarchy segment length, bypassing inference.
pub const ENV_FORCE_SEGMENT_SIZE: &str = "STOREFRONT_FORCE_SEGMENT_SIZE";
pub const ENV_LOG_LEVEL: &str = "STOREFRONT_LOG_LEVEL";
pub const ENV_LOG_FILE: &str = "STOREFRONT_LOG_FILE";

const SOURCE_KINDS: [&str; 2] = ["json_file", "inline"];
const STORE_BACKENDS: [&str; 2] = ["in_memory", "json_file"];

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Load configuration from a YAML file.
///
/// Relative `source.path` and `stores.overlay.path` resolve against the
/// directory of the config file. Environment overrides apply before validation.
pub fn load_config(path: &Path) -> Result<MenuConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: MenuConfig = serde_yaml::from_str(&content)?;
    if let Some(base) = path.parent() {
        resolve_paths(&mut config, base);
    }
    apply_env_overrides(&mut config)?;
    validate_config(&config)?;
    debug!(path = %path.display(), app = %config.app.name, "config loaded");
    Ok(config)
}

/// Apply `STOREFRONT_*` environment overrides.
pub fn apply_env_overrides(config: &mut MenuConfig) -> Result<(), ConfigError> {
    apply_overrides(config, |key| std::env::var(key).ok())
}

/// Apply overrides from any key lookup; empty values are ignored.
pub fn apply_overrides<F>(config: &mut MenuConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };
    if let Some(raw) = read(ENV_FORCE_SEGMENT_SIZE) {
        let size = raw.parse::<usize>().map_err(|_| {
            ConfigError::Invalid(format!(
                "{ENV_FORCE_SEGMENT_SIZE} must be a positive integer, got '{raw}'"
            ))
        })?;
        config.catalog.segment_length = Some(size);
    }
    if let Some(level) = read(ENV_LOG_LEVEL) {
        config.observability.log_level = level;
    }
    if let Some(file) = read(ENV_LOG_FILE) {
        config.observability.log_file = Some(file);
    }
    Ok(())
}

pub fn validate_config(config: &MenuConfig) -> Result<(), ConfigError> {
    if config.version == 0 {
        return Err(ConfigError::Invalid(
            "version must be greater than 0".to_string(),
        ));
    }

    if config.app.name.trim().is_empty() {
        return Err(ConfigError::Invalid(
            "app.name must not be empty".to_string(),
        ));
    }

    let catalog = &config.catalog;
    if catalog.page_size == 0 {
        return Err(ConfigError::Invalid(
            "catalog.page_size must be > 0".to_string(),
        ));
    }
    if catalog.page_window == 0 {
        return Err(ConfigError::Invalid(
            "catalog.page_window must be > 0".to_string(),
        ));
    }
    if catalog.max_descend_depth == 0 {
        return Err(ConfigError::Invalid(
            "catalog.max_descend_depth must be > 0".to_string(),
        ));
    }
    if catalog.segment_length == Some(0) {
        return Err(ConfigError::Invalid(
            "catalog.segment_length must be > 0 when set".to_string(),
        ));
    }

    let source = &config.source;
    if !SOURCE_KINDS.contains(&source.kind.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "source.kind '{}' is not one of {:?}",
            source.kind, SOURCE_KINDS
        )));
    }
    if source.kind == "json_file" && is_blank(source.path.as_deref()) {
        return Err(ConfigError::Invalid(
            "source.path is required for json_file source".to_string(),
        ));
    }
    if source.max_attempts == 0 {
        return Err(ConfigError::Invalid(
            "source.max_attempts must be > 0".to_string(),
        ));
    }

    let overlay = &config.stores.overlay;
    if !STORE_BACKENDS.contains(&overlay.backend.as_str()) {
        return Err(ConfigError::Invalid(format!(
            "stores.overlay.backend '{}' is not one of {:?}",
            overlay.backend, STORE_BACKENDS
        )));
    }
    if overlay.backend == "json_file" && is_blank(overlay.path.as_deref()) {
        return Err(ConfigError::Invalid(
            "stores.overlay.path is required for json_file backend".to_string(),
        ));
    }

    Ok(())
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn resolve_paths(config: &mut MenuConfig, base: &Path) {
    for slot in [&mut config.source.path, &mut config.stores.overlay.path] {
        if let Some(path) = slot.as_mut() {
            let candidate = PathBuf::from(path.as_str());
            if candidate.is_relative() && !path.trim().is_empty() {
                *path = base.join(candidate).to_string_lossy().into_owned();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn valid() -> MenuConfig {
        let mut config = MenuConfig::default();
        config.source.path = Some("catalog.json".to_string());
        config
    }

    #[test]
    fn test_validate_config_accepts_defaults_with_source_path() {
        assert!(validate_config(&valid()).is_ok());
    }

    #[test]
    fn test_validate_config_rejects_bad_values() {
        let mut config = valid();
        config.catalog.page_size = 0;
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));

        let mut config = valid();
        config.catalog.segment_length = Some(0);
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));

        let mut config = valid();
        config.source.path = None;
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));

        let mut config = valid();
        config.stores.overlay.backend = "redis".to_string();
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));

        let mut config = valid();
        config.stores.overlay.backend = "json_file".to_string();
        assert!(matches!(validate_config(&config), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_inline_source_needs_no_path() {
        let mut config = MenuConfig::default();
        config.source.kind = "inline".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_overrides_replace_config_values() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_FORCE_SEGMENT_SIZE, "3"),
            (ENV_LOG_LEVEL, "debug"),
            (ENV_LOG_FILE, "  "),
        ]);
        let mut config = valid();
        apply_overrides(&mut config, |key| env.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.catalog.segment_length, Some(3));
        assert_eq!(config.observability.log_level, "debug");
        assert_eq!(config.observability.log_file, None);

        let bad: HashMap<&str, &str> = HashMap::from([(ENV_FORCE_SEGMENT_SIZE, "two")]);
        let err = apply_overrides(&mut config, |key| bad.get(key).map(|v| v.to_string()));
        assert!(matches!(err, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_config_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("storefront.yaml");
        let mut file = fs::File::create(&path).unwrap();
        writeln!(
            file,
            "version: 1\ncatalog:\n  page_size: 8\nsource:\n  kind: json_file\n  path: data/catalog.json\nstores:\n  overlay:\n    backend: json_file\n    path: /var/lib/storefront/overlays.json\n"
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.catalog.page_size, 8);
        assert_eq!(
            config.source.path.as_deref().map(PathBuf::from),
            Some(dir.path().join("data/catalog.json"))
        );
        assert_eq!(
            config.stores.overlay.path.as_deref(),
            Some("/var/lib/storefront/overlays.json")
        );
    }

    #[test]
    fn test_load_config_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "catalog: [unclosed").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Parse(_))));
    }
}
