use std::fs::{create_dir_all, File, OpenOptions};
use std::path::Path;
use std::sync::{Arc, Mutex, OnceLock};

use thiserror::Error;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use storefront_config::{
    load_config, ConfigError, MenuConfig, ObservabilityConfig, SourceConfig, StoreSpec,
};
use storefront_core::overlay::OverlayStore;
use storefront_stores::{InMemoryOverlayStore, JsonFileOverlayStore};

use crate::engine::{EngineOptions, MenuEngine};
use crate::source::{CatalogSource, JsonFileCatalogSource, SourceError, StaticCatalogSource};

static TRACING_INIT: OnceLock<()> = OnceLock::new();

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("catalog fetch failed: {0}")]
    CatalogFetch(#[from] SourceError),
    #[error("unsupported catalog source: {0}")]
    UnsupportedSource(String),
    #[error("unsupported overlay store backend: {0}")]
    UnsupportedStore(String),
}

/// Load `storefront.yaml`, set up logging and start an engine from it.
pub async fn bootstrap_from_path(path: &Path) -> Result<MenuEngine, BootstrapError> {
    let config = load_config(path)?;
    bootstrap(&config).await
}

/// Start an engine from an already validated config.
pub async fn bootstrap(config: &MenuConfig) -> Result<MenuEngine, BootstrapError> {
    init_tracing_if_needed(&config.observability);
    tracing::info!(
        app = %config.app.name,
        environment = %config.app.environment,
        source = %config.source.kind,
        overlay_backend = %config.stores.overlay.backend,
        "bootstrapping storefront"
    );
    let source = build_catalog_source(&config.source)?;
    let store = build_overlay_store(&config.stores.overlay)?;
    MenuEngine::start(source, store, EngineOptions::from(config)).await
}

pub fn build_catalog_source(
    config: &SourceConfig,
) -> Result<Arc<dyn CatalogSource>, BootstrapError> {
    match config.kind.as_str() {
        "json_file" => {
            let path = config.path.as_deref().ok_or_else(|| {
                BootstrapError::UnsupportedSource("json_file without path".to_string())
            })?;
            Ok(Arc::new(JsonFileCatalogSource::new(path)))
        }
        "inline" => Ok(Arc::new(StaticCatalogSource::from_value(config.records.clone()))),
        other => Err(BootstrapError::UnsupportedSource(other.to_string())),
    }
}

pub fn build_overlay_store(spec: &StoreSpec) -> Result<Arc<dyn OverlayStore>, BootstrapError> {
    match spec.backend.as_str() {
        "in_memory" => Ok(Arc::new(InMemoryOverlayStore::new())),
        "json_file" => {
            let path = spec.path.as_deref().ok_or_else(|| {
                BootstrapError::UnsupportedStore("json_file without path".to_string())
            })?;
            Ok(Arc::new(JsonFileOverlayStore::new(path)))
        }
        other => Err(BootstrapError::UnsupportedStore(other.to_string())),
    }
}

/// Install the global subscriber once. Later calls are no-ops.
///
/// `RUST_LOG` wins over `observability.log_level`. Output goes to
/// `observability.log_file` when it can be opened, else to stderr.
pub fn init_tracing_if_needed(observability: &ObservabilityConfig) {
    TRACING_INIT.get_or_init(|| {
        let env_directive = std::env::var("RUST_LOG").ok();
        let filter = log_filter(&observability.log_level, env_directive.as_deref());
        let log_file = observability
            .log_file
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .and_then(open_log_file);
        let ansi = log_file.is_none();
        let writer = match log_file {
            Some(file) => BoxMakeWriter::new(Mutex::new(file)),
            None => BoxMakeWriter::new(std::io::stderr),
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(ansi)
            .with_writer(writer)
            .try_init();
    });
}

fn log_filter(level: &str, env_directive: Option<&str>) -> EnvFilter {
    env_directive
        .filter(|directive| !directive.trim().is_empty())
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .unwrap_or_else(|| EnvFilter::new(config_level(level)))
}

fn config_level(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}

fn open_log_file(path: &str) -> Option<File> {
    let path = Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(err) = create_dir_all(parent) {
            eprintln!("failed to create log directory '{}': {}", parent.display(), err);
            return None;
        }
    }
    match OpenOptions::new().create(true).append(true).open(path) {
        Ok(file) => Some(file),
        Err(err) => {
            eprintln!("failed to open log file '{}': {}", path.display(), err);
            None
        }
    }
}
