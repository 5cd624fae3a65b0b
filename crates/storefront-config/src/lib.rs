//! # Storefront Config
//!
//! Single-file configuration for storefront menus.
//! One `storefront.yaml` configures catalog rendering, the catalog source,
//! the overlay store, admin actors and observability settings.

mod loader;

pub use loader::{
    apply_env_overrides, apply_overrides, load_config, validate_config, ConfigError,
    ENV_FORCE_SEGMENT_SIZE, ENV_LOG_FILE, ENV_LOG_LEVEL,
};

use serde::Deserialize;

/// Top-level configuration schema.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuConfig {
    /// Config schema version.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub stores: StoresConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

fn default_version() -> u32 {
    1
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            app: AppConfig::default(),
            catalog: CatalogConfig::default(),
            source: SourceConfig::default(),
            stores: StoresConfig::default(),
            admin: AdminConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub name: String,
    #[serde(default = "default_env")]
    pub environment: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            environment: default_env(),
        }
    }
}

fn default_app_name() -> String {
    "storefront".to_string()
}

fn default_env() -> String {
    "development".to_string()
}

/// Rendering and tree-building knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Width of the page selector.
    #[serde(default = "default_page_window")]
    pub page_window: usize,
    /// Auto-descend bound.
    #[serde(default = "default_max_descend_depth")]
    pub max_descend_depth: usize,
    /// Forced hierarchy segment length; inferred when absent.
    #[serde(default)]
    pub segment_length: Option<usize>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            page_window: default_page_window(),
            max_descend_depth: default_max_descend_depth(),
            segment_length: None,
        }
    }
}

fn default_page_size() -> usize {
    12
}

fn default_page_window() -> usize {
    5
}

fn default_max_descend_depth() -> usize {
    32
}

/// Where catalog records come from.
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// `json_file` or `inline`.
    #[serde(default = "default_source_kind")]
    pub kind: String,
    /// Catalog API response dump, for `json_file`.
    #[serde(default)]
    pub path: Option<String>,
    /// Records or a whole response envelope, for `inline`.
    #[serde(default)]
    pub records: serde_json::Value,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: default_source_kind(),
            path: None,
            records: serde_json::Value::Null,
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

fn default_source_kind() -> String {
    "json_file".to_string()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

fn default_retry_max_delay_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StoresConfig {
    #[serde(default)]
    pub overlay: StoreSpec,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreSpec {
    /// `in_memory` or `json_file`.
    #[serde(default = "default_backend")]
    pub backend: String,
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for StoreSpec {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            path: None,
        }
    }
}

fn default_backend() -> String {
    "in_memory".to_string()
}

/// Actors allowed to use sort mode.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub actor_ids: Vec<i64>,
}

impl AdminConfig {
    pub fn is_admin(&self, actor_id: i64) -> bool {
        self.actor_ids.contains(&actor_id)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_file: Option<String>,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
