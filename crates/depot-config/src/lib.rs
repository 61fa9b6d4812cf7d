//! # Depot Config - Configuration Management
//!
//! Handles configuration loading from files and environment variables, and
//! resolves repository groups to named store connections.

#![deny(unsafe_code)]

use std::collections::HashMap;
use std::path::Path;

use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub store: StoreSettings,

    #[serde(default)]
    pub cache: CacheSettings,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_backend")]
    pub backend: String,

    /// When false, commits run without a store transaction. Backends without
    /// transaction support set this.
    #[serde(default = "default_transactions_enabled")]
    pub transactions_enabled: bool,

    /// Connection used when no group mapping applies.
    #[serde(default = "default_connection")]
    pub default_connection: String,

    /// Named connection strings.
    #[serde(default)]
    pub connections: HashMap<String, String>,

    /// Repository group to connection name.
    #[serde(default)]
    pub repository_groups: HashMap<String, String>,
}

fn default_backend() -> String {
    "memory".to_string()
}

fn default_transactions_enabled() -> bool {
    true
}

fn default_connection() -> String {
    "default".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,

    #[serde(default = "default_cache_max_capacity")]
    pub max_capacity: u64,

    #[serde(default = "default_cache_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_max_capacity() -> u64 {
    10_000
}

fn default_cache_ttl_seconds() -> u64 {
    300
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            transactions_enabled: default_transactions_enabled(),
            default_connection: default_connection(),
            connections: HashMap::new(),
            repository_groups: HashMap::new(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            max_capacity: default_cache_max_capacity(),
            ttl_seconds: default_cache_ttl_seconds(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            cache: CacheSettings::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Maps repository groups to connection names and connection names to
/// connection strings. Resolution is explicit; there is no process-global
/// connection registry.
#[derive(Debug, Clone)]
pub struct ConnectionResolver {
    default_connection: String,
    connections: HashMap<String, String>,
    repository_groups: HashMap<String, String>,
}

impl ConnectionResolver {
    pub fn new(settings: &StoreSettings) -> Self {
        Self {
            default_connection: settings.default_connection.clone(),
            connections: settings.connections.clone(),
            repository_groups: settings.repository_groups.clone(),
        }
    }

    /// Resolve a repository group to a connection string.
    ///
    /// An unmapped group, or no group at all, falls back to the default
    /// connection. A connection name without a configured string resolves to
    /// an empty string, which the memory backend ignores.
    pub fn resolve(&self, group: Option<&str>) -> &str {
        let name = group
            .and_then(|g| self.repository_groups.get(g))
            .map(String::as_str)
            .unwrap_or(&self.default_connection);

        self.connections.get(name).map(String::as_str).unwrap_or("")
    }
}

/// Load configuration from file and environment
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let builder = ConfigBuilder::builder()
        .add_source(File::from(path.as_ref()).required(false))
        .add_source(Environment::with_prefix("DEPOT").separator("__"))
        .build()?;

    builder.try_deserialize()
}

/// Load configuration with defaults
pub fn load_or_default<P: AsRef<Path>>(path: P) -> Config {
    load(path).unwrap_or_default()
}
