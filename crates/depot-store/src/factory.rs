//! Backend selection.

use std::fmt;
use std::str::FromStr;

use depot_types::StoreError;

/// Supported store backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// Process-local in-memory backend.
    Memory,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Memory => "memory",
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendType {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(BackendType::Memory),
            other => Err(StoreError::Internal(format!(
                "unknown store backend: {other}"
            ))),
        }
    }
}

/// Connection settings for a single store backend.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: BackendType,
    /// Driver-specific connection string. Ignored by the memory backend.
    pub connection_string: String,
}

impl StoreConfig {
    /// Config for the in-memory backend.
    pub fn memory() -> Self {
        Self {
            backend: BackendType::Memory,
            connection_string: String::new(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::memory()
    }
}
