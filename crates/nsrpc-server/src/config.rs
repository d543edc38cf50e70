//! Server configuration
//!
//! Loaded from TOML or assembled through [`crate::ServerBuilder`]. The
//! namespace map binds namespace names to handler type names registered in
//! the [`crate::HandlerCatalog`].

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Namespace used when the request path carries no usable hint
pub const DEFAULT_NAMESPACE: &str = "system";

/// TTL applied by [`crate::HandlerContext::enable_default_cache`]
pub const DEFAULT_HANDLER_CACHE_TTL: u32 = 60;

/// Errors raised while loading configuration or building a server
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid namespace name '{0}': expected a letter followed by letters or digits")]
    InvalidNamespace(String),

    #[error("invalid schema for {location}: {reason}")]
    InvalidSchema { location: String, reason: String },

    #[error("configuration errors:\n{}", .0.join("\n"))]
    Validation(Vec<String>),
}

/// Server-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Base URL used to build schema and namespace URLs; always ends with `/`
    pub server_url: String,
    /// Namespace used when the request carries no valid hint
    pub default_namespace: String,
    /// Cache TTL in seconds when no handler chose one
    pub default_cache_ttl: u32,
    /// Namespace name to handler type name
    pub namespaces: BTreeMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost/".to_string(),
            default_namespace: DEFAULT_NAMESPACE.to_string(),
            default_cache_ttl: 0,
            namespaces: BTreeMap::from([(
                DEFAULT_NAMESPACE.to_string(),
                crate::system::SYSTEM_HANDLER_TYPE.to_string(),
            )]),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let mut config: ServerConfig = toml::from_str(source)?;
        config.normalize();
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Ensure the server URL ends with a single trailing slash
    pub fn normalize(&mut self) {
        if !self.server_url.ends_with('/') {
            self.server_url.push('/');
        }
    }

    /// Check every namespace name, collecting all problems
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if !is_valid_namespace(&self.default_namespace) {
            errors.push(format!(
                "default namespace '{}' is not a valid namespace name",
                self.default_namespace
            ));
        }
        for (namespace, type_name) in &self.namespaces {
            if !is_valid_namespace(namespace) {
                errors.push(format!("namespace '{}' is not a valid namespace name", namespace));
            }
            if type_name.trim().is_empty() {
                errors.push(format!("namespace '{}' has an empty handler type", namespace));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

fn namespace_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9]+$").ok())
        .as_ref()
}

/// Namespace names are a letter followed by at least one letter or digit
pub fn is_valid_namespace(name: &str) -> bool {
    namespace_pattern().is_some_and(|pattern| pattern.is_match(name))
}

/// Turn a path hint such as `/math/` into a namespace, falling back to `default`
pub fn resolve_namespace(hint: Option<&str>, default: &str) -> String {
    hint.map(|h| h.trim_matches('/'))
        .filter(|h| is_valid_namespace(h))
        .map(str::to_string)
        .unwrap_or_else(|| default.to_string())
}
