//! Dispatch configuration.
//!
//! Loads from environment variables with sensible defaults:
//!
//! | Variable              | Default   |
//! |-----------------------|-----------|
//! | `ENDPOINT_PREFIX`     | `/`       |
//! | `ENDPOINT_BODY_LIMIT` | `2097152` |

use serde::{Deserialize, Serialize};
use std::env;

/// Default largest accepted request body (2 MiB).
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Errors from [`DispatchConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The prefix is not an absolute path.
    #[error("endpoint prefix must start with '/', got {0:?}")]
    InvalidPrefix(String),

    /// A zero body limit would reject every request.
    #[error("endpoint body limit must be greater than zero")]
    ZeroBodyLimit,
}

/// Settings shared by every endpoint of a service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Path prefix the service's endpoints are mounted under
    pub prefix: String,
    /// Largest accepted request body in bytes; larger bodies are answered with 400
    pub body_limit: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefix: "/".to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }
}

impl DispatchConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`, which maps a variable name to its value.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            prefix: lookup("ENDPOINT_PREFIX").unwrap_or(defaults.prefix),
            body_limit: lookup("ENDPOINT_BODY_LIMIT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.body_limit),
        }
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] describing the first invalid setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.prefix.starts_with('/') {
            return Err(ConfigError::InvalidPrefix(self.prefix.clone()));
        }
        if self.body_limit == 0 {
            return Err(ConfigError::ZeroBodyLimit);
        }
        Ok(())
    }
}
