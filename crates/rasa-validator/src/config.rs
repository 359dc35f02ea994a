//! Validator configuration.
//!
//! Loaded from environment variables with defaults matching the RASA
//! draft's recommendations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default recursion bound for AS-SET expansion.
pub const DEFAULT_MAX_DEPTH: u32 = 10;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Validator configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Maximum nesting depth followed during expansion.
    pub max_depth: u32,

    /// Require delegated objects to fall inside the token's scope.
    pub enforce_delegation_scope: bool,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            enforce_delegation_scope: true,
        }
    }
}

impl ValidatorConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `RASA_MAX_DEPTH`: Expansion depth bound (default: 10)
    /// - `RASA_ENFORCE_DELEGATION_SCOPE`: Check token scope (default: true)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            max_depth: std::env::var("RASA_MAX_DEPTH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.max_depth),
            enforce_delegation_scope: std::env::var("RASA_ENFORCE_DELEGATION_SCOPE")
                .map(|s| s != "false" && s != "0")
                .unwrap_or(default.enforce_delegation_scope),
        }
    }

    /// Set the depth bound.
    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Turn delegation scope enforcement on or off.
    pub fn with_delegation_scope(mut self, enforce: bool) -> Self {
        self.enforce_delegation_scope = enforce;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == 0 {
            return Err(ConfigError::InvalidValue {
                key: "RASA_MAX_DEPTH".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
