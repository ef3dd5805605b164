//! Runtime configuration
//!
//! Layering, lowest precedence first: built-in defaults, an optional TOML
//! file, `HEROES_*` environment variables, then whatever the caller (the
//! CLI) sets explicitly.
//!
//! ```toml
//! [database]
//! path = "database.db"
//! acquire_timeout_ms = 5000
//! busy_timeout_ms = 5000
//! echo = false
//!
//! [pagination]
//! default_limit = 100
//! max_limit = 100
//!
//! [logging]
//! profile = "development"
//! ```

#![allow(clippy::result_large_err)]

use heroes_core::errors::{ExError, ExErrorKind};
use heroes_core::logging_facility::Profile;
use heroes_store::errors::Result;
use heroes_store::{Engine, EngineOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_DB_PATH: &str = "HEROES_DB_PATH";
pub const ENV_LOG_PROFILE: &str = "HEROES_LOG_PROFILE";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub acquire_timeout_ms: u64,
    pub busy_timeout_ms: u64,
    pub echo: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("database.db"),
            acquire_timeout_ms: 5000,
            busy_timeout_ms: 5000,
            echo: false,
        }
    }
}

/// Read-many paging bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 100,
        }
    }
}

impl PaginationConfig {
    /// Effective limit: the requested one (or the default), clamped to the max
    pub fn effective_limit(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.default_limit).min(self.max_limit)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub profile: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            profile: "development".to_string(),
        }
    }
}

impl Config {
    /// Parse and validate a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            config_error("parse_config", format!("Invalid configuration: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from an optional file, then apply environment overrides
    ///
    /// A missing `path` means defaults; a path that cannot be read is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|e| {
                    config_error(
                        "load_config",
                        format!("Cannot read config file {}: {}", path.display(), e),
                    )
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.with_env_overrides(|key| std::env::var(key).ok())
    }

    /// Apply `HEROES_DB_PATH` and `HEROES_LOG_PROFILE` from `lookup`
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            self.database.path = PathBuf::from(path);
        }
        if let Some(profile) = lookup(ENV_LOG_PROFILE) {
            self.logging.profile = profile;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.database.path.as_os_str().is_empty() {
            return Err(config_error("validate_config", "database.path must not be empty")
                .with_field("database.path"));
        }
        if self.pagination.max_limit == 0 {
            return Err(config_error("validate_config", "pagination.max_limit must be at least 1")
                .with_field("pagination.max_limit"));
        }
        if self.pagination.default_limit > self.pagination.max_limit {
            return Err(config_error(
                "validate_config",
                format!(
                    "pagination.default_limit ({}) exceeds pagination.max_limit ({})",
                    self.pagination.default_limit, self.pagination.max_limit
                ),
            )
            .with_field("pagination.default_limit"));
        }
        self.log_profile().map(|_| ())
    }

    pub fn log_profile(&self) -> Result<Profile> {
        self.logging.profile.parse::<Profile>().map_err(|reason| {
            config_error("validate_config", reason).with_field("logging.profile")
        })
    }

    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            acquire_timeout: Duration::from_millis(self.database.acquire_timeout_ms),
            busy_timeout: Duration::from_millis(self.database.busy_timeout_ms),
            echo: self.database.echo,
        }
    }

    /// Open the configured database and make sure the schema exists
    pub fn open_engine(&self) -> Result<Engine> {
        let engine = Engine::open(&self.database.path, self.engine_options())?;
        engine.ensure_schema()?;
        Ok(engine)
    }
}

fn config_error(op: &str, message: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Config)
        .with_op(op)
        .with_message(message)
}
