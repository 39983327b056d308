//! Settings loaded from `config/config.toml` and `NAMESAKE__*` environment
//! variables.
//!
//! ```toml
//! [database]
//! url = "blog.sqlite"
//! log_queries = true
//!
//! [attributes]
//! locale = "en"
//! ```
//!
//! Environment variables override the file: `NAMESAKE__DATABASE__URL`,
//! `NAMESAKE__DATABASE__LOG_QUERIES`, `NAMESAKE__ATTRIBUTES__LOCALE`.

use crate::json_helpers::json_to_value;
use crate::value::Value;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "NAMESAKE";

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub database: DatabaseSettings,
    /// Read-only attributes shared by every entity and row of the context
    #[serde(default)]
    pub attributes: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatabaseSettings {
    /// SQLite path, or `:memory:`
    #[serde(default = "default_url")]
    pub url: String,
    /// Log statements at `info` instead of `debug`
    #[serde(default)]
    pub log_queries: bool,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: default_url(),
            log_queries: false,
        }
    }
}

fn default_url() -> String {
    ":memory:".to_string()
}

impl Settings {
    /// Load from `config/config.toml` (optional) and the environment.
    ///
    /// An unreadable config file is reported at `warn` and skipped.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if neither source yields valid settings.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Self::environment());

        let config = match builder.build() {
            Ok(config) => config,
            Err(err) => {
                if Path::new(CONFIG_FILE).exists() {
                    log::warn!("failed to load {CONFIG_FILE}, falling back to env: {err}");
                }
                Config::builder()
                    .add_source(Self::environment())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "failed to load configuration from file ({err}) and env ({env_err})"
                        ))
                    })?
            }
        };

        config.try_deserialize()
    }

    /// Parse settings from a TOML string (tests, embedded defaults).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for invalid TOML or mistyped values.
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    /// Shared attributes converted to [`Value`]s.
    pub fn attribute_values(&self) -> impl Iterator<Item = (String, Value)> + '_ {
        self.attributes
            .iter()
            .map(|(name, value)| (name.clone(), json_to_value(value)))
    }

    fn environment() -> Environment {
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
    }
}
