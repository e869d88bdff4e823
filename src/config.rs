//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every field has a default, so a partial file (or none at all) still
//! yields a usable configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::info;

use crate::types::{AccrualMode, ViewDeckError};

/// Environment variable that overrides the config file path.
pub const CONFIG_PATH_ENV: &str = "VIEWDECK_CONFIG";

/// Default config file path.
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub simulation: SimulationConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8888,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SimulationConfig {
    /// Sleep between loop sweeps.
    pub tick_interval_ms: u64,
    /// `times` used when a start request omits it.
    pub default_times: u32,
    /// `watch_duration` used when a start request omits it.
    pub default_watch_duration_secs: u64,
    /// Upper bound accepted for `times`.
    pub max_tabs: u32,
    pub accrual: AccrualMode,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            default_times: 1,
            default_watch_duration_secs: 30,
            max_tabs: 500,
            accrual: AccrualMode::SingleSweep,
        }
    }
}

impl SimulationConfig {
    /// Never shorter than 1 ms, so the loop always yields between sweeps.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn validate(&self) -> Result<(), ViewDeckError> {
        if self.tick_interval_ms == 0 {
            return Err(ViewDeckError::Config(
                "simulation.tick_interval_ms must be at least 1".into(),
            ));
        }
        if self.max_tabs == 0 {
            return Err(ViewDeckError::Config("simulation.max_tabs must be at least 1".into()));
        }
        Ok(())
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.simulation.validate()?;
        Ok(config)
    }

    /// Load from `$VIEWDECK_CONFIG` or `config.toml`, falling back to
    /// defaults when the file does not exist.
    pub fn load_or_default() -> Result<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        if !Path::new(&path).exists() {
            info!(path = %path, "No config file found, using defaults");
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    /// Socket address string for the dashboard listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
