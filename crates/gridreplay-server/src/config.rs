// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of gridreplay.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Startup configuration (§1.1, §3.1): bind address, tick interval, default
//! speed, the named time-range table, and default battery/PV/pricing knobs.
//! Every field has a `serde(default = "…")` so a partial or absent TOML file
//! still produces a runnable configuration.

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use gridreplay_engine::EngineConfig;
use gridreplay_types::{BatteryConfig, PvConfig, SimulationConfig, TimeRange};
use serde::Deserialize;

use crate::error::StartupError;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub battery: Option<BatteryConfig>,
    #[serde(default)]
    pub pv: PvConfig,
    #[serde(default)]
    pub pricing: SimulationConfig,
    /// Named time-range table (`"all"`, `"current"`, …), resolved server-side.
    #[serde(default)]
    pub sources: HashMap<String, TimeRange>,
    #[serde(default)]
    pub fixture: FixtureSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_outbound_buffer_capacity")]
    pub outbound_buffer_capacity: usize,
    #[serde(default = "default_speed")]
    pub default_speed: f64,
    #[serde(default = "default_source")]
    pub default_source: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FixtureSettings {
    /// Path to a `SqliteDataSource`-shaped fixture database (§2.1). Absent
    /// means the bootstrap module seeds an in-memory demo dataset instead.
    #[serde(default)]
    pub sqlite_path: Option<String>,
}

fn default_bind_address() -> String {
    "0.0.0.0".to_owned()
}

fn default_port() -> u16 {
    8199
}

fn default_tick_interval_ms() -> u64 {
    100
}

fn default_outbound_buffer_capacity() -> usize {
    256
}

fn default_speed() -> f64 {
    3600.0
}

fn default_source() -> String {
    "all".to_owned()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_port(),
            tick_interval_ms: default_tick_interval_ms(),
            outbound_buffer_capacity: default_outbound_buffer_capacity(),
            default_speed: default_speed(),
            default_source: default_source(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            battery: None,
            pv: PvConfig::default(),
            pricing: SimulationConfig::default(),
            sources: HashMap::new(),
            fixture: FixtureSettings::default(),
        }
    }
}

impl ServerConfig {
    /// Loads from `path` if it exists; a missing file falls back to defaults
    /// (the fixture/bootstrap step, not this file, is what decides whether
    /// any sensors end up registered). A file that exists but fails to parse
    /// is Fatal.
    pub fn load(path: &Path) -> Result<Self, StartupError> {
        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::info!(path = %path.display(), "no config file found, using defaults");
            return Ok(Self::default());
        };
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.bind_address, self.server.port)
    }

    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            tick_interval: Duration::from_millis(self.server.tick_interval_ms),
            event_buffer_capacity: 256,
            default_speed: self.server.default_speed,
            named_ranges: self.sources.clone(),
            default_source: self.server.default_source.clone(),
            battery: self.battery.clone(),
            pv: self.pv.clone(),
            sim: self.pricing.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = ServerConfig::load(Path::new("/nonexistent/path.toml")).unwrap();
        assert_eq!(config.server.port, 8199);
    }

    #[test]
    fn malformed_toml_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "not = [valid").unwrap();
        assert!(matches!(
            ServerConfig::load(&path),
            Err(StartupError::ConfigParse(_))
        ));
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.toml");
        std::fs::write(&path, "[server]\nport = 9000\n").unwrap();
        let config = ServerConfig::load(&path).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.tick_interval_ms, 100);
    }
}
