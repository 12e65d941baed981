// Retrace - Recorded Trace Debugger
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Configuration system for retrace
//!
//! Settings live in `~/.retrace.toml`, which is created with defaults the
//! first time it is loaded. Every field has a default, so partial files are
//! accepted.

use std::{
    fs,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::DEFAULT_TAB_WIDTH;

/// File name of the user configuration, placed in the home directory
pub const CONFIG_FILE_NAME: &str = ".retrace.toml";

/// Default JSON-RPC port
pub const DEFAULT_RPC_PORT: u16 = 3000;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetraceConfig {
    /// Stepping engine settings
    pub engine: EngineConfig,
    /// JSON-RPC server settings
    pub server: ServerConfig,
}

/// What `step_out` does when there is no enclosing call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopLevelStepOut {
    /// Keep the current position; the session stays active
    #[default]
    Stay,
    /// Treat it as running off the end of the trace
    Complete,
}

/// Stepping engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Columns a tab character counts for when measuring indentation
    pub tab_width: usize,
    /// Behavior of step-out at the top level
    pub top_level_step_out: TopLevelStepOut,
    /// Maximum number of visits kept for step-back (0 = unbounded)
    pub max_history: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tab_width: DEFAULT_TAB_WIDTH,
            top_level_step_out: TopLevelStepOut::default(),
            max_history: 0,
        }
    }
}

/// JSON-RPC server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind
    pub host: IpAddr,
    /// Port to bind (0 picks any free port)
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: IpAddr::V4(Ipv4Addr::LOCALHOST), port: DEFAULT_RPC_PORT }
    }
}

impl ServerConfig {
    /// Socket address to bind
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl RetraceConfig {
    /// Get the default configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home_dir =
            dirs::home_dir().ok_or_else(|| eyre::eyre!("Unable to determine home directory"))?;
        Ok(home_dir.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from `~/.retrace.toml`, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from an explicit path, creating it if missing
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            info!("Config file not found, creating default at {:?}", path);
            let default_config = Self::default();
            default_config.save_to(path)?;
            return Ok(default_config);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path:?}"))?;

        let config: Self =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        debug!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            toml::to_string_pretty(self).with_context(|| "Failed to serialize config to TOML")?;

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {path:?}"))?;

        debug!("Saved configuration to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = RetraceConfig::default();
        assert_eq!(config.engine.tab_width, 4);
        assert_eq!(config.engine.top_level_step_out, TopLevelStepOut::Stay);
        assert_eq!(config.engine.max_history, 0);
        assert_eq!(config.server.socket_addr().to_string(), "127.0.0.1:3000");
    }

    #[test]
    fn test_missing_file_is_created() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("retrace.toml");

        let config = RetraceConfig::load_from(&path).unwrap();
        assert_eq!(config, RetraceConfig::default());
        assert!(path.exists());

        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("[engine]"));
        assert!(content.contains("top_level_step_out = \"stay\""));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("retrace.toml");
        fs::write(&path, "[engine]\ntop_level_step_out = \"complete\"\n").unwrap();

        let config = RetraceConfig::load_from(&path).unwrap();
        assert_eq!(config.engine.top_level_step_out, TopLevelStepOut::Complete);
        assert_eq!(config.engine.tab_width, 4);
        assert_eq!(config.server, ServerConfig::default());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("retrace.toml");

        let mut config = RetraceConfig::default();
        config.engine.tab_width = 8;
        config.engine.max_history = 100;
        config.server.port = 0;
        config.save_to(&path).unwrap();

        assert_eq!(RetraceConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("retrace.toml");
        fs::write(&path, "[engine\ntab_width = ").unwrap();

        let err = RetraceConfig::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    #[serial]
    fn test_load_uses_home_directory() {
        let dir = TempDir::new().unwrap();
        let old_home = std::env::var_os("HOME");
        std::env::set_var("HOME", dir.path());

        let result = RetraceConfig::load();
        let expected_path = dir.path().join(CONFIG_FILE_NAME);

        match old_home {
            Some(home) => std::env::set_var("HOME", home),
            None => std::env::remove_var("HOME"),
        }

        assert_eq!(result.unwrap(), RetraceConfig::default());
        assert!(expected_path.exists());
    }
}
