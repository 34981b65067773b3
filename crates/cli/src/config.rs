// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration.
//!
//! Read from `$PHONO_CONFIG`, or `phono/config.toml` under the platform
//! config directory. A missing file means defaults. `PHONO_SOCKET` and
//! `PHONO_DAEMON_BINARY` override the file.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::TokenStoreKind;
use crate::env;
use crate::error::{Error, Result};
use crate::transport::Endpoint;

const CONFIG_DIR_NAME: &str = "phono";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Socket path or pipe name. Defaults to the per-user address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub socket: Option<String>,
    /// Explicit daemon executable, bypassing platform resolution.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daemon_binary: Option<PathBuf>,
    /// Directory holding `bin/<os>-<arch>/phonod`. Defaults to the directory
    /// of the running executable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_dir: Option<PathBuf>,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Connection attempts after spawning the daemon.
    pub startup_attempts: u32,
    /// Delay before each startup connection attempt.
    pub startup_backoff_ms: u64,
    /// Time allowed for graceful exit before the daemon is killed.
    pub stop_grace_ms: u64,
    /// Periodic `status` probe interval. 0 = disabled.
    pub health_interval_ms: u64,
    pub poll_interval_ms: u64,
    /// Upper bound on polled operations such as library scans. 0 = unbounded.
    pub poll_timeout_secs: u64,
    /// Confirm a token with a `status` probe after out-of-band approval.
    pub verify_after_approval: bool,
    /// Name presented to the daemon when pairing.
    pub client_name: String,
    /// Where the bearer token is kept.
    pub token_store: TokenStoreKind,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            socket: None,
            daemon_binary: None,
            resource_dir: None,
            connect_timeout_ms: 5_000,
            request_timeout_ms: 10_000,
            startup_attempts: 10,
            startup_backoff_ms: 500,
            stop_grace_ms: 5_000,
            health_interval_ms: 0,
            poll_interval_ms: 500,
            poll_timeout_secs: 0,
            verify_after_approval: true,
            client_name: "phono".to_string(),
            token_store: TokenStoreKind::Keyring,
        }
    }
}

impl ClientConfig {
    /// Load from the default location and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::config_path().or_else(default_path) {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env();
        Ok(config)
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {}", path.display(), e)))?;
        Self::parse(&content)
    }

    /// Parse and validate TOML content.
    pub fn parse(content: &str) -> Result<Self> {
        let config: ClientConfig = toml::from_str(content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.startup_attempts == 0 {
            return Err(Error::Config("startup_attempts must be at least 1".to_string()));
        }
        for (field, value) in [
            ("connect_timeout_ms", self.connect_timeout_ms),
            ("request_timeout_ms", self.request_timeout_ms),
            ("poll_interval_ms", self.poll_interval_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than 0", field)));
            }
        }
        if self.client_name.trim().is_empty() {
            return Err(Error::Config("client_name cannot be empty".to_string()));
        }
        Ok(())
    }

    /// Apply `PHONO_SOCKET` and `PHONO_DAEMON_BINARY`.
    pub fn apply_env(&mut self) {
        if let Some(socket) = env::socket() {
            self.socket = Some(socket);
        }
        if let Some(binary) = env::daemon_binary() {
            self.daemon_binary = Some(binary);
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        match &self.socket {
            Some(address) => Endpoint::parse(address),
            None => Endpoint::default_for_user(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn startup_backoff(&self) -> Duration {
        Duration::from_millis(self.startup_backoff_ms)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_millis(self.stop_grace_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn health_interval(&self) -> Option<Duration> {
        (self.health_interval_ms > 0).then(|| Duration::from_millis(self.health_interval_ms))
    }

    pub fn poll_timeout(&self) -> Option<Duration> {
        (self.poll_timeout_secs > 0).then(|| Duration::from_secs(self.poll_timeout_secs))
    }
}

/// `<config_dir>/phono/config.toml`, if the platform has a config dir.
pub fn default_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
