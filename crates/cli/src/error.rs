// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use ph_ipc::{ShapeError, ValidationError};
use thiserror::Error;

/// All possible errors that can occur in the phonors library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    // Transport
    #[error("cannot connect to daemon at {endpoint}: {reason}\n  hint: run 'phono daemon start' or check that phonod is installed")]
    Connection { endpoint: String, reason: String },

    #[error("failed to write request: {0}")]
    Write(#[source] std::io::Error),

    #[error("disconnected from daemon")]
    Disconnected,

    // Protocol
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("{0}")]
    InvalidResponse(#[from] ShapeError),

    #[error("invalid argument: {0}")]
    Validation(#[from] ValidationError),

    #[error("request '{command}' timed out after {}ms", timeout.as_millis())]
    RequestTimeout {
        command: &'static str,
        timeout: Duration,
    },

    #[error("daemon error: {0}")]
    Daemon(String),

    // Auth
    #[error("authentication failed: {0}\n  hint: run 'phono pair' to pair this client")]
    Auth(String),

    #[error("pairing cancelled")]
    PairingCancelled,

    #[error("credential store error: {0}")]
    Credential(String),

    // Process lifecycle
    #[error("daemon binary not found at {}\n  hint: set PHONO_DAEMON_BINARY or daemon_binary in the config file", path.display())]
    MissingBinary { path: PathBuf },

    #[error("failed to launch daemon {}: {source}", binary.display())]
    Launch {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("daemon exited during startup ({status})")]
    DaemonExited { status: String },

    #[error("daemon did not accept connections after {attempts} attempts ({}ms)\n  hint: check the daemon log output with RUST_LOG=phonod=info", waited.as_millis())]
    StartupTimeout { attempts: u32, waited: Duration },

    // Long-running operations
    #[error("scan failed: {0}")]
    ScanFailed(String),

    #[error("{operation} did not finish within {}s", timeout.as_secs())]
    PollTimeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("config error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error came from the wire protocol rather than the
    /// transport or the caller.
    pub fn is_protocol(&self) -> bool {
        matches!(self, Error::Protocol(_) | Error::InvalidResponse(_))
    }
}

/// A specialized Result type for phonors operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
