// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! phonors - client library for the local phono media daemon.
//!
//! This crate provides the core functionality for the `phono` CLI: it talks
//! newline-delimited JSON to `phonod` over a Unix socket or named pipe,
//! starts the daemon when nothing is listening, and pairs with it to obtain
//! a bearer token.
//!
//! # Main Components
//!
//! - [`DaemonClient`] - typed commands over one connection, with push subscriptions
//! - [`Supervisor`] - spawns, health-checks and stops the daemon process
//! - [`AuthFlow`] - pairing and the stored token
//! - [`Poller`] / [`scan_library`] - waiting on long-running daemon work
//! - [`ClientConfig`] - settings from `config.toml` and the environment
//! - [`Error`] - error types for all operations
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use phonors::{ClientConfig, DaemonClient, Ownership, Supervisor, SupervisorOptions};
//!
//! let config = ClientConfig::load()?;
//! let client = Arc::new(DaemonClient::new(&config));
//! let supervisor = Supervisor::new(
//!     Arc::clone(&client),
//!     SupervisorOptions::from_config(&config, Ownership::Owned),
//! );
//! supervisor.ensure_running().await?;
//! let status = client.status().await?;
//! ```

mod cli;
mod commands;

pub mod auth;
pub mod client;
pub mod config;
pub mod connection;
pub mod credentials;
pub mod dispatch;
pub mod env;
pub mod error;
pub mod poll;
pub mod push;
pub mod scan;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
mod test_helpers;

pub use auth::{ApprovalPrompt, ApprovalRequest, AuthFlow, AuthState, AutoApprove};
pub use cli::{Cli, Command, ConfigCommand, DaemonCommand, OutputFormat};
pub use client::DaemonClient;
pub use commands::Session;
pub use config::ClientConfig;
pub use connection::ConnectionState;
pub use credentials::{TokenStore, TokenStoreKind};
pub use error::{Error, Result};
pub use poll::{PollStep, Poller};
pub use scan::scan_library;
pub use supervisor::{Ownership, Supervisor, SupervisorOptions, SupervisorState};
pub use transport::Endpoint;

use tracing::debug;

/// Load the client configuration for this invocation.
///
/// `--config` replaces the default location; `--socket` wins over both the
/// file and `PHONO_SOCKET`.
pub fn load_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = ClientConfig::load_from(path)?;
            config.apply_env();
            config
        }
        None => ClientConfig::load()?,
    };
    if let Some(socket) = &cli.socket {
        config.socket = Some(socket.clone());
    }
    Ok(config)
}

/// Execute a CLI invocation. This is the main entry point for library users
/// and provides a testable way to run commands without process execution.
///
/// One-shot commands leave any daemon they start running. `phono shell`
/// owns its daemon and stops it on exit.
pub async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;
    debug!(endpoint = %config.endpoint(), "loaded client config");

    match cli.command {
        Command::Shell => {
            let session = Session::open(config, Ownership::Owned)?;
            commands::shell::run(&session).await
        }
        command => {
            let session = Session::open(config, Ownership::Detached)?;
            commands::execute(&session, command).await
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
