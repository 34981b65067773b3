// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod daemon;
pub mod pair;
pub mod playback;
pub mod scan;
pub mod settings;
pub mod shell;
pub mod watch;

use std::sync::Arc;

use ph_ipc::Command as IpcCommand;
use serde::Serialize;

use crate::auth::{AuthFlow, AuthState};
use crate::cli::Command;
use crate::client::DaemonClient;
use crate::config::ClientConfig;
use crate::credentials::{open_store, TokenStore};
use crate::error::{Error, Result};
use crate::supervisor::{Ownership, Supervisor, SupervisorOptions};

/// Everything a command needs: the client, the supervisor that can start
/// its daemon, and the auth flow holding its token.
pub struct Session {
    config: ClientConfig,
    client: Arc<DaemonClient>,
    supervisor: Supervisor,
    auth: AuthFlow,
}

impl Session {
    /// Build a session from `config`. Nothing is connected yet.
    pub fn open(config: ClientConfig, ownership: Ownership) -> Result<Self> {
        let store = open_store(config.token_store)?;
        let options = SupervisorOptions::from_config(&config, ownership);
        Ok(Self::with_parts(config, options, store))
    }

    pub fn with_parts(
        config: ClientConfig,
        options: SupervisorOptions,
        store: Box<dyn TokenStore>,
    ) -> Self {
        let client = Arc::new(DaemonClient::new(&config));
        let supervisor = Supervisor::new(Arc::clone(&client), options);
        let auth = AuthFlow::new(Arc::clone(&client), store)
            .verify_after_approval(config.verify_after_approval);
        Self {
            config,
            client,
            supervisor,
            auth,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<DaemonClient> {
        &self.client
    }

    pub fn supervisor(&self) -> &Supervisor {
        &self.supervisor
    }

    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    /// Connect, starting the daemon if nothing is listening.
    pub async fn connect(&self) -> Result<()> {
        self.supervisor.ensure_running().await
    }

    /// Connect and attach the stored token, if the daemon accepts it.
    pub async fn ready(&self) -> Result<()> {
        self.connect().await?;
        if self.auth.state() != AuthState::Authenticated {
            self.auth.probe_stored_token().await;
        }
        Ok(())
    }
}

/// Run one command. `phono shell` is handled by the caller.
pub async fn execute(session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Status { output } => playback::status(session, output.output).await,
        Command::Play { path } => playback::send(session, IpcCommand::Play { path }).await,
        Command::Pause => playback::send(session, IpcCommand::Pause).await,
        Command::Resume => playback::send(session, IpcCommand::Resume).await,
        Command::Stop => playback::send(session, IpcCommand::Stop).await,
        Command::Next => playback::send(session, IpcCommand::Next).await,
        Command::Prev => playback::send(session, IpcCommand::Prev).await,
        Command::Queue { paths } => playback::send(session, IpcCommand::queue(paths)?).await,
        Command::Seek { position } => playback::send(session, IpcCommand::seek(position)?).await,
        Command::Volume { level } => playback::send(session, IpcCommand::volume(level)?).await,
        Command::Config(cmd) => settings::run(session, cmd).await,
        Command::Scan { paths, output } => scan::run(session, paths, output.output).await,
        Command::Pair { name, yes } => pair::pair(session, name, yes).await,
        Command::Logout => pair::logout(session),
        Command::Watch { count } => watch::run(session, count).await,
        Command::Daemon(cmd) => daemon::run(session, cmd).await,
        Command::Shell => Err(Error::Config("already in a shell session".to_string())),
    }
}

/// Print `value` as pretty JSON on stdout.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(all(test, unix))]
#[path = "mod_tests.rs"]
mod tests;
