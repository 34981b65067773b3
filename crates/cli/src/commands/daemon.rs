// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon management commands.
//!
//! Commands for starting and stopping the phonod process that serves this
//! user's socket.

use tracing::debug;

use crate::cli::DaemonCommand;
use crate::error::Result;

use super::Session;

pub async fn run(session: &Session, cmd: DaemonCommand) -> Result<()> {
    match cmd {
        DaemonCommand::Status => status(session).await,
        DaemonCommand::Start => start(session).await,
        DaemonCommand::Stop => stop(session).await,
        DaemonCommand::Restart => restart(session).await,
    }
}

/// Daemon pid, preferring the process this session owns.
async fn known_pid(session: &Session) -> Option<u32> {
    match session.supervisor().pid().await {
        Some(pid) => Some(pid),
        None => session.supervisor().recorded_pid(),
    }
}

/// Show daemon status. Never starts the daemon.
pub async fn status(session: &Session) -> Result<()> {
    let client = session.client();
    if !client.is_connected() {
        if let Err(e) = client.connect().await {
            debug!(error = %e, "daemon not reachable");
        }
    }

    if client.is_connected() {
        println!("Status: running");
    } else {
        println!("Status: not running");
    }
    println!("Endpoint: {}", client.endpoint());
    if let Some(pid) = known_pid(session).await {
        println!("PID: {}", pid);
    }
    println!("Connection: {}", client.status_string());
    Ok(())
}

/// Start the daemon unless one is already listening.
pub async fn start(session: &Session) -> Result<()> {
    let client = session.client();
    if client.is_connected() || client.connect().await.is_ok() {
        println!("Daemon already running at {}.", client.endpoint());
        return Ok(());
    }

    session.supervisor().start().await?;
    match session.supervisor().pid().await {
        Some(pid) => println!("Daemon started (PID {}).", pid),
        None => println!("Daemon started."),
    }
    Ok(())
}

/// Stop the daemon this session, or an earlier phono invocation, started.
pub async fn stop(session: &Session) -> Result<()> {
    let Some(pid) = known_pid(session).await else {
        let client = session.client();
        if client.is_connected() || client.connect().await.is_ok() {
            client.disconnect();
            println!(
                "Daemon at {} was not started by phono; not stopping it.",
                client.endpoint()
            );
        } else {
            println!("Daemon is not running.");
        }
        return Ok(());
    };

    session.supervisor().stop().await?;
    println!("Daemon stopped (PID {}).", pid);
    Ok(())
}

/// Restart a daemon phono started, or start one if none is listening.
pub async fn restart(session: &Session) -> Result<()> {
    if known_pid(session).await.is_none() {
        let client = session.client();
        if client.is_connected() || client.connect().await.is_ok() {
            client.disconnect();
            println!(
                "Daemon at {} was not started by phono; not restarting it.",
                client.endpoint()
            );
            return Ok(());
        }
        return start(session).await;
    }

    session.supervisor().restart().await?;
    match session.supervisor().pid().await {
        Some(pid) => println!("Daemon restarted (PID {}).", pid),
        None => println!("Daemon restarted."),
    }
    Ok(())
}
