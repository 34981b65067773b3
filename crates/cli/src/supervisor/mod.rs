// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle.
//!
//! The [`Supervisor`] owns at most one [`DaemonProcess`] and is the only
//! component that starts or stops it. Connections go through the shared
//! [`DaemonClient`]; the supervisor asks it to connect and disconnect but never
//! touches the socket itself.

pub mod binary;
mod health;
mod pidfile;
mod process;

use std::fmt;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::client::DaemonClient;
use crate::config::ClientConfig;
use crate::error::{Error, Result};

pub use health::{HealthCounters, HealthProbe};
pub use pidfile::PidFile;
pub use process::{DaemonProcess, DiagnosticSink, OutputStream, Ownership, TracingSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Stopped,
    Starting,
    Running,
    Stopping,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SupervisorState::Stopped => "stopped",
            SupervisorState::Starting => "starting",
            SupervisorState::Running => "running",
            SupervisorState::Stopping => "stopping",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub binary: PathBuf,
    pub startup_attempts: u32,
    pub startup_backoff: Duration,
    pub stop_grace: Duration,
    pub health_interval: Option<Duration>,
    pub ownership: Ownership,
    /// Where detached daemons record their pid.
    pub pid_file: Option<PidFile>,
}

impl SupervisorOptions {
    pub fn from_config(config: &ClientConfig, ownership: Ownership) -> Self {
        Self {
            binary: binary::resolve_daemon_binary(config),
            startup_attempts: config.startup_attempts,
            startup_backoff: config.startup_backoff(),
            stop_grace: config.stop_grace(),
            health_interval: config.health_interval(),
            ownership,
            pid_file: PidFile::default_location(),
        }
    }
}

/// State plus a counter bumped by every start and stop, so an exit observer
/// from an older process cannot overwrite a newer lifecycle.
#[derive(Debug)]
struct Lifecycle {
    generation: u64,
    state: SupervisorState,
}

pub struct Supervisor {
    client: Arc<DaemonClient>,
    options: SupervisorOptions,
    sink: Arc<dyn DiagnosticSink>,
    lifecycle: Arc<Mutex<Lifecycle>>,
    process: tokio::sync::Mutex<Option<DaemonProcess>>,
    health: Mutex<Option<HealthProbe>>,
}

impl Supervisor {
    pub fn new(client: Arc<DaemonClient>, options: SupervisorOptions) -> Self {
        Self::with_sink(client, options, Arc::new(TracingSink))
    }

    pub fn with_sink(
        client: Arc<DaemonClient>,
        options: SupervisorOptions,
        sink: Arc<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            client,
            options,
            sink,
            lifecycle: Arc::new(Mutex::new(Lifecycle {
                generation: 0,
                state: SupervisorState::Stopped,
            })),
            process: tokio::sync::Mutex::new(None),
            health: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &Arc<DaemonClient> {
        &self.client
    }

    pub fn options(&self) -> &SupervisorOptions {
        &self.options
    }

    pub fn state(&self) -> SupervisorState {
        self.lifecycle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .state
    }

    /// Pid of the process this supervisor spawned, while it is alive.
    pub async fn pid(&self) -> Option<u32> {
        let slot = self.process.lock().await;
        slot.as_ref().filter(|p| p.is_alive()).and_then(|p| p.pid())
    }

    /// Pid of a detached daemon recorded by an earlier client.
    pub fn recorded_pid(&self) -> Option<u32> {
        self.options.pid_file.as_ref().and_then(PidFile::live_pid)
    }

    /// Whether this supervisor holds a live process.
    pub async fn owns_process(&self) -> bool {
        let slot = self.process.lock().await;
        slot.as_ref().is_some_and(|p| p.is_alive())
    }

    fn begin(&self, state: SupervisorState) -> u64 {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        lifecycle.generation += 1;
        lifecycle.state = state;
        lifecycle.generation
    }

    fn transition(&self, generation: u64, state: SupervisorState) {
        let mut lifecycle = self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
        if lifecycle.generation == generation {
            lifecycle.state = state;
        }
    }

    /// Spawn the daemon and connect to it.
    pub async fn start(&self) -> Result<()> {
        let mut slot = self.process.lock().await;
        self.start_locked(&mut slot).await
    }

    async fn start_locked(&self, slot: &mut Option<DaemonProcess>) -> Result<()> {
        if slot.as_ref().is_some_and(|p| p.is_alive()) && self.client.is_connected() {
            debug!("daemon already running");
            return Ok(());
        }
        // Exited handle, or a live one we lost the connection to.
        if let Some(stale) = slot.take() {
            self.shutdown(stale).await;
        }

        let path = &self.options.binary;
        if !path.is_file() {
            return Err(Error::MissingBinary { path: path.clone() });
        }

        let generation = self.begin(SupervisorState::Starting);
        let lifecycle = Arc::clone(&self.lifecycle);
        let on_exit = move |status: Option<ExitStatus>| {
            let mut lifecycle = lifecycle.lock().unwrap_or_else(PoisonError::into_inner);
            if lifecycle.generation == generation {
                if lifecycle.state == SupervisorState::Running {
                    warn!(status = %describe_exit(status), "daemon exited unexpectedly");
                }
                lifecycle.state = SupervisorState::Stopped;
            }
        };

        let mut process = match DaemonProcess::spawn(
            path,
            &[binary::VERBOSE_FLAG],
            self.options.ownership,
            Arc::clone(&self.sink),
            on_exit,
        ) {
            Ok(process) => process,
            Err(e) => {
                self.transition(generation, SupervisorState::Stopped);
                return Err(e);
            }
        };

        match self.connect_with_retry(&mut process).await {
            Ok(()) => {
                info!(pid = process.pid(), "daemon running");
                self.record_pid(&process);
                self.transition(generation, SupervisorState::Running);
                *slot = Some(process);
                self.start_health_probe();
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "daemon failed to start");
                process.kill();
                process.wait_exit(self.options.stop_grace).await;
                self.transition(generation, SupervisorState::Stopped);
                Err(e)
            }
        }
    }

    async fn connect_with_retry(&self, process: &mut DaemonProcess) -> Result<()> {
        let attempts = self.options.startup_attempts.max(1);
        let backoff = self.options.startup_backoff;

        for attempt in 1..=attempts {
            tokio::time::sleep(backoff).await;
            if !process.is_alive() {
                return Err(Error::DaemonExited {
                    status: describe_exit(process.exit_status()),
                });
            }
            self.client.set_connect_attempt(attempt);
            match self.client.connect().await {
                Ok(()) => return Ok(()),
                Err(e) => debug!(attempt, error = %e, "daemon not accepting connections yet"),
            }
        }

        Err(Error::StartupTimeout {
            attempts,
            waited: backoff * attempts,
        })
    }

    /// Stop the daemon: terminate, wait out the grace period, then kill.
    ///
    /// The client is disconnected and the handle released however the
    /// process went down.
    ///
    /// Without a process of its own, the supervisor stops the detached
    /// daemon named in the pid file, if there is one.
    pub async fn stop(&self) -> Result<()> {
        let mut slot = self.process.lock().await;
        self.stop_locked(&mut slot).await
    }

    async fn stop_locked(&self, slot: &mut Option<DaemonProcess>) -> Result<()> {
        let generation = self.begin(SupervisorState::Stopping);
        if let Some(probe) = self.take_health_probe() {
            probe.shutdown().await;
        }
        let result = match slot.take() {
            Some(process) => {
                self.shutdown(process).await;
                self.clear_pid_file();
                Ok(())
            }
            None => self.stop_recorded().await,
        };
        self.client.disconnect();
        self.transition(generation, SupervisorState::Stopped);
        result
    }

    async fn stop_recorded(&self) -> Result<()> {
        let Some(pid) = self.recorded_pid() else {
            debug!("no daemon process to stop");
            return Ok(());
        };
        info!(pid, "stopping detached daemon");
        if pidfile::terminate_pid(pid, self.options.stop_grace).await? {
            self.clear_pid_file();
        } else {
            warn!(pid, "detached daemon did not exit");
        }
        Ok(())
    }

    fn record_pid(&self, process: &DaemonProcess) {
        if process.ownership() != Ownership::Detached {
            return;
        }
        if let (Some(pid_file), Some(pid)) = (&self.options.pid_file, process.pid()) {
            if let Err(e) = pid_file.write(pid) {
                warn!(path = %pid_file.path().display(), error = %e, "failed to write pid file");
            }
        }
    }

    fn clear_pid_file(&self) {
        if let Some(pid_file) = &self.options.pid_file {
            pid_file.remove();
        }
    }

    async fn shutdown(&self, mut process: DaemonProcess) {
        if !process.is_alive() {
            return;
        }
        process.terminate();
        if process.wait_exit(self.options.stop_grace).await {
            info!(pid = process.pid(), "daemon stopped");
            return;
        }
        warn!(
            pid = process.pid(),
            grace_ms = self.options.stop_grace.as_millis() as u64,
            "daemon ignored terminate, killing"
        );
        process.kill();
        if !process.wait_exit(self.options.stop_grace).await {
            warn!(pid = process.pid(), "daemon did not exit after kill");
        }
    }

    /// Stop, then start, without letting another lifecycle call in between.
    pub async fn restart(&self) -> Result<()> {
        let mut slot = self.process.lock().await;
        self.stop_locked(&mut slot).await?;
        self.start_locked(&mut slot).await
    }

    /// Make sure the client is connected, spawning the daemon only if a
    /// plain connect fails.
    pub async fn ensure_running(&self) -> Result<()> {
        if self.client.is_connected() {
            return Ok(());
        }
        match self.client.connect().await {
            Ok(()) => {
                debug!(endpoint = %self.client.endpoint(), "connected to existing daemon");
                Ok(())
            }
            Err(e) => {
                debug!(error = %e, "no daemon listening, starting one");
                self.start().await
            }
        }
    }

    fn start_health_probe(&self) {
        let Some(interval) = self.options.health_interval else {
            return;
        };
        let probe = HealthProbe::spawn(Arc::clone(&self.client), interval);
        *self.health.lock().unwrap_or_else(PoisonError::into_inner) = Some(probe);
    }

    fn take_health_probe(&self) -> Option<HealthProbe> {
        self.health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Counters of the running health probe, if one is active.
    pub fn health_counters(&self) -> Option<Arc<HealthCounters>> {
        self.health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(HealthProbe::counters)
    }
}

fn describe_exit(status: Option<ExitStatus>) -> String {
    match status {
        Some(status) => status.to_string(),
        None => "unknown status".to_string(),
    }
}

#[cfg(all(test, unix))]
#[path = "supervisor_tests.rs"]
mod tests;
