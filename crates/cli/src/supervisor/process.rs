// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Handle to a spawned daemon process.
//!
//! A monitor task owns the child and waits on it; the [`DaemonProcess`]
//! handle talks to it over a channel. Dropping an owned handle kills the
//! process.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Which stream a diagnostic line came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputStream {
    Stdout,
    Stderr,
}

/// Receives the daemon's stdout and stderr, one line at a time.
pub trait DiagnosticSink: Send + Sync {
    fn line(&self, stream: OutputStream, line: &str);
}

/// Forwards daemon output to `tracing` under the `phonod` target.
#[derive(Debug, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn line(&self, stream: OutputStream, line: &str) {
        match stream {
            OutputStream::Stdout => info!(target: "phonod", "{}", line),
            OutputStream::Stderr => warn!(target: "phonod", "{}", line),
        }
    }
}

/// Whether a dropped handle takes the process down with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ownership {
    /// The process is killed when its handle is dropped.
    Owned,
    /// The process outlives the handle and this client, in its own process
    /// group, with no output forwarding.
    Detached,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Liveness {
    Running,
    Exited(Option<ExitStatus>),
}

enum Control {
    Terminate,
    Kill,
}

/// A running (or recently exited) daemon process.
pub struct DaemonProcess {
    pid: Option<u32>,
    ownership: Ownership,
    control: mpsc::UnboundedSender<Control>,
    liveness: watch::Receiver<Liveness>,
}

impl DaemonProcess {
    /// Spawn `binary`. Owned processes have their stdout and stderr piped to
    /// `sink`; detached ones write to null.
    ///
    /// `on_exit` runs on the monitor task once the process has exited, before
    /// [`wait_exit`](Self::wait_exit) observes it.
    pub fn spawn<F>(
        binary: &Path,
        args: &[&str],
        ownership: Ownership,
        sink: Arc<dyn DiagnosticSink>,
        on_exit: F,
    ) -> Result<Self>
    where
        F: FnOnce(Option<ExitStatus>) + Send + 'static,
    {
        let mut command = Command::new(binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(ownership == Ownership::Owned);
        match ownership {
            Ownership::Owned => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
            }
            // Nobody is left to drain pipes once this client exits.
            Ownership::Detached => {
                command.stdout(Stdio::null()).stderr(Stdio::null());
                #[cfg(unix)]
                command.process_group(0);
            }
        }

        let mut child = command.spawn().map_err(|source| Error::Launch {
            binary: binary.to_path_buf(),
            source,
        })?;
        let pid = child.id();

        if let Some(stdout) = child.stdout.take() {
            tokio::spawn(forward_lines(stdout, OutputStream::Stdout, Arc::clone(&sink)));
        }
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(forward_lines(stderr, OutputStream::Stderr, sink));
        }

        let (control, control_rx) = mpsc::unbounded_channel();
        let (liveness_tx, liveness) = watch::channel(Liveness::Running);
        tokio::spawn(monitor(child, control_rx, liveness_tx, on_exit));

        info!(pid, binary = %binary.display(), "daemon spawned");
        Ok(Self {
            pid,
            ownership,
            control,
            liveness,
        })
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn ownership(&self) -> Ownership {
        self.ownership
    }

    pub fn is_alive(&self) -> bool {
        *self.liveness.borrow() == Liveness::Running
    }

    /// Exit status, once the process has exited and the status is known.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match *self.liveness.borrow() {
            Liveness::Exited(status) => status,
            Liveness::Running => None,
        }
    }

    /// Ask the process to exit (SIGTERM on Unix, a kill elsewhere).
    pub fn terminate(&self) {
        let _ = self.control.send(Control::Terminate);
    }

    pub fn kill(&self) {
        let _ = self.control.send(Control::Kill);
    }

    /// Wait up to `timeout` for the process to exit. Returns `true` if it has.
    pub async fn wait_exit(&mut self, timeout: Duration) -> bool {
        let exited = self
            .liveness
            .wait_for(|liveness| matches!(liveness, Liveness::Exited(_)));
        match tokio::time::timeout(timeout, exited).await {
            Ok(Ok(_)) => true,
            // The monitor is gone, so the child was reaped or dropped.
            Ok(Err(_)) => true,
            Err(_) => false,
        }
    }
}

impl Drop for DaemonProcess {
    fn drop(&mut self) {
        if self.ownership == Ownership::Owned && self.is_alive() {
            debug!(pid = self.pid, "killing daemon on drop");
            let _ = self.control.send(Control::Kill);
        }
    }
}

async fn monitor<F>(
    mut child: Child,
    mut control: mpsc::UnboundedReceiver<Control>,
    liveness: watch::Sender<Liveness>,
    on_exit: F,
) where
    F: FnOnce(Option<ExitStatus>),
{
    let mut control_open = true;
    let status = loop {
        tokio::select! {
            status = child.wait() => break status.ok(),
            signal = control.recv(), if control_open => match signal {
                Some(Control::Terminate) => send_terminate(&mut child),
                Some(Control::Kill) => {
                    if let Err(e) = child.start_kill() {
                        debug!(error = %e, "kill failed");
                    }
                }
                None => control_open = false,
            },
        }
    };

    match status {
        Some(status) => info!(%status, "daemon exited"),
        None => warn!("daemon exited with unknown status"),
    }
    on_exit(status);
    let _ = liveness.send(Liveness::Exited(status));
}

#[cfg(unix)]
fn send_terminate(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let Some(pid) = child.id() else {
        return;
    };
    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(e) = kill(Pid::from_raw(raw), Signal::SIGTERM) {
        debug!(pid, error = %e, "SIGTERM failed");
    }
}

#[cfg(not(unix))]
fn send_terminate(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        debug!(error = %e, "terminate failed");
    }
}

async fn forward_lines<R>(reader: R, stream: OutputStream, sink: Arc<dyn DiagnosticSink>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(reader).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => sink.line(stream, &line),
            Ok(None) => break,
            Err(e) => {
                debug!(?stream, error = %e, "daemon output closed");
                break;
            }
        }
    }
}

#[cfg(all(test, unix))]
#[path = "process_tests.rs"]
mod tests;
