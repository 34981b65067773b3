// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pid file for detached daemons.
//!
//! A detached daemon outlives the client that spawned it, so its pid is
//! recorded where a later `phono daemon stop` can find it.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::Result;

const PID_DIR_NAME: &str = "phono";
const PID_FILE_NAME: &str = "phonod.pid";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidFile {
    path: PathBuf,
}

impl PidFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<state_dir>/phono/phonod.pid`, falling back to the cache dir on
    /// platforms without a state dir.
    pub fn default_location() -> Option<Self> {
        dirs::state_dir()
            .or_else(dirs::cache_dir)
            .map(|dir| Self::new(dir.join(PID_DIR_NAME).join(PID_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, pid: u32) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, format!("{}\n", pid))?;
        Ok(())
    }

    /// Recorded pid. A missing or unreadable file reads as none.
    pub fn read(&self) -> Option<u32> {
        let content = fs::read_to_string(&self.path).ok()?;
        content.trim().parse().ok().filter(|pid| *pid > 0)
    }

    /// Recorded pid, if that process is still alive. Stale files are removed.
    pub fn live_pid(&self) -> Option<u32> {
        let pid = self.read()?;
        if process_alive(pid) {
            Some(pid)
        } else {
            debug!(pid, path = %self.path.display(), "removing stale pid file");
            self.remove();
            None
        }
    }

    pub fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %self.path.display(), error = %e, "failed to remove pid file");
            }
        }
    }
}

#[cfg(unix)]
fn to_pid(pid: u32) -> Option<nix::unistd::Pid> {
    i32::try_from(pid).ok().map(nix::unistd::Pid::from_raw)
}

/// Whether a process with `pid` exists.
#[cfg(unix)]
pub fn process_alive(pid: u32) -> bool {
    to_pid(pid).is_some_and(|pid| nix::sys::signal::kill(pid, None).is_ok())
}

#[cfg(not(unix))]
pub fn process_alive(_pid: u32) -> bool {
    false
}

/// Stop a process we hold no handle for: SIGTERM, wait up to `grace`, then
/// SIGKILL. Returns `true` if the process is gone.
#[cfg(unix)]
pub async fn terminate_pid(pid: u32, grace: Duration) -> Result<bool> {
    use nix::sys::signal::{kill, Signal};

    let Some(target) = to_pid(pid) else {
        return Ok(true);
    };
    if let Err(e) = kill(target, Signal::SIGTERM) {
        debug!(pid, error = %e, "SIGTERM failed, assuming exited");
        return Ok(!process_alive(pid));
    }
    if wait_for_exit(pid, grace).await {
        return Ok(true);
    }
    warn!(pid, "daemon ignored SIGTERM, killing");
    let _ = kill(target, Signal::SIGKILL);
    Ok(wait_for_exit(pid, grace).await)
}

#[cfg(not(unix))]
pub async fn terminate_pid(_pid: u32, _grace: Duration) -> Result<bool> {
    Err(crate::error::Error::Config(
        "stopping a daemon started by another phono process is not supported on this platform"
            .to_string(),
    ))
}

#[cfg(unix)]
async fn wait_for_exit(pid: u32, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if !process_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    !process_alive(pid)
}

#[cfg(test)]
#[path = "pidfile_tests.rs"]
mod tests;
