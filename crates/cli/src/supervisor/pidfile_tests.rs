// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use tempfile::TempDir;

#[test]
fn write_then_read() {
    let dir = TempDir::new().unwrap();
    let pid_file = PidFile::new(dir.path().join("state").join("phonod.pid"));

    assert_eq!(pid_file.read(), None);
    pid_file.write(4242).unwrap();
    assert_eq!(pid_file.read(), Some(4242));

    pid_file.remove();
    assert_eq!(pid_file.read(), None);
    pid_file.remove();
}

#[test]
fn garbage_reads_as_none() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("phonod.pid");
    fs::write(&path, "not a pid").unwrap();
    assert_eq!(PidFile::new(path.clone()).read(), None);

    fs::write(&path, "0").unwrap();
    assert_eq!(PidFile::new(path).read(), None);
}

#[cfg(unix)]
#[test]
fn live_pid_of_current_process() {
    let dir = TempDir::new().unwrap();
    let pid_file = PidFile::new(dir.path().join("phonod.pid"));
    pid_file.write(std::process::id()).unwrap();

    assert_eq!(pid_file.live_pid(), Some(std::process::id()));
}

#[cfg(unix)]
#[test]
fn stale_pid_file_is_removed() {
    let dir = TempDir::new().unwrap();
    let pid_file = PidFile::new(dir.path().join("phonod.pid"));
    // Above the default Linux pid_max, so never a live process.
    pid_file.write(4_194_305).unwrap();

    assert_eq!(pid_file.live_pid(), None);
    assert!(!pid_file.path().exists());
}

#[cfg(unix)]
#[tokio::test]
async fn terminate_pid_stops_process() {
    use crate::supervisor::{DaemonProcess, Ownership, TracingSink};
    use std::os::unix::fs::PermissionsExt;
    use std::sync::Arc;

    let dir = TempDir::new().unwrap();
    let script = dir.path().join("phonod");
    fs::write(&script, "#!/bin/sh\nexec sleep 30\n").unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

    let mut process =
        DaemonProcess::spawn(&script, &[], Ownership::Detached, Arc::new(TracingSink), |_| {})
            .unwrap();
    let pid = process.pid().unwrap();

    assert!(terminate_pid(pid, Duration::from_secs(2)).await.unwrap());
    assert!(process.wait_exit(Duration::from_secs(2)).await);
}
