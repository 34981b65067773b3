// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

//! Tests for config resolution in front of `run()`.

use super::*;
use clap::Parser;
use std::fs;
use tempfile::TempDir;

fn parse(args: &[&str]) -> Cli {
    Cli::try_parse_from(args).unwrap()
}

#[test]
fn test_load_config_reads_explicit_file_and_socket_flag() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "client_name = \"studio\"\npoll_interval_ms = 250\n").unwrap();

    let cli = parse(&[
        "phono",
        "--config",
        path.to_str().unwrap(),
        "--socket",
        "/tmp/phono-test.sock",
        "status",
    ]);
    let config = load_config(&cli).unwrap();

    assert_eq!(config.client_name, "studio");
    assert_eq!(config.poll_interval_ms, 250);
    assert_eq!(config.socket.as_deref(), Some("/tmp/phono-test.sock"));
}

#[test]
fn test_load_config_missing_file_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let cli = parse(&["phono", "--config", path.to_str().unwrap(), "pause"]);
    let config = load_config(&cli).unwrap();

    assert_eq!(config.client_name, ClientConfig::default().client_name);
    assert_eq!(config.startup_attempts, ClientConfig::default().startup_attempts);
}

#[test]
fn test_load_config_rejects_invalid_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "startup_attempts = 0\n").unwrap();

    let cli = parse(&["phono", "--config", path.to_str().unwrap(), "pause"]);
    let err = load_config(&cli).unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert!(err.to_string().contains("startup_attempts"));
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = parse(&["phono", "daemon", "status", "--socket", "/tmp/other.sock"]);
    assert_eq!(cli.socket.as_deref(), Some("/tmp/other.sock"));
    assert_eq!(cli.command, Command::Daemon(DaemonCommand::Status));
}
