// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;

fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
    Cli::try_parse_from(args)
}

#[test]
fn test_config_get_all() {
    let cli = parse(&["phono", "config", "get"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Config(ConfigCommand::Get {
            key: None,
            output: OutputArgs::default()
        })
    );
}

#[test]
fn test_config_get_key_json() {
    let cli = parse(&["phono", "config", "get", "gapless", "-o", "json"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Config(ConfigCommand::Get {
            key: Some("gapless".to_string()),
            output: OutputArgs {
                output: OutputFormat::Json
            }
        })
    );
}

#[test]
fn test_config_set() {
    let cli = parse(&["phono", "config", "set", "gapless", "true"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Config(ConfigCommand::Set {
            key: "gapless".to_string(),
            value: "true".to_string()
        })
    );
}

#[test]
fn test_config_set_requires_value() {
    assert!(parse(&["phono", "config", "set", "gapless"]).is_err());
}

#[test]
fn test_scan_paths_repeatable() {
    let cli = parse(&["phono", "scan", "-p", "/a", "--path", "/b"]).unwrap();
    match cli.command {
        Command::Scan { paths, .. } => assert_eq!(paths, vec!["/a", "/b"]),
        other => panic!("Expected Scan command, got {:?}", other),
    }
}

#[test]
fn test_pair_flags() {
    let cli = parse(&["phono", "pair", "--name", "studio", "-y"]).unwrap();
    assert_eq!(
        cli.command,
        Command::Pair {
            name: Some("studio".to_string()),
            yes: true
        }
    );
}

#[test]
fn test_global_config_flag() {
    let cli = parse(&["phono", "--config", "/etc/phono.toml", "status"]).unwrap();
    assert_eq!(cli.config, Some(PathBuf::from("/etc/phono.toml")));
}
