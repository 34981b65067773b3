// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! All runtime environment variables read by the client are defined here
//! with typed accessor functions. The variable name constants are generated
//! by `build.rs` and live in the [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `PHONO_CONFIG` if set.
pub fn config_path() -> Option<PathBuf> {
    non_empty(vars::PHONO_CONFIG).map(PathBuf::from)
}

/// Returns the value of `PHONO_SOCKET` if set.
pub fn socket() -> Option<String> {
    non_empty(vars::PHONO_SOCKET)
}

/// Returns the value of `PHONO_DAEMON_BINARY` if set.
pub fn daemon_binary() -> Option<PathBuf> {
    non_empty(vars::PHONO_DAEMON_BINARY).map(PathBuf::from)
}

/// Returns the value of `RUST_LOG` if set.
pub fn log_filter() -> Option<String> {
    non_empty(vars::RUST_LOG)
}

fn non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
