// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Locating the daemon executable.

use std::path::{Path, PathBuf};

use crate::config::ClientConfig;
use crate::env;

/// Daemon executable name, without extension.
pub const DAEMON_NAME: &str = "phonod";

/// Flag passed to every spawned daemon.
pub const VERBOSE_FLAG: &str = "--verbose";

/// Platform directory name under `<resource_dir>/bin`, e.g. `linux-x64`.
pub fn platform_dir(os: &str, arch: &str) -> String {
    let os = match os {
        "macos" => "darwin",
        "windows" => "win32",
        other => other,
    };
    let arch = match arch {
        "x86_64" => "x64",
        "aarch64" => "arm64",
        "x86" => "ia32",
        other => other,
    };
    format!("{}-{}", os, arch)
}

/// Executable file name for `os`.
pub fn executable_name(os: &str) -> String {
    if os == "windows" {
        format!("{}.exe", DAEMON_NAME)
    } else {
        DAEMON_NAME.to_string()
    }
}

/// Bundled daemon path under `resource_dir` for `os`/`arch`.
pub fn bundled_path(resource_dir: &Path, os: &str, arch: &str) -> PathBuf {
    resource_dir
        .join("bin")
        .join(platform_dir(os, arch))
        .join(executable_name(os))
}

/// Resolve the daemon binary.
///
/// Order: `PHONO_DAEMON_BINARY`, `daemon_binary` in the config, the bundled
/// binary under the resource dir, then a `phonod` next to the current
/// executable. If none exists the bundled path is returned so the caller
/// can report it.
pub fn resolve_daemon_binary(config: &ClientConfig) -> PathBuf {
    resolve_with_override(env::daemon_binary(), config)
}

fn resolve_with_override(env_override: Option<PathBuf>, config: &ClientConfig) -> PathBuf {
    if let Some(path) = env_override {
        return path;
    }
    if let Some(path) = &config.daemon_binary {
        return path.clone();
    }

    let os = std::env::consts::OS;
    let bundled = bundled_path(&resource_dir(config), os, std::env::consts::ARCH);
    if bundled.is_file() {
        return bundled;
    }

    if let Ok(exe) = std::env::current_exe() {
        let sibling = exe.with_file_name(executable_name(os));
        if sibling.is_file() {
            return sibling;
        }
    }

    bundled
}

/// Configured resource dir, or the directory of the running executable.
pub fn resource_dir(config: &ClientConfig) -> PathBuf {
    if let Some(dir) = &config.resource_dir {
        return dir.clone();
    }
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
#[path = "binary_tests.rs"]
mod tests;
