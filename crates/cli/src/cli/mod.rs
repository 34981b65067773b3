// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod args;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

pub use args::OutputArgs;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "phono")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Control the local phono media daemon")]
#[command(
    long_about = "Control the local phono media daemon.\n\n\
    The daemon is started on first use and keeps running after this command exits. \
    Use 'phono daemon stop' to shut it down, or 'phono shell' for a session that \
    owns the daemon it starts."
)]
pub struct Cli {
    /// Socket path or pipe name of the daemon
    #[arg(long, global = true, value_name = "address")]
    pub socket: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Show playback status
    Status {
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Start playback, optionally of a specific file
    #[command(after_help = "\
Examples:
  phono play                         Resume the current queue from the start
  phono play ~/Music/song.flac       Play one file now")]
    Play {
        /// File to play
        #[arg(value_parser = non_empty_string)]
        path: Option<String>,
    },

    /// Pause playback
    Pause,

    /// Resume paused playback
    Resume,

    /// Stop playback
    Stop,

    /// Skip to the next track
    Next,

    /// Go back to the previous track
    Prev,

    /// Append files to the play queue
    Queue {
        /// Files to append
        #[arg(required = true, value_parser = non_empty_string)]
        paths: Vec<String>,
    },

    /// Seek within the current track
    Seek {
        /// Position in seconds
        #[arg(allow_negative_numbers = true)]
        position: f64,
    },

    /// Set the output volume
    #[command(after_help = "\
Examples:
  phono volume 0.5                   Half volume
  phono volume 0                     Mute")]
    Volume {
        /// Level between 0.0 and 1.0
        #[arg(allow_negative_numbers = true)]
        level: f64,
    },

    /// Read or change daemon settings
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Scan the music library and wait for the results
    #[command(after_help = "\
Examples:
  phono scan                         Scan the daemon's library folders
  phono scan -p ~/Music -p /mnt/nas  Scan specific folders")]
    Scan {
        /// Folder to scan (repeatable). Defaults to the daemon's library.
        #[arg(long = "path", short = 'p', value_parser = non_empty_string)]
        paths: Vec<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Pair this client with the daemon and store the token
    Pair {
        /// Client name shown by the daemon (defaults to config client_name)
        #[arg(long, value_parser = non_empty_string)]
        name: Option<String>,

        /// Do not wait for confirmation when the daemon asks for approval
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Forget the stored token
    Logout,

    /// Print audio data frames pushed by the daemon
    Watch {
        /// Stop after this many frames
        #[arg(long, short = 'n')]
        count: Option<usize>,
    },

    /// Manage the daemon process
    #[command(subcommand)]
    Daemon(DaemonCommand),

    /// Interactive session that owns the daemon it starts
    Shell,
}

/// Daemon settings commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum ConfigCommand {
    /// Show settings, or one setting
    Get {
        /// Setting name
        key: Option<String>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Change one setting
    #[command(
        arg_required_else_help = true,
        after_help = "\
Examples:
  phono config set outputDevice hw:1           Plain words are strings
  phono config set musicDirectories '[\"/music\"]'  Other values are JSON"
    )]
    Set {
        /// Setting name
        #[arg(value_parser = non_empty_string)]
        key: String,

        /// New value as JSON. Plain words are taken as strings.
        value: String,
    },
}

/// Daemon management commands.
#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonCommand {
    /// Show daemon status
    Status,
    /// Start the daemon
    Start,
    /// Stop the daemon
    Stop,
    /// Stop, then start the daemon
    Restart,
}

/// One line typed into `phono shell`.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
#[command(name = "phono")]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: Command,
}

#[cfg(test)]
#[path = "../cli_tests/mod.rs"]
mod tests;
