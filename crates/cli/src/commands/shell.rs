// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `phono shell`: run commands against one connection until `exit`.
//!
//! The shell's session owns the daemon it starts, so leaving the shell
//! stops that daemon. A daemon that was already running is left alone.

use std::io::Write;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, warn};

use crate::cli::{Command, ShellLine};
use crate::error::Result;

use super::Session;

const PROMPT: &str = "phono> ";

/// What to do with one input line.
#[derive(Debug, PartialEq)]
pub(crate) enum LineAction {
    Skip,
    Exit,
    Run(Vec<String>),
}

/// Split a line into words with shell quoting rules.
///
/// Unbalanced quotes fall back to whitespace splitting.
pub(crate) fn split_line(line: &str) -> Vec<String> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }
    shell_words::split(trimmed)
        .unwrap_or_else(|_| trimmed.split_whitespace().map(|s| s.to_string()).collect())
}

pub(crate) fn classify(line: &str) -> LineAction {
    let words = split_line(line);
    match words.first().map(String::as_str) {
        None => LineAction::Skip,
        Some(word) if word.starts_with('#') => LineAction::Skip,
        Some("exit" | "quit") => LineAction::Exit,
        Some(_) => LineAction::Run(words),
    }
}

pub async fn run(session: &Session) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", PROMPT);
        let _ = std::io::stdout().flush();

        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
            line = lines.next_line() => line?,
        };
        // EOF
        let Some(line) = line else {
            println!();
            break;
        };

        let words = match classify(&line) {
            LineAction::Skip => continue,
            LineAction::Exit => break,
            LineAction::Run(words) => words,
        };

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };
        if parsed.command == Command::Shell {
            eprintln!("error: already in a shell session");
            continue;
        }

        debug!(command = ?parsed.command, "shell command");
        if let Err(e) = super::execute(session, parsed.command).await {
            eprintln!("error: {}", e);
        }
    }

    if session.supervisor().owns_process().await {
        if let Err(e) = session.supervisor().stop().await {
            warn!(error = %e, "failed to stop daemon on shell exit");
        }
    } else {
        session.client().disconnect();
    }
    Ok(())
}

#[cfg(test)]
#[path = "shell_tests.rs"]
mod tests;
