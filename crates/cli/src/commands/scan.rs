// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `phono scan`.

use std::io::{IsTerminal, Write};

use ph_ipc::ScanResults;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::poll::Poller;
use crate::scan::scan_library;

use super::{print_json, Session};

pub async fn run(session: &Session, paths: Vec<String>, output: OutputFormat) -> Result<()> {
    session.ready().await?;
    let poller = Poller::from_config(session.config());
    let interactive = output == OutputFormat::Text && std::io::stderr().is_terminal();

    let results = scan_library(session.client(), &poller, paths, |percentage, message| {
        if interactive {
            let mut stderr = std::io::stderr();
            let _ = write!(stderr, "\r\x1b[2K{}", progress_line(percentage, message));
            let _ = stderr.flush();
        }
    })
    .await;
    if interactive {
        eprint!("\r\x1b[2K");
    }

    let results = results?;
    match output {
        OutputFormat::Text => print!("{}", format_results(&results)),
        OutputFormat::Json => print_json(&results)?,
    }
    Ok(())
}

pub(crate) fn progress_line(percentage: f64, message: &str) -> String {
    if message.is_empty() {
        format!("Scanning {:>3.0}%", percentage)
    } else {
        format!("Scanning {:>3.0}% {}", percentage, message)
    }
}

pub(crate) fn format_results(results: &ScanResults) -> String {
    let mut out = format!(
        "Files scanned: {}\nTracks added: {}\nTracks updated: {}\nTracks removed: {}\n",
        results.files_scanned, results.tracks_added, results.tracks_updated, results.tracks_removed
    );
    if !results.errors.is_empty() {
        out.push_str(&format!("Errors ({}):\n", results.errors.len()));
        for error in &results.errors {
            out.push_str(&format!("  {}\n", error));
        }
    }
    out
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
