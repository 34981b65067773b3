// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Library scan: start, then poll until the daemon reports a result.

use ph_ipc::{ScanResults, ScanState, ScanStatus};
use tracing::info;

use crate::client::DaemonClient;
use crate::error::{Error, Result};
use crate::poll::{PollStep, Poller};

/// Scan `paths` (or the daemon's configured library when empty) and wait for
/// the results.
///
/// An `idle` status before the first poll means the scan has not picked up
/// yet. Seen later, it means the daemon dropped the scan.
pub async fn scan_library<P>(
    client: &DaemonClient,
    poller: &Poller,
    paths: Vec<String>,
    mut progress: P,
) -> Result<ScanResults>
where
    P: FnMut(f64, &str),
{
    let initial = client.start_scan(paths).await?;
    match step(initial, true)? {
        PollStep::Done(results) => return Ok(finished(results)),
        PollStep::Pending {
            percentage,
            message,
        } => progress(percentage, &message),
    }

    let results = poller
        .run(
            "library scan",
            move || async move { step(client.scan_status().await?, false) },
            progress,
        )
        .await?;
    Ok(finished(results))
}

fn step(status: ScanStatus, initial: bool) -> Result<PollStep<ScanResults>> {
    match status.state {
        ScanState::Running => Ok(PollStep::Pending {
            percentage: status.percentage.unwrap_or(0.0),
            message: status.message.unwrap_or_default(),
        }),
        ScanState::Idle if initial => Ok(PollStep::Pending {
            percentage: 0.0,
            message: status.message.unwrap_or_default(),
        }),
        ScanState::Idle => Err(Error::ScanFailed("scan stopped unexpectedly".to_string())),
        ScanState::Error => Err(Error::ScanFailed(
            status
                .error
                .or(status.message)
                .unwrap_or_else(|| "unknown error".to_string()),
        )),
        ScanState::Complete => Ok(PollStep::Done(status.completed_results()?)),
    }
}

fn finished(results: ScanResults) -> ScanResults {
    info!(
        files = results.files_scanned,
        added = results.tracks_added,
        updated = results.tracks_updated,
        removed = results.tracks_removed,
        "library scan complete"
    );
    results
}

#[cfg(test)]
#[path = "scan_tests.rs"]
mod tests;
