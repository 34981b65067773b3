// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic `status` probe against a running daemon.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::client::DaemonClient;

/// Probe outcomes since the probe started.
#[derive(Debug, Default)]
pub struct HealthCounters {
    ok: AtomicU64,
    failed: AtomicU64,
}

impl HealthCounters {
    pub fn ok(&self) -> u64 {
        self.ok.load(Ordering::SeqCst)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Background probe. Stops when dropped.
pub struct HealthProbe {
    cancel: CancellationToken,
    task: JoinHandle<()>,
    counters: Arc<HealthCounters>,
}

impl HealthProbe {
    /// Probe every `interval`, skipping ticks while disconnected.
    /// Failures are logged and never tear the connection down.
    pub fn spawn(client: Arc<DaemonClient>, interval: Duration) -> Self {
        let cancel = CancellationToken::new();
        let counters = Arc::new(HealthCounters::default());
        let task = tokio::spawn(run(client, interval, cancel.clone(), counters.clone()));
        Self {
            cancel,
            task,
            counters,
        }
    }

    pub fn counters(&self) -> Arc<HealthCounters> {
        Arc::clone(&self.counters)
    }

    /// Cancel the probe and wait for its task to finish.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Err(e) = (&mut self.task).await {
            warn!(error = %e, "health probe task failed");
        }
    }
}

impl Drop for HealthProbe {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run(
    client: Arc<DaemonClient>,
    period: Duration,
    cancel: CancellationToken,
    counters: Arc<HealthCounters>,
) {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }
        if !client.is_connected() {
            continue;
        }

        let probe = tokio::select! {
            _ = cancel.cancelled() => break,
            result = client.status() => result,
        };
        match probe {
            Ok(status) => {
                counters.ok.fetch_add(1, Ordering::SeqCst);
                debug!(state = ?status.state, "health probe ok");
            }
            Err(e) => {
                counters.failed.fetch_add(1, Ordering::SeqCst);
                warn!(error = %e, "health probe failed");
            }
        }
    }
    debug!("health probe stopped");
}
