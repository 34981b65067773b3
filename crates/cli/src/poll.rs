// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fixed-interval polling of long-running daemon operations.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Result of one status check.
#[derive(Debug, Clone, PartialEq)]
pub enum PollStep<T> {
    /// Still running; report progress and check again.
    Pending { percentage: f64, message: String },
    /// Finished.
    Done(T),
}

/// Polls a status check on a fixed interval, optionally bounded by an
/// overall deadline.
#[derive(Debug, Clone, Copy)]
pub struct Poller {
    interval: Duration,
    deadline: Option<Duration>,
}

impl Poller {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            deadline: None,
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.poll_interval()).with_deadline(config.poll_timeout())
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep, check, repeat until `check` returns [`PollStep::Done`] or an
    /// error. Errors end the loop unchanged.
    ///
    /// `progress` is called for every pending step.
    pub async fn run<T, F, Fut, P>(
        &self,
        operation: &'static str,
        mut check: F,
        mut progress: P,
    ) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<PollStep<T>>>,
        P: FnMut(f64, &str),
    {
        let interval = self.interval;
        let polling = async move {
            let mut ticks = 0u64;
            loop {
                tokio::time::sleep(interval).await;
                ticks += 1;
                match check().await? {
                    PollStep::Done(value) => {
                        debug!(operation, ticks, "poll finished");
                        return Ok(value);
                    }
                    PollStep::Pending {
                        percentage,
                        message,
                    } => progress(percentage, &message),
                }
            }
        };

        match self.deadline {
            None => polling.await,
            Some(timeout) => tokio::time::timeout(timeout, polling)
                .await
                .map_err(|_| Error::PollTimeout { operation, timeout })?,
        }
    }
}

#[cfg(test)]
#[path = "poll_tests.rs"]
mod tests;
