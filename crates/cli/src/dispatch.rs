// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Single-flight request dispatcher.
//!
//! The protocol has no correlation ids, so at most one request may be on the
//! wire at a time. Submitted commands wait in a FIFO queue; the head is
//! written once the previous request settles. Any response frame settles the
//! oldest outstanding request.
//!
//! Every request settles exactly once: by a response, by its deadline, by a
//! write failure, or by a disconnect.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use ph_ipc::{Command, Response};
use tokio::sync::oneshot;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transport::FrameWriter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    /// The head request is being written.
    Sending,
    /// The head request is written; waiting for its response.
    AwaitingResponse,
}

type Settle = oneshot::Sender<Result<Response>>;

struct Pending {
    seq: u64,
    command: &'static str,
    line: String,
    settle: Settle,
}

struct InFlight {
    seq: u64,
    command: &'static str,
    settle: Settle,
    deadline: AbortHandle,
}

impl InFlight {
    fn settle(self, result: Result<Response>) {
        self.deadline.abort();
        let _ = self.settle.send(result);
    }
}

struct State {
    phase: DispatchPhase,
    queue: VecDeque<Pending>,
    in_flight: Option<InFlight>,
    writer: Option<FrameWriter>,
    token: Option<String>,
    next_seq: u64,
}

struct Inner {
    state: Mutex<State>,
    request_timeout: Duration,
}

/// Serializes commands onto the connection.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl Dispatcher {
    pub fn new(request_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(State {
                    phase: DispatchPhase::Idle,
                    queue: VecDeque::new(),
                    in_flight: None,
                    writer: None,
                    token: None,
                    next_seq: 1,
                }),
                request_timeout,
            }),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        self.inner.request_timeout
    }

    pub fn phase(&self) -> DispatchPhase {
        self.state().phase
    }

    /// Requests waiting behind the one in flight.
    pub fn queued(&self) -> usize {
        self.state().queue.len()
    }

    pub fn has_in_flight(&self) -> bool {
        self.state().in_flight.is_some()
    }

    /// Bearer token attached to commands encoded from now on.
    pub fn set_token(&self, token: Option<String>) {
        self.state().token = token;
    }

    pub fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    pub fn is_attached(&self) -> bool {
        self.state().writer.is_some()
    }

    /// Route outbound frames to `writer`.
    pub fn attach(&self, writer: FrameWriter) {
        self.state().writer = Some(writer);
    }

    /// Queue `command` and return a future for its response.
    ///
    /// The command is validated, encoded and queued before this returns, so
    /// submission order is call order regardless of when the futures are
    /// polled. The response is returned as received, including
    /// `success: false` responses.
    ///
    /// Must be called within a tokio runtime.
    pub fn submit(
        &self,
        command: &Command,
    ) -> impl Future<Output = Result<Response>> + Send + 'static {
        let (settle, settled) = oneshot::channel();
        self.enqueue(command, settle);
        async move { settled.await.unwrap_or(Err(Error::Disconnected)) }
    }

    fn enqueue(&self, command: &Command, settle: Settle) {
        let mut state = self.state();

        let line = match command.encode(state.token.as_deref()) {
            Ok(line) => line,
            Err(e) => {
                let _ = settle.send(Err(e.into()));
                return;
            }
        };
        if state.writer.is_none() {
            let _ = settle.send(Err(Error::Disconnected));
            return;
        }

        let seq = state.next_seq;
        state.next_seq += 1;
        state.queue.push_back(Pending {
            seq,
            command: command.name(),
            line,
            settle,
        });
        debug!(seq, command = command.name(), queued = state.queue.len(), "request queued");
        self.pump(&mut state);
    }

    /// Start the head of the queue if nothing is in flight.
    fn pump(&self, state: &mut State) {
        if state.phase != DispatchPhase::Idle || state.in_flight.is_some() {
            return;
        }
        let Some(pending) = state.queue.pop_front() else {
            return;
        };
        let Some(writer) = state.writer.clone() else {
            let _ = pending.settle.send(Err(Error::Disconnected));
            for rest in state.queue.drain(..) {
                let _ = rest.settle.send(Err(Error::Disconnected));
            }
            return;
        };

        let Pending {
            seq,
            command,
            line,
            settle,
        } = pending;

        let timeout = self.inner.request_timeout;
        let weak = Arc::downgrade(&self.inner);
        let deadline = tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(dispatcher) = upgrade(&weak) {
                dispatcher.on_deadline(seq);
            }
        });

        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let result = writer.write_frame(&line).await;
            if let Some(dispatcher) = upgrade(&weak) {
                dispatcher.on_written(seq, result);
            }
        });

        debug!(seq, command, "request sent");
        state.phase = DispatchPhase::Sending;
        state.in_flight = Some(InFlight {
            seq,
            command,
            settle,
            deadline: deadline.abort_handle(),
        });
    }

    fn on_written(&self, seq: u64, result: std::io::Result<()>) {
        let mut state = self.state();
        if state.in_flight.as_ref().map(|f| f.seq) != Some(seq) {
            return;
        }
        match result {
            Ok(()) => {
                if state.phase == DispatchPhase::Sending {
                    state.phase = DispatchPhase::AwaitingResponse;
                }
            }
            Err(e) => {
                if let Some(flight) = state.in_flight.take() {
                    warn!(seq, command = flight.command, error = %e, "write failed");
                    flight.settle(Err(Error::Write(e)));
                }
                state.phase = DispatchPhase::Idle;
                self.pump(&mut state);
            }
        }
    }

    fn on_deadline(&self, seq: u64) {
        let mut state = self.state();
        if state.in_flight.as_ref().map(|f| f.seq) != Some(seq) {
            return;
        }
        if let Some(flight) = state.in_flight.take() {
            warn!(seq, command = flight.command, "request timed out");
            let command = flight.command;
            flight.settle(Err(Error::RequestTimeout {
                command,
                timeout: self.inner.request_timeout,
            }));
        }
        state.phase = DispatchPhase::Idle;
        self.pump(&mut state);
    }

    /// Settle the oldest outstanding request with `response`.
    ///
    /// Matching is by order only. A response that arrives after its request
    /// timed out is attributed to whichever request is in flight at the time.
    pub fn on_response(&self, response: Response) {
        let mut state = self.state();
        let Some(flight) = state.in_flight.take() else {
            warn!(
                success = response.success,
                "dropping response with no request in flight"
            );
            return;
        };
        debug!(seq = flight.seq, command = flight.command, success = response.success, "response");
        flight.settle(Ok(response));
        state.phase = DispatchPhase::Idle;
        self.pump(&mut state);
    }

    /// Reject the request in flight and everything queued, and detach the
    /// writer.
    pub fn on_disconnect(&self) {
        let mut state = self.state();
        state.writer = None;

        let mut rejected = 0;
        if let Some(flight) = state.in_flight.take() {
            flight.settle(Err(Error::Disconnected));
            rejected += 1;
        }
        for pending in state.queue.drain(..) {
            let _ = pending.settle.send(Err(Error::Disconnected));
            rejected += 1;
        }
        state.phase = DispatchPhase::Idle;
        if rejected > 0 {
            debug!(rejected, "rejected pending requests on disconnect");
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn upgrade(weak: &Weak<Inner>) -> Option<Dispatcher> {
    weak.upgrade().map(|inner| Dispatcher { inner })
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
