// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of unsolicited push frames.
//!
//! Push frames never take part in request correlation. Each one is delivered
//! to every live [`Subscription`] for its channel; frames for unknown channels
//! or with no listeners are dropped.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ph_ipc::{Payload, PushKind, PushMessage};
use tokio::sync::mpsc;
use tracing::{debug, trace};

type Listeners = HashMap<PushKind, Vec<mpsc::UnboundedSender<PushMessage>>>;

/// Routes push frames to local listeners.
#[derive(Clone, Default)]
pub struct PushHub {
    listeners: Arc<Mutex<Listeners>>,
}

impl PushHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener for `kind`.
    ///
    /// This only affects local delivery; the daemon must be told to emit the
    /// channel separately.
    pub fn listen(&self, kind: PushKind) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        self.listeners().entry(kind).or_default().push(tx);
        Subscription { kind, rx }
    }

    /// Deliver `message` to every listener of its channel.
    ///
    /// Returns the number of listeners reached.
    pub fn publish(&self, message: PushMessage) -> usize {
        let Some(kind) = message.push_kind() else {
            trace!(kind = %message.kind, "dropping push frame of unknown type");
            return 0;
        };

        let mut listeners = self.listeners();
        let Some(senders) = listeners.get_mut(&kind) else {
            trace!(%kind, "dropping push frame with no listeners");
            return 0;
        };
        senders.retain(|tx| tx.send(message.clone()).is_ok());
        let delivered = senders.len();
        if senders.is_empty() {
            listeners.remove(&kind);
        }
        delivered
    }

    /// Live listeners for `kind`.
    pub fn listener_count(&self, kind: PushKind) -> usize {
        let mut listeners = self.listeners();
        let Some(senders) = listeners.get_mut(&kind) else {
            return 0;
        };
        senders.retain(|tx| !tx.is_closed());
        senders.len()
    }

    /// End every subscription for `kind`.
    pub fn close(&self, kind: PushKind) {
        if let Some(senders) = self.listeners().remove(&kind) {
            debug!(%kind, listeners = senders.len(), "closing push subscriptions");
        }
    }

    /// End every subscription.
    pub fn close_all(&self) {
        self.listeners().clear();
    }

    fn listeners(&self) -> MutexGuard<'_, Listeners> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Stream of push frames for one channel.
///
/// Ends (yields `None`) on unsubscribe or disconnect.
#[derive(Debug)]
pub struct Subscription {
    kind: PushKind,
    rx: mpsc::UnboundedReceiver<PushMessage>,
}

impl Subscription {
    pub fn kind(&self) -> PushKind {
        self.kind
    }

    pub async fn recv(&mut self) -> Option<PushMessage> {
        self.rx.recv().await
    }

    /// Next frame whose data decodes as `T`. Frames that do not are skipped.
    pub async fn recv_payload<T: Payload>(&mut self) -> Option<T> {
        while let Some(message) = self.rx.recv().await {
            match T::decode(Some(&message.data)) {
                Ok(payload) => return Some(payload),
                Err(e) => debug!(kind = %self.kind, error = %e, "skipping undecodable push frame"),
            }
        }
        None
    }

    pub fn try_recv(&mut self) -> Option<PushMessage> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
#[path = "push_tests.rs"]
mod tests;
