// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection state shared between the transport and its observers.

use std::fmt;
use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

/// Connection state values for the atomic state field.
const STATE_DISCONNECTED: u8 = 0;
const STATE_CONNECTING: u8 = 1;
const STATE_CONNECTED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    fn to_raw(self) -> u8 {
        match self {
            ConnectionState::Disconnected => STATE_DISCONNECTED,
            ConnectionState::Connecting => STATE_CONNECTING,
            ConnectionState::Connected => STATE_CONNECTED,
        }
    }

    fn from_raw(raw: u8) -> Self {
        match raw {
            STATE_CONNECTING => ConnectionState::Connecting,
            STATE_CONNECTED => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Connection state visible to the reader task, the supervisor and callers.
///
/// Uses atomic fields for lock-free reads.
#[derive(Debug)]
pub struct SharedConnectionState {
    state: AtomicU8,
    /// Connection attempt count (for status reporting).
    attempt: AtomicU32,
}

impl SharedConnectionState {
    /// Create a new shared state initialized to disconnected.
    pub fn new() -> Self {
        Self {
            state: AtomicU8::new(STATE_DISCONNECTED),
            attempt: AtomicU32::new(0),
        }
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub fn set(&self, state: ConnectionState) {
        self.state.store(state.to_raw(), Ordering::Release);
    }

    pub fn attempt(&self) -> u32 {
        self.attempt.load(Ordering::Acquire)
    }

    pub fn set_attempt(&self, attempt: u32) {
        self.attempt.store(attempt, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }

    pub fn is_connecting(&self) -> bool {
        self.get() == ConnectionState::Connecting
    }

    /// Get a human-readable status string.
    pub fn status_string(&self) -> String {
        match self.get() {
            ConnectionState::Disconnected => "disconnected".to_string(),
            ConnectionState::Connecting => {
                let attempt = self.attempt();
                if attempt > 0 {
                    format!("connecting (attempt {})", attempt)
                } else {
                    "connecting".to_string()
                }
            }
            ConnectionState::Connected => "connected".to_string(),
        }
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Events published by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The stream to `endpoint` is open.
    Connected { endpoint: String },
    /// The stream closed. Published once per connection.
    Disconnected,
    /// A connect, read or framing failure.
    Error(String),
}

impl fmt::Display for ConnectionEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionEvent::Connected { endpoint } => write!(f, "connected to {}", endpoint),
            ConnectionEvent::Disconnected => write!(f, "disconnected"),
            ConnectionEvent::Error(message) => write!(f, "error: {}", message),
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
