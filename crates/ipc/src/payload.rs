// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Typed response payloads and their shape validators.
//!
//! Each command has a fixed response kind. A payload is only handed to a
//! caller after it deserializes completely and passes its invariant check;
//! partially valid data is rejected as a whole.

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Expected shape of a response's `data` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    /// Acknowledgement only. `data` is ignored.
    Ack,
    Status,
    Pairing,
    Config,
    Scan,
    ScanStatus,
    AudioData,
}

impl ResponseKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseKind::Ack => "ack",
            ResponseKind::Status => "status",
            ResponseKind::Pairing => "pairing",
            ResponseKind::Config => "config",
            ResponseKind::Scan => "scan",
            ResponseKind::ScanStatus => "scan-status",
            ResponseKind::AudioData => "audio-data",
        }
    }

    /// Run the validator for this kind against `data`.
    pub fn validate(&self, data: Option<&Value>) -> Result<(), ShapeError> {
        match self {
            ResponseKind::Ack => Ok(()),
            ResponseKind::Status => PlaybackStatus::decode(data).map(drop),
            ResponseKind::Pairing => PairingGrant::decode(data).map(drop),
            ResponseKind::Config => DaemonSettings::decode(data).map(drop),
            ResponseKind::Scan | ResponseKind::ScanStatus => {
                decode_as::<ScanStatus>(*self, data).map(drop)
            }
            ResponseKind::AudioData => AudioFrame::decode(data).map(drop),
        }
    }
}

impl fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A response payload failed shape validation.
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeError {
    /// The response had no `data` field.
    MissingData { kind: ResponseKind },
    /// `data` did not deserialize into the expected type.
    Mismatch { kind: ResponseKind, reason: String },
    /// `data` deserialized but broke a protocol invariant.
    Invariant { kind: ResponseKind, reason: String },
}

impl ShapeError {
    pub fn kind(&self) -> ResponseKind {
        match self {
            ShapeError::MissingData { kind }
            | ShapeError::Mismatch { kind, .. }
            | ShapeError::Invariant { kind, .. } => *kind,
        }
    }
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeError::MissingData { kind } => write!(f, "invalid {} response: missing data", kind),
            ShapeError::Mismatch { kind, reason } | ShapeError::Invariant { kind, reason } => {
                write!(f, "invalid {} response: {}", kind, reason)
            }
        }
    }
}

impl std::error::Error for ShapeError {}

/// A typed response payload.
pub trait Payload: DeserializeOwned {
    /// Kind reported in validation errors.
    const KIND: ResponseKind;

    /// Invariants serde cannot express.
    fn check(&self) -> Result<(), String> {
        Ok(())
    }

    /// Deserialize and check `data`.
    fn decode(data: Option<&Value>) -> Result<Self, ShapeError> {
        decode_as(Self::KIND, data)
    }
}

fn decode_as<T: Payload>(kind: ResponseKind, data: Option<&Value>) -> Result<T, ShapeError> {
    let value = data.ok_or(ShapeError::MissingData { kind })?;
    if !value.is_object() {
        return Err(ShapeError::Mismatch {
            kind,
            reason: format!("expected an object, got {}", type_name(value)),
        });
    }
    let payload = T::deserialize(value).map_err(|e| ShapeError::Mismatch {
        kind,
        reason: e.to_string(),
    })?;
    payload
        .check()
        .map_err(|reason| ShapeError::Invariant { kind, reason })?;
    Ok(payload)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Transport state of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlaybackState::Playing => "playing",
            PlaybackState::Paused => "paused",
            PlaybackState::Stopped => "stopped",
        }
    }
}

impl fmt::Display for PlaybackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Metadata for the current track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album: Option<String>,
}

/// Response to `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackStatus {
    pub state: PlaybackState,
    pub volume: f64,
    /// Position in the current track, in seconds.
    #[serde(default)]
    pub position: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackInfo>,
    #[serde(default)]
    pub queue_length: usize,
}

impl Payload for PlaybackStatus {
    const KIND: ResponseKind = ResponseKind::Status;

    fn check(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.volume) {
            return Err(format!("volume {} outside [0.0, 1.0]", self.volume));
        }
        if !self.position.is_finite() || self.position < 0.0 {
            return Err(format!("invalid position {}", self.position));
        }
        Ok(())
    }
}

/// Response to `pair`.
///
/// The token is delivered even when approval is still required.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairingGrant {
    pub requires_approval: bool,
    pub token: String,
    pub client_id: String,
    /// Text the daemon wants shown while approval is pending.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Payload for PairingGrant {
    const KIND: ResponseKind = ResponseKind::Pairing;

    fn check(&self) -> Result<(), String> {
        if self.token.is_empty() {
            return Err("empty token".to_string());
        }
        Ok(())
    }
}

/// Daemon configuration, as returned by `getConfig` and `setConfig`.
///
/// Keys the client does not model are kept in `extra` so a read-modify-write
/// cycle does not lose them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaemonSettings {
    #[serde(default)]
    pub music_directories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Payload for DaemonSettings {
    const KIND: ResponseKind = ResponseKind::Config;
}

/// Phase of a library scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanState {
    Idle,
    Running,
    Complete,
    Error,
}

impl ScanState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanState::Complete | ScanState::Error)
    }
}

/// Summary of a finished scan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResults {
    #[serde(default)]
    pub files_scanned: u64,
    #[serde(default)]
    pub tracks_added: u64,
    #[serde(default)]
    pub tracks_updated: u64,
    #[serde(default)]
    pub tracks_removed: u64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

/// Response to `scanLibrary` and `getScanStatus`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatus {
    pub state: ScanState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<ScanResults>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

const MISSING_SCAN_RESULTS: &str = "complete scan without results";

impl ScanStatus {
    /// Results carried by a `complete` status.
    pub fn completed_results(self) -> Result<ScanResults, ShapeError> {
        self.results.ok_or_else(|| ShapeError::Invariant {
            kind: Self::KIND,
            reason: MISSING_SCAN_RESULTS.to_string(),
        })
    }
}

impl Payload for ScanStatus {
    const KIND: ResponseKind = ResponseKind::ScanStatus;

    fn check(&self) -> Result<(), String> {
        if let Some(pct) = self.percentage {
            if !(0.0..=100.0).contains(&pct) {
                return Err(format!("percentage {} outside [0, 100]", pct));
            }
        }
        if self.state == ScanState::Complete && self.results.is_none() {
            return Err(MISSING_SCAN_RESULTS.to_string());
        }
        Ok(())
    }
}

/// One frame of audio telemetry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioFrame {
    /// Per-band magnitudes, low to high frequency.
    pub bands: Vec<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peak: Option<f32>,
}

impl Payload for AudioFrame {
    const KIND: ResponseKind = ResponseKind::AudioData;

    fn check(&self) -> Result<(), String> {
        if self.bands.iter().any(|b| !b.is_finite()) {
            return Err("non-finite band value".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
