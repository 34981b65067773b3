// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared wire protocol for frontend-daemon communication.
//!
//! This crate defines the command, response and push frame types exchanged
//! between a `phono` client and the `phonod` media daemon. Every frame is a
//! single-line JSON object terminated by `\n`:
//!
//! - client → daemon: `{"cmd": <name>, "token"?: <bearer>, "data"?: <payload>}`
//! - daemon → client: `{"success": <bool>, "data"?: <payload>, "error"?: <msg>}`
//! - daemon → client (unsolicited): `{"type": <channel>, "data": <payload>}`
//!
//! The protocol carries no correlation id. Responses are matched to requests
//! purely by order, so a client may only have one request in flight.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub mod framing;
mod payload;

pub use payload::{
    AudioFrame, DaemonSettings, PairingGrant, Payload, PlaybackState, PlaybackStatus,
    ResponseKind, ScanResults, ScanState, ScanStatus, ShapeError, TrackInfo,
};

/// Error returned when a command argument is outside its contract.
///
/// Raised on the client before anything is encoded, so invalid input never
/// reaches the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Volume level outside `[0.0, 1.0]`.
    VolumeOutOfRange(f64),
    /// Seek position negative or not finite.
    InvalidSeekPosition(f64),
    /// A command that needs at least one path was given none.
    EmptyPathList,
    /// A path argument was empty.
    EmptyPath,
    /// Pairing needs a client name.
    EmptyClientName,
    /// A config update with no keys.
    EmptyConfigUpdate,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::VolumeOutOfRange(level) => {
                write!(f, "volume must be between 0.0 and 1.0, got {}", level)
            }
            ValidationError::InvalidSeekPosition(pos) => {
                write!(f, "seek position must be a non-negative number, got {}", pos)
            }
            ValidationError::EmptyPathList => write!(f, "at least one path is required"),
            ValidationError::EmptyPath => write!(f, "path cannot be empty"),
            ValidationError::EmptyClientName => write!(f, "client name cannot be empty"),
            ValidationError::EmptyConfigUpdate => write!(f, "config update has no keys"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// The closed set of commands the daemon understands.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Request a bearer token for this client.
    Pair { client_name: String },
    /// Start playback, optionally of a specific file.
    Play { path: Option<String> },
    Pause,
    Resume,
    Stop,
    Next,
    Prev,
    /// Append files to the play queue.
    Queue { paths: Vec<String> },
    /// Seek within the current track, in seconds.
    Seek { position: f64 },
    /// Set output volume in `[0.0, 1.0]`.
    Volume { level: f64 },
    Status,
    GetAudioData,
    SubscribeAudioData,
    UnsubscribeAudioData,
    GetConfig,
    /// Merge the given keys into the daemon configuration.
    SetConfig { changes: Map<String, Value> },
    /// Start a library scan. An empty list scans the configured directories.
    ScanLibrary { paths: Vec<String> },
    GetScanStatus,
}

impl Command {
    /// Build a pairing command.
    pub fn pair(client_name: impl Into<String>) -> Result<Self, ValidationError> {
        let command = Command::Pair {
            client_name: client_name.into(),
        };
        command.validate()?;
        Ok(command)
    }

    /// Build a volume command, rejecting levels outside `[0.0, 1.0]`.
    pub fn volume(level: f64) -> Result<Self, ValidationError> {
        let command = Command::Volume { level };
        command.validate()?;
        Ok(command)
    }

    /// Build a seek command.
    pub fn seek(position: f64) -> Result<Self, ValidationError> {
        let command = Command::Seek { position };
        command.validate()?;
        Ok(command)
    }

    /// Build a queue command.
    pub fn queue(paths: Vec<String>) -> Result<Self, ValidationError> {
        let command = Command::Queue { paths };
        command.validate()?;
        Ok(command)
    }

    /// Wire name sent in the `cmd` field.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Pair { .. } => "pair",
            Command::Play { .. } => "play",
            Command::Pause => "pause",
            Command::Resume => "resume",
            Command::Stop => "stop",
            Command::Next => "next",
            Command::Prev => "prev",
            Command::Queue { .. } => "queue",
            Command::Seek { .. } => "seek",
            Command::Volume { .. } => "volume",
            Command::Status => "status",
            Command::GetAudioData => "getAudioData",
            Command::SubscribeAudioData => "subscribeAudioData",
            Command::UnsubscribeAudioData => "unsubscribeAudioData",
            Command::GetConfig => "getConfig",
            Command::SetConfig { .. } => "setConfig",
            Command::ScanLibrary { .. } => "scanLibrary",
            Command::GetScanStatus => "getScanStatus",
        }
    }

    /// Command-specific payload for the `data` field.
    pub fn payload(&self) -> Option<Value> {
        match self {
            Command::Pair { client_name } => Some(json!({ "clientName": client_name })),
            Command::Play { path: Some(path) } => Some(json!({ "path": path })),
            Command::Queue { paths } => Some(json!({ "paths": paths })),
            Command::Seek { position } => Some(json!({ "position": position })),
            Command::Volume { level } => Some(json!({ "level": level })),
            Command::SetConfig { changes } => Some(Value::Object(changes.clone())),
            Command::ScanLibrary { paths } if !paths.is_empty() => {
                Some(json!({ "paths": paths }))
            }
            _ => None,
        }
    }

    /// Shape the daemon's `data` must have for this command.
    pub fn response_kind(&self) -> ResponseKind {
        match self {
            Command::Pair { .. } => ResponseKind::Pairing,
            Command::Status => ResponseKind::Status,
            Command::GetAudioData => ResponseKind::AudioData,
            Command::GetConfig | Command::SetConfig { .. } => ResponseKind::Config,
            Command::ScanLibrary { .. } => ResponseKind::Scan,
            Command::GetScanStatus => ResponseKind::ScanStatus,
            _ => ResponseKind::Ack,
        }
    }

    /// Check arguments against the command contract.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Command::Pair { client_name } if client_name.trim().is_empty() => {
                Err(ValidationError::EmptyClientName)
            }
            Command::Volume { level } if !(0.0..=1.0).contains(level) => {
                Err(ValidationError::VolumeOutOfRange(*level))
            }
            Command::Seek { position } if !position.is_finite() || *position < 0.0 => {
                Err(ValidationError::InvalidSeekPosition(*position))
            }
            Command::Queue { paths } if paths.is_empty() => Err(ValidationError::EmptyPathList),
            Command::Queue { paths } | Command::ScanLibrary { paths }
                if paths.iter().any(|p| p.trim().is_empty()) =>
            {
                Err(ValidationError::EmptyPath)
            }
            Command::Play { path: Some(path) } if path.trim().is_empty() => {
                Err(ValidationError::EmptyPath)
            }
            Command::SetConfig { changes } if changes.is_empty() => {
                Err(ValidationError::EmptyConfigUpdate)
            }
            _ => Ok(()),
        }
    }

    /// Validate and encode this command as a single wire line (no terminator).
    pub fn encode(&self, token: Option<&str>) -> Result<String, ValidationError> {
        self.validate()?;
        Ok(encode(self.name(), self.payload().as_ref(), token))
    }
}

/// Encode a command frame.
///
/// `token` and `data` are only present when given. The caller appends the
/// line terminator.
pub fn encode(name: &str, payload: Option<&Value>, token: Option<&str>) -> String {
    let mut frame = Map::new();
    frame.insert("cmd".to_string(), Value::String(name.to_string()));
    if let Some(token) = token {
        frame.insert("token".to_string(), Value::String(token.to_string()));
    }
    if let Some(data) = payload {
        frame.insert("data".to_string(), data.clone());
    }
    Value::Object(frame).to_string()
}

/// A command frame as seen by the daemon side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub cmd: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Request {
    /// Parse a command frame.
    pub fn from_json(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Response to a single command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// A successful response carrying `data`.
    pub fn ok(data: Value) -> Self {
        Response {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// A failed response with a message.
    pub fn failure(message: impl Into<String>) -> Self {
        Response {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Error message, or a generic one when the daemon sent none.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("daemon reported failure")
    }

    /// Decode `data` as the payload type `T`, enforcing its shape.
    pub fn payload<T: Payload>(&self) -> Result<T, ShapeError> {
        T::decode(self.data.as_ref())
    }

    /// Serialize to a wire line (no terminator).
    pub fn to_json(&self) -> String {
        match serde_json::to_value(self) {
            Ok(value) => value.to_string(),
            Err(_) => String::from("{\"success\":false}"),
        }
    }
}

/// Decode a response frame.
///
/// Never fails: malformed input becomes a failed response whose error
/// message describes the parse failure.
pub fn decode(line: &str) -> Response {
    match serde_json::from_str::<Response>(line) {
        Ok(response) => response,
        Err(e) => Response::failure(format!("parse error: {}", e)),
    }
}

/// Known push channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PushKind {
    /// Spectrum/level telemetry while playing.
    AudioData,
}

impl PushKind {
    /// Value of the `type` discriminator.
    pub fn as_str(&self) -> &'static str {
        match self {
            PushKind::AudioData => "audioData",
        }
    }

    /// Look up a channel by its `type` discriminator.
    pub fn from_type(kind: &str) -> Option<Self> {
        match kind {
            "audioData" => Some(PushKind::AudioData),
            _ => None,
        }
    }

    /// Command that enables server-side emission for this channel.
    pub fn subscribe_command(&self) -> Command {
        match self {
            PushKind::AudioData => Command::SubscribeAudioData,
        }
    }

    /// Command that disables server-side emission for this channel.
    pub fn unsubscribe_command(&self) -> Command {
        match self {
            PushKind::AudioData => Command::UnsubscribeAudioData,
        }
    }
}

impl fmt::Display for PushKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unsolicited frame sent by the daemon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl PushMessage {
    /// Channel this message belongs to, if it is a known one.
    pub fn push_kind(&self) -> Option<PushKind> {
        PushKind::from_type(&self.kind)
    }

    /// Serialize to a wire line (no terminator).
    pub fn to_json(&self) -> String {
        json!({ "type": self.kind, "data": self.data }).to_string()
    }
}

/// A classified inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    /// Answer to the request currently in flight.
    Response(Response),
    /// Unsolicited push frame.
    Push(PushMessage),
    /// A push frame that could not be decoded. No caller owns it.
    Undecodable(String),
}

impl Inbound {
    /// Classify one inbound line.
    ///
    /// A frame with a `type` field and no `success` field is a push frame.
    /// Everything else is a response, including lines that fail to parse.
    pub fn classify(line: &str) -> Inbound {
        let value: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(e) => return Inbound::Response(Response::failure(format!("parse error: {}", e))),
        };

        let is_push = value
            .as_object()
            .is_some_and(|obj| obj.contains_key("type") && !obj.contains_key("success"));

        if is_push {
            return match serde_json::from_value::<PushMessage>(value) {
                Ok(push) => Inbound::Push(push),
                Err(e) => Inbound::Undecodable(e.to_string()),
            };
        }

        match serde_json::from_value::<Response>(value) {
            Ok(response) => Inbound::Response(response),
            Err(e) => Inbound::Response(Response::failure(format!("parse error: {}", e))),
        }
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
