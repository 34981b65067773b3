// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use serde_json::json;

use super::*;
use yare::parameterized;

#[test]
fn pairing_without_requires_approval_is_rejected() {
    let data = json!({ "token": "t", "clientId": "c" });
    let err = PairingGrant::decode(Some(&data)).unwrap_err();
    assert!(matches!(err, ShapeError::Mismatch { kind: ResponseKind::Pairing, .. }));
    assert!(err.to_string().contains("requiresApproval"));
}

#[test]
fn pairing_immediate_grant() {
    let data = json!({ "requiresApproval": false, "token": "t", "clientId": "c" });
    let grant = PairingGrant::decode(Some(&data)).unwrap();
    assert!(!grant.requires_approval);
    assert_eq!(grant.token, "t");
    assert_eq!(grant.client_id, "c");
}

#[test]
fn pairing_with_empty_token_breaks_invariant() {
    let data = json!({ "requiresApproval": false, "token": "", "clientId": "c" });
    assert!(matches!(
        PairingGrant::decode(Some(&data)),
        Err(ShapeError::Invariant { .. })
    ));
}

#[test]
fn status_decodes() {
    let data = json!({
        "state": "playing",
        "volume": 0.8,
        "position": 12.5,
        "duration": 200.0,
        "track": { "path": "/m/a.flac", "title": "A" },
        "queueLength": 3
    });
    let status = PlaybackStatus::decode(Some(&data)).unwrap();
    assert_eq!(status.state, PlaybackState::Playing);
    assert_eq!(status.queue_length, 3);
    assert_eq!(status.track.unwrap().title.as_deref(), Some("A"));
}

#[parameterized(
    volume_too_loud = { json!({ "state": "paused", "volume": 1.5 }) },
    unknown_state = { json!({ "state": "rewinding", "volume": 0.5 }) },
    missing_volume = { json!({ "state": "paused" }) },
    negative_position = { json!({ "state": "paused", "volume": 0.5, "position": -3.0 }) },
    not_an_object = { json!(["playing", 0.5]) },
)]
fn status_shape_violations(data: serde_json::Value) {
    assert!(ResponseKind::Status.validate(Some(&data)).is_err());
}

#[test]
fn missing_data_is_reported() {
    let err = ResponseKind::AudioData.validate(None).unwrap_err();
    assert_eq!(err, ShapeError::MissingData { kind: ResponseKind::AudioData });
    assert_eq!(err.to_string(), "invalid audio-data response: missing data");
}

#[test]
fn ack_accepts_anything() {
    assert!(ResponseKind::Ack.validate(None).is_ok());
    assert!(ResponseKind::Ack.validate(Some(&json!(42))).is_ok());
}

#[test]
fn complete_scan_requires_results() {
    let data = json!({ "state": "complete", "percentage": 100.0 });
    let err = ScanStatus::decode(Some(&data)).unwrap_err();
    assert!(matches!(err, ShapeError::Invariant { .. }));

    let data = json!({ "state": "complete", "results": { "tracksAdded": 4 } });
    let status = ScanStatus::decode(Some(&data)).unwrap();
    assert_eq!(status.completed_results().unwrap().tracks_added, 4);
}

#[test]
fn scan_kind_reports_its_own_name() {
    let err = ResponseKind::Scan.validate(Some(&json!({ "state": "bogus" }))).unwrap_err();
    assert_eq!(err.kind(), ResponseKind::Scan);
}

#[test]
fn scan_percentage_is_bounded() {
    let data = json!({ "state": "running", "percentage": 140.0 });
    assert!(ScanStatus::decode(Some(&data)).is_err());
}

#[test]
fn settings_keep_unknown_keys() {
    let data = json!({ "musicDirectories": ["/m"], "crossfade": 2 });
    let settings = DaemonSettings::decode(Some(&data)).unwrap();
    assert_eq!(settings.music_directories, vec!["/m"]);
    assert_eq!(settings.extra.get("crossfade"), Some(&json!(2)));

    let back = serde_json::to_value(&settings).unwrap();
    assert_eq!(back["crossfade"], json!(2));
}

#[test]
fn audio_frame_decodes() {
    let data = json!({ "bands": [0.0, 0.25, 1.0], "peak": 0.9 });
    let frame = AudioFrame::decode(Some(&data)).unwrap();
    assert_eq!(frame.bands.len(), 3);
    assert_eq!(frame.peak, Some(0.9));
}

#[test]
fn scan_state_terminal() {
    assert!(ScanState::Complete.is_terminal());
    assert!(ScanState::Error.is_terminal());
    assert!(!ScanState::Running.is_terminal());
    assert!(!ScanState::Idle.is_terminal());
}
