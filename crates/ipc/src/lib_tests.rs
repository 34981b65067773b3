// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for command encoding and frame classification.

#![allow(clippy::unwrap_used)]

use serde_json::json;

use super::*;
use yare::parameterized;

#[parameterized(
    pause = { Command::Pause, "pause" },
    resume = { Command::Resume, "resume" },
    stop = { Command::Stop, "stop" },
    next = { Command::Next, "next" },
    prev = { Command::Prev, "prev" },
    status = { Command::Status, "status" },
    get_audio_data = { Command::GetAudioData, "getAudioData" },
    subscribe = { Command::SubscribeAudioData, "subscribeAudioData" },
    unsubscribe = { Command::UnsubscribeAudioData, "unsubscribeAudioData" },
    get_config = { Command::GetConfig, "getConfig" },
    get_scan_status = { Command::GetScanStatus, "getScanStatus" },
)]
fn bare_commands_have_no_payload(command: Command, name: &str) {
    assert_eq!(command.name(), name);
    assert_eq!(command.payload(), None);

    let line = command.encode(None).unwrap();
    assert_eq!(line, format!("{{\"cmd\":\"{}\"}}", name));
}

#[test]
fn encode_round_trips_cmd_and_data() {
    let payload = json!({ "paths": ["/music/a.flac", "/music/b.flac"] });
    let line = encode("queue", Some(&payload), None);

    let request = Request::from_json(&line).unwrap();
    assert_eq!(request.cmd, "queue");
    assert_eq!(request.data, Some(payload));
    assert_eq!(request.token, None);
}

#[test]
fn encode_includes_token_only_when_present() {
    let with = encode("status", None, Some("secret"));
    let without = encode("status", None, None);

    assert_eq!(Request::from_json(&with).unwrap().token.as_deref(), Some("secret"));
    assert!(!without.contains("token"));
    assert!(!without.contains("data"));
}

#[test]
fn encoded_frames_are_single_line() {
    let command = Command::Play {
        path: Some("/music/line\nbreak.flac".to_string()),
    };
    let line = command.encode(Some("t")).unwrap();
    assert!(!line.contains('\n'));
}

#[test]
fn decode_not_json_is_a_failed_response() {
    let response = decode("not json");
    assert!(!response.success);
    assert!(response.error.unwrap().contains("parse"));
}

#[test]
fn decode_success_response() {
    let response = decode(r#"{"success":true,"data":{"x":1}}"#);
    assert!(response.success);
    assert_eq!(response.data, Some(json!({ "x": 1 })));
    assert_eq!(response.error, None);
}

#[test]
fn decode_daemon_failure_keeps_message() {
    let response = decode(r#"{"success":false,"error":"no such file"}"#);
    assert!(!response.success);
    assert_eq!(response.error_message(), "no such file");
}

#[parameterized(
    below = { -0.1 },
    above = { 1.1 },
    nan = { f64::NAN },
)]
fn volume_out_of_range_is_rejected(level: f64) {
    assert!(matches!(
        Command::volume(level),
        Err(ValidationError::VolumeOutOfRange(_))
    ));
}

#[parameterized(
    zero = { 0.0 },
    half = { 0.5 },
    one = { 1.0 },
)]
fn volume_in_range_is_accepted(level: f64) {
    let command = Command::volume(level).unwrap();
    assert_eq!(command.payload(), Some(json!({ "level": level })));
}

#[test]
fn invalid_volume_never_encodes() {
    let command = Command::Volume { level: 2.0 };
    assert_eq!(
        command.encode(None),
        Err(ValidationError::VolumeOutOfRange(2.0))
    );
}

#[parameterized(
    negative = { -1.0 },
    infinite = { f64::INFINITY },
)]
fn seek_rejects_invalid_positions(position: f64) {
    assert!(Command::seek(position).is_err());
}

#[test]
fn queue_requires_paths() {
    assert_eq!(Command::queue(vec![]), Err(ValidationError::EmptyPathList));
    assert_eq!(
        Command::queue(vec!["".to_string()]),
        Err(ValidationError::EmptyPath)
    );
}

#[test]
fn pair_requires_client_name() {
    assert_eq!(Command::pair("  "), Err(ValidationError::EmptyClientName));
    let command = Command::pair("desk").unwrap();
    assert_eq!(command.payload(), Some(json!({ "clientName": "desk" })));
    assert_eq!(command.response_kind(), ResponseKind::Pairing);
}

#[test]
fn scan_without_paths_sends_no_payload() {
    let command = Command::ScanLibrary { paths: vec![] };
    assert_eq!(command.payload(), None);
    assert_eq!(command.response_kind(), ResponseKind::Scan);
}

#[test]
fn classify_response_frame() {
    let inbound = Inbound::classify(r#"{"success":true}"#);
    assert_eq!(
        inbound,
        Inbound::Response(Response {
            success: true,
            data: None,
            error: None
        })
    );
}

#[test]
fn classify_push_frame() {
    let inbound = Inbound::classify(r#"{"type":"audioData","data":{"bands":[0.1,0.2]}}"#);
    match inbound {
        Inbound::Push(push) => {
            assert_eq!(push.push_kind(), Some(PushKind::AudioData));
            assert_eq!(push.data, json!({ "bands": [0.1, 0.2] }));
        }
        other => panic!("expected push, got {:?}", other),
    }
}

#[test]
fn frame_with_type_and_success_is_a_response() {
    let inbound = Inbound::classify(r#"{"type":"audioData","success":false,"error":"x"}"#);
    assert!(matches!(inbound, Inbound::Response(r) if !r.success));
}

#[test]
fn push_with_non_string_type_is_undecodable() {
    let inbound = Inbound::classify(r#"{"type":7,"data":{}}"#);
    assert!(matches!(inbound, Inbound::Undecodable(_)));
}

#[test]
fn unknown_push_type_has_no_kind() {
    let inbound = Inbound::classify(r#"{"type":"lyrics","data":{}}"#);
    match inbound {
        Inbound::Push(push) => assert_eq!(push.push_kind(), None),
        other => panic!("expected push, got {:?}", other),
    }
}

#[test]
fn classify_garbage_is_failed_response() {
    match Inbound::classify("{oops") {
        Inbound::Response(r) => {
            assert!(!r.success);
            assert!(r.error_message().starts_with("parse error"));
        }
        other => panic!("expected response, got {:?}", other),
    }
}

#[test]
fn push_kind_commands() {
    assert_eq!(
        PushKind::AudioData.subscribe_command(),
        Command::SubscribeAudioData
    );
    assert_eq!(
        PushKind::AudioData.unsubscribe_command(),
        Command::UnsubscribeAudioData
    );
    assert_eq!(PushKind::AudioData.to_string(), "audioData");
}
