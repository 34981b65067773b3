// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use yare::parameterized;

#[parameterized(
    boolean = { "true", json!(true) },
    number = { "0.75", json!(0.75) },
    quoted = { "\"hw:1\"", json!("hw:1") },
    bare_word = { "hw:1", json!("hw:1") },
    array = { "[\"/music\"]", json!(["/music"]) },
)]
fn test_parse_value(raw: &str, expected: Value) {
    assert_eq!(parse_value(raw), expected);
}

#[test]
fn test_flatten_keeps_unknown_keys() {
    let settings: DaemonSettings = serde_json::from_value(json!({
        "musicDirectories": ["/music"],
        "gapless": true
    }))
    .unwrap();

    let map = flatten(&settings).unwrap();
    assert_eq!(map["musicDirectories"], json!(["/music"]));
    assert_eq!(map["gapless"], json!(true));
    assert!(!map.contains_key("outputDevice"));
}

#[test]
fn test_format_settings_sorted() {
    let map = json!({ "zeta": 1, "alpha": "x" });
    let Value::Object(map) = map else {
        unreachable!()
    };
    assert_eq!(format_settings(&map), "alpha = \"x\"\nzeta = 1\n");
}
