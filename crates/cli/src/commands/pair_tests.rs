// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

#[parameterized(
    enter = { "\n", true },
    yes = { "y\n", true },
    yes_word = { " Yes \n", true },
    no = { "n\n", false },
    other = { "later\n", false },
)]
fn test_accepts(line: &str, expected: bool) {
    assert_eq!(accepts(line), expected);
}

#[test]
fn test_approval_text_prefers_daemon_message() {
    let request = ApprovalRequest {
        client_name: "studio".to_string(),
        client_id: "c-1".to_string(),
        message: Some("Approve in the tray".to_string()),
    };
    assert_eq!(approval_text(&request), "Approve in the tray");
}

#[test]
fn test_approval_text_default() {
    let request = ApprovalRequest {
        client_name: "studio".to_string(),
        client_id: "c-1".to_string(),
        message: None,
    };
    assert_eq!(
        approval_text(&request),
        "The daemon needs to approve 'studio' (client id c-1)."
    );
}
