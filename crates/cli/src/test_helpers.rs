// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: an in-memory daemon on the far end of a duplex stream.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use ph_ipc::{PushMessage, Request, Response};
use serde_json::Value;
use tokio::io::{
    duplex, AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf,
};

use crate::client::DaemonClient;
use crate::config::ClientConfig;

const STEP: Duration = Duration::from_secs(2);

/// Daemon side of a test connection.
pub struct FakeDaemon {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl FakeDaemon {
    /// Create a connected pair: the client-side stream and the fake daemon.
    pub fn pair() -> (DuplexStream, FakeDaemon) {
        let (client, daemon) = duplex(64 * 1024);
        let (reader, writer) = tokio::io::split(daemon);
        let daemon = FakeDaemon {
            lines: BufReader::new(reader).lines(),
            writer,
        };
        (client, daemon)
    }

    /// Next command line written by the client.
    pub async fn next_request(&mut self) -> Request {
        let line = tokio::time::timeout(STEP, self.lines.next_line())
            .await
            .expect("timed out waiting for a request")
            .unwrap()
            .expect("client closed the stream");
        Request::from_json(&line).unwrap()
    }

    /// True if no request arrives within `window`.
    pub async fn quiet_for(&mut self, window: Duration) -> bool {
        tokio::time::timeout(window, self.lines.next_line())
            .await
            .is_err()
    }

    /// True once the client side has closed the stream.
    pub async fn closed(&mut self) -> bool {
        matches!(
            tokio::time::timeout(STEP, self.lines.next_line()).await,
            Ok(Ok(None)) | Ok(Err(_))
        )
    }

    pub async fn send_line(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    pub async fn reply(&mut self, response: Response) {
        self.send_line(&response.to_json()).await;
    }

    pub async fn reply_ok(&mut self, data: Value) {
        self.reply(Response::ok(data)).await;
    }

    pub async fn ack(&mut self) {
        self.send_line(r#"{"success":true}"#).await;
    }

    pub async fn push(&mut self, kind: &str, data: Value) {
        let message = PushMessage {
            kind: kind.to_string(),
            data,
        };
        self.send_line(&message.to_json()).await;
    }

    /// Close the daemon side of the stream.
    pub async fn hang_up(mut self) {
        let _ = self.writer.shutdown().await;
    }
}

/// A client attached to a fresh [`FakeDaemon`].
pub fn connected_client(config: ClientConfig) -> (Arc<DaemonClient>, FakeDaemon) {
    let client = Arc::new(DaemonClient::new(&config));
    let (stream, daemon) = FakeDaemon::pair();
    client.attach_stream(stream, "fake-daemon");
    (client, daemon)
}

/// Config with a short request timeout for tests.
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        request_timeout_ms: 200,
        connect_timeout_ms: 500,
        poll_interval_ms: 10,
        startup_backoff_ms: 20,
        stop_grace_ms: 500,
        ..ClientConfig::default()
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + STEP;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

/// Await `future` with a two second limit.
pub async fn within<F: Future>(future: F) -> F::Output {
    tokio::time::timeout(STEP, future)
        .await
        .expect("future did not complete in time")
}
