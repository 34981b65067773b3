// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use crate::test_helpers::{wait_until, within, FakeDaemon};
use ph_ipc::framing::MAX_FRAME_SIZE;
use std::sync::atomic::AtomicUsize;
use tokio::io::{duplex, AsyncBufReadExt, BufReader};

#[derive(Default)]
struct Recorder {
    frames: Mutex<Vec<String>>,
    writer: Mutex<Option<FrameWriter>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl Recorder {
    fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl FrameHandler for Recorder {
    fn on_open(&self, writer: FrameWriter) {
        self.opened.fetch_add(1, Ordering::SeqCst);
        *self.writer.lock().unwrap() = Some(writer);
    }

    fn on_frame(&self, line: &str) {
        self.frames.lock().unwrap().push(line.to_string());
    }

    fn on_close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn endpoint_parse() {
    assert_eq!(
        Endpoint::parse(r"\\.\pipe\phono-alice"),
        Endpoint::Pipe(r"\\.\pipe\phono-alice".to_string())
    );
    assert_eq!(
        Endpoint::parse("/tmp/phono-1000.sock"),
        Endpoint::Unix(PathBuf::from("/tmp/phono-1000.sock"))
    );
}

#[cfg(unix)]
#[test]
fn default_endpoint_is_per_user_socket() {
    let Endpoint::Unix(path) = Endpoint::default_for_user() else {
        unreachable!("unix default is a socket path");
    };
    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert_eq!(name, format!("phono-{}.sock", current_uid()));
    assert_eq!(path.parent().unwrap(), std::env::temp_dir());
}

#[tokio::test]
async fn frames_in_one_write_arrive_in_order() {
    let transport = Transport::new();
    let recorder = Arc::new(Recorder::default());
    let (stream, mut daemon) = FakeDaemon::pair();
    transport.attach(stream, "test".to_string(), recorder.clone());

    daemon.send_line("{\"a\":1}\n{\"b\":2}\n{\"c\":3}").await;

    assert!(wait_until(|| recorder.frames().len() == 3).await);
    assert_eq!(
        recorder.frames(),
        vec!["{\"a\":1}", "{\"b\":2}", "{\"c\":3}"]
    );
    assert!(transport.is_connected());
}

#[tokio::test]
async fn split_frame_is_delivered_whole() {
    let transport = Transport::new();
    let recorder = Arc::new(Recorder::default());
    let (client, mut server) = duplex(1024);
    transport.attach(client, "test".to_string(), recorder.clone());

    server.write_all(b"{\"success\":tr").await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(recorder.frames().is_empty());

    server.write_all(b"ue}\n").await.unwrap();
    assert!(wait_until(|| recorder.frames().len() == 1).await);
    assert_eq!(recorder.frames(), vec!["{\"success\":true}"]);
}

#[tokio::test]
async fn eof_closes_once() {
    let transport = Transport::new();
    let mut events = transport.subscribe();
    let recorder = Arc::new(Recorder::default());
    let (stream, daemon) = FakeDaemon::pair();
    transport.attach(stream, "test".to_string(), recorder.clone());

    assert!(matches!(
        within(events.recv()).await.unwrap(),
        ConnectionEvent::Connected { .. }
    ));

    daemon.hang_up().await;
    assert_eq!(
        within(events.recv()).await.unwrap(),
        ConnectionEvent::Disconnected
    );
    assert!(wait_until(|| recorder.closed() == 1).await);
    assert!(!transport.is_connected());

    transport.disconnect();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(recorder.closed(), 1);
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn explicit_disconnect_closes_once() {
    let transport = Transport::new();
    let mut events = transport.subscribe();
    let recorder = Arc::new(Recorder::default());
    let (stream, mut daemon) = FakeDaemon::pair();
    transport.attach(stream, "test".to_string(), recorder.clone());
    let _ = within(events.recv()).await;

    transport.disconnect();
    assert_eq!(recorder.closed(), 1);
    assert_eq!(transport.state().get(), ConnectionState::Disconnected);
    assert_eq!(
        within(events.recv()).await.unwrap(),
        ConnectionEvent::Disconnected
    );

    assert!(daemon.closed().await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(recorder.closed(), 1);
}

#[tokio::test]
async fn writer_terminates_frames() {
    let transport = Transport::new();
    let recorder = Arc::new(Recorder::default());
    let (client, server) = duplex(1024);
    transport.attach(client, "test".to_string(), recorder.clone());

    let writer = recorder.writer.lock().unwrap().clone().unwrap();
    writer.write_frame(r#"{"cmd":"status"}"#).await.unwrap();
    writer.write_frame(r#"{"cmd":"pause"}"#).await.unwrap();

    let mut lines = BufReader::new(server).lines();
    assert_eq!(
        within(lines.next_line()).await.unwrap().unwrap(),
        r#"{"cmd":"status"}"#
    );
    assert_eq!(
        within(lines.next_line()).await.unwrap().unwrap(),
        r#"{"cmd":"pause"}"#
    );
}

#[tokio::test]
async fn oversized_frame_drops_connection() {
    let transport = Transport::new();
    let mut events = transport.subscribe();
    let recorder = Arc::new(Recorder::default());
    let (client, mut server) = duplex(64 * 1024);
    transport.attach(client, "test".to_string(), recorder.clone());
    let _ = within(events.recv()).await;

    let chunk = vec![b'x'; 64 * 1024];
    let writer = tokio::spawn(async move {
        for _ in 0..20 {
            if server.write_all(&chunk).await.is_err() {
                break;
            }
        }
    });

    let event = within(events.recv()).await.unwrap();
    assert!(matches!(event, ConnectionEvent::Error(ref msg) if msg.contains("frame too large")));
    assert_eq!(
        within(events.recv()).await.unwrap(),
        ConnectionEvent::Disconnected
    );
    assert!(recorder.frames().is_empty());
    writer.abort();
}

#[tokio::test]
async fn frame_ahead_of_oversized_tail_is_delivered_before_close() {
    let transport = Transport::new();
    let mut events = transport.subscribe();
    let recorder = Arc::new(Recorder::default());
    let (client, mut server) = duplex(64 * 1024);
    transport.attach(client, "test".to_string(), recorder.clone());
    let _ = within(events.recv()).await;

    let mut stream = b"{\"success\":true}\n".to_vec();
    stream.extend(vec![b'x'; MAX_FRAME_SIZE + 1]);
    let writer = tokio::spawn(async move {
        let _ = server.write_all(&stream).await;
    });

    let event = within(events.recv()).await.unwrap();
    assert!(matches!(event, ConnectionEvent::Error(ref msg) if msg.contains("frame too large")));
    assert_eq!(
        within(events.recv()).await.unwrap(),
        ConnectionEvent::Disconnected
    );
    assert_eq!(recorder.frames(), vec![r#"{"success":true}"#]);
    writer.abort();
}

#[tokio::test]
async fn reattach_closes_previous_link() {
    let transport = Transport::new();
    let first = Arc::new(Recorder::default());
    let second = Arc::new(Recorder::default());
    let (a, _daemon_a) = FakeDaemon::pair();
    let (b, _daemon_b) = FakeDaemon::pair();

    transport.attach(a, "first".to_string(), first.clone());
    transport.attach(b, "second".to_string(), second.clone());

    assert_eq!(first.closed(), 1);
    assert_eq!(second.closed(), 0);
    assert!(transport.is_connected());
}

#[cfg(unix)]
#[tokio::test]
async fn connect_to_missing_socket_fails() {
    let temp = tempfile::TempDir::new().unwrap();
    let endpoint = Endpoint::Unix(temp.path().join("absent.sock"));
    let transport = Transport::new();

    let err = transport
        .connect(
            &endpoint,
            Duration::from_millis(200),
            Arc::new(Recorder::default()),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connection { .. }));
    assert!(err.to_string().contains("absent.sock"));
    assert_eq!(transport.state().get(), ConnectionState::Disconnected);
}

#[cfg(unix)]
#[tokio::test]
async fn connect_to_listening_socket() {
    let temp = tempfile::TempDir::new().unwrap();
    let path = temp.path().join("phono.sock");
    let listener = tokio::net::UnixListener::bind(&path).unwrap();
    let accept = tokio::spawn(async move { listener.accept().await.map(|(stream, _)| stream) });

    let transport = Transport::new();
    let mut events = transport.subscribe();
    let recorder = Arc::new(Recorder::default());
    transport
        .connect(
            &Endpoint::Unix(path.clone()),
            Duration::from_millis(500),
            recorder.clone(),
        )
        .await
        .unwrap();

    let _server = within(accept).await.unwrap().unwrap();
    assert!(transport.is_connected());
    assert_eq!(recorder.opened.load(Ordering::SeqCst), 1);
    assert_eq!(
        within(events.recv()).await.unwrap(),
        ConnectionEvent::Connected {
            endpoint: path.display().to_string()
        }
    );
}
