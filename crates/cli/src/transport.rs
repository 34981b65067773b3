// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Duplex stream to the daemon.
//!
//! The transport owns the socket (or named pipe). Once a stream is attached,
//! one reader task feeds inbound bytes through a [`LineFramer`] and hands each
//! complete line to a [`FrameHandler`]. Writes go through a cloneable
//! [`FrameWriter`] that serializes access to the write half.
//!
//! `Disconnected` is published exactly once per attached stream, whether the
//! stream ended by EOF, a read error, a framing error, or [`Transport::disconnect`].

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use ph_ipc::framing::{frame_line, LineFramer};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::connection::{ConnectionEvent, ConnectionState, SharedConnectionState};
use crate::error::{Error, Result};

/// Prefix identifying a Windows named pipe address.
pub const PIPE_PREFIX: &str = r"\\.\pipe\";

const READ_BUFFER_SIZE: usize = 8 * 1024;
const EVENT_CAPACITY: usize = 16;

/// Address of the daemon's listening endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// Unix domain socket path.
    Unix(PathBuf),
    /// Windows named pipe name, including the `\\.\pipe\` prefix.
    Pipe(String),
}

impl Endpoint {
    /// The per-user default address.
    ///
    /// `<tmpdir>/phono-<uid>.sock` on POSIX, `\\.\pipe\phono-<username>` on
    /// Windows.
    pub fn default_for_user() -> Self {
        #[cfg(windows)]
        {
            let user = std::env::var("USERNAME").unwrap_or_else(|_| "default".to_string());
            Endpoint::Pipe(format!("{}phono-{}", PIPE_PREFIX, user))
        }
        #[cfg(not(windows))]
        {
            Endpoint::Unix(std::env::temp_dir().join(format!("phono-{}.sock", current_uid())))
        }
    }

    /// Interpret a configured address.
    pub fn parse(address: &str) -> Self {
        if address.starts_with(PIPE_PREFIX) {
            Endpoint::Pipe(address.to_string())
        } else {
            Endpoint::Unix(PathBuf::from(address))
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Unix(path) => write!(f, "{}", path.display()),
            Endpoint::Pipe(name) => write!(f, "{}", name),
        }
    }
}

#[cfg(unix)]
fn current_uid() -> u32 {
    nix::unistd::getuid().as_raw()
}

#[cfg(not(unix))]
fn current_uid() -> u32 {
    0
}

/// Byte stream usable as a daemon connection.
pub trait Duplex: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> Duplex for T {}

async fn open_stream(endpoint: &Endpoint) -> io::Result<Box<dyn Duplex>> {
    match endpoint {
        #[cfg(unix)]
        Endpoint::Unix(path) => Ok(Box::new(tokio::net::UnixStream::connect(path).await?)),
        #[cfg(windows)]
        Endpoint::Pipe(name) => {
            let pipe = tokio::net::windows::named_pipe::ClientOptions::new().open(name)?;
            Ok(Box::new(pipe))
        }
        other => Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("{} is not supported on this platform", other),
        )),
    }
}

/// Receives everything that happens on an attached stream.
///
/// Called from the reader task; implementations must not block.
pub trait FrameHandler: Send + Sync {
    /// A stream was attached. Outbound frames go through `writer`.
    fn on_open(&self, writer: FrameWriter);

    /// One complete inbound line, without its terminator.
    fn on_frame(&self, line: &str);

    /// The stream closed. Called once per `on_open`.
    fn on_close(&self);
}

/// Shared handle to the write half of the stream.
#[derive(Clone)]
pub struct FrameWriter {
    inner: Arc<tokio::sync::Mutex<Box<dyn AsyncWrite + Send + Unpin>>>,
}

impl FrameWriter {
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            inner: Arc::new(tokio::sync::Mutex::new(Box::new(writer))),
        }
    }

    /// Write one encoded frame followed by `\n`, and flush.
    pub async fn write_frame(&self, encoded: &str) -> io::Result<()> {
        let line = frame_line(encoded);
        let mut writer = self.inner.lock().await;
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await
    }

    pub async fn shutdown(&self) -> io::Result<()> {
        self.inner.lock().await.shutdown().await
    }
}

impl fmt::Debug for FrameWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameWriter").finish_non_exhaustive()
    }
}

/// One attached stream.
struct Link {
    id: u64,
    closed: AtomicBool,
    handler: Arc<dyn FrameHandler>,
    state: Arc<SharedConnectionState>,
    events: broadcast::Sender<ConnectionEvent>,
}

impl Link {
    /// Tear down this link. Only the first call has any effect.
    fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        debug!(link = self.id, "connection closed");
        self.state.set(ConnectionState::Disconnected);
        self.handler.on_close();
        let _ = self.events.send(ConnectionEvent::Disconnected);
    }

    fn report(&self, message: String) {
        let _ = self.events.send(ConnectionEvent::Error(message));
    }
}

struct Session {
    link: Arc<Link>,
    writer: FrameWriter,
    reader: JoinHandle<()>,
}

/// Owner of the single connection to the daemon.
pub struct Transport {
    state: Arc<SharedConnectionState>,
    events: broadcast::Sender<ConnectionEvent>,
    session: Mutex<Option<Session>>,
    next_link: AtomicU64,
}

impl Transport {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            state: Arc::new(SharedConnectionState::new()),
            events,
            session: Mutex::new(None),
            next_link: AtomicU64::new(1),
        }
    }

    pub fn state(&self) -> &Arc<SharedConnectionState> {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Subscribe to connection events.
    pub fn subscribe(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.events.subscribe()
    }

    /// Open a stream to `endpoint` and attach it.
    ///
    /// Any existing connection is closed first. Fails with
    /// [`Error::Connection`] if the stream cannot be opened within `timeout`.
    pub async fn connect(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
        handler: Arc<dyn FrameHandler>,
    ) -> Result<()> {
        self.disconnect();
        self.state.set(ConnectionState::Connecting);

        let reason = match tokio::time::timeout(timeout, open_stream(endpoint)).await {
            Ok(Ok(stream)) => {
                self.attach(stream, endpoint.to_string(), handler);
                return Ok(());
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("timed out after {}ms", timeout.as_millis()),
        };

        self.state.set(ConnectionState::Disconnected);
        let _ = self.events.send(ConnectionEvent::Error(reason.clone()));
        Err(Error::Connection {
            endpoint: endpoint.to_string(),
            reason,
        })
    }

    /// Attach an already-open stream.
    ///
    /// Must be called within a tokio runtime; the reader task is spawned here.
    pub fn attach<S>(&self, stream: S, peer: String, handler: Arc<dyn FrameHandler>)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.disconnect();

        let (reader, writer) = tokio::io::split(stream);
        let writer = FrameWriter::new(writer);
        let link = Arc::new(Link {
            id: self.next_link.fetch_add(1, Ordering::Relaxed),
            closed: AtomicBool::new(false),
            handler: Arc::clone(&handler),
            state: Arc::clone(&self.state),
            events: self.events.clone(),
        });

        debug!(link = link.id, peer = %peer, "connection open");
        self.state.set(ConnectionState::Connected);
        self.state.set_attempt(0);
        handler.on_open(writer.clone());
        let _ = self.events.send(ConnectionEvent::Connected { endpoint: peer });

        let reader = tokio::spawn(read_frames(reader, Arc::clone(&link)));
        *self.session() = Some(Session {
            link,
            writer,
            reader,
        });
    }

    /// Close the current connection, if any.
    ///
    /// Pending requests are rejected before this returns.
    pub fn disconnect(&self) {
        let Some(session) = self.session().take() else {
            return;
        };
        session.reader.abort();
        session.link.close();

        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            let writer = session.writer;
            runtime.spawn(async move {
                let _ = writer.shutdown().await;
            });
        }
    }

    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Transport {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Transport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn read_frames<R>(mut reader: R, link: Arc<Link>)
where
    R: AsyncRead + Unpin,
{
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let n = match reader.read(&mut buf).await {
            Ok(0) => {
                debug!(link = link.id, "daemon closed the connection");
                break;
            }
            Ok(n) => n,
            Err(e) => {
                warn!(link = link.id, error = %e, "read from daemon failed");
                link.report(e.to_string());
                break;
            }
        };

        let framed = framer.push(&buf[..n]);
        for frame in framed.frames {
            trace!(link = link.id, frame = %frame, "inbound frame");
            link.handler.on_frame(&frame);
        }
        if let Some(e) = framed.overflow {
            warn!(link = link.id, error = %e, "dropping connection");
            link.report(Error::Protocol(e.to_string()).to_string());
            break;
        }
    }

    link.close();
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
