// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the media daemon.
//!
//! [`DaemonClient`] wires the transport, the request dispatcher and the push
//! hub together and exposes one typed method per protocol command. It does
//! not start the daemon; see [`crate::supervisor`] for that.

use std::future::Future;
use std::sync::Arc;

use ph_ipc::{
    AudioFrame, Command, DaemonSettings, Inbound, PairingGrant, Payload, PlaybackStatus,
    PushKind, Response, ScanStatus,
};
use serde_json::{Map, Value};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::broadcast;
use tracing::debug;

use crate::config::ClientConfig;
use crate::connection::{ConnectionEvent, ConnectionState};
use crate::dispatch::Dispatcher;
use crate::error::{Error, Result};
use crate::push::{PushHub, Subscription};
use crate::transport::{Endpoint, FrameHandler, FrameWriter, Transport};

/// Routes inbound frames to the dispatcher or the push hub.
struct Router {
    dispatcher: Dispatcher,
    push: PushHub,
}

impl FrameHandler for Router {
    fn on_open(&self, writer: FrameWriter) {
        self.dispatcher.attach(writer);
    }

    fn on_frame(&self, line: &str) {
        match Inbound::classify(line) {
            Inbound::Response(response) => self.dispatcher.on_response(response),
            Inbound::Push(message) => {
                self.push.publish(message);
            }
            Inbound::Undecodable(reason) => {
                debug!(reason = %reason, "dropping undecodable push frame");
            }
        }
    }

    fn on_close(&self) {
        self.dispatcher.on_disconnect();
        self.push.close_all();
    }
}

/// Connection to one daemon.
pub struct DaemonClient {
    endpoint: Endpoint,
    connect_timeout: std::time::Duration,
    transport: Transport,
    dispatcher: Dispatcher,
    push: PushHub,
    router: Arc<Router>,
}

impl DaemonClient {
    pub fn new(config: &ClientConfig) -> Self {
        let dispatcher = Dispatcher::new(config.request_timeout());
        let push = PushHub::new();
        let router = Arc::new(Router {
            dispatcher: dispatcher.clone(),
            push: push.clone(),
        });
        Self {
            endpoint: config.endpoint(),
            connect_timeout: config.connect_timeout(),
            transport: Transport::new(),
            dispatcher,
            push,
            router,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Open the connection. Replaces any existing one.
    pub async fn connect(&self) -> Result<()> {
        self.transport
            .connect(&self.endpoint, self.connect_timeout, self.router.clone())
            .await
    }

    /// Attach an already-open stream in place of [`connect`](Self::connect).
    pub fn attach_stream<S>(&self, stream: S, peer: &str)
    where
        S: AsyncRead + AsyncWrite + Send + 'static,
    {
        self.transport
            .attach(stream, peer.to_string(), self.router.clone());
    }

    /// Close the connection. Pending requests fail with
    /// [`Error::Disconnected`] before this returns.
    pub fn disconnect(&self) {
        self.transport.disconnect();
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.transport.state().get()
    }

    /// Human-readable connection status.
    pub fn status_string(&self) -> String {
        self.transport.state().status_string()
    }

    pub(crate) fn set_connect_attempt(&self, attempt: u32) {
        self.transport.state().set_attempt(attempt);
    }

    /// Subscribe to connection events.
    pub fn events(&self) -> broadcast::Receiver<ConnectionEvent> {
        self.transport.subscribe()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn set_token(&self, token: Option<String>) {
        self.dispatcher.set_token(token);
    }

    pub fn token(&self) -> Option<String> {
        self.dispatcher.token()
    }

    /// Queue a command and return its raw response.
    pub fn submit(&self, command: &Command) -> impl Future<Output = Result<Response>> + Send + 'static {
        self.dispatcher.submit(command)
    }

    /// Send `command` and check the response.
    ///
    /// `success: false` becomes [`Error::Daemon`]. Successful responses must
    /// match the command's response kind or the call fails with
    /// [`Error::InvalidResponse`].
    pub async fn execute(&self, command: &Command) -> Result<Response> {
        let response = self.submit(command).await?;
        if !response.success {
            return Err(Error::Daemon(response.error_message().to_string()));
        }
        command.response_kind().validate(response.data.as_ref())?;
        Ok(response)
    }

    /// Send `command` and decode its payload as `T`.
    pub async fn call<T: Payload>(&self, command: &Command) -> Result<T> {
        let response = self.submit(command).await?;
        if !response.success {
            return Err(Error::Daemon(response.error_message().to_string()));
        }
        Ok(response.payload::<T>()?)
    }

    pub async fn pair(&self, client_name: &str) -> Result<PairingGrant> {
        self.call(&Command::pair(client_name)?).await
    }

    pub async fn play(&self, path: Option<String>) -> Result<()> {
        self.ack(&Command::Play { path }).await
    }

    pub async fn pause(&self) -> Result<()> {
        self.ack(&Command::Pause).await
    }

    pub async fn resume(&self) -> Result<()> {
        self.ack(&Command::Resume).await
    }

    pub async fn stop(&self) -> Result<()> {
        self.ack(&Command::Stop).await
    }

    pub async fn next(&self) -> Result<()> {
        self.ack(&Command::Next).await
    }

    pub async fn prev(&self) -> Result<()> {
        self.ack(&Command::Prev).await
    }

    pub async fn queue(&self, paths: Vec<String>) -> Result<()> {
        self.ack(&Command::queue(paths)?).await
    }

    pub async fn seek(&self, position: f64) -> Result<()> {
        self.ack(&Command::seek(position)?).await
    }

    pub async fn set_volume(&self, level: f64) -> Result<()> {
        self.ack(&Command::volume(level)?).await
    }

    pub async fn status(&self) -> Result<PlaybackStatus> {
        self.call(&Command::Status).await
    }

    pub async fn audio_data(&self) -> Result<AudioFrame> {
        self.call(&Command::GetAudioData).await
    }

    /// Ask the daemon to stream `kind` and return a local subscription.
    ///
    /// The listener is registered before the command is sent so no frame
    /// emitted right after the acknowledgement is missed.
    pub async fn subscribe(&self, kind: PushKind) -> Result<Subscription> {
        let subscription = self.push.listen(kind);
        self.ack(&kind.subscribe_command()).await?;
        Ok(subscription)
    }

    /// Stop the daemon streaming `kind` and end local subscriptions.
    pub async fn unsubscribe(&self, kind: PushKind) -> Result<()> {
        let result = self.ack(&kind.unsubscribe_command()).await;
        self.push.close(kind);
        result
    }

    pub async fn subscribe_audio_data(&self) -> Result<Subscription> {
        self.subscribe(PushKind::AudioData).await
    }

    pub async fn unsubscribe_audio_data(&self) -> Result<()> {
        self.unsubscribe(PushKind::AudioData).await
    }

    pub async fn get_config(&self) -> Result<DaemonSettings> {
        self.call(&Command::GetConfig).await
    }

    pub async fn set_config(&self, changes: Map<String, Value>) -> Result<DaemonSettings> {
        self.call(&Command::SetConfig { changes }).await
    }

    /// Start a scan. An empty list scans the daemon's configured directories.
    pub async fn start_scan(&self, paths: Vec<String>) -> Result<ScanStatus> {
        self.call(&Command::ScanLibrary { paths }).await
    }

    pub async fn scan_status(&self) -> Result<ScanStatus> {
        self.call(&Command::GetScanStatus).await
    }

    async fn ack(&self, command: &Command) -> Result<()> {
        self.execute(command).await.map(drop)
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
