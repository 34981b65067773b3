// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Pairing and token authentication.
//!
//! A client is authenticated once the dispatcher holds a token the daemon
//! accepts. The token comes either from the credential store (confirmed with
//! a `status` probe) or from a fresh `pair` exchange. When the daemon asks for
//! out-of-band approval, the flow waits on an [`ApprovalPrompt`] before the
//! already-issued token is trusted.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};

use ph_ipc::PairingGrant;
use tracing::{debug, info, warn};

use crate::client::DaemonClient;
use crate::credentials::TokenStore;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Pairing,
    Authenticated,
    Failed,
}

impl fmt::Display for AuthState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthState::Unauthenticated => "unauthenticated",
            AuthState::Pairing => "pairing",
            AuthState::Authenticated => "authenticated",
            AuthState::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// What the user is asked to approve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApprovalRequest {
    pub client_name: String,
    pub client_id: String,
    pub message: Option<String>,
}

/// Waits for the user to confirm that pairing was approved on the daemon.
pub trait ApprovalPrompt: Send + Sync {
    /// Resolve `true` once approved, `false` to cancel.
    fn confirm<'a>(
        &'a self,
        request: &'a ApprovalRequest,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>>;
}

/// Prompt that answers immediately.
pub struct AutoApprove(pub bool);

impl ApprovalPrompt for AutoApprove {
    fn confirm<'a>(
        &'a self,
        _request: &'a ApprovalRequest,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        let answer = self.0;
        Box::pin(async move { answer })
    }
}

/// Drives pairing and token probing for one client.
pub struct AuthFlow {
    client: Arc<DaemonClient>,
    store: Box<dyn TokenStore>,
    state: Mutex<AuthState>,
    verify_after_approval: bool,
}

impl AuthFlow {
    pub fn new(client: Arc<DaemonClient>, store: Box<dyn TokenStore>) -> Self {
        Self {
            client,
            store,
            state: Mutex::new(AuthState::Unauthenticated),
            verify_after_approval: true,
        }
    }

    /// Whether an approved token is confirmed with a `status` probe before
    /// it is stored.
    pub fn verify_after_approval(mut self, verify: bool) -> Self {
        self.verify_after_approval = verify;
        self
    }

    pub fn state(&self) -> AuthState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: AuthState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// Try the stored token.
    ///
    /// Returns `true` if the daemon accepted it. Any failure, including a
    /// store error, leaves the flow unauthenticated; the stored token itself
    /// is kept.
    pub async fn probe_stored_token(&self) -> bool {
        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => {
                debug!("no stored token to probe");
                self.set_state(AuthState::Unauthenticated);
                return false;
            }
            Err(e) => {
                warn!(error = %e, "could not read stored token");
                self.set_state(AuthState::Unauthenticated);
                return false;
            }
        };

        self.client.set_token(Some(token));
        match self.client.status().await {
            Ok(_) => {
                debug!("stored token accepted");
                self.set_state(AuthState::Authenticated);
                true
            }
            Err(e) => {
                debug!(error = %e, "stored token rejected");
                self.client.set_token(None);
                self.set_state(AuthState::Unauthenticated);
                false
            }
        }
    }

    /// Pair with the daemon under `client_name`.
    ///
    /// On success the token is stored and attached to every later command.
    /// On failure or cancellation nothing is stored and the flow ends in
    /// [`AuthState::Failed`].
    pub async fn pair(
        &self,
        client_name: &str,
        prompt: &dyn ApprovalPrompt,
    ) -> Result<PairingGrant> {
        self.set_state(AuthState::Pairing);
        match self.run_pairing(client_name, prompt).await {
            Ok(grant) => {
                info!(client_id = %grant.client_id, "paired with daemon");
                self.set_state(AuthState::Authenticated);
                Ok(grant)
            }
            Err(e) => {
                debug!(error = %e, "pairing failed");
                self.set_state(AuthState::Failed);
                Err(e)
            }
        }
    }

    async fn run_pairing(
        &self,
        client_name: &str,
        prompt: &dyn ApprovalPrompt,
    ) -> Result<PairingGrant> {
        let previous = self.client.token();
        let grant = match self.client.pair(client_name).await {
            Ok(grant) => grant,
            Err(Error::Daemon(message)) => return Err(Error::Auth(message)),
            Err(e) => return Err(e),
        };

        if grant.requires_approval {
            let request = ApprovalRequest {
                client_name: client_name.to_string(),
                client_id: grant.client_id.clone(),
                message: grant.message.clone(),
            };
            if !prompt.confirm(&request).await {
                return Err(Error::PairingCancelled);
            }
            if self.verify_after_approval {
                self.verify(&grant.token).await?;
            }
        }

        if let Err(e) = self.store.set(&grant.token) {
            self.client.set_token(previous);
            return Err(e);
        }
        self.client.set_token(Some(grant.token.clone()));
        Ok(grant)
    }

    async fn verify(&self, token: &str) -> Result<()> {
        let previous = self.client.token();
        self.client.set_token(Some(token.to_string()));
        match self.client.status().await {
            Ok(_) => Ok(()),
            Err(e) => {
                self.client.set_token(previous);
                Err(Error::Auth(format!("token not accepted after approval: {}", e)))
            }
        }
    }

    /// Use the stored token if it works, otherwise pair.
    pub async fn authenticate(&self, client_name: &str, prompt: &dyn ApprovalPrompt) -> Result<()> {
        if self.probe_stored_token().await {
            return Ok(());
        }
        self.pair(client_name, prompt).await.map(drop)
    }

    /// Forget the token locally and in the store.
    pub fn logout(&self) -> Result<()> {
        self.client.set_token(None);
        self.set_state(AuthState::Unauthenticated);
        self.store.delete()
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
