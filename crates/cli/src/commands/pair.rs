// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `phono pair` and `phono logout`.

use std::future::Future;
use std::io::BufRead;
use std::pin::Pin;

use tracing::debug;

use crate::auth::{ApprovalPrompt, ApprovalRequest, AutoApprove};
use crate::error::Result;

use super::Session;

/// Asks on the terminal whether pairing was approved on the daemon side.
pub struct TerminalPrompt;

impl ApprovalPrompt for TerminalPrompt {
    fn confirm<'a>(
        &'a self,
        request: &'a ApprovalRequest,
    ) -> Pin<Box<dyn Future<Output = bool> + Send + 'a>> {
        Box::pin(async move {
            eprintln!("{}", approval_text(request));
            eprint!("Press Enter once approved, or type 'n' to cancel: ");
            let answer = tokio::task::spawn_blocking(|| {
                let mut line = String::new();
                std::io::stdin()
                    .lock()
                    .read_line(&mut line)
                    .map(|read| (read > 0).then_some(line))
            })
            .await;
            match answer {
                Ok(Ok(Some(line))) => accepts(&line),
                Ok(Ok(None)) => {
                    debug!("stdin closed while waiting for approval");
                    false
                }
                Ok(Err(e)) => {
                    debug!(error = %e, "could not read approval answer");
                    false
                }
                Err(e) => {
                    debug!(error = %e, "approval prompt task failed");
                    false
                }
            }
        })
    }
}

pub(crate) fn approval_text(request: &ApprovalRequest) -> String {
    match &request.message {
        Some(message) => message.clone(),
        None => format!(
            "The daemon needs to approve '{}' (client id {}).",
            request.client_name, request.client_id
        ),
    }
}

/// Empty input or anything starting with `y` approves.
pub(crate) fn accepts(line: &str) -> bool {
    let answer = line.trim().to_ascii_lowercase();
    answer.is_empty() || answer.starts_with('y')
}

pub async fn pair(session: &Session, name: Option<String>, yes: bool) -> Result<()> {
    let name = name.unwrap_or_else(|| session.config().client_name.clone());
    session.connect().await?;

    let grant = if yes {
        session.auth().pair(&name, &AutoApprove(true)).await?
    } else {
        session.auth().pair(&name, &TerminalPrompt).await?
    };
    println!("Paired as '{}' (client id {}).", name, grant.client_id);
    Ok(())
}

pub fn logout(session: &Session) -> Result<()> {
    session.auth().logout()?;
    println!("Stored token removed.");
    Ok(())
}

#[cfg(test)]
#[path = "pair_tests.rs"]
mod tests;
