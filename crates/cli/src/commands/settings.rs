// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `phono config`: daemon-side settings.

use ph_ipc::DaemonSettings;
use serde_json::{Map, Value};

use crate::cli::{ConfigCommand, OutputFormat};
use crate::error::{Error, Result};

use super::{print_json, Session};

pub async fn run(session: &Session, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Get { key, output } => get(session, key.as_deref(), output.output).await,
        ConfigCommand::Set { key, value } => set(session, &key, &value).await,
    }
}

async fn get(session: &Session, key: Option<&str>, output: OutputFormat) -> Result<()> {
    session.ready().await?;
    let settings = flatten(&session.client().get_config().await?)?;

    let selected = match key {
        Some(key) => {
            let value = settings
                .get(key)
                .cloned()
                .ok_or_else(|| Error::Config(format!("daemon has no setting '{}'", key)))?;
            let mut one = Map::new();
            one.insert(key.to_string(), value);
            one
        }
        None => settings,
    };

    match output {
        OutputFormat::Text => print!("{}", format_settings(&selected)),
        OutputFormat::Json => print_json(&selected)?,
    }
    Ok(())
}

async fn set(session: &Session, key: &str, raw: &str) -> Result<()> {
    let mut changes = Map::new();
    changes.insert(key.to_string(), parse_value(raw));

    session.ready().await?;
    let settings = flatten(&session.client().set_config(changes).await?)?;
    if let Some(value) = settings.get(key) {
        println!("{} = {}", key, value);
    }
    Ok(())
}

/// JSON if it parses, otherwise the raw text as a string.
pub(crate) fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn flatten(settings: &DaemonSettings) -> Result<Map<String, Value>> {
    match serde_json::to_value(settings)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Protocol(format!(
            "settings did not serialize to an object: {}",
            other
        ))),
    }
}

/// `key = value` lines, sorted by key.
pub(crate) fn format_settings(settings: &Map<String, Value>) -> String {
    let mut keys: Vec<&String> = settings.keys().collect();
    keys.sort();
    keys.into_iter()
        .map(|key| format!("{} = {}\n", key, settings[key]))
        .collect()
}

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;
