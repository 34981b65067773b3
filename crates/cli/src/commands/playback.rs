// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport and status commands.

use ph_ipc::{Command, PlaybackStatus, TrackInfo};

use crate::cli::OutputFormat;
use crate::error::Result;

use super::{print_json, Session};

/// Send an acknowledgement-only command.
pub async fn send(session: &Session, command: Command) -> Result<()> {
    session.ready().await?;
    session.client().execute(&command).await?;
    Ok(())
}

/// Show playback status.
pub async fn status(session: &Session, output: OutputFormat) -> Result<()> {
    session.ready().await?;
    let status = session.client().status().await?;
    match output {
        OutputFormat::Text => print!("{}", format_status(&status)),
        OutputFormat::Json => print_json(&status)?,
    }
    Ok(())
}

pub(crate) fn format_status(status: &PlaybackStatus) -> String {
    let mut out = format!("State: {}\n", status.state.as_str());
    if let Some(track) = &status.track {
        out.push_str(&format!("Track: {}\n", describe_track(track)));
        let position = match status.duration {
            Some(duration) => format!("{} / {}", clock(status.position), clock(duration)),
            None => clock(status.position),
        };
        out.push_str(&format!("Position: {}\n", position));
    }
    out.push_str(&format!("Volume: {:.0}%\n", status.volume * 100.0));
    out.push_str(&format!("Queue: {} track(s)\n", status.queue_length));
    out
}

/// `Artist - Title (Album)`, falling back to the file path without a title.
fn describe_track(track: &TrackInfo) -> String {
    let Some(title) = &track.title else {
        return track.path.clone();
    };
    let mut out = match &track.artist {
        Some(artist) => format!("{} - {}", artist, title),
        None => title.clone(),
    };
    if let Some(album) = &track.album {
        out.push_str(&format!(" ({})", album));
    }
    out
}

/// `m:ss`, or `h:mm:ss` past an hour.
fn clock(seconds: f64) -> String {
    let total = seconds.max(0.0).floor() as u64;
    let (hours, minutes, secs) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{}:{:02}", minutes, secs)
    }
}

#[cfg(test)]
#[path = "playback_tests.rs"]
mod tests;
