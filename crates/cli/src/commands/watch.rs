// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `phono watch`: print audio data frames as they are pushed.

use ph_ipc::AudioFrame;
use tracing::warn;

use crate::error::Result;

use super::Session;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Stream frames until `count` is reached, the connection drops, or Ctrl-C.
pub async fn run(session: &Session, count: Option<usize>) -> Result<()> {
    session.ready().await?;
    let client = session.client();
    let mut subscription = client.subscribe_audio_data().await?;

    let mut seen = 0usize;
    loop {
        if count.is_some_and(|limit| seen >= limit) {
            break;
        }
        let frame = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            frame = subscription.recv_payload::<AudioFrame>() => frame,
        };
        let Some(frame) = frame else {
            // Subscription closed: disconnected or unsubscribed elsewhere.
            break;
        };
        println!("{}", render_frame(&frame));
        seen += 1;
    }

    if client.is_connected() {
        if let Err(e) = client.unsubscribe_audio_data().await {
            warn!(error = %e, "failed to unsubscribe from audio data");
        }
    }
    Ok(())
}

/// One bar per band, scaled to the loudest band in the frame.
pub(crate) fn render_frame(frame: &AudioFrame) -> String {
    let max = frame.bands.iter().copied().fold(0.0f32, f32::max);
    let bars: String = frame
        .bands
        .iter()
        .map(|band| {
            if max <= 0.0 {
                return BARS[0];
            }
            let level = (band.max(0.0) / max * (BARS.len() - 1) as f32).round() as usize;
            BARS[level.min(BARS.len() - 1)]
        })
        .collect();
    match frame.peak {
        Some(peak) => format!("{} peak {:.2}", bars, peak),
        None => bars,
    }
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
