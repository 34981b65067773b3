// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Newline-delimited framing over a byte stream.
//!
//! A stream read may carry several frames, part of one, or both. The
//! [`LineFramer`] keeps a single growing buffer and hands back every complete
//! line in arrival order, keeping any unterminated tail for the next read.

use std::fmt;

/// Maximum unterminated tail (1MB) before the stream is considered corrupt.
pub const MAX_FRAME_SIZE: usize = 1024 * 1024;

/// Frame terminator.
pub const DELIMITER: u8 = b'\n';

/// Error returned when the stream cannot be framed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// A frame grew past [`MAX_FRAME_SIZE`] without a delimiter.
    Oversized { len: usize },
}

impl fmt::Display for FrameError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrameError::Oversized { len } => write!(
                f,
                "frame too large: {} bytes without a delimiter (max {})",
                len, MAX_FRAME_SIZE
            ),
        }
    }
}

impl std::error::Error for FrameError {}

/// Result of one [`LineFramer::push`].
///
/// Frames completed before an overflow are still delivered; `overflow` is
/// set when the remaining tail exceeded [`MAX_FRAME_SIZE`] and was discarded.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Framed {
    pub frames: Vec<String>,
    pub overflow: Option<FrameError>,
}

/// Splits an inbound byte stream into text frames.
#[derive(Debug, Default)]
pub struct LineFramer {
    buf: Vec<u8>,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return every frame completed by them.
    ///
    /// A trailing `\r` is stripped and blank lines are skipped. Invalid UTF-8
    /// is replaced rather than dropped so the decoder can report it.
    pub fn push(&mut self, bytes: &[u8]) -> Framed {
        self.buf.extend_from_slice(bytes);

        let mut frames = Vec::new();
        let mut start = 0;
        while let Some(offset) = self.buf[start..].iter().position(|&b| b == DELIMITER) {
            let end = start + offset;
            let line = strip_cr(&self.buf[start..end]);
            if !line.iter().all(u8::is_ascii_whitespace) {
                frames.push(String::from_utf8_lossy(line).into_owned());
            }
            start = end + 1;
        }
        self.buf.drain(..start);

        let overflow = (self.buf.len() > MAX_FRAME_SIZE).then(|| {
            let len = self.buf.len();
            self.buf.clear();
            FrameError::Oversized { len }
        });

        Framed { frames, overflow }
    }

    /// Bytes buffered without a delimiter yet.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }

    /// Drop any buffered partial frame.
    pub fn clear(&mut self) {
        self.buf.clear();
    }
}

fn strip_cr(line: &[u8]) -> &[u8] {
    match line.last() {
        Some(b'\r') => &line[..line.len() - 1],
        _ => line,
    }
}

/// Terminate an encoded frame for writing.
pub fn frame_line(encoded: &str) -> String {
    let mut line = String::with_capacity(encoded.len() + 1);
    line.push_str(encoded);
    line.push(DELIMITER as char);
    line
}

#[cfg(test)]
#[path = "framing_tests.rs"]
mod tests;
