// crates/rfc-bridge-mcp/src/framing.rs
// ============================================================================
// Module: Message Framing
// Description: Content-Length and line-delimited JSON message framing.
// Purpose: Share one bounded frame reader between the server and the bridge.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Stdio peers exchange JSON-RPC messages either with `Content-Length`
//! headers or as one JSON document per line. [`read_message`] detects the
//! style from the first non-empty line and reports it, so replies can be
//! written back in the same style with [`write_message`].
//!
//! Every frame is bounded by a caller-supplied size limit before the body is
//! buffered.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::io::BufRead;
use std::io::Read;
use std::io::Write;

use thiserror::Error;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Header announcing the body length.
const CONTENT_LENGTH: &str = "content-length:";

/// Wire style of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStyle {
    /// `Content-Length` header block followed by the body.
    ContentLength,
    /// One JSON document terminated by a newline.
    Line,
}

/// A decoded frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Wire style the frame arrived in.
    pub style: FrameStyle,
    /// Raw message body.
    pub payload: Vec<u8>,
}

/// Framing failures.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The peer closed the stream at a frame boundary.
    #[error("stream closed")]
    Closed,
    /// Reading or writing failed.
    #[error("io failure: {0}")]
    Io(String),
    /// A header block could not be parsed.
    #[error("invalid frame header: {0}")]
    InvalidHeader(String),
    /// The frame exceeds the configured limit.
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Announced or observed frame size.
        size: usize,
        /// Configured limit.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Reading
// ============================================================================

/// Reads one frame, skipping blank lines between frames.
///
/// # Errors
///
/// Returns [`FramingError::Closed`] on a clean end of stream and other
/// variants for malformed or oversized frames.
pub fn read_message(reader: &mut impl BufRead, max_bytes: usize) -> Result<Frame, FramingError> {
    loop {
        let line = read_bounded_line(reader, max_bytes)?.ok_or(FramingError::Closed)?;
        let trimmed = trim_line(&line);
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.first() == Some(&b'{') || trimmed.first() == Some(&b'[') {
            if trimmed.len() > max_bytes {
                return Err(FramingError::TooLarge {
                    size: trimmed.len(),
                    limit: max_bytes,
                });
            }
            return Ok(Frame {
                style: FrameStyle::Line,
                payload: trimmed.to_vec(),
            });
        }
        let length = read_headers(reader, trimmed, max_bytes)?;
        if length > max_bytes {
            return Err(FramingError::TooLarge {
                size: length,
                limit: max_bytes,
            });
        }
        let mut payload = vec![0_u8; length];
        reader.read_exact(&mut payload).map_err(|err| FramingError::Io(err.to_string()))?;
        return Ok(Frame {
            style: FrameStyle::ContentLength,
            payload,
        });
    }
}

/// Parses a header block whose first line has already been read.
fn read_headers(
    reader: &mut impl BufRead,
    first: &[u8],
    max_bytes: usize,
) -> Result<usize, FramingError> {
    let mut content_length = parse_header(first)?;
    loop {
        let line = read_bounded_line(reader, max_bytes)?
            .ok_or_else(|| FramingError::Io("stream closed inside header block".to_string()))?;
        let trimmed = trim_line(&line);
        if trimmed.is_empty() {
            break;
        }
        if let Some(length) = parse_header(trimmed)? {
            content_length = Some(length);
        }
    }
    content_length.ok_or_else(|| FramingError::InvalidHeader("missing content length".to_string()))
}

/// Returns the announced length when the line is a `Content-Length` header.
fn parse_header(line: &[u8]) -> Result<Option<usize>, FramingError> {
    let text = std::str::from_utf8(line)
        .map_err(|_| FramingError::InvalidHeader("header must be utf-8".to_string()))?;
    if !text.contains(':') {
        return Err(FramingError::InvalidHeader(format!("unexpected line \"{text}\"")));
    }
    let lowered = text.to_ascii_lowercase();
    let Some(value) = lowered.strip_prefix(CONTENT_LENGTH) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<usize>()
        .map(Some)
        .map_err(|_| FramingError::InvalidHeader("invalid content length".to_string()))
}

/// Reads one line without buffering more than `max_bytes` of it.
fn read_bounded_line(
    reader: &mut impl BufRead,
    max_bytes: usize,
) -> Result<Option<Vec<u8>>, FramingError> {
    let mut line = Vec::new();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(2);
    let read = reader
        .by_ref()
        .take(limit)
        .read_until(b'\n', &mut line)
        .map_err(|err| FramingError::Io(err.to_string()))?;
    if read == 0 {
        return Ok(None);
    }
    if line.last() != Some(&b'\n') && trim_line(&line).len() > max_bytes {
        return Err(FramingError::TooLarge {
            size: line.len(),
            limit: max_bytes,
        });
    }
    Ok(Some(line))
}

/// Strips trailing CR/LF and surrounding ASCII whitespace.
fn trim_line(line: &[u8]) -> &[u8] {
    line.trim_ascii()
}

// ============================================================================
// SECTION: Writing
// ============================================================================

/// Writes one frame in the given style and flushes.
///
/// # Errors
///
/// Returns [`FramingError::Io`] when the writer fails.
pub fn write_message(
    writer: &mut impl Write,
    payload: &[u8],
    style: FrameStyle,
) -> Result<(), FramingError> {
    let io = |err: std::io::Error| FramingError::Io(err.to_string());
    match style {
        FrameStyle::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", payload.len());
            writer.write_all(header.as_bytes()).map_err(io)?;
            writer.write_all(payload).map_err(io)?;
        }
        FrameStyle::Line => {
            writer.write_all(payload).map_err(io)?;
            writer.write_all(b"\n").map_err(io)?;
        }
    }
    writer.flush().map_err(io)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
