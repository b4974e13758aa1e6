//! Concurrent, non-suspendable draining of a child's stdout/stderr into
//! `OutputFrame`s.
//!
//! Two independent readers are kept running for the child's whole life —
//! never paused while it's alive — because the OS pipe buffer is bounded
//! and a full buffer deadlocks a child that writes faster than it is
//! read. Each chunk becomes an `OutputFrame` pushed onto an mpsc channel
//! for a remote client rather than accumulated into one in-memory buffer.

use cce_core::StreamKind;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, BufReader};
use tokio::process::{ChildStderr, ChildStdout};
use tokio::sync::mpsc;

/// Read unit from a child pipe; also the `stream_chunk_bytes` default.
pub const DEFAULT_CHUNK_BYTES: usize = 64 * 1024;

/// One chunk of a child's output, tagged with the stream it came from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutputFrame {
    pub stream: StreamKind,
    pub data: String,
    pub truncated: bool,
}

/// Splits a byte chunk into UTF-8 text, replacing binary-looking chunks
/// with a placeholder for log/display purposes while the byte count is still tracked by the caller.
fn decode_chunk(bytes: &[u8]) -> String {
    if is_binary(bytes) {
        format!("[BINARY DATA — {} bytes]", bytes.len())
    } else {
        String::from_utf8_lossy(bytes).into_owned()
    }
}

/// A chunk is "binary" if more than 30% of its bytes are non-textual
/// (outside printable ASCII, common whitespace, and UTF-8 continuation
/// bytes) — a density heuristic, not a strict validator.
fn is_binary(bytes: &[u8]) -> bool {
    if bytes.is_empty() {
        return false;
    }
    let non_text = bytes
        .iter()
        .filter(|&&b| !(b.is_ascii_graphic() || b.is_ascii_whitespace() || b >= 0x80))
        .count();
    (non_text as f64 / bytes.len() as f64) > 0.30
}

/// Per-stream running state used to enforce `max_line_bytes` truncation.
/// Truncation is a logical-line concept for log/display purposes only; it
/// never gates forwarding of the underlying bytes.
struct LineTracker {
    current_line_bytes: usize,
    max_line_bytes: usize,
    truncated_current_line: bool,
}

impl LineTracker {
    fn new(max_line_bytes: usize) -> Self {
        Self { current_line_bytes: 0, max_line_bytes, truncated_current_line: false }
    }

    /// Feed a raw chunk; returns `(text, truncated)` for the `OutputFrame`
    /// to emit for this chunk, tracking the running logical-line length
    /// across possibly-many chunks. `truncated` is true for every frame
    /// that is part of a logical line already over `max_line_bytes`.
    fn observe(&mut self, raw: &[u8]) -> (String, bool) {
        for &b in raw {
            if b == b'\n' {
                self.current_line_bytes = 0;
                self.truncated_current_line = false;
                continue;
            }
            self.current_line_bytes += 1;
            if self.current_line_bytes > self.max_line_bytes {
                self.truncated_current_line = true;
            }
        }
        (decode_chunk(raw), self.truncated_current_line)
    }
}

/// Drain one child's stdout and stderr concurrently, pushing `OutputFrame`s
/// onto `tx` as they arrive, until both streams hit EOF or `tx` is
/// dropped by the receiver (session torn down).
///
/// This task must run unconditionally for the child's whole lifetime; the
/// caller is responsible for not awaiting this inside anything that could
/// itself be suspended by back-pressure — `tx.send` is the only
/// suspension point, and it only blocks as long as the consumer's bounded
/// channel is full — that's the back-pressure mechanism.
pub async fn drain(
    stdout: ChildStdout,
    stderr: ChildStderr,
    tx: mpsc::Sender<OutputFrame>,
    chunk_bytes: usize,
    max_line_bytes: usize,
) {
    let mut stdout_reader = BufReader::new(stdout);
    let mut stderr_reader = BufReader::new(stderr);
    let mut stdout_buf = vec![0u8; chunk_bytes];
    let mut stderr_buf = vec![0u8; chunk_bytes];
    let mut stdout_done = false;
    let mut stderr_done = false;
    let mut stdout_tracker = LineTracker::new(max_line_bytes);
    let mut stderr_tracker = LineTracker::new(max_line_bytes);

    while !stdout_done || !stderr_done {
        tokio::select! {
            result = stdout_reader.read(&mut stdout_buf), if !stdout_done => {
                match result {
                    Ok(0) => stdout_done = true,
                    Ok(n) => {
                        let (data, truncated) = stdout_tracker.observe(&stdout_buf[..n]);
                        if tx.send(OutputFrame { stream: StreamKind::Stdout, data, truncated }).await.is_err() {
                            return;
                        }
                    }
                    Err(_) => stdout_done = true,
                }
            }
            result = stderr_reader.read(&mut stderr_buf), if !stderr_done => {
                match result {
                    Ok(0) => stderr_done = true,
                    Ok(n) => {
                        let (data, truncated) = stderr_tracker.observe(&stderr_buf[..n]);
                        if tx.send(OutputFrame { stream: StreamKind::Stderr, data, truncated }).await.is_err() {
                            return;
                        }
                    }
                    Err(_) => stderr_done = true,
                }
            }
        }
    }
}
