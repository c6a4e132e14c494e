//! Incremental decoder for the server's event stream.

use askline_models::StreamPayload;

const DATA_PREFIX: &str = "data: ";
const DONE_MARKER: &str = "[DONE]";

/// Upper bound on buffered bytes of a single unterminated line.
const MAX_BUFFERED_BYTES: usize = 64 * 1024;

/// Decodes newline-delimited `data: <json>` events arriving at arbitrary
/// chunk boundaries.
///
/// A logical event may span several chunks, so bytes are buffered until a
/// complete line is available. Fragments come out in arrival order and are
/// never re-emitted, re-ordered, or withdrawn. Malformed payloads are
/// treated as partial data and skipped; decoding ends only when the caller
/// stops feeding bytes.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buf: Vec<u8>,
    discarding: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one chunk of raw bytes, returning the content fragments the
    /// chunk completed.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut fragments = Vec::new();
        while let Some(pos) = self.buf.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.buf.drain(..=pos).collect();
            if self.discarding {
                // Tail of a line whose head was already dropped.
                self.discarding = false;
                continue;
            }
            let line = String::from_utf8_lossy(&line);
            if let Some(fragment) = decode_line(line.trim_end_matches(['\n', '\r'])) {
                fragments.push(fragment);
            }
        }

        // A server that never terminates a line must not grow the buffer
        // without bound; the dropped line decodes to nothing, like any
        // other malformed payload.
        if self.buf.len() > MAX_BUFFERED_BYTES {
            self.buf.clear();
            self.discarding = true;
        }

        fragments
    }
}

fn decode_line(line: &str) -> Option<String> {
    let payload = line.strip_prefix(DATA_PREFIX)?;
    if payload.trim() == DONE_MARKER {
        return None;
    }
    // Not valid JSON means partial data; later lines carry the rest.
    let payload: StreamPayload = serde_json::from_str(payload).ok()?;
    payload.content.filter(|content| !content.is_empty())
}
