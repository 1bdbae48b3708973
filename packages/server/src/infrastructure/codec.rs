//! Newline-delimited JSON framing.
//!
//! The terminator is the only framing; bytes may arrive in any segmentation.

use serde::Serialize;
use tracing::warn;

use crate::domain::{Record, record_from_str};

const LINE_TERMINATOR: u8 = b'\n';

/// Encode a record as compact JSON followed by the line terminator.
pub fn encode_record<T>(record: &T) -> Result<Vec<u8>, serde_json::Error>
where
    T: Serialize + ?Sized,
{
    let mut encoded = serde_json::to_vec(record)?;
    encoded.push(LINE_TERMINATOR);
    Ok(encoded)
}

/// Per-connection accumulation buffer that yields complete records.
#[derive(Debug)]
pub struct LineDecoder {
    buffer: Vec<u8>,
    /// Bytes already scanned without finding a terminator
    scanned: usize,
    max_line_bytes: usize,
    /// Dropping the rest of an oversized line up to its terminator
    discarding: bool,
}

impl LineDecoder {
    pub fn new(max_line_bytes: usize) -> Self {
        Self {
            buffer: Vec::new(),
            scanned: 0,
            max_line_bytes,
            discarding: false,
        }
    }

    /// Append one read's bytes and return every record completed by them.
    ///
    /// Lines that are not a well-formed JSON object are dropped. The bytes
    /// after the last terminator stay buffered for the next call. Once an
    /// unterminated line exceeds the size limit, everything up to and
    /// including its terminator is dropped.
    pub fn decode(&mut self, chunk: &[u8]) -> Vec<Record> {
        let chunk = if self.discarding {
            match chunk.iter().position(|&b| b == LINE_TERMINATOR) {
                Some(end) => {
                    self.discarding = false;
                    &chunk[end + 1..]
                }
                None => return Vec::new(),
            }
        } else {
            chunk
        };
        self.buffer.extend_from_slice(chunk);

        let mut records = Vec::new();
        while let Some(line) = self.next_line() {
            if let Some(record) = decode_line(&line) {
                records.push(record);
            }
        }

        if self.buffer.len() > self.max_line_bytes {
            warn!(
                buffered = self.buffer.len(),
                limit = self.max_line_bytes,
                "discarding unterminated line over the size limit"
            );
            self.buffer.clear();
            self.scanned = 0;
            self.discarding = true;
        }

        records
    }

    /// Number of bytes waiting for a terminator.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    fn next_line(&mut self) -> Option<Vec<u8>> {
        let offset = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == LINE_TERMINATOR);

        match offset {
            Some(offset) => {
                let end = self.scanned + offset;
                let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
                line.pop();
                self.scanned = 0;
                Some(line)
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }
}

fn decode_line(line: &[u8]) -> Option<Record> {
    let text = std::str::from_utf8(line).ok()?;
    record_from_str(text)
}
