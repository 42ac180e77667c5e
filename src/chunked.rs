//! Chunked transfer coding.

use std::fmt::Debug;

use bytes::BytesMut;

use crate::{
    log::{DecodeLog, TracingLog},
    stringutil,
};

/// Incremental decoder for a message body in chunked transfer coding.
///
/// Raw bytes are given to [Self::decode] in whatever pieces they arrive in,
/// and the payload decoded so far is returned from each call. A chunk-size
/// line or chunk data split across calls is held in an internal buffer until
/// more input arrives.
///
/// Malformed chunk-size lines are reported to the [DecodeLog] and treated as
/// the terminal chunk, so a broken stream ends with whatever payload was
/// decoded before it.
///
/// A chunk-size line longer than [MAX_LINE_LENGTH] is treated as malformed
/// without waiting for its line ending.
///
/// Trailer fields after the terminal chunk are not parsed. Any bytes buffered
/// at or after that point stay in the buffer and are returned by
/// [Self::flush].
pub struct ChunkDecoder<L: DecodeLog = TracingLog> {
    buffer: BytesMut,
    /// Length of the buffer prefix already searched for a line ending.
    scanned: usize,
    state: DecoderState,
    log: L,
}

/// Maximum length of a chunk-size line, excluding the line ending.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Position of a [ChunkDecoder] in the chunked stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecoderState {
    /// Waiting for a complete chunk-size line.
    AwaitingSize,
    /// Inside chunk data with the given nonzero number of bytes left.
    ReadingBody(u64),
    /// The terminal chunk was seen. No further input is interpreted.
    Closed,
}

impl ChunkDecoder {
    /// Creates a decoder that logs to [tracing].
    pub fn new() -> Self {
        Self::with_log(TracingLog)
    }
}

impl Default for ChunkDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl<L: DecodeLog> ChunkDecoder<L> {
    /// Creates a decoder that reports diagnostics to the given log.
    pub fn with_log(log: L) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            state: DecoderState::AwaitingSize,
            log,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> DecoderState {
        self.state
    }

    /// Returns whether the terminal chunk was seen.
    pub fn is_closed(&self) -> bool {
        self.state == DecoderState::Closed
    }

    /// Returns the number of chunk data bytes still expected, or `None` when
    /// a chunk-size line is expected next.
    pub fn bytes_remaining(&self) -> Option<u64> {
        match self.state {
            DecoderState::ReadingBody(remaining) => Some(remaining),
            _ => None,
        }
    }

    /// Returns the number of bytes received but not yet interpreted.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns a reference to the log.
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Adds raw input and returns the payload that became available.
    ///
    /// The returned data is the concatenation of all chunk data extracted
    /// during this call. It is empty when no chunk data could be extracted.
    pub fn decode(&mut self, input: &[u8]) -> Vec<u8> {
        self.log.received(input);
        self.buffer.extend_from_slice(input);

        let mut output = Vec::new();

        while !self.buffer.is_empty() {
            match self.state {
                DecoderState::AwaitingSize => {
                    if !self.read_size_line() {
                        break;
                    }
                }
                DecoderState::ReadingBody(remaining) => self.read_data(remaining, &mut output),
                DecoderState::Closed => break,
            }
        }

        self.log.decoded(&output);

        output
    }

    /// Empties the buffer and returns its contents with surrounding
    /// whitespace removed.
    ///
    /// Intended for the end of the stream. The state is not changed.
    pub fn flush(&mut self) -> Vec<u8> {
        let output = stringutil::trim(&self.buffer).to_vec();
        self.buffer.clear();
        self.scanned = 0;

        output
    }

    /// Consumes one line from the buffer. Returns false if no complete line
    /// is buffered.
    fn read_size_line(&mut self) -> bool {
        let window_end = self.buffer.len().min(MAX_LINE_LENGTH + 1);
        let found = self.buffer[self.scanned..window_end]
            .iter()
            .position(|&byte| byte == b'\n');

        let index = match found {
            Some(index) => self.scanned + index,
            None if self.buffer.len() > MAX_LINE_LENGTH => {
                self.reject_long_line();
                return true;
            }
            None => {
                self.scanned = window_end;
                return false;
            }
        };

        self.scanned = 0;
        let line = self.buffer.split_to(index + 1);
        let line = stringutil::trim(&line);

        // The CRLF ending the previous chunk's data.
        if line.is_empty() {
            return true;
        }

        let length = match parse_chunk_size(line) {
            ChunkSize::Valid { length, .. } => length,
            ChunkSize::Invalid => {
                self.log.invalid_chunk_size(line);
                0
            }
        };

        self.state = if length == 0 {
            DecoderState::Closed
        } else {
            DecoderState::ReadingBody(length)
        };

        true
    }

    fn reject_long_line(&mut self) {
        let line = stringutil::trim(&self.buffer[..MAX_LINE_LENGTH]);
        self.log.invalid_chunk_size(line);
        self.scanned = 0;
        self.state = DecoderState::Closed;
    }

    fn read_data(&mut self, remaining: u64, output: &mut Vec<u8>) {
        let amount = remaining.min(self.buffer.len() as u64);
        let data = self.buffer.split_to(amount as usize);
        output.extend_from_slice(&data);

        assert!(amount <= remaining);
        let remaining = remaining - amount;

        self.state = if remaining == 0 {
            DecoderState::AwaitingSize
        } else {
            DecoderState::ReadingBody(remaining)
        };
    }
}

impl<L: DecodeLog> Debug for ChunkDecoder<L> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkDecoder")
            .field("closed", &self.is_closed())
            .field("buffer_len", &self.buffer.len())
            .field("bytes_remaining", &self.bytes_remaining())
            .finish()
    }
}

/// Result of parsing a chunk-size line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkSize<'a> {
    /// The line is a hexadecimal size with an optional extension.
    Valid {
        /// Size of chunk data.
        length: u64,
        /// Text after the `;`, if any. Not interpreted.
        extension: Option<&'a [u8]>,
    },
    /// The line does not match the chunk-size grammar.
    Invalid,
}

/// Parses a chunk-size line.
///
/// Input must not contain the line ending or surrounding whitespace.
pub fn parse_chunk_size(line: &[u8]) -> ChunkSize<'_> {
    match crate::pc::parse_chunk_size_line(line) {
        Ok((length, extension)) => ChunkSize::Valid { length, extension },
        Err(_) => ChunkSize::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use crate::log::{CallbackLog, NullLog};

    use super::*;

    #[test]
    fn test_decoder() {
        let mut decoder = ChunkDecoder::with_log(NullLog);

        let output = decoder.decode(b"3\r\nabc\r\n5\r\nhello\r\n0\r\n\r\n");

        assert_eq!(output, b"abchello");
        assert!(decoder.is_closed());
        assert_eq!(decoder.flush(), b"");
    }

    #[test]
    fn test_state_transitions() {
        let mut decoder = ChunkDecoder::with_log(NullLog);
        assert_eq!(decoder.state(), DecoderState::AwaitingSize);

        decoder.decode(b"a\r");
        assert_eq!(decoder.state(), DecoderState::AwaitingSize);
        assert_eq!(decoder.buffered_len(), 2);

        decoder.decode(b"\n");
        assert_eq!(decoder.state(), DecoderState::ReadingBody(10));
        assert_eq!(decoder.bytes_remaining(), Some(10));

        assert_eq!(decoder.decode(b"0123"), b"0123");
        assert_eq!(decoder.bytes_remaining(), Some(6));

        assert_eq!(decoder.decode(b"456789\r\n"), b"456789");
        assert_eq!(decoder.state(), DecoderState::AwaitingSize);
        assert_eq!(decoder.bytes_remaining(), None);

        assert_eq!(decoder.decode(b"0\r\n"), b"");
        assert_eq!(decoder.state(), DecoderState::Closed);
        assert_eq!(decoder.bytes_remaining(), None);
    }

    #[test]
    fn test_closed_ignores_input() {
        let mut decoder = ChunkDecoder::with_log(NullLog);
        decoder.decode(b"0\r\n");

        assert_eq!(decoder.decode(b"5\r\nhello\r\n"), b"");
        assert!(decoder.is_closed());
        assert_eq!(decoder.flush(), b"5\r\nhello");
        assert_eq!(decoder.buffered_len(), 0);
        assert!(decoder.is_closed());
    }

    #[test]
    fn test_parse_chunk_size() {
        assert_eq!(
            parse_chunk_size(b"1f"),
            ChunkSize::Valid {
                length: 31,
                extension: None
            }
        );
        assert_eq!(
            parse_chunk_size(b"1F;k1=v1"),
            ChunkSize::Valid {
                length: 31,
                extension: Some(b"k1=v1".as_slice())
            }
        );
        assert_eq!(parse_chunk_size(b"xyz"), ChunkSize::Invalid);
        assert_eq!(parse_chunk_size(b""), ChunkSize::Invalid);
    }

    #[test]
    fn test_line_length_limit() {
        let mut lines = Vec::new();
        let mut decoder = ChunkDecoder::with_log(CallbackLog(|line: &[u8]| lines.push(line.len())));

        for _ in 0..MAX_LINE_LENGTH {
            assert_eq!(decoder.decode(b"z"), b"");
            assert!(!decoder.is_closed());
        }

        assert_eq!(decoder.decode(b"z"), b"");
        assert!(decoder.is_closed());
        assert_eq!(decoder.decode(b"zzzz\r\n"), b"");
        drop(decoder);

        assert_eq!(lines, vec![MAX_LINE_LENGTH]);
    }

    #[test]
    fn test_long_line_in_one_call() {
        let mut input = vec![b'a'; MAX_LINE_LENGTH + 10];
        input.extend_from_slice(b"\r\n");
        let mut decoder = ChunkDecoder::with_log(NullLog);

        assert_eq!(decoder.decode(&input), b"");
        assert!(decoder.is_closed());
    }

    #[test]
    fn test_line_at_length_limit() {
        let mut line = b"5;".to_vec();
        line.resize(MAX_LINE_LENGTH, b'x');
        let mut decoder = ChunkDecoder::with_log(NullLog);

        for byte in &line {
            assert_eq!(decoder.decode(&[*byte]), b"");
        }

        assert_eq!(decoder.state(), DecoderState::AwaitingSize);
        assert_eq!(decoder.decode(b"\nhello\r\n0\r\n"), b"hello");
        assert!(decoder.is_closed());
    }

    #[test]
    fn test_debug() {
        let mut decoder = ChunkDecoder::with_log(NullLog);
        decoder.decode(b"5\r\nab");

        assert_eq!(
            format!("{:?}", decoder),
            "ChunkDecoder { closed: false, buffer_len: 0, bytes_remaining: Some(3) }"
        );
    }
}
