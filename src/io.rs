//! IO helpers for moving a chunked body through a [ChunkDecoder].

use std::io::{Read, Result};

use bytes::{Buf, Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    chunked::ChunkDecoder,
    log::{DecodeLog, TracingLog},
};

/// Default number of bytes requested from the source per read call.
pub const DEFAULT_READ_SIZE: usize = 4096;

/// Count number of bytes from a source stream.
///
/// This trait is for reader objects that wrap another stream and transform
/// data such as a decoders.
pub trait SourceCountRead {
    /// Returns the number of bytes read by this object from the source stream.
    fn source_read_count(&self) -> u64;
}

/// Reads and decodes a stream in chunked transfer coding.
///
/// Reading stops at the terminal chunk or at EOF of the wrapped stream,
/// whichever comes first, and the decoder is then flushed. If the stream
/// ended before the terminal chunk, the flushed bytes are returned before EOF
/// is reported. Bytes buffered after the terminal chunk, such as trailer
/// fields or a following message, are discarded. The wrapped stream is not
/// read past the read call that contained the terminal chunk.
pub struct UnchunkReader<R: Read, L: DecodeLog = TracingLog> {
    stream: R,
    decoder: ChunkDecoder<L>,
    read_buffer: Vec<u8>,
    pending: Bytes,
    source_read_count: u64,
    finished: bool,
}

impl<R: Read> UnchunkReader<R> {
    /// Creates a new `UnchunkReader` with the given stream.
    pub fn new(stream: R) -> Self {
        Self::with_decoder(stream, ChunkDecoder::new())
    }
}

impl<R: Read, L: DecodeLog> UnchunkReader<R, L> {
    /// Creates a new `UnchunkReader` with the given stream and decoder.
    pub fn with_decoder(stream: R, decoder: ChunkDecoder<L>) -> Self {
        Self {
            stream,
            decoder,
            read_buffer: vec![0; DEFAULT_READ_SIZE],
            pending: Bytes::new(),
            source_read_count: 0,
            finished: false,
        }
    }

    /// Sets the number of bytes requested from the wrapped stream per read.
    ///
    /// Panics if `size` is 0.
    pub fn set_read_size(&mut self, size: usize) {
        assert!(size > 0);
        self.read_buffer.resize(size, 0);
    }

    /// Returns a reference to the wrapped stream.
    pub fn get_ref(&self) -> &R {
        &self.stream
    }

    /// Returns a mutable reference to the wrapped stream.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.stream
    }

    /// Returns a reference to the decoder.
    pub fn decoder(&self) -> &ChunkDecoder<L> {
        &self.decoder
    }

    /// Returns the wrapped stream.
    pub fn into_inner(self) -> R {
        self.stream
    }

    fn fill_pending(&mut self) -> Result<()> {
        if self.decoder.is_closed() {
            self.finish();
            return Ok(());
        }

        let amount = self.stream.read(&mut self.read_buffer)?;
        self.source_read_count += amount as u64;

        if amount == 0 {
            tracing::debug!(
                source_read_count = self.source_read_count,
                "source ended before terminal chunk"
            );
            self.finish();
        } else {
            self.pending = Bytes::from(self.decoder.decode(&self.read_buffer[..amount]));
        }

        Ok(())
    }

    fn finish(&mut self) {
        self.pending = Bytes::from(flush_decoder(&mut self.decoder));
        self.finished = true;
    }
}

impl<R: Read, L: DecodeLog> Read for UnchunkReader<R, L> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if !self.pending.is_empty() {
                let amount = self.pending.len().min(buf.len());
                buf[..amount].copy_from_slice(&self.pending[..amount]);
                self.pending.advance(amount);

                return Ok(amount);
            }

            if self.finished {
                return Ok(0);
            }

            self.fill_pending()?;
        }
    }
}

impl<R: Read, L: DecodeLog> SourceCountRead for UnchunkReader<R, L> {
    fn source_read_count(&self) -> u64 {
        self.source_read_count
    }
}

/// Decodes a chunked stream and writes the payload to another stream.
///
/// Each piece of decoded payload is written as soon as it is available.
/// Reading stops at EOF or once the decoder has seen the terminal chunk.
/// The decoder is then flushed. Its remainder is written only if the input
/// ended before the terminal chunk. Finally the writer is flushed.
///
/// Returns the number of payload bytes written.
pub async fn relay_unchunked<R, W, L>(
    reader: &mut R,
    writer: &mut W,
    decoder: &mut ChunkDecoder<L>,
) -> Result<u64>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
    L: DecodeLog,
{
    let mut buffer = BytesMut::with_capacity(DEFAULT_READ_SIZE);
    let mut total = 0u64;

    while !decoder.is_closed() {
        buffer.clear();
        let amount = reader.read_buf(&mut buffer).await?;

        if amount == 0 {
            break;
        }

        let output = decoder.decode(&buffer);
        writer.write_all(&output).await?;
        total += output.len() as u64;
    }

    let output = flush_decoder(decoder);
    writer.write_all(&output).await?;
    writer.flush().await?;
    total += output.len() as u64;

    tracing::debug!(total, closed = decoder.is_closed(), "relay finished");

    Ok(total)
}

/// Empties the decoder's buffer and returns the bytes that are still payload.
///
/// Only an unterminated body has salvageable payload in the buffer. After the
/// terminal chunk, the buffer holds trailers or the next message.
fn flush_decoder<L: DecodeLog>(decoder: &mut ChunkDecoder<L>) -> Vec<u8> {
    let output = decoder.flush();

    if decoder.is_closed() {
        if !output.is_empty() {
            tracing::debug!(
                discarded = output.len(),
                "discarded bytes after terminal chunk"
            );
        }

        Vec::new()
    } else {
        output
    }
}
