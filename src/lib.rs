//! Incremental decoding of HTTP/1.1 chunked transfer coding.
//!
//! The core is [chunked::ChunkDecoder], a stream filter that accepts raw
//! bytes in pieces of any size and returns the unchunked payload as it
//! becomes available. The [io] module wraps it for blocking readers and
//! tokio streams, and [response] helps decide whether a response body is
//! chunked in the first place.
//!
//! ```
//! use unchunk::chunked::ChunkDecoder;
//!
//! let mut decoder = ChunkDecoder::new();
//! assert_eq!(decoder.decode(b"5\r\nhel"), b"hel");
//! assert_eq!(decoder.decode(b"lo\r\n0\r\n\r\n"), b"lo");
//! assert!(decoder.is_closed());
//! ```

#![warn(missing_docs)]
pub mod chunked;
pub mod error;
pub mod io;
pub mod log;
mod pc;
pub mod response;
pub mod stringutil;
