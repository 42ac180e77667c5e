//! Response heads and body framing.
//!
//! Only as much of the response head is interpreted as needed to decide how
//! the body is framed.

use std::io::Read;

use headers::{ContentLength, Header, HeaderMapExt, TransferEncoding};
use http::{header::HeaderName, HeaderMap, HeaderValue, StatusCode, Version};

use crate::error::Error;

/// Maximum number of header fields accepted in a response head.
const MAX_HEADERS: usize = 128;

/// Maximum size in bytes of a response head read by [read_response_head].
pub const HEAD_LIMIT: usize = 32768;

const READ_SIZE: usize = 4096;

/// Status line and header fields of a response.
#[derive(Debug, Clone)]
pub struct ResponseHead {
    /// HTTP version of the status line.
    pub version: Version,
    /// Status code.
    pub status: StatusCode,
    /// Reason phrase. May be empty.
    pub reason: String,
    /// Header fields.
    pub headers: HeaderMap,
}

impl ResponseHead {
    /// Returns whether the body is in chunked transfer coding.
    pub fn is_chunked(&self) -> bool {
        is_chunked(&self.headers)
    }

    /// Returns the value of the `Content-Length` field if valid.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .typed_get::<ContentLength>()
            .map(|length| length.0)
    }
}

/// Returns whether the final transfer coding in the `Transfer-Encoding`
/// fields is `chunked`.
///
/// Coding names are compared case-insensitively.
pub fn is_chunked(headers: &HeaderMap) -> bool {
    let encoding = match headers.typed_get::<TransferEncoding>() {
        Some(encoding) => encoding,
        None => return false,
    };

    let mut values = Vec::<HeaderValue>::new();
    encoding.encode(&mut values);

    values
        .last()
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.rsplit(',').next())
        .map(|coding| coding.trim().eq_ignore_ascii_case("chunked"))
        .unwrap_or(false)
}

/// Parses a response head from the start of the input.
///
/// Returns `None` if the input does not yet contain a complete head.
/// Otherwise, returns the head and the number of bytes it occupies,
/// including the empty line that ends it. Lines ending in a bare LF are
/// accepted.
pub fn parse_response_head(input: &[u8]) -> Result<Option<(ResponseHead, usize)>, Error> {
    let mut parser_headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut parser_response = httparse::Response::new(&mut parser_headers);

    let length = match parser_response.parse(input)? {
        httparse::Status::Complete(length) => length,
        httparse::Status::Partial => return Ok(None),
    };

    let head = convert_parser_response(&parser_response)?;

    Ok(Some((head, length)))
}

fn convert_parser_response(parser_response: &httparse::Response) -> Result<ResponseHead, Error> {
    let version = match parser_response.version.unwrap_or_default() {
        1 => Version::HTTP_11,
        _ => Version::HTTP_10,
    };
    let status = StatusCode::from_u16(parser_response.code.unwrap_or_default())
        .map_err(http::Error::from)?;

    let mut headers = HeaderMap::new();

    for header in parser_response.headers.iter() {
        if !header.name.is_empty() {
            headers.append(
                HeaderName::from_bytes(header.name.as_bytes()).map_err(http::Error::from)?,
                HeaderValue::from_bytes(header.value).map_err(http::Error::from)?,
            );
        }
    }

    Ok(ResponseHead {
        version,
        status,
        reason: parser_response.reason.unwrap_or_default().to_string(),
        headers,
    })
}

/// Reads a response head from the stream.
///
/// Returns the head and any bytes that were read past its end. Those bytes
/// are the start of the body.
pub fn read_response_head<R: Read>(stream: &mut R) -> Result<(ResponseHead, Vec<u8>), Error> {
    let mut buffer = Vec::new();
    let mut read_buffer = [0u8; READ_SIZE];

    loop {
        if let Some((head, length)) = parse_response_head(&buffer)? {
            tracing::debug!(status = %head.status, length, "read response head");
            let body = buffer.split_off(length);
            return Ok((head, body));
        }

        if buffer.len() >= HEAD_LIMIT {
            return Err(Error::HeadTooLong(HEAD_LIMIT));
        }

        let amount = stream.read(&mut read_buffer)?;

        if amount == 0 {
            return Err(Error::IncompleteHead);
        }

        buffer.extend_from_slice(&read_buffer[..amount]);
    }
}
