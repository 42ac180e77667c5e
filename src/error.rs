//! Errors related to this crate.

use thiserror::Error;

/// General purpose error.
///
/// The decoder itself never fails. These errors come from reading response
/// heads and from the underlying streams.
#[derive(Error, Debug)]
pub enum Error {
    /// Response head couldn't be parsed.
    #[error("malformed response head")]
    MalformedHead {
        /// Source of the error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Response head is longer than the limit.
    #[error("response head exceeds {0} bytes")]
    HeadTooLong(usize),

    /// Stream ended before the response head was complete.
    #[error("incomplete response head")]
    IncompleteHead,

    /// IO error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<httparse::Error> for Error {
    fn from(error: httparse::Error) -> Self {
        Self::MalformedHead {
            source: Some(Box::new(error)),
        }
    }
}

impl From<http::Error> for Error {
    fn from(error: http::Error) -> Self {
        Self::MalformedHead {
            source: Some(Box::new(error)),
        }
    }
}

/// Formats an error chain to a string.
///
/// This function can be used to express error messages that pass outside
/// the Rust boundary.
pub fn format_to_string<E: std::error::Error>(error: E) -> String {
    let mut message = String::new();

    message.push_str(&error.to_string());

    let mut child_error = error.source();

    while let Some(error) = child_error {
        message.push_str(": ");
        message.push_str(&error.to_string());

        child_error = error.source();
    }

    message
}
