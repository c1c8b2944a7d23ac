//! Byte source abstraction for the de-framer.
//!
//! The framer does not care where bytes come from. Anything that can hand out
//! the next chunk of a stream implements [`ByteSource`], and the same decode
//! loop drives all of them.

use async_trait::async_trait;
use bytes::Bytes;
use tether_protocol::ProtocolError;
use thiserror::Error;

/// Errors that terminate a framer loop.
#[derive(Debug, Error)]
pub enum FramerError {
    /// The stream carried bytes that are not a valid frame header.
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The underlying byte source failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Every receiver of the frame queue was dropped.
    #[error("Frame queue closed")]
    QueueClosed,
}

impl FramerError {
    /// Returns `true` if the stream itself was malformed.
    #[must_use]
    pub fn is_protocol(&self) -> bool {
        matches!(self, FramerError::Protocol(_))
    }
}

/// A source of raw stream bytes, delivered in arbitrary chunks.
#[async_trait]
pub trait ByteSource: Send {
    /// Wait for the next chunk of bytes.
    ///
    /// Returns `Ok(None)` once the stream has ended. Chunks may be empty.
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FramerError>;

    /// Get the source name (e.g., "reader", "channel").
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversions() {
        let err: FramerError = ProtocolError::VersionMismatch {
            expected: 1,
            received: 9,
        }
        .into();
        assert!(err.is_protocol());
        assert_eq!(
            err.to_string(),
            "Protocol error: Version mismatch: expected 1 received 9"
        );

        let err: FramerError = std::io::Error::from(std::io::ErrorKind::BrokenPipe).into();
        assert!(matches!(err, FramerError::Io(_)));
        assert!(!err.is_protocol());
    }
}
