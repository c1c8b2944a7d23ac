//! Byte source adapters.
//!
//! - [`ReaderSource`] pulls chunks out of any [`AsyncRead`] (socket, pipe, file).
//! - [`ChannelSource`] receives chunks that another task already read and
//!   pushed into an mpsc channel.

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tracing::trace;

use crate::traits::{ByteSource, FramerError};

/// Default scratch buffer size for pull-based reads.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 1024;

/// Pull-based source over an async reader.
///
/// Each call reads at most `chunk_size` bytes. A zero-length read is treated
/// as end of stream; read errors are passed through unchanged.
#[derive(Debug)]
pub struct ReaderSource<R> {
    reader: R,
    scratch: Vec<u8>,
}

impl<R> ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    /// Create a reader source with the default chunk size.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self::with_chunk_size(reader, DEFAULT_READ_CHUNK_SIZE)
    }

    /// Create a reader source with a custom chunk size.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` is zero.
    #[must_use]
    pub fn with_chunk_size(reader: R, chunk_size: usize) -> Self {
        assert!(chunk_size > 0, "read chunk size must be non-zero");
        Self {
            reader,
            scratch: vec![0u8; chunk_size],
        }
    }

    /// Get the chunk size.
    #[must_use]
    pub fn chunk_size(&self) -> usize {
        self.scratch.len()
    }
}

#[async_trait]
impl<R> ByteSource for ReaderSource<R>
where
    R: AsyncRead + Unpin + Send,
{
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FramerError> {
        let n = self.reader.read(&mut self.scratch).await?;
        if n == 0 {
            return Ok(None);
        }

        trace!(bytes = n, "Read chunk");
        Ok(Some(Bytes::copy_from_slice(&self.scratch[..n])))
    }

    fn name(&self) -> &'static str {
        "reader"
    }
}

/// Push-based source over an mpsc channel of byte chunks.
///
/// The stream ends when every sender has been dropped.
#[derive(Debug)]
pub struct ChannelSource {
    rx: mpsc::Receiver<Bytes>,
}

impl ChannelSource {
    /// Wrap a chunk receiver.
    #[must_use]
    pub fn new(rx: mpsc::Receiver<Bytes>) -> Self {
        Self { rx }
    }
}

impl From<mpsc::Receiver<Bytes>> for ChannelSource {
    fn from(rx: mpsc::Receiver<Bytes>) -> Self {
        Self::new(rx)
    }
}

#[async_trait]
impl ByteSource for ChannelSource {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>, FramerError> {
        Ok(self.rx.recv().await)
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}
