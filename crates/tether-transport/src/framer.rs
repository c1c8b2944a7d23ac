//! Streaming de-framer.
//!
//! [`ByteFramer`] owns an accumulation buffer and the sending half of a bounded
//! frame queue. Bytes are appended as they arrive; after every append the
//! framer extracts frames until the buffer no longer holds a complete one.
//! A full queue suspends the framer, which in turn stops it from reading the
//! source, so a slow consumer throttles the whole pipeline.

use bytes::{Bytes, BytesMut};
use tether_protocol::{codec, Frame, ProtocolError};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::source::{ChannelSource, ReaderSource};
use crate::traits::{ByteSource, FramerError};

/// Default frame queue capacity.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Initial accumulation buffer capacity.
const INITIAL_BUFFER_CAPACITY: usize = 4096;

/// Incremental decoder from a byte stream to an ordered queue of frames.
#[derive(Debug)]
pub struct ByteFramer {
    /// Bytes received but not yet consumed by a complete frame.
    buffer: BytesMut,
    /// Sending half of the bounded frame queue.
    tx: mpsc::Sender<Frame>,
}

impl ByteFramer {
    /// Create a framer with the default queue capacity.
    ///
    /// Returns the framer and the receiving end of its frame queue.
    #[must_use]
    pub fn new() -> (Self, mpsc::Receiver<Frame>) {
        Self::with_capacity(DEFAULT_QUEUE_CAPACITY)
    }

    /// Create a framer whose frame queue holds at most `capacity` frames.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (tx, rx) = mpsc::channel(capacity);
        let framer = Self {
            buffer: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            tx,
        };
        (framer, rx)
    }

    /// Number of bytes currently buffered.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Append bytes without extracting anything.
    pub fn extend(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Run a single decode step against the buffer.
    ///
    /// Returns `Ok(None)` when more bytes are needed. The returned frame has
    /// already been removed from the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::VersionMismatch`] if the buffer does not start
    /// with the supported version. The buffer is left as it was, so the error
    /// repeats on every later call; the stream cannot be recovered.
    pub fn try_extract(&mut self) -> Result<Option<Frame>, ProtocolError> {
        codec::decode_from(&mut self.buffer)
    }

    /// Extract and enqueue frames until the buffer holds no complete frame.
    ///
    /// Waits for queue space whenever the queue is full. Returns the number of
    /// frames enqueued.
    ///
    /// # Errors
    ///
    /// Fails on a version mismatch or when the frame queue has been closed.
    pub async fn drain(&mut self) -> Result<usize, FramerError> {
        let mut count = 0;

        loop {
            let frame = match self.try_extract() {
                Ok(Some(frame)) => frame,
                Ok(None) => return Ok(count),
                Err(e) => {
                    warn!(error = %e, buffered = self.buffer.len(), "Dropping stream");
                    return Err(e.into());
                }
            };

            trace!(%frame, "Decoded frame");
            self.tx
                .send(frame)
                .await
                .map_err(|_| FramerError::QueueClosed)?;
            count += 1;
        }
    }

    /// Append bytes and enqueue every frame they complete.
    ///
    /// # Errors
    ///
    /// See [`ByteFramer::drain`].
    pub async fn push(&mut self, data: &[u8]) -> Result<usize, FramerError> {
        self.extend(data);
        self.drain().await
    }

    /// Drive the framer from a byte source until the source ends or fails.
    ///
    /// Returns `Ok(())` when the source reaches end of stream. Bytes of an
    /// incomplete trailing frame are discarded at that point.
    ///
    /// # Errors
    ///
    /// Returns the source's error verbatim, a protocol error on a bad version
    /// byte, or [`FramerError::QueueClosed`] once nobody is receiving frames.
    pub async fn run<S: ByteSource>(mut self, mut source: S) -> Result<(), FramerError> {
        debug!(source = source.name(), "Framer started");

        loop {
            self.drain().await?;

            match source.next_chunk().await? {
                Some(chunk) => self.buffer.extend_from_slice(&chunk),
                None => {
                    if !self.buffer.is_empty() {
                        warn!(
                            source = source.name(),
                            buffered = self.buffer.len(),
                            "Stream ended inside a frame"
                        );
                    }
                    debug!(source = source.name(), "Framer stopped at end of stream");
                    return Ok(());
                }
            }
        }
    }

    /// Pull-based loop: read chunks from `reader` and de-frame them.
    ///
    /// # Errors
    ///
    /// See [`ByteFramer::run`].
    pub async fn frame_reader<R>(self, reader: R) -> Result<(), FramerError>
    where
        R: AsyncRead + Unpin + Send,
    {
        self.run(ReaderSource::new(reader)).await
    }

    /// Push-based loop: de-frame chunks received from another task.
    ///
    /// The loop ends when every sender of `chunks` has been dropped.
    ///
    /// # Errors
    ///
    /// See [`ByteFramer::run`].
    pub async fn frame_chan(self, chunks: mpsc::Receiver<Bytes>) -> Result<(), FramerError> {
        self.run(ChannelSource::new(chunks)).await
    }

    /// Run the framer on its own task.
    pub fn spawn<S>(self, source: S) -> JoinHandle<Result<(), FramerError>>
    where
        S: ByteSource + 'static,
    {
        tokio::spawn(self.run(source))
    }
}
