//! Stream dumping.
//!
//! Opens the configured byte source, runs a framer over it on its own task and
//! writes one line per decoded frame.

use anyhow::{Context, Result};
use std::io::Write;
use tether_protocol::Frame;
use tether_transport::{ByteFramer, FramerError, ReaderSource};
use tokio::fs::File;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::config::{Config, SourceConfig};
use crate::metrics;

/// Output options.
#[derive(Debug, Clone, Copy, Default)]
pub struct DumpOptions {
    /// Append the payload as hex after each frame summary.
    pub hex: bool,
}

/// De-frame the configured source and write every frame to `out`.
///
/// Returns the number of frames written once the source reaches end of stream.
///
/// # Errors
///
/// Returns an error if the source cannot be opened, the stream is malformed,
/// reading fails, or `out` cannot be written.
pub async fn run<W: Write>(config: &Config, out: &mut W, options: DumpOptions) -> Result<usize> {
    let (framer, frames) = ByteFramer::with_capacity(config.framer.queue_capacity);
    let chunk_size = config.framer.read_chunk_size;

    info!(source = %config.source, "Reading frames");

    let handle = match &config.source {
        SourceConfig::Stdin => {
            framer.spawn(ReaderSource::with_chunk_size(tokio::io::stdin(), chunk_size))
        }
        SourceConfig::File { path } => {
            let file = File::open(path)
                .await
                .with_context(|| format!("Failed to open {}", path.display()))?;
            framer.spawn(ReaderSource::with_chunk_size(file, chunk_size))
        }
        SourceConfig::Tcp { addr } => {
            let stream = TcpStream::connect(addr)
                .await
                .with_context(|| format!("Failed to connect to {addr}"))?;
            debug!(peer = %addr, "Connected");
            framer.spawn(ReaderSource::with_chunk_size(stream, chunk_size))
        }
    };

    // Dropping the receiver on a write error closes the queue and stops the framer.
    let count = write_frames(frames, out, options).await?;

    match handle.await.context("Framer task panicked")? {
        Ok(()) => {
            info!(frames = count, "Stream ended");
            Ok(count)
        }
        Err(e) => {
            metrics::record_error(error_kind(&e));
            error!(error = %e, frames = count, "Framer stopped");
            Err(e).context("Failed to decode stream")
        }
    }
}

/// Write frames from the queue until it closes.
///
/// `out` is a blocking writer. This runs on the main task while the framer has
/// its own, so a slow terminal only stalls the consumer side of the queue.
async fn write_frames<W: Write>(
    mut frames: mpsc::Receiver<Frame>,
    out: &mut W,
    options: DumpOptions,
) -> Result<usize> {
    let mut count = 0;

    while let Some(frame) = frames.recv().await {
        metrics::record_frame(&frame);
        write_frame(out, &frame, options).context("Failed to write frame")?;
        count += 1;
    }

    out.flush()?;
    Ok(count)
}

fn write_frame<W: Write>(out: &mut W, frame: &Frame, options: DumpOptions) -> std::io::Result<()> {
    if options.hex {
        write!(out, "{frame}")?;
        if !frame.data.is_empty() {
            out.write_all(b" ")?;
            for byte in &frame.data {
                write!(out, "{byte:02x}")?;
            }
        }
        writeln!(out)
    } else {
        writeln!(out, "{frame}")
    }
}

fn error_kind(err: &FramerError) -> &'static str {
    match err {
        FramerError::Protocol(_) => "protocol",
        FramerError::Io(_) => "io",
        FramerError::QueueClosed => "queue_closed",
    }
}
