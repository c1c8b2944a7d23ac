//! # tether-transport
//!
//! Streaming de-framer for the tether protocol.
//!
//! A [`ByteFramer`] turns an arbitrarily chunked byte stream back into the
//! frames written into it and hands them to a consumer through a bounded
//! queue. Two byte-source shapes are supported, both driving the same decode
//! step:
//!
//! - **Pull** - [`ByteFramer::frame_reader`] reads from any `AsyncRead`
//! - **Push** - [`ByteFramer::frame_chan`] receives chunks from an mpsc channel
//!
//! ```rust,no_run
//! use tether_transport::ByteFramer;
//!
//! # async fn example(socket: tokio::net::TcpStream) {
//! let (framer, mut frames) = ByteFramer::new();
//! tokio::spawn(framer.frame_reader(socket));
//!
//! while let Some(frame) = frames.recv().await {
//!     println!("{frame}");
//! }
//! # }
//! ```

pub mod framer;
pub mod source;
pub mod traits;

pub use framer::{ByteFramer, DEFAULT_QUEUE_CAPACITY};
pub use source::{ChannelSource, ReaderSource, DEFAULT_READ_CHUNK_SIZE};
pub use traits::{ByteSource, FramerError};
