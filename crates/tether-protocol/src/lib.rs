//! # tether-protocol
//!
//! Wire format for the tether length-prefixed frame protocol.
//!
//! Every frame is a fixed 5-byte header (version, command type, packed
//! sequence/flags, 16-bit payload length) followed by the payload. This crate
//! defines the [`Frame`] type, its encoders and the single-step decoder used by
//! streaming de-framers.
//!
//! ## Example
//!
//! ```rust
//! use tether_protocol::{codec, Frame};
//!
//! let frame = Frame::new(7, 3, 9, vec![0xAA, 0xBB]);
//!
//! // Encode and decode
//! let encoded = codec::encode(&frame).unwrap();
//! let decoded = codec::decode(&encoded).unwrap();
//! assert_eq!(frame, decoded);
//! ```

pub mod codec;
pub mod frame;
pub mod version;

pub use codec::{decode, decode_from, encode, encode_into, ProtocolError};
pub use frame::Frame;
pub use version::{HEADER_SIZE, MAX_PAYLOAD_SIZE, VERSION};
