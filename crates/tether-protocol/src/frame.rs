//! Frame type for the tether protocol.
//!
//! A frame is one decoded protocol unit: a command type, a 4-bit sequence
//! number, a 4-bit flag set and an opaque payload. None of these fields are
//! interpreted here; their meaning belongs to whoever consumes the frames.

use bytes::{BufMut, Bytes};
use std::fmt;

use crate::version::{HEADER_SIZE, MAX_PAYLOAD_SIZE, VERSION};

/// Mask for the low nibble of the `seq_flags` header byte.
const NIBBLE: u8 = 0x0F;

/// A protocol frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Frame {
    /// Application message type.
    pub cmd_type: u8,
    /// Sequence number (0-15).
    pub seq: u8,
    /// Flag bits (0-15).
    pub flags: u8,
    /// Message payload.
    pub data: Bytes,
}

impl Frame {
    /// Create a new frame.
    #[must_use]
    pub fn new(cmd_type: u8, seq: u8, flags: u8, data: impl Into<Bytes>) -> Self {
        Self {
            cmd_type,
            seq,
            flags,
            data: data.into(),
        }
    }

    /// Get the command type.
    #[must_use]
    pub fn cmd_type(&self) -> u8 {
        self.cmd_type
    }

    /// The packed `seq_flags` header byte: seq in the low nibble, flags in the high.
    #[must_use]
    pub fn seq_flags(&self) -> u8 {
        (self.seq & NIBBLE) | (self.flags << 4)
    }

    /// Split a packed `seq_flags` byte into `(seq, flags)`.
    #[must_use]
    pub fn unpack_seq_flags(byte: u8) -> (u8, u8) {
        (byte & NIBBLE, byte >> 4)
    }

    /// Number of bytes this frame occupies on the wire.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.data.len()
    }

    /// Encode this frame into `buf` starting at `offset`.
    ///
    /// Returns the number of bytes written so the caller can advance its cursor.
    /// Does not allocate.
    ///
    /// # Panics
    ///
    /// Panics if `buf` has fewer than [`Frame::encoded_len`] bytes available
    /// from `offset`, or if the payload is longer than the 16-bit length field
    /// allows. Both mean the caller sized its output incorrectly.
    pub fn encode(&self, buf: &mut [u8], offset: usize) -> usize {
        let total = self.encoded_len();
        assert!(
            self.data.len() <= MAX_PAYLOAD_SIZE,
            "frame payload of {} bytes exceeds {}",
            self.data.len(),
            MAX_PAYLOAD_SIZE
        );
        assert!(
            offset <= buf.len() && buf.len() - offset >= total,
            "unable to encode {} byte frame at offset {} into {} byte buffer",
            total,
            offset,
            buf.len()
        );

        let mut out = &mut buf[offset..offset + total];
        out.put_u8(VERSION);
        out.put_u8(self.cmd_type);
        out.put_u8(self.seq_flags());
        out.put_u16(self.data.len() as u16);
        out.put_slice(&self.data);

        total
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame(0x{:02x}): seq={} flags={} data={}",
            self.cmd_type,
            self.seq,
            self.flags,
            self.data.len()
        )
    }
}
