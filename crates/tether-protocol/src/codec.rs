//! Codec for encoding and decoding tether frames.
//!
//! The wire format is a fixed 5-byte header followed by the payload:
//!
//! ```text
//! Offset  Size  Field
//! 0       1     version
//! 1       1     cmd_type
//! 2       1     seq_flags   (low nibble = seq, high nibble = flags)
//! 3       2     length      (big-endian)
//! 5       N     payload
//! ```

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::frame::Frame;
use crate::version::{self, HEADER_SIZE, MAX_PAYLOAD_SIZE};

/// Offset of the 16-bit length field inside the header.
const LENGTH_OFFSET: usize = 3;

/// Protocol errors that can occur during encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The header's version byte is not the supported version.
    #[error("Version mismatch: expected {expected} received {received}")]
    VersionMismatch {
        /// The supported version.
        expected: u8,
        /// The byte found at header offset 0.
        received: u8,
    },

    /// Payload does not fit in the 16-bit length field.
    #[error("Frame payload size {0} exceeds maximum {MAX_PAYLOAD_SIZE}")]
    FrameTooLarge(usize),

    /// Not enough data to decode frame.
    #[error("Incomplete frame: need {0} more bytes")]
    Incomplete(usize),
}

/// Read the payload length from a buffer holding at least a full header.
fn payload_len(header: &[u8]) -> usize {
    u16::from_be_bytes([header[LENGTH_OFFSET], header[LENGTH_OFFSET + 1]]) as usize
}

/// Build a frame from a slice that begins with a complete header.
fn parse(header: &[u8], payload: Bytes) -> Frame {
    let (seq, flags) = Frame::unpack_seq_flags(header[2]);
    Frame {
        cmd_type: header[1],
        seq,
        flags,
        data: payload,
    }
}

/// Encode a frame to bytes.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the payload does not fit in the
/// 16-bit length field.
pub fn encode(frame: &Frame) -> Result<Bytes, ProtocolError> {
    let mut buf = BytesMut::with_capacity(frame.encoded_len());
    encode_into(frame, &mut buf)?;
    Ok(buf.freeze())
}

/// Encode a frame onto the end of an existing buffer.
///
/// # Errors
///
/// Returns [`ProtocolError::FrameTooLarge`] if the payload does not fit in the
/// 16-bit length field. Nothing is written in that case.
pub fn encode_into(frame: &Frame, buf: &mut BytesMut) -> Result<(), ProtocolError> {
    if frame.data.len() > MAX_PAYLOAD_SIZE {
        return Err(ProtocolError::FrameTooLarge(frame.data.len()));
    }

    buf.reserve(frame.encoded_len());
    buf.put_u8(version::VERSION);
    buf.put_u8(frame.cmd_type);
    buf.put_u8(frame.seq_flags());
    buf.put_u16(frame.data.len() as u16);
    buf.extend_from_slice(&frame.data);

    Ok(())
}

/// Decode one frame from the front of `data`.
///
/// Trailing bytes after the first frame are ignored.
///
/// # Errors
///
/// Returns an error if the version is unsupported or the data is incomplete.
pub fn decode(data: &[u8]) -> Result<Frame, ProtocolError> {
    if let Some(&first) = data.first() {
        version::check(first)?;
    }

    if data.len() < HEADER_SIZE {
        return Err(ProtocolError::Incomplete(HEADER_SIZE - data.len()));
    }

    let total_size = HEADER_SIZE + payload_len(data);
    if data.len() < total_size {
        return Err(ProtocolError::Incomplete(total_size - data.len()));
    }

    let payload = Bytes::copy_from_slice(&data[HEADER_SIZE..total_size]);
    Ok(parse(data, payload))
}

/// Try to decode a frame from a buffer, advancing it if successful.
///
/// Returns `Ok(Some(frame))` if a complete frame was decoded and removed from
/// the front of `buf`, `Ok(None)` if more data is needed, or `Err` when the
/// first buffered byte is not the supported version. The buffer is left
/// untouched unless a whole frame is returned.
///
/// # Errors
///
/// Returns [`ProtocolError::VersionMismatch`] on a bad version byte.
pub fn decode_from(buf: &mut BytesMut) -> Result<Option<Frame>, ProtocolError> {
    let Some(&first) = buf.first() else {
        return Ok(None);
    };
    version::check(first)?;

    if buf.len() < HEADER_SIZE {
        return Ok(None);
    }

    let total_size = HEADER_SIZE + payload_len(buf);
    if buf.len() < total_size {
        return Ok(None);
    }

    let raw = buf.split_to(total_size).freeze();
    let payload = raw.slice(HEADER_SIZE..);
    Ok(Some(parse(&raw, payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::VERSION;
    use proptest::prelude::*;

    fn arb_frame() -> impl Strategy<Value = Frame> {
        (
            any::<u8>(),
            0u8..16,
            0u8..16,
            prop::collection::vec(any::<u8>(), 0..512),
        )
            .prop_map(|(cmd_type, seq, flags, data)| Frame::new(cmd_type, seq, flags, data))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn frame_roundtrip(frame in arb_frame()) {
            let encoded = encode(&frame).unwrap();
            prop_assert_eq!(encoded.len(), frame.encoded_len());
            prop_assert_eq!(decode(&encoded).unwrap(), frame.clone());

            let mut buf = BytesMut::from(&encoded[..]);
            prop_assert_eq!(decode_from(&mut buf).unwrap(), Some(frame));
            prop_assert!(buf.is_empty());
        }
    }

    #[test]
    fn test_every_seq_flags_pair() {
        for packed in 0..=u8::MAX {
            let (seq, flags) = Frame::unpack_seq_flags(packed);
            let frame = Frame::new(packed, seq, flags, vec![packed; (packed % 4) as usize]);

            let encoded = encode(&frame).unwrap();
            assert_eq!(encoded[2], packed);

            let decoded = decode(&encoded).unwrap();
            assert_eq!(decoded.seq, seq);
            assert_eq!(decoded.flags, flags);
            assert_eq!(decoded, frame);
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let frames = vec![
            Frame::new(0, 0, 0, Bytes::new()),
            Frame::new(7, 3, 9, vec![0xAA, 0xBB]),
            Frame::new(255, 15, 15, vec![0x5A; 1024]),
            Frame::new(42, 8, 1, vec![0x01; MAX_PAYLOAD_SIZE]),
        ];

        for frame in frames {
            let encoded = encode(&frame).unwrap();
            assert_eq!(encoded.len(), frame.encoded_len());
            let decoded = decode(&encoded).unwrap();
            assert_eq!(frame, decoded);
        }
    }

    #[test]
    fn test_codec_matches_slice_encode() {
        let frame = Frame::new(7, 3, 9, vec![0xAA, 0xBB]);
        let mut buf = [0u8; 7];
        frame.encode(&mut buf, 0);

        assert_eq!(&encode(&frame).unwrap()[..], &buf[..]);
        assert_eq!(&buf, &[VERSION, 7, 0x93, 0x00, 0x02, 0xAA, 0xBB]);
    }

    #[test]
    fn test_decode_incomplete() {
        let frame = Frame::new(1, 2, 3, b"hello".to_vec());
        let encoded = encode(&frame).unwrap();

        match decode(&encoded[..3]) {
            Err(ProtocolError::Incomplete(2)) => {}
            other => panic!("Expected Incomplete(2), got {:?}", other),
        }
        match decode(&encoded[..7]) {
            Err(ProtocolError::Incomplete(3)) => {}
            other => panic!("Expected Incomplete(3), got {:?}", other),
        }
    }

    #[test]
    fn test_decode_bad_version() {
        let data = [VERSION + 1, 7, 0, 0, 0];
        assert_eq!(
            decode(&data),
            Err(ProtocolError::VersionMismatch {
                expected: VERSION,
                received: VERSION + 1,
            })
        );
    }

    #[test]
    fn test_frame_too_large() {
        let frame = Frame::new(1, 0, 0, vec![0u8; MAX_PAYLOAD_SIZE + 1]);

        match encode(&frame) {
            Err(ProtocolError::FrameTooLarge(n)) => assert_eq!(n, MAX_PAYLOAD_SIZE + 1),
            other => panic!("Expected FrameTooLarge error, got {:?}", other),
        }

        let mut buf = BytesMut::new();
        assert!(encode_into(&frame, &mut buf).is_err());
        assert!(buf.is_empty());
    }

    #[test]
    fn test_streaming_decode() {
        let frame1 = Frame::new(1, 1, 0, b"first".to_vec());
        let frame2 = Frame::new(2, 2, 0, Bytes::new());

        let mut buf = BytesMut::new();
        encode_into(&frame1, &mut buf).unwrap();
        encode_into(&frame2, &mut buf).unwrap();

        let decoded1 = decode_from(&mut buf).unwrap().unwrap();
        let decoded2 = decode_from(&mut buf).unwrap().unwrap();

        assert_eq!(frame1, decoded1);
        assert_eq!(frame2, decoded2);
        assert!(buf.is_empty());
        assert_eq!(decode_from(&mut buf), Ok(None));
    }

    #[test]
    fn test_decode_from_waits_for_payload() {
        let frame = Frame::new(9, 0, 0, vec![1, 2, 3, 4]);
        let encoded = encode(&frame).unwrap();

        let mut buf = BytesMut::new();
        for (i, byte) in encoded.iter().enumerate() {
            assert_eq!(decode_from(&mut buf), Ok(None));
            assert_eq!(buf.len(), i);
            buf.extend_from_slice(&[*byte]);
        }

        assert_eq!(decode_from(&mut buf), Ok(Some(frame)));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_from_keeps_remainder() {
        let frame = Frame::new(3, 0, 0, vec![0xCC]);
        let mut buf = BytesMut::new();
        encode_into(&frame, &mut buf).unwrap();
        buf.extend_from_slice(&[VERSION, 4]);

        assert_eq!(decode_from(&mut buf), Ok(Some(frame)));
        assert_eq!(&buf[..], &[VERSION, 4]);
    }

    #[test]
    fn test_decode_from_bad_version_leaves_buffer() {
        let mut buf = BytesMut::from(&[0x00u8][..]);
        assert!(matches!(
            decode_from(&mut buf),
            Err(ProtocolError::VersionMismatch { received: 0, .. })
        ));
        assert_eq!(buf.len(), 1);
    }
}
