//! Protocol versioning for tether.
//!
//! Every frame header starts with a single version byte. There is exactly one
//! supported version; anything else is rejected by the version gate.

use crate::codec::ProtocolError;

/// Current protocol version.
pub const VERSION: u8 = 1;

/// Size of the fixed frame header in bytes.
///
/// `[version:1][cmd_type:1][seq_flags:1][length:2]`
pub const HEADER_SIZE: usize = 5;

/// Largest payload a single frame can carry (the length field is 16 bits).
pub const MAX_PAYLOAD_SIZE: usize = u16::MAX as usize;

/// Check an observed header version byte against [`VERSION`].
///
/// # Errors
///
/// Returns [`ProtocolError::VersionMismatch`] carrying both values when the
/// byte is not the supported version.
pub fn check(observed: u8) -> Result<(), ProtocolError> {
    if observed == VERSION {
        Ok(())
    } else {
        Err(ProtocolError::VersionMismatch {
            expected: VERSION,
            received: observed,
        })
    }
}
