//! Message padding for size-class privacy.
//!
//! Frames a plaintext blob into an exact caller-chosen target length so
//! that, after encryption, an observer sees only one of a small set of
//! fixed envelope sizes. The frame always lives inside the ciphertext and
//! never appears on the wire.
//!
//! ## Frame Layout
//!
//! ```text
//! +----------+----------------+-----------+------------------+
//! | "ZKLG"   | length (LE u32)| payload   | " \n" filler ... |
//! |  4 bytes |        4 bytes | len bytes | up to target     |
//! +----------+----------------+-----------+------------------+
//! ```
//!
//! The filler is a fixed repeating two-byte pattern rather than random
//! bytes: the frame is only ever seen after authenticated decryption, so
//! filler content carries no privacy weight and a fixed pattern keeps the
//! codec deterministic across peer implementations.

use crate::error::{EnvelopeError, Result};

/// Literal tag opening every padded frame.
pub const FRAME_TAG: [u8; 4] = *b"ZKLG";

/// Bytes consumed by the tag and length prefix.
pub const FRAME_OVERHEAD: usize = 8;

/// The repeating filler pattern (space, newline).
const FILLER: [u8; 2] = *b" \n";

/// Pad a payload into a frame of exactly `target` bytes.
///
/// # Errors
///
/// Returns `EnvelopeError::InvalidPadding` when `target` cannot hold even
/// an empty frame, and `EnvelopeError::PayloadTooLarge` when the payload
/// exceeds `target - 8`.
pub fn pad(payload: &[u8], target: usize) -> Result<Vec<u8>> {
    if target < FRAME_OVERHEAD {
        return Err(EnvelopeError::InvalidPadding(format!(
            "target {} smaller than frame overhead {}",
            target, FRAME_OVERHEAD
        )));
    }
    let limit = target - FRAME_OVERHEAD;
    if payload.len() > limit {
        return Err(EnvelopeError::PayloadTooLarge {
            actual: payload.len(),
            limit,
        });
    }

    let mut frame = Vec::with_capacity(target);
    frame.extend_from_slice(&FRAME_TAG);
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(payload);
    let fill = target - frame.len();
    frame.extend((0..fill).map(|i| FILLER[i % FILLER.len()]));

    debug_assert_eq!(frame.len(), target);
    Ok(frame)
}

/// Recover the payload from a padded frame.
///
/// Returns the exact declared payload slice, borrowed from the frame.
///
/// # Errors
///
/// Returns `EnvelopeError::InvalidPadding` on a short buffer, a wrong tag,
/// or a declared length exceeding `frame.len() - 8`.
pub fn unpad(frame: &[u8]) -> Result<&[u8]> {
    if frame.len() < FRAME_OVERHEAD {
        return Err(EnvelopeError::InvalidPadding(format!(
            "frame of {} bytes is shorter than the header",
            frame.len()
        )));
    }
    if frame[..4] != FRAME_TAG {
        return Err(EnvelopeError::InvalidPadding("bad frame tag".to_string()));
    }

    let mut len_bytes = [0u8; 4];
    len_bytes.copy_from_slice(&frame[4..8]);
    let declared = u32::from_le_bytes(len_bytes) as usize;

    let available = frame.len() - FRAME_OVERHEAD;
    if declared > available {
        return Err(EnvelopeError::InvalidPadding(format!(
            "declared length {} exceeds {} available bytes",
            declared, available
        )));
    }

    Ok(&frame[FRAME_OVERHEAD..FRAME_OVERHEAD + declared])
}
