//! Checksum validation of scanned frames

use crate::crc::crc16;
use crate::wire::CRC_LEN;

/// Reasons a scanned frame is rejected before dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValidationError {
    /// Transmitted and recomputed checksums differ
    ChecksumMismatch { received: u16, computed: u16 },
    /// Body too short to carry a message type and data type tag
    Truncated { len: usize },
}

/// A validated frame, borrowed from the scanner's accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Frame<'a> {
    /// Message type code
    pub msg_type: u8,
    /// Data type tag (raw; unknown tags are rejected at dispatch)
    pub data_type: u8,
    /// Bytes after the data type tag, checksum excluded
    pub payload: &'a [u8],
    /// Checksum as transmitted
    pub checksum: u16,
}

/// Check the trailing big-endian CRC of a destuffed frame
///
/// `raw` is the body followed by the two checksum bytes, as produced by
/// [`crate::scanner::FrameScanner::step`].
pub fn validate(raw: &[u8]) -> Result<Frame<'_>, ValidationError> {
    if raw.len() < CRC_LEN {
        return Err(ValidationError::Truncated { len: raw.len() });
    }
    let (body, crc) = raw.split_at(raw.len() - CRC_LEN);
    let received = u16::from_be_bytes([crc[0], crc[1]]);
    let computed = crc16(body);
    if received != computed {
        return Err(ValidationError::ChecksumMismatch { received, computed });
    }

    match body {
        [msg_type, data_type, payload @ ..] => Ok(Frame {
            msg_type: *msg_type,
            data_type: *data_type,
            payload,
            checksum: received,
        }),
        _ => Err(ValidationError::Truncated { len: body.len() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::encode_to_vec;
    use crate::ring::RingBuffer;
    use crate::scanner::{FrameScanner, Step};
    use proptest::prelude::*;

    fn with_crc(body: &[u8]) -> std::vec::Vec<u8> {
        let mut raw = body.to_vec();
        raw.extend_from_slice(&crc16(body).to_be_bytes());
        raw
    }

    #[test]
    fn test_valid_frame() {
        let raw = with_crc(&[0x0D, 0x03, 0x05]);
        let frame = validate(&raw).unwrap();
        assert_eq!(frame.msg_type, 0x0D);
        assert_eq!(frame.data_type, 0x03);
        assert_eq!(frame.payload, &[0x05]);
        assert_eq!(frame.checksum, crc16(&[0x0D, 0x03, 0x05]));
    }

    #[test]
    fn test_empty_payload() {
        let raw = with_crc(&[0x50, 0x02]);
        let frame = validate(&raw).unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_checksum_mismatch() {
        let mut raw = with_crc(&[0x0D, 0x03, 0x05]);
        let last = raw.len() - 1;
        raw[last] ^= 0x01;
        assert!(matches!(
            validate(&raw),
            Err(ValidationError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_truncated_body() {
        assert_eq!(
            validate(&with_crc(&[0x06])),
            Err(ValidationError::Truncated { len: 1 })
        );
        assert_eq!(validate(&[0x01]), Err(ValidationError::Truncated { len: 1 }));
    }

    /// Push `wire` through a small ring `chunk` bytes at a time, collecting
    /// every frame that validates
    fn receive(wire: &[u8], chunk: usize) -> std::vec::Vec<(u8, u8, std::vec::Vec<u8>)> {
        let mut ring: RingBuffer<16> = RingBuffer::new();
        let mut scanner: FrameScanner<64> = FrameScanner::new();
        let mut frames = std::vec::Vec::new();
        let mut pos = 0;

        for _ in 0..wire.len() * 4 + 16 {
            let mut moved = 0;
            while pos < wire.len() && moved < chunk && !ring.is_full() {
                ring.write(wire[pos]).unwrap();
                pos += 1;
                moved += 1;
            }
            if let Step::Complete(raw) = scanner.step(&mut ring) {
                if let Ok(frame) = validate(raw) {
                    frames.push((frame.msg_type, frame.data_type, frame.payload.to_vec()));
                }
            }
        }
        frames
    }

    proptest! {
        #[test]
        fn prop_roundtrip_any_chunking(
            msg_type in any::<u8>(),
            data_type in any::<u8>(),
            // Bias towards the reserved values so stuffing is exercised
            payload in proptest::collection::vec(
                prop_oneof![Just(0xFFu8), Just(0xFEu8), any::<u8>()],
                0..=60,
            ),
            chunk in 1usize..20,
        ) {
            let mut body = std::vec![msg_type, data_type];
            body.extend_from_slice(&payload);
            let wire = encode_to_vec(&body).unwrap();

            let frames = receive(&wire, chunk);
            prop_assert_eq!(frames, std::vec![(msg_type, data_type, payload)]);
        }

        #[test]
        fn prop_back_to_back_frames(
            first in proptest::collection::vec(any::<u8>(), 2..30),
            second in proptest::collection::vec(any::<u8>(), 2..30),
        ) {
            let mut wire = encode_to_vec(&first).unwrap().to_vec();
            wire.extend_from_slice(&encode_to_vec(&second).unwrap());

            let frames = receive(&wire, 5);
            prop_assert_eq!(frames.len(), 2);
            prop_assert_eq!(&frames[1].2[..], &second[2..]);
        }
    }
}
