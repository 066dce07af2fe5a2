//! Outbound frame encoding
//!
//! Produces exactly what the receive side expects: STX, then the length,
//! body and big-endian CRC, each byte escaped if it collides with STX or
//! ESC.

use heapless::Vec;

use crate::crc::crc16;
use crate::wire::{is_control, CRC_LEN, ESC, STX};

/// Largest body a single frame can carry (LEN is one byte)
pub const MAX_BODY_LEN: usize = u8::MAX as usize;

/// Worst case on the wire: every byte after STX escaped
pub const MAX_WIRE_LEN: usize = 1 + 2 * (1 + MAX_BODY_LEN + CRC_LEN);

/// Errors that can occur while building an outbound frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EncodeError {
    /// Body exceeds [`MAX_BODY_LEN`]
    BodyTooLarge,
    /// A string field does not fit its one-byte length prefix
    StringTooLong,
    /// Output buffer too small
    BufferTooSmall,
}

/// Bounded byte sink used while stuffing
struct Sink<'a> {
    out: &'a mut [u8],
    pos: usize,
}

impl Sink<'_> {
    fn raw(&mut self, byte: u8) -> Result<(), EncodeError> {
        let slot = self.out.get_mut(self.pos).ok_or(EncodeError::BufferTooSmall)?;
        *slot = byte;
        self.pos += 1;
        Ok(())
    }

    fn stuffed(&mut self, byte: u8) -> Result<(), EncodeError> {
        if is_control(byte) {
            self.raw(ESC)?;
        }
        self.raw(byte)
    }
}

/// Encode `body` (message type onwards) into `buffer`
///
/// Returns the number of bytes written.
pub fn encode_frame(body: &[u8], buffer: &mut [u8]) -> Result<usize, EncodeError> {
    if body.len() > MAX_BODY_LEN {
        return Err(EncodeError::BodyTooLarge);
    }

    let mut sink = Sink { out: buffer, pos: 0 };
    sink.raw(STX)?;
    sink.stuffed(body.len() as u8)?;
    for &byte in body {
        sink.stuffed(byte)?;
    }
    for byte in crc16(body).to_be_bytes() {
        sink.stuffed(byte)?;
    }
    Ok(sink.pos)
}

/// Encode `body` into a heapless Vec sized for the worst case
pub fn encode_to_vec(body: &[u8]) -> Result<Vec<u8, MAX_WIRE_LEN>, EncodeError> {
    let mut buffer = [0u8; MAX_WIRE_LEN];
    let len = encode_frame(body, &mut buffer)?;
    let mut vec = Vec::new();
    vec.extend_from_slice(&buffer[..len])
        .map_err(|_| EncodeError::BufferTooSmall)?;
    Ok(vec)
}
