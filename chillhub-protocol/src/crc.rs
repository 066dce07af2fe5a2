//! CRC-16/CCITT-FALSE, shared with the hub's encoder
//!
//! Polynomial 0x1021, seed 0xFFFF, MSB first, no final xor. Exposed as
//! init/update/finalize so callers can checksum a frame while streaming it.

const POLY: u16 = 0x1021;

/// Seed value
pub const fn crc_init() -> u16 {
    0xFFFF
}

/// Fold `data` into a running checksum
pub fn crc_update(mut crc: u16, data: &[u8]) -> u16 {
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            if crc & 0x8000 != 0 {
                crc = (crc << 1) ^ POLY;
            } else {
                crc <<= 1;
            }
        }
    }
    crc
}

pub const fn crc_finalize(crc: u16) -> u16 {
    crc
}

/// Checksum of a complete byte slice
pub fn crc16(data: &[u8]) -> u16 {
    crc_finalize(crc_update(crc_init(), data))
}
