//! Frame boundary detection and byte destuffing
//!
//! Wire format after the start marker:
//! ```text
//! ┌─────┬────────────┬──────────┬──────────┬─────────┬────────┐
//! │ STX │ LEN        │ MSG TYPE │ DATA TYPE│ PAYLOAD │ CRC    │
//! │ 1B  │ 1B stuffed │ 1B       │ 1B       │ 0..N    │ 2B BE  │
//! └─────┴────────────┴──────────┴──────────┴─────────┴────────┘
//! ```
//! `LEN` counts MSG TYPE through PAYLOAD. Every byte after STX equal to
//! STX or ESC is sent as `ESC, byte`.
//!
//! The scanner never blocks. When the next unread byte is an ESC whose
//! literal has not arrived yet, it leaves the ESC in the ring buffer and
//! returns; the next step picks up from the same spot.

use heapless::Vec;

use crate::ring::RingBuffer;
use crate::wire::{CRC_LEN, ESC, STX};

/// Scanner state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ScanState {
    /// Waiting for STX
    Idle,
    /// Got STX, waiting for LEN
    ReadingLength,
    /// Accumulating `length + 2` destuffed bytes
    ReadingFrame { length: u8 },
}

/// Result of one scanner step
#[derive(Debug, PartialEq, Eq)]
pub enum Step<'a> {
    /// Not enough buffered input to finish a frame
    Pending,
    /// Declared length does not fit the accumulator; back to idle
    Oversized { length: u8 },
    /// A complete destuffed frame: body followed by the 2 checksum bytes
    Complete(&'a [u8]),
}

/// Three-state frame scanner with an accumulator of `N` bytes
#[derive(Debug, Clone)]
pub struct FrameScanner<const N: usize> {
    state: ScanState,
    frame: Vec<u8, N>,
}

impl<const N: usize> Default for FrameScanner<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> FrameScanner<N> {
    const FITS_CRC: () = assert!(N > CRC_LEN, "accumulator must hold more than the checksum");

    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::FITS_CRC;
        Self {
            state: ScanState::Idle,
            frame: Vec::new(),
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Largest `LEN` value accepted
    pub const fn max_length() -> usize {
        N - CRC_LEN
    }

    /// Abandon any in-flight frame
    pub fn reset(&mut self) {
        self.state = ScanState::Idle;
        self.frame.clear();
    }

    /// Run the handler for the current state once
    pub fn step<const R: usize>(&mut self, ring: &mut RingBuffer<R>) -> Step<'_> {
        match self.state {
            ScanState::Idle => {
                while let Some(byte) = ring.read() {
                    if byte == STX {
                        self.state = ScanState::ReadingLength;
                        break;
                    }
                }
                Step::Pending
            }
            ScanState::ReadingLength => {
                let Some(length) = take_literal(ring) else {
                    return Step::Pending;
                };
                if length as usize > Self::max_length() {
                    self.state = ScanState::Idle;
                    return Step::Oversized { length };
                }
                self.frame.clear();
                self.state = ScanState::ReadingFrame { length };
                Step::Pending
            }
            ScanState::ReadingFrame { length } => {
                let target = length as usize + CRC_LEN;
                while self.frame.len() < target {
                    let Some(byte) = take_literal(ring) else {
                        return Step::Pending;
                    };
                    if self.frame.push(byte).is_err() {
                        // ReadingLength bounds `target` by N
                        unreachable!("frame accumulator overflow");
                    }
                }
                self.state = ScanState::Idle;
                Step::Complete(&self.frame)
            }
        }
    }
}

/// Consume one destuffed byte, or nothing if it is not fully buffered yet
fn take_literal<const R: usize>(ring: &mut RingBuffer<R>) -> Option<u8> {
    match ring.peek(0)? {
        ESC => {
            ring.peek(1)?;
            ring.read();
            ring.read()
        }
        _ => ring.read(),
    }
}
