//! Host-side UART double
//!
//! Bytes queued with [`MockUart::feed`] are handed out by the receiver
//! half; everything written through the transmitter half is captured in
//! [`MockUart::sent`] and counts as unflushed until [`UartTx::flush`].

use heapless::{Deque, Vec};

use crate::uart::{UartRx, UartTx};

/// Errors raised by [`MockUart`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MockError {
    /// Read attempted with nothing queued
    RxEmpty,
    /// Transmit capture buffer is full
    TxFull,
    /// Injected line error
    Line,
}

/// In-memory UART with bounded receive queue and transmit capture
#[derive(Debug, Default)]
pub struct MockUart<const RX: usize = 1024, const TX: usize = 1024> {
    rx: Deque<u8, RX>,
    tx: Vec<u8, TX>,
    unflushed: usize,
    fail_reads: usize,
}

impl<const RX: usize, const TX: usize> MockUart<RX, TX> {
    pub fn new() -> Self {
        Self {
            rx: Deque::new(),
            tx: Vec::new(),
            unflushed: 0,
            fail_reads: 0,
        }
    }

    /// Queue bytes for the receiver. Returns how many were accepted.
    pub fn feed(&mut self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for &byte in bytes {
            if self.rx.push_back(byte).is_err() {
                break;
            }
            accepted += 1;
        }
        accepted
    }

    /// Make the next `count` reads fail with [`MockError::Line`]
    pub fn fail_next_reads(&mut self, count: usize) {
        self.fail_reads = count;
    }

    /// Bytes still waiting to be read
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    /// Everything transmitted so far
    pub fn sent(&self) -> &[u8] {
        &self.tx
    }

    /// Transmitted bytes not yet followed by a flush
    pub fn unflushed(&self) -> usize {
        self.unflushed
    }

    /// Forget captured transmit data
    pub fn clear_sent(&mut self) {
        self.tx.clear();
        self.unflushed = 0;
    }
}

impl<const RX: usize, const TX: usize> UartRx for MockUart<RX, TX> {
    type Error = MockError;

    fn byte_available(&mut self) -> bool {
        !self.rx.is_empty()
    }

    fn read_byte(&mut self) -> Result<u8, MockError> {
        if self.fail_reads > 0 {
            self.fail_reads -= 1;
            // A line error still consumes the byte on real hardware
            self.rx.pop_front();
            return Err(MockError::Line);
        }
        self.rx.pop_front().ok_or(MockError::RxEmpty)
    }
}

impl<const RX: usize, const TX: usize> UartTx for MockUart<RX, TX> {
    type Error = MockError;

    fn write_bytes(&mut self, data: &[u8]) -> Result<(), MockError> {
        self.tx
            .extend_from_slice(data)
            .map_err(|_| MockError::TxFull)?;
        self.unflushed += data.len();
        Ok(())
    }

    fn flush(&mut self) -> Result<(), MockError> {
        self.unflushed = 0;
        Ok(())
    }
}
