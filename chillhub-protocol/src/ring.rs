//! Fixed-capacity circular byte buffer
//!
//! Sits between byte arrival (the UART producer) and the frame scanner
//! (the consumer). Both run on the same cooperative loop, so no locking
//! is done here; moving the producer into an interrupt requires wrapping
//! the buffer in a critical-section mutex or replacing it with an SPSC
//! queue.

/// Returned by [`RingBuffer::write`] when no space is left
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RingFull;

/// Circular byte store with random-access peek
///
/// Invariants: `count <= N`, `tail == (head + count) % N`.
#[derive(Debug, Clone)]
pub struct RingBuffer<const N: usize> {
    buf: [u8; N],
    head: usize,
    tail: usize,
    count: usize,
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RingBuffer<N> {
    const NON_EMPTY: () = assert!(N > 0, "ring buffer capacity must be non-zero");

    /// Create an empty buffer
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            buf: [0; N],
            head: 0,
            tail: 0,
            count: 0,
        }
    }

    /// Append one byte at the tail
    pub fn write(&mut self, byte: u8) -> Result<(), RingFull> {
        if self.is_full() {
            return Err(RingFull);
        }
        self.buf[self.tail] = byte;
        self.tail = (self.tail + 1) % N;
        self.count += 1;
        Ok(())
    }

    /// Append one byte, evicting the oldest unread byte first if full
    ///
    /// Returns the evicted byte, if any.
    pub fn write_evicting(&mut self, byte: u8) -> Option<u8> {
        let evicted = if self.is_full() { self.read() } else { None };
        // Cannot fail: at least one slot is free here
        let _ = self.write(byte);
        evicted
    }

    /// Pop the oldest unread byte
    pub fn read(&mut self) -> Option<u8> {
        if self.is_empty() {
            return None;
        }
        let byte = self.buf[self.head];
        self.head = (self.head + 1) % N;
        self.count -= 1;
        Some(byte)
    }

    /// Look at the `offset`-th unread byte (0 = oldest) without consuming it
    pub fn peek(&self, offset: usize) -> Option<u8> {
        if offset >= self.count {
            return None;
        }
        Some(self.buf[(self.head + offset) % N])
    }

    /// Drop up to `n` of the oldest unread bytes, returning how many went
    pub fn discard(&mut self, n: usize) -> usize {
        let n = n.min(self.count);
        self.head = (self.head + n) % N;
        self.count -= n;
        n
    }

    /// Drop all unread bytes
    pub fn clear(&mut self) {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
    }

    /// True if nothing is waiting to be read
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// True if the next [`RingBuffer::write`] would fail
    pub fn is_full(&self) -> bool {
        self.count == N
    }

    /// Number of unread bytes
    pub fn bytes_used(&self) -> usize {
        self.count
    }

    /// Free slots
    pub fn bytes_available(&self) -> usize {
        N - self.count
    }

    /// Total number of slots, `N`
    pub const fn capacity(&self) -> usize {
        N
    }
}
