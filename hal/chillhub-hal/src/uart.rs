//! UART serial communication abstractions
//!
//! Non-blocking receive and blocking transmit, matching how a
//! cooperative poll loop talks to a hardware FIFO.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write all bytes to the UART
    ///
    /// Blocks until all data has been queued or an error occurs.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
///
/// Polled: callers check [`UartRx::byte_available`] before reading, so a
/// read never has to wait for the line.
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Returns true if at least one received byte is waiting
    fn byte_available(&mut self) -> bool;

    /// Read one received byte
    fn read_byte(&mut self) -> Result<u8, Self::Error>;
}

/// Combined UART interface
pub trait Uart: UartTx + UartRx {}

impl<T: UartTx + UartRx> Uart for T {}
