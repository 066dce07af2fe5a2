//! Receive-side diagnostics
//!
//! Nothing on the receive path is an error to the driver loop. Every
//! dropped byte or frame is reported here instead: logged via defmt when
//! enabled, counted in [`Stats`], and passed to an optional hook.

use crate::dispatch::{Delivery, DispatchError};
use crate::frame::ValidationError;

/// One notable receive-side event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Diagnostic {
    /// Ring buffer full; the oldest unread byte was dropped
    Evicted { byte: u8 },
    /// Ring buffer full; the incoming byte was dropped
    Rejected { byte: u8 },
    /// The UART reported a read error
    UartRead,
    /// Declared length larger than the accumulator; frame abandoned
    Oversized { length: u8 },
    Invalid(ValidationError),
    Dropped(DispatchError),
    Delivered(Delivery),
}

impl Diagnostic {
    /// True for events that mean data was lost
    pub fn is_loss(&self) -> bool {
        !matches!(self, Diagnostic::Delivered(_))
    }
}

/// Callback receiving every [`Diagnostic`]
pub type DiagnosticHook = fn(&Diagnostic);

/// Running counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Stats {
    /// Bytes moved from the UART into the ring buffer
    pub bytes_received: u32,
    /// Bytes lost to ring overflow (either policy)
    pub bytes_dropped: u32,
    pub uart_errors: u32,
    pub oversized: u32,
    pub checksum_errors: u32,
    pub truncated: u32,
    pub undelivered: u32,
    pub delivered: u32,
}

impl Stats {
    pub(crate) fn record(&mut self, diagnostic: &Diagnostic) {
        let counter = match diagnostic {
            Diagnostic::Evicted { .. } | Diagnostic::Rejected { .. } => &mut self.bytes_dropped,
            Diagnostic::UartRead => &mut self.uart_errors,
            Diagnostic::Oversized { .. } => &mut self.oversized,
            Diagnostic::Invalid(ValidationError::ChecksumMismatch { .. }) => {
                &mut self.checksum_errors
            }
            Diagnostic::Invalid(ValidationError::Truncated { .. }) => &mut self.truncated,
            Diagnostic::Dropped(_) => &mut self.undelivered,
            Diagnostic::Delivered(_) => &mut self.delivered,
        };
        *counter = counter.saturating_add(1);
    }
}
