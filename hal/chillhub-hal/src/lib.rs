//! ChillHub Hardware Abstraction Layer
//!
//! The serial channel only needs three things from the physical link:
//! whether a byte is waiting, how to read it, and how to write a slice.
//! Chip-specific HALs implement [`uart::UartRx`] and [`uart::UartTx`] for
//! their peripheral; the protocol crate stays agnostic of the transport.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  chillhub-protocol (Channel, scanner)    │
//! └──────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌──────────────────────────────────────────┐
//! │  chillhub-hal (this crate - traits)      │
//! └──────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  board UART   │       │   MockUart    │
//! └───────────────┘       └───────────────┘
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod uart;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use uart::{Uart, UartRx, UartTx};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockUart;
