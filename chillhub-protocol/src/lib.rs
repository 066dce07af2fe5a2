//! ChillHub serial protocol, peripheral side
//!
//! Receive-side framing and dispatch for the UART link between a
//! peripheral and the ChillHub. Bytes arrive in arbitrary chunks; the
//! [`Channel`] buffers them, finds frames, checks their CRC and calls the
//! handler registered for each message.
//!
//! # Protocol Overview
//!
//! ```text
//! ┌─────┬─────┬──────────┬───────────┬─────────────┬──────────┐
//! │ STX │ LEN │ MSG TYPE │ DATA TYPE │ PAYLOAD     │ CRC16 BE │
//! │ 1B  │ 1B  │ 1B       │ 1B        │ LEN - 2 B   │ 2B       │
//! └─────┴─────┴──────────┴───────────┴─────────────┴──────────┘
//! ```
//!
//! Every byte after STX that equals STX (0xFF) or ESC (0xFE) is preceded
//! by ESC on the wire.
//!
//! # Example
//!
//! ```ignore
//! let mut channel: Channel<_, App> = Channel::new(uart, ChannelConfig::default());
//! channel.subscribe(wire::MSG_FRESH_FOOD_DISPLAY_TEMPERATURE, Handler::U16(App::on_temp))?;
//! loop {
//!     channel.poll(&mut app);
//! }
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod channel;
pub mod config;
pub mod crc;
pub mod diagnostics;
pub mod dispatch;
pub mod encoder;
pub mod frame;
pub mod messages;
pub mod registry;
pub mod ring;
pub mod scanner;
pub mod wire;

pub use channel::{Channel, SendError};
pub use config::{ChannelConfig, OverflowPolicy};
pub use diagnostics::{Diagnostic, Stats};
pub use dispatch::{Delivery, DispatchError};
pub use encoder::{encode_frame, encode_to_vec, EncodeError};
pub use frame::{validate, Frame, ValidationError};
pub use messages::{HubRequest, Value};
pub use registry::{Category, Handler, Key, Registry, RegistryFull, Shape};
pub use ring::{RingBuffer, RingFull};
pub use scanner::{FrameScanner, ScanState, Step};
