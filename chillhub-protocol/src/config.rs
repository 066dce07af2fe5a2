//! Channel configuration
//!
//! Buffer sizes are const generics on [`crate::Channel`]; everything that
//! can change without resizing memory lives here. With the `serde`
//! feature the struct can be loaded from the board's TOML config.

use crate::wire::RESERVED_MSG_MAX;

/// What to do with an incoming byte when the ring buffer is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OverflowPolicy {
    /// Drop the oldest unread byte and keep the new one
    #[default]
    EvictOldest,
    /// Keep the buffer as is and drop the new byte
    DropNewest,
}

/// Runtime settings for a [`crate::Channel`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChannelConfig {
    /// Highest message type routed to device handlers; above goes to cloud
    pub reserved_msg_max: u8,
    /// Maximum bytes moved from the UART per poll
    pub rx_burst: usize,
    pub overflow: OverflowPolicy,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            reserved_msg_max: RESERVED_MSG_MAX,
            rx_burst: 32,
            overflow: OverflowPolicy::EvictOldest,
        }
    }
}
