//! Wire constants shared by both directions of the hub link
//!
//! Message type codes and data type tags follow the ChillHub tables.
//! Codes up to [`RESERVED_MSG_MAX`] belong to the hub/fridge, everything
//! above is user defined and routed to cloud listeners.

/// Frame start marker
pub const STX: u8 = 0xFF;

/// Escape marker; the next byte is taken literally
pub const ESC: u8 = 0xFE;

/// Size of the trailing checksum
pub const CRC_LEN: usize = 2;

/// Highest message type reserved for hub/fridge messages
pub const RESERVED_MSG_MAX: u8 = 0x4F;

/// Returns true for bytes that must be escaped on the wire
pub const fn is_control(byte: u8) -> bool {
    byte == STX || byte == ESC
}

// Message type IDs: system
pub const MSG_DEVICE_ID: u8 = 0x00;
pub const MSG_SUBSCRIBE: u8 = 0x01;
pub const MSG_UNSUBSCRIBE: u8 = 0x02;
pub const MSG_SET_ALARM: u8 = 0x03;
pub const MSG_UNSET_ALARM: u8 = 0x04;
pub const MSG_ALARM_NOTIFY: u8 = 0x05;
pub const MSG_GET_TIME: u8 = 0x06;
pub const MSG_TIME_RESPONSE: u8 = 0x07;
pub const MSG_DEVICE_ID_REQUEST: u8 = 0x08;
pub const MSG_REGISTER_RESOURCE: u8 = 0x09;
pub const MSG_UPDATE_RESOURCE: u8 = 0x0A;
pub const MSG_RESOURCE_UPDATED: u8 = 0x0B;
pub const MSG_SET_DEVICE_UUID: u8 = 0x0C;
pub const MSG_KEEP_ALIVE: u8 = 0x0D;

// Message type IDs: fridge data (0x0E-0x0F reserved)
pub const MSG_FILTER_ALERT: u8 = 0x10;
pub const MSG_WATER_FILTER_CALENDAR_TIMER: u8 = 0x11;
pub const MSG_WATER_FILTER_CALENDAR_PERCENT_USED: u8 = 0x12;
pub const MSG_WATER_FILTER_HOURS_REMAINING: u8 = 0x13;
pub const MSG_WATER_USAGE_TIMER: u8 = 0x14;
pub const MSG_WATER_FILTER_USAGE_TIME_PERCENT_USED: u8 = 0x15;
pub const MSG_WATER_FILTER_OUNCES_REMAINING: u8 = 0x16;
pub const MSG_COMMAND_FEATURES: u8 = 0x17;
pub const MSG_TEMPERATURE_ALERT: u8 = 0x18;
pub const MSG_FRESH_FOOD_DISPLAY_TEMPERATURE: u8 = 0x19;
pub const MSG_FREEZER_DISPLAY_TEMPERATURE: u8 = 0x1A;
pub const MSG_FRESH_FOOD_SETPOINT_TEMPERATURE: u8 = 0x1B;
pub const MSG_FREEZER_SETPOINT_TEMPERATURE: u8 = 0x1C;
pub const MSG_DOOR_ALARM_ALERT: u8 = 0x1D;
pub const MSG_ICE_MAKER_BUCKET_STATUS: u8 = 0x1E;
pub const MSG_ODOR_FILTER_CALENDAR_TIMER: u8 = 0x1F;
pub const MSG_ODOR_FILTER_PERCENT_USED: u8 = 0x20;
pub const MSG_ODOR_FILTER_HOURS_REMAINING: u8 = 0x21;
pub const MSG_DOOR_STATUS: u8 = 0x22;
pub const MSG_DC_SWITCH_STATE: u8 = 0x23;
pub const MSG_AC_INPUT_STATE: u8 = 0x24;
pub const MSG_ICE_MAKER_MOLD_THERMISTOR_TEMPERATURE: u8 = 0x25;
pub const MSG_ICE_CABINET_THERMISTOR_TEMPERATURE: u8 = 0x26;
pub const MSG_HOT_WATER_THERMISTOR_1_TEMPERATURE: u8 = 0x27;
pub const MSG_HOT_WATER_THERMISTOR_2_TEMPERATURE: u8 = 0x28;
pub const MSG_DCT_SWITCH_STATE: u8 = 0x29;
pub const MSG_RELAY_STATUS: u8 = 0x2A;
pub const MSG_DUCT_DOOR_STATUS: u8 = 0x2B;
pub const MSG_ICE_MAKER_STATE_SELECTION: u8 = 0x2C;
pub const MSG_ICE_MAKER_OPERATIONAL_STATE: u8 = 0x2D;

/// Data type tag carried in the second body byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DataType {
    Array = 0x01,
    String = 0x02,
    U8 = 0x03,
    I8 = 0x04,
    U16 = 0x05,
    I16 = 0x06,
    U32 = 0x07,
    I32 = 0x08,
    Json = 0x09,
    Boolean = 0x10,
}

impl DataType {
    /// Parse a tag from its wire format byte
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(DataType::Array),
            0x02 => Some(DataType::String),
            0x03 => Some(DataType::U8),
            0x04 => Some(DataType::I8),
            0x05 => Some(DataType::U16),
            0x06 => Some(DataType::I16),
            0x07 => Some(DataType::U32),
            0x08 => Some(DataType::I32),
            0x09 => Some(DataType::Json),
            0x10 => Some(DataType::Boolean),
            _ => None,
        }
    }

    /// Convert to wire format byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}
