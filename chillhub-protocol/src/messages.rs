//! Requests from the peripheral to the hub
//!
//! Each request becomes one frame body, message type first. Resource
//! messages use the hub's key/value layout: a field count, then for each
//! field a length-prefixed key followed by a tagged value.

use heapless::Vec;

use crate::encoder::{EncodeError, MAX_BODY_LEN};
use crate::wire::{
    DataType, MSG_DEVICE_ID, MSG_GET_TIME, MSG_REGISTER_RESOURCE, MSG_SET_ALARM, MSG_SUBSCRIBE,
    MSG_UNSET_ALARM, MSG_UNSUBSCRIBE, MSG_UPDATE_RESOURCE,
};

/// Frame body buffer
pub type Body = Vec<u8, MAX_BODY_LEN>;

const KEY_NAME: &str = "name";
const KEY_RES_ID: &str = "resID";
const KEY_CAN_UPDATE: &str = "canUp";
const KEY_INIT_VAL: &str = "initVal";
const KEY_VAL: &str = "val";

/// Typed scalar as carried on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Value {
    U8(u8),
    I8(i8),
    U16(u16),
    I16(i16),
    U32(u32),
    I32(i32),
    Boolean(bool),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::U8(_) => DataType::U8,
            Value::I8(_) => DataType::I8,
            Value::U16(_) => DataType::U16,
            Value::I16(_) => DataType::I16,
            Value::U32(_) => DataType::U32,
            Value::I32(_) => DataType::I32,
            Value::Boolean(_) => DataType::Boolean,
        }
    }

    /// Append the big-endian value bytes (without tag)
    fn write_bytes(&self, body: &mut BodyWriter) -> Result<(), EncodeError> {
        match *self {
            Value::U8(v) => body.byte(v),
            Value::I8(v) => body.bytes(&v.to_be_bytes()),
            Value::U16(v) => body.bytes(&v.to_be_bytes()),
            Value::I16(v) => body.bytes(&v.to_be_bytes()),
            Value::U32(v) => body.bytes(&v.to_be_bytes()),
            Value::I32(v) => body.bytes(&v.to_be_bytes()),
            Value::Boolean(v) => body.byte(v as u8),
        }
    }
}

/// Messages the peripheral sends to the hub
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HubRequest<'a> {
    /// Identify this device: type name and UUID
    DeviceId { name: &'a str, uuid: &'a str },
    /// Ask the hub to forward a fridge message type
    Subscribe(u8),
    Unsubscribe(u8),
    /// Install a cron alarm; the hub replies with alarm notifications
    SetAlarm { id: u8, cron: &'a str },
    UnsetAlarm(u8),
    /// Ask for the current time; the hub replies with a time response
    GetTime,
    /// Plain typed value under an arbitrary message type
    Value { msg_type: u8, value: Value },
    /// Create a cloud resource
    RegisterResource {
        name: &'a str,
        res_id: u8,
        can_update: bool,
        initial: Value,
    },
    /// Push a new value for a cloud resource
    UpdateResource { res_id: u8, value: Value },
}

impl HubRequest<'_> {
    /// Build the frame body for this request
    pub fn to_body(&self) -> Result<Body, EncodeError> {
        let mut body = BodyWriter::default();
        match *self {
            HubRequest::DeviceId { name, uuid } => {
                body.header(MSG_DEVICE_ID, DataType::Array)?;
                body.byte(2)?; // element count
                body.byte(DataType::String.to_byte())?;
                body.short_string(name)?;
                body.short_string(uuid)?;
            }
            HubRequest::Subscribe(msg_type) => {
                body.value_message(MSG_SUBSCRIBE, Value::U8(msg_type))?;
            }
            HubRequest::Unsubscribe(msg_type) => {
                body.value_message(MSG_UNSUBSCRIBE, Value::U8(msg_type))?;
            }
            HubRequest::SetAlarm { id, cron } => {
                // The alarm id travels as the first character of the string
                let len = u8::try_from(cron.len() + 1).map_err(|_| EncodeError::StringTooLong)?;
                body.header(MSG_SET_ALARM, DataType::String)?;
                body.byte(len)?;
                body.byte(id)?;
                body.bytes(cron.as_bytes())?;
            }
            HubRequest::UnsetAlarm(id) => {
                body.value_message(MSG_UNSET_ALARM, Value::U8(id))?;
            }
            HubRequest::GetTime => body.byte(MSG_GET_TIME)?,
            HubRequest::Value { msg_type, value } => body.value_message(msg_type, value)?,
            HubRequest::RegisterResource {
                name,
                res_id,
                can_update,
                initial,
            } => {
                body.header(MSG_REGISTER_RESOURCE, DataType::Json)?;
                body.byte(4)?; // field count
                body.key(KEY_NAME)?;
                body.byte(DataType::String.to_byte())?;
                body.short_string(name)?;
                body.key(KEY_RES_ID)?;
                body.tagged(Value::U8(res_id))?;
                body.key(KEY_CAN_UPDATE)?;
                body.tagged(Value::U8(can_update as u8))?;
                body.key(KEY_INIT_VAL)?;
                body.tagged(initial)?;
            }
            HubRequest::UpdateResource { res_id, value } => {
                body.header(MSG_UPDATE_RESOURCE, DataType::Json)?;
                body.byte(2)?; // field count
                body.key(KEY_RES_ID)?;
                body.tagged(Value::U8(res_id))?;
                body.key(KEY_VAL)?;
                body.tagged(value)?;
            }
        }
        Ok(body.finish())
    }
}

#[derive(Default)]
struct BodyWriter {
    buf: Body,
}

impl BodyWriter {
    fn byte(&mut self, byte: u8) -> Result<(), EncodeError> {
        self.buf.push(byte).map_err(|_| EncodeError::BodyTooLarge)
    }

    fn bytes(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        self.buf
            .extend_from_slice(bytes)
            .map_err(|_| EncodeError::BodyTooLarge)
    }

    fn header(&mut self, msg_type: u8, data_type: DataType) -> Result<(), EncodeError> {
        self.byte(msg_type)?;
        self.byte(data_type.to_byte())
    }

    /// One-byte length prefix followed by the bytes
    fn short_string(&mut self, s: &str) -> Result<(), EncodeError> {
        let len = u8::try_from(s.len()).map_err(|_| EncodeError::StringTooLong)?;
        self.byte(len)?;
        self.bytes(s.as_bytes())
    }

    fn key(&mut self, key: &str) -> Result<(), EncodeError> {
        self.short_string(key)
    }

    fn tagged(&mut self, value: Value) -> Result<(), EncodeError> {
        self.byte(value.data_type().to_byte())?;
        value.write_bytes(self)
    }

    fn value_message(&mut self, msg_type: u8, value: Value) -> Result<(), EncodeError> {
        self.byte(msg_type)?;
        self.tagged(value)
    }

    fn finish(self) -> Body {
        self.buf
    }
}
