//! Payload decoding and handler invocation
//!
//! Alarm notifications and time responses carry an array regardless of
//! their data type tag:
//! ```text
//! alarm:  [count][elem type][id][t0][t1][t2][t3]
//! time:   [count][elem type][t0][t1][t2][t3]
//! ```
//! Everything else is routed by message type and decoded by tag.

use crate::frame::Frame;
use crate::registry::{Category, Handler, Key, Registry, Shape};
use crate::wire::{DataType, MSG_ALARM_NOTIFY, MSG_TIME_RESPONSE};

/// Array header (element count, element type) ahead of notification data
const NOTIFY_HEADER_LEN: usize = 2;

const TIMESTAMP_LEN: usize = 4;

/// Why a validated frame was not delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// Nothing registered for the resolved key
    NoHandler(Key),
    /// Data type tag this layer does not decode
    UnknownDataType { msg_type: u8, data_type: u8 },
    /// Registered handler expects a different payload shape
    ShapeMismatch { key: Key, expected: Shape, decoded: Shape },
    /// Payload shorter than its shape requires
    Truncated { msg_type: u8, len: usize },
    /// String payload is not UTF-8 and the handler wants `&str`
    InvalidText { msg_type: u8 },
}

/// A delivered message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Delivery {
    pub key: Key,
    pub shape: Shape,
    /// The handler was one-shot and has been unregistered
    pub removed: bool,
}

/// Decoded payload value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value<'a> {
    U8(u8),
    U16(u16),
    U32(u32),
    /// Raw string bytes; UTF-8 is checked only for [`Handler::Text`]
    Text(&'a [u8]),
    Timestamp([u8; TIMESTAMP_LEN]),
}

impl Value<'_> {
    fn shape(&self) -> Shape {
        match self {
            Value::U8(_) => Shape::U8,
            Value::U16(_) => Shape::U16,
            Value::U32(_) => Shape::U32,
            Value::Text(_) => Shape::Text,
            Value::Timestamp(_) => Shape::Timestamp,
        }
    }
}

/// Category for an ordinary (non-notification) message type
pub fn category_for(msg_type: u8, reserved_msg_max: u8) -> Category {
    if msg_type <= reserved_msg_max {
        Category::Device
    } else {
        Category::Cloud
    }
}

/// Decode `frame` and invoke its registered handler
///
/// Time-response handlers are removed after they run.
pub fn dispatch<C, const N: usize>(
    frame: &Frame<'_>,
    registry: &mut Registry<C, N>,
    ctx: &mut C,
    reserved_msg_max: u8,
) -> Result<Delivery, DispatchError> {
    let (key, value) = decode(frame, reserved_msg_max)?;
    let handler = registry.lookup(key).ok_or(DispatchError::NoHandler(key))?;

    match (handler, value) {
        (Handler::U8(f), Value::U8(v)) => f(ctx, v),
        (Handler::U16(f), Value::U16(v)) => f(ctx, v),
        (Handler::U32(f), Value::U32(v)) => f(ctx, v),
        (Handler::Text(f), Value::Text(v)) => {
            let text = core::str::from_utf8(v).map_err(|_| DispatchError::InvalidText {
                msg_type: frame.msg_type,
            })?;
            f(ctx, text)
        }
        (Handler::Bytes(f), Value::Text(v)) => f(ctx, v),
        (Handler::Timestamp(f), Value::Timestamp(v)) => f(ctx, v),
        (handler, value) => {
            return Err(DispatchError::ShapeMismatch {
                key,
                expected: handler.shape(),
                decoded: value.shape(),
            })
        }
    }

    let removed = key.category == Category::Time && registry.remove(key).is_some();
    Ok(Delivery {
        key,
        shape: handler.shape(),
        removed,
    })
}

fn decode<'a>(
    frame: &Frame<'a>,
    reserved_msg_max: u8,
) -> Result<(Key, Value<'a>), DispatchError> {
    let msg_type = frame.msg_type;
    let truncated = || DispatchError::Truncated {
        msg_type,
        len: frame.payload.len(),
    };

    match msg_type {
        MSG_ALARM_NOTIFY | MSG_TIME_RESPONSE => {
            let data = frame.payload.get(NOTIFY_HEADER_LEN..).ok_or_else(truncated)?;
            let (key, stamp) = if msg_type == MSG_ALARM_NOTIFY {
                let (&id, rest) = data.split_first().ok_or_else(truncated)?;
                (Key::alarm(id), rest)
            } else {
                (Key::time(), data)
            };
            let stamp: [u8; TIMESTAMP_LEN] = stamp
                .get(..TIMESTAMP_LEN)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(truncated)?;
            Ok((key, Value::Timestamp(stamp)))
        }
        _ => {
            let key = Key::new(category_for(msg_type, reserved_msg_max), msg_type);
            let payload = frame.payload;
            let value = match DataType::from_byte(frame.data_type) {
                Some(DataType::String) => Value::Text(payload),
                Some(DataType::U8) | Some(DataType::Boolean) => {
                    Value::U8(*payload.first().ok_or_else(truncated)?)
                }
                Some(DataType::U16) => {
                    let bytes = payload.get(..2).ok_or_else(truncated)?;
                    Value::U16(u16::from_be_bytes([bytes[0], bytes[1]]))
                }
                Some(DataType::U32) => {
                    let bytes = payload.get(..4).ok_or_else(truncated)?;
                    Value::U32(u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
                }
                _ => {
                    return Err(DispatchError::UnknownDataType {
                        msg_type,
                        data_type: frame.data_type,
                    })
                }
            };
            Ok((key, value))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::{MSG_KEEP_ALIVE, RESERVED_MSG_MAX};

    #[derive(Default)]
    struct App {
        u8s: std::vec::Vec<u8>,
        u16s: std::vec::Vec<u16>,
        u32s: std::vec::Vec<u32>,
        texts: std::vec::Vec<std::string::String>,
        raw: std::vec::Vec<std::vec::Vec<u8>>,
        stamps: std::vec::Vec<[u8; 4]>,
    }

    fn on_u8(app: &mut App, v: u8) {
        app.u8s.push(v);
    }
    fn on_u16(app: &mut App, v: u16) {
        app.u16s.push(v);
    }
    fn on_u32(app: &mut App, v: u32) {
        app.u32s.push(v);
    }
    fn on_text(app: &mut App, v: &str) {
        app.texts.push(v.into());
    }
    fn on_raw(app: &mut App, v: &[u8]) {
        app.raw.push(v.to_vec());
    }
    fn on_stamp(app: &mut App, v: [u8; 4]) {
        app.stamps.push(v);
    }

    fn frame(msg_type: u8, data_type: u8, payload: &[u8]) -> Frame<'_> {
        Frame {
            msg_type,
            data_type,
            payload,
            checksum: 0,
        }
    }

    fn run(
        registry: &mut Registry<App, 8>,
        app: &mut App,
        f: Frame<'_>,
    ) -> Result<Delivery, DispatchError> {
        dispatch(&f, registry, app, RESERVED_MSG_MAX)
    }

    #[test]
    fn test_category_boundary() {
        assert_eq!(category_for(0x00, RESERVED_MSG_MAX), Category::Device);
        assert_eq!(category_for(0x4F, RESERVED_MSG_MAX), Category::Device);
        assert_eq!(category_for(0x50, RESERVED_MSG_MAX), Category::Cloud);
        assert_eq!(category_for(0xFF, RESERVED_MSG_MAX), Category::Cloud);
    }

    #[test]
    fn test_u8_and_boolean() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::device(MSG_KEEP_ALIVE), Handler::U8(on_u8))
            .unwrap();
        registry
            .register(Key::device(0x22), Handler::U8(on_u8))
            .unwrap();

        run(&mut registry, &mut app, frame(MSG_KEEP_ALIVE, 0x03, &[5])).unwrap();
        run(&mut registry, &mut app, frame(0x22, 0x10, &[1])).unwrap();
        assert_eq!(app.u8s, [5, 1]);
    }

    #[test]
    fn test_u16_u32_big_endian() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::device(0x19), Handler::U16(on_u16))
            .unwrap();
        registry
            .register(Key::cloud(0x60), Handler::U32(on_u32))
            .unwrap();

        run(&mut registry, &mut app, frame(0x19, 0x05, &[0x12, 0x34])).unwrap();
        run(&mut registry, &mut app, frame(0x60, 0x07, &[0xDE, 0xAD, 0xBE, 0xEF])).unwrap();
        assert_eq!(app.u16s, [0x1234]);
        assert_eq!(app.u32s, [0xDEADBEEF]);
    }

    #[test]
    fn test_text_is_remaining_payload() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::cloud(0x70), Handler::Text(on_text))
            .unwrap();

        run(&mut registry, &mut app, frame(0x70, 0x02, b"hello")).unwrap();
        assert_eq!(app.texts, ["hello"]);

        let err = run(&mut registry, &mut app, frame(0x70, 0x02, &[0xC3, 0x28])).unwrap_err();
        assert_eq!(err, DispatchError::InvalidText { msg_type: 0x70 });
    }

    #[test]
    fn test_bytes_handler_takes_any_string_payload() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::cloud(0x71), Handler::Bytes(on_raw))
            .unwrap();

        let delivery = run(&mut registry, &mut app, frame(0x71, 0x02, &[0xC3, 0x28])).unwrap();
        assert_eq!(delivery.shape, Shape::Bytes);
        run(&mut registry, &mut app, frame(0x71, 0x02, b"")).unwrap();
        assert_eq!(app.raw, [std::vec![0xC3, 0x28], std::vec![]]);

        // Only string frames reach a bytes handler
        assert!(matches!(
            run(&mut registry, &mut app, frame(0x71, 0x03, &[1])).unwrap_err(),
            DispatchError::ShapeMismatch { .. }
        ));
    }

    #[test]
    fn test_alarm_notification_stays_registered() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::alarm(b'A'), Handler::Timestamp(on_stamp))
            .unwrap();

        let payload = [2, 0x03, b'A', 1, 2, 3, 4];
        // Tag is ignored for notifications
        let notify = frame(MSG_ALARM_NOTIFY, 0x01, &payload);
        let delivery = run(&mut registry, &mut app, notify).unwrap();
        assert!(!delivery.removed);
        run(&mut registry, &mut app, frame(MSG_ALARM_NOTIFY, 0x99, &payload)).unwrap();

        assert_eq!(app.stamps, [[1, 2, 3, 4], [1, 2, 3, 4]]);
        assert!(registry.contains(Key::alarm(b'A')));
    }

    #[test]
    fn test_time_response_is_one_shot() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::time(), Handler::Timestamp(on_stamp))
            .unwrap();

        let payload = [1, 0x07, 0x5F, 0x00, 0x10, 0x20];
        let response = frame(MSG_TIME_RESPONSE, 0x01, &payload);
        let delivery = run(&mut registry, &mut app, response).unwrap();
        assert!(delivery.removed);
        assert_eq!(app.stamps, [[0x5F, 0x00, 0x10, 0x20]]);

        let err = run(&mut registry, &mut app, response).unwrap_err();
        assert_eq!(err, DispatchError::NoHandler(Key::time()));
        assert_eq!(app.stamps.len(), 1);
    }

    #[test]
    fn test_short_notification_rejected() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::time(), Handler::Timestamp(on_stamp))
            .unwrap();

        let short = frame(MSG_TIME_RESPONSE, 0x01, &[1, 7, 0, 0]);
        let err = run(&mut registry, &mut app, short).unwrap_err();
        assert!(matches!(err, DispatchError::Truncated { .. }));
        assert!(registry.contains(Key::time()));
    }

    #[test]
    fn test_unknown_tag_and_missing_handler() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::device(0x19), Handler::U16(on_u16))
            .unwrap();

        assert_eq!(
            run(&mut registry, &mut app, frame(0x19, 0x06, &[0, 1])).unwrap_err(),
            DispatchError::UnknownDataType { msg_type: 0x19, data_type: 0x06 }
        );
        assert_eq!(
            run(&mut registry, &mut app, frame(0x1A, 0x05, &[0, 1])).unwrap_err(),
            DispatchError::NoHandler(Key::device(0x1A))
        );
        assert!(app.u16s.is_empty());
    }

    #[test]
    fn test_shape_mismatch_and_truncation() {
        let mut registry = Registry::new();
        let mut app = App::default();
        registry
            .register(Key::device(0x19), Handler::U16(on_u16))
            .unwrap();

        assert_eq!(
            run(&mut registry, &mut app, frame(0x19, 0x03, &[7])).unwrap_err(),
            DispatchError::ShapeMismatch {
                key: Key::device(0x19),
                expected: Shape::U16,
                decoded: Shape::U8,
            }
        );
        assert!(matches!(
            run(&mut registry, &mut app, frame(0x19, 0x05, &[7])).unwrap_err(),
            DispatchError::Truncated { msg_type: 0x19, len: 1 }
        ));
        assert!(app.u16s.is_empty());
    }
}
