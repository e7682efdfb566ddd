//! Notifications pushed by the PLC for an active subscription.
//!
//! Notifications carry no function code. Only the `0x0400` kind carries
//! data: a credit tick, a sequence number and a value list whose entries
//! are keyed by a one-byte item return code.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    function::delete_object::INTEGRITY_ID_THRESHOLD,
    object::{ElementId, ObjectTree, decode_object_tree},
    value::{ValueNode, decode_value},
};

const DATA_NOTIFICATION: u16 = 0x0400;

const ITEM_END: u8 = 0x00;
const ITEM_ACCESS_ERROR: u8 = 0x13;
const ITEM_VALUE: u8 = 0x92;
const ITEM_ID_VALUE: u8 = 0x9b;
const ITEM_UNKNOWN_9C: u8 = 0x9c;

/// One entry of a notification value list.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "item", rename_all = "snake_case")]
pub enum NotificationItem {
    /// Return code `0x92`: item reference number and value.
    Value {
        reference: u32,
        value: ValueNode,
        #[serde(skip_serializing_if = "Option::is_none")]
        members: Option<NotificationValues>,
    },
    /// Return code `0x9b`: VLQ id and value.
    IdValue {
        id: u32,
        value: ValueNode,
        #[serde(skip_serializing_if = "Option::is_none")]
        members: Option<NotificationValues>,
    },
    /// Return code `0x9c`: four bytes of unknown meaning.
    Unknown9c { value: u32 },
    /// Return code `0x13`: the referenced item could not be read.
    AccessError { reference: u32 },
    /// A return code whose layout is unknown; the list stops after it.
    Unsupported { return_code: u8 },
}

/// Decoded notification value list.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct NotificationValues {
    pub items: Vec<NotificationItem>,
    /// The list ended with a zero return code rather than an unsupported
    /// one.
    pub terminated: bool,
}

/// Trailing object block some notifications append after the values.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotificationObjects {
    pub subscription_object_id: u32,
    pub unknown1: u16,
    pub unknown2: u8,
    pub objects: ObjectTree,
}

/// Data part of a `0x0400` notification.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotificationData {
    pub unknown4: u16,
    pub credit_tick: u8,
    pub sequence_number: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown5: Option<u8>,
    pub values: NotificationValues,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objects: Option<NotificationObjects>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Notification {
    pub subscription_object_id: u32,
    pub unknown2: u16,
    pub unknown3: u16,
    /// Present only for data notifications.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<NotificationData>,
}

impl Notification {
    /// Whether the notification carried values or an object block.
    #[must_use]
    pub fn has_data(&self) -> bool {
        self.data
            .as_ref()
            .is_some_and(|data| !data.values.items.is_empty() || data.objects.is_some())
    }
}

/// Decode a notification value list up to its terminator or the first
/// unsupported return code.
///
/// # Errors
///
/// Returns [`DecodeError`] when an entry is truncated, a value is malformed
/// or struct nesting passes the configured depth.
pub fn decode_notification_values(
    reader: &mut Reader<'_, '_>,
) -> Result<NotificationValues, DecodeError> {
    let mut list = NotificationValues::default();
    // Every entry consumes at least its return code.
    for _ in 0..=reader.remaining() {
        let start = reader.position();
        let return_code = reader.u8()?;
        let item = match return_code {
            ITEM_END => {
                reader.label(start, &"Terminating Item/List");
                list.terminated = true;
                return Ok(list);
            }
            ITEM_VALUE => {
                let reference = reader.u32()?;
                let (value, members) = decode_member_value(reader)?;
                reader.label(start, &format_args!("Item [{reference}]: {value}"));
                NotificationItem::Value {
                    reference,
                    value,
                    members,
                }
            }
            ITEM_ID_VALUE => {
                let id = reader.varuint32()?;
                let (value, members) = decode_member_value(reader)?;
                reader.label(start, &format_args!("Item [{id}]: {value}"));
                NotificationItem::IdValue { id, value, members }
            }
            ITEM_UNKNOWN_9C => {
                let value = reader.u32()?;
                reader.label(start, &format_args!("Returncode 0x9c, Value: 0x{value:08x}"));
                NotificationItem::Unknown9c { value }
            }
            ITEM_ACCESS_ERROR => {
                let reference = reader.u32()?;
                reader.label(start, &format_args!("Item [{reference}]: Access error"));
                NotificationItem::AccessError { reference }
            }
            return_code => {
                reader.label(
                    start,
                    &format_args!("Unknown return code 0x{return_code:02x}, stop decoding"),
                );
                list.items.push(NotificationItem::Unsupported { return_code });
                return Ok(list);
            }
        };
        list.items.push(item);
    }
    Err(DecodeError::Truncated {
        offset: reader.position(),
        needed: 1,
        available: reader.remaining(),
    })
}

fn decode_member_value(
    reader: &mut Reader<'_, '_>,
) -> Result<(ValueNode, Option<NotificationValues>), DecodeError> {
    let decoded = decode_value(reader)?;
    let members = if decoded.entered_struct {
        Some(reader.nested(decode_notification_values)?)
    } else {
        None
    };
    Ok((decoded.node, members))
}

/// Decode a notification body; the opcode byte is already consumed.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or a value is
/// malformed.
pub fn decode_notification(reader: &mut Reader<'_, '_>) -> Result<Notification, DecodeError> {
    let start = reader.position();
    let subscription_object_id = reader.u32()?;
    reader.label(
        start,
        &format_args!("Subscription Object Id: 0x{subscription_object_id:08x}"),
    );
    let unknown2 = reader.u16()?;
    let unknown3 = reader.u16()?;
    let data = if unknown2 == DATA_NOTIFICATION {
        Some(decode_data(reader, subscription_object_id)?)
    } else {
        None
    };
    Ok(Notification {
        subscription_object_id,
        unknown2,
        unknown3,
        data,
    })
}

fn decode_data(
    reader: &mut Reader<'_, '_>,
    subscription_object_id: u32,
) -> Result<NotificationData, DecodeError> {
    let extended = subscription_object_id > INTEGRITY_ID_THRESHOLD;
    let unknown4 = reader.u16()?;
    let credit_tick = reader.u8()?;
    let start = reader.position();
    let sequence_number = if extended {
        reader.varuint32()?
    } else {
        u32::from(reader.u8()?)
    };
    reader.label(
        start,
        &format_args!("Notification sequence number: {sequence_number}"),
    );
    let unknown5 = match reader.peek_u8() {
        Some(byte) if byte != 0 && byte < 0x10 => Some(reader.u8()?),
        _ => None,
    };
    let values = decode_notification_values(reader)?;

    let mut objects = None;
    if reader.peek_u8().is_some_and(|b| b != 0) && reader.peek_u32().is_some_and(|id| id != 0) {
        let subscription_object_id = reader.u32()?;
        let unknown1 = reader.u16()?;
        let unknown2 = reader.u8()?;
        let tree = if reader.peek_u8() == Some(ElementId::START_OBJECT) {
            decode_object_tree(reader)?
        } else {
            ObjectTree::new()
        };
        objects = Some(NotificationObjects {
            subscription_object_id,
            unknown1,
            unknown2,
            objects: tree,
        });
    }
    if extended && !reader.is_abandoned() {
        reader.skip(3)?;
    }

    Ok(NotificationData {
        unknown4,
        credit_tick,
        sequence_number,
        unknown5,
        values,
        objects,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{error::DecodeError, test_helpers::decode_with};

    fn header(subscription_object_id: u32, kind: u16) -> Vec<u8> {
        let mut bytes = subscription_object_id.to_be_bytes().to_vec();
        bytes.extend_from_slice(&kind.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x00]);
        bytes
    }

    #[test]
    fn status_notification_has_no_data() {
        let bytes = header(0x1000_0001, 0x0100);
        let decoded = decode_with(&bytes, decode_notification);
        assert_eq!(decoded.position, 8);
        let notification = decoded.expect("notification");
        assert!(notification.data.is_none());
        assert!(!notification.has_data());
    }

    #[test]
    fn short_ids_use_byte_sequence_numbers() {
        let mut bytes = header(0x1000_0001, DATA_NOTIFICATION);
        bytes.extend_from_slice(&[0x00, 0x00, 0x03, 0x2a]);
        bytes.push(ITEM_VALUE);
        bytes.extend_from_slice(&7_u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x02, 0x11]);
        bytes.push(ITEM_END);
        bytes.push(0x00);

        let decoded = decode_with(&bytes, decode_notification);
        assert_eq!(decoded.position, bytes.len() - 1, "a zero byte means no object block");
        let notification = decoded.expect("notification");
        assert!(notification.has_data());
        let data = notification.data.expect("data");
        assert_eq!(data.credit_tick, 3);
        assert_eq!(data.sequence_number, 0x2a);
        assert!(data.values.terminated);
        assert!(matches!(
            data.values.items[0],
            NotificationItem::Value { reference: 7, .. }
        ));
    }

    #[test]
    fn long_ids_use_vlq_sequence_numbers_and_padding() {
        let mut bytes = header(0x7000_0100, DATA_NOTIFICATION);
        bytes.extend_from_slice(&[0x00, 0x00, 0x01, 0x81, 0x00, 0x05]);
        bytes.push(ITEM_ID_VALUE);
        bytes.extend_from_slice(&[0x0a, 0x00, 0x01, 0x01]);
        bytes.push(ITEM_END);
        bytes.extend_from_slice(&[0x00, 0x00, 0x00]);

        let decoded = decode_with(&bytes, decode_notification);
        assert_eq!(decoded.position, bytes.len());
        let data = decoded.expect("notification").data.expect("data");
        assert_eq!(data.sequence_number, 128);
        assert_eq!(data.unknown5, Some(5));
        assert!(matches!(data.values.items[0], NotificationItem::IdValue { id: 10, .. }));
    }

    #[rstest]
    #[case::access_error(ITEM_ACCESS_ERROR, NotificationItem::AccessError { reference: 1 })]
    #[case::unknown_9c(ITEM_UNKNOWN_9C, NotificationItem::Unknown9c { value: 1 })]
    fn fixed_width_items(#[case] code: u8, #[case] expected: NotificationItem) {
        let bytes = [code, 0, 0, 0, 1, ITEM_END];
        let decoded = decode_with(&bytes, decode_notification_values);
        assert_eq!(decoded.position, bytes.len());
        assert_eq!(decoded.expect("values").items, vec![expected]);
    }

    #[test]
    fn unsupported_return_code_stops_the_list() {
        let bytes = [0x55, 0x01, 0x02];
        let decoded = decode_with(&bytes, decode_notification_values);
        assert_eq!(decoded.position, 1);
        let values = decoded.expect("values");
        assert!(!values.terminated);
        assert_eq!(values.items, vec![NotificationItem::Unsupported {
            return_code: 0x55
        }]);
    }

    #[test]
    fn struct_values_nest_a_member_list() {
        let mut bytes = vec![ITEM_VALUE];
        bytes.extend_from_slice(&1_u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x17, 0, 0, 0, 2]);
        bytes.push(ITEM_ID_VALUE);
        bytes.extend_from_slice(&[0x03, 0x00, 0x02, 0x04]);
        bytes.extend_from_slice(&[ITEM_END, ITEM_END]);
        let decoded = decode_with(&bytes, decode_notification_values);
        assert_eq!(decoded.position, bytes.len());
        let values = decoded.expect("values");
        let NotificationItem::Value { members, .. } = &values.items[0] else {
            panic!("expected a value item");
        };
        assert_eq!(members.as_ref().map(|m| m.items.len()), Some(1));
    }

    #[test]
    fn object_block_follows_values() {
        let mut bytes = header(0x1000_0001, DATA_NOTIFICATION);
        bytes.extend_from_slice(&[0x00, 0x00, 0x01, 0x01, ITEM_END]);
        bytes.extend_from_slice(&0x1000_0002_u32.to_be_bytes());
        bytes.extend_from_slice(&[0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[ElementId::START_OBJECT, 0, 0, 0, 1, 2, 0, 0, ElementId::TERM_OBJECT]);
        let decoded = decode_with(&bytes, decode_notification);
        assert_eq!(decoded.position, bytes.len());
        let data = decoded.expect("notification").data.expect("data");
        let objects = data.objects.expect("object block");
        assert_eq!(objects.subscription_object_id, 0x1000_0002);
        assert_eq!(objects.objects.len(), 1);
    }

    #[test]
    fn truncated_reference_is_an_error() {
        let decoded = decode_with(&[ITEM_VALUE, 0x00], decode_notification_values);
        assert!(matches!(decoded.result, Err(DecodeError::Truncated { offset: 1, .. })));
    }
}
