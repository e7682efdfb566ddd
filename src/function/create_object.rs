//! CreateObject: opening a session or a subscription object.

use serde::Serialize;

use crate::{
    cursor::Reader,
    error::DecodeError,
    object::{ElementId, ObjectTree, decode_object_tree},
    return_value::{ReturnValue, decode_return_value},
    telegram::PduType,
    value::{ValueNode, decode_value},
};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateObjectRequest {
    pub request_id: u32,
    /// Usually a struct whose members are given by the object tree, so no
    /// member list follows it.
    pub value: ValueNode,
    pub unknown: u32,
    /// Extra VLQ sent by newer firmware ahead of the object tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_id: Option<u32>,
    pub objects: ObjectTree,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CreateObjectResponse {
    pub return_value: ReturnValue,
    pub object_ids: Vec<u32>,
    /// Only sent in reply to a connect.
    pub objects: ObjectTree,
}

/// Decode a create-object request.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or a value is malformed.
pub fn decode_request(
    reader: &mut Reader<'_, '_>,
    pdu_type: PduType,
) -> Result<CreateObjectRequest, DecodeError> {
    let start = reader.position();
    let request_id = reader.u32()?;
    reader.label(start, &format_args!("Request Id: 0x{request_id:08x}"));
    let value = decode_value(reader)?.node;
    let unknown = reader.u32()?;
    let extra_id = if matches!(pdu_type, PduType::Data | PduType::DataFw1_5)
        && reader.peek_u8() != Some(ElementId::START_OBJECT)
    {
        Some(reader.varuint32()?)
    } else {
        None
    };
    let objects = decode_object_tree(reader)?;
    Ok(CreateObjectRequest {
        request_id,
        value,
        unknown,
        extra_id,
        objects,
    })
}

/// Decode a create-object response.
///
/// # Errors
///
/// Returns [`DecodeError`] when a field is truncated or the tree is
/// malformed.
pub fn decode_response(
    reader: &mut Reader<'_, '_>,
    pdu_type: PduType,
) -> Result<CreateObjectResponse, DecodeError> {
    let return_value = decode_return_value(reader)?;
    let count = reader.u8()?;
    let start = reader.position();
    let object_ids = (0..count)
        .map(|_| reader.varuint32())
        .collect::<Result<Vec<_>, _>>()?;
    reader.label(start, &format_args!("Object Ids: {object_ids:?}"));
    let objects = if pdu_type == PduType::Connect {
        decode_object_tree(reader)?
    } else {
        ObjectTree::new()
    };
    Ok(CreateObjectResponse {
        return_value,
        object_ids,
        objects,
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::{object::ObjectNode, test_helpers::decode_with};

    fn request_bytes(extra: &[u8]) -> Vec<u8> {
        let mut bytes = 0x0000_0120_u32.to_be_bytes().to_vec();
        bytes.extend_from_slice(&[0x00, 0x04, 0x81, 0x80, 0x00]);
        bytes.extend_from_slice(&0_u32.to_be_bytes());
        bytes.extend_from_slice(extra);
        bytes.extend_from_slice(&[ElementId::START_OBJECT, 0, 0, 0, 1, 2, 0, 0, ElementId::TERM_OBJECT]);
        bytes
    }

    #[rstest]
    #[case::connect_has_no_extra_id(PduType::Connect, &[], None)]
    #[case::data_without_extra_id(PduType::Data, &[], None)]
    #[case::data_with_extra_id(PduType::Data, &[0x81, 0x01], Some(129))]
    #[case::fw1_5_with_extra_id(PduType::DataFw1_5, &[0x07], Some(7))]
    fn request_extra_id_depends_on_pdu_type(
        #[case] pdu_type: PduType,
        #[case] extra: &[u8],
        #[case] expected: Option<u32>,
    ) {
        let bytes = request_bytes(extra);
        let decoded = decode_with(&bytes, |r| decode_request(r, pdu_type));
        assert_eq!(decoded.position, bytes.len());
        let request = decoded.expect("create object request");
        assert_eq!(request.request_id, 0x120);
        assert_eq!(request.extra_id, expected);
        assert_eq!(request.objects.len(), 1);
    }

    #[rstest]
    #[case::connect(PduType::Connect, 1)]
    #[case::data(PduType::Data, 0)]
    fn response_tree_only_for_connect(#[case] pdu_type: PduType, #[case] nodes: usize) {
        let bytes = [
            0x00, 0x02, 0x81, 0x00, 0x05,
            ElementId::START_OBJECT, 0, 0, 0, 1, 2, 0, 0, ElementId::TERM_OBJECT,
        ];
        let response = decode_with(&bytes, |r| decode_response(r, pdu_type)).expect("response");
        assert_eq!(response.object_ids, vec![128, 5]);
        assert_eq!(response.objects.len(), nodes);
        if nodes > 0 {
            assert!(matches!(response.objects[0], ObjectNode::Object(_)));
        }
    }
}
