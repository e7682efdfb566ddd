//! Object trees.
//!
//! An object tree is a run of sibling elements, each introduced by an
//! [`ElementId`] byte. `StartObject` opens a nested level that ends at the
//! matching `TermObject`; every other element is flat. An element id the
//! decoder does not know ends the current level without being consumed, so
//! the enclosing decoder can carry on from that byte.
//!
//! Decoding builds each node completely before returning it; nothing is
//! patched after the fact.

use bytes::Bytes;
use serde::Serialize;

use crate::{cursor::Reader, error::{Anomaly, DecodeError}};

mod element;
mod id_value;
mod tag_description;

pub use element::ElementId;
pub use id_value::{
    ItemError,
    KeyedValue,
    KeyedValueList,
    Looping,
    decode_error_value_list,
    decode_id_value_list,
    decode_itemnumber_value_list,
};
pub use tag_description::{
    Accessibility,
    ArrayBounds,
    AttributeFlags,
    DatatypeDetail,
    OffsetInfo,
    OffsetPair,
    Section,
    TagDescription,
    decode_tag_description,
};

/// Sibling nodes at one level of an object tree.
pub type ObjectTree = Vec<ObjectNode>;

/// Attribute id and flags attached to an object header.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ObjectAttribute {
    pub id: u32,
    pub flags: u32,
}

/// A `StartObject` element and its children.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ObjectElement {
    pub relation_id: u32,
    pub class_id: u32,
    pub class_flags: u32,
    /// Absent when the attribute id on the wire is zero.
    pub attribute: Option<ObjectAttribute>,
    pub children: ObjectTree,
    /// The object ended with `TermObject` rather than an unknown element or
    /// the end of the data.
    pub terminated: bool,
}

/// Which raw block element was seen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Ab,
    Ac,
}

/// One node of an object tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "element", rename_all = "snake_case")]
pub enum ObjectNode {
    Object(ObjectElement),
    /// Single-entry id/value list.
    Attribute {
        values: KeyedValueList,
    },
    Relation {
        relation_id: u32,
        value: u32,
    },
    TagDescription {
        description: TagDescription,
    },
    TagDescriptionEnd,
    Block {
        kind: BlockKind,
        data: Bytes,
        trailing: u16,
    },
}

enum LevelEnd {
    TermObject,
    Unrecognized,
    EndOfData,
    /// An attribute failed to decode and the reader stopped in front of it.
    Abandoned,
}

/// Decode sibling elements until `TermObject`, an unknown element id or the
/// end of the data.
///
/// # Errors
///
/// Propagates truncation, unknown datatypes inside attributes, and
/// [`DecodeError::DepthExceeded`] for objects nested past the configured
/// limit.
///
/// # Examples
///
/// ```
/// use s7commp::{config::DecoderConfig, cursor::Reader, hooks::NoopObserver, object};
///
/// // StartObject, relation 1, class 2, flags 0, no attribute, TermObject.
/// let bytes = [0xa1, 0, 0, 0, 1, 2, 0, 0, 0xa2];
/// let mut observer = NoopObserver;
/// let mut reader = Reader::new(&bytes, 0, DecoderConfig::default(), &mut observer);
/// let tree = object::decode_object_tree(&mut reader).unwrap();
/// assert_eq!(tree.len(), 1);
/// ```
pub fn decode_object_tree(reader: &mut Reader<'_, '_>) -> Result<ObjectTree, DecodeError> {
    decode_level(reader).map(|(nodes, _)| nodes)
}

fn decode_level(reader: &mut Reader<'_, '_>) -> Result<(ObjectTree, LevelEnd), DecodeError> {
    let mut nodes = Vec::new();
    // Every element consumes at least its id byte.
    for _ in 0..=reader.remaining() {
        let start = reader.position();
        let Some(code) = reader.peek_u8() else {
            return Ok((nodes, LevelEnd::EndOfData));
        };
        let node = match ElementId::from_code(code) {
            ElementId::Unrecognized(_) => return Ok((nodes, LevelEnd::Unrecognized)),
            ElementId::TermObject => {
                reader.skip(1)?;
                reader.label(start, &"Terminating Object");
                return Ok((nodes, LevelEnd::TermObject));
            }
            ElementId::StartObject => {
                reader.skip(1)?;
                ObjectNode::Object(decode_object(reader, start)?)
            }
            ElementId::Attribute => {
                reader.skip(1)?;
                let values = decode_id_value_list(reader, Looping::Single)?;
                reader.label(start, &"Attribute");
                ObjectNode::Attribute { values }
            }
            ElementId::Relation => {
                reader.skip(1)?;
                let relation_id = reader.varuint32()?;
                let value = reader.u32()?;
                reader.label(start, &format_args!("Relation: Relation Id {relation_id}"));
                ObjectNode::Relation { relation_id, value }
            }
            ElementId::StartTagDescription => {
                reader.skip(1)?;
                let description = decode_tag_description(reader)?;
                reader.label(
                    start,
                    &format_args!("Tag description, for Tag: {}", description.name),
                );
                ObjectNode::TagDescription { description }
            }
            ElementId::TermTagDescription => {
                reader.skip(1)?;
                reader.label(start, &"Terminating Tag description");
                ObjectNode::TagDescriptionEnd
            }
            ElementId::Block0xAB | ElementId::Block0xAC => {
                reader.skip(1)?;
                let kind = if code == ElementId::BLOCK_AB {
                    BlockKind::Ab
                } else {
                    BlockKind::Ac
                };
                let len = reader.u16()?;
                let data = Bytes::copy_from_slice(reader.bytes(usize::from(len))?);
                let trailing = reader.u16()?;
                reader.label(start, &format_args!("Block0x{code:02X}: {len} byte(s)"));
                ObjectNode::Block {
                    kind,
                    data,
                    trailing,
                }
            }
        };
        nodes.push(node);
        if reader.is_abandoned() {
            return Ok((nodes, LevelEnd::Abandoned));
        }
    }
    Ok((nodes, LevelEnd::EndOfData))
}

fn decode_object(reader: &mut Reader<'_, '_>, start: usize) -> Result<ObjectElement, DecodeError> {
    let relation_id = reader.u32()?;
    let class_id = reader.varuint32()?;
    let class_flags = reader.varuint32()?;
    let attribute = match reader.varuint32()? {
        0 => None,
        id => Some(ObjectAttribute {
            id,
            flags: reader.varuint32()?,
        }),
    };
    reader.label(
        start,
        &format_args!("Object: Relation Id {relation_id}, Class Id {class_id}"),
    );

    let (children, end) = reader.nested(decode_level)?;
    let terminated = matches!(end, LevelEnd::TermObject);
    if !terminated && !matches!(end, LevelEnd::Abandoned) {
        reader.record(Anomaly::UnterminatedObject {
            offset: reader.position(),
            relation_id,
        });
    }
    Ok(ObjectElement {
        relation_id,
        class_id,
        class_flags,
        attribute,
        children,
        terminated,
    })
}
