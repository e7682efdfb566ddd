//! Element ids that introduce each node of an object tree.

use serde::Serialize;

/// Element id byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementId {
    StartObject,
    TermObject,
    Attribute,
    Relation,
    StartTagDescription,
    TermTagDescription,
    Block0xAB,
    Block0xAC,
    Unrecognized(u8),
}

impl ElementId {
    pub const START_OBJECT: u8 = 0xa1;
    pub const TERM_OBJECT: u8 = 0xa2;
    pub const ATTRIBUTE: u8 = 0xa3;
    pub const RELATION: u8 = 0xa4;
    pub const START_TAG_DESCRIPTION: u8 = 0xa7;
    pub const TERM_TAG_DESCRIPTION: u8 = 0xa8;
    pub const BLOCK_AB: u8 = 0xab;
    pub const BLOCK_AC: u8 = 0xac;

    #[must_use]
    pub const fn from_code(code: u8) -> Self {
        match code {
            Self::START_OBJECT => Self::StartObject,
            Self::TERM_OBJECT => Self::TermObject,
            Self::ATTRIBUTE => Self::Attribute,
            Self::RELATION => Self::Relation,
            Self::START_TAG_DESCRIPTION => Self::StartTagDescription,
            Self::TERM_TAG_DESCRIPTION => Self::TermTagDescription,
            Self::BLOCK_AB => Self::Block0xAB,
            Self::BLOCK_AC => Self::Block0xAC,
            other => Self::Unrecognized(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::StartObject => Self::START_OBJECT,
            Self::TermObject => Self::TERM_OBJECT,
            Self::Attribute => Self::ATTRIBUTE,
            Self::Relation => Self::RELATION,
            Self::StartTagDescription => Self::START_TAG_DESCRIPTION,
            Self::TermTagDescription => Self::TERM_TAG_DESCRIPTION,
            Self::Block0xAB => Self::BLOCK_AB,
            Self::Block0xAC => Self::BLOCK_AC,
            Self::Unrecognized(code) => code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for code in 0..=u8::MAX {
            assert_eq!(ElementId::from_code(code).code(), code);
        }
        assert_eq!(ElementId::from_code(0xa5), ElementId::Unrecognized(0xa5));
    }
}
