//! Request and response decoders, one pair per function code.
//!
//! Each function has a fixed field order built from the shared pieces:
//! return values, item addresses, keyed value lists and object trees.
//! [`decode_request`] and [`decode_response`] pick the decoder for a
//! function code; unknown function codes decode to `None` and leave their
//! bytes to the caller.

use std::fmt;

use serde::Serialize;

use crate::{cursor::Reader, error::DecodeError, telegram::PduType};

pub mod create_object;
pub mod delete_object;
pub mod explore;
pub mod get_link;
pub mod invoke;
pub mod multi_variables;
pub mod notification;
pub mod sequence;
pub mod set_variable;
pub mod var_sub_streamed;

pub use create_object::{CreateObjectRequest, CreateObjectResponse};
pub use delete_object::{DeleteObjectRequest, DeleteObjectResponse};
pub use explore::{ExploreArea, ExploreClass, ExploreRequest, ExploreResponse};
pub use get_link::{GetLinkRequest, GetLinkResponse};
pub use invoke::{InvokeRequest, InvokeResponse};
pub use multi_variables::{
    GetMultiVariablesRequest,
    GetMultiVariablesResponse,
    ItemAddressing,
    SetMultiVariablesRequest,
    SetMultiVariablesResponse,
};
pub use notification::{Notification, NotificationItem, NotificationValues, decode_notification};
pub use sequence::{
    BeginSequenceRequest,
    BeginSequenceResponse,
    EndSequenceRequest,
    EndSequenceResponse,
};
pub use set_variable::{SetVariableRequest, SetVariableResponse};
pub use var_sub_streamed::{GetVarSubStreamedRequest, GetVarSubStreamedResponse};

/// Function code of a request or response.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCode {
    Explore,
    CreateObject,
    DeleteObject,
    SetVariable,
    GetLink,
    SetMultiVariables,
    GetMultiVariables,
    BeginSequence,
    EndSequence,
    Invoke,
    GetVarSubStreamed,
    Unrecognized(u16),
}

impl FunctionCode {
    /// Map a wire code onto its function.
    ///
    /// # Examples
    ///
    /// ```
    /// use s7commp::function::FunctionCode;
    ///
    /// assert_eq!(FunctionCode::from_code(0x054c), FunctionCode::GetMultiVariables);
    /// assert_eq!(FunctionCode::from_code(0x0001), FunctionCode::Unrecognized(1));
    /// ```
    #[must_use]
    pub const fn from_code(code: u16) -> Self {
        match code {
            0x04bb => Self::Explore,
            0x04ca => Self::CreateObject,
            0x04d4 => Self::DeleteObject,
            0x04f2 => Self::SetVariable,
            0x0524 => Self::GetLink,
            0x0542 => Self::SetMultiVariables,
            0x054c => Self::GetMultiVariables,
            0x0556 => Self::BeginSequence,
            0x0560 => Self::EndSequence,
            0x056b => Self::Invoke,
            0x0586 => Self::GetVarSubStreamed,
            other => Self::Unrecognized(other),
        }
    }

    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Self::Explore => 0x04bb,
            Self::CreateObject => 0x04ca,
            Self::DeleteObject => 0x04d4,
            Self::SetVariable => 0x04f2,
            Self::GetLink => 0x0524,
            Self::SetMultiVariables => 0x0542,
            Self::GetMultiVariables => 0x054c,
            Self::BeginSequence => 0x0556,
            Self::EndSequence => 0x0560,
            Self::Invoke => 0x056b,
            Self::GetVarSubStreamed => 0x0586,
            Self::Unrecognized(code) => code,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Explore => "Explore",
            Self::CreateObject => "CreateObject",
            Self::DeleteObject => "DeleteObject",
            Self::SetVariable => "SetVariable",
            Self::GetLink => "GetLink",
            Self::SetMultiVariables => "SetMultiVariables",
            Self::GetMultiVariables => "GetMultiVariables",
            Self::BeginSequence => "BeginSequence",
            Self::EndSequence => "EndSequence",
            Self::Invoke => "Invoke",
            Self::GetVarSubStreamed => "GetVarSubStreamed",
            Self::Unrecognized(_) => "?",
        }
    }

    /// Whether requests of this function may end with an object qualifier.
    #[must_use]
    pub const fn carries_object_qualifier(self) -> bool {
        matches!(
            self,
            Self::GetMultiVariables
                | Self::SetMultiVariables
                | Self::SetVariable
                | Self::DeleteObject
                | Self::GetVarSubStreamed
        )
    }

    /// Unknown bytes some requests carry after the object qualifier.
    #[must_use]
    pub const fn request_padding(self) -> usize {
        match self {
            Self::GetVarSubStreamed => 2,
            Self::SetVariable => 1,
            _ => 0,
        }
    }
}

impl fmt::Display for FunctionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrecognized(code) => write!(f, "Unknown Function 0x{code:04x}"),
            known => f.write_str(known.as_str()),
        }
    }
}

/// Decoded function payload of a telegram.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "body", rename_all = "snake_case")]
pub enum FunctionBody {
    ExploreRequest(ExploreRequest),
    ExploreResponse(ExploreResponse),
    CreateObjectRequest(CreateObjectRequest),
    CreateObjectResponse(CreateObjectResponse),
    DeleteObjectRequest(DeleteObjectRequest),
    DeleteObjectResponse(DeleteObjectResponse),
    SetVariableRequest(SetVariableRequest),
    SetVariableResponse(SetVariableResponse),
    GetLinkRequest(GetLinkRequest),
    GetLinkResponse(GetLinkResponse),
    SetMultiVariablesRequest(SetMultiVariablesRequest),
    SetMultiVariablesResponse(SetMultiVariablesResponse),
    GetMultiVariablesRequest(GetMultiVariablesRequest),
    GetMultiVariablesResponse(GetMultiVariablesResponse),
    BeginSequenceRequest(BeginSequenceRequest),
    BeginSequenceResponse(BeginSequenceResponse),
    EndSequenceRequest(EndSequenceRequest),
    EndSequenceResponse(EndSequenceResponse),
    InvokeRequest(InvokeRequest),
    InvokeResponse(InvokeResponse),
    GetVarSubStreamedRequest(GetVarSubStreamedRequest),
    GetVarSubStreamedResponse(GetVarSubStreamedResponse),
    Notification(Notification),
}

impl FunctionBody {
    /// Whether a trailing integrity block starts with an integrity id.
    #[must_use]
    pub const fn has_integrity_id(&self) -> bool {
        match self {
            Self::DeleteObjectResponse(response) => !response.suppresses_integrity_id(),
            _ => true,
        }
    }
}

/// Decode the payload of a request.
///
/// Returns `Ok(None)` for function codes without a decoder.
///
/// # Errors
///
/// Propagates the [`DecodeError`] of the function decoder.
pub fn decode_request(
    reader: &mut Reader<'_, '_>,
    function: FunctionCode,
    pdu_type: PduType,
) -> Result<Option<FunctionBody>, DecodeError> {
    Ok(Some(match function {
        FunctionCode::Explore => FunctionBody::ExploreRequest(explore::decode_request(reader)?),
        FunctionCode::CreateObject => {
            FunctionBody::CreateObjectRequest(create_object::decode_request(reader, pdu_type)?)
        }
        FunctionCode::DeleteObject => {
            FunctionBody::DeleteObjectRequest(delete_object::decode_request(reader)?)
        }
        FunctionCode::SetVariable => {
            FunctionBody::SetVariableRequest(set_variable::decode_request(reader)?)
        }
        FunctionCode::GetLink => FunctionBody::GetLinkRequest(get_link::decode_request(reader)?),
        FunctionCode::SetMultiVariables => {
            FunctionBody::SetMultiVariablesRequest(multi_variables::decode_set_request(reader)?)
        }
        FunctionCode::GetMultiVariables => {
            FunctionBody::GetMultiVariablesRequest(multi_variables::decode_get_request(reader)?)
        }
        FunctionCode::BeginSequence => {
            FunctionBody::BeginSequenceRequest(sequence::decode_begin_request(reader)?)
        }
        FunctionCode::EndSequence => {
            FunctionBody::EndSequenceRequest(sequence::decode_end_request(reader)?)
        }
        FunctionCode::Invoke => FunctionBody::InvokeRequest(invoke::decode_request(reader)?),
        FunctionCode::GetVarSubStreamed => {
            FunctionBody::GetVarSubStreamedRequest(var_sub_streamed::decode_request(reader)?)
        }
        FunctionCode::Unrecognized(_) => return Ok(None),
    }))
}

/// Decode the payload of a response.
///
/// Returns `Ok(None)` for function codes without a decoder.
///
/// # Errors
///
/// Propagates the [`DecodeError`] of the function decoder.
pub fn decode_response(
    reader: &mut Reader<'_, '_>,
    function: FunctionCode,
    pdu_type: PduType,
) -> Result<Option<FunctionBody>, DecodeError> {
    Ok(Some(match function {
        FunctionCode::Explore => FunctionBody::ExploreResponse(explore::decode_response(reader)?),
        FunctionCode::CreateObject => {
            FunctionBody::CreateObjectResponse(create_object::decode_response(reader, pdu_type)?)
        }
        FunctionCode::DeleteObject => {
            FunctionBody::DeleteObjectResponse(delete_object::decode_response(reader)?)
        }
        FunctionCode::SetVariable => {
            FunctionBody::SetVariableResponse(set_variable::decode_response(reader)?)
        }
        FunctionCode::GetLink => FunctionBody::GetLinkResponse(get_link::decode_response(reader)?),
        FunctionCode::SetMultiVariables => {
            FunctionBody::SetMultiVariablesResponse(multi_variables::decode_set_response(reader)?)
        }
        FunctionCode::GetMultiVariables => {
            FunctionBody::GetMultiVariablesResponse(multi_variables::decode_get_response(reader)?)
        }
        FunctionCode::BeginSequence => {
            FunctionBody::BeginSequenceResponse(sequence::decode_begin_response(reader)?)
        }
        FunctionCode::EndSequence => {
            FunctionBody::EndSequenceResponse(sequence::decode_end_response(reader)?)
        }
        FunctionCode::Invoke => FunctionBody::InvokeResponse(invoke::decode_response(reader)?),
        FunctionCode::GetVarSubStreamed => {
            FunctionBody::GetVarSubStreamedResponse(var_sub_streamed::decode_response(reader)?)
        }
        FunctionCode::Unrecognized(_) => return Ok(None),
    }))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::test_helpers::decode_with;

    #[rstest]
    #[case::explore(0x04bb)]
    #[case::create_object(0x04ca)]
    #[case::delete_object(0x04d4)]
    #[case::set_variable(0x04f2)]
    #[case::get_link(0x0524)]
    #[case::set_multi(0x0542)]
    #[case::get_multi(0x054c)]
    #[case::begin_sequence(0x0556)]
    #[case::end_sequence(0x0560)]
    #[case::invoke(0x056b)]
    #[case::var_sub_streamed(0x0586)]
    #[case::unknown(0x1234)]
    fn codes_map_both_ways(#[case] code: u16) {
        assert_eq!(FunctionCode::from_code(code).code(), code);
    }

    #[test]
    fn unknown_function_leaves_bytes_alone() {
        let decoded = decode_with(&[0x01, 0x02], |r| {
            decode_request(r, FunctionCode::Unrecognized(0x1234), PduType::Data)
        });
        assert_eq!(decoded.position, 0);
        assert!(decoded.expect("dispatch").is_none());
    }

    #[test]
    fn dispatch_picks_the_response_decoder() {
        let decoded = decode_with(&[0x00, 0x00, 0x00], |r| {
            decode_response(r, FunctionCode::GetMultiVariables, PduType::Data)
        });
        assert_eq!(decoded.position, 3);
        assert!(matches!(
            decoded.expect("dispatch"),
            Some(FunctionBody::GetMultiVariablesResponse(_))
        ));
    }

    #[rstest]
    #[case::get_multi(FunctionCode::GetMultiVariables, true, 0)]
    #[case::set_variable(FunctionCode::SetVariable, true, 1)]
    #[case::var_sub_streamed(FunctionCode::GetVarSubStreamed, true, 2)]
    #[case::explore(FunctionCode::Explore, false, 0)]
    fn qualifier_and_padding_per_function(
        #[case] function: FunctionCode,
        #[case] qualifier: bool,
        #[case] padding: usize,
    ) {
        assert_eq!(function.carries_object_qualifier(), qualifier);
        assert_eq!(function.request_padding(), padding);
    }
}
