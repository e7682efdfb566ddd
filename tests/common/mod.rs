//! Shared telegram builders for integration tests.

// Items in this shared module may not be used by all test binaries that import it.
#![allow(
    dead_code,
    reason = "shared test utilities are not used by all test binaries"
)]

/// Header bytes for a data telegram.
pub fn header(pdu: u8, length: u16) -> [u8; 4] {
    let [hi, lo] = length.to_be_bytes();
    [0x72, pdu, hi, lo]
}

/// Wrap a data region in a header and a matching trailer.
pub fn framed(pdu: u8, data: &[u8]) -> Vec<u8> {
    let length = u16::try_from(data.len()).expect("data fits u16");
    let mut bytes = header(pdu, length).to_vec();
    bytes.extend_from_slice(data);
    bytes.extend_from_slice(&header(pdu, length));
    bytes
}

/// Segment that does not close its telegram: the header claims more data
/// than the segment carries.
pub fn open_fragment(pdu: u8, payload: &[u8]) -> Vec<u8> {
    let mut bytes = header(pdu, u16::MAX).to_vec();
    bytes.extend_from_slice(payload);
    bytes
}

/// Integrity block without an id: length byte plus 32 digest bytes.
pub fn digest_block(fill: u8) -> Vec<u8> {
    let mut block = vec![0x20];
    block.extend(std::iter::repeat_n(fill, 32));
    block
}

/// Response envelope for `function` with sequence number `seq`.
pub fn response_envelope(function: u16, seq: u16) -> Vec<u8> {
    let [f_hi, f_lo] = function.to_be_bytes();
    let [s_hi, s_lo] = seq.to_be_bytes();
    vec![0x32, 0x00, 0x00, f_hi, f_lo, 0x00, 0x00, s_hi, s_lo, 0x00]
}

/// Request envelope for `function` with sequence number `seq` and
/// session id `session`.
pub fn request_envelope(function: u16, seq: u16, session: u32) -> Vec<u8> {
    let [f_hi, f_lo] = function.to_be_bytes();
    let [s_hi, s_lo] = seq.to_be_bytes();
    let mut bytes = vec![0x31, 0x00, 0x00, f_hi, f_lo, 0x00, 0x00, s_hi, s_lo];
    bytes.extend_from_slice(&session.to_be_bytes());
    bytes.push(0x36);
    bytes
}

/// GetMultiVariables response body reading a UInt and a WString.
pub fn get_multi_variables_values() -> Vec<u8> {
    vec![
        0x00, // return value
        0x01, 0x00, 0x03, 0x12, 0x34, // item 1: UInt 0x1234
        0x02, 0x00, 0x15, 0x02, b'h', b'i', // item 2: WString "hi"
        0x00, // end of values
        0x00, // end of errors
    ]
}
