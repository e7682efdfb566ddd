//! Fixed-width big-endian conversions used by the telegram decoder.
//!
//! Every fixed-size field on the S7comm-plus wire (header lengths, object
//! ids, relation ids, `REAL`/`LREAL` payloads) is big-endian. Keeping the
//! conversions here scopes the Clippy expectation to one place.

/// Serialise a `u16` in network byte order.
///
/// Used when a reassembled telegram gets a fresh header.
///
/// # Examples
///
/// ```
/// use s7commp::byte_order::write_network_u16;
///
/// assert_eq!(write_network_u16(0x054c), [0x05, 0x4c]);
/// ```
#[must_use]
pub fn write_network_u16(value: u16) -> [u8; 2] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "S7comm-plus header fields are big-endian on the wire."
    )]
    value.to_be_bytes()
}

/// Serialise a `u32` in network byte order.
///
/// # Examples
///
/// ```
/// use s7commp::byte_order::write_network_u32;
///
/// assert_eq!(write_network_u32(0x7000_0001), [0x70, 0x00, 0x00, 0x01]);
/// ```
#[must_use]
pub fn write_network_u32(value: u32) -> [u8; 4] {
    #[expect(
        clippy::big_endian_bytes,
        reason = "S7comm-plus object ids are big-endian on the wire."
    )]
    value.to_be_bytes()
}

/// Parse a big-endian `u16`.
///
/// # Examples
///
/// ```
/// use s7commp::byte_order::read_network_u16;
///
/// assert_eq!(read_network_u16([0x04, 0xe8]), 0x04e8);
/// ```
#[must_use]
pub fn read_network_u16(bytes: [u8; 2]) -> u16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "S7comm-plus fixed-width fields are big-endian on the wire."
    )]
    u16::from_be_bytes(bytes)
}

/// Parse a big-endian `i16` (the `INT` datatype).
#[must_use]
pub fn read_network_i16(bytes: [u8; 2]) -> i16 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "S7comm-plus fixed-width fields are big-endian on the wire."
    )]
    i16::from_be_bytes(bytes)
}

/// Parse a big-endian `u32`.
///
/// # Examples
///
/// ```
/// use s7commp::byte_order::read_network_u32;
///
/// assert_eq!(read_network_u32([0x70, 0x00, 0x00, 0x01]), 0x7000_0001);
/// ```
#[must_use]
pub fn read_network_u32(bytes: [u8; 4]) -> u32 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "S7comm-plus fixed-width fields are big-endian on the wire."
    )]
    u32::from_be_bytes(bytes)
}

/// Parse a big-endian `u64` (`LWORD` and `TIMESTAMP` payloads).
#[must_use]
pub fn read_network_u64(bytes: [u8; 8]) -> u64 {
    #[expect(
        clippy::big_endian_bytes,
        reason = "S7comm-plus fixed-width fields are big-endian on the wire."
    )]
    u64::from_be_bytes(bytes)
}

/// Parse a big-endian IEEE 754 single (`REAL`).
#[must_use]
pub fn read_network_f32(bytes: [u8; 4]) -> f32 { f32::from_bits(read_network_u32(bytes)) }

/// Parse a big-endian IEEE 754 double (`LREAL`).
#[must_use]
pub fn read_network_f64(bytes: [u8; 8]) -> f64 { f64::from_bits(read_network_u64(bytes)) }
