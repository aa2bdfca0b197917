//! Wire codec for the SSH transport layer.
//!
//! [`PacketEncode`] and [`PacketDecode`] handle the primitive data types from RFC 4251, section
//! 5. [`scan_version()`] and [`scan_packet()`] split a raw byte stream into the version line and
//! binary packets (RFC 4253, sections 4.2 and 6); both are pure functions over the currently
//! buffered bytes, returning `Ok(None)` until a complete unit is available.
pub use self::packet_encode::{PacketEncode, MAX_TEXT_LEN};
pub use self::packet_decode::PacketDecode;
pub use self::scan::{
    scan_version, scan_packet, frame_packet, ident_line,
    Version, Packet, MAX_SCAN_LEN, MAX_PACKET_LEN,
};

mod packet_encode;
mod packet_decode;
mod scan;
