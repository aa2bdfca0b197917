//! SSH transport framing and key exchange in pure Rust.
//!
//! This crate implements the byte-level core of the SSH protocol (RFC 4251/4253): scanning the
//! version exchange, framing binary packets, decoding and encoding the transport message set,
//! negotiating algorithms between two peers, and computing the Diffie-Hellman shared secret and
//! the signed exchange hash.
//!
//! Everything here is pure and synchronous: the scanners take the currently buffered bytes and
//! return `Ok(None)` when they need more, so the crate plugs into any transport that can append
//! received bytes to a buffer. Cipher and MAC application to the packet stream is out of scope
//! and belongs to a layer above.
#![warn(missing_docs)]

pub use crate::codec::{
    PacketEncode, PacketDecode,
    scan_version, scan_packet, frame_packet, ident_line,
    Version, Packet, MAX_SCAN_LEN, MAX_PACKET_LEN, MAX_TEXT_LEN,
};
pub use crate::error::{Result, Error, AlgoNegotiateError, DisconnectError};
pub use crate::msg::{Message, scan_message};
pub use crate::negotiate::{negotiate, KexProposal, NegotiatedAlgorithms};
pub use crate::pubkey::{Pubkey, Privkey};

pub use bytes;
pub use num_bigint_dig;
pub use rsa;

pub mod codec;
pub mod codes;
mod error;
pub mod kex;
mod msg;
pub mod negotiate;
pub mod pubkey;
