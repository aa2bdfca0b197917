//! Host key algorithms.
//!
//! During the key exchange the server authenticates itself by signing the exchange hash with its
//! host key. This module decodes and encodes host keys in their SSH wire format and implements
//! the sign/verify pair over them.
//!
//! # Supported algorithms
//!
//! - "ssh-rsa" ([`RsaPubkey`] and [`RsaPrivkey`], PKCS#1 v1.5 with SHA-1)
//!
//! Keys in formats this crate cannot parse decode to [`Pubkey::Unknown`], which participates in
//! negotiation but fails every verification.
use bytes::Bytes;
use std::fmt;
use crate::codec::{PacketDecode, PacketEncode};
use crate::error::Result;
pub use self::rsa::{RsaPubkey, RsaPrivkey};

mod rsa;

/// Public host key in one of the supported formats.
///
/// This enum is marked as `#[non_exhaustive]`, so we might add new variants without breaking
/// backwards compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Pubkey {
    /// RSA public key.
    Rsa(RsaPubkey),
    /// A key in a format this crate cannot parse. Verification always fails.
    Unknown {
        /// The key format name from the wire blob.
        format: String,
        /// The raw wire blob, kept so the key can be re-encoded.
        blob: Bytes,
    },
}

impl Pubkey {
    /// Decode a public key from the SSH wire encoding (RFC 4253, section 6.6).
    ///
    /// An unrecognized format is not an error: the key decodes to [`Pubkey::Unknown`].
    pub fn decode(blob: Bytes) -> Result<Pubkey> {
        let mut decode = PacketDecode::new(blob.clone());
        let format = decode.get_string()?;
        match format.as_str() {
            "ssh-rsa" => rsa::decode_pubkey(&mut decode).map(Pubkey::Rsa),
            _ => {
                log::debug!("unknown pubkey format {:?}", format);
                Ok(Pubkey::Unknown { format, blob })
            },
        }
    }

    /// Encode the public key into the SSH wire encoding.
    ///
    /// This is the `K_S` blob that enters the exchange hash.
    pub fn encode(&self) -> Bytes {
        match self {
            Pubkey::Rsa(pubkey) => {
                let mut blob = PacketEncode::new();
                rsa::encode_pubkey(&mut blob, pubkey);
                blob.finish()
            },
            Pubkey::Unknown { blob, .. } => blob.clone(),
        }
    }

    /// Verify a signature over `message`.
    ///
    /// Returns `false` for an [`Unknown`][Pubkey::Unknown] key and on any cryptographic or
    /// decoding mismatch; it never fails with an error.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        match self {
            Pubkey::Rsa(pubkey) => pubkey.verify(message, signature),
            Pubkey::Unknown { .. } => false,
        }
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Pubkey::Rsa(pubkey) => fmt::Display::fmt(pubkey, f),
            Pubkey::Unknown { format, .. } => write!(f, "unknown key format {:?}", format),
        }
    }
}

/// Private host key (keypair) in one of the supported formats.
///
/// This enum is marked as `#[non_exhaustive]`, so we might add new variants without breaking
/// backwards compatibility.
#[derive(Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Privkey {
    /// RSA private key.
    Rsa(RsaPrivkey),
}

impl Privkey {
    /// Return the public key associated with this private key.
    ///
    /// This is a pure, deterministic projection of the private key.
    pub fn pubkey(&self) -> Pubkey {
        match self {
            Privkey::Rsa(privkey) => Pubkey::Rsa(privkey.pubkey()),
        }
    }

    /// Sign `message` with this key, producing the SSH signature blob.
    pub fn sign(&self, message: &[u8]) -> Result<Bytes> {
        match self {
            Privkey::Rsa(privkey) => privkey.sign(message),
        }
    }
}
