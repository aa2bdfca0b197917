//! Diffie-Hellman key exchange and the exchange hash.
//!
//! The key exchange establishes a shared secret between the peers and binds it to the handshake
//! transcript through the exchange hash `H`, which the server signs with its host key
//! (RFC 4253, section 8). This module sequences the Diffie-Hellman computation over the
//! "group14" MODP group and computes `H`; the signature itself is made and checked by
//! [`pubkey`][crate::pubkey].
use num_bigint_dig::BigUint;
use crate::codec::PacketEncode;
pub use self::dh::{
    group14, generate_keypair, shared_secret, DhGroup, DhKeypair,
    encode_kexdh_init, decode_kexdh_init, encode_kexdh_reply, decode_kexdh_reply, KexdhReply,
};

mod dh;

/// The handshake transcript values that the exchange hash is computed over.
///
/// The version strings must be the exact lines exchanged on the wire without the CR/LF, and the
/// KEXINIT fields must be the raw packet payloads as exchanged; any deviation produces a hash the
/// peer will reject as an invalid signature.
#[derive(Debug)]
pub struct ExchangeHashInput<'a> {
    /// The client's version string (`V_C`).
    pub client_version: &'a str,
    /// The server's version string (`V_S`).
    pub server_version: &'a str,
    /// The client's `SSH_MSG_KEXINIT` payload (`I_C`).
    pub client_kex_init: &'a [u8],
    /// The server's `SSH_MSG_KEXINIT` payload (`I_S`).
    pub server_kex_init: &'a [u8],
    /// The server's host public key in its wire encoding (`K_S`).
    pub server_host_key: &'a [u8],
    /// The client's ephemeral Diffie-Hellman public value (`e`).
    pub client_dh_public: &'a BigUint,
    /// The server's ephemeral Diffie-Hellman public value (`f`).
    pub server_dh_public: &'a BigUint,
    /// The shared secret (`K`).
    pub shared_secret: &'a BigUint,
}

/// Compute the exchange hash `H` (RFC 4253, section 8).
///
/// `H = SHA1(string V_C || string V_S || string I_C || string I_S || string K_S || mpint e ||
/// mpint f || mpint K)`. Pure and deterministic: the same input always produces the same digest.
pub fn compute_exchange_hash(input: &ExchangeHashInput) -> Vec<u8> {
    let mut data = PacketEncode::new();
    data.put_str(input.client_version);
    data.put_str(input.server_version);
    data.put_bytes(input.client_kex_init);
    data.put_bytes(input.server_kex_init);
    data.put_bytes(input.server_host_key);
    data.put_mpint(input.client_dh_public);
    data.put_mpint(input.server_dh_public);
    data.put_mpint(input.shared_secret);

    use sha1::Digest as _;
    sha1::Sha1::digest(&data.finish()).to_vec()
}
