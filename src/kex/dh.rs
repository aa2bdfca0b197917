use bytes::Bytes;
use hex_literal::hex;
use num_bigint_dig::{BigUint, RandBigInt as _};
use rand::RngCore;
use crate::codec::{PacketDecode, PacketEncode};
use crate::codes::msg;
use crate::error::{Error, Result};

/// A Diffie-Hellman MODP group.
#[derive(Debug, Clone)]
pub struct DhGroup {
    g: BigUint,
    p: BigUint,
    p_minus_1: BigUint,
}

/// An ephemeral Diffie-Hellman keypair.
///
/// The private value never leaves this struct; only the public value is exchanged on the wire.
pub struct DhKeypair {
    /// The public value (`g^x mod p`).
    pub public: BigUint,
    private: BigUint,
}

impl std::fmt::Debug for DhKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("DhKeypair").field("public", &self.public).finish_non_exhaustive()
    }
}

/// The 2048-bit MODP group "group14" from RFC 3526, section 3.
pub fn group14() -> DhGroup {
    let g = BigUint::from(2u32);
    let p = BigUint::from_bytes_be(&hex!(
        "FFFFFFFF" "FFFFFFFF" "C90FDAA2" "2168C234" "C4C6628B" "80DC1CD1"
        "29024E08" "8A67CC74" "020BBEA6" "3B139B22" "514A0879" "8E3404DD"
        "EF9519B3" "CD3A431B" "302B0A6D" "F25F1437" "4FE1356D" "6D51C245"
        "E485B576" "625E7EC6" "F44C42E9" "A637ED6B" "0BFF5CB6" "F406B7ED"
        "EE386BFB" "5A899FA5" "AE9F2411" "7C4B1FE6" "49286651" "ECE45B3D"
        "C2007CB8" "A163BF05" "98DA4836" "1C55D39A" "69163FA8" "FD24CF5F"
        "83655D23" "DCA3AD96" "1C62F356" "208552BB" "9ED52907" "7096966D"
        "670C354E" "4ABC9804" "F1746C08" "CA18217C" "32905E46" "2E36CE3B"
        "E39E772C" "180E8603" "9B2783A2" "EC07A28F" "B5C55DF0" "6F4C52C9"
        "DE2BCBF6" "95581718" "3995497C" "EA956AE5" "15D22618" "98FA0510"
        "15728E5A" "8AACAA68" "FFFFFFFF" "FFFFFFFF"
    ));
    let p_minus_1 = &p - BigUint::from(1u32);
    DhGroup { g, p, p_minus_1 }
}

/// Generate an ephemeral keypair: a random private `x` in `[1, p-1)` and `public = g^x mod p`.
pub fn generate_keypair(group: &DhGroup, rng: &mut dyn RngCore) -> DhKeypair {
    let private = rng.gen_biguint_range(&BigUint::from(1u32), &group.p_minus_1);
    let public = group.g.modpow(&private, &group.p);
    DhKeypair { public, private }
}

/// Compute the shared secret from our private value and the peer's public value.
///
/// The peer's value must lie in `(1, p-1)` (RFC 8268, section 4); anything outside that range
/// fails with [`Error::SharedSecret`].
pub fn shared_secret(
    group: &DhGroup,
    keypair: &DhKeypair,
    peer_public: &BigUint,
) -> Result<BigUint> {
    if *peer_public <= BigUint::from(1u32) || *peer_public >= group.p_minus_1 {
        return Err(Error::SharedSecret("peer public value out of range"))
    }
    Ok(peer_public.modpow(&keypair.private, &group.p))
}

/// The decoded payload of a `SSH_MSG_KEXDH_REPLY` message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KexdhReply {
    /// The server's host public key in its wire encoding (`K_S`).
    pub server_host_key: Bytes,
    /// The server's ephemeral public value (`f`).
    pub server_dh_public: BigUint,
    /// The signature of the exchange hash with the server's host key.
    pub exchange_hash_sign: Bytes,
}

/// Encode a `SSH_MSG_KEXDH_INIT` payload (RFC 4253, section 8).
pub fn encode_kexdh_init(client_dh_public: &BigUint) -> Bytes {
    let mut payload = PacketEncode::new();
    payload.put_u8(msg::KEXDH_INIT);
    payload.put_mpint(client_dh_public);
    payload.finish()
}

/// Decode a `SSH_MSG_KEXDH_INIT` payload.
pub fn decode_kexdh_init(payload: Bytes) -> Result<BigUint> {
    let mut payload = PacketDecode::new(payload);
    if payload.get_u8()? != msg::KEXDH_INIT {
        return Err(Error::Protocol("expected SSH_MSG_KEXDH_INIT"))
    }
    payload.get_mpint()
}

/// Encode a `SSH_MSG_KEXDH_REPLY` payload (RFC 4253, section 8).
pub fn encode_kexdh_reply(reply: &KexdhReply) -> Bytes {
    let mut payload = PacketEncode::new();
    payload.put_u8(msg::KEXDH_REPLY);
    payload.put_bytes(&reply.server_host_key);
    payload.put_mpint(&reply.server_dh_public);
    payload.put_bytes(&reply.exchange_hash_sign);
    payload.finish()
}

/// Decode a `SSH_MSG_KEXDH_REPLY` payload.
pub fn decode_kexdh_reply(payload: Bytes) -> Result<KexdhReply> {
    let mut payload = PacketDecode::new(payload);
    if payload.get_u8()? != msg::KEXDH_REPLY {
        return Err(Error::Protocol("expected SSH_MSG_KEXDH_REPLY"))
    }
    let server_host_key = payload.get_bytes()?;
    let server_dh_public = payload.get_mpint()?;
    let exchange_hash_sign = payload.get_bytes()?;
    Ok(KexdhReply { server_host_key, server_dh_public, exchange_hash_sign })
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use super::*;

    fn make_rng() -> rand_chacha::ChaCha8Rng {
        rand_chacha::ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_shared_secret_agreement() {
        let mut rng = make_rng();
        let group = group14();
        let client = generate_keypair(&group, &mut rng);
        let server = generate_keypair(&group, &mut rng);
        assert_ne!(client.public, server.public);

        let client_secret = shared_secret(&group, &client, &server.public).unwrap();
        let server_secret = shared_secret(&group, &server, &client.public).unwrap();
        assert_eq!(client_secret, server_secret);
    }

    #[test]
    fn test_shared_secret_rejects_out_of_range() {
        let mut rng = make_rng();
        let group = group14();
        let keypair = generate_keypair(&group, &mut rng);

        for peer in [
            BigUint::from(0u32),
            BigUint::from(1u32),
            group.p_minus_1.clone(),
            group.p.clone(),
        ] {
            assert!(matches!(
                shared_secret(&group, &keypair, &peer),
                Err(Error::SharedSecret(_))));
        }
    }

    #[test]
    fn test_kexdh_init_round_trip() {
        let e = BigUint::from(0xdeadbeefu32);
        let payload = encode_kexdh_init(&e);
        assert_eq!(payload[0], msg::KEXDH_INIT);
        assert_eq!(decode_kexdh_init(payload).unwrap(), e);
    }

    #[test]
    fn test_kexdh_reply_round_trip() {
        let reply = KexdhReply {
            server_host_key: Bytes::from_static(b"host key blob"),
            server_dh_public: BigUint::from(0xf00du32),
            exchange_hash_sign: Bytes::from_static(b"signature blob"),
        };
        let payload = encode_kexdh_reply(&reply);
        assert_eq!(payload[0], msg::KEXDH_REPLY);
        assert_eq!(decode_kexdh_reply(payload).unwrap(), reply);
    }
}
