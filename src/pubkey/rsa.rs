use bytes::Bytes;
use rsa::Pkcs1v15Sign;
use rsa::traits::PublicKeyParts as _;
use sha1::Digest as _;
use std::fmt;
use crate::codec::{PacketDecode, PacketEncode};
use crate::error::{Error, Result};

const FORMAT: &str = "ssh-rsa";

/// RSA public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPubkey {
    pubkey: rsa::RsaPublicKey,
}

impl RsaPubkey {
    pub(crate) fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        // RFC 4253, section 6.6: the signature is a blob of the format name and the raw
        // signature bytes
        let mut signature = PacketDecode::new(Bytes::copy_from_slice(signature));
        let format = match signature.get_string() {
            Ok(format) => format,
            Err(_) => return false,
        };
        if format != FORMAT {
            return false
        }
        let signature_data = match signature.get_bytes() {
            Ok(data) => data,
            Err(_) => return false,
        };

        let hashed = sha1::Sha1::digest(message);
        self.pubkey
            .verify(Pkcs1v15Sign::new::<sha1::Sha1>(), hashed.as_slice(), &signature_data)
            .is_ok()
    }
}

impl fmt::Display for RsaPubkey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "rsa n {:x}, e {}", self.pubkey.n(), self.pubkey.e())
    }
}

/// RSA private key (keypair).
#[derive(Clone, PartialEq, Eq)]
pub struct RsaPrivkey {
    privkey: rsa::RsaPrivateKey,
}

impl RsaPrivkey {
    /// Generate a fresh RSA keypair with a modulus of `bits` bits.
    pub fn generate<R: rand::CryptoRng + rand::RngCore>(
        rng: &mut R,
        bits: usize,
    ) -> Result<RsaPrivkey> {
        let privkey = rsa::RsaPrivateKey::new(rng, bits)
            .map_err(|_| Error::Crypto("could not generate rsa key"))?;
        Ok(RsaPrivkey { privkey })
    }

    pub(crate) fn pubkey(&self) -> RsaPubkey {
        RsaPubkey { pubkey: self.privkey.to_public_key() }
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Result<Bytes> {
        let hashed = sha1::Sha1::digest(message);
        let signature_data = self.privkey
            .sign(Pkcs1v15Sign::new::<sha1::Sha1>(), hashed.as_slice())
            .map_err(|_| Error::Crypto("could not sign with rsa key"))?;

        let mut blob = PacketEncode::new();
        blob.put_str(FORMAT);
        blob.put_bytes(&signature_data);
        Ok(blob.finish())
    }
}

pub(super) fn decode_pubkey(blob: &mut PacketDecode) -> Result<RsaPubkey> {
    // RFC 4253, section 6.6: mpint e, then mpint n (the format string is already consumed)
    let e = blob.get_mpint()?;
    let n = blob.get_mpint()?;
    let pubkey = rsa::RsaPublicKey::new(n, e)
        .map_err(|_| Error::Decode("decoded ssh-rsa pubkey is invalid"))?;
    Ok(RsaPubkey { pubkey })
}

pub(super) fn encode_pubkey(blob: &mut PacketEncode, pubkey: &RsaPubkey) {
    blob.put_str(FORMAT);
    blob.put_mpint(pubkey.pubkey.e());
    blob.put_mpint(pubkey.pubkey.n());
}
