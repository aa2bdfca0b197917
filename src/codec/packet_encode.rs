use bytes::{BufMut as _, Bytes, BytesMut};
use num_bigint_dig::BigUint;
use crate::{Error, Result};

/// Maximum length of a human-readable `string` field accepted by [`PacketEncode::put_text`].
///
/// Conservative pre-negotiation limit; binary `string` fields (KEXINIT payloads, host key blobs)
/// are not subject to it.
pub const MAX_TEXT_LEN: usize = 255;

/// Encoding of SSH packet payloads (low level API).
///
/// The format is described in RFC 4251, section 5. This struct just wraps a [`BytesMut`] instance.
#[derive(Debug, Clone)]
pub struct PacketEncode {
    buf: BytesMut,
}

impl PacketEncode {
    /// Creates an empty [`PacketEncode`].
    pub fn new() -> PacketEncode {
        PacketEncode { buf: BytesMut::new() }
    }

    /// Encode a `byte`.
    pub fn put_u8(&mut self, value: u8) {
        self.buf.put_u8(value);
    }

    /// Encode a `boolean` as exactly 0 or 1.
    pub fn put_bool(&mut self, value: bool) {
        self.buf.put_u8(value as u8);
    }

    /// Encode a `uint32`.
    pub fn put_u32(&mut self, value: u32) {
        self.buf.put_u32(value);
    }

    /// Encode a `string`.
    pub fn put_bytes(&mut self, value: &[u8]) {
        self.buf.reserve(4 + value.len());
        self.buf.put_u32(value.len().try_into().expect("string too long"));
        self.buf.put_slice(value);
    }

    /// Encode a `string` in UTF-8.
    pub fn put_str(&mut self, value: &str) {
        self.put_bytes(value.as_bytes())
    }

    /// Encode a human-readable `string` in UTF-8, limited to [`MAX_TEXT_LEN`] bytes.
    pub fn put_text(&mut self, value: &str) -> Result<()> {
        if value.len() > MAX_TEXT_LEN {
            return Err(Error::TooLong)
        }
        self.put_bytes(value.as_bytes());
        Ok(())
    }

    /// Encode a `name-list`.
    ///
    /// The empty list encodes to an empty `string`.
    pub fn put_name_list<S: AsRef<str>>(&mut self, names: &[S]) {
        if names.is_empty() {
            self.buf.put_u32(0);
            return;
        }

        let names_len = names.iter().map(|name| name.as_ref().len()).sum::<usize>()
            + names.len() - 1;
        self.buf.reserve(4 + names_len);
        self.buf.put_u32(names_len.try_into().expect("name list too long"));

        for (i, name) in names.iter().enumerate() {
            if i != 0 {
                self.buf.put_u8(b',');
            }
            self.buf.put_slice(name.as_ref().as_bytes());
        }
    }

    /// Encode a `mpint` from a non-negative [`BigUint`].
    ///
    /// Leading zeros are stripped and a single zero byte is prepended when the most significant
    /// bit of the first byte is set, per RFC 4251, section 5.
    pub fn put_mpint(&mut self, value: &BigUint) {
        let bytes_vec = value.to_bytes_be();
        let mut bytes = bytes_vec.as_slice();

        while !bytes.is_empty() && bytes[0] == 0 {
            bytes = &bytes[1..];
        }

        if !bytes.is_empty() && bytes[0] >= 0x80 {
            self.buf.put_u32(bytes.len() as u32 + 1);
            self.buf.put_u8(0);
            self.buf.put_slice(bytes);
        } else {
            self.buf.put_u32(bytes.len() as u32);
            self.buf.put_slice(bytes);
        }
    }

    /// Append raw bytes to the buffer.
    pub fn put_raw(&mut self, data: &[u8]) {
        self.buf.put_slice(data);
    }

    /// Unwraps the internal bytes.
    pub fn into_bytes(self) -> BytesMut {
        self.buf
    }

    /// Unwraps and freezes the internal bytes.
    pub fn finish(self) -> Bytes {
        self.buf.freeze()
    }
}

impl Default for PacketEncode {
    fn default() -> Self { Self::new() }
}
