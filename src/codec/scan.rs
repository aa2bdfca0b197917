use bytes::{BufMut as _, Bytes, BytesMut};
use rand::RngCore;
use crate::{Error, Result};

/// Upper bound on the number of bytes the scanners examine before giving up on a parse unit.
pub const MAX_SCAN_LEN: usize = 64 * 1024;

/// Upper bound on the `packet_length` field of a binary packet.
pub const MAX_PACKET_LEN: usize = 64000;

/// Result of a successful [`scan_version()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Version {
    /// The peer's software version token (the part after `SSH-2.0-`).
    pub software: String,
    /// Number of bytes consumed from the buffer, including the terminating CRLF.
    pub consumed: usize,
}

/// Result of a successful [`scan_packet()`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// The packet payload, with the length fields and padding stripped.
    pub payload: Bytes,
    /// Number of bytes consumed from the buffer, including header and padding.
    pub consumed: usize,
}

/// Scan the buffer for the peer's version line (RFC 4253, section 4.2).
///
/// Lines before the version line that do not start with `SSH-` are skipped, to support servers
/// that print a banner before the protocol starts. Returns `Ok(None)` when no complete line is
/// available yet; the caller should append more bytes and scan again. The scan is a pure function
/// of the buffer, so repeated calls on the same bytes return the same result. Skipped banner
/// lines count against [`MAX_SCAN_LEN`]: the caller cannot drain them, so the cap covers the
/// whole buffer, not just the line being scanned.
pub fn scan_version(buf: &[u8]) -> Result<Option<Version>> {
    let mut pos = 0;
    loop {
        let line_end = match find_crlf(&buf[pos..]) {
            Some(at) => pos + at,
            None => return if buf.len() <= MAX_SCAN_LEN {
                Ok(None)
            } else {
                Err(Error::BufferTooLarge)
            },
        };

        let line = &buf[pos..line_end];
        if !line.starts_with(b"SSH-") {
            // pre-banner text, skip the line and continue scanning
            pos = line_end + 2;
            continue
        }

        let line = std::str::from_utf8(line)
            .map_err(|_| Error::Protocol("version line is not valid utf-8"))?;
        if line.len() < 9 {
            return Err(Error::Protocol("version line is too short"))
        }

        let mut tokens = line.splitn(3, '-');
        let _ssh = tokens.next();
        let proto = tokens.next().ok_or(Error::Protocol("version line has too few tokens"))?;
        let software = tokens.next().ok_or(Error::Protocol("version line has too few tokens"))?;

        if proto != "2.0" {
            return Err(Error::UnsupportedVersion)
        }

        log::debug!("scanned peer version {:?}", software);
        return Ok(Some(Version { software: software.into(), consumed: line_end + 2 }))
    }
}

/// Scan the buffer for a complete binary packet (RFC 4253, section 6).
///
/// Returns `Ok(None)` when the buffer does not yet hold the whole packet. Length invariants are
/// checked before anything is sliced or allocated, so a hostile `packet_length` cannot trigger a
/// large allocation. No MAC tail is accounted for: this framer runs before keys are in effect.
pub fn scan_packet(buf: &[u8]) -> Result<Option<Packet>> {
    if buf.len() < 5 {
        return if buf.len() <= MAX_SCAN_LEN { Ok(None) } else { Err(Error::BufferTooLarge) }
    }

    let packet_len = u32::from_be_bytes(buf[..4].try_into().unwrap()) as usize;
    let padding_len = buf[4] as usize;

    if packet_len == 0 {
        return Err(Error::MalformedPacket("zero packet length"))
    } else if packet_len >= MAX_PACKET_LEN {
        return Err(Error::MalformedPacket("packet length exceeds the limit"))
    } else if packet_len <= padding_len + 1 {
        return Err(Error::MalformedPacket("packet too short for its padding"))
    }

    let total_len = 4 + packet_len;
    if buf.len() < total_len {
        return Ok(None)
    }

    let payload_len = packet_len - padding_len - 1;
    let payload = Bytes::copy_from_slice(&buf[5..5 + payload_len]);
    log::trace!("scanned packet, payload {} bytes, consumed {}", payload_len, total_len);
    Ok(Some(Packet { payload, consumed: total_len }))
}

/// Frame a payload into the outgoing wire form (RFC 4253, section 6).
///
/// Pads the packet to a multiple of 8 bytes with at least 4 bytes of random padding. The caller
/// appends the result to its transmit buffer.
///
/// The payload must not be empty: every SSH payload starts with its message id byte, and an
/// empty payload has no valid wire form ([`scan_packet()`] rejects `packet_length <=
/// padding_length + 1`).
pub fn frame_packet(payload: &[u8], rng: &mut dyn RngCore) -> BytesMut {
    debug_assert!(!payload.is_empty());
    let padding_len = padding_len(payload.len());

    let mut buf = BytesMut::with_capacity(5 + payload.len() + padding_len);
    buf.put_u32((1 + payload.len() + padding_len) as u32);
    buf.put_u8(padding_len as u8);
    buf.put_slice(payload);

    let mut padding = [0; 255];
    rng.fill_bytes(&mut padding[..padding_len]);
    buf.put_slice(&padding[..padding_len]);
    buf
}

/// The outgoing version line `SSH-2.0-<software>` with the terminating CRLF.
pub fn ident_line(software: &str) -> BytesMut {
    let mut buf = BytesMut::with_capacity(10 + software.len());
    buf.put_slice(b"SSH-2.0-");
    buf.put_slice(software.as_bytes());
    buf.put_slice(b"\r\n");
    buf
}

fn find_crlf(buf: &[u8]) -> Option<usize> {
    buf.windows(2).position(|w| w == b"\r\n")
}

fn padding_len(payload_len: usize) -> usize {
    let min_padded_len = 5 + payload_len + 4;
    let padded_len = (min_padded_len + 7) / 8 * 8;
    padded_len - payload_len - 5
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, RngCore, SeedableRng as _};
    use super::*;

    fn make_rng() -> Box<dyn RngCore> {
        Box::new(rand_chacha::ChaCha8Rng::seed_from_u64(42))
    }

    // feed the data in random chunks and check that the scan stays incomplete until the
    // interesting point, then yields the expected result
    fn check_feeding<F1, F2>(data: &[u8], mut check_before: F1, mut check_after: F2)
        where F1: FnMut(&[u8]),
              F2: FnMut(&[u8]),
    {
        let mut rng = make_rng();
        for iter in 0..100 {
            let mut rest = data;
            let mut buf = Vec::new();

            while !rest.is_empty() {
                check_before(&buf);
                let feed_len = if iter == 0 { 1 } else { rng.gen_range(0..rest.len()) + 1 };
                buf.extend_from_slice(&rest[..feed_len]);
                rest = &rest[feed_len..];
            }

            check_after(&buf);
        }
    }

    fn check_version(data: &[u8], software: &str, consumed: usize) {
        check_feeding(
            data,
            |buf| assert_eq!(scan_version(buf).unwrap(), None),
            |buf| {
                let version = scan_version(buf).unwrap().unwrap();
                assert_eq!(version.software, software);
                assert_eq!(version.consumed, consumed);
            },
        );
    }

    #[test]
    fn test_scan_version() {
        check_version(b"SSH-2.0-OpenSSH_7.4\r\n", "OpenSSH_7.4", 21);

        // garbage lines before the version line are skipped
        let data = b"Garbage line\r\nSSH-2.0-OpenSSH_7.4\r\n";
        check_version(data, "OpenSSH_7.4", data.len());

        // software version may contain dashes and comments
        let version = scan_version(b"SSH-2.0-a-b c d\r\n").unwrap().unwrap();
        assert_eq!(version.software, "a-b c d");
    }

    #[test]
    fn test_scan_version_incomplete() {
        assert_eq!(scan_version(b"").unwrap(), None);
        assert_eq!(scan_version(b"SSH-2.0-foo").unwrap(), None);
        // lone \r is not a line terminator
        assert_eq!(scan_version(b"SSH-2.0-foo\r").unwrap(), None);
        assert_eq!(scan_version(b"noise\r\nSSH-2.0-foo").unwrap(), None);
    }

    #[test]
    fn test_scan_version_rejects() {
        assert!(matches!(scan_version(b"SSH-1.99-foo\r\n"), Err(Error::UnsupportedVersion)));
        assert!(matches!(scan_version(b"SSH-1.5-old\r\n"), Err(Error::UnsupportedVersion)));
        assert!(matches!(scan_version(b"SSH-2.0\r\n"), Err(Error::Protocol(_))));
        assert!(matches!(scan_version(b"SSH-x\r\n"), Err(Error::Protocol(_))));
    }

    #[test]
    fn test_scan_version_too_large() {
        // exactly at the cap the scan still waits for more bytes
        assert_eq!(scan_version(&vec![b'x'; MAX_SCAN_LEN]).unwrap(), None);

        let mut buf = vec![b'x'; MAX_SCAN_LEN + 2];
        assert!(matches!(scan_version(&buf), Err(Error::BufferTooLarge)));
        // terminating the garbage line does not reset the cap
        buf.extend_from_slice(b"\r\n");
        assert!(matches!(scan_version(&buf), Err(Error::BufferTooLarge)));

        // a stream of short terminated banner lines is bounded too
        let mut buf = Vec::new();
        while buf.len() <= MAX_SCAN_LEN {
            buf.extend_from_slice(b"banner line\r\n");
        }
        assert!(matches!(scan_version(&buf), Err(Error::BufferTooLarge)));
    }

    fn check_packet(data: &[u8], payload: &[u8]) {
        check_feeding(
            data,
            |buf| assert!(scan_packet(buf).unwrap().is_none()),
            |buf| {
                let packet = scan_packet(buf).unwrap().unwrap();
                assert_eq!(packet.payload, payload);
                assert_eq!(packet.consumed, data.len());
            },
        );
    }

    #[test]
    fn test_scan_packet() {
        // packet with 3 bytes of payload and 8 bytes of padding
        check_packet(b"\x00\x00\x00\x0c\x08foo01234567", b"foo");

        // single-byte payload, the shortest valid packet
        check_packet(b"\x00\x00\x00\x0c\x0a\x150123456789", b"\x15");
    }

    #[test]
    fn test_scan_packet_boundary() {
        let data = b"\x00\x00\x00\x0c\x08foo01234567";
        // exactly one byte short of the complete packet
        assert!(scan_packet(&data[..data.len() - 1]).unwrap().is_none());
        let packet = scan_packet(data).unwrap().unwrap();
        assert_eq!(packet.consumed, data.len());
        // trailing bytes of the next packet do not change the result
        let mut more = data.to_vec();
        more.extend_from_slice(b"\x00\x00");
        assert_eq!(scan_packet(&more).unwrap().unwrap(), packet);
    }

    #[test]
    fn test_scan_packet_idempotent() {
        let data = b"\x00\x00\x00\x0c\x08foo01234567";
        for len in 0..data.len() {
            let first = scan_packet(&data[..len]).unwrap();
            let second = scan_packet(&data[..len]).unwrap();
            assert_eq!(first, second);
        }
        assert_eq!(scan_packet(data).unwrap(), scan_packet(data).unwrap());
    }

    #[test]
    fn test_scan_packet_malformed() {
        // zero packet length
        assert!(matches!(
            scan_packet(b"\x00\x00\x00\x00\x00zzz"),
            Err(Error::MalformedPacket("zero packet length"))));

        // excessive packet length, rejected before any allocation
        assert!(matches!(
            scan_packet(b"\xde\xad\xbe\xef\x00zzz"),
            Err(Error::MalformedPacket("packet length exceeds the limit"))));

        // padding leaves no room for the payload
        assert!(matches!(
            scan_packet(b"\x00\x00\x00\x0c\x20zzzxxxxyyyy"),
            Err(Error::MalformedPacket("packet too short for its padding"))));
        assert!(matches!(
            scan_packet(b"\x00\x00\x00\x02\x01zzz"),
            Err(Error::MalformedPacket("packet too short for its padding"))));

        // all padding, no payload byte
        assert!(matches!(
            scan_packet(b"\x00\x00\x00\x0c\x0b0123456789a"),
            Err(Error::MalformedPacket("packet too short for its padding"))));
    }

    #[test]
    fn test_frame_packet_round_trip() {
        let mut rng = make_rng();
        for payload_len in [1, 3, 8, 100, 1000] {
            let payload = vec![0x5a; payload_len];
            let framed = frame_packet(&payload, &mut rng);
            assert_eq!(framed.len() % 8, 0);

            let packet = scan_packet(&framed).unwrap().unwrap();
            assert_eq!(packet.payload, payload);
            assert_eq!(packet.consumed, framed.len());
        }
    }

    #[test]
    fn test_ident_line() {
        let line = ident_line("hawser_0.1");
        assert_eq!(line.as_ref(), b"SSH-2.0-hawser_0.1\r\n");
        let version = scan_version(&line).unwrap().unwrap();
        assert_eq!(version.software, "hawser_0.1");
        assert_eq!(version.consumed, line.len());
    }
}
