use crate::codes::disconnect;
use std::fmt;

/// Result type for our [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Error that occured while handling the SSH transport or key exchange.
///
/// This enum is `#[non_exhaustive]`, so we reserve the right to add more variants and don't
/// consider this to break backwards compatibility.
///
/// Note that "need more bytes" is not an error: the scanners in [`codec`][crate::codec] signal it
/// by returning `Ok(None)`.
#[derive(thiserror::Error, Debug)]
#[allow(missing_docs)]
#[non_exhaustive]
pub enum Error {
    #[error("unexpected end of input")]
    Truncated,
    #[error("string is too long to encode")]
    TooLong,
    #[error("mpint has its sign bit set")]
    NegativeMpint,
    #[error("buffer exceeded the scan limit without a complete parse")]
    BufferTooLarge,
    #[error("malformed packet: {0}")]
    MalformedPacket(&'static str),
    #[error("unknown message id {0}")]
    UnknownMessageId(u8),
    #[error("message {0} not implemented")]
    PacketNotImplemented(u8),
    #[error("peer does not speak SSH protocol version 2.0")]
    UnsupportedVersion,
    #[error("protocol error: {0}")]
    Protocol(&'static str),
    #[error("could not decode bytes: {0}")]
    Decode(&'static str),
    #[error("could not negotiate algorithm: {0}")]
    AlgoNegotiate(AlgoNegotiateError),
    #[error("could not compute shared secret: {0}")]
    SharedSecret(&'static str),
    #[error("cryptography error: {0}")]
    Crypto(&'static str),
}

/// Error that occured because the two peers could not agree on an algorithm.
///
/// During the SSH key exchange, the client and the server must negotiate which cryptographic
/// algorithms to use, as described in RFC 4253, section 7.1. This error occurs when there is no
/// intersection between the client's and the server's lists in some category. Negotiation is
/// all-or-nothing, so a single empty intersection fails the whole handshake.
#[derive(Debug, Clone, thiserror::Error)]
#[error("for {category:}, client algos are {client_algos:?}, server algos are {server_algos:?}")]
pub struct AlgoNegotiateError {
    /// Human readable name of the algorithm category.
    pub category: &'static str,
    /// The name-list supplied by the client.
    pub client_algos: Vec<String>,
    /// The name-list supplied by the server.
    pub server_algos: Vec<String>,
}

/// Error that occured because the peer disconnected.
///
/// This corresponds to the `SSH_MSG_DISCONNECT` packet described in RFC 4253, section 11.1.
#[derive(Debug, Clone, thiserror::Error)]
pub struct DisconnectError {
    /// Machine-readable reason code (see [`codes::disconnect`][crate::codes::disconnect]).
    pub reason_code: u32,
    /// Human-readable description of the error.
    pub description: String,
    /// Language tag of `description` (per RFC 3066).
    pub description_lang: String,
}

impl DisconnectError {
    /// Translates the [`reason_code`][Self::reason_code] into a string.
    pub fn reason_to_str(&self) -> Option<&'static str> {
        disconnect::to_str(self.reason_code)
    }
}

impl fmt::Display for DisconnectError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "peer disconnected with ")?;
        if let Some(reason) = disconnect::to_str(self.reason_code) {
            write!(f, "`{}` ({})", reason, self.reason_code)?;
        } else {
            write!(f, "{}", self.reason_code)?;
        }
        if !self.description.is_empty() {
            write!(f, ": {:?}", self.description)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disconnect_error() {
        let err = DisconnectError {
            reason_code: crate::codes::disconnect::PROTOCOL_ERROR,
            description: "bad packet".into(),
            description_lang: "en".into(),
        };
        assert_eq!(err.reason_to_str(), Some("protocol error"));
        assert_eq!(err.to_string(), "peer disconnected with `protocol error` (2): \"bad packet\"");

        let err = DisconnectError { reason_code: 0xffff, description: "".into(),
            description_lang: "".into() };
        assert_eq!(err.reason_to_str(), None);
        assert_eq!(err.to_string(), "peer disconnected with 65535");
    }
}
