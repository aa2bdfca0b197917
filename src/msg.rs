//! Typed SSH transport messages.
//!
//! [`Message`] covers the message ids this crate can decode into typed fields. Ids that are
//! recognized but carry business logic above the transport (user authentication requests, global
//! requests, channels) fail with [`Error::PacketNotImplemented`], which callers must treat as
//! "recognized but unsupported", distinct from [`Error::UnknownMessageId`].
use bytes::Bytes;
use crate::codec::{self, PacketDecode, PacketEncode};
use crate::codes::msg;
use crate::error::{Error, Result};
use crate::negotiate::KexProposal;

/// A decoded SSH transport message (RFC 4253, sections 10 and 11; RFC 4252, section 5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// `SSH_MSG_DISCONNECT` (1).
    Disconnect {
        /// Machine-readable reason code (see [`codes::disconnect`][crate::codes::disconnect]).
        reason_code: u32,
        /// Human-readable description.
        description: String,
        /// Language tag of `description` (per RFC 3066).
        description_lang: String,
    },
    /// `SSH_MSG_IGNORE` (2).
    Ignore {
        /// Payload data, to be discarded by the receiver.
        data: Bytes,
    },
    /// `SSH_MSG_UNIMPLEMENTED` (3).
    Unimplemented {
        /// Sequence number of the packet the peer did not understand.
        packet_seq: u32,
    },
    /// `SSH_MSG_DEBUG` (4).
    Debug {
        /// Whether the message should always be displayed.
        always_display: bool,
        /// The debug message.
        message: String,
        /// Language tag of `message`.
        message_lang: String,
    },
    /// `SSH_MSG_SERVICE_REQUEST` (5).
    ServiceRequest {
        /// Name of the requested service.
        service_name: String,
    },
    /// `SSH_MSG_SERVICE_ACCEPT` (6).
    ServiceAccept {
        /// Name of the accepted service.
        service_name: String,
    },
    /// `SSH_MSG_KEXINIT` (20).
    KexInit(KexProposal),
    /// `SSH_MSG_NEWKEYS` (21).
    NewKeys,
    /// `SSH_MSG_USERAUTH_FAILURE` (51).
    UserauthFailure {
        /// Authentication methods that can productively continue.
        methods: Vec<String>,
        /// Whether the preceding request was a partial success.
        partial_success: bool,
    },
    /// `SSH_MSG_USERAUTH_SUCCESS` (52).
    UserauthSuccess,
    /// `SSH_MSG_USERAUTH_BANNER` (53).
    UserauthBanner {
        /// The banner text.
        message: String,
        /// Language tag of `message`.
        message_lang: String,
    },
}

impl Message {
    /// Decode a packet payload into a [`Message`].
    ///
    /// The first payload byte is the message id; the remaining fields are decoded at the offsets
    /// implied by the lengths of the preceding fields.
    pub fn decode(payload: Bytes) -> Result<Message> {
        let mut payload = PacketDecode::new(payload);
        let msg_id = payload.get_u8()?;
        match msg_id {
            msg::DISCONNECT => Ok(Message::Disconnect {
                reason_code: payload.get_u32()?,
                description: payload.get_string()?,
                description_lang: payload.get_string()?,
            }),
            msg::IGNORE => Ok(Message::Ignore {
                data: payload.get_bytes()?,
            }),
            msg::UNIMPLEMENTED => Ok(Message::Unimplemented {
                packet_seq: payload.get_u32()?,
            }),
            msg::DEBUG => Ok(Message::Debug {
                always_display: payload.get_bool()?,
                message: payload.get_string()?,
                message_lang: payload.get_string()?,
            }),
            msg::SERVICE_REQUEST => Ok(Message::ServiceRequest {
                service_name: payload.get_string()?,
            }),
            msg::SERVICE_ACCEPT => Ok(Message::ServiceAccept {
                service_name: payload.get_string()?,
            }),
            msg::KEXINIT => Ok(Message::KexInit(decode_kex_init(&mut payload)?)),
            msg::NEWKEYS => Ok(Message::NewKeys),
            msg::USERAUTH_FAILURE => Ok(Message::UserauthFailure {
                methods: payload.get_name_list()?,
                partial_success: payload.get_bool()?,
            }),
            msg::USERAUTH_SUCCESS => Ok(Message::UserauthSuccess),
            msg::USERAUTH_BANNER => Ok(Message::UserauthBanner {
                message: payload.get_string()?,
                message_lang: payload.get_string()?,
            }),
            msg::USERAUTH_REQUEST
                | msg::GLOBAL_REQUEST..=msg::REQUEST_FAILURE
                | msg::CHANNEL_OPEN..=msg::CHANNEL_FAILURE =>
                Err(Error::PacketNotImplemented(msg_id)),
            _ => Err(Error::UnknownMessageId(msg_id)),
        }
    }

    /// Encode a [`Message`] into a packet payload.
    ///
    /// The inverse of [`decode()`][Self::decode]: the message id byte first, then the fields in
    /// the same fixed order the decoder reads them.
    pub fn encode(&self) -> Result<Bytes> {
        let mut payload = PacketEncode::new();
        match self {
            Message::Disconnect { reason_code, description, description_lang } => {
                payload.put_u8(msg::DISCONNECT);
                payload.put_u32(*reason_code);
                payload.put_text(description)?;
                payload.put_text(description_lang)?;
            },
            Message::Ignore { data } => {
                payload.put_u8(msg::IGNORE);
                payload.put_bytes(data);
            },
            Message::Unimplemented { packet_seq } => {
                payload.put_u8(msg::UNIMPLEMENTED);
                payload.put_u32(*packet_seq);
            },
            Message::Debug { always_display, message, message_lang } => {
                payload.put_u8(msg::DEBUG);
                payload.put_bool(*always_display);
                payload.put_text(message)?;
                payload.put_text(message_lang)?;
            },
            Message::ServiceRequest { service_name } => {
                payload.put_u8(msg::SERVICE_REQUEST);
                payload.put_text(service_name)?;
            },
            Message::ServiceAccept { service_name } => {
                payload.put_u8(msg::SERVICE_ACCEPT);
                payload.put_text(service_name)?;
            },
            Message::KexInit(proposal) => {
                payload.put_u8(msg::KEXINIT);
                encode_kex_init(&mut payload, proposal);
            },
            Message::NewKeys => {
                payload.put_u8(msg::NEWKEYS);
            },
            Message::UserauthFailure { methods, partial_success } => {
                payload.put_u8(msg::USERAUTH_FAILURE);
                payload.put_name_list(methods);
                payload.put_bool(*partial_success);
            },
            Message::UserauthSuccess => {
                payload.put_u8(msg::USERAUTH_SUCCESS);
            },
            Message::UserauthBanner { message, message_lang } => {
                payload.put_u8(msg::USERAUTH_BANNER);
                payload.put_text(message)?;
                payload.put_text(message_lang)?;
            },
        }
        Ok(payload.finish())
    }
}

fn decode_kex_init(payload: &mut PacketDecode) -> Result<KexProposal> {
    // RFC 4253, section 7.1
    let cookie_bytes = payload.get_raw(16)?;
    let mut cookie = [0; 16];
    cookie.copy_from_slice(&cookie_bytes);

    let [kex_algos, server_pubkey_algos,
         cipher_algos_cts, cipher_algos_stc,
         mac_algos_cts, mac_algos_stc,
         compress_algos_cts, compress_algos_stc,
         languages_cts, languages_stc] = payload.get_name_lists()?;
    let first_kex_packet_follows = payload.get_bool()?;
    payload.get_u32()?; // reserved

    Ok(KexProposal {
        cookie,
        kex_algos,
        server_pubkey_algos,
        cipher_algos_cts,
        cipher_algos_stc,
        mac_algos_cts,
        mac_algos_stc,
        compress_algos_cts,
        compress_algos_stc,
        languages_cts,
        languages_stc,
        first_kex_packet_follows,
    })
}

fn encode_kex_init(payload: &mut PacketEncode, proposal: &KexProposal) {
    payload.put_raw(&proposal.cookie);
    payload.put_name_list(&proposal.kex_algos);
    payload.put_name_list(&proposal.server_pubkey_algos);
    payload.put_name_list(&proposal.cipher_algos_cts);
    payload.put_name_list(&proposal.cipher_algos_stc);
    payload.put_name_list(&proposal.mac_algos_cts);
    payload.put_name_list(&proposal.mac_algos_stc);
    payload.put_name_list(&proposal.compress_algos_cts);
    payload.put_name_list(&proposal.compress_algos_stc);
    payload.put_name_list(&proposal.languages_cts);
    payload.put_name_list(&proposal.languages_stc);
    payload.put_bool(proposal.first_kex_packet_follows);
    payload.put_u32(0); // reserved
}

/// Scan the buffer for a complete packet and decode its payload.
///
/// Composes [`codec::scan_packet()`] with [`Message::decode()`]. Returns `Ok(None)` while the
/// packet is incomplete. The consumed length is discarded at this level; callers driving a stream
/// should use [`codec::scan_packet()`] directly and track their own read cursor.
pub fn scan_message(buf: &[u8]) -> Result<Option<Message>> {
    match codec::scan_packet(buf)? {
        Some(packet) => Message::decode(packet.payload).map(Some),
        None => Ok(None),
    }
}
