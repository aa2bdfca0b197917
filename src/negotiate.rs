//! Negotiation of cryptographic algorithms.
//!
//! During the key exchange, both peers send a `SSH_MSG_KEXINIT` proposal listing the algorithms
//! they support in preference order (RFC 4253, section 7.1). [`negotiate()`] maps the two
//! proposals to one agreed algorithm per category.
use rand::RngCore;
use crate::error::{AlgoNegotiateError, Error, Result};

/// Key exchange algorithms proposed by [`KexProposal::generate()`].
pub static KEX_ALGOS: &[&str] = &["diffie-hellman-group14-sha1"];
/// Server host key algorithms proposed by [`KexProposal::generate()`].
pub static SERVER_PUBKEY_ALGOS: &[&str] = &["ssh-rsa"];
/// Cipher algorithms proposed by [`KexProposal::generate()`].
pub static CIPHER_ALGOS: &[&str] = &["aes128-ctr"];
/// MAC algorithms proposed by [`KexProposal::generate()`].
pub static MAC_ALGOS: &[&str] = &["hmac-sha1"];
/// Compression algorithms proposed by [`KexProposal::generate()`].
pub static COMPRESS_ALGOS: &[&str] = &["none"];

/// The decoded payload of a `SSH_MSG_KEXINIT` message.
///
/// Carries the random cookie, the ten name-lists in the wire order, and the "first kex packet
/// follows" flag. The order of names within each list is the sender's preference order and is
/// preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KexProposal {
    /// Random cookie, exactly 16 bytes.
    pub cookie: [u8; 16],
    /// Key exchange algorithms.
    pub kex_algos: Vec<String>,
    /// Server host key algorithms.
    pub server_pubkey_algos: Vec<String>,
    /// Cipher algorithms, client to server.
    pub cipher_algos_cts: Vec<String>,
    /// Cipher algorithms, server to client.
    pub cipher_algos_stc: Vec<String>,
    /// MAC algorithms, client to server.
    pub mac_algos_cts: Vec<String>,
    /// MAC algorithms, server to client.
    pub mac_algos_stc: Vec<String>,
    /// Compression algorithms, client to server.
    pub compress_algos_cts: Vec<String>,
    /// Compression algorithms, server to client.
    pub compress_algos_stc: Vec<String>,
    /// Language tags, client to server (ignored by negotiation).
    pub languages_cts: Vec<String>,
    /// Language tags, server to client (ignored by negotiation).
    pub languages_stc: Vec<String>,
    /// Whether a speculative first kex packet follows this proposal.
    pub first_kex_packet_follows: bool,
}

impl KexProposal {
    /// Build a fresh local proposal from the fixed supported-algorithm lists.
    ///
    /// Each session generates its own proposal so that the random cookie is never reused.
    pub fn generate(rng: &mut dyn RngCore) -> KexProposal {
        let mut cookie = [0; 16];
        rng.fill_bytes(&mut cookie);

        fn names(names: &[&str]) -> Vec<String> {
            names.iter().map(|name| (*name).into()).collect()
        }

        KexProposal {
            cookie,
            kex_algos: names(KEX_ALGOS),
            server_pubkey_algos: names(SERVER_PUBKEY_ALGOS),
            cipher_algos_cts: names(CIPHER_ALGOS),
            cipher_algos_stc: names(CIPHER_ALGOS),
            mac_algos_cts: names(MAC_ALGOS),
            mac_algos_stc: names(MAC_ALGOS),
            compress_algos_cts: names(COMPRESS_ALGOS),
            compress_algos_stc: names(COMPRESS_ALGOS),
            languages_cts: Vec::new(),
            languages_stc: Vec::new(),
            first_kex_packet_follows: false,
        }
    }
}

/// One concretely agreed algorithm per negotiable category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiatedAlgorithms {
    /// Key exchange algorithm.
    pub kex: String,
    /// Server host key algorithm.
    pub server_pubkey: String,
    /// Cipher, client to server.
    pub cipher_cts: String,
    /// Cipher, server to client.
    pub cipher_stc: String,
    /// MAC, client to server.
    pub mac_cts: String,
    /// MAC, server to client.
    pub mac_stc: String,
    /// Compression, client to server.
    pub compress_cts: String,
    /// Compression, server to client.
    pub compress_stc: String,
}

/// Negotiate one algorithm per category from the two peers' proposals.
///
/// For every category the result is the first name in the client's list that appears anywhere in
/// the server's list, so the client's preference order always wins among mutually supported
/// options (RFC 4253, section 7.1). Language lists are ignored. Negotiation is all-or-nothing: a
/// single category without a common name fails with [`Error::AlgoNegotiate`].
pub fn negotiate(client: &KexProposal, server: &KexProposal) -> Result<NegotiatedAlgorithms> {
    Ok(NegotiatedAlgorithms {
        kex: negotiate_category(
            &client.kex_algos, &server.kex_algos, "key exchange")?,
        server_pubkey: negotiate_category(
            &client.server_pubkey_algos, &server.server_pubkey_algos, "server host key")?,
        cipher_cts: negotiate_category(
            &client.cipher_algos_cts, &server.cipher_algos_cts, "cipher client-to-server")?,
        cipher_stc: negotiate_category(
            &client.cipher_algos_stc, &server.cipher_algos_stc, "cipher server-to-client")?,
        mac_cts: negotiate_category(
            &client.mac_algos_cts, &server.mac_algos_cts, "mac client-to-server")?,
        mac_stc: negotiate_category(
            &client.mac_algos_stc, &server.mac_algos_stc, "mac server-to-client")?,
        compress_cts: negotiate_category(
            &client.compress_algos_cts, &server.compress_algos_cts,
            "compression client-to-server")?,
        compress_stc: negotiate_category(
            &client.compress_algos_stc, &server.compress_algos_stc,
            "compression server-to-client")?,
    })
}

fn negotiate_category(
    client_algos: &[String],
    server_algos: &[String],
    category: &'static str,
) -> Result<String> {
    for client_algo in client_algos.iter() {
        if server_algos.iter().any(|server_algo| server_algo == client_algo) {
            log::debug!("negotiated algo {:?} for {}", client_algo, category);
            return Ok(client_algo.clone())
        }
    }

    Err(Error::AlgoNegotiate(AlgoNegotiateError {
        category,
        client_algos: client_algos.to_vec(),
        server_algos: server_algos.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng as _;
    use super::*;

    fn names(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| (*name).into()).collect()
    }

    fn proposal(kex: &[&str]) -> KexProposal {
        KexProposal {
            cookie: [0; 16],
            kex_algos: names(kex),
            server_pubkey_algos: names(&["ssh-rsa"]),
            cipher_algos_cts: names(&["aes128-ctr"]),
            cipher_algos_stc: names(&["aes128-ctr"]),
            mac_algos_cts: names(&["hmac-sha1"]),
            mac_algos_stc: names(&["hmac-sha1"]),
            compress_algos_cts: names(&["none"]),
            compress_algos_stc: names(&["none"]),
            languages_cts: Vec::new(),
            languages_stc: Vec::new(),
            first_kex_packet_follows: false,
        }
    }

    #[test]
    fn test_client_preference_wins() {
        let client = proposal(&["a", "b"]);
        let server = proposal(&["b", "a"]);
        let algos = negotiate(&client, &server).unwrap();
        assert_eq!(algos.kex, "a");
    }

    #[test]
    fn test_server_order_is_ignored() {
        let client = proposal(&["c", "a"]);
        let server = proposal(&["a", "b", "c"]);
        let algos = negotiate(&client, &server).unwrap();
        assert_eq!(algos.kex, "c");
    }

    #[test]
    fn test_no_common_algo() {
        let client = proposal(&["a", "b"]);
        let server = proposal(&["c", "d"]);
        match negotiate(&client, &server) {
            Err(Error::AlgoNegotiate(err)) => {
                assert_eq!(err.category, "key exchange");
                assert_eq!(err.client_algos, names(&["a", "b"]));
                assert_eq!(err.server_algos, names(&["c", "d"]));
            },
            other => panic!("expected negotiation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_all_or_nothing() {
        // every category agrees except one direction of the mac
        let client = proposal(&["a"]);
        let mut server = proposal(&["a"]);
        server.mac_algos_stc = names(&["hmac-md5"]);
        match negotiate(&client, &server) {
            Err(Error::AlgoNegotiate(err)) => assert_eq!(err.category, "mac server-to-client"),
            other => panic!("expected negotiation failure, got {:?}", other),
        }
    }

    #[test]
    fn test_languages_do_not_negotiate() {
        let client = proposal(&["a"]);
        let mut server = proposal(&["a"]);
        server.languages_cts = names(&["en"]);
        server.languages_stc = names(&["cs"]);
        assert!(negotiate(&client, &server).is_ok());
    }

    #[test]
    fn test_generated_proposals_agree() {
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(42);
        let client = KexProposal::generate(&mut rng);
        let server = KexProposal::generate(&mut rng);
        assert_ne!(client.cookie, server.cookie);

        let algos = negotiate(&client, &server).unwrap();
        assert_eq!(algos.kex, "diffie-hellman-group14-sha1");
        assert_eq!(algos.server_pubkey, "ssh-rsa");
        assert_eq!(algos.compress_cts, "none");
    }
}
