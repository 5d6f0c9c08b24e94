// Errors of the handshake and of the transport ciphers.

use crate::AeadError;
use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The AEAD refused to encrypt or authenticate a message.
    Aead(AeadError),
    /// A handshake step was called in a state that has no cipher keys.
    InvalidCipherState,
    /// The responder certificate is not signed by the expected authority.
    InvalidCertificate([u8; 74]),
    /// The responder certificate is well signed but `now` is outside its validity window.
    CertificateExpired {
        valid_from: u32,
        not_valid_after: u32,
        now: u32,
    },
    InvalidRawPublicKey,
    InvalidRawPrivateKey,
    /// The public and private authority keys do not belong to the same keypair.
    KeypairMismatch,
    InvalidMessageLength,
    /// The nonce counter of a cipher reached `u64::MAX`: the session must be closed.
    NonceExhausted,
}

impl From<AeadError> for Error {
    fn from(value: AeadError) -> Self {
        Self::Aead(value)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            Aead(e) => write!(f, "AEAD error: {}", e),
            InvalidCipherState => write!(f, "Cipher state has no key"),
            InvalidCertificate(_) => write!(f, "Invalid responder certificate signature"),
            CertificateExpired {
                valid_from,
                not_valid_after,
                now,
            } => write!(
                f,
                "Responder certificate valid from {} to {}, now is {}",
                valid_from, not_valid_after, now
            ),
            InvalidRawPublicKey => write!(f, "Invalid raw public key"),
            InvalidRawPrivateKey => write!(f, "Invalid raw private key"),
            KeypairMismatch => write!(f, "Authority public key does not match the private key"),
            InvalidMessageLength => write!(f, "Invalid handshake message length"),
            NonceExhausted => write!(f, "Nonce counter exhausted"),
        }
    }
}

impl std::error::Error for Error {}
