//! # Error Handling
//!
//! Errors returned while setting up a Noise session and while encoding or decoding frames.
//!
//! [`Error::MissingBytes`] is the only recoverable error of the incremental decoder: the caller
//! reads the requested number of bytes and calls [`crate::Decoder::try_decode`] again.
//! [`Error::AeadFailure`] and [`Error::NonceExhausted`] are fatal: the session [`crate::State`]
//! has already been reset when they are returned.

use core::fmt;

use parsers_sv2::ParserError;

/// Convenience alias for results returned by the codec.
pub type Result<T> = core::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An authority key is not 32 bytes long.
    InvalidKeyLength(usize),
    /// An authority key is not a valid secp256k1 key, or the keypair does not match.
    BadKey,
    /// A handshake step failed.
    HandshakeError(noise_sv2::Error),
    /// The responder certificate is not signed by the authority the initiator trusts.
    SignatureInvalid,
    /// The responder certificate is signed by the authority but is not valid now.
    CertificateExpired,
    /// The bytes do not form a frame, or the frame payload is not a known message.
    MalformedFrame,
    /// More bytes are needed to complete the frame.
    MissingBytes(usize),
    /// A message field could not be serialized.
    SerializationError(binary_sv2::Error),
    /// The chunk passed to the incremental decoder is not as long as requested.
    InvalidDataSize { expected: usize, actual: usize },
    /// Authentication of an encrypted frame failed. Fatal to the session.
    AeadFailure,
    /// The nonce counter of the session reached its maximum. Fatal to the session.
    NonceExhausted,
    /// The operation is not allowed in the current session state.
    UnexpectedNoiseState,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            InvalidKeyLength(len) => write!(f, "Authority key must be 32 bytes, got {len}"),
            BadKey => write!(f, "Invalid authority key"),
            HandshakeError(e) => write!(f, "Noise handshake error: {e}"),
            SignatureInvalid => write!(f, "Invalid certificate signature"),
            CertificateExpired => write!(f, "Certificate is not valid at the current time"),
            MalformedFrame => write!(f, "Malformed frame"),
            MissingBytes(n) => write!(f, "Missing {n} bytes to complete the frame"),
            SerializationError(e) => write!(f, "Serialization error: {e}"),
            InvalidDataSize { expected, actual } => {
                write!(f, "Expected a chunk of {expected} bytes, got {actual}")
            }
            AeadFailure => write!(f, "Frame authentication failed"),
            NonceExhausted => write!(f, "Nonce counter exhausted"),
            UnexpectedNoiseState => write!(f, "Operation not allowed in the current Noise state"),
        }
    }
}

impl std::error::Error for Error {}

impl From<binary_sv2::Error> for Error {
    fn from(e: binary_sv2::Error) -> Self {
        Error::SerializationError(e)
    }
}

impl From<framing_sv2::Error> for Error {
    fn from(e: framing_sv2::Error) -> Self {
        match e {
            framing_sv2::Error::BinarySv2Error(e) => Error::SerializationError(e),
            _ => Error::MalformedFrame,
        }
    }
}

impl From<ParserError> for Error {
    fn from(e: ParserError) -> Self {
        match e {
            ParserError::BinaryError(e) => Error::SerializationError(e),
            ParserError::BadPayloadSize | ParserError::UnexpectedMessage(_) => {
                Error::MalformedFrame
            }
        }
    }
}

impl From<noise_sv2::Error> for Error {
    fn from(e: noise_sv2::Error) -> Self {
        match e {
            noise_sv2::Error::InvalidCertificate(_) => Error::SignatureInvalid,
            noise_sv2::Error::CertificateExpired { .. } => Error::CertificateExpired,
            e => Error::HandshakeError(e),
        }
    }
}
