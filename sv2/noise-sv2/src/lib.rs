//! # Noise-SV2: Noise Protocol Implementation for Stratum V2
//!
//! `noise_sv2` secures the communication between Stratum V2 roles with the
//! `Noise_NX_Secp256k1+EllSwift_ChaChaPoly_SHA256` handshake.
//!
//! The [`Initiator`] (the downstream role) sends its ElligatorSwift encoded ephemeral key
//! ([`Initiator::step_0`]). The [`Responder`] answers with its own ephemeral key, its encrypted
//! static key and an encrypted [`SignatureNoiseMessage`] certifying the static key
//! ([`Responder::step_1`]). The initiator checks the certificate against the authority public key
//! it was configured with ([`Initiator::step_2`]). Both sides end up with a [`NoiseCodec`] holding
//! two ChaCha20-Poly1305 ciphers, one per direction.
//!
//! ## Usage
//!
//! ```rust
//! use noise_sv2::{HandshakeOp, Initiator, Responder};
//!
//! let authority = Responder::generate_key();
//! let mut initiator = Initiator::new(Some(authority.x_only_public_key().0));
//! let mut responder = Responder::new(authority, 3600);
//!
//! let first_message = initiator.step_0().unwrap();
//! let (second_message, mut responder_codec) = responder.step_1(first_message).unwrap();
//! let mut initiator_codec = initiator.step_2(second_message).unwrap();
//!
//! let mut message = b"hello".to_vec();
//! initiator_codec.encrypt(&mut message).unwrap();
//! responder_codec.decrypt(&mut message).unwrap();
//! assert_eq!(message, b"hello");
//! ```

pub use chacha20poly1305::aead::{Buffer, Error as AeadError};
use cipher_state::GenericCipher;

mod aed_cipher;
mod cipher_state;
mod error;
mod handshake;
mod initiator;
mod responder;
mod signature_message;
#[cfg(test)]
mod test;

pub use error::Error;
pub use handshake::HandshakeOp;
pub use initiator::Initiator;
pub use responder::Responder;
pub use signature_message::SignatureNoiseMessage;

/// Size of the Poly1305 tag appended to every encrypted message.
pub const AEAD_MAC_LEN: usize = 16;

pub const SIGNATURE_NOISE_MESSAGE_SIZE: usize = 74;

pub const ENCRYPTED_SIGNATURE_NOISE_MESSAGE_SIZE: usize =
    SIGNATURE_NOISE_MESSAGE_SIZE + AEAD_MAC_LEN;

/// Size of an ElligatorSwift encoded public key.
pub const ELLSWIFT_ENCODING_SIZE: usize = 64;

pub const ENCRYPTED_ELLSWIFT_ENCODING_SIZE: usize = ELLSWIFT_ENCODING_SIZE + AEAD_MAC_LEN;

/// Size of the handshake message sent by the responder and read by the initiator in `step_2`.
pub const INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE: usize = ELLSWIFT_ENCODING_SIZE
    + ENCRYPTED_ELLSWIFT_ENCODING_SIZE
    + ENCRYPTED_SIGNATURE_NOISE_MESSAGE_SIZE;

/// SHA-256 of `Noise_NX_Secp256k1+EllSwift_ChaChaPoly_SHA256`.
pub const NOISE_HASHED_PROTOCOL_NAME_CHACHA: [u8; 32] = [
    46, 180, 120, 129, 32, 142, 158, 238, 31, 102, 159, 103, 198, 110, 231, 14, 169, 234, 136, 9,
    13, 80, 63, 232, 48, 220, 75, 200, 62, 41, 191, 16,
];

// Every key used in the handshake has an even y coordinate.
const PARITY: secp256k1::Parity = secp256k1::Parity::Even;

/// Transport-phase cipher pair produced by a completed handshake.
///
/// Each direction has its own key and 64-bit nonce counter. Keys are never exposed and are
/// erased when the codec is dropped.
#[derive(Clone)]
pub struct NoiseCodec {
    // Cipher to encrypt outgoing messages.
    encryptor: GenericCipher,

    // Cipher to decrypt incoming messages.
    decryptor: GenericCipher,
}

impl core::fmt::Debug for NoiseCodec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NoiseCodec").finish()
    }
}

impl NoiseCodec {
    /// Encrypts `msg` in place, appending the MAC.
    ///
    /// Fails with [`Error::NonceExhausted`] once the outgoing nonce counter reached `u64::MAX`.
    pub fn encrypt<T: Buffer>(&mut self, msg: &mut T) -> Result<(), Error> {
        self.encryptor.encrypt(msg)
    }

    /// Authenticates and decrypts `msg` in place, removing the MAC.
    pub fn decrypt<T: Buffer>(&mut self, msg: &mut T) -> Result<(), Error> {
        self.decryptor.decrypt(msg)
    }
}
