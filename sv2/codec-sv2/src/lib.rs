//! # Stratum V2 Codec Library
//!
//! `codec_sv2` turns [`parsers_sv2::AnyMessage`]s into bytes ready to be written on a connection
//! and back, optionally through the Noise encrypted transport.
//!
//! A connection is described by a [`State`]:
//!
//! - [`State::NotInitialized`]: no session, frames are sent in plain text.
//! - [`State::HandShake`]: the Noise handshake is in progress. The handshake messages are produced
//!   and consumed by [`State::step_0`], [`State::step_1`] and [`State::step_2`].
//! - [`State::Transport`]: the handshake is complete and every frame is encrypted.
//!
//! ## Usage
//!
//! ```rust
//! use codec_sv2::{Decoder, Encoder, State};
//! use noise_sv2::{HandshakeOp, Responder};
//! use parsers_sv2::{AnyMessage, CommonMessages};
//! # use common_messages_sv2::SetupConnectionSuccess;
//!
//! let authority = Responder::generate_key();
//! let public = authority.x_only_public_key().0.serialize();
//! let private = authority.secret_key().secret_bytes();
//!
//! let mut initiator = State::new_initiator(&public).unwrap();
//! let mut responder = State::new_responder(&public, &private, 3600).unwrap();
//!
//! let first = initiator.step_0().unwrap();
//! let second = responder.step_1(first).unwrap();
//! initiator.step_2(second).unwrap();
//!
//! let message: AnyMessage = CommonMessages::SetupConnectionSuccess(SetupConnectionSuccess {
//!     used_version: 2,
//!     flags: 0,
//! })
//! .into();
//! let bytes = Encoder::new().encode(message.clone(), &mut initiator).unwrap();
//! let decoded = Decoder::new().decode(&bytes, &mut responder).unwrap();
//! assert_eq!(decoded, message);
//! ```

mod decoder;
mod encoder;
pub mod error;

pub use decoder::Decoder;
pub use encoder::Encoder;
pub use error::{Error, Result};

pub use framing_sv2::{
    self,
    framing::{HandShakeFrame, Sv2Frame},
};
pub use noise_sv2::{self, Initiator, NoiseCodec, Responder};

use core::convert::TryInto;
use std::time::Duration;

use framing_sv2::framing::handshake_message_to_frame;
use noise_sv2::{ELLSWIFT_ENCODING_SIZE, INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE};
use tracing::{debug, info};

/// Size of the serialized authority keys.
pub const AUTHORITY_KEY_SIZE: usize = 32;

/// Noise session of a connection.
#[derive(Debug)]
pub enum State {
    /// Not yet initialized
    NotInitialized,
    /// Handshake mode where codec is negotiating keys
    HandShake(HandshakeRole),
    /// Transport mode where AEAD is fully operational. The `NoiseCodec` object in this variant
    /// is able to perform encryption and decryption resp.
    Transport(NoiseCodec),
}

/// Side of the Noise handshake played by this end of the connection.
#[derive(Debug)]
pub enum HandshakeRole {
    Initiator(Box<Initiator>),
    Responder(Box<Responder>),
}

impl State {
    pub fn new() -> Self {
        Self::NotInitialized
    }

    pub fn initialized(role: HandshakeRole) -> Self {
        Self::HandShake(role)
    }

    pub fn with_transport_mode(codec: NoiseCodec) -> Self {
        Self::Transport(codec)
    }

    /// Starts a handshake as initiator, trusting certificates signed by `authority_pub_key`
    /// (32 bytes x-only public key).
    pub fn new_initiator(authority_pub_key: &[u8]) -> Result<Self> {
        let key = to_key(authority_pub_key)?;
        let initiator = Initiator::from_raw_k(key).map_err(|_| Error::BadKey)?;
        Ok(Self::initialized(HandshakeRole::Initiator(initiator)))
    }

    /// Starts a handshake as responder. The certificates sent to initiators are signed with the
    /// authority keypair and are valid for `cert_validity_secs` seconds.
    pub fn new_responder(
        authority_pub_key: &[u8],
        authority_priv_key: &[u8],
        cert_validity_secs: u64,
    ) -> Result<Self> {
        let public = to_key(authority_pub_key)?;
        let private = to_key(authority_priv_key)?;
        let responder = Responder::from_authority_kp(
            &public,
            &private,
            Duration::from_secs(cert_validity_secs),
        )
        .map_err(|_| Error::BadKey)?;
        Ok(Self::initialized(HandshakeRole::Responder(responder)))
    }

    /// First handshake message, sent by the initiator: its ElligatorSwift encoded ephemeral key.
    pub fn step_0(&mut self) -> Result<HandShakeFrame> {
        match self {
            Self::HandShake(HandshakeRole::Initiator(initiator)) => {
                let message = initiator.step_0()?;
                debug!("Noise handshake: sent initiator ephemeral key");
                Ok(handshake_message_to_frame(message))
            }
            _ => Err(Error::UnexpectedNoiseState),
        }
    }

    /// Reads the initiator message and returns the responder answer. The responder is in
    /// transport mode afterwards.
    pub fn step_1(&mut self, initiator_frame: HandShakeFrame) -> Result<HandShakeFrame> {
        let responder = match self {
            Self::HandShake(HandshakeRole::Responder(responder)) => responder,
            _ => return Err(Error::UnexpectedNoiseState),
        };
        let message: [u8; ELLSWIFT_ENCODING_SIZE] = initiator_frame
            .into_inner()
            .try_into()
            .map_err(|_| Error::HandshakeError(noise_sv2::Error::InvalidMessageLength))?;
        let (response, codec) = responder.step_1(message)?;
        *self = Self::Transport(codec);
        info!("Noise handshake completed as responder");
        Ok(handshake_message_to_frame(response))
    }

    /// Reads the responder answer and checks its certificate. The initiator is in transport mode
    /// afterwards.
    pub fn step_2(&mut self, responder_frame: HandShakeFrame) -> Result<()> {
        let initiator = match self {
            Self::HandShake(HandshakeRole::Initiator(initiator)) => initiator,
            _ => return Err(Error::UnexpectedNoiseState),
        };
        let message: [u8; INITIATOR_EXPECTED_HANDSHAKE_MESSAGE_SIZE] = responder_frame
            .into_inner()
            .try_into()
            .map_err(|_| Error::HandshakeError(noise_sv2::Error::InvalidMessageLength))?;
        let codec = initiator.step_2(message)?;
        *self = Self::Transport(codec);
        info!("Noise handshake completed as initiator");
        Ok(())
    }

    #[inline(always)]
    pub fn is_in_transport_mode(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    #[inline(always)]
    pub fn is_not_initialized(&self) -> bool {
        matches!(self, Self::NotInitialized)
    }

    pub fn take(&mut self) -> Self {
        core::mem::replace(self, Self::NotInitialized)
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}

fn to_key(bytes: &[u8]) -> Result<[u8; AUTHORITY_KEY_SIZE]> {
    bytes
        .try_into()
        .map_err(|_| Error::InvalidKeyLength(bytes.len()))
}
