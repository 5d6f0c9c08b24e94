// # Encoder
//
// Turns an `AnyMessage` into the bytes of a Sv2 frame.
//
// In transport mode the frame is encrypted: the 6 bytes header becomes a 22 bytes encrypted
// header, then the payload is split in chunks of at most `SV2_FRAME_CHUNK_SIZE - AEAD_MAC_LEN`
// bytes, each one encrypted and followed by its MAC. In every other state the plain frame is
// returned.

use std::convert::TryFrom;

use framing_sv2::{
    framing::Sv2Frame, header::Header, ENCRYPTED_SV2_FRAME_HEADER_SIZE, SV2_FRAME_CHUNK_SIZE,
    SV2_FRAME_HEADER_SIZE,
};
use noise_sv2::{NoiseCodec, AEAD_MAC_LEN};
use parsers_sv2::AnyMessage;
use tracing::error;

use crate::{Error, Result, State};

/// Encoder of Sv2 frames, encrypted or not depending on the session [`State`].
#[derive(Debug, Default)]
pub struct Encoder {
    // Serialized plain frame, reused between calls.
    sv2_buffer: Vec<u8>,
}

impl Encoder {
    /// Creates a new `Encoder` with a buffer of default size.
    pub fn new() -> Self {
        Self {
            sv2_buffer: Vec::with_capacity(512),
        }
    }

    /// Serializes `message` in a frame and, in transport mode, encrypts it.
    ///
    /// An encryption failure is fatal: `state` is reset to [`State::NotInitialized`].
    pub fn encode(&mut self, message: AnyMessage, state: &mut State) -> Result<Vec<u8>> {
        let frame = Sv2Frame::<AnyMessage>::try_from(message).map_err(|e| {
            error!("Error while framing message: {:?}", e);
            Error::from(e)
        })?;
        let header = frame.get_header();
        self.sv2_buffer.clear();
        self.sv2_buffer.resize(frame.encoded_length(), 0);
        frame.serialize(&mut self.sv2_buffer).map_err(|e| {
            error!("Error while serializing frame: {:?}", e);
            Error::from(e)
        })?;

        let encrypted = match state {
            State::Transport(noise_codec) => encrypt_frame(&self.sv2_buffer, &header, noise_codec),
            State::HandShake(_) | State::NotInitialized => return Ok(self.sv2_buffer.clone()),
        };
        encrypted.map_err(|e| {
            error!("Encryption failed, closing the Noise session: {:?}", e);
            state.take();
            e
        })
    }
}

fn encrypt_frame(sv2: &[u8], header: &Header, noise_codec: &mut NoiseCodec) -> Result<Vec<u8>> {
    let mut encrypted = Vec::with_capacity(ENCRYPTED_SV2_FRAME_HEADER_SIZE + header.encrypted_len());

    // ENCRYPT THE HEADER
    let mut chunk = sv2[..SV2_FRAME_HEADER_SIZE].to_vec();
    noise_codec.encrypt(&mut chunk).map_err(fatal)?;
    encrypted.extend_from_slice(&chunk);

    // ENCRYPT THE PAYLOAD IN CHUNKS
    for plain in sv2[SV2_FRAME_HEADER_SIZE..].chunks(SV2_FRAME_CHUNK_SIZE - AEAD_MAC_LEN) {
        let mut chunk = plain.to_vec();
        noise_codec.encrypt(&mut chunk).map_err(fatal)?;
        encrypted.extend_from_slice(&chunk);
    }
    Ok(encrypted)
}

/// Maps a cipher error of the transport phase to the codec error.
pub(crate) fn fatal(e: noise_sv2::Error) -> Error {
    match e {
        noise_sv2::Error::NonceExhausted => Error::NonceExhausted,
        _ => Error::AeadFailure,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::transport_pair;
    use common_messages_sv2::SetupConnectionSuccess;
    use parsers_sv2::CommonMessages;

    fn setup_success() -> AnyMessage {
        CommonMessages::SetupConnectionSuccess(SetupConnectionSuccess {
            used_version: 2,
            flags: 5,
        })
        .into()
    }

    #[test]
    fn plain_frame_when_not_initialized() {
        let mut state = State::new();
        let bytes = Encoder::new().encode(setup_success(), &mut state).unwrap();
        assert_eq!(bytes, vec![0, 0, 0x01, 6, 0, 0, 2, 0, 5, 0, 0, 0]);
    }

    #[test]
    fn transport_frame_has_encrypted_header_and_one_mac_per_chunk() {
        let (mut initiator, _) = transport_pair();
        let bytes = Encoder::new()
            .encode(setup_success(), &mut initiator)
            .unwrap();
        assert_eq!(bytes.len(), ENCRYPTED_SV2_FRAME_HEADER_SIZE + 6 + AEAD_MAC_LEN);
        assert!(initiator.is_in_transport_mode());
    }

    #[test]
    fn same_message_encrypts_differently_every_time() {
        let (mut initiator, _) = transport_pair();
        let mut encoder = Encoder::new();
        let first = encoder.encode(setup_success(), &mut initiator).unwrap();
        let second = encoder.encode(setup_success(), &mut initiator).unwrap();
        assert_ne!(first, second);
    }
}
