// # Decoder
//
// Turns the bytes of a Sv2 frame, encrypted or not depending on the session state, back into an
// `AnyMessage`.
//
// Two modes are available:
//
// - `Decoder::decode` takes the bytes of exactly one frame. It is only usable when the frame
//   boundaries are known to the caller.
// - `Decoder::try_decode` is fed with the bytes read from a stream. `Decoder::buffer_size` tells
//   how many bytes the decoder needs to make progress: the header first (6 bytes, 22 once
//   encrypted), then the payload whose length is read from the header. Until the frame is
//   complete `try_decode` returns `Error::MissingBytes`.
//
// Once decrypted, header and payload are joined back into a plain frame that goes through
// `Sv2Frame::from_bytes` before the payload is parsed.
//
// A frame that fails authentication ends the session: the state is reset to
// `State::NotInitialized` before `Error::AeadFailure` is returned.

use framing_sv2::{
    framing::Sv2Frame, header::Header, ENCRYPTED_SV2_FRAME_HEADER_SIZE, SV2_FRAME_CHUNK_SIZE,
    SV2_FRAME_HEADER_SIZE,
};
use parsers_sv2::AnyMessage;
use std::convert::TryFrom;
use tracing::{debug, error, warn};

use crate::{encoder::fatal, Error, Result, State};

/// Decoder of Sv2 frames, encrypted or not depending on the session [`State`].
#[derive(Debug, Default)]
pub struct Decoder {
    // Bytes of the part of the frame being read: the header, then the payload.
    buffer: Vec<u8>,
    // Size of the part being read, 0 before the first call to `try_decode`.
    expected: usize,
    // Plain header of the frame whose payload is being read.
    header: Option<Vec<u8>>,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes to pass to the next [`Decoder::try_decode`] call.
    ///
    /// A new decoder does not know the session yet and returns 0: call `try_decode` with an
    /// empty chunk to learn the size of the header.
    pub fn buffer_size(&self) -> usize {
        self.expected - self.buffer.len()
    }

    /// Adds `chunk` to the frame being read.
    ///
    /// Returns the message once the frame is complete, [`Error::MissingBytes`] with the value of
    /// [`Decoder::buffer_size`] otherwise. A chunk longer than [`Decoder::buffer_size`] is
    /// refused with [`Error::InvalidDataSize`] and nothing is consumed.
    pub fn try_decode(&mut self, chunk: &[u8], state: &mut State) -> Result<AnyMessage> {
        if self.header.is_none() && self.buffer.is_empty() {
            self.expected = header_size(state);
        }
        let missing = self.buffer_size();
        if chunk.len() > missing {
            return Err(Error::InvalidDataSize {
                expected: missing,
                actual: chunk.len(),
            });
        }
        self.buffer.extend_from_slice(chunk);
        if self.buffer.len() < self.expected {
            return Err(Error::MissingBytes(self.buffer_size()));
        }

        let bytes = core::mem::take(&mut self.buffer);
        let result = match self.header.take() {
            None => read_header(bytes, state).and_then(|(header, plain_header)| {
                let payload_len = payload_size(&header, state);
                if payload_len == 0 {
                    return parse_frame(plain_header);
                }
                self.header = Some(plain_header);
                self.expected = payload_len;
                Err(Error::MissingBytes(payload_len))
            }),
            Some(mut frame) => read_payload(&bytes, state).and_then(|payload| {
                frame.extend_from_slice(&payload);
                parse_frame(frame)
            }),
        };
        match result {
            Err(Error::MissingBytes(n)) => Err(Error::MissingBytes(n)),
            other => {
                self.expected = header_size(state);
                other
            }
        }
    }

    /// Decodes `frame`, that must hold exactly one frame. Nothing is kept between calls.
    pub fn decode(&mut self, frame: &[u8], state: &mut State) -> Result<AnyMessage> {
        let header_len = header_size(state);
        if frame.len() < header_len {
            return Err(Error::MalformedFrame);
        }
        let (header, mut plain) = read_header(frame[..header_len].to_vec(), state)?;
        if frame.len() != header_len + payload_size(&header, state) {
            debug!(
                "Frame of {} bytes does not match its header {:?}",
                frame.len(),
                header
            );
            if state.is_in_transport_mode() {
                // the header nonce has been used: the peer and this side are out of sync
                warn!("Closing the Noise session after a malformed encrypted frame");
                state.take();
            }
            return Err(Error::MalformedFrame);
        }
        plain.extend_from_slice(&read_payload(&frame[header_len..], state)?);
        parse_frame(plain)
    }
}

fn header_size(state: &State) -> usize {
    if state.is_in_transport_mode() {
        ENCRYPTED_SV2_FRAME_HEADER_SIZE
    } else {
        SV2_FRAME_HEADER_SIZE
    }
}

fn payload_size(header: &Header, state: &State) -> usize {
    if state.is_in_transport_mode() {
        header.encrypted_len()
    } else {
        header.len()
    }
}

fn decrypt(data: &mut Vec<u8>, state: &mut State) -> Result<()> {
    let result = match state {
        State::Transport(noise_codec) => noise_codec.decrypt(data),
        State::HandShake(_) | State::NotInitialized => return Ok(()),
    };
    result.map_err(|e| {
        error!("Decryption failed, closing the Noise session: {:?}", e);
        state.take();
        fatal(e)
    })
}

// Returns the header with its plain bytes.
fn read_header(mut bytes: Vec<u8>, state: &mut State) -> Result<(Header, Vec<u8>)> {
    decrypt(&mut bytes, state)?;
    let header = Header::from_bytes(&bytes).map_err(|_| Error::MalformedFrame)?;
    Ok((header, bytes))
}

fn read_payload(bytes: &[u8], state: &mut State) -> Result<Vec<u8>> {
    if !state.is_in_transport_mode() {
        return Ok(bytes.to_vec());
    }
    let mut payload = Vec::with_capacity(bytes.len());
    for encrypted in bytes.chunks(SV2_FRAME_CHUNK_SIZE) {
        let mut chunk = encrypted.to_vec();
        decrypt(&mut chunk, state)?;
        payload.extend_from_slice(&chunk);
    }
    Ok(payload)
}

// `plain` is a whole unencrypted frame, header included.
fn parse_frame(plain: Vec<u8>) -> Result<AnyMessage> {
    let frame = Sv2Frame::<AnyMessage>::from_bytes(plain).map_err(|missing| {
        debug!("Frame does not match its header, {} bytes missing", missing);
        Error::MalformedFrame
    })?;
    let header = frame.get_header();
    if header.ext_type_without_channel_msg() != 0 {
        debug!("Unsupported extension type {}", header.ext_type());
        return Err(Error::MalformedFrame);
    }
    let payload = frame.payload().ok_or(Error::MalformedFrame)?;
    AnyMessage::try_from((header.msg_type(), payload)).map_err(|e| {
        debug!(
            "Can not parse message of type {:#x}: {:?}",
            header.msg_type(),
            e
        );
        Error::MalformedFrame
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tests::transport_pair, Encoder};
    use binary_sv2::{Seq064K, B016M, B032, B064K};
    use common_messages_sv2::SetupConnectionSuccess;
    use mining_sv2::{SetTarget, SubmitSharesExtended};
    use noise_sv2::AEAD_MAC_LEN;
    use parsers_sv2::{CommonMessages, Mining, TemplateDistribution};
    use quickcheck_macros::quickcheck;
    use template_distribution_sv2::RequestTransactionDataSuccess;

    fn setup_success() -> AnyMessage {
        CommonMessages::SetupConnectionSuccess(SetupConnectionSuccess {
            used_version: 2,
            flags: 1,
        })
        .into()
    }

    fn transaction_data(tx: Vec<u8>) -> AnyMessage {
        TemplateDistribution::RequestTransactionDataSuccess(RequestTransactionDataSuccess {
            template_id: 42,
            excess_data: B064K::try_from(vec![1, 2, 3]).unwrap(),
            transaction_list: Seq064K::new(vec![B016M::try_from(tx).unwrap()]).unwrap(),
        })
        .into()
    }

    fn same_session(state: &State) -> State {
        match state {
            State::Transport(codec) => State::Transport(codec.clone()),
            _ => panic!("not in transport mode"),
        }
    }

    // Feeds `bytes` to `decoder`, each chunk holding at most `splits[i]` bytes.
    fn decode_in_chunks(
        decoder: &mut Decoder,
        bytes: &[u8],
        splits: &[u8],
        state: &mut State,
    ) -> Option<AnyMessage> {
        let mut pos = 0;
        let mut i = 0;
        loop {
            let missing = decoder.buffer_size();
            let max = splits.get(i % splits.len().max(1)).copied().unwrap_or(255) as usize;
            let take = missing.min(max.max(1));
            i += 1;
            if pos + take > bytes.len() {
                return None;
            }
            match decoder.try_decode(&bytes[pos..pos + take], state) {
                Ok(message) => {
                    return if pos + take == bytes.len() {
                        Some(message)
                    } else {
                        None
                    }
                }
                Err(Error::MissingBytes(_)) => pos += take,
                Err(_) => return None,
            }
        }
    }

    #[test]
    fn frame_round_trip_in_transport_mode() {
        let (mut initiator, mut responder) = transport_pair();
        let mut encoder = Encoder::new();
        let mut decoder = Decoder::new();
        for _ in 0..3 {
            let bytes = encoder.encode(setup_success(), &mut initiator).unwrap();
            assert_eq!(decoder.decode(&bytes, &mut responder).unwrap(), setup_success());
        }
        let bytes = encoder.encode(setup_success(), &mut responder).unwrap();
        assert_eq!(decoder.decode(&bytes, &mut initiator).unwrap(), setup_success());
    }

    #[test]
    fn mining_messages_round_trip_as_channel_messages() {
        let share: AnyMessage = Mining::SubmitSharesExtended(SubmitSharesExtended {
            channel_id: 7,
            sequence_number: 1,
            job_id: 2,
            nonce: 0xdead_beef,
            ntime: 1746839905,
            version: 0x2000_0000,
            extranonce: B032::try_from(vec![1, 2, 3, 4]).unwrap(),
        })
        .into();
        let (mut initiator, mut responder) = transport_pair();
        let bytes = Encoder::new().encode(share.clone(), &mut initiator).unwrap();
        assert_eq!(Decoder::new().decode(&bytes, &mut responder).unwrap(), share);

        let set_target: AnyMessage = Mining::SetTarget(SetTarget {
            channel_id: 7,
            maximum_target: [0xff; 32].into(),
        })
        .into();
        let mut state = State::new();
        let bytes = Encoder::new().encode(set_target.clone(), &mut state).unwrap();
        // channel bit is the highest bit of the extension type
        assert_eq!(bytes[1] & 0x80, 0x80);
        assert_eq!(Decoder::new().decode(&bytes, &mut state).unwrap(), set_target);
    }

    #[test]
    fn frame_round_trip_in_plain_mode() {
        let mut state = State::new();
        let bytes = Encoder::new().encode(setup_success(), &mut state).unwrap();
        assert_eq!(
            Decoder::new().decode(&bytes, &mut state).unwrap(),
            setup_success()
        );
    }

    #[test]
    fn payload_bigger_than_a_chunk_is_split() {
        let (mut initiator, mut responder) = transport_pair();
        let message = transaction_data(vec![7; 70_000]);
        let bytes = Encoder::new().encode(message.clone(), &mut initiator).unwrap();
        let plain_len = 8 + 3 + 2 + 2 + 3 + 70_000;
        assert_eq!(
            bytes.len(),
            ENCRYPTED_SV2_FRAME_HEADER_SIZE + plain_len + 2 * AEAD_MAC_LEN
        );
        assert_eq!(Decoder::new().decode(&bytes, &mut responder).unwrap(), message);
    }

    #[test]
    fn tampered_frame_ends_the_session() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let (mut initiator, mut responder) = transport_pair();
        let mut bytes = Encoder::new().encode(setup_success(), &mut initiator).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 1;
        assert_eq!(
            Decoder::new().decode(&bytes, &mut responder).unwrap_err(),
            Error::AeadFailure
        );
        assert!(responder.is_not_initialized());
    }

    #[test]
    fn truncated_frame_is_malformed() {
        let mut state = State::new();
        let bytes = Encoder::new().encode(setup_success(), &mut state).unwrap();
        assert_eq!(
            Decoder::new()
                .decode(&bytes[..bytes.len() - 1], &mut state)
                .unwrap_err(),
            Error::MalformedFrame
        );
        assert_eq!(
            Decoder::new().decode(&bytes[..3], &mut state).unwrap_err(),
            Error::MalformedFrame
        );
    }

    #[test]
    fn unknown_message_type_is_malformed() {
        let mut state = State::new();
        let bytes = [0, 0, 0x52, 1, 0, 0, 9];
        assert_eq!(
            Decoder::new().decode(&bytes, &mut state).unwrap_err(),
            Error::MalformedFrame
        );
    }

    #[test]
    fn frame_with_an_extension_type_is_refused() {
        let mut state = State::new();
        let mut bytes = Encoder::new().encode(setup_success(), &mut state).unwrap();
        bytes[0] = 1;
        assert_eq!(
            Decoder::new().decode(&bytes, &mut state).unwrap_err(),
            Error::MalformedFrame
        );
    }

    #[test]
    fn frame_longer_than_its_header_is_malformed() {
        let mut state = State::new();
        let mut bytes = Encoder::new().encode(setup_success(), &mut state).unwrap();
        bytes.push(0);
        assert_eq!(
            Decoder::new().decode(&bytes, &mut state).unwrap_err(),
            Error::MalformedFrame
        );
        assert!(parse_frame(bytes).is_err());
    }

    #[test]
    fn plain_frame_is_parsed_from_its_bytes() {
        let mut state = State::new();
        let bytes = Encoder::new().encode(setup_success(), &mut state).unwrap();
        assert_eq!(parse_frame(bytes).unwrap(), setup_success());
    }

    #[test]
    fn incremental_decoder_asks_for_header_then_payload() {
        let (mut initiator, mut responder) = transport_pair();
        let bytes = Encoder::new().encode(setup_success(), &mut initiator).unwrap();
        let mut decoder = Decoder::new();
        assert_eq!(decoder.buffer_size(), 0);
        assert_eq!(
            decoder.try_decode(&[], &mut responder).unwrap_err(),
            Error::MissingBytes(ENCRYPTED_SV2_FRAME_HEADER_SIZE)
        );
        assert_eq!(decoder.buffer_size(), ENCRYPTED_SV2_FRAME_HEADER_SIZE);
        assert_eq!(
            decoder
                .try_decode(&bytes[..ENCRYPTED_SV2_FRAME_HEADER_SIZE], &mut responder)
                .unwrap_err(),
            Error::MissingBytes(6 + AEAD_MAC_LEN)
        );
        let message = decoder
            .try_decode(&bytes[ENCRYPTED_SV2_FRAME_HEADER_SIZE..], &mut responder)
            .unwrap();
        assert_eq!(message, setup_success());
        assert_eq!(decoder.buffer_size(), ENCRYPTED_SV2_FRAME_HEADER_SIZE);
    }

    #[test]
    fn chunk_longer_than_requested_is_refused() {
        let mut state = State::new();
        let bytes = Encoder::new().encode(setup_success(), &mut state).unwrap();
        let mut decoder = Decoder::new();
        assert_eq!(
            decoder.try_decode(&bytes, &mut state).unwrap_err(),
            Error::InvalidDataSize {
                expected: SV2_FRAME_HEADER_SIZE,
                actual: bytes.len()
            }
        );
        // nothing was consumed
        assert_eq!(decoder.buffer_size(), SV2_FRAME_HEADER_SIZE);
        assert_eq!(
            decoder
                .try_decode(&bytes[..SV2_FRAME_HEADER_SIZE], &mut state)
                .unwrap_err(),
            Error::MissingBytes(6)
        );
        assert_eq!(
            decoder
                .try_decode(&bytes[SV2_FRAME_HEADER_SIZE..], &mut state)
                .unwrap(),
            setup_success()
        );
    }

    #[test]
    fn incremental_decoder_reads_consecutive_frames() {
        let (mut initiator, mut responder) = transport_pair();
        let mut encoder = Encoder::new();
        let mut decoder = Decoder::new();
        let first = encoder.encode(setup_success(), &mut initiator).unwrap();
        let second = encoder
            .encode(transaction_data(vec![1; 100]), &mut initiator)
            .unwrap();
        assert_eq!(
            decode_in_chunks(&mut decoder, &first, &[5], &mut responder),
            Some(setup_success())
        );
        assert_eq!(
            decode_in_chunks(&mut decoder, &second, &[200], &mut responder),
            Some(transaction_data(vec![1; 100]))
        );
    }

    #[quickcheck]
    fn incremental_decode_matches_exact_decode(tx: Vec<u8>, splits: Vec<u8>) -> bool {
        let (mut initiator, responder) = transport_pair();
        let message = transaction_data(tx);
        let bytes = Encoder::new().encode(message.clone(), &mut initiator).unwrap();

        let mut exact_state = same_session(&responder);
        let mut chunked_state = same_session(&responder);
        let exact = Decoder::new().decode(&bytes, &mut exact_state).ok();
        let chunked = decode_in_chunks(&mut Decoder::new(), &bytes, &splits, &mut chunked_state);
        exact == Some(message) && chunked == exact
    }
}
