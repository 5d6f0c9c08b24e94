//! # Sv2 Frame Header
//!
//! The 6 bytes header that starts every [`crate::framing::Sv2Frame`].

use crate::Error;
use binary_sv2::{impl_sv2_codec, U24};
use core::convert::TryInto;

use crate::{SV2_FRAME_CHUNK_SIZE, SV2_FRAME_HEADER_SIZE};
use noise_sv2::AEAD_MAC_LEN;

/// Abstraction for a Sv2 Frame Header.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Header {
    // Bit 15 is the `channel_msg` bit.
    extension_type: u16,
    msg_type: u8,
    // Payload length, header excluded.
    msg_length: U24,
}

impl_sv2_codec!(Header {
    extension_type,
    msg_type,
    msg_length
});

impl Header {
    pub const SIZE: usize = SV2_FRAME_HEADER_SIZE;
    const CHANNEL_MSG_MASK: u16 = 0b1000_0000_0000_0000;

    /// Reads a header from the first [`Header::SIZE`] bytes of `bytes`.
    #[inline]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < Self::SIZE {
            return Err(Error::UnexpectedHeaderLength(bytes.len() as isize));
        };
        let extension_type = u16::from_le_bytes([bytes[0], bytes[1]]);
        let msg_type = bytes[2];
        let msg_length: U24 = u32::from_le_bytes([bytes[3], bytes[4], bytes[5], 0]).try_into()?;
        Ok(Self {
            extension_type,
            msg_type,
            msg_length,
        })
    }

    /// Length of the payload.
    #[allow(clippy::len_without_is_empty)]
    #[inline]
    pub fn len(&self) -> usize {
        self.msg_length.into()
    }

    /// `None` if `msg_length` does not fit in 24 bits.
    #[inline]
    pub fn from_len(msg_length: u32, msg_type: u8, extension_type: u16) -> Option<Header> {
        Some(Self {
            extension_type,
            msg_type,
            msg_length: msg_length.try_into().ok()?,
        })
    }

    pub fn msg_type(&self) -> u8 {
        self.msg_type
    }

    pub fn ext_type(&self) -> u16 {
        self.extension_type
    }

    pub fn ext_type_without_channel_msg(&self) -> u16 {
        self.extension_type & !Self::CHANNEL_MSG_MASK
    }

    pub fn channel_msg(&self) -> bool {
        self.extension_type & Self::CHANNEL_MSG_MASK != 0
    }

    /// Length of the payload once encrypted: every chunk of up to
    /// `SV2_FRAME_CHUNK_SIZE - AEAD_MAC_LEN` plaintext bytes is followed by a MAC.
    pub fn encrypted_len(&self) -> usize {
        let len = self.len();
        let payload_per_chunk = SV2_FRAME_CHUNK_SIZE - AEAD_MAC_LEN;
        let chunks = (len + payload_per_chunk - 1) / payload_per_chunk;
        len + chunks * AEAD_MAC_LEN
    }
}
