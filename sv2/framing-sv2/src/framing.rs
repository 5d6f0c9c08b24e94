//! # Sv2 Frames
//!
//! [`Sv2Frame`] wraps a protocol message together with its [`Header`]. A frame is either built
//! from a message to be sent ([`Sv2Frame::from_message`]) or from the bytes of a received frame
//! ([`Sv2Frame::from_bytes`]), in which case the payload is kept serialized until the caller
//! decodes it. [`HandShakeFrame`] carries the raw Noise handshake messages.

use crate::{header::Header, Error};
use alloc::vec::Vec;
use binary_sv2::{to_writer, Encodable};
use core::convert::TryFrom;

#[derive(Debug, Clone)]
enum Body<T> {
    Payload(T),
    // The whole frame, header included.
    Serialized(Vec<u8>),
}

/// Abstraction for a Sv2 Frame.
#[derive(Debug, Clone)]
pub struct Sv2Frame<T> {
    header: Header,
    body: Body<T>,
}

impl<T: Encodable> Sv2Frame<T> {
    /// Writes header and payload in `dst`, which must be at least
    /// [`Sv2Frame::encoded_length`] bytes long.
    #[inline]
    pub fn serialize(self, dst: &mut [u8]) -> Result<(), Error> {
        match self.body {
            Body::Serialized(serialized) => {
                if dst.len() < serialized.len() {
                    return Err(binary_sv2::Error::WriteError(serialized.len(), dst.len()).into());
                }
                dst[..serialized.len()].copy_from_slice(&serialized);
                Ok(())
            }
            Body::Payload(payload) => {
                to_writer(&self.header, dst)?;
                to_writer(&payload, &mut dst[Header::SIZE..])?;
                Ok(())
            }
        }
    }

    #[inline]
    pub fn encoded_length(&self) -> usize {
        match &self.body {
            Body::Serialized(serialized) => serialized.len(),
            Body::Payload(payload) => payload.get_size() + Header::SIZE,
        }
    }

    /// Builds a frame for `message`. Returns `None` if the message is too big to be framed.
    pub fn from_message(
        message: T,
        message_type: u8,
        extension_type: u16,
        channel_msg: bool,
    ) -> Option<Self> {
        let extension_type = update_extension_type(extension_type, channel_msg);
        let len = u32::try_from(message.get_size()).ok()?;
        Header::from_len(len, message_type, extension_type).map(|header| Self {
            header,
            body: Body::Payload(message),
        })
    }
}

impl<T> Sv2Frame<T> {
    /// Serialized payload of a frame built with [`Sv2Frame::from_bytes`], `None` for frames
    /// built from a message.
    pub fn payload(&self) -> Option<&[u8]> {
        match &self.body {
            Body::Serialized(serialized) => Some(&serialized[Header::SIZE..]),
            Body::Payload(_) => None,
        }
    }

    pub fn get_header(&self) -> Header {
        self.header
    }

    /// Builds a frame from the bytes of a complete frame.
    ///
    /// On error returns the value of [`Sv2Frame::size_hint`].
    #[inline]
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, isize> {
        let hint = Self::size_hint(&bytes);
        if hint != 0 {
            return Err(hint);
        }
        let header = Header::from_bytes(&bytes).map_err(|_| Header::SIZE as isize)?;
        Ok(Self {
            header,
            body: Body::Serialized(bytes),
        })
    }

    /// Number of bytes missing from `bytes` to hold a complete frame: `0` when `bytes` is exactly
    /// one frame, negative when it holds more bytes than the frame.
    #[inline]
    pub fn size_hint(bytes: &[u8]) -> isize {
        match Header::from_bytes(bytes) {
            Err(_) => (Header::SIZE - bytes.len()) as isize,
            Ok(header) => {
                let expected = Header::SIZE + header.len();
                expected as isize - bytes.len() as isize
            }
        }
    }
}

/// Abstraction for a Noise handshake frame: the raw handshake message, without header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandShakeFrame {
    payload: Vec<u8>,
}

impl HandShakeFrame {
    #[inline]
    pub fn encoded_length(&self) -> usize {
        self.payload.len()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.payload
    }
}

pub fn handshake_message_to_frame<T: AsRef<[u8]>>(message: T) -> HandShakeFrame {
    HandShakeFrame {
        payload: message.as_ref().to_vec(),
    }
}

fn update_extension_type(extension_type: u16, channel_msg: bool) -> u16 {
    if channel_msg {
        let mask = 0b1000_0000_0000_0000;
        extension_type | mask
    } else {
        let mask = 0b0111_1111_1111_1111;
        extension_type & mask
    }
}
