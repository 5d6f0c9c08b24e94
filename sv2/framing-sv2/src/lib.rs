//! # Stratum V2 Framing Library
//!
//! `framing_sv2` provides utilities for framing messages sent between Sv2 roles, handling both Sv2
//! message and Noise handshake frames.
//!
//! ## Message Format
//!
//! Each message begins with the extension type, message type, and message length (six bytes in
//! total), followed by a variable length payload:
//!
//! | Field            | Type    | Description |
//! |------------------|---------|-------------|
//! | `extension_type` | `U16`   | Extension of the message. Bit 15 is the `channel_msg` bit: when set the first four bytes of the payload are the `channel_id` the message is addressed to. The bit is ignored in the extension lookup. |
//! | `msg_type`       | `U8`    | Message type inside the extension. |
//! | `msg_length`     | `U24`   | Length of the payload, not including this header. |
//! | `payload`        | `BYTES` | Message-specific payload of length `msg_length`. |
//!
//! ## Usage
//!
//! During the Noise handshake the roles exchange raw [`framing::HandShakeFrame`]s. Every other
//! message is an [`framing::Sv2Frame`]: a [`header::Header`] followed by the serialized payload.
//! Once the connection is encrypted the header and the payload are encrypted separately, the
//! payload in chunks of at most [`SV2_FRAME_CHUNK_SIZE`] bytes including the MAC, see
//! [`header::Header::encrypted_len`].

#![no_std]

extern crate alloc;

/// Sv2 framing types
pub mod framing;

/// Sv2 framing errors
pub mod error;

/// Sv2 framing header
pub mod header;
pub use error::Error;

use noise_sv2::AEAD_MAC_LEN;

/// Size of the SV2 frame header in bytes.
pub const SV2_FRAME_HEADER_SIZE: usize = 6;

/// Size of the encrypted SV2 frame header, including the MAC.
pub const ENCRYPTED_SV2_FRAME_HEADER_SIZE: usize = SV2_FRAME_HEADER_SIZE + AEAD_MAC_LEN;

/// Maximum size of an encrypted SV2 frame chunk in bytes, MAC included.
pub const SV2_FRAME_CHUNK_SIZE: usize = 65535;
