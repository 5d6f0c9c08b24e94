//! Defines types, encodings, and conversions between custom datatype and standard Rust type,
//! providing abstractions for encoding, decoding, and error handling of SV2 data types.
//!
//! # Overview
//!
//! Enables conversion between various Rust types and SV2-specific data formats for efficient
//! network communication. Provides utilities to encode and decode data types according to the SV2
//! specifications.
//!
//! ## Type Mappings
//! The following table illustrates how standard Rust types map to their SV2 counterparts:
//!
//! ```txt
//! bool       <-> BOOL
//! u8         <-> U8
//! u16        <-> U16
//! U24        <-> U24
//! u32        <-> U32
//! f32        <-> F32
//! u64        <-> U64
//! U256       <-> U256
//! Str0255    <-> STR0_255
//! B032       <-> B0_32
//! B0255      <-> B0_255
//! B064K      <-> B0_64K
//! B016M      <-> B0_16M
//! Seq0255    <-> SEQ0_255[T]
//! Seq064K    <-> SEQ0_64K[T]
//! Sv2Option  <-> OPTION[T]
//! ```
//!
//! All integers are little-endian. Variable length types are prefixed by their length, encoded
//! on 1 (`B032`, `B0255`, `Str0255`, `Seq0255`, `Sv2Option`), 2 (`B064K`, `Seq064K`) or 3
//! (`B016M`) bytes.
//!
//! # Encoding & Decoding
//!
//! - **to_bytes**: Encodes an SV2 data type into a byte vector.
//! - **to_writer**: Encodes an SV2 data type into a byte slice.
//! - **from_bytes**: Decodes an SV2-encoded byte slice into the specified data type.
//!
//! Protocol messages are plain structs whose fields are SV2 data types. The
//! [`impl_sv2_codec`] macro implements [`GetSize`], [`Encodable`] and [`Decodable`] for them by
//! encoding each field in declaration order.

#![no_std]

#[macro_use]
extern crate alloc;

mod codec;
mod datatypes;

pub use crate::codec::{Decodable, Encodable, GetSize};
pub use datatypes::{
    Seq0255, Seq064K, Str0255, Sv2Option, B016M, B0255, B032, B064K, U24, U256,
};

use alloc::vec::Vec;
use core::fmt;

/// Converts the provided SV2 data type to a byte vector based on the SV2 encoding format.
pub fn to_bytes<T: Encodable>(src: &T) -> Result<Vec<u8>, Error> {
    let mut result = vec![0_u8; src.get_size()];
    src.to_bytes(&mut result)?;
    Ok(result)
}

/// Encodes the SV2 data type to the provided byte slice.
pub fn to_writer<T: Encodable>(src: &T, dst: &mut [u8]) -> Result<(), Error> {
    src.to_bytes(dst)?;
    Ok(())
}

/// Decodes an SV2-encoded byte slice into the specified data type.
///
/// Bytes left over after the last field are ignored, the same way a receiver ignores fields
/// appended by protocol extensions it does not know about.
pub fn from_bytes<T: Decodable>(data: &[u8]) -> Result<T, Error> {
    let (value, _) = T::from_slice(data)?;
    Ok(value)
}

/// Error types used within the protocol library to indicate various failure conditions.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
    /// Indicates an attempt to read beyond a valid range.
    OutOfBound,

    /// Raised when a non-binary value is interpreted as a boolean.
    NotABool(u8),

    /// Occurs when an unexpected size mismatch arises during a write operation, specifying
    /// expected and actual sizes.
    WriteError(usize, usize),

    /// Raised when an unexpected mismatch occurs during read operations, specifying expected and
    /// actual read sizes.
    ReadError(usize, usize),

    /// Signifies an overflow condition where a `u32` exceeds the maximum allowable `u24` value.
    U24TooBig(u32),

    /// Raised when a `u256` value is invalid, typically due to size discrepancies.
    InvalidU256(usize),

    /// A variable length value is longer than what its length prefix can represent
    /// (`max`, `actual`).
    ValueExceedsMaxSize(usize, usize),

    /// Triggered when a sequence type (`Seq0255`, `Seq064K`) exceeds its maximum allowable size.
    SeqExceedsMaxSize(usize),

    /// Indicates a protocol constraint violation where `Sv2Option` unexpectedly contains multiple
    /// elements.
    Sv2OptionHaveMoreThenOneElement(u8),

    /// The protocol discriminant of a `SetupConnection` message is unknown.
    ValueIsNotAValidProtocol(u8),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Error::*;
        match self {
            OutOfBound => write!(f, "Read beyond the end of the buffer"),
            NotABool(v) => write!(f, "`{v}` is not a valid BOOL"),
            WriteError(expected, actual) => write!(
                f,
                "Write error: need `{expected}` bytes, destination has `{actual}`"
            ),
            ReadError(expected, actual) => {
                write!(f, "Read error: need `{expected}` bytes, got `{actual}`")
            }
            U24TooBig(v) => write!(f, "`{v}` does not fit in a U24"),
            InvalidU256(len) => write!(f, "U256 must be 32 bytes, got `{len}`"),
            ValueExceedsMaxSize(max, actual) => {
                write!(f, "Value of `{actual}` bytes exceeds the maximum of `{max}`")
            }
            SeqExceedsMaxSize(len) => write!(f, "Sequence of `{len}` elements is too long"),
            Sv2OptionHaveMoreThenOneElement(n) => {
                write!(f, "Sv2Option can hold at most one element, got `{n}`")
            }
            ValueIsNotAValidProtocol(v) => write!(f, "`{v}` is not a valid protocol"),
        }
    }
}

/// Implements [`GetSize`], [`Encodable`] and [`Decodable`] for a struct whose fields are all SV2
/// data types. Fields are (de)serialized in the order they are listed, which must match the order
/// defined by the protocol.
///
/// ```
/// use binary_sv2::{impl_sv2_codec, Str0255};
///
/// #[derive(Debug, Clone, PartialEq)]
/// pub struct Reconnect {
///     pub new_host: Str0255,
///     pub new_port: u16,
/// }
///
/// impl_sv2_codec!(Reconnect { new_host, new_port });
/// ```
#[macro_export]
macro_rules! impl_sv2_codec {
    ($name:ident { $($field:ident),* $(,)? }) => {
        impl $crate::GetSize for $name {
            fn get_size(&self) -> usize {
                0 $(+ $crate::GetSize::get_size(&self.$field))*
            }
        }

        impl $crate::Encodable for $name {
            #[allow(unused_mut, unused_variables)]
            fn to_bytes(&self, dst: &mut [u8]) -> ::core::result::Result<usize, $crate::Error> {
                let mut written = 0;
                $(
                    written += $crate::Encodable::to_bytes(&self.$field, &mut dst[written..])?;
                )*
                Ok(written)
            }
        }

        impl $crate::Decodable for $name {
            #[allow(unused_mut, unused_variables)]
            fn from_slice(src: &[u8]) -> ::core::result::Result<(Self, usize), $crate::Error> {
                let mut consumed = 0;
                $(
                    let ($field, used) = $crate::Decodable::from_slice(&src[consumed..])?;
                    consumed += used;
                )*
                Ok((Self { $($field),* }, consumed))
            }
        }
    };
}
