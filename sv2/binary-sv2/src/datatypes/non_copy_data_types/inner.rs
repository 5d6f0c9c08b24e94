// Owned container for the SV2 byte array types.
//
// The const parameters describe the encoding:
//  - `ISFIXED`: whether the value always has `SIZE` bytes (no length prefix).
//  - `SIZE`: the size of the value when `ISFIXED` is true.
//  - `HEADERSIZE`: the number of bytes of the little-endian length prefix.
//  - `MAXSIZE`: the maximum number of bytes the value can hold.
//
// Every constructor validates the length, so an `Inner` always respects its limits.

use crate::{
    codec::{check_dst, check_src, Decodable, Encodable, GetSize},
    Error,
};
use alloc::{string::String, vec::Vec};
use core::convert::TryFrom;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Inner<
    const ISFIXED: bool,
    const SIZE: usize,
    const HEADERSIZE: usize,
    const MAXSIZE: usize,
>(Vec<u8>);

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize>
    Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    fn check_len(len: usize) -> Result<(), Error> {
        if ISFIXED && len != SIZE {
            return Err(Error::InvalidU256(len));
        }
        if len > MAXSIZE {
            return Err(Error::ValueExceedsMaxSize(MAXSIZE, len));
        }
        Ok(())
    }

    /// Returns the bytes held by the value, without the length prefix.
    pub fn inner_as_ref(&self) -> &[u8] {
        &self.0
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.0.clone()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Interprets the bytes as UTF-8, as recommended for `Str0255` fields.
    pub fn as_utf8(&self) -> Option<&str> {
        core::str::from_utf8(&self.0).ok()
    }
}

impl Inner<true, 32, 0, 32> {
    pub fn to_array(&self) -> [u8; 32] {
        let mut out = [0_u8; 32];
        out.copy_from_slice(&self.0[..32]);
        out
    }
}

impl From<[u8; 32]> for Inner<true, 32, 0, 32> {
    fn from(v: [u8; 32]) -> Self {
        Self(v.to_vec())
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize> Default
    for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    fn default() -> Self {
        if ISFIXED {
            Self(vec![0; SIZE])
        } else {
            Self(Vec::new())
        }
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize>
    TryFrom<Vec<u8>> for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    type Error = Error;

    fn try_from(value: Vec<u8>) -> Result<Self, Self::Error> {
        Self::check_len(value.len())?;
        Ok(Self(value))
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize>
    TryFrom<&[u8]> for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from(value.to_vec())
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize>
    TryFrom<String> for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.into_bytes())
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize>
    TryFrom<&str> for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::try_from(value.as_bytes().to_vec())
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize>
    AsRef<[u8]> for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize> GetSize
    for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    fn get_size(&self) -> usize {
        HEADERSIZE + self.0.len()
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize>
    Encodable for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, Error> {
        let len = self.0.len();
        Self::check_len(len)?;
        let size = HEADERSIZE + len;
        check_dst(dst, size)?;
        let header = (len as u32).to_le_bytes();
        dst[..HEADERSIZE].copy_from_slice(&header[..HEADERSIZE]);
        dst[HEADERSIZE..size].copy_from_slice(&self.0);
        Ok(size)
    }
}

impl<const ISFIXED: bool, const SIZE: usize, const HEADERSIZE: usize, const MAXSIZE: usize>
    Decodable for Inner<ISFIXED, SIZE, HEADERSIZE, MAXSIZE>
{
    fn from_slice(src: &[u8]) -> Result<(Self, usize), Error> {
        let len = if ISFIXED {
            SIZE
        } else {
            check_src(src, HEADERSIZE)?;
            let mut header = [0_u8; 4];
            header[..HEADERSIZE].copy_from_slice(&src[..HEADERSIZE]);
            u32::from_le_bytes(header) as usize
        };
        Self::check_len(len)?;
        let size = HEADERSIZE + len;
        check_src(src, size)?;
        Ok((Self(src[HEADERSIZE..size].to_vec()), size))
    }
}
