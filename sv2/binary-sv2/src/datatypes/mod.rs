// SV2 data types that do not map directly onto a Rust primitive.
//
// `U24` is a copy type wrapping a `u32` that is known to fit in 24 bits. Every other type is an
// owned container: byte arrays and strings share the const-generic `Inner`, sequences and the
// optional type live in `non_copy_data_types::seq`.

mod non_copy_data_types;

pub use non_copy_data_types::{
    Seq0255, Seq064K, Str0255, Sv2Option, B016M, B0255, B032, B064K, U256,
};

use crate::{
    codec::{check_dst, check_src, Decodable, Encodable, GetSize},
    Error,
};
use core::convert::TryFrom;

/// Unsigned 24-bit integer, encoded on 3 little-endian bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U24(u32);

impl U24 {
    pub const SIZE: usize = 3;
    pub const MAX: u32 = 16_777_215;
}

impl TryFrom<u32> for U24 {
    type Error = Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value <= Self::MAX {
            Ok(Self(value))
        } else {
            Err(Error::U24TooBig(value))
        }
    }
}

impl TryFrom<usize> for U24 {
    type Error = Error;

    fn try_from(value: usize) -> Result<Self, Self::Error> {
        let value = u32::try_from(value).map_err(|_| Error::U24TooBig(u32::MAX))?;
        Self::try_from(value)
    }
}

impl From<U24> for u32 {
    fn from(v: U24) -> Self {
        v.0
    }
}

impl From<U24> for usize {
    fn from(v: U24) -> Self {
        v.0 as usize
    }
}

impl GetSize for U24 {
    fn get_size(&self) -> usize {
        Self::SIZE
    }
}

impl Encodable for U24 {
    fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, Error> {
        check_dst(dst, Self::SIZE)?;
        dst[..Self::SIZE].copy_from_slice(&self.0.to_le_bytes()[..Self::SIZE]);
        Ok(Self::SIZE)
    }
}

impl Decodable for U24 {
    fn from_slice(src: &[u8]) -> Result<(Self, usize), Error> {
        check_src(src, Self::SIZE)?;
        let value = u32::from_le_bytes([src[0], src[1], src[2], 0]);
        Ok((Self(value), Self::SIZE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn u24_rejects_values_above_max() {
        assert!(U24::try_from(U24::MAX).is_ok());
        assert_eq!(U24::try_from(U24::MAX + 1), Err(Error::U24TooBig(U24::MAX + 1)));
    }

    #[quickcheck]
    fn u24_uses_three_little_endian_bytes(v: u32) -> bool {
        let v = v % (U24::MAX + 1);
        let mut dst = [0_u8; 3];
        U24::try_from(v).unwrap().to_bytes(&mut dst).unwrap();
        let expected = v.to_le_bytes();
        dst == expected[..3] && U24::from_slice(&dst).map(|(d, _)| u32::from(d)) == Ok(v)
    }
}
