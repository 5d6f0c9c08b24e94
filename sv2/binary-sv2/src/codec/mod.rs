// Core traits of the SV2 binary format and their implementations for the primitive types.
//
// `GetSize` reports the encoded size of a value, `Encodable` writes the value into a byte slice
// and `Decodable` reads a value from the front of a byte slice, returning how many bytes it
// consumed so that structs can decode their fields one after the other.

use crate::Error;
use core::convert::TryInto;

/// Returns the size of the encoded value in bytes.
pub trait GetSize {
    fn get_size(&self) -> usize;
}

/// The `Encodable` trait defines the interface for encoding a type into bytes.
pub trait Encodable: GetSize {
    /// Encodes the object into the provided byte slice.
    ///
    /// Returns the number of bytes written or an [`Error`] if `dst` is too small or the value
    /// does not respect the protocol limits of its type.
    #[allow(clippy::wrong_self_convention)]
    fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, Error>;
}

/// The `Decodable` trait defines the interface for decoding a type from bytes.
pub trait Decodable: Sized {
    /// Decodes a value from the start of `src`, returning it together with the number of bytes
    /// consumed.
    fn from_slice(src: &[u8]) -> Result<(Self, usize), Error>;
}

#[inline]
pub(crate) fn check_dst(dst: &[u8], size: usize) -> Result<(), Error> {
    if dst.len() < size {
        Err(Error::WriteError(size, dst.len()))
    } else {
        Ok(())
    }
}

#[inline]
pub(crate) fn check_src(src: &[u8], size: usize) -> Result<(), Error> {
    if src.len() < size {
        Err(Error::OutOfBound)
    } else {
        Ok(())
    }
}

macro_rules! impl_le_primitive {
    ($t:ty, $size:expr) => {
        impl GetSize for $t {
            #[inline]
            fn get_size(&self) -> usize {
                $size
            }
        }

        impl Encodable for $t {
            #[inline]
            fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, Error> {
                check_dst(dst, $size)?;
                dst[..$size].copy_from_slice(&self.to_le_bytes());
                Ok($size)
            }
        }

        impl Decodable for $t {
            #[inline]
            fn from_slice(src: &[u8]) -> Result<(Self, usize), Error> {
                check_src(src, $size)?;
                let bytes: [u8; $size] = src[..$size]
                    .try_into()
                    .map_err(|_| Error::ReadError($size, src.len()))?;
                Ok((<$t>::from_le_bytes(bytes), $size))
            }
        }
    };
}

impl_le_primitive!(u8, 1);
impl_le_primitive!(u16, 2);
impl_le_primitive!(u32, 4);
impl_le_primitive!(u64, 8);
impl_le_primitive!(f32, 4);

impl GetSize for bool {
    fn get_size(&self) -> usize {
        1
    }
}

impl Encodable for bool {
    fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, Error> {
        check_dst(dst, 1)?;
        dst[0] = *self as u8;
        Ok(1)
    }
}

impl Decodable for bool {
    fn from_slice(src: &[u8]) -> Result<(Self, usize), Error> {
        check_src(src, 1)?;
        match src[0] {
            0 => Ok((false, 1)),
            1 => Ok((true, 1)),
            v => Err(Error::NotABool(v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck_macros::quickcheck;

    #[test]
    fn integers_are_little_endian() {
        let mut dst = [0_u8; 4];
        assert_eq!(0x0403_0201_u32.to_bytes(&mut dst), Ok(4));
        assert_eq!(dst, [1, 2, 3, 4]);
        assert_eq!(u16::from_slice(&[0xff, 0x01]), Ok((0x01ff, 2)));
    }

    #[test]
    fn short_destination_is_a_write_error() {
        let mut dst = [0_u8; 3];
        assert_eq!(7_u64.to_bytes(&mut dst), Err(Error::WriteError(8, 3)));
    }

    #[test]
    fn short_source_is_out_of_bound() {
        assert_eq!(u32::from_slice(&[1, 2]), Err(Error::OutOfBound));
    }

    #[test]
    fn bool_rejects_values_other_than_zero_and_one() {
        assert_eq!(bool::from_slice(&[1]), Ok((true, 1)));
        assert_eq!(bool::from_slice(&[2]), Err(Error::NotABool(2)));
    }

    #[quickcheck]
    fn f32_keeps_its_bits(v: f32) -> bool {
        let mut dst = [0_u8; 4];
        v.to_bytes(&mut dst).unwrap();
        let (decoded, _) = f32::from_slice(&dst).unwrap();
        decoded.to_bits() == v.to_bits()
    }
}
