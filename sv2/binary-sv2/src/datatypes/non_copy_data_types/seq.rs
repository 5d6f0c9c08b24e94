// Sequences of SV2 values and the optional type.
//
// `Seq0255` and `Seq064K` are prefixed by the number of elements (1 and 2 bytes respectively).
// `Sv2Option` is encoded like a `Seq0255` holding zero or one element.

use crate::{
    codec::{check_dst, check_src, Decodable, Encodable, GetSize},
    Error,
};
use alloc::vec::Vec;
use core::convert::TryFrom;

macro_rules! impl_seq {
    ($name:ident, $header:expr, $max:expr) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash)]
        pub struct $name<T>(Vec<T>);

        impl<T> $name<T> {
            pub const MAX_LEN: usize = $max;

            pub fn new(inner: Vec<T>) -> Result<Self, Error> {
                if inner.len() > Self::MAX_LEN {
                    return Err(Error::SeqExceedsMaxSize(inner.len()));
                }
                Ok(Self(inner))
            }

            pub fn inner_as_ref(&self) -> &[T] {
                &self.0
            }

            pub fn into_inner(self) -> Vec<T> {
                self.0
            }

            pub fn len(&self) -> usize {
                self.0.len()
            }

            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }

            pub fn iter(&self) -> core::slice::Iter<'_, T> {
                self.0.iter()
            }
        }

        impl<T: Clone> $name<T> {
            pub fn to_vec(&self) -> Vec<T> {
                self.0.clone()
            }
        }

        impl<T> Default for $name<T> {
            fn default() -> Self {
                Self(Vec::new())
            }
        }

        impl<T> TryFrom<Vec<T>> for $name<T> {
            type Error = Error;

            fn try_from(value: Vec<T>) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl<T: GetSize> GetSize for $name<T> {
            fn get_size(&self) -> usize {
                $header + self.0.iter().map(|e| e.get_size()).sum::<usize>()
            }
        }

        impl<T: Encodable> Encodable for $name<T> {
            fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, Error> {
                if self.0.len() > Self::MAX_LEN {
                    return Err(Error::SeqExceedsMaxSize(self.0.len()));
                }
                check_dst(dst, $header)?;
                let header = (self.0.len() as u32).to_le_bytes();
                dst[..$header].copy_from_slice(&header[..$header]);
                let mut written = $header;
                for element in &self.0 {
                    written += element.to_bytes(&mut dst[written..])?;
                }
                Ok(written)
            }
        }

        impl<T: Decodable> Decodable for $name<T> {
            fn from_slice(src: &[u8]) -> Result<(Self, usize), Error> {
                check_src(src, $header)?;
                let mut header = [0_u8; 4];
                header[..$header].copy_from_slice(&src[..$header]);
                let len = u32::from_le_bytes(header) as usize;
                let mut inner = Vec::with_capacity(len);
                let mut consumed = $header;
                for _ in 0..len {
                    let (element, used) = T::from_slice(&src[consumed..])?;
                    consumed += used;
                    inner.push(element);
                }
                Ok((Self(inner), consumed))
            }
        }
    };
}

impl_seq!(Seq0255, 1, 255);
impl_seq!(Seq064K, 2, 65535);

/// Optional SV2 value: a one byte element count (0 or 1) followed by the element, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Sv2Option<T>(Option<T>);

impl<T> Sv2Option<T> {
    pub fn new(inner: Option<T>) -> Self {
        Self(inner)
    }

    pub fn into_inner(self) -> Option<T> {
        self.0
    }

    pub fn as_ref(&self) -> Option<&T> {
        self.0.as_ref()
    }
}

impl<T> Default for Sv2Option<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> From<Option<T>> for Sv2Option<T> {
    fn from(v: Option<T>) -> Self {
        Self(v)
    }
}

impl<T: GetSize> GetSize for Sv2Option<T> {
    fn get_size(&self) -> usize {
        1 + self.0.as_ref().map(|e| e.get_size()).unwrap_or(0)
    }
}

impl<T: Encodable> Encodable for Sv2Option<T> {
    fn to_bytes(&self, dst: &mut [u8]) -> Result<usize, Error> {
        check_dst(dst, 1)?;
        match &self.0 {
            None => {
                dst[0] = 0;
                Ok(1)
            }
            Some(element) => {
                dst[0] = 1;
                Ok(1 + element.to_bytes(&mut dst[1..])?)
            }
        }
    }
}

impl<T: Decodable> Decodable for Sv2Option<T> {
    fn from_slice(src: &[u8]) -> Result<(Self, usize), Error> {
        check_src(src, 1)?;
        match src[0] {
            0 => Ok((Self(None), 1)),
            1 => {
                let (element, used) = T::from_slice(&src[1..])?;
                Ok((Self(Some(element)), 1 + used))
            }
            n => Err(Error::Sv2OptionHaveMoreThenOneElement(n)),
        }
    }
}
