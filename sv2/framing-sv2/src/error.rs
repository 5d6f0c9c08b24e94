//! Errors of frame construction and conversion.

use core::fmt;

use crate::SV2_FRAME_HEADER_SIZE;

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    BinarySv2Error(binary_sv2::Error),
    /// Fewer bytes than a header, the value is the number of bytes available.
    UnexpectedHeaderLength(isize),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BinarySv2Error(e) => write!(f, "Failed to (de)serialize frame: {e}"),
            Self::UnexpectedHeaderLength(len) => write!(
                f,
                "Header needs {SV2_FRAME_HEADER_SIZE} bytes, only {len} available"
            ),
        }
    }
}

impl From<binary_sv2::Error> for Error {
    fn from(e: binary_sv2::Error) -> Self {
        Self::BinarySv2Error(e)
    }
}
