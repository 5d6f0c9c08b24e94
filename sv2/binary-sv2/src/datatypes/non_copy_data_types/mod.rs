mod inner;
mod seq;

pub use inner::Inner;
pub use seq::{Seq0255, Seq064K, Sv2Option};

/// 32-byte unsigned integer, used for hashes and targets (little-endian).
pub type U256 = Inner<true, 32, 0, 32>;
/// Byte array of at most 32 bytes with a 1-byte length prefix.
pub type B032 = Inner<false, 1, 1, 32>;
/// Byte array of at most 255 bytes with a 1-byte length prefix.
pub type B0255 = Inner<false, 1, 1, 255>;
/// String of at most 255 bytes, encoded like [`B0255`].
pub type Str0255 = Inner<false, 1, 1, 255>;
/// Byte array of at most 65535 bytes with a 2-byte length prefix.
pub type B064K = Inner<false, 1, 2, 65535>;
/// Byte array of at most 2^24 - 1 bytes with a 3-byte length prefix.
pub type B016M = Inner<false, 1, 3, 16_777_215>;
