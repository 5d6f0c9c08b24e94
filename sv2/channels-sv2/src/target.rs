//! # Targets
//!
//! A [`Target`] is the 256 bits threshold a share hash must not exceed. On the wire targets are
//! [`binary_sv2::U256`] values in little-endian order, the same order used by block hashes.
//!
//! [`hash_rate_to_target`] computes the target to assign to a channel from its nominal hashrate
//! and the number of shares per minute the server expects from it.

use core::{fmt, ops::Div};

use binary_sv2::U256;
use bitcoin::{hash_types::BlockHash, hashes::Hash};
use primitive_types::U256 as U256Primitive;

/// Genesis block target, the target of difficulty 1 (big-endian).
const DIFFICULTY_1_TARGET: [u8; 32] = [
    0x00, 0x00, 0x00, 0x00, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

/// A 256 bits mining target, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Target(U256Primitive);

impl Target {
    /// The easiest possible target, `2^256 - 1`.
    pub const MAX: Target = Target(U256Primitive::MAX);

    pub fn from_le_bytes(bytes: [u8; 32]) -> Self {
        Self(U256Primitive::from_little_endian(&bytes))
    }

    pub fn from_be_bytes(bytes: [u8; 32]) -> Self {
        Self(U256Primitive::from_big_endian(&bytes))
    }

    pub fn to_le_bytes(&self) -> [u8; 32] {
        self.0.to_little_endian()
    }

    pub fn to_be_bytes(&self) -> [u8; 32] {
        self.0.to_big_endian()
    }
}

impl From<[u8; 32]> for Target {
    /// Reads the bytes as little-endian, as found in Sv2 messages.
    fn from(bytes: [u8; 32]) -> Self {
        Self::from_le_bytes(bytes)
    }
}

impl From<&U256> for Target {
    fn from(value: &U256) -> Self {
        Self::from_le_bytes(value.to_array())
    }
}

impl From<U256> for Target {
    fn from(value: U256) -> Self {
        Self::from(&value)
    }
}

impl From<Target> for U256 {
    fn from(target: Target) -> Self {
        target.to_le_bytes().into()
    }
}

impl fmt::Display for Target {
    /// Big-endian hex, the way targets and hashes are usually shown.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bytes_to_hex(&self.to_be_bytes()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetError {
    /// The hashrate is zero, negative, NaN or infinite.
    InvalidHashrate,
    /// The expected shares per minute are zero, negative, NaN or infinite.
    InvalidSharesPerMinute,
}

impl fmt::Display for TargetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetError::InvalidHashrate => write!(f, "Hashrate must be a positive finite number"),
            TargetError::InvalidSharesPerMinute => {
                write!(f, "Shares per minute must be a positive finite number")
            }
        }
    }
}

impl std::error::Error for TargetError {}

/// Converts a `Target` to a `f64` difficulty, relative to the difficulty 1 target.
pub fn target_to_difficulty(target: &Target) -> f64 {
    let max_target = U256Primitive::from_big_endian(&DIFFICULTY_1_TARGET);
    u256_to_f64(max_target) / u256_to_f64(target.0)
}

fn u256_to_f64(value: U256Primitive) -> f64 {
    let high = (value >> 128).low_u128() as f64;
    let low = value.low_u128() as f64;
    high * 2.0f64.powi(128) + low
}

/// Converts a `U256` to a [`BlockHash`].
pub fn u256_to_block_hash(v: &U256) -> BlockHash {
    BlockHash::from_byte_array(v.to_array())
}

/// Formats bytes as lowercase hex, useful to log targets.
pub fn bytes_to_hex(bytes: &[u8]) -> String {
    hex::encode(bytes)
}

/// Calculates the target of a channel from its hashrate (H/s) and the desired share frequency
/// (shares/min).
///
/// ## Formula
/// ```text
/// t = (2^256 - 1 - sh) / (sh + 1)
/// ```
///
/// Where:
/// - `h`: hashrate of the channel (H/s).
/// - `s`: seconds between two shares, `60 / shares_per_minute`.
/// - `sh`: `h * s`, the number of hashes computed between two shares.
///
/// On average a device has to compute `(2^256 - t) / (t + 1)` hashes before it finds one below
/// `t`, solving for `t` gives the formula above. A higher hashrate gives a lower (harder) target.
///
/// ```rust
/// use channels_sv2::target::{hash_rate_to_target, Target};
///
/// let slow = hash_rate_to_target(1_000.0, 6.0).unwrap();
/// let fast = hash_rate_to_target(1_000_000.0, 6.0).unwrap();
/// assert!(fast < slow);
/// assert!(slow < Target::MAX);
/// ```
pub fn hash_rate_to_target(hashrate: f64, share_per_min: f64) -> Result<Target, TargetError> {
    if !hashrate.is_finite() || hashrate <= 0.0 {
        return Err(TargetError::InvalidHashrate);
    }
    if !share_per_min.is_finite() || share_per_min <= 0.0 {
        return Err(TargetError::InvalidSharesPerMinute);
    }

    let seconds_between_shares = 60_f64 / share_per_min;
    // saturates at u128::MAX
    let h_times_s = U256Primitive::from((hashrate * seconds_between_shares) as u128);

    let numerator = U256Primitive::MAX - h_times_s;
    let denominator = h_times_s + U256Primitive::one();

    Ok(Target(numerator.div(denominator)))
}
