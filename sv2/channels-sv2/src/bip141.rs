//! Strips the bip141 marker, flag and witness data from a `coinbase_tx_prefix` and
//! `coinbase_tx_suffix` pair.
//!
//! Jobs sent downstream carry the coinbase in its legacy serialization, so that hashing
//! `prefix || extranonce || suffix` gives the `txid` needed for the merkle root.
use std::fmt;

const MARKER_FLAG_OFFSET: usize = 4;
const MARKER_FLAG: [u8; 2] = [0x00, 0x01];
const WITNESS_COUNT: u8 = 1;
const WITNESS_DATA_LEN: usize = 32;
const LOCKTIME_LEN: usize = 4;
// witness count, witness length and the witness reserved value
const WITNESS_LEN: usize = 1 + 1 + WITNESS_DATA_LEN;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StripBip141Error {
    /// The prefix is too short to hold a version and the marker.
    CoinbaseTxPrefixTooShort,
    /// The suffix does not end with a single 32 bytes witness followed by the locktime.
    UnexpectedWitness,
}

impl fmt::Display for StripBip141Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StripBip141Error::CoinbaseTxPrefixTooShort => write!(f, "Coinbase prefix too short"),
            StripBip141Error::UnexpectedWitness => {
                write!(f, "Coinbase witness is not a single 32 bytes item")
            }
        }
    }
}

impl std::error::Error for StripBip141Error {}

/// Returns `Ok(None)` when the coinbase is already stripped, otherwise the stripped
/// `(coinbase_tx_prefix, coinbase_tx_suffix)`.
///
/// A coinbase has exactly one input, so a `0x00` where the input count should be can only be the
/// bip141 marker.
#[allow(clippy::type_complexity)]
pub fn try_strip_bip141(
    coinbase_tx_prefix: &[u8],
    coinbase_tx_suffix: &[u8],
) -> Result<Option<(Vec<u8>, Vec<u8>)>, StripBip141Error> {
    if coinbase_tx_prefix.len() < MARKER_FLAG_OFFSET + MARKER_FLAG.len() {
        return Err(StripBip141Error::CoinbaseTxPrefixTooShort);
    }
    if coinbase_tx_prefix[MARKER_FLAG_OFFSET..MARKER_FLAG_OFFSET + MARKER_FLAG.len()] != MARKER_FLAG
    {
        return Ok(None);
    }

    if coinbase_tx_suffix.len() < WITNESS_LEN + LOCKTIME_LEN {
        return Err(StripBip141Error::UnexpectedWitness);
    }
    let locktime_position = coinbase_tx_suffix.len() - LOCKTIME_LEN;
    let witness_position = locktime_position - WITNESS_LEN;
    if coinbase_tx_suffix[witness_position] != WITNESS_COUNT
        || coinbase_tx_suffix[witness_position + 1] as usize != WITNESS_DATA_LEN
    {
        return Err(StripBip141Error::UnexpectedWitness);
    }

    let mut prefix = coinbase_tx_prefix[..MARKER_FLAG_OFFSET].to_vec();
    prefix.extend_from_slice(&coinbase_tx_prefix[MARKER_FLAG_OFFSET + MARKER_FLAG.len()..]);

    let mut suffix = coinbase_tx_suffix[..witness_position].to_vec();
    suffix.extend_from_slice(&coinbase_tx_suffix[locktime_position..]);

    Ok(Some((prefix, suffix)))
}
