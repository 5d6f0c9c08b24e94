//! # Job Error Types
use std::fmt;

use crate::{bip141::StripBip141Error, outputs::OutputsDeserializationError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedJobError {
    FailedToCalculateMerkleRoot,
    /// Only jobs built from a template can be sent on standard channels.
    FailedToConvertToStandardJob,
}

impl fmt::Display for ExtendedJobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedJobError::FailedToCalculateMerkleRoot => {
                write!(f, "Failed to calculate merkle root")
            }
            ExtendedJobError::FailedToConvertToStandardJob => {
                write!(f, "Only template jobs can be converted to standard jobs")
            }
        }
    }
}

impl std::error::Error for ExtendedJobError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobFactoryError {
    FailedToStripBip141(StripBip141Error),
    FailedToSerializeCoinbaseOutputs,
    DeserializeCoinbaseOutputsError(OutputsDeserializationError),
    /// The pool tag does not fit in the scriptSig.
    CoinbaseTxPrefixError,
    CoinbaseTxSuffixError,
    /// The scriptSig exceeds the 100 bytes consensus limit.
    ScriptSigTooLarge(usize),
    CoinbaseOutputsSumOverflow,
    /// The reward outputs do not spend exactly the value left by the template.
    InvalidCoinbaseOutputsSum { expected: u64, actual: u64 },
    FailedToCalculateMerkleRoot,
    /// Non-future templates need a chain tip.
    ChainTipRequired,
}

impl fmt::Display for JobFactoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use JobFactoryError::*;
        match self {
            FailedToStripBip141(e) => write!(f, "Failed to strip bip141 data: {}", e),
            FailedToSerializeCoinbaseOutputs => write!(f, "Failed to serialize coinbase outputs"),
            DeserializeCoinbaseOutputsError(e) => write!(f, "{}", e),
            CoinbaseTxPrefixError => write!(f, "Invalid coinbase tx prefix"),
            CoinbaseTxSuffixError => write!(f, "Invalid coinbase tx suffix"),
            ScriptSigTooLarge(len) => write!(f, "Coinbase scriptSig of {} bytes is too large", len),
            CoinbaseOutputsSumOverflow => write!(f, "Coinbase outputs sum overflows"),
            InvalidCoinbaseOutputsSum { expected, actual } => write!(
                f,
                "Coinbase reward outputs sum to {} sats, template has {} sats",
                actual, expected
            ),
            FailedToCalculateMerkleRoot => write!(f, "Failed to calculate merkle root"),
            ChainTipRequired => write!(f, "A chain tip is required for non-future jobs"),
        }
    }
}

impl std::error::Error for JobFactoryError {}

impl From<StripBip141Error> for JobFactoryError {
    fn from(e: StripBip141Error) -> Self {
        JobFactoryError::FailedToStripBip141(e)
    }
}

impl From<OutputsDeserializationError> for JobFactoryError {
    fn from(e: OutputsDeserializationError) -> Self {
        JobFactoryError::DeserializeCoinbaseOutputsError(e)
    }
}
