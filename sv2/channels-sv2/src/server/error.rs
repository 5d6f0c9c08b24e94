//! # Channel Error Types
//!
//! Errors raised while opening a channel are answered with an `OpenMiningChannel.Error`, see
//! [`ExtendedChannelError::as_error_code`] and [`StandardChannelError::as_error_code`]. The
//! connection stays open.
use std::{convert::TryInto, fmt};

use mining_sv2::OpenMiningChannelError;

use crate::{
    extranonce_prefix::ExtranoncePrefixFactoryError,
    server::jobs::error::{ExtendedJobError, JobFactoryError},
};

const INVALID_NOMINAL_HASHRATE: &str = "invalid-nominal-hashrate";
const MAX_TARGET_OUT_OF_RANGE: &str = "max-target-out-of-range";
const MIN_EXTRANONCE_SIZE_TOO_LARGE: &str = "min-extranonce-size-too-large";
const FAILED_TO_CREATE_CHANNEL: &str = "failed-to-create-channel";

fn open_mining_channel_error(request_id: u32, error_code: &str) -> OpenMiningChannelError {
    OpenMiningChannelError {
        request_id,
        error_code: error_code.try_into().unwrap_or_default(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtendedChannelError {
    JobFactoryError(JobFactoryError),
    ExtranoncePrefixFactoryError(ExtranoncePrefixFactoryError),
    /// Zero, negative or not finite.
    InvalidNominalHashrate,
    /// The target for the nominal hashrate is above the requested `max_target`.
    RequestedMaxTargetOutOfRange,
    RequestedMinExtranonceSizeTooLarge,
    FailedToCreateChannel,
    ChainTipNotSet,
    /// No future job was created for the template of a `SetNewPrevHash`.
    TemplateIdNotFound,
    JobIdNotFound,
    ExtranoncePrefixTooLarge,
    ScriptSigSizeTooLarge,
    /// A `SetCustomMiningJob` for another channel.
    InvalidJobOrigin,
}

impl ExtendedChannelError {
    pub fn as_error_code(&self) -> &'static str {
        match self {
            ExtendedChannelError::InvalidNominalHashrate => INVALID_NOMINAL_HASHRATE,
            ExtendedChannelError::RequestedMaxTargetOutOfRange => MAX_TARGET_OUT_OF_RANGE,
            ExtendedChannelError::RequestedMinExtranonceSizeTooLarge
            | ExtendedChannelError::ExtranoncePrefixFactoryError(
                ExtranoncePrefixFactoryError::RequestedMinExtranonceSizeTooLarge,
            ) => MIN_EXTRANONCE_SIZE_TOO_LARGE,
            _ => FAILED_TO_CREATE_CHANNEL,
        }
    }

    /// The `OpenMiningChannel.Error` answering the `request_id` that failed.
    pub fn to_open_mining_channel_error(&self, request_id: u32) -> OpenMiningChannelError {
        open_mining_channel_error(request_id, self.as_error_code())
    }
}

impl fmt::Display for ExtendedChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JobFactoryError(e) => write!(f, "Job factory error: {}", e),
            Self::ExtranoncePrefixFactoryError(e) => write!(f, "Extranonce prefix error: {}", e),
            Self::InvalidNominalHashrate => write!(f, "Invalid nominal hashrate"),
            Self::RequestedMaxTargetOutOfRange => write!(f, "Requested max target out of range"),
            Self::RequestedMinExtranonceSizeTooLarge => {
                write!(f, "Requested min extranonce size too large")
            }
            Self::FailedToCreateChannel => write!(f, "Failed to create channel"),
            Self::ChainTipNotSet => write!(f, "Chain tip not set"),
            Self::TemplateIdNotFound => write!(f, "No future job for template id"),
            Self::JobIdNotFound => write!(f, "Job id not found"),
            Self::ExtranoncePrefixTooLarge => write!(f, "Extranonce prefix too large"),
            Self::ScriptSigSizeTooLarge => write!(f, "Coinbase scriptSig too large"),
            Self::InvalidJobOrigin => write!(f, "Custom job is for another channel"),
        }
    }
}

impl std::error::Error for ExtendedChannelError {}

impl From<JobFactoryError> for ExtendedChannelError {
    fn from(e: JobFactoryError) -> Self {
        match e {
            JobFactoryError::ScriptSigTooLarge(_) => ExtendedChannelError::ScriptSigSizeTooLarge,
            JobFactoryError::ChainTipRequired => ExtendedChannelError::ChainTipNotSet,
            e => ExtendedChannelError::JobFactoryError(e),
        }
    }
}

impl From<ExtranoncePrefixFactoryError> for ExtendedChannelError {
    fn from(e: ExtranoncePrefixFactoryError) -> Self {
        match e {
            ExtranoncePrefixFactoryError::RequestedMinExtranonceSizeTooLarge => {
                ExtendedChannelError::RequestedMinExtranonceSizeTooLarge
            }
            e => ExtendedChannelError::ExtranoncePrefixFactoryError(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StandardChannelError {
    JobFactoryError(JobFactoryError),
    ExtranoncePrefixFactoryError(ExtranoncePrefixFactoryError),
    InvalidNominalHashrate,
    RequestedMaxTargetOutOfRange,
    FailedToCreateChannel,
    ChainTipNotSet,
    TemplateIdNotFound,
    /// Standard channels need exactly 32 bytes of extranonce prefix.
    InvalidExtranoncePrefixLength,
    ScriptSigSizeTooLarge,
    FailedToConvertToStandardJob(ExtendedJobError),
}

impl StandardChannelError {
    pub fn as_error_code(&self) -> &'static str {
        match self {
            StandardChannelError::InvalidNominalHashrate => INVALID_NOMINAL_HASHRATE,
            StandardChannelError::RequestedMaxTargetOutOfRange => MAX_TARGET_OUT_OF_RANGE,
            _ => FAILED_TO_CREATE_CHANNEL,
        }
    }

    pub fn to_open_mining_channel_error(&self, request_id: u32) -> OpenMiningChannelError {
        open_mining_channel_error(request_id, self.as_error_code())
    }
}

impl fmt::Display for StandardChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JobFactoryError(e) => write!(f, "Job factory error: {}", e),
            Self::ExtranoncePrefixFactoryError(e) => write!(f, "Extranonce prefix error: {}", e),
            Self::InvalidNominalHashrate => write!(f, "Invalid nominal hashrate"),
            Self::RequestedMaxTargetOutOfRange => write!(f, "Requested max target out of range"),
            Self::FailedToCreateChannel => write!(f, "Failed to create channel"),
            Self::ChainTipNotSet => write!(f, "Chain tip not set"),
            Self::TemplateIdNotFound => write!(f, "No future job for template id"),
            Self::InvalidExtranoncePrefixLength => {
                write!(f, "Extranonce prefix must be 32 bytes")
            }
            Self::ScriptSigSizeTooLarge => write!(f, "Coinbase scriptSig too large"),
            Self::FailedToConvertToStandardJob(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for StandardChannelError {}

impl From<JobFactoryError> for StandardChannelError {
    fn from(e: JobFactoryError) -> Self {
        match e {
            JobFactoryError::ScriptSigTooLarge(_) => StandardChannelError::ScriptSigSizeTooLarge,
            JobFactoryError::ChainTipRequired => StandardChannelError::ChainTipNotSet,
            e => StandardChannelError::JobFactoryError(e),
        }
    }
}

impl From<ExtranoncePrefixFactoryError> for StandardChannelError {
    fn from(e: ExtranoncePrefixFactoryError) -> Self {
        StandardChannelError::ExtranoncePrefixFactoryError(e)
    }
}

impl From<ExtendedJobError> for StandardChannelError {
    fn from(e: ExtendedJobError) -> Self {
        StandardChannelError::FailedToConvertToStandardJob(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupChannelError {
    ChainTipNotSet,
    TemplateIdNotFound,
    JobFactoryError(JobFactoryError),
    ScriptSigSizeTooLarge,
    /// More members than a `SetGroupChannel` can list.
    TooManyStandardChannels,
}

impl fmt::Display for GroupChannelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupChannelError::ChainTipNotSet => write!(f, "Chain tip not set"),
            GroupChannelError::TemplateIdNotFound => write!(f, "No future job for template id"),
            GroupChannelError::JobFactoryError(e) => write!(f, "Job factory error: {}", e),
            GroupChannelError::ScriptSigSizeTooLarge => write!(f, "Coinbase scriptSig too large"),
            GroupChannelError::TooManyStandardChannels => {
                write!(f, "Too many standard channels in group")
            }
        }
    }
}

impl std::error::Error for GroupChannelError {}

impl From<JobFactoryError> for GroupChannelError {
    fn from(e: JobFactoryError) -> Self {
        match e {
            JobFactoryError::ScriptSigTooLarge(_) => GroupChannelError::ScriptSigSizeTooLarge,
            JobFactoryError::ChainTipRequired => GroupChannelError::ChainTipNotSet,
            e => GroupChannelError::JobFactoryError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes() {
        assert_eq!(
            ExtendedChannelError::InvalidNominalHashrate.as_error_code(),
            "invalid-nominal-hashrate"
        );
        assert_eq!(
            ExtendedChannelError::RequestedMaxTargetOutOfRange.as_error_code(),
            "max-target-out-of-range"
        );
        assert_eq!(
            ExtendedChannelError::from(
                ExtranoncePrefixFactoryError::RequestedMinExtranonceSizeTooLarge
            )
            .as_error_code(),
            "min-extranonce-size-too-large"
        );
        assert_eq!(
            ExtendedChannelError::FailedToCreateChannel.as_error_code(),
            "failed-to-create-channel"
        );
        assert_eq!(
            StandardChannelError::InvalidExtranoncePrefixLength.as_error_code(),
            "failed-to-create-channel"
        );
    }

    #[test]
    fn open_mining_channel_error_message() {
        let message = StandardChannelError::InvalidNominalHashrate.to_open_mining_channel_error(7);
        assert_eq!(message.request_id, 7);
        assert_eq!(
            message.error_code.as_utf8().unwrap(),
            "invalid-nominal-hashrate"
        );
    }

    #[test]
    fn script_sig_errors_are_surfaced() {
        assert_eq!(
            GroupChannelError::from(JobFactoryError::ScriptSigTooLarge(101)),
            GroupChannelError::ScriptSigSizeTooLarge
        );
        assert_eq!(
            StandardChannelError::from(JobFactoryError::ChainTipRequired),
            StandardChannelError::ChainTipNotSet
        );
    }
}
