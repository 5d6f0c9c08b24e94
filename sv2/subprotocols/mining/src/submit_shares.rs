use binary_sv2::{impl_sv2_codec, Str0255, B032};
use core::convert::TryFrom;

/// Message used by downstream to send result of its hashing work to an upstream.
///
/// The upstream answers with [`SubmitSharesSuccess`] (possibly aggregated over several
/// submissions) or [`SubmitSharesError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitSharesStandard {
    /// Channel identification.
    pub channel_id: u32,
    /// Unique sequential identifier of the submit within the channel.
    pub sequence_number: u32,
    /// Identifier of the job as provided by [`crate::NewMiningJob`] or
    /// [`crate::NewExtendedMiningJob`] message.
    pub job_id: u32,
    /// Nonce leading to the hash being submitted.
    pub nonce: u32,
    /// The nTime field in the block header. This must be greater than or equal to the
    /// `header_timestamp` field in the latest `SetNewPrevHash` message and lower than or equal
    /// to that value plus the number of seconds since the receipt of that message.
    pub ntime: u32,
    /// Full nVersion field.
    pub version: u32,
}

impl_sv2_codec!(SubmitSharesStandard {
    channel_id,
    sequence_number,
    job_id,
    nonce,
    ntime,
    version
});

/// Message used by downstream to send result of its hashing work to an upstream through an
/// Extended Channel.
///
/// Only differs from [`SubmitSharesStandard`] by the `extranonce` field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSharesExtended {
    pub channel_id: u32,
    pub sequence_number: u32,
    pub job_id: u32,
    pub nonce: u32,
    pub ntime: u32,
    pub version: u32,
    /// Extranonce bytes which need to be added to the coinbase to form a fully valid submission.
    ///
    /// Its size must match the extranonce size negotiated for the channel. The full coinbase is
    /// `coinbase_tx_prefix + extranonce_prefix + extranonce + coinbase_tx_suffix`.
    pub extranonce: B032,
}

impl_sv2_codec!(SubmitSharesExtended {
    channel_id,
    sequence_number,
    job_id,
    nonce,
    ntime,
    version,
    extranonce
});

/// Message used by upstream to accept [`SubmitSharesStandard`] or [`SubmitSharesExtended`].
///
/// The upstream doesn’t have to double check that the sequence numbers sent by a downstream are
/// actually increasing. It can simply use the last one received when sending a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitSharesSuccess {
    /// Channel identifier.
    pub channel_id: u32,
    /// Most recent sequence number with a correct result.
    pub last_sequence_number: u32,
    /// Count of new submits acknowledged within this batch.
    pub new_submits_accepted_count: u32,
    /// Sum of shares acknowledged within this batch.
    pub new_shares_sum: u64,
}

impl_sv2_codec!(SubmitSharesSuccess {
    channel_id,
    last_sequence_number,
    new_submits_accepted_count,
    new_shares_sum
});

/// Message used by upstream to reject [`SubmitSharesStandard`] or [`SubmitSharesExtended`].
///
/// An error is immediately submitted for every incorrect submit attempt. Possible error codes:
/// * `invalid-channel-id`
/// * `stale-share`
/// * `difficulty-too-low`
/// * `invalid-job-id`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSharesError {
    pub channel_id: u32,
    pub sequence_number: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(SubmitSharesError {
    channel_id,
    sequence_number,
    error_code
});

impl SubmitSharesError {
    pub fn new(channel_id: u32, sequence_number: u32, error_code: &str) -> Self {
        Self {
            channel_id,
            sequence_number,
            error_code: Str0255::try_from(error_code).unwrap_or_default(),
        }
    }
    pub fn invalid_channel_error_code() -> &'static str {
        "invalid-channel-id"
    }
    pub fn stale_share_error_code() -> &'static str {
        "stale-share"
    }
    pub fn difficulty_too_low_error_code() -> &'static str {
        "difficulty-too-low"
    }
    pub fn invalid_job_id_error_code() -> &'static str {
        "invalid-job-id"
    }
}
