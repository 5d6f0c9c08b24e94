use binary_sv2::{impl_sv2_codec, Seq064K, Str0255, B0255, B064K, U256};

/// Message used by JDC to propose to JDS the set of transactions it wishes to mine on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclareMiningJob {
    /// A unique identifier for pairing the response/request.
    pub request_id: u32,
    /// Token received previously through [`crate::AllocateMiningJobTokenSuccess`].
    pub mining_job_token: B0255,
    /// Header version field.
    pub version: u32,
    /// Serialized coinbase up to the extranonce.
    pub coinbase_tx_prefix: B064K,
    /// Serialized coinbase after the extranonce.
    pub coinbase_tx_suffix: B064K,
    /// Transactions of the job, in block order and without the coinbase, by wtxid.
    pub wtxid_list: Seq064K<U256>,
    /// Extra data which the JDS may require to validate the work.
    pub excess_data: B064K,
}

impl_sv2_codec!(DeclareMiningJob {
    request_id,
    mining_job_token,
    version,
    coinbase_tx_prefix,
    coinbase_tx_suffix,
    wtxid_list,
    excess_data
});

/// Message used by JDS to accept a [`DeclareMiningJob`] message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclareMiningJobSuccess {
    /// Must be the same as the received [`DeclareMiningJob::request_id`].
    pub request_id: u32,
    /// May be the declared token. When it differs, the JDC must send a `SetCustomMiningJob` on
    /// every connection that mines the declared job.
    pub new_mining_job_token: B0255,
}

impl_sv2_codec!(DeclareMiningJobSuccess {
    request_id,
    new_mining_job_token
});

/// Message used by JDS to reject a [`DeclareMiningJob`] message.
///
/// The JDC should fall back to another pool, another JDS, or solo mining.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclareMiningJobError {
    /// Must be the same as the received [`DeclareMiningJob::request_id`].
    pub request_id: u32,
    /// `invalid-mining-job-token` or `invalid-job-param-value-{field}`.
    pub error_code: Str0255,
    /// Optional details about the error.
    pub error_details: B064K,
}

impl_sv2_codec!(DeclareMiningJobError {
    request_id,
    error_code,
    error_details
});
