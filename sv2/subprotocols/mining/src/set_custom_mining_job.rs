use binary_sv2::{impl_sv2_codec, Seq0255, Str0255, B0255, B064K, U256};

/// Message used by downstream to set a custom job to an upstream (usually a pool).
///
/// Can be sent only on an extended channel, and `SetupConnection.flags` must contain the
/// `REQUIRES_WORK_SELECTION` flag. The `mining_job_token` lets the upstream authorize the job
/// that has been negotiated with a Job Declarator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCustomMiningJob {
    /// Extended channel identifier.
    pub channel_id: u32,
    /// Downstream-specified identifier for pairing responses.
    pub request_id: u32,
    /// Token provided by the Job Declarator, authorizing the job.
    pub mining_job_token: B0255,
    /// Valid version field that reflects the current network consensus.
    pub version: u32,
    /// Previous block’s hash, found in the block header field.
    pub prev_hash: U256,
    /// Smallest nTime value available for hashing.
    pub min_ntime: u32,
    /// Block header field.
    pub nbits: u32,
    /// The coinbase transaction nVersion field.
    pub coinbase_tx_version: u32,
    /// Up to 8 bytes (not including the length byte) which are to be placed at the beginning of
    /// the coinbase field in the coinbase transaction.
    pub coinbase_prefix: B0255,
    /// The coinbase transaction input’s nSequence field.
    pub coinbase_tx_input_nsequence: u32,
    /// Consensus-serialized outputs of the coinbase transaction, without the outputs count.
    pub coinbase_tx_outputs: B064K,
    /// The `locktime` field in the coinbase transaction.
    pub coinbase_tx_locktime: u32,
    /// Merkle path hashes ordered from deepest.
    pub merkle_path: Seq0255<U256>,
}

impl_sv2_codec!(SetCustomMiningJob {
    channel_id,
    request_id,
    mining_job_token,
    version,
    prev_hash,
    min_ntime,
    nbits,
    coinbase_tx_version,
    coinbase_prefix,
    coinbase_tx_input_nsequence,
    coinbase_tx_outputs,
    coinbase_tx_locktime,
    merkle_path
});

/// Message used by upstream to accept [`SetCustomMiningJob`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetCustomMiningJobSuccess {
    pub channel_id: u32,
    pub request_id: u32,
    /// Upstream’s identification of the mining job, used by the downstream when submitting
    /// shares.
    pub job_id: u32,
}

impl_sv2_codec!(SetCustomMiningJobSuccess {
    channel_id,
    request_id,
    job_id
});

/// Message used by upstream to reject [`SetCustomMiningJob`] request.
///
/// Possible error codes: `invalid-channel-id`, `invalid-mining-job-token`,
/// `invalid-job-param-value-{field_name}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetCustomMiningJobError {
    pub channel_id: u32,
    pub request_id: u32,
    pub error_code: Str0255,
}

impl_sv2_codec!(SetCustomMiningJobError {
    channel_id,
    request_id,
    error_code
});
