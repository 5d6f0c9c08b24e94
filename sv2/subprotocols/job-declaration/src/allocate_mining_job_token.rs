use binary_sv2::{impl_sv2_codec, Str0255, B0255, B064K};

/// Message used by JDC to request an identifier for a future mining job from JDS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocateMiningJobToken {
    /// Whatever the JDS needs to identify or authenticate the client. UTF-8 is recommended.
    pub user_identifier: Str0255,
    /// A unique identifier for pairing the response/request.
    pub request_id: u32,
}

impl_sv2_codec!(AllocateMiningJobToken {
    user_identifier,
    request_id
});

/// Message used by JDS to accept an [`AllocateMiningJobToken`] message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllocateMiningJobTokenSuccess {
    /// Must be the same as the received [`AllocateMiningJobToken::request_id`].
    pub request_id: u32,
    /// Token that makes the JDC eligible for declaring a mining job, or for identifying a custom
    /// mining job on a mining connection.
    pub mining_job_token: B0255,
    /// Serialized outputs the JDS requires in the coinbase of declared jobs.
    pub coinbase_tx_outputs: B064K,
}

impl_sv2_codec!(AllocateMiningJobTokenSuccess {
    request_id,
    mining_job_token,
    coinbase_tx_outputs
});
