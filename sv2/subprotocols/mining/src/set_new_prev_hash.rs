use binary_sv2::{impl_sv2_codec, U256};

/// Message used by upstream to share or distribute the latest block hash.
///
/// This message may be shared by all downstream nodes (sent only once to each channel group).
/// Downstream must immediately start to mine on the provided [`SetNewPrevHash::prev_hash`].
///
/// When a downstream receives this message, only the job referenced by
/// [`SetNewPrevHash::job_id`] is valid. Remaining jobs have to be dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetNewPrevHash {
    /// Group channel or channel that this prevhash is valid for.
    pub channel_id: u32,
    /// Job identifier that is to be used for mining.
    pub job_id: u32,
    /// Latest block hash observed by the Template Provider.
    pub prev_hash: U256,
    /// Smallest `nTime` value available for hashing.
    pub min_ntime: u32,
    /// Block header field.
    pub nbits: u32,
}

impl_sv2_codec!(SetNewPrevHash {
    channel_id,
    job_id,
    prev_hash,
    min_ntime,
    nbits
});
