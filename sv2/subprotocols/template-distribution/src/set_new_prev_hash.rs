use binary_sv2::{impl_sv2_codec, U256};

/// Message used by an upstream (Template Provider) to indicate the latest block header hash to
/// mine on.
///
/// Upon validating a new best block, the upstream must immediately send this message. If a
/// [`crate::NewTemplate`] with `future_template` set and a matching `template_id` has been
/// sent, the downstream should start mining on it immediately.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetNewPrevHash {
    /// The `template_id` of the future [`crate::NewTemplate`] this prev hash activates.
    pub template_id: u64,
    /// Previous block’s hash, as it must be placed into the next block’s header.
    pub prev_hash: U256,
    /// The `nTime` field in the block header at which the client should start (usually current
    /// time). This is **not** the minimum valid `nTime` value.
    pub header_timestamp: u32,
    /// Block header field.
    pub n_bits: u32,
    /// The maximum double-SHA256 hash value which would represent a valid block. Note that this
    /// field is fully determined by the value in the `n_bits` field.
    pub target: U256,
}

impl_sv2_codec!(SetNewPrevHash {
    template_id,
    prev_hash,
    header_timestamp,
    n_bits,
    target
});
