use binary_sv2::impl_sv2_codec;

/// Message used by a downstream to indicate the size of the additional bytes they will need in
/// coinbase transaction outputs.
///
/// As the pool is responsible for adding coinbase transaction outputs for payouts and other
/// uses, the Template Provider will need to consider this reserved space when selecting
/// transactions for inclusion in a block (to avoid an invalid, oversized block).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoinbaseOutputConstraints {
    /// Additional serialized bytes needed in coinbase transaction outputs.
    pub coinbase_output_max_additional_size: u32,
    /// Additional sigops needed in coinbase transaction outputs.
    pub coinbase_output_max_additional_sigops: u16,
}

impl_sv2_codec!(CoinbaseOutputConstraints {
    coinbase_output_max_additional_size,
    coinbase_output_max_additional_sigops
});
