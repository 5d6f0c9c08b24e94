use binary_sv2::{impl_sv2_codec, B064K};

/// Message used by a downstream to submit a successful solution to a previously provided
/// template.
///
/// Upon receiving this message, the upstream (Template Provider) must build the corresponding
/// block and broadcast it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmitSolution {
    /// The `template_id` field, as it appeared in [`crate::NewTemplate`].
    pub template_id: u64,
    /// The version field in the block header. Bits not defined by
    /// [BIP320](https://github.com/bitcoin/bips/blob/master/bip-0320.mediawiki) as additional
    /// nonce must be the same as they appear in the [`crate::NewTemplate`] message, other bits
    /// may be set to any value.
    pub version: u32,
    /// The `nTime` field in the block header. This must be greater than or equal to the
    /// `header_timestamp` field in the latest [`crate::SetNewPrevHash`] message and lower than
    /// or equal to that value plus the number of seconds since the receipt of that message.
    pub header_timestamp: u32,
    /// The nonce field in the header.
    pub header_nonce: u32,
    /// The full serialized coinbase transaction, meeting all the requirements of the
    /// [`crate::NewTemplate`] message, above.
    pub coinbase_tx: B064K,
}

impl_sv2_codec!(SubmitSolution {
    template_id,
    version,
    header_timestamp,
    header_nonce,
    coinbase_tx
});
