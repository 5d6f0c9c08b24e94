use binary_sv2::{impl_sv2_codec, Seq0255, Sv2Option, B064K, U256};

/// Message used by an upstream to provide an updated mining job to downstream.
///
/// This is used for Standard Channels only.
///
/// Note that Standard Jobs distributed through this message are restricted to a fixed Merkle
/// Root, and the only rollable bits are `version`, `nonce`, and `nTime` fields of the block
/// header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMiningJob {
    /// Channel identifier for the channel that this job is valid for.
    ///
    /// This must be a Standard Channel.
    pub channel_id: u32,
    /// Upstream’s identification of the mining job.
    ///
    /// This identifier must be provided to the upstream when shares are submitted.
    pub job_id: u32,
    /// Smallest `nTime` value available for hashing for the new mining job.
    ///
    /// An empty value indicates this is a future job and will be ready to mine on once a
    /// [`SetNewPrevHash`] message is received with a matching `job_id`.
    ///
    /// Otherwise the downstream must start mining on it immediately, using the `prev_hash` from
    /// the last received [`SetNewPrevHash`] message.
    ///
    /// [`SetNewPrevHash`]: crate::SetNewPrevHash
    pub min_ntime: Sv2Option<u32>,
    /// Version field that reflects the current network consensus.
    ///
    /// As specified in [BIP320](https://github.com/bitcoin/bips/blob/master/bip-0320.mediawiki),
    /// the general purpose bits can be freely manipulated by the downstream node.
    pub version: u32,
    /// Merkle root field as used in the bitcoin block header.
    ///
    /// Note that this field is fixed and cannot be modified by the downstream node.
    pub merkle_root: U256,
}

impl_sv2_codec!(NewMiningJob {
    channel_id,
    job_id,
    min_ntime,
    version,
    merkle_root
});

impl NewMiningJob {
    pub fn is_future(&self) -> bool {
        self.min_ntime.as_ref().is_none()
    }
    pub fn set_future(&mut self) {
        self.min_ntime = Sv2Option::new(None);
    }
    pub fn set_no_future(&mut self, min_ntime: u32) {
        self.min_ntime = Sv2Option::new(Some(min_ntime));
    }
}

/// Message used by an upstream to provide an updated mining job to the downstream through
/// Extended or Group Channel only.
///
/// An Extended Job allows rolling Merkle Roots, giving extensive control over the search space so
/// that they can implement various advanced use cases such as: translation between Stratum V1 and
/// V2 protocols, difficulty aggregation and search space splitting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExtendedMiningJob {
    /// Identifier of the Extended Mining Channel that this job is valid for.
    ///
    /// For a Group Channel, the message is broadcasted to all standard channels belonging to the
    /// group.
    pub channel_id: u32,
    /// Upstream’s identification of the mining job.
    pub job_id: u32,
    /// Smallest `nTime` value available for hashing for the new mining job, empty for a future
    /// job. See [`NewMiningJob::min_ntime`].
    pub min_ntime: Sv2Option<u32>,
    /// Version field that reflects the current network consensus.
    pub version: u32,
    /// If set to `true`, the general purpose bits of [`NewExtendedMiningJob::version`] (as
    /// specified in BIP320) can be freely manipulated by the downstream node.
    ///
    /// If set to `false`, the downstream node must use [`NewExtendedMiningJob::version`] as it is
    /// defined by this message.
    pub version_rolling_allowed: bool,
    /// Merkle path hashes ordered from deepest.
    pub merkle_path: Seq0255<U256>,
    /// Prefix part of the coinbase transaction.
    pub coinbase_tx_prefix: B064K,
    /// Suffix part of the coinbase transaction.
    pub coinbase_tx_suffix: B064K,
}

impl_sv2_codec!(NewExtendedMiningJob {
    channel_id,
    job_id,
    min_ntime,
    version,
    version_rolling_allowed,
    merkle_path,
    coinbase_tx_prefix,
    coinbase_tx_suffix
});

impl NewExtendedMiningJob {
    pub fn is_future(&self) -> bool {
        self.min_ntime.as_ref().is_none()
    }
    pub fn set_future(&mut self) {
        self.min_ntime = Sv2Option::new(None);
    }
    pub fn set_no_future(&mut self, min_ntime: u32) {
        self.min_ntime = Sv2Option::new(Some(min_ntime));
    }
}
