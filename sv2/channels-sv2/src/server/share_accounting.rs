//! # Share Accounting
//!
//! Outcome of share validation on a mining server, and the per-channel state needed to
//! acknowledge shares in batches with `SubmitShares.Success`.
use std::{collections::HashSet, fmt};

use bitcoin::hashes::sha256d::Hash;
use mining_sv2::SubmitSharesError;
use std::convert::TryInto;

/// A share that was accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareValidationResult {
    Valid,
    /// The share closes a batch, fields are those of `SubmitShares.Success`:
    /// `last_sequence_number`, `new_submits_accepted_count` and `new_shares_sum`.
    ValidWithAcknowledgement(u32, u32, u64),
    /// The share meets the network target. Carries the template id (`None` for custom jobs)
    /// and the segwit serialized coinbase needed to propagate the block.
    BlockFound(Option<u64>, Vec<u8>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareValidationError {
    Invalid,
    /// The job belongs to a previous chain tip.
    Stale,
    InvalidJobId,
    DoesNotMeetTarget,
    VersionRollingNotAllowed,
    DuplicateShare,
    InvalidCoinbase,
    NoChainTip,
    /// The extranonce of an extended share is not as long as the rollable part of the channel.
    BadExtranonceSize,
}

impl ShareValidationError {
    /// `error_code` of the `SubmitShares.Error` answering the share.
    pub fn as_error_code(&self) -> &'static str {
        match self {
            ShareValidationError::Invalid => "invalid-share",
            ShareValidationError::Stale => "stale-share",
            ShareValidationError::InvalidJobId => "invalid-job-id",
            ShareValidationError::DoesNotMeetTarget => "difficulty-too-low",
            ShareValidationError::VersionRollingNotAllowed => "version-rolling-not-allowed",
            ShareValidationError::DuplicateShare => "duplicate-share",
            ShareValidationError::InvalidCoinbase => "invalid-coinbase",
            ShareValidationError::NoChainTip => "no-chain-tip",
            ShareValidationError::BadExtranonceSize => "bad-extranonce-size",
        }
    }

    pub fn to_submit_shares_error(
        &self,
        channel_id: u32,
        sequence_number: u32,
    ) -> SubmitSharesError {
        SubmitSharesError {
            channel_id,
            sequence_number,
            error_code: self.as_error_code().try_into().unwrap_or_default(),
        }
    }
}

impl fmt::Display for ShareValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Share rejected: {}", self.as_error_code())
    }
}

impl std::error::Error for ShareValidationError {}

/// Share statistics of one channel.
///
/// Seen shares are kept until the next chain tip, to reject duplicates.
#[derive(Clone, Debug)]
pub struct ShareAccounting {
    last_share_sequence_number: u32,
    shares_accepted: u32,
    share_work_sum: u64,
    share_batch_size: usize,
    seen_shares: HashSet<Hash>,
    best_diff: f64,
}

impl ShareAccounting {
    /// A `share_batch_size` of 0 is treated as 1, every share is acknowledged.
    pub fn new(share_batch_size: usize) -> Self {
        Self {
            last_share_sequence_number: 0,
            shares_accepted: 0,
            share_work_sum: 0,
            share_batch_size: share_batch_size.max(1),
            seen_shares: HashSet::new(),
            best_diff: 0.0,
        }
    }

    pub fn update_share_accounting(
        &mut self,
        share_work: u64,
        share_sequence_number: u32,
        share_hash: Hash,
    ) {
        self.last_share_sequence_number = share_sequence_number;
        self.shares_accepted = self.shares_accepted.wrapping_add(1);
        self.share_work_sum = self.share_work_sum.saturating_add(share_work);
        self.seen_shares.insert(share_hash);
    }

    /// Called on every new chain tip, shares of stale jobs are rejected anyway.
    pub fn flush_seen_shares(&mut self) {
        self.seen_shares.clear();
    }

    pub fn get_last_share_sequence_number(&self) -> u32 {
        self.last_share_sequence_number
    }

    pub fn get_shares_accepted(&self) -> u32 {
        self.shares_accepted
    }

    pub fn get_share_work_sum(&self) -> u64 {
        self.share_work_sum
    }

    pub fn get_share_batch_size(&self) -> usize {
        self.share_batch_size
    }

    /// True when the last accepted share closes a batch.
    pub fn should_acknowledge(&self) -> bool {
        self.shares_accepted as usize % self.share_batch_size == 0
    }

    pub fn is_share_seen(&self, share_hash: Hash) -> bool {
        self.seen_shares.contains(&share_hash)
    }

    pub fn get_best_diff(&self) -> f64 {
        self.best_diff
    }

    pub fn update_best_diff(&mut self, diff: f64) {
        if diff > self.best_diff {
            self.best_diff = diff;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitcoin::hashes::Hash as _;

    #[test]
    fn acknowledges_every_batch() {
        let mut accounting = ShareAccounting::new(2);
        accounting.update_share_accounting(10, 1, Hash::hash(&[1]));
        assert!(!accounting.should_acknowledge());
        accounting.update_share_accounting(10, 2, Hash::hash(&[2]));
        assert!(accounting.should_acknowledge());
        assert_eq!(accounting.get_last_share_sequence_number(), 2);
        assert_eq!(accounting.get_shares_accepted(), 2);
        assert_eq!(accounting.get_share_work_sum(), 20);
    }

    #[test]
    fn seen_shares_are_flushed() {
        let mut accounting = ShareAccounting::new(10);
        let hash = Hash::hash(b"share");
        accounting.update_share_accounting(1, 1, hash);
        assert!(accounting.is_share_seen(hash));
        accounting.flush_seen_shares();
        assert!(!accounting.is_share_seen(hash));
        // statistics survive the flush
        assert_eq!(accounting.get_shares_accepted(), 1);
    }

    #[test]
    fn best_diff_only_grows() {
        let mut accounting = ShareAccounting::new(0);
        assert_eq!(accounting.get_share_batch_size(), 1);
        accounting.update_best_diff(5.0);
        accounting.update_best_diff(3.0);
        assert_eq!(accounting.get_best_diff(), 5.0);
    }

    #[test]
    fn rejection_message() {
        let error = ShareValidationError::Stale.to_submit_shares_error(3, 9);
        assert_eq!(error.channel_id, 3);
        assert_eq!(error.sequence_number, 9);
        assert_eq!(error.error_code.as_utf8().unwrap(), "stale-share");
    }
}
