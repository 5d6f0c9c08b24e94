//! Channels as kept by a mining server.
//!
//! [`standard::StandardChannel`] and [`extended::ExtendedChannel`] both follow the job lifecycle
//! of [`jobs::job_store`] and validate the shares of their miners. [`group::GroupChannel`] only
//! keeps the job stream shared by a set of standard channels.

pub mod error;
pub mod extended;
pub mod group;
pub mod jobs;
pub mod share_accounting;
pub mod standard;

use std::collections::HashMap;

use bitcoin::{
    blockdata::block::{Header, Version},
    hashes::Hash as _,
    CompactTarget, Target as BitcoinTarget, TxMerkleNode,
};
use tracing::{debug, info};

use crate::{
    chain_tip::ChainTip,
    server::{
        jobs::{job_store::JobStore, Job},
        share_accounting::{ShareAccounting, ShareValidationError, ShareValidationResult},
    },
    target::{target_to_difficulty, u256_to_block_hash, Target},
};

/// BIP320 general purpose bits, the ones rolled by miners.
pub const VERSION_ROLLING_MASK: u32 = 0x1fffe000;

/// Read access shared by standard and extended channels.
pub trait Channel {
    type Job: Job;

    fn get_channel_id(&self) -> u32;

    fn get_target(&self) -> &Target;

    fn get_extranonce_prefix(&self) -> &[u8];

    fn get_chain_tip(&self) -> Option<&ChainTip>;

    fn get_active_job(&self) -> Option<&Self::Job>;

    /// Future jobs, indexed by `job_id`.
    fn get_future_jobs(&self) -> &HashMap<u32, Self::Job>;
}

// Finds the job a share was submitted for. Shares for future jobs are not accepted.
pub(crate) fn lookup_job<J: Job, S: JobStore<J>>(
    job_store: &S,
    job_id: u32,
) -> Result<&J, ShareValidationError> {
    if job_store.get_stale_jobs().contains_key(&job_id) {
        return Err(ShareValidationError::Stale);
    }
    if let Some(job) = job_store
        .get_active_job()
        .filter(|job| job.get_job_id() == job_id)
    {
        return Ok(job);
    }
    job_store
        .get_past_jobs()
        .get(&job_id)
        .ok_or(ShareValidationError::InvalidJobId)
}

/// Header fields a miner chose for a share.
pub(crate) struct ShareHeader {
    pub version: u32,
    pub merkle_root: [u8; 32],
    pub ntime: u32,
    pub nonce: u32,
}

// Hashes the share header on top of `chain_tip` and checks it against the network target, then
// the channel target. `block_found` gives the template id and coinbase of the job.
pub(crate) fn check_share_header<F>(
    share_accounting: &mut ShareAccounting,
    channel_target: &Target,
    chain_tip: &ChainTip,
    share: ShareHeader,
    sequence_number: u32,
    block_found: F,
) -> Result<ShareValidationResult, ShareValidationError>
where
    F: FnOnce() -> (Option<u64>, Vec<u8>),
{
    let bits = CompactTarget::from_consensus(chain_tip.nbits());
    let header = Header {
        version: Version::from_consensus(share.version as i32),
        prev_blockhash: u256_to_block_hash(chain_tip.prev_hash()),
        merkle_root: TxMerkleNode::from_byte_array(share.merkle_root),
        time: share.ntime,
        bits,
        nonce: share.nonce,
    };

    let hash = header.block_hash();
    let hash_as_target = Target::from_le_bytes(hash.to_byte_array());
    let network_target = BitcoinTarget::from_compact(bits);
    debug!(
        "Share validation\nshare:\t\t{}\nchannel target:\t{}\nnetwork target:\t{:x}",
        hash_as_target, channel_target, network_target
    );

    let share_work = target_to_difficulty(channel_target) as u64;

    if network_target.is_met_by(hash) {
        share_accounting.update_share_accounting(share_work, sequence_number, hash.to_raw_hash());
        let (template_id, coinbase) = block_found();
        info!("Block found: {} (template {:?})", hash, template_id);
        return Ok(ShareValidationResult::BlockFound(template_id, coinbase));
    }

    if hash_as_target > *channel_target {
        return Err(ShareValidationError::DoesNotMeetTarget);
    }

    if share_accounting.is_share_seen(hash.to_raw_hash()) {
        return Err(ShareValidationError::DuplicateShare);
    }

    share_accounting.update_share_accounting(share_work, sequence_number, hash.to_raw_hash());
    share_accounting.update_best_diff(target_to_difficulty(&hash_as_target));

    if share_accounting.should_acknowledge() {
        Ok(ShareValidationResult::ValidWithAcknowledgement(
            share_accounting.get_last_share_sequence_number(),
            share_accounting.get_shares_accepted(),
            share_accounting.get_share_work_sum(),
        ))
    } else {
        Ok(ShareValidationResult::Valid)
    }
}
