//! # Extended Job
//!
//! A job for an extended (or group) channel: the downstream gets the coinbase split around the
//! extranonce and the merkle path, and computes the merkle root itself.
use binary_sv2::{Seq0255, Sv2Option, U256};
use bitcoin::transaction::TxOut;
use mining_sv2::{NewExtendedMiningJob, NewMiningJob};

use super::{error::ExtendedJobError, standard::StandardJob, Job, JobOrigin};
use crate::merkle_root::merkle_root_from_path;

/// An extended job, committed to:
/// - its origin (a template or a custom job)
/// - the extranonce prefix of the channel when the job was created
/// - the coinbase outputs
///
/// The `NewExtendedMiningJob` message carries the coinbase stripped of bip141 data, the job also
/// keeps the segwit serialization, needed to submit a block.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtendedJob {
    origin: JobOrigin,
    extranonce_prefix: Vec<u8>,
    coinbase_outputs: Vec<TxOut>,
    coinbase_tx_prefix_with_bip141: Vec<u8>,
    coinbase_tx_suffix_with_bip141: Vec<u8>,
    job_message: NewExtendedMiningJob,
}

impl Job for ExtendedJob {
    fn get_job_id(&self) -> u32 {
        self.job_message.job_id
    }

    fn get_template_id(&self) -> Option<u64> {
        self.origin.template_id()
    }

    fn get_min_ntime(&self) -> Option<u32> {
        self.job_message.min_ntime.as_ref().copied()
    }

    fn activate(&mut self, min_ntime: u32) {
        self.activate(min_ntime);
    }
}

impl ExtendedJob {
    pub(crate) fn new(
        origin: JobOrigin,
        extranonce_prefix: Vec<u8>,
        coinbase_outputs: Vec<TxOut>,
        coinbase_tx_prefix_with_bip141: Vec<u8>,
        coinbase_tx_suffix_with_bip141: Vec<u8>,
        job_message: NewExtendedMiningJob,
    ) -> Self {
        Self {
            origin,
            extranonce_prefix,
            coinbase_outputs,
            coinbase_tx_prefix_with_bip141,
            coinbase_tx_suffix_with_bip141,
            job_message,
        }
    }

    /// Converts a group channel job into the job of one of its standard channels.
    ///
    /// The merkle root is computed with the 32 bytes `extranonce_prefix` of the standard channel.
    /// Jobs from `SetCustomMiningJob` can not be converted.
    pub fn into_standard_job(
        self,
        channel_id: u32,
        extranonce_prefix: Vec<u8>,
    ) -> Result<StandardJob, ExtendedJobError> {
        let template = match self.origin {
            JobOrigin::NewTemplate(template) => template,
            JobOrigin::SetCustomMiningJob(_) => {
                return Err(ExtendedJobError::FailedToConvertToStandardJob)
            }
        };

        let merkle_root = merkle_root_from_path(
            self.job_message.coinbase_tx_prefix.inner_as_ref(),
            self.job_message.coinbase_tx_suffix.inner_as_ref(),
            &extranonce_prefix,
            self.job_message.merkle_path.inner_as_ref(),
        )
        .ok_or(ExtendedJobError::FailedToCalculateMerkleRoot)?;

        let job_message = NewMiningJob {
            channel_id,
            job_id: self.job_message.job_id,
            min_ntime: self.job_message.min_ntime,
            version: self.job_message.version,
            merkle_root: merkle_root.into(),
        };

        Ok(StandardJob::new(
            template,
            extranonce_prefix,
            self.coinbase_outputs,
            self.coinbase_tx_prefix_with_bip141,
            self.coinbase_tx_suffix_with_bip141,
            job_message,
        ))
    }

    pub fn get_job_id(&self) -> u32 {
        self.job_message.job_id
    }

    pub fn get_origin(&self) -> &JobOrigin {
        &self.origin
    }

    pub fn get_extranonce_prefix(&self) -> &[u8] {
        &self.extranonce_prefix
    }

    /// Reward outputs followed by the template outputs.
    pub fn get_coinbase_outputs(&self) -> &[TxOut] {
        &self.coinbase_outputs
    }

    pub fn get_job_message(&self) -> &NewExtendedMiningJob {
        &self.job_message
    }

    pub fn get_merkle_path(&self) -> &Seq0255<U256> {
        &self.job_message.merkle_path
    }

    pub fn get_min_ntime(&self) -> Option<u32> {
        self.job_message.min_ntime.as_ref().copied()
    }

    pub fn get_version(&self) -> u32 {
        self.job_message.version
    }

    pub fn version_rolling_allowed(&self) -> bool {
        self.job_message.version_rolling_allowed
    }

    pub fn get_coinbase_tx_prefix_without_bip141(&self) -> &[u8] {
        self.job_message.coinbase_tx_prefix.inner_as_ref()
    }

    pub fn get_coinbase_tx_suffix_without_bip141(&self) -> &[u8] {
        self.job_message.coinbase_tx_suffix.inner_as_ref()
    }

    pub fn get_coinbase_tx_prefix_with_bip141(&self) -> &[u8] {
        &self.coinbase_tx_prefix_with_bip141
    }

    pub fn get_coinbase_tx_suffix_with_bip141(&self) -> &[u8] {
        &self.coinbase_tx_suffix_with_bip141
    }

    /// Segwit serialized coinbase with `full_extranonce` (32 bytes) in the scriptSig.
    pub fn coinbase_with_extranonce(&self, full_extranonce: &[u8]) -> Vec<u8> {
        [
            &self.coinbase_tx_prefix_with_bip141[..],
            full_extranonce,
            &self.coinbase_tx_suffix_with_bip141[..],
        ]
        .concat()
    }

    pub fn activate(&mut self, min_ntime: u32) {
        self.job_message.min_ntime = Sv2Option::new(Some(min_ntime));
    }
}
