//! # Standard Job
//!
//! A job for a standard channel: header-only mining, the merkle root is computed by the server
//! with the full 32 bytes extranonce prefix of the channel.
use binary_sv2::{Sv2Option, U256};
use bitcoin::transaction::TxOut;
use mining_sv2::NewMiningJob;
use template_distribution_sv2::NewTemplate;

use super::Job;

#[derive(Debug, Clone, PartialEq)]
pub struct StandardJob {
    template: NewTemplate,
    extranonce_prefix: Vec<u8>,
    coinbase_outputs: Vec<TxOut>,
    coinbase_tx_prefix_with_bip141: Vec<u8>,
    coinbase_tx_suffix_with_bip141: Vec<u8>,
    job_message: NewMiningJob,
}

impl Job for StandardJob {
    fn get_job_id(&self) -> u32 {
        self.job_message.job_id
    }

    fn get_template_id(&self) -> Option<u64> {
        Some(self.template.template_id)
    }

    fn get_min_ntime(&self) -> Option<u32> {
        self.job_message.min_ntime.as_ref().copied()
    }

    fn activate(&mut self, min_ntime: u32) {
        self.activate(min_ntime);
    }
}

impl StandardJob {
    pub(crate) fn new(
        template: NewTemplate,
        extranonce_prefix: Vec<u8>,
        coinbase_outputs: Vec<TxOut>,
        coinbase_tx_prefix_with_bip141: Vec<u8>,
        coinbase_tx_suffix_with_bip141: Vec<u8>,
        job_message: NewMiningJob,
    ) -> Self {
        Self {
            template,
            extranonce_prefix,
            coinbase_outputs,
            coinbase_tx_prefix_with_bip141,
            coinbase_tx_suffix_with_bip141,
            job_message,
        }
    }

    pub fn get_job_id(&self) -> u32 {
        self.job_message.job_id
    }

    pub fn get_template(&self) -> &NewTemplate {
        &self.template
    }

    pub fn get_extranonce_prefix(&self) -> &[u8] {
        &self.extranonce_prefix
    }

    pub fn get_coinbase_outputs(&self) -> &[TxOut] {
        &self.coinbase_outputs
    }

    pub fn get_job_message(&self) -> &NewMiningJob {
        &self.job_message
    }

    pub fn get_merkle_root(&self) -> &U256 {
        &self.job_message.merkle_root
    }

    pub fn get_min_ntime(&self) -> Option<u32> {
        self.job_message.min_ntime.as_ref().copied()
    }

    pub fn get_version(&self) -> u32 {
        self.job_message.version
    }

    /// Segwit serialized coinbase, with the extranonce prefix of the channel in the scriptSig.
    pub fn coinbase(&self) -> Vec<u8> {
        [
            &self.coinbase_tx_prefix_with_bip141[..],
            &self.extranonce_prefix[..],
            &self.coinbase_tx_suffix_with_bip141[..],
        ]
        .concat()
    }

    pub fn activate(&mut self, min_ntime: u32) {
        self.job_message.min_ntime = Sv2Option::new(Some(min_ntime));
    }
}
