//! # Job Factory
//!
//! Builds the jobs of a channel from `NewTemplate` and `SetCustomMiningJob` messages, and gives
//! them ids that are unique for the channel.
//!
//! For template jobs the factory builds the coinbase itself:
//!
//! - scriptSig: the template `coinbase_prefix` (BIP34 height), the pool tag `/<pool_tag>//` as a
//!   single push, then `OP_PUSHBYTES_32` and 32 bytes reserved for the extranonce.
//! - outputs: the reward outputs followed by the outputs of the template.
//! - witness: the 32 bytes witness reserved value.
//!
//! The coinbase is then split around the extranonce into `coinbase_tx_prefix` and
//! `coinbase_tx_suffix`, and the job message carries them stripped of bip141 data.
use binary_sv2::Sv2Option;
use bitcoin::{
    absolute::LockTime,
    blockdata::witness::Witness,
    consensus::serialize,
    transaction::{OutPoint, Transaction, TxIn, TxOut, Version},
    Amount, Sequence,
};
use mining_sv2::{NewExtendedMiningJob, NewMiningJob, SetCustomMiningJob, MAX_EXTRANONCE_LEN};
use std::convert::TryInto;
use template_distribution_sv2::NewTemplate;
use tracing::debug;

use crate::{
    bip141::try_strip_bip141,
    chain_tip::ChainTip,
    merkle_root::merkle_root_from_path,
    outputs::{deserialize_outputs, deserialize_template_outputs},
    server::jobs::{error::JobFactoryError, extended::ExtendedJob, standard::StandardJob, JobOrigin},
};

/// Consensus limit of a coinbase scriptSig.
pub const MAX_SCRIPT_SIG_LEN: usize = 100;
/// Largest BIP34 height push.
pub const MAX_BIP34_LEN: usize = 5;

// version, segwit marker and flag, input count, null outpoint and scriptSig length
const SCRIPT_SIG_OFFSET: usize = 4 + 2 + 1 + 32 + 4 + 1;

#[derive(Debug, PartialEq, Eq, Clone, Default)]
struct JobIdFactory {
    state: u32,
}

impl JobIdFactory {
    // wraps back to 1, 0 is never handed out
    fn next(&mut self) -> u32 {
        self.state = self.state.checked_add(1).unwrap_or(1);
        self.state
    }
}

/// Creates the jobs of one channel. Job ids start at 1 and are shared by template and custom
/// jobs, so they never collide.
#[derive(Debug, Clone)]
pub struct JobFactory {
    job_id_factory: JobIdFactory,
    version_rolling_allowed: bool,
    pool_tag_string: Option<String>,
}

impl JobFactory {
    /// `version_rolling_allowed` only applies to extended jobs, standard jobs always allow it.
    pub fn new(version_rolling_allowed: bool, pool_tag_string: Option<String>) -> Self {
        Self {
            job_id_factory: JobIdFactory::default(),
            version_rolling_allowed,
            pool_tag_string,
        }
    }

    /// The pool tag push: `OP_PUSHBYTES_N` followed by `/<pool_tag>//`.
    ///
    /// Without a pool tag only the delimiters are pushed.
    pub fn op_pushbytes_pool_tag(&self) -> Result<Vec<u8>, JobFactoryError> {
        let mut tag = vec![b'/'];
        if let Some(pool_tag_string) = &self.pool_tag_string {
            tag.extend_from_slice(pool_tag_string.as_bytes());
        }
        tag.extend_from_slice(b"//");

        // what is left of the scriptSig once BIP34, this push opcode and the extranonce push
        // are accounted for
        let max_tag_len = MAX_SCRIPT_SIG_LEN - MAX_BIP34_LEN - 1 - 1 - MAX_EXTRANONCE_LEN;
        if tag.len() > max_tag_len {
            return Err(JobFactoryError::CoinbaseTxPrefixError);
        }

        let mut push = Vec::with_capacity(tag.len() + 1);
        push.push(tag.len() as u8);
        push.extend_from_slice(&tag);
        Ok(push)
    }

    /// Size of the scriptSig of template jobs, assuming the largest BIP34 height push.
    pub fn max_script_sig_len(&self) -> usize {
        let tag_len = self.pool_tag_string.as_ref().map_or(0, |s| s.len());
        MAX_BIP34_LEN + 1 + 3 + tag_len + 1 + MAX_EXTRANONCE_LEN
    }

    pub fn version_rolling_allowed(&self) -> bool {
        self.version_rolling_allowed
    }

    /// Creates a standard job from a template. The merkle root commits to `extranonce_prefix`,
    /// which must be 32 bytes long.
    ///
    /// `chain_tip` is required for non-future templates, its `min_ntime` is the one of the job.
    pub fn new_standard_job(
        &mut self,
        channel_id: u32,
        chain_tip: Option<&ChainTip>,
        extranonce_prefix: Vec<u8>,
        template: NewTemplate,
        coinbase_reward_outputs: Vec<TxOut>,
    ) -> Result<StandardJob, JobFactoryError> {
        let min_ntime = job_min_ntime(&template, chain_tip)?;
        let coinbase = self.template_coinbase(&template, coinbase_reward_outputs)?;

        let merkle_root = merkle_root_from_path(
            &coinbase.prefix,
            &coinbase.suffix,
            &extranonce_prefix,
            template.merkle_path.inner_as_ref(),
        )
        .ok_or(JobFactoryError::FailedToCalculateMerkleRoot)?;

        let job_message = NewMiningJob {
            channel_id,
            job_id: self.job_id_factory.next(),
            min_ntime: Sv2Option::new(min_ntime),
            version: template.version,
            merkle_root: merkle_root.into(),
        };
        debug!(
            "New standard job {} for channel {} from template {}",
            job_message.job_id, channel_id, template.template_id
        );

        Ok(StandardJob::new(
            template,
            extranonce_prefix,
            coinbase.outputs,
            coinbase.prefix,
            coinbase.suffix,
            job_message,
        ))
    }

    /// Creates an extended job from a template.
    ///
    /// `chain_tip` is required for non-future templates, its `min_ntime` is the one of the job.
    pub fn new_extended_job(
        &mut self,
        channel_id: u32,
        chain_tip: Option<&ChainTip>,
        extranonce_prefix: Vec<u8>,
        template: NewTemplate,
        coinbase_reward_outputs: Vec<TxOut>,
    ) -> Result<ExtendedJob, JobFactoryError> {
        let min_ntime = job_min_ntime(&template, chain_tip)?;
        let coinbase = self.template_coinbase(&template, coinbase_reward_outputs)?;
        let (prefix_stripped, suffix_stripped) = strip(&coinbase.prefix, &coinbase.suffix)?;

        let job_message = NewExtendedMiningJob {
            channel_id,
            job_id: self.job_id_factory.next(),
            min_ntime: Sv2Option::new(min_ntime),
            version: template.version,
            version_rolling_allowed: self.version_rolling_allowed,
            merkle_path: template.merkle_path.clone(),
            coinbase_tx_prefix: prefix_stripped
                .try_into()
                .map_err(|_| JobFactoryError::CoinbaseTxPrefixError)?,
            coinbase_tx_suffix: suffix_stripped
                .try_into()
                .map_err(|_| JobFactoryError::CoinbaseTxSuffixError)?,
        };
        debug!(
            "New extended job {} for channel {} from template {}",
            job_message.job_id, channel_id, template.template_id
        );

        Ok(ExtendedJob::new(
            JobOrigin::NewTemplate(template),
            extranonce_prefix,
            coinbase.outputs,
            coinbase.prefix,
            coinbase.suffix,
            job_message,
        ))
    }

    /// Creates an extended job from a `SetCustomMiningJob`, active right away with the
    /// `min_ntime` of the message.
    ///
    /// The message `coinbase_prefix` is the whole scriptSig before the extranonce, the
    /// `OP_PUSHBYTES_32` opcode included.
    pub fn new_extended_job_from_custom_job(
        &mut self,
        set_custom_mining_job: SetCustomMiningJob,
        extranonce_prefix: Vec<u8>,
    ) -> Result<ExtendedJob, JobFactoryError> {
        let m = &set_custom_mining_job;
        let outputs = deserialize_outputs(m.coinbase_tx_outputs.inner_as_ref())?;
        let coinbase = split_coinbase(
            m.coinbase_tx_version,
            m.coinbase_tx_locktime,
            m.coinbase_tx_input_nsequence,
            m.coinbase_prefix.inner_as_ref(),
            outputs,
        )?;
        let (prefix_stripped, suffix_stripped) = strip(&coinbase.prefix, &coinbase.suffix)?;

        let job_message = NewExtendedMiningJob {
            channel_id: m.channel_id,
            job_id: self.job_id_factory.next(),
            min_ntime: Sv2Option::new(Some(m.min_ntime)),
            version: m.version,
            version_rolling_allowed: self.version_rolling_allowed,
            merkle_path: m.merkle_path.clone(),
            coinbase_tx_prefix: prefix_stripped
                .try_into()
                .map_err(|_| JobFactoryError::CoinbaseTxPrefixError)?,
            coinbase_tx_suffix: suffix_stripped
                .try_into()
                .map_err(|_| JobFactoryError::CoinbaseTxSuffixError)?,
        };
        debug!(
            "New extended job {} for channel {} from custom job request {}",
            job_message.job_id, m.channel_id, m.request_id
        );

        Ok(ExtendedJob::new(
            JobOrigin::SetCustomMiningJob(set_custom_mining_job),
            extranonce_prefix,
            coinbase.outputs,
            coinbase.prefix,
            coinbase.suffix,
            job_message,
        ))
    }

    // checks the reward outputs, then builds and splits the coinbase of `template`
    fn template_coinbase(
        &self,
        template: &NewTemplate,
        coinbase_reward_outputs: Vec<TxOut>,
    ) -> Result<SplitCoinbase, JobFactoryError> {
        let mut sum = Amount::ZERO;
        for output in &coinbase_reward_outputs {
            sum = sum
                .checked_add(output.value)
                .ok_or(JobFactoryError::CoinbaseOutputsSumOverflow)?;
        }
        if sum.to_sat() != template.coinbase_tx_value_remaining {
            return Err(JobFactoryError::InvalidCoinbaseOutputsSum {
                expected: template.coinbase_tx_value_remaining,
                actual: sum.to_sat(),
            });
        }

        let mut outputs = coinbase_reward_outputs;
        outputs.extend(deserialize_template_outputs(
            template.coinbase_tx_outputs.inner_as_ref(),
            template.coinbase_tx_outputs_count,
        )?);

        let mut script_sig_prefix = template.coinbase_prefix.to_vec();
        script_sig_prefix.extend_from_slice(&self.op_pushbytes_pool_tag()?);
        script_sig_prefix.push(MAX_EXTRANONCE_LEN as u8); // OP_PUSHBYTES_32

        split_coinbase(
            template.coinbase_tx_version,
            template.coinbase_tx_locktime,
            template.coinbase_tx_input_sequence,
            &script_sig_prefix,
            outputs,
        )
    }
}

#[derive(Debug)]
struct SplitCoinbase {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
    outputs: Vec<TxOut>,
}

fn job_min_ntime(
    template: &NewTemplate,
    chain_tip: Option<&ChainTip>,
) -> Result<Option<u32>, JobFactoryError> {
    if template.future_template {
        return Ok(None);
    }
    chain_tip
        .map(|tip| Some(tip.min_ntime()))
        .ok_or(JobFactoryError::ChainTipRequired)
}

fn strip(prefix: &[u8], suffix: &[u8]) -> Result<(Vec<u8>, Vec<u8>), JobFactoryError> {
    match try_strip_bip141(prefix, suffix)? {
        Some(stripped) => Ok(stripped),
        None => Ok((prefix.to_vec(), suffix.to_vec())),
    }
}

// serializes the coinbase with 32 zero bytes after `script_sig_prefix` and splits it around them
fn split_coinbase(
    version: u32,
    locktime: u32,
    sequence: u32,
    script_sig_prefix: &[u8],
    outputs: Vec<TxOut>,
) -> Result<SplitCoinbase, JobFactoryError> {
    let script_sig_len = script_sig_prefix.len() + MAX_EXTRANONCE_LEN;
    if script_sig_len > MAX_SCRIPT_SIG_LEN {
        return Err(JobFactoryError::ScriptSigTooLarge(script_sig_len));
    }
    let mut script_sig = script_sig_prefix.to_vec();
    script_sig.extend_from_slice(&[0; MAX_EXTRANONCE_LEN]);

    let coinbase = Transaction {
        version: Version::non_standard(version as i32),
        lock_time: LockTime::from_consensus(locktime),
        input: vec![TxIn {
            previous_output: OutPoint::null(),
            script_sig: script_sig.into(),
            sequence: Sequence(sequence),
            // witness reserved value
            witness: Witness::from(vec![vec![0; 32]]),
        }],
        output: outputs,
    };
    let serialized = serialize(&coinbase);

    let extranonce_start = SCRIPT_SIG_OFFSET + script_sig_prefix.len();
    Ok(SplitCoinbase {
        prefix: serialized[..extranonce_start].to_vec(),
        suffix: serialized[extranonce_start + MAX_EXTRANONCE_LEN..].to_vec(),
        outputs: coinbase.output,
    })
}
