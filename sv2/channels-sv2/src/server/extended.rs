//! # Extended Channel
//!
//! Server side state of a Sv2 extended channel:
//!
//! - channel parameters agreed at opening: `channel_id`, `user_identity`, `extranonce_prefix` and
//!   the number of extranonce bytes the miner rolls
//! - the channel target, derived from the nominal hashrate and the expected shares per minute,
//!   never above the max target requested by the miner
//! - jobs, built from templates or from `SetCustomMiningJob` messages, and their lifecycle in a
//!   [`JobStore`]
//! - the chain tip and the share accounting used to validate `SubmitSharesExtended`.
//!
//! A channel is mutated by a single connection, it holds no lock.
use std::{collections::HashMap, convert::TryInto};

use bitcoin::transaction::TxOut;
use mining_sv2::{
    OpenExtendedMiningChannel, OpenExtendedMiningChannelSuccess, SetCustomMiningJob, SetTarget,
    SubmitSharesExtended, MAX_EXTRANONCE_LEN,
};
use template_distribution_sv2::{NewTemplate, SetNewPrevHash as SetNewPrevHashTdp};
use tracing::{debug, warn};

use crate::{
    chain_tip::ChainTip,
    extranonce_prefix::ExtranoncePrefixFactoryExtended,
    merkle_root::merkle_root_from_path,
    policy::PoolPolicy,
    server::{
        check_share_header,
        error::ExtendedChannelError,
        jobs::{
            extended::ExtendedJob,
            factory::{JobFactory, MAX_SCRIPT_SIG_LEN},
            job_store::JobStore,
            Job,
        },
        lookup_job,
        share_accounting::{ShareAccounting, ShareValidationError, ShareValidationResult},
        Channel, ShareHeader, VERSION_ROLLING_MASK,
    },
    target::{hash_rate_to_target, Target, TargetError},
};

fn channel_target(
    nominal_hashrate: f32,
    expected_share_per_minute: f32,
) -> Result<Target, ExtendedChannelError> {
    hash_rate_to_target(nominal_hashrate.into(), expected_share_per_minute.into()).map_err(
        |e| match e {
            TargetError::InvalidHashrate => ExtendedChannelError::InvalidNominalHashrate,
            TargetError::InvalidSharesPerMinute => ExtendedChannelError::FailedToCreateChannel,
        },
    )
}

#[derive(Debug)]
pub struct ExtendedChannel<J>
where
    J: JobStore<ExtendedJob>,
{
    channel_id: u32,
    user_identity: String,
    extranonce_prefix: Vec<u8>,
    rollable_extranonce_size: u16,
    requested_min_rollable_extranonce_size: u16,
    requested_max_target: Target,
    target: Target,
    nominal_hashrate: f32,
    job_store: J,
    job_factory: JobFactory,
    share_accounting: ShareAccounting,
    expected_share_per_minute: f32,
    chain_tip: Option<ChainTip>,
}

impl<J> ExtendedChannel<J>
where
    J: JobStore<ExtendedJob>,
{
    /// Creates the channel with an already allocated `extranonce_prefix`.
    ///
    /// `pool_tag_string` goes in the coinbase scriptSig of template jobs as `/pool_tag_string//`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel_id: u32,
        user_identity: String,
        extranonce_prefix: Vec<u8>,
        max_target: Target,
        nominal_hashrate: f32,
        version_rolling_allowed: bool,
        requested_min_rollable_extranonce_size: u16,
        share_batch_size: usize,
        expected_share_per_minute: f32,
        job_store: J,
        pool_tag_string: Option<String>,
    ) -> Result<Self, ExtendedChannelError> {
        let target = channel_target(nominal_hashrate, expected_share_per_minute)?;
        if target > max_target {
            return Err(ExtendedChannelError::RequestedMaxTargetOutOfRange);
        }

        if extranonce_prefix.len() > MAX_EXTRANONCE_LEN {
            return Err(ExtendedChannelError::ExtranoncePrefixTooLarge);
        }
        let rollable_extranonce_size = (MAX_EXTRANONCE_LEN - extranonce_prefix.len()) as u16;
        if requested_min_rollable_extranonce_size > rollable_extranonce_size {
            return Err(ExtendedChannelError::RequestedMinExtranonceSizeTooLarge);
        }

        let job_factory = JobFactory::new(version_rolling_allowed, pool_tag_string);
        if job_factory.max_script_sig_len() > MAX_SCRIPT_SIG_LEN {
            return Err(ExtendedChannelError::ScriptSigSizeTooLarge);
        }

        debug!(
            "Opened extended channel {} for {} with target {}",
            channel_id, user_identity, target
        );

        Ok(Self {
            channel_id,
            user_identity,
            extranonce_prefix,
            rollable_extranonce_size,
            requested_min_rollable_extranonce_size,
            requested_max_target: max_target,
            target,
            nominal_hashrate,
            job_store,
            job_factory,
            share_accounting: ShareAccounting::new(share_batch_size),
            expected_share_per_minute,
            chain_tip: None,
        })
    }

    /// Opens a channel for an `OpenExtendedMiningChannel` request, allocating its extranonce
    /// prefix from `extranonce_prefix_factory`.
    ///
    /// No prefix is consumed when the request is rejected.
    pub fn open(
        channel_id: u32,
        request: &OpenExtendedMiningChannel,
        extranonce_prefix_factory: &ExtranoncePrefixFactoryExtended,
        policy: &PoolPolicy,
        job_store: J,
    ) -> Result<Self, ExtendedChannelError> {
        let user_identity = request
            .user_identity
            .as_utf8()
            .ok_or(ExtendedChannelError::FailedToCreateChannel)?
            .to_string();
        let max_target = Target::from(&request.max_target);

        let target = channel_target(
            request.nominal_hash_rate,
            policy.expected_shares_per_minute(),
        )?;
        if target > max_target {
            return Err(ExtendedChannelError::RequestedMaxTargetOutOfRange);
        }

        let extranonce_prefix = extranonce_prefix_factory
            .next_extranonce_prefix(request.min_extranonce_size as usize)?;

        Self::new(
            channel_id,
            user_identity,
            extranonce_prefix,
            max_target,
            request.nominal_hash_rate,
            policy.version_rolling_allowed(),
            request.min_extranonce_size,
            policy.share_batch_size(),
            policy.expected_shares_per_minute(),
            job_store,
            policy.pool_tag(),
        )
    }

    /// The `OpenExtendedMiningChannel.Success` answering `request_id`.
    pub fn get_open_success_message(
        &self,
        request_id: u32,
    ) -> Result<OpenExtendedMiningChannelSuccess, ExtendedChannelError> {
        Ok(OpenExtendedMiningChannelSuccess {
            request_id,
            channel_id: self.channel_id,
            target: self.target.into(),
            extranonce_size: self.rollable_extranonce_size,
            extranonce_prefix: self
                .extranonce_prefix
                .clone()
                .try_into()
                .map_err(|_| ExtendedChannelError::ExtranoncePrefixTooLarge)?,
        })
    }

    pub fn get_channel_id(&self) -> u32 {
        self.channel_id
    }

    pub fn get_user_identity(&self) -> &str {
        &self.user_identity
    }

    pub fn get_extranonce_prefix(&self) -> &[u8] {
        &self.extranonce_prefix
    }

    pub fn get_rollable_extranonce_size(&self) -> u16 {
        self.rollable_extranonce_size
    }

    /// Changes the prefix of the jobs created from now on. Shares for older jobs are still
    /// validated with the prefix of their job.
    ///
    /// The miner keeps at least the rollable bytes it asked for when opening the channel.
    pub fn set_extranonce_prefix(
        &mut self,
        extranonce_prefix: Vec<u8>,
    ) -> Result<(), ExtendedChannelError> {
        if extranonce_prefix.len() > MAX_EXTRANONCE_LEN {
            return Err(ExtendedChannelError::ExtranoncePrefixTooLarge);
        }
        let rollable_extranonce_size = (MAX_EXTRANONCE_LEN - extranonce_prefix.len()) as u16;
        if rollable_extranonce_size < self.requested_min_rollable_extranonce_size {
            return Err(ExtendedChannelError::ExtranoncePrefixTooLarge);
        }
        self.extranonce_prefix = extranonce_prefix;
        self.rollable_extranonce_size = rollable_extranonce_size;
        Ok(())
    }

    pub fn get_chain_tip(&self) -> Option<&ChainTip> {
        self.chain_tip.as_ref()
    }

    /// Sets the chain tip without a `SetNewPrevHash`, e.g. for a channel opened after the last
    /// one was received. Non-future templates need a chain tip.
    pub fn set_chain_tip(&mut self, chain_tip: ChainTip) {
        self.chain_tip = Some(chain_tip);
    }

    pub fn get_target(&self) -> &Target {
        &self.target
    }

    pub fn get_requested_max_target(&self) -> &Target {
        &self.requested_max_target
    }

    pub fn get_nominal_hashrate(&self) -> f32 {
        self.nominal_hashrate
    }

    pub fn get_shares_per_minute(&self) -> f32 {
        self.expected_share_per_minute
    }

    /// The `SetTarget` to send after the target changed.
    pub fn get_set_target_message(&self) -> SetTarget {
        SetTarget {
            channel_id: self.channel_id,
            maximum_target: self.target.into(),
        }
    }

    /// Recomputes the target for `new_nominal_hashrate`, capped by `requested_max_target` (or
    /// the max target already known for the channel).
    ///
    /// Used on `UpdateChannel`, or when the pool estimates a new hashrate for the miner.
    pub fn update_channel(
        &mut self,
        new_nominal_hashrate: f32,
        requested_max_target: Option<Target>,
    ) -> Result<(), ExtendedChannelError> {
        let target = channel_target(new_nominal_hashrate, self.expected_share_per_minute)?;
        let max_target = requested_max_target.unwrap_or(self.requested_max_target);
        let new_target = target.min(max_target);

        debug!(
            "Updating target of channel {}\nold target:\t{}\nnew target:\t{}\nmax target:\t{}",
            self.channel_id, self.target, new_target, max_target
        );

        self.nominal_hashrate = new_nominal_hashrate;
        self.requested_max_target = max_target;
        self.target = new_target;
        Ok(())
    }

    pub fn get_active_job(&self) -> Option<&ExtendedJob> {
        self.job_store.get_active_job()
    }

    pub fn get_future_jobs(&self) -> &HashMap<u32, ExtendedJob> {
        self.job_store.get_future_jobs()
    }

    pub fn get_past_jobs(&self) -> &HashMap<u32, ExtendedJob> {
        self.job_store.get_past_jobs()
    }

    pub fn get_stale_jobs(&self) -> &HashMap<u32, ExtendedJob> {
        self.job_store.get_stale_jobs()
    }

    pub fn get_future_template_to_job_id(&self) -> &HashMap<u64, u32> {
        self.job_store.get_future_template_to_job_id()
    }

    pub fn get_share_accounting(&self) -> &ShareAccounting {
        &self.share_accounting
    }

    /// Creates a job for `template`: a future job waiting for its `SetNewPrevHash`, or the new
    /// active job if the template is for the current chain tip.
    pub fn on_new_template(
        &mut self,
        template: NewTemplate,
        coinbase_reward_outputs: Vec<TxOut>,
    ) -> Result<(), ExtendedChannelError> {
        let template_id = template.template_id;
        if template.future_template {
            let job = self.job_factory.new_extended_job(
                self.channel_id,
                None,
                self.extranonce_prefix.clone(),
                template,
                coinbase_reward_outputs,
            )?;
            self.job_store.add_future_job(template_id, job);
        } else {
            let chain_tip = self
                .chain_tip
                .as_ref()
                .ok_or(ExtendedChannelError::ChainTipNotSet)?;
            let job = self.job_factory.new_extended_job(
                self.channel_id,
                Some(chain_tip),
                self.extranonce_prefix.clone(),
                template,
                coinbase_reward_outputs,
            )?;
            self.job_store.add_active_job(job);
        }
        Ok(())
    }

    /// Activates the future job of the template, with `header_timestamp` as `min_ntime`.
    ///
    /// Jobs of the previous chain tip become stale. Fails with `TemplateIdNotFound` if no future
    /// job was created for the template, the channel is left untouched.
    pub fn on_set_new_prev_hash(
        &mut self,
        set_new_prev_hash: SetNewPrevHashTdp,
    ) -> Result<(), ExtendedChannelError> {
        if !self.job_store.activate_future_job(
            set_new_prev_hash.template_id,
            set_new_prev_hash.header_timestamp,
        ) {
            warn!(
                "Channel {}: no future job for template {}",
                self.channel_id, set_new_prev_hash.template_id
            );
            return Err(ExtendedChannelError::TemplateIdNotFound);
        }

        self.share_accounting.flush_seen_shares();
        self.chain_tip = Some(set_new_prev_hash.into());
        Ok(())
    }

    /// Makes the job declared by the miner the active job, and returns its `job_id`.
    ///
    /// `prev_hash`, `nbits` and `min_ntime` of the message are assumed to be checked already,
    /// they become the chain tip of the channel. If `prev_hash` changed, older jobs are stale.
    pub fn on_set_custom_mining_job(
        &mut self,
        set_custom_mining_job: SetCustomMiningJob,
    ) -> Result<u32, ExtendedChannelError> {
        if set_custom_mining_job.channel_id != self.channel_id {
            return Err(ExtendedChannelError::InvalidJobOrigin);
        }

        let chain_tip = ChainTip::new(
            set_custom_mining_job.prev_hash.clone(),
            set_custom_mining_job.nbits,
            set_custom_mining_job.min_ntime,
        );
        let job = self.job_factory.new_extended_job_from_custom_job(
            set_custom_mining_job,
            self.extranonce_prefix.clone(),
        )?;
        let job_id = job.get_job_id();
        self.job_store.add_active_job(job);

        let new_tip = self
            .chain_tip
            .as_ref()
            .map_or(true, |tip| tip.prev_hash() != chain_tip.prev_hash());
        if new_tip {
            self.job_store.mark_past_jobs_as_stale();
            self.share_accounting.flush_seen_shares();
        }
        self.chain_tip = Some(chain_tip);

        Ok(job_id)
    }

    /// Validates a share and updates the share accounting of the channel.
    pub fn validate_share(
        &mut self,
        share: SubmitSharesExtended,
    ) -> Result<ShareValidationResult, ShareValidationError> {
        let job = lookup_job(&self.job_store, share.job_id)?;

        if job.get_extranonce_prefix().len() + share.extranonce.len() != MAX_EXTRANONCE_LEN {
            return Err(ShareValidationError::BadExtranonceSize);
        }
        let full_extranonce =
            [job.get_extranonce_prefix(), share.extranonce.inner_as_ref()].concat();

        let merkle_root = merkle_root_from_path(
            job.get_coinbase_tx_prefix_without_bip141(),
            job.get_coinbase_tx_suffix_without_bip141(),
            &full_extranonce,
            job.get_merkle_path().inner_as_ref(),
        )
        .ok_or(ShareValidationError::Invalid)?;

        let chain_tip = self
            .chain_tip
            .as_ref()
            .ok_or(ShareValidationError::NoChainTip)?;

        if !job.version_rolling_allowed() && share.version & VERSION_ROLLING_MASK != 0 {
            return Err(ShareValidationError::VersionRollingNotAllowed);
        }

        let header = ShareHeader {
            version: share.version,
            merkle_root,
            ntime: share.ntime,
            nonce: share.nonce,
        };
        check_share_header(
            &mut self.share_accounting,
            &self.target,
            chain_tip,
            header,
            share.sequence_number,
            || {
                (
                    job.get_template_id(),
                    job.coinbase_with_extranonce(&full_extranonce),
                )
            },
        )
    }
}

impl<J> Channel for ExtendedChannel<J>
where
    J: JobStore<ExtendedJob>,
{
    type Job = ExtendedJob;

    fn get_channel_id(&self) -> u32 {
        self.channel_id
    }

    fn get_target(&self) -> &Target {
        &self.target
    }

    fn get_extranonce_prefix(&self) -> &[u8] {
        &self.extranonce_prefix
    }

    fn get_chain_tip(&self) -> Option<&ChainTip> {
        self.chain_tip.as_ref()
    }

    fn get_active_job(&self) -> Option<&ExtendedJob> {
        self.job_store.get_active_job()
    }

    fn get_future_jobs(&self) -> &HashMap<u32, ExtendedJob> {
        self.job_store.get_future_jobs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use binary_sv2::U256;
    use crate::{
        server::jobs::{
            factory::tests::{custom_job, extranonce_prefix, reward_outputs, template},
            job_store::DefaultJobStore,
        },
    };

    const FUTURE_PREV_HASH: [u8; 32] = [
        200, 53, 253, 129, 214, 31, 43, 84, 179, 58, 58, 76, 128, 213, 24, 53, 38, 144, 205, 88,
        172, 20, 251, 22, 217, 141, 21, 221, 21, 0, 0, 0,
    ];

    fn channel_with(
        nominal_hashrate: f32,
        version_rolling_allowed: bool,
    ) -> ExtendedChannel<DefaultJobStore<ExtendedJob>> {
        let extranonce_prefix = extranonce_prefix();
        let rollable_extranonce_size = (MAX_EXTRANONCE_LEN - extranonce_prefix.len()) as u16;
        ExtendedChannel::new(
            1,
            "user_identity".to_string(),
            extranonce_prefix,
            [0xff; 32].into(),
            nominal_hashrate,
            version_rolling_allowed,
            rollable_extranonce_size,
            100,
            1.0,
            DefaultJobStore::new(),
            None,
        )
        .unwrap()
    }

    fn prev_hash_for(template_id: u64) -> SetNewPrevHashTdp {
        SetNewPrevHashTdp {
            template_id,
            prev_hash: FUTURE_PREV_HASH.into(),
            header_timestamp: 1746839905,
            n_bits: 503543726,
            target: [0xff; 32].into(),
        }
    }

    fn share(job_id: u32, sequence_number: u32, nonce: u32, ntime: u32) -> SubmitSharesExtended {
        SubmitSharesExtended {
            channel_id: 1,
            sequence_number,
            job_id,
            nonce,
            ntime,
            version: 536870912,
            extranonce: vec![1, 0, 0, 0, 0].try_into().unwrap(),
        }
    }

    #[test]
    fn future_job_is_activated_by_its_prev_hash() {
        let mut channel = channel_with(10.0, true);
        channel
            .on_new_template(template(1, true), reward_outputs())
            .unwrap();

        assert!(channel.get_active_job().is_none());
        assert_eq!(channel.get_future_template_to_job_id().get(&1), Some(&1));
        let future_job = channel.get_future_jobs().get(&1).unwrap();
        assert!(future_job.is_future());
        assert_eq!(future_job.get_job_message().channel_id, 1);

        channel.on_set_new_prev_hash(prev_hash_for(1)).unwrap();

        let active_job = channel.get_active_job().unwrap();
        assert_eq!(active_job.get_job_id(), 1);
        assert_eq!(active_job.get_min_ntime(), Some(1746839905));
        assert!(channel.get_future_jobs().is_empty());
        assert_eq!(
            channel.get_chain_tip(),
            Some(&ChainTip::new(FUTURE_PREV_HASH.into(), 503543726, 1746839905))
        );
    }

    #[test]
    fn prev_hash_for_unknown_template_is_rejected() {
        let mut channel = channel_with(10.0, true);
        channel
            .on_new_template(template(1, true), reward_outputs())
            .unwrap();

        assert_eq!(
            channel.on_set_new_prev_hash(prev_hash_for(2)),
            Err(ExtendedChannelError::TemplateIdNotFound)
        );
        assert!(channel.get_chain_tip().is_none());
        assert!(channel.get_future_jobs().contains_key(&1));
        assert!(channel.get_active_job().is_none());
    }

    #[test]
    fn non_future_template_replaces_active_job() {
        let mut channel = channel_with(10.0, true);
        assert_eq!(
            channel.on_new_template(template(1, false), reward_outputs()),
            Err(ExtendedChannelError::ChainTipNotSet)
        );

        channel.set_chain_tip(ChainTip::new(FUTURE_PREV_HASH.into(), 503543726, 1746839905));
        channel
            .on_new_template(template(1, false), reward_outputs())
            .unwrap();
        let first = channel.get_active_job().unwrap().get_job_id();
        channel
            .on_new_template(template(2, false), reward_outputs())
            .unwrap();
        let second = channel.get_active_job().unwrap().get_job_id();

        assert_ne!(first, second);
        assert!(channel.get_past_jobs().contains_key(&first));
        assert_eq!(channel.get_active_job().unwrap().get_min_ntime(), Some(1746839905));
    }

    #[test]
    fn custom_job_gets_a_fresh_job_id() {
        let mut channel = channel_with(10.0, true);
        channel.set_chain_tip(ChainTip::new(FUTURE_PREV_HASH.into(), 503543726, 1746839905));
        channel
            .on_new_template(template(1, false), reward_outputs())
            .unwrap();
        let template_job_id = channel.get_active_job().unwrap().get_job_id();

        let job_id = channel.on_set_custom_mining_job(custom_job(1)).unwrap();

        assert_ne!(job_id, template_job_id);
        let active_job = channel.get_active_job().unwrap();
        assert_eq!(active_job.get_job_id(), job_id);
        assert_eq!(active_job.get_template_id(), None);
        assert_eq!(active_job.get_min_ntime(), Some(1746839905));
        // the custom job moved the channel to another prev hash
        assert!(channel.get_stale_jobs().contains_key(&template_job_id));
        assert_eq!(
            channel.get_chain_tip().unwrap().prev_hash(),
            &U256::from([1; 32])
        );
    }

    #[test]
    fn custom_job_for_another_channel_is_rejected() {
        let mut channel = channel_with(10.0, true);
        assert_eq!(
            channel.on_set_custom_mining_job(custom_job(2)),
            Err(ExtendedChannelError::InvalidJobOrigin)
        );
        assert!(channel.get_active_job().is_none());
    }

    #[test]
    fn update_channel_recomputes_target() {
        let mut channel = channel_with(10.0, true);
        let initial_target = *channel.get_target();

        channel.update_channel(100.0, None).unwrap();
        assert_ne!(*channel.get_target(), initial_target);
        assert!(*channel.get_target() < initial_target);
        assert!(channel.get_target() <= channel.get_requested_max_target());
        assert_eq!(channel.get_nominal_hashrate(), 100.0);

        // a lower hashrate asks for an easier target than the max the miner accepts
        let max_target = hash_rate_to_target(100.0, 1.0).unwrap();
        channel.update_channel(1.0, Some(max_target)).unwrap();
        assert_eq!(*channel.get_target(), max_target);

        assert_eq!(
            channel.update_channel(0.0, None),
            Err(ExtendedChannelError::InvalidNominalHashrate)
        );
        assert_eq!(*channel.get_target(), max_target);
        assert_eq!(
            Target::from(&channel.get_set_target_message().maximum_target),
            max_target
        );
    }

    #[test]
    fn construction_errors() {
        let new_channel =
            |hashrate: f32, max_target: Target, min_rollable: u16, tag: Option<String>| {
                ExtendedChannel::new(
                    1,
                    "user_identity".to_string(),
                    extranonce_prefix(),
                    max_target,
                    hashrate,
                    true,
                    min_rollable,
                    100,
                    1.0,
                    DefaultJobStore::new(),
                    tag,
                )
                .map(|_| ())
            };

        assert_eq!(
            new_channel(0.0, Target::MAX, 5, None),
            Err(ExtendedChannelError::InvalidNominalHashrate)
        );
        assert_eq!(
            new_channel(f32::NAN, Target::MAX, 5, None),
            Err(ExtendedChannelError::InvalidNominalHashrate)
        );
        assert_eq!(
            new_channel(10.0, [0; 32].into(), 5, None),
            Err(ExtendedChannelError::RequestedMaxTargetOutOfRange)
        );
        assert_eq!(
            new_channel(10.0, Target::MAX, 6, None),
            Err(ExtendedChannelError::RequestedMinExtranonceSizeTooLarge)
        );
        assert_eq!(
            new_channel(10.0, Target::MAX, 5, Some("x".repeat(59))),
            Err(ExtendedChannelError::ScriptSigSizeTooLarge)
        );
        assert_eq!(new_channel(10.0, Target::MAX, 5, Some("x".repeat(58))), Ok(()));
    }

    #[test]
    fn extranonce_prefix_update_keeps_requested_rolling_bytes() {
        let mut channel = channel_with(10.0, true);
        assert_eq!(
            channel.set_extranonce_prefix(vec![0; 28]),
            Err(ExtendedChannelError::ExtranoncePrefixTooLarge)
        );
        channel.set_extranonce_prefix(vec![0; 26]).unwrap();
        assert_eq!(channel.get_rollable_extranonce_size(), 6);
        assert_eq!(channel.get_extranonce_prefix(), &[0; 26][..]);
    }

    #[test]
    fn open_allocates_prefix_from_factory() {
        let factory = ExtranoncePrefixFactoryExtended::new(8, vec![1]).unwrap();
        let policy = PoolPolicy::new(1.0, 10, String::new(), "51".to_string()).unwrap();
        let request = OpenExtendedMiningChannel {
            request_id: 3,
            user_identity: "miner".try_into().unwrap(),
            nominal_hash_rate: 1000.0,
            max_target: [0xff; 32].into(),
            min_extranonce_size: 4,
        };

        let channel =
            ExtendedChannel::open(7, &request, &factory, &policy, DefaultJobStore::new()).unwrap();
        assert_eq!(channel.get_extranonce_prefix().len(), 24);
        assert_eq!(channel.get_rollable_extranonce_size(), 8);
        assert_eq!(channel.get_user_identity(), "miner");

        let success = channel.get_open_success_message(3).unwrap();
        assert_eq!(success.channel_id, 7);
        assert_eq!(success.extranonce_size, 8);
        assert_eq!(success.extranonce_prefix.inner_as_ref(), channel.get_extranonce_prefix());
        assert_eq!(Target::from(&success.target), *channel.get_target());

        let too_large = OpenExtendedMiningChannel {
            min_extranonce_size: 9,
            ..request.clone()
        };
        let error = ExtendedChannel::open(8, &too_large, &factory, &policy, DefaultJobStore::new())
            .unwrap_err();
        assert_eq!(error, ExtendedChannelError::RequestedMinExtranonceSizeTooLarge);
        assert_eq!(error.as_error_code(), "min-extranonce-size-too-large");
        assert_eq!(factory.get_counter(), Ok(1));

        let bad_hashrate = OpenExtendedMiningChannel {
            nominal_hash_rate: -1.0,
            ..request
        };
        let error =
            ExtendedChannel::open(9, &bad_hashrate, &factory, &policy, DefaultJobStore::new())
                .unwrap_err();
        assert_eq!(error.as_error_code(), "invalid-nominal-hashrate");
        assert_eq!(factory.get_counter(), Ok(1));
    }

    #[test]
    fn share_finds_block() {
        let mut channel = channel_with(1.0, true);
        // network target 7fffff0000000000000000000000000000000000000000000000000000000000
        let prev_hash = [
            251, 175, 106, 40, 35, 87, 122, 90, 58, 51, 78, 32, 202, 236, 228, 36, 154, 174, 206,
            144, 147, 195, 21, 224, 195, 103, 214, 189, 51, 190, 24, 98,
        ];
        channel.set_chain_tip(ChainTip::new(prev_hash.into(), 545259519, 1745596910));
        channel
            .on_new_template(template(1, false), reward_outputs())
            .unwrap();

        let result = channel.validate_share(share(1, 0, 0, 1745596971)).unwrap();

        let mut full_extranonce = extranonce_prefix();
        full_extranonce.extend_from_slice(&[1, 0, 0, 0, 0]);
        let coinbase = channel
            .get_active_job()
            .unwrap()
            .coinbase_with_extranonce(&full_extranonce);
        assert_eq!(result, ShareValidationResult::BlockFound(Some(1), coinbase));
    }

    #[test]
    fn share_below_channel_difficulty() {
        let mut channel = channel_with(100.0, true);
        // network target 000000000000d7c0000000000000000000000000000000000000000000000000
        let prev_hash = [
            154, 124, 239, 231, 221, 122, 160, 173, 164, 175, 87, 33, 74, 214, 191, 107, 73, 34, 0,
            162, 227, 16, 44, 40, 33, 73, 0, 0, 0, 0, 0, 0,
        ];
        channel.set_chain_tip(ChainTip::new(prev_hash.into(), 453040064, 1745596910));
        channel
            .on_new_template(template(1, false), reward_outputs())
            .unwrap();

        assert_eq!(
            channel.validate_share(share(1, 0, 741057, 1745596971)),
            Err(ShareValidationError::DoesNotMeetTarget)
        );
    }

    #[test]
    fn valid_share_then_duplicate() {
        let mut channel = channel_with(1_000.0, true);
        let prev_hash = [
            23, 205, 72, 134, 153, 86, 220, 153, 224, 28, 216, 146, 228, 120, 227, 157, 213, 99,
            160, 163, 128, 59, 139, 190, 158, 62, 0, 0, 0, 0, 0, 0,
        ];
        channel.set_chain_tip(ChainTip::new(prev_hash.into(), 453040064, 1745611105));
        channel
            .on_new_template(template(1, false), reward_outputs())
            .unwrap();

        assert_eq!(
            channel.validate_share(share(1, 1, 109053, 1745611105)),
            Ok(ShareValidationResult::Valid)
        );
        assert_eq!(channel.get_share_accounting().get_shares_accepted(), 1);
        assert_eq!(channel.get_share_accounting().get_last_share_sequence_number(), 1);

        // same share, another sequence number
        assert_eq!(
            channel.validate_share(share(1, 2, 109053, 1745611105)),
            Err(ShareValidationError::DuplicateShare)
        );
        assert_eq!(channel.get_share_accounting().get_shares_accepted(), 1);
    }

    #[test]
    fn shares_for_unknown_or_stale_jobs() {
        let mut channel = channel_with(10.0, true);
        channel.set_chain_tip(ChainTip::new([3; 32].into(), 503543726, 1746839000));
        channel
            .on_new_template(template(1, false), reward_outputs())
            .unwrap();
        channel
            .on_new_template(template(2, true), reward_outputs())
            .unwrap();
        channel.on_set_new_prev_hash(prev_hash_for(2)).unwrap();

        assert_eq!(
            channel.validate_share(share(1, 0, 0, 1746839905)),
            Err(ShareValidationError::Stale)
        );
        assert_eq!(
            channel.validate_share(share(99, 0, 0, 1746839905)),
            Err(ShareValidationError::InvalidJobId)
        );

        let mut short_extranonce = share(2, 0, 0, 1746839905);
        short_extranonce.extranonce = vec![1, 0, 0, 0].try_into().unwrap();
        assert_eq!(
            channel.validate_share(short_extranonce),
            Err(ShareValidationError::BadExtranonceSize)
        );
    }

    #[test]
    fn open_follows_the_policy_on_version_rolling() {
        let factory = ExtranoncePrefixFactoryExtended::new(8, vec![1]).unwrap();
        let policy = PoolPolicy::new(1.0, 10, String::new(), "51".to_string())
            .unwrap()
            .with_version_rolling_allowed(false);
        let request = OpenExtendedMiningChannel {
            request_id: 1,
            user_identity: "miner".try_into().unwrap(),
            nominal_hash_rate: 10.0,
            max_target: [0xff; 32].into(),
            min_extranonce_size: 4,
        };
        let mut channel =
            ExtendedChannel::open(1, &request, &factory, &policy, DefaultJobStore::new()).unwrap();
        channel.set_chain_tip(ChainTip::new([3; 32].into(), 545259519, 1746839000));
        channel
            .on_new_template(template(1, false), reward_outputs())
            .unwrap();
        assert!(!channel.get_active_job().unwrap().version_rolling_allowed());
        assert!(!channel.get_active_job().unwrap().get_job_message().version_rolling_allowed);
    }

    #[test]
    fn version_rolling_can_be_forbidden() {
        let mut channel = channel_with(10.0, false);
        channel.set_chain_tip(ChainTip::new([3; 32].into(), 545259519, 1746839000));
        channel
            .on_new_template(template(1, false), reward_outputs())
            .unwrap();
        assert!(!channel.get_active_job().unwrap().version_rolling_allowed());

        let mut rolled = share(1, 0, 0, 1746839905);
        rolled.version |= 1 << 13;
        assert_eq!(
            channel.validate_share(rolled),
            Err(ShareValidationError::VersionRollingNotAllowed)
        );
    }
}
