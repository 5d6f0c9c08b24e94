//! # Standard Channel
//!
//! Server side state of a Sv2 standard channel, for header-only mining devices. The whole
//! extranonce (32 bytes) is fixed by the server, jobs carry a merkle root instead of a coinbase.
//!
//! A standard channel may belong to a group channel, in which case its jobs come from the group
//! through [`StandardChannel::on_group_channel_job`].
use std::{collections::HashMap, convert::TryInto};

use bitcoin::transaction::TxOut;
use mining_sv2::{
    OpenStandardMiningChannel, OpenStandardMiningChannelSuccess, SetTarget, SubmitSharesStandard,
    MAX_EXTRANONCE_LEN,
};
use template_distribution_sv2::{NewTemplate, SetNewPrevHash as SetNewPrevHashTdp};
use tracing::{debug, warn};

use crate::{
    chain_tip::ChainTip,
    extranonce_prefix::ExtranoncePrefixFactoryStandard,
    policy::PoolPolicy,
    server::{
        check_share_header,
        error::StandardChannelError,
        jobs::{
            extended::ExtendedJob,
            factory::{JobFactory, MAX_SCRIPT_SIG_LEN},
            job_store::JobStore,
            standard::StandardJob,
            Job,
        },
        lookup_job,
        share_accounting::{ShareAccounting, ShareValidationError, ShareValidationResult},
        Channel, ShareHeader,
    },
    target::{hash_rate_to_target, Target, TargetError},
};

fn channel_target(
    nominal_hashrate: f32,
    expected_share_per_minute: f32,
) -> Result<Target, StandardChannelError> {
    hash_rate_to_target(nominal_hashrate.into(), expected_share_per_minute.into()).map_err(
        |e| match e {
            TargetError::InvalidHashrate => StandardChannelError::InvalidNominalHashrate,
            TargetError::InvalidSharesPerMinute => StandardChannelError::FailedToCreateChannel,
        },
    )
}

#[derive(Debug)]
pub struct StandardChannel<J>
where
    J: JobStore<StandardJob>,
{
    channel_id: u32,
    user_identity: String,
    extranonce_prefix: Vec<u8>,
    requested_max_target: Target,
    target: Target,
    nominal_hashrate: f32,
    job_store: J,
    job_factory: JobFactory,
    share_accounting: ShareAccounting,
    expected_share_per_minute: f32,
    chain_tip: Option<ChainTip>,
}

impl<J> StandardChannel<J>
where
    J: JobStore<StandardJob>,
{
    /// Creates the channel with an already allocated 32 bytes `extranonce_prefix`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        channel_id: u32,
        user_identity: String,
        extranonce_prefix: Vec<u8>,
        max_target: Target,
        nominal_hashrate: f32,
        share_batch_size: usize,
        expected_share_per_minute: f32,
        job_store: J,
        pool_tag_string: Option<String>,
    ) -> Result<Self, StandardChannelError> {
        let target = channel_target(nominal_hashrate, expected_share_per_minute)?;
        if target > max_target {
            return Err(StandardChannelError::RequestedMaxTargetOutOfRange);
        }

        if extranonce_prefix.len() != MAX_EXTRANONCE_LEN {
            return Err(StandardChannelError::InvalidExtranoncePrefixLength);
        }

        // version rolling is always allowed on header-only mining
        let job_factory = JobFactory::new(true, pool_tag_string);
        if job_factory.max_script_sig_len() > MAX_SCRIPT_SIG_LEN {
            return Err(StandardChannelError::ScriptSigSizeTooLarge);
        }

        debug!(
            "Opened standard channel {} for {} with target {}",
            channel_id, user_identity, target
        );

        Ok(Self {
            channel_id,
            user_identity,
            extranonce_prefix,
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

    /// Opens a channel for an `OpenStandardMiningChannel` request, allocating its extranonce
    /// prefix from `extranonce_prefix_factory`.
    pub fn open(
        channel_id: u32,
        request: &OpenStandardMiningChannel,
        extranonce_prefix_factory: &ExtranoncePrefixFactoryStandard,
        policy: &PoolPolicy,
        job_store: J,
    ) -> Result<Self, StandardChannelError> {
        let user_identity = request
            .user_identity
            .as_utf8()
            .ok_or(StandardChannelError::FailedToCreateChannel)?
            .to_string();
        let max_target = Target::from(&request.max_target);

        let target = channel_target(
            request.nominal_hash_rate,
            policy.expected_shares_per_minute(),
        )?;
        if target > max_target {
            return Err(StandardChannelError::RequestedMaxTargetOutOfRange);
        }

        let extranonce_prefix = extranonce_prefix_factory.next_extranonce_prefix()?;

        Self::new(
            channel_id,
            user_identity,
            extranonce_prefix,
            max_target,
            request.nominal_hash_rate,
            policy.share_batch_size(),
            policy.expected_shares_per_minute(),
            job_store,
            policy.pool_tag(),
        )
    }

    /// The `OpenStandardMiningChannel.Success` answering `request_id`.
    pub fn get_open_success_message(
        &self,
        request_id: u32,
        group_channel_id: u32,
    ) -> Result<OpenStandardMiningChannelSuccess, StandardChannelError> {
        Ok(OpenStandardMiningChannelSuccess {
            request_id,
            channel_id: self.channel_id,
            target: self.target.into(),
            extranonce_prefix: self
                .extranonce_prefix
                .clone()
                .try_into()
                .map_err(|_| StandardChannelError::InvalidExtranoncePrefixLength)?,
            group_channel_id,
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

    /// Only affects jobs created afterwards.
    pub fn set_extranonce_prefix(
        &mut self,
        extranonce_prefix: Vec<u8>,
    ) -> Result<(), StandardChannelError> {
        if extranonce_prefix.len() != MAX_EXTRANONCE_LEN {
            return Err(StandardChannelError::InvalidExtranoncePrefixLength);
        }
        self.extranonce_prefix = extranonce_prefix;
        Ok(())
    }

    pub fn get_chain_tip(&self) -> Option<&ChainTip> {
        self.chain_tip.as_ref()
    }

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

    pub fn get_set_target_message(&self) -> SetTarget {
        SetTarget {
            channel_id: self.channel_id,
            maximum_target: self.target.into(),
        }
    }

    /// Recomputes the target for `new_nominal_hashrate`, capped by `requested_max_target` (or
    /// the max target already known for the channel).
    pub fn update_channel(
        &mut self,
        new_nominal_hashrate: f32,
        requested_max_target: Option<Target>,
    ) -> Result<(), StandardChannelError> {
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

    pub fn get_active_job(&self) -> Option<&StandardJob> {
        self.job_store.get_active_job()
    }

    pub fn get_future_jobs(&self) -> &HashMap<u32, StandardJob> {
        self.job_store.get_future_jobs()
    }

    pub fn get_past_jobs(&self) -> &HashMap<u32, StandardJob> {
        self.job_store.get_past_jobs()
    }

    pub fn get_stale_jobs(&self) -> &HashMap<u32, StandardJob> {
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
    ///
    /// Standard channels that are part of a group get their jobs from
    /// [`Self::on_group_channel_job`] instead.
    pub fn on_new_template(
        &mut self,
        template: NewTemplate,
        coinbase_reward_outputs: Vec<TxOut>,
    ) -> Result<(), StandardChannelError> {
        let template_id = template.template_id;
        if template.future_template {
            let job = self.job_factory.new_standard_job(
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
                .ok_or(StandardChannelError::ChainTipNotSet)?;
            let job = self.job_factory.new_standard_job(
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

    /// Takes a job of the group channel, with the merkle root computed for the extranonce prefix
    /// of this channel. The job keeps the `job_id` given by the group.
    pub fn on_group_channel_job(
        &mut self,
        group_channel_job: ExtendedJob,
    ) -> Result<(), StandardChannelError> {
        let job =
            group_channel_job.into_standard_job(self.channel_id, self.extranonce_prefix.clone())?;
        match job.get_template_id() {
            Some(template_id) if job.is_future() => {
                self.job_store.add_future_job(template_id, job);
            }
            _ => self.job_store.add_active_job(job),
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
    ) -> Result<(), StandardChannelError> {
        if !self.job_store.activate_future_job(
            set_new_prev_hash.template_id,
            set_new_prev_hash.header_timestamp,
        ) {
            warn!(
                "Channel {}: no future job for template {}",
                self.channel_id, set_new_prev_hash.template_id
            );
            return Err(StandardChannelError::TemplateIdNotFound);
        }

        self.share_accounting.flush_seen_shares();
        self.chain_tip = Some(set_new_prev_hash.into());
        Ok(())
    }

    /// Validates a share and updates the share accounting of the channel.
    pub fn validate_share(
        &mut self,
        share: SubmitSharesStandard,
    ) -> Result<ShareValidationResult, ShareValidationError> {
        let job = lookup_job(&self.job_store, share.job_id)?;

        let chain_tip = self
            .chain_tip
            .as_ref()
            .ok_or(ShareValidationError::NoChainTip)?;

        let header = ShareHeader {
            version: share.version,
            merkle_root: job.get_merkle_root().to_array(),
            ntime: share.ntime,
            nonce: share.nonce,
        };
        check_share_header(
            &mut self.share_accounting,
            &self.target,
            chain_tip,
            header,
            share.sequence_number,
            || (job.get_template_id(), job.coinbase()),
        )
    }
}

impl<J> Channel for StandardChannel<J>
where
    J: JobStore<StandardJob>,
{
    type Job = StandardJob;

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

    fn get_active_job(&self) -> Option<&StandardJob> {
        self.job_store.get_active_job()
    }

    fn get_future_jobs(&self) -> &HashMap<u32, StandardJob> {
        self.job_store.get_future_jobs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::jobs::{
        error::ExtendedJobError,
        factory::tests::{
            custom_job, reward_outputs, template, SATS_AVAILABLE_IN_TEMPLATE, TEMPLATE_OUTPUTS,
        },
        job_store::DefaultJobStore,
    };

    // `Stratum V2 SRI Pool` followed by a counter of 1
    fn standard_extranonce_prefix() -> Vec<u8> {
        let mut prefix = b"Stratum V2 SRI Pool".to_vec();
        prefix.extend_from_slice(&[0; 12]);
        prefix.push(1);
        prefix
    }

    fn standard_template(template_id: u64) -> NewTemplate {
        NewTemplate {
            template_id,
            future_template: false,
            version: 536870912,
            coinbase_tx_version: 2,
            coinbase_prefix: vec![2, 159, 0, 0].try_into().unwrap(),
            coinbase_tx_input_sequence: 4294967294,
            coinbase_tx_value_remaining: SATS_AVAILABLE_IN_TEMPLATE,
            coinbase_tx_outputs_count: 1,
            coinbase_tx_outputs: TEMPLATE_OUTPUTS.to_vec().try_into().unwrap(),
            coinbase_tx_locktime: 158,
            merkle_path: vec![].try_into().unwrap(),
        }
    }

    fn channel_with(nominal_hashrate: f32) -> StandardChannel<DefaultJobStore<StandardJob>> {
        StandardChannel::new(
            1,
            "user_identity".to_string(),
            standard_extranonce_prefix(),
            [0xff; 32].into(),
            nominal_hashrate,
            100,
            1.0,
            DefaultJobStore::new(),
            None,
        )
        .unwrap()
    }

    fn share(job_id: u32, sequence_number: u32, nonce: u32, ntime: u32) -> SubmitSharesStandard {
        SubmitSharesStandard {
            channel_id: 1,
            sequence_number,
            job_id,
            nonce,
            ntime,
            version: 536870912,
        }
    }

    fn prev_hash_for(template_id: u64) -> SetNewPrevHashTdp {
        SetNewPrevHashTdp {
            template_id,
            prev_hash: [7; 32].into(),
            header_timestamp: 1746839905,
            n_bits: 503543726,
            target: [0xff; 32].into(),
        }
    }

    #[test]
    fn future_job_is_activated_by_its_prev_hash() {
        let mut channel = channel_with(10.0);
        let mut future_template = standard_template(1);
        future_template.future_template = true;
        channel
            .on_new_template(future_template, reward_outputs())
            .unwrap();
        assert!(channel.get_future_jobs().contains_key(&1));

        assert_eq!(
            channel.on_set_new_prev_hash(prev_hash_for(5)),
            Err(StandardChannelError::TemplateIdNotFound)
        );
        assert!(channel.get_chain_tip().is_none());

        channel.on_set_new_prev_hash(prev_hash_for(1)).unwrap();
        let active_job = channel.get_active_job().unwrap();
        assert_eq!(active_job.get_min_ntime(), Some(1746839905));
        assert_eq!(active_job.get_extranonce_prefix(), &standard_extranonce_prefix()[..]);
        assert!(channel.get_future_jobs().is_empty());
    }

    #[test]
    fn non_future_template_replaces_active_job() {
        let mut channel = channel_with(10.0);
        assert_eq!(
            channel.on_new_template(standard_template(1), reward_outputs()),
            Err(StandardChannelError::ChainTipNotSet)
        );

        channel.set_chain_tip(ChainTip::new([7; 32].into(), 503543726, 1746839905));
        channel
            .on_new_template(standard_template(1), reward_outputs())
            .unwrap();
        channel
            .on_new_template(standard_template(2), reward_outputs())
            .unwrap();

        assert_eq!(channel.get_active_job().unwrap().get_job_id(), 2);
        assert!(channel.get_past_jobs().contains_key(&1));
    }

    #[test]
    fn group_channel_jobs_follow_the_same_lifecycle() {
        let mut channel = channel_with(10.0);
        let mut group_factory = JobFactory::new(true, None);
        let group_job = group_factory
            .new_extended_job(100, None, vec![], template(1, true), reward_outputs())
            .unwrap();

        channel.on_group_channel_job(group_job).unwrap();
        assert_eq!(channel.get_future_template_to_job_id().get(&1), Some(&1));
        channel.on_set_new_prev_hash(prev_hash_for(1)).unwrap();

        // same merkle root as a job built for this channel alone
        let mut own_factory = JobFactory::new(true, None);
        let own_job = own_factory
            .new_standard_job(
                1,
                None,
                standard_extranonce_prefix(),
                template(1, true),
                reward_outputs(),
            )
            .unwrap();
        let active_job = channel.get_active_job().unwrap();
        assert_eq!(active_job.get_merkle_root(), own_job.get_merkle_root());
        assert_eq!(active_job.get_job_message().channel_id, 1);

        let custom = group_factory
            .new_extended_job_from_custom_job(custom_job(100), vec![])
            .unwrap();
        assert_eq!(
            channel.on_group_channel_job(custom),
            Err(StandardChannelError::FailedToConvertToStandardJob(
                ExtendedJobError::FailedToConvertToStandardJob
            ))
        );
    }

    #[test]
    fn construction_errors() {
        let result = StandardChannel::new(
            1,
            "user_identity".to_string(),
            vec![0; 31],
            Target::MAX,
            10.0,
            100,
            1.0,
            DefaultJobStore::new(),
            None,
        );
        assert_eq!(result.unwrap_err(), StandardChannelError::InvalidExtranoncePrefixLength);

        let result = StandardChannel::new(
            1,
            "user_identity".to_string(),
            vec![0; 33],
            Target::MAX,
            10.0,
            100,
            1.0,
            DefaultJobStore::new(),
            None,
        );
        assert_eq!(result.unwrap_err(), StandardChannelError::InvalidExtranoncePrefixLength);

        let result = StandardChannel::new(
            1,
            "user_identity".to_string(),
            standard_extranonce_prefix(),
            Target::MAX,
            -5.0,
            100,
            1.0,
            DefaultJobStore::new(),
            None,
        );
        let error = result.unwrap_err();
        assert_eq!(error, StandardChannelError::InvalidNominalHashrate);
        assert_eq!(error.as_error_code(), "invalid-nominal-hashrate");

        let result = StandardChannel::new(
            1,
            "user_identity".to_string(),
            standard_extranonce_prefix(),
            [0; 32].into(),
            10.0,
            100,
            1.0,
            DefaultJobStore::new(),
            None,
        );
        let error = result.unwrap_err();
        assert_eq!(error, StandardChannelError::RequestedMaxTargetOutOfRange);
        assert_eq!(error.as_error_code(), "max-target-out-of-range");
    }

    #[test]
    fn open_allocates_32_bytes_prefix() {
        let factory = ExtranoncePrefixFactoryStandard::new(vec![0xaa]).unwrap();
        let policy = PoolPolicy::new(6.0, 10, "pool".to_string(), "51".to_string()).unwrap();
        let request = OpenStandardMiningChannel {
            request_id: 4,
            user_identity: "device".try_into().unwrap(),
            nominal_hash_rate: 1e12,
            max_target: [0xff; 32].into(),
        };

        let channel =
            StandardChannel::open(2, &request, &factory, &policy, DefaultJobStore::new()).unwrap();
        let mut expected_prefix = vec![0xaa];
        expected_prefix.extend_from_slice(&[0; 30]);
        expected_prefix.push(1);
        assert_eq!(channel.get_extranonce_prefix(), &expected_prefix[..]);

        let success = channel.get_open_success_message(4, 9).unwrap();
        assert_eq!(success.group_channel_id, 9);
        assert_eq!(success.extranonce_prefix.inner_as_ref(), &expected_prefix[..]);
        assert_eq!(Target::from(&success.target), *channel.get_target());
    }

    #[test]
    fn extranonce_prefix_must_stay_32_bytes() {
        let mut channel = channel_with(10.0);
        assert_eq!(
            channel.set_extranonce_prefix(vec![1; 31]),
            Err(StandardChannelError::InvalidExtranoncePrefixLength)
        );
        assert_eq!(channel.get_extranonce_prefix(), &standard_extranonce_prefix()[..]);
        channel.set_extranonce_prefix(vec![1; 32]).unwrap();
        assert_eq!(channel.get_extranonce_prefix(), &[1; 32][..]);
    }

    #[test]
    fn update_channel_never_exceeds_max_target() {
        let mut channel = channel_with(1_000.0);
        let before = *channel.get_target();
        channel.update_channel(2_000.0, None).unwrap();
        assert!(*channel.get_target() < before);

        let max_target = hash_rate_to_target(5_000.0, 1.0).unwrap();
        channel.update_channel(10.0, Some(max_target)).unwrap();
        assert_eq!(*channel.get_target(), max_target);
        assert_eq!(channel.get_requested_max_target(), &max_target);
    }

    #[test]
    fn share_finds_block() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let mut channel = channel_with(1.0);
        // network target 7fffff0000000000000000000000000000000000000000000000000000000000
        let prev_hash = [
            251, 175, 106, 40, 35, 87, 122, 90, 58, 51, 78, 32, 202, 236, 228, 36, 154, 174, 206,
            144, 147, 195, 21, 224, 195, 103, 214, 189, 51, 190, 24, 98,
        ];
        channel.set_chain_tip(ChainTip::new(prev_hash.into(), 545259519, 1745596910));
        channel
            .on_new_template(standard_template(1), reward_outputs())
            .unwrap();

        let result = channel.validate_share(share(1, 0, 0, 1745596932)).unwrap();
        let coinbase = channel.get_active_job().unwrap().coinbase();
        assert_eq!(result, ShareValidationResult::BlockFound(Some(1), coinbase));
    }

    #[test]
    fn share_below_channel_difficulty() {
        let mut channel = channel_with(100.0);
        let prev_hash = [
            154, 124, 239, 231, 221, 122, 160, 173, 164, 175, 87, 33, 74, 214, 191, 107, 73, 34, 0,
            162, 227, 16, 44, 40, 33, 73, 0, 0, 0, 0, 0, 0,
        ];
        channel.set_chain_tip(ChainTip::new(prev_hash.into(), 453040064, 1745596910));
        channel
            .on_new_template(standard_template(1), reward_outputs())
            .unwrap();

        assert_eq!(
            channel.validate_share(share(1, 0, 3, 1745596932)),
            Err(ShareValidationError::DoesNotMeetTarget)
        );
    }

    #[test]
    fn valid_share_then_duplicate() {
        let mut channel = channel_with(1_000.0);
        // network target 000000000000d7c0000000000000000000000000000000000000000000000000
        let prev_hash = [
            154, 124, 239, 231, 221, 122, 160, 173, 164, 175, 87, 33, 74, 214, 191, 107, 73, 34, 0,
            162, 227, 16, 44, 40, 33, 73, 0, 0, 0, 0, 0, 0,
        ];
        channel.set_chain_tip(ChainTip::new(prev_hash.into(), 453040064, 1745596910));
        channel
            .on_new_template(standard_template(1), reward_outputs())
            .unwrap();

        assert_eq!(
            channel.validate_share(share(1, 1, 134870, 1745611105)),
            Ok(ShareValidationResult::Valid)
        );
        assert_eq!(
            channel.validate_share(share(1, 2, 134870, 1745611105)),
            Err(ShareValidationError::DuplicateShare)
        );
        assert_eq!(
            channel.validate_share(share(2, 3, 134870, 1745611105)),
            Err(ShareValidationError::InvalidJobId)
        );
    }
}
