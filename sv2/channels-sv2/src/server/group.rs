//! # Group Channel
//!
//! A group channel is the job stream shared by a set of standard channels. It builds one
//! extended job per template, with an empty extranonce prefix. Every member turns it into its
//! own standard job with [`StandardChannel::on_group_channel_job`], which is also where shares
//! are validated.
//!
//! As a [`Channel`] a group has no target of its own, it reports [`Target::MAX`], and an empty
//! extranonce prefix.
//!
//! [`StandardChannel::on_group_channel_job`]: crate::server::standard::StandardChannel::on_group_channel_job
use std::{
    collections::{HashMap, HashSet},
    convert::TryInto,
};

use bitcoin::transaction::TxOut;
use mining_sv2::SetGroupChannel;
use template_distribution_sv2::{NewTemplate, SetNewPrevHash as SetNewPrevHashTdp};
use tracing::{debug, warn};

use crate::{
    chain_tip::ChainTip,
    server::{
        error::GroupChannelError,
        jobs::{
            extended::ExtendedJob,
            factory::{JobFactory, MAX_SCRIPT_SIG_LEN},
            job_store::JobStore,
        },
        Channel,
    },
    target::Target,
};

static GROUP_TARGET: Target = Target::MAX;

#[derive(Debug)]
pub struct GroupChannel<J>
where
    J: JobStore<ExtendedJob>,
{
    group_channel_id: u32,
    standard_channel_ids: HashSet<u32>,
    job_factory: JobFactory,
    job_store: J,
    chain_tip: Option<ChainTip>,
}

impl<J> GroupChannel<J>
where
    J: JobStore<ExtendedJob>,
{
    /// Jobs of the group always allow version rolling. `pool_tag_string` goes in the coinbase
    /// scriptSig as `/<pool_tag_string>//`.
    pub fn new(
        group_channel_id: u32,
        job_store: J,
        pool_tag_string: Option<String>,
    ) -> Result<Self, GroupChannelError> {
        let job_factory = JobFactory::new(true, pool_tag_string);
        if job_factory.max_script_sig_len() > MAX_SCRIPT_SIG_LEN {
            return Err(GroupChannelError::ScriptSigSizeTooLarge);
        }
        Ok(Self {
            group_channel_id,
            standard_channel_ids: HashSet::new(),
            job_factory,
            job_store,
            chain_tip: None,
        })
    }

    pub fn add_standard_channel_id(&mut self, standard_channel_id: u32) {
        self.standard_channel_ids.insert(standard_channel_id);
    }

    pub fn remove_standard_channel_id(&mut self, standard_channel_id: u32) {
        self.standard_channel_ids.remove(&standard_channel_id);
    }

    pub fn get_group_channel_id(&self) -> u32 {
        self.group_channel_id
    }

    pub fn get_standard_channel_ids(&self) -> &HashSet<u32> {
        &self.standard_channel_ids
    }

    /// `SetGroupChannel` listing the members, sorted by channel id.
    pub fn get_set_group_channel_message(&self) -> Result<SetGroupChannel, GroupChannelError> {
        let mut channel_ids: Vec<u32> = self.standard_channel_ids.iter().copied().collect();
        channel_ids.sort_unstable();
        Ok(SetGroupChannel {
            group_channel_id: self.group_channel_id,
            channel_ids: channel_ids
                .try_into()
                .map_err(|_| GroupChannelError::TooManyStandardChannels)?,
        })
    }

    pub fn get_chain_tip(&self) -> Option<&ChainTip> {
        self.chain_tip.as_ref()
    }

    pub fn set_chain_tip(&mut self, chain_tip: ChainTip) {
        self.chain_tip = Some(chain_tip);
    }

    pub fn get_active_job(&self) -> Option<&ExtendedJob> {
        self.job_store.get_active_job()
    }

    pub fn get_future_template_to_job_id(&self) -> &HashMap<u64, u32> {
        self.job_store.get_future_template_to_job_id()
    }

    pub fn get_future_jobs(&self) -> &HashMap<u32, ExtendedJob> {
        self.job_store.get_future_jobs()
    }

    /// Creates the group job for `template` and returns it, so the caller can hand it to every
    /// member channel.
    pub fn on_new_template(
        &mut self,
        template: NewTemplate,
        coinbase_reward_outputs: Vec<TxOut>,
    ) -> Result<ExtendedJob, GroupChannelError> {
        let template_id = template.template_id;
        let chain_tip = if template.future_template {
            None
        } else {
            Some(
                self.chain_tip
                    .as_ref()
                    .ok_or(GroupChannelError::ChainTipNotSet)?,
            )
        };

        // members replace the empty prefix with their own
        let job = self.job_factory.new_extended_job(
            self.group_channel_id,
            chain_tip,
            vec![],
            template,
            coinbase_reward_outputs,
        )?;
        debug!(
            "Group channel {}: job {} for template {}",
            self.group_channel_id,
            job.get_job_id(),
            template_id
        );

        if job.get_min_ntime().is_none() {
            self.job_store.add_future_job(template_id, job.clone());
        } else {
            self.job_store.add_active_job(job.clone());
        }
        Ok(job)
    }

    pub fn on_set_new_prev_hash(
        &mut self,
        set_new_prev_hash: SetNewPrevHashTdp,
    ) -> Result<(), GroupChannelError> {
        if !self.job_store.activate_future_job(
            set_new_prev_hash.template_id,
            set_new_prev_hash.header_timestamp,
        ) {
            warn!(
                "Group channel {}: no future job for template {}",
                self.group_channel_id, set_new_prev_hash.template_id
            );
            return Err(GroupChannelError::TemplateIdNotFound);
        }
        self.chain_tip = Some(set_new_prev_hash.into());
        Ok(())
    }
}

impl<J> Channel for GroupChannel<J>
where
    J: JobStore<ExtendedJob>,
{
    type Job = ExtendedJob;

    fn get_channel_id(&self) -> u32 {
        self.group_channel_id
    }

    fn get_target(&self) -> &Target {
        &GROUP_TARGET
    }

    fn get_extranonce_prefix(&self) -> &[u8] {
        &[]
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
