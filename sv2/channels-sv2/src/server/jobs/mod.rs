//! # Jobs
//!
//! Jobs are the unit of work a channel hands to the downstream. A job is either built from a
//! `NewTemplate` (and then carries its `template_id`) or from a `SetCustomMiningJob` sent by a
//! downstream doing its own work selection.
//!
//! A job without `min_ntime` is a *future* job: it waits for the `SetNewPrevHash` of its template.
//! [`Job::activate`] sets `min_ntime`, jobs are never mutated otherwise.
pub mod error;
pub mod extended;
pub mod factory;
pub mod job_store;
pub mod standard;

use mining_sv2::SetCustomMiningJob;
use std::fmt::Debug;
use template_distribution_sv2::NewTemplate;

/// Where the content of a job comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobOrigin {
    NewTemplate(NewTemplate),
    SetCustomMiningJob(SetCustomMiningJob),
}

impl JobOrigin {
    /// `None` for custom jobs.
    pub fn template_id(&self) -> Option<u64> {
        match self {
            JobOrigin::NewTemplate(template) => Some(template.template_id),
            JobOrigin::SetCustomMiningJob(_) => None,
        }
    }
}

/// What a [`job_store::JobStore`] needs from the jobs it keeps.
pub trait Job: Clone + Debug + Send + Sync {
    fn get_job_id(&self) -> u32;

    fn get_template_id(&self) -> Option<u64>;

    fn get_min_ntime(&self) -> Option<u32>;

    /// Binds a future job to a chain tip.
    fn activate(&mut self, min_ntime: u32);

    fn is_future(&self) -> bool {
        self.get_min_ntime().is_none()
    }
}
