//! # Job Store
//!
//! Keeps the jobs of a channel through their lifecycle:
//!
//! - **future**: created from a future template, waiting for its `SetNewPrevHash`. Indexed by
//!   `job_id`, with a `template_id -> job_id` mapping.
//! - **active**: the job currently mined, at most one.
//! - **past**: jobs that were active under the current chain tip. Shares for them are still
//!   accepted.
//! - **stale**: jobs from a previous chain tip. Shares for them are rejected as stale.
//!
//! Channels are generic over [`JobStore`], [`DefaultJobStore`] keeps everything in memory.

use std::{collections::HashMap, fmt::Debug};

use tracing::debug;

use super::Job;

pub trait JobStore<J: Job>: Debug + Send + Sync {
    /// Adds a future job created from the template `template_id`, returns its `job_id`.
    fn add_future_job(&mut self, template_id: u64, job: J) -> u32;

    /// Makes `job` the active job, the previous active job (if any) becomes a past job.
    fn add_active_job(&mut self, job: J);

    /// Activates the future job of `template_id` with `min_ntime`.
    ///
    /// On success the previous active job and all past jobs become stale and the other future
    /// jobs are dropped. Returns `false` and leaves the store untouched if there is no future job
    /// for `template_id`.
    fn activate_future_job(&mut self, template_id: u64, min_ntime: u32) -> bool;

    fn mark_past_jobs_as_stale(&mut self);

    fn get_future_job_id_from_template_id(&self, template_id: u64) -> Option<u32>;

    fn get_active_job(&self) -> Option<&J>;

    fn get_future_jobs(&self) -> &HashMap<u32, J>;

    fn get_past_jobs(&self) -> &HashMap<u32, J>;

    fn get_stale_jobs(&self) -> &HashMap<u32, J>;

    fn get_future_template_to_job_id(&self) -> &HashMap<u64, u32>;
}

#[derive(Debug, Clone)]
pub struct DefaultJobStore<J: Job> {
    future_template_to_job_id: HashMap<u64, u32>,
    future_jobs: HashMap<u32, J>,
    active_job: Option<J>,
    past_jobs: HashMap<u32, J>,
    stale_jobs: HashMap<u32, J>,
}

impl<J: Job> DefaultJobStore<J> {
    pub fn new() -> Self {
        Self {
            future_template_to_job_id: HashMap::new(),
            future_jobs: HashMap::new(),
            active_job: None,
            past_jobs: HashMap::new(),
            stale_jobs: HashMap::new(),
        }
    }
}

impl<J: Job> Default for DefaultJobStore<J> {
    fn default() -> Self {
        Self::new()
    }
}

impl<J: Job> JobStore<J> for DefaultJobStore<J> {
    fn add_future_job(&mut self, template_id: u64, job: J) -> u32 {
        let job_id = job.get_job_id();
        self.future_template_to_job_id.insert(template_id, job_id);
        self.future_jobs.insert(job_id, job);
        job_id
    }

    fn add_active_job(&mut self, job: J) {
        if let Some(previous) = self.active_job.replace(job) {
            self.past_jobs.insert(previous.get_job_id(), previous);
        }
    }

    fn activate_future_job(&mut self, template_id: u64, min_ntime: u32) -> bool {
        let job_id = match self.future_template_to_job_id.get(&template_id) {
            Some(job_id) => *job_id,
            None => return false,
        };
        let mut job = match self.future_jobs.remove(&job_id) {
            Some(job) => job,
            None => return false,
        };
        job.activate(min_ntime);

        if let Some(previous) = self.active_job.replace(job) {
            self.past_jobs.insert(previous.get_job_id(), previous);
        }

        // future jobs of the other templates can not be activated on this tip anymore
        self.future_template_to_job_id.clear();
        self.future_jobs.clear();

        self.mark_past_jobs_as_stale();
        debug!(
            "Activated future job {} of template {} with min_ntime {}",
            job_id, template_id, min_ntime
        );
        true
    }

    fn mark_past_jobs_as_stale(&mut self) {
        // jobs from two tips ago are of no use anymore
        self.stale_jobs = std::mem::take(&mut self.past_jobs);
    }

    fn get_future_job_id_from_template_id(&self, template_id: u64) -> Option<u32> {
        self.future_template_to_job_id.get(&template_id).copied()
    }

    fn get_active_job(&self) -> Option<&J> {
        self.active_job.as_ref()
    }

    fn get_future_jobs(&self) -> &HashMap<u32, J> {
        &self.future_jobs
    }

    fn get_past_jobs(&self) -> &HashMap<u32, J> {
        &self.past_jobs
    }

    fn get_stale_jobs(&self) -> &HashMap<u32, J> {
        &self.stale_jobs
    }

    fn get_future_template_to_job_id(&self) -> &HashMap<u64, u32> {
        &self.future_template_to_job_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct TestJob {
        job_id: u32,
        template_id: Option<u64>,
        min_ntime: Option<u32>,
    }

    impl Job for TestJob {
        fn get_job_id(&self) -> u32 {
            self.job_id
        }
        fn get_template_id(&self) -> Option<u64> {
            self.template_id
        }
        fn get_min_ntime(&self) -> Option<u32> {
            self.min_ntime
        }
        fn activate(&mut self, min_ntime: u32) {
            self.min_ntime = Some(min_ntime);
        }
    }

    fn future(job_id: u32, template_id: u64) -> TestJob {
        TestJob {
            job_id,
            template_id: Some(template_id),
            min_ntime: None,
        }
    }

    fn active(job_id: u32) -> TestJob {
        TestJob {
            job_id,
            template_id: Some(job_id as u64),
            min_ntime: Some(10),
        }
    }

    #[test]
    fn activation_moves_future_job_to_active() {
        let mut store = DefaultJobStore::new();
        store.add_active_job(active(1));
        assert_eq!(store.add_future_job(7, future(2, 7)), 2);
        store.add_future_job(8, future(3, 8));
        assert_eq!(store.get_future_job_id_from_template_id(7), Some(2));

        assert!(store.activate_future_job(7, 1234));

        let job = store.get_active_job().unwrap();
        assert_eq!(job.job_id, 2);
        assert_eq!(job.min_ntime, Some(1234));
        assert!(!job.is_future());
        assert!(store.get_future_jobs().is_empty());
        assert!(store.get_future_template_to_job_id().is_empty());
        assert!(store.get_past_jobs().is_empty());
        assert!(store.get_stale_jobs().contains_key(&1));
    }

    #[test]
    fn unknown_template_leaves_store_untouched() {
        let mut store = DefaultJobStore::new();
        store.add_active_job(active(1));
        store.add_future_job(7, future(2, 7));

        assert!(!store.activate_future_job(9, 1234));

        assert_eq!(store.get_active_job().unwrap().job_id, 1);
        assert!(store.get_future_jobs().contains_key(&2));
        assert!(store.get_stale_jobs().is_empty());
    }

    #[test]
    fn replaced_active_job_becomes_past_then_stale() {
        let mut store = DefaultJobStore::new();
        store.add_active_job(active(1));
        store.add_active_job(active(2));
        assert!(store.get_past_jobs().contains_key(&1));

        store.mark_past_jobs_as_stale();
        assert!(store.get_past_jobs().is_empty());
        assert!(store.get_stale_jobs().contains_key(&1));

        store.add_active_job(active(3));
        store.mark_past_jobs_as_stale();
        assert!(!store.get_stale_jobs().contains_key(&1));
        assert!(store.get_stale_jobs().contains_key(&2));
    }
}
