//! crates/campus_print_core/src/jobs.rs
//!
//! The job queue and lifecycle manager: owns the canonical set of print
//! jobs, enforces FIFO processing order and the legal status transitions,
//! and composes upload-registry output with pricing-engine output into a
//! persisted `PrintJob`.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::domain::{JobStatus, PrintConfiguration, PrintJob};
use crate::pricing::{self, PricingError};
use crate::uploads::{AttachError, UploadRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("a print job needs at least one asset")]
    EmptyAssetSet,
    #[error("asset {0} is not registered")]
    UnknownAsset(Uuid),
    #[error("asset {0} has not finished transferring")]
    AssetsNotReady(Uuid),
    #[error("job {0} was not found")]
    JobNotFound(Uuid),
    #[error("job {id} cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        id: Uuid,
        from: JobStatus,
        to: JobStatus,
    },
    #[error(transparent)]
    Pricing(#[from] PricingError),
}

/// Per-status counters for one owner's jobs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JobStats {
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub cancelled: usize,
}

struct QueueInner {
    jobs: HashMap<Uuid, PrintJob>,
    /// Pending jobs keyed by the FIFO order `(submitted_at, id)`.
    pending: BTreeSet<(DateTime<Utc>, Uuid)>,
}

pub struct JobQueueManager {
    registry: Arc<UploadRegistry>,
    inner: Mutex<QueueInner>,
}

impl JobQueueManager {
    pub fn new(registry: Arc<UploadRegistry>) -> Self {
        Self {
            registry,
            inner: Mutex::new(QueueInner {
                jobs: HashMap::new(),
                pending: BTreeSet::new(),
            }),
        }
    }

    /// Creates a job from finished uploads, pricing it once and freezing the
    /// configuration. `submitted_at` is assigned and the job inserted under
    /// a single lock acquisition, so concurrent creations can never observe
    /// each other's slots out of order.
    pub fn create_job(
        &self,
        owner_email: &str,
        asset_ids: Vec<Uuid>,
        configuration: PrintConfiguration,
    ) -> Result<PrintJob, JobError> {
        if asset_ids.is_empty() {
            return Err(JobError::EmptyAssetSet);
        }

        let job_id = Uuid::new_v4();
        let assets = self.registry.attach_job(&asset_ids, job_id).map_err(|e| match e {
            AttachError::UnknownAsset(id) => JobError::UnknownAsset(id),
            AttachError::NotReady(id) => JobError::AssetsNotReady(id),
        })?;

        let pages: Vec<u32> = assets.iter().map(|a| a.page_count).collect();
        let price = match pricing::price(&configuration, &pages) {
            Ok(price) => price,
            Err(e) => {
                // The job never existed; its references must not linger.
                self.registry.release_job(job_id);
                return Err(e.into());
            }
        };

        let job = {
            let mut inner = self.inner.lock();
            let submitted_at = Utc::now();
            let job = PrintJob {
                id: job_id,
                owner_email: owner_email.to_string(),
                asset_ids,
                configuration,
                page_count: pages.iter().sum(),
                price,
                status: JobStatus::Pending,
                submitted_at,
            };
            inner.pending.insert((submitted_at, job_id));
            inner.jobs.insert(job_id, job.clone());
            job
        };

        info!(job = %job.id, owner = owner_email, pages = job.page_count, "print job queued");
        Ok(job)
    }

    /// The oldest `Pending` job, without removing it from the queue.
    pub fn next_pending(&self) -> Option<PrintJob> {
        let inner = self.inner.lock();
        inner
            .pending
            .first()
            .and_then(|(_, id)| inner.jobs.get(id).cloned())
    }

    pub fn begin_processing(&self, job_id: Uuid) -> Result<(), JobError> {
        self.transition(job_id, JobStatus::Pending, JobStatus::Processing)
    }

    /// Terminal.
    pub fn complete(&self, job_id: Uuid) -> Result<(), JobError> {
        self.transition(job_id, JobStatus::Processing, JobStatus::Completed)?;
        self.registry.release_job(job_id);
        Ok(())
    }

    /// Terminal. Only a job that has not started printing can be cancelled.
    pub fn cancel(&self, job_id: Uuid) -> Result<(), JobError> {
        self.transition(job_id, JobStatus::Pending, JobStatus::Cancelled)?;
        self.registry.release_job(job_id);
        Ok(())
    }

    pub fn get(&self, job_id: Uuid) -> Option<PrintJob> {
        self.inner.lock().jobs.get(&job_id).cloned()
    }

    /// Jobs in FIFO order, optionally narrowed by owner and status.
    pub fn list(&self, owner_email: Option<&str>, status: Option<JobStatus>) -> Vec<PrintJob> {
        let inner = self.inner.lock();
        let mut jobs: Vec<PrintJob> = inner
            .jobs
            .values()
            .filter(|job| owner_email.is_none_or(|owner| job.owner_email == owner))
            .filter(|job| status.is_none_or(|status| job.status == status))
            .cloned()
            .collect();
        jobs.sort_by_key(|job| (job.submitted_at, job.id));
        jobs
    }

    /// Status counters for one owner's dashboard.
    pub fn stats_for_owner(&self, owner_email: &str) -> JobStats {
        let inner = self.inner.lock();
        let mut stats = JobStats::default();
        for job in inner.jobs.values().filter(|j| j.owner_email == owner_email) {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::Processing => stats.processing += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::Cancelled => stats.cancelled += 1,
            }
        }
        stats
    }

    /// Compare-and-set on the job's status: the transition happens only if
    /// the current status is exactly `from`, so two racing callers resolve
    /// with one winner and one `InvalidTransition`.
    fn transition(&self, job_id: Uuid, from: JobStatus, to: JobStatus) -> Result<(), JobError> {
        let mut inner = self.inner.lock();
        let inner = &mut *inner;
        let job = inner.jobs.get_mut(&job_id).ok_or(JobError::JobNotFound(job_id))?;
        if job.status != from {
            return Err(JobError::InvalidTransition {
                id: job_id,
                from: job.status,
                to,
            });
        }
        if from == JobStatus::Pending {
            inner.pending.remove(&(job.submitted_at, job_id));
        }
        job.status = to;
        info!(job = %job_id, from = ?from, to = ?to, "job status advanced");
        Ok(())
    }
}
