//! services/api/src/fulfillment.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! advancing the print queue.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use campus_print_core::{JobQueueManager, PrintDispatcher};

/// The long-running task that drains the queue in FIFO order.
///
/// Each cycle surfaces the oldest pending job, claims it via the
/// compare-and-set transition, hands it to the `PrintDispatcher` and marks
/// it completed. It is designed to be gracefully stopped via a
/// `CancellationToken`.
pub async fn fulfillment_worker(
    jobs: Arc<JobQueueManager>,
    dispatcher: Arc<dyn PrintDispatcher>,
    poll_interval: Duration,
    cancellation_token: CancellationToken,
) {
    info!("Fulfillment worker started.");
    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Fulfillment worker stopped.");
                return;
            }
            _ = tokio::time::sleep(poll_interval) => {}
        }

        while let Some(job) = jobs.next_pending() {
            if cancellation_token.is_cancelled() {
                info!("Fulfillment worker stopped.");
                return;
            }

            // A cancel may land between surfacing the job and claiming it;
            // the status compare-and-set decides who won.
            if let Err(e) = jobs.begin_processing(job.id) {
                warn!(job = %job.id, "job left the queue before processing: {e}");
                continue;
            }

            match dispatcher.dispatch(&job).await {
                Ok(()) => {
                    if let Err(e) = jobs.complete(job.id) {
                        error!(job = %job.id, "failed to complete a dispatched job: {e}");
                    }
                }
                Err(e) => {
                    // The status machine has no failure edge: the job stays
                    // Processing for an operator, and any retrying belongs
                    // to the dispatcher itself.
                    error!(job = %job.id, "dispatch failed: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::LogDispatcher;
    use async_trait::async_trait;
    use campus_print_core::ports::{PortError, PortResult};
    use campus_print_core::validation::DEFAULT_MAX_UPLOAD_BYTES;
    use campus_print_core::{
        ColorMode, JobStatus, NewUpload, Orientation, PrintConfiguration, PrintJob, Sides,
        UploadRegistry,
    };
    use uuid::Uuid;

    fn queued_job(registry: &UploadRegistry, jobs: &JobQueueManager) -> PrintJob {
        let asset = registry
            .submit(
                "riya@college.edu",
                vec![NewUpload {
                    file_name: "notes.pdf".to_string(),
                    mime_type: "application/pdf".to_string(),
                    size_bytes: 1024,
                    page_count: 4,
                }],
            )
            .accepted[0]
            .id;
        registry.advance_progress(asset, 100).unwrap();
        jobs.create_job(
            "riya@college.edu",
            vec![asset],
            PrintConfiguration {
                color_mode: ColorMode::Monochrome,
                sides: Sides::SingleSided,
                orientation: Orientation::Portrait,
                copies: 1,
            },
        )
        .unwrap()
    }

    async fn wait_for_status(
        jobs: &JobQueueManager,
        id: Uuid,
        expected: JobStatus,
    ) -> JobStatus {
        for _ in 0..200 {
            let status = jobs.get(id).unwrap().status;
            if status == expected {
                return status;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        jobs.get(id).unwrap().status
    }

    #[tokio::test]
    async fn drains_the_queue_in_order() {
        let registry = Arc::new(UploadRegistry::new(DEFAULT_MAX_UPLOAD_BYTES));
        let jobs = Arc::new(JobQueueManager::new(registry.clone()));
        let first = queued_job(&registry, &jobs);
        let second = queued_job(&registry, &jobs);

        let token = CancellationToken::new();
        let worker = tokio::spawn(fulfillment_worker(
            jobs.clone(),
            Arc::new(LogDispatcher::new()),
            Duration::from_millis(5),
            token.clone(),
        ));

        assert_eq!(
            wait_for_status(&jobs, first.id, JobStatus::Completed).await,
            JobStatus::Completed
        );
        assert_eq!(
            wait_for_status(&jobs, second.id, JobStatus::Completed).await,
            JobStatus::Completed
        );

        token.cancel();
        worker.await.unwrap();
    }

    struct FailingDispatcher;

    #[async_trait]
    impl PrintDispatcher for FailingDispatcher {
        async fn dispatch(&self, _job: &PrintJob) -> PortResult<()> {
            Err(PortError::Unexpected("print room unreachable".to_string()))
        }
    }

    #[tokio::test]
    async fn a_failed_dispatch_leaves_the_job_processing() {
        let registry = Arc::new(UploadRegistry::new(DEFAULT_MAX_UPLOAD_BYTES));
        let jobs = Arc::new(JobQueueManager::new(registry.clone()));
        let job = queued_job(&registry, &jobs);

        let token = CancellationToken::new();
        let worker = tokio::spawn(fulfillment_worker(
            jobs.clone(),
            Arc::new(FailingDispatcher),
            Duration::from_millis(5),
            token.clone(),
        ));

        assert_eq!(
            wait_for_status(&jobs, job.id, JobStatus::Processing).await,
            JobStatus::Processing
        );
        // It never silently completes or reverts.
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(jobs.get(job.id).unwrap().status, JobStatus::Processing);

        token.cancel();
        worker.await.unwrap();
    }
}
