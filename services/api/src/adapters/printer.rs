//! services/api/src/adapters/printer.rs
//!
//! This module contains the fulfillment adapter, the concrete implementation
//! of the `PrintDispatcher` port. Talking to physical printers is outside
//! the core; this adapter acknowledges the handoff and logs it.

use async_trait::async_trait;
use tracing::info;

use campus_print_core::domain::PrintJob;
use campus_print_core::ports::{PortResult, PrintDispatcher};

/// A `PrintDispatcher` that records the handoff in the log. A production
/// deployment replaces this with an adapter for the print-room backend;
/// retry policy lives in that adapter, never in the core.
#[derive(Debug, Default, Clone)]
pub struct LogDispatcher;

impl LogDispatcher {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PrintDispatcher for LogDispatcher {
    async fn dispatch(&self, job: &PrintJob) -> PortResult<()> {
        info!(
            job = %job.id,
            pages = job.page_count,
            copies = job.configuration.copies,
            "job handed to the print room"
        );
        Ok(())
    }
}
