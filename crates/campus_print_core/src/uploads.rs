//! crates/campus_print_core/src/uploads.rs
//!
//! The upload registry: tracks every uploaded asset from validation through
//! transfer to `Ready` (or `Rejected`), and remembers which print jobs hold
//! references to which assets.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::domain::{AssetState, UploadedAsset};
use crate::validation::{is_allowed_asset, AssetRejection};

/// A file as handed in by the transport layer: metadata first, bytes later.
#[derive(Debug, Clone)]
pub struct NewUpload {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub page_count: u32,
}

/// Result of a batch submission. The batch never fails atomically: rejected
/// files are reported here while the accepted ones proceed.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub accepted: Vec<UploadedAsset>,
    pub rejected: Vec<UploadedAsset>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("asset {0} is not registered")]
    NotFound(Uuid),
    #[error("asset {0} is referenced by an active print job")]
    AssetInUse(Uuid),
    #[error("asset {0} has not finished transferring")]
    TransferInProgress(Uuid),
}

/// Why a batch of assets could not be attached to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttachError {
    #[error("asset {0} is not registered")]
    UnknownAsset(Uuid),
    #[error("asset {0} is not ready")]
    NotReady(Uuid),
}

/// Each asset lives in its own slot so progress reports for one asset
/// serialize against each other without ever blocking another asset.
struct AssetSlot {
    asset: Mutex<UploadedAsset>,
}

struct RegistryInner {
    assets: HashMap<Uuid, Arc<AssetSlot>>,
    /// Insertion order, for `list_for_owner`.
    order: Vec<Uuid>,
    /// asset id -> non-terminal jobs currently referencing it.
    refs: HashMap<Uuid, HashSet<Uuid>>,
}

pub struct UploadRegistry {
    inner: RwLock<RegistryInner>,
    max_upload_bytes: u64,
}

impl UploadRegistry {
    pub fn new(max_upload_bytes: u64) -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                assets: HashMap::new(),
                order: Vec::new(),
                refs: HashMap::new(),
            }),
            max_upload_bytes,
        }
    }

    /// Registers a batch of files for an owner. Every file ends up in the
    /// registry: the ones that fail validation as `Rejected` with their
    /// reason, the rest as `Transferring` at progress 0.
    pub fn submit(&self, owner_email: &str, uploads: Vec<NewUpload>) -> SubmitOutcome {
        let mut accepted = Vec::new();
        let mut rejected = Vec::new();
        let now = Utc::now();

        let mut inner = self.inner.write();
        for upload in uploads {
            let verdict = is_allowed_asset(&upload.mime_type, upload.size_bytes, self.max_upload_bytes);
            let mut asset = UploadedAsset {
                id: Uuid::new_v4(),
                owner_email: owner_email.to_string(),
                file_name: upload.file_name,
                mime_type: upload.mime_type,
                size_bytes: upload.size_bytes,
                page_count: upload.page_count,
                transfer_progress: 0,
                state: AssetState::Validating,
                rejection_reason: None,
                submitted_at: now,
            };
            match verdict {
                Ok(()) => {
                    // Validation passed; the transfer starts immediately.
                    asset.state = AssetState::Transferring;
                    accepted.push(asset.clone());
                }
                Err(reason) => {
                    asset.state = AssetState::Rejected;
                    asset.rejection_reason = Some(reason);
                    rejected.push(asset.clone());
                }
            }
            inner.order.push(asset.id);
            inner
                .assets
                .insert(asset.id, Arc::new(AssetSlot { asset: Mutex::new(asset) }));
        }

        debug!(
            owner = owner_email,
            accepted = accepted.len(),
            rejected = rejected.len(),
            "upload batch registered"
        );
        SubmitOutcome { accepted, rejected }
    }

    /// Advances an asset's transfer by `delta` percentage points, clamped to
    /// 100. At 100 the asset flips to `Ready`. Progress can never regress.
    ///
    /// Reporting progress for an asset that never entered `Transferring` is
    /// a defect in the transfer driver, not a user error, and panics rather
    /// than being clamped away.
    pub fn advance_progress(&self, asset_id: Uuid, delta: u32) -> Result<u8, UploadError> {
        let slot = self
            .slot(asset_id)
            .ok_or(UploadError::NotFound(asset_id))?;
        let mut asset = slot.asset.lock();
        match asset.state {
            AssetState::Transferring | AssetState::Ready => {}
            state => panic!(
                "transfer progress reported for asset {asset_id} in state {state:?}"
            ),
        }
        let updated = (u32::from(asset.transfer_progress) + delta).min(100) as u8;
        asset.transfer_progress = updated;
        if updated == 100 {
            asset.state = AssetState::Ready;
        }
        Ok(updated)
    }

    /// Removes a `Ready` or `Rejected` asset that no live job references.
    pub fn remove(&self, asset_id: Uuid) -> Result<UploadedAsset, UploadError> {
        let mut inner = self.inner.write();
        let slot = inner
            .assets
            .get(&asset_id)
            .cloned()
            .ok_or(UploadError::NotFound(asset_id))?;
        {
            let asset = slot.asset.lock();
            match asset.state {
                AssetState::Ready | AssetState::Rejected => {}
                _ => return Err(UploadError::TransferInProgress(asset_id)),
            }
        }
        if inner.refs.get(&asset_id).is_some_and(|jobs| !jobs.is_empty()) {
            return Err(UploadError::AssetInUse(asset_id));
        }

        inner.assets.remove(&asset_id);
        inner.order.retain(|id| *id != asset_id);
        inner.refs.remove(&asset_id);
        let removed = slot.asset.lock().clone();
        Ok(removed)
    }

    /// Removes every removable asset of an owner (the "clear all" action),
    /// skipping in-flight transfers and assets held by live jobs. Returns
    /// the removed ids.
    pub fn clear_for_owner(&self, owner_email: &str) -> Vec<Uuid> {
        let candidates: Vec<Uuid> = {
            let inner = self.inner.read();
            inner
                .order
                .iter()
                .filter(|id| {
                    inner
                        .assets
                        .get(id)
                        .is_some_and(|slot| slot.asset.lock().owner_email == owner_email)
                })
                .copied()
                .collect()
        };
        candidates
            .into_iter()
            .filter(|id| self.remove(*id).is_ok())
            .collect()
    }

    /// Snapshot of one asset.
    pub fn get(&self, asset_id: Uuid) -> Option<UploadedAsset> {
        self.slot(asset_id).map(|slot| slot.asset.lock().clone())
    }

    /// All assets of an owner, in insertion order.
    pub fn list_for_owner(&self, owner_email: &str) -> Vec<UploadedAsset> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.assets.get(id))
            .map(|slot| slot.asset.lock().clone())
            .filter(|asset| asset.owner_email == owner_email)
            .collect()
    }

    /// Atomically verifies that every asset is `Ready` and records the job's
    /// references, so a removal cannot slip between the check and the job
    /// insertion. Returns snapshots in the order given.
    pub fn attach_job(
        &self,
        asset_ids: &[Uuid],
        job_id: Uuid,
    ) -> Result<Vec<UploadedAsset>, AttachError> {
        let mut inner = self.inner.write();
        let mut snapshots = Vec::with_capacity(asset_ids.len());
        for id in asset_ids {
            let slot = inner
                .assets
                .get(id)
                .ok_or(AttachError::UnknownAsset(*id))?;
            let asset = slot.asset.lock();
            if asset.state != AssetState::Ready {
                return Err(AttachError::NotReady(*id));
            }
            snapshots.push(asset.clone());
        }
        for id in asset_ids {
            inner.refs.entry(*id).or_default().insert(job_id);
        }
        Ok(snapshots)
    }

    /// Drops a terminal job's references; its assets become removable again.
    pub fn release_job(&self, job_id: Uuid) {
        let mut inner = self.inner.write();
        inner.refs.retain(|_, jobs| {
            jobs.remove(&job_id);
            !jobs.is_empty()
        });
    }

    fn slot(&self, asset_id: Uuid) -> Option<Arc<AssetSlot>> {
        self.inner.read().assets.get(&asset_id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pdf(name: &str, pages: u32) -> NewUpload {
        NewUpload {
            file_name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes: 64 * 1024,
            page_count: pages,
        }
    }

    fn registry() -> UploadRegistry {
        UploadRegistry::new(crate::validation::DEFAULT_MAX_UPLOAD_BYTES)
    }

    #[test]
    fn batch_submission_is_a_partial_failure() {
        let registry = registry();
        let outcome = registry.submit(
            "riya@college.edu",
            vec![
                pdf("notes.pdf", 5),
                NewUpload {
                    file_name: "clip.mp4".to_string(),
                    mime_type: "video/mp4".to_string(),
                    size_bytes: 1024,
                    page_count: 1,
                },
                NewUpload {
                    file_name: "scan.png".to_string(),
                    mime_type: "image/png".to_string(),
                    size_bytes: crate::validation::DEFAULT_MAX_UPLOAD_BYTES + 1,
                    page_count: 1,
                },
            ],
        );

        assert_eq!(outcome.accepted.len() + outcome.rejected.len(), 3);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(
            outcome.rejected[0].rejection_reason,
            Some(AssetRejection::UnsupportedType)
        );
        assert_eq!(
            outcome.rejected[1].rejection_reason,
            Some(AssetRejection::TooLarge)
        );
        for asset in &outcome.rejected {
            assert_eq!(asset.state, AssetState::Rejected);
        }
    }

    #[test]
    fn accepted_files_start_transferring_at_zero() {
        let registry = registry();
        let outcome = registry.submit("riya@college.edu", vec![pdf("notes.pdf", 5)]);
        let asset = &outcome.accepted[0];
        assert_eq!(asset.state, AssetState::Transferring);
        assert_eq!(asset.transfer_progress, 0);
    }

    #[test]
    fn progress_reaches_ready_exactly_at_100() {
        let registry = registry();
        let id = registry.submit("riya@college.edu", vec![pdf("notes.pdf", 5)]).accepted[0].id;

        assert_eq!(registry.advance_progress(id, 40).unwrap(), 40);
        assert_eq!(registry.get(id).unwrap().state, AssetState::Transferring);
        assert_eq!(registry.advance_progress(id, 60).unwrap(), 100);

        let asset = registry.get(id).unwrap();
        assert_eq!(asset.state, AssetState::Ready);
        assert_eq!(asset.transfer_progress, 100);
    }

    #[test]
    fn progress_is_clamped_and_monotonic() {
        let registry = registry();
        let id = registry.submit("riya@college.edu", vec![pdf("notes.pdf", 5)]).accepted[0].id;

        let mut last = 0;
        for delta in [80, 45, 10] {
            let progress = registry.advance_progress(id, delta).unwrap();
            assert!(progress >= last);
            assert!(progress <= 100);
            last = progress;
        }
        assert_eq!(last, 100);
        assert_eq!(registry.get(id).unwrap().state, AssetState::Ready);
    }

    #[test]
    fn progress_for_an_unknown_asset_is_an_error() {
        let registry = registry();
        let missing = Uuid::new_v4();
        assert_eq!(
            registry.advance_progress(missing, 10),
            Err(UploadError::NotFound(missing))
        );
    }

    #[test]
    #[should_panic(expected = "transfer progress reported")]
    fn progress_on_a_rejected_asset_is_a_defect() {
        let registry = registry();
        let rejected = registry
            .submit(
                "riya@college.edu",
                vec![NewUpload {
                    file_name: "clip.mp4".to_string(),
                    mime_type: "video/mp4".to_string(),
                    size_bytes: 1024,
                    page_count: 1,
                }],
            )
            .rejected[0]
            .id;
        let _ = registry.advance_progress(rejected, 10);
    }

    #[test]
    fn assets_progress_independently_under_concurrency() {
        let registry = Arc::new(registry());
        let outcome = registry.submit(
            "riya@college.edu",
            vec![pdf("a.pdf", 1), pdf("b.pdf", 1), pdf("c.pdf", 1)],
        );
        let ids: Vec<Uuid> = outcome.accepted.iter().map(|a| a.id).collect();

        let handles: Vec<_> = ids
            .iter()
            .map(|id| {
                let registry = registry.clone();
                let id = *id;
                std::thread::spawn(move || {
                    for _ in 0..10 {
                        registry.advance_progress(id, 10).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        for id in ids {
            let asset = registry.get(id).unwrap();
            assert_eq!(asset.transfer_progress, 100);
            assert_eq!(asset.state, AssetState::Ready);
        }
    }

    #[test]
    fn listing_preserves_insertion_order() {
        let registry = registry();
        registry.submit("riya@college.edu", vec![pdf("a.pdf", 1), pdf("b.pdf", 2)]);
        registry.submit("dev@college.edu", vec![pdf("x.pdf", 3)]);
        registry.submit("riya@college.edu", vec![pdf("c.pdf", 4)]);

        let names: Vec<String> = registry
            .list_for_owner("riya@college.edu")
            .into_iter()
            .map(|a| a.file_name)
            .collect();
        assert_eq!(names, ["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn only_settled_assets_can_be_removed() {
        let registry = registry();
        let id = registry.submit("riya@college.edu", vec![pdf("notes.pdf", 5)]).accepted[0].id;

        assert_eq!(registry.remove(id), Err(UploadError::TransferInProgress(id)));
        registry.advance_progress(id, 100).unwrap();
        assert!(registry.remove(id).is_ok());
        assert_eq!(registry.remove(id), Err(UploadError::NotFound(id)));
    }

    #[test]
    fn rejected_assets_can_be_removed() {
        let registry = registry();
        let id = registry
            .submit(
                "riya@college.edu",
                vec![NewUpload {
                    file_name: "clip.mp4".to_string(),
                    mime_type: "video/mp4".to_string(),
                    size_bytes: 1024,
                    page_count: 1,
                }],
            )
            .rejected[0]
            .id;
        assert!(registry.remove(id).is_ok());
    }

    #[test]
    fn referenced_assets_cannot_be_removed_until_released() {
        let registry = registry();
        let id = registry.submit("riya@college.edu", vec![pdf("notes.pdf", 5)]).accepted[0].id;
        registry.advance_progress(id, 100).unwrap();

        let job = Uuid::new_v4();
        registry.attach_job(&[id], job).unwrap();
        assert_eq!(registry.remove(id), Err(UploadError::AssetInUse(id)));

        registry.release_job(job);
        assert!(registry.remove(id).is_ok());
    }

    #[test]
    fn attach_requires_every_asset_ready() {
        let registry = registry();
        let outcome = registry.submit(
            "riya@college.edu",
            vec![pdf("done.pdf", 2), pdf("in-flight.pdf", 3)],
        );
        let done = outcome.accepted[0].id;
        let in_flight = outcome.accepted[1].id;
        registry.advance_progress(done, 100).unwrap();

        assert_eq!(
            registry.attach_job(&[done, in_flight], Uuid::new_v4()),
            Err(AttachError::NotReady(in_flight))
        );
        // A failed attach records no references.
        assert!(registry.remove(done).is_ok());
    }

    #[test]
    fn attach_rejects_unknown_assets() {
        let registry = registry();
        let missing = Uuid::new_v4();
        assert_eq!(
            registry.attach_job(&[missing], Uuid::new_v4()),
            Err(AttachError::UnknownAsset(missing))
        );
    }

    #[test]
    fn clear_skips_in_flight_and_referenced_assets() {
        let registry = registry();
        let outcome = registry.submit(
            "riya@college.edu",
            vec![pdf("a.pdf", 1), pdf("b.pdf", 2), pdf("c.pdf", 3)],
        );
        let (a, b, c) = (outcome.accepted[0].id, outcome.accepted[1].id, outcome.accepted[2].id);
        registry.advance_progress(a, 100).unwrap();
        registry.advance_progress(b, 100).unwrap();
        // c keeps transferring.
        registry.attach_job(&[a], Uuid::new_v4()).unwrap();

        let removed = registry.clear_for_owner("riya@college.edu");
        assert_eq!(removed, vec![b]);
        assert!(registry.get(a).is_some());
        assert!(registry.get(c).is_some());
    }
}
