use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use common::records::{RecordRow, RecordStore};
use common::storage::{BlobEntry, BlobStore};
use tracing::{info, instrument, warn};

use crate::cache::SubmissionCache;
use crate::config::EngineConfig;
use crate::error::{EngineError, MAX_USER_ERROR_LEN, truncate_message};
use crate::pending::{self, PendingSelection, PendingSelections};
use crate::reconcile;
use crate::registry::{RoutingTarget, TargetRegistry};
use crate::submission::{Submission, TIME_FORMAT};

/// Requester role handed in by the front-end. The engine applies no
/// access policy beyond these checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

/// One listing entry with its fetched payload, or the reason the fetch
/// failed.
#[derive(Debug, Clone)]
pub struct ListedSubmission {
    pub submission: Submission,
    pub payload: Option<Vec<u8>>,
    pub fetch_error: Option<String>,
}

/// Outcome summary of a listing request.
#[derive(Debug, Clone)]
pub struct ListingReport {
    pub items: Vec<ListedSubmission>,
    /// Entries whose payload was fetched successfully.
    pub shown: usize,
    pub total: usize,
}

/// Drives the end-to-end submit flow and the read-side queries.
///
/// All state lives here: the rebuildable cache, the routing-target
/// registry, and the per-submitter pending uploads. Construction starts
/// empty; call [`rebuild`](Self::rebuild) once to prime the cache.
pub struct SubmissionService {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
    cache: SubmissionCache,
    registry: TargetRegistry,
    pending: Arc<PendingSelections>,
    config: EngineConfig,
}

impl SubmissionService {
    pub fn new(
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn RecordStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            blobs,
            records,
            cache: SubmissionCache::new(),
            registry: TargetRegistry::new(),
            pending: Arc::new(PendingSelections::new()),
            config,
        }
    }

    pub fn registry(&self) -> &TargetRegistry {
        &self.registry
    }

    pub fn pending(&self) -> &Arc<PendingSelections> {
        &self.pending
    }

    /// Canonical record for a file name, from the local projection.
    pub async fn cached(&self, file_name: &str) -> Option<Submission> {
        self.cache.get(file_name).await
    }

    /// Start the periodic sweep of expired pending uploads.
    pub fn spawn_pending_cleanup(&self) -> tokio::task::JoinHandle<()> {
        pending::spawn_cleanup_task(
            self.pending.clone(),
            Duration::from_secs(self.config.pending.sweep_interval_secs),
            Duration::from_secs(self.config.pending.ttl_secs),
        )
    }

    /// Read both stores through the retry policy, degrading a failed read
    /// to an empty snapshot so the other store can still be served.
    async fn fetch_snapshots(&self) -> (Vec<BlobEntry>, Vec<Vec<String>>) {
        let retry = self.config.retry;

        let blobs = match retry.run("blob list", || self.blobs.list()).await {
            Ok(blobs) => blobs,
            Err(e) => {
                warn!(error = %e, "Blob listing failed, reconciling metadata only");
                Vec::new()
            }
        };

        let rows = match retry.run("record read", || self.records.read_all()).await {
            Ok(rows) => rows,
            Err(e) => {
                warn!(error = %e, "Record read failed, reconciling with unknown provenance");
                Vec::new()
            }
        };

        (blobs, rows)
    }

    /// Rebuild the cache from fresh store snapshots. Returns the record
    /// count of the new projection.
    pub async fn rebuild(&self) -> usize {
        let (blobs, rows) = self.fetch_snapshots().await;
        let merged = reconcile::merge(&blobs, &rows);
        let count = merged.len();
        self.cache.rebuild(merged).await;
        count
    }

    /// Accept an uploaded payload and hold it until the submitter picks a
    /// routing target. Returns the targets to prompt with.
    #[instrument(skip(self, payload))]
    pub async fn handle_upload(
        &self,
        submitter_id: i64,
        submitter_name: &str,
        file_name: &str,
        mime_type: &str,
        payload: Vec<u8>,
    ) -> Result<Vec<RoutingTarget>, EngineError> {
        if let Some(existing) = self.cache.get(file_name).await
            && existing.has_blob()
        {
            return Err(EngineError::DuplicateSubmission {
                file_name: file_name.to_string(),
            });
        }

        if self.registry.is_empty() {
            return Err(EngineError::NoRoutingTargets);
        }

        self.pending.begin(
            submitter_id,
            PendingSelection::new(submitter_name, file_name, mime_type, payload),
        );
        info!(submitter_id, file_name, "Upload held for target selection");
        Ok(self.registry.all())
    }

    /// Commit the submitter's pending upload to the selected target.
    ///
    /// The pending entry is consumed whether the commit succeeds or
    /// fails; after a failure the submitter resubmits.
    #[instrument(skip(self))]
    pub async fn select_target(
        &self,
        submitter_id: i64,
        target_id: i64,
    ) -> Result<Submission, EngineError> {
        let Some(pending) = self.pending.take(submitter_id) else {
            return Err(EngineError::ExpiredSelection);
        };

        let target = self
            .registry
            .get(target_id)
            .ok_or(EngineError::UnknownTarget { target_id })?;

        // A rival submission of the same name may have committed while
        // this one sat pending.
        if let Some(existing) = self.cache.get(&pending.file_name).await
            && existing.has_blob()
        {
            return Err(EngineError::DuplicateSubmission {
                file_name: pending.file_name,
            });
        }

        self.commit(pending, &target).await
    }

    /// Drop the submitter's pending upload without committing it.
    pub fn cancel_upload(&self, submitter_id: i64) -> bool {
        self.pending.cancel(submitter_id)
    }

    async fn commit(
        &self,
        pending: PendingSelection,
        target: &RoutingTarget,
    ) -> Result<Submission, EngineError> {
        // The upload is not retried: a repeated put can leave duplicate
        // blobs behind. Failures surface and the submitter resubmits.
        let stored = self
            .blobs
            .put(&pending.file_name, &pending.payload, &pending.mime_type)
            .await
            .map_err(EngineError::UploadFailed)?;
        let blob_url = self
            .blobs
            .make_public(&stored.blob_id)
            .await
            .map_err(EngineError::UploadFailed)?;

        let submitted_at = Utc::now().format(TIME_FORMAT).to_string();
        let row = RecordRow {
            submitter_name: pending.submitter_name.clone(),
            file_name: pending.file_name.clone(),
            submitted_at: submitted_at.clone(),
            blob_url: blob_url.clone(),
            route_target: Some(target.target_id),
        };

        // The blob exists and the submitter gets a confirmation either
        // way; a failed append is logged and heals on a later rebuild
        // once the store recovers.
        if let Err(e) = self.records.append(&row).await {
            warn!(
                file_name = %row.file_name,
                error = %e,
                "Metadata append failed; record carries unknown provenance until reconciled"
            );
        }

        let submission = Submission {
            submitter_name: pending.submitter_name,
            file_name: pending.file_name,
            submitted_at,
            blob_url,
            blob_id: Some(stored.blob_id),
            mime_type: Some(pending.mime_type),
            route_target: Some(target.target_id),
            missing_blob: false,
        };
        self.cache.put_local(submission.clone()).await;

        info!(
            file_name = %submission.file_name,
            target_id = target.target_id,
            "Submission committed"
        );
        Ok(submission)
    }

    /// Register a routing target on behalf of an admin.
    pub fn register_target(
        &self,
        target_id: i64,
        display_name: &str,
        requested_by: i64,
    ) -> Result<RoutingTarget, EngineError> {
        if !self.config.admin_ids.contains(&requested_by) {
            return Err(EngineError::PermissionDenied);
        }

        let display_name = display_name.trim();
        if display_name.is_empty() {
            return Err(EngineError::InvalidRequest(
                "target name is required".to_string(),
            ));
        }

        let target = RoutingTarget {
            target_id,
            display_name: display_name.to_string(),
            registered_at: Utc::now(),
        };
        if !self.registry.register(target.clone()) {
            return Err(EngineError::TargetExists { target_id });
        }

        info!(target_id, display_name, "Routing target registered");
        Ok(target)
    }

    /// List submissions visible to the requester, fetching each payload.
    ///
    /// Rebuilds the cache first so the listing reflects both stores.
    /// Teachers see only records routed to them; admins see everything.
    /// Successive payload fetches are paced to respect downstream rate
    /// limits, and a failed fetch marks that item instead of failing the
    /// whole listing.
    #[instrument(skip(self))]
    pub async fn list_submissions(
        &self,
        requester_id: i64,
        role: Role,
    ) -> Result<ListingReport, EngineError> {
        if role == Role::Student {
            return Err(EngineError::PermissionDenied);
        }

        self.rebuild().await;

        let mut records: Vec<Submission> = self.cache.snapshot().await.into_values().collect();
        if role == Role::Teacher {
            records.retain(|s| s.route_target == Some(requester_id));
        }
        records.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        let total = records.len();
        let pace = Duration::from_millis(self.config.listing.pace_ms);
        let mut items = Vec::with_capacity(total);
        let mut shown = 0;
        let mut fetched_any = false;

        for submission in records {
            let (payload, fetch_error) = match submission.blob_id.as_deref() {
                Some(blob_id) => {
                    if fetched_any && !pace.is_zero() {
                        tokio::time::sleep(pace).await;
                    }
                    fetched_any = true;
                    match self.blobs.get(blob_id).await {
                        Ok(bytes) => {
                            shown += 1;
                            (Some(bytes), None)
                        }
                        Err(e) => (
                            None,
                            Some(truncate_message(
                                &format!("Failed to display {}: {e}", submission.file_name),
                                MAX_USER_ERROR_LEN,
                            )),
                        ),
                    }
                }
                None => (
                    None,
                    Some(format!(
                        "{} is missing from the blob store",
                        submission.file_name
                    )),
                ),
            };
            items.push(ListedSubmission {
                submission,
                payload,
                fetch_error,
            });
        }

        Ok(ListingReport {
            items,
            shown,
            total,
        })
    }
}
