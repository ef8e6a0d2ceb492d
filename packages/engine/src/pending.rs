use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::info;

/// A payload waiting for its submitter to choose a routing target.
#[derive(Debug, Clone)]
pub struct PendingSelection {
    pub submitter_name: String,
    pub file_name: String,
    pub mime_type: String,
    pub payload: Vec<u8>,
    created: Instant,
}

impl PendingSelection {
    pub fn new(
        submitter_name: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        payload: Vec<u8>,
    ) -> Self {
        Self {
            submitter_name: submitter_name.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            payload,
            created: Instant::now(),
        }
    }

    pub fn age(&self) -> Duration {
        self.created.elapsed()
    }
}

/// Per-submitter pending uploads.
///
/// Each submitter has at most one entry; a second upload replaces it
/// (last-write-wins, no queueing). Entries are consumed on selection
/// whether the commit succeeds or fails, dropped on cancel, and swept
/// by age.
#[derive(Debug, Default)]
pub struct PendingSelections {
    entries: DashMap<i64, PendingSelection>,
}

impl PendingSelections {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a fresh upload to the submitter, replacing any pending one.
    pub fn begin(&self, submitter_id: i64, pending: PendingSelection) {
        self.entries.insert(submitter_id, pending);
    }

    /// Consume the pending entry, if any.
    pub fn take(&self, submitter_id: i64) -> Option<PendingSelection> {
        self.entries.remove(&submitter_id).map(|(_, pending)| pending)
    }

    /// Drop the pending entry without committing it.
    pub fn cancel(&self, submitter_id: i64) -> bool {
        self.entries.remove(&submitter_id).is_some()
    }

    /// Remove entries older than `max_age`. Returns the removed count.
    pub fn cleanup_stale(&self, max_age: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, pending| pending.age() < max_age);
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Spawn a background task that periodically sweeps expired pending
/// selections.
pub fn spawn_cleanup_task(
    pending: Arc<PendingSelections>,
    interval: Duration,
    max_age: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);

        loop {
            ticker.tick().await;
            let removed = pending.cleanup_stale(max_age);
            if removed > 0 {
                info!(removed, "Swept expired pending submissions");
            }
        }
    })
}
