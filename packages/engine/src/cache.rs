use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::submission::Submission;

/// In-memory projection of canonical submissions, keyed by file name.
///
/// Rebuilt wholesale from reconciler output; the external stores stay
/// authoritative and the projection can always be rebuilt. Readers never
/// observe a half-built map: `rebuild` swaps the finished map in under
/// the write lock in one assignment.
#[derive(Debug, Default)]
pub struct SubmissionCache {
    inner: RwLock<HashMap<String, Submission>>,
}

impl SubmissionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entire projection.
    pub async fn rebuild(&self, records: HashMap<String, Submission>) {
        *self.inner.write().await = records;
    }

    pub async fn get(&self, file_name: &str) -> Option<Submission> {
        self.inner.read().await.get(file_name).cloned()
    }

    /// Insert one record without a rebuild, so a submitter's own commit
    /// is visible before the next full rebuild.
    pub async fn put_local(&self, submission: Submission) {
        self.inner
            .write()
            .await
            .insert(submission.file_name.clone(), submission);
    }

    pub async fn snapshot(&self) -> HashMap<String, Submission> {
        self.inner.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }
}
