use async_trait::async_trait;

use super::error::RecordError;
use super::row::RecordRow;

/// Append-only tabular metadata store.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read every raw data row, oldest first. Header rows are the
    /// implementation's concern; only data rows are returned. Malformed
    /// rows are returned as-is and skipped by the parser.
    async fn read_all(&self) -> Result<Vec<Vec<String>>, RecordError>;

    /// Append one row.
    async fn append(&self, row: &RecordRow) -> Result<(), RecordError>;
}
