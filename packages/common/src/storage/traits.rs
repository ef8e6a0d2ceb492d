use async_trait::async_trait;

use super::error::StorageError;

/// One object in the container listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobEntry {
    /// Store-internal identifier used for retrieval.
    pub blob_id: String,
    /// Object name; the logical file identity.
    pub name: String,
    /// Durable locator for the object.
    pub url: String,
    /// Content type, when the store knows it.
    pub mime_type: Option<String>,
}

/// Handle returned by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub blob_id: String,
    pub url: String,
}

/// Container-scoped binary payload storage.
///
/// An uploaded object's URL is not considered shareable until
/// `make_public` has succeeded for it.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// List every object in the configured container.
    async fn list(&self) -> Result<Vec<BlobEntry>, StorageError>;

    /// Store a payload under `name`, replacing any existing object.
    async fn put(
        &self,
        name: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<StoredBlob, StorageError>;

    /// Grant public read access to a stored object and return the
    /// shareable URL.
    async fn make_public(&self, blob_id: &str) -> Result<String, StorageError>;

    /// Fetch the raw payload bytes for a blob.
    async fn get(&self, blob_id: &str) -> Result<Vec<u8>, StorageError>;
}
