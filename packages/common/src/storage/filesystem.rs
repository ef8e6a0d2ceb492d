use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{BlobEntry, BlobStore, StoredBlob};

/// Filesystem-backed blob store.
///
/// Objects live under `{root}/{container}/{name}`; the object name doubles
/// as the blob id. Writes go through a temp file and a rename. Public
/// visibility is a marker file under `.public/`, so a stored object is not
/// shareable until `make_public` has recorded it.
pub struct FilesystemBlobStore {
    container_path: PathBuf,
    container: String,
    public_base_url: String,
}

impl FilesystemBlobStore {
    /// Create a new filesystem blob store rooted at `root`.
    pub async fn new(
        root: PathBuf,
        container: &str,
        public_base_url: &str,
    ) -> Result<Self, StorageError> {
        let container_path = root.join(container);
        fs::create_dir_all(&container_path).await?;
        fs::create_dir_all(container_path.join(".tmp")).await?;
        fs::create_dir_all(container_path.join(".public")).await?;
        Ok(Self {
            container_path,
            container: container.to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Object names are single path components; dot-prefixed names are
    /// reserved for store bookkeeping.
    fn validate_name(name: &str) -> Result<(), StorageError> {
        if name.is_empty()
            || name.starts_with('.')
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    fn blob_path(&self, name: &str) -> PathBuf {
        self.container_path.join(name)
    }

    fn marker_path(&self, name: &str) -> PathBuf {
        self.container_path.join(".public").join(name)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.container_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}/{}", self.public_base_url, self.container, name)
    }
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn list(&self) -> Result<Vec<BlobEntry>, StorageError> {
        let mut entries = Vec::new();
        let mut dir = fs::read_dir(&self.container_path).await?;
        while let Some(item) = dir.next_entry().await? {
            if !item.file_type().await?.is_file() {
                continue;
            }
            let name = match item.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };
            if name.starts_with('.') {
                continue;
            }
            entries.push(BlobEntry {
                blob_id: name.clone(),
                url: self.url_for(&name),
                mime_type: mime_guess::from_path(&name).first_raw().map(str::to_string),
                name,
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn put(
        &self,
        name: &str,
        data: &[u8],
        _mime_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        Self::validate_name(name)?;

        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        let blob_path = self.blob_path(name);
        if let Err(e) = fs::rename(&temp_path, &blob_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        // A replaced object loses any previous public grant.
        let _ = fs::remove_file(self.marker_path(name)).await;

        Ok(StoredBlob {
            blob_id: name.to_string(),
            url: self.url_for(name),
        })
    }

    async fn make_public(&self, blob_id: &str) -> Result<String, StorageError> {
        Self::validate_name(blob_id)?;
        if !fs::try_exists(self.blob_path(blob_id)).await? {
            return Err(StorageError::NotFound(blob_id.to_string()));
        }
        fs::write(self.marker_path(blob_id), b"").await?;
        Ok(self.url_for(blob_id))
    }

    async fn get(&self, blob_id: &str) -> Result<Vec<u8>, StorageError> {
        Self::validate_name(blob_id)?;
        match fs::read(self.blob_path(blob_id)).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(blob_id.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

impl FilesystemBlobStore {
    /// Whether `make_public` has been recorded for an object.
    pub async fn is_public(&self, blob_id: &str) -> Result<bool, StorageError> {
        Self::validate_name(blob_id)?;
        Ok(fs::try_exists(self.marker_path(blob_id)).await?)
    }
}
