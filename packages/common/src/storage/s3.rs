use async_trait::async_trait;
use s3::creds::Credentials;
use s3::{Bucket, Region};

use super::error::StorageError;
use super::traits::{BlobEntry, BlobStore, StoredBlob};

impl From<s3::error::S3Error> for StorageError {
    fn from(err: s3::error::S3Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// S3-compatible blob store.
///
/// One bucket is the submission container; the object key is the blob id.
/// Shareable URLs are presigned GET links, so `make_public` re-signs on
/// every call rather than mutating object ACLs.
pub struct S3BlobStore {
    bucket: Box<Bucket>,
    object_base_url: String,
    share_expiry_secs: u32,
}

impl S3BlobStore {
    pub fn new(
        bucket_name: &str,
        region: &str,
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        share_expiry_secs: u32,
    ) -> Result<Self, StorageError> {
        let credentials = Credentials::new(Some(access_key), Some(secret_key), None, None, None)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let region = Region::Custom {
            region: region.to_string(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
        };
        let bucket = Bucket::new(bucket_name, region, credentials)?.with_path_style();
        let object_base_url = format!("{}/{}", endpoint.trim_end_matches('/'), bucket_name);
        Ok(Self {
            bucket,
            object_base_url,
            share_expiry_secs,
        })
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.object_base_url, key)
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn list(&self) -> Result<Vec<BlobEntry>, StorageError> {
        let pages = self.bucket.list(String::new(), None).await?;
        let mut entries = Vec::new();
        for page in pages {
            for object in page.contents {
                let name = object.key;
                entries.push(BlobEntry {
                    blob_id: name.clone(),
                    url: self.url_for(&name),
                    mime_type: mime_guess::from_path(&name).first_raw().map(str::to_string),
                    name,
                });
            }
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    async fn put(
        &self,
        name: &str,
        data: &[u8],
        mime_type: &str,
    ) -> Result<StoredBlob, StorageError> {
        if name.is_empty() {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        let response = self
            .bucket
            .put_object_with_content_type(name, data, mime_type)
            .await?;
        if !(200..300).contains(&response.status_code()) {
            return Err(StorageError::Backend(format!(
                "put returned status {}",
                response.status_code()
            )));
        }
        Ok(StoredBlob {
            blob_id: name.to_string(),
            url: self.url_for(name),
        })
    }

    async fn make_public(&self, blob_id: &str) -> Result<String, StorageError> {
        let url = self
            .bucket
            .presign_get(blob_id, self.share_expiry_secs, None)
            .await?;
        Ok(url)
    }

    async fn get(&self, blob_id: &str) -> Result<Vec<u8>, StorageError> {
        let response = self.bucket.get_object(blob_id).await?;
        if response.status_code() == 404 {
            return Err(StorageError::NotFound(blob_id.to_string()));
        }
        Ok(response.bytes().to_vec())
    }
}
