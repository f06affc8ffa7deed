use super::ObjectStore;
use crate::storage::fetcher::validate_key_component;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use std::path::PathBuf;

/// Object store over a local directory, laid out as `{root}/{bucket}/{key}`.
///
/// Used for local development and tests; keys are validated so no request
/// can read outside `root`.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        validate_key_component("bucket", bucket, false)?;
        validate_key_component("object key", key, true)?;
        Ok(self.root.join(bucket).join(key))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    fn provider_name(&self) -> &'static str {
        "local"
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let path = self.object_path(bucket, key)?;

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::IndexNotFound(format!("{}/{}", bucket, key)))
            }
            Err(e) => Err(AppError::Storage(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            ))),
        }
    }
}
