use super::ObjectStore;
use crate::types::{AppError, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tempfile::TempDir;
use tracing::instrument;

/// File name of the vector index artifact.
pub const VECTOR_INDEX_FILE: &str = "index.faiss";
/// File name of the document store artifact.
pub const DOCSTORE_FILE: &str = "index.pkl";

/// Object keys of one document index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexKeys {
    pub vector_index: String,
    pub docstore: String,
}

impl IndexKeys {
    /// Keys under `{user_id}/{file_name}/`.
    pub fn new(user_id: &str, file_name: &str) -> Self {
        Self {
            vector_index: format!("{}/{}/{}", user_id, file_name, VECTOR_INDEX_FILE),
            docstore: format!("{}/{}/{}", user_id, file_name, DOCSTORE_FILE),
        }
    }
}

/// Both index artifacts, copied into a private scratch directory.
///
/// The directory is removed when this value is dropped.
#[derive(Debug)]
pub struct FetchedIndex {
    dir: TempDir,
    vector_index_path: PathBuf,
    docstore_path: PathBuf,
}

impl FetchedIndex {
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    pub fn vector_index_path(&self) -> &Path {
        &self.vector_index_path
    }

    pub fn docstore_path(&self) -> &Path {
        &self.docstore_path
    }
}

/// Copies a user's document index from the object store into scratch space.
pub struct IndexFetcher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
    scratch_dir: PathBuf,
}

impl IndexFetcher {
    pub fn new(store: Arc<dyn ObjectStore>, bucket: String, scratch_dir: PathBuf) -> Self {
        Self {
            store,
            bucket,
            scratch_dir,
        }
    }

    /// Fetch `{user_id}/{file_name}/index.faiss` and `index.pkl`.
    ///
    /// Every call writes into a fresh directory, so a request never reads
    /// artifacts left behind by another one. Fails on the first missing or
    /// unreadable object; nothing is retried.
    #[instrument(skip(self), fields(bucket = %self.bucket, store = self.store.provider_name()))]
    pub async fn fetch(&self, user_id: &str, file_name: &str) -> Result<FetchedIndex> {
        let start = Instant::now();

        validate_key_component("user id", user_id, false)?;
        validate_key_component("fileName", file_name, true)?;

        let keys = IndexKeys::new(user_id, file_name);

        tokio::fs::create_dir_all(&self.scratch_dir)
            .await
            .map_err(|e| {
                AppError::Storage(format!(
                    "Failed to create scratch directory {}: {}",
                    self.scratch_dir.display(),
                    e
                ))
            })?;
        let dir = tempfile::Builder::new()
            .prefix("docqa-")
            .tempdir_in(&self.scratch_dir)
            .map_err(|e| AppError::Storage(format!("Failed to create scratch directory: {}", e)))?;

        let vector_index_path = dir.path().join(VECTOR_INDEX_FILE);
        let docstore_path = dir.path().join(DOCSTORE_FILE);

        let mut total_bytes = 0usize;
        for (key, path) in [
            (&keys.vector_index, &vector_index_path),
            (&keys.docstore, &docstore_path),
        ] {
            let data = self.store.get_object(&self.bucket, key).await?;
            total_bytes += data.len();
            tokio::fs::write(path, &data).await.map_err(|e| {
                AppError::Storage(format!("Failed to write {}: {}", path.display(), e))
            })?;
        }

        tracing::info!(
            bytes = total_bytes,
            duration_ms = start.elapsed().as_millis() as u64,
            "Fetched document index"
        );

        Ok(FetchedIndex {
            dir,
            vector_index_path,
            docstore_path,
        })
    }
}

/// Reject values that cannot safely be used inside an object key.
///
/// `nested` allows `/`-separated segments; `.` and `..` segments, empty
/// segments, leading slashes, backslashes and control characters are
/// always rejected.
pub fn validate_key_component(label: &str, value: &str, nested: bool) -> Result<()> {
    if value.trim().is_empty() {
        return Err(AppError::InvalidInput(format!("{} must not be empty", label)));
    }
    if value.chars().any(|c| c.is_control() || c == '\\') {
        return Err(AppError::InvalidInput(format!(
            "{} contains invalid characters",
            label
        )));
    }
    if !nested && value.contains('/') {
        return Err(AppError::InvalidInput(format!(
            "{} must not contain '/'",
            label
        )));
    }
    if value
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment == "..")
    {
        return Err(AppError::InvalidInput(format!(
            "{} is not a valid object path",
            label
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockObjectStore;
    use bytes::Bytes;
    use rstest::rstest;

    fn fetcher(store: MockObjectStore, scratch: &Path) -> IndexFetcher {
        IndexFetcher::new(Arc::new(store), "docs".to_string(), scratch.to_path_buf())
    }

    #[test]
    fn test_index_keys() {
        let keys = IndexKeys::new("user-1", "chart.pdf");
        assert_eq!(keys.vector_index, "user-1/chart.pdf/index.faiss");
        assert_eq!(keys.docstore, "user-1/chart.pdf/index.pkl");
    }

    #[tokio::test]
    async fn test_fetch_writes_both_artifacts() {
        let scratch = tempfile::tempdir().unwrap();
        let mut store = MockObjectStore::new();
        store.expect_provider_name().return_const("mock");
        store
            .expect_get_object()
            .withf(|bucket, key| {
                bucket.to_string() == "docs" && key.to_string() == "user-1/chart.pdf/index.faiss"
            })
            .times(1)
            .returning(|_, _| Ok(Bytes::from_static(b"vectors")));
        store
            .expect_get_object()
            .withf(|bucket, key| {
                bucket.to_string() == "docs" && key.to_string() == "user-1/chart.pdf/index.pkl"
            })
            .times(1)
            .returning(|_, _| Ok(Bytes::from_static(b"docstore")));

        let fetched = fetcher(store, scratch.path())
            .fetch("user-1", "chart.pdf")
            .await
            .unwrap();

        assert_eq!(std::fs::read(fetched.vector_index_path()).unwrap(), b"vectors");
        assert_eq!(std::fs::read(fetched.docstore_path()).unwrap(), b"docstore");
        assert!(fetched.dir().starts_with(scratch.path()));
    }

    #[tokio::test]
    async fn test_scratch_directory_removed_on_drop() {
        let scratch = tempfile::tempdir().unwrap();
        let mut store = MockObjectStore::new();
        store.expect_provider_name().return_const("mock");
        store
            .expect_get_object()
            .returning(|_, _| Ok(Bytes::from_static(b"{}")));

        let fetcher = fetcher(store, scratch.path());
        let first = fetcher.fetch("user-1", "a.pdf").await.unwrap();
        let second = fetcher.fetch("user-1", "a.pdf").await.unwrap();
        assert_ne!(first.dir(), second.dir());

        let dir = first.dir().to_path_buf();
        drop(first);
        assert!(!dir.exists());
    }

    #[tokio::test]
    async fn test_missing_vector_index_stops_before_docstore() {
        let scratch = tempfile::tempdir().unwrap();
        let mut store = MockObjectStore::new();
        store.expect_provider_name().return_const("mock");
        store
            .expect_get_object()
            .times(1)
            .returning(|bucket, key| Err(AppError::IndexNotFound(format!("{}/{}", bucket, key))));

        let err = fetcher(store, scratch.path())
            .fetch("user-1", "missing.pdf")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::IndexNotFound(_)));
    }

    #[rstest]
    #[case("", false)]
    #[case("   ", false)]
    #[case("../other-user", true)]
    #[case("a/../../b", true)]
    #[case("/absolute", true)]
    #[case("trailing/", true)]
    #[case("back\\slash", true)]
    #[case("new\nline", true)]
    #[case("user/with/slash", false)]
    fn test_rejected_key_components(#[case] value: &str, #[case] nested: bool) {
        let err = validate_key_component("field", value, nested).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[rstest]
    #[case("chart.pdf", true)]
    #[case("reports/2023/chart.pdf", true)]
    #[case("Patient Intake Form.pdf", true)]
    #[case("us-east-1:5f0c-41aa", false)]
    fn test_accepted_key_components(#[case] value: &str, #[case] nested: bool) {
        assert!(validate_key_component("field", value, nested).is_ok());
    }
}
