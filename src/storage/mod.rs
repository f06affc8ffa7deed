//! Object storage for per-user index artifacts.
//!
//! The [`ObjectStore`] trait hides the storage backend; [`IndexFetcher`]
//! uses it to pull both artifacts of a document index into scratch space.

pub mod fetcher;
pub mod local;
pub mod s3;

pub use fetcher::{FetchedIndex, IndexFetcher, IndexKeys};
pub use local::LocalObjectStore;
pub use s3::S3ObjectStore;

use crate::types::Result;
use async_trait::async_trait;
use bytes::Bytes;

/// Read access to an object store.
///
/// Implementations report a missing object as
/// [`AppError::IndexNotFound`](crate::types::AppError::IndexNotFound) and
/// every other failure as
/// [`AppError::Storage`](crate::types::AppError::Storage).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Backend name used in logs.
    fn provider_name(&self) -> &'static str;

    /// Fetch the full contents of `key` in `bucket`.
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes>;
}
