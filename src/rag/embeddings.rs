use crate::types::Result;
use async_trait::async_trait;

/// Turns query text into a dense vector in the same space the index was built in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>>;

    fn model_name(&self) -> &str;
}
