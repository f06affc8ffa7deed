use super::ObjectStore;
use crate::types::{AppError, Result};
use async_trait::async_trait;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::Client;
use bytes::Bytes;

/// Object store backed by Amazon S3.
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    pub fn from_sdk_config(config: &aws_config::SdkConfig) -> Self {
        Self::new(Client::new(config))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn provider_name(&self) -> &'static str {
        "s3"
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Bytes> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if missing {
                    AppError::IndexNotFound(format!("s3://{}/{}", bucket, key))
                } else {
                    AppError::Storage(format!(
                        "Failed to get s3://{}/{}: {}",
                        bucket,
                        key,
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        let data = output.body.collect().await.map_err(|e| {
            AppError::Storage(format!(
                "Failed to read body of s3://{}/{}: {}",
                bucket, key, e
            ))
        })?;

        Ok(data.into_bytes())
    }
}
