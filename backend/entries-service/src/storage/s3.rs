use super::{BlobError, BlobStore};
use async_trait::async_trait;
use s3_utils::{S3Error, S3Operations};

/// `BlobStore` backed by an S3 bucket
#[derive(Clone)]
pub struct S3BlobStore {
    ops: S3Operations,
}

impl S3BlobStore {
    pub fn new(ops: S3Operations) -> Self {
        Self { ops }
    }
}

impl From<S3Error> for BlobError {
    fn from(err: S3Error) -> Self {
        match err {
            S3Error::NotFound(key) => BlobError::NotFound(key),
            other => BlobError::Backend(other.to_string()),
        }
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BlobError> {
        Ok(self.ops.put_object(key, body, content_type).await?)
    }

    async fn download(&self, key: &str) -> Result<Vec<u8>, BlobError> {
        Ok(self.ops.get_object(key).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), BlobError> {
        Ok(self.ops.delete_object(key).await?)
    }

    async fn delete_prefix(&self, prefix: &str) -> Result<(), BlobError> {
        self.ops.delete_prefix(prefix).await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, BlobError> {
        Ok(self.ops.object_exists(key).await?)
    }
}
