/// S3 object operations: single-object put/get/delete/head and prefix-scoped delete
use crate::config::S3Config;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use std::sync::Arc;
use thiserror::Error;

/// DeleteObjects accepts at most 1000 keys per request.
const DELETE_BATCH_SIZE: usize = 1000;

pub type S3Result<T> = Result<T, S3Error>;

#[derive(Error, Debug)]
pub enum S3Error {
    /// Object does not exist
    #[error("object not found: {0}")]
    NotFound(String),

    /// Request to S3 failed
    #[error("S3 {operation} failed for '{key}': {message}")]
    Request {
        operation: &'static str,
        key: String,
        message: String,
    },
}

impl S3Error {
    fn request(operation: &'static str, key: &str, err: impl std::error::Error) -> Self {
        S3Error::Request {
            operation,
            key: key.to_string(),
            message: DisplayErrorContext(err).to_string(),
        }
    }
}

#[derive(Clone)]
pub struct S3Operations {
    client: Arc<Client>,
    config: S3Config,
}

impl S3Operations {
    pub fn new(client: Arc<Client>, config: S3Config) -> Self {
        Self { client, config }
    }

    /// Upload an object
    pub async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> S3Result<()> {
        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| S3Error::request("PutObject", key, e))?;

        Ok(())
    }

    /// Download an object; a missing key yields `S3Error::NotFound`
    pub async fn get_object(&self, key: &str) -> S3Result<Vec<u8>> {
        let response = match self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);
                if missing {
                    return Err(S3Error::NotFound(key.to_string()));
                }
                return Err(S3Error::request("GetObject", key, e));
            }
        };

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| S3Error::request("GetObject", key, e))?;
        Ok(body.into_bytes().to_vec())
    }

    /// Delete an object. S3 treats deleting a missing key as success.
    pub async fn delete_object(&self, key: &str) -> S3Result<()> {
        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| S3Error::request("DeleteObject", key, e))?;

        Ok(())
    }

    /// List every key sharing `prefix`, following continuation tokens
    pub async fn list_keys(&self, prefix: &str) -> S3Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(&self.config.bucket)
                .prefix(prefix)
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| S3Error::request("ListObjectsV2", prefix, e))?;

            keys.extend(
                response
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(|k| k.to_string())),
            );

            match response.next_continuation_token() {
                Some(token) if response.is_truncated().unwrap_or(false) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(keys)
    }

    /// Delete every object whose key starts with `prefix`
    pub async fn delete_prefix(&self, prefix: &str) -> S3Result<usize> {
        let keys = self.list_keys(prefix).await?;
        if keys.is_empty() {
            return Ok(0);
        }

        for batch in keys.chunks(DELETE_BATCH_SIZE) {
            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| S3Error::request("DeleteObjects", prefix, e))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| S3Error::request("DeleteObjects", prefix, e))?;

            let response = self
                .client
                .delete_objects()
                .bucket(&self.config.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| S3Error::request("DeleteObjects", prefix, e))?;

            if let Some(failed) = response.errors().first() {
                return Err(S3Error::Request {
                    operation: "DeleteObjects",
                    key: failed.key().unwrap_or(prefix).to_string(),
                    message: failed.message().unwrap_or("unknown error").to_string(),
                });
            }
        }

        tracing::debug!(prefix = %prefix, count = keys.len(), "deleted objects under prefix");
        Ok(keys.len())
    }

    /// Check if object exists
    pub async fn object_exists(&self, key: &str) -> S3Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let missing = e
                    .as_service_error()
                    .map(|se| se.is_not_found())
                    .unwrap_or(false);
                if missing {
                    Ok(false)
                } else {
                    Err(S3Error::request("HeadObject", key, e))
                }
            }
        }
    }
}
