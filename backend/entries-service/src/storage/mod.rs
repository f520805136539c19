/// Blob storage for post bodies and extracted images
///
/// Key layout:
/// - content: `posts/{slug}.md`
/// - images:  `posts/{slug}/images/{id}.{ext}`
use async_trait::async_trait;
use s3_utils::S3Config;
use thiserror::Error;

pub mod s3;

pub use s3::S3BlobStore;

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("blob not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Backend(String),
}

/// Object storage keyed by string path.
///
/// Implementations must be safe to share across concurrent requests.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn upload(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<(), BlobError>;

    /// Missing keys yield `BlobError::NotFound`.
    async fn download(&self, key: &str) -> Result<Vec<u8>, BlobError>;

    async fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Remove every key that starts with `prefix`.
    async fn delete_prefix(&self, prefix: &str) -> Result<(), BlobError>;

    async fn exists(&self, key: &str) -> Result<bool, BlobError>;
}

pub fn content_key(slug: &str) -> String {
    format!("posts/{}.md", slug)
}

pub fn image_prefix(slug: &str) -> String {
    format!("posts/{}/images/", slug)
}

pub fn image_key(slug: &str, id: &str, ext: &str) -> String {
    format!("{}{}.{}", image_prefix(slug), id, ext)
}

/// Builds the public URL under which an uploaded blob is served.
#[derive(Debug, Clone)]
pub struct PublicUrls {
    config: S3Config,
}

impl PublicUrls {
    pub fn new(config: S3Config) -> Self {
        Self { config }
    }

    pub fn url_for(&self, key: &str) -> String {
        self.config.public_url(key)
    }
}

impl From<&S3Config> for PublicUrls {
    fn from(config: &S3Config) -> Self {
        Self::new(config.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_layout() {
        assert_eq!(content_key("hello-world"), "posts/hello-world.md");
        assert_eq!(image_prefix("hello-world"), "posts/hello-world/images/");
        assert_eq!(
            image_key("hello-world", "abc", "png"),
            "posts/hello-world/images/abc.png"
        );
    }
}
