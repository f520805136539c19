//! In-memory stores for post service tests
//!
//! Provides metadata/blob/notifier implementations that need no PostgreSQL,
//! S3 or Kafka, with switches to make individual operations fail.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use entries_service::db::PostRepository;
use entries_service::error::{AppError, Result};
use entries_service::events::EventNotifier;
use entries_service::models::{Post, PostStatus};
use entries_service::services::{ImagePipeline, PostService};
use entries_service::storage::{BlobError, BlobStore, PublicUrls};
use s3_utils::S3Config;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

pub const PUBLIC_BASE_URL: &str = "https://cdn.test";

/// Metadata store keeping rows in insertion order
#[derive(Default)]
pub struct MockPostRepository {
    posts: Mutex<Vec<Post>>,
}

impl MockPostRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, slug: &str) -> Option<Post> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.slug == slug)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    /// Insert a row directly, bypassing the service
    pub fn insert(&self, title: &str, slug: &str, content_key: &str, status: PostStatus) -> Post {
        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: title.to_string(),
            slug: slug.to_string(),
            content_key: content_key.to_string(),
            status,
            created_at: now,
            updated_at: now,
        };
        self.posts.lock().unwrap().push(post.clone());
        post
    }
}

#[async_trait]
impl PostRepository for MockPostRepository {
    async fn create(&self, title: &str, slug: &str, content_key: &str) -> Result<Post> {
        if self.find(slug).is_some() {
            return Err(AppError::Conflict(format!("slug '{}' already exists", slug)));
        }
        Ok(self.insert(title, slug, content_key, PostStatus::Draft))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Post> {
        self.find(slug)
            .ok_or_else(|| AppError::NotFound(format!("post '{}'", slug)))
    }

    async fn list(&self, limit: i64, offset: i64, status: Option<PostStatus>) -> Result<Vec<Post>> {
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .rev()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn count(&self, status: Option<PostStatus>) -> Result<i64> {
        let posts = self.posts.lock().unwrap();
        Ok(posts
            .iter()
            .filter(|p| status.map_or(true, |s| p.status == s))
            .count() as i64)
    }

    async fn update(&self, id: Uuid, title: &str, slug: &str, content_key: &str) -> Result<Post> {
        let mut posts = self.posts.lock().unwrap();
        if posts.iter().any(|p| p.slug == slug && p.id != id) {
            return Err(AppError::Conflict(format!("slug '{}' already exists", slug)));
        }
        let post = posts
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))?;
        post.title = title.to_string();
        post.slug = slug.to_string();
        post.content_key = content_key.to_string();
        post.updated_at = Utc::now();
        Ok(post.clone())
    }

    async fn delete(&self, slug: &str) -> Result<()> {
        self.posts.lock().unwrap().retain(|p| p.slug != slug);
        Ok(())
    }

    async fn publish(&self, slug: &str) -> Result<Post> {
        let mut posts = self.posts.lock().unwrap();
        let post = posts
            .iter_mut()
            .find(|p| p.slug == slug && p.status == PostStatus::Draft)
            .ok_or_else(|| {
                AppError::NotFound(format!("post '{}' not found or not a draft", slug))
            })?;
        post.status = PostStatus::Published;
        post.updated_at = Utc::now();
        Ok(post.clone())
    }
}

/// Which blob operation should fail
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BlobOp {
    Upload,
    Download,
    Delete,
    DeletePrefix,
}

#[derive(Debug, Clone)]
pub struct StoredBlob {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Blob store with per-operation and per-key failure injection
#[derive(Default)]
pub struct MockBlobStore {
    objects: Mutex<BTreeMap<String, StoredBlob>>,
    failing_ops: Mutex<HashSet<BlobOp>>,
    failing_upload_prefixes: Mutex<Vec<String>>,
    uploads: Mutex<Vec<String>>,
}

impl MockBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, op: BlobOp) {
        self.failing_ops.lock().unwrap().insert(op);
    }

    pub fn recover(&self, op: BlobOp) {
        self.failing_ops.lock().unwrap().remove(&op);
    }

    /// Make uploads of keys starting with `prefix` fail
    pub fn fail_uploads_under(&self, prefix: &str) {
        self.failing_upload_prefixes
            .lock()
            .unwrap()
            .push(prefix.to_string());
    }

    pub fn put(&self, key: &str, bytes: &[u8]) {
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredBlob {
                bytes: bytes.to_vec(),
                content_type: "text/markdown; charset=utf-8".to_string(),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<StoredBlob> {
        self.objects.lock().unwrap().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }

    pub fn keys_under(&self, prefix: &str) -> Vec<String> {
        self.keys()
            .into_iter()
            .filter(|k| k.starts_with(prefix))
            .collect()
    }

    /// Every key an upload was attempted for, failed or not
    pub fn upload_attempts(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }

    fn check(&self, op: BlobOp, key: &str) -> std::result::Result<(), BlobError> {
        if self.failing_ops.lock().unwrap().contains(&op) {
            return Err(BlobError::Backend(format!("injected {:?} failure for {}", op, key)));
        }
        Ok(())
    }
}

#[async_trait]
impl BlobStore for MockBlobStore {
    async fn upload(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> std::result::Result<(), BlobError> {
        self.uploads.lock().unwrap().push(key.to_string());
        self.check(BlobOp::Upload, key)?;
        if self
            .failing_upload_prefixes
            .lock()
            .unwrap()
            .iter()
            .any(|p| key.starts_with(p.as_str()))
        {
            return Err(BlobError::Backend(format!("injected upload failure for {}", key)));
        }
        self.objects.lock().unwrap().insert(
            key.to_string(),
            StoredBlob {
                bytes: body,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }

    async fn download(&self, key: &str) -> std::result::Result<Vec<u8>, BlobError> {
        self.check(BlobOp::Download, key)?;
        self.get(key)
            .map(|blob| blob.bytes)
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> std::result::Result<(), BlobError> {
        self.check(BlobOp::Delete, key)?;
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> std::result::Result<(), BlobError> {
        self.check(BlobOp::DeletePrefix, prefix)?;
        self.objects
            .lock()
            .unwrap()
            .retain(|key, _| !key.starts_with(prefix));
        Ok(())
    }

    async fn exists(&self, key: &str) -> std::result::Result<bool, BlobError> {
        Ok(self.contains(key))
    }
}

/// Notifier counting calls, optionally failing every one
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<(Uuid, String, String)>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn calls(&self) -> Vec<(Uuid, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventNotifier for RecordingNotifier {
    async fn notify_published(&self, post_id: Uuid, slug: &str, title: &str) -> anyhow::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push((post_id, slug.to_string(), title.to_string()));
        if self.fail {
            anyhow::bail!("broker unavailable");
        }
        Ok(())
    }
}

pub fn test_s3_config() -> S3Config {
    S3Config {
        bucket: "entries-test".to_string(),
        region: "us-east-1".to_string(),
        public_base_url: Some(PUBLIC_BASE_URL.to_string()),
        endpoint: None,
        force_path_style: false,
    }
}

/// Service wired to fresh in-memory stores
pub struct Harness {
    pub repo: Arc<MockPostRepository>,
    pub blobs: Arc<MockBlobStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub service: PostService,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_notifier(RecordingNotifier::new())
    }

    pub fn with_notifier(notifier: RecordingNotifier) -> Self {
        let repo = Arc::new(MockPostRepository::new());
        let blobs = Arc::new(MockBlobStore::new());
        let notifier = Arc::new(notifier);

        let images = ImagePipeline::new(blobs.clone(), PublicUrls::new(test_s3_config()));
        let service = PostService::new(repo.clone(), blobs.clone(), images, notifier.clone());

        Self {
            repo,
            blobs,
            notifier,
            service,
        }
    }
}

/// A 1x1 transparent PNG, base64-encoded
pub const TINY_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAYAAAAfFcSJAAAADUlEQVR42mNkYPhfDwAChwGA60e6kgAAAABJRU5ErkJggg==";
