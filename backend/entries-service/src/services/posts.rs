/// Post service - sequences metadata and blob writes for a post
///
/// There is no transaction spanning PostgreSQL and the blob store. Each
/// operation orders its steps so that a failure leaves, at worst, an extra
/// blob behind rather than a row pointing at content that was never written.
/// Best-effort steps go through `best_effort`, which logs and never escalates.
use crate::db::PostRepository;
use crate::error::{AppError, Result};
use crate::events::EventNotifier;
use crate::models::{ListParams, ListResult, Post, PostStatus};
use crate::services::images::ImagePipeline;
use crate::storage::{content_key, image_prefix, BlobError, BlobStore};
use std::sync::Arc;

pub const MARKDOWN_CONTENT_TYPE: &str = "text/markdown; charset=utf-8";

/// Optional field changes for `PostService::update_post`
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
}

#[derive(Clone)]
pub struct PostService {
    repo: Arc<dyn PostRepository>,
    blobs: Arc<dyn BlobStore>,
    images: ImagePipeline,
    notifier: Arc<dyn EventNotifier>,
}

impl PostService {
    pub fn new(
        repo: Arc<dyn PostRepository>,
        blobs: Arc<dyn BlobStore>,
        images: ImagePipeline,
        notifier: Arc<dyn EventNotifier>,
    ) -> Self {
        Self {
            repo,
            blobs,
            images,
            notifier,
        }
    }

    /// Create a draft post.
    ///
    /// The row is inserted before any content work so a slug collision costs
    /// nothing. If the body upload fails the row is removed again.
    pub async fn create_post(&self, title: &str, slug: &str, raw_content: &str) -> Result<Post> {
        let key = content_key(slug);
        let post = self.repo.create(title, slug, &key).await?;

        let content = self.images.process(raw_content, slug).await;

        if let Err(e) = self
            .blobs
            .upload(&key, content.into_bytes(), MARKDOWN_CONTENT_TYPE)
            .await
        {
            best_effort(
                "remove post row after failed content upload",
                slug,
                self.repo.delete(slug).await,
            );
            return Err(AppError::upload(key, e));
        }

        tracing::info!(post_id = %post.id, slug = %slug, "post created");
        Ok(post)
    }

    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Post> {
        self.repo.get_by_slug(slug).await
    }

    /// Markdown body of a post. A missing blob reads the same as a missing post.
    pub async fn get_post_content(&self, slug: &str) -> Result<Vec<u8>> {
        let post = self.repo.get_by_slug(slug).await?;

        match self.blobs.download(&post.content_key).await {
            Ok(bytes) => Ok(bytes),
            Err(BlobError::NotFound(_)) => {
                tracing::warn!(slug = %slug, key = %post.content_key, "post row has no content blob");
                Err(AppError::NotFound(format!("content for post '{}'", slug)))
            }
            Err(e) => Err(AppError::download(post.content_key, e)),
        }
    }

    /// One page of posts plus totals. List and count are separate reads.
    pub async fn list_posts(
        &self,
        page: i64,
        per_page: i64,
        status: Option<PostStatus>,
    ) -> Result<ListResult> {
        let params = ListParams::new(page, per_page, status);

        let posts = self
            .repo
            .list(params.limit(), params.offset(), params.status)
            .await?;
        let total = self.repo.count(params.status).await?;

        Ok(ListResult::new(posts, &params, total))
    }

    /// Apply optional title/slug/content changes to the post at `current_slug`.
    ///
    /// A rename onto a slug another post owns is refused before any blob is
    /// written. The previous content key is only dropped once the row points
    /// at the new one.
    pub async fn update_post(&self, current_slug: &str, update: PostUpdate) -> Result<Post> {
        let existing = self.repo.get_by_slug(current_slug).await?;

        let title = update.title.unwrap_or_else(|| existing.title.clone());
        let slug = update.slug.unwrap_or_else(|| existing.slug.clone());
        let slug_changed = slug != existing.slug;
        let old_key = existing.content_key.clone();

        if slug_changed {
            self.ensure_slug_free(&slug).await?;
        }

        let key = match update.content {
            Some(raw) => {
                let key = content_key(&slug);
                let content = self.images.process(&raw, &slug).await;
                self.blobs
                    .upload(&key, content.into_bytes(), MARKDOWN_CONTENT_TYPE)
                    .await
                    .map_err(|e| AppError::upload(key.clone(), e))?;
                key
            }
            None if !slug_changed => old_key.clone(),
            None => {
                let key = content_key(&slug);
                self.copy_content(&old_key, &key).await?;
                key
            }
        };

        let post = self.repo.update(existing.id, &title, &slug, &key).await?;

        if old_key != key {
            best_effort(
                "delete stale content key after rename",
                &old_key,
                self.blobs.delete(&old_key).await,
            );
        }

        tracing::info!(post_id = %post.id, slug = %post.slug, previous_slug = %current_slug, "post updated");
        Ok(post)
    }

    async fn ensure_slug_free(&self, slug: &str) -> Result<()> {
        match self.repo.get_by_slug(slug).await {
            Ok(_) => Err(AppError::Conflict(format!("slug '{}' already exists", slug))),
            Err(AppError::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Copy content to its new key.
    ///
    /// A failed download or upload is fatal: renaming without moving the body
    /// would leave the row pointing at nothing.
    async fn copy_content(&self, old_key: &str, new_key: &str) -> Result<()> {
        let bytes = self
            .blobs
            .download(old_key)
            .await
            .map_err(|e| AppError::download(old_key, e))?;

        self.blobs
            .upload(new_key, bytes, MARKDOWN_CONTENT_TYPE)
            .await
            .map_err(|e| AppError::upload(new_key, e))?;

        tracing::debug!(from = %old_key, to = %new_key, "content copied");
        Ok(())
    }

    /// Delete content, extracted images, then the row.
    ///
    /// Blob deletion failures stop the operation with the row intact, so a
    /// retry can still find what to clean up.
    pub async fn delete_post(&self, slug: &str) -> Result<()> {
        let post = self.repo.get_by_slug(slug).await?;

        self.blobs
            .delete(&post.content_key)
            .await
            .map_err(|e| AppError::delete(post.content_key.clone(), e))?;

        let prefix = image_prefix(slug);
        self.blobs
            .delete_prefix(&prefix)
            .await
            .map_err(|e| AppError::delete(prefix, e))?;

        self.repo.delete(slug).await?;

        tracing::info!(post_id = %post.id, slug = %slug, "post deleted");
        Ok(())
    }

    /// Publish a draft, then announce it. Announcement failures are logged only.
    pub async fn publish_post(&self, slug: &str) -> Result<Post> {
        let post = self.repo.publish(slug).await?;

        best_effort(
            "notify post published",
            slug,
            self.notifier
                .notify_published(post.id, &post.slug, &post.title)
                .await,
        );

        tracing::info!(post_id = %post.id, slug = %slug, "post published");
        Ok(post)
    }
}

/// Outcome of a step whose failure must not fail the caller
fn best_effort<E: std::fmt::Display>(step: &str, subject: &str, result: std::result::Result<(), E>) {
    if let Err(e) = result {
        tracing::warn!(step = %step, subject = %subject, error = %e, "best-effort step failed");
    }
}
