/// Database access layer
///
/// `PostRepository` is the metadata-store contract the post service depends
/// on; `PgPostRepository` is the PostgreSQL implementation.
use crate::error::Result;
use crate::models::{Post, PostStatus};
use async_trait::async_trait;
use uuid::Uuid;

pub mod post_repo;

pub use post_repo::PgPostRepository;

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Insert a draft post. Fails with `Conflict` when the slug is taken.
    async fn create(&self, title: &str, slug: &str, content_key: &str) -> Result<Post>;

    async fn get_by_slug(&self, slug: &str) -> Result<Post>;

    async fn list(&self, limit: i64, offset: i64, status: Option<PostStatus>) -> Result<Vec<Post>>;

    async fn count(&self, status: Option<PostStatus>) -> Result<i64>;

    /// Fails with `NotFound` when the row vanished, `Conflict` on slug collision.
    async fn update(&self, id: Uuid, title: &str, slug: &str, content_key: &str) -> Result<Post>;

    async fn delete(&self, slug: &str) -> Result<()>;

    /// Draft -> Published. Anything not currently a draft yields `NotFound`.
    async fn publish(&self, slug: &str) -> Result<Post>;
}
