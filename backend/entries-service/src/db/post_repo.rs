use super::PostRepository;
use crate::error::{AppError, Result};
use crate::models::{Post, PostStatus};
use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

const POST_COLUMNS: &str = "id, title, slug, content_key, status, created_at, updated_at";

/// PostgreSQL-backed metadata store
#[derive(Clone)]
pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Translate a write error, surfacing unique-slug violations as `Conflict`
fn map_write_error(err: sqlx::Error, slug: &str) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return AppError::Conflict(format!("slug '{}' already exists", slug));
        }
    }
    AppError::Database(err)
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, title: &str, slug: &str, content_key: &str) -> Result<Post> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            INSERT INTO posts (title, slug, content_key, status)
            VALUES ($1, $2, $3, $4)
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(title)
        .bind(slug)
        .bind(content_key)
        .bind(PostStatus::Draft.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, slug))
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Post> {
        sqlx::query_as::<_, Post>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post '{}'", slug)))
    }

    async fn list(&self, limit: i64, offset: i64, status: Option<PostStatus>) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(&format!(
            r#"
            SELECT {POST_COLUMNS}
            FROM posts
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    async fn count(&self, status: Option<PostStatus>) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM posts WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn update(&self, id: Uuid, title: &str, slug: &str, content_key: &str) -> Result<Post> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET title = $2, slug = $3, content_key = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(title)
        .bind(slug)
        .bind(content_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, slug))?
        .ok_or_else(|| AppError::NotFound(format!("post {}", id)))
    }

    async fn delete(&self, slug: &str) -> Result<()> {
        sqlx::query("DELETE FROM posts WHERE slug = $1")
            .bind(slug)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn publish(&self, slug: &str) -> Result<Post> {
        sqlx::query_as::<_, Post>(&format!(
            r#"
            UPDATE posts
            SET status = $2, updated_at = NOW()
            WHERE slug = $1 AND status = $3
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(slug)
        .bind(PostStatus::Published.as_str())
        .bind(PostStatus::Draft.as_str())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post '{}' not found or not a draft", slug)))
    }
}
