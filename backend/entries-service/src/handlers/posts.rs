/// Post handlers - HTTP endpoints for post operations
///
/// Edge validation (field presence, length, slug shape) happens here, before
/// the post service is called.
use super::AppState;
use crate::error::{AppError, Result};
use crate::models::PostStatus;
use crate::services::posts::MARKDOWN_CONTENT_TYPE;
use crate::services::PostUpdate;
use actix_web::{web, HttpResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;

const MAX_TITLE_CHARS: usize = 200;
const MAX_SLUG_CHARS: usize = 100;

static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("slug pattern is valid"));

#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    pub title: String,
    pub slug: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePostRequest {
    pub title: Option<String>,
    pub slug: Option<String>,
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListPostsQuery {
    pub page: Option<String>,
    pub per_page: Option<String>,
    pub status: Option<String>,
}

fn validate_title(title: &str, errors: &mut HashMap<String, String>) {
    if title.trim().is_empty() {
        errors.insert("title".into(), "required".into());
    } else if title.chars().count() > MAX_TITLE_CHARS {
        errors.insert("title".into(), format!("max {} characters", MAX_TITLE_CHARS));
    }
}

fn validate_slug(slug: &str, errors: &mut HashMap<String, String>) {
    if slug.is_empty() {
        errors.insert("slug".into(), "required".into());
    } else if slug.chars().count() > MAX_SLUG_CHARS {
        errors.insert("slug".into(), format!("max {} characters", MAX_SLUG_CHARS));
    } else if !SLUG_PATTERN.is_match(slug) {
        errors.insert(
            "slug".into(),
            "must be lowercase alphanumeric with hyphens".into(),
        );
    }
}

fn ensure_valid(errors: HashMap<String, String>) -> Result<()> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

/// Run a post operation under the request deadline. Expiry drops the
/// operation's future, cancelling any store call still in flight.
async fn with_deadline<T>(state: &AppState, op: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(state.request_timeout, op)
        .await
        .map_err(|_| AppError::Timeout)?
}

/// Lenient page/per_page parsing: anything unparseable becomes 0 and is
/// normalized by the service.
fn parse_page_value(raw: Option<&str>) -> i64 {
    raw.and_then(|v| v.trim().parse().ok()).unwrap_or(0)
}

/// Create a new post
pub async fn create_post(
    state: web::Data<AppState>,
    req: web::Json<CreatePostRequest>,
) -> Result<HttpResponse> {
    let mut errors = HashMap::new();
    validate_title(&req.title, &mut errors);
    validate_slug(&req.slug, &mut errors);
    ensure_valid(errors)?;

    let post = with_deadline(
        &state,
        state.posts.create_post(&req.title, &req.slug, &req.content),
    )
    .await?;

    Ok(HttpResponse::Created().json(post))
}

/// List posts, optionally filtered by status
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<ListPostsQuery>,
) -> Result<HttpResponse> {
    let status = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<PostStatus>().map_err(|_| {
            let mut errors = HashMap::new();
            errors.insert("status".to_string(), "must be draft or published".to_string());
            AppError::Validation(errors)
        })?),
    };

    let page = parse_page_value(query.page.as_deref());
    let per_page = parse_page_value(query.per_page.as_deref());

    let result = with_deadline(&state, state.posts.list_posts(page, per_page, status)).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// Get a post's metadata by slug
pub async fn get_post(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    let post = with_deadline(&state, state.posts.get_post_by_slug(&slug)).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Get a post's markdown body
pub async fn get_post_content(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    let body = with_deadline(&state, state.posts.get_post_content(&slug)).await?;
    Ok(HttpResponse::Ok()
        .content_type(MARKDOWN_CONTENT_TYPE)
        .body(body))
}

/// Update title, slug and/or content
pub async fn update_post(
    state: web::Data<AppState>,
    slug: web::Path<String>,
    req: web::Json<UpdatePostRequest>,
) -> Result<HttpResponse> {
    let req = req.into_inner();

    let mut errors = HashMap::new();
    if let Some(title) = &req.title {
        validate_title(title, &mut errors);
    }
    if let Some(new_slug) = &req.slug {
        validate_slug(new_slug, &mut errors);
    }
    ensure_valid(errors)?;

    let update = PostUpdate {
        title: req.title,
        slug: req.slug,
        content: req.content,
    };

    let post = with_deadline(&state, state.posts.update_post(&slug, update)).await?;
    Ok(HttpResponse::Ok().json(post))
}

/// Delete a post with its content and images
pub async fn delete_post(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    with_deadline(&state, state.posts.delete_post(&slug)).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Publish a draft post
pub async fn publish_post(
    state: web::Data<AppState>,
    slug: web::Path<String>,
) -> Result<HttpResponse> {
    let post = with_deadline(&state, state.posts.publish_post(&slug)).await?;
    Ok(HttpResponse::Ok().json(post))
}
