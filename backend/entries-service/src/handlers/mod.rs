/// HTTP handlers for entries-service
///
/// - Posts: create, list, read metadata/content, update, delete, publish
/// - Health: liveness and readiness probes
pub mod health;
pub mod posts;

use crate::error::AppError;
use crate::middleware::ApiKeyAuth;
use crate::services::PostService;
use actix_web::web;
use std::time::Duration;

/// Largest accepted JSON request body; posts may carry inline images
pub const MAX_JSON_BODY_BYTES: usize = 16 * 1024 * 1024;

pub use health::{liveness_check, readiness_check};
pub use posts::{
    create_post, delete_post, get_post, get_post_content, list_posts, publish_post, update_post,
};

/// Shared request state
pub struct AppState {
    pub posts: PostService,
    pub request_timeout: Duration,
    /// Shared key required on post routes; `None` disables the check
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(posts: PostService, request_timeout: Duration) -> Self {
        Self {
            posts,
            request_timeout,
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.is_empty());
        self
    }
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(MAX_JSON_BODY_BYTES)
        .error_handler(|err, _req| {
            tracing::debug!(error = %err, "rejected request body");
            AppError::BadRequest("invalid JSON body".to_string()).into()
        })
}

/// Register the `/api/v1/posts` routes behind API key auth
pub fn configure_posts(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/posts")
            .wrap(ApiKeyAuth)
            .app_data(json_config())
            .service(
                web::resource("")
                    .route(web::post().to(create_post))
                    .route(web::get().to(list_posts)),
            )
            .service(
                web::resource("/{slug}")
                    .route(web::get().to(get_post))
                    .route(web::put().to(update_post))
                    .route(web::delete().to(delete_post)),
            )
            .route("/{slug}/content", web::get().to(get_post_content))
            .route("/{slug}/publish", web::post().to(publish_post)),
    );
}
