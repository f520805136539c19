/// Entries Service Library
///
/// Publishes markdown posts whose metadata lives in PostgreSQL and whose
/// bodies (plus any embedded images) live in S3.
///
/// # Modules
///
/// - `handlers`: HTTP request handlers and edge validation
/// - `middleware`: API key authentication
/// - `models`: Post, status and pagination types
/// - `services`: Post orchestration and the embedded image pipeline
/// - `db`: Metadata store contract and PostgreSQL repository
/// - `storage`: Blob store contract, key layout and S3 implementation
/// - `events`: Publish notifications (Kafka or no-op)
/// - `error`: Error types and handling
/// - `config`: Configuration management
/// - `logging`: Tracing subscriber setup
pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
