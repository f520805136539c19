use actix_web::{middleware::Logger, web, App, HttpServer};
use entries_service::db::PgPostRepository;
use entries_service::events::{EventNotifier, KafkaEventNotifier, NoopNotifier};
use entries_service::handlers::{self, AppState};
use entries_service::services::{ImagePipeline, PostService};
use entries_service::storage::{BlobStore, PublicUrls, S3BlobStore};
use s3_utils::S3Client;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::sync::Arc;
use std::time::Duration;

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "SIGTERM handler unavailable; waiting for Ctrl+C only");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    tracing::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

/// Entries Service
///
/// # Routes
///
/// - `/api/v1/posts/*` - Create, list, read, update, delete and publish posts
/// - `/api/v1/health`, `/api/v1/health/ready` - Liveness and readiness
///
/// When `API_KEY` is set, post routes require it in `X-API-Key` or as a
/// bearer token. Health probes stay open.
///
/// Post metadata is stored in PostgreSQL, post bodies and extracted images
/// in S3. Publish notifications go to Kafka when `EVENTS_ENABLED=true`.
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();
    entries_service::logging::init_tracing();

    let config = entries_service::Config::from_env()
        .map_err(|e| startup_error("Configuration loading failed", e))?;

    tracing::info!("Starting entries-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Environment: {}", config.app.env);

    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(&config.database.url)
        .await
        .map_err(|e| startup_error("Database connection failed", e))?;

    sqlx::migrate!("./migrations")
        .run(&db_pool)
        .await
        .map_err(|e| startup_error("Database migration failed", e))?;
    tracing::info!("Connected to database, migrations applied");

    let s3 = S3Client::connect(config.s3.clone()).await;
    if let Err(e) = s3.health_check().await {
        // The bucket may be provisioned after startup; requests will surface failures.
        tracing::warn!(error = %e, bucket = %config.s3.bucket, "S3 health check failed");
    }

    let blobs: Arc<dyn BlobStore> = Arc::new(S3BlobStore::new(s3.operations()));

    let notifier: Arc<dyn EventNotifier> = if config.events.enabled {
        Arc::new(
            KafkaEventNotifier::new(
                &config.events.brokers_csv(),
                &config.events.topic,
                Duration::from_millis(config.events.send_timeout_ms),
            )
            .map_err(|e| startup_error("Kafka producer creation failed", e))?,
        )
    } else {
        tracing::info!("Event delivery disabled; publish notifications are dropped");
        Arc::new(NoopNotifier)
    };

    let images = ImagePipeline::new(blobs.clone(), PublicUrls::from(&config.s3));
    let posts = PostService::new(
        Arc::new(PgPostRepository::new(db_pool.clone())),
        blobs,
        images,
        notifier,
    );

    if config.app.api_key.is_none() {
        tracing::warn!("API_KEY not set; post routes are unauthenticated");
    }

    let state = web::Data::new(
        AppState::new(posts, Duration::from_secs(config.app.request_timeout_secs))
            .with_api_key(config.app.api_key.clone()),
    );
    let pool_data = web::Data::new(db_pool);

    let bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", bind_address);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(pool_data.clone())
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/api/v1/health", web::get().to(handlers::liveness_check))
            .route("/api/v1/health/ready", web::get().to(handlers::readiness_check))
            .configure(handlers::configure_posts)
    })
    .bind(&bind_address)?
    .disable_signals()
    .run();

    let server_handle = server.handle();
    tokio::spawn(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received");
        server_handle.stop(true).await;
    });

    server.await?;

    tracing::info!("Entries-service shutting down");
    Ok(())
}
