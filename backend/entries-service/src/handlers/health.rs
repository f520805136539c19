/// Health probes
use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use std::time::Instant;

/// Liveness: the process is up and serving
pub async fn liveness_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "entries-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness: PostgreSQL answers a trivial query
pub async fn readiness_check(pool: web::Data<PgPool>) -> HttpResponse {
    let start = Instant::now();
    let result = sqlx::query("SELECT 1").execute(pool.get_ref()).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HttpResponse::Ok().json(serde_json::json!({
            "ready": true,
            "checks": { "postgresql": { "status": "healthy", "latency_ms": latency_ms } }
        })),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "ready": false,
                "checks": {
                    "postgresql": {
                        "status": "unhealthy",
                        "message": format!("PostgreSQL connection failed: {}", e),
                        "latency_ms": latency_ms
                    }
                }
            }))
        }
    }
}
