// src/routes/health.rs
//! Health check endpoint for the analytics service.
//!
//! `/health` reports whether the process answers HTTP and whether the
//! database behind the city analytics endpoints is reachable. The payload
//! endpoints keep working without a database, so a `down` database does not
//! turn the status into an error.

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use sqlx::PgPool;

use crate::Config;

/// JSON response body for the `/health` endpoint.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    database: &'static str,
}

/// Handle `GET /health`.
async fn health(State((pool, _)): State<(PgPool, Config)>) -> Json<HealthResponse> {
    // ---
    let database = match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => "up",
        Err(e) => {
            tracing::warn!("Health check database probe failed: {}", e);
            "down"
        }
    };

    Json(HealthResponse {
        status: "ok",
        database,
    })
}

/// Create a subrouter containing the `/health` route.
pub fn router() -> Router<(PgPool, Config)> {
    Router::new().route("/health", get(health))
}
