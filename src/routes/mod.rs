use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json, Router,
};
use serde_json::json;
use sqlx::PgPool;

use crate::{AnalyticsError, Config};

mod cities;
mod health;
mod payload;

// ---

pub fn router(pool: PgPool, config: Config) -> Router {
    // ---
    Router::new()
        .merge(payload::router())
        .merge(cities::router())
        .merge(health::router())
        .with_state((pool, config))
}

/// Terminal analytics errors become a JSON body with the full cause chain.
impl IntoResponse for AnalyticsError {
    // ---
    fn into_response(self) -> Response {
        // ---
        let status = match self.kind() {
            "input_error" => StatusCode::BAD_REQUEST,
            "unknown_city" | "empty_result" => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let message = self.cause_chain();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", message);
        } else {
            tracing::warn!("Request rejected: {}", message);
        }

        (status, Json(json!({ "error": self.kind(), "message": message }))).into_response()
    }
}
