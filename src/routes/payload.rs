//! Analytics over readings supplied in the request body.
//!
//! The body is JSON text holding an array of reading records; nothing touches
//! the database on this path.

use axum::{routing::post, Json, Router};
use sqlx::PgPool;
use tracing::{debug, info};

use crate::{aggregate, normalize, AnalyticsError, Config, RawInput, Reading, StatisticsRecord};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new()
        .route("/analytics/stats", post(stats))
        .route("/analytics/classify", post(classify))
}

/// `POST /analytics/stats`: summary statistics for the posted readings.
async fn stats(body: String) -> Result<Json<StatisticsRecord>, AnalyticsError> {
    // ---
    let readings = load_readings(body)?;
    let stats = aggregate(&readings)?;

    info!(
        "POST /analytics/stats - {} readings, avg AQI {}, trend {:?}",
        stats.total_records, stats.avg_aqi, stats.trend
    );
    Ok(Json(stats))
}

/// `POST /analytics/classify`: the posted readings, normalized, ordered and
/// labelled with their AQI category and color.
async fn classify(body: String) -> Result<Json<Vec<Reading>>, AnalyticsError> {
    // ---
    let readings = load_readings(body)?;
    info!("POST /analytics/classify - {} readings", readings.len());
    Ok(Json(readings))
}

fn load_readings(body: String) -> Result<Vec<Reading>, AnalyticsError> {
    // ---
    let records = RawInput::Json(body).load()?;
    debug!("Decoded {} raw records", records.len());

    let readings = normalize(records);
    if readings.is_empty() {
        return Err(AnalyticsError::EmptyResult(
            "payload contains no readings".to_string(),
        ));
    }
    Ok(readings)
}
