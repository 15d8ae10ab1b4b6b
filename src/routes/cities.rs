//! Database-backed analytics for one city.
//!
//! Each request resolves its data-availability scenario first, then fetches
//! only the window the resolver selected.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    aggregate, classify_average, fetch_city_readings, parse_timestamp, requested_window,
    AnalyticsError, AvailabilityReport, Category, CityReadings, Config, PgStore, Reading,
    StatisticsRecord,
};

// ---

pub fn router() -> Router<(PgPool, Config)> {
    // ---
    Router::new()
        .route("/analytics/cities/{city}/stats", get(stats))
        .route("/analytics/cities/{city}/report", get(report))
}

/// Optional window bounds; any accepted timestamp layout.
#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    start: Option<String>,
    end: Option<String>,
}

#[derive(Debug, Serialize)]
struct CityStats {
    city: String,
    availability: AvailabilityReport,
    statistics: StatisticsRecord,
}

/// Everything a report generator needs; layout is up to the consumer.
#[derive(Debug, Serialize)]
struct ReportFeed {
    // ---
    report_id: Uuid,
    generated_at: DateTime<Utc>,
    city: String,
    availability: AvailabilityReport,
    statistics: StatisticsRecord,
    average_category: Category,
    readings: Vec<Reading>,
}

/// `GET /analytics/cities/{city}/stats`
async fn stats(
    Path(city): Path<String>,
    Query(params): Query<WindowQuery>,
    State((pool, config)): State<(PgPool, Config)>,
) -> Result<Json<CityStats>, AnalyticsError> {
    // ---
    info!("GET /analytics/cities/{}/stats {:?}", city, params);

    let CityReadings {
        availability,
        readings,
    } = load_city(&pool, &config, &city, &params, Utc::now()).await?;
    let statistics = aggregate(&readings)?;

    Ok(Json(CityStats {
        availability: availability.report(&city),
        city,
        statistics,
    }))
}

/// `GET /analytics/cities/{city}/report`
async fn report(
    Path(city): Path<String>,
    Query(params): Query<WindowQuery>,
    State((pool, config)): State<(PgPool, Config)>,
) -> Result<Json<ReportFeed>, AnalyticsError> {
    // ---
    info!("GET /analytics/cities/{}/report {:?}", city, params);

    let generated_at = Utc::now();
    let CityReadings {
        availability,
        readings,
    } = load_city(&pool, &config, &city, &params, generated_at).await?;
    let statistics = aggregate(&readings)?;

    Ok(Json(ReportFeed {
        report_id: Uuid::new_v4(),
        generated_at,
        availability: availability.report(&city),
        city,
        average_category: classify_average(statistics.avg_aqi),
        statistics,
        readings,
    }))
}

async fn load_city(
    pool: &PgPool,
    config: &Config,
    city: &str,
    params: &WindowQuery,
    now: DateTime<Utc>,
) -> Result<CityReadings, AnalyticsError> {
    // ---
    let start = parse_bound(params.start.as_deref())?;
    let end = parse_bound(params.end.as_deref())?;
    let window = requested_window(start, end, now, config.default_window_days)?;

    let store = PgStore::new(pool.clone());
    fetch_city_readings(&store, city, window, now).await
}

fn parse_bound(value: Option<&str>) -> Result<Option<DateTime<Utc>>, AnalyticsError> {
    // ---
    match value.map(str::trim).filter(|v| !v.is_empty() && *v != "null") {
        None => Ok(None),
        Some(text) => parse_timestamp(text)
            .map(Some)
            .ok_or_else(|| AnalyticsError::InvalidTimestamp(text.to_string())),
    }
}
