//! Application entry point for the `airsight-analytics` service.
//!
//! This binary orchestrates the startup sequence for the air-quality
//! analytics API:
//! - Loading configuration from environment variables or `.env`
//! - Initializing structured logging/tracing
//! - Establishing a PostgreSQL connection pool
//! - Creating the `aqi_data` schema if it does not exist
//! - Optionally seeding an empty database from a JSON readings file
//! - Mounting all API routes via the `routes` gateway
//! - Binding the Axum HTTP server and serving requests
//!
//! # Environment Variables
//! - `DATABASE_URL` (**required**) – PostgreSQL connection string
//! - `DB_POOL_MAX` (optional) – maximum number of DB connections (default: 5)
//! - `ANALYTICS_PORT` (optional) – HTTP port (default: 8080)
//! - `ANALYTICS_DEFAULT_WINDOW_DAYS` (optional) – default query window (default: 30)
//! - `SEED_READINGS_FILE` (optional) – JSON readings to seed an empty database
//! - `ANALYTICS_LOG_LEVEL` (optional) – log verbosity (default: `debug`)
//! - `AXUM_SPAN_EVENTS` (optional) – span event mode for tracing
//!
//! The analytics engine itself (`aqi`, `normalize`, `stats`, `availability`)
//! never owns a connection: the pool lives here and is lent to the routes.
use std::{env, net::SocketAddr};

use anyhow::{Context, Result};
use axum::Router;
use dotenvy::dotenv;
use is_terminal::IsTerminal;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

mod aqi;
mod availability;
mod config;
mod error;
mod models;
mod normalize;
mod routes;
mod schema;
mod seed;
mod stats;
mod store;

pub use config::Config;

// Re-exported for routes/*.rs, which only know their parent module.
pub use aqi::{classify_average, Category};
pub use availability::{fetch_city_readings, requested_window, AvailabilityReport, CityReadings};
pub use error::AnalyticsError;
pub use models::Reading;
pub use normalize::{normalize, parse_timestamp, RawInput};
pub use stats::{aggregate, StatisticsRecord};
pub use store::PgStore;

// ---

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    init_tracing();

    let cfg = config::load_from_env()?;
    cfg.log_config();

    tracing::info!("Attempting to connect to database: {}", cfg.masked_db_url());

    let pool = PgPoolOptions::new()
        .max_connections(cfg.db_pool_max)
        .connect(&cfg.db_url)
        .await
        .with_context(|| format!("Failed to connect to database '{}'", cfg.masked_db_url()))?;

    tracing::info!("Successfully connected to database");

    schema::create_schema(&pool).await?;

    if let Some(path) = &cfg.seed_file {
        seed::seed_from_file(&PgStore::new(pool.clone()), path).await?;
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let app: Router = routes::router(pool, cfg);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ---

/// Initialize the global tracing subscriber for structured logging.
///
/// - Color output: `FORCE_COLOR=1|true|yes` forces it on, `0|false|no` off,
///   otherwise it follows TTY detection on stdout.
/// - Span events from `AXUM_SPAN_EVENTS`: `full`, `enter_exit`, or CLOSE only.
/// - Level from `RUST_LOG` if set, else `ANALYTICS_LOG_LEVEL` (default `debug`),
///   with sqlx query logging held at `warn`.
///
/// Call once at startup, before any logging macro.
fn init_tracing() {
    // ---
    let span_events = match env::var("AXUM_SPAN_EVENTS").as_deref() {
        Ok("full") => FmtSpan::FULL,
        Ok("enter_exit") => FmtSpan::ENTER | FmtSpan::EXIT,
        _ => FmtSpan::CLOSE,
    };

    let use_color = match env::var("FORCE_COLOR").as_deref() {
        Ok("1") | Ok("true") | Ok("yes") => true,
        Ok("0") | Ok("false") | Ok("no") => false,
        _ => std::io::stdout().is_terminal(),
    };

    let env_filter = if env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else {
        let level = match env::var("ANALYTICS_LOG_LEVEL").ok().as_deref() {
            Some("trace") => "trace",
            Some("debug") => "debug",
            Some("info") => "info",
            Some("warn") => "warn",
            Some("error") => "error",
            _ => "debug",
        };
        EnvFilter::new(format!("{level},sqlx::query=warn"))
    };

    tracing_subscriber::fmt()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_span_events(span_events)
        .with_env_filter(env_filter)
        .with_ansi(use_color)
        .compact()
        .init();
}
