//! Storage seam for the database-backed path.
//!
//! The resolver only needs three read-only queries, expressed by
//! [`ReadingStore`]. [`PgStore`] answers them from the `aqi_data` table; tests
//! supply an in-memory implementation. The pool itself is owned by the caller.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::models::{AqiRow, Reading};

// ---

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DataWindow {
    // ---
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// What the store holds for one city.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CityCoverage {
    // ---
    pub total_records: i64,
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

impl CityCoverage {
    // ---
    /// The city's entire stored range as a window.
    pub fn full_range(&self) -> DataWindow {
        DataWindow {
            start: self.earliest,
            end: self.latest,
        }
    }
}

/// Read-only queries issued by the availability resolver.
#[allow(async_fn_in_trait)]
pub trait ReadingStore {
    // ---
    /// Count and bounds of the city's readings, or `None` if it has none.
    async fn city_coverage(&self, city: &str) -> Result<Option<CityCoverage>, sqlx::Error>;

    /// Number of the city's readings inside `window`.
    async fn count_in_window(&self, city: &str, window: DataWindow) -> Result<i64, sqlx::Error>;

    /// The city's readings inside `window`, oldest first.
    async fn fetch_rows(&self, city: &str, window: DataWindow) -> Result<Vec<AqiRow>, sqlx::Error>;
}

/// PostgreSQL-backed store over the `aqi_data` table.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    // ---
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Total number of stored readings across all cities.
    pub async fn count_all(&self) -> Result<i64, sqlx::Error> {
        // ---
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM aqi_data")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert one normalized reading. Used only for start-up seeding.
    pub async fn insert_reading(&self, reading: &Reading) -> Result<(), sqlx::Error> {
        // ---
        let p = &reading.pollutants;
        sqlx::query(
            r#"
            INSERT INTO aqi_data (
                city, aqi_value, pm25, pm10, no2, so2, co, o3, timestamp
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(&reading.city)
        .bind(aqi_column_value(reading.aqi_value))
        .bind(p.pm25)
        .bind(p.pm10)
        .bind(p.no2)
        .bind(p.so2)
        .bind(p.co)
        .bind(p.o3)
        .bind(reading.timestamp)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Saturate an AQI into the `INTEGER` column range, keeping its sign.
fn aqi_column_value(aqi: i64) -> i32 {
    aqi.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

impl ReadingStore for PgStore {
    // ---
    async fn city_coverage(&self, city: &str) -> Result<Option<CityCoverage>, sqlx::Error> {
        // ---
        let (total_records, earliest, latest): (i64, Option<DateTime<Utc>>, Option<DateTime<Utc>>) =
            sqlx::query_as(
                r#"
                SELECT COUNT(*), MIN(timestamp), MAX(timestamp)
                FROM aqi_data
                WHERE city = $1
                "#,
            )
            .bind(city)
            .fetch_one(&self.pool)
            .await?;

        Ok(match (earliest, latest) {
            (Some(earliest), Some(latest)) if total_records > 0 => Some(CityCoverage {
                total_records,
                earliest,
                latest,
            }),
            _ => None,
        })
    }

    async fn count_in_window(&self, city: &str, window: DataWindow) -> Result<i64, sqlx::Error> {
        // ---
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM aqi_data
            WHERE city = $1
              AND timestamp BETWEEN $2 AND $3
            "#,
        )
        .bind(city)
        .bind(window.start)
        .bind(window.end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn fetch_rows(&self, city: &str, window: DataWindow) -> Result<Vec<AqiRow>, sqlx::Error> {
        // ---
        sqlx::query_as::<_, AqiRow>(
            r#"
            SELECT city, aqi_value, pm25, pm10, no2, so2, co, o3, timestamp
            FROM aqi_data
            WHERE city = $1
              AND timestamp BETWEEN $2 AND $3
            ORDER BY timestamp
            "#,
        )
        .bind(city)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(&self.pool)
        .await
    }
}
