//! Database schema management for `airsight-analytics`.
//!
//! Ensures the `aqi_data` table and its lookup index exist before serving
//! requests. Applied once on startup from `main.rs`.

use anyhow::{Context, Result};
use sqlx::PgPool;

// ---

/// Create the `aqi_data` table and index if missing (idempotent).
///
/// Pollutant and AQI columns are nullable: a missing concentration is stored
/// as NULL, never as zero.
pub async fn create_schema(pool: &PgPool) -> Result<()> {
    // ---
    let mut tx = pool.begin().await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS aqi_data (
            id         BIGSERIAL PRIMARY KEY,
            city       TEXT             NOT NULL,
            aqi_value  INTEGER,
            pm25       DOUBLE PRECISION,
            pm10       DOUBLE PRECISION,
            no2        DOUBLE PRECISION,
            so2        DOUBLE PRECISION,
            co         DOUBLE PRECISION,
            o3         DOUBLE PRECISION,
            timestamp  TIMESTAMPTZ      NOT NULL
        );
        "#,
    )
    .execute(&mut *tx)
    .await
    .context("creating aqi_data table")?;

    // Serves both the city existence/bounds check and the windowed fetch
    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_aqi_data_city_timestamp
            ON aqi_data (city, timestamp);
        "#,
    )
    .execute(&mut *tx)
    .await
    .context("creating aqi_data index")?;

    tx.commit().await?;
    Ok(())
}
