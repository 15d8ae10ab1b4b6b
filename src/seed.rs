//! Start-up seeding of the `aqi_data` table from a JSON readings file.
//!
//! Runs only when `SEED_READINGS_FILE` is configured and the table is empty.

use std::path::Path;

use anyhow::{Context, Result};

use crate::normalize::{normalize, RawInput};
use crate::store::PgStore;

// ---

/// Load, normalize and insert the readings in `path`. Returns the row count inserted.
pub async fn seed_from_file(store: &PgStore, path: &Path) -> Result<usize> {
    // ---
    let existing = store.count_all().await.context("counting stored readings")?;
    if existing > 0 {
        tracing::info!("aqi_data already holds {} readings, skipping seed", existing);
        return Ok(0);
    }

    let records = RawInput::File(path.to_path_buf())
        .load()
        .with_context(|| format!("loading seed readings from {}", path.display()))?;
    let readings = normalize(records);

    let defaulted = readings.iter().filter(|r| r.timestamp_defaulted).count();
    if defaulted > 0 {
        tracing::warn!("{} seed readings had no usable timestamp", defaulted);
    }

    for reading in &readings {
        store
            .insert_reading(reading)
            .await
            .with_context(|| format!("inserting seed reading for {}", reading.city))?;
    }

    tracing::info!("Seeded {} readings from {}", readings.len(), path.display());
    Ok(readings.len())
}
