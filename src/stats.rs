//! Statistics aggregator.
//!
//! Reduces an ordered reading sequence to a [`StatisticsRecord`]. Pure: the
//! output depends only on the input slice.

use std::collections::BTreeMap;

use chrono::{DateTime, Timelike, Utc};
use serde::Serialize;

use crate::error::{AnalyticsError, Result};
use crate::models::{Reading, POLLUTANT_KEYS};

// ---

/// Slope magnitude (AQI points per reading) above which a trend is reported.
const TREND_THRESHOLD: f64 = 0.5;

/// Direction of the AQI series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
    #[serde(rename = "Insufficient data")]
    InsufficientData,
}

/// Summary of one (city, window) query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsRecord {
    // ---
    pub total_records: usize,
    pub avg_aqi: f64,
    pub max_aqi: i64,
    pub min_aqi: i64,
    /// Population standard deviation; 0.0 for a single reading.
    pub std_aqi: f64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub duration_hours: f64,
    pub category_distribution: BTreeMap<String, usize>,
    pub pollutant_averages: BTreeMap<&'static str, Option<f64>>,
    pub peak_pollution_hour: u32,
    pub trend: Trend,
}

/// Compute summary statistics over readings sorted by timestamp ascending.
pub fn aggregate(readings: &[Reading]) -> Result<StatisticsRecord> {
    // ---
    let (first, last) = match (readings.first(), readings.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => {
            return Err(AnalyticsError::EmptyResult(
                "cannot compute statistics over zero readings".to_string(),
            ))
        }
    };

    let n = readings.len() as f64;
    let values: Vec<f64> = readings.iter().map(|r| r.aqi_value as f64).collect();
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;

    let min_aqi = readings.iter().map(|r| r.aqi_value).min().unwrap_or(first.aqi_value);

    // First reading holding the maximum wins ties.
    let peak = readings
        .iter()
        .fold(first, |best, r| if r.aqi_value > best.aqi_value { r } else { best });

    let mut category_distribution = BTreeMap::new();
    for r in readings {
        *category_distribution.entry(r.category.to_string()).or_insert(0) += 1;
    }

    let pollutant_averages = POLLUTANT_KEYS
        .iter()
        .map(|&key| {
            let present: Vec<f64> = readings.iter().filter_map(|r| r.pollutants.get(key)).collect();
            let avg = if present.is_empty() {
                None
            } else {
                Some(round2(present.iter().sum::<f64>() / present.len() as f64))
            };
            (key, avg)
        })
        .collect();

    let duration = last.timestamp - first.timestamp;

    Ok(StatisticsRecord {
        total_records: readings.len(),
        avg_aqi: round2(mean),
        max_aqi: peak.aqi_value,
        min_aqi,
        std_aqi: round2(variance.sqrt()),
        start_date: first.timestamp,
        end_date: last.timestamp,
        duration_hours: round2(duration.num_milliseconds() as f64 / 3_600_000.0),
        category_distribution,
        pollutant_averages,
        peak_pollution_hour: peak.timestamp.hour(),
        trend: trend(&values),
    })
}

/// Classify the least-squares slope of `values` against their 0-based index.
///
/// Elapsed time is ignored, so irregular sampling skews the slope.
pub fn trend(values: &[f64]) -> Trend {
    // ---
    if values.len() < 2 {
        return Trend::InsufficientData;
    }

    let n = values.len() as f64;
    let x_mean = (n - 1.0) / 2.0;
    let y_mean = values.iter().sum::<f64>() / n;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    let slope = num / den;

    if slope > TREND_THRESHOLD {
        Trend::Increasing
    } else if slope < -TREND_THRESHOLD {
        Trend::Decreasing
    } else {
        Trend::Stable
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
