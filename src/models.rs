//! Data models for the analytics pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ---

/// Pollutant keys in reporting order.
pub const POLLUTANT_KEYS: [&str; 6] = ["pm25", "pm10", "no2", "so2", "co", "o3"];

/// Loosely typed reading as it arrives from a payload, a file or a database row.
///
/// Every field is optional and kept as raw JSON so that coercion and defaulting
/// happen per field in the normalizer instead of failing the whole batch.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct RawRecord {
    // ---
    pub timestamp: Option<Value>,
    pub city: Option<Value>,
    #[serde(rename = "aqiValue")]
    pub aqi_value: Option<Value>,
    /// Snake-case spelling of `aqiValue`; consulted when the camel-case key
    /// is absent or not numeric.
    #[serde(rename = "aqi_value")]
    pub aqi_value_snake: Option<Value>,
    pub pm25: Option<Value>,
    pub pm10: Option<Value>,
    pub no2: Option<Value>,
    pub so2: Option<Value>,
    pub co: Option<Value>,
    pub o3: Option<Value>,
}

/// Pollutant concentrations; `None` means missing or unparseable, never zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize)]
pub struct Pollutants {
    // ---
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    pub o3: Option<f64>,
}

impl Pollutants {
    // ---
    /// Look a concentration up by its key (`pm25`, `pm10`, ...).
    pub fn get(&self, key: &str) -> Option<f64> {
        match key {
            "pm25" => self.pm25,
            "pm10" => self.pm10,
            "no2" => self.no2,
            "so2" => self.so2,
            "co" => self.co,
            "o3" => self.o3,
            _ => None,
        }
    }
}

/// One normalized, classified sensor observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reading {
    // ---
    pub timestamp: DateTime<Utc>,
    /// True when the timestamp was absent or unparseable and set to ingestion time.
    pub timestamp_defaulted: bool,
    pub city: String,
    pub aqi_value: i64,
    pub pollutants: Pollutants,
    pub category: &'static str,
    pub color: &'static str,
}

/// Row shape of the `aqi_data` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AqiRow {
    // ---
    pub city: String,
    pub aqi_value: Option<i32>,
    pub pm25: Option<f64>,
    pub pm10: Option<f64>,
    pub no2: Option<f64>,
    pub so2: Option<f64>,
    pub co: Option<f64>,
    pub o3: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Database rows enter the normalizer through the same loose record type.
impl From<AqiRow> for RawRecord {
    // ---
    fn from(row: AqiRow) -> Self {
        // ---
        let number = |v: Option<f64>| v.map(Value::from);

        RawRecord {
            timestamp: Some(Value::String(row.timestamp.to_rfc3339())),
            city: Some(Value::String(row.city)),
            aqi_value: row.aqi_value.map(Value::from),
            aqi_value_snake: None,
            pm25: number(row.pm25),
            pm10: number(row.pm10),
            no2: number(row.no2),
            so2: number(row.so2),
            co: number(row.co),
            o3: number(row.o3),
        }
    }
}
