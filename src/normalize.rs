//! Reading normalizer.
//!
//! Turns loosely typed records into an ordered sequence of classified
//! [`Reading`]s. Two failure granularities are kept apart:
//!
//! - batch level: input that is not a record collection at all fails fast
//!   with an [`AnalyticsError`];
//! - field level: a bad timestamp, AQI or pollutant value is replaced by its
//!   documented default and the batch continues.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;
use tracing::debug;

use crate::aqi::{classify, pm25_to_aqi};
use crate::error::{AnalyticsError, Result};
use crate::models::{Pollutants, RawRecord, Reading};

// ---

/// City assigned to records that do not carry one.
pub const UNKNOWN_CITY: &str = "Unknown";

/// Naive layouts accepted in addition to RFC 3339. Interpreted as UTC.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// The three shapes a reading collection can arrive in. The caller picks one.
#[derive(Debug)]
pub enum RawInput {
    // ---
    /// Already decoded JSON values.
    Records(Vec<Value>),
    /// JSON text holding an array of records.
    Json(String),
    /// Path to a file holding a JSON array of records.
    File(PathBuf),
}

impl RawInput {
    // ---
    /// Decode the input into loose records.
    ///
    /// Fails only when the input as a whole is not a list of objects.
    pub fn load(self) -> Result<Vec<RawRecord>> {
        // ---
        let values = match self {
            RawInput::Records(values) => values,
            RawInput::Json(text) => decode_array(serde_json::from_str(&text)?)?,
            RawInput::File(path) => {
                let text = std::fs::read_to_string(&path)
                    .map_err(|source| AnalyticsError::ReadFile { path, source })?;
                decode_array(serde_json::from_str(&text)?)?
            }
        };

        values
            .into_iter()
            .enumerate()
            .map(|(i, value)| {
                if !value.is_object() {
                    return Err(AnalyticsError::NotACollection(format!(
                        "element {i} is {}, expected an object",
                        json_type(&value)
                    )));
                }
                Ok(serde_json::from_value::<RawRecord>(value)?)
            })
            .collect()
    }
}

fn decode_array(value: Value) -> Result<Vec<Value>> {
    // ---
    match value {
        Value::Array(items) => Ok(items),
        other => Err(AnalyticsError::NotACollection(format!(
            "top level is {}, expected an array",
            json_type(&other)
        ))),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Normalize records using the current time as the ingestion time.
pub fn normalize(records: Vec<RawRecord>) -> Vec<Reading> {
    normalize_at(records, Utc::now())
}

/// Normalize records, defaulting unresolvable timestamps to `ingested_at`.
///
/// The result is sorted by timestamp ascending; records with equal timestamps
/// keep their input order.
pub fn normalize_at(records: Vec<RawRecord>, ingested_at: DateTime<Utc>) -> Vec<Reading> {
    // ---
    let mut stamped: Vec<(DateTime<Utc>, bool, RawRecord)> = records
        .into_iter()
        .map(|raw| {
            let parsed = raw.timestamp.as_ref().and_then(parse_timestamp_value);
            if parsed.is_none() {
                debug!("Timestamp {:?} unresolvable, using ingestion time", raw.timestamp);
            }
            (parsed.unwrap_or(ingested_at), parsed.is_none(), raw)
        })
        .collect();

    stamped.sort_by_key(|(ts, _, _)| *ts);

    stamped
        .into_iter()
        .map(|(timestamp, timestamp_defaulted, raw)| {
            let pollutants = Pollutants {
                pm25: coerce_number(raw.pm25.as_ref()),
                pm10: coerce_number(raw.pm10.as_ref()),
                no2: coerce_number(raw.no2.as_ref()),
                so2: coerce_number(raw.so2.as_ref()),
                co: coerce_number(raw.co.as_ref()),
                o3: coerce_number(raw.o3.as_ref()),
            };

            let supplied_aqi = coerce_number(raw.aqi_value.as_ref())
                .or_else(|| coerce_number(raw.aqi_value_snake.as_ref()));
            let aqi_value = match supplied_aqi {
                Some(aqi) => aqi.round() as i64,
                None => pm25_to_aqi(pollutants.pm25),
            };

            let city = match raw.city {
                Some(Value::String(s)) => s,
                Some(Value::Null) | None => UNKNOWN_CITY.to_string(),
                Some(other) => other.to_string(),
            };

            let category = classify(aqi_value);

            Reading {
                timestamp,
                timestamp_defaulted,
                city,
                aqi_value,
                pollutants,
                category: category.name,
                color: category.color,
            }
        })
        .collect()
}

/// Parse a timestamp string in any of the accepted layouts.
pub fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    // ---
    let text = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Some(ts.with_timezone(&Utc));
    }

    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn parse_timestamp_value(value: &Value) -> Option<DateTime<Utc>> {
    value.as_str().and_then(parse_timestamp)
}

/// Numbers pass through, numeric strings are parsed, everything else is missing.
fn coerce_number(value: Option<&Value>) -> Option<f64> {
    // ---
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use chrono::{TimeZone, Timelike};
    use serde_json::json;

    fn ingestion_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 30, 0).unwrap()
    }

    fn records(values: Value) -> Vec<RawRecord> {
        // ---
        let Value::Array(items) = values else {
            panic!("test fixture must be an array");
        };
        RawInput::Records(items).load().unwrap()
    }

    #[test]
    fn test_invalid_timestamp_defaults_without_failing_batch() {
        // ---
        let input = records(json!([
            {"timestamp": "2025-05-01T08:00:00Z", "city": "Pune", "aqiValue": 40},
            {"timestamp": "not a date", "city": "Pune", "aqiValue": 90},
            {"timestamp": "2025-05-01 10:00:00", "city": "Pune", "aqiValue": 60},
        ]));

        let readings = normalize_at(input, ingestion_time());

        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].aqi_value, 40);
        assert!(!readings[0].timestamp_defaulted);
        assert_eq!(readings[1].aqi_value, 60);
        assert_eq!(readings[1].timestamp.hour(), 10);
        // Defaulted to ingestion time, which sorts after the real readings.
        assert_eq!(readings[2].aqi_value, 90);
        assert_eq!(readings[2].timestamp, ingestion_time());
        assert!(readings[2].timestamp_defaulted);
    }

    #[test]
    fn test_sorted_ascending_and_stable() {
        // ---
        let input = records(json!([
            {"timestamp": "2025-05-03", "aqiValue": 3},
            {"timestamp": "2025-05-01", "aqiValue": 1},
            {"timestamp": "2025-05-02", "aqiValue": 2},
            {"timestamp": "2025-05-01", "aqiValue": 11},
        ]));

        let aqis: Vec<i64> = normalize_at(input, ingestion_time())
            .iter()
            .map(|r| r.aqi_value)
            .collect();
        assert_eq!(aqis, vec![1, 11, 2, 3]);
    }

    #[test]
    fn test_missing_aqi_derived_from_pm25_or_defaulted() {
        // ---
        let input = records(json!([
            {"timestamp": "2025-05-01T00:00:00Z", "pm25": 12.1},
            {"timestamp": "2025-05-01T01:00:00Z", "pm25": "35.5"},
            {"timestamp": "2025-05-01T02:00:00Z"},
            {"timestamp": "2025-05-01T03:00:00Z", "aqi_value": null, "pm25": -3},
        ]));

        let aqis: Vec<i64> = normalize_at(input, ingestion_time())
            .iter()
            .map(|r| r.aqi_value)
            .collect();
        assert_eq!(aqis, vec![51, 101, 50, 50]);
    }

    #[test]
    fn test_supplied_aqi_wins_over_pm25() {
        // ---
        let input = records(json!([{"aqiValue": 180.6, "pm25": 5.0}]));
        let reading = &normalize_at(input, ingestion_time())[0];
        assert_eq!(reading.aqi_value, 181);
        assert_eq!(reading.category, "Unhealthy");
        assert_eq!(reading.color, "#ff0000");
    }

    #[test]
    fn test_both_aqi_spellings_in_one_record() {
        // ---
        let input = records(json!([
            {"timestamp": "2025-05-01T00:00:00Z", "city": "Pune", "aqiValue": 40},
            {"timestamp": "2025-05-01T01:00:00Z", "city": "Pune", "aqiValue": 42, "aqi_value": 42},
            {"timestamp": "2025-05-01T02:00:00Z", "city": "Pune", "aqiValue": "bad", "aqi_value": 120},
            {"timestamp": "2025-05-01T03:00:00Z", "city": "Pune", "aqi_value": 75},
        ]));

        let aqis: Vec<i64> = normalize_at(input, ingestion_time())
            .iter()
            .map(|r| r.aqi_value)
            .collect();
        assert_eq!(aqis, vec![40, 42, 120, 75]);
    }

    #[test]
    fn test_city_defaults_to_unknown() {
        // ---
        let input = records(json!([{"aqiValue": 10}, {"aqiValue": 10, "city": null}]));
        for reading in normalize_at(input, ingestion_time()) {
            assert_eq!(reading.city, UNKNOWN_CITY);
        }
    }

    #[test]
    fn test_pollutants_coerced_or_null() {
        // ---
        let input = records(json!([{
            "aqiValue": 70,
            "pm25": "22.5",
            "pm10": "n/a",
            "no2": 14,
            "so2": "",
            "co": true,
        }]));

        let p = normalize_at(input, ingestion_time())[0].pollutants;
        assert_eq!(p.pm25, Some(22.5));
        assert_eq!(p.pm10, None);
        assert_eq!(p.no2, Some(14.0));
        assert_eq!(p.so2, None);
        assert_eq!(p.co, None);
        assert_eq!(p.o3, None);
    }

    #[test]
    fn test_json_text_input() {
        // ---
        let text = r#"[{"timestamp": "2025-05-01T00:00:00Z", "city": "Lima", "aqiValue": 55}]"#;
        let loaded = RawInput::Json(text.to_string()).load().unwrap();
        let readings = normalize_at(loaded, ingestion_time());
        assert_eq!(readings[0].city, "Lima");
        assert_eq!(readings[0].category, "Moderate");
    }

    #[test]
    fn test_file_input() {
        // ---
        let path = std::env::temp_dir().join(format!("airsight-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"[{"city": "Oslo", "pm25": 3.0}]"#).unwrap();

        let loaded = RawInput::File(path.clone()).load();
        std::fs::remove_file(&path).ok();

        let readings = normalize_at(loaded.unwrap(), ingestion_time());
        assert_eq!(readings[0].city, "Oslo");
        assert_eq!(readings[0].aqi_value, 13);
    }

    #[test]
    fn test_malformed_input_fails_whole_batch() {
        // ---
        let err = RawInput::Json("[{\"city\": ".to_string()).load().unwrap_err();
        assert!(matches!(err, AnalyticsError::MalformedJson(_)));

        let err = RawInput::Json(r#"{"city": "Pune"}"#.to_string()).load().unwrap_err();
        assert!(matches!(err, AnalyticsError::NotACollection(_)));

        let err = RawInput::Records(vec![json!({"city": "Pune"}), json!(42)])
            .load()
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::NotACollection(_)));

        let err = RawInput::File(PathBuf::from("/nonexistent/readings.json"))
            .load()
            .unwrap_err();
        assert!(matches!(err, AnalyticsError::ReadFile { .. }));
    }

    #[test]
    fn test_parse_timestamp_layouts() {
        // ---
        let expected = Utc.with_ymd_and_hms(2025, 3, 26, 18, 45, 0).unwrap();
        assert_eq!(parse_timestamp("2025-03-26T18:45:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-26T20:45:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-26 18:45:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-26T18:45:00"), Some(expected));
        assert_eq!(parse_timestamp("2025-03-26 18:45"), Some(expected));
        assert_eq!(
            parse_timestamp("2025-03-26"),
            Some(Utc.with_ymd_and_hms(2025, 3, 26, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("26/03/2025"), None);
    }

    #[test]
    fn test_non_string_timestamp_is_defaulted() {
        // ---
        let input = records(json!([{"timestamp": 1714550400, "aqiValue": 5}]));
        let reading = &normalize_at(input, ingestion_time())[0];
        assert!(reading.timestamp_defaulted);
        assert_eq!(reading.timestamp, ingestion_time());
    }
}
