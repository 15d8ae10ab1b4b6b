//! End-to-end checks against a running service (`BASE_URL`, default
//! `http://localhost:8080`). Start it with `cargo run` and a reachable
//! `DATABASE_URL`, then run `cargo test -- --ignored`.

use std::collections::HashMap;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Debug, Deserialize)]
struct Statistics {
    total_records: usize,
    avg_aqi: f64,
    max_aqi: i64,
    min_aqi: i64,
    std_aqi: f64,
    duration_hours: f64,
    category_distribution: HashMap<String, usize>,
    pollutant_averages: HashMap<String, Option<f64>>,
    peak_pollution_hour: u32,
    trend: String,
}

#[derive(Debug, Deserialize)]
struct ClassifiedReading {
    city: String,
    aqi_value: i64,
    category: String,
    color: String,
    timestamp_defaulted: bool,
}

fn base_url() -> String {
    std::env::var("BASE_URL").unwrap_or_else(|_| "http://localhost:8080".into())
}

#[tokio::test]
#[ignore = "requires a running service"]
async fn stats_endpoint_summarizes_payload() -> Result<()> {
    // ---
    let payload = json!([
        {"timestamp": "2025-05-01T00:00:00Z", "city": "Pune", "aqiValue": 10, "pm25": 2.0},
        {"timestamp": "2025-05-01T01:00:00Z", "city": "Pune", "aqiValue": 20},
        {"timestamp": "2025-05-01T02:00:00Z", "city": "Pune", "aqiValue": 30, "pm25": "4.0"},
        {"timestamp": "2025-05-01T03:00:00Z", "city": "Pune", "aqiValue": 40},
        {"timestamp": "2025-05-01T04:00:00Z", "city": "Pune", "aqiValue": 50},
    ]);

    let url = format!("{}/analytics/stats", base_url());
    let stats: Statistics = Client::new()
        .post(&url)
        .body(payload.to_string())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    assert_eq!(stats.total_records, 5);
    assert_eq!(stats.avg_aqi, 30.0);
    assert_eq!((stats.min_aqi, stats.max_aqi), (10, 50));
    assert_eq!(stats.std_aqi, 14.14);
    assert_eq!(stats.duration_hours, 4.0);
    assert_eq!(stats.peak_pollution_hour, 4);
    assert_eq!(stats.trend, "Increasing");
    assert_eq!(stats.category_distribution.get("Good"), Some(&5));
    assert_eq!(stats.pollutant_averages.get("pm25"), Some(&Some(3.0)));
    assert_eq!(stats.pollutant_averages.get("o3"), Some(&None));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running service"]
async fn classify_endpoint_orders_and_labels() -> Result<()> {
    // ---
    let payload = json!([
        {"timestamp": "2025-05-01T05:00:00Z", "aqiValue": 310},
        {"timestamp": "garbage", "city": "Lima", "pm25": 12.1},
        {"timestamp": "2025-05-01T04:00:00Z", "city": "Lima", "aqiValue": 45},
    ]);

    let url = format!("{}/analytics/classify", base_url());
    let readings: Vec<ClassifiedReading> = Client::new()
        .post(&url)
        .body(payload.to_string())
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    assert_eq!(readings.len(), 3);

    assert_eq!(readings[0].aqi_value, 45);
    assert_eq!((readings[0].category.as_str(), readings[0].color.as_str()), ("Good", "#00ff88"));

    assert_eq!(readings[1].city, "Unknown");
    assert_eq!(readings[1].category, "Hazardous");

    // Unparseable timestamp: defaulted to ingestion time, AQI derived from PM2.5
    assert!(readings[2].timestamp_defaulted);
    assert_eq!(readings[2].aqi_value, 51);
    assert_eq!(readings[2].category, "Moderate");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running service"]
async fn malformed_payload_is_rejected() -> Result<()> {
    // ---
    let url = format!("{}/analytics/stats", base_url());
    let response = Client::new().post(&url).body("[{\"city\": ").send().await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "input_error");
    assert!(body["message"].as_str().unwrap_or_default().contains("malformed"));

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running service"]
async fn unknown_city_is_not_found() -> Result<()> {
    // ---
    let url = format!(
        "{}/analytics/cities/No-Such-City-7f3a/stats?start=2025-01-01&end=2025-01-31",
        base_url()
    );
    let response = Client::new().get(&url).send().await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "unknown_city");

    Ok(())
}

#[tokio::test]
#[ignore = "requires a running service"]
async fn health_reports_status() -> Result<()> {
    // ---
    let body: Value = Client::new()
        .get(format!("{}/health", base_url()))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    assert!(body["database"] == "up" || body["database"] == "down");

    Ok(())
}
