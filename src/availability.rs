//! Data availability resolver for the database-backed path.
//!
//! Before any full data query, the resolver decides which of three scenarios
//! applies to a (city, window) request:
//!
//! 1. the requested window holds readings: query exactly that window;
//! 2. the city is known but the window is empty: fall back to the city's full
//!    stored range and flag the substitution;
//! 3. the city is unknown: stop, nothing is fetched.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{AnalyticsError, Result};
use crate::models::{RawRecord, Reading};
use crate::normalize::normalize_at;
use crate::store::{CityCoverage, DataWindow, ReadingStore};

// ---

/// Outcome of resolving a (city, window) request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    // ---
    /// Scenario 1: the requested window has data.
    Found {
        window: DataWindow,
        records_in_window: i64,
        coverage: CityCoverage,
    },
    /// Scenario 2: the city exists but the requested window is empty.
    FallbackToFullRange {
        requested: DataWindow,
        window: DataWindow,
        coverage: CityCoverage,
    },
    /// Scenario 3: no stored reading has this city.
    CityUnknown { city: String },
}

/// Serializable summary of an [`Availability`] for API consumers.
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilityReport {
    // ---
    pub scenario: u8,
    pub message: String,
    pub requested_window: Option<DataWindow>,
    pub records_in_window: Option<i64>,
    /// Window the data was actually fetched for.
    pub effective_window: Option<DataWindow>,
    /// True when the effective window is not the one requested.
    pub substituted: bool,
    pub coverage: Option<CityCoverage>,
}

impl Availability {
    // ---
    pub fn scenario(&self) -> u8 {
        match self {
            Availability::Found { .. } => 1,
            Availability::FallbackToFullRange { .. } => 2,
            Availability::CityUnknown { .. } => 3,
        }
    }

    /// Window to query, `None` when the city is unknown.
    pub fn effective_window(&self) -> Option<DataWindow> {
        match self {
            Availability::Found { window, .. } | Availability::FallbackToFullRange { window, .. } => {
                Some(*window)
            }
            Availability::CityUnknown { .. } => None,
        }
    }

    pub fn message(&self, city: &str) -> String {
        match self {
            Availability::Found { .. } => format!("Data available for {city} in requested period"),
            Availability::FallbackToFullRange { .. } => {
                format!("City '{city}' exists but no data for requested period")
            }
            Availability::CityUnknown { city } => format!("City '{city}' not found in database"),
        }
    }

    pub fn report(&self, city: &str) -> AvailabilityReport {
        // ---
        let coverage = match self {
            Availability::Found { coverage, .. }
            | Availability::FallbackToFullRange { coverage, .. } => Some(*coverage),
            Availability::CityUnknown { .. } => None,
        };

        let (requested_window, records_in_window) = match self {
            Availability::Found {
                window,
                records_in_window,
                ..
            } => (Some(*window), Some(*records_in_window)),
            Availability::FallbackToFullRange { requested, .. } => (Some(*requested), Some(0)),
            Availability::CityUnknown { .. } => (None, None),
        };

        AvailabilityReport {
            scenario: self.scenario(),
            message: self.message(city),
            requested_window,
            records_in_window,
            effective_window: self.effective_window(),
            substituted: matches!(self, Availability::FallbackToFullRange { .. }),
            coverage,
        }
    }
}

/// Build the requested window, filling missing bounds.
///
/// A missing `end` is `now`; a missing `start` is `default_days` before `end`.
pub fn requested_window(
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    default_days: u32,
) -> Result<DataWindow> {
    // ---
    let end = end.unwrap_or(now);
    let start = match start {
        Some(start) => start,
        None => Duration::try_days(i64::from(default_days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or_else(|| {
                AnalyticsError::InvalidWindow(format!(
                    "a {default_days}-day window before {} is out of range",
                    end.to_rfc3339()
                ))
            })?,
    };

    if start > end {
        return Err(AnalyticsError::InvalidWindow(format!(
            "start {} is after end {}",
            start.to_rfc3339(),
            end.to_rfc3339()
        )));
    }

    Ok(DataWindow { start, end })
}

/// Decide which scenario applies. Issues only count/bounds queries.
pub async fn resolve<S: ReadingStore>(
    store: &S,
    city: &str,
    requested: DataWindow,
) -> Result<Availability> {
    // ---
    let Some(coverage) = store.city_coverage(city).await? else {
        debug!("City '{}' has no stored readings", city);
        return Ok(Availability::CityUnknown {
            city: city.to_string(),
        });
    };

    let records_in_window = store.count_in_window(city, requested).await?;
    debug!(
        "City '{}': {} readings total, {} in requested window",
        city, coverage.total_records, records_in_window
    );

    if records_in_window > 0 {
        Ok(Availability::Found {
            window: requested,
            records_in_window,
            coverage,
        })
    } else {
        Ok(Availability::FallbackToFullRange {
            requested,
            window: coverage.full_range(),
            coverage,
        })
    }
}

/// Readings fetched for a city along with how the window was chosen.
#[derive(Debug, Clone)]
pub struct CityReadings {
    // ---
    pub availability: Availability,
    pub readings: Vec<Reading>,
}

/// Resolve the scenario, then fetch and normalize the readings it selects.
///
/// Scenario 3 is a hard stop reported as [`AnalyticsError::UnknownCity`].
pub async fn fetch_city_readings<S: ReadingStore>(
    store: &S,
    city: &str,
    requested: DataWindow,
    ingested_at: DateTime<Utc>,
) -> Result<CityReadings> {
    // ---
    let availability = resolve(store, city, requested).await?;

    let Some(window) = availability.effective_window() else {
        warn!("{}", availability.message(city));
        return Err(AnalyticsError::UnknownCity {
            city: city.to_string(),
        });
    };

    if let Availability::FallbackToFullRange { .. } = availability {
        info!(
            "No readings for '{}' between {} and {}, using full range {} to {}",
            city, requested.start, requested.end, window.start, window.end
        );
    }

    let rows = store.fetch_rows(city, window).await?;
    if rows.is_empty() {
        return Err(AnalyticsError::EmptyResult(format!(
            "No data found for city '{city}'"
        )));
    }

    let records = rows.into_iter().map(RawRecord::from).collect();
    let readings = normalize_at(records, ingested_at);

    Ok(CityReadings {
        availability,
        readings,
    })
}
