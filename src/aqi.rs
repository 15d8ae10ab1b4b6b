//! AQI lookup tables: category classification and PM2.5 to AQI conversion.
//!
//! Both tables are immutable statics, so they can be read from any number of
//! request handlers without synchronization.

use serde::Serialize;

// ---

/// One row of the AQI category table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Category {
    // ---
    pub name: &'static str,
    #[serde(skip)]
    pub low: i64,
    #[serde(skip)]
    pub high: i64,
    pub color: &'static str,
}

/// AQI categories in ascending range order. Ranges are inclusive and contiguous.
pub static CATEGORIES: [Category; 6] = [
    Category { name: "Good", low: 0, high: 50, color: "#00ff88" },
    Category { name: "Moderate", low: 51, high: 100, color: "#ffff00" },
    Category { name: "Unhealthy for Sensitive Groups", low: 101, high: 150, color: "#ff8800" },
    Category { name: "Unhealthy", low: 151, high: 200, color: "#ff0000" },
    Category { name: "Very Unhealthy", low: 201, high: 300, color: "#8800ff" },
    Category { name: "Hazardous", low: 301, high: 500, color: "#880000" },
];

/// EPA PM2.5 breakpoints: `(conc_lo, conc_hi, aqi_lo, aqi_hi)`, concentrations in µg/m³.
static PM25_BREAKPOINTS: [(f64, f64, i64, i64); 7] = [
    (0.0, 12.0, 0, 50),
    (12.1, 35.4, 51, 100),
    (35.5, 55.4, 101, 150),
    (55.5, 150.4, 151, 200),
    (150.5, 250.4, 201, 300),
    (250.5, 350.4, 301, 400),
    (350.5, 500.4, 401, 500),
];

/// AQI assumed when no PM2.5 concentration is usable.
pub const DEFAULT_AQI: i64 = 50;

/// Upper end of the AQI scale reached by the PM2.5 conversion.
const MAX_AQI: i64 = 500;

/// Map an AQI value to its category.
///
/// Returns the first category whose inclusive range contains `aqi`. Anything
/// no range covers (above 500, or negative) falls back to the last entry,
/// `Hazardous`.
pub fn classify(aqi: i64) -> Category {
    // ---
    CATEGORIES
        .iter()
        .find(|c| c.low <= aqi && aqi <= c.high)
        .copied()
        .unwrap_or(CATEGORIES[CATEGORIES.len() - 1])
}

/// Classify a fractional AQI (e.g. an average) by rounding it first.
pub fn classify_average(aqi: f64) -> Category {
    classify(aqi.round() as i64)
}

/// Convert a PM2.5 concentration to an AQI using the EPA breakpoints.
///
/// Missing, NaN or negative concentrations yield [`DEFAULT_AQI`] (50, the
/// bottom of "Moderate"). Concentrations that fall in the 0.1 µg/m³ gap
/// between two published rows are clamped up to the next row. Anything above
/// 500.4 is reported as 500.
///
/// Linear interpolation formula from the EPA technical assistance document:
/// `AQI = (AQIhi - AQIlo) / (Chi - Clo) * (C - Clo) + AQIlo`, rounded half up.
pub fn pm25_to_aqi(concentration: Option<f64>) -> i64 {
    // ---
    let value = match concentration {
        Some(v) if v >= 0.0 => v,
        _ => return DEFAULT_AQI,
    };

    for &(conc_lo, conc_hi, aqi_lo, aqi_hi) in PM25_BREAKPOINTS.iter() {
        if value <= conc_hi {
            let c = value.max(conc_lo);
            let aqi = ((aqi_hi - aqi_lo) as f64 / (conc_hi - conc_lo)) * (c - conc_lo)
                + aqi_lo as f64;
            // Non-negative here, so round() is round-half-up.
            return aqi.round() as i64;
        }
    }

    MAX_AQI
}
