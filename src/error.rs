//! Error taxonomy for the analytics engine.
//!
//! Only batch-level or request-level failures live here. Field-level problems
//! (an unparseable timestamp, a non-numeric pollutant) are resolved with
//! defaults inside the normalizer and never surface as an [`AnalyticsError`].

use std::{error::Error as StdError, path::PathBuf};

use thiserror::Error;

/// Terminal failures of an analytics request.
#[derive(Error, Debug)]
pub enum AnalyticsError {
    // ---
    /// The payload is not valid JSON.
    #[error("malformed reading payload")]
    MalformedJson(#[from] serde_json::Error),

    /// A JSON file input could not be read.
    #[error("failed to read readings file '{}'", .path.display())]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Parsed JSON that is not a list of record objects.
    #[error("payload is not a collection of reading records: {0}")]
    NotACollection(String),

    /// A caller-supplied window bound could not be parsed.
    #[error("invalid timestamp '{0}'")]
    InvalidTimestamp(String),

    /// A caller-supplied window is inverted or otherwise unusable.
    #[error("invalid query window: {0}")]
    InvalidWindow(String),

    /// Scenario 3: no stored reading has this city.
    #[error("City '{city}' not found in database")]
    UnknownCity { city: String },

    /// Nothing left to aggregate.
    #[error("no data: {0}")]
    EmptyResult(String),

    /// Connection or query failure in the storage layer.
    #[error("storage query failed")]
    Storage(#[from] sqlx::Error),
}

/// Convenience Result type for the analytics engine.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

impl AnalyticsError {
    // ---
    /// Short machine-readable name of the error family.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson(_)
            | Self::ReadFile { .. }
            | Self::NotACollection(_)
            | Self::InvalidTimestamp(_)
            | Self::InvalidWindow(_) => "input_error",
            Self::UnknownCity { .. } => "unknown_city",
            Self::EmptyResult(_) => "empty_result",
            Self::Storage(_) => "storage_error",
        }
    }

    /// Render the error with every underlying cause, outermost first.
    pub fn cause_chain(&self) -> String {
        // ---
        let mut message = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }
}
