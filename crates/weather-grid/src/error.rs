//! Error types for grid and record handling.

use chrono::NaiveDate;
use thiserror::Error;

/// Result type alias using WeatherError.
pub type Result<T> = std::result::Result<T, WeatherError>;

/// Errors from grid arithmetic and archive record I/O.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Date {0} is outside the archive span")]
    DateOutOfRange(NaiveDate),

    #[error("Invalid date: {year}-{month}-{day}")]
    InvalidDate { year: i64, month: i64, day: i64 },

    #[error("Longitude {0} is outside the grid")]
    LongitudeOutOfRange(f64),

    #[error("Invalid value in raw archive: '{0}'")]
    BadRawValue(String),

    #[error("Raw archive holds {found} values for one day, expected {expected}")]
    ShortDay { found: usize, expected: usize },

    #[error("Record data length {0} is not a whole number of records")]
    TruncatedRecords(usize),

    #[error("Invalid grid metadata: {0}")]
    Metadata(String),

    #[error("Failed to read archive data: {0}")]
    Io(#[from] std::io::Error),
}
