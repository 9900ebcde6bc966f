//! Regular lat/lon grid description and record-number arithmetic.

use chrono::NaiveDate;
use serde::Deserialize;

use dispatch::MetadataRecord;

use crate::error::{Result, WeatherError};

fn default_start_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(1979, 1, 1).unwrap()
}

fn default_end_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2016, 1, 1).unwrap()
}

/// Description of a regular latitude/longitude grid over a day span.
///
/// Latitudes run from `latitude_start` southward in `delta_latitude` steps
/// (90.0 down to -90.0 inclusive at the default 0.75 degrees); longitudes
/// from `longitude_start` eastward, covering [0, 360). Records for one day
/// are ordered longitude-major: all latitudes for longitude 0, then all
/// latitudes for the next longitude, and so on.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// First day present in the archive.
    pub start_day: NaiveDate,
    /// First day NOT present in the archive.
    pub end_day: NaiveDate,
    pub delta_latitude: f64,
    pub delta_longitude: f64,
    pub latitude_start: f64,
    pub longitude_start: f64,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            start_day: default_start_day(),
            end_day: default_end_day(),
            delta_latitude: 0.75,
            delta_longitude: 0.75,
            latitude_start: 90.0,
            longitude_start: 0.0,
        }
    }
}

/// Serde shape of grid configuration in metadata. The day span is encoded
/// as year/month/day integer triples; every field is optional and falls
/// back to the default grid.
#[derive(Debug, Default, Deserialize)]
struct GridMeta {
    start_year: Option<i32>,
    start_month: Option<u32>,
    start_day: Option<u32>,
    end_year: Option<i32>,
    end_month: Option<u32>,
    end_day: Option<u32>,
    delta_latitude: Option<f64>,
    delta_longitude: Option<f64>,
    latitude_start: Option<f64>,
    longitude_start: Option<f64>,
}

fn date_from_triple(
    defaults: NaiveDate,
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
) -> Result<NaiveDate> {
    match (year, month, day) {
        (None, None, None) => Ok(defaults),
        (Some(y), Some(m), Some(d)) => NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| {
            WeatherError::InvalidDate {
                year: y as i64,
                month: m as i64,
                day: d as i64,
            }
        }),
        _ => Err(WeatherError::Metadata(
            "incomplete year/month/day triple".to_string(),
        )),
    }
}

impl GridSpec {
    /// Build a grid from (merged) metadata, defaulting missing fields.
    /// Unrelated metadata keys (rule tables and the like) are ignored.
    pub fn from_metadata(record: &MetadataRecord) -> Result<Self> {
        let meta: GridMeta =
            serde_json::from_value(serde_json::Value::Object(record.fields().clone()))
                .map_err(|e| WeatherError::Metadata(e.to_string()))?;

        let defaults = GridSpec::default();
        Ok(Self {
            start_day: date_from_triple(
                defaults.start_day,
                meta.start_year,
                meta.start_month,
                meta.start_day,
            )?,
            end_day: date_from_triple(
                defaults.end_day,
                meta.end_year,
                meta.end_month,
                meta.end_day,
            )?,
            delta_latitude: meta.delta_latitude.unwrap_or(defaults.delta_latitude),
            delta_longitude: meta.delta_longitude.unwrap_or(defaults.delta_longitude),
            latitude_start: meta.latitude_start.unwrap_or(defaults.latitude_start),
            longitude_start: meta.longitude_start.unwrap_or(defaults.longitude_start),
        })
    }

    /// Number of latitudes in the grid (both poles inclusive).
    pub fn number_of_latitudes(&self) -> usize {
        (1.0 + 180.0 / self.delta_latitude) as usize
    }

    /// Number of longitudes in the grid.
    pub fn number_of_longitudes(&self) -> usize {
        (360.0 / self.delta_longitude) as usize
    }

    /// One record per grid point.
    pub fn records_per_day(&self) -> usize {
        self.number_of_latitudes() * self.number_of_longitudes()
    }

    /// Grid latitudes, north to south.
    pub fn latitudes(&self) -> Vec<f64> {
        (0..self.number_of_latitudes())
            .map(|i| self.latitude_start - i as f64 * self.delta_latitude)
            .collect()
    }

    /// Grid longitudes, west to east.
    pub fn longitudes(&self) -> Vec<f64> {
        (0..self.number_of_longitudes())
            .map(|i| self.longitude_start + i as f64 * self.delta_longitude)
            .collect()
    }

    /// Index of the nearest grid latitude to the north of `lat`.
    pub fn latitude_index(&self, lat: f64) -> usize {
        ((self.latitude_start - lat) / self.delta_latitude) as usize
    }

    /// Index of the nearest grid longitude to the west of `lon`.
    pub fn longitude_index(&self, lon: f64) -> usize {
        ((lon - self.longitude_start) / self.delta_longitude) as usize
    }

    /// Whether `date` falls inside the archive span.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_day && date < self.end_day
    }

    /// Days from the start of the archive to `date`.
    pub fn day_offset(&self, date: NaiveDate) -> Result<u64> {
        if !self.contains(date) {
            return Err(WeatherError::DateOutOfRange(date));
        }
        Ok((date - self.start_day).num_days() as u64)
    }

    /// Record number of (date, lat, lon): days since the archive start
    /// times records per day, plus the longitude-major grid offset.
    pub fn record_number(&self, date: NaiveDate, lat: f64, lon: f64) -> Result<u64> {
        let days = self.day_offset(date)?;
        let offset = self.longitude_index(lon) * self.number_of_latitudes()
            + self.latitude_index(lat);
        Ok(days * self.records_per_day() as u64 + offset as u64)
    }

    /// All dates in the archive span, in order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let mut day = self.start_day;
        let end = self.end_day;
        std::iter::from_fn(move || {
            if day < end {
                let current = day;
                day = day.succ_opt()?;
                Some(current)
            } else {
                None
            }
        })
    }
}
