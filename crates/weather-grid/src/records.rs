//! Archive record formats.
//!
//! Two formats exist side by side:
//!
//! - the **raw archive**: fixed-width text, one value per record,
//!   [`RAW_VALUE_WIDTH`] bytes each including whitespace, so a record's byte
//!   offset is just its record number times the stride;
//! - **packed files** written by the build operations: little-endian f32
//!   records, [`RECORD_SIZE`] bytes each, no header.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use chrono::NaiveDate;

use crate::error::{Result, WeatherError};
use crate::grid::GridSpec;

/// Bytes per value in the raw text archive.
pub const RAW_VALUE_WIDTH: usize = 9;

/// Bytes per record in packed day files.
pub const RECORD_SIZE: usize = std::mem::size_of::<f32>();

/// Pack values as little-endian f32 records.
pub fn pack_records(values: &[f32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(values.len() * RECORD_SIZE);
    for value in values {
        bytes.extend_from_slice(&value.to_le_bytes());
    }
    bytes
}

/// Unpack little-endian f32 records.
pub fn unpack_records(bytes: &[u8]) -> Result<Vec<f32>> {
    if bytes.len() % RECORD_SIZE != 0 {
        return Err(WeatherError::TruncatedRecords(bytes.len()));
    }
    Ok(bytes
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Read one day of values from the raw text archive.
///
/// Seeks to the date's first record and parses `records_per_day` values
/// from the fixed-width slice.
pub fn read_raw_day(path: &Path, grid: &GridSpec, date: NaiveDate) -> Result<Vec<f32>> {
    let record = grid.record_number(date, grid.latitude_start, grid.longitude_start)?;
    let expected = grid.records_per_day();

    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(record * RAW_VALUE_WIDTH as u64))?;

    let mut buf = vec![0u8; expected * RAW_VALUE_WIDTH];
    file.read_exact(&mut buf)?;

    let text = std::str::from_utf8(&buf)
        .map_err(|_| WeatherError::BadRawValue("non-utf8 data".to_string()))?;

    let values: Vec<f32> = text
        .split_whitespace()
        .map(|token| {
            token
                .parse::<f32>()
                .map_err(|_| WeatherError::BadRawValue(token.to_string()))
        })
        .collect::<Result<_>>()?;

    if values.len() != expected {
        return Err(WeatherError::ShortDay {
            found: values.len(),
            expected,
        });
    }

    Ok(values)
}
