//! Weather grid arithmetic and archive operations.
//!
//! The raw archive is a regular latitude/longitude grid with one record per
//! grid point per day. This crate maps dates and coordinates to record
//! numbers, reads the fixed-width raw archive, packs day files as
//! little-endian f32 records, and exposes the `get day` / `build day` /
//! `build longitude` operations the archive's `meta.json` rules dispatch to.

pub mod error;
pub mod grid;
pub mod ops;
pub mod records;

pub use error::{Result, WeatherError};
pub use grid::GridSpec;
pub use records::{pack_records, unpack_records, RAW_VALUE_WIDTH, RECORD_SIZE};
