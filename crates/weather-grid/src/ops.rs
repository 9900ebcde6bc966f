//! Archive operations dispatched from `meta.json` rules.
//!
//! Every operation follows the dispatch contract: it receives the matched
//! base directory, the relative path and the merged parameter set, performs
//! its file I/O against the base directory, and returns a JSON result.

use std::fs;
use std::path::Path;

use anyhow::Context;
use chrono::{Datelike, NaiveDate};
use serde_json::{json, Value};
use tracing::{debug, info};

use dispatch::{MetaStore, MetadataRecord, OpContext, OperationRegistry};

use crate::error::WeatherError;
use crate::grid::GridSpec;
use crate::records::{pack_records, read_raw_day, unpack_records};

/// Source-path template used when neither the rule nor the base metadata
/// provides one.
pub const DEFAULT_SOURCE: &str = "raw/{field}";

/// Day-file template used by `build_longitude` when the rule provides none.
pub const DEFAULT_DAYS: &str = "year/{year}/{month}/{day}/{field}";

/// Install all weather operations into a registry.
pub fn register(registry: &mut OperationRegistry) {
    registry.register("weather.get_day", get_day);
    registry.register("weather.build_day", build_day);
    registry.register("weather.build_longitude", build_longitude);
}

/// Base-directory metadata plus everything merged along `rel` beneath it.
fn merged_meta(base: &Path, rel: &str) -> anyhow::Result<MetadataRecord> {
    let store = MetaStore::new(base);
    let mut meta = store.load("")?;
    meta.merge_from(store.load_all(rel)?);
    Ok(meta)
}

/// A string-valued field from the parameter set, if present.
fn string_param(ctx: &OpContext<'_>, name: &str) -> anyhow::Result<Option<String>> {
    match ctx.params.get(name) {
        None => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => anyhow::bail!("rule field '{}' must be a string, got {}", name, other),
    }
}

/// Read a packed day file and return its values.
pub fn get_day(ctx: OpContext<'_>) -> anyhow::Result<Value> {
    let path = ctx.base.join(ctx.relative);
    let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
    let values = unpack_records(&bytes)?;
    debug!(path = ctx.relative, records = values.len(), "read day file");
    Ok(json!(values))
}

/// Copy one day of data from the raw archive into a packed day file.
///
/// The source path template comes from the rule (`source` field), the base
/// metadata, or [`DEFAULT_SOURCE`]; `{name}` placeholders are filled from
/// the matched parameters. The source's grid configuration is the merged
/// metadata along the source path.
pub fn build_day(ctx: OpContext<'_>) -> anyhow::Result<Value> {
    let year = ctx.params.get_i64("year")?;
    let month = ctx.params.get_i64("month")?;
    let day = ctx.params.get_i64("day")?;
    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .ok_or(WeatherError::InvalidDate { year, month, day })?;

    let template = match string_param(&ctx, "source")? {
        Some(template) => template,
        None => MetaStore::new(ctx.base)
            .load("")?
            .get("source")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_SOURCE)
            .to_string(),
    };
    let source = ctx.params.expand(&template)?;

    let source_meta = merged_meta(ctx.base, &source)?;
    let grid = GridSpec::from_metadata(&source_meta)?;

    let source_path = ctx.base.join(&source);
    let values = read_raw_day(&source_path, &grid, date)
        .with_context(|| format!("reading raw archive {}", source_path.display()))?;

    let out = ctx.base.join(ctx.relative);
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out, pack_records(&values))
        .with_context(|| format!("writing {}", out.display()))?;

    info!(path = ctx.relative, source, records = values.len(), "built day file");
    Ok(json!({ "path": ctx.relative, "records": values.len() }))
}

/// Extract one longitude's latitude column from every day file in the
/// archive span and concatenate them into a single packed series file.
///
/// Day files are longitude-major, so each day contributes one contiguous
/// slice of `number_of_latitudes` records.
pub fn build_longitude(ctx: OpContext<'_>) -> anyhow::Result<Value> {
    let lon = ctx.params.get_f64("lon")?;

    let meta = merged_meta(ctx.base, ctx.relative)?;
    let grid = GridSpec::from_metadata(&meta)?;

    let n_lats = grid.number_of_latitudes();
    let lon_index = grid.longitude_index(lon);
    if lon < grid.longitude_start || lon_index >= grid.number_of_longitudes() {
        return Err(WeatherError::LongitudeOutOfRange(lon).into());
    }

    let template = string_param(&ctx, "days")?.unwrap_or_else(|| DEFAULT_DAYS.to_string());

    let mut series: Vec<f32> = Vec::new();
    let mut days = 0usize;
    for date in grid.days() {
        let mut params = ctx.params.clone();
        params.insert("year", json!(date.year()));
        params.insert("month", json!(date.month()));
        params.insert("day", json!(date.day()));

        let day_path = ctx.base.join(params.expand(&template)?);
        let bytes = fs::read(&day_path)
            .with_context(|| format!("reading day file {}", day_path.display()))?;
        let values = unpack_records(&bytes)?;

        let start = lon_index * n_lats;
        let column = values
            .get(start..start + n_lats)
            .ok_or(WeatherError::ShortDay {
                found: values.len(),
                expected: start + n_lats,
            })?;
        series.extend_from_slice(column);
        days += 1;
    }

    let out = ctx.base.join(ctx.relative);
    if let Some(parent) = out.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&out, pack_records(&series))
        .with_context(|| format!("writing {}", out.display()))?;

    info!(
        path = ctx.relative,
        lon, days,
        records = series.len(),
        "built longitude series"
    );
    Ok(json!({ "path": ctx.relative, "days": days, "records": series.len() }))
}
