/// Shared data types for the climate query service.
///
/// Row types returned by the store layer and the response shapes the
/// HTTP endpoint serializes. Dates are `chrono::NaiveDate` internally and
/// become `YYYY-MM-DD` strings only at the JSON boundary.

use std::collections::BTreeMap;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Wire format for every date accepted or returned by the API.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

// ---------------------------------------------------------------------------
// Store rows
// ---------------------------------------------------------------------------

/// Total precipitation recorded across all stations on one date.
///
/// `total` is `None` when every measurement on that date had a NULL `prcp`.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyPrecipitation {
    pub date: NaiveDate,
    pub total: Option<Decimal>,
}

/// A single temperature observation at one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemperatureObservation {
    pub date: NaiveDate,
    pub tobs: i32,
}

/// Aggregate temperature statistics over a date range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripStats {
    #[serde(rename = "Min")]
    pub min: i32,
    #[serde(rename = "Average")]
    pub average: f64,
    #[serde(rename = "Max")]
    pub max: i32,
}

// ---------------------------------------------------------------------------
// Dataset window
// ---------------------------------------------------------------------------

/// Date bounds of the loaded dataset, resolved once at startup.
///
/// `cutoff` is `latest` minus the configured lookback. The precipitation
/// and tobs queries only look at dates on or after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetWindow {
    pub latest: NaiveDate,
    pub cutoff: NaiveDate,
}

impl DatasetWindow {
    /// Builds the window ending at `latest` and reaching back `lookback_months`.
    ///
    /// Month arithmetic clamps to the end of shorter months, so a window
    /// ending on 2016-02-29 with a 12 month lookback starts on 2015-02-28.
    pub fn ending_at(latest: NaiveDate, lookback_months: u32) -> Self {
        let cutoff = latest
            .checked_sub_months(Months::new(lookback_months))
            .unwrap_or(NaiveDate::MIN);
        Self { latest, cutoff }
    }
}

// ---------------------------------------------------------------------------
// Response shaping
// ---------------------------------------------------------------------------

/// `date → total precipitation` keyed by ISO date string.
///
/// ISO dates sort lexicographically in chronological order, so the
/// BTreeMap keeps the mapping ascending by date.
pub type PrecipitationMap = BTreeMap<String, Option<f64>>;

/// `date → temperature observation` keyed by ISO date string.
pub type TobsMap = BTreeMap<String, i32>;

/// Formats a date the way the API emits it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Converts NUMERIC precipitation to a JSON-friendly float.
pub fn decimal_to_f64(value: Decimal) -> Option<f64> {
    value.to_f64()
}

pub fn precipitation_map(rows: Vec<DailyPrecipitation>) -> PrecipitationMap {
    rows.into_iter()
        .map(|row| (format_date(row.date), row.total.and_then(decimal_to_f64)))
        .collect()
}

/// Later observations for the same date replace earlier ones.
pub fn tobs_map(rows: Vec<TemperatureObservation>) -> TobsMap {
    rows.into_iter()
        .map(|row| (format_date(row.date), row.tobs))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
