/// Query service: the five read operations behind the HTTP routes.
///
/// A `QueryService` is built once at startup. It resolves the dataset's
/// date window from the store, then stays immutable; handlers share it
/// behind an `Arc` and each call goes straight to the store.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::info;

use crate::config::DatasetConfig;
use crate::model::{
    self, DatasetWindow, PrecipitationMap, TobsMap, TripStats, DATE_FORMAT,
};
use crate::store::{StoreError, WeatherStore};

/// Why a trip request produced no statistics.
///
/// All three kinds reach the client as a 404 with an `error` message; the
/// message says which one it was.
#[derive(Debug, Error, PartialEq)]
pub enum TripError {
    #[error("Invalid date '{0}': dates must be formatted as YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid date range: start date {start} is after end date {end}.")]
    InvalidRange { start: String, end: String },

    #[error("No temperature observations between {start} and {end}.")]
    NoData { start: String, end: String },
}

/// Failure of a trip request: either the request itself or the store.
#[derive(Debug, Error)]
pub enum TripFailure {
    #[error(transparent)]
    Trip(#[from] TripError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Parse an API date. The year is exactly four digits; month and day may
/// omit their leading zero. No sign or surrounding whitespace is accepted.
pub fn parse_date(raw: &str) -> Result<NaiveDate, TripError> {
    let invalid = || TripError::InvalidDate(raw.to_string());

    let mut parts = raw.split('-');
    let shape_ok = match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(year), Some(month), Some(day), None) => {
            all_digits(year, 4, 4) && all_digits(month, 1, 2) && all_digits(day, 1, 2)
        }
        _ => false,
    };
    if !shape_ok {
        return Err(invalid());
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| invalid())
}

fn all_digits(part: &str, min: usize, max: usize) -> bool {
    (min..=max).contains(&part.len()) && part.bytes().all(|b| b.is_ascii_digit())
}

pub struct QueryService<S> {
    store: S,
    window: DatasetWindow,
    tobs_station: String,
}

impl<S: WeatherStore> QueryService<S> {
    /// Resolve the dataset window and build the service.
    ///
    /// Fails with `StoreError::EmptyDataset` when there are no measurements
    /// at all, since no cutoff can be derived.
    pub fn new(store: S, dataset: &DatasetConfig) -> Result<Self, StoreError> {
        let latest = store.latest_date()?.ok_or(StoreError::EmptyDataset)?;
        let window = DatasetWindow::ending_at(latest, dataset.lookback_months);

        info!(
            latest = %window.latest,
            cutoff = %window.cutoff,
            tobs_station = %dataset.tobs_station,
            "dataset window resolved"
        );

        Ok(Self::with_window(store, window, &dataset.tobs_station))
    }

    /// Build with an already known window.
    pub fn with_window(store: S, window: DatasetWindow, tobs_station: &str) -> Self {
        Self {
            store,
            window,
            tobs_station: tobs_station.to_string(),
        }
    }

    pub fn window(&self) -> DatasetWindow {
        self.window
    }

    /// Human-readable index of the available routes.
    pub fn welcome(&self) -> String {
        let latest = model::format_date(self.window.latest);
        format!(
            "Available Routes for Hawaii Weather Data:<br/><br/>\
             -- Daily Precipitation Totals for Last Year: \
             <a href=\"/api/v1.0/precipitation\">/api/v1.0/precipitation</a><br/>\
             -- Active Weather Stations: \
             <a href=\"/api/v1.0/stations\">/api/v1.0/stations</a><br/>\
             -- Daily Temperature Observations for Station {station} for Last Year: \
             <a href=\"/api/v1.0/tobs\">/api/v1.0/tobs</a><br/>\
             -- Min, Average & Max Temperatures for Date Range: \
             /api/v1.0/trip/yyyy-mm-dd/yyyy-mm-dd<br/>\
             NOTE: If no end-date is provided, the trip API calculates stats through {latest}<br/>",
            station = self.tobs_station,
            latest = latest,
        )
    }

    /// Daily precipitation totals since the cutoff.
    pub fn precipitation(&self) -> Result<PrecipitationMap, StoreError> {
        let rows = self.store.precipitation_since(self.window.cutoff)?;
        Ok(model::precipitation_map(rows))
    }

    /// Stations with at least one measurement.
    pub fn stations(&self) -> Result<Vec<String>, StoreError> {
        let mut stations = self.store.active_stations()?;
        stations.sort();
        stations.dedup();
        Ok(stations)
    }

    /// Daily temperature observations for the configured station since the cutoff.
    pub fn tobs(&self) -> Result<TobsMap, StoreError> {
        let rows = self
            .store
            .temperature_observations(&self.tobs_station, self.window.cutoff)?;
        Ok(model::tobs_map(rows))
    }

    /// Min/avg/max temperature over `[start, end]`; `end` defaults to the
    /// dataset's latest date.
    pub fn trip(&self, start: &str, end: Option<&str>) -> Result<Vec<TripStats>, TripFailure> {
        let start_date = parse_date(start)?;
        let end_date = match end {
            Some(raw) => parse_date(raw)?,
            None => self.window.latest,
        };

        if start_date > end_date {
            return Err(TripError::InvalidRange {
                start: model::format_date(start_date),
                end: model::format_date(end_date),
            }
            .into());
        }

        match self.store.temperature_stats(start_date, end_date)? {
            Some(stats) => Ok(vec![stats]),
            None => Err(TripError::NoData {
                start: model::format_date(start_date),
                end: model::format_date(end_date),
            }
            .into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
