/// Read access to the climate dataset.
///
/// `WeatherStore` is the seam between the query service and PostgreSQL.
/// Every method is one aggregate query. `PgStore` opens a fresh connection
/// and a read-only transaction per call, and both are dropped (rolled back
/// and closed) on every return path, so nothing is held between requests.

use chrono::NaiveDate;
use postgres::{Client, Config, Transaction};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::db;
use crate::model::{DailyPrecipitation, TemperatureObservation, TripStats};

/// Failure talking to the store while serving a request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database query failed: {0}")]
    Query(#[from] postgres::Error),

    #[error("dataset is empty: no measurements recorded")]
    EmptyDataset,
}

pub trait WeatherStore: Send + Sync {
    /// Most recent measurement date in the dataset, if any.
    fn latest_date(&self) -> Result<Option<NaiveDate>, StoreError>;

    /// Total precipitation per date for dates on or after `since`,
    /// ascending by date.
    fn precipitation_since(&self, since: NaiveDate) -> Result<Vec<DailyPrecipitation>, StoreError>;

    /// Distinct station ids that have at least one measurement, ascending.
    fn active_stations(&self) -> Result<Vec<String>, StoreError>;

    /// Temperature observations for one station on or after `since`,
    /// ascending by date.
    fn temperature_observations(
        &self,
        station: &str,
        since: NaiveDate,
    ) -> Result<Vec<TemperatureObservation>, StoreError>;

    /// Min/avg/max tobs over `[start, end]` inclusive, or `None` when no
    /// measurement falls in the range.
    fn temperature_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<TripStats>, StoreError>;
}

// ---------------------------------------------------------------------------
// PostgreSQL
// ---------------------------------------------------------------------------

/// PostgreSQL-backed store. Holds connection parameters only.
#[derive(Clone)]
pub struct PgStore {
    config: Config,
    schema: String,
}

impl PgStore {
    /// `schema` must already have been validated as a plain identifier.
    pub fn new(config: Config, schema: impl Into<String>) -> Self {
        Self { config, schema: schema.into() }
    }

    /// Run `f` inside a short-lived read-only session.
    ///
    /// The transaction is never committed; dropping it rolls back, and the
    /// client is closed when it goes out of scope.
    fn with_session<T>(
        &self,
        f: impl FnOnce(&mut Transaction<'_>) -> Result<T, postgres::Error>,
    ) -> Result<T, StoreError> {
        let mut client: Client = db::connect(&self.config)?;
        let mut tx = client.build_transaction().read_only(true).start()?;
        tx.batch_execute(&format!("SET LOCAL search_path TO {}", self.schema))?;
        Ok(f(&mut tx)?)
    }
}

impl WeatherStore for PgStore {
    fn latest_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        self.with_session(|tx| {
            let row = tx.query_one("SELECT MAX(date) FROM measurement", &[])?;
            row.try_get(0)
        })
    }

    fn precipitation_since(&self, since: NaiveDate) -> Result<Vec<DailyPrecipitation>, StoreError> {
        self.with_session(|tx| {
            let rows = tx.query(
                "SELECT date, SUM(prcp)
                 FROM measurement
                 WHERE date >= $1
                 GROUP BY date
                 ORDER BY date",
                &[&since],
            )?;

            rows.iter()
                .map(|row| -> Result<DailyPrecipitation, postgres::Error> {
                    Ok(DailyPrecipitation {
                        date: row.try_get(0)?,
                        total: row.try_get::<_, Option<Decimal>>(1)?,
                    })
                })
                .collect()
        })
    }

    fn active_stations(&self) -> Result<Vec<String>, StoreError> {
        self.with_session(|tx| {
            let rows = tx.query(
                "SELECT station
                 FROM measurement
                 GROUP BY station
                 ORDER BY station",
                &[],
            )?;

            // NULL station ids are skipped rather than reported as a station
            rows.iter()
                .filter_map(|row| row.try_get::<_, Option<String>>(0).transpose())
                .collect()
        })
    }

    fn temperature_observations(
        &self,
        station: &str,
        since: NaiveDate,
    ) -> Result<Vec<TemperatureObservation>, StoreError> {
        self.with_session(|tx| {
            let rows = tx.query(
                "SELECT date, tobs
                 FROM measurement
                 WHERE station = $1 AND date >= $2 AND tobs IS NOT NULL
                 ORDER BY date",
                &[&station, &since],
            )?;

            rows.iter()
                .map(|row| -> Result<TemperatureObservation, postgres::Error> {
                    Ok(TemperatureObservation { date: row.try_get(0)?, tobs: row.try_get(1)? })
                })
                .collect()
        })
    }

    fn temperature_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<TripStats>, StoreError> {
        self.with_session(|tx| {
            let row = tx.query_one(
                "SELECT MIN(tobs), AVG(tobs)::float8, MAX(tobs)
                 FROM measurement
                 WHERE date >= $1 AND date <= $2",
                &[&start, &end],
            )?;

            // Aggregates over zero rows come back as a single all-NULL row.
            let min: Option<i32> = row.try_get(0)?;
            let average: Option<f64> = row.try_get(1)?;
            let max: Option<i32> = row.try_get(2)?;

            Ok(match (min, average, max) {
                (Some(min), Some(average), Some(max)) => Some(TripStats { min, average, max }),
                _ => None,
            })
        })
    }
}
