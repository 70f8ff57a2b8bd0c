/// Test fixtures: an in-memory `WeatherStore` and a small dataset shaped
/// like the Hawaii climate data, cfg(test) gated.
///
/// `FailingStore` errors on every call, for the 500 path.
///
/// `FixtureStore` applies the same filters and aggregates as the SQL in
/// `store::PgStore`: SUM ignores NULL precipitation and is NULL only when
/// every value for a date is NULL; MIN/AVG/MAX over no rows is "no stats".
///
/// Sample layout (tobs in parentheses, prcp in brackets):
///   2016-08-22  USC00519281 (75) [1.79]                      — before cutoff
///   2016-08-23  USC00519281 (77) [0.15], USC00519397 (81) [0.08]
///   2016-08-24  USC00519281 (76) [NULL], USC00513117 (74) [NULL]
///   2016-12-31  USC00519281 (80) [0.00]
///   2017-01-01 … 2017-01-07 tobs 62, 70, 66, 74, 68, 72 (min 62, max 74)
///   2017-01-08  USC00519281 (60)
///   2017-08-01  USC00519281 (77), USC00513117 (75)
///   2017-08-23  USC00519281 (76) [0.45], USC00513117 (82) [0.00] — latest

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::model::{DailyPrecipitation, TemperatureObservation, TripStats, DATE_FORMAT};
use crate::store::{StoreError, WeatherStore};

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, DATE_FORMAT).expect("fixture date")
}

#[derive(Debug, Clone)]
pub(crate) struct MeasurementRow {
    pub station: String,
    pub date: NaiveDate,
    pub prcp: Option<Decimal>,
    pub tobs: i32,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct FixtureStore {
    rows: Vec<MeasurementRow>,
}

impl FixtureStore {
    pub(crate) fn push(&mut self, station: &str, day: &str, prcp: Option<&str>, tobs: i32) {
        self.rows.push(MeasurementRow {
            station: station.to_string(),
            date: date(day),
            prcp: prcp.map(|p| Decimal::from_str(p).expect("fixture decimal")),
            tobs,
        });
    }
}

impl WeatherStore for FixtureStore {
    fn latest_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        Ok(self.rows.iter().map(|r| r.date).max())
    }

    fn precipitation_since(&self, since: NaiveDate) -> Result<Vec<DailyPrecipitation>, StoreError> {
        let mut totals: BTreeMap<NaiveDate, Option<Decimal>> = BTreeMap::new();
        for row in self.rows.iter().filter(|r| r.date >= since) {
            let total = totals.entry(row.date).or_insert(None);
            if let Some(prcp) = row.prcp {
                *total = Some(total.unwrap_or_default() + prcp);
            }
        }

        Ok(totals
            .into_iter()
            .map(|(date, total)| DailyPrecipitation { date, total })
            .collect())
    }

    fn active_stations(&self) -> Result<Vec<String>, StoreError> {
        let mut stations: Vec<String> = self.rows.iter().map(|r| r.station.clone()).collect();
        stations.sort();
        stations.dedup();
        Ok(stations)
    }

    fn temperature_observations(
        &self,
        station: &str,
        since: NaiveDate,
    ) -> Result<Vec<TemperatureObservation>, StoreError> {
        let mut observations: Vec<TemperatureObservation> = self
            .rows
            .iter()
            .filter(|r| r.station == station && r.date >= since)
            .map(|r| TemperatureObservation { date: r.date, tobs: r.tobs })
            .collect();
        observations.sort_by_key(|o| o.date);
        Ok(observations)
    }

    fn temperature_stats(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Option<TripStats>, StoreError> {
        let tobs: Vec<i32> = self
            .rows
            .iter()
            .filter(|r| r.date >= start && r.date <= end)
            .map(|r| r.tobs)
            .collect();

        let (Some(&min), Some(&max)) = (tobs.iter().min(), tobs.iter().max()) else {
            return Ok(None);
        };
        let average = tobs.iter().map(|&t| t as f64).sum::<f64>() / tobs.len() as f64;

        Ok(Some(TripStats { min, average, max }))
    }
}

/// Small Hawaii-shaped dataset; see the module docs for its layout.
pub(crate) fn hawaii_sample() -> FixtureStore {
    let mut store = FixtureStore::default();

    store.push("USC00519281", "2016-08-22", Some("1.79"), 75);
    store.push("USC00519281", "2016-08-23", Some("0.15"), 77);
    store.push("USC00519397", "2016-08-23", Some("0.08"), 81);
    store.push("USC00519281", "2016-08-24", None, 76);
    store.push("USC00513117", "2016-08-24", None, 74);
    store.push("USC00519281", "2016-12-31", Some("0.00"), 80);

    store.push("USC00519281", "2017-01-01", Some("0.00"), 62);
    store.push("USC00519281", "2017-01-02", Some("0.01"), 70);
    store.push("USC00513117", "2017-01-03", Some("0.00"), 66);
    store.push("USC00519281", "2017-01-04", None, 74);
    store.push("USC00519397", "2017-01-06", Some("0.12"), 68);
    store.push("USC00519281", "2017-01-07", Some("0.00"), 72);
    store.push("USC00519281", "2017-01-08", Some("0.02"), 60);

    store.push("USC00519281", "2017-08-01", Some("0.00"), 77);
    store.push("USC00513117", "2017-08-01", Some("0.03"), 75);
    store.push("USC00519281", "2017-08-23", Some("0.45"), 76);
    store.push("USC00513117", "2017-08-23", Some("0.00"), 82);

    store
}

/// A store whose every query fails, for exercising the 500 path.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct FailingStore;

impl WeatherStore for FailingStore {
    fn latest_date(&self) -> Result<Option<NaiveDate>, StoreError> {
        Err(StoreError::EmptyDataset)
    }

    fn precipitation_since(&self, _since: NaiveDate) -> Result<Vec<DailyPrecipitation>, StoreError> {
        Err(StoreError::EmptyDataset)
    }

    fn active_stations(&self) -> Result<Vec<String>, StoreError> {
        Err(StoreError::EmptyDataset)
    }

    fn temperature_observations(
        &self,
        _station: &str,
        _since: NaiveDate,
    ) -> Result<Vec<TemperatureObservation>, StoreError> {
        Err(StoreError::EmptyDataset)
    }

    fn temperature_stats(
        &self,
        _start: NaiveDate,
        _end: NaiveDate,
    ) -> Result<Option<TripStats>, StoreError> {
        Err(StoreError::EmptyDataset)
    }
}
