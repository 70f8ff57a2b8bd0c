/// surfsup_service: read-only HTTP API over the Hawaii climate dataset.
///
/// # Module structure
///
/// ```text
/// surfsup_service
/// ├── model     — row and response types (TripStats, DatasetWindow, …)
/// ├── config    — service configuration loader (surfsup.toml)
/// ├── schema    — versioned declaration of the measurement/station tables
/// ├── db        — DATABASE_URL handling, connection, startup schema check
/// ├── store     — WeatherStore trait + PostgreSQL implementation
/// ├── service   — QueryService: precipitation, stations, tobs, trip
/// ├── endpoint  — routing and the tiny_http server loop
/// └── fixtures (test only) — in-memory store with a sample dataset
/// ```

/// Public modules
pub mod config;
pub mod db;
pub mod endpoint;
pub mod model;
pub mod schema;
pub mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod fixtures;
