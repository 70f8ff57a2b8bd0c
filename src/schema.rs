/// Declared shape of the climate dataset.
///
/// The service does not discover its tables at runtime. Instead it carries
/// an explicit, versioned declaration of every table and column it reads,
/// and `db::verify_dataset_schema` checks that declaration against the live
/// `information_schema.columns` at startup. Any mismatch aborts startup.
///
/// Bump `SCHEMA_VERSION` whenever a table or column below changes.

use thiserror::Error;

/// Version of the declared dataset layout.
pub const SCHEMA_VERSION: u32 = 1;

/// One column the service reads, with every `information_schema` data type
/// it accepts for that column.
#[derive(Debug, Clone, Copy)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub data_types: &'static [&'static str],
}

/// A table and the columns the service depends on. Extra live columns are
/// ignored.
#[derive(Debug, Clone, Copy)]
pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [ColumnSpec],
}

const TEXT: &[&str] = &["text", "character varying"];
const FLOAT: &[&str] = &["double precision", "real", "numeric"];

pub static MEASUREMENT_TABLE: TableSpec = TableSpec {
    name: "measurement",
    columns: &[
        ColumnSpec { name: "station", data_types: TEXT },
        ColumnSpec { name: "date", data_types: &["date"] },
        ColumnSpec { name: "prcp", data_types: &["numeric"] },
        ColumnSpec { name: "tobs", data_types: &["integer"] },
    ],
};

pub static STATION_TABLE: TableSpec = TableSpec {
    name: "station",
    columns: &[
        ColumnSpec { name: "station", data_types: TEXT },
        ColumnSpec { name: "name", data_types: TEXT },
        ColumnSpec { name: "latitude", data_types: FLOAT },
        ColumnSpec { name: "longitude", data_types: FLOAT },
        ColumnSpec { name: "elevation", data_types: FLOAT },
    ],
};

/// Every table in schema version `SCHEMA_VERSION`.
pub static DATASET_TABLES: &[&TableSpec] = &[&MEASUREMENT_TABLE, &STATION_TABLE];

// ---------------------------------------------------------------------------
// Verification
// ---------------------------------------------------------------------------

/// A difference between the declared layout and the live store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("table '{table}' does not exist (schema version {version})", version = SCHEMA_VERSION)]
    MissingTable { table: String },

    #[error(
        "column '{table}.{column}' does not exist (schema version {version})",
        version = SCHEMA_VERSION
    )]
    MissingColumn { table: String, column: String },

    #[error(
        "column '{table}.{column}' has type '{found}', expected one of {expected:?} \
         (schema version {version})",
        version = SCHEMA_VERSION
    )]
    WrongType {
        table: String,
        column: String,
        found: String,
        expected: Vec<String>,
    },
}

/// Checks a table declaration against its live `(column_name, data_type)`
/// pairs. An empty `live` slice means the table does not exist.
pub fn verify_table(spec: &TableSpec, live: &[(String, String)]) -> Result<(), SchemaError> {
    if live.is_empty() {
        return Err(SchemaError::MissingTable { table: spec.name.to_string() });
    }

    for column in spec.columns {
        let found = live
            .iter()
            .find(|(name, _)| name == column.name)
            .map(|(_, data_type)| data_type)
            .ok_or_else(|| SchemaError::MissingColumn {
                table: spec.name.to_string(),
                column: column.name.to_string(),
            })?;

        if !column.data_types.iter().any(|t| t.eq_ignore_ascii_case(found)) {
            return Err(SchemaError::WrongType {
                table: spec.name.to_string(),
                column: column.name.to_string(),
                found: found.clone(),
                expected: column.data_types.iter().map(|t| t.to_string()).collect(),
            });
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn live(columns: &[(&str, &str)]) -> Vec<(String, String)> {
        columns.iter().map(|(n, t)| (n.to_string(), t.to_string())).collect()
    }

    #[test]
    fn test_measurement_table_matches_expected_layout() {
        let columns = live(&[
            ("id", "integer"),
            ("station", "text"),
            ("date", "date"),
            ("prcp", "numeric"),
            ("tobs", "integer"),
        ]);
        assert_eq!(verify_table(&MEASUREMENT_TABLE, &columns), Ok(()));
    }

    #[test]
    fn test_varchar_station_accepted() {
        let columns = live(&[
            ("station", "character varying"),
            ("name", "character varying"),
            ("latitude", "double precision"),
            ("longitude", "double precision"),
            ("elevation", "real"),
        ]);
        assert!(verify_table(&STATION_TABLE, &columns).is_ok());
    }

    #[test]
    fn test_missing_table_detected() {
        let err = verify_table(&STATION_TABLE, &[]).unwrap_err();
        assert_eq!(err, SchemaError::MissingTable { table: "station".to_string() });
    }

    #[test]
    fn test_missing_column_detected() {
        let columns = live(&[("station", "text"), ("date", "date"), ("tobs", "integer")]);
        let err = verify_table(&MEASUREMENT_TABLE, &columns).unwrap_err();

        assert_eq!(
            err,
            SchemaError::MissingColumn { table: "measurement".to_string(), column: "prcp".to_string() }
        );
    }

    #[test]
    fn test_wrong_type_detected_and_reported() {
        let columns = live(&[
            ("station", "text"),
            ("date", "text"),
            ("prcp", "numeric"),
            ("tobs", "integer"),
        ]);
        let err = verify_table(&MEASUREMENT_TABLE, &columns).unwrap_err();

        assert!(matches!(err, SchemaError::WrongType { ref column, .. } if column == "date"));
        assert!(err.to_string().contains("measurement.date"));
        assert!(err.to_string().contains("schema version 1"));
    }

    #[test]
    fn test_every_declared_table_has_columns() {
        for table in DATASET_TABLES {
            assert!(!table.columns.is_empty(), "{} declares no columns", table.name);
        }
    }
}
