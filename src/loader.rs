//! Dataset loading and timestamp normalization.
//!
//! Reads the raw A/B test CSV, drops the export artifact index column and
//! coerces the two timestamp columns to `Datetime(Milliseconds)`. Timestamp
//! parsing is permissive: values that fail to parse become null instead of
//! aborting the load.

use crate::error::{CleaningError, Result, ResultExt};
use chrono::{NaiveDate, NaiveDateTime};
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Fixed location of the raw A/B test dataset.
pub const DATASET_PATH: &str = "data/ab_dataset.csv";

/// Column holding the opaque user identifier.
pub const USER_ID: &str = "user_id";
/// Column holding the experiment variant label.
pub const AB_GROUP: &str = "ab_group";
/// Column holding the install timestamp.
pub const INSTALL_TIME: &str = "install_time";
/// Column holding the payment timestamp (null for non-paying users).
pub const PAYMENT_TIME: &str = "payment_time";

/// Index column left behind by the tool that exported the CSV.
const INDEX_ARTIFACT: &str = "Unnamed: 0";

/// Load the A/B test dataset from its fixed location.
pub fn load_dataset() -> Result<DataFrame> {
    load_dataset_from(DATASET_PATH)
}

/// Load an A/B test dataset from an explicit path.
///
/// Drops the artifact index column if present and parses `install_time` and
/// `payment_time` into millisecond datetimes. Both timestamp columns must
/// exist; individual unparseable values become null.
pub fn load_dataset_from(path: impl AsRef<Path>) -> Result<DataFrame> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(CleaningError::DatasetNotFound(path.to_path_buf()));
    }

    debug!("Loading dataset from {}", path.display());

    let mut df = CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()
        .context(format!("Failed to read {}", path.display()))?;

    // Pandas-style CSV exports carry the old row index as an unnamed
    // leading column.
    for artifact in [INDEX_ARTIFACT, ""] {
        if df.get_column_names().iter().any(|c| c.as_str() == artifact) {
            df = df.drop(artifact)?;
        }
    }

    for col_name in [INSTALL_TIME, PAYMENT_TIME] {
        let series = df
            .column(col_name)
            .map_err(|_| CleaningError::ColumnNotFound(col_name.to_string()))?
            .as_materialized_series()
            .clone();
        let parsed = string_to_datetime(&series)?;
        df.replace(col_name, parsed)?;
    }

    info!("Dataset loaded: {:?}", df.shape());

    Ok(df)
}

/// Convert a string series to `Datetime(Milliseconds)`, mapping unparseable
/// values to null.
fn string_to_datetime(series: &Series) -> Result<Series> {
    let target = DataType::Datetime(TimeUnit::Milliseconds, None);

    // Already parsed, or an all-null column with no dtype to speak of.
    if matches!(series.dtype(), DataType::Datetime(_, _)) {
        return Ok(series.clone());
    }
    if series.dtype() == &DataType::Null {
        return Ok(series.cast(&target)?);
    }

    let str_series = series.str()?;
    let mut millis: Vec<Option<i64>> = Vec::with_capacity(str_series.len());

    for opt_val in str_series.into_iter() {
        match opt_val {
            Some(val) => millis.push(parse_timestamp(val)),
            None => millis.push(None),
        }
    }

    let parsed = Series::new(series.name().clone(), millis);
    Ok(parsed.cast(&target)?)
}

/// Parse a single timestamp string to milliseconds since the epoch.
///
/// Accepts `YYYY-MM-DD HH:MM:SS[.fff]`, the `T`-separated ISO variant,
/// minute precision, and bare dates (taken as midnight).
fn parse_timestamp(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    const DATETIME_FORMATS: &[&str] = &[
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
    ];

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Some(dt.and_utc().timestamp_millis());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    fn write_csv(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn is_null_at(series: &Series, idx: usize) -> bool {
        matches!(series.get(idx).unwrap(), AnyValue::Null)
    }

    #[test]
    fn test_load_drops_artifact_index_column() {
        let file = write_csv(
            "Unnamed: 0,user_id,ab_group,install_time,payment_time\n\
             0,u1,A,2021-03-01 10:00:00,2021-03-02 11:30:00\n\
             1,u2,B,2021-03-01 12:00:00,\n",
        );

        let df = load_dataset_from(file.path()).unwrap();

        assert_eq!(df.shape(), (2, 4));
        assert!(df.column("Unnamed: 0").is_err());
    }

    #[test]
    fn test_load_parses_timestamp_columns() {
        let file = write_csv(
            "user_id,ab_group,install_time,payment_time\n\
             u1,A,2021-03-01 10:00:00,2021-03-02 11:30:00\n\
             u2,B,2021-03-01,\n",
        );

        let df = load_dataset_from(file.path()).unwrap();

        for col in [INSTALL_TIME, PAYMENT_TIME] {
            let series = df.column(col).unwrap().as_materialized_series();
            assert!(matches!(series.dtype(), DataType::Datetime(_, _)));
        }

        // Missing payment stays null
        let payments = df.column(PAYMENT_TIME).unwrap().as_materialized_series();
        assert!(is_null_at(payments, 1));
    }

    #[test]
    fn test_load_all_null_payment_column() {
        let file = write_csv(
            "user_id,ab_group,install_time,payment_time\n\
             u1,A,2021-03-01 10:00:00,\n\
             u2,B,2021-03-01 12:00:00,\n",
        );

        let df = load_dataset_from(file.path()).unwrap();

        let payments = df.column(PAYMENT_TIME).unwrap().as_materialized_series();
        assert!(matches!(payments.dtype(), DataType::Datetime(_, _)));
        assert_eq!(payments.null_count(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_dataset_from("data/does_not_exist.csv");
        assert!(matches!(result, Err(CleaningError::DatasetNotFound(_))));
    }

    #[test]
    fn test_load_missing_timestamp_column() {
        let file = write_csv("user_id,ab_group,install_time\nu1,A,2021-03-01 10:00:00\n");

        let result = load_dataset_from(file.path());
        assert!(matches!(result, Err(CleaningError::ColumnNotFound(col)) if col == PAYMENT_TIME));
    }

    #[test]
    fn test_load_header_only_csv() {
        let file = write_csv("Unnamed: 0,user_id,ab_group,install_time,payment_time\n");

        let df = load_dataset_from(file.path()).unwrap();

        assert_eq!(df.shape(), (0, 4));
        for col in [INSTALL_TIME, PAYMENT_TIME] {
            let series = df.column(col).unwrap().as_materialized_series();
            assert!(matches!(series.dtype(), DataType::Datetime(_, _)));
        }
    }

    #[test]
    fn test_extra_columns_pass_through() {
        let file = write_csv(
            "user_id,ab_group,install_time,payment_time,revenue\n\
             u1,A,2021-03-01 10:00:00,2021-03-02 11:30:00,4.99\n",
        );

        let df = load_dataset_from(file.path()).unwrap();
        assert!(df.column("revenue").is_ok());
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2021-03-01 10:00:00").is_some());
        assert!(parse_timestamp("2021-03-01 10:00:00.250").is_some());
        assert!(parse_timestamp("2021-03-01T10:00:00").is_some());
        assert!(parse_timestamp("2021-03-01 10:00").is_some());
        assert!(parse_timestamp("2021-03-01").is_some());
    }

    #[test]
    fn test_parse_timestamp_permissive_nulls() {
        assert_eq!(parse_timestamp(""), None);
        assert_eq!(parse_timestamp("   "), None);
        assert_eq!(parse_timestamp("not a date"), None);
        assert_eq!(parse_timestamp("2021-13-45"), None);
    }

    #[test]
    fn test_parse_timestamp_epoch_value() {
        // 2021-03-01 00:00:00 UTC
        assert_eq!(parse_timestamp("2021-03-01"), Some(1_614_556_800_000));
    }

    #[test]
    fn test_string_to_datetime_unparseable_becomes_null() {
        let series = Series::new(
            "ts".into(),
            &[Some("2021-03-01 10:00:00"), Some("garbage"), None],
        );
        let result = string_to_datetime(&series).unwrap();

        assert!(matches!(result.dtype(), DataType::Datetime(_, _)));
        assert!(!is_null_at(&result, 0));
        assert!(is_null_at(&result, 1));
        assert!(is_null_at(&result, 2));
    }
}
