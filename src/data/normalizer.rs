//! Data Normalizer Module
//! Turns a raw loaded DataFrame into a chronologically keyed observation table.

use super::schema::{all_features, is_artifact_column, DATE_COLUMN, SENTINEL, TIME_COLUMN};
use super::table::{FeatureSeries, ObservationTable};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use thiserror::Error;

const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];
const TIME_FORMATS: [&str; 2] = ["%H.%M.%S", "%H:%M:%S"];

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// Row accounting for one normalization pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeSummary {
    pub input_rows: usize,
    pub dropped_columns: Vec<String>,
    pub unparsable_rows: usize,
    pub duplicate_rows: usize,
    pub output_rows: usize,
}

pub struct DataNormalizer;

impl DataNormalizer {
    /// Drop artifacts, key rows by timestamp, and mark sentinel readings missing.
    pub fn normalize(
        df: &DataFrame,
    ) -> Result<(ObservationTable, NormalizeSummary), NormalizeError> {
        let (df, dropped_columns) = Self::drop_artifact_columns(df)?;

        let dates = Self::string_values(&df, DATE_COLUMN)?;
        let times = Self::string_values(&df, TIME_COLUMN)?;
        let keys: Vec<Option<NaiveDateTime>> = dates
            .iter()
            .zip(times.iter())
            .map(|(date, time)| Self::merge_timestamp(date.as_deref(), time.as_deref()))
            .collect();

        let (order, unparsable_rows, duplicate_rows) = Self::chronological_order(&keys);
        let timestamps: Vec<NaiveDateTime> = order.iter().map(|&(ts, _)| ts).collect();

        let mut features = Vec::new();
        for name in all_features() {
            let values = match Self::feature_values(&df, name)? {
                Some(raw) => {
                    Self::replace_sentinel(order.iter().map(|&(_, row)| raw[row]))
                }
                None => {
                    tracing::warn!(feature = name, "feature column absent, treating as missing");
                    vec![None; order.len()]
                }
            };
            features.push(FeatureSeries::new(name, values));
        }

        let summary = NormalizeSummary {
            input_rows: df.height(),
            dropped_columns,
            unparsable_rows,
            duplicate_rows,
            output_rows: timestamps.len(),
        };

        if summary.unparsable_rows > 0 || summary.duplicate_rows > 0 {
            tracing::info!(
                unparsable = summary.unparsable_rows,
                duplicates = summary.duplicate_rows,
                kept = summary.output_rows,
                "dropped rows during normalization"
            );
        }

        Ok((ObservationTable::new(timestamps, features), summary))
    }

    /// Remove spreadsheet-export noise columns.
    pub fn drop_artifact_columns(
        df: &DataFrame,
    ) -> Result<(DataFrame, Vec<String>), NormalizeError> {
        let (dropped, kept): (Vec<String>, Vec<String>) = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .partition(|name| is_artifact_column(name));

        if dropped.is_empty() {
            return Ok((df.clone(), dropped));
        }

        tracing::debug!(columns = ?dropped, "dropping artifact columns");
        Ok((df.select(kept)?, dropped))
    }

    /// Combine a date field and a time field into one timestamp.
    ///
    /// Accepts either representation the loaders produce: `DD/MM/YYYY` or
    /// ISO dates (optionally with a time part that is ignored), and
    /// `HH.MM.SS` or `HH:MM:SS` times. Anything else yields `None`.
    pub fn merge_timestamp(date: Option<&str>, time: Option<&str>) -> Option<NaiveDateTime> {
        let date = Self::parse_date(date?.trim())?;
        let time = Self::parse_time(time?.trim())?;
        Some(date.and_time(time))
    }

    fn parse_date(raw: &str) -> Option<NaiveDate> {
        DATE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
            .or_else(|| {
                DATETIME_FORMATS
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
                    .map(|dt| dt.date())
            })
    }

    fn parse_time(raw: &str) -> Option<NaiveTime> {
        TIME_FORMATS
            .iter()
            .find_map(|fmt| NaiveTime::parse_from_str(raw, fmt).ok())
    }

    /// Map the sentinel and NaN to missing.
    pub fn replace_sentinel(values: impl IntoIterator<Item = Option<f64>>) -> Vec<Option<f64>> {
        values
            .into_iter()
            .map(|v| v.filter(|x| *x != SENTINEL && !x.is_nan()))
            .collect()
    }

    /// Rows with a valid key, sorted ascending and deduplicated (first wins).
    ///
    /// Returns `(timestamp, source_row)` pairs plus the unparsable and
    /// duplicate counts.
    fn chronological_order(
        keys: &[Option<NaiveDateTime>],
    ) -> (Vec<(NaiveDateTime, usize)>, usize, usize) {
        let mut order: Vec<(NaiveDateTime, usize)> = keys
            .iter()
            .enumerate()
            .filter_map(|(row, key)| key.map(|ts| (ts, row)))
            .collect();
        let unparsable = keys.len() - order.len();

        order.sort_by_key(|&(ts, _)| ts);
        let parsed = order.len();
        order.dedup_by_key(|&mut (ts, _)| ts);
        let duplicates = parsed - order.len();

        (order, unparsable, duplicates)
    }

    fn string_values(
        df: &DataFrame,
        name: &'static str,
    ) -> Result<Vec<Option<String>>, NormalizeError> {
        let column = df
            .column(name)
            .map_err(|_| NormalizeError::MissingColumn(name))?
            .cast(&DataType::String)?;
        Ok(column
            .str()?
            .into_iter()
            .map(|v| v.map(str::to_string))
            .collect())
    }

    fn feature_values(
        df: &DataFrame,
        name: &str,
    ) -> Result<Option<Vec<Option<f64>>>, NormalizeError> {
        let Ok(column) = df.column(name) else {
            return Ok(None);
        };
        let column = column.cast(&DataType::Float64)?;
        Ok(Some(column.f64()?.into_iter().collect()))
    }
}
