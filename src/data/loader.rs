//! Dataset Loader Module
//! Reads the air-quality dataset from the XLSX workbook, falling back to the
//! semicolon-separated CSV export when the workbook is unusable.

use super::schema::{DATE_COLUMN, TIME_COLUMN};
use calamine::{open_workbook_auto, Data, Reader};
use chrono::{Days, NaiveDate, NaiveTime};
use polars::prelude::*;
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Failed to read workbook: {0}")]
    WorkbookError(#[from] calamine::Error),
    #[error("Workbook has no readable worksheet")]
    NoWorksheet,
    #[error("Missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("Both sources failed (primary: {primary}; secondary: {secondary})")]
    Exhausted {
        primary: Box<LoaderError>,
        secondary: Box<LoaderError>,
    },
}

/// On-disk representation a table was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Xlsx,
    Csv,
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Xlsx => write!(f, "XLSX"),
            SourceFormat::Csv => write!(f, "CSV"),
        }
    }
}

/// Which source produced the table. Both failing is `LoaderError::Exhausted`.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The primary workbook was read.
    Primary { df: DataFrame, path: PathBuf },
    /// The workbook failed and the CSV export was read instead.
    Fallback {
        df: DataFrame,
        path: PathBuf,
        primary_error: LoaderError,
    },
}

impl LoadOutcome {
    pub fn dataframe(&self) -> &DataFrame {
        match self {
            LoadOutcome::Primary { df, .. } | LoadOutcome::Fallback { df, .. } => df,
        }
    }

    pub fn source_path(&self) -> &Path {
        match self {
            LoadOutcome::Primary { path, .. } | LoadOutcome::Fallback { path, .. } => path,
        }
    }

    pub fn format(&self) -> SourceFormat {
        match self {
            LoadOutcome::Primary { .. } => SourceFormat::Xlsx,
            LoadOutcome::Fallback { .. } => SourceFormat::Csv,
        }
    }

    pub fn primary_error(&self) -> Option<&LoaderError> {
        match self {
            LoadOutcome::Primary { .. } => None,
            LoadOutcome::Fallback { primary_error, .. } => Some(primary_error),
        }
    }
}

/// A worksheet cell reduced to what the tabular layer cares about.
#[derive(Debug, Clone, PartialEq)]
enum SheetCell {
    Number(f64),
    Date(NaiveDate),
    Text(String),
    Empty,
}

/// Loads the dataset from its two interchangeable representations.
pub struct DataLoader {
    primary: PathBuf,
    secondary: PathBuf,
}

impl DataLoader {
    pub fn new(primary: impl Into<PathBuf>, secondary: impl Into<PathBuf>) -> Self {
        Self {
            primary: primary.into(),
            secondary: secondary.into(),
        }
    }

    /// Try the workbook first, then the CSV export.
    pub fn load(&self) -> Result<LoadOutcome, LoaderError> {
        let primary_error = match Self::load_xlsx(&self.primary) {
            Ok(df) => {
                tracing::info!(
                    path = %self.primary.display(),
                    rows = df.height(),
                    "loaded primary workbook"
                );
                return Ok(LoadOutcome::Primary {
                    df,
                    path: self.primary.clone(),
                });
            }
            Err(err) => err,
        };

        tracing::warn!(
            path = %self.primary.display(),
            error = %primary_error,
            "primary workbook unusable, falling back to CSV"
        );

        match Self::load_csv(&self.secondary) {
            Ok(df) => {
                tracing::info!(
                    path = %self.secondary.display(),
                    rows = df.height(),
                    "loaded CSV export"
                );
                Ok(LoadOutcome::Fallback {
                    df,
                    path: self.secondary.clone(),
                    primary_error,
                })
            }
            Err(secondary_error) => Err(LoaderError::Exhausted {
                primary: Box::new(primary_error),
                secondary: Box::new(secondary_error),
            }),
        }
    }

    /// Load a semicolon-separated CSV with comma decimals using Polars.
    pub fn load_csv(path: &Path) -> Result<DataFrame, LoaderError> {
        Self::ensure_exists(path)?;

        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_separator(b';')
            .with_decimal_comma(true)
            .with_infer_schema_length(Some(10000))
            .with_ignore_errors(true)
            .finish()?
            .collect()?;

        Self::require_temporal_columns(&df)?;
        Ok(df)
    }

    /// Load the first worksheet of a workbook into a DataFrame.
    ///
    /// Numeric columns become `Float64`, whole-day date cells become `Date`,
    /// everything else (time-of-day cells included) becomes `String`.
    pub fn load_xlsx(path: &Path) -> Result<DataFrame, LoaderError> {
        Self::ensure_exists(path)?;

        let mut workbook = open_workbook_auto(path)?;
        let range = workbook
            .worksheet_range_at(0)
            .ok_or(LoaderError::NoWorksheet)??;

        let mut rows = range.rows();
        let header = rows.next().ok_or(LoaderError::NoWorksheet)?;
        let names = Self::header_names(header);

        let mut cells: Vec<Vec<SheetCell>> = vec![Vec::with_capacity(range.height()); names.len()];
        for row in rows {
            for (idx, column) in cells.iter_mut().enumerate() {
                column.push(row.get(idx).map(Self::sheet_cell).unwrap_or(SheetCell::Empty));
            }
        }

        let columns: Vec<Column> = names
            .iter()
            .zip(cells)
            .map(|(name, column)| Self::build_column(name, column))
            .collect();

        let df = DataFrame::new(columns)?;
        Self::require_temporal_columns(&df)?;
        Ok(df)
    }

    fn ensure_exists(path: &Path) -> Result<(), LoaderError> {
        if path.is_file() {
            Ok(())
        } else {
            Err(LoaderError::NotFound(path.to_path_buf()))
        }
    }

    fn require_temporal_columns(df: &DataFrame) -> Result<(), LoaderError> {
        for name in [DATE_COLUMN, TIME_COLUMN] {
            df.column(name).map_err(|_| LoaderError::MissingColumn(name))?;
        }
        Ok(())
    }

    /// Header names with blanks and repeats given unique artifact names.
    fn header_names(header: &[Data]) -> Vec<String> {
        let mut seen = HashSet::new();
        header
            .iter()
            .enumerate()
            .map(|(idx, cell)| {
                let name = cell.to_string().trim().to_string();
                let name = if name.is_empty() {
                    format!("Unnamed: {idx}")
                } else if seen.contains(&name) {
                    format!("_duplicated_{idx}")
                } else {
                    name
                };
                seen.insert(name.clone());
                name
            })
            .collect()
    }

    fn sheet_cell(cell: &Data) -> SheetCell {
        match cell {
            Data::Float(v) => SheetCell::Number(*v),
            Data::Int(v) => SheetCell::Number(*v as f64),
            Data::Bool(v) => SheetCell::Number(if *v { 1.0 } else { 0.0 }),
            Data::DateTime(dt) => Self::serial_cell(dt.as_f64()),
            Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => {
                let s = s.trim();
                if s.is_empty() {
                    SheetCell::Empty
                } else {
                    SheetCell::Text(s.to_string())
                }
            }
            _ => SheetCell::Empty,
        }
    }

    /// Interpret an Excel serial (days since 1899-12-30, fraction = time of day).
    fn serial_cell(serial: f64) -> SheetCell {
        if !serial.is_finite() || serial < 0.0 {
            return SheetCell::Empty;
        }

        let mut days = serial.floor() as u64;
        let mut seconds = ((serial - serial.floor()) * SECONDS_PER_DAY).round() as u32;
        if seconds >= 86_400 {
            days += 1;
            seconds -= 86_400;
        }

        let Some(time) = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0) else {
            return SheetCell::Empty;
        };
        if days == 0 {
            return SheetCell::Text(time.format("%H:%M:%S").to_string());
        }

        let Some(date) = NaiveDate::from_ymd_opt(1899, 12, 30)
            .and_then(|epoch| epoch.checked_add_days(Days::new(days)))
        else {
            return SheetCell::Empty;
        };

        if seconds == 0 {
            SheetCell::Date(date)
        } else {
            SheetCell::Text(date.and_time(time).format("%Y-%m-%d %H:%M:%S").to_string())
        }
    }

    fn build_column(name: &str, cells: Vec<SheetCell>) -> Column {
        let has_text = cells.iter().any(|c| matches!(c, SheetCell::Text(_)));
        let has_date = cells.iter().any(|c| matches!(c, SheetCell::Date(_)));
        let has_number = cells.iter().any(|c| matches!(c, SheetCell::Number(_)));

        if !has_text && !has_date {
            let values: Vec<Option<f64>> = cells
                .into_iter()
                .map(|c| match c {
                    SheetCell::Number(v) => Some(v),
                    _ => None,
                })
                .collect();
            return Column::new(name.into(), values);
        }

        if has_date && !has_text && !has_number {
            let values: Vec<Option<NaiveDate>> = cells
                .into_iter()
                .map(|c| match c {
                    SheetCell::Date(d) => Some(d),
                    _ => None,
                })
                .collect();
            return Column::new(name.into(), values);
        }

        let values: Vec<Option<String>> = cells
            .into_iter()
            .map(|c| match c {
                SheetCell::Number(v) => Some(v.to_string()),
                SheetCell::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
                SheetCell::Text(s) => Some(s),
                SheetCell::Empty => None,
            })
            .collect();
        Column::new(name.into(), values)
    }
}
