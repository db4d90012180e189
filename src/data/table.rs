//! Normalized observation table and the missingness masks derived from it.

use chrono::NaiveDateTime;

/// One feature's hourly values; `None` marks a missing reading.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSeries {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl FeatureSeries {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    pub fn is_missing(&self, row: usize) -> bool {
        self.values
            .get(row)
            .map_or(true, |v| v.map_or(true, f64::is_nan))
    }

    pub fn missing_mask(&self) -> MissingnessMask {
        MissingnessMask {
            feature: self.name.clone(),
            flags: (0..self.values.len()).map(|row| self.is_missing(row)).collect(),
        }
    }
}

/// Per-feature boolean sequence aligned to the table; `true` = missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingnessMask {
    pub feature: String,
    pub flags: Vec<bool>,
}

impl MissingnessMask {
    pub fn len(&self) -> usize {
        self.flags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flags.is_empty()
    }

    pub fn missing_count(&self) -> usize {
        self.flags.iter().filter(|&&missing| missing).count()
    }

    /// Mask as a 0/1 numeric sequence for correlation.
    pub fn indicator(&self) -> Vec<f64> {
        self.flags
            .iter()
            .map(|&missing| if missing { 1.0 } else { 0.0 })
            .collect()
    }
}

/// Hourly records keyed by a strictly increasing timestamp.
#[derive(Debug, Clone, Default)]
pub struct ObservationTable {
    timestamps: Vec<NaiveDateTime>,
    features: Vec<FeatureSeries>,
}

impl ObservationTable {
    pub fn new(timestamps: Vec<NaiveDateTime>, features: Vec<FeatureSeries>) -> Self {
        debug_assert!(timestamps.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(features.iter().all(|f| f.values.len() == timestamps.len()));
        Self {
            timestamps,
            features,
        }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn features(&self) -> &[FeatureSeries] {
        &self.features
    }

    pub fn feature(&self, name: &str) -> Option<&FeatureSeries> {
        self.features.iter().find(|f| f.name == name)
    }

    /// Masks for every feature, in table order.
    pub fn masks(&self) -> Vec<MissingnessMask> {
        self.features.iter().map(FeatureSeries::missing_mask).collect()
    }

    /// Number of rows where every named feature is present.
    ///
    /// A name that is not in the table counts as missing everywhere.
    pub fn rows_present(&self, names: &[&str]) -> usize {
        let columns: Option<Vec<&FeatureSeries>> =
            names.iter().map(|name| self.feature(name)).collect();
        let Some(columns) = columns else {
            return 0;
        };

        (0..self.len())
            .filter(|&row| columns.iter().all(|series| !series.is_missing(row)))
            .count()
    }
}
