//! Missingness Statistics Module
//! Per-feature counts, temporal grouping, co-missingness correlation and
//! feature availability.

use crate::data::schema::{METEO, POLLUTANTS, SENSORS};
use crate::data::{MissingnessMask, ObservationTable};
use chrono::Datelike;
use statrs::statistics::Statistics;
use std::collections::BTreeMap;

/// Pairs whose masks correlate more strongly than this are reported.
pub const HIGH_CORRELATION_THRESHOLD: f64 = 0.8;

/// Non-zero (year, month) groups listed per feature.
pub const MONTHLY_GROUP_LIMIT: usize = 10;

/// Missing/present counts for a single feature.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMissing {
    pub feature: String,
    pub missing_count: usize,
    pub missing_pct: f64,
    pub present_count: usize,
}

/// Missing counts of one feature grouped by calendar month.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthlyMissing {
    pub feature: String,
    /// `((year, month), missing)` for non-zero months, chronological.
    pub months: Vec<((i32, u32), usize)>,
    /// Non-zero months left out by the listing limit.
    pub omitted: usize,
}

/// Symmetric matrix of Pearson correlation between missingness indicators.
#[derive(Debug, Clone, PartialEq)]
pub struct CoMissingMatrix {
    pub features: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CoMissingMatrix {
    pub fn size(&self) -> usize {
        self.features.len()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row][col]
    }

    /// Unordered pairs `(i < j)` with `|r|` strictly above `threshold`.
    pub fn correlated_pairs(&self, threshold: f64) -> Vec<CorrelatedPair> {
        let n = self.size();
        let mut pairs = Vec::new();
        for i in 0..n {
            for j in (i + 1)..n {
                let correlation = self.get(i, j);
                if correlation.abs() > threshold {
                    pairs.push(CorrelatedPair {
                        first: self.features[i].clone(),
                        second: self.features[j].clone(),
                        correlation,
                    });
                }
            }
        }
        pairs
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CorrelatedPair {
    pub first: String,
    pub second: String,
    pub correlation: f64,
}

/// Row counts usable for modelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Availability {
    pub total_rows: usize,
    /// Rows where every feature is present.
    pub complete_cases: usize,
    /// Rows where the pollutant and every sensor and meteo field are present.
    pub per_pollutant: Vec<(String, usize)>,
}

/// Share of `count` in `total` as a percentage rounded to two decimals.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 10_000.0).round() / 100.0
}

/// Handles missingness calculations over a normalized table.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Per-feature missing counts, sorted by missing percentage descending.
    pub fn missing_overview(masks: &[MissingnessMask]) -> Vec<FeatureMissing> {
        let mut overview: Vec<FeatureMissing> = masks
            .iter()
            .map(|mask| {
                let missing_count = mask.missing_count();
                FeatureMissing {
                    feature: mask.feature.clone(),
                    missing_count,
                    missing_pct: percentage(missing_count, mask.len()),
                    present_count: mask.len() - missing_count,
                }
            })
            .collect();

        overview.sort_by(|a, b| {
            b.missing_pct
                .partial_cmp(&a.missing_pct)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        overview
    }

    /// Missing counts per (year, month); `None` when the feature is never missing.
    pub fn monthly_missing(
        table: &ObservationTable,
        mask: &MissingnessMask,
    ) -> Option<MonthlyMissing> {
        let mut groups: BTreeMap<(i32, u32), usize> = BTreeMap::new();
        for (ts, &missing) in table.timestamps().iter().zip(&mask.flags) {
            if missing {
                *groups.entry((ts.year(), ts.month())).or_default() += 1;
            }
        }

        if groups.is_empty() {
            return None;
        }

        let omitted = groups.len().saturating_sub(MONTHLY_GROUP_LIMIT);
        Some(MonthlyMissing {
            feature: mask.feature.clone(),
            months: groups.into_iter().take(MONTHLY_GROUP_LIMIT).collect(),
            omitted,
        })
    }

    /// Pearson correlation; `None` when either series is constant or too short.
    pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
        if x.len() != y.len() || x.len() < 2 {
            return None;
        }

        let covariance = x.iter().covariance(y.iter());
        let spread = x.iter().std_dev() * y.iter().std_dev();
        let r = covariance / spread;

        r.is_finite().then(|| r.clamp(-1.0, 1.0))
    }

    /// Co-missingness matrix; undefined off-diagonal correlations are 0.
    pub fn co_missing_matrix(masks: &[MissingnessMask]) -> CoMissingMatrix {
        let indicators: Vec<Vec<f64>> = masks.iter().map(MissingnessMask::indicator).collect();
        let n = masks.len();
        let mut values = vec![vec![0.0; n]; n];

        for i in 0..n {
            values[i][i] = 1.0;
            for j in (i + 1)..n {
                let r = Self::pearson(&indicators[i], &indicators[j]).unwrap_or(0.0);
                values[i][j] = r;
                values[j][i] = r;
            }
        }

        CoMissingMatrix {
            features: masks.iter().map(|m| m.feature.clone()).collect(),
            values,
        }
    }

    /// Complete cases and per-pollutant availability.
    pub fn availability(table: &ObservationTable) -> Availability {
        let all: Vec<&str> = POLLUTANTS
            .iter()
            .chain(SENSORS.iter())
            .chain(METEO.iter())
            .copied()
            .collect();

        let per_pollutant = POLLUTANTS
            .iter()
            .map(|&pollutant| {
                let mut needed = vec![pollutant];
                needed.extend(SENSORS);
                needed.extend(METEO);
                (pollutant.to_string(), table.rows_present(&needed))
            })
            .collect();

        Availability {
            total_rows: table.len(),
            complete_cases: table.rows_present(&all),
            per_pollutant,
        }
    }
}
