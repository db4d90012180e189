//! Consecutive-gap detection over a missingness mask.

use statrs::statistics::{Data, Median, Statistics};

/// Gaps longer than this many hours span more than a day.
pub const DAY_HOURS: usize = 24;
/// Gaps longer than this many hours span more than a week.
pub const WEEK_HOURS: usize = 168;

/// A maximal run of consecutive missing entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gap {
    pub start: usize,
    pub length: usize,
}

impl Gap {
    /// One past the last missing index.
    pub fn end(&self) -> usize {
        self.start + self.length
    }
}

/// Every maximal run of `true` in `mask`, left to right.
///
/// A run still open at the end of the mask is emitted with its full length.
pub fn find_gaps(mask: &[bool]) -> Vec<Gap> {
    let mut gaps = Vec::new();
    let mut open: Option<usize> = None;

    for (idx, &missing) in mask.iter().enumerate() {
        match (missing, open) {
            (true, None) => open = Some(idx),
            (false, Some(start)) => {
                gaps.push(Gap {
                    start,
                    length: idx - start,
                });
                open = None;
            }
            _ => {}
        }
    }

    if let Some(start) = open {
        gaps.push(Gap {
            start,
            length: mask.len() - start,
        });
    }

    gaps
}

/// Lengths of the gaps in `mask`, in order of occurrence.
pub fn gap_lengths(mask: &[bool]) -> Vec<usize> {
    find_gaps(mask).into_iter().map(|gap| gap.length).collect()
}

/// Descriptive statistics over one feature's gap lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct GapSummary {
    pub total_gaps: usize,
    pub max_length: usize,
    pub mean_length: f64,
    pub median_length: f64,
    pub over_day: usize,
    pub over_week: usize,
}

impl GapSummary {
    /// `None` when there are no gaps.
    pub fn from_lengths(lengths: &[usize]) -> Option<Self> {
        let max_length = *lengths.iter().max()?;
        let as_f64: Vec<f64> = lengths.iter().map(|&len| len as f64).collect();

        Some(Self {
            total_gaps: lengths.len(),
            max_length,
            mean_length: as_f64.iter().mean(),
            median_length: Data::new(as_f64).median(),
            over_day: lengths.iter().filter(|&&len| len > DAY_HOURS).count(),
            over_week: lengths.iter().filter(|&&len| len > WEEK_HOURS).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const F: bool = false;
    const T: bool = true;

    #[test]
    fn empty_and_all_present_masks_have_no_gaps() {
        assert!(gap_lengths(&[]).is_empty());
        assert!(gap_lengths(&[F, F, F, F]).is_empty());
    }

    #[test]
    fn all_missing_mask_is_one_gap() {
        assert_eq!(gap_lengths(&[T; 7]), vec![7]);
        assert_eq!(find_gaps(&[T; 7]), vec![Gap { start: 0, length: 7 }]);
    }

    #[test]
    fn trailing_gap_is_emitted() {
        assert_eq!(gap_lengths(&[F, T, T, F, T, T, T]), vec![2, 3]);
        assert_eq!(gap_lengths(&[F, T, T]), vec![2]);
        assert_eq!(gap_lengths(&[F, F, T]), vec![1]);
    }

    #[test]
    fn gaps_record_start_positions() {
        let gaps = find_gaps(&[T, F, F, T, T, F]);
        assert_eq!(
            gaps,
            vec![Gap { start: 0, length: 1 }, Gap { start: 3, length: 2 }]
        );
        assert_eq!(gaps[1].end(), 5);
    }

    #[test]
    fn summary_of_no_gaps_is_none() {
        assert_eq!(GapSummary::from_lengths(&[]), None);
    }

    #[test]
    fn summary_counts_long_gaps() {
        let summary = GapSummary::from_lengths(&[1, 3, 30, 200]).unwrap();
        assert_eq!(summary.total_gaps, 4);
        assert_eq!(summary.max_length, 200);
        assert!((summary.mean_length - 58.5).abs() < 1e-9);
        assert!((summary.median_length - 16.5).abs() < 1e-9);
        assert_eq!(summary.over_day, 2);
        assert_eq!(summary.over_week, 1);
    }

    #[test]
    fn day_boundary_is_exclusive() {
        let summary = GapSummary::from_lengths(&[24, 168]).unwrap();
        assert_eq!(summary.over_day, 1);
        assert_eq!(summary.over_week, 0);
    }

    proptest! {
        #[test]
        fn prop_lengths_sum_to_missing_count(mask in prop::collection::vec(any::<bool>(), 0..400)) {
            let total: usize = gap_lengths(&mask).iter().sum();
            prop_assert_eq!(total, mask.iter().filter(|&&m| m).count());
        }

        #[test]
        fn prop_gaps_are_maximal_runs(mask in prop::collection::vec(any::<bool>(), 0..400)) {
            let gaps = find_gaps(&mask);
            for gap in &gaps {
                prop_assert!(gap.length > 0);
                prop_assert!(mask[gap.start..gap.end()].iter().all(|&m| m));
                if gap.start > 0 {
                    prop_assert!(!mask[gap.start - 1]);
                }
                if gap.end() < mask.len() {
                    prop_assert!(!mask[gap.end()]);
                }
            }
            for pair in gaps.windows(2) {
                prop_assert!(pair[0].end() < pair[1].start);
            }
        }
    }
}
