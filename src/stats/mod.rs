//! Stats module - missingness statistics, gap analysis and feasibility

pub mod feasibility;
pub mod gaps;
mod missingness;

pub use feasibility::{Feasibility, Recommendation};
pub use gaps::{gap_lengths, GapSummary};
pub use missingness::{
    percentage, Availability, CoMissingMatrix, CorrelatedPair, FeatureMissing, MonthlyMissing,
    StatsCalculator, HIGH_CORRELATION_THRESHOLD,
};
