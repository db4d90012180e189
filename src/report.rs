//! Console report for a diagnosis run.
//!
//! Section order: data source, overall stats, temporal distribution,
//! consecutive gaps, co-occurrence, saved image, availability, feasibility,
//! summary.

use crate::pipeline::Diagnosis;
use crate::stats::{percentage, Recommendation};
use std::io::{self, Write};
use std::path::Path;

const RULE_WIDTH: usize = 70;

pub struct ConsoleReport<W: Write> {
    out: W,
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Everything printed before the chart is rendered.
    pub fn write_analysis(&mut self, diagnosis: &Diagnosis) -> io::Result<()> {
        self.write_source(diagnosis)?;
        self.banner("MISSING VALUE DIAGNOSIS REPORT")?;
        self.write_overview(diagnosis)?;
        self.write_temporal(diagnosis)?;
        self.write_gaps(diagnosis)?;
        self.write_co_occurrence(diagnosis)
    }

    pub fn write_saved(&mut self, image: &Path) -> io::Result<()> {
        writeln!(self.out, "\n[SAVED] {}", image.display())
    }

    /// Everything printed after the chart is rendered.
    pub fn write_modeling(&mut self, diagnosis: &Diagnosis, output_dir: &Path) -> io::Result<()> {
        self.write_availability(diagnosis)?;
        self.write_feasibility(diagnosis)?;
        self.write_summary(diagnosis, output_dir)
    }

    fn banner(&mut self, title: &str) -> io::Result<()> {
        let rule = "=".repeat(RULE_WIDTH);
        writeln!(self.out, "\n{rule}\n{title}\n{rule}")
    }

    fn section(&mut self, title: &str) -> io::Result<()> {
        writeln!(self.out, "\n{title}\n{}", "-".repeat(RULE_WIDTH))
    }

    fn write_source(&mut self, diagnosis: &Diagnosis) -> io::Result<()> {
        writeln!(
            self.out,
            "Data source: {} ({})",
            diagnosis.source.path.display(),
            diagnosis.source.format
        )?;
        if let Some(reason) = &diagnosis.source.fallback_reason {
            writeln!(self.out, "  primary source skipped: {reason}")?;
        }

        let summary = &diagnosis.normalize;
        writeln!(
            self.out,
            "Rows: {} loaded, {} kept ({} unparsable timestamps, {} duplicates)",
            summary.input_rows, summary.output_rows, summary.unparsable_rows, summary.duplicate_rows
        )?;
        if !summary.dropped_columns.is_empty() {
            writeln!(self.out, "Dropped columns: {}", summary.dropped_columns.join(", "))?;
        }
        Ok(())
    }

    fn write_overview(&mut self, diagnosis: &Diagnosis) -> io::Result<()> {
        self.section("[1] OVERALL MISSING VALUE STATISTICS")?;
        writeln!(
            self.out,
            "{:<16} {:>13} {:>11} {:>13}",
            "Feature", "Missing_Count", "Missing_Pct", "Present_Count"
        )?;
        for row in &diagnosis.overview {
            writeln!(
                self.out,
                "{:<16} {:>13} {:>11.2} {:>13}",
                row.feature, row.missing_count, row.missing_pct, row.present_count
            )?;
        }
        Ok(())
    }

    fn write_temporal(&mut self, diagnosis: &Diagnosis) -> io::Result<()> {
        self.section("[2] TEMPORAL DISTRIBUTION OF MISSING VALUES")?;
        for monthly in &diagnosis.monthly {
            writeln!(self.out, "\n{} - Missing by Month:", monthly.feature)?;
            for ((year, month), count) in &monthly.months {
                writeln!(self.out, "  {year}-{month:02}  {count}")?;
            }
            if monthly.omitted > 0 {
                writeln!(self.out, "  ... {} more months", monthly.omitted)?;
            }
        }
        Ok(())
    }

    fn write_gaps(&mut self, diagnosis: &Diagnosis) -> io::Result<()> {
        self.section("[3] CONSECUTIVE MISSING VALUE ANALYSIS")?;
        for (feature, summary) in &diagnosis.gap_summaries {
            writeln!(self.out, "\n{feature}:")?;
            writeln!(self.out, "  Total gaps: {}", summary.total_gaps)?;
            writeln!(self.out, "  Max consecutive missing: {} hours", summary.max_length)?;
            writeln!(self.out, "  Mean gap length: {:.1} hours", summary.mean_length)?;
            writeln!(self.out, "  Median gap length: {:.1} hours", summary.median_length)?;
            writeln!(self.out, "  Gaps > 24 hours: {}", summary.over_day)?;
            writeln!(self.out, "  Gaps > 168 hours (1 week): {}", summary.over_week)?;
        }
        Ok(())
    }

    fn write_co_occurrence(&mut self, diagnosis: &Diagnosis) -> io::Result<()> {
        self.section("[4] CO-OCCURRENCE OF MISSING VALUES")?;
        writeln!(
            self.out,
            "\nFeatures with highly correlated missing patterns (|r| > 0.8):"
        )?;
        for pair in &diagnosis.correlated_pairs {
            writeln!(
                self.out,
                "  {} <-> {}: {:.3}",
                pair.first, pair.second, pair.correlation
            )?;
        }
        Ok(())
    }

    fn write_availability(&mut self, diagnosis: &Diagnosis) -> io::Result<()> {
        self.section("[6] FEATURE AVAILABILITY FOR MODELING")?;
        let availability = &diagnosis.availability;
        let total = availability.total_rows;
        writeln!(
            self.out,
            "\nComplete cases (no missing in any feature): {} / {} ({:.1}%)",
            availability.complete_cases,
            total,
            percentage(availability.complete_cases, total)
        )?;

        writeln!(self.out, "\nAvailability by pollutant (with all sensors and meteo):")?;
        for (pollutant, available) in &availability.per_pollutant {
            writeln!(
                self.out,
                "  {pollutant}: {available} / {total} ({:.1}%)",
                percentage(*available, total)
            )?;
        }
        Ok(())
    }

    fn write_feasibility(&mut self, diagnosis: &Diagnosis) -> io::Result<()> {
        self.section("[7] INTERPOLATION FEASIBILITY ASSESSMENT")?;
        for report in &diagnosis.feasibility {
            writeln!(self.out, "\n{}:", report.feature)?;
            writeln!(
                self.out,
                "  Short gaps (≤3h): {} - EXCELLENT for linear interpolation",
                report.short_gaps
            )?;
            writeln!(
                self.out,
                "  Medium gaps (4-24h): {} - GOOD for time-based interpolation",
                report.medium_gaps
            )?;
            writeln!(
                self.out,
                "  Long gaps (>24h): {} - REQUIRES forward fill or deletion",
                report.long_gaps
            )?;
            writeln!(self.out, "  Data density: {:.1}%", report.density * 100.0)?;
            writeln!(
                self.out,
                "  {} RECOMMENDATION: {}",
                report.recommendation.marker(),
                report.recommendation
            )?;
        }
        Ok(())
    }

    fn write_summary(&mut self, diagnosis: &Diagnosis, output_dir: &Path) -> io::Result<()> {
        self.banner("SUMMARY & RECOMMENDATIONS")?;

        for recommendation in [
            Recommendation::Interpolate,
            Recommendation::InterpolateAndForwardFill,
            Recommendation::DropOrImpute,
        ] {
            let features: Vec<&str> = diagnosis
                .feasibility
                .iter()
                .filter(|f| f.recommendation == recommendation)
                .map(|f| f.feature.as_str())
                .collect();
            if !features.is_empty() {
                writeln!(
                    self.out,
                    "\n{} {}: {}",
                    recommendation.marker(),
                    recommendation,
                    features.join(", ")
                )?;
            }
        }

        writeln!(
            self.out,
            "\nDiagnosis complete. Check '{}/' for visualizations.",
            output_dir.display()
        )
    }
}
