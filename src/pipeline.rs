//! Diagnosis pipeline: load, normalize, analyse, render, report.

use crate::charts::MissingPatternPlotter;
use crate::config::DiagnosisConfig;
use crate::data::schema::POLLUTANTS;
use crate::data::{
    DataLoader, DataNormalizer, MissingnessMask, NormalizeSummary, ObservationTable, SourceFormat,
};
use crate::report::ConsoleReport;
use crate::stats::{
    gap_lengths, Availability, CoMissingMatrix, CorrelatedPair, Feasibility, FeatureMissing,
    GapSummary, MonthlyMissing, StatsCalculator, HIGH_CORRELATION_THRESHOLD,
};
use anyhow::Context;
use std::io;
use std::path::PathBuf;

/// Where the table came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    pub path: PathBuf,
    pub format: SourceFormat,
    /// Why the primary source was skipped, when it was.
    pub fallback_reason: Option<String>,
}

/// Every statistic the report and the chart need.
#[derive(Debug, Clone)]
pub struct Diagnosis {
    pub source: DataSource,
    pub normalize: NormalizeSummary,
    pub table: ObservationTable,
    pub masks: Vec<MissingnessMask>,
    pub overview: Vec<FeatureMissing>,
    pub monthly: Vec<MonthlyMissing>,
    pub gap_summaries: Vec<(String, GapSummary)>,
    pub co_missing: CoMissingMatrix,
    pub correlated_pairs: Vec<CorrelatedPair>,
    pub availability: Availability,
    pub feasibility: Vec<Feasibility>,
}

impl Diagnosis {
    pub fn analyze(source: DataSource, table: ObservationTable, normalize: NormalizeSummary) -> Self {
        let masks = table.masks();
        let pollutants: Vec<&MissingnessMask> = masks
            .iter()
            .filter(|m| POLLUTANTS.contains(&m.feature.as_str()))
            .collect();

        let monthly = pollutants
            .iter()
            .filter_map(|mask| StatsCalculator::monthly_missing(&table, mask))
            .collect();

        let gap_summaries = pollutants
            .iter()
            .filter_map(|mask| {
                GapSummary::from_lengths(&gap_lengths(&mask.flags))
                    .map(|summary| (mask.feature.clone(), summary))
            })
            .collect();

        let feasibility = pollutants
            .iter()
            .filter(|mask| mask.missing_count() > 0)
            .map(|mask| Feasibility::assess(&mask.feature, &mask.flags))
            .collect();

        let co_missing = StatsCalculator::co_missing_matrix(&masks);
        let correlated_pairs = co_missing.correlated_pairs(HIGH_CORRELATION_THRESHOLD);

        Self {
            source,
            normalize,
            overview: StatsCalculator::missing_overview(&masks),
            monthly,
            gap_summaries,
            correlated_pairs,
            co_missing,
            availability: StatsCalculator::availability(&table),
            feasibility,
            masks,
            table,
        }
    }
}

/// Load and analyse the dataset without rendering or printing.
pub fn diagnose(config: &DiagnosisConfig) -> anyhow::Result<Diagnosis> {
    let outcome = DataLoader::new(&config.primary_path, &config.secondary_path)
        .load()
        .context("failed to load dataset")?;

    let source = DataSource {
        path: outcome.source_path().to_path_buf(),
        format: outcome.format(),
        fallback_reason: outcome.primary_error().map(|err| err.to_string()),
    };

    let (table, normalize) =
        DataNormalizer::normalize(outcome.dataframe()).context("failed to normalize dataset")?;
    if table.is_empty() {
        tracing::warn!("no rows survived normalization");
    }
    tracing::info!(rows = table.len(), features = table.features().len(), "normalized dataset");

    Ok(Diagnosis::analyze(source, table, normalize))
}

/// Full run: report to stdout and write the chart. Returns the image path.
pub fn run(config: &DiagnosisConfig) -> anyhow::Result<PathBuf> {
    let diagnosis = diagnose(config)?;

    let stdout = io::stdout();
    let mut report = ConsoleReport::new(stdout.lock());
    report.write_analysis(&diagnosis)?;

    let image = config.image_path();
    MissingPatternPlotter::new(config.image_width, config.image_height, config.heatmap_rows)
        .render(
            &image,
            diagnosis.table.timestamps(),
            &diagnosis.masks,
            &diagnosis.co_missing,
        )
        .context("failed to render missing pattern chart")?;
    report.write_saved(&image)?;

    report.write_modeling(&diagnosis, &config.output_dir)?;
    Ok(image)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::Recommendation;
    use polars::prelude::*;
    use std::fs;
    use std::path::Path;

    const CSV_EXPORT: &str = "\
Date;Time;CO(GT);NMHC(GT);C6H6(GT);NOx(GT);NO2(GT);PT08.S1(CO);PT08.S2(NMHC);PT08.S3(NOx);PT08.S4(NO2);PT08.S5(O3);T;RH;AH;
10/03/2004;18.00.00;2,6;150;11,9;166;113;1360;1046;1056;1692;1268;13,6;48,9;0,7578;
10/03/2004;19.00.00;2,0;-200;9,4;103;92;1292;955;1174;1559;972;13,3;47,7;0,7255;
10/03/2004;20.00.00;2,2;-200;9,0;131;114;1402;939;1140;1555;1074;11,9;54,0;0,7502;
bad;21.00.00;2,2;88;9,0;131;114;1402;939;1140;1555;1074;11,9;54,0;0,7502;
10/03/2004;19.00.00;9,9;99;9,9;99;99;999;999;999;999;999;9,9;9,9;0,9999;
10/03/2004;21.00.00;-200;-200;9,2;172;122;1376;948;1092;1584;1203;11,0;60,0;0,7867;
";

    fn csv_source() -> DataSource {
        DataSource {
            path: PathBuf::from("memory.csv"),
            format: SourceFormat::Csv,
            fallback_reason: None,
        }
    }

    fn config_in(dir: &Path) -> DiagnosisConfig {
        DiagnosisConfig {
            primary_path: dir.join("AirQualityUCI.xlsx"),
            secondary_path: dir.join("AirQualityUCI.csv"),
            output_dir: dir.join("figures"),
            ..DiagnosisConfig::default()
        }
    }

    #[test]
    fn sentinel_column_end_to_end() {
        let df = DataFrame::new(vec![
            Column::new("Date".into(), vec!["10/03/2004"; 6]),
            Column::new(
                "Time".into(),
                vec!["18.00.00", "19.00.00", "20.00.00", "21.00.00", "22.00.00", "23.00.00"],
            ),
            Column::new(
                "CO(GT)".into(),
                vec![Some(1.0), Some(-200.0), Some(-200.0), Some(2.0), Some(f64::NAN), Some(3.0)],
            ),
        ])
        .unwrap();

        let (table, summary) = DataNormalizer::normalize(&df).unwrap();
        let diagnosis = Diagnosis::analyze(csv_source(), table, summary);

        let co = &diagnosis.masks[0];
        assert_eq!(co.feature, "CO(GT)");
        assert_eq!(co.flags, vec![false, true, true, false, true, false]);
        assert_eq!(gap_lengths(&co.flags), vec![2, 1]);

        let feasibility = &diagnosis.feasibility[0];
        assert_eq!(feasibility.feature, "CO(GT)");
        assert_eq!(feasibility.missing_count, 3);
        assert_eq!(feasibility.density, 0.5);
        assert_eq!(feasibility.recommendation, Recommendation::DropOrImpute);
    }

    #[test]
    fn csv_fallback_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.secondary_path, CSV_EXPORT).unwrap();

        let diagnosis = diagnose(&config).unwrap();

        assert_eq!(diagnosis.source.format, SourceFormat::Csv);
        assert!(diagnosis.source.fallback_reason.is_some());

        assert_eq!(diagnosis.normalize.input_rows, 6);
        assert_eq!(diagnosis.normalize.unparsable_rows, 1);
        assert_eq!(diagnosis.normalize.duplicate_rows, 1);
        assert_eq!(diagnosis.table.len(), 4);
        assert!(diagnosis
            .table
            .timestamps()
            .windows(2)
            .all(|pair| pair[0] < pair[1]));

        // the duplicate 19:00 row is discarded, so CO keeps 2.0
        let co = diagnosis.table.feature("CO(GT)").unwrap();
        assert_eq!(co.values, vec![Some(2.6), Some(2.0), Some(2.2), None]);

        let nmhc = diagnosis.masks.iter().find(|m| m.feature == "NMHC(GT)").unwrap();
        assert_eq!(gap_lengths(&nmhc.flags), vec![3]);

        assert_eq!(diagnosis.availability.complete_cases, 1);
        assert_eq!(diagnosis.availability.per_pollutant[0], ("CO(GT)".to_string(), 3));
        assert_eq!(diagnosis.availability.per_pollutant[1], ("NMHC(GT)".to_string(), 1));

        assert!(diagnosis.correlated_pairs.is_empty());
        let flagged: Vec<&str> = diagnosis
            .feasibility
            .iter()
            .map(|f| f.feature.as_str())
            .collect();
        assert_eq!(flagged, vec!["CO(GT)", "NMHC(GT)"]);

        for mask in &diagnosis.masks {
            assert_eq!(mask.len(), diagnosis.table.len());
        }
    }

    #[test]
    fn workbook_primary_end_to_end() {
        use rust_xlsxwriter::{Format, Workbook};

        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        let date = Format::new().set_num_format("dd/mm/yyyy");
        let time = Format::new().set_num_format("hh:mm:ss");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in ["Date", "Time", "CO(GT)", "T"].into_iter().enumerate() {
            sheet.write_string(0, col as u16, name).unwrap();
        }
        // 38056 = 2004-03-10; rows written out of order
        let rows = [(19.0, -200.0), (18.0, 1.5), (20.0, 1.5)];
        for (idx, (hour, co)) in rows.into_iter().enumerate() {
            let row = idx as u32 + 1;
            sheet.write_number_with_format(row, 0, 38056.0, &date).unwrap();
            sheet.write_number_with_format(row, 1, hour / 24.0, &time).unwrap();
            sheet.write_number(row, 2, co).unwrap();
            sheet.write_number(row, 3, 13.6).unwrap();
        }
        workbook.save(&config.primary_path).unwrap();

        let diagnosis = diagnose(&config).unwrap();

        assert_eq!(diagnosis.source.format, SourceFormat::Xlsx);
        assert_eq!(diagnosis.source.path, config.primary_path);
        assert!(diagnosis.source.fallback_reason.is_none());

        let start = chrono::NaiveDate::from_ymd_opt(2004, 3, 10)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let expected: Vec<_> = (0..3).map(|h| start + chrono::Duration::hours(h)).collect();
        assert_eq!(diagnosis.table.timestamps(), expected.as_slice());

        let co = diagnosis.table.feature("CO(GT)").unwrap();
        assert_eq!(co.values, vec![Some(1.5), None, Some(1.5)]);
    }

    #[test]
    fn run_creates_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let config = DiagnosisConfig {
            output_dir: dir.path().join("not").join("yet"),
            image_width: 400,
            image_height: 450,
            ..config_in(dir.path())
        };
        fs::write(&config.secondary_path, CSV_EXPORT).unwrap();

        let image = run(&config).unwrap();
        assert_eq!(image, config.image_path());
        assert!(image.is_file());
    }

    #[test]
    fn missing_sources_fail_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let err = diagnose(&config_in(dir.path())).unwrap_err();
        assert!(err.to_string().contains("failed to load dataset"));
    }

    #[test]
    fn report_sections_follow_fixed_order() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        fs::write(&config.secondary_path, CSV_EXPORT).unwrap();
        let diagnosis = diagnose(&config).unwrap();

        let mut report = ConsoleReport::new(Vec::new());
        report.write_analysis(&diagnosis).unwrap();
        report.write_saved(&config.image_path()).unwrap();
        report.write_modeling(&diagnosis, &config.output_dir).unwrap();
        let text = String::from_utf8(report.into_inner()).unwrap();

        let markers = [
            "Data source:",
            "[1] OVERALL MISSING VALUE STATISTICS",
            "[2] TEMPORAL DISTRIBUTION OF MISSING VALUES",
            "[3] CONSECUTIVE MISSING VALUE ANALYSIS",
            "[4] CO-OCCURRENCE OF MISSING VALUES",
            "[SAVED]",
            "[6] FEATURE AVAILABILITY FOR MODELING",
            "[7] INTERPOLATION FEASIBILITY ASSESSMENT",
            "SUMMARY & RECOMMENDATIONS",
        ];
        let positions: Vec<usize> = markers
            .iter()
            .map(|marker| text.find(marker).unwrap_or_else(|| panic!("missing {marker}")))
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

        assert!(text.contains("NMHC(GT) - Missing by Month:"));
        assert!(text.contains("  2004-03  3"));
        assert!(text.contains("Complete cases (no missing in any feature): 1 / 4 (25.0%)"));
        assert!(text.contains("✗ RECOMMENDATION: consider dropping feature or extensive imputation"));
    }
}
