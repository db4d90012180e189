//! Missing Pattern Plotter
//! Renders the three stacked diagnosis panels into one PNG using plotters.
//!
//! Layout:
//! 1. Cumulative missing count over time, one line per pollutant
//! 2. Binary missingness heatmap for the first rows of every feature
//! 3. Co-missingness correlation heatmap

use crate::data::schema::{short_name, POLLUTANTS};
use crate::data::MissingnessMask;
use crate::stats::CoMissingMatrix;
use chrono::NaiveDateTime;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Line colors for the pollutant timeline.
pub const PALETTE: [RGBColor; 5] = [
    RGBColor(31, 119, 180),  // Blue
    RGBColor(255, 127, 14),  // Orange
    RGBColor(44, 160, 44),   // Green
    RGBColor(214, 39, 40),   // Red
    RGBColor(148, 103, 189), // Purple
];

const MISSING_COLOR: RGBColor = RGBColor(215, 48, 39);
const PRESENT_COLOR: RGBColor = RGBColor(26, 152, 80);
const COOL: RGBColor = RGBColor(59, 76, 192); // r = -1
const WARM: RGBColor = RGBColor(180, 4, 38); // r = +1

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Failed to create output directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to render chart: {0}")]
    Render(String),
}

fn render_err<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Render(err.to_string())
}

/// Running count of missing entries up to and including each index.
pub fn cumulative_missing(flags: &[bool]) -> Vec<usize> {
    flags
        .iter()
        .scan(0usize, |count, &missing| {
            *count += usize::from(missing);
            Some(*count)
        })
        .collect()
}

/// Diverging blue-white-red color for a correlation in `[-1, 1]`.
pub fn diverging_color(value: f64) -> RGBColor {
    let t = if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    };
    let (target, weight) = if t < 0.0 { (COOL, -t) } else { (WARM, t) };
    let mix = |channel: u8| (255.0 + (channel as f64 - 255.0) * weight).round() as u8;
    RGBColor(mix(target.0), mix(target.1), mix(target.2))
}

pub struct MissingPatternPlotter {
    width: u32,
    height: u32,
    heatmap_rows: usize,
}

impl MissingPatternPlotter {
    pub fn new(width: u32, height: u32, heatmap_rows: usize) -> Self {
        Self {
            width,
            height,
            heatmap_rows,
        }
    }

    /// Draw all three panels to `path`, creating its directory if needed.
    pub fn render(
        &self,
        path: &Path,
        timestamps: &[NaiveDateTime],
        masks: &[MissingnessMask],
        matrix: &CoMissingMatrix,
    ) -> Result<(), ChartError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_err)?;
        let root = root
            .titled("Missing Value Pattern Analysis", ("sans-serif", 28))
            .map_err(render_err)?;

        let panels = root.split_evenly((3, 1));
        self.draw_timeline(&panels[0], timestamps, masks)?;
        self.draw_mask_heatmap(&panels[1], masks)?;
        self.draw_correlation_heatmap(&panels[2], matrix)?;

        root.present().map_err(render_err)?;
        tracing::info!(path = %path.display(), "saved missing pattern chart");
        Ok(())
    }

    fn draw_timeline<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        timestamps: &[NaiveDateTime],
        masks: &[MissingnessMask],
    ) -> Result<(), ChartError> {
        let pollutants: Vec<&MissingnessMask> = masks
            .iter()
            .filter(|m| POLLUTANTS.contains(&m.feature.as_str()))
            .collect();
        let rows = timestamps.len().max(1);
        let peak = pollutants
            .iter()
            .map(|m| m.missing_count())
            .max()
            .unwrap_or(0)
            .max(1);

        let mut chart = ChartBuilder::on(area)
            .caption("Cumulative Missing Values Over Time", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..rows as f64, 0f64..peak as f64 * 1.05)
            .map_err(render_err)?;

        let date_label = |x: &f64| {
            timestamps
                .get(x.max(0.0) as usize)
                .map(|ts| ts.format("%Y-%m").to_string())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .x_labels(10)
            .x_label_formatter(&date_label)
            .y_desc("Cumulative Missing Count")
            .draw()
            .map_err(render_err)?;

        for (idx, mask) in pollutants.iter().enumerate() {
            let color = PALETTE[idx % PALETTE.len()];
            let points = cumulative_missing(&mask.flags)
                .into_iter()
                .enumerate()
                .map(|(x, count)| (x as f64, count as f64));

            chart
                .draw_series(LineSeries::new(points, color.stroke_width(2)))
                .map_err(render_err)?
                .label(short_name(&mask.feature))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
        }

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(render_err)?;
        Ok(())
    }

    fn draw_mask_heatmap<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        masks: &[MissingnessMask],
    ) -> Result<(), ChartError> {
        let features = masks.len();
        let rows = masks
            .iter()
            .filter(|m| !m.is_empty())
            .map(MissingnessMask::len)
            .min()
            .unwrap_or(0)
            .min(self.heatmap_rows);

        let mut chart = ChartBuilder::on(area)
            .caption("Missing Value Heatmap (Red = Missing)", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(80)
            .build_cartesian_2d(0i32..rows.max(1) as i32, 0i32..features.max(1) as i32)
            .map_err(render_err)?;

        // First feature on the top row.
        let feature_label = |y: &i32| {
            features
                .checked_sub(1 + *y as usize)
                .and_then(|idx| masks.get(idx))
                .map(|m| short_name(&m.feature).to_string())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .y_labels(features.max(1))
            .y_label_formatter(&feature_label)
            .x_desc(format!("Time Index (first {rows} observations)"))
            .draw()
            .map_err(render_err)?;

        let cells = masks.iter().enumerate().flat_map(|(idx, mask)| {
            let y = (features - 1 - idx) as i32;
            mask.flags.iter().take(rows).enumerate().map(move |(x, &missing)| {
                let color = if missing { MISSING_COLOR } else { PRESENT_COLOR };
                Rectangle::new([(x as i32, y), (x as i32 + 1, y + 1)], color.filled())
            })
        });
        chart.draw_series(cells).map_err(render_err)?;
        Ok(())
    }

    fn draw_correlation_heatmap<DB: DrawingBackend>(
        &self,
        area: &DrawingArea<DB, Shift>,
        matrix: &CoMissingMatrix,
    ) -> Result<(), ChartError> {
        let n = matrix.size();

        let mut chart = ChartBuilder::on(area)
            .caption("Co-occurrence Pattern of Missing Values", ("sans-serif", 20))
            .margin(10)
            .x_label_area_size(35)
            .y_label_area_size(80)
            .build_cartesian_2d(0i32..n.max(1) as i32, 0i32..n.max(1) as i32)
            .map_err(render_err)?;

        let column_label = |x: &i32| {
            matrix
                .features
                .get(*x as usize)
                .map(|f| short_name(f).to_string())
                .unwrap_or_default()
        };
        let row_label = |y: &i32| {
            n.checked_sub(1 + *y as usize)
                .and_then(|idx| matrix.features.get(idx))
                .map(|f| short_name(f).to_string())
                .unwrap_or_default()
        };
        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(n.max(1))
            .y_labels(n.max(1))
            .x_label_formatter(&column_label)
            .y_label_formatter(&row_label)
            .draw()
            .map_err(render_err)?;

        let cells = (0..n).flat_map(|row| {
            let y = (n - 1 - row) as i32;
            (0..n).map(move |col| {
                let color = diverging_color(matrix.get(row, col));
                Rectangle::new([(col as i32, y), (col as i32 + 1, y + 1)], color.filled())
            })
        });
        chart.draw_series(cells).map_err(render_err)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::all_features;
    use crate::data::{FeatureSeries, ObservationTable};
    use crate::stats::StatsCalculator;
    use chrono::{Duration, NaiveDate};

    fn table(rows: usize) -> ObservationTable {
        let start = NaiveDate::from_ymd_opt(2004, 3, 10)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap();
        let timestamps = (0..rows).map(|h| start + Duration::hours(h as i64)).collect();
        let features = all_features()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let values = (0..rows)
                    .map(|row| ((row + idx) % 3 != 0).then_some(row as f64))
                    .collect();
                FeatureSeries::new(name, values)
            })
            .collect();
        ObservationTable::new(timestamps, features)
    }

    fn render_into(dir: &Path, table: &ObservationTable) -> std::path::PathBuf {
        let path = dir.join("nested").join("figures").join("missing_pattern_analysis.png");
        let masks = table.masks();
        let matrix = StatsCalculator::co_missing_matrix(&masks);
        MissingPatternPlotter::new(400, 450, 2000)
            .render(&path, table.timestamps(), &masks, &matrix)
            .unwrap();
        path
    }

    #[test]
    fn render_creates_directory_and_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = render_into(dir.path(), &table(12));

        assert!(path.is_file());
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn render_handles_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let path = render_into(dir.path(), &table(0));
        assert!(path.is_file());
    }

    #[test]
    fn cumulative_counts_increase_on_missing() {
        assert_eq!(
            cumulative_missing(&[false, true, true, false, true]),
            vec![0, 1, 2, 2, 3]
        );
        assert!(cumulative_missing(&[]).is_empty());
    }

    #[test]
    fn diverging_scale_endpoints() {
        assert_eq!(diverging_color(0.0), RGBColor(255, 255, 255));
        assert_eq!(diverging_color(1.0), WARM);
        assert_eq!(diverging_color(-1.0), COOL);
        assert_eq!(diverging_color(5.0), WARM);
        assert_eq!(diverging_color(f64::NAN), RGBColor(255, 255, 255));
    }

    #[test]
    fn diverging_scale_midpoint() {
        let RGBColor(r, g, b) = diverging_color(0.5);
        assert_eq!((r, g, b), (218, 130, 147));
    }
}
