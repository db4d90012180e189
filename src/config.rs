//! Run configuration: input paths, output directory and image geometry.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Optional configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "gapscope.json";

/// File name of the combined diagnosis image.
pub const IMAGE_FILE: &str = "missing_pattern_analysis.png";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DiagnosisConfig {
    /// Spreadsheet export, tried first.
    pub primary_path: PathBuf,
    /// Semicolon CSV export, used when the spreadsheet is unusable.
    pub secondary_path: PathBuf,
    pub output_dir: PathBuf,
    /// Rows shown in the missingness heatmap.
    pub heatmap_rows: usize,
    pub image_width: u32,
    pub image_height: u32,
}

impl Default for DiagnosisConfig {
    fn default() -> Self {
        Self {
            primary_path: PathBuf::from("data/air+quality/AirQualityUCI.xlsx"),
            secondary_path: PathBuf::from("data/air+quality/AirQualityUCI.csv"),
            output_dir: PathBuf::from("diagnosis_figures"),
            heatmap_rows: 2000,
            image_width: 1400,
            image_height: 1500,
        }
    }
}

impl DiagnosisConfig {
    /// Read `path` if it exists; missing keys keep their defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path)?;
        let config = serde_json::from_str(&text)?;
        tracing::info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn image_path(&self) -> PathBuf {
        self.output_dir.join(IMAGE_FILE)
    }
}
