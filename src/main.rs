//! Air Quality Gapscope - Missing-Value Pattern Diagnosis
//!
//! Loads the hourly UCI Air Quality dataset, finds where its readings are
//! missing, and reports gap structure, co-missingness and how feasible
//! interpolation is.

mod charts;
mod config;
mod data;
mod pipeline;
mod report;
mod stats;

use anyhow::Context;
use config::{DiagnosisConfig, CONFIG_FILE};
use std::path::Path;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    init_tracing()?;

    let config = DiagnosisConfig::load_or_default(Path::new(CONFIG_FILE))
        .with_context(|| format!("failed to read {CONFIG_FILE}"))?;

    pipeline::run(&config)?;
    Ok(())
}

/// Diagnostics go to stderr; stdout carries only the report.
fn init_tracing() -> anyhow::Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new("info").context("invalid log filter")?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
