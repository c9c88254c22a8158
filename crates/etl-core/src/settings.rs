use chrono::NaiveDate;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::error::{EtlError, Result};
use crate::time_utils::parse_date;

// ── Settings (CLI) ────────────────────────────────────────────────────────────

/// Full-refresh batch ETL for the SaaS analytics warehouse
#[derive(Parser, Debug, Clone)]
#[command(
    name = "saas-etl",
    about = "Full-refresh batch ETL for the SaaS analytics warehouse",
    version
)]
pub struct Settings {
    /// Directory containing the five source extracts
    #[arg(long, default_value = "data")]
    pub data_dir: PathBuf,

    /// Path of the SQLite warehouse file (replaced on every run)
    #[arg(long, default_value = "warehouse.db")]
    pub warehouse: PathBuf,

    /// First month of the revenue snapshot grid (inclusive)
    #[arg(long, default_value = "2024-04-01")]
    pub month_start: String,

    /// Last month of the revenue snapshot grid (inclusive)
    #[arg(long, default_value = "2025-04-01")]
    pub month_end: String,

    /// Fraction of customers given a simulated cancellation
    #[arg(long, default_value = "0.05")]
    pub status_sample_rate: f64,

    /// Fraction of customers given a simulated historical version
    #[arg(long, default_value = "0.05")]
    pub version_sample_rate: f64,

    /// Fraction of subscriptions given a simulated plan change
    #[arg(long, default_value = "0.10")]
    pub plan_change_sample_rate: f64,

    /// Seed for the change simulator (same seed, same warehouse)
    #[arg(long, default_value = "42")]
    pub seed: u64,

    /// Optional JSON file of plan-name to monthly-price overrides
    #[arg(long)]
    pub price_table: Option<PathBuf>,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR"])]
    pub log_level: String,
}

// ── RunConfig ─────────────────────────────────────────────────────────────────

/// Validated, fully-parsed parameters for one pipeline run.
///
/// Library crates consume this instead of reading the CLI; tests construct
/// it directly with literal values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub data_dir: PathBuf,
    pub warehouse_path: PathBuf,
    pub month_start: NaiveDate,
    pub month_end: NaiveDate,
    pub status_sample_rate: f64,
    pub version_sample_rate: f64,
    pub plan_change_sample_rate: f64,
    pub seed: u64,
    /// Plan-name → monthly price overrides layered over the defaults.
    #[serde(default)]
    pub price_overrides: Option<HashMap<String, u32>>,
}

impl RunConfig {
    /// Build a validated config from the raw CLI settings.
    ///
    /// Parses the month-grid bounds, range-checks the sampling fractions and
    /// loads the optional price-override file.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let month_start = parse_date(&settings.month_start)?;
        let month_end = parse_date(&settings.month_end)?;
        if month_end < month_start {
            tracing::warn!(
                "month grid is empty: end {} precedes start {}",
                month_end,
                month_start
            );
        }

        for (name, rate) in [
            ("status-sample-rate", settings.status_sample_rate),
            ("version-sample-rate", settings.version_sample_rate),
            ("plan-change-sample-rate", settings.plan_change_sample_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(EtlError::Config(format!(
                    "{} must be within [0, 1], got {}",
                    name, rate
                )));
            }
        }

        let price_overrides = match &settings.price_table {
            None => None,
            Some(path) => {
                let content =
                    std::fs::read_to_string(path).map_err(|source| EtlError::FileRead {
                        path: path.clone(),
                        source,
                    })?;
                let map: HashMap<String, u32> = serde_json::from_str(&content)
                    .map_err(|e| EtlError::Config(format!("invalid price table: {}", e)))?;
                Some(map)
            }
        };

        Ok(Self {
            data_dir: settings.data_dir.clone(),
            warehouse_path: settings.warehouse.clone(),
            month_start,
            month_end,
            status_sample_rate: settings.status_sample_rate,
            version_sample_rate: settings.version_sample_rate,
            plan_change_sample_rate: settings.plan_change_sample_rate,
            seed: settings.seed,
            price_overrides,
        })
    }
}
