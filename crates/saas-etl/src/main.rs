mod bootstrap;

use anyhow::Result;
use clap::Parser;
use etl_core::settings::{RunConfig, Settings};

fn main() -> Result<()> {
    let settings = Settings::parse();
    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("SaaS warehouse ETL v{} starting", env!("CARGO_PKG_VERSION"));

    let config = RunConfig::from_settings(&settings)?;
    tracing::info!(
        "Extracts: {}, warehouse: {}, months: {} to {}, seed: {}",
        config.data_dir.display(),
        config.warehouse_path.display(),
        config.month_start,
        config.month_end,
        config.seed
    );

    let summary = etl_runtime::pipeline::run(&config)?;

    for report in &summary.tables {
        tracing::info!("  {:<24} {:>8} rows", report.table, report.rows);
    }
    tracing::info!(
        "Done in {:.2}s: {} tables, {} revenue rows, {} usage rows",
        summary.elapsed_seconds,
        summary.tables.len(),
        summary.revenue_rows,
        summary.usage_rows
    );

    Ok(())
}
