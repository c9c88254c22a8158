//! The single-shot batch pipeline.
//!
//! One synchronous pass: load extracts, clean, lift to typed records,
//! simulate demo history, build both dimensions, generate both snapshot
//! facts, write all seven warehouse tables in order. Everything is
//! materialised in memory and written over one connection; a failure at any
//! point aborts the run with whatever tables were already replaced.

use std::time::Instant;

use chrono::Utc;
use etl_core::error::Result;
use etl_core::models::{
    customer_dimension_table, revenue_snapshot_table, subscription_dimension_table,
    usage_log_table, usage_snapshot_table,
};
use etl_core::pricing::PriceTable;
use etl_core::settings::RunConfig;
use etl_core::time_utils::month_grid;
use etl_data::cleaner::clean;
use etl_data::reader::{customers_from, load_extracts, subscriptions_from, usage_logs_from};
use etl_data::scd::{customer_dimension, subscription_dimension};
use etl_data::snapshot::{revenue_snapshot, usage_snapshot};
use etl_data::synth::ChangeSimulator;
use etl_warehouse::{LoadReport, Warehouse};
use serde::{Deserialize, Serialize};
use tracing::info;

/// What one run produced, persisted as `run_report.json` beside the
/// warehouse file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// RFC 3339 timestamp of when the run finished.
    pub generated_at: String,
    /// Wall-clock duration of the whole run.
    pub elapsed_seconds: f64,
    /// Months in the revenue snapshot grid.
    pub months: usize,
    pub customer_versions: usize,
    pub subscription_versions: usize,
    pub revenue_rows: usize,
    pub usage_rows: usize,
    /// Per-table write outcomes, in write order.
    pub tables: Vec<LoadReport>,
}

/// Execute the full pipeline for one run.
pub fn run(config: &RunConfig) -> Result<RunSummary> {
    let started = Instant::now();
    info!("loading extracts from {}", config.data_dir.display());

    // Ingest and clean.
    let raw = load_extracts(&config.data_dir)?;
    let customers_table = clean(raw.customers);
    let support_tickets = clean(raw.support_tickets);
    let usage_table = clean(raw.usage_logs);
    let subscriptions_table = clean(raw.subscriptions);
    let product_features = clean(raw.product_features);

    // Typed extraction.
    let customers = customers_from(&customers_table)?;
    let subscriptions = subscriptions_from(&subscriptions_table)?;
    let usage_logs = usage_logs_from(&usage_table)?;
    info!(
        "extracted {} customers, {} subscriptions, {} usage events",
        customers.len(),
        subscriptions.len(),
        usage_logs.len()
    );

    // Simulated history (seeded; the only randomness in the run).
    let mut simulator = ChangeSimulator::new(config.seed);
    let status_changes = simulator.status_changes(
        &customers,
        config.status_sample_rate,
        config.version_sample_rate,
    );
    let plan_changes = simulator.plan_changes(&subscriptions, config.plan_change_sample_rate);

    // Dimension histories.
    let customer_versions = customer_dimension(&customers, &status_changes);
    let subscription_versions = subscription_dimension(&subscriptions, &plan_changes);
    info!(
        "built {} customer versions, {} subscription versions",
        customer_versions.len(),
        subscription_versions.len()
    );

    // Snapshot facts.
    let months = month_grid(config.month_start, config.month_end);
    let prices = PriceTable::new(config.price_overrides.clone());
    let revenue_rows = revenue_snapshot(&subscription_versions, &months, &prices);
    let usage_rows = usage_snapshot(&usage_logs);
    info!(
        "generated {} revenue rows over {} months, {} usage rows",
        revenue_rows.len(),
        months.len(),
        usage_rows.len()
    );

    // Load, full-replace, in the fixed write order.
    let mut warehouse = Warehouse::open(&config.warehouse_path)?;
    let tables = vec![
        warehouse.replace_table("dim_customer", &customer_dimension_table(&customer_versions))?,
        warehouse.replace_table("fact_support_ticket", &support_tickets)?,
        warehouse.replace_table("usage_logs", &usage_log_table(&usage_logs))?,
        warehouse.replace_table("fact_usage_snapshot", &usage_snapshot_table(&usage_rows))?,
        warehouse.replace_table(
            "dim_subscription",
            &subscription_dimension_table(&subscription_versions),
        )?,
        warehouse.replace_table("dim_product_feature", &product_features)?,
        warehouse.replace_table(
            "fact_revenue_snapshot",
            &revenue_snapshot_table(&revenue_rows),
        )?,
    ];

    let summary = RunSummary {
        generated_at: Utc::now().to_rfc3339(),
        elapsed_seconds: started.elapsed().as_secs_f64(),
        months: months.len(),
        customer_versions: customer_versions.len(),
        subscription_versions: subscription_versions.len(),
        revenue_rows: revenue_rows.len(),
        usage_rows: usage_rows.len(),
        tables,
    };

    write_report(config, &summary)?;
    Ok(summary)
}

/// Persist the run summary as pretty JSON beside the warehouse file.
fn write_report(config: &RunConfig, summary: &RunSummary) -> Result<()> {
    let path = config.warehouse_path.with_file_name("run_report.json");
    let json = serde_json::to_string_pretty(summary).map_err(|e| {
        etl_core::error::EtlError::Config(format!("failed to serialise run report: {}", e))
    })?;
    std::fs::write(&path, json)?;
    info!("wrote run report to {}", path.display());
    Ok(())
}
