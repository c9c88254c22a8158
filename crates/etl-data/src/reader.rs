//! Delimited-text extract loading and typed extraction.
//!
//! Reads the five fixed-name source files from the data directory into
//! generic [`Table`]s and lifts cleaned tables into the typed records the
//! dimension builders and snapshot generators consume.

use std::fs::File;
use std::path::Path;

use etl_core::error::{EtlError, Result};
use etl_core::models::{CustomerRecord, SubscriptionRecord, UsageLogRecord};
use etl_core::table::{Cell, Table};
use etl_core::time_utils::{parse_date, parse_optional_date};
use tracing::debug;

// ── Fixed extract names ───────────────────────────────────────────────────────

pub const CUSTOMERS_FILE: &str = "customers.csv";
pub const SUPPORT_TICKETS_FILE: &str = "support_tickets.csv";
pub const USAGE_LOGS_FILE: &str = "usage_logs.csv";
pub const SUBSCRIPTIONS_FILE: &str = "subscriptions.csv";
pub const PRODUCT_FEATURES_FILE: &str = "product_features.csv";

/// The five raw source extracts of one run, loaded fully into memory.
#[derive(Debug, Clone)]
pub struct SourceTables {
    pub customers: Table,
    pub support_tickets: Table,
    pub usage_logs: Table,
    pub subscriptions: Table,
    pub product_features: Table,
}

// ── CSV reading ───────────────────────────────────────────────────────────────

/// Read one delimited-text file into a [`Table`].
///
/// Header names become text columns; empty fields become missing cells.
/// Short rows are padded with missing cells and long rows truncated, so
/// every row matches the header width. A missing or unreadable file is
/// fatal ([`EtlError::FileRead`]).
pub fn read_table(path: &Path) -> Result<Table> {
    let file = File::open(path).map_err(|source| EtlError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| EtlError::CsvParse(e.to_string()))?
        .clone();
    let width = headers.len();

    let mut table = Table::with_text_columns(headers.iter());
    for record in reader.records() {
        let record = record.map_err(|e| EtlError::CsvParse(e.to_string()))?;
        let mut row: Vec<Cell> = record
            .iter()
            .take(width)
            .map(|field| {
                if field.is_empty() {
                    None
                } else {
                    Some(field.to_string())
                }
            })
            .collect();
        row.resize(width, None);
        table.push_row(row);
    }

    debug!(
        "read {}: {} rows, {} columns",
        path.display(),
        table.row_count(),
        table.column_count()
    );
    Ok(table)
}

/// Load all five raw extracts from `data_dir`.
///
/// Any missing file aborts the run before anything is written.
pub fn load_extracts(data_dir: &Path) -> Result<SourceTables> {
    Ok(SourceTables {
        customers: read_table(&data_dir.join(CUSTOMERS_FILE))?,
        support_tickets: read_table(&data_dir.join(SUPPORT_TICKETS_FILE))?,
        usage_logs: read_table(&data_dir.join(USAGE_LOGS_FILE))?,
        subscriptions: read_table(&data_dir.join(SUBSCRIPTIONS_FILE))?,
        product_features: read_table(&data_dir.join(PRODUCT_FEATURES_FILE))?,
    })
}

// ── Typed extraction ──────────────────────────────────────────────────────────
//
// Columns are accessed by name on cleaned tables; schemas are assumed, not
// validated, so the only structural failure is an absent column. A bad date
// is fatal for the whole run since no row-level recovery is attempted.

/// Lift the cleaned customers table into typed records.
pub fn customers_from(table: &Table) -> Result<Vec<CustomerRecord>> {
    table.require_column("customers", "customer_id")?;
    table.require_column("customers", "signup_date")?;
    table.require_column("customers", "status")?;

    let mut records = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        records.push(CustomerRecord {
            customer_id: cell_text(table, row, "customer_id"),
            signup_date: parse_date(&cell_text(table, row, "signup_date"))?,
            status: cell_text(table, row, "status"),
        });
    }
    Ok(records)
}

/// Lift the cleaned subscriptions table into typed records.
pub fn subscriptions_from(table: &Table) -> Result<Vec<SubscriptionRecord>> {
    table.require_column("subscriptions", "customer_id")?;
    table.require_column("subscriptions", "plan")?;
    table.require_column("subscriptions", "status")?;
    table.require_column("subscriptions", "start_date")?;
    table.require_column("subscriptions", "end_date")?;

    let mut records = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        records.push(SubscriptionRecord {
            customer_id: cell_text(table, row, "customer_id"),
            plan: cell_text(table, row, "plan"),
            status: cell_text(table, row, "status"),
            start_date: parse_date(&cell_text(table, row, "start_date"))?,
            end_date: parse_optional_date(table.get(row, "end_date"))?,
        });
    }
    Ok(records)
}

/// Lift the cleaned usage-log table into typed records.
///
/// An empty duration counts as zero minutes; anything else must be numeric.
pub fn usage_logs_from(table: &Table) -> Result<Vec<UsageLogRecord>> {
    table.require_column("usage_logs", "log_id")?;
    table.require_column("usage_logs", "customer_id")?;
    table.require_column("usage_logs", "log_date")?;
    table.require_column("usage_logs", "duration_minutes")?;

    let mut records = Vec::with_capacity(table.row_count());
    for row in 0..table.row_count() {
        let raw_duration = cell_text(table, row, "duration_minutes");
        let duration_minutes = if raw_duration.trim().is_empty() {
            0.0
        } else {
            raw_duration
                .trim()
                .parse::<f64>()
                .map_err(|_| EtlError::NumberParse(raw_duration.clone()))?
        };

        records.push(UsageLogRecord {
            log_id: cell_text(table, row, "log_id"),
            customer_id: cell_text(table, row, "customer_id"),
            log_date: parse_date(&cell_text(table, row, "log_date"))?,
            duration_minutes,
        });
    }
    Ok(records)
}

fn cell_text(table: &Table, row: usize, column: &str) -> String {
    table.get(row, column).unwrap_or_default().to_string()
}
