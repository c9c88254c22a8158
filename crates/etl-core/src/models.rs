use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::table::{Cell, Column, Table};
use crate::time_utils::month_key;

// ── Source records ────────────────────────────────────────────────────────────

/// One customer row from the cleaned customers extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub customer_id: String,
    pub signup_date: NaiveDate,
    pub status: String,
}

/// One subscription row from the cleaned subscriptions extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub customer_id: String,
    pub plan: String,
    pub status: String,
    pub start_date: NaiveDate,
    /// Open-ended subscriptions carry no end date.
    pub end_date: Option<NaiveDate>,
}

/// One event row from the cleaned usage-log extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLogRecord {
    pub log_id: String,
    pub customer_id: String,
    pub log_date: NaiveDate,
    pub duration_minutes: f64,
}

// ── Dimension versions ────────────────────────────────────────────────────────

/// A versioned customer dimension row with its validity interval.
///
/// A customer's history is a chain of these: every superseded version is
/// closed (`effective_end` set, `is_current` false) and exactly one version
/// per customer stays open.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerVersion {
    pub customer_id: String,
    pub signup_date: NaiveDate,
    pub status: String,
    pub effective_start: NaiveDate,
    pub effective_end: Option<NaiveDate>,
    pub is_current: bool,
}

/// A versioned subscription dimension row with its validity interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionVersion {
    pub customer_id: String,
    pub plan: String,
    pub status: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub effective_start: NaiveDate,
    pub effective_end: Option<NaiveDate>,
    pub is_current: bool,
}

// ── Snapshot facts ────────────────────────────────────────────────────────────

/// One revenue fact row: a (customer, month) pair with the plan that was
/// active in that month and its monthly price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevenueRow {
    pub customer_id: String,
    /// Month label in `"%Y-%m"` form.
    pub month: String,
    pub plan: String,
    pub status: String,
    pub monthly_revenue: u32,
}

/// One usage fact row: summed event duration and event count for a
/// (customer, month) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRow {
    pub customer_id: String,
    /// Month label in `"%Y-%m"` form.
    pub month: String,
    pub duration_minutes: f64,
    pub activity_count: u32,
}

// ── Table conversions ─────────────────────────────────────────────────────────
//
// Derived tables declare their column types so the warehouse schema is
// predictable regardless of what the source extracts looked like. Open
// effective/end dates become missing cells, which the loader binds as NULL.

fn date_cell(date: NaiveDate) -> Cell {
    Some(date.format("%Y-%m-%d").to_string())
}

fn optional_date_cell(date: Option<NaiveDate>) -> Cell {
    date.map(|d| d.format("%Y-%m-%d").to_string())
}

fn bool_cell(value: bool) -> Cell {
    Some(if value { "1" } else { "0" }.to_string())
}

/// The `dim_customer` table.
pub fn customer_dimension_table(versions: &[CustomerVersion]) -> Table {
    let mut table = Table::new(vec![
        Column::text("customer_id"),
        Column::date("signup_date"),
        Column::text("status"),
        Column::date("effective_start"),
        Column::date("effective_end"),
        Column::integer("is_current"),
    ]);
    for v in versions {
        table.push_row(vec![
            Some(v.customer_id.clone()),
            date_cell(v.signup_date),
            Some(v.status.clone()),
            date_cell(v.effective_start),
            optional_date_cell(v.effective_end),
            bool_cell(v.is_current),
        ]);
    }
    table
}

/// The `dim_subscription` table.
pub fn subscription_dimension_table(versions: &[SubscriptionVersion]) -> Table {
    let mut table = Table::new(vec![
        Column::text("customer_id"),
        Column::text("plan"),
        Column::text("status"),
        Column::date("start_date"),
        Column::date("end_date"),
        Column::date("effective_start"),
        Column::date("effective_end"),
        Column::integer("is_current"),
    ]);
    for v in versions {
        table.push_row(vec![
            Some(v.customer_id.clone()),
            Some(v.plan.clone()),
            Some(v.status.clone()),
            date_cell(v.start_date),
            optional_date_cell(v.end_date),
            date_cell(v.effective_start),
            optional_date_cell(v.effective_end),
            bool_cell(v.is_current),
        ]);
    }
    table
}

/// The `usage_logs` table: the typed usage extract plus its derived month
/// label, written alongside the monthly rollup for drill-down queries.
pub fn usage_log_table(records: &[UsageLogRecord]) -> Table {
    let mut table = Table::new(vec![
        Column::text("log_id"),
        Column::text("customer_id"),
        Column::date("log_date"),
        Column::real("duration_minutes"),
        Column::text("month"),
    ]);
    for r in records {
        table.push_row(vec![
            Some(r.log_id.clone()),
            Some(r.customer_id.clone()),
            date_cell(r.log_date),
            Some(r.duration_minutes.to_string()),
            Some(month_key(r.log_date)),
        ]);
    }
    table
}

/// The `fact_usage_snapshot` table.
pub fn usage_snapshot_table(rows: &[UsageRow]) -> Table {
    let mut table = Table::new(vec![
        Column::text("customer_id"),
        Column::text("month"),
        Column::real("duration_minutes"),
        Column::integer("activity_count"),
    ]);
    for r in rows {
        table.push_row(vec![
            Some(r.customer_id.clone()),
            Some(r.month.clone()),
            Some(r.duration_minutes.to_string()),
            Some(r.activity_count.to_string()),
        ]);
    }
    table
}

/// The `fact_revenue_snapshot` table.
pub fn revenue_snapshot_table(rows: &[RevenueRow]) -> Table {
    let mut table = Table::new(vec![
        Column::text("customer_id"),
        Column::text("month"),
        Column::text("plan"),
        Column::text("status"),
        Column::integer("monthly_revenue"),
    ]);
    for r in rows {
        table.push_row(vec![
            Some(r.customer_id.clone()),
            Some(r.month.clone()),
            Some(r.plan.clone()),
            Some(r.status.clone()),
            Some(r.monthly_revenue.to_string()),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::ColumnType;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn version(open: bool) -> CustomerVersion {
        CustomerVersion {
            customer_id: "C001".to_string(),
            signup_date: d(2023, 6, 1),
            status: "Active".to_string(),
            effective_start: d(2023, 6, 1),
            effective_end: if open { None } else { Some(d(2023, 11, 28)) },
            is_current: open,
        }
    }

    // ── customer_dimension_table ──────────────────────────────────────────

    #[test]
    fn test_customer_dimension_table_columns() {
        let table = customer_dimension_table(&[]);
        let names: Vec<&str> = table.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "customer_id",
                "signup_date",
                "status",
                "effective_start",
                "effective_end",
                "is_current"
            ]
        );
        assert_eq!(table.columns[1].ty, ColumnType::Date);
        assert_eq!(table.columns[5].ty, ColumnType::Integer);
    }

    #[test]
    fn test_customer_dimension_open_version_has_null_end() {
        let table = customer_dimension_table(&[version(true)]);
        assert_eq!(table.rows[0][4], None);
        assert_eq!(table.rows[0][5].as_deref(), Some("1"));
    }

    #[test]
    fn test_customer_dimension_closed_version() {
        let table = customer_dimension_table(&[version(false)]);
        assert_eq!(table.rows[0][4].as_deref(), Some("2023-11-28"));
        assert_eq!(table.rows[0][5].as_deref(), Some("0"));
    }

    // ── usage_log_table ───────────────────────────────────────────────────

    #[test]
    fn test_usage_log_table_derives_month() {
        let record = UsageLogRecord {
            log_id: "L1".to_string(),
            customer_id: "C001".to_string(),
            log_date: d(2024, 3, 17),
            duration_minutes: 12.5,
        };
        let table = usage_log_table(&[record]);
        assert_eq!(table.get(0, "log_date"), Some("2024-03-17"));
        assert_eq!(table.get(0, "month"), Some("2024-03"));
        assert_eq!(table.get(0, "duration_minutes"), Some("12.5"));
    }

    // ── snapshot tables ───────────────────────────────────────────────────

    #[test]
    fn test_revenue_snapshot_table_row() {
        let row = RevenueRow {
            customer_id: "C001".to_string(),
            month: "2024-04".to_string(),
            plan: "Pro".to_string(),
            status: "active".to_string(),
            monthly_revenue: 100,
        };
        let table = revenue_snapshot_table(&[row]);
        assert_eq!(table.get(0, "monthly_revenue"), Some("100"));
        assert_eq!(table.get(0, "month"), Some("2024-04"));
    }

    #[test]
    fn test_usage_snapshot_table_row() {
        let row = UsageRow {
            customer_id: "C002".to_string(),
            month: "2024-03".to_string(),
            duration_minutes: 35.0,
            activity_count: 3,
        };
        let table = usage_snapshot_table(&[row]);
        assert_eq!(table.get(0, "duration_minutes"), Some("35"));
        assert_eq!(table.get(0, "activity_count"), Some("3"));
    }
}
