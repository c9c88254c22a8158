//! Monthly snapshot fact generation.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use etl_core::models::{RevenueRow, SubscriptionVersion, UsageLogRecord, UsageRow};
use etl_core::pricing::PriceTable;
use etl_core::time_utils::month_key;
use tracing::debug;

// ── Revenue snapshot ──────────────────────────────────────────────────────────

/// One revenue row per (customer, month) in which a current subscription
/// version was active.
///
/// A version `v` covers month `m` when `v.effective_start <= m`, the version
/// is still open at `m` (`effective_end` absent or after `m`) and
/// `v.is_current` holds. Revenue is the price-table lookup of the version's
/// plan, zero for plans the table does not know.
///
/// Plain months × versions iteration; fine at batch scale.
pub fn revenue_snapshot(
    versions: &[SubscriptionVersion],
    months: &[NaiveDate],
    prices: &PriceTable,
) -> Vec<RevenueRow> {
    let mut rows = Vec::new();
    for &month in months {
        for v in versions {
            let open_at_month = match v.effective_end {
                None => true,
                Some(end) => end > month,
            };
            if v.effective_start <= month && open_at_month && v.is_current {
                rows.push(RevenueRow {
                    customer_id: v.customer_id.clone(),
                    month: month_key(month),
                    plan: v.plan.clone(),
                    status: v.status.clone(),
                    monthly_revenue: prices.monthly_revenue(&v.plan),
                });
            }
        }
    }

    debug!(
        "revenue snapshot: {} rows over {} months x {} versions",
        rows.len(),
        months.len(),
        versions.len()
    );
    rows
}

// ── Usage snapshot ────────────────────────────────────────────────────────────

/// One usage row per (customer, calendar month): summed event duration and
/// event count.
///
/// Grouped through a `BTreeMap` so output order is deterministic (customer,
/// then month), though nothing downstream relies on it.
pub fn usage_snapshot(records: &[UsageLogRecord]) -> Vec<UsageRow> {
    let mut groups: BTreeMap<(String, String), (f64, u32)> = BTreeMap::new();

    for record in records {
        let key = (record.customer_id.clone(), month_key(record.log_date));
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += record.duration_minutes;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((customer_id, month), (duration_minutes, activity_count))| UsageRow {
            customer_id,
            month,
            duration_minutes,
            activity_count,
        })
        .collect()
}
