//! Seeded synthesis of plausible dimension changes for demo data.
//!
//! Real deployments feed the SCD builders authoritative change events from
//! upstream systems. The demo extracts carry none, so this module invents
//! some: a small fraction of customers cancel, a small fraction get a
//! historical version, a fraction of subscriptions change plan. Everything
//! is driven by an explicitly seeded RNG so a run is reproducible, and none
//! of this logic leaks into the derivation path in `scd`.

use std::collections::HashSet;

use chrono::NaiveDate;
use etl_core::models::{CustomerRecord, SubscriptionRecord};
use etl_core::plans::upgraded_plan_name;
use etl_core::time_utils::add_days;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::debug;

/// Days after the baseline start at which a simulated change takes effect.
pub const CHANGE_OFFSET_DAYS: i64 = 180;

/// Status label applied by simulated cancellations.
pub const CANCELLED_STATUS: &str = "Cancelled";

// ── Change events ─────────────────────────────────────────────────────────────

/// An authoritative-style customer status change.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusChange {
    pub customer_id: String,
    pub new_status: String,
    pub changed_on: NaiveDate,
}

/// An authoritative-style subscription plan change.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanChange {
    pub customer_id: String,
    pub new_plan: String,
    pub changed_on: NaiveDate,
}

// ── ChangeSimulator ───────────────────────────────────────────────────────────

/// Generates change events from a seeded RNG.
pub struct ChangeSimulator {
    rng: StdRng,
}

impl ChangeSimulator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Simulate customer status history.
    ///
    /// A `cancel_rate` fraction of customers (exact count `⌊n·rate⌋`) is
    /// cancelled, and an independently sampled `version_rate` fraction gets
    /// a status-refresh event that forces a new version without altering
    /// the status. Both take effect [`CHANGE_OFFSET_DAYS`] after signup. A
    /// customer drawn by both samples only cancels.
    ///
    /// Events come back in input-record order.
    pub fn status_changes(
        &mut self,
        customers: &[CustomerRecord],
        cancel_rate: f64,
        version_rate: f64,
    ) -> Vec<StatusChange> {
        let cancelled = self.sample_indices(customers.len(), cancel_rate);
        let refreshed = self.sample_indices(customers.len(), version_rate);

        let mut changes = Vec::new();
        for (idx, record) in customers.iter().enumerate() {
            let new_status = if cancelled.contains(&idx) {
                CANCELLED_STATUS.to_string()
            } else if refreshed.contains(&idx) {
                record.status.clone()
            } else {
                continue;
            };
            changes.push(StatusChange {
                customer_id: record.customer_id.clone(),
                new_status,
                changed_on: add_days(record.signup_date, CHANGE_OFFSET_DAYS),
            });
        }

        debug!(
            "simulated {} customer status changes from {} records",
            changes.len(),
            customers.len()
        );
        changes
    }

    /// Simulate plan upgrades for a `rate` fraction of subscriptions,
    /// effective [`CHANGE_OFFSET_DAYS`] after the subscription start.
    ///
    /// Events come back in input-record order.
    pub fn plan_changes(
        &mut self,
        subscriptions: &[SubscriptionRecord],
        rate: f64,
    ) -> Vec<PlanChange> {
        let changed = self.sample_indices(subscriptions.len(), rate);

        let mut changes = Vec::new();
        for (idx, record) in subscriptions.iter().enumerate() {
            if !changed.contains(&idx) {
                continue;
            }
            changes.push(PlanChange {
                customer_id: record.customer_id.clone(),
                new_plan: upgraded_plan_name(&record.plan).to_string(),
                changed_on: add_days(record.start_date, CHANGE_OFFSET_DAYS),
            });
        }

        debug!(
            "simulated {} plan changes from {} records",
            changes.len(),
            subscriptions.len()
        );
        changes
    }

    /// Draw `⌊len · rate⌋` distinct indices.
    fn sample_indices(&mut self, len: usize, rate: f64) -> HashSet<usize> {
        let amount = ((len as f64) * rate).floor() as usize;
        rand::seq::index::sample(&mut self.rng, len, amount)
            .into_iter()
            .collect()
    }
}
