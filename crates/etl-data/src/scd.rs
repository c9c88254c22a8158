//! Type II dimension building.
//!
//! Both builders follow the same discipline: one open baseline version per
//! identity, then each change event closes the currently open version at
//! the change date and appends an open successor. The result is a chain of
//! versions with disjoint, ordered validity intervals in which exactly one
//! version per identity stays current.

use std::collections::HashMap;

use etl_core::models::{
    CustomerRecord, CustomerVersion, SubscriptionRecord, SubscriptionVersion,
};
use tracing::warn;

use crate::synth::{PlanChange, StatusChange};

// ── Customer dimension ────────────────────────────────────────────────────────

/// Build the versioned customer dimension from cleaned records plus status
/// change events.
///
/// The baseline version starts at the signup date and stays open until a
/// change supersedes it. Changes for unknown customers, and changes that do
/// not move forward in time within a chain, are skipped with a warning.
pub fn customer_dimension(
    records: &[CustomerRecord],
    changes: &[StatusChange],
) -> Vec<CustomerVersion> {
    let mut chains: Vec<Vec<CustomerVersion>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        if index.contains_key(&record.customer_id) {
            warn!(
                "duplicate customer record for {}; keeping the first",
                record.customer_id
            );
            continue;
        }
        index.insert(record.customer_id.clone(), chains.len());
        chains.push(vec![CustomerVersion {
            customer_id: record.customer_id.clone(),
            signup_date: record.signup_date,
            status: record.status.clone(),
            effective_start: record.signup_date,
            effective_end: None,
            is_current: true,
        }]);
    }

    for change in sorted_by_date(changes, |c| c.changed_on) {
        let Some(&slot) = index.get(&change.customer_id) else {
            warn!(
                "status change for unknown customer {}; skipped",
                change.customer_id
            );
            continue;
        };
        let chain = &mut chains[slot];
        let open = chain.last_mut().expect("every chain has a baseline");
        if change.changed_on <= open.effective_start {
            warn!(
                "non-monotonic status change for {} on {}; skipped",
                change.customer_id, change.changed_on
            );
            continue;
        }

        open.effective_end = Some(change.changed_on);
        open.is_current = false;
        let successor = CustomerVersion {
            customer_id: open.customer_id.clone(),
            signup_date: open.signup_date,
            status: change.new_status.clone(),
            effective_start: change.changed_on,
            effective_end: None,
            is_current: true,
        };
        chain.push(successor);
    }

    chains.into_iter().flatten().collect()
}

// ── Subscription dimension ────────────────────────────────────────────────────

/// Build the versioned subscription dimension from cleaned records plus plan
/// change events.
///
/// Output is the union of (possibly-closed) baseline versions and the
/// successors created by plan changes, chain by chain in record order.
pub fn subscription_dimension(
    records: &[SubscriptionRecord],
    changes: &[PlanChange],
) -> Vec<SubscriptionVersion> {
    let mut chains: Vec<Vec<SubscriptionVersion>> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for record in records {
        if index.contains_key(&record.customer_id) {
            warn!(
                "duplicate subscription record for {}; keeping the first",
                record.customer_id
            );
            continue;
        }
        index.insert(record.customer_id.clone(), chains.len());
        chains.push(vec![SubscriptionVersion {
            customer_id: record.customer_id.clone(),
            plan: record.plan.clone(),
            status: record.status.clone(),
            start_date: record.start_date,
            end_date: record.end_date,
            effective_start: record.start_date,
            effective_end: None,
            is_current: true,
        }]);
    }

    for change in sorted_by_date(changes, |c| c.changed_on) {
        let Some(&slot) = index.get(&change.customer_id) else {
            warn!(
                "plan change for unknown subscription {}; skipped",
                change.customer_id
            );
            continue;
        };
        let chain = &mut chains[slot];
        let open = chain.last_mut().expect("every chain has a baseline");
        if change.changed_on <= open.effective_start {
            warn!(
                "non-monotonic plan change for {} on {}; skipped",
                change.customer_id, change.changed_on
            );
            continue;
        }

        open.effective_end = Some(change.changed_on);
        open.is_current = false;
        let successor = SubscriptionVersion {
            customer_id: open.customer_id.clone(),
            plan: change.new_plan.clone(),
            status: open.status.clone(),
            start_date: open.start_date,
            end_date: open.end_date,
            effective_start: change.changed_on,
            effective_end: None,
            is_current: true,
        };
        chain.push(successor);
    }

    chains.into_iter().flatten().collect()
}

/// Clone and order change events by date, keeping input order within a day
/// so application is deterministic.
fn sorted_by_date<T: Clone>(changes: &[T], date_of: impl Fn(&T) -> chrono::NaiveDate) -> Vec<T> {
    let mut sorted = changes.to_vec();
    sorted.sort_by_key(|c| date_of(c));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::collections::HashMap;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn customer(id: &str, signup: NaiveDate) -> CustomerRecord {
        CustomerRecord {
            customer_id: id.to_string(),
            signup_date: signup,
            status: "Active".to_string(),
        }
    }

    fn subscription(id: &str, plan: &str, start: NaiveDate) -> SubscriptionRecord {
        SubscriptionRecord {
            customer_id: id.to_string(),
            plan: plan.to_string(),
            status: "active".to_string(),
            start_date: start,
            end_date: None,
        }
    }

    fn status_change(id: &str, status: &str, on: NaiveDate) -> StatusChange {
        StatusChange {
            customer_id: id.to_string(),
            new_status: status.to_string(),
            changed_on: on,
        }
    }

    fn plan_change(id: &str, plan: &str, on: NaiveDate) -> PlanChange {
        PlanChange {
            customer_id: id.to_string(),
            new_plan: plan.to_string(),
            changed_on: on,
        }
    }

    /// Chain-integrity assertions shared by both dimensions.
    fn assert_chain_integrity(versions: &[(String, NaiveDate, Option<NaiveDate>, bool)]) {
        let mut by_id: HashMap<&str, Vec<&(String, NaiveDate, Option<NaiveDate>, bool)>> =
            HashMap::new();
        for v in versions {
            by_id.entry(v.0.as_str()).or_default().push(v);
        }
        for (_, chain) in by_id {
            let open: Vec<_> = chain.iter().filter(|v| v.2.is_none()).collect();
            assert_eq!(open.len(), 1, "exactly one open version per identity");
            assert!(open[0].3, "the open version is current");
            for window in chain.windows(2) {
                assert_eq!(
                    window[0].2,
                    Some(window[1].1),
                    "closed end must equal successor start"
                );
                assert!(!window[0].3, "superseded versions are not current");
            }
        }
    }

    fn customer_tuples(versions: &[CustomerVersion]) -> Vec<(String, NaiveDate, Option<NaiveDate>, bool)> {
        versions
            .iter()
            .map(|v| {
                (
                    v.customer_id.clone(),
                    v.effective_start,
                    v.effective_end,
                    v.is_current,
                )
            })
            .collect()
    }

    fn subscription_tuples(
        versions: &[SubscriptionVersion],
    ) -> Vec<(String, NaiveDate, Option<NaiveDate>, bool)> {
        versions
            .iter()
            .map(|v| {
                (
                    v.customer_id.clone(),
                    v.effective_start,
                    v.effective_end,
                    v.is_current,
                )
            })
            .collect()
    }

    // ── customer baseline ─────────────────────────────────────────────────

    #[test]
    fn test_customer_baseline_open_version() {
        let versions = customer_dimension(&[customer("C001", d(2023, 6, 1))], &[]);
        assert_eq!(versions.len(), 1);
        let v = &versions[0];
        assert_eq!(v.effective_start, d(2023, 6, 1));
        assert_eq!(v.effective_end, None);
        assert!(v.is_current);
        assert_eq!(v.status, "Active");
    }

    #[test]
    fn test_customer_change_closes_baseline() {
        let versions = customer_dimension(
            &[customer("C001", d(2023, 6, 1))],
            &[status_change("C001", "Cancelled", d(2023, 11, 28))],
        );
        assert_eq!(versions.len(), 2);

        let baseline = &versions[0];
        assert_eq!(baseline.effective_end, Some(d(2023, 11, 28)));
        assert!(!baseline.is_current);
        assert_eq!(baseline.status, "Active");

        let successor = &versions[1];
        assert_eq!(successor.effective_start, d(2023, 11, 28));
        assert_eq!(successor.effective_end, None);
        assert!(successor.is_current);
        assert_eq!(successor.status, "Cancelled");
        assert_eq!(successor.signup_date, d(2023, 6, 1));
    }

    #[test]
    fn test_customer_two_changes_chain() {
        let versions = customer_dimension(
            &[customer("C001", d(2023, 1, 1))],
            &[
                status_change("C001", "Suspended", d(2023, 4, 1)),
                status_change("C001", "Cancelled", d(2023, 9, 1)),
            ],
        );
        assert_eq!(versions.len(), 3);
        assert_chain_integrity(&customer_tuples(&versions));
        assert_eq!(versions[2].status, "Cancelled");
    }

    #[test]
    fn test_customer_changes_applied_in_date_order() {
        // Events arrive out of order; chains must still be monotonic.
        let versions = customer_dimension(
            &[customer("C001", d(2023, 1, 1))],
            &[
                status_change("C001", "Cancelled", d(2023, 9, 1)),
                status_change("C001", "Suspended", d(2023, 4, 1)),
            ],
        );
        assert_eq!(versions.len(), 3);
        assert_eq!(versions[1].status, "Suspended");
        assert_eq!(versions[2].status, "Cancelled");
        assert_chain_integrity(&customer_tuples(&versions));
    }

    #[test]
    fn test_customer_change_for_unknown_id_is_skipped() {
        let versions = customer_dimension(
            &[customer("C001", d(2023, 6, 1))],
            &[status_change("C999", "Cancelled", d(2023, 11, 28))],
        );
        assert_eq!(versions.len(), 1);
        assert!(versions[0].is_current);
    }

    #[test]
    fn test_customer_backdated_change_is_skipped() {
        let versions = customer_dimension(
            &[customer("C001", d(2023, 6, 1))],
            &[status_change("C001", "Cancelled", d(2023, 1, 1))],
        );
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].effective_end, None);
    }

    #[test]
    fn test_customer_duplicate_record_keeps_first() {
        let mut second = customer("C001", d(2024, 1, 1));
        second.status = "Trial".to_string();
        let versions = customer_dimension(&[customer("C001", d(2023, 6, 1)), second], &[]);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].signup_date, d(2023, 6, 1));
        assert_eq!(versions[0].status, "Active");
    }

    // ── subscription dimension ────────────────────────────────────────────

    #[test]
    fn test_subscription_baseline_open_version() {
        let versions = subscription_dimension(&[subscription("C001", "Basic", d(2024, 1, 1))], &[]);
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].plan, "Basic");
        assert_eq!(versions[0].effective_start, d(2024, 1, 1));
        assert!(versions[0].is_current);
    }

    #[test]
    fn test_subscription_plan_change_chain() {
        let versions = subscription_dimension(
            &[subscription("C001", "Basic", d(2024, 1, 1))],
            &[plan_change("C001", "Pro", d(2024, 6, 29))],
        );
        assert_eq!(versions.len(), 2);

        let baseline = &versions[0];
        assert_eq!(baseline.plan, "Basic");
        assert_eq!(baseline.effective_end, Some(d(2024, 6, 29)));
        assert!(!baseline.is_current);

        let successor = &versions[1];
        assert_eq!(successor.plan, "Pro");
        assert_eq!(successor.effective_start, d(2024, 6, 29));
        assert_eq!(successor.effective_end, None);
        assert!(successor.is_current);
        // Source subscription fields ride along unchanged.
        assert_eq!(successor.start_date, d(2024, 1, 1));
        assert_eq!(successor.status, "active");
    }

    #[test]
    fn test_subscription_chain_integrity_many() {
        let records = vec![
            subscription("C001", "Basic", d(2024, 1, 1)),
            subscription("C002", "Pro", d(2024, 2, 1)),
            subscription("C003", "Enterprise", d(2024, 3, 1)),
        ];
        let changes = vec![
            plan_change("C001", "Pro", d(2024, 6, 29)),
            plan_change("C003", "Enterprise", d(2024, 8, 28)),
        ];
        let versions = subscription_dimension(&records, &changes);
        assert_eq!(versions.len(), 5);
        assert_chain_integrity(&subscription_tuples(&versions));
        // Unchanged subscription keeps a single open version.
        let c2: Vec<_> = versions.iter().filter(|v| v.customer_id == "C002").collect();
        assert_eq!(c2.len(), 1);
        assert!(c2[0].is_current);
    }

    #[test]
    fn test_subscription_change_for_unknown_id_is_skipped() {
        let versions = subscription_dimension(
            &[subscription("C001", "Basic", d(2024, 1, 1))],
            &[plan_change("C404", "Pro", d(2024, 6, 29))],
        );
        assert_eq!(versions.len(), 1);
    }
}
