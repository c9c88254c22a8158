use std::collections::HashMap;

use crate::plans::PlanType;

// ── Default monthly prices (USD) ──────────────────────────────────────────────

const BASIC_MONTHLY: u32 = 50;
const PRO_MONTHLY: u32 = 100;
const ENTERPRISE_MONTHLY: u32 = 200;

/// Build the default plan price map keyed by canonical plan label.
fn default_price_map() -> HashMap<String, u32> {
    let mut map = HashMap::new();
    map.insert(PlanType::Basic.as_str().to_string(), BASIC_MONTHLY);
    map.insert(PlanType::Pro.as_str().to_string(), PRO_MONTHLY);
    map.insert(PlanType::Enterprise.as_str().to_string(), ENTERPRISE_MONTHLY);
    map
}

/// Monthly revenue lookup for subscription plans.
///
/// Revenue is a pure function of the plan label; plan strings that are not
/// in the table are worth 0, so an unrecognised tier never contributes
/// revenue rather than failing the snapshot run.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    /// Plan label → monthly price in whole dollars.
    prices: HashMap<String, u32>,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new(None)
    }
}

impl PriceTable {
    /// Create a price table.
    ///
    /// Pass `Some(map)` to override individual plan prices; entries not
    /// present in `overrides` fall back to the built-in defaults.
    pub fn new(overrides: Option<HashMap<String, u32>>) -> Self {
        let mut prices = default_price_map();
        if let Some(extra) = overrides {
            for (k, v) in extra {
                prices.insert(k, v);
            }
        }
        Self { prices }
    }

    /// Monthly revenue for `plan`, or 0 when the plan label is unknown.
    pub fn monthly_revenue(&self, plan: &str) -> u32 {
        self.prices.get(plan).copied().unwrap_or(0)
    }
}
