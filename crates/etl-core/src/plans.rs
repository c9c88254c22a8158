use crate::error::{EtlError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Subscription plan tiers carried by the subscriptions extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanType {
    Basic,
    Pro,
    Enterprise,
}

impl FromStr for PlanType {
    type Err = EtlError;

    /// Case-insensitive construction from a string slice.
    ///
    /// Accepts `"basic"`, `"pro"` and `"enterprise"` (case-insensitive).
    /// Returns [`EtlError::InvalidPlan`] for unrecognised strings.
    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_lowercase().as_str() {
            "basic" => Ok(PlanType::Basic),
            "pro" => Ok(PlanType::Pro),
            "enterprise" => Ok(PlanType::Enterprise),
            other => Err(EtlError::InvalidPlan(other.to_string())),
        }
    }
}

impl PlanType {
    /// The canonical capitalised plan label as it appears in the extracts
    /// and in warehouse tables.
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Basic => "Basic",
            PlanType::Pro => "Pro",
            PlanType::Enterprise => "Enterprise",
        }
    }

    /// The tier a plan moves to when a simulated upgrade fires:
    /// Basic goes to Pro, everything else lands on Enterprise.
    pub fn upgraded(&self) -> PlanType {
        match self {
            PlanType::Basic => PlanType::Pro,
            _ => PlanType::Enterprise,
        }
    }
}

/// String-level upgrade remap used by the change simulator.
///
/// Plan strings that do not parse as a known tier also land on
/// `"Enterprise"`, matching the simulator's blunt everything-else rule.
pub fn upgraded_plan_name(plan: &str) -> &'static str {
    match plan.parse::<PlanType>() {
        Ok(p) => p.upgraded().as_str(),
        Err(_) => PlanType::Enterprise.as_str(),
    }
}
