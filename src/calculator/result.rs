//! Calculation output structures
//!
//! Warnings are carried as data on the result rather than living only in
//! log output, so callers and tests can assert on them directly.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Non-fatal issue encountered while costing one plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CalcWarning {
    /// A usage-profile service has no price-table entry; costed at $0
    MissingPrice { usage_key: String, price_key: String },

    /// No benefit rule matched after all fallbacks; costed at $0
    UnresolvedBenefit { usage_key: String },

    /// The resolved rule is neither copay nor coinsurance; costed at $0
    UnknownBenefitType { usage_key: String },
}

impl fmt::Display for CalcWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalcWarning::MissingPrice { usage_key, price_key } => write!(
                f,
                "no market cost found for '{}' (from usage '{}'), skipping",
                price_key, usage_key
            ),
            CalcWarning::UnresolvedBenefit { usage_key } => {
                write!(f, "no benefit rule found for '{}', assuming $0 cost", usage_key)
            }
            CalcWarning::UnknownBenefitType { usage_key } => {
                write!(f, "unknown benefit type for '{}', treating as $0 cost", usage_key)
            }
        }
    }
}

/// Complete cost breakdown for one plan.
///
/// All currency fields are rounded to cents at this boundary; internal
/// accumulation runs at full precision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostResult {
    /// Plan identity carried through from the contract
    pub plan_name: String,
    pub plan_code: String,

    /// Premium plus capped variable spend
    pub total_annual_cost: f64,

    /// Annualized premium (bi-weekly premium over 26 pay periods)
    pub premium_cost: f64,

    /// Variable spend after the out-of-pocket cap
    pub medical_drug_spend: f64,

    /// Deductible consumed during this calculation
    pub deductible_paid: f64,

    /// Variable spend before the out-of-pocket cap
    pub variable_cost_raw: f64,

    /// Per-service costs in usage-profile order
    pub usage_breakdown: IndexMap<String, f64>,

    /// Non-fatal issues encountered while costing this plan
    #[serde(default)]
    pub warnings: Vec<CalcWarning>,
}
