//! Plan Cost Analyzer - annual out-of-pocket cost estimation for health plans
//!
//! This library provides:
//! - Benefit rule resolution with per-family fallback chains
//! - Deductible-aware copay/coinsurance cost accumulation
//! - Out-of-pocket capped totals with annualized premiums
//! - Batch calculation and stable cost ranking across plans
//! - Ranked CSV reporting

pub mod batch;
pub mod calculator;
pub mod needs;
pub mod plan;
pub mod report;

// Re-export commonly used types
pub use batch::{BatchOutcome, BatchRunner, RankedPlan};
pub use calculator::{CalcWarning, CostEngine, CostResult};
pub use needs::{load_user_needs, ConfigError, UserNeeds};
pub use plan::{load_plans, BenefitRule, PlanContract};
pub use report::RunSummary;
