//! Plan contract data structures, rule classification, and listing loader

pub mod classify;
mod data;
pub mod loader;

pub use classify::classify_benefit_text;
pub use data::{BenefitRule, PlanContract, PlanError};
pub use loader::{load_plans, load_plans_from_reader, PlanLoadReport};
