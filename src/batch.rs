//! Batch calculation and ranking across plans
//!
//! Each plan's calculation owns its own deductible state, so plans run in
//! parallel; services within one plan never do. A plan that fails
//! validation is dropped from the results and the batch continues.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calculator::{CostEngine, CostResult};
use crate::needs::UserNeeds;
use crate::plan::PlanContract;

/// One plan's result with its position in the cost ranking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPlan {
    /// 1-based rank, cheapest first; ties keep input order
    pub rank: usize,

    #[serde(flatten)]
    pub result: CostResult,
}

/// A plan dropped at the batch boundary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanFailure {
    pub plan_name: String,
    pub error: String,
}

/// Outcome of a batch run: whichever plans succeeded, ranked, plus the
/// failures that were dropped along the way
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub ranked: Vec<RankedPlan>,
    pub failures: Vec<PlanFailure>,
}

impl BatchOutcome {
    /// Total calculation warnings across all ranked plans
    pub fn warning_count(&self) -> usize {
        self.ranked.iter().map(|p| p.result.warnings.len()).sum()
    }
}

/// Batch driver owning the validated user needs (via its engine)
pub struct BatchRunner {
    engine: CostEngine,
}

impl BatchRunner {
    pub fn new(needs: UserNeeds) -> Self {
        Self {
            engine: CostEngine::new(needs),
        }
    }

    /// Calculate and rank every plan in the listing.
    ///
    /// Ranking is by total annual cost ascending with a stable sort, so
    /// plans with identical totals keep their input order.
    pub fn run(&self, plans: &[PlanContract]) -> BatchOutcome {
        let mut failures = Vec::new();

        let valid: Vec<&PlanContract> = plans
            .iter()
            .filter_map(|plan| match plan.validate() {
                Ok(()) => Some(plan),
                Err(e) => {
                    log::error!("dropping plan from batch: {}", e);
                    failures.push(PlanFailure {
                        plan_name: plan.plan_name.clone(),
                        error: e.to_string(),
                    });
                    None
                }
            })
            .collect();

        log::info!("starting batch cost calculation for {} plans", valid.len());

        let mut results: Vec<CostResult> = valid
            .par_iter()
            .map(|plan| self.engine.calculate_total_cost(plan))
            .collect();

        results.sort_by(|a, b| a.total_annual_cost.total_cmp(&b.total_annual_cost));

        let ranked = results
            .into_iter()
            .enumerate()
            .map(|(idx, result)| RankedPlan {
                rank: idx + 1,
                result,
            })
            .collect();

        BatchOutcome { ranked, failures }
    }
}
