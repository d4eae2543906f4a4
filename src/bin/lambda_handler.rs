//! AWS Lambda handler for running plan cost calculations
//!
//! Accepts the user needs and plan listing inline as JSON and returns the
//! ranked results with a run summary.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use serde::{Deserialize, Serialize};

use plan_cost_analyzer::needs::validate_user_needs;
use plan_cost_analyzer::report::RunSummary;
use plan_cost_analyzer::{BatchRunner, PlanContract, RankedPlan, UserNeeds};

/// Input payload for one calculation request
#[derive(Debug, Deserialize)]
struct CostRequest {
    /// Usage profile and market prices
    user_needs: UserNeeds,

    /// Plan records to calculate and rank
    plans: Vec<PlanContract>,
}

/// Response payload: summary plus ranked plan rows
#[derive(Debug, Serialize)]
struct CostResponse {
    summary: RunSummary,
    plans: Vec<RankedPlan>,
}

async fn handler(event: LambdaEvent<CostRequest>) -> Result<CostResponse, Error> {
    let CostRequest { user_needs, plans } = event.payload;

    validate_user_needs(&user_needs)?;

    let runner = BatchRunner::new(user_needs);
    let outcome = runner.run(&plans);
    let summary = RunSummary::from_outcome(&outcome);

    Ok(CostResponse {
        summary,
        plans: outcome.ranked,
    })
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}
