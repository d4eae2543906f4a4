//! Plan Cost Analyzer CLI
//!
//! Loads the user needs configuration and a plan listing, calculates every
//! plan's total annual cost, and writes a ranked CSV report.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use log::info;

use plan_cost_analyzer::calculator::resolver::validate_usage_price_pairing;
use plan_cost_analyzer::needs::{load_user_needs, DEFAULT_USER_NEEDS_PATH};
use plan_cost_analyzer::plan::load_plans;
use plan_cost_analyzer::report::{print_summary, print_top_plans, write_ranked_csv, RunSummary};
use plan_cost_analyzer::BatchRunner;

#[derive(Debug, Parser)]
#[command(name = "plan_cost_analyzer", about = "Health plan cost analyzer", version)]
struct Args {
    /// Enable debug logging
    #[arg(long)]
    debug: bool,

    /// Path to the user needs configuration file
    #[arg(long, default_value = DEFAULT_USER_NEEDS_PATH)]
    user_needs: PathBuf,

    /// Path to the plan listing file
    #[arg(long, default_value = "data/plans.json")]
    plans: PathBuf,

    /// Path to the output CSV file
    #[arg(long, default_value = "output/ranked_plans.csv")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.debug {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.init();

    println!("Plan Cost Analyzer v{}", env!("CARGO_PKG_VERSION"));
    println!("=======================\n");

    // Step 1: load and validate configuration (fatal on any problem)
    info!("[Step 1/3] Loading configurations...");
    let needs = load_user_needs(&args.user_needs)
        .with_context(|| format!("loading user needs from {}", args.user_needs.display()))?;

    println!("Usage Profile:");
    for (service, quantity) in &needs.usage_profile {
        if *quantity > 0.0 {
            println!("  - {}: {}", service, quantity);
        }
    }
    println!();

    for gap in validate_usage_price_pairing(&needs.usage_profile, &needs.standard_costs) {
        log::warn!("{}", gap);
    }

    let listing = load_plans(&args.plans)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("loading plans from {}", args.plans.display()))?;
    if listing.skipped > 0 {
        log::warn!("{} malformed plan records were skipped", listing.skipped);
    }
    anyhow::ensure!(!listing.plans.is_empty(), "no plans were loaded, nothing to calculate");
    println!("Loaded {} plans.\n", listing.plans.len());

    // Step 2: calculate and rank
    info!("[Step 2/3] Calculating costs for all plans...");
    let runner = BatchRunner::new(needs.clone());
    let outcome = runner.run(&listing.plans);
    anyhow::ensure!(!outcome.ranked.is_empty(), "no plans were successfully calculated");

    // Step 3: save and display
    info!("[Step 3/3] Saving results...");
    if let Some(parent) = args.output.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating output directory {}", parent.display()))?;
        }
    }
    write_ranked_csv(&args.output, &outcome, &needs.usage_profile)
        .map_err(|e| anyhow::anyhow!("{}", e))
        .with_context(|| format!("writing report to {}", args.output.display()))?;

    print_top_plans(&outcome, 10);

    let summary = RunSummary::from_outcome(&outcome);
    print_summary(&summary);

    println!("\nFull results written to: {}", args.output.display());

    Ok(())
}
