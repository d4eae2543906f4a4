//! Ranked report output: CSV file, console top-N table, and run summary

use std::error::Error;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::batch::BatchOutcome;
use crate::needs::UsageProfile;

/// Aggregate statistics for one batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: DateTime<Utc>,
    pub plans_processed: usize,
    pub plans_failed: usize,
    pub warning_count: usize,
    pub min_total_cost: f64,
    pub max_total_cost: f64,
    pub median_total_cost: f64,
    pub mean_total_cost: f64,
}

impl RunSummary {
    pub fn from_outcome(outcome: &BatchOutcome) -> Self {
        let totals: Vec<f64> = outcome
            .ranked
            .iter()
            .map(|p| p.result.total_annual_cost)
            .collect();

        // Ranked results are already sorted ascending
        let median = if totals.is_empty() {
            0.0
        } else if totals.len() % 2 == 1 {
            totals[totals.len() / 2]
        } else {
            (totals[totals.len() / 2 - 1] + totals[totals.len() / 2]) / 2.0
        };

        let mean = if totals.is_empty() {
            0.0
        } else {
            totals.iter().sum::<f64>() / totals.len() as f64
        };

        Self {
            generated_at: Utc::now(),
            plans_processed: totals.len(),
            plans_failed: outcome.failures.len(),
            warning_count: outcome.warning_count(),
            min_total_cost: totals.first().copied().unwrap_or(0.0),
            max_total_cost: totals.last().copied().unwrap_or(0.0),
            median_total_cost: median,
            mean_total_cost: mean,
        }
    }
}

/// Fixed leading columns of the ranked CSV; per-service `cost_*` columns
/// follow in usage-profile order
const FIXED_COLUMNS: &[&str] = &[
    "rank",
    "plan_name",
    "plan_code",
    "total_annual_cost",
    "premium_cost_annual",
    "medical_drug_spend",
    "deductible_paid",
    "variable_cost_raw",
];

/// Write the ranked plans to a CSV file
pub fn write_ranked_csv<P: AsRef<Path>>(
    path: P,
    outcome: &BatchOutcome,
    profile: &UsageProfile,
) -> Result<(), Box<dyn Error>> {
    let file = std::fs::File::create(path.as_ref())?;
    write_ranked_csv_to(file, outcome, profile)
}

/// Write the ranked plans as CSV to any writer
pub fn write_ranked_csv_to<W: Write>(
    writer: W,
    outcome: &BatchOutcome,
    profile: &UsageProfile,
) -> Result<(), Box<dyn Error>> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    // Services with zero quantity never produce breakdown entries
    let service_columns: Vec<&String> = profile
        .iter()
        .filter(|(_, &quantity)| quantity > 0.0)
        .map(|(key, _)| key)
        .collect();

    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend(service_columns.iter().map(|s| format!("cost_{}", s)));
    csv_writer.write_record(&header)?;

    for plan in &outcome.ranked {
        let r = &plan.result;
        let mut record = vec![
            plan.rank.to_string(),
            r.plan_name.clone(),
            r.plan_code.clone(),
            format!("{:.2}", r.total_annual_cost),
            format!("{:.2}", r.premium_cost),
            format!("{:.2}", r.medical_drug_spend),
            format!("{:.2}", r.deductible_paid),
            format!("{:.2}", r.variable_cost_raw),
        ];
        for service in &service_columns {
            // Blank cell when the service was skipped for this plan
            record.push(
                r.usage_breakdown
                    .get(*service)
                    .map(|cost| format!("{:.2}", cost))
                    .unwrap_or_default(),
            );
        }
        csv_writer.write_record(&record)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Print the best-ranked plans to the console
pub fn print_top_plans(outcome: &BatchOutcome, count: usize) {
    println!("{}", "=".repeat(80));
    println!("TOP {} PLANS BY TOTAL ANNUAL COST", count.min(outcome.ranked.len()));
    println!("{}", "=".repeat(80));

    for plan in outcome.ranked.iter().take(count) {
        let r = &plan.result;
        println!("\n#{}: {} ({})", plan.rank, r.plan_name, r.plan_code);
        println!("  Total Annual Cost: ${:.2}", r.total_annual_cost);
        println!("    - Premium:       ${:.2}", r.premium_cost);
        println!("    - Medical/Drug:  ${:.2}", r.medical_drug_spend);
        println!("  Deductible Paid:   ${:.2}", r.deductible_paid);

        if let Some(cost) = r.usage_breakdown.get("speech_therapy_visits") {
            println!("  Speech Therapy:    ${:.2}", cost);
        }
        if let Some(cost) = r.usage_breakdown.get("occupational_therapy_visits") {
            println!("  Occupational Therapy: ${:.2}", cost);
        }
    }
    println!();
}

/// Print the run summary block
pub fn print_summary(summary: &RunSummary) {
    println!("{}", "=".repeat(60));
    println!("Cost Calculation Summary:");
    println!("  Plans processed: {}", summary.plans_processed);
    println!("  Plans failed: {}", summary.plans_failed);
    println!("  Warnings: {}", summary.warning_count);
    println!("  Min total cost: ${:.2}", summary.min_total_cost);
    println!("  Max total cost: ${:.2}", summary.max_total_cost);
    println!("  Median total cost: ${:.2}", summary.median_total_cost);
    println!("  Mean total cost: ${:.2}", summary.mean_total_cost);
    println!("{}", "=".repeat(60));
}
