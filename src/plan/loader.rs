//! Load plan records from a JSON plan listing
//!
//! The listing is an array of plan objects. Records are deserialized one at
//! a time so a single malformed plan is skipped and counted instead of
//! aborting the whole load.

use std::error::Error;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use super::PlanContract;

/// Outcome of loading a plan listing
#[derive(Debug)]
pub struct PlanLoadReport {
    /// Successfully parsed plan records, in listing order
    pub plans: Vec<PlanContract>,
    /// Number of records dropped as malformed
    pub skipped: usize,
}

/// Load all plans from a JSON file
pub fn load_plans<P: AsRef<Path>>(path: P) -> Result<PlanLoadReport, Box<dyn Error>> {
    let file = File::open(path.as_ref())?;
    load_plans_from_reader(BufReader::new(file))
}

/// Load plans from any reader (e.g., string buffer, network stream)
pub fn load_plans_from_reader<R: Read>(reader: R) -> Result<PlanLoadReport, Box<dyn Error>> {
    let records: Vec<serde_json::Value> = serde_json::from_reader(reader)?;

    let mut plans = Vec::with_capacity(records.len());
    let mut skipped = 0;

    for record in records {
        let name = record
            .get("plan_name")
            .and_then(|v| v.as_str())
            .unwrap_or("<unnamed>")
            .to_string();

        match serde_json::from_value::<PlanContract>(record) {
            Ok(plan) => plans.push(plan),
            Err(e) => {
                log::warn!("skipping malformed plan record '{}': {}", name, e);
                skipped += 1;
            }
        }
    }

    Ok(PlanLoadReport { plans, skipped })
}
