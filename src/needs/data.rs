//! Usage profile and market price data structures

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

/// Expected yearly service usage, keyed by service type.
///
/// Insertion order is preserved: it is the order services are costed, and
/// therefore the order the shared deductible is consumed.
pub type UsageProfile = IndexMap<String, f64>;

/// Market unit prices keyed by normalized cost key
pub type PriceTable = HashMap<String, f64>;

/// User configuration: what services the member expects to use and what
/// those services cost on the open market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserNeeds {
    pub usage_profile: UsageProfile,

    #[serde(deserialize_with = "deserialize_standard_costs")]
    pub standard_costs: PriceTable,
}

/// The standard_costs object may carry a free-text "description" entry
/// alongside the numeric rates; drop it rather than failing the load.
fn deserialize_standard_costs<'de, D>(deserializer: D) -> Result<PriceTable, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: HashMap<String, serde_json::Value> = HashMap::deserialize(deserializer)?;

    let mut costs = PriceTable::with_capacity(raw.len());
    for (key, value) in raw {
        if key == "description" {
            continue;
        }
        let amount = value.as_f64().ok_or_else(|| {
            de::Error::custom(format!("standard_costs '{}' must be numeric, got {}", key, value))
        })?;
        costs.insert(key, amount);
    }

    Ok(costs)
}
