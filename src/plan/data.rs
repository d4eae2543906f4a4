//! Plan contract data structures matching the provider record format

use std::collections::HashMap;
use std::fmt;

use serde::de::Deserializer;
use serde::ser::{SerializeStruct, Serializer};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::classify::classify_benefit_text;

/// The contractual cost-sharing rule a plan offers for one service.
///
/// Closed set: anything the provider could not classify into copay or
/// coinsurance (including "not covered" benefits) lands in `Unknown` and is
/// costed at $0 by the engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BenefitRule {
    /// Fixed amount per service occurrence; never touches the deductible
    Copay { amount: f64 },
    /// Member pays this fraction of market cost after the deductible is met
    Coinsurance { rate: f64 },
    /// Unrecognized or not-covered benefit
    Unknown,
}

impl BenefitRule {
    /// Short tag used in serialized records and log messages
    pub fn kind(&self) -> &'static str {
        match self {
            BenefitRule::Copay { .. } => "copay",
            BenefitRule::Coinsurance { .. } => "coinsurance",
            BenefitRule::Unknown => "unknown",
        }
    }
}

impl fmt::Display for BenefitRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenefitRule::Copay { amount } => write!(f, "copay ${:.2}", amount),
            BenefitRule::Coinsurance { rate } => write!(f, "coinsurance {:.0}%", rate * 100.0),
            BenefitRule::Unknown => write!(f, "unknown"),
        }
    }
}

/// Raw rule value as it appears in provider records: either the structured
/// `{"type": ..., "value": ...}` object or a free-text benefit description.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRule {
    Structured {
        #[serde(rename = "type", default)]
        kind: Option<String>,
        #[serde(default)]
        value: Option<f64>,
    },
    Text(String),
}

impl From<RawRule> for BenefitRule {
    fn from(raw: RawRule) -> Self {
        match raw {
            RawRule::Structured { kind, value } => {
                // Missing type tag defaults to copay, matching provider data
                // where bare amounts are copays
                let kind = kind.unwrap_or_else(|| "copay".to_string());
                match kind.to_lowercase().as_str() {
                    "copay" => BenefitRule::Copay {
                        amount: value.unwrap_or(0.0),
                    },
                    "coinsurance" => {
                        let rate = value.unwrap_or(0.0);
                        if !(0.0..=1.0).contains(&rate) {
                            log::warn!("coinsurance rate {} outside [0, 1], applying as-is", rate);
                        }
                        BenefitRule::Coinsurance { rate }
                    }
                    _ => BenefitRule::Unknown,
                }
            }
            RawRule::Text(text) => classify_benefit_text(&text),
        }
    }
}

impl<'de> Deserialize<'de> for BenefitRule {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(RawRule::deserialize(deserializer)?.into())
    }
}

impl Serialize for BenefitRule {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut s = serializer.serialize_struct("BenefitRule", 2)?;
        s.serialize_field("type", self.kind())?;
        match self {
            BenefitRule::Copay { amount } => s.serialize_field("value", amount)?,
            BenefitRule::Coinsurance { rate } => s.serialize_field("value", rate)?,
            BenefitRule::Unknown => s.serialize_field("value", &Option::<f64>::None)?,
        }
        s.end()
    }
}

/// A single plan record with resolved benefit rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanContract {
    /// Display name of the plan
    pub plan_name: String,

    /// Carrier plan code
    #[serde(default)]
    pub plan_code: String,

    /// Premium charged per bi-weekly pay period
    pub biweekly_premium: f64,

    /// Annual deductible shared by all coinsurance services
    pub annual_deductible: f64,

    /// Out-of-pocket maximum; None means the plan publishes no ceiling
    #[serde(default)]
    pub oop_max: Option<f64>,

    /// Cost-sharing rules keyed by the plan's own benefit labels
    #[serde(default)]
    pub benefit_rules: HashMap<String, BenefitRule>,
}

/// Validation failure for one plan record
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("plan record has an empty plan_name")]
    MissingName,

    #[error("plan '{plan}': {field} must be a non-negative finite amount, got {value}")]
    InvalidAmount {
        plan: String,
        field: &'static str,
        value: f64,
    },
}

impl PlanContract {
    /// Check the money fields before calculation.
    ///
    /// Called at the batch boundary so one bad record drops out of the run
    /// instead of aborting it.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.plan_name.trim().is_empty() {
            return Err(PlanError::MissingName);
        }
        let checks = [
            ("biweekly_premium", self.biweekly_premium),
            ("annual_deductible", self.annual_deductible),
            ("oop_max", self.oop_max.unwrap_or(0.0)),
        ];
        for (field, value) in checks {
            if !value.is_finite() || value < 0.0 {
                return Err(PlanError::InvalidAmount {
                    plan: self.plan_name.clone(),
                    field,
                    value,
                });
            }
        }
        Ok(())
    }
}
