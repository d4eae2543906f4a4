//! Benefit rule resolution with fallback chains
//!
//! Plans label the same benefit inconsistently ("speech_therapy" vs a
//! combined "therapy_services" bucket). The resolver maps a usage-profile
//! service key to the rule a given plan actually offers: exact match first,
//! then a suffix-stripped match, then a fixed-priority alias chain per
//! service family. Pure functions over their inputs; lookups never mutate
//! plan data.

use std::collections::HashMap;

use crate::needs::{PriceTable, UsageProfile};
use crate::plan::BenefitRule;

/// Fallback aliases for therapy services, in priority order.
///
/// Specific therapy labels come before aggregated categories so a plan that
/// prices speech therapy separately is never mapped to its combined-therapy
/// rule.
const THERAPY_FALLBACKS: &[(&str, &[&str])] = &[
    (
        "speech_therapy_visits",
        &[
            "speech_therapy",
            "speech_language_therapy",
            "therapy_services",
            "rehabilitation_services",
            "habilitation_services",
        ],
    ),
    (
        "occupational_therapy_visits",
        &[
            "occupational_therapy",
            "ot_therapy",
            "therapy_services",
            "rehabilitation_services",
            "habilitation_services",
        ],
    ),
    (
        "physical_therapy_visits",
        &[
            "physical_therapy",
            "pt_therapy",
            "therapy_services",
            "rehabilitation_services",
            "habilitation_services",
        ],
    ),
];

/// Fallback aliases for non-therapy services, in priority order
const SERVICE_FALLBACKS: &[(&str, &[&str])] = &[
    (
        "primary_care_visits",
        &["primary_care", "primary_care_visit", "pcp_visit", "office_visit_primary"],
    ),
    (
        "specialist_visits",
        &["specialist", "specialist_visit", "specialty_care", "office_visit_specialist"],
    ),
    (
        "er_visits",
        &["emergency_room", "er", "emergency_services", "emergency_care"],
    ),
    (
        "tier_1_generics_monthly",
        &["tier_1", "tier_1_generic", "generic_drug", "tier1_rx"],
    ),
    (
        "tier_4_specialty_monthly",
        &["tier_4", "tier_4_specialty", "specialty_drug", "tier4_rx"],
    ),
    (
        "inpatient_surgeries",
        &["inpatient_hospital", "hospital_stay", "inpatient_care", "hospitalization"],
    ),
];

/// Normalize a benefit key: lowercase, spaces and hyphens become
/// underscores, every other non-alphanumeric character is stripped.
pub fn normalize_key(key: &str) -> String {
    key.to_lowercase()
        .chars()
        .filter_map(|c| match c {
            ' ' | '-' => Some('_'),
            c if c.is_alphanumeric() || c == '_' => Some(c),
            _ => None,
        })
        .collect()
}

/// Find the benefit rule a plan offers for a usage-profile service key.
///
/// Returns `None` when no rule matches after all fallbacks; the caller
/// treats that service as $0 cost rather than failing the plan.
pub fn resolve<'a>(
    usage_key: &str,
    plan_rules: &'a HashMap<String, BenefitRule>,
) -> Option<&'a BenefitRule> {
    // Plan rule keys are normalized once per call; tables are small
    let normalized: HashMap<String, &BenefitRule> = plan_rules
        .iter()
        .map(|(k, v)| (normalize_key(k), v))
        .collect();

    let usage_norm = normalize_key(usage_key);

    if let Some(rule) = normalized.get(&usage_norm).copied() {
        log::debug!("exact rule match for '{}'", usage_key);
        return Some(rule);
    }

    if let Some(base) = usage_norm.strip_suffix("_visits") {
        if let Some(rule) = normalized.get(base).copied() {
            log::debug!("rule match for '{}' as '{}'", usage_key, base);
            return Some(rule);
        }
    }

    for table in [THERAPY_FALLBACKS, SERVICE_FALLBACKS] {
        if let Some((_, aliases)) = table.iter().find(|(key, _)| *key == usage_norm) {
            for alias in *aliases {
                if let Some(rule) = normalized.get(&normalize_key(alias)).copied() {
                    log::info!("using fallback rule '{}' for '{}'", alias, usage_key);
                    return Some(rule);
                }
            }
        }
    }

    // Drug-pattern fallbacks for tier keys not covered by the alias tables
    if usage_norm.contains("_generics") {
        if let Some(rule) = normalized.get("generic_drug").copied() {
            log::info!("using 'generic_drug' rule for '{}'", usage_key);
            return Some(rule);
        }
    }
    if usage_norm.contains("_specialty") {
        if let Some(rule) = normalized.get("specialty_drug").copied() {
            log::info!("using 'specialty_drug' rule for '{}'", usage_key);
            return Some(rule);
        }
    }

    None
}

/// Map a usage-profile key to its price-table key.
///
/// Usage keys end with a count indicator, price keys with a unit indicator:
/// `primary_care_visits` -> `primary_care_visit`,
/// `tier_1_generics_monthly` -> `tier_1_generic_cost`,
/// `inpatient_surgeries` -> `inpatient_surgery`.
pub fn usage_to_price_key(usage_key: &str) -> String {
    if let Some(base) = usage_key.strip_suffix("_monthly") {
        let base = base.strip_suffix("_generics").map_or_else(
            || base.to_string(),
            |stem| format!("{}_generic", stem),
        );
        return format!("{}_cost", base);
    }

    if let Some(base) = usage_key.strip_suffix("_visits") {
        return format!("{}_visit", base);
    }

    if let Some(base) = usage_key.strip_suffix("_surgeries") {
        return format!("{}_surgery", base);
    }

    log::warn!(
        "unexpected usage key format '{}': expected a '_visits', '_monthly', or '_surgeries' suffix",
        usage_key
    );
    usage_key.to_string()
}

/// Check that every usage-profile entry has a price-table counterpart.
///
/// Advisory only: the engine degrades a missing price to a $0 service, but
/// surfacing the gaps before a batch run saves a confusing report.
pub fn validate_usage_price_pairing(profile: &UsageProfile, prices: &PriceTable) -> Vec<String> {
    profile
        .keys()
        .filter_map(|usage_key| {
            let price_key = usage_to_price_key(usage_key);
            if prices.contains_key(&price_key) {
                None
            } else {
                Some(format!(
                    "missing standard cost for '{}': expected '{}' in standard_costs",
                    usage_key, price_key
                ))
            }
        })
        .collect()
}
