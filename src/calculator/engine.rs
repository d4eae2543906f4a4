//! Cost accumulation engine
//!
//! Applies each plan's benefit rules to the usage profile one service at a
//! time, in profile order, threading shared deductible state through the
//! coinsurance services, then caps the summed variable cost at the plan's
//! out-of-pocket maximum and adds the annualized premium.

use indexmap::IndexMap;

use super::resolver;
use super::result::{CalcWarning, CostResult};
use super::state::CalculationState;
use crate::needs::UserNeeds;
use crate::plan::{BenefitRule, PlanContract};

/// Bi-weekly pay periods per year; premiums are quoted per period
pub const PAY_PERIODS_PER_YEAR: f64 = 26.0;

/// Months covered by one `_monthly` prescription count
const MONTHS_PER_YEAR: f64 = 12.0;

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Cost engine for one user's needs, reusable across any number of plans.
///
/// The engine itself is immutable; every `calculate_total_cost` call owns a
/// fresh `CalculationState`, so one engine may be shared across threads and
/// plans freely. Services within a single calculation are strictly
/// sequential: each coinsurance step depends on the deductible consumed by
/// the steps before it.
pub struct CostEngine {
    needs: UserNeeds,
}

impl CostEngine {
    /// Create an engine over validated user needs
    pub fn new(needs: UserNeeds) -> Self {
        Self { needs }
    }

    /// The usage profile and price table this engine calculates against
    pub fn needs(&self) -> &UserNeeds {
        &self.needs
    }

    /// Calculate the complete annual cost breakdown for one plan
    pub fn calculate_total_cost(&self, plan: &PlanContract) -> CostResult {
        let mut state = CalculationState::new(plan.annual_deductible);
        let mut warnings = Vec::new();
        let mut usage_breakdown: IndexMap<String, f64> = IndexMap::new();

        let premium_cost = plan.biweekly_premium * PAY_PERIODS_PER_YEAR;

        for (usage_key, &quantity) in &self.needs.usage_profile {
            if quantity <= 0.0 {
                continue;
            }

            let price_key = resolver::usage_to_price_key(usage_key);

            // Monthly prescription counts are per-month; cost a full year
            let annual_quantity = if usage_key.ends_with("_monthly") {
                quantity * MONTHS_PER_YEAR
            } else {
                quantity
            };

            let unit_price = self.needs.standard_costs.get(&price_key).copied().unwrap_or(0.0);
            if unit_price <= 0.0 {
                let warning = CalcWarning::MissingPrice {
                    usage_key: usage_key.clone(),
                    price_key,
                };
                log::warn!("{}: {}", plan.plan_name, warning);
                warnings.push(warning);
                continue;
            }

            let Some(rule) = resolver::resolve(usage_key, &plan.benefit_rules) else {
                let warning = CalcWarning::UnresolvedBenefit {
                    usage_key: usage_key.clone(),
                };
                log::warn!("{}: {}", plan.plan_name, warning);
                warnings.push(warning);
                usage_breakdown.insert(usage_key.clone(), 0.0);
                continue;
            };

            let cost =
                self.apply_rule(rule, unit_price, annual_quantity, usage_key, &mut state, &mut warnings);
            usage_breakdown.insert(usage_key.clone(), cost);
        }

        let variable_cost_raw: f64 = usage_breakdown.values().sum();
        let oop_max = plan.oop_max.unwrap_or(f64::INFINITY);

        let medical_drug_spend = if variable_cost_raw > oop_max {
            log::info!(
                "{}: OOP cap applied, ${:.2} capped at ${:.2}",
                plan.plan_name,
                variable_cost_raw,
                oop_max
            );
            oop_max
        } else {
            variable_cost_raw
        };

        let total_annual_cost = premium_cost + medical_drug_spend;

        CostResult {
            plan_name: plan.plan_name.clone(),
            plan_code: plan.plan_code.clone(),
            total_annual_cost: round_cents(total_annual_cost),
            premium_cost: round_cents(premium_cost),
            medical_drug_spend: round_cents(medical_drug_spend),
            deductible_paid: round_cents(state.deductible_paid),
            variable_cost_raw: round_cents(variable_cost_raw),
            usage_breakdown: usage_breakdown
                .into_iter()
                .map(|(key, cost)| (key, round_cents(cost)))
                .collect(),
            warnings,
        }
    }

    /// Cost one service under its resolved rule, updating deductible state.
    ///
    /// Copays never touch the deductible. Coinsurance pays 100% of market
    /// cost into any remaining deductible, then the coinsurance rate on the
    /// balance.
    fn apply_rule(
        &self,
        rule: &BenefitRule,
        unit_price: f64,
        quantity: f64,
        usage_key: &str,
        state: &mut CalculationState,
        warnings: &mut Vec<CalcWarning>,
    ) -> f64 {
        match rule {
            BenefitRule::Copay { amount } => {
                let cost = amount * quantity;
                log::debug!("{} (copay): ${} x {} = ${:.2}", usage_key, amount, quantity, cost);
                cost
            }
            BenefitRule::Coinsurance { rate } => {
                let market_total = unit_price * quantity;
                let deductible_portion = state.consume(market_total);
                let coinsurance_portion = (market_total - deductible_portion) * rate;
                let cost = deductible_portion + coinsurance_portion;
                log::debug!(
                    "{} (coinsurance {:.0}%): market=${:.2}, deductible=${:.2}, coinsurance=${:.2}",
                    usage_key,
                    rate * 100.0,
                    market_total,
                    deductible_portion,
                    coinsurance_portion
                );
                cost
            }
            BenefitRule::Unknown => {
                let warning = CalcWarning::UnknownBenefitType {
                    usage_key: usage_key.to_string(),
                };
                log::warn!("{}", warning);
                warnings.push(warning);
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::collections::HashMap;

    fn needs(profile: &[(&str, f64)], costs: &[(&str, f64)]) -> UserNeeds {
        UserNeeds {
            usage_profile: profile.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            standard_costs: costs.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        }
    }

    fn plan(
        premium: f64,
        deductible: f64,
        oop_max: Option<f64>,
        rules: &[(&str, BenefitRule)],
    ) -> PlanContract {
        PlanContract {
            plan_name: "Test Plan".to_string(),
            plan_code: "TEST-001".to_string(),
            biweekly_premium: premium,
            annual_deductible: deductible,
            oop_max,
            benefit_rules: rules
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect::<HashMap<_, _>>(),
        }
    }

    #[test]
    fn test_pure_copay_scenario() {
        // Copays ignore the deductible entirely
        let engine = CostEngine::new(needs(
            &[("primary_care_visits", 5.0), ("specialist_visits", 10.0)],
            &[("primary_care_visit", 200.0), ("specialist_visit", 400.0)],
        ));
        let plan = plan(
            100.0,
            1000.0,
            Some(10_000.0),
            &[
                ("primary_care_visits", BenefitRule::Copay { amount: 20.0 }),
                ("specialist_visits", BenefitRule::Copay { amount: 40.0 }),
            ],
        );

        let result = engine.calculate_total_cost(&plan);

        assert_relative_eq!(result.usage_breakdown["primary_care_visits"], 100.0);
        assert_relative_eq!(result.usage_breakdown["specialist_visits"], 400.0);
        assert_relative_eq!(result.deductible_paid, 0.0);
        assert_relative_eq!(result.variable_cost_raw, 500.0);
        assert_relative_eq!(result.premium_cost, 2600.0);
        assert_relative_eq!(result.total_annual_cost, 3100.0);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_coinsurance_with_deductible_scenario() {
        // $2000 market: $500 at 100% into the deductible, 20% of the rest
        let engine = CostEngine::new(needs(
            &[("primary_care_visits", 10.0)],
            &[("primary_care_visit", 200.0)],
        ));
        let plan = plan(
            100.0,
            500.0,
            Some(10_000.0),
            &[("primary_care_visits", BenefitRule::Coinsurance { rate: 0.20 })],
        );

        let result = engine.calculate_total_cost(&plan);

        assert_relative_eq!(result.usage_breakdown["primary_care_visits"], 800.0);
        assert_relative_eq!(result.deductible_paid, 500.0);
        assert_relative_eq!(result.variable_cost_raw, 800.0);
    }

    #[test]
    fn test_oop_cap_scenario() {
        // Raw variable 1000 + 19000 * 0.5 = 10500, capped at 5000
        let engine = CostEngine::new(needs(
            &[("specialist_visits", 50.0)],
            &[("specialist_visit", 400.0)],
        ));
        let plan = plan(
            100.0,
            1000.0,
            Some(5000.0),
            &[("specialist_visits", BenefitRule::Coinsurance { rate: 0.50 })],
        );

        let result = engine.calculate_total_cost(&plan);

        assert_relative_eq!(result.variable_cost_raw, 10_500.0);
        assert_relative_eq!(result.medical_drug_spend, 5000.0);
        assert_relative_eq!(result.total_annual_cost, 2600.0 + 5000.0);
    }

    #[test]
    fn test_unbounded_oop_max() {
        let engine = CostEngine::new(needs(
            &[("specialist_visits", 50.0)],
            &[("specialist_visit", 400.0)],
        ));
        let plan = plan(
            100.0,
            1000.0,
            None,
            &[("specialist_visits", BenefitRule::Coinsurance { rate: 0.50 })],
        );

        let result = engine.calculate_total_cost(&plan);
        assert_relative_eq!(result.medical_drug_spend, result.variable_cost_raw);
    }

    #[test]
    fn test_copay_independent_of_deductible_state() {
        // A coinsurance service partially consumes the deductible; the
        // copay service before and after it costs the same either way
        let engine = CostEngine::new(needs(
            &[("specialist_visits", 5.0), ("primary_care_visits", 3.0)],
            &[("specialist_visit", 400.0), ("primary_care_visit", 200.0)],
        ));
        let plan = plan(
            0.0,
            600.0,
            None,
            &[
                ("specialist_visits", BenefitRule::Coinsurance { rate: 0.25 }),
                ("primary_care_visits", BenefitRule::Copay { amount: 20.0 }),
            ],
        );

        let result = engine.calculate_total_cost(&plan);
        assert_relative_eq!(result.usage_breakdown["primary_care_visits"], 60.0);
        // Only the coinsurance service consumed deductible
        assert_relative_eq!(result.deductible_paid, 600.0);
    }

    #[test]
    fn test_deductible_shared_across_services_in_order() {
        // Two coinsurance services share one deductible; the first consumes
        // all of it
        let engine = CostEngine::new(needs(
            &[("specialist_visits", 5.0), ("primary_care_visits", 10.0)],
            &[("specialist_visit", 400.0), ("primary_care_visit", 200.0)],
        ));
        let plan = plan(
            0.0,
            500.0,
            None,
            &[
                ("specialist_visits", BenefitRule::Coinsurance { rate: 0.10 }),
                ("primary_care_visits", BenefitRule::Coinsurance { rate: 0.10 }),
            ],
        );

        let result = engine.calculate_total_cost(&plan);

        // Specialist: 2000 market, 500 deductible + 1500 * 0.10 = 650
        assert_relative_eq!(result.usage_breakdown["specialist_visits"], 650.0);
        // Primary care sees an exhausted deductible: 2000 * 0.10 = 200
        assert_relative_eq!(result.usage_breakdown["primary_care_visits"], 200.0);
        assert_relative_eq!(result.deductible_paid, 500.0);
    }

    #[test]
    fn test_order_sensitivity() {
        // Same services, opposite insertion order: per-service costs move,
        // the raw total does not
        let costs = &[("specialist_visit", 400.0), ("primary_care_visit", 200.0)];
        let rules = &[
            ("specialist_visits", BenefitRule::Coinsurance { rate: 0.10 }),
            ("primary_care_visits", BenefitRule::Coinsurance { rate: 0.30 }),
        ][..];

        let forward = CostEngine::new(needs(
            &[("specialist_visits", 5.0), ("primary_care_visits", 10.0)],
            costs,
        ))
        .calculate_total_cost(&plan(0.0, 500.0, None, rules));

        let reverse = CostEngine::new(needs(
            &[("primary_care_visits", 10.0), ("specialist_visits", 5.0)],
            costs,
        ))
        .calculate_total_cost(&plan(0.0, 500.0, None, rules));

        assert!(
            (forward.usage_breakdown["specialist_visits"]
                - reverse.usage_breakdown["specialist_visits"])
                .abs()
                > 1.0
        );
        assert_relative_eq!(forward.deductible_paid, reverse.deductible_paid);
        // Totals differ only because the rates differ; with equal rates the
        // raw total is order-invariant
        let equal_rules = &[
            ("specialist_visits", BenefitRule::Coinsurance { rate: 0.20 }),
            ("primary_care_visits", BenefitRule::Coinsurance { rate: 0.20 }),
        ][..];
        let forward_eq = CostEngine::new(needs(
            &[("specialist_visits", 5.0), ("primary_care_visits", 10.0)],
            costs,
        ))
        .calculate_total_cost(&plan(0.0, 500.0, None, equal_rules));
        let reverse_eq = CostEngine::new(needs(
            &[("primary_care_visits", 10.0), ("specialist_visits", 5.0)],
            costs,
        ))
        .calculate_total_cost(&plan(0.0, 500.0, None, equal_rules));
        assert_relative_eq!(forward_eq.variable_cost_raw, reverse_eq.variable_cost_raw);
    }

    #[test]
    fn test_state_reset_between_calculations() {
        // Re-running the same plan must not inherit consumed deductible
        let engine = CostEngine::new(needs(
            &[("primary_care_visits", 10.0)],
            &[("primary_care_visit", 200.0)],
        ));
        let plan = plan(
            0.0,
            500.0,
            None,
            &[("primary_care_visits", BenefitRule::Coinsurance { rate: 0.20 })],
        );

        let first = engine.calculate_total_cost(&plan);
        let second = engine.calculate_total_cost(&plan);
        assert_relative_eq!(first.deductible_paid, second.deductible_paid);
        assert_relative_eq!(first.total_annual_cost, second.total_annual_cost);
    }

    #[test]
    fn test_monthly_prescriptions_annualized() {
        // 2 scripts/month at $25 with a $10 copay: 24 fills * $10 = $240
        let engine = CostEngine::new(needs(
            &[("tier_1_generics_monthly", 2.0)],
            &[("tier_1_generic_cost", 25.0)],
        ));
        let plan = plan(
            0.0,
            0.0,
            None,
            &[("generic_drug", BenefitRule::Copay { amount: 10.0 })],
        );

        let result = engine.calculate_total_cost(&plan);
        assert_relative_eq!(result.usage_breakdown["tier_1_generics_monthly"], 240.0);
    }

    #[test]
    fn test_missing_price_skips_service() {
        let engine = CostEngine::new(needs(
            &[("er_visits", 2.0), ("primary_care_visits", 5.0)],
            &[("primary_care_visit", 200.0)],
        ));
        let plan = plan(
            0.0,
            0.0,
            None,
            &[
                ("er_visits", BenefitRule::Copay { amount: 150.0 }),
                ("primary_care_visits", BenefitRule::Copay { amount: 20.0 }),
            ],
        );

        let result = engine.calculate_total_cost(&plan);

        assert!(!result.usage_breakdown.contains_key("er_visits"));
        assert_relative_eq!(result.usage_breakdown["primary_care_visits"], 100.0);
        assert_eq!(
            result.warnings,
            vec![CalcWarning::MissingPrice {
                usage_key: "er_visits".to_string(),
                price_key: "er_visit".to_string(),
            }]
        );
    }

    #[test]
    fn test_unresolved_benefit_is_zero_cost() {
        let engine = CostEngine::new(needs(
            &[("er_visits", 2.0)],
            &[("er_visit", 2200.0)],
        ));
        let plan = plan(0.0, 0.0, None, &[]);

        let result = engine.calculate_total_cost(&plan);

        assert_relative_eq!(result.usage_breakdown["er_visits"], 0.0);
        assert_eq!(
            result.warnings,
            vec![CalcWarning::UnresolvedBenefit {
                usage_key: "er_visits".to_string(),
            }]
        );
    }

    #[test]
    fn test_unknown_rule_is_zero_cost() {
        let engine = CostEngine::new(needs(
            &[("er_visits", 2.0)],
            &[("er_visit", 2200.0)],
        ));
        let plan = plan(0.0, 0.0, None, &[("er_visits", BenefitRule::Unknown)]);

        let result = engine.calculate_total_cost(&plan);

        assert_relative_eq!(result.usage_breakdown["er_visits"], 0.0);
        assert_eq!(
            result.warnings,
            vec![CalcWarning::UnknownBenefitType {
                usage_key: "er_visits".to_string(),
            }]
        );
    }

    #[test]
    fn test_zero_quantity_skipped_silently() {
        let engine = CostEngine::new(needs(
            &[("er_visits", 0.0), ("primary_care_visits", 1.0)],
            &[("er_visit", 2200.0), ("primary_care_visit", 200.0)],
        ));
        let plan = plan(
            0.0,
            0.0,
            None,
            &[
                ("er_visits", BenefitRule::Copay { amount: 150.0 }),
                ("primary_care_visits", BenefitRule::Copay { amount: 20.0 }),
            ],
        );

        let result = engine.calculate_total_cost(&plan);
        assert!(!result.usage_breakdown.contains_key("er_visits"));
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_deductible_exhaustion_invariant() {
        let engine = CostEngine::new(needs(
            &[
                ("specialist_visits", 3.0),
                ("primary_care_visits", 2.0),
                ("er_visits", 1.0),
            ],
            &[
                ("specialist_visit", 400.0),
                ("primary_care_visit", 200.0),
                ("er_visit", 2200.0),
            ],
        ));
        for deductible in [0.0, 300.0, 1500.0, 50_000.0] {
            let plan = plan(
                50.0,
                deductible,
                None,
                &[
                    ("specialist_visits", BenefitRule::Coinsurance { rate: 0.30 }),
                    ("primary_care_visits", BenefitRule::Coinsurance { rate: 0.20 }),
                    ("er_visits", BenefitRule::Coinsurance { rate: 0.50 }),
                ],
            );
            let result = engine.calculate_total_cost(&plan);
            assert!(result.deductible_paid <= deductible);
            assert!(result.deductible_paid >= 0.0);
        }
    }

    #[test]
    fn test_results_rounded_to_cents() {
        // 3 visits at $33.335 market with 10% coinsurance, no deductible:
        // 100.005 * 0.10 = 10.0005, rounded to 10.00 at the boundary
        let engine = CostEngine::new(needs(
            &[("primary_care_visits", 3.0)],
            &[("primary_care_visit", 33.335)],
        ));
        let plan = plan(
            0.0,
            0.0,
            None,
            &[("primary_care_visits", BenefitRule::Coinsurance { rate: 0.10 })],
        );

        let result = engine.calculate_total_cost(&plan);
        assert_relative_eq!(result.usage_breakdown["primary_care_visits"], 10.0);
        assert_relative_eq!(result.variable_cost_raw, 10.0);
    }
}
