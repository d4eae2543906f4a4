//! Benefit text classification
//!
//! Provider records sometimes carry raw benefit descriptions ("$30
//! Copayment", "15% Coinsurance", "Member Pays Nothing") instead of
//! structured rules. This module turns those strings into `BenefitRule`
//! variants; anything it cannot recognize becomes `Unknown`.

use std::sync::OnceLock;

use regex::Regex;

use super::data::BenefitRule;

/// Dollar amount, e.g. "$30" or "$12.50"
fn copay_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$(\d+(?:\.\d{2})?)").expect("copay pattern"))
}

/// Percentage, e.g. "15%" or "12.5 %"
fn coinsurance_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%").expect("coinsurance pattern"))
}

/// Classify a free-text benefit description into a cost-sharing rule.
///
/// Phrase checks run before amount extraction so "Member Pays Nothing" is a
/// $0 copay rather than unparseable. A dollar amount only counts as a copay
/// when no percent sign appears anywhere in the text, since brochures mix
/// both ("$150 copay then 20%") and the percentage is the binding term.
pub fn classify_benefit_text(text: &str) -> BenefitRule {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return BenefitRule::Unknown;
    }

    let lower = trimmed.to_lowercase();

    if lower.contains("nothing") || lower.contains("no charge") {
        return BenefitRule::Copay { amount: 0.0 };
    }

    if lower.contains("not covered") || lower.contains("member pays all") {
        return BenefitRule::Unknown;
    }

    if let Some(caps) = copay_pattern().captures(trimmed) {
        if !trimmed.contains('%') {
            if let Ok(amount) = caps[1].parse::<f64>() {
                return BenefitRule::Copay { amount };
            }
        }
    }

    if let Some(caps) = coinsurance_pattern().captures(trimmed) {
        if let Ok(percentage) = caps[1].parse::<f64>() {
            let rate = percentage / 100.0;
            if rate > 1.0 {
                log::warn!(
                    "benefit text '{}' yields coinsurance rate {} above 1.0, applying as-is",
                    trimmed,
                    rate
                );
            }
            return BenefitRule::Coinsurance { rate };
        }
    }

    log::warn!("could not classify benefit text: '{}'", trimmed);
    BenefitRule::Unknown
}
