// src/services/calculations.rs
use log::warn;
use serde::{Deserialize, Serialize};

use crate::models::{RevenueOpportunity, ValueRange};
use crate::services::formatting::{format_count, format_currency, format_percent};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OpportunityInputs {
    pub monthly_visitors: f64,
    /// Fraction in [0, 1].
    pub current_conversion_rate: f64,
    pub aov: f64,
    /// Fraction in [0, 1].
    pub category_benchmark_cr: f64,
}

fn clamp_rate(rate: f64, name: &str) -> f64 {
    if !rate.is_finite() {
        warn!("Non-finite {} ({}), treating as 0", name, rate);
        0.0
    } else if !(0.0..=1.0).contains(&rate) {
        warn!("{} {} outside [0, 1], clamping", name, rate);
        rate.clamp(0.0, 1.0)
    } else {
        rate
    }
}

fn non_negative(value: f64, name: &str) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        warn!("Invalid {} ({}), treating as 0", name, value);
        0.0
    }
}

pub fn monthly_revenue(visitors: f64, conversion_rate: f64, aov: f64) -> f64 {
    visitors * conversion_rate * aov
}

/// Estimates how much monthly revenue a store leaves on the table compared
/// with its category benchmark.
///
/// The high end assumes the store reaches the benchmark rate, the low end
/// that it closes half of the gap. The target rate is never below the store's
/// own rate, so the opportunity is never negative. The annual figure is
/// twelve times the high end.
pub fn calculate_revenue_opportunity(inputs: &OpportunityInputs) -> RevenueOpportunity {
    let visitors = non_negative(inputs.monthly_visitors, "monthly visitors");
    let aov = non_negative(inputs.aov, "average order value");
    let current_rate = clamp_rate(inputs.current_conversion_rate, "current conversion rate");
    let benchmark_rate = clamp_rate(inputs.category_benchmark_cr, "benchmark conversion rate");

    let target_rate = benchmark_rate.max(current_rate);
    let conservative_rate = current_rate + (target_rate - current_rate) / 2.0;

    let current = monthly_revenue(visitors, current_rate, aov);
    let potential = monthly_revenue(visitors, target_rate, aov);
    let conservative = monthly_revenue(visitors, conservative_rate, aov);

    let max = (potential - current).max(0.0);
    let min = (conservative - current).clamp(0.0, max);

    RevenueOpportunity {
        current_monthly_revenue: current,
        potential_monthly_revenue: potential.max(current),
        monthly_opportunity: ValueRange { min, max },
        annual_opportunity: 12.0 * max,
        methodology: describe_methodology(visitors, current_rate, benchmark_rate, aov),
    }
}

fn describe_methodology(visitors: f64, current_rate: f64, benchmark_rate: f64, aov: f64) -> String {
    let base = format!(
        "Based on {} monthly visitors converting at {} with an average order value of {}.",
        format_count(visitors.round() as u64),
        format_percent(current_rate),
        format_currency(aov),
    );

    if current_rate >= benchmark_rate {
        format!(
            "{} The store already converts at or above the category benchmark of {}, so no uplift is projected.",
            base,
            format_percent(benchmark_rate),
        )
    } else {
        format!(
            "{} The low estimate closes half the gap to the category benchmark of {}; \
the high estimate reaches it. Annual figure is 12x the high estimate.",
            base,
            format_percent(benchmark_rate),
        )
    }
}
