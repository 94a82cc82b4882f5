// src/services/formatting.rs
//! Display helpers for revenue figures. Rounding here only ever touches the
//! string shown to a merchant, never the stored numbers.

use crate::models::{OpportunityDisplay, RevenueOpportunity};

/// Rounds a currency amount to a granularity that scales with its size:
/// nearest 100,000 from one million, 10,000 from 100k, 1,000 from 10k,
/// 100 from 1k, and 10 below that.
pub fn round_for_display(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }

    let magnitude = value.abs();
    let step = if magnitude >= 1_000_000.0 {
        100_000.0
    } else if magnitude >= 100_000.0 {
        10_000.0
    } else if magnitude >= 10_000.0 {
        1_000.0
    } else if magnitude >= 1_000.0 {
        100.0
    } else {
        10.0
    };

    (value / step).round() * step
}

/// Whole-dollar amount with thousands separators, e.g. `$29,750`.
pub fn format_currency(value: f64) -> String {
    let value = if value.is_finite() { value.round() } else { 0.0 };
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}${}", sign, group_thousands(value.abs() as u64))
}

/// Display-rounded currency, e.g. `$30,000` for 29,750.
pub fn format_display_currency(value: f64) -> String {
    format_currency(round_for_display(value))
}

/// Formats a min/max pair after display rounding. When the rounded bounds sit
/// within 10% of the low end, a single figure is shown instead of a range.
pub fn format_range(min: f64, max: f64) -> String {
    let (low, high) = if min <= max { (min, max) } else { (max, min) };
    let low = round_for_display(low);
    let high = round_for_display(high);
    let spread = high - low;

    if spread <= 0.0 || spread < 0.1 * low {
        format_currency(high)
    } else {
        format!("{} - {}", format_currency(low), format_currency(high))
    }
}

/// Conversion rate fraction as a percentage, e.g. `0.021` -> `2.1%`.
pub fn format_percent(rate: f64) -> String {
    let percent = if rate.is_finite() { rate * 100.0 } else { 0.0 };
    if percent != 0.0 && percent.abs() < 1.0 {
        format!("{:.2}%", percent)
    } else {
        format!("{:.1}%", percent)
    }
}

pub fn format_count(count: u64) -> String {
    group_thousands(count)
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

impl RevenueOpportunity {
    pub fn display(&self) -> OpportunityDisplay {
        OpportunityDisplay {
            monthly: format_range(self.monthly_opportunity.min, self.monthly_opportunity.max),
            annual: format_display_currency(self.annual_opportunity),
            current_monthly: format_display_currency(self.current_monthly_revenue),
            potential_monthly: format_display_currency(self.potential_monthly_revenue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ValueRange;

    #[test]
    fn rounds_by_magnitude() {
        assert_eq!(round_for_display(1_234_567.0), 1_200_000.0);
        assert_eq!(round_for_display(357_000.0), 360_000.0);
        assert_eq!(round_for_display(29_750.0), 30_000.0);
        assert_eq!(round_for_display(1_249.0), 1_200.0);
        assert_eq!(round_for_display(994.0), 990.0);
        assert_eq!(round_for_display(4.0), 0.0);
        assert_eq!(round_for_display(f64::NAN), 0.0);
    }

    #[test]
    fn rounding_is_idempotent() {
        let samples = [
            0.0, 5.0, 995.0, 999.9, 9_960.0, 99_600.0, 99_999.0, 999_999.0, 1_049_999.0, 12_345_678.9,
        ];
        for value in samples {
            let once = round_for_display(value);
            assert_eq!(round_for_display(once), once, "value {}", value);
            assert_eq!(format_display_currency(once), format_display_currency(value));
        }
    }

    #[test]
    fn groups_thousands() {
        assert_eq!(format_currency(0.0), "$0");
        assert_eq!(format_currency(999.4), "$999");
        assert_eq!(format_currency(1_000.0), "$1,000");
        assert_eq!(format_currency(1_234_567.0), "$1,234,567");
        assert_eq!(format_currency(-2_500.0), "-$2,500");
        assert_eq!(format_count(50_000), "50,000");
    }

    #[test]
    fn shows_range_when_bounds_differ() {
        assert_eq!(format_range(14_875.0, 29_750.0), "$15,000 - $30,000");
        // swapped bounds still render low to high
        assert_eq!(format_range(29_750.0, 14_875.0), "$15,000 - $30,000");
    }

    #[test]
    fn collapses_range_when_bounds_are_close() {
        // both bounds round to 10,000
        assert_eq!(format_range(10_020.0, 10_480.0), "$10,000");
        assert_eq!(format_range(0.0, 0.0), "$0");
        assert_eq!(format_range(50_000.0, 54_000.0), "$54,000");
    }

    #[test]
    fn formats_percentages() {
        assert_eq!(format_percent(0.021), "2.1%");
        assert_eq!(format_percent(0.0075), "0.75%");
        assert_eq!(format_percent(0.0), "0.0%");
    }

    #[test]
    fn opportunity_display_strings() {
        let opportunity = RevenueOpportunity {
            current_monthly_revenue: 59_500.0,
            potential_monthly_revenue: 89_250.0,
            monthly_opportunity: ValueRange { min: 14_875.0, max: 29_750.0 },
            annual_opportunity: 357_000.0,
            methodology: String::new(),
        };
        let display = opportunity.display();
        assert_eq!(display.monthly, "$15,000 - $30,000");
        assert_eq!(display.annual, "$360,000");
        assert_eq!(display.current_monthly, "$60,000");
        assert_eq!(display.potential_monthly, "$89,000");
    }
}
