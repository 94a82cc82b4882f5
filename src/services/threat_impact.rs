// src/services/threat_impact.rs
use log::warn;

use crate::models::{Confidence, ThreatImpactEstimate, ThreatIssue, ValueRange};
use crate::services::formatting::format_range;

const HIGH_CONFIDENCE_MAX_SPREAD: f64 = 0.02;
const MEDIUM_CONFIDENCE_MAX_SPREAD: f64 = 0.05;
// absorbs float noise such as 0.05 - 0.03 = 0.020000000000000004
const SPREAD_TOLERANCE: f64 = 1e-9;

/// Narrow impact ranges mean the detector was sure of itself.
pub fn confidence_for_spread(spread: f64) -> Confidence {
    if spread <= HIGH_CONFIDENCE_MAX_SPREAD + SPREAD_TOLERANCE {
        Confidence::High
    } else if spread <= MEDIUM_CONFIDENCE_MAX_SPREAD + SPREAD_TOLERANCE {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

fn sanitize_impact(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Converts an issue's estimated conversion impact into a monthly revenue
/// recovery range against the store's baseline monthly revenue.
pub fn calculate_threat_impact(issue: &ThreatIssue, baseline_monthly_revenue: f64) -> ThreatImpactEstimate {
    let mut impact_min = sanitize_impact(issue.impact_min);
    let mut impact_max = sanitize_impact(issue.impact_max);
    if impact_min > impact_max {
        warn!(
            "Issue {} has inverted impact range ({} > {}), swapping",
            issue.id, impact_min, impact_max
        );
        std::mem::swap(&mut impact_min, &mut impact_max);
    }

    let baseline = if baseline_monthly_revenue.is_finite() && baseline_monthly_revenue > 0.0 {
        baseline_monthly_revenue
    } else {
        0.0
    };

    let monthly_recovery = ValueRange {
        min: baseline * impact_min,
        max: baseline * impact_max,
    };

    ThreatImpactEstimate {
        issue_id: issue.id.clone(),
        impact_range: ValueRange { min: impact_min, max: impact_max },
        monthly_recovery,
        annual_recovery_max: 12.0 * monthly_recovery.max,
        confidence: confidence_for_spread(impact_max - impact_min),
        recovery_display: format_range(monthly_recovery.min, monthly_recovery.max),
    }
}
